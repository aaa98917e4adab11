use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use json_group_deck::{
    command::ShellRunner, config::Config, descriptor::DescriptorResolver,
    host::protocol::OutboundMessage, host::MemoryHost, App,
};

#[derive(Parser, Debug)]
#[command(name = "json-group-deck")]
#[command(about = "Descriptor-driven button groups for hardware control surfaces")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ~/.config/json-group-deck/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Resolve one button of a descriptor file, print it and exit
    #[arg(long, value_name = "DESCRIPTOR")]
    resolve: Option<PathBuf>,

    /// Button index used with --resolve
    #[arg(long, default_value_t = 0, requires = "resolve")]
    index: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries host messages, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(descriptor) = &cli.resolve {
        return print_resolved(&config, descriptor, cli.index).await;
    }

    info!("Starting json-group-deck");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_outbound(rx));

    let host = Arc::new(MemoryHost::with_outbox(tx));
    let runner = ShellRunner::new(config.runner.interpreter.clone());
    let mut app = App::new(&config, host, runner);

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    let result = tokio::select! {
        result = app.run(BufReader::new(tokio::io::stdin())) => {
            result
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            Ok(())
        }
    };

    // Dropping the app closes the outbox so the writer drains and exits
    drop(app);
    if let Err(e) = writer.await {
        warn!("Outbound writer failed: {}", e);
    }

    info!("Shutdown complete");
    result
}

/// Write host commands to stdout, one JSON document per line
async fn write_outbound(mut rx: mpsc::UnboundedReceiver<OutboundMessage>) {
    let mut stdout = tokio::io::stdout();

    while let Some(message) = rx.recv().await {
        let mut line = match serde_json::to_vec(&message) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode message for {}: {}", message.context(), e);
                continue;
            }
        };
        line.push(b'\n');

        if let Err(e) = stdout.write_all(&line).await {
            warn!("Failed to write to host: {}", e);
            return;
        }
        if let Err(e) = stdout.flush().await {
            warn!("Failed to flush host output: {}", e);
            return;
        }
    }
}

async fn print_resolved(config: &Config, descriptor: &Path, index: usize) -> Result<()> {
    let resolver = DescriptorResolver::new(config.timing.default_delay_ms);
    let resolved = resolver.resolve(descriptor, index).await?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
