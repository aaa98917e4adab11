//! Runs scripts and inline commands in an external interpreter

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// A single step the sequencer can execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutableCommand {
    /// Script file passed to the interpreter
    Script(PathBuf),
    /// Command text passed to the interpreter's `-Command`
    Inline(String),
}

/// Executes one command to completion and returns its trimmed stdout
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, command: &ExecutableCommand) -> Result<String, CommandError>;
}

/// Runs commands through PowerShell (or another interpreter with the same flags)
#[derive(Debug, Clone)]
pub struct ShellRunner {
    interpreter: String,
}

impl ShellRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    fn command(&self, command: &ExecutableCommand) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        match command {
            ExecutableCommand::Script(path) => cmd.arg(path),
            ExecutableCommand::Inline(script) => cmd.arg("-Command").arg(script),
        };
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, command: &ExecutableCommand) -> Result<String, CommandError> {
        debug!("Running {:?} via {}", command, self.interpreter);

        let output = self
            .command(command)
            .output()
            .await
            .map_err(|source| CommandError::Spawn { source })?;

        if !output.status.success() {
            return Err(CommandError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
