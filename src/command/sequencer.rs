//! Sequential command execution with inter-step delays

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::{CommandRunner, ExecutableCommand};
use crate::config::DelayPolicy;

/// Runs command lists strictly in order, one at a time
#[derive(Debug, Clone)]
pub struct CommandSequencer<R> {
    runner: R,
    policy: DelayPolicy,
}

impl<R: CommandRunner> CommandSequencer<R> {
    pub fn new(runner: R, policy: DelayPolicy) -> Self {
        Self { runner, policy }
    }

    /// Run every command in order.
    ///
    /// After step `i > 0` the sequencer waits `delays[i - 1]` before moving on.
    /// A failed step is logged and never stops the sequence; under
    /// [`DelayPolicy::SkipOnFailure`] its wait is skipped. A missing delay
    /// entry counts as zero.
    pub async fn run_sequence(&self, commands: &[ExecutableCommand], delays: &[u64]) {
        info!("Running sequence of {} commands", commands.len());

        for (i, command) in commands.iter().enumerate() {
            let succeeded = match self.runner.run(command).await {
                Ok(output) => {
                    debug!("Step {} done: {}", i, output);
                    true
                }
                Err(e) => {
                    error!("Step {} of {} failed: {}", i + 1, commands.len(), e);
                    false
                }
            };

            if i == 0 || (!succeeded && self.policy == DelayPolicy::SkipOnFailure) {
                continue;
            }

            let delay = delays.get(i - 1).copied().unwrap_or(0);
            if delay > 0 {
                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}
