//! External command execution: runner, OSC rendering and sequencing

pub mod osc;
pub mod runner;
pub mod sequencer;

pub use osc::OscTemplate;
pub use runner::{CommandRunner, ExecutableCommand, ShellRunner};
pub use sequencer::CommandSequencer;
