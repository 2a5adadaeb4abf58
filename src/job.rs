//! Hand-off point to the job-control collaborator.
//!
//! The job table, process groups and terminal control live outside this
//! core. The pipeline executor only promises to hand over each child pid
//! together with the originating command text, so a job table can label the
//! entry when the process later reports a stopped or continued state.

use nix::unistd::Pid;

/// Receives every stage the executor forks.
pub trait JobMonitor {
    /// Called once per forked stage, before the next stage is created.
    /// `command_text` is the stage's original command string.
    fn stage_spawned(&mut self, pid: Pid, command_text: &str);
}

/// Monitor for a shell without job control.
#[derive(Debug, Default)]
pub struct NoJobControl;

impl JobMonitor for NoJobControl {
    fn stage_spawned(&mut self, _pid: Pid, _command_text: &str) {}
}
