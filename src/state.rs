//! Shell-wide mutable state shared with built-ins.

use std::path::PathBuf;

/// State the execution core threads through built-in dispatch. Inside a
/// pipeline it is mutated only by forked children, so a `cd` in a stage can
/// never move the shell itself.
#[derive(Debug, Default)]
pub struct State {
    /// Directory the shell was in before the last successful `cd`.
    pub previous_dir: Option<PathBuf>,
}

impl State {
    pub fn new() -> State {
        State::default()
    }
}
