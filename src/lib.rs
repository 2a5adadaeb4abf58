//! Command-execution core of psh, a small interactive Unix shell.
//!
//! Turns a tokenized command line into a running process topology with
//! correctly wired standard descriptors: redirection parsing and
//! application, pipeline splitting and multi-stage process creation, and
//! the minimal built-in dispatch (`cd`, `pwd`) the executor must
//! special-case. The read-eval loop, job table and signal handling are
//! external collaborators.

pub mod builtin;
pub mod error;
pub mod exec;
pub mod job;
pub mod pipeline;
pub mod redirect;
pub mod state;
pub mod subst;
pub mod tokenize;

pub use error::{ParseError, PipelineError, RedirectError, ShellError};
pub use exec::{execute_line, execute_pipeline};
pub use state::State;
