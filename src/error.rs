//! Error types for parsing and executing command lines.

use std::io;
use thiserror::Error;

/// Errors from tokenization and redirection-clause parsing.
///
/// Any of these aborts the whole command before a process is created.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection operator was not followed by a file name.
    #[error("missing file name after '{op}'")]
    MissingOperand { op: &'static str },

    /// A bare token followed a redirection's file name.
    #[error("unexpected token '{token}' after redirection target")]
    TrailingGarbage { token: String },

    /// The argument vector would exceed [`crate::tokenize::MAX_ARGUMENTS`].
    #[error("too many arguments (limit {limit})")]
    TooManyArguments { limit: usize },

    /// The command text contained no tokens.
    #[error("empty command")]
    EmptyCommand,
}

/// Errors from pipeline validation and splitting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A `|` token with no command on one side: leading, trailing or doubled.
    #[error("syntax error near '|'")]
    BadPipeSyntax,

    /// The line splits into more than [`crate::pipeline::MAX_STAGES`] stages.
    #[error("too many pipeline stages (limit {limit})")]
    TooManyStages { limit: usize },
}

/// Errors from opening a redirection target or rewiring descriptors.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// An exclusive-create redirection hit an existing file.
    #[error("{path}: file exists")]
    Conflict { path: String },

    /// Any other open failure: permissions, missing directory, and so on.
    #[error("{path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A `dup`/`dup2`/`close` syscall failed.
    #[error("{0}")]
    Sys(#[from] nix::Error),
}

/// Top-level error for one command line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Redirect(#[from] RedirectError),

    /// A pipe could not be created, so the pipeline cannot be wired.
    #[error("cannot create pipeline: {0}")]
    ProcessCreation(#[source] nix::Error),

    /// A built-in was invoked with arguments it does not accept.
    #[error("{0}")]
    BuiltinArgument(String),

    /// An external program could not be started.
    #[error("{command}: {source}")]
    Exec {
        command: String,
        #[source]
        source: nix::Error,
    },
}
