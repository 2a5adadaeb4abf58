//! Splits a command string into an argument vector.
//!
//! Splitting is on runs of the space character only; there is no quoting or
//! escaping. A single trailing newline is stripped before splitting.

use std::ffi::{CString, NulError};

use crate::error::ParseError;

/// Hard cap on the argument vector, command name included.
pub const MAX_ARGUMENTS: usize = 256;

/// One tokenized command: the command name, its arguments, and a copy of the
/// pre-tokenization text for callers that still need the raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub name: String,
    pub args: Vec<String>,
    pub raw: String,
}

impl Tokens {
    /// The full argument vector for `execvp`, command name first. The null
    /// sentinel is supplied by the exec wrapper itself.
    pub fn argv(&self) -> Result<Vec<CString>, NulError> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(CString::new(self.name.clone())?);
        for arg in &self.args {
            argv.push(CString::new(arg.clone())?);
        }
        Ok(argv)
    }
}

/// Tokenizes one command string.
///
/// A line with no tokens is [`ParseError::EmptyCommand`]; a line with more
/// than [`MAX_ARGUMENTS`] tokens is [`ParseError::TooManyArguments`] rather
/// than being silently truncated.
pub fn tokenize(line: &str) -> Result<Tokens, ParseError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let mut words = line.split(' ').filter(|w| !w.is_empty());

    let name = words.next().ok_or(ParseError::EmptyCommand)?.to_string();
    let args: Vec<String> = words.map(str::to_string).collect();
    if args.len() + 1 > MAX_ARGUMENTS {
        return Err(ParseError::TooManyArguments { limit: MAX_ARGUMENTS });
    }

    Ok(Tokens {
        name,
        args,
        raw: line.to_string(),
    })
}
