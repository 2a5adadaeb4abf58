//! Redirection grammar and engine.
//!
//! The grammar side recognizes the seven redirection operators in a token
//! stream and extracts `(operator, file name)` pairs. The engine side opens
//! the target with the operator's exact open policy and rewires the standard
//! descriptor it names, with save/restore of the caller's own 0/1/2 so a
//! failing sequence leaves the descriptors untouched.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use nix::unistd;

use crate::error::{ParseError, RedirectError};

/// The seven recognized redirection operators.
///
/// Each names a target descriptor slot and an open policy. Dispatch is over
/// this enum; operator strings exist only at the parsing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    /// `<`: stdin from an existing file.
    Input,
    /// `>`: stdout, exclusive create. Fails if the file exists.
    NoClobberOut,
    /// `>|`: stdout, create or truncate.
    ForceOut,
    /// `>>`: stdout, create or append.
    AppendOut,
    /// `2>`: stderr, exclusive create. Fails if the file exists.
    NoClobberErr,
    /// `2>|`: stderr, create or truncate.
    ForceErr,
    /// `2>>`: stderr, create or append.
    AppendErr,
}

impl RedirectOp {
    pub const ALL: [RedirectOp; 7] = [
        RedirectOp::Input,
        RedirectOp::NoClobberOut,
        RedirectOp::ForceOut,
        RedirectOp::AppendOut,
        RedirectOp::NoClobberErr,
        RedirectOp::ForceErr,
        RedirectOp::AppendErr,
    ];

    /// Exact match against the closed operator set.
    pub fn from_token(token: &str) -> Option<RedirectOp> {
        match token {
            "<" => Some(RedirectOp::Input),
            ">" => Some(RedirectOp::NoClobberOut),
            ">|" => Some(RedirectOp::ForceOut),
            ">>" => Some(RedirectOp::AppendOut),
            "2>" => Some(RedirectOp::NoClobberErr),
            "2>|" => Some(RedirectOp::ForceErr),
            "2>>" => Some(RedirectOp::AppendErr),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RedirectOp::Input => "<",
            RedirectOp::NoClobberOut => ">",
            RedirectOp::ForceOut => ">|",
            RedirectOp::AppendOut => ">>",
            RedirectOp::NoClobberErr => "2>",
            RedirectOp::ForceErr => "2>|",
            RedirectOp::AppendErr => "2>>",
        }
    }

    /// The standard slot this operator rewires.
    pub fn target_slot(self) -> RawFd {
        match self {
            RedirectOp::Input => libc::STDIN_FILENO,
            RedirectOp::NoClobberOut | RedirectOp::ForceOut | RedirectOp::AppendOut => {
                libc::STDOUT_FILENO
            }
            RedirectOp::NoClobberErr | RedirectOp::ForceErr | RedirectOp::AppendErr => {
                libc::STDERR_FILENO
            }
        }
    }

    fn open(self, path: &str) -> io::Result<File> {
        let mut opts = OpenOptions::new();
        let _ = match self {
            RedirectOp::Input => opts.read(true),
            RedirectOp::NoClobberOut | RedirectOp::NoClobberErr => {
                opts.write(true).create_new(true)
            }
            RedirectOp::ForceOut | RedirectOp::ForceErr => {
                opts.write(true).create(true).truncate(true)
            }
            RedirectOp::AppendOut | RedirectOp::AppendErr => opts.append(true).create(true),
        };
        opts.open(path)
    }
}

/// One parsed operator application. Order within the owning list is
/// significant: redirections apply left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub op: RedirectOp,
    pub target: String,
}

pub fn token_is_redirection(token: &str) -> bool {
    RedirectOp::from_token(token).is_some()
}

/// Byte offset at which the first redirection operator token begins, or
/// `None` when the line holds no redirection.
///
/// Operators are only recognized as whole space-delimited tokens, which is
/// sound because no quoting exists in this grammar.
pub fn commandline_is_redirection(line: &str) -> Option<usize> {
    let mut offset = 0;
    for token in line.split(' ') {
        if token_is_redirection(token) {
            return Some(offset);
        }
        offset += token.len() + 1;
    }
    None
}

/// The command+args portion of a line whose first operator starts at
/// `offset`, as reported by [`commandline_is_redirection`].
pub fn command_prefix(line: &str, offset: usize) -> &str {
    line[..offset].trim_end_matches(' ')
}

/// Extracts every redirection clause of one command line, in order.
///
/// Each operator must be followed by a file name that is not itself an
/// operator, and the token after a file name, if any, must start another
/// redirection. Extraction is all-or-nothing: any error drops the partially
/// built list.
pub fn extract_redirections(line: &str) -> Result<Vec<Redirection>, ParseError> {
    let mut redirections = Vec::new();
    let mut tokens = line.split(' ').filter(|t| !t.is_empty());
    let mut pending = tokens.next();

    while let Some(token) = pending {
        let Some(op) = RedirectOp::from_token(token) else {
            // command or argument token, before the first operator
            pending = tokens.next();
            continue;
        };

        let target = match tokens.next() {
            Some(name) if !token_is_redirection(name) => name.to_string(),
            _ => return Err(ParseError::MissingOperand { op: op.symbol() }),
        };
        redirections.push(Redirection { op, target });

        pending = tokens.next();
        if let Some(next) = pending {
            if !token_is_redirection(next) {
                return Err(ParseError::TrailingGarbage {
                    token: next.to_string(),
                });
            }
        }
    }

    Ok(redirections)
}

/// Duplicates of the caller's standard descriptors, taken before a
/// redirection sequence so it can be rolled back. The copies are closed on
/// drop once no longer needed.
#[derive(Debug)]
pub struct SavedStdio {
    stdin: OwnedFd,
    stdout: OwnedFd,
    stderr: OwnedFd,
}

fn dup_owned(fd: RawFd) -> nix::Result<OwnedFd> {
    let copy = unistd::dup(fd)?;
    Ok(unsafe { OwnedFd::from_raw_fd(copy) })
}

impl SavedStdio {
    /// Duplicates the current 0/1/2.
    pub fn save() -> Result<SavedStdio, RedirectError> {
        Ok(SavedStdio {
            stdin: dup_owned(libc::STDIN_FILENO)?,
            stdout: dup_owned(libc::STDOUT_FILENO)?,
            stderr: dup_owned(libc::STDERR_FILENO)?,
        })
    }

    /// Restores the three standard slots from the saved copies.
    pub fn restore(&self) -> Result<(), RedirectError> {
        unistd::dup2(self.stdin.as_raw_fd(), libc::STDIN_FILENO)?;
        unistd::dup2(self.stdout.as_raw_fd(), libc::STDOUT_FILENO)?;
        unistd::dup2(self.stderr.as_raw_fd(), libc::STDERR_FILENO)?;
        Ok(())
    }
}

/// Opens the target per the operator's policy and installs it onto the
/// operator's standard slot. The freshly opened descriptor never outlives
/// this call: it is either duplicated onto the slot and closed, or closed on
/// the failure path.
pub fn apply_redirection(redirection: &Redirection) -> Result<(), RedirectError> {
    let file = redirection.op.open(&redirection.target).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            RedirectError::Conflict {
                path: redirection.target.clone(),
            }
        } else {
            RedirectError::Open {
                path: redirection.target.clone(),
                source: e,
            }
        }
    })?;

    let fd = file.into_raw_fd();
    let installed = unistd::dup2(fd, redirection.op.target_slot());
    let _ = unistd::close(fd);
    installed?;
    Ok(())
}

/// Applies a redirection list in order, atomically with respect to the
/// caller's standard descriptors.
///
/// On the first failure the saved 0/1/2 are restored and later redirections
/// are never attempted. On success the saved copies are closed.
pub fn apply_redirections(redirections: &[Redirection]) -> Result<(), RedirectError> {
    let saved = SavedStdio::save()?;
    for redirection in redirections {
        if let Err(e) = apply_redirection(redirection) {
            let _ = saved.restore();
            return Err(e);
        }
    }
    Ok(())
}
