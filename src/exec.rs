//! Pipeline executor: turns a command line into a running process topology.
//!
//! Every stage is forked before any stage is awaited, so a full pipe buffer
//! in an early stage can never stall creation of the downstream reader. Pipe
//! ends are closed by every process that does not need them: the coordinator
//! closes both ends once handed to children, each child closes the end it
//! does not use.

use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd};

use log::debug;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use crate::builtin::Builtin;
use crate::error::{ParseError, PipelineError, ShellError};
use crate::job::JobMonitor;
use crate::pipeline;
use crate::redirect;
use crate::state::State;
use crate::tokenize::{self, Tokens};

/// Stage status when descriptor wiring or exec setup failed in the child.
const EXIT_CANNOT_EXEC: u8 = 126;
/// Stage status when the external program could not be started.
const EXIT_NOT_STARTED: u8 = 127;
/// Stage status when a redirection clause was malformed or failed to apply.
const EXIT_REDIRECTION: u8 = 1;

/// Top-level entry for one command line.
///
/// Validates pipe syntax before splitting, then hands the stages to
/// [`execute_pipeline`]. A lone built-in without redirections runs in the
/// coordinator process itself, otherwise `cd` could never move the shell.
pub fn execute_line(
    state: &mut State,
    line: &str,
    monitor: &mut dyn JobMonitor,
) -> Result<i32, ShellError> {
    let line = line.strip_suffix('\n').unwrap_or(line);

    if line.split(' ').any(|t| t == "|") && !pipeline::commandline_is_pipe(line) {
        return Err(PipelineError::BadPipeSyntax.into());
    }
    let stages = pipeline::extract_pipe_commands(line)?;
    if stages.is_empty() {
        return Err(ParseError::EmptyCommand.into());
    }

    if stages.len() == 1 && redirect::commandline_is_redirection(&stages[0]).is_none() {
        let tokens = tokenize::tokenize(&stages[0])?;
        if let Some(builtin) = Builtin::from_name(&tokens.name) {
            return Ok(i32::from(builtin.run(&tokens.args, state)));
        }
    }

    execute_pipeline(state, &stages, monitor)
}

/// Forks one process per stage, wiring stdin/stdout through per-stage pipes,
/// then awaits every child. The pipeline's status is the last stage's exit
/// status; earlier failures are only reported.
pub fn execute_pipeline(
    state: &mut State,
    stages: &[String],
    monitor: &mut dyn JobMonitor,
) -> Result<i32, ShellError> {
    let mut children: Vec<Option<Pid>> = Vec::with_capacity(stages.len());
    let mut in_fd: Option<OwnedFd> = None;

    for (i, stage) in stages.iter().enumerate() {
        let is_last = i + 1 == stages.len();
        let pipe_fds = if is_last {
            None
        } else {
            Some(unistd::pipe().map_err(ShellError::ProcessCreation)?)
        };

        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { child }) => {
                debug!("stage {} '{}' forked as pid {}", i, stage, child);
                monitor.stage_spawned(child, stage);
                drop(in_fd.take());
                in_fd = pipe_fds.map(|(read_end, write_end)| {
                    drop(write_end);
                    read_end
                });
                children.push(Some(child));
            }
            Ok(ForkResult::Child) => {
                let status = run_stage(state, stage, in_fd, pipe_fds);
                unsafe { libc::_exit(libc::c_int::from(status)) }
            }
            Err(e) => {
                // later stages still get their chance to run
                let _ = writeln!(io::stderr(), "psh: fork failed for '{}': {}", stage, e);
                drop(in_fd.take());
                in_fd = pipe_fds.map(|(read_end, write_end)| {
                    drop(write_end);
                    read_end
                });
                children.push(None);
            }
        }
    }
    // the coordinator holds no pipe end once every stage is forked
    drop(in_fd);

    let mut last_status = 0;
    for (i, child) in children.into_iter().enumerate() {
        last_status = match child {
            Some(pid) => match waitpid(pid, None) {
                Ok(status) => {
                    let code = exit_code(status);
                    debug!("stage {} (pid {}) finished with {}", i, pid, code);
                    code
                }
                Err(e) => {
                    let _ = writeln!(io::stderr(), "psh: wait failed for stage {}: {}", i, e);
                    i32::from(EXIT_CANNOT_EXEC)
                }
            },
            None => i32::from(EXIT_CANNOT_EXEC),
        };
    }
    Ok(last_status)
}

fn exit_code(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
        _ => 0,
    }
}

/// Child side of one stage. Never returns to the caller's logic; the status
/// is passed straight to `_exit`.
fn run_stage(
    state: &mut State,
    stage: &str,
    in_fd: Option<OwnedFd>,
    pipe_fds: Option<(OwnedFd, OwnedFd)>,
) -> u8 {
    if let Err(e) = wire_stage_fds(in_fd, pipe_fds) {
        let _ = writeln!(io::stderr(), "psh: {}", e);
        return EXIT_CANNOT_EXEC;
    }
    match run_stage_command(state, stage) {
        Ok(status) => status,
        Err(e) => {
            let _ = writeln!(io::stderr(), "psh: {}", e);
            EXIT_REDIRECTION
        }
    }
}

/// Installs the stage's pipe ends onto stdin/stdout. Dropping each `OwnedFd`
/// closes the pipe end the child no longer needs.
fn wire_stage_fds(in_fd: Option<OwnedFd>, pipe_fds: Option<(OwnedFd, OwnedFd)>) -> nix::Result<()> {
    if let Some(fd) = in_fd {
        unistd::dup2(fd.as_raw_fd(), libc::STDIN_FILENO)?;
    }
    if let Some((read_end, write_end)) = pipe_fds {
        drop(read_end);
        unistd::dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO)?;
    }
    Ok(())
}

/// Parses and runs one stage's command text, after pipe wiring. Redirections
/// apply last so they override the pipe wiring, exactly as in a real shell.
fn run_stage_command(state: &mut State, stage: &str) -> Result<u8, ShellError> {
    let mut command_text = stage;
    let mut redirections = Vec::new();
    if let Some(offset) = redirect::commandline_is_redirection(stage) {
        redirections = redirect::extract_redirections(stage)?;
        command_text = redirect::command_prefix(stage, offset);
    }
    let tokens = tokenize::tokenize(command_text)?;

    if !redirections.is_empty() {
        redirect::apply_redirections(&redirections)?;
    }

    if let Some(builtin) = Builtin::from_name(&tokens.name) {
        return Ok(builtin.run(&tokens.args, state));
    }
    exec_external(&tokens)
}

/// Boundary with the process-group/job-control collaborator: the stage hands
/// itself off to `execvp` and only regains control if the program could not
/// be started.
fn exec_external(tokens: &Tokens) -> Result<u8, ShellError> {
    let argv = match tokens.argv() {
        Ok(argv) => argv,
        Err(_) => {
            let _ = writeln!(io::stderr(), "psh: {}: invalid command name", tokens.name);
            return Ok(EXIT_CANNOT_EXEC);
        }
    };
    match unistd::execvp(argv[0].as_c_str(), &argv) {
        Ok(infallible) => match infallible {},
        Err(e) => {
            let err = ShellError::Exec {
                command: tokens.name.clone(),
                source: e,
            };
            let _ = writeln!(io::stderr(), "psh: {}", err);
            Ok(EXIT_NOT_STARTED)
        }
    }
}
