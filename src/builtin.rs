//! Built-in commands executed inside the shell's own process or its forked
//! children, never by launching an external program.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use nix::unistd;

use crate::error::ShellError;
use crate::state::State;

/// The built-ins this core knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Pwd,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        match name {
            "cd" => Some(Builtin::Cd),
            "pwd" => Some(Builtin::Pwd),
            _ => None,
        }
    }

    pub fn run(self, args: &[String], state: &mut State) -> u8 {
        match self {
            Builtin::Pwd => builtin_pwd(args),
            Builtin::Cd => builtin_cd(args.first().map(String::as_str), &mut state.previous_dir),
        }
    }
}

/// Writes the current working directory to stdout. Takes no arguments.
pub fn builtin_pwd(args: &[String]) -> u8 {
    if !args.is_empty() {
        let err = ShellError::BuiltinArgument("pwd: too many arguments".to_string());
        let _ = writeln!(io::stderr(), "{}", err);
        return 1;
    }
    match unistd::getcwd() {
        Ok(dir) => {
            let mut stdout = io::stdout();
            let _ = writeln!(stdout, "{}", dir.display());
            let _ = stdout.flush();
            0
        }
        Err(e) => {
            let _ = writeln!(io::stderr(), "pwd: {}", e);
            1
        }
    }
}

/// Changes the working directory. `-` means the previous directory, no
/// argument means `$HOME`. On success `previous_dir` is updated with the
/// directory the process was in before the change.
pub fn builtin_cd(target: Option<&str>, previous_dir: &mut Option<PathBuf>) -> u8 {
    let destination = match target {
        Some("-") => match previous_dir.clone() {
            Some(dir) => dir,
            None => {
                let _ = writeln!(io::stderr(), "cd: no previous directory");
                return 1;
            }
        },
        Some(path) => PathBuf::from(path),
        None => match env::var_os("HOME") {
            Some(home) => PathBuf::from(home),
            None => {
                let _ = writeln!(io::stderr(), "cd: HOME not set");
                return 1;
            }
        },
    };

    let current = unistd::getcwd().ok();
    match unistd::chdir(&destination) {
        Ok(()) => {
            *previous_dir = current;
            0
        }
        Err(e) => {
            let _ = writeln!(io::stderr(), "cd: {}: {}", destination.display(), e);
            1
        }
    }
}
