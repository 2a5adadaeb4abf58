use std::io;
use std::io::{BufRead, Write};

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use psh::job::NoJobControl;
use psh::{execute_line, State};

const PROMPT: &[u8] = b"psh> ";

fn log_level() -> LevelFilter {
    std::env::var("PSH_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

fn main() {
    let _ = TermLogger::init(
        log_level(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let mut state = State::new();
    let mut monitor = NoJobControl;
    let mut stdout = io::stdout();
    let stdin = io::stdin();
    let mut stdin_locked = stdin.lock();
    loop {
        let _ = stdout.write_all(PROMPT);
        let _ = stdout.flush();
        let mut line = String::new();
        match stdin_locked.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = execute_line(&mut state, &line, &mut monitor) {
            let _ = writeln!(io::stderr(), "psh: {}", e);
        }
    }
}
