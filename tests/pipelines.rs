//! End-to-end pipeline execution against real external programs.
//!
//! These tests fork, so they are serialized; output of the final stage is
//! captured through a file redirection rather than by stealing the test
//! harness's stdout.

use std::env;
use std::fs;
use std::path::Path;

use nix::unistd::Pid;
use serial_test::serial;

use psh::job::{JobMonitor, NoJobControl};
use psh::{execute_line, PipelineError, ShellError, State};

fn run(line: &str) -> i32 {
    let mut state = State::new();
    let mut monitor = NoJobControl;
    execute_line(&mut state, line, &mut monitor).unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
#[serial]
fn echo_through_cat() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("echo hi | cat >| {}", path_str(&out)));
    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");
}

#[test]
#[serial]
fn three_stage_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("echo hi | cat | cat >| {}", path_str(&out)));
    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");
}

#[test]
#[serial]
fn stages_run_concurrently() {
    // with the historic fork-then-wait serialization this would never
    // finish: yes(1) only exits once its reader is gone
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("yes | head -n 1 >| {}", path_str(&out)));
    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "y\n");
}

#[test]
#[serial]
fn status_is_the_last_stage() {
    assert_eq!(run("true | false"), 1);
    assert_eq!(run("false | true"), 0);
}

#[test]
#[serial]
fn no_clobber_fails_on_second_run() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    assert_eq!(run(&format!("echo hi > {}", path_str(&out))), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");
    assert_ne!(run(&format!("echo hi > {}", path_str(&out))), 0);
}

#[test]
#[serial]
fn force_clobber_succeeds_twice() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    assert_eq!(run(&format!("echo one >| {}", path_str(&out))), 0);
    assert_eq!(run(&format!("echo two >| {}", path_str(&out))), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "two\n");
}

#[test]
#[serial]
fn append_accumulates() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("log");
    assert_eq!(run(&format!("echo one >> {}", path_str(&out))), 0);
    assert_eq!(run(&format!("echo two >> {}", path_str(&out))), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "one\ntwo\n");
}

#[test]
#[serial]
fn input_redirection_feeds_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    fs::write(&input, "data\n").unwrap();
    let status = run(&format!("cat < {} >| {}", path_str(&input), path_str(&out)));
    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "data\n");
}

#[test]
#[serial]
fn stderr_redirection_captures_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let errfile = dir.path().join("err");
    let status = run(&format!(
        "ls /nonexistent-psh-test 2>| {}",
        path_str(&errfile)
    ));
    assert_ne!(status, 0);
    assert!(!fs::read_to_string(&errfile).unwrap().is_empty());
}

#[test]
#[serial]
fn redirection_overrides_pipe_wiring() {
    // cmd1 | cmd2 > out sends cmd2's stdout to the file, not to a pipe
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("echo hi | cat > {}", path_str(&out)));
    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");
}

#[test]
#[serial]
fn failing_redirection_aborts_the_stage_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let existing = dir.path().join("existing");
    fs::write(&existing, "kept").unwrap();

    let status = run(&format!(
        "echo hi > {} > {}",
        path_str(&first),
        path_str(&existing)
    ));
    assert_eq!(status, 1);
    // the first redirection was applied before the conflict stopped the
    // sequence, so the file exists but the command never wrote to it
    assert_eq!(fs::read_to_string(&first).unwrap(), "");
    assert_eq!(fs::read_to_string(&existing).unwrap(), "kept");
}

#[test]
#[serial]
fn trailing_garbage_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("echo hi > {} extra", path_str(&out)));
    assert_eq!(status, 1);
    assert!(!out.exists());
}

#[test]
#[serial]
fn pwd_stage_writes_the_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("pwd >| {}", path_str(&out)));
    assert_eq!(status, 0);
    let expected = format!("{}\n", env::current_dir().unwrap().display());
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
}

#[test]
#[serial]
fn pwd_with_arguments_fails_inside_a_stage() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    assert_eq!(run(&format!("pwd extra >| {}", path_str(&out))), 1);
}

#[test]
#[serial]
fn cd_in_a_pipeline_cannot_move_the_shell() {
    let before = env::current_dir().unwrap();
    assert_eq!(run("cd / | cat"), 0);
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
#[serial]
fn cd_to_missing_directory_reports_failure() {
    assert_eq!(run("cd /nonexistent-psh-test"), 1);
}

#[test]
#[serial]
fn unknown_command_exits_127() {
    assert_eq!(run("definitely-not-a-command-psh"), 127);
}

#[test]
fn malformed_pipes_are_rejected_before_forking() {
    let mut state = State::new();
    let mut monitor = NoJobControl;
    for line in ["a | | b", "a |", "|", "| a"] {
        match execute_line(&mut state, line, &mut monitor) {
            Err(ShellError::Pipeline(PipelineError::BadPipeSyntax)) => {}
            other => panic!("expected BadPipeSyntax for {:?}, got {:?}", line, other),
        }
    }
}

#[test]
fn empty_line_is_rejected() {
    let mut state = State::new();
    let mut monitor = NoJobControl;
    assert!(matches!(
        execute_line(&mut state, "", &mut monitor),
        Err(ShellError::Parse(_))
    ));
    assert!(matches!(
        execute_line(&mut state, "   \n", &mut monitor),
        Err(ShellError::Parse(_))
    ));
}

#[derive(Default)]
struct RecordingMonitor {
    events: Vec<(Pid, String)>,
}

impl JobMonitor for RecordingMonitor {
    fn stage_spawned(&mut self, pid: Pid, command_text: &str) {
        self.events.push((pid, command_text.to_string()));
    }
}

#[test]
#[serial]
fn monitor_receives_every_stage_pid_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let line = format!("echo hi | cat >| {}", path_str(&out));

    let mut state = State::new();
    let mut monitor = RecordingMonitor::default();
    let status = execute_line(&mut state, &line, &mut monitor).unwrap();
    assert_eq!(status, 0);

    assert_eq!(monitor.events.len(), 2);
    assert_eq!(monitor.events[0].1, "echo hi");
    assert!(monitor.events[1].1.starts_with("cat >| "));
    for (pid, _) in &monitor.events {
        assert!(pid.as_raw() > 0);
    }
}
