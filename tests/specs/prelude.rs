//! Black-box test harness: a disposable project directory plus a thin
//! wrapper around invoking the `runbook` binary and asserting on its
//! stdout/stderr/exit code. Every spec constructs its own `Project` so
//! tests never share a `.runbook/` state directory.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// How long a test waits for an async effect (daemon exit, file
/// creation) before failing.
pub const SPEC_WAIT_MAX_MS: u64 = 6_000;

/// A oneshot/daemon pair covering the common lifecycle specs.
pub const SLEEP_RUNBOOK: &str = "\
sleep:
  type: daemon
  description: a long-lived daemon for lifecycle tests
  command: sleep 30

tree:
  type: daemon
  description: a daemon that forks a process-group-sharing child tree
  command: sleep 30 & sleep 30 & wait

greet:
  type: oneshot
  description: a quick oneshot that echoes a parameter
  command: echo \"hello {{name}}\"
  params:
    name:
      default: world
";

pub fn wait_for(max_ms: u64, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `.runbook/` lives directly under the project root, with no XDG
    /// indirection, so a test fixture's state dir is trivial to locate.
    pub fn state_path(&self) -> PathBuf {
        self.path().join(".runbook")
    }

    pub fn git_init(&self) -> &Self {
        let status = Command::new("git")
            .args(["init", "-q"])
            .current_dir(self.path())
            .status()
            .expect("git init");
        assert!(status.success(), "git init failed");
        self
    }

    pub fn file(&self, relative: &str, contents: &str) -> &Self {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, contents).expect("write fixture file");
        self
    }

    /// Write `SLEEP_RUNBOOK` as the project's single-file manifest.
    pub fn with_sleep_runbook(&self) -> &Self {
        self.file("runbook.yaml", SLEEP_RUNBOOK)
    }

    pub fn runbook(&self) -> RunbookCommand {
        let bin = assert_cmd::cargo::cargo_bin("runbook");
        let mut cmd = Command::new(bin);
        cmd.current_dir(self.path());
        RunbookCommand {
            cmd,
            stdin: None,
        }
    }
}

pub struct RunbookCommand {
    cmd: Command,
    stdin: Option<String>,
}

impl RunbookCommand {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    fn run(mut self) -> Outcome {
        self.cmd.stdin(Stdio::piped());
        self.cmd.stdout(Stdio::piped());
        self.cmd.stderr(Stdio::piped());
        let mut child = self.cmd.spawn().expect("spawn runbook");

        // Write (if any) then drop the handle so the child sees EOF
        // on stdin rather than blocking forever on `lines().next()`.
        if let Some(input) = self.stdin.take() {
            let mut stdin = child.stdin.take().expect("child stdin");
            stdin.write_all(input.as_bytes()).expect("write stdin");
        }
        drop(child.stdin.take());

        let output = child.wait_with_output().expect("wait for runbook");
        Outcome {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn passes(self) -> Outcome {
        let outcome = self.run();
        assert!(
            outcome.status.success(),
            "expected success, got {:?}\nstdout:\n{}\nstderr:\n{}",
            outcome.status,
            outcome.stdout,
            outcome.stderr
        );
        outcome
    }

    pub fn fails(self) -> Outcome {
        let outcome = self.run();
        assert!(
            !outcome.status.success(),
            "expected failure, got success\nstdout:\n{}\nstderr:\n{}",
            outcome.stdout,
            outcome.stderr
        );
        outcome
    }

    pub fn fails_with_code(self, code: i32) -> Outcome {
        let outcome = self.run();
        assert_eq!(
            outcome.code(),
            code,
            "stdout:\n{}\nstderr:\n{}",
            outcome.stdout,
            outcome.stderr
        );
        outcome
    }
}

pub struct Outcome {
    status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}\nstdout:\n{}\nstderr:\n{}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}\nstdout:\n{}\nstderr:\n{}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout.contains(needle),
            "stdout unexpectedly contains {needle:?}\nstdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn stderr_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stderr.contains(needle),
            "stderr unexpectedly contains {needle:?}\nstderr:\n{}",
            self.stderr
        );
        self
    }
}
