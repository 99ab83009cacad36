//! Test driver for ldifcheck integration tests.
//!
//! Runs the `ldifcheck` binary with:
//! - fixture files written into a scratch [`Workspace`]
//! - optional text piped to stdin
//! - stdout and stderr captured for assertions
//!
//! The environment variables the binary reads are cleared so that a
//! developer's shell settings cannot leak into a test.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tempfile::TempDir;

pub mod fixtures;

/// Variables consulted by `ldifcheck`; removed from every child.
const CLEARED_ENV: &[&str] = &[
    "RUST_LOG",
    "LDIFCHECK_DEBUG",
    "LDIFCHECK_FORMAT",
    "LDIFCHECK_SCHEMA",
];

/// A scratch directory holding input files for one test.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> io::Result<Workspace> {
        Ok(Workspace {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the workspace and return its path.
    pub fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Outcome of one run of the binary.
#[derive(Debug)]
pub struct RunOutput {
    /// Exit status; `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Builder for one invocation of the binary under test.
pub struct TestRun {
    cmd: Command,
    stdin: Option<String>,
}

impl TestRun {
    /// `binary` is the path to the ldifcheck executable.
    pub fn new(binary: &str) -> TestRun {
        let mut cmd = Command::new(binary);
        for var in CLEARED_ENV {
            cmd.env_remove(var);
        }
        TestRun { cmd, stdin: None }
    }

    pub fn arg<S: AsRef<std::ffi::OsStr>>(mut self, arg: S) -> TestRun {
        self.cmd.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> TestRun
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> TestRun {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, text: &str) -> TestRun {
        self.stdin = Some(text.to_string());
        self
    }

    /// Spawn, feed stdin, and wait for the process to exit.
    pub fn run(mut self) -> io::Result<RunOutput> {
        self.cmd
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = self.cmd.spawn()?;

        // Feed stdin from a separate thread so a large input cannot deadlock
        // against a full stdout pipe.
        let feeder = match (self.stdin.take(), child.stdin.take()) {
            (Some(text), Some(mut pipe)) => Some(thread::spawn(move || {
                let _ = pipe.write_all(text.as_bytes());
            })),
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(feeder) = feeder {
            let _ = feeder.join();
        }

        Ok(RunOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
