//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch tree that the `anorm` binary is pointed at.
pub struct TestTree {
    dir: TempDir,
}

/// Result from one `anorm` invocation.
#[derive(Debug)]
pub struct RunResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Parse stdout as the `--json` report.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}):\n{}", self.stdout))
    }
}

impl TestTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn file(&self, rel: &str, bytes: &[u8]) -> &Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("create parents");
        fs::write(&path, bytes).expect("write file");
        self
    }

    pub fn dir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.path(rel)).expect("create dir");
        self
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).expect("read file")
    }

    /// Sorted relative paths of every entry in the tree.
    pub fn listing(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect(self.root(), self.root(), &mut out);
        out.sort();
        out
    }

    /// Run `anorm <subcommand> <root flag> <tree root> <extra...>`.
    pub fn run(&self, subcommand: &str, extra: &[&str]) -> RunResult {
        let root_flag = if subcommand == "flat-samples" {
            "--questions-dir"
        } else {
            "--base-dir"
        };
        let output = Command::new(env!("CARGO_BIN_EXE_anorm"))
            .arg(subcommand)
            .arg(root_flag)
            .arg(self.root())
            .args(extra)
            .env_remove("ANORM_LOG")
            .output()
            .expect("run anorm");
        RunResult::from_output(output)
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

fn collect(base: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        let rel = path
            .strip_prefix(base)
            .expect("entry under base")
            .display()
            .to_string();
        if path.is_dir() {
            out.push(format!("{rel}/"));
            collect(base, &path, out);
        } else {
            out.push(rel);
        }
    }
}

/// Run `anorm` with raw arguments.
pub fn run_raw(args: &[&str]) -> RunResult {
    let output = Command::new(env!("CARGO_BIN_EXE_anorm"))
        .args(args)
        .env_remove("ANORM_LOG")
        .output()
        .expect("run anorm");
    RunResult::from_output(output)
}
