//! Common helpers for benchlog integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;

pub struct Tmp {
    pub dir: tempfile::TempDir,
}

impl Tmp {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn log_dir(&self) -> PathBuf {
        self.path().join("ck-benchmark")
    }

    pub fn log_file(&self, session: &str) -> PathBuf {
        self.log_dir().join(format!("{session}.jsonl"))
    }

    pub fn write(&self, rel: &str, data: &str) {
        let p = self.path().join(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(p, data).unwrap();
    }

    /// Parsed lines of a session log.
    pub fn records(&self, session: &str) -> Vec<Value> {
        fs::read_to_string(self.log_file(session))
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// `benchlog` isolated from the caller's environment and pointed at the temp dir.
    pub fn benchlog(&self) -> Command {
        let mut cmd = Command::cargo_bin("benchlog").unwrap();
        cmd.current_dir(self.path())
            .env("BENCHLOG_DIR", self.log_dir())
            .env_remove("BENCHLOG_CONFIG")
            .env_remove("BENCHLOG_LOG")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn hook(&self, kind: &str, stdin: &str) -> assert_cmd::assert::Assert {
        self.benchlog()
            .args(["hook", kind])
            .write_stdin(stdin)
            .assert()
    }
}
