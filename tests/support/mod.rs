#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A scratch working directory for one test.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".teamboard.toml", contents)
    }

    pub fn read_file(&self, rel_path: &str) -> String {
        fs::read_to_string(self.dir.path().join(rel_path)).expect("read file")
    }

    /// `teamboard` running inside this directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = teamboard_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    /// Run with `--json`, assert success, and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Run a create-style command and return `data.id`.
    pub fn create(&self, args: &[&str]) -> String {
        let value = self.json(args);
        value["data"]["id"].as_str().expect("created id").to_string()
    }
}

pub fn teamboard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("teamboard").expect("binary");
    cmd.env_remove("TEAMBOARD_DIR");
    cmd.env_remove("RUST_LOG");
    cmd
}
