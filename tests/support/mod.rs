#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub const ALICE: (&str, &str) = ("u-alice", "alice@example.com");
pub const BOB: (&str, &str) = ("u-bob", "bob@example.com");

/// A scratch directory holding a board data file and optional config.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join("taskboard.json")
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
        self.write_file(".taskboard.toml", contents)
    }

    pub fn seed(&self, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(self.data_path(), serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    pub fn read_data(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.data_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Command running in the board directory with no identity.
    pub fn cmd(&self) -> Command {
        let mut cmd = taskboard_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    /// Command running in the board directory as `user`.
    pub fn cmd_as(&self, user: (&str, &str)) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--user", user.0, "--email", user.1]);
        cmd
    }

    /// Run with `--json` and return the `data` field of the envelope.
    pub fn json_as(
        &self,
        user: (&str, &str),
        args: &[&str],
    ) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self
            .cmd_as(user)
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let value: Value = serde_json::from_slice(&output)?;
        Ok(value["data"].clone())
    }

    pub fn new_project(
        &self,
        user: (&str, &str),
        title: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let data = self.json_as(
            user,
            &["project", "new", title, "--description", "Project description"],
        )?;
        Ok(data["id"].as_str().ok_or("project id")?.to_string())
    }

    pub fn new_task(
        &self,
        user: (&str, &str),
        project: &str,
        title: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let data = self.json_as(
            user,
            &["task", "new", project, title, "--description", "Task description"],
        )?;
        Ok(data["id"].as_str().ok_or("task id")?.to_string())
    }
}

pub fn taskboard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskboard").expect("taskboard binary");
    for var in [
        "TASKBOARD_DATA",
        "TASKBOARD_USER_ID",
        "TASKBOARD_EMAIL",
        "TASKBOARD_OUTBOX",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}
