#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tempfile::TempDir;
use tracing::debug;

/// Scratch directory the binary runs in, with its own database.
pub struct ImportWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl ImportWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("arc-data.db")
    }

    /// Write `value` as a JSON file in the workspace.
    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write_file(name, value.to_string().as_bytes())
    }

    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&extract_json_payload(&self.stdout)).expect("valid JSON on stdout")
    }
}

/// Run the binary inside `workspace` with isolated settings.
pub fn run_arc<I, S>(workspace: &ImportWorkspace, args: I, label: &str) -> RunOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::cargo_bin("arc-import").expect("arc-import binary");
    cmd.current_dir(&workspace.root)
        .env("RUST_LOG", "off")
        .env_remove("ARC_IMPORT_DATABASE")
        .env_remove("ARC_IMPORT_CHUNK_SIZE")
        .env_remove("ARC_IMPORT_EVENT_CAPACITY")
        .env_remove("ARC_IMPORT_DRY_RUN")
        .env_remove("ARC_IMPORT_LOG_FILE")
        .args(args);
    let output = cmd.output().expect("run arc-import");
    let result = RunOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(label, status = ?result.status, "ran arc-import");
    result
}

/// Base command for assertion-style tests.
pub fn arc_command(workspace: &ImportWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("arc-import").expect("arc-import binary");
    cmd.current_dir(&workspace.root)
        .env("RUST_LOG", "off")
        .env_remove("ARC_IMPORT_DATABASE")
        .env_remove("ARC_IMPORT_DRY_RUN");
    cmd
}

/// The JSON document in `stdout`, skipping any leading non-JSON lines.
pub fn extract_json_payload(stdout: &str) -> String {
    let start = stdout.find(['{', '[']).unwrap_or(0);
    stdout[start..].trim().to_string()
}

pub fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
