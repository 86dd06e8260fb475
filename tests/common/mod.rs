#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const EMPTY_SCRIPT: &str = "BEGIN TRANSACTION;\n\nCOMMIT;\n";

/// Scratch directory holding a `CSV_files` input folder.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh workspace with an empty `CSV_files` directory.
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("temp dir");
        fs::create_dir(temp_dir.path().join("CSV_files")).expect("create CSV_files");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn input_dir(&self) -> PathBuf {
        self.path().join("CSV_files")
    }

    /// Writes a source file into `CSV_files` and returns its path.
    pub fn write_csv(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.input_dir().join(name);
        fs::write(&path, contents).expect("write csv fixture");
        path
    }

    /// Writes a file at the workspace root and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("read workspace file")
    }
}

/// INSERT lines of a generated script, in order.
pub fn inserts(script: &str) -> Vec<&str> {
    script
        .lines()
        .filter(|line| line.starts_with("INSERT INTO"))
        .collect()
}

/// Table names from the `-- Populating` markers, in order.
pub fn populated_tables(script: &str) -> Vec<&str> {
    script
        .lines()
        .filter_map(|line| line.strip_prefix("-- Populating "))
        .collect()
}
