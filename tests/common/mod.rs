//! Common test utilities for modsettings integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never touch the
//! user's real game directory or config file.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with isolated directories.
///
/// Each `TestEnv` creates two temporary directories:
/// - `mod_dir`: Holds the settings file (via `MODSETTINGS_MOD_DIR`)
/// - `home_dir`: Stands in for `$HOME`, so no real config file is read
///
/// The `cmd()` method sets the environment per-invocation, making tests
/// parallel-safe.
pub struct TestEnv {
    pub mod_dir: TempDir,
    pub home_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            mod_dir: TempDir::new().unwrap(),
            home_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment with an empty settings file.
    pub fn init() -> Self {
        let env = Self::new();
        env.cmd().arg("init").assert().success();
        env
    }

    /// Get a Command for the modsettings binary with isolated directories.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_modsettings"));
        cmd.current_dir(self.mod_dir.path());
        cmd.env("HOME", self.home_dir.path());
        cmd.env("XDG_CONFIG_HOME", self.home_dir.path().join(".config"));
        cmd.env("MODSETTINGS_USER_DATA_DIR", self.home_dir.path());
        cmd.env("MODSETTINGS_MOD_DIR", self.mod_dir.path());
        cmd.env_remove("MODSETTINGS_CONFIG");
        cmd.env_remove("MODSETTINGS_LOG");
        cmd
    }

    /// Get the path to the mods directory.
    pub fn path(&self) -> &Path {
        self.mod_dir.path()
    }

    /// Path of the default settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.path().join("mod-settings.dat")
    }

    /// Write a file into the mods directory and return its path.
    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Run `show` and parse its JSON output.
    pub fn show_json(&self) -> serde_json::Value {
        let output = self.cmd().arg("show").output().unwrap();
        assert!(output.status.success(), "show failed: {:?}", output);
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
