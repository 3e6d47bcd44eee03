//! Common test utilities for mctl integration tests.
//!
//! Each test gets its own workspace and data directory, injected into the
//! `mctl` subprocess through `MC_REPO` and `MC_DATA_DIR`, so tests run in
//! parallel without touching the user's real store.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
pub struct TestCli {
    /// Acts as the workspace root
    pub repo_dir: TempDir,
    /// Holds mctl's data (via the `MC_DATA_DIR` env var)
    pub data_dir: TempDir,
}

impl TestCli {
    /// Create an isolated environment with an initialized store.
    pub fn new() -> Self {
        let cli = Self::uninitialized();
        cli.mctl().args(["system", "init"]).assert().success();
        cli
    }

    /// Create an isolated environment without initializing the store.
    pub fn uninitialized() -> Self {
        Self {
            repo_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Build an `mctl` command wired to this environment.
    pub fn mctl(&self) -> Command {
        let mut cmd = Command::cargo_bin("mctl").unwrap();
        cmd.env("MC_REPO", self.repo_dir.path())
            .env("MC_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Run a command expected to succeed and parse its JSON stdout.
    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.mctl().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "command {:?} produced invalid JSON ({}): {}",
                args,
                e,
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }

    /// Run a creation command and return the new record's id.
    pub fn create(&self, args: &[&str]) -> String {
        self.run_json(args)["id"].as_str().unwrap().to_string()
    }
}
