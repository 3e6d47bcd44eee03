//! Command implementations for the mctl CLI.
//!
//! This module contains the business logic behind each CLI command, organized
//! by collection:
//! - `tasks` - kanban task CRUD, metrics, comments, activity trail
//! - `projects` - project CRUD with task-count joins and cascade delete
//! - `content` - content pipeline CRUD and stage metrics
//! - `calendar` - scheduled event CRUD and week metrics
//! - `memory` - knowledge base CRUD, search, and stats
//! - `team` - agent roster queries and mutations
//! - `sessions` - the agent work-session lifecycle
//! - `users` - user CRUD
//!
//! Every command takes a `Storage` handle and returns a serializable result
//! implementing [`Output`].

pub mod calendar;
pub mod content;
pub mod memory;
pub mod projects;
pub mod sessions;
pub mod tasks;
pub mod team;
pub mod users;

use crate::storage::Storage;
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output: Serialize {
    /// Format for human-readable output.
    fn to_human(&self) -> String;

    /// Serialize to a JSON string.
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Result of `mctl system init`.
#[derive(Debug, Serialize)]
pub struct InitResult {
    /// Whether a new store was created (false when one already existed)
    pub initialized: bool,
    /// Storage root path
    pub path: String,
}

impl Output for InitResult {
    fn to_human(&self) -> String {
        if self.initialized {
            format!("Initialized missionctl store at {}", self.path)
        } else {
            format!("Store already exists at {}", self.path)
        }
    }
}

/// Initialize the store for a workspace. Idempotent.
pub fn system_init(repo_path: &Path) -> Result<InitResult> {
    let existed = Storage::exists(repo_path)?;
    let storage = Storage::init(repo_path)?;
    Ok(InitResult {
        initialized: !existed,
        path: storage.root().display().to_string(),
    })
}

/// Result of `mctl system version`.
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub built_at: &'static str,
}

impl Output for VersionInfo {
    fn to_human(&self) -> String {
        format!("mctl {} ({}, built {})", self.version, self.commit, self.built_at)
    }
}

/// Report version and build information baked in by the build script.
pub fn system_version() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("MC_GIT_COMMIT"),
        built_at: env!("MC_BUILD_TIMESTAMP"),
    }
}

/// A single configuration entry.
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: Option<String>,
}

impl Output for ConfigEntry {
    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => format!("{} = {}", self.key, value),
            None => format!("{} is not set", self.key),
        }
    }
}

/// All configuration entries.
#[derive(Debug, Serialize)]
pub struct ConfigList {
    pub entries: Vec<(String, String)>,
}

impl Output for ConfigList {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No configuration set".to_string();
        }
        self.entries
            .iter()
            .map(|(k, v)| format!("{} = {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Get a configuration value.
pub fn config_get(storage: &Storage, key: &str) -> Result<ConfigEntry> {
    Ok(ConfigEntry {
        key: key.to_string(),
        value: storage.get_config(key)?,
    })
}

/// Set a configuration value.
pub fn config_set(storage: &mut Storage, key: &str, value: &str) -> Result<ConfigEntry> {
    storage.set_config(key, value)?;
    Ok(ConfigEntry {
        key: key.to_string(),
        value: Some(value.to_string()),
    })
}

/// List all configuration values.
pub fn config_list(storage: &Storage) -> Result<ConfigList> {
    Ok(ConfigList {
        entries: storage.list_configs()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_config_get_set_list() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let entry = config_get(&storage, "workspace_url").unwrap();
        assert!(entry.value.is_none());

        config_set(&mut storage, "workspace_url", "https://example.com").unwrap();
        let entry = config_get(&storage, "workspace_url").unwrap();
        assert_eq!(entry.value.as_deref(), Some("https://example.com"));

        let list = config_list(&storage).unwrap();
        assert_eq!(list.entries.len(), 1);
    }

    #[test]
    fn test_output_json_shape() {
        let entry = ConfigEntry {
            key: "k".to_string(),
            value: Some("v".to_string()),
        };
        assert!(entry.to_json().contains("\"key\":\"k\""));
        assert_eq!(entry.to_human(), "k = v");
    }
}
