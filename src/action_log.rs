//! Action logging for mctl commands.
//!
//! Every CLI invocation is appended as one JSONL entry, giving an audit trail
//! of what was run against the store and whether it worked.

use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Workspace path the command ran against
    pub repo_path: String,

    /// Command name (e.g., "task create", "session spawn")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Log an action to the configured log file.
///
/// This function never fails - logging problems must not break the command
/// that triggered them.
pub fn log_action(
    repo_path: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    // Logging defaults to enabled, also when the config is unreadable.
    let enabled = get_config_bool(repo_path, "action_log_enabled").unwrap_or(true);
    if !enabled {
        return;
    }

    let log_path = match get_log_path(repo_path) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Warning: Failed to get action log path: {}", e);
            return;
        }
    };

    let sanitize = get_config_bool(repo_path, "action_log_sanitize").unwrap_or(true);
    let args = if sanitize { sanitize_args(&args) } else { args };

    let entry = ActionLog {
        timestamp: Utc::now(),
        repo_path: repo_path.to_string_lossy().to_string(),
        command: command.to_string(),
        args,
        success,
        error,
        duration_ms,
        user: get_current_user(),
    };

    if let Err(e) = write_log_entry(&log_path, &entry) {
        eprintln!("Warning: Failed to write action log: {}", e);
    }
}

/// Get the log file path, honoring the `action_log_path` config override.
fn get_log_path(repo_path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let custom_path = match Storage::open(repo_path) {
        Ok(storage) => storage.get_config("action_log_path").ok().flatten(),
        Err(_) => None,
    };

    if let Some(path_str) = custom_path {
        return Ok(expand_home(&PathBuf::from(path_str)));
    }

    // Same base as storage so MC_DATA_DIR redirects the log too.
    let base = match std::env::var_os("MC_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or("Could not determine data directory")?
            .join("missionctl"),
    };
    Ok(base.join("action.log"))
}

/// Expand a leading ~ to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn write_log_entry(path: &Path, entry: &ActionLog) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;

    Ok(())
}

/// Sanitize arguments to keep secrets and noise out of the log.
fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    match args {
        serde_json::Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, value) in map {
                let key_lower = key.to_lowercase();
                if key_lower.contains("password")
                    || key_lower.contains("token")
                    || key_lower.contains("key")
                    || key_lower.contains("secret")
                {
                    sanitized.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    sanitized.insert(key.clone(), sanitize_args(value));
                }
            }
            serde_json::Value::Object(sanitized)
        }
        serde_json::Value::Array(arr) => {
            if arr.len() > 10 {
                serde_json::Value::String(format!("[Array with {} items]", arr.len()))
            } else {
                serde_json::Value::Array(arr.iter().map(sanitize_args).collect())
            }
        }
        serde_json::Value::String(s) => {
            // File paths shrink to their basename.
            let sanitized = if s.contains('/') || s.contains('\\') {
                s.rsplit(['/', '\\']).next().unwrap_or(s).to_string()
            } else {
                s.clone()
            };

            if sanitized.len() > 100 {
                serde_json::Value::String(format!(
                    "{}... ({} chars)",
                    &sanitized[..97],
                    sanitized.len()
                ))
            } else {
                serde_json::Value::String(sanitized)
            }
        }
        _ => args.clone(),
    }
}

/// Read a boolean config value. `None` when unset or the store is unreadable.
fn get_config_bool(repo_path: &Path, key: &str) -> Option<bool> {
    let storage = Storage::open(repo_path).ok()?;
    let value = storage.get_config(key).ok()??;
    let parsed = value.to_lowercase();
    Some(parsed == "true" || parsed == "1" || parsed == "yes")
}

/// Get the current user's username.
fn get_current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
