//! Missionctl - a mission-control dashboard backend for teams of humans and AI agents.
//!
//! This library provides the core functionality for the `mctl` CLI tool:
//! task, content, calendar, memory, project, and user collections, plus the
//! agent roster and its work-session lifecycle.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod mirror;
pub mod models;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;


/// Library-level error type for missionctl operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not initialized: run `mctl system init` first")]
    NotInitialized,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mirror sync failed: {0}")]
    Mirror(#[from] mirror::MirrorError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for missionctl operations.
pub type Result<T> = std::result::Result<T, Error>;
