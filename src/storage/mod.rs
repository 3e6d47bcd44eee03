//! Storage layer for missionctl data.
//!
//! Each record kind lives in its own collection (SQLite table) as a JSON
//! document addressed by id. The store offers point get/insert/patch/delete
//! plus full-collection scans in insertion order; all filtering happens in
//! the query layer above.
//!
//! Data lives at `~/.local/share/missionctl/<workspace-hash>/store.db`
//! (override the base directory with `MC_DATA_DIR`).

use crate::models::{COLLECTIONS, Record};
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Scan direction over a collection, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Oldest first
    Asc,
    /// Newest first
    Desc,
}

/// Document store for a single workspace.
pub struct Storage {
    /// Root directory for this workspace's data
    pub root: PathBuf,
    /// SQLite connection holding the collections
    conn: Connection,
}

impl Storage {
    /// Open existing storage for the given workspace path.
    pub fn open(repo_path: &Path) -> Result<Self> {
        let root = get_storage_dir(repo_path)?;
        Self::open_at(root)
    }

    /// Initialize storage for a new workspace.
    pub fn init(repo_path: &Path) -> Result<Self> {
        let root = get_storage_dir(repo_path)?;
        Self::init_at(root)
    }

    /// Check if storage exists for the given workspace.
    pub fn exists(repo_path: &Path) -> Result<bool> {
        let root = get_storage_dir(repo_path)?;
        Ok(root.exists() && root.join("store.db").exists())
    }

    /// Open storage rooted under an explicit data directory (DI for tests).
    pub fn open_with_data_dir(repo_path: &Path, data_dir: &Path) -> Result<Self> {
        Self::open_at(storage_dir_under(repo_path, data_dir)?)
    }

    /// Initialize storage rooted under an explicit data directory (DI for tests).
    pub fn init_with_data_dir(repo_path: &Path, data_dir: &Path) -> Result<Self> {
        Self::init_at(storage_dir_under(repo_path, data_dir)?)
    }

    fn open_at(root: PathBuf) -> Result<Self> {
        if !root.exists() || !root.join("store.db").exists() {
            return Err(Error::NotInitialized);
        }
        let conn = Connection::open(root.join("store.db"))?;
        Self::init_schema(&conn)?;
        Ok(Self { root, conn })
    }

    fn init_at(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        let conn = Connection::open(root.join("store.db"))?;
        Self::init_schema(&conn)?;
        Ok(Self { root, conn })
    }

    /// Create the collection tables and the config table.
    ///
    /// Every collection shares the same shape: a monotonically increasing
    /// `seq` capturing insertion order, the document id, and the JSON body.
    fn init_schema(conn: &Connection) -> Result<()> {
        for collection in COLLECTIONS {
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {name} (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    doc TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{name}_id ON {name}(id);
                "#,
                name = collection
            ))?;
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Insert a new document into its collection.
    pub fn insert<T: Record>(&mut self, doc: &T) -> Result<()> {
        let json = serde_json::to_string(doc)?;
        self.conn.execute(
            &format!("INSERT INTO {} (id, doc) VALUES (?1, ?2)", T::COLLECTION),
            params![doc.id(), json],
        )?;
        Ok(())
    }

    /// Get a document by id, or `None` when it does not exist.
    pub fn try_get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        let json: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT doc FROM {} WHERE id = ?1", T::COLLECTION),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Get a document by id.
    pub fn get<T: Record>(&self, id: &str) -> Result<T> {
        self.try_get(id)?
            .ok_or_else(|| Error::NotFound(format!("{}: {}", T::COLLECTION, id)))
    }

    /// Replace an existing document in place, keeping its insertion order.
    pub fn put<T: Record>(&mut self, doc: &T) -> Result<()> {
        let json = serde_json::to_string(doc)?;
        let changed = self.conn.execute(
            &format!("UPDATE {} SET doc = ?2 WHERE id = ?1", T::COLLECTION),
            params![doc.id(), json],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("{}: {}", T::COLLECTION, doc.id())));
        }
        Ok(())
    }

    /// Delete a document by id.
    pub fn delete<T: Record>(&mut self, id: &str) -> Result<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", T::COLLECTION),
            params![id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("{}: {}", T::COLLECTION, id)));
        }
        Ok(())
    }

    /// Scan a whole collection in insertion order.
    pub fn scan<T: Record>(&self, order: Order) -> Result<Vec<T>> {
        let dir = match order {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT doc FROM {} ORDER BY seq {}",
            T::COLLECTION,
            dir
        ))?;
        let docs: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        let mut out = Vec::with_capacity(docs.len());
        for json in docs {
            out.push(serde_json::from_str(&json)?);
        }
        Ok(out)
    }

    /// Fetch a set of documents by id in one batch.
    ///
    /// Ids that do not resolve are silently absent from the result, matching
    /// the read semantics of the query layer. Duplicate ids cost one lookup.
    pub fn get_many<T: Record>(&self, ids: &[&str]) -> Result<HashMap<String, T>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT doc FROM {} WHERE id = ?1", T::COLLECTION))?;

        let mut out: HashMap<String, T> = HashMap::new();
        for id in ids {
            if out.contains_key(*id) {
                continue;
            }
            let json: Option<String> = stmt
                .query_row(params![id], |row| row.get(0))
                .optional()?;
            if let Some(json) = json {
                out.insert((*id).to_string(), serde_json::from_str(&json)?);
            }
        }
        Ok(out)
    }

    /// Run a closure inside a single SQLite transaction.
    ///
    /// The closure's writes commit together or roll back together.
    pub fn with_transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    // === Config Operations ===

    /// Get a configuration value.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Set a configuration value.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// List all configuration key/value pairs.
    pub fn list_configs(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM config ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Get the storage root path.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Get the storage directory for a workspace.
///
/// Uses a hash of the workspace path to create a unique directory under the
/// data dir (`MC_DATA_DIR` if set, otherwise the platform data directory).
pub fn get_storage_dir(repo_path: &Path) -> Result<PathBuf> {
    let base = match std::env::var_os("MC_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?
            .join("missionctl"),
    };
    storage_dir_under(repo_path, &base)
}

/// Compute the per-workspace directory under an explicit base directory.
fn storage_dir_under(repo_path: &Path, base: &Path) -> Result<PathBuf> {
    let canonical = repo_path
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize workspace path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash_hex = format!("{:x}", hasher.finalize());

    Ok(base.join(&hash_hex[..12]))
}

/// Walk up from `start` looking for a `.git` directory.
///
/// Lets the CLI resolve the same store from any subdirectory of a repo.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Generate a unique document id.
///
/// Format: `<prefix>-<6 hex chars>`, derived from a SHA-256 of the seed plus
/// a nanosecond timestamp. Prefixes identify the collection (tsk, prj, usr,
/// cnt, evt, doc, agt, ses, cmt, act).
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    let hash_hex = format!("{:x}", hasher.finalize());
    format!("{}-{}", prefix, &hash_hex[..6])
}

/// Validate that an id matches the expected `<prefix>-<6 hex>` format.
pub fn validate_id(id: &str, prefix: &str) -> Result<()> {
    let Some(suffix) = id.strip_prefix(&format!("{}-", prefix)) else {
        return Err(Error::InvalidId(format!(
            "ID must start with '{}-', got: {}",
            prefix, id
        )));
    };

    if suffix.len() != 6 || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidId(format!(
            "ID suffix must be 6 hex characters, got: {}",
            suffix
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Task, TaskStatus, User, UserRole};
    use crate::test_utils::TestEnv;

    fn sample_task(id: &str, title: &str) -> Task {
        Task::new(
            id.to_string(),
            title.to_string(),
            TaskStatus::Backlog,
            Priority::Medium,
        )
    }

    #[test]
    fn test_init_and_open() {
        let env = TestEnv::new();
        env.init_storage();
        let storage = env.open_storage();
        assert!(storage.root().exists());
    }

    #[test]
    fn test_open_uninitialized_fails() {
        let env = TestEnv::new();
        let result = Storage::open_with_data_dir(env.path(), env.data_dir.path());
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[test]
    fn test_insert_and_get() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let task = sample_task("tsk-aaaa01", "First");
        storage.insert(&task).unwrap();

        let loaded: Task = storage.get("tsk-aaaa01").unwrap();
        assert_eq!(loaded.title, "First");
    }

    #[test]
    fn test_try_get_missing_returns_none() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        let loaded: Option<Task> = storage.try_get("tsk-ffffff").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        let result: Result<Task> = storage.get("tsk-ffffff");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_put_replaces_document() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let mut task = sample_task("tsk-aaaa01", "Before");
        storage.insert(&task).unwrap();

        task.title = "After".to_string();
        storage.put(&task).unwrap();

        let loaded: Task = storage.get("tsk-aaaa01").unwrap();
        assert_eq!(loaded.title, "After");
    }

    #[test]
    fn test_put_missing_is_not_found() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let task = sample_task("tsk-aaaa01", "Ghost");
        assert!(matches!(storage.put(&task), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let task = sample_task("tsk-aaaa01", "Doomed");
        storage.insert(&task).unwrap();
        storage.delete::<Task>("tsk-aaaa01").unwrap();

        let loaded: Option<Task> = storage.try_get("tsk-aaaa01").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_scan_preserves_insertion_order() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        for (id, title) in [
            ("tsk-aaaa01", "one"),
            ("tsk-aaaa02", "two"),
            ("tsk-aaaa03", "three"),
        ] {
            storage.insert(&sample_task(id, title)).unwrap();
        }

        let asc: Vec<Task> = storage.scan(Order::Asc).unwrap();
        let titles: Vec<&str> = asc.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);

        let desc: Vec<Task> = storage.scan(Order::Desc).unwrap();
        let titles: Vec<&str> = desc.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two", "one"]);
    }

    #[test]
    fn test_scan_keeps_order_after_put() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        storage.insert(&sample_task("tsk-aaaa01", "one")).unwrap();
        storage.insert(&sample_task("tsk-aaaa02", "two")).unwrap();

        let mut first: Task = storage.get("tsk-aaaa01").unwrap();
        first.title = "one updated".to_string();
        storage.put(&first).unwrap();

        let asc: Vec<Task> = storage.scan(Order::Asc).unwrap();
        assert_eq!(asc[0].title, "one updated");
        assert_eq!(asc[1].title, "two");
    }

    #[test]
    fn test_get_many_skips_missing_and_duplicates() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let user = User::new(
            "usr-aaaa01".to_string(),
            "Ada".to_string(),
            "ada@example.com".to_string(),
            UserRole::Admin,
        );
        storage.insert(&user).unwrap();

        let found: HashMap<String, User> = storage
            .get_many(&["usr-aaaa01", "usr-aaaa01", "usr-ffffff"])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["usr-aaaa01"].name, "Ada");
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let result: Result<()> = storage.with_transaction(|s| {
            s.insert(&sample_task("tsk-aaaa01", "inside"))?;
            Err(Error::Other("boom".to_string()))
        });
        assert!(result.is_err());

        let loaded: Option<Task> = storage.try_get("tsk-aaaa01").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_transaction_commits() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        storage
            .with_transaction(|s| {
                s.insert(&sample_task("tsk-aaaa01", "a"))?;
                s.insert(&sample_task("tsk-aaaa02", "b"))?;
                Ok(())
            })
            .unwrap();

        let all: Vec<Task> = storage.scan(Order::Asc).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_config_roundtrip() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        assert_eq!(storage.get_config("mirror_url").unwrap(), None);
        storage.set_config("mirror_url", "https://example.com").unwrap();
        storage.set_config("mirror_url", "https://example.org").unwrap();
        assert_eq!(
            storage.get_config("mirror_url").unwrap().as_deref(),
            Some("https://example.org")
        );
        assert_eq!(storage.list_configs().unwrap().len(), 1);
    }

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("tsk", "Build the thing");
        assert!(id.starts_with("tsk-"));
        assert_eq!(id.len(), "tsk-".len() + 6);
        validate_id(&id, "tsk").unwrap();
    }

    #[test]
    fn test_generate_id_uniqueness() {
        let a = generate_id("ses", "same seed");
        let b = generate_id("ses", "same seed");
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_id_rejects_bad_input() {
        assert!(validate_id("tsk-12345", "tsk").is_err());
        assert!(validate_id("tsk-zzzzzz", "tsk").is_err());
        assert!(validate_id("prj-abc123", "tsk").is_err());
        assert!(validate_id("abc123", "tsk").is_err());
    }

    #[test]
    fn test_storage_dirs_differ_per_workspace() {
        let env_a = TestEnv::new();
        let env_b = TestEnv::new();
        let dir_a = storage_dir_under(env_a.path(), Path::new("/tmp/mc")).unwrap();
        let dir_b = storage_dir_under(env_b.path(), Path::new("/tmp/mc")).unwrap();
        assert_ne!(dir_a, dir_b);
    }
}
