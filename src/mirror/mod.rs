//! One-way mirror of the store into an external workspace.
//!
//! `mctl mirror sync` snapshots the mirrored collections and pushes each
//! record as a page to a workspace API. The mirror is not incremental: pages
//! created by the previous sync are archived and the current state is
//! recreated from scratch. Page ids from each sync are remembered in the
//! config table under `mirror_pages_<collection>` so the next sync can
//! archive them.
//!
//! The workspace is write-only from our side; nothing is ever read back into
//! the store.

use serde::Serialize;

use crate::commands::Output;
use crate::models::{
    ContentItem, MemoryDocument, Project, Record, ScheduledEvent, Task, TeamMember,
};
use crate::storage::{Order, Storage};
use crate::Result;

/// Errors from the workspace API boundary.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Workspace API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid workspace response: {0}")]
    InvalidResponse(String),
}

/// Collections pushed to the workspace, in sync order.
pub const MIRRORED_COLLECTIONS: &[&str] = &[
    Project::COLLECTION,
    Task::COLLECTION,
    ContentItem::COLLECTION,
    ScheduledEvent::COLLECTION,
    MemoryDocument::COLLECTION,
    TeamMember::COLLECTION,
];

/// Page operations the sync needs from a workspace backend.
pub trait WorkspacePages {
    /// Create a page and return its workspace-assigned id.
    fn create_page(
        &self,
        collection: &str,
        title: &str,
        properties: &serde_json::Value,
    ) -> std::result::Result<String, MirrorError>;

    /// Archive a page created by a previous sync.
    fn archive_page(&self, page_id: &str) -> std::result::Result<(), MirrorError>;
}

/// HTTP client for the workspace API.
pub struct WorkspaceClient {
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

impl WorkspaceClient {
    /// Build a client from `WORKSPACE_URL` and `WORKSPACE_API_KEY`.
    pub fn from_env() -> std::result::Result<Self, MirrorError> {
        let base_url = std::env::var("WORKSPACE_URL")
            .map_err(|_| MirrorError::MissingConfig("WORKSPACE_URL".to_string()))?;
        let api_key = std::env::var("WORKSPACE_API_KEY")
            .map_err(|_| MirrorError::MissingConfig("WORKSPACE_API_KEY".to_string()))?;
        Ok(Self::new(base_url, api_key))
    }

    /// Build a client against an explicit endpoint.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            agent: ureq::Agent::new(),
        }
    }
}

impl WorkspacePages for WorkspaceClient {
    fn create_page(
        &self,
        collection: &str,
        title: &str,
        properties: &serde_json::Value,
    ) -> std::result::Result<String, MirrorError> {
        let url = format!("{}/pages", self.base_url);
        let body = serde_json::json!({
            "collection": collection,
            "title": title,
            "properties": properties,
        });

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(body);

        match response {
            Ok(resp) => {
                let parsed: serde_json::Value = resp
                    .into_json()
                    .map_err(|e| MirrorError::InvalidResponse(e.to_string()))?;
                parsed
                    .get("id")
                    .and_then(|id| id.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        MirrorError::InvalidResponse("page response missing 'id'".to_string())
                    })
            }
            Err(ureq::Error::Status(status, resp)) => Err(MirrorError::Api {
                status,
                message: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(MirrorError::Http(e.to_string())),
        }
    }

    fn archive_page(&self, page_id: &str) -> std::result::Result<(), MirrorError> {
        let url = format!("{}/pages/{}/archive", self.base_url, page_id);
        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .call();

        match response {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, resp)) => Err(MirrorError::Api {
                status,
                message: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(MirrorError::Http(e.to_string())),
        }
    }
}

/// Per-collection outcome of a sync.
#[derive(Debug, Serialize)]
pub struct CollectionSync {
    pub collection: String,
    pub archived: usize,
    pub created: usize,
}

/// Result of `mctl mirror sync`.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub collections: Vec<CollectionSync>,
}

impl Output for SyncReport {
    fn to_human(&self) -> String {
        self.collections
            .iter()
            .map(|c| {
                format!(
                    "{}: archived {}, created {}",
                    c.collection, c.archived, c.created
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn pages_config_key(collection: &str) -> String {
    format!("mirror_pages_{}", collection)
}

/// Snapshot a collection as (title, properties) pairs for page creation.
fn snapshot(storage: &Storage, collection: &str) -> Result<Vec<(String, serde_json::Value)>> {
    fn pages<T: Record>(
        storage: &Storage,
        title_of: impl Fn(&T) -> String,
    ) -> Result<Vec<(String, serde_json::Value)>> {
        let docs: Vec<T> = storage.scan(Order::Asc)?;
        docs.into_iter()
            .map(|doc| {
                let title = title_of(&doc);
                Ok((title, serde_json::to_value(&doc)?))
            })
            .collect()
    }

    match collection {
        Project::COLLECTION => pages::<Project>(storage, |p| p.name.clone()),
        Task::COLLECTION => pages::<Task>(storage, |t| t.title.clone()),
        ContentItem::COLLECTION => pages::<ContentItem>(storage, |c| c.title.clone()),
        ScheduledEvent::COLLECTION => pages::<ScheduledEvent>(storage, |e| e.title.clone()),
        MemoryDocument::COLLECTION => pages::<MemoryDocument>(storage, |d| d.title.clone()),
        TeamMember::COLLECTION => pages::<TeamMember>(storage, |m| m.name.clone()),
        other => Err(crate::Error::Other(format!(
            "Unknown mirrored collection: {}",
            other
        ))),
    }
}

/// Push the current store state to the workspace.
///
/// For each mirrored collection: archive the pages recorded by the previous
/// sync, recreate one page per record, and remember the new page ids. A page
/// that fails to archive is logged and skipped; it stays behind in the
/// workspace but is no longer tracked.
pub fn mirror_sync(storage: &mut Storage, workspace: &impl WorkspacePages) -> Result<SyncReport> {
    let mut report = SyncReport {
        collections: Vec::new(),
    };

    for collection in MIRRORED_COLLECTIONS {
        let key = pages_config_key(collection);

        let previous: Vec<String> = match storage.get_config(&key)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };

        let mut archived = 0;
        for page_id in &previous {
            match workspace.archive_page(page_id) {
                Ok(()) => archived += 1,
                Err(e) => eprintln!("Warning: failed to archive page {}: {}", page_id, e),
            }
        }

        let mut created_ids = Vec::new();
        for (title, properties) in snapshot(storage, collection)? {
            let page_id = workspace.create_page(collection, &title, &properties)?;
            created_ids.push(page_id);
        }

        let created = created_ids.len();
        storage.set_config(&key, &serde_json::to_string(&created_ids)?)?;

        report.collections.push(CollectionSync {
            collection: collection.to_string(),
            archived,
            created,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tasks::{TaskCreateArgs, task_create};
    use crate::commands::team::{member_create, tests::create_args};
    use crate::models::{HierarchyLevel, Priority, TaskStatus};
    use crate::test_utils::TestEnv;
    use std::cell::RefCell;

    /// In-memory workspace that records calls and hands out sequential ids.
    #[derive(Default)]
    struct FakeWorkspace {
        created: RefCell<Vec<(String, String)>>,
        archived: RefCell<Vec<String>>,
        next_id: RefCell<usize>,
    }

    impl WorkspacePages for FakeWorkspace {
        fn create_page(
            &self,
            collection: &str,
            title: &str,
            _properties: &serde_json::Value,
        ) -> std::result::Result<String, MirrorError> {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            let id = format!("page-{}", *next);
            self.created
                .borrow_mut()
                .push((collection.to_string(), title.to_string()));
            Ok(id)
        }

        fn archive_page(&self, page_id: &str) -> std::result::Result<(), MirrorError> {
            self.archived.borrow_mut().push(page_id.to_string());
            Ok(())
        }
    }

    fn seed_task(storage: &mut Storage, title: &str) {
        task_create(
            storage,
            TaskCreateArgs {
                title: title.to_string(),
                description: None,
                status: TaskStatus::Backlog,
                priority: Priority::Medium,
                assignee_id: None,
                agent_assignee_id: None,
                project_id: None,
                due_date: None,
                tags: Vec::new(),
                estimated_hours: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_first_sync_creates_pages_and_records_ids() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        seed_task(&mut storage, "mirror me");
        member_create(&mut storage, create_args("Scout", HierarchyLevel::Specialist)).unwrap();

        let workspace = FakeWorkspace::default();
        let report = mirror_sync(&mut storage, &workspace).unwrap();

        assert_eq!(report.collections.len(), MIRRORED_COLLECTIONS.len());
        let tasks = report
            .collections
            .iter()
            .find(|c| c.collection == "tasks")
            .unwrap();
        assert_eq!(tasks.created, 1);
        assert_eq!(tasks.archived, 0);

        let recorded = storage.get_config("mirror_pages_tasks").unwrap().unwrap();
        let ids: Vec<String> = serde_json::from_str(&recorded).unwrap();
        assert_eq!(ids.len(), 1);

        let created = workspace.created.borrow();
        assert!(created.contains(&("tasks".to_string(), "mirror me".to_string())));
        assert!(created.contains(&("team_members".to_string(), "Scout".to_string())));
    }

    #[test]
    fn test_second_sync_archives_previous_pages() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        seed_task(&mut storage, "round one");

        let workspace = FakeWorkspace::default();
        mirror_sync(&mut storage, &workspace).unwrap();

        seed_task(&mut storage, "round two");
        let report = mirror_sync(&mut storage, &workspace).unwrap();

        let tasks = report
            .collections
            .iter()
            .find(|c| c.collection == "tasks")
            .unwrap();
        assert_eq!(tasks.archived, 1);
        assert_eq!(tasks.created, 2);

        let archived = workspace.archived.borrow();
        assert_eq!(archived.len(), 1);
    }

    #[test]
    fn test_sync_on_empty_store_reports_zeroes() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let workspace = FakeWorkspace::default();
        let report = mirror_sync(&mut storage, &workspace).unwrap();
        assert!(report.collections.iter().all(|c| c.created == 0));
        assert!(workspace.created.borrow().is_empty());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = WorkspaceClient::new("https://api.example.com/".to_string(), "k".to_string());
        assert_eq!(client.base_url, "https://api.example.com");
    }
}
