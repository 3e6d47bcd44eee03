//! Data models for missionctl entities.
//!
//! This module defines the core data structures backing the dashboard:
//! - `User` / `Project` - people and the projects they own
//! - `Task` + `Comment` / `Activity` - kanban work items and their audit trail
//! - `ContentItem` - content pipeline entries
//! - `ScheduledEvent` - calendar entries
//! - `MemoryDocument` - searchable knowledge base documents
//! - `TeamMember` / `AgentSession` - the AI agent roster and its work sessions
//!
//! All timestamps are Unix milliseconds stamped by the mutation layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fmt;

/// Current wall-clock time in Unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A document that lives in a named collection of the store.
pub trait Record: Serialize + DeserializeOwned {
    /// Collection (table) name in the document store.
    const COLLECTION: &'static str;

    /// Document identifier.
    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($ty:ty, $collection:literal) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let s = match self {
                    $($name::$variant => $s),+
                };
                write!(f, "{}", s)
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($s => Ok($name::$variant),)+
                    _ => Err(format!(
                        concat!("Unknown ", stringify!($name), ": {}"), s
                    )),
                }
            }
        }
    };
}

string_enum! {
    /// Role of a dashboard user.
    UserRole {
        Admin => "admin",
        Member => "member",
    }
}

string_enum! {
    /// Task status, driving which kanban column a task appears in.
    ///
    /// No transition graph is enforced: any status is reachable from any other.
    TaskStatus {
        Recurring => "recurring",
        Backlog => "backlog",
        InProgress => "in_progress",
        Review => "review",
        Done => "done",
    }
}

string_enum! {
    /// Priority level shared by tasks, events, and agent sessions.
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

string_enum! {
    /// Whether a task is assigned to a human user or an AI agent.
    AssigneeType {
        User => "user",
        Agent => "agent",
    }
}

string_enum! {
    /// Action recorded in a task's activity trail.
    ActivityAction {
        Created => "created",
        Updated => "updated",
        StatusChanged => "status_changed",
        Assigned => "assigned",
        Completed => "completed",
        Commented => "commented",
    }
}

string_enum! {
    /// Content pipeline stage. Ordering is a UI convention, not enforced here.
    ContentStage {
        Ideas => "ideas",
        Scripting => "scripting",
        Thumbnail => "thumbnail",
        Filming => "filming",
        Editing => "editing",
        Published => "published",
    }
}

string_enum! {
    /// Kind of content being produced.
    ContentType {
        Video => "video",
        Blog => "blog",
        Podcast => "podcast",
        Social => "social",
    }
}

string_enum! {
    /// Kind of scheduled event.
    EventType {
        Cron => "cron",
        Task => "task",
        Meeting => "meeting",
        Deadline => "deadline",
    }
}

string_enum! {
    /// Scheduled event status.
    EventStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    /// Memory document category.
    MemoryCategory {
        Personal => "personal",
        Project => "project",
        Learning => "learning",
        Reference => "reference",
        Archived => "archived",
    }
}

string_enum! {
    /// Position of an agent in the team hierarchy.
    HierarchyLevel {
        Lead => "lead",
        Senior => "senior",
        Specialist => "specialist",
        Support => "support",
    }
}

string_enum! {
    /// Availability status of a team member.
    ///
    /// `busy` is a coarse flag patched by the session lifecycle, not a count
    /// of running sessions.
    AgentStatus {
        Active => "active",
        Busy => "busy",
        Idle => "idle",
        Maintenance => "maintenance",
    }
}

string_enum! {
    /// Lifecycle status of an agent work session.
    ///
    /// `running` transitions to exactly one of the three terminal statuses.
    SessionStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl SessionStatus {
    /// Returns true for completed/failed/cancelled.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

/// A dashboard user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (e.g., "usr-a1b2c3")
    pub id: String,

    /// Display name
    pub name: String,

    /// Email address (uniqueness is not enforced)
    pub email: String,

    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Role within the dashboard
    pub role: UserRole,
}

impl User {
    /// Create a new user.
    pub fn new(id: String, name: String, email: String, role: UserRole) -> Self {
        Self {
            id,
            name,
            email,
            avatar: None,
            role,
        }
    }
}

/// A project grouping tasks and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (e.g., "prj-a1b2c3")
    pub id: String,

    /// Project name
    pub name: String,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Hex color for project identification in the UI
    pub color: String,

    /// Owning user ID
    pub owner_id: String,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,

    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Project {
    /// Create a new project.
    pub fn new(id: String, name: String, color: String, owner_id: String) -> Self {
        let now = now_ms();
        Self {
            id,
            name,
            description: None,
            color,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A kanban work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (e.g., "tsk-a1b2c3")
    pub id: String,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status (kanban column)
    pub status: TaskStatus,

    /// Priority level
    pub priority: Priority,

    /// Assigned human user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Assigned AI agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_assignee_id: Option<String>,

    /// Which kind of assignee this task carries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<AssigneeType>,

    /// Owning project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Due date (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Estimated effort in hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    /// Actual effort in hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,

    /// Sort position within the status column (display ordering only)
    pub order_index: i64,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,

    /// Last update timestamp (Unix ms)
    pub updated_at: i64,

    /// Set when status first reaches `done` (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl Task {
    /// Create a new task in the given status column.
    pub fn new(id: String, title: String, status: TaskStatus, priority: Priority) -> Self {
        let now = now_ms();
        Self {
            id,
            title,
            description: None,
            status,
            priority,
            assignee_id: None,
            agent_assignee_id: None,
            assignee_type: None,
            project_id: None,
            due_date: None,
            tags: Vec::new(),
            estimated_hours: None,
            actual_hours: None,
            order_index: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// A comment on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier (e.g., "cmt-a1b2c3")
    pub id: String,

    /// Parent task
    pub task_id: String,

    /// Authoring user
    pub user_id: String,

    /// Comment body
    pub content: String,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

/// An entry in a task's activity trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier (e.g., "act-a1b2c3")
    pub id: String,

    /// Parent task
    pub task_id: String,

    /// Acting user
    pub user_id: String,

    /// What happened
    pub action: ActivityAction,

    /// JSON-encoded action details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

/// An item in the content production pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier (e.g., "cnt-a1b2c3")
    pub id: String,

    /// Content title
    pub title: String,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Pipeline stage (UI column)
    pub stage: ContentStage,

    /// Kind of content
    pub content_type: ContentType,

    /// Script text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// Free-form notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Attachment URLs
    #[serde(default)]
    pub attachments: Vec<String>,

    /// Assigned user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Owning project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Due date (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Estimated effort in hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    /// Sort position; seeded from the creation timestamp unless explicit
    pub order_index: i64,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,

    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl ContentItem {
    /// Create a new content item. `order_index` is seeded from the creation time.
    pub fn new(id: String, title: String, stage: ContentStage, content_type: ContentType) -> Self {
        let now = now_ms();
        Self {
            id,
            title,
            description: None,
            stage,
            content_type,
            script: None,
            notes: None,
            attachments: Vec::new(),
            assignee_id: None,
            project_id: None,
            due_date: None,
            tags: Vec::new(),
            estimated_hours: None,
            order_index: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Unique identifier (e.g., "evt-a1b2c3")
    pub id: String,

    /// Event title
    pub title: String,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Kind of event
    pub event_type: EventType,

    /// When the event is scheduled (Unix ms)
    pub scheduled_at: i64,

    /// Planned duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Cron expression for cron-type events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,

    /// Whether the event recurs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring: Option<bool>,

    /// Human-readable recurrence pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<String>,

    /// Current status
    pub status: EventStatus,

    /// Assigned user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Linked task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Priority level
    pub priority: Priority,

    /// Display color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Completion timestamp (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,

    /// Notes recorded at completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,

    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl ScheduledEvent {
    /// Create a new pending event.
    pub fn new(
        id: String,
        title: String,
        event_type: EventType,
        scheduled_at: i64,
        priority: Priority,
    ) -> Self {
        let now = now_ms();
        Self {
            id,
            title,
            description: None,
            event_type,
            scheduled_at,
            duration: None,
            cron_expression: None,
            recurring: None,
            recurring_pattern: None,
            status: EventStatus::Pending,
            assignee_id: None,
            task_id: None,
            priority,
            color: None,
            completed_at: None,
            completion_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A knowledge base document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Unique identifier (e.g., "doc-a1b2c3")
    pub id: String,

    /// Document title
    pub title: String,

    /// Document body
    pub content: String,

    /// Short summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Category bucket
    pub category: MemoryCategory,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Authoring user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    /// Where the content came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Attachment URLs
    #[serde(default)]
    pub attachments: Vec<String>,

    /// IDs of related memory documents
    #[serde(default)]
    pub related_documents: Vec<String>,

    /// Word count, recomputed from `content` on create and update
    pub word_count: usize,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,

    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl MemoryDocument {
    /// Create a new document. Word count is derived from the content.
    pub fn new(id: String, title: String, content: String, category: MemoryCategory) -> Self {
        let now = now_ms();
        let word_count = count_words(&content);
        Self {
            id,
            title,
            content,
            summary: None,
            category,
            tags: Vec::new(),
            author_id: None,
            source_url: None,
            attachments: Vec::new(),
            related_documents: Vec::new(),
            word_count,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Count whitespace-separated words in a document body.
pub fn count_words(content: &str) -> usize {
    content.split_whitespace().count()
}

/// An AI agent on the team roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Unique identifier (e.g., "agt-a1b2c3")
    pub id: String,

    /// Agent name
    pub name: String,

    /// Role description (free text)
    pub role: String,

    /// Backing AI model identifier
    pub ai_model: String,

    /// Position in the team hierarchy
    pub hierarchy_level: HierarchyLevel,

    /// Specialty areas
    #[serde(default)]
    pub specialties: Vec<String>,

    /// Detailed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Display color
    pub color: String,

    /// Availability status, kept in sync with sessions by the lifecycle layer
    pub status: AgentStatus,

    /// Cost rate in dollars per hour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_hour: Option<f64>,

    /// Count of completed lifecycle transitions (all terminal outcomes)
    pub total_sessions: u64,

    /// Accumulated session hours
    pub total_hours: f64,

    /// Success rate percentage
    pub success_rate: f64,

    /// Last time the agent returned to `active` (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_at: Option<i64>,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,

    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl TeamMember {
    /// Create a new active team member with zeroed session counters.
    pub fn new(
        id: String,
        name: String,
        role: String,
        ai_model: String,
        hierarchy_level: HierarchyLevel,
        color: String,
    ) -> Self {
        let now = now_ms();
        Self {
            id,
            name,
            role,
            ai_model,
            hierarchy_level,
            specialties: Vec::new(),
            description: None,
            avatar: None,
            color,
            status: AgentStatus::Active,
            cost_per_hour: None,
            total_sessions: 0,
            total_hours: 0.0,
            success_rate: 100.0,
            last_active_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One unit of work performed by a team member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    /// Unique identifier (e.g., "ses-a1b2c3")
    pub id: String,

    /// Owning team member
    pub agent_id: String,

    /// What the session is working on
    pub task_title: String,

    /// Detailed task description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Priority level
    pub priority: Priority,

    /// Estimated duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<i64>,

    /// Estimated cost in dollars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,

    /// Actual cost in dollars, recorded at completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<f64>,

    /// Actual duration in minutes, derived once at completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Result text recorded at completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// When the session started (Unix ms)
    pub started_at: i64,

    /// When the session reached a terminal status (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,

    /// Creation timestamp (Unix ms)
    pub created_at: i64,

    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl AgentSession {
    /// Create a new running session starting now.
    pub fn new(id: String, agent_id: String, task_title: String, priority: Priority) -> Self {
        let now = now_ms();
        Self {
            id,
            agent_id,
            task_title,
            task_description: None,
            status: SessionStatus::Running,
            priority,
            estimated_duration: None,
            estimated_cost: None,
            actual_cost: None,
            duration: None,
            result: None,
            started_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_record!(User, "users");
impl_record!(Project, "projects");
impl_record!(Task, "tasks");
impl_record!(Comment, "comments");
impl_record!(Activity, "activity");
impl_record!(ContentItem, "content");
impl_record!(ScheduledEvent, "scheduled_events");
impl_record!(MemoryDocument, "memory_documents");
impl_record!(TeamMember, "team_members");
impl_record!(AgentSession, "agent_sessions");

/// All collection names, in mirror/export order.
pub const COLLECTIONS: &[&str] = &[
    User::COLLECTION,
    Project::COLLECTION,
    Task::COLLECTION,
    Comment::COLLECTION,
    Activity::COLLECTION,
    ContentItem::COLLECTION,
    ScheduledEvent::COLLECTION,
    MemoryDocument::COLLECTION,
    TeamMember::COLLECTION,
    AgentSession::COLLECTION,
];
