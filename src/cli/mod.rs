//! CLI argument definitions for missionctl.

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::models::{
    AgentStatus, ContentStage, ContentType, EventStatus, EventType, HierarchyLevel,
    MemoryCategory, Priority, SessionStatus, TaskStatus, UserRole,
};

/// Missionctl - a mission-control dashboard for teams of humans and AI agents.
#[derive(Parser, Debug)]
#[command(name = "mctl")]
#[command(author, version, about = "Team, task, and agent-session tracking from the command line", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if mctl was started in <path> instead of the current directory.
    /// The path is used literally, bypassing git root detection.
    /// Can also be set via the MC_REPO environment variable.
    #[arg(short = 'C', long = "repo", global = true, env = "MC_REPO")]
    pub repo_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug, Serialize)]
pub enum Commands {
    /// Store management commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Kanban task commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Project commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Content pipeline commands
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },

    /// Calendar and scheduled event commands
    Calendar {
        #[command(subcommand)]
        command: CalendarCommands,
    },

    /// Knowledge base commands
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },

    /// Agent roster commands
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },

    /// Agent session lifecycle commands
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// User commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Workspace mirror commands
    Mirror {
        #[command(subcommand)]
        command: MirrorCommands,
    },

    /// Run the HTTP API server
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 7171)]
        port: u16,
    },
}

/// Store management commands
#[derive(Subcommand, Debug, Serialize)]
pub enum SystemCommands {
    /// Initialize the store for this workspace (idempotent)
    Init,

    /// Show version and build information
    Version,
}

/// Configuration commands
#[derive(Subcommand, Debug, Serialize)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to store
        value: String,
    },

    /// List all configuration values
    List,
}

/// Kanban task commands
#[derive(Subcommand, Debug, Serialize)]
pub enum TaskCommands {
    /// List tasks, optionally filtered
    List {
        /// Filter by status column
        #[arg(long)]
        status: Option<TaskStatus>,

        /// Filter by project id
        #[arg(long)]
        project: Option<String>,

        /// Filter by assignee user id
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Show a task with its assignee and project
    Show {
        /// Task id (e.g., tsk-a1b2c3)
        id: String,
    },

    /// Show task dashboard metrics
    Metrics,

    /// Create a task
    Create {
        /// Task title
        title: String,

        /// Detailed description
        #[arg(long)]
        description: Option<String>,

        /// Status column to create in
        #[arg(long, default_value = "backlog")]
        status: TaskStatus,

        /// Priority level
        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Assignee user id
        #[arg(long)]
        assignee: Option<String>,

        /// Assignee agent id
        #[arg(long)]
        agent: Option<String>,

        /// Owning project id
        #[arg(long)]
        project: Option<String>,

        /// Due date (Unix ms)
        #[arg(long)]
        due: Option<i64>,

        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Estimated effort in hours
        #[arg(long)]
        estimate: Option<f64>,
    },

    /// Update task fields
    Update {
        /// Task id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long)]
        assignee: Option<String>,

        #[arg(long)]
        agent: Option<String>,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        due: Option<i64>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        estimate: Option<f64>,

        /// Actual effort in hours
        #[arg(long)]
        actual: Option<f64>,

        /// Acting user id for the activity trail
        #[arg(long)]
        user: Option<String>,
    },

    /// Move a task to another status column
    Status {
        /// Task id
        id: String,

        /// Target status column
        status: TaskStatus,

        /// Explicit position within the column
        #[arg(long)]
        order: Option<i64>,

        /// Acting user id for the activity trail
        #[arg(long)]
        user: Option<String>,
    },

    /// Delete a task and its comments and activity
    Delete {
        /// Task id
        id: String,
    },

    /// Add a comment to a task
    Comment {
        /// Task id
        id: String,

        /// Comment body
        content: String,

        /// Authoring user id
        #[arg(long)]
        user: String,
    },

    /// List a task's comments
    Comments {
        /// Task id
        id: String,
    },

    /// Show a task's activity trail
    Activity {
        /// Task id
        id: String,
    },
}

/// Project commands
#[derive(Subcommand, Debug, Serialize)]
pub enum ProjectCommands {
    /// List projects with task counts
    List,

    /// Show a project with its owner and task counts
    Show {
        /// Project id (e.g., prj-a1b2c3)
        id: String,
    },

    /// Create a project
    Create {
        /// Project name
        name: String,

        /// Owning user id
        #[arg(long)]
        owner: String,

        /// Detailed description
        #[arg(long)]
        description: Option<String>,

        /// Hex display color
        #[arg(long, default_value = "#6366f1")]
        color: String,
    },

    /// Update project fields
    Update {
        /// Project id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Delete a project and all of its tasks
    Delete {
        /// Project id
        id: String,
    },
}

/// Content pipeline commands
#[derive(Subcommand, Debug, Serialize)]
pub enum ContentCommands {
    /// List content, optionally filtered
    List {
        /// Filter by pipeline stage
        #[arg(long)]
        stage: Option<ContentStage>,

        /// Filter by project id
        #[arg(long)]
        project: Option<String>,
    },

    /// Show pipeline metrics
    Metrics,

    /// Create a content item
    Create {
        /// Content title
        title: String,

        /// Pipeline stage to create in
        #[arg(long, default_value = "ideas")]
        stage: ContentStage,

        /// Kind of content
        #[arg(long = "type", default_value = "video")]
        content_type: ContentType,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        script: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        #[arg(long)]
        project: Option<String>,

        /// Due date (Unix ms)
        #[arg(long)]
        due: Option<i64>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        estimate: Option<f64>,
    },

    /// Update content fields
    Update {
        /// Content id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long = "type")]
        content_type: Option<ContentType>,

        #[arg(long)]
        script: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        due: Option<i64>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        estimate: Option<f64>,
    },

    /// Move a content item to another pipeline stage
    Stage {
        /// Content id
        id: String,

        /// Target stage
        stage: ContentStage,

        /// Explicit position within the stage
        #[arg(long)]
        order: Option<i64>,
    },

    /// Delete a content item
    Delete {
        /// Content id
        id: String,
    },
}

/// Calendar commands
#[derive(Subcommand, Debug, Serialize)]
pub enum CalendarCommands {
    /// List events, optionally within a time range
    List {
        /// Range start (Unix ms); only applied together with --end
        #[arg(long)]
        start: Option<i64>,

        /// Range end (Unix ms); only applied together with --start
        #[arg(long)]
        end: Option<i64>,

        /// Filter by event type
        #[arg(long = "type")]
        event_type: Option<EventType>,
    },

    /// List cron-type events
    Cron,

    /// Show calendar week metrics
    Metrics,

    /// Create a pending event
    Create {
        /// Event title
        title: String,

        /// When the event is scheduled (Unix ms)
        #[arg(long)]
        at: i64,

        /// Kind of event
        #[arg(long = "type", default_value = "meeting")]
        event_type: EventType,

        #[arg(long, default_value = "medium")]
        priority: Priority,

        #[arg(long)]
        description: Option<String>,

        /// Planned duration in minutes
        #[arg(long)]
        duration: Option<i64>,

        /// Cron expression for cron-type events
        #[arg(long)]
        cron: Option<String>,

        /// Mark the event as recurring
        #[arg(long)]
        recurring: bool,

        /// Human-readable recurrence pattern
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        /// Linked task id
        #[arg(long)]
        task: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Update event fields
    Update {
        /// Event id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// New scheduled time (Unix ms)
        #[arg(long)]
        at: Option<i64>,

        #[arg(long)]
        duration: Option<i64>,

        #[arg(long)]
        status: Option<EventStatus>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long)]
        assignee: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Mark an event completed
    Complete {
        /// Event id
        id: String,

        /// Notes recorded at completion
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete an event
    Delete {
        /// Event id
        id: String,
    },
}

/// Knowledge base commands
#[derive(Subcommand, Debug, Serialize)]
pub enum MemoryCommands {
    /// List documents, optionally filtered
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<MemoryCategory>,

        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,

        /// Maximum number of documents
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a document with its author and related documents
    Show {
        /// Document id (e.g., doc-a1b2c3)
        id: String,
    },

    /// Search documents by keyword
    Search {
        /// Query; terms are ANDed together
        query: String,

        /// Restrict the search to one category
        #[arg(long)]
        category: Option<MemoryCategory>,

        /// Maximum number of results
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show knowledge base stats
    Stats,

    /// List the most recently created documents
    Recent {
        /// Maximum number of documents
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Create a document
    Create {
        /// Document title
        title: String,

        /// Document body
        content: String,

        #[arg(long)]
        summary: Option<String>,

        #[arg(long, default_value = "reference")]
        category: MemoryCategory,

        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Authoring user id
        #[arg(long)]
        author: Option<String>,

        /// Where the content came from
        #[arg(long)]
        source: Option<String>,

        /// Related document ids (repeatable)
        #[arg(long = "related")]
        related: Vec<String>,
    },

    /// Update document fields
    Update {
        /// Document id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        summary: Option<String>,

        #[arg(long)]
        category: Option<MemoryCategory>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        source: Option<String>,

        #[arg(long = "related")]
        related: Vec<String>,
    },

    /// Delete a document
    Delete {
        /// Document id
        id: String,
    },
}

/// Agent roster commands
#[derive(Subcommand, Debug, Serialize)]
pub enum TeamCommands {
    /// List the roster with recent session activity
    List,

    /// Show a member with recent session activity
    Show {
        /// Agent id (e.g., agt-a1b2c3)
        id: String,
    },

    /// Show the roster bucketed by hierarchy level
    Hierarchy,

    /// Show roster-wide metrics
    Metrics,

    /// Add an agent to the roster
    Create {
        /// Agent name
        name: String,

        /// Role description
        #[arg(long)]
        role: String,

        /// Backing AI model identifier
        #[arg(long)]
        model: String,

        /// Position in the team hierarchy
        #[arg(long, default_value = "specialist")]
        level: HierarchyLevel,

        /// Hex display color
        #[arg(long, default_value = "#f59e0b")]
        color: String,

        #[arg(long)]
        description: Option<String>,

        /// Specialty areas (repeatable)
        #[arg(long = "specialty")]
        specialties: Vec<String>,

        /// Cost rate in dollars per hour
        #[arg(long)]
        cost: Option<f64>,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// Set a member's availability status
    Status {
        /// Agent id
        id: String,

        /// New status
        status: AgentStatus,
    },
}

/// Agent session lifecycle commands
#[derive(Subcommand, Debug, Serialize)]
pub enum SessionCommands {
    /// Start a session for an agent, marking it busy
    Spawn {
        /// Agent id
        agent: String,

        /// What the session will work on
        title: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Estimated duration in minutes
        #[arg(long)]
        duration: Option<i64>,

        /// Estimated cost in dollars
        #[arg(long)]
        cost: Option<f64>,
    },

    /// Move a session to a terminal status
    Complete {
        /// Session id (e.g., ses-a1b2c3)
        id: String,

        /// Terminal status to record
        #[arg(long, default_value = "completed")]
        status: SessionStatus,

        /// Result text
        #[arg(long)]
        result: Option<String>,

        /// Actual cost in dollars
        #[arg(long)]
        cost: Option<f64>,
    },

    /// List sessions newest-first
    List {
        /// Only sessions of this agent
        #[arg(long)]
        agent: Option<String>,

        /// Maximum number of sessions
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Cancel a session
    Kill {
        /// Session id
        id: String,
    },

    /// Redirect a session, completing it with the steering message
    Steer {
        /// Session id
        id: String,

        /// Steering message
        message: String,
    },
}

/// User commands
#[derive(Subcommand, Debug, Serialize)]
pub enum UserCommands {
    /// List users
    List,

    /// Show a user
    Show {
        /// User id (e.g., usr-a1b2c3)
        id: String,
    },

    /// Create a user
    Create {
        /// Display name
        name: String,

        /// Email address
        email: String,

        #[arg(long, default_value = "member")]
        role: UserRole,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// Update user fields
    Update {
        /// User id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        role: Option<UserRole>,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// Delete a user
    Delete {
        /// User id
        id: String,
    },
}

/// Workspace mirror commands
#[derive(Subcommand, Debug, Serialize)]
pub enum MirrorCommands {
    /// Push the current store state to the workspace
    Sync,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_enum_values_parse_from_cli() {
        let cli = Cli::try_parse_from([
            "mctl", "task", "create", "Write docs", "--status", "in_progress", "--priority",
            "urgent", "--tag", "docs", "--tag", "launch",
        ])
        .unwrap();
        match cli.command {
            Commands::Task {
                command:
                    TaskCommands::Create {
                        status,
                        priority,
                        tags,
                        ..
                    },
            } => {
                assert_eq!(status, TaskStatus::InProgress);
                assert_eq!(priority, Priority::Urgent);
                assert_eq!(tags, vec!["docs", "launch"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_enum_value_is_rejected() {
        let result = Cli::try_parse_from(["mctl", "task", "create", "x", "--status", "pending"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["mctl", "-H", "-C", "/tmp", "user", "list"]).unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.repo_path.as_deref(), Some(std::path::Path::new("/tmp")));
    }
}
