//! Task commands: kanban CRUD, metrics, comments, and the activity trail.

use serde::Serialize;

use super::Output;
use crate::models::{
    Activity, ActivityAction, AssigneeType, Comment, Priority, Project, Task, TaskStatus, User,
    now_ms,
};
use crate::storage::{Order, Storage, generate_id};
use crate::Result;

/// A task with its assignee and project resolved.
#[derive(Debug, Serialize)]
pub struct TaskWithDetails {
    #[serde(flatten)]
    pub task: Task,
    /// Resolved human assignee, when the id still points at a user
    pub assignee: Option<User>,
    /// Resolved project, when the id still points at a project
    pub project: Option<Project>,
}

/// Result of `mctl task list`.
#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<TaskWithDetails>,
}

impl Output for TaskList {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks found".to_string();
        }
        self.tasks
            .iter()
            .map(|t| {
                let project = t
                    .project
                    .as_ref()
                    .map(|p| format!(" ({})", p.name))
                    .unwrap_or_default();
                format!(
                    "{}  [{}] {}  {}{}",
                    t.task.id, t.task.status, t.task.priority, t.task.title, project
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for TaskWithDetails {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{}  {}", self.task.id, self.task.title),
            format!("  status: {}  priority: {}", self.task.status, self.task.priority),
        ];
        if let Some(desc) = &self.task.description {
            lines.push(format!("  {}", desc));
        }
        if let Some(assignee) = &self.assignee {
            lines.push(format!("  assignee: {}", assignee.name));
        }
        if let Some(project) = &self.project {
            lines.push(format!("  project: {}", project.name));
        }
        if !self.task.tags.is_empty() {
            lines.push(format!("  tags: {}", self.task.tags.join(", ")));
        }
        lines.join("\n")
    }
}

impl Output for Task {
    fn to_human(&self) -> String {
        format!("{}  [{}] {}", self.id, self.status, self.title)
    }
}

/// Filters for `task list`. All optional, combined with AND.
#[derive(Debug, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub project_id: Option<String>,
    pub assignee_id: Option<String>,
}

/// List tasks newest-first, with assignee and project joined in batch.
pub fn task_list(storage: &Storage, filter: &TaskFilter) -> Result<TaskList> {
    let tasks: Vec<Task> = storage.scan(Order::Desc)?;
    let tasks: Vec<Task> = tasks
        .into_iter()
        .filter(|t| filter.status.is_none_or(|s| t.status == s))
        .filter(|t| {
            filter
                .project_id
                .as_deref()
                .is_none_or(|p| t.project_id.as_deref() == Some(p))
        })
        .filter(|t| {
            filter
                .assignee_id
                .as_deref()
                .is_none_or(|a| t.assignee_id.as_deref() == Some(a))
        })
        .collect();

    let user_ids: Vec<&str> = tasks.iter().filter_map(|t| t.assignee_id.as_deref()).collect();
    let project_ids: Vec<&str> = tasks.iter().filter_map(|t| t.project_id.as_deref()).collect();
    let users = storage.get_many::<User>(&user_ids)?;
    let projects = storage.get_many::<Project>(&project_ids)?;

    let tasks = tasks
        .into_iter()
        .map(|task| {
            let assignee = task
                .assignee_id
                .as_deref()
                .and_then(|id| users.get(id).cloned());
            let project = task
                .project_id
                .as_deref()
                .and_then(|id| projects.get(id).cloned());
            TaskWithDetails {
                task,
                assignee,
                project,
            }
        })
        .collect();

    Ok(TaskList { tasks })
}

/// Show a single task with its assignee and project resolved.
pub fn task_show(storage: &Storage, task_id: &str) -> Result<TaskWithDetails> {
    let task: Task = storage.get(task_id)?;
    let assignee = match task.assignee_id.as_deref() {
        Some(id) => storage.try_get(id)?,
        None => None,
    };
    let project = match task.project_id.as_deref() {
        Some(id) => storage.try_get(id)?,
        None => None,
    };
    Ok(TaskWithDetails {
        task,
        assignee,
        project,
    })
}

/// Task counts per kanban column.
#[derive(Debug, Serialize)]
pub struct TaskStatusCounts {
    pub recurring: usize,
    pub backlog: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
}

/// Result of `mctl task metrics`.
#[derive(Debug, Serialize)]
pub struct TaskMetrics {
    pub total: usize,
    /// Tasks created in the trailing seven days
    pub this_week: usize,
    pub in_progress: usize,
    /// Share of tasks that are done, rounded to a whole percent
    pub completion_percentage: u32,
    pub by_status: TaskStatusCounts,
}

impl Output for TaskMetrics {
    fn to_human(&self) -> String {
        format!(
            "{} tasks ({} this week, {} in progress, {}% done)\n\
             recurring: {}  backlog: {}  in_progress: {}  review: {}  done: {}",
            self.total,
            self.this_week,
            self.in_progress,
            self.completion_percentage,
            self.by_status.recurring,
            self.by_status.backlog,
            self.by_status.in_progress,
            self.by_status.review,
            self.by_status.done,
        )
    }
}

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Compute dashboard metrics across all tasks.
pub fn task_metrics(storage: &Storage) -> Result<TaskMetrics> {
    let tasks: Vec<Task> = storage.scan(Order::Asc)?;
    let week_ago = now_ms() - WEEK_MS;

    let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
    let by_status = TaskStatusCounts {
        recurring: count(TaskStatus::Recurring),
        backlog: count(TaskStatus::Backlog),
        in_progress: count(TaskStatus::InProgress),
        review: count(TaskStatus::Review),
        done: count(TaskStatus::Done),
    };

    let total = tasks.len();
    let completion_percentage = if total > 0 {
        ((by_status.done as f64 / total as f64) * 100.0).round() as u32
    } else {
        0
    };

    Ok(TaskMetrics {
        total,
        this_week: tasks.iter().filter(|t| t.created_at > week_ago).count(),
        in_progress: by_status.in_progress,
        completion_percentage,
        by_status,
    })
}

/// Arguments for `mctl task create`.
#[derive(Debug)]
pub struct TaskCreateArgs {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: Option<String>,
    pub agent_assignee_id: Option<String>,
    pub project_id: Option<String>,
    pub due_date: Option<i64>,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
}

/// Create a task at the bottom of its status column.
///
/// The new task's `order_index` is one past the current maximum in the target
/// column, so a simultaneous create into the same column can produce a
/// duplicate index. Display ordering tolerates ties.
pub fn task_create(storage: &mut Storage, args: TaskCreateArgs) -> Result<Task> {
    let max_order = storage
        .scan::<Task>(Order::Asc)?
        .into_iter()
        .filter(|t| t.status == args.status)
        .map(|t| t.order_index)
        .max()
        .unwrap_or(0);

    let mut task = Task::new(
        generate_id("tsk", &args.title),
        args.title,
        args.status,
        args.priority,
    );
    task.description = args.description;
    task.assignee_id = args.assignee_id;
    task.agent_assignee_id = args.agent_assignee_id;
    task.assignee_type = if task.agent_assignee_id.is_some() {
        Some(AssigneeType::Agent)
    } else if task.assignee_id.is_some() {
        Some(AssigneeType::User)
    } else {
        None
    };
    task.project_id = args.project_id;
    task.due_date = args.due_date;
    task.tags = args.tags;
    task.estimated_hours = args.estimated_hours;
    task.order_index = max_order + 1;

    storage.with_transaction(|s| {
        s.insert(&task)?;
        // The trail only gets a "created" row when there is someone to pin it on.
        if let Some(user_id) = task.assignee_id.clone() {
            s.insert(&Activity {
                id: generate_id("act", &task.id),
                task_id: task.id.clone(),
                user_id,
                action: ActivityAction::Created,
                details: None,
                created_at: now_ms(),
            })?;
        }
        Ok(())
    })?;

    Ok(task)
}

/// Arguments for `mctl task update`. Unset fields are left unchanged.
#[derive(Debug, Default)]
pub struct TaskUpdateArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
    pub agent_assignee_id: Option<String>,
    pub project_id: Option<String>,
    pub due_date: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    /// Acting user for the activity trail
    pub user_id: Option<String>,
}

/// Patch task fields and append an `updated` activity row.
pub fn task_update(storage: &mut Storage, task_id: &str, args: TaskUpdateArgs) -> Result<Task> {
    let mut task: Task = storage.get(task_id)?;

    let mut changed: Vec<&str> = Vec::new();
    if let Some(title) = args.title {
        task.title = title;
        changed.push("title");
    }
    if let Some(description) = args.description {
        task.description = Some(description);
        changed.push("description");
    }
    if let Some(priority) = args.priority {
        task.priority = priority;
        changed.push("priority");
    }
    if let Some(assignee_id) = args.assignee_id {
        task.assignee_id = Some(assignee_id);
        task.assignee_type = Some(AssigneeType::User);
        changed.push("assignee_id");
    }
    if let Some(agent_assignee_id) = args.agent_assignee_id {
        task.agent_assignee_id = Some(agent_assignee_id);
        task.assignee_type = Some(AssigneeType::Agent);
        changed.push("agent_assignee_id");
    }
    if let Some(project_id) = args.project_id {
        task.project_id = Some(project_id);
        changed.push("project_id");
    }
    if let Some(due_date) = args.due_date {
        task.due_date = Some(due_date);
        changed.push("due_date");
    }
    if let Some(tags) = args.tags {
        task.tags = tags;
        changed.push("tags");
    }
    if let Some(estimated_hours) = args.estimated_hours {
        task.estimated_hours = Some(estimated_hours);
        changed.push("estimated_hours");
    }
    if let Some(actual_hours) = args.actual_hours {
        task.actual_hours = Some(actual_hours);
        changed.push("actual_hours");
    }
    task.updated_at = now_ms();

    // Acting user defaults to the task id when no user was supplied; the
    // dashboard passes the signed-in user here, the CLI often has none.
    let acting_user = args.user_id.unwrap_or_else(|| task.id.clone());

    storage.with_transaction(|s| {
        s.put(&task)?;
        s.insert(&Activity {
            id: generate_id("act", &task.id),
            task_id: task.id.clone(),
            user_id: acting_user,
            action: ActivityAction::Updated,
            details: Some(serde_json::json!({ "fields": changed }).to_string()),
            created_at: now_ms(),
        })?;
        Ok(())
    })?;

    Ok(task)
}

/// Move a task to a new status column.
///
/// Sets `completed_at` the first time the task reaches `done`; moving a done
/// task back out of the column leaves the stamp in place.
pub fn task_update_status(
    storage: &mut Storage,
    task_id: &str,
    status: TaskStatus,
    order_index: Option<i64>,
    user_id: Option<&str>,
) -> Result<Task> {
    let mut task: Task = storage.get(task_id)?;

    task.status = status;
    if let Some(order_index) = order_index {
        task.order_index = order_index;
    }
    task.updated_at = now_ms();
    if status == TaskStatus::Done && task.completed_at.is_none() {
        task.completed_at = Some(now_ms());
    }

    let acting_user = user_id.map(str::to_string).unwrap_or_else(|| task.id.clone());

    storage.with_transaction(|s| {
        s.put(&task)?;
        s.insert(&Activity {
            id: generate_id("act", &task.id),
            task_id: task.id.clone(),
            user_id: acting_user,
            action: ActivityAction::StatusChanged,
            details: Some(serde_json::json!({ "new_status": status }).to_string()),
            created_at: now_ms(),
        })?;
        Ok(())
    })?;

    Ok(task)
}

/// Result of `mctl task delete`.
#[derive(Debug, Serialize)]
pub struct TaskDeleted {
    pub id: String,
    pub deleted_comments: usize,
    pub deleted_activity: usize,
}

impl Output for TaskDeleted {
    fn to_human(&self) -> String {
        format!(
            "Deleted {} ({} comments, {} activity entries)",
            self.id, self.deleted_comments, self.deleted_activity
        )
    }
}

/// Delete a task and cascade to its comments and activity trail.
pub fn task_delete(storage: &mut Storage, task_id: &str) -> Result<TaskDeleted> {
    // Read-before-delete so a missing id fails before any cascade work.
    let task: Task = storage.get(task_id)?;

    storage.with_transaction(|s| {
        let comments: Vec<Comment> = s.scan(Order::Asc)?;
        let mut deleted_comments = 0;
        for comment in comments.iter().filter(|c| c.task_id == task.id) {
            s.delete::<Comment>(&comment.id)?;
            deleted_comments += 1;
        }

        let activity: Vec<Activity> = s.scan(Order::Asc)?;
        let mut deleted_activity = 0;
        for entry in activity.iter().filter(|a| a.task_id == task.id) {
            s.delete::<Activity>(&entry.id)?;
            deleted_activity += 1;
        }

        s.delete::<Task>(&task.id)?;

        Ok(TaskDeleted {
            id: task.id.clone(),
            deleted_comments,
            deleted_activity,
        })
    })
}

/// A comment with its author resolved.
#[derive(Debug, Serialize)]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<User>,
}

/// Result of `mctl task comments`.
#[derive(Debug, Serialize)]
pub struct CommentList {
    pub comments: Vec<CommentWithUser>,
}

impl Output for CommentList {
    fn to_human(&self) -> String {
        if self.comments.is_empty() {
            return "No comments".to_string();
        }
        self.comments
            .iter()
            .map(|c| {
                let author = c.user.as_ref().map(|u| u.name.as_str()).unwrap_or("?");
                format!("{}  {}: {}", c.comment.id, author, c.comment.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for Comment {
    fn to_human(&self) -> String {
        format!("{}  on {}: {}", self.id, self.task_id, self.content)
    }
}

/// Add a comment to a task and append a `commented` activity row.
pub fn comment_add(
    storage: &mut Storage,
    task_id: &str,
    user_id: &str,
    content: &str,
) -> Result<Comment> {
    let task: Task = storage.get(task_id)?;

    let comment = Comment {
        id: generate_id("cmt", content),
        task_id: task.id.clone(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        created_at: now_ms(),
    };

    storage.with_transaction(|s| {
        s.insert(&comment)?;
        s.insert(&Activity {
            id: generate_id("act", &comment.id),
            task_id: task.id.clone(),
            user_id: comment.user_id.clone(),
            action: ActivityAction::Commented,
            details: None,
            created_at: now_ms(),
        })?;
        Ok(())
    })?;

    Ok(comment)
}

/// List a task's comments oldest-first, with authors joined in batch.
pub fn comment_list(storage: &Storage, task_id: &str) -> Result<CommentList> {
    let comments: Vec<Comment> = storage.scan(Order::Asc)?;
    let comments: Vec<Comment> = comments
        .into_iter()
        .filter(|c| c.task_id == task_id)
        .collect();

    let user_ids: Vec<&str> = comments.iter().map(|c| c.user_id.as_str()).collect();
    let users = storage.get_many::<User>(&user_ids)?;

    let comments = comments
        .into_iter()
        .map(|comment| {
            let user = users.get(&comment.user_id).cloned();
            CommentWithUser { comment, user }
        })
        .collect();

    Ok(CommentList { comments })
}

/// Result of `mctl task activity`.
#[derive(Debug, Serialize)]
pub struct ActivityList {
    pub activity: Vec<Activity>,
}

impl Output for ActivityList {
    fn to_human(&self) -> String {
        if self.activity.is_empty() {
            return "No activity".to_string();
        }
        self.activity
            .iter()
            .map(|a| format!("{}  {}  by {}", a.id, a.action, a.user_id))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List a task's activity trail oldest-first.
pub fn task_activity(storage: &Storage, task_id: &str) -> Result<ActivityList> {
    let activity: Vec<Activity> = storage.scan(Order::Asc)?;
    Ok(ActivityList {
        activity: activity.into_iter().filter(|a| a.task_id == task_id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::test_utils::TestEnv;
    use crate::Error;

    fn create_args(title: &str, status: TaskStatus) -> TaskCreateArgs {
        TaskCreateArgs {
            title: title.to_string(),
            description: None,
            status,
            priority: Priority::Medium,
            assignee_id: None,
            agent_assignee_id: None,
            project_id: None,
            due_date: None,
            tags: Vec::new(),
            estimated_hours: None,
        }
    }

    #[test]
    fn test_create_assigns_next_order_index_per_column() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let a = task_create(&mut storage, create_args("a", TaskStatus::Backlog)).unwrap();
        let b = task_create(&mut storage, create_args("b", TaskStatus::Backlog)).unwrap();
        let c = task_create(&mut storage, create_args("c", TaskStatus::Review)).unwrap();

        assert_eq!(a.order_index, 1);
        assert_eq!(b.order_index, 2);
        // Each column counts independently.
        assert_eq!(c.order_index, 1);
    }

    #[test]
    fn test_create_with_assignee_records_activity() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let mut args = create_args("assigned", TaskStatus::Backlog);
        args.assignee_id = Some("usr-aaaa01".to_string());
        let task = task_create(&mut storage, args).unwrap();
        assert_eq!(task.assignee_type, Some(AssigneeType::User));

        let trail = task_activity(&storage, &task.id).unwrap();
        assert_eq!(trail.activity.len(), 1);
        assert_eq!(trail.activity[0].action, ActivityAction::Created);
        assert_eq!(trail.activity[0].user_id, "usr-aaaa01");
    }

    #[test]
    fn test_create_unassigned_records_no_activity() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let task = task_create(&mut storage, create_args("solo", TaskStatus::Backlog)).unwrap();
        let trail = task_activity(&storage, &task.id).unwrap();
        assert!(trail.activity.is_empty());
    }

    #[test]
    fn test_list_filters_combine() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let mut args = create_args("one", TaskStatus::Backlog);
        args.project_id = Some("prj-aaaa01".to_string());
        task_create(&mut storage, args).unwrap();
        task_create(&mut storage, create_args("two", TaskStatus::InProgress)).unwrap();

        let filter = TaskFilter {
            status: Some(TaskStatus::Backlog),
            project_id: Some("prj-aaaa01".to_string()),
            assignee_id: None,
        };
        let list = task_list(&storage, &filter).unwrap();
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].task.title, "one");

        let filter = TaskFilter {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(task_list(&storage, &filter).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_list_joins_assignee_and_project() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let user = User::new(
            "usr-aaaa01".to_string(),
            "Ada".to_string(),
            "ada@example.com".to_string(),
            UserRole::Member,
        );
        storage.insert(&user).unwrap();
        let project = Project::new(
            "prj-aaaa01".to_string(),
            "Launch".to_string(),
            "#336699".to_string(),
            user.id.clone(),
        );
        storage.insert(&project).unwrap();

        let mut args = create_args("joined", TaskStatus::Backlog);
        args.assignee_id = Some(user.id.clone());
        args.project_id = Some(project.id.clone());
        task_create(&mut storage, args).unwrap();

        // Dangling references resolve to None instead of failing the list.
        let mut args = create_args("dangling", TaskStatus::Backlog);
        args.assignee_id = Some("usr-ffffff".to_string());
        task_create(&mut storage, args).unwrap();

        // Newest-first, so "dangling" leads.
        let list = task_list(&storage, &TaskFilter::default()).unwrap();
        assert!(list.tasks[0].assignee.is_none());
        assert_eq!(list.tasks[1].assignee.as_ref().unwrap().name, "Ada");
        assert_eq!(list.tasks[1].project.as_ref().unwrap().name, "Launch");
    }

    #[test]
    fn test_list_newest_first() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        task_create(&mut storage, create_args("oldest", TaskStatus::Backlog)).unwrap();
        task_create(&mut storage, create_args("newest", TaskStatus::Backlog)).unwrap();

        let list = task_list(&storage, &TaskFilter::default()).unwrap();
        assert_eq!(list.tasks[0].task.title, "newest");
        assert_eq!(list.tasks[1].task.title, "oldest");
    }

    #[test]
    fn test_update_status_stamps_completed_at_once() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let task = task_create(&mut storage, create_args("finishable", TaskStatus::Backlog))
            .unwrap();

        let done = task_update_status(&mut storage, &task.id, TaskStatus::Done, None, None)
            .unwrap();
        let stamp = done.completed_at.unwrap();

        // Leaving done and returning keeps the original stamp.
        task_update_status(&mut storage, &task.id, TaskStatus::Review, None, None).unwrap();
        let again = task_update_status(&mut storage, &task.id, TaskStatus::Done, None, None)
            .unwrap();
        assert_eq!(again.completed_at, Some(stamp));
    }

    #[test]
    fn test_update_status_records_trail_with_fallback_user() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let task = task_create(&mut storage, create_args("moved", TaskStatus::Backlog)).unwrap();
        task_update_status(&mut storage, &task.id, TaskStatus::InProgress, Some(5), None)
            .unwrap();

        let trail = task_activity(&storage, &task.id).unwrap();
        assert_eq!(trail.activity.len(), 1);
        assert_eq!(trail.activity[0].action, ActivityAction::StatusChanged);
        assert_eq!(trail.activity[0].user_id, task.id);

        let updated: Task = storage.get(&task.id).unwrap();
        assert_eq!(updated.order_index, 5);
    }

    #[test]
    fn test_update_patches_only_supplied_fields() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let mut args = create_args("patchable", TaskStatus::Backlog);
        args.description = Some("original".to_string());
        let task = task_create(&mut storage, args).unwrap();

        let updated = task_update(
            &mut storage,
            &task.id,
            TaskUpdateArgs {
                priority: Some(Priority::Urgent),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.priority, Priority::Urgent);
        assert_eq!(updated.description.as_deref(), Some("original"));
        assert_eq!(updated.title, "patchable");
    }

    #[test]
    fn test_update_missing_task_is_not_found() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let result = task_update(&mut storage, "tsk-ffffff", TaskUpdateArgs::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_cascades_comments_and_activity() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let mut args = create_args("doomed", TaskStatus::Backlog);
        args.assignee_id = Some("usr-aaaa01".to_string());
        let task = task_create(&mut storage, args).unwrap();
        comment_add(&mut storage, &task.id, "usr-aaaa01", "first").unwrap();
        comment_add(&mut storage, &task.id, "usr-aaaa01", "second").unwrap();

        let survivor = task_create(&mut storage, create_args("survivor", TaskStatus::Backlog))
            .unwrap();

        let deleted = task_delete(&mut storage, &task.id).unwrap();
        assert_eq!(deleted.deleted_comments, 2);
        // One "created" row plus one "commented" row per comment.
        assert_eq!(deleted.deleted_activity, 3);

        assert!(storage.try_get::<Task>(&task.id).unwrap().is_none());
        assert!(storage.try_get::<Task>(&survivor.id).unwrap().is_some());
        assert!(comment_list(&storage, &task.id).unwrap().comments.is_empty());
    }

    #[test]
    fn test_delete_missing_task_is_not_found() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        assert!(matches!(
            task_delete(&mut storage, "tsk-ffffff"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_comment_add_requires_task() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let result = comment_add(&mut storage, "tsk-ffffff", "usr-aaaa01", "hello");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_metrics_counts_and_percentage() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        task_create(&mut storage, create_args("a", TaskStatus::Backlog)).unwrap();
        task_create(&mut storage, create_args("b", TaskStatus::InProgress)).unwrap();
        let done = task_create(&mut storage, create_args("c", TaskStatus::Backlog)).unwrap();
        task_update_status(&mut storage, &done.id, TaskStatus::Done, None, None).unwrap();

        let metrics = task_metrics(&storage).unwrap();
        assert_eq!(metrics.total, 3);
        assert_eq!(metrics.this_week, 3);
        assert_eq!(metrics.in_progress, 1);
        assert_eq!(metrics.completion_percentage, 33);
        assert_eq!(metrics.by_status.done, 1);
    }

    #[test]
    fn test_metrics_empty_store() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        let metrics = task_metrics(&storage).unwrap();
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.completion_percentage, 0);
    }
}
