//! Project commands: CRUD with task-count joins and cascade delete.

use serde::Serialize;

use super::Output;
use crate::models::{Activity, Comment, Project, Task, TaskStatus, User, now_ms};
use crate::storage::{Order, Storage, generate_id};
use crate::Result;

/// A project with its task counts joined in.
#[derive(Debug, Serialize)]
pub struct ProjectWithCounts {
    #[serde(flatten)]
    pub project: Project,
    pub task_count: usize,
    pub completed_task_count: usize,
}

/// Result of `mctl project list`.
#[derive(Debug, Serialize)]
pub struct ProjectList {
    pub projects: Vec<ProjectWithCounts>,
}

impl Output for ProjectList {
    fn to_human(&self) -> String {
        if self.projects.is_empty() {
            return "No projects found".to_string();
        }
        self.projects
            .iter()
            .map(|p| {
                format!(
                    "{}  {}  ({}/{} tasks done)",
                    p.project.id, p.project.name, p.completed_task_count, p.task_count
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for Project {
    fn to_human(&self) -> String {
        format!("{}  {}", self.id, self.name)
    }
}

/// List projects in creation order with per-project task counts.
///
/// One scan over tasks covers every project instead of a scan per row.
pub fn project_list(storage: &Storage) -> Result<ProjectList> {
    let projects: Vec<Project> = storage.scan(Order::Asc)?;
    let tasks: Vec<Task> = storage.scan(Order::Asc)?;

    let projects = projects
        .into_iter()
        .map(|project| {
            let mine = tasks
                .iter()
                .filter(|t| t.project_id.as_deref() == Some(project.id.as_str()));
            let task_count = mine.clone().count();
            let completed_task_count =
                mine.filter(|t| t.status == TaskStatus::Done).count();
            ProjectWithCounts {
                project,
                task_count,
                completed_task_count,
            }
        })
        .collect();

    Ok(ProjectList { projects })
}

/// A single project with owner and counts resolved.
#[derive(Debug, Serialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<User>,
    pub task_count: usize,
    pub completed_task_count: usize,
}

impl Output for ProjectDetails {
    fn to_human(&self) -> String {
        let owner = self
            .owner
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or("?");
        let mut lines = vec![
            format!("{}  {}", self.project.id, self.project.name),
            format!(
                "  owner: {}  tasks: {}/{} done",
                owner, self.completed_task_count, self.task_count
            ),
        ];
        if let Some(desc) = &self.project.description {
            lines.push(format!("  {}", desc));
        }
        lines.join("\n")
    }
}

/// Show a single project with its owner and task counts.
pub fn project_show(storage: &Storage, project_id: &str) -> Result<ProjectDetails> {
    let project: Project = storage.get(project_id)?;
    let owner = storage.try_get(&project.owner_id)?;

    let tasks: Vec<Task> = storage.scan(Order::Asc)?;
    let mine = tasks
        .iter()
        .filter(|t| t.project_id.as_deref() == Some(project.id.as_str()));
    let task_count = mine.clone().count();
    let completed_task_count = mine.filter(|t| t.status == TaskStatus::Done).count();

    Ok(ProjectDetails {
        project,
        owner,
        task_count,
        completed_task_count,
    })
}

/// Create a project. The owner id is stored as given, not validated.
pub fn project_create(
    storage: &mut Storage,
    name: &str,
    description: Option<String>,
    color: &str,
    owner_id: &str,
) -> Result<Project> {
    let mut project = Project::new(
        generate_id("prj", name),
        name.to_string(),
        color.to_string(),
        owner_id.to_string(),
    );
    project.description = description;
    storage.insert(&project)?;
    Ok(project)
}

/// Arguments for `mctl project update`. Unset fields are left unchanged.
#[derive(Debug, Default)]
pub struct ProjectUpdateArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner_id: Option<String>,
}

/// Patch project fields.
pub fn project_update(
    storage: &mut Storage,
    project_id: &str,
    args: ProjectUpdateArgs,
) -> Result<Project> {
    let mut project: Project = storage.get(project_id)?;

    if let Some(name) = args.name {
        project.name = name;
    }
    if let Some(description) = args.description {
        project.description = Some(description);
    }
    if let Some(color) = args.color {
        project.color = color;
    }
    if let Some(owner_id) = args.owner_id {
        project.owner_id = owner_id;
    }
    project.updated_at = now_ms();

    storage.put(&project)?;
    Ok(project)
}

/// Result of `mctl project delete`.
#[derive(Debug, Serialize)]
pub struct ProjectDeleted {
    pub id: String,
    pub deleted_tasks: usize,
    pub deleted_comments: usize,
    pub deleted_activity: usize,
}

impl Output for ProjectDeleted {
    fn to_human(&self) -> String {
        format!(
            "Deleted {} ({} tasks, {} comments, {} activity entries)",
            self.id, self.deleted_tasks, self.deleted_comments, self.deleted_activity
        )
    }
}

/// Delete a project and cascade through its tasks to their comments and
/// activity. Content items and events keep their now-dangling project ids;
/// reads resolve those to nothing.
pub fn project_delete(storage: &mut Storage, project_id: &str) -> Result<ProjectDeleted> {
    let project: Project = storage.get(project_id)?;

    storage.with_transaction(|s| {
        let tasks: Vec<Task> = s.scan(Order::Asc)?;
        let doomed: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.project_id.as_deref() == Some(project.id.as_str()))
            .collect();

        let comments: Vec<Comment> = s.scan(Order::Asc)?;
        let activity: Vec<Activity> = s.scan(Order::Asc)?;

        let mut deleted_comments = 0;
        let mut deleted_activity = 0;
        for task in &doomed {
            for comment in comments.iter().filter(|c| c.task_id == task.id) {
                s.delete::<Comment>(&comment.id)?;
                deleted_comments += 1;
            }
            for entry in activity.iter().filter(|a| a.task_id == task.id) {
                s.delete::<Activity>(&entry.id)?;
                deleted_activity += 1;
            }
            s.delete::<Task>(&task.id)?;
        }

        s.delete::<Project>(&project.id)?;

        Ok(ProjectDeleted {
            id: project.id.clone(),
            deleted_tasks: doomed.len(),
            deleted_comments,
            deleted_activity,
        })
    })
}
