//! Content pipeline commands: CRUD, stage moves, and stage metrics.

use serde::Serialize;

use super::Output;
use crate::models::{ContentItem, ContentStage, ContentType, Project, User, now_ms};
use crate::storage::{Order, Storage, generate_id};
use crate::Result;

/// A content item with its assignee and project resolved.
#[derive(Debug, Serialize)]
pub struct ContentWithDetails {
    #[serde(flatten)]
    pub item: ContentItem,
    pub assignee: Option<User>,
    pub project: Option<Project>,
}

/// Result of `mctl content list`.
#[derive(Debug, Serialize)]
pub struct ContentList {
    pub items: Vec<ContentWithDetails>,
}

impl Output for ContentList {
    fn to_human(&self) -> String {
        if self.items.is_empty() {
            return "No content found".to_string();
        }
        self.items
            .iter()
            .map(|c| {
                format!(
                    "{}  [{}] {}  {}",
                    c.item.id, c.item.stage, c.item.content_type, c.item.title
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for ContentItem {
    fn to_human(&self) -> String {
        format!("{}  [{}] {}", self.id, self.stage, self.title)
    }
}

/// List content newest-first, optionally filtered by stage and project.
pub fn content_list(
    storage: &Storage,
    stage: Option<ContentStage>,
    project_id: Option<&str>,
) -> Result<ContentList> {
    let items: Vec<ContentItem> = storage.scan(Order::Desc)?;
    let items: Vec<ContentItem> = items
        .into_iter()
        .filter(|c| stage.is_none_or(|s| c.stage == s))
        .filter(|c| project_id.is_none_or(|p| c.project_id.as_deref() == Some(p)))
        .collect();

    let user_ids: Vec<&str> = items.iter().filter_map(|c| c.assignee_id.as_deref()).collect();
    let project_ids: Vec<&str> = items.iter().filter_map(|c| c.project_id.as_deref()).collect();
    let users = storage.get_many::<User>(&user_ids)?;
    let projects = storage.get_many::<Project>(&project_ids)?;

    let items = items
        .into_iter()
        .map(|item| {
            let assignee = item
                .assignee_id
                .as_deref()
                .and_then(|id| users.get(id).cloned());
            let project = item
                .project_id
                .as_deref()
                .and_then(|id| projects.get(id).cloned());
            ContentWithDetails {
                item,
                assignee,
                project,
            }
        })
        .collect();

    Ok(ContentList { items })
}

/// Content counts per pipeline stage.
#[derive(Debug, Serialize)]
pub struct ContentStageCounts {
    pub ideas: usize,
    pub scripting: usize,
    pub thumbnail: usize,
    pub filming: usize,
    pub editing: usize,
    pub published: usize,
}

/// Result of `mctl content metrics`.
#[derive(Debug, Serialize)]
pub struct ContentMetrics {
    pub total: usize,
    pub published: usize,
    /// Items still moving through the pipeline
    pub in_production: usize,
    pub by_stage: ContentStageCounts,
}

impl Output for ContentMetrics {
    fn to_human(&self) -> String {
        format!(
            "{} items ({} published, {} in production)\n\
             ideas: {}  scripting: {}  thumbnail: {}  filming: {}  editing: {}  published: {}",
            self.total,
            self.published,
            self.in_production,
            self.by_stage.ideas,
            self.by_stage.scripting,
            self.by_stage.thumbnail,
            self.by_stage.filming,
            self.by_stage.editing,
            self.by_stage.published,
        )
    }
}

/// Compute pipeline metrics across all content.
pub fn content_metrics(storage: &Storage) -> Result<ContentMetrics> {
    let items: Vec<ContentItem> = storage.scan(Order::Asc)?;

    let count = |stage: ContentStage| items.iter().filter(|c| c.stage == stage).count();
    let by_stage = ContentStageCounts {
        ideas: count(ContentStage::Ideas),
        scripting: count(ContentStage::Scripting),
        thumbnail: count(ContentStage::Thumbnail),
        filming: count(ContentStage::Filming),
        editing: count(ContentStage::Editing),
        published: count(ContentStage::Published),
    };

    Ok(ContentMetrics {
        total: items.len(),
        published: by_stage.published,
        in_production: items.len() - by_stage.published,
        by_stage,
    })
}

/// Arguments for `mctl content create`.
#[derive(Debug)]
pub struct ContentCreateArgs {
    pub title: String,
    pub description: Option<String>,
    pub stage: ContentStage,
    pub content_type: ContentType,
    pub script: Option<String>,
    pub notes: Option<String>,
    pub assignee_id: Option<String>,
    pub project_id: Option<String>,
    pub due_date: Option<i64>,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
}

/// Create a content item. The sort index is seeded from the creation time, so
/// newer items land at the bottom of their stage column.
pub fn content_create(storage: &mut Storage, args: ContentCreateArgs) -> Result<ContentItem> {
    let mut item = ContentItem::new(
        generate_id("cnt", &args.title),
        args.title,
        args.stage,
        args.content_type,
    );
    item.description = args.description;
    item.script = args.script;
    item.notes = args.notes;
    item.assignee_id = args.assignee_id;
    item.project_id = args.project_id;
    item.due_date = args.due_date;
    item.tags = args.tags;
    item.estimated_hours = args.estimated_hours;

    storage.insert(&item)?;
    Ok(item)
}

/// Arguments for `mctl content update`. Unset fields are left unchanged.
#[derive(Debug, Default)]
pub struct ContentUpdateArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<ContentType>,
    pub script: Option<String>,
    pub notes: Option<String>,
    pub assignee_id: Option<String>,
    pub project_id: Option<String>,
    pub due_date: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
}

/// Patch content fields.
pub fn content_update(
    storage: &mut Storage,
    content_id: &str,
    args: ContentUpdateArgs,
) -> Result<ContentItem> {
    let mut item: ContentItem = storage.get(content_id)?;

    if let Some(title) = args.title {
        item.title = title;
    }
    if let Some(description) = args.description {
        item.description = Some(description);
    }
    if let Some(content_type) = args.content_type {
        item.content_type = content_type;
    }
    if let Some(script) = args.script {
        item.script = Some(script);
    }
    if let Some(notes) = args.notes {
        item.notes = Some(notes);
    }
    if let Some(assignee_id) = args.assignee_id {
        item.assignee_id = Some(assignee_id);
    }
    if let Some(project_id) = args.project_id {
        item.project_id = Some(project_id);
    }
    if let Some(due_date) = args.due_date {
        item.due_date = Some(due_date);
    }
    if let Some(tags) = args.tags {
        item.tags = tags;
    }
    if let Some(estimated_hours) = args.estimated_hours {
        item.estimated_hours = Some(estimated_hours);
    }
    item.updated_at = now_ms();

    storage.put(&item)?;
    Ok(item)
}

/// Move a content item to another pipeline stage.
///
/// Without an explicit index the item sorts by "now", landing at the bottom
/// of its new column.
pub fn content_update_stage(
    storage: &mut Storage,
    content_id: &str,
    stage: ContentStage,
    order_index: Option<i64>,
) -> Result<ContentItem> {
    let mut item: ContentItem = storage.get(content_id)?;

    let now = now_ms();
    item.stage = stage;
    item.order_index = order_index.unwrap_or(now);
    item.updated_at = now;

    storage.put(&item)?;
    Ok(item)
}

/// Result of `mctl content delete`.
#[derive(Debug, Serialize)]
pub struct ContentDeleted {
    pub id: String,
}

impl Output for ContentDeleted {
    fn to_human(&self) -> String {
        format!("Deleted {}", self.id)
    }
}

/// Delete a content item. No cascade; nothing references content.
pub fn content_delete(storage: &mut Storage, content_id: &str) -> Result<ContentDeleted> {
    storage.delete::<ContentItem>(content_id)?;
    Ok(ContentDeleted {
        id: content_id.to_string(),
    })
}
