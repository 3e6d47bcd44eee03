//! Calendar commands: scheduled event CRUD, cron listing, and week metrics.

use chrono::{Datelike, Duration, Utc};
use serde::Serialize;

use super::Output;
use crate::models::{EventStatus, EventType, Priority, ScheduledEvent, Task, User, now_ms};
use crate::storage::{Order, Storage, generate_id};
use crate::Result;

/// Start and end (exclusive) of the current calendar week in Unix ms.
///
/// Weeks start on Sunday at UTC midnight.
fn current_week_bounds() -> (i64, i64) {
    let today = Utc::now().date_naive();
    let days_from_sunday = Utc::now().weekday().num_days_from_sunday() as i64;
    let week_start = (today - Duration::days(days_from_sunday))
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .timestamp_millis();
    (week_start, week_start + 7 * 24 * 60 * 60 * 1000)
}

/// An event with its assignee and linked task resolved.
#[derive(Debug, Serialize)]
pub struct EventWithDetails {
    #[serde(flatten)]
    pub event: ScheduledEvent,
    pub assignee: Option<User>,
    pub task: Option<Task>,
}

/// Result of `mctl calendar list` and `mctl calendar cron`.
#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<EventWithDetails>,
}

impl Output for EventList {
    fn to_human(&self) -> String {
        if self.events.is_empty() {
            return "No events found".to_string();
        }
        self.events
            .iter()
            .map(|e| {
                format!(
                    "{}  [{}/{}] {}",
                    e.event.id, e.event.event_type, e.event.status, e.event.title
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for ScheduledEvent {
    fn to_human(&self) -> String {
        format!("{}  [{}/{}] {}", self.id, self.event_type, self.status, self.title)
    }
}

/// List events oldest-first. A time range applies only when both ends are
/// given; the range covers `scheduled_at` inclusively.
pub fn event_list(
    storage: &Storage,
    start: Option<i64>,
    end: Option<i64>,
    event_type: Option<EventType>,
) -> Result<EventList> {
    let events: Vec<ScheduledEvent> = storage.scan(Order::Asc)?;
    let events: Vec<ScheduledEvent> = events
        .into_iter()
        .filter(|e| event_type.is_none_or(|t| e.event_type == t))
        .filter(|e| match (start, end) {
            (Some(start), Some(end)) => e.scheduled_at >= start && e.scheduled_at <= end,
            _ => true,
        })
        .collect();

    join_details(storage, events)
}

/// List cron-type events oldest-first.
pub fn cron_jobs(storage: &Storage) -> Result<EventList> {
    event_list(storage, None, None, Some(EventType::Cron))
}

fn join_details(storage: &Storage, events: Vec<ScheduledEvent>) -> Result<EventList> {
    let user_ids: Vec<&str> = events.iter().filter_map(|e| e.assignee_id.as_deref()).collect();
    let users = storage.get_many::<User>(&user_ids)?;
    let task_ids: Vec<&str> = events.iter().filter_map(|e| e.task_id.as_deref()).collect();
    let tasks = storage.get_many::<Task>(&task_ids)?;

    let events = events
        .into_iter()
        .map(|event| {
            let assignee = event
                .assignee_id
                .as_deref()
                .and_then(|id| users.get(id).cloned());
            let task = event
                .task_id
                .as_deref()
                .and_then(|id| tasks.get(id).cloned());
            EventWithDetails { event, assignee, task }
        })
        .collect();

    Ok(EventList { events })
}

/// Event counts per type within the current week.
#[derive(Debug, Serialize)]
pub struct EventTypeCounts {
    pub cron: usize,
    pub task: usize,
    pub meeting: usize,
    pub deadline: usize,
}

/// Result of `mctl calendar metrics`.
///
/// Week counts use the current calendar week (Sunday start), unlike task and
/// memory metrics which use a trailing seven-day window.
#[derive(Debug, Serialize)]
pub struct CalendarMetrics {
    /// Events scheduled within the current calendar week
    pub this_week: usize,
    pub completed_this_week: usize,
    /// Pending events scheduled in the future
    pub upcoming: usize,
    /// Pending events whose scheduled time has passed
    pub overdue: usize,
    pub by_type: EventTypeCounts,
}

impl Output for CalendarMetrics {
    fn to_human(&self) -> String {
        format!(
            "{} events this week ({} completed), {} upcoming, {} overdue\n\
             cron: {}  task: {}  meeting: {}  deadline: {}",
            self.this_week,
            self.completed_this_week,
            self.upcoming,
            self.overdue,
            self.by_type.cron,
            self.by_type.task,
            self.by_type.meeting,
            self.by_type.deadline,
        )
    }
}

/// Compute calendar metrics.
pub fn calendar_metrics(storage: &Storage) -> Result<CalendarMetrics> {
    let events: Vec<ScheduledEvent> = storage.scan(Order::Asc)?;
    let (week_start, week_end) = current_week_bounds();
    let now = now_ms();

    let week: Vec<&ScheduledEvent> = events
        .iter()
        .filter(|e| e.scheduled_at >= week_start && e.scheduled_at < week_end)
        .collect();

    let count = |event_type: EventType| {
        week.iter().filter(|e| e.event_type == event_type).count()
    };

    Ok(CalendarMetrics {
        this_week: week.len(),
        completed_this_week: week
            .iter()
            .filter(|e| e.status == EventStatus::Completed)
            .count(),
        upcoming: events
            .iter()
            .filter(|e| e.status == EventStatus::Pending && e.scheduled_at > now)
            .count(),
        overdue: events
            .iter()
            .filter(|e| e.status == EventStatus::Pending && e.scheduled_at < now)
            .count(),
        by_type: EventTypeCounts {
            cron: count(EventType::Cron),
            task: count(EventType::Task),
            meeting: count(EventType::Meeting),
            deadline: count(EventType::Deadline),
        },
    })
}

/// Arguments for `mctl calendar create`.
#[derive(Debug)]
pub struct EventCreateArgs {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub scheduled_at: i64,
    pub duration: Option<i64>,
    pub cron_expression: Option<String>,
    pub recurring: Option<bool>,
    pub recurring_pattern: Option<String>,
    pub assignee_id: Option<String>,
    pub task_id: Option<String>,
    pub priority: Priority,
    pub color: Option<String>,
}

/// Create a pending event.
pub fn event_create(storage: &mut Storage, args: EventCreateArgs) -> Result<ScheduledEvent> {
    let mut event = ScheduledEvent::new(
        generate_id("evt", &args.title),
        args.title,
        args.event_type,
        args.scheduled_at,
        args.priority,
    );
    event.description = args.description;
    event.duration = args.duration;
    event.cron_expression = args.cron_expression;
    event.recurring = args.recurring;
    event.recurring_pattern = args.recurring_pattern;
    event.assignee_id = args.assignee_id;
    event.task_id = args.task_id;
    event.color = args.color;

    storage.insert(&event)?;
    Ok(event)
}

/// Arguments for `mctl calendar update`. Unset fields are left unchanged.
#[derive(Debug, Default)]
pub struct EventUpdateArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<i64>,
    pub duration: Option<i64>,
    pub status: Option<EventStatus>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
    pub color: Option<String>,
}

/// Patch event fields.
pub fn event_update(
    storage: &mut Storage,
    event_id: &str,
    args: EventUpdateArgs,
) -> Result<ScheduledEvent> {
    let mut event: ScheduledEvent = storage.get(event_id)?;

    if let Some(title) = args.title {
        event.title = title;
    }
    if let Some(description) = args.description {
        event.description = Some(description);
    }
    if let Some(scheduled_at) = args.scheduled_at {
        event.scheduled_at = scheduled_at;
    }
    if let Some(duration) = args.duration {
        event.duration = Some(duration);
    }
    if let Some(status) = args.status {
        event.status = status;
    }
    if let Some(priority) = args.priority {
        event.priority = priority;
    }
    if let Some(assignee_id) = args.assignee_id {
        event.assignee_id = Some(assignee_id);
    }
    if let Some(color) = args.color {
        event.color = Some(color);
    }
    event.updated_at = now_ms();

    storage.put(&event)?;
    Ok(event)
}

/// Mark an event completed, stamping the completion time and optional notes.
pub fn event_complete(
    storage: &mut Storage,
    event_id: &str,
    notes: Option<String>,
) -> Result<ScheduledEvent> {
    let mut event: ScheduledEvent = storage.get(event_id)?;

    let now = now_ms();
    event.status = EventStatus::Completed;
    event.completed_at = Some(now);
    event.completion_notes = notes;
    event.updated_at = now;

    storage.put(&event)?;
    Ok(event)
}

/// Result of `mctl calendar delete`.
#[derive(Debug, Serialize)]
pub struct EventDeleted {
    pub id: String,
}

impl Output for EventDeleted {
    fn to_human(&self) -> String {
        format!("Deleted {}", self.id)
    }
}

/// Delete an event. No cascade; nothing references events.
pub fn event_delete(storage: &mut Storage, event_id: &str) -> Result<EventDeleted> {
    storage.delete::<ScheduledEvent>(event_id)?;
    Ok(EventDeleted {
        id: event_id.to_string(),
    })
}
