//! mctl - team, task, and agent-session tracking from the command line.

use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use missionctl::action_log;
use missionctl::cli::{
    CalendarCommands, Cli, Commands, ConfigCommands, ContentCommands, MemoryCommands,
    MirrorCommands, ProjectCommands, SessionCommands, SystemCommands, TaskCommands, TeamCommands,
    UserCommands,
};
use missionctl::commands::{self, Output};
use missionctl::commands::calendar::{EventCreateArgs, EventUpdateArgs};
use missionctl::commands::content::{ContentCreateArgs, ContentUpdateArgs};
use missionctl::commands::memory::{MemoryCreateArgs, MemoryUpdateArgs};
use missionctl::commands::projects::ProjectUpdateArgs;
use missionctl::commands::sessions::{SessionCompleteResult, SessionSpawnArgs};
use missionctl::commands::tasks::{TaskCreateArgs, TaskFilter, TaskUpdateArgs};
use missionctl::commands::team::MemberCreateArgs;
use missionctl::commands::users::UserUpdateArgs;
use missionctl::mirror::{self, WorkspaceClient};
use missionctl::storage::{Storage, find_git_root};

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Repo path priority: --repo flag > MC_REPO env > git root > cwd
    let repo_path = resolve_repo_path(cli.repo_path, human);

    let (cmd_name, args_json) = describe_command(&cli.command);

    let start = Instant::now();
    let result = run_command(cli.command, &repo_path, human);
    let duration = start.elapsed().as_millis() as u64;

    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };
    action_log::log_action(&repo_path, &cmd_name, args_json, success, error, duration);

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Resolve the workspace path.
///
/// An explicit path (flag or env var) is used literally. Otherwise the git
/// root of the current directory wins, falling back to the directory itself,
/// so every subdirectory of a repo maps to the same store.
fn resolve_repo_path(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!("Error: Specified repo path does not exist: {}", path.display());
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!("Specified repo path does not exist: {}", path.display())
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            find_git_root(&cwd).unwrap_or(cwd)
        }
    }
}

/// Derive a log-friendly command name and argument payload.
///
/// Commands serialize externally tagged, e.g.
/// `{"Task": {"command": {"Create": {...}}}}`, which flattens to
/// ("task create", {...}).
fn describe_command(command: &Commands) -> (String, serde_json::Value) {
    let value = serde_json::to_value(command).unwrap_or(serde_json::Value::Null);

    let (top, inner) = match &value {
        serde_json::Value::Object(map) => match map.iter().next() {
            Some((key, val)) => (key.clone(), val.clone()),
            None => return ("unknown".to_string(), value),
        },
        serde_json::Value::String(name) => return (name.to_lowercase(), serde_json::json!({})),
        _ => return ("unknown".to_string(), value),
    };

    let (sub, args) = match inner.get("command") {
        // Subcommand with fields
        Some(serde_json::Value::Object(sub_map)) => match sub_map.iter().next() {
            Some((key, val)) => (Some(key.clone()), val.clone()),
            None => (None, inner.clone()),
        },
        // Unit subcommand (e.g. "Init")
        Some(serde_json::Value::String(name)) => (Some(name.clone()), serde_json::json!({})),
        _ => (None, inner.clone()),
    };

    let name = match sub {
        Some(sub) => format!("{} {}", top.to_lowercase(), sub.to_lowercase()),
        None => top.to_lowercase(),
    };
    (name, args)
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Treat an empty repeatable flag as "not supplied".
fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values) }
}

fn run_command(command: Commands, repo_path: &Path, human: bool) -> missionctl::Result<()> {
    match command {
        Commands::System { command } => match command {
            SystemCommands::Init => output(&commands::system_init(repo_path)?, human),
            SystemCommands::Version => output(&commands::system_version(), human),
        },

        Commands::Config { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                ConfigCommands::Get { key } => {
                    output(&commands::config_get(&storage, &key)?, human)
                }
                ConfigCommands::Set { key, value } => {
                    output(&commands::config_set(&mut storage, &key, &value)?, human)
                }
                ConfigCommands::List => output(&commands::config_list(&storage)?, human),
            }
        }

        Commands::Task { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                TaskCommands::List {
                    status,
                    project,
                    assignee,
                } => {
                    let filter = TaskFilter {
                        status,
                        project_id: project,
                        assignee_id: assignee,
                    };
                    output(&commands::tasks::task_list(&storage, &filter)?, human)
                }
                TaskCommands::Show { id } => {
                    output(&commands::tasks::task_show(&storage, &id)?, human)
                }
                TaskCommands::Metrics => {
                    output(&commands::tasks::task_metrics(&storage)?, human)
                }
                TaskCommands::Create {
                    title,
                    description,
                    status,
                    priority,
                    assignee,
                    agent,
                    project,
                    due,
                    tags,
                    estimate,
                } => {
                    let args = TaskCreateArgs {
                        title,
                        description,
                        status,
                        priority,
                        assignee_id: assignee,
                        agent_assignee_id: agent,
                        project_id: project,
                        due_date: due,
                        tags,
                        estimated_hours: estimate,
                    };
                    output(&commands::tasks::task_create(&mut storage, args)?, human)
                }
                TaskCommands::Update {
                    id,
                    title,
                    description,
                    priority,
                    assignee,
                    agent,
                    project,
                    due,
                    tags,
                    estimate,
                    actual,
                    user,
                } => {
                    let args = TaskUpdateArgs {
                        title,
                        description,
                        priority,
                        assignee_id: assignee,
                        agent_assignee_id: agent,
                        project_id: project,
                        due_date: due,
                        tags: non_empty(tags),
                        estimated_hours: estimate,
                        actual_hours: actual,
                        user_id: user,
                    };
                    output(&commands::tasks::task_update(&mut storage, &id, args)?, human)
                }
                TaskCommands::Status {
                    id,
                    status,
                    order,
                    user,
                } => output(
                    &commands::tasks::task_update_status(
                        &mut storage,
                        &id,
                        status,
                        order,
                        user.as_deref(),
                    )?,
                    human,
                ),
                TaskCommands::Delete { id } => {
                    output(&commands::tasks::task_delete(&mut storage, &id)?, human)
                }
                TaskCommands::Comment { id, content, user } => output(
                    &commands::tasks::comment_add(&mut storage, &id, &user, &content)?,
                    human,
                ),
                TaskCommands::Comments { id } => {
                    output(&commands::tasks::comment_list(&storage, &id)?, human)
                }
                TaskCommands::Activity { id } => {
                    output(&commands::tasks::task_activity(&storage, &id)?, human)
                }
            }
        }

        Commands::Project { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                ProjectCommands::List => {
                    output(&commands::projects::project_list(&storage)?, human)
                }
                ProjectCommands::Show { id } => {
                    output(&commands::projects::project_show(&storage, &id)?, human)
                }
                ProjectCommands::Create {
                    name,
                    owner,
                    description,
                    color,
                } => output(
                    &commands::projects::project_create(
                        &mut storage,
                        &name,
                        description,
                        &color,
                        &owner,
                    )?,
                    human,
                ),
                ProjectCommands::Update {
                    id,
                    name,
                    description,
                    color,
                    owner,
                } => {
                    let args = ProjectUpdateArgs {
                        name,
                        description,
                        color,
                        owner_id: owner,
                    };
                    output(
                        &commands::projects::project_update(&mut storage, &id, args)?,
                        human,
                    )
                }
                ProjectCommands::Delete { id } => {
                    output(&commands::projects::project_delete(&mut storage, &id)?, human)
                }
            }
        }

        Commands::Content { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                ContentCommands::List { stage, project } => output(
                    &commands::content::content_list(&storage, stage, project.as_deref())?,
                    human,
                ),
                ContentCommands::Metrics => {
                    output(&commands::content::content_metrics(&storage)?, human)
                }
                ContentCommands::Create {
                    title,
                    stage,
                    content_type,
                    description,
                    script,
                    notes,
                    assignee,
                    project,
                    due,
                    tags,
                    estimate,
                } => {
                    let args = ContentCreateArgs {
                        title,
                        description,
                        stage,
                        content_type,
                        script,
                        notes,
                        assignee_id: assignee,
                        project_id: project,
                        due_date: due,
                        tags,
                        estimated_hours: estimate,
                    };
                    output(&commands::content::content_create(&mut storage, args)?, human)
                }
                ContentCommands::Update {
                    id,
                    title,
                    description,
                    content_type,
                    script,
                    notes,
                    assignee,
                    project,
                    due,
                    tags,
                    estimate,
                } => {
                    let args = ContentUpdateArgs {
                        title,
                        description,
                        content_type,
                        script,
                        notes,
                        assignee_id: assignee,
                        project_id: project,
                        due_date: due,
                        tags: non_empty(tags),
                        estimated_hours: estimate,
                    };
                    output(
                        &commands::content::content_update(&mut storage, &id, args)?,
                        human,
                    )
                }
                ContentCommands::Stage { id, stage, order } => output(
                    &commands::content::content_update_stage(&mut storage, &id, stage, order)?,
                    human,
                ),
                ContentCommands::Delete { id } => {
                    output(&commands::content::content_delete(&mut storage, &id)?, human)
                }
            }
        }

        Commands::Calendar { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                CalendarCommands::List {
                    start,
                    end,
                    event_type,
                } => output(
                    &commands::calendar::event_list(&storage, start, end, event_type)?,
                    human,
                ),
                CalendarCommands::Cron => {
                    output(&commands::calendar::cron_jobs(&storage)?, human)
                }
                CalendarCommands::Metrics => {
                    output(&commands::calendar::calendar_metrics(&storage)?, human)
                }
                CalendarCommands::Create {
                    title,
                    at,
                    event_type,
                    priority,
                    description,
                    duration,
                    cron,
                    recurring,
                    pattern,
                    assignee,
                    task,
                    color,
                } => {
                    let args = EventCreateArgs {
                        title,
                        description,
                        event_type,
                        scheduled_at: at,
                        duration,
                        cron_expression: cron,
                        recurring: recurring.then_some(true),
                        recurring_pattern: pattern,
                        assignee_id: assignee,
                        task_id: task,
                        priority,
                        color,
                    };
                    output(&commands::calendar::event_create(&mut storage, args)?, human)
                }
                CalendarCommands::Update {
                    id,
                    title,
                    description,
                    at,
                    duration,
                    status,
                    priority,
                    assignee,
                    color,
                } => {
                    let args = EventUpdateArgs {
                        title,
                        description,
                        scheduled_at: at,
                        duration,
                        status,
                        priority,
                        assignee_id: assignee,
                        color,
                    };
                    output(
                        &commands::calendar::event_update(&mut storage, &id, args)?,
                        human,
                    )
                }
                CalendarCommands::Complete { id, notes } => output(
                    &commands::calendar::event_complete(&mut storage, &id, notes)?,
                    human,
                ),
                CalendarCommands::Delete { id } => {
                    output(&commands::calendar::event_delete(&mut storage, &id)?, human)
                }
            }
        }

        Commands::Memory { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                MemoryCommands::List {
                    category,
                    tag,
                    limit,
                } => output(
                    &commands::memory::memory_list(&storage, category, tag.as_deref(), limit)?,
                    human,
                ),
                MemoryCommands::Show { id } => {
                    output(&commands::memory::memory_show(&storage, &id)?, human)
                }
                MemoryCommands::Search {
                    query,
                    category,
                    limit,
                } => output(
                    &commands::memory::memory_search(&storage, &query, category, limit)?,
                    human,
                ),
                MemoryCommands::Stats => {
                    output(&commands::memory::memory_stats(&storage)?, human)
                }
                MemoryCommands::Recent { limit } => {
                    output(&commands::memory::memory_recent(&storage, limit)?, human)
                }
                MemoryCommands::Create {
                    title,
                    content,
                    summary,
                    category,
                    tags,
                    author,
                    source,
                    related,
                } => {
                    let args = MemoryCreateArgs {
                        title,
                        content,
                        summary,
                        category,
                        tags,
                        author_id: author,
                        source_url: source,
                        related_documents: related,
                    };
                    output(&commands::memory::memory_create(&mut storage, args)?, human)
                }
                MemoryCommands::Update {
                    id,
                    title,
                    content,
                    summary,
                    category,
                    tags,
                    source,
                    related,
                } => {
                    let args = MemoryUpdateArgs {
                        title,
                        content,
                        summary,
                        category,
                        tags: non_empty(tags),
                        source_url: source,
                        related_documents: non_empty(related),
                    };
                    output(&commands::memory::memory_update(&mut storage, &id, args)?, human)
                }
                MemoryCommands::Delete { id } => {
                    output(&commands::memory::memory_delete(&mut storage, &id)?, human)
                }
            }
        }

        Commands::Team { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                TeamCommands::List => output(&commands::team::team_list(&storage)?, human),
                TeamCommands::Show { id } => {
                    output(&commands::team::team_show(&storage, &id)?, human)
                }
                TeamCommands::Hierarchy => {
                    output(&commands::team::team_hierarchy(&storage)?, human)
                }
                TeamCommands::Metrics => {
                    output(&commands::team::team_metrics(&storage)?, human)
                }
                TeamCommands::Create {
                    name,
                    role,
                    model,
                    level,
                    color,
                    description,
                    specialties,
                    cost,
                    avatar,
                } => {
                    let args = MemberCreateArgs {
                        name,
                        role,
                        ai_model: model,
                        hierarchy_level: level,
                        color,
                        description,
                        specialties,
                        cost_per_hour: cost,
                        avatar,
                    };
                    output(&commands::team::member_create(&mut storage, args)?, human)
                }
                TeamCommands::Status { id, status } => output(
                    &commands::team::member_update_status(&mut storage, &id, status)?,
                    human,
                ),
            }
        }

        Commands::Session { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                SessionCommands::Spawn {
                    agent,
                    title,
                    description,
                    priority,
                    duration,
                    cost,
                } => {
                    let args = SessionSpawnArgs {
                        agent_id: agent,
                        task_title: title,
                        task_description: description,
                        priority,
                        estimated_duration: duration,
                        estimated_cost: cost,
                    };
                    output(&commands::sessions::session_spawn(&mut storage, args)?, human)
                }
                SessionCommands::Complete {
                    id,
                    status,
                    result,
                    cost,
                } => {
                    let done = commands::sessions::session_complete(
                        &mut storage,
                        &id,
                        status,
                        result,
                        cost,
                    )?;
                    output(&SessionCompleteResult::from(done), human)
                }
                SessionCommands::List { agent, limit } => output(
                    &commands::sessions::session_list(&storage, agent.as_deref(), limit)?,
                    human,
                ),
                SessionCommands::Kill { id } => {
                    let done = commands::sessions::session_kill(&mut storage, &id)?;
                    output(&SessionCompleteResult::from(done), human)
                }
                SessionCommands::Steer { id, message } => {
                    let done = commands::sessions::session_steer(&mut storage, &id, &message)?;
                    output(&SessionCompleteResult::from(done), human)
                }
            }
        }

        Commands::User { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                UserCommands::List => output(&commands::users::user_list(&storage)?, human),
                UserCommands::Show { id } => {
                    output(&commands::users::user_show(&storage, &id)?, human)
                }
                UserCommands::Create {
                    name,
                    email,
                    role,
                    avatar,
                } => output(
                    &commands::users::user_create(&mut storage, &name, &email, role, avatar)?,
                    human,
                ),
                UserCommands::Update {
                    id,
                    name,
                    email,
                    role,
                    avatar,
                } => {
                    let args = UserUpdateArgs {
                        name,
                        email,
                        role,
                        avatar,
                    };
                    output(&commands::users::user_update(&mut storage, &id, args)?, human)
                }
                UserCommands::Delete { id } => {
                    output(&commands::users::user_delete(&mut storage, &id)?, human)
                }
            }
        }

        Commands::Mirror { command } => {
            let mut storage = Storage::open(repo_path)?;
            match command {
                MirrorCommands::Sync => {
                    let client = WorkspaceClient::from_env()?;
                    output(&mirror::mirror_sync(&mut storage, &client)?, human)
                }
            }
        }

        #[cfg(feature = "server")]
        Commands::Serve { host, port } => {
            missionctl::server::run(repo_path, &host, port)?;
        }
    }

    Ok(())
}
