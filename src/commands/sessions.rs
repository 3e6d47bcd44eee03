//! Session lifecycle commands: spawn, complete, list, kill, and steer.
//!
//! Sessions are the unit of agent work. Spawning marks the owning team member
//! busy; completion marks it active again and rolls the session's duration
//! into the member's lifetime counters.

use serde::Serialize;

use super::Output;
use crate::models::{AgentSession, AgentStatus, Priority, SessionStatus, TeamMember, now_ms};
use crate::storage::{Order, Storage, generate_id};
use crate::{Error, Result};

/// Default result page for `session list`.
pub const DEFAULT_SESSION_LIMIT: usize = 50;

/// Arguments for `mctl session spawn`.
#[derive(Debug)]
pub struct SessionSpawnArgs {
    pub agent_id: String,
    pub task_title: String,
    pub task_description: Option<String>,
    pub priority: Priority,
    pub estimated_duration: Option<i64>,
    pub estimated_cost: Option<f64>,
}

/// Result of `mctl session spawn`.
#[derive(Debug, Serialize)]
pub struct SessionSpawned {
    pub session_id: String,
    pub agent_id: String,
    pub status: SessionStatus,
}

impl Output for SessionSpawned {
    fn to_human(&self) -> String {
        format!("Spawned {} for {}", self.session_id, self.agent_id)
    }
}

/// Start a new session for an agent.
///
/// Fails when the agent does not exist. The agent is marked busy regardless
/// of its previous status or any other sessions it already has running.
pub fn session_spawn(storage: &mut Storage, args: SessionSpawnArgs) -> Result<SessionSpawned> {
    let mut member: TeamMember = storage.get(&args.agent_id)?;

    let mut session = AgentSession::new(
        generate_id("ses", &args.task_title),
        args.agent_id,
        args.task_title,
        args.priority,
    );
    session.task_description = args.task_description;
    session.estimated_duration = args.estimated_duration;
    session.estimated_cost = args.estimated_cost;

    member.status = AgentStatus::Busy;
    member.updated_at = now_ms();

    storage.with_transaction(|s| {
        s.insert(&session)?;
        s.put(&member)?;
        Ok(())
    })?;

    Ok(SessionSpawned {
        session_id: session.id,
        agent_id: member.id,
        status: SessionStatus::Running,
    })
}

/// Result of a successful completion.
#[derive(Debug, Serialize)]
pub struct SessionCompleted {
    pub session_id: String,
    pub status: SessionStatus,
    /// Wall-clock duration in whole minutes
    pub duration: i64,
}

///// Completion outcome wrapper: `completed` is false when the session id did
/// not resolve and nothing happened.
#[derive(Debug, Serialize)]
pub struct SessionCompleteResult {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionCompleted>,
}

impl From<Option<SessionCompleted>> for SessionCompleteResult {
    fn from(session: Option<SessionCompleted>) -> Self {
        Self {
            completed: session.is_some(),
            session,
        }
    }
}

impl Output for SessionCompleteResult {
    fn to_human(&self) -> String {
        match &self.session {
            Some(done) => format!(
                "Session {} {} after {} min",
                done.session_id, done.status, done.duration
            ),
            None => "No such session; nothing to do".to_string(),
        }
    }
}

/// Move a session to a terminal status and update the owning agent.
///
/// A session id that does not resolve is a no-op returning `None`.
///
/// The transition is not guarded: completing an already-terminal session runs
/// the full bookkeeping again, recomputing the duration from `started_at` and
/// incrementing the agent's counters a second time. The agent also flips back
/// to active unconditionally, even when other sessions of the same agent are
/// still running. All three terminal statuses feed the counters identically.
pub fn session_complete(
    storage: &mut Storage,
    session_id: &str,
    status: SessionStatus,
    result: Option<String>,
    actual_cost: Option<f64>,
) -> Result<Option<SessionCompleted>> {
    if !status.is_terminal() {
        return Err(Error::InvalidInput(format!(
            "Cannot complete a session into status '{}'",
            status
        )));
    }

    let Some(mut session) = storage.try_get::<AgentSession>(session_id)? else {
        return Ok(None);
    };

    let now = now_ms();
    let duration = ((now - session.started_at) as f64 / 60_000.0).round() as i64;

    session.status = status;
    session.completed_at = Some(now);
    session.duration = Some(duration);
    session.result = result;
    session.actual_cost = actual_cost;
    session.updated_at = now;

    let member = storage.try_get::<TeamMember>(&session.agent_id)?;

    storage.with_transaction(|s| {
        s.put(&session)?;
        // A dangling agent id leaves the session updated on its own.
        if let Some(mut member) = member {
            member.status = AgentStatus::Active;
            member.total_sessions += 1;
            member.total_hours += duration as f64 / 60.0;
            member.updated_at = now;
            s.put(&member)?;
        }
        Ok(())
    })?;

    Ok(Some(SessionCompleted {
        session_id: session.id,
        status,
        duration,
    }))
}

/// A session with its owning agent resolved.
#[derive(Debug, Serialize)]
pub struct SessionWithAgent {
    #[serde(flatten)]
    pub session: AgentSession,
    pub agent: Option<TeamMember>,
}

/// Result of `mctl session list`.
#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<SessionWithAgent>,
}

impl Output for SessionList {
    fn to_human(&self) -> String {
        if self.sessions.is_empty() {
            return "No sessions found".to_string();
        }
        self.sessions
            .iter()
            .map(|s| {
                let agent = s.agent.as_ref().map(|a| a.name.as_str()).unwrap_or("?");
                format!(
                    "{}  [{}] {}  ({})",
                    s.session.id, s.session.status, s.session.task_title, agent
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List sessions newest-first, optionally for one agent, with owners joined
/// in batch. The limit applies after filtering.
pub fn session_list(
    storage: &Storage,
    agent_id: Option<&str>,
    limit: usize,
) -> Result<SessionList> {
    let sessions: Vec<AgentSession> = storage.scan(Order::Desc)?;
    let mut sessions: Vec<AgentSession> = sessions
        .into_iter()
        .filter(|s| agent_id.is_none_or(|a| s.agent_id == a))
        .collect();
    sessions.truncate(limit);

    let agent_ids: Vec<&str> = sessions.iter().map(|s| s.agent_id.as_str()).collect();
    let agents = storage.get_many::<TeamMember>(&agent_ids)?;

    let sessions = sessions
        .into_iter()
        .map(|session| {
            let agent = agents.get(&session.agent_id).cloned();
            SessionWithAgent { session, agent }
        })
        .collect();

    Ok(SessionList { sessions })
}

/// List running sessions only. The limit is applied before the status
/// filter, so at most `limit` recent sessions are considered.
pub fn session_list_running(
    storage: &Storage,
    agent_id: Option<&str>,
    limit: usize,
) -> Result<SessionList> {
    let mut list = session_list(storage, agent_id, limit)?;
    list.sessions
        .retain(|s| s.session.status == SessionStatus::Running);
    Ok(list)
}

/// Cancel a session. Same bookkeeping as any other completion.
pub fn session_kill(storage: &mut Storage, session_id: &str) -> Result<Option<SessionCompleted>> {
    session_complete(storage, session_id, SessionStatus::Cancelled, None, None)
}

/// Redirect a session by completing it with the steering message as its
/// result. The dashboard treats a steered session as finished work.
pub fn session_steer(
    storage: &mut Storage,
    session_id: &str,
    message: &str,
) -> Result<Option<SessionCompleted>> {
    session_complete(
        storage,
        session_id,
        SessionStatus::Completed,
        Some(format!("[Steered] {}", message)),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::team::{member_create, tests::create_args};
    use crate::models::HierarchyLevel;
    use crate::test_utils::TestEnv;

    fn spawn_args(agent_id: &str, title: &str) -> SessionSpawnArgs {
        SessionSpawnArgs {
            agent_id: agent_id.to_string(),
            task_title: title.to_string(),
            task_description: None,
            priority: Priority::Medium,
            estimated_duration: None,
            estimated_cost: None,
        }
    }

    fn roster_member(storage: &mut Storage) -> TeamMember {
        member_create(storage, create_args("Scout", HierarchyLevel::Specialist)).unwrap()
    }

    #[test]
    fn test_spawn_marks_agent_busy() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);

        let spawned = session_spawn(&mut storage, spawn_args(&member.id, "research")).unwrap();
        assert_eq!(spawned.status, SessionStatus::Running);

        let session: AgentSession = storage.get(&spawned.session_id).unwrap();
        assert_eq!(session.agent_id, member.id);
        assert_eq!(session.started_at, session.created_at);

        let member: TeamMember = storage.get(&member.id).unwrap();
        assert_eq!(member.status, AgentStatus::Busy);
        assert_eq!(member.total_sessions, 0);
    }

    #[test]
    fn test_spawn_missing_agent_fails_without_session() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let result = session_spawn(&mut storage, spawn_args("agt-ffffff", "ghost work"));
        assert!(matches!(result, Err(Error::NotFound(_))));

        let sessions: Vec<AgentSession> = storage.scan(Order::Asc).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_complete_updates_session_and_agent() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);

        let spawned = session_spawn(&mut storage, spawn_args(&member.id, "research")).unwrap();
        let done = session_complete(
            &mut storage,
            &spawned.session_id,
            SessionStatus::Completed,
            Some("found it".to_string()),
            Some(0.42),
        )
        .unwrap()
        .unwrap();

        // Sub-minute sessions round to zero.
        assert_eq!(done.duration, 0);

        let session: AgentSession = storage.get(&spawned.session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.result.as_deref(), Some("found it"));
        assert_eq!(session.actual_cost, Some(0.42));
        assert!(session.completed_at.is_some());

        let member: TeamMember = storage.get(&member.id).unwrap();
        assert_eq!(member.status, AgentStatus::Active);
        assert_eq!(member.total_sessions, 1);
        assert_eq!(member.total_hours, 0.0);
    }

    #[test]
    fn test_complete_missing_session_is_a_noop() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let result =
            session_complete(&mut storage, "ses-ffffff", SessionStatus::Completed, None, None)
                .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_complete_rejects_running_status() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);
        let spawned = session_spawn(&mut storage, spawn_args(&member.id, "work")).unwrap();

        let result = session_complete(
            &mut storage,
            &spawned.session_id,
            SessionStatus::Running,
            None,
            None,
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_failed_and_cancelled_count_like_completed() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);

        let a = session_spawn(&mut storage, spawn_args(&member.id, "a")).unwrap();
        session_complete(&mut storage, &a.session_id, SessionStatus::Failed, None, None)
            .unwrap();
        let b = session_spawn(&mut storage, spawn_args(&member.id, "b")).unwrap();
        session_kill(&mut storage, &b.session_id).unwrap();

        let member: TeamMember = storage.get(&member.id).unwrap();
        assert_eq!(member.total_sessions, 2);
        assert_eq!(member.status, AgentStatus::Active);
    }

    #[test]
    fn test_double_complete_counts_twice() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);
        let spawned = session_spawn(&mut storage, spawn_args(&member.id, "twice")).unwrap();

        session_complete(&mut storage, &spawned.session_id, SessionStatus::Completed, None, None)
            .unwrap();
        let second = session_complete(
            &mut storage,
            &spawned.session_id,
            SessionStatus::Failed,
            None,
            None,
        )
        .unwrap();
        assert!(second.is_some());

        let session: AgentSession = storage.get(&spawned.session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Failed);

        let member: TeamMember = storage.get(&member.id).unwrap();
        assert_eq!(member.total_sessions, 2);
    }

    #[test]
    fn test_completing_one_of_two_running_sessions_flips_agent_active() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);

        let first = session_spawn(&mut storage, spawn_args(&member.id, "first")).unwrap();
        let second = session_spawn(&mut storage, spawn_args(&member.id, "second")).unwrap();

        session_complete(&mut storage, &first.session_id, SessionStatus::Completed, None, None)
            .unwrap();

        let loaded: TeamMember = storage.get(&member.id).unwrap();
        assert_eq!(loaded.status, AgentStatus::Active);

        let still_running: AgentSession = storage.get(&second.session_id).unwrap();
        assert_eq!(still_running.status, SessionStatus::Running);
    }

    #[test]
    fn test_complete_with_dangling_agent_updates_session_only() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);
        let spawned = session_spawn(&mut storage, spawn_args(&member.id, "orphaned")).unwrap();

        storage.delete::<TeamMember>(&member.id).unwrap();

        let done = session_complete(
            &mut storage,
            &spawned.session_id,
            SessionStatus::Completed,
            None,
            None,
        )
        .unwrap();
        assert!(done.is_some());

        let session: AgentSession = storage.get(&spawned.session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[test]
    fn test_steer_completes_with_prefixed_result() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);
        let spawned = session_spawn(&mut storage, spawn_args(&member.id, "wandering")).unwrap();

        session_steer(&mut storage, &spawned.session_id, "focus on the parser").unwrap();

        let session: AgentSession = storage.get(&spawned.session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.result.as_deref(), Some("[Steered] focus on the parser"));
    }

    #[test]
    fn test_kill_cancels() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);
        let spawned = session_spawn(&mut storage, spawn_args(&member.id, "runaway")).unwrap();

        let done = session_kill(&mut storage, &spawned.session_id).unwrap().unwrap();
        assert_eq!(done.status, SessionStatus::Cancelled);

        assert!(session_kill(&mut storage, "ses-ffffff").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first_with_filter_and_limit() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let scout = roster_member(&mut storage);
        let atlas =
            member_create(&mut storage, create_args("Atlas", HierarchyLevel::Support)).unwrap();

        for i in 0..3 {
            session_spawn(&mut storage, spawn_args(&scout.id, &format!("scout {}", i)))
                .unwrap();
        }
        session_spawn(&mut storage, spawn_args(&atlas.id, "atlas 0")).unwrap();

        let list = session_list(&storage, None, DEFAULT_SESSION_LIMIT).unwrap();
        assert_eq!(list.sessions.len(), 4);
        assert_eq!(list.sessions[0].session.task_title, "atlas 0");
        assert_eq!(list.sessions[0].agent.as_ref().unwrap().name, "Atlas");

        let list = session_list(&storage, Some(scout.id.as_str()), 2).unwrap();
        assert_eq!(list.sessions.len(), 2);
        assert_eq!(list.sessions[0].session.task_title, "scout 2");
    }

    #[test]
    fn test_list_running_drops_finished_sessions() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let member = roster_member(&mut storage);

        let done = session_spawn(&mut storage, spawn_args(&member.id, "finished")).unwrap();
        session_complete(&mut storage, &done.session_id, SessionStatus::Completed, None, None)
            .unwrap();
        session_spawn(&mut storage, spawn_args(&member.id, "ongoing")).unwrap();

        let list = session_list_running(&storage, None, DEFAULT_SESSION_LIMIT).unwrap();
        assert_eq!(list.sessions.len(), 1);
        assert_eq!(list.sessions[0].session.task_title, "ongoing");
    }
}
