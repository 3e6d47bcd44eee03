//! Team commands: agent roster queries, hierarchy, and roster metrics.

use serde::Serialize;

use super::Output;
use crate::models::{
    AgentSession, AgentStatus, HierarchyLevel, SessionStatus, TeamMember, now_ms,
};
use crate::storage::{Order, Storage, generate_id};
use crate::Result;

/// A team member with recent session activity joined in.
#[derive(Debug, Serialize)]
pub struct MemberWithActivity {
    #[serde(flatten)]
    pub member: TeamMember,
    /// Running sessions among the member's five most recent
    pub active_sessions: usize,
    /// The member's three most recent sessions, newest first
    pub recent_sessions: Vec<AgentSession>,
    /// Start time of the most recent session, or the member's creation time
    /// when it has never run one (Unix ms)
    pub last_session_at: i64,
}

/// Result of `mctl team list`.
#[derive(Debug, Serialize)]
pub struct TeamList {
    pub members: Vec<MemberWithActivity>,
}

impl Output for TeamList {
    fn to_human(&self) -> String {
        if self.members.is_empty() {
            return "No team members found".to_string();
        }
        self.members
            .iter()
            .map(|m| {
                format!(
                    "{}  [{}] {}  ({}, {} sessions, {:.1}h)",
                    m.member.id,
                    m.member.status,
                    m.member.name,
                    m.member.hierarchy_level,
                    m.member.total_sessions,
                    m.member.total_hours,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for MemberWithActivity {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{}  {}", self.member.id, self.member.name),
            format!(
                "  {} / {}  status: {}  model: {}",
                self.member.role,
                self.member.hierarchy_level,
                self.member.status,
                self.member.ai_model,
            ),
            format!(
                "  sessions: {} total, {} running  hours: {:.1}",
                self.member.total_sessions, self.active_sessions, self.member.total_hours
            ),
        ];
        for session in &self.recent_sessions {
            lines.push(format!("  {}  [{}] {}", session.id, session.status, session.task_title));
        }
        lines.join("\n")
    }
}

impl Output for TeamMember {
    fn to_human(&self) -> String {
        format!("{}  [{}] {}", self.id, self.status, self.name)
    }
}

fn with_activity(member: TeamMember, sessions_desc: &[AgentSession]) -> MemberWithActivity {
    let recent: Vec<&AgentSession> = sessions_desc
        .iter()
        .filter(|s| s.agent_id == member.id)
        .take(5)
        .collect();
    let active_sessions = recent
        .iter()
        .filter(|s| s.status == SessionStatus::Running)
        .count();
    let last_session_at = recent
        .first()
        .map(|s| s.started_at)
        .unwrap_or(member.created_at);
    let recent_sessions = recent.into_iter().take(3).cloned().collect();
    MemberWithActivity {
        member,
        active_sessions,
        recent_sessions,
        last_session_at,
    }
}

/// List the roster in creation order with recent session activity joined in.
///
/// One newest-first scan over sessions covers every member.
pub fn team_list(storage: &Storage) -> Result<TeamList> {
    let members: Vec<TeamMember> = storage.scan(Order::Asc)?;
    let sessions: Vec<AgentSession> = storage.scan(Order::Desc)?;

    Ok(TeamList {
        members: members
            .into_iter()
            .map(|member| with_activity(member, &sessions))
            .collect(),
    })
}

/// Show a single member with recent session activity.
pub fn team_show(storage: &Storage, agent_id: &str) -> Result<MemberWithActivity> {
    let member: TeamMember = storage.get(agent_id)?;
    let sessions: Vec<AgentSession> = storage.scan(Order::Desc)?;
    Ok(with_activity(member, &sessions))
}

/// Result of `mctl team hierarchy`: the roster bucketed by level.
#[derive(Debug, Serialize)]
pub struct TeamHierarchy {
    pub lead: Vec<TeamMember>,
    pub senior: Vec<TeamMember>,
    pub specialist: Vec<TeamMember>,
    pub support: Vec<TeamMember>,
}

impl Output for TeamHierarchy {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for (label, members) in [
            ("lead", &self.lead),
            ("senior", &self.senior),
            ("specialist", &self.specialist),
            ("support", &self.support),
        ] {
            lines.push(format!("{}:", label));
            if members.is_empty() {
                lines.push("  (none)".to_string());
            }
            for member in members {
                lines.push(format!("  {}  {}", member.id, member.name));
            }
        }
        lines.join("\n")
    }
}

/// Bucket the roster by hierarchy level, keeping creation order within each.
pub fn team_hierarchy(storage: &Storage) -> Result<TeamHierarchy> {
    let members: Vec<TeamMember> = storage.scan(Order::Asc)?;

    let mut hierarchy = TeamHierarchy {
        lead: Vec::new(),
        senior: Vec::new(),
        specialist: Vec::new(),
        support: Vec::new(),
    };
    for member in members {
        match member.hierarchy_level {
            HierarchyLevel::Lead => hierarchy.lead.push(member),
            HierarchyLevel::Senior => hierarchy.senior.push(member),
            HierarchyLevel::Specialist => hierarchy.specialist.push(member),
            HierarchyLevel::Support => hierarchy.support.push(member),
        }
    }
    Ok(hierarchy)
}

/// Result of `mctl team metrics`.
#[derive(Debug, Serialize)]
pub struct TeamMetrics {
    pub total_agents: usize,
    pub active_agents: usize,
    pub busy_agents: usize,
    pub running_sessions: usize,
    pub completed_sessions: usize,
    /// Sessions started since UTC midnight
    pub sessions_today: usize,
    /// Sessions started in the trailing seven days
    pub sessions_this_week: usize,
    /// Sum of estimated session costs, rounded to cents
    pub total_cost: f64,
    /// Estimated cost of sessions started since UTC midnight, rounded to cents
    pub today_cost: f64,
    /// Mean duration of finished sessions in minutes, rounded
    pub average_session_minutes: i64,
    /// Completed sessions as a percentage of all sessions (100 when there
    /// are none)
    pub success_rate: i64,
}

impl Output for TeamMetrics {
    fn to_human(&self) -> String {
        format!(
            "{} agents ({} active, {} busy)\n\
             sessions: {} running, {} completed, {} today, {} this week\n\
             cost: ${:.2} (${:.2} today)  avg session: {} min  success: {}%",
            self.total_agents,
            self.active_agents,
            self.busy_agents,
            self.running_sessions,
            self.completed_sessions,
            self.sessions_today,
            self.sessions_this_week,
            self.total_cost,
            self.today_cost,
            self.average_session_minutes,
            self.success_rate,
        )
    }
}

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Compute roster-wide metrics.
pub fn team_metrics(storage: &Storage) -> Result<TeamMetrics> {
    let members: Vec<TeamMember> = storage.scan(Order::Asc)?;
    let sessions: Vec<AgentSession> = storage.scan(Order::Asc)?;

    let now = now_ms();
    let midnight = chrono::Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .timestamp_millis();

    let durations: Vec<i64> = sessions.iter().filter_map(|s| s.duration).collect();
    let average_session_minutes = if durations.is_empty() {
        0
    } else {
        ((durations.iter().sum::<i64>() as f64) / durations.len() as f64).round() as i64
    };

    let total_cost: f64 = sessions.iter().filter_map(|s| s.estimated_cost).sum();
    let today_cost: f64 = sessions
        .iter()
        .filter(|s| s.started_at >= midnight)
        .filter_map(|s| s.estimated_cost)
        .sum();

    let completed = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .count();
    let success_rate = if sessions.is_empty() {
        100
    } else {
        ((completed as f64 / sessions.len() as f64) * 100.0).round() as i64
    };

    Ok(TeamMetrics {
        total_agents: members.len(),
        active_agents: members
            .iter()
            .filter(|m| m.status == AgentStatus::Active)
            .count(),
        busy_agents: members
            .iter()
            .filter(|m| m.status == AgentStatus::Busy)
            .count(),
        running_sessions: sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Running)
            .count(),
        completed_sessions: completed,
        sessions_today: sessions.iter().filter(|s| s.started_at >= midnight).count(),
        sessions_this_week: sessions
            .iter()
            .filter(|s| s.started_at > now - WEEK_MS)
            .count(),
        total_cost: (total_cost * 100.0).round() / 100.0,
        today_cost: (today_cost * 100.0).round() / 100.0,
        average_session_minutes,
        success_rate,
    })
}

/// Arguments for `mctl team create`.
#[derive(Debug)]
pub struct MemberCreateArgs {
    pub name: String,
    pub role: String,
    pub ai_model: String,
    pub hierarchy_level: HierarchyLevel,
    pub color: String,
    pub description: Option<String>,
    pub specialties: Vec<String>,
    pub cost_per_hour: Option<f64>,
    pub avatar: Option<String>,
}

/// Add an agent to the roster. New members start active with zeroed counters.
pub fn member_create(storage: &mut Storage, args: MemberCreateArgs) -> Result<TeamMember> {
    let mut member = TeamMember::new(
        generate_id("agt", &args.name),
        args.name,
        args.role,
        args.ai_model,
        args.hierarchy_level,
        args.color,
    );
    member.description = args.description;
    member.specialties = args.specialties;
    member.cost_per_hour = args.cost_per_hour;
    member.avatar = args.avatar;

    storage.insert(&member)?;
    Ok(member)
}

/// Set a member's availability status directly.
///
/// Returning to `active` also stamps `last_active_at`. This sits beside the
/// session lifecycle, which patches the same field on spawn and complete.
pub fn member_update_status(
    storage: &mut Storage,
    agent_id: &str,
    status: AgentStatus,
) -> Result<TeamMember> {
    let mut member: TeamMember = storage.get(agent_id)?;

    let now = now_ms();
    member.status = status;
    if status == AgentStatus::Active {
        member.last_active_at = Some(now);
    }
    member.updated_at = now;

    storage.put(&member)?;
    Ok(member)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::commands::sessions::{SessionSpawnArgs, session_complete, session_spawn};
    use crate::models::Priority;
    use crate::test_utils::TestEnv;
    use crate::Error;

    pub(crate) fn create_args(name: &str, level: HierarchyLevel) -> MemberCreateArgs {
        MemberCreateArgs {
            name: name.to_string(),
            role: "Research".to_string(),
            ai_model: "gpt-4o".to_string(),
            hierarchy_level: level,
            color: "#ff8800".to_string(),
            description: None,
            specialties: Vec::new(),
            cost_per_hour: None,
            avatar: None,
        }
    }

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

    #[test]
    fn test_list_joins_recent_sessions() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let member =
            member_create(&mut storage, create_args("Scout", HierarchyLevel::Specialist))
                .unwrap();
        for i in 0..4 {
            session_spawn(&mut storage, spawn_args(&member.id, &format!("job {}", i)))
                .unwrap();
        }

        let list = team_list(&storage).unwrap();
        assert_eq!(list.members.len(), 1);
        let joined = &list.members[0];
        assert_eq!(joined.active_sessions, 4);
        // Only the three newest are embedded.
        assert_eq!(joined.recent_sessions.len(), 3);
        assert_eq!(joined.recent_sessions[0].task_title, "job 3");
        assert_eq!(joined.last_session_at, joined.recent_sessions[0].started_at);
    }

    #[test]
    fn test_last_session_falls_back_to_creation_time() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let member =
            member_create(&mut storage, create_args("Fresh", HierarchyLevel::Specialist))
                .unwrap();

        let list = team_list(&storage).unwrap();
        assert_eq!(list.members[0].last_session_at, member.created_at);
    }

    #[test]
    fn test_active_sessions_only_counts_five_most_recent() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let member =
            member_create(&mut storage, create_args("Grinder", HierarchyLevel::Support))
                .unwrap();

        // An old running session gets pushed out of the five-session window
        // by newer completed ones.
        let old = session_spawn(&mut storage, spawn_args(&member.id, "stuck")).unwrap();
        for i in 0..5 {
            let s = session_spawn(&mut storage, spawn_args(&member.id, &format!("done {}", i)))
                .unwrap();
            session_complete(&mut storage, &s.session_id, SessionStatus::Completed, None, None)
                .unwrap();
        }

        let list = team_list(&storage).unwrap();
        assert_eq!(list.members[0].active_sessions, 0);

        // The old session is still running, just outside the window.
        let session: AgentSession = storage.get(&old.session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Running);
    }

    #[test]
    fn test_hierarchy_buckets() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        member_create(&mut storage, create_args("Atlas", HierarchyLevel::Lead)).unwrap();
        member_create(&mut storage, create_args("Scout", HierarchyLevel::Specialist)).unwrap();
        member_create(&mut storage, create_args("Sage", HierarchyLevel::Specialist)).unwrap();

        let hierarchy = team_hierarchy(&storage).unwrap();
        assert_eq!(hierarchy.lead.len(), 1);
        assert_eq!(hierarchy.specialist.len(), 2);
        assert_eq!(hierarchy.specialist[0].name, "Scout");
        assert!(hierarchy.senior.is_empty());
        assert!(hierarchy.support.is_empty());
    }

    #[test]
    fn test_metrics() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let a = member_create(&mut storage, create_args("Atlas", HierarchyLevel::Lead)).unwrap();
        member_create(&mut storage, create_args("Idle", HierarchyLevel::Support)).unwrap();

        let mut args = spawn_args(&a.id, "estimate");
        args.estimated_cost = Some(1.239);
        session_spawn(&mut storage, args).unwrap();
        let s = session_spawn(&mut storage, spawn_args(&a.id, "finish")).unwrap();
        session_complete(&mut storage, &s.session_id, SessionStatus::Completed, None, None)
            .unwrap();

        let metrics = team_metrics(&storage).unwrap();
        assert_eq!(metrics.total_agents, 2);
        // Completing the second session flipped Atlas back to active.
        assert_eq!(metrics.active_agents, 2);
        assert_eq!(metrics.busy_agents, 0);
        assert_eq!(metrics.running_sessions, 1);
        assert_eq!(metrics.completed_sessions, 1);
        assert_eq!(metrics.sessions_today, 2);
        assert_eq!(metrics.sessions_this_week, 2);
        assert_eq!(metrics.total_cost, 1.24);
        // Both sessions started today, so the windows agree.
        assert_eq!(metrics.today_cost, 1.24);
        assert_eq!(metrics.average_session_minutes, 0);
        // One completed of two sessions total.
        assert_eq!(metrics.success_rate, 50);
    }

    #[test]
    fn test_metrics_success_rate_is_full_on_empty_roster() {
        let env = TestEnv::new();
        let storage = env.init_storage();

        let metrics = team_metrics(&storage).unwrap();
        assert_eq!(metrics.success_rate, 100);
        assert_eq!(metrics.today_cost, 0.0);
    }

    #[test]
    fn test_update_status_stamps_last_active() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let member =
            member_create(&mut storage, create_args("Scout", HierarchyLevel::Specialist))
                .unwrap();
        assert!(member.last_active_at.is_none());

        let busy = member_update_status(&mut storage, &member.id, AgentStatus::Busy).unwrap();
        assert!(busy.last_active_at.is_none());

        let active = member_update_status(&mut storage, &member.id, AgentStatus::Active).unwrap();
        assert!(active.last_active_at.is_some());
    }

    #[test]
    fn test_show_missing_is_not_found() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        assert!(matches!(
            team_show(&storage, "agt-ffffff"),
            Err(Error::NotFound(_))
        ));
    }
}
