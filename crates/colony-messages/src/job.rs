//! Job Types
//!
//! A job is a unit of settlement work posted on the job board: craft at a
//! station, haul goods, fight off a threat. Jobs are reserved by exactly one
//! agent at a time; all state transitions go through the job board so there
//! is a single writer per record.

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, FurnitureId, GoalId, JobId};

/// Lifecycle state of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting on the job board for an agent.
    Open,
    /// Reserved by one agent.
    Assigned(AgentId),
    /// Finished successfully.
    Completed,
    /// Withdrawn; terminal, safe to cancel again.
    Cancelled,
}

/// A unit of settlement work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Human-readable job name (e.g. "saw_planks").
    pub name: String,
    /// Required profession, if any. Agents of other professions skip it.
    pub profession: Option<String>,
    /// Whether the agent needs a usable weapon to take this job.
    pub requires_weapon: bool,
    /// Set when accepting this job must redirect the agent to a different
    /// goal (e.g. a threat-response job switching to a combat goal).
    pub switch_to_goal: Option<GoalId>,
    /// Furniture the job is performed at, if any.
    pub target_furniture: Option<FurnitureId>,
    /// Higher priority jobs are offered first.
    pub priority: i32,
    /// Seconds of work to complete the job.
    pub work_duration: f32,
    pub state: JobState,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: JobId::generate(),
            name: name.into(),
            profession: None,
            requires_weapon: false,
            switch_to_goal: None,
            target_furniture: None,
            priority: 0,
            work_duration: 10.0,
            state: JobState::Open,
        }
    }

    pub fn with_profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = Some(profession.into());
        self
    }

    pub fn with_weapon_required(mut self) -> Self {
        self.requires_weapon = true;
        self
    }

    pub fn with_goal_switch(mut self, goal: GoalId) -> Self {
        self.switch_to_goal = Some(goal);
        self
    }

    pub fn with_furniture(mut self, furniture: FurnitureId) -> Self {
        self.target_furniture = Some(furniture);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.work_duration = seconds;
        self
    }

    pub fn is_open(&self) -> bool {
        self.state == JobState::Open
    }

    pub fn assigned_to(&self) -> Option<&AgentId> {
        match &self.state {
            JobState::Assigned(agent) => Some(agent),
            _ => None,
        }
    }
}
