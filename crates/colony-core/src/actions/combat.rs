//! Combat Action
//!
//! The phase machine every timed multi-stage action in the engine follows:
//! `Initial -> Aiming -> Acting -> PostAction -> Initial`, each transition
//! gated by an elapsed-time threshold with preconditions re-checked along
//! the way. Any precondition failure (ammunition running out mid-fight)
//! fails the action immediately instead of transitioning.

use colony_messages::Message;
use rand::Rng;
use serde_json::{json, Value};
use tracing::debug;

use crate::components::agent::MemoryKind;
use crate::error::CoreError;
use crate::goals::assigned::GoalState;
use crate::goals::persistence::SaveLookup;

use super::{
    expect_state_object, sparse_state, state_f32, state_u64, Action, ActionContext,
    CompletionResult,
};

/// Phase of the attack cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatPhase {
    #[default]
    Initial,
    Aiming,
    Acting,
    PostAction,
}

impl CombatPhase {
    fn as_str(self) -> &'static str {
        match self {
            CombatPhase::Initial => "initial",
            CombatPhase::Aiming => "aiming",
            CombatPhase::Acting => "acting",
            CombatPhase::PostAction => "post_action",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(CombatPhase::Initial),
            "aiming" => Some(CombatPhase::Aiming),
            "acting" => Some(CombatPhase::Acting),
            "post_action" => Some(CombatPhase::PostAction),
            _ => None,
        }
    }
}

/// Fights the remembered threat until enough strikes land.
#[derive(Default)]
pub struct AttackTargetAction {
    phase: CombatPhase,
    elapsed_in_phase: f32,
    /// Aim duration for the current cycle, jittered per aim.
    aim_seconds: f32,
    strikes_done: u32,
    result: Option<CompletionResult>,
}

impl AttackTargetAction {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn phase_name(&self) -> &'static str {
        self.phase.as_str()
    }

    #[cfg(test)]
    pub fn elapsed_in_phase(&self) -> f32 {
        self.elapsed_in_phase
    }

    fn enter(&mut self, phase: CombatPhase) {
        self.phase = phase;
        self.elapsed_in_phase = 0.0;
    }
}

impl Action for AttackTargetAction {
    fn name(&self) -> &'static str {
        "attack_target"
    }

    fn is_applicable(&self, goal: &GoalState, ctx: &ActionContext) -> bool {
        goal.relevant_memory.is_some() || ctx.memory.contains(MemoryKind::ThreatSighted)
    }

    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        if goal.relevant_memory.is_none() {
            goal.relevant_memory = ctx.memory.get(MemoryKind::ThreatSighted).cloned();
        }
        if goal.relevant_memory.is_none() {
            self.result = Some(CompletionResult::Failure);
            return;
        }
        if !ctx.inventory.has_usable_weapon() {
            // An agent that never engaged stays out of sight and lets
            // the sighting go; one that ran dry mid-fight keeps it.
            if self.strikes_done == 0 {
                ctx.memory.forget(MemoryKind::ThreatSighted);
                goal.relevant_memory = None;
            }
            self.result = Some(CompletionResult::Failure);
            return;
        }

        self.elapsed_in_phase += delta;
        let combat = &ctx.config.combat;

        match self.phase {
            CombatPhase::Initial => {
                self.aim_seconds = combat.aim_seconds * (0.9 + 0.2 * ctx.rng.gen::<f32>());
                self.enter(CombatPhase::Aiming);
            }
            CombatPhase::Aiming => {
                if self.elapsed_in_phase >= self.aim_seconds {
                    self.enter(CombatPhase::Acting);
                }
            }
            CombatPhase::Acting => {
                if self.elapsed_in_phase < combat.strike_seconds {
                    return;
                }
                // Ammunition was checked at the top of the update.
                let needs_ammo = ctx
                    .inventory
                    .weapon
                    .as_ref()
                    .map(|w| w.requires_ammo)
                    .unwrap_or(false);
                if needs_ammo {
                    ctx.inventory.ammo = ctx.inventory.ammo.saturating_sub(1);
                }

                self.strikes_done += 1;
                if self.strikes_done >= combat.strikes_to_clear {
                    debug!(agent = %ctx.agent, strikes = self.strikes_done, "threat cleared");
                    ctx.memory.forget(MemoryKind::ThreatSighted);
                    goal.relevant_memory = None;
                    ctx.bus.dispatch(Message::EntityDestroyed {
                        entity: format!("threat_near_{}", ctx.position.location_id),
                    });
                    self.result = Some(CompletionResult::Success);
                } else {
                    self.enter(CombatPhase::PostAction);
                }
            }
            CombatPhase::PostAction => {
                if self.elapsed_in_phase >= combat.recover_seconds {
                    self.enter(CombatPhase::Initial);
                }
            }
        }
    }

    fn completion(&self) -> Option<CompletionResult> {
        self.result
    }

    fn set_completion(&mut self, result: Option<CompletionResult>) {
        self.result = result;
    }

    fn write_state(&self) -> Value {
        let mut fields = Vec::new();
        if self.phase != CombatPhase::Initial {
            fields.push(("phase", json!(self.phase.as_str())));
        }
        if self.elapsed_in_phase > 0.0 {
            fields.push(("elapsed_in_phase", json!(self.elapsed_in_phase)));
        }
        if self.aim_seconds > 0.0 {
            fields.push(("aim_seconds", json!(self.aim_seconds)));
        }
        if self.strikes_done > 0 {
            fields.push(("strikes_done", json!(self.strikes_done)));
        }
        sparse_state(fields)
    }

    fn read_state(&mut self, state: &Value, _refs: &SaveLookup) -> Result<(), CoreError> {
        expect_state_object(self.name(), state)?;
        if let Some(phase) = state.get("phase").and_then(Value::as_str) {
            self.phase = CombatPhase::parse(phase).ok_or_else(|| CoreError::RestoreState {
                action: self.name().to_string(),
                reason: format!("unknown combat phase '{phase}'"),
            })?;
        }
        self.elapsed_in_phase = state_f32(state, "elapsed_in_phase", 0.0);
        self.aim_seconds = state_f32(state, "aim_seconds", 0.0);
        self.strikes_done = state_u64(state, "strikes_done", 0) as u32;
        Ok(())
    }
}
