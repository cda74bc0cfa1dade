//! Action Registry
//!
//! Maps stable action names to constructors. Registration happens once at
//! startup; goal definitions and save files are validated against the
//! registry so an unknown name is caught at load time, not on first use.
//! The executor still treats a runtime resolve failure as a failed goal
//! rather than letting it poison the tick.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::error::CoreError;

use super::{
    Action, AttackTargetAction, CancelHaulingAllocationAction, CancelLiquidAllocationAction,
    DrinkFetchedLiquidAction, GoToLocationAction, PickUpHauledItemAction,
    RequestHaulingAllocationAction, RequestLiquidTransferAction, SelectJobAction, SleepAction,
    WorkOnJobAction,
};

/// Constructs a fresh action instance.
pub type ActionFactory = fn() -> Box<dyn Action>;

/// Resource: the name -> factory table for all concrete actions.
#[derive(Resource, Default)]
pub struct ActionRegistry {
    factories: HashMap<&'static str, ActionFactory>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in action registered.
    pub fn with_builtin_actions() -> Self {
        let mut registry = Self::new();
        registry.register(|| Box::new(SelectJobAction::new()));
        registry.register(|| Box::new(WorkOnJobAction::new()));
        registry.register(|| Box::new(GoToLocationAction::new()));
        registry.register(|| Box::new(AttackTargetAction::new()));
        registry.register(|| Box::new(SleepAction::new()));
        registry.register(|| Box::new(RequestHaulingAllocationAction::new()));
        registry.register(|| Box::new(PickUpHauledItemAction::new()));
        registry.register(|| Box::new(CancelHaulingAllocationAction::new()));
        registry.register(|| Box::new(RequestLiquidTransferAction::new()));
        registry.register(|| Box::new(DrinkFetchedLiquidAction::new()));
        registry.register(|| Box::new(CancelLiquidAllocationAction::new()));
        registry
    }

    /// Registers a factory under the name its actions report.
    pub fn register(&mut self, factory: ActionFactory) {
        let name = factory().name();
        self.factories.insert(name, factory);
    }

    /// Constructs a new action for the given stable name.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn Action>, CoreError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| CoreError::UnknownAction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}
