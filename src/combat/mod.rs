//! Combat system
//!
//! Glue between the boss controller and the Bevy app:
//! - Controller and world events
//! - Combatant naming for readable logs
//! - Combat logging

use bevy::prelude::*;
use std::collections::HashMap;

pub mod events;
pub mod log;
pub mod systems;

pub use systems::record_combat_log;

use crate::controller::world::EntityRef;
use events::*;

/// Display name used for the boss in logs and results
pub const BOSS_NAME: &str = "Void Warden";

/// Plugin for the combat system
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app
            // Combat events
            .add_event::<ControllerEvent>()
            .add_event::<DamageDealtEvent>()
            .add_event::<BossHitEvent>()
            .add_event::<DebuffAppliedEvent>()
            // Resources
            .init_resource::<log::CombatLog>()
            .init_resource::<CombatantNames>();
    }
}

/// Display names for actors the controller refers to by [`EntityRef`]
#[derive(Resource, Default, Debug)]
pub struct CombatantNames {
    names: HashMap<EntityRef, String>,
}

impl CombatantNames {
    pub fn insert(&mut self, id: EntityRef, name: String) {
        self.names.insert(id, name);
    }

    pub fn name_of(&self, id: EntityRef) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Actor {}", id.0))
    }

    /// Like [`Self::name_of`] for optional references
    pub fn name_or_unknown(&self, id: Option<EntityRef>) -> String {
        id.map(|id| self.name_of(id))
            .unwrap_or_else(|| "Unknown".to_string())
    }
}
