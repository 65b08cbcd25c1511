//! Per-player ownership containers
//!
//! An inventory exclusively owns its entity ids; the map only back-references
//! them. Iteration order of the per-kind lists is the deterministic order the
//! engine resolves phases in.

use serde::{Deserialize, Serialize};

use crate::core::config::ResourceValues;
use crate::core::types::{EntityId, PlayerId};
use crate::entity::EntityKind;
use crate::grid::map::Resource;
use crate::world::Entities;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub player: PlayerId,
    pub ore: i32,
    pub fuel: i32,
    pub under_construction: Vec<EntityId>,
    pub bases: Vec<EntityId>,
    pub turrets: Vec<EntityId>,
    pub miners: Vec<EntityId>,
    pub fighters: Vec<EntityId>,
}

impl Inventory {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            ore: 0,
            fuel: 0,
            under_construction: Vec::new(),
            bases: Vec::new(),
            turrets: Vec::new(),
            miners: Vec::new(),
            fighters: Vec::new(),
        }
    }

    fn list_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityId> {
        match kind {
            EntityKind::UnderConstruction => &mut self.under_construction,
            EntityKind::Base => &mut self.bases,
            EntityKind::Turret => &mut self.turrets,
            EntityKind::Miner => &mut self.miners,
            EntityKind::Fighter => &mut self.fighters,
        }
    }

    pub fn add(&mut self, kind: EntityKind, id: EntityId) {
        self.list_mut(kind).push(id);
    }

    pub fn remove(&mut self, kind: EntityKind, id: EntityId) {
        self.list_mut(kind).retain(|&e| e != id);
    }

    /// All ships, miners first
    pub fn ships(&self) -> Vec<EntityId> {
        let mut out = self.miners.clone();
        out.extend(&self.fighters);
        out
    }

    /// All entities able to attack, in resolution order
    pub fn attackers(&self) -> Vec<EntityId> {
        let mut out = self.turrets.clone();
        out.extend(&self.miners);
        out.extend(&self.fighters);
        out
    }

    pub fn buildings(&self) -> Vec<EntityId> {
        let mut out = self.under_construction.clone();
        out.extend(&self.bases);
        out.extend(&self.turrets);
        out
    }

    /// Every owned entity, buildings before ships
    pub fn entities(&self) -> Vec<EntityId> {
        let mut out = self.buildings();
        out.extend(&self.miners);
        out.extend(&self.fighters);
        out
    }

    /// Banked resource value plus the value of every owned entity
    pub fn score(&self, arena: &Entities, values: &ResourceValues) -> i32 {
        let mut total = self.ore * values.value_of(Resource::Ore)
            + self.fuel * values.value_of(Resource::Fuel);
        for id in self.entities() {
            if let Some(ent) = arena.get(id) {
                total += ent.value();
            }
        }
        total
    }
}
