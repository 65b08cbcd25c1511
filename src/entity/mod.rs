//! The game-object model
//!
//! The rules describe a Ship/Building/Attacker taxonomy; here a single
//! [`Entity`] record carries a kind discriminant plus capability queries,
//! with per-kind numbers resolved from [`GameParams`] stat tables.

pub mod inventory;

pub use inventory::Inventory;

use serde::{Deserialize, Serialize};

use crate::core::config::{GameParams, ResourceValues};
use crate::core::types::{EntityId, PlayerId};
use crate::grid::map::Resource;
use crate::grid::vec2::{Direction, Vec2};

/// Ship kinds a Base can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipKind {
    Miner,
    Fighter,
}

/// Building kinds a Miner can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Base,
    Turret,
}

/// Discriminant for every entity in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    UnderConstruction,
    Base,
    Turret,
    Miner,
    Fighter,
}

impl From<ShipKind> for EntityKind {
    fn from(kind: ShipKind) -> Self {
        match kind {
            ShipKind::Miner => EntityKind::Miner,
            ShipKind::Fighter => EntityKind::Fighter,
        }
    }
}

impl From<BuildingKind> for EntityKind {
    fn from(kind: BuildingKind) -> Self {
        match kind {
            BuildingKind::Base => EntityKind::Base,
            BuildingKind::Turret => EntityKind::Turret,
        }
    }
}

impl EntityKind {
    /// One-character tag used by the action grammar and replay frames.
    /// This is the static tag registry: `from_tag` is its inverse.
    pub fn tag(self) -> char {
        match self {
            EntityKind::UnderConstruction => 'C',
            EntityKind::Base => 'B',
            EntityKind::Turret => 'T',
            EntityKind::Miner => 'M',
            EntityKind::Fighter => 'K',
        }
    }

    pub fn from_tag(c: char) -> Option<Self> {
        match c {
            'C' => Some(EntityKind::UnderConstruction),
            'B' => Some(EntityKind::Base),
            'T' => Some(EntityKind::Turret),
            'M' => Some(EntityKind::Miner),
            'K' => Some(EntityKind::Fighter),
            _ => None,
        }
    }

    pub fn is_ship(self) -> bool {
        matches!(self, EntityKind::Miner | EntityKind::Fighter)
    }

    pub fn is_building(self) -> bool {
        matches!(
            self,
            EntityKind::UnderConstruction | EntityKind::Base | EntityKind::Turret
        )
    }

    pub fn is_attacker(self) -> bool {
        matches!(self, EntityKind::Turret | EntityKind::Miner | EntityKind::Fighter)
    }

    /// Finished buildings a player can construct
    pub fn is_constructable(self) -> bool {
        matches!(self, EntityKind::Base | EntityKind::Turret)
    }

    /// Target-type filter: turrets and miners only strike ships, fighters
    /// strike everything. Non-attackers strike nothing.
    pub fn attacks(self, target: EntityKind) -> bool {
        match self {
            EntityKind::Turret | EntityKind::Miner => target.is_ship(),
            EntityKind::Fighter => true,
            _ => false,
        }
    }
}

/// Multi-turn construction progress toward a finished building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionSite {
    pub target: BuildingKind,
    pub ore: i32,
    pub fuel: i32,
    pub ore_needed: i32,
    pub fuel_needed: i32,
}

impl ConstructionSite {
    /// Complete exactly when both counters equal their targets
    pub fn complete(&self) -> bool {
        self.ore == self.ore_needed && self.fuel == self.fuel_needed
    }

    /// Value-weighted completion ratio in [0, 1]
    pub fn progress(&self, values: &ResourceValues) -> f32 {
        let done = values.ore * self.ore + values.fuel * self.fuel;
        let total = values.ore * self.ore_needed + values.fuel * self.fuel_needed;
        if total == 0 {
            1.0
        } else {
            done as f32 / total as f32
        }
    }
}

/// One game object. Which fields are meaningful depends on `kind`: ships use
/// `facing`/`new_pos`, miners use `cargo`, buildings use `vehicles`, and a
/// construction site carries `site`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub player: PlayerId,
    pub pos: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub max_value: i32,
    /// Facing of a ship, for replay display only
    pub facing: Direction,
    /// Movement staging cell; equals `pos` between turns
    pub new_pos: Vec2,
    pub cargo: Vec<Resource>,
    /// Ids of ships hosted inside this building
    pub vehicles: Vec<EntityId>,
    pub site: Option<ConstructionSite>,
    /// Pending destruction at the end-of-turn sweep
    pub marked: bool,
}

impl Entity {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        player: PlayerId,
        pos: Vec2,
        params: &GameParams,
    ) -> Self {
        let stats = params.entity_stats(kind);
        Self {
            id,
            kind,
            player,
            pos,
            health: stats.max_health,
            max_health: stats.max_health,
            max_value: stats.max_value,
            facing: Direction::Up,
            new_pos: pos,
            cargo: Vec::new(),
            vehicles: Vec::new(),
            site: None,
            marked: false,
        }
    }

    /// Current score value; every live entity is worth at least 1
    pub fn value(&self) -> i32 {
        ((self.max_value * self.health) / self.max_health).max(1)
    }

    /// Apply damage, clamping health at 0 and marking for destruction
    pub fn take_damage(&mut self, amount: i32) {
        self.health -= amount;
        if self.health <= 0 {
            self.health = 0;
            self.marked = true;
        }
    }

    pub fn is_ship(&self) -> bool {
        self.kind.is_ship()
    }

    pub fn is_building(&self) -> bool {
        self.kind.is_building()
    }

    pub fn is_attacker(&self) -> bool {
        self.kind.is_attacker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner(params: &GameParams) -> Entity {
        Entity::new(EntityId(1), EntityKind::Miner, 1, Vec2::new(0, 0), params)
    }

    #[test]
    fn health_clamps_at_zero_and_marks() {
        let params = GameParams::default();
        let mut ent = miner(&params);
        ent.take_damage(500);
        assert_eq!(ent.health, 1500);
        assert!(!ent.marked);
        ent.take_damage(9999);
        assert_eq!(ent.health, 0);
        assert!(ent.marked);
        // further damage keeps health in range
        ent.take_damage(100);
        assert_eq!(ent.health, 0);
    }

    #[test]
    fn value_scales_with_health_but_never_hits_zero() {
        let params = GameParams::default();
        let mut ent = miner(&params);
        assert_eq!(ent.value(), 20);
        ent.take_damage(1000);
        assert_eq!(ent.value(), 10);
        ent.take_damage(999);
        // 20 * 1 / 2000 floors to 0, clamped up to 1
        assert_eq!(ent.health, 1);
        assert_eq!(ent.value(), 1);
    }

    #[test]
    fn target_filters_match_kind_capabilities() {
        assert!(EntityKind::Turret.attacks(EntityKind::Miner));
        assert!(!EntityKind::Turret.attacks(EntityKind::Base));
        assert!(EntityKind::Fighter.attacks(EntityKind::Base));
        assert!(EntityKind::Fighter.attacks(EntityKind::UnderConstruction));
        assert!(!EntityKind::Base.attacks(EntityKind::Miner));
    }

    #[test]
    fn tag_registry_round_trips() {
        for kind in [
            EntityKind::UnderConstruction,
            EntityKind::Base,
            EntityKind::Turret,
            EntityKind::Miner,
            EntityKind::Fighter,
        ] {
            assert_eq!(EntityKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EntityKind::from_tag('X'), None);
    }

    #[test]
    fn construction_site_completes_only_at_exact_totals() {
        let site = ConstructionSite {
            target: BuildingKind::Turret,
            ore: 19,
            fuel: 5,
            ore_needed: 20,
            fuel_needed: 5,
        };
        assert!(!site.complete());
        let done = ConstructionSite { ore: 20, ..site };
        assert!(done.complete());
    }
}
