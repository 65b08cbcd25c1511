//! Game parameters and per-kind stat tables
//!
//! Every tuning constant lives here. `GameParams::default()` is the standard
//! ruleset; individual tables can be overridden from a TOML file.

use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::Tick;
use crate::entity::{BuildingKind, EntityKind, ShipKind};
use crate::grid::map::Resource;

/// Score value of one unit of each resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceValues {
    pub ore: i32,
    pub fuel: i32,
}

impl Default for ResourceValues {
    fn default() -> Self {
        Self { ore: 2, fuel: 5 }
    }
}

impl ResourceValues {
    pub fn value_of(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Ore => self.ore,
            Resource::Fuel => self.fuel,
        }
    }
}

/// Stats shared by every entity kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntityStats {
    /// Score value at full health
    pub max_value: i32,
    /// Starting and maximum health
    pub max_health: i32,
}

/// Stats for entities that can attack
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttackStats {
    /// Total damage per turn, split evenly among targets in range
    pub damage: i32,
    /// Maximum attack range (taxicab metric)
    pub range: i32,
}

/// Construction cost of a ship or building
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cost {
    pub ore: i32,
    pub fuel: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderConstructionStats {
    pub entity: EntityStats,
    pub vehicle_capacity: usize,
}

impl Default for UnderConstructionStats {
    fn default() -> Self {
        Self {
            entity: EntityStats { max_value: 1, max_health: 2000 },
            vehicle_capacity: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    pub entity: EntityStats,
    pub vehicle_capacity: usize,
    pub cost: Cost,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            entity: EntityStats { max_value: 75, max_health: 10_000 },
            vehicle_capacity: 30,
            cost: Cost { ore: 30, fuel: 6 },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretStats {
    pub entity: EntityStats,
    pub vehicle_capacity: usize,
    pub cost: Cost,
    pub attack: AttackStats,
}

impl Default for TurretStats {
    fn default() -> Self {
        Self {
            entity: EntityStats { max_value: 45, max_health: 8000 },
            vehicle_capacity: 4,
            cost: Cost { ore: 20, fuel: 5 },
            attack: AttackStats { damage: 900, range: 4 },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerStats {
    pub entity: EntityStats,
    pub cost: Cost,
    pub attack: AttackStats,
    pub cargo_space: usize,
}

impl Default for MinerStats {
    fn default() -> Self {
        Self {
            entity: EntityStats { max_value: 20, max_health: 2000 },
            cost: Cost { ore: 8, fuel: 2 },
            attack: AttackStats { damage: 300, range: 2 },
            cargo_space: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterStats {
    pub entity: EntityStats,
    pub cost: Cost,
    pub attack: AttackStats,
}

impl Default for FighterStats {
    fn default() -> Self {
        Self {
            entity: EntityStats { max_value: 25, max_health: 3000 },
            cost: Cost { ore: 10, fuel: 3 },
            attack: AttackStats { damage: 600, range: 3 },
        }
    }
}

/// Parameters applied once at game start
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StartParams {
    /// Starting miners per player
    pub miners: u32,
    /// Starting fighters per player
    pub fighters: u32,
    /// Bounds for the randomly rolled game length
    pub min_len: Tick,
    pub max_len: Tick,
    /// Bounds for the randomly rolled map size
    pub min_w: i32,
    pub max_w: i32,
    pub min_h: i32,
    pub max_h: i32,
    /// How far from the map edge / vertical midline a base may land
    pub base_off: i32,
    /// Radius around each base kept free of deposits
    pub clear: i32,
}

impl Default for StartParams {
    fn default() -> Self {
        Self {
            miners: 10,
            fighters: 3,
            min_len: 400,
            max_len: 600,
            min_w: 48,
            max_w: 52,
            min_h: 23,
            max_h: 27,
            base_off: 3,
            clear: 3,
        }
    }
}

/// Parameters for growing deposit clusters of one resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DepositParams {
    pub resource: Resource,
    pub min_num: u32,
    pub max_num: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub min_start_amt: i32,
    pub max_start_amt: i32,
    pub min_inc_amt: i32,
    pub max_inc_amt: i32,
    pub max_amt: i32,
    pub left_offset: i32,
    pub right_offset: i32,
}

impl DepositParams {
    pub fn default_ore() -> Self {
        Self {
            resource: Resource::Ore,
            min_num: 6,
            max_num: 9,
            min_size: 5,
            max_size: 9,
            min_start_amt: 7,
            max_start_amt: 9,
            min_inc_amt: 3,
            max_inc_amt: 5,
            max_amt: 25,
            left_offset: 0,
            right_offset: 6,
        }
    }

    pub fn default_fuel() -> Self {
        Self {
            resource: Resource::Fuel,
            min_num: 4,
            max_num: 6,
            min_size: 3,
            max_size: 6,
            min_start_amt: 4,
            max_start_amt: 6,
            min_inc_amt: 2,
            max_inc_amt: 3,
            max_amt: 15,
            left_offset: 8,
            right_offset: 0,
        }
    }
}

/// Per-agent time budgets in seconds. Advisory bookkeeping for an external
/// caller; nothing in the engine enforces them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeLimits {
    pub init: u32,
    pub main: u32,
    pub increment: u32,
    pub delay: u32,
}

impl Default for TimeLimits {
    fn default() -> Self {
        Self { init: 30, main: 120, increment: 2, delay: 1 }
    }
}

/// All parameters used by one game
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameParams {
    pub resources: ResourceValues,
    pub under_construction: UnderConstructionStats,
    pub bases: BaseStats,
    pub turrets: TurretStats,
    pub miners: MinerStats,
    pub fighters: FighterStats,
    pub start: StartParams,
    pub ore_deposits: OreDepositParams,
    pub fuel_deposits: FuelDepositParams,
    pub time_limits: TimeLimits,
}

// Newtype wrappers so each deposit table gets its own serde default.

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OreDepositParams(pub DepositParams);

impl Default for OreDepositParams {
    fn default() -> Self {
        Self(DepositParams::default_ore())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FuelDepositParams(pub DepositParams);

impl Default for FuelDepositParams {
    fn default() -> Self {
        Self(DepositParams::default_fuel())
    }
}

impl GameParams {
    /// Base stats (value, health) for an entity kind
    pub fn entity_stats(&self, kind: EntityKind) -> EntityStats {
        match kind {
            EntityKind::UnderConstruction => self.under_construction.entity,
            EntityKind::Base => self.bases.entity,
            EntityKind::Turret => self.turrets.entity,
            EntityKind::Miner => self.miners.entity,
            EntityKind::Fighter => self.fighters.entity,
        }
    }

    /// Damage and range for attacking kinds
    pub fn attack_stats(&self, kind: EntityKind) -> Option<AttackStats> {
        match kind {
            EntityKind::Turret => Some(self.turrets.attack),
            EntityKind::Miner => Some(self.miners.attack),
            EntityKind::Fighter => Some(self.fighters.attack),
            _ => None,
        }
    }

    /// How many ships a building kind can host
    pub fn vehicle_capacity(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::UnderConstruction => self.under_construction.vehicle_capacity,
            EntityKind::Base => self.bases.vehicle_capacity,
            EntityKind::Turret => self.turrets.vehicle_capacity,
            _ => 0,
        }
    }

    pub fn ship_cost(&self, kind: ShipKind) -> Cost {
        match kind {
            ShipKind::Miner => self.miners.cost,
            ShipKind::Fighter => self.fighters.cost,
        }
    }

    pub fn building_cost(&self, kind: BuildingKind) -> Cost {
        match kind {
            BuildingKind::Base => self.bases.cost,
            BuildingKind::Turret => self.turrets.cost,
        }
    }

    /// Parse parameters from a TOML string; absent tables keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GameError::ConfigError(e.to_string()))
    }

    /// Load parameter overrides from a TOML file
    pub fn load_toml(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ruleset_matches_standard_values() {
        let params = GameParams::default();
        assert_eq!(params.bases.entity.max_health, 10_000);
        assert_eq!(params.bases.cost.ore, 30);
        assert_eq!(params.miners.cargo_space, 4);
        assert_eq!(params.turrets.attack.range, 4);
        assert_eq!(params.fighters.attack.damage, 600);
        assert_eq!(params.under_construction.entity.max_value, 1);
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let params = GameParams::from_toml(
            r#"
            [miners]
            cargo_space = 6

            [start]
            min_w = 10
            max_w = 10
            "#,
        )
        .expect("valid override");
        assert_eq!(params.miners.cargo_space, 6);
        assert_eq!(params.start.min_w, 10);
        // untouched tables keep the standard ruleset
        assert_eq!(params.miners.attack.damage, 300);
        assert_eq!(params.bases.vehicle_capacity, 30);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(GameParams::from_toml("miners = 3").is_err());
    }
}
