//! Replay recording
//!
//! One frame per turn: the map as it stood before the turn, both players'
//! inventory summaries, and everything that happened during the turn. Cell
//! snapshots use short single-letter keys and the tag registry to keep the
//! files small; a closing frame with no events captures the final state.

use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::GameParams;
use crate::core::types::{EntityId, GameId, PlayerId, Tick};
use crate::entity::{Entity, EntityKind, Inventory};
use crate::grid::map::Cell;
use crate::grid::vec2::Vec2;
use crate::world::World;

/// Snapshot of one entity, nested for hosted ships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRepr {
    /// Kind tag
    pub t: char,
    /// Entity id, stringified for use as a JSON object key
    pub i: String,
    /// Health
    pub h: i32,
    /// Owning player
    pub p: PlayerId,
    /// Facing (ships)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<char>,
    /// Cargo as a string of resource tags (miners)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<String>,
    /// Hosted ships (buildings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<BTreeMap<String, EntityRepr>>,
    /// Tag of the building under construction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<char>,
    /// Construction progress in [0, 1], rounded to two decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<f32>,
}

/// Snapshot of one deposit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositRepr {
    /// Resource tag
    pub t: char,
    /// Remaining amount
    pub a: i32,
}

/// Snapshot of one empty cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmptyRepr {
    pub t: char,
}

/// Snapshot of one map cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellRepr {
    Entity(EntityRepr),
    Deposit(DepositRepr),
    Empty(EmptyRepr),
}

/// One player's line in the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub player: PlayerId,
    pub ore: i32,
    pub fuel: i32,
    pub bases: usize,
    pub turrets: usize,
    pub under_construction: usize,
    pub miners: usize,
    pub fighters: usize,
    pub points: i32,
}

/// One attack edge; `player` is 0 when the reverse edge also fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub from: Vec2,
    pub to: Vec2,
    pub player: PlayerId,
}

/// One recorded turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub info: [InventorySummary; 2],
    /// Column-major cell snapshots: `map[x][y]`
    pub map: Vec<Vec<CellRepr>>,
    /// Successful move declarations: entity id to direction tag
    pub moves: BTreeMap<String, char>,
    pub collisions: Vec<Vec2>,
    pub attacks: Vec<AttackRecord>,
    pub destroyed: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayInfo {
    pub game_id: GameId,
    pub game_length: Tick,
    pub map_w: i32,
    pub map_h: i32,
    pub game_params: GameParams,
}

/// A full recorded game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    pub info: ReplayInfo,
    pub frames: Vec<Frame>,
}

impl Replay {
    /// Write the replay as `game_<id>.json` under `dir`, creating the
    /// directory if needed
    pub fn save(&self, dir: &Path) -> crate::core::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("game_{}.json", self.info.game_id));
        let file = fs::File::create(&path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(path)
    }
}

pub fn summarize_inventory(world: &World, inv: &Inventory) -> InventorySummary {
    InventorySummary {
        player: inv.player,
        ore: inv.ore,
        fuel: inv.fuel,
        bases: inv.bases.len(),
        turrets: inv.turrets.len(),
        under_construction: inv.under_construction.len(),
        miners: inv.miners.len(),
        fighters: inv.fighters.len(),
        points: inv.score(&world.entities, &world.params.resources),
    }
}

pub fn entity_repr(world: &World, ent: &Entity) -> EntityRepr {
    let mut repr = EntityRepr {
        t: ent.kind.tag(),
        i: ent.id.to_string(),
        h: ent.health,
        p: ent.player,
        d: None,
        c: None,
        v: None,
        b: None,
        m: None,
    };
    if ent.is_ship() {
        repr.d = Some(ent.facing.as_char());
    }
    if ent.kind == EntityKind::Miner {
        repr.c = Some(ent.cargo.iter().map(|r| r.as_char()).collect());
    }
    if ent.is_building() {
        repr.v = Some(
            ent.vehicles
                .iter()
                .filter_map(|&v| hosted_repr(world, v))
                .collect(),
        );
    }
    if let Some(site) = &ent.site {
        repr.b = Some(EntityKind::from(site.target).tag());
        let progress = site.progress(&world.params.resources);
        repr.m = Some((progress * 100.0).round() / 100.0);
    }
    repr
}

fn hosted_repr(world: &World, id: EntityId) -> Option<(String, EntityRepr)> {
    let ent = world.entities.get(id)?;
    Some((ent.id.to_string(), entity_repr(world, ent)))
}

/// Column-major snapshot of the whole map
pub fn snapshot_map(world: &World) -> Vec<Vec<CellRepr>> {
    (0..world.map.width())
        .map(|x| {
            (0..world.map.height())
                .map(|y| {
                    let pos = Vec2::new(x, y);
                    match world.map.get(pos) {
                        Cell::Empty => CellRepr::Empty(EmptyRepr { t: 'E' }),
                        Cell::Deposit => {
                            let dep = world
                                .map
                                .deposit_at(pos)
                                .map(|d| DepositRepr { t: d.resource.as_char(), a: d.amount })
                                .unwrap_or(DepositRepr { t: 'E', a: 0 });
                            CellRepr::Deposit(dep)
                        }
                        Cell::Entity(id) => match world.entities.get(id) {
                            Some(ent) => CellRepr::Entity(entity_repr(world, ent)),
                            None => CellRepr::Empty(EmptyRepr { t: 'E' }),
                        },
                    }
                })
                .collect()
        })
        .collect()
}
