//! Per-entity, per-turn command bundles with a compact text grammar
//!
//! An action carries one move intent plus at most one secondary task;
//! setting a new task replaces the previous one. The text form is
//! `<move-char>` optionally followed by `M<dir-char>`, `C<resource-char>*`,
//! or `B<type-char>`, using the one-character tag registry from
//! [`EntityKind`]. Decoding is best-effort: a malformed suffix is dropped
//! and the already-parsed move intent survives; decoding never errors, so a
//! bad command can never abort a turn.

use crate::core::types::EntityId;
use crate::entity::{BuildingKind, EntityKind, ShipKind};
use crate::grid::map::Resource;
use crate::grid::vec2::Direction;

/// What a build task produces: bases build ships, miners build buildings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    Ship(ShipKind),
    Building(BuildingKind),
}

impl BuildKind {
    pub fn tag(self) -> char {
        match self {
            BuildKind::Ship(k) => EntityKind::from(k).tag(),
            BuildKind::Building(k) => EntityKind::from(k).tag(),
        }
    }

    pub fn from_tag(c: char) -> Option<Self> {
        match EntityKind::from_tag(c)? {
            EntityKind::Miner => Some(BuildKind::Ship(ShipKind::Miner)),
            EntityKind::Fighter => Some(BuildKind::Ship(ShipKind::Fighter)),
            EntityKind::Base => Some(BuildKind::Building(BuildingKind::Base)),
            EntityKind::Turret => Some(BuildKind::Building(BuildingKind::Turret)),
            EntityKind::UnderConstruction => None,
        }
    }
}

/// The at-most-one secondary intent of an action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Task {
    #[default]
    None,
    Mine(Direction),
    Cargo(Vec<Resource>),
    Build(BuildKind),
}

/// One entity's command bundle for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub entity: EntityId,
    pub move_dir: Direction,
    pub task: Task,
}

impl Action {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            move_dir: Direction::None,
            task: Task::None,
        }
    }

    pub fn set_move(&mut self, dir: Direction) {
        self.move_dir = dir;
    }

    /// Mine in `dir`; `Direction::None` lets the engine pick an adjacent
    /// deposit. Replaces any other task.
    pub fn set_mine(&mut self, dir: Direction) {
        self.task = Task::Mine(dir);
    }

    /// Swap cargo so that `cargo` remains aboard after the transfer.
    /// Replaces any other task.
    pub fn set_cargo(&mut self, cargo: Vec<Resource>) {
        self.task = Task::Cargo(cargo);
    }

    /// Build a ship (bases) or a building (miners). Replaces any other task.
    pub fn set_build(&mut self, kind: BuildKind) {
        self.task = Task::Build(kind);
    }

    /// Encode to the compact text grammar
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.move_dir.as_char());
        match &self.task {
            Task::None => {}
            Task::Mine(dir) => {
                out.push('M');
                out.push(dir.as_char());
            }
            Task::Cargo(cargo) => {
                out.push('C');
                for r in cargo {
                    out.push(r.as_char());
                }
            }
            Task::Build(kind) => {
                out.push('B');
                out.push(kind.tag());
            }
        }
        out
    }

    /// Best-effort decode. Whatever parsed before the first bad character is
    /// kept; the rest is dropped.
    pub fn decode(entity: EntityId, text: &str) -> Self {
        let mut action = Action::new(entity);
        let mut chars = text.chars();
        let Some(move_dir) = chars.next().and_then(Direction::from_char) else {
            return action;
        };
        action.move_dir = move_dir;
        match chars.next() {
            Some('M') => {
                if let Some(dir) = chars.next().and_then(Direction::from_char) {
                    action.task = Task::Mine(dir);
                }
            }
            Some('C') => {
                let mut cargo = Vec::new();
                for c in chars.by_ref() {
                    match Resource::from_char(c) {
                        Some(r) => cargo.push(r),
                        None => return action,
                    }
                }
                action.task = Task::Cargo(cargo);
            }
            Some('B') => {
                if let Some(kind) = chars.next().and_then(BuildKind::from_tag) {
                    action.task = Task::Build(kind);
                }
            }
            _ => {}
        }
        action
    }
}
