//! The shared game grid
//!
//! Each cell holds at most one top-level occupant: an entity reference or a
//! resource deposit. Entities are owned by the arena; the grid only holds
//! ids. Ships hosted inside a building are not separate map occupants.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;
use crate::grid::vec2::Vec2;

/// The two mineable resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Ore,
    Fuel,
}

impl Resource {
    pub fn as_char(self) -> char {
        match self {
            Resource::Ore => 'O',
            Resource::Fuel => 'F',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'O' => Some(Resource::Ore),
            'F' => Some(Resource::Fuel),
            _ => None,
        }
    }
}

/// Top-level occupant of one map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Entity(EntityId),
    Deposit,
}

/// A single resource deposit, mutated once per turn by the miners that
/// registered against it
#[derive(Debug, Clone)]
pub struct ResourceDeposit {
    pub amount: i32,
    pub resource: Resource,
    miners: Vec<EntityId>,
}

impl ResourceDeposit {
    pub fn new(amount: i32, resource: Resource) -> Self {
        Self { amount, resource, miners: Vec::new() }
    }

    /// Record one miner's intent to mine this deposit this turn
    pub fn register(&mut self, miner: EntityId) {
        self.miners.push(miner);
    }

    /// All-or-nothing resolution: if the deposit can supply every requester,
    /// each gets one unit; otherwise nobody gains anything this turn.
    /// Returns the granted miners and whether the deposit is now depleted.
    pub fn resolve(&mut self) -> (Vec<EntityId>, bool) {
        let requested = self.miners.len() as i32;
        let granted = if requested > 0 && self.amount >= requested {
            self.amount -= requested;
            std::mem::take(&mut self.miners)
        } else {
            self.miners.clear();
            Vec::new()
        };
        (granted, self.amount == 0)
    }
}

/// The game grid plus the deposit index
#[derive(Debug, Clone)]
pub struct GameMap {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    pub deposits: AHashMap<Vec2, ResourceDeposit>,
}

impl GameMap {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "map dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![Cell::Empty; (width * height) as usize],
            deposits: AHashMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    fn idx(&self, pos: Vec2) -> usize {
        debug_assert!(self.in_bounds(pos), "out-of-bounds access at {pos}");
        (pos.x * self.height + pos.y) as usize
    }

    pub fn get(&self, pos: Vec2) -> Cell {
        self.cells[self.idx(pos)]
    }

    pub fn set_entity(&mut self, pos: Vec2, id: EntityId) {
        let idx = self.idx(pos);
        self.cells[idx] = Cell::Entity(id);
    }

    pub fn clear(&mut self, pos: Vec2) {
        let idx = self.idx(pos);
        self.cells[idx] = Cell::Empty;
    }

    /// Place a deposit, overwriting any existing deposit at `pos`
    pub fn place_deposit(&mut self, pos: Vec2, deposit: ResourceDeposit) {
        let idx = self.idx(pos);
        self.cells[idx] = Cell::Deposit;
        self.deposits.insert(pos, deposit);
    }

    pub fn remove_deposit(&mut self, pos: Vec2) {
        let idx = self.idx(pos);
        self.cells[idx] = Cell::Empty;
        self.deposits.remove(&pos);
    }

    pub fn deposit_at(&self, pos: Vec2) -> Option<&ResourceDeposit> {
        self.deposits.get(&pos)
    }

    pub fn deposit_at_mut(&mut self, pos: Vec2) -> Option<&mut ResourceDeposit> {
        self.deposits.get_mut(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_grants_all_when_supply_suffices() {
        let mut dep = ResourceDeposit::new(5, Resource::Ore);
        dep.register(EntityId(1));
        dep.register(EntityId(2));
        let (granted, depleted) = dep.resolve();
        assert_eq!(granted, vec![EntityId(1), EntityId(2)]);
        assert!(!depleted);
        assert_eq!(dep.amount, 3);
    }

    #[test]
    fn deposit_grants_nothing_when_oversubscribed() {
        let mut dep = ResourceDeposit::new(2, Resource::Fuel);
        for i in 0..3 {
            dep.register(EntityId(i));
        }
        let (granted, depleted) = dep.resolve();
        assert!(granted.is_empty());
        assert!(!depleted);
        // amount untouched, intents cleared for next turn
        assert_eq!(dep.amount, 2);
        let (granted, _) = dep.resolve();
        assert!(granted.is_empty());
    }

    #[test]
    fn deposit_depletes_at_exactly_zero() {
        let mut dep = ResourceDeposit::new(2, Resource::Ore);
        dep.register(EntityId(1));
        dep.register(EntityId(2));
        let (granted, depleted) = dep.resolve();
        assert_eq!(granted.len(), 2);
        assert!(depleted);
    }

    #[test]
    fn map_cells_start_empty_and_hold_one_occupant() {
        let mut map = GameMap::new(4, 3);
        let p = Vec2::new(2, 1);
        assert_eq!(map.get(p), Cell::Empty);
        map.set_entity(p, EntityId(7));
        assert_eq!(map.get(p), Cell::Entity(EntityId(7)));
        map.clear(p);
        map.place_deposit(p, ResourceDeposit::new(3, Resource::Fuel));
        assert_eq!(map.get(p), Cell::Deposit);
        assert_eq!(map.deposit_at(p).map(|d| d.amount), Some(3));
        map.remove_deposit(p);
        assert_eq!(map.get(p), Cell::Empty);
        assert!(map.deposit_at(p).is_none());
    }
}
