//! World state and rule-level operations
//!
//! [`World`] couples the entity arena, the grid, and both inventories, and
//! exposes every mutation the turn engine drives: damage, destruction,
//! attacks, mining, cargo transfer, ship building, construction, and the
//! two-step movement protocol.
//!
//! Illegal requests (wrong kind, insufficient resources, capacity exceeded)
//! are silent no-ops. Violated structural invariants panic: they mean the
//! engine itself is broken, and corrupting state quietly would be worse.

use ahash::{AHashMap, AHashSet};

use crate::core::config::GameParams;
use crate::core::types::{EntityId, PlayerId};
use crate::entity::{BuildingKind, ConstructionSite, Entity, EntityKind, Inventory, ShipKind};
use crate::grid::map::{Cell, GameMap, Resource};
use crate::grid::vec2::{diamond, Direction, Vec2};

/// Owning store for all live entities, keyed by id
#[derive(Debug, Default, Clone)]
pub struct Entities {
    next_id: u32,
    slots: AHashMap<EntityId, Entity>,
}

impl Entities {
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Allocate a fresh id and insert the entity built from it
    pub fn insert_with(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.slots.insert(id, build(id));
        id
    }
}

/// Full game state for one match
#[derive(Debug, Clone)]
pub struct World {
    pub params: GameParams,
    pub entities: Entities,
    pub map: GameMap,
    pub inventories: [Inventory; 2],
}

impl World {
    pub fn new(params: GameParams, width: i32, height: i32) -> Self {
        Self {
            params,
            entities: Entities::default(),
            map: GameMap::new(width, height),
            inventories: [Inventory::new(1), Inventory::new(2)],
        }
    }

    pub fn inventory(&self, player: PlayerId) -> &Inventory {
        debug_assert!(player == 1 || player == 2, "invalid player {player}");
        &self.inventories[(player - 1) as usize]
    }

    pub fn inventory_mut(&mut self, player: PlayerId) -> &mut Inventory {
        debug_assert!(player == 1 || player == 2, "invalid player {player}");
        &mut self.inventories[(player - 1) as usize]
    }

    // === LIFECYCLE ===

    /// Spawn a finished entity. The cell must be free or hold a friendly
    /// building with room, in which case a ship spawns hosted inside it.
    pub fn spawn(&mut self, kind: EntityKind, player: PlayerId, pos: Vec2) -> EntityId {
        self.spawn_inner(kind, player, pos, None)
    }

    /// Spawn a construction site working toward `target`
    pub fn spawn_construction(
        &mut self,
        player: PlayerId,
        pos: Vec2,
        target: BuildingKind,
    ) -> EntityId {
        let cost = self.params.building_cost(target);
        let site = ConstructionSite {
            target,
            ore: 0,
            fuel: 0,
            ore_needed: cost.ore,
            fuel_needed: cost.fuel,
        };
        self.spawn_inner(EntityKind::UnderConstruction, player, pos, Some(site))
    }

    fn spawn_inner(
        &mut self,
        kind: EntityKind,
        player: PlayerId,
        pos: Vec2,
        site: Option<ConstructionSite>,
    ) -> EntityId {
        let params = self.params.clone();
        let id = self.entities.insert_with(|id| {
            let mut ent = Entity::new(id, kind, player, pos, &params);
            ent.site = site;
            ent
        });
        self.inventory_mut(player).add(kind, id);
        match self.map.get(pos) {
            Cell::Empty => self.map.set_entity(pos, id),
            Cell::Entity(host) if kind.is_ship() => {
                // a ship created on a building starts out hosted inside it
                self.add_ship(host, id);
            }
            _ => {}
        }
        id
    }

    /// Remove an entity if it is marked for destruction or `force` is set.
    /// Idempotent; returns whether it fired. Destroyed buildings take their
    /// hosted ships with them.
    pub fn destroy(&mut self, id: EntityId, force: bool) -> bool {
        self.destroy_inner(id, force, true)
    }

    fn destroy_inner(&mut self, id: EntityId, force: bool, cascade: bool) -> bool {
        match self.entities.get(id) {
            Some(ent) if ent.marked || force => {}
            _ => return false,
        }
        let ent = match self.entities.remove(id) {
            Some(ent) => ent,
            None => return false,
        };
        self.inventory_mut(ent.player).remove(ent.kind, id);
        match self.map.get(ent.pos) {
            Cell::Entity(top) if top == id => self.map.clear(ent.pos),
            Cell::Entity(host) if ent.kind.is_ship() => {
                // hosted ship: detach from its building
                self.remove_ship(host, id);
            }
            _ => {}
        }
        if ent.kind.is_building() && cascade {
            for v in ent.vehicles {
                self.destroy_inner(v, true, true);
            }
        }
        true
    }

    // === BUILDINGS ===

    /// Host a ship inside a building. Fails (false) when the id is not a
    /// building, the building is full, or the players differ.
    pub fn add_ship(&mut self, building: EntityId, ship: EntityId) -> bool {
        let ship_player = match self.entities.get(ship) {
            Some(s) => s.player,
            None => return false,
        };
        let capacity = match self.entities.get(building) {
            Some(b) if b.kind.is_building() => self.params.vehicle_capacity(b.kind),
            _ => return false,
        };
        let Some(b) = self.entities.get_mut(building) else {
            return false;
        };
        if b.vehicles.len() < capacity && b.player == ship_player {
            b.vehicles.push(ship);
            true
        } else {
            false
        }
    }

    /// Detach a hosted ship; absent ships are a silent no-op (false)
    pub fn remove_ship(&mut self, building: EntityId, ship: EntityId) -> bool {
        let Some(b) = self.entities.get_mut(building) else {
            return false;
        };
        let before = b.vehicles.len();
        b.vehicles.retain(|&v| v != ship);
        b.vehicles.len() != before
    }

    /// Build a ship at a base: gated on affordability and vehicle capacity,
    /// deducts the exact listed cost on success
    pub fn base_build(&mut self, base: EntityId, kind: ShipKind) {
        let (player, pos) = match self.entities.get(base) {
            Some(b) if b.kind == EntityKind::Base => (b.player, b.pos),
            _ => return,
        };
        let cost = self.params.ship_cost(kind);
        let capacity = self.params.vehicle_capacity(EntityKind::Base);
        {
            let inv = self.inventory(player);
            if inv.ore < cost.ore || inv.fuel < cost.fuel {
                return;
            }
        }
        let hosted = match self.entities.get(base) {
            Some(b) => b.vehicles.len(),
            None => return,
        };
        if hosted >= capacity {
            return;
        }
        self.spawn(kind.into(), player, pos);
        let inv = self.inventory_mut(player);
        inv.ore -= cost.ore;
        inv.fuel -= cost.fuel;
    }

    // === CONSTRUCTION ===

    /// A miner's build command: on top of a construction site it feeds the
    /// site from its cargo; standing alone on an empty spot it starts a new
    /// site for `target` and moves inside.
    pub fn miner_build(&mut self, miner: EntityId, target: BuildingKind) {
        let (player, pos) = match self.entities.get(miner) {
            Some(m) if m.kind == EntityKind::Miner => (m.player, m.pos),
            _ => return,
        };
        match self.map.get(pos) {
            Cell::Entity(top) if top == miner => {
                self.map.clear(pos);
                let uc = self.spawn_construction(player, pos, target);
                self.add_ship(uc, miner);
                self.feed_construction(uc, miner);
            }
            Cell::Entity(top)
                if self
                    .entities
                    .get(top)
                    .is_some_and(|e| e.kind == EntityKind::UnderConstruction) =>
            {
                self.feed_construction(top, miner);
            }
            _ => {}
        }
    }

    /// Move at most the still-needed units of each resource from the miner's
    /// cargo into the site. When both totals are met the site is atomically
    /// replaced by the finished building; hosted ships migrate, and any that
    /// no longer fit are destroyed.
    pub fn feed_construction(&mut self, uc: EntityId, miner: EntityId) {
        let (carried_ore, carried_fuel) = match self.entities.get(miner) {
            Some(m) if m.kind == EntityKind::Miner => (
                m.cargo.iter().filter(|r| **r == Resource::Ore).count() as i32,
                m.cargo.iter().filter(|r| **r == Resource::Fuel).count() as i32,
            ),
            _ => return,
        };
        let (use_ore, use_fuel) = {
            let Some(site) = self.entities.get(uc).and_then(|e| e.site.as_ref()) else {
                return;
            };
            (
                (site.ore_needed - site.ore).min(carried_ore),
                (site.fuel_needed - site.fuel).min(carried_fuel),
            )
        };
        if let Some(m) = self.entities.get_mut(miner) {
            remove_cargo(&mut m.cargo, Resource::Ore, use_ore);
            remove_cargo(&mut m.cargo, Resource::Fuel, use_fuel);
        }
        let finished = {
            let Some(site) = self.entities.get_mut(uc).and_then(|e| e.site.as_mut()) else {
                return;
            };
            site.ore += use_ore;
            site.fuel += use_fuel;
            site.complete()
        };
        if !finished {
            return;
        }
        let (player, pos, target, vehicles) = match self.entities.get(uc) {
            Some(e) => (
                e.player,
                e.pos,
                e.site.as_ref().map(|s| s.target),
                e.vehicles.clone(),
            ),
            None => return,
        };
        let Some(target) = target else { return };
        // swap the site for the real building without touching hosted ships
        self.destroy_inner(uc, true, false);
        let building = self.spawn(target.into(), player, pos);
        for v in vehicles {
            if !self.add_ship(building, v) {
                // no room in the finished building
                self.destroy_inner(v, true, true);
            }
        }
    }

    // === MINING & CARGO ===

    /// Register a miner's intent against an adjacent deposit. With
    /// `Direction::None` the first adjacent deposit in scan order is chosen.
    pub fn register_mine(&mut self, miner: EntityId, dir: Direction) {
        let (pos, has_room) = match self.entities.get(miner) {
            Some(m) if m.kind == EntityKind::Miner => {
                (m.pos, m.cargo.len() < self.params.miners.cargo_space)
            }
            _ => return,
        };
        let possible: Vec<Vec2> = diamond(pos, 1, self.map.width(), self.map.height())
            .into_iter()
            .filter(|p| matches!(self.map.get(*p), Cell::Deposit))
            .collect();
        let mut mine_pos = pos + dir.vec();
        if dir == Direction::None {
            if let Some(&first) = possible.first() {
                mine_pos = first;
            }
        }
        if possible.contains(&mine_pos) && has_room {
            if let Some(dep) = self.map.deposit_at_mut(mine_pos) {
                dep.register(miner);
            }
        }
    }

    /// Resolve every deposit all-or-nothing and remove the depleted ones
    pub fn resolve_mining(&mut self) {
        let positions: Vec<Vec2> = self.map.deposits.keys().copied().collect();
        for pos in positions {
            let Some(dep) = self.map.deposit_at_mut(pos) else {
                continue;
            };
            let resource = dep.resource;
            let (granted, depleted) = dep.resolve();
            for miner in granted {
                if let Some(m) = self.entities.get_mut(miner) {
                    m.cargo.push(resource);
                }
            }
            if depleted {
                self.map.remove_deposit(pos);
            }
        }
    }

    /// Swap a miner's cargo for `new_cargo`, settling the difference against
    /// the player's inventory. Only works while hosted on a base.
    pub fn change_cargo(&mut self, miner: EntityId, new_cargo: &[Resource]) {
        let (player, pos, cargo) = match self.entities.get(miner) {
            Some(m) if m.kind == EntityKind::Miner => (m.player, m.pos, m.cargo.clone()),
            _ => return,
        };
        let on_base = matches!(
            self.map.get(pos),
            Cell::Entity(host)
                if self.entities.get(host).is_some_and(|e| e.kind == EntityKind::Base)
        );
        if !on_base || new_cargo.len() > self.params.miners.cargo_space {
            return;
        }
        let count = |items: &[Resource], r: Resource| {
            items.iter().filter(|x| **x == r).count() as i32
        };
        let ore_diff = count(new_cargo, Resource::Ore) - count(&cargo, Resource::Ore);
        let fuel_diff = count(new_cargo, Resource::Fuel) - count(&cargo, Resource::Fuel);
        {
            let inv = self.inventory(player);
            if inv.ore < ore_diff || inv.fuel < fuel_diff {
                return;
            }
        }
        let inv = self.inventory_mut(player);
        inv.ore -= ore_diff;
        inv.fuel -= fuel_diff;
        if let Some(m) = self.entities.get_mut(miner) {
            m.cargo = new_cargo.to_vec();
        }
    }

    // === COMBAT ===

    /// One strike: every enemy top-level entity matching the attacker's
    /// target filter within taxicab range takes `damage / N`. Returns the
    /// struck positions; zero matches is a no-op.
    pub fn attack_all(&mut self, attacker: EntityId) -> Vec<Vec2> {
        let (pos, player, kind) = match self.entities.get(attacker) {
            Some(a) if a.is_attacker() => (a.pos, a.player, a.kind),
            _ => return Vec::new(),
        };
        let Some(stats) = self.params.attack_stats(kind) else {
            return Vec::new();
        };
        let mut targets: Vec<(EntityId, Vec2)> = Vec::new();
        for p in diamond(pos, stats.range, self.map.width(), self.map.height()) {
            if let Cell::Entity(tid) = self.map.get(p) {
                if let Some(t) = self.entities.get(tid) {
                    if t.player != player && kind.attacks(t.kind) {
                        targets.push((tid, p));
                    }
                }
            }
        }
        if targets.is_empty() {
            return Vec::new();
        }
        let split = stats.damage / targets.len() as i32;
        for &(tid, _) in &targets {
            if let Some(t) = self.entities.get_mut(tid) {
                t.take_damage(split);
            }
        }
        targets.into_iter().map(|(_, p)| p).collect()
    }

    // === MOVEMENT ===

    /// Declare a ship's move: bounds- and deposit-check the destination,
    /// stage it in `new_pos`, and vacate the source cell exactly once.
    /// Returns the direction actually taken, if any.
    pub fn declare_move(&mut self, ship: EntityId, dir: Direction) -> Option<Direction> {
        let pos = match self.entities.get(ship) {
            Some(s) if s.is_ship() => s.pos,
            _ => return None,
        };
        if dir == Direction::None {
            return None;
        }
        let dest = pos + dir.vec();
        if !self.map.in_bounds(dest) || matches!(self.map.get(dest), Cell::Deposit) {
            return None;
        }
        if let Some(s) = self.entities.get_mut(ship) {
            s.new_pos = dest;
            s.facing = dir;
        }
        match self.map.get(pos) {
            Cell::Entity(top) if top == ship => self.map.clear(pos),
            Cell::Entity(host) => {
                let hosted = self.remove_ship(host, ship);
                assert!(hosted, "ship {ship} not hosted by the building at {pos}");
            }
            cell => panic!("ship {ship} missing from its own cell {pos} ({cell:?})"),
        }
        Some(dir)
    }

    /// Finish a ship's move against the resolved collision set. Entering a
    /// full or hostile building destroys the ship and marks the cell
    /// collided for ships still to resolve.
    pub fn complete_move(&mut self, ship: EntityId, collisions: &mut AHashSet<Vec2>) {
        let (pos, dest) = match self.entities.get(ship) {
            Some(s) if s.is_ship() => (s.pos, s.new_pos),
            _ => return,
        };
        let dest_building = matches!(
            self.map.get(dest),
            Cell::Entity(e) if self.entities.get(e).is_some_and(Entity::is_building)
        );
        if collisions.contains(&dest) && !dest_building {
            self.destroy_inner(ship, true, true);
            return;
        }
        if pos == dest {
            return;
        }
        if let Some(s) = self.entities.get_mut(ship) {
            s.pos = dest;
        }
        match self.map.get(dest) {
            Cell::Entity(host) => {
                assert!(
                    dest_building,
                    "movement finished on an occupied non-building cell {dest} without a collision flag"
                );
                if !self.add_ship(host, ship) {
                    self.destroy_inner(ship, true, true);
                    collisions.insert(dest);
                }
            }
            Cell::Empty => self.map.set_entity(dest, ship),
            Cell::Deposit => {
                panic!("declared move targets a deposit cell {dest}")
            }
        }
    }
}

fn remove_cargo(cargo: &mut Vec<Resource>, resource: Resource, mut n: i32) {
    cargo.retain(|&r| {
        if r == resource && n > 0 {
            n -= 1;
            false
        } else {
            true
        }
    });
}
