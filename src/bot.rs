//! A baseline controller built on the cooperative planner
//!
//! Miners cycle between mining spots and the home base, with every path
//! planned through the shared reservation table so the fleet does not trample
//! itself. Paths go stale quickly on a dynamic map, so each ship replans at
//! the latest after half the planning depth.

use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use tracing::info;

use crate::action::{Action, BuildKind};
use crate::agent::Agent;
use crate::core::types::{EntityId, PlayerId, Tick};
use crate::entity::{EntityKind, ShipKind};
use crate::grid::map::Cell;
use crate::grid::vec2::{ring, Direction, Vec2};
use crate::planner::{capacity_grid, space_time_astar, ReservationTable};
use crate::world::World;

/// Planning horizon in ticks; ships replan at the latest every half of this
const DEPTH: u32 = 20;

/// Miner fleet size this controller works toward
const TARGET_MINERS: usize = 20;

pub struct PlannerAgent {
    player: PlayerId,
    /// Cells some ship is currently headed for
    all_goals: AHashSet<Vec2>,
    /// Per-ship goal and the number of ticks to linger there
    goals: AHashMap<EntityId, (Vec2, u32)>,
    /// When a ship first stood on its goal
    reached_goal: AHashMap<EntityId, Tick>,
    /// When each ship must replan
    next_reset: AHashMap<EntityId, Tick>,
    reserved: ReservationTable,
    /// Per-ship planned positions, keyed by tick
    paths: AHashMap<EntityId, AHashMap<Tick, Vec2>>,
    /// Milliseconds spent per turn, reported at close
    move_times: AHashMap<Tick, u128>,
}

impl PlannerAgent {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            all_goals: AHashSet::new(),
            goals: AHashMap::new(),
            reached_goal: AHashMap::new(),
            next_reset: AHashMap::new(),
            reserved: ReservationTable::new(),
            paths: AHashMap::new(),
            move_times: AHashMap::new(),
        }
    }

    /// The ship stands on its goal: linger if the goal asks for it, and for
    /// miners issue the command the goal was for (mine, or drop off cargo
    /// when the goal is the base)
    fn handle_goal(&mut self, ship: EntityId, world: &World, action: &mut Action, time: Tick) {
        let reached = *self.reached_goal.entry(ship).or_insert(time);
        let Some(&(goal, pause)) = self.goals.get(&ship) else {
            return;
        };
        if time - reached >= Tick::from(pause) {
            self.goals.remove(&ship);
            self.reached_goal.remove(&ship);
            self.all_goals.remove(&goal);
        }
        let Some(ent) = world.entities.get(ship) else {
            return;
        };
        if ent.kind != EntityKind::Miner {
            return;
        }
        let on_base = matches!(
            world.map.get(ent.pos),
            Cell::Entity(host)
                if world.entities.get(host).is_some_and(|e| e.kind == EntityKind::Base)
        );
        if on_base {
            action.set_cargo(Vec::new());
        } else {
            action.set_mine(Direction::None);
        }
    }

    /// Give a goal to a ship that has none. Miners alternate between a
    /// mining spot (lingering one tick per free cargo slot, minus the one
    /// they can spend leaving) and the base.
    fn allot_goal(&mut self, ship: EntityId, world: &World, time: Tick) {
        let Some(ent) = world.entities.get(ship) else {
            return;
        };
        let goal = match ent.kind {
            EntityKind::Miner => {
                let space = world.params.miners.cargo_space;
                if ent.cargo.len() < space {
                    let pause = (space - ent.cargo.len() - 1) as u32;
                    self.find_mining_goal(world, ent.pos).map(|g| (g, pause))
                } else {
                    let inv = world.inventory(self.player);
                    inv.bases
                        .first()
                        .and_then(|&b| world.entities.get(b))
                        .map(|b| (b.pos, 0))
                }
            }
            // TODO: give fighters escort or harassment goals
            _ => None,
        };
        let Some((goal, pause)) = goal else {
            return;
        };
        self.goals.insert(ship, (goal, pause));
        self.next_reset.insert(ship, time);
        self.all_goals.insert(goal);
    }

    /// Nearest free cell adjacent to a deposit that no other ship already
    /// targets, scanning outward ring by ring
    fn find_mining_goal(&self, world: &World, pos: Vec2) -> Option<Vec2> {
        let (w, h) = (world.map.width(), world.map.height());
        for d in 1..w + h {
            for p in ring(pos, d, w, h) {
                if self.all_goals.contains(&p) {
                    continue;
                }
                if world.map.get(p) != Cell::Empty {
                    continue;
                }
                let near_deposit = ring(p, 1, w, h)
                    .into_iter()
                    .any(|adj| matches!(world.map.get(adj), Cell::Deposit));
                if near_deposit {
                    return Some(p);
                }
            }
        }
        None
    }

    /// Replan every ship whose reset is due, then derive this turn's step
    /// from the stored paths, and drop state for ships that no longer exist
    fn compute_paths_and_moves(
        &mut self,
        ships: &[EntityId],
        time: Tick,
        moves: &mut AHashMap<EntityId, Action>,
        world: &World,
    ) {
        let grid = capacity_grid(world, self.player);
        for &ship in ships {
            match self.next_reset.get(&ship) {
                Some(&reset) if reset <= time => {}
                _ => continue,
            }
            let Some(&(target, pause)) = self.goals.get(&ship) else {
                continue;
            };
            let Some(pos) = world.entities.get(ship).map(|e| e.pos) else {
                continue;
            };
            self.reserved.clear_agent(ship);
            let path = space_time_astar(
                ship,
                pos,
                target,
                time,
                &grid,
                &mut self.reserved,
                DEPTH,
                pause,
            );
            let hold = (path.len() as u32 + pause).min(DEPTH / 2);
            self.next_reset.insert(ship, time + Tick::from(hold) - 1);
            let steps: AHashMap<Tick, Vec2> = path
                .iter()
                .enumerate()
                .map(|(i, &p)| (time + i as Tick, p))
                .collect();
            self.paths.insert(ship, steps);
        }

        for &ship in ships {
            let Some(path) = self.paths.get(&ship) else {
                continue;
            };
            if let (Some(&here), Some(&next)) = (path.get(&time), path.get(&(time + 1))) {
                if let Some(action) = moves.get_mut(&ship) {
                    action.set_move(Direction::from_vec(next - here));
                }
            }
        }

        // forget everything about ships that died this turn
        let alive: AHashSet<EntityId> = ships.iter().copied().collect();
        let dead: Vec<EntityId> = self
            .goals
            .keys()
            .filter(|id| !alive.contains(id))
            .copied()
            .collect();
        for id in dead {
            if let Some((goal, _)) = self.goals.remove(&id) {
                self.all_goals.remove(&goal);
            }
            self.reached_goal.remove(&id);
        }
        self.next_reset.retain(|id, _| alive.contains(id));
        self.paths.retain(|id, _| alive.contains(id));
        self.reserved.cleanup(time);
    }
}

impl Agent for PlannerAgent {
    fn act(&mut self, turn: Tick, world: &World) -> Vec<Action> {
        let started = Instant::now();
        let inv = world.inventory(self.player);
        let ships = inv.ships();

        let mut moves: AHashMap<EntityId, Action> = ships
            .iter()
            .map(|&id| (id, Action::new(id)))
            .collect();

        for &ship in &ships {
            let at_goal = self
                .goals
                .get(&ship)
                .zip(world.entities.get(ship))
                .is_some_and(|(&(goal, _), ent)| ent.pos == goal);
            if at_goal {
                if let Some(action) = moves.get_mut(&ship) {
                    self.handle_goal(ship, world, action, turn);
                }
            }
            if !self.goals.contains_key(&ship) {
                self.allot_goal(ship, world, turn);
            }
        }

        self.compute_paths_and_moves(&ships, turn, &mut moves, world);

        let mut actions: Vec<Action> = ships
            .iter()
            .filter_map(|id| moves.remove(id))
            .collect();

        // keep the miner fleet growing while it is affordable
        let inv = world.inventory(self.player);
        let cost = world.params.miners.cost;
        if inv.ore >= cost.ore && inv.fuel >= cost.fuel && inv.miners.len() < TARGET_MINERS {
            if let Some(&base) = inv.bases.first() {
                let mut action = Action::new(base);
                action.set_build(BuildKind::Ship(ShipKind::Miner));
                actions.push(action);
            }
        }

        self.move_times.insert(turn, started.elapsed().as_millis());
        actions
    }

    fn close(&mut self) {
        if self.move_times.is_empty() {
            return;
        }
        let times: Vec<u128> = self.move_times.values().copied().collect();
        let total: u128 = times.iter().sum();
        let max = times.iter().copied().max().unwrap_or(0);
        info!(
            player = self.player,
            moves = times.len(),
            total_ms = total,
            mean_ms = total / times.len() as u128,
            max_ms = max,
            "controller timing"
        );
    }
}
