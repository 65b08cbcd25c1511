//! The turn engine
//!
//! [`Game`] drives a full match: it asks both controllers for commands,
//! resolves the turn in fixed phase order (mining, cargo, building, movement,
//! combat), and records one replay frame per turn. Resolution is fully
//! deterministic for a given seed and pair of controllers.

pub mod mapgen;
pub mod replay;

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use ahash::{AHashMap, AHashSet};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::action::{Action, BuildKind, Task};
use crate::agent::Agent;
use crate::core::config::GameParams;
use crate::core::types::{GameId, PlayerId, Tick};
use crate::entity::EntityKind;
use crate::grid::map::Cell;
use crate::grid::vec2::Vec2;
use crate::world::World;
use self::replay::{AttackRecord, Frame, Replay, ReplayInfo};

/// Everything that happened during one resolved turn
#[derive(Debug, Clone, Default)]
pub struct TurnRecord {
    /// Successful move declarations: entity id to direction tag
    pub moves: BTreeMap<String, char>,
    /// Cells where ships collided, sorted
    pub collisions: Vec<Vec2>,
    pub attacks: Vec<AttackRecord>,
    /// Positions of entities destroyed in the end-of-turn sweep
    pub destroyed: Vec<Vec2>,
}

/// A single match from setup to game over
pub struct Game {
    pub world: World,
    game_id: GameId,
    game_length: Tick,
    turn: Tick,
    over: bool,
    agents: [Box<dyn Agent>; 2],
}

impl Game {
    /// Set up a match: roll the game length and the map from `seed`, then
    /// spawn each player's starting fleet inside their base
    pub fn new(params: GameParams, seed: u64, agents: [Box<dyn Agent>; 2]) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let start = params.start;
        let game_length = rng.gen_range(start.min_len..=start.max_len);
        let mut world = mapgen::generate_map(params, &mut rng);

        for player in [1, 2] {
            let base = world.inventory(player).bases[0];
            let pos = match world.entities.get(base) {
                Some(b) => b.pos,
                None => unreachable!("base {base} missing after map generation"),
            };
            for _ in 0..start.miners {
                world.spawn(EntityKind::Miner, player, pos);
            }
            for _ in 0..start.fighters {
                world.spawn(EntityKind::Fighter, player, pos);
            }
        }

        let game_id = GameId::new();
        info!(%game_id, seed, game_length, "game set up");
        Self {
            world,
            game_id,
            game_length,
            turn: 0,
            over: false,
            agents,
        }
    }

    /// Run a match on a prepared world, bypassing generation
    pub fn with_world(world: World, game_length: Tick, agents: [Box<dyn Agent>; 2]) -> Self {
        Self {
            world,
            game_id: GameId::new(),
            game_length,
            turn: 0,
            over: false,
            agents,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn game_length(&self) -> Tick {
        self.game_length
    }

    pub fn turn(&self) -> Tick {
        self.turn
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Resolve one turn. A no-op once the game is over.
    pub fn step(&mut self) -> TurnRecord {
        if self.over {
            return TurnRecord::default();
        }
        self.turn += 1;
        if self.turn == self.game_length {
            self.over = true;
        }
        let actions = self.collect_actions();

        // mining
        for action in &actions {
            if let Task::Mine(dir) = action.task {
                self.world.register_mine(action.entity, dir);
            }
        }
        self.world.resolve_mining();

        // cargo
        for action in &actions {
            if let Task::Cargo(cargo) = &action.task {
                self.world.change_cargo(action.entity, cargo);
            }
        }

        // building
        for action in &actions {
            if let Task::Build(kind) = action.task {
                match kind {
                    BuildKind::Ship(kind) => self.world.base_build(action.entity, kind),
                    BuildKind::Building(kind) => self.world.miner_build(action.entity, kind),
                }
            }
        }

        let (moves, collisions) = self.resolve_movement(&actions);
        let (attacks, destroyed) = self.resolve_combat();

        if self.world.inventory(1).bases.is_empty() || self.world.inventory(2).bases.is_empty() {
            self.over = true;
        }

        TurnRecord { moves, collisions, attacks, destroyed }
    }

    /// Gather and vet both controllers' commands. A panicking controller
    /// forfeits its turn; commands for entities the controller does not own
    /// are dropped.
    fn collect_actions(&mut self) -> Vec<Action> {
        let mut all = Vec::new();
        let Self { world, agents, turn, .. } = self;
        for (i, agent) in agents.iter_mut().enumerate() {
            let player = (i + 1) as PlayerId;
            let actions =
                match catch_unwind(AssertUnwindSafe(|| agent.act(*turn, world))) {
                    Ok(actions) => actions,
                    Err(_) => {
                        warn!(player, turn = *turn, "controller panicked, forfeiting its turn");
                        Vec::new()
                    }
                };
            for action in actions {
                let owned = world
                    .entities
                    .get(action.entity)
                    .is_some_and(|e| e.player == player);
                if owned {
                    all.push(action);
                } else {
                    debug!(player, entity = %action.entity, "dropping command for a foreign or dead entity");
                }
            }
        }
        all
    }

    /// Two-phase movement: declare every move, derive the collision set from
    /// the staged destinations, then complete every ship against it
    fn resolve_movement(&mut self, actions: &[Action]) -> (BTreeMap<String, char>, Vec<Vec2>) {
        let mut moves = BTreeMap::new();
        for action in actions {
            if let Some(dir) = self.world.declare_move(action.entity, action.move_dir) {
                moves.insert(action.entity.to_string(), dir.as_char());
            }
        }
        let mut ships = self.world.inventory(1).ships();
        ships.extend(self.world.inventory(2).ships());

        // stationary ships count toward their cell's occupancy
        let mut staged: AHashMap<Vec2, u32> = AHashMap::new();
        for &ship in &ships {
            if let Some(s) = self.world.entities.get(ship) {
                *staged.entry(s.new_pos).or_insert(0) += 1;
            }
        }
        let mut collisions: AHashSet<Vec2> = staged
            .into_iter()
            .filter(|&(pos, count)| {
                let building = matches!(
                    self.world.map.get(pos),
                    Cell::Entity(id)
                        if self.world.entities.get(id).is_some_and(|e| e.is_building())
                );
                count > 1 && !building
            })
            .map(|(pos, _)| pos)
            .collect();

        for ship in ships {
            self.world.complete_move(ship, &mut collisions);
        }
        let mut collisions: Vec<Vec2> = collisions.into_iter().collect();
        collisions.sort();
        (moves, collisions)
    }

    /// All attackers strike, then marked entities are swept away. A mutual
    /// attack between two positions keeps a single record with player 0;
    /// the damage of both strikes still applies.
    fn resolve_combat(&mut self) -> (Vec<AttackRecord>, Vec<Vec2>) {
        let mut attackers = self.world.inventory(1).attackers();
        attackers.extend(self.world.inventory(2).attackers());

        let mut attacks: Vec<AttackRecord> = Vec::new();
        let mut edges: AHashMap<(Vec2, Vec2), usize> = AHashMap::new();
        for id in attackers {
            let (from, player) = match self.world.entities.get(id) {
                Some(a) => (a.pos, a.player),
                None => continue,
            };
            for to in self.world.attack_all(id) {
                if edges.contains_key(&(from, to)) {
                    // several attackers on one cell share an edge
                } else if let Some(&rev) = edges.get(&(to, from)) {
                    attacks[rev].player = 0;
                } else {
                    edges.insert((from, to), attacks.len());
                    attacks.push(AttackRecord { from, to, player });
                }
            }
        }

        let mut entities = self.world.inventory(1).entities();
        entities.extend(self.world.inventory(2).entities());
        let mut destroyed = Vec::new();
        for id in entities {
            let Some(pos) = self.world.entities.get(id).map(|e| e.pos) else {
                // already gone, taken down with its host building
                continue;
            };
            if self.world.destroy(id, false) {
                destroyed.push(pos);
            }
        }
        (attacks, destroyed)
    }

    /// Play the match to the end, recording one frame per turn plus a
    /// closing frame of the final state
    pub fn play(&mut self) -> Replay {
        let mut frames = Vec::new();
        while !self.over {
            let info = self.inventory_summaries();
            let map = replay::snapshot_map(&self.world);
            let record = self.step();
            if self.turn % 50 == 0 {
                info!(turn = self.turn, p1 = info[0].points, p2 = info[1].points, "progress");
            }
            frames.push(Frame {
                info,
                map,
                moves: record.moves,
                collisions: record.collisions,
                attacks: record.attacks,
                destroyed: record.destroyed,
            });
        }
        frames.push(Frame {
            info: self.inventory_summaries(),
            map: replay::snapshot_map(&self.world),
            moves: BTreeMap::new(),
            collisions: Vec::new(),
            attacks: Vec::new(),
            destroyed: Vec::new(),
        });
        for agent in &mut self.agents {
            agent.close();
        }
        Replay {
            info: ReplayInfo {
                game_id: self.game_id,
                game_length: self.game_length,
                map_w: self.world.map.width(),
                map_h: self.world.map.height(),
                game_params: self.world.params.clone(),
            },
            frames,
        }
    }

    fn inventory_summaries(&self) -> [replay::InventorySummary; 2] {
        [
            replay::summarize_inventory(&self.world, self.world.inventory(1)),
            replay::summarize_inventory(&self.world, self.world.inventory(2)),
        ]
    }

    /// Final scores as (player 1, player 2)
    pub fn scores(&self) -> (i32, i32) {
        let values = &self.world.params.resources;
        (
            self.world.inventory(1).score(&self.world.entities, values),
            self.world.inventory(2).score(&self.world.entities, values),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::NullAgent;
    use crate::core::types::EntityId;

    struct PanicAgent;

    impl Agent for PanicAgent {
        fn act(&mut self, _turn: Tick, _world: &World) -> Vec<Action> {
            panic!("controller bug")
        }
    }

    fn idle_world() -> World {
        let mut world = World::new(GameParams::default(), 8, 8);
        world.spawn(EntityKind::Base, 1, Vec2::new(1, 4));
        world.spawn(EntityKind::Base, 2, Vec2::new(6, 4));
        world
    }

    #[test]
    fn game_ends_at_the_turn_limit() {
        let mut game = Game::with_world(
            idle_world(),
            5,
            [Box::new(NullAgent), Box::new(NullAgent)],
        );
        let replay = game.play();
        assert!(game.is_over());
        assert_eq!(game.turn(), 5);
        // five played frames plus the closing frame
        assert_eq!(replay.frames.len(), 6);
        let last = &replay.frames[5];
        assert!(last.moves.is_empty() && last.attacks.is_empty());
    }

    #[test]
    fn step_after_game_over_is_a_no_op() {
        let mut game = Game::with_world(
            idle_world(),
            1,
            [Box::new(NullAgent), Box::new(NullAgent)],
        );
        game.step();
        assert!(game.is_over());
        let record = game.step();
        assert_eq!(game.turn(), 1);
        assert!(record.moves.is_empty());
    }

    #[test]
    fn panicking_controller_forfeits_but_play_continues() {
        let mut game = Game::with_world(
            idle_world(),
            3,
            [Box::new(PanicAgent), Box::new(NullAgent)],
        );
        let replay = game.play();
        assert_eq!(replay.frames.len(), 4);
    }

    #[test]
    fn foreign_commands_are_dropped() {
        let mut world = idle_world();
        let enemy_miner = world.spawn(EntityKind::Miner, 2, Vec2::new(6, 4));

        struct Hijacker(EntityId);
        impl Agent for Hijacker {
            fn act(&mut self, _turn: Tick, _world: &World) -> Vec<Action> {
                let mut action = Action::new(self.0);
                action.set_move(crate::grid::vec2::Direction::Left);
                vec![action]
            }
        }

        let mut game = Game::with_world(
            world,
            2,
            [Box::new(Hijacker(enemy_miner)), Box::new(NullAgent)],
        );
        let record = game.step();
        assert!(record.moves.is_empty());
    }

    #[test]
    fn generated_game_runs_to_completion_with_idle_agents() {
        let params = GameParams::from_toml("[start]\nmin_len = 12\nmax_len = 12")
            .expect("valid override");
        let mut game = Game::new(params, 7, [Box::new(NullAgent), Box::new(NullAgent)]);
        assert_eq!(game.game_length(), 12);
        let replay = game.play();
        assert_eq!(replay.frames.len(), 13);
        // starting fleets stay hosted in the bases all game
        let base = game.world.inventory(1).bases[0];
        assert_eq!(game.world.entities.get(base).unwrap().vehicles.len(), 13);
    }
}
