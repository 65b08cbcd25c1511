//! End-to-end turn resolution scenarios driven by scripted controllers

use std::collections::VecDeque;

use astromine::action::{Action, BuildKind};
use astromine::agent::{Agent, NullAgent};
use astromine::core::config::GameParams;
use astromine::core::types::{EntityId, Tick};
use astromine::engine::Game;
use astromine::entity::{BuildingKind, EntityKind, ShipKind};
use astromine::grid::map::{Cell, Resource, ResourceDeposit};
use astromine::grid::vec2::{Direction, Vec2};
use astromine::world::World;

/// Replays a fixed queue of per-turn command lists
struct ScriptedAgent {
    script: VecDeque<Vec<Action>>,
}

impl ScriptedAgent {
    fn new(turns: Vec<Vec<Action>>) -> Self {
        Self { script: turns.into() }
    }
}

impl Agent for ScriptedAgent {
    fn act(&mut self, _turn: Tick, _world: &World) -> Vec<Action> {
        self.script.pop_front().unwrap_or_default()
    }
}

fn move_action(entity: EntityId, dir: Direction) -> Action {
    let mut a = Action::new(entity);
    a.set_move(dir);
    a
}

/// Both players keep a base in a far corner so matches only end at the
/// turn limit unless a test destroys one
fn arena(width: i32, height: i32) -> World {
    let mut world = World::new(GameParams::default(), width, height);
    world.spawn(EntityKind::Base, 1, Vec2::new(0, 0));
    world.spawn(EntityKind::Base, 2, Vec2::new(width - 1, height - 1));
    world
}

#[test]
fn head_on_collision_destroys_both_ships() {
    let mut world = arena(10, 10);
    let a = world.spawn(EntityKind::Miner, 1, Vec2::new(2, 5));
    let b = world.spawn(EntityKind::Miner, 1, Vec2::new(4, 5));
    let lone = world.spawn(EntityKind::Miner, 1, Vec2::new(7, 8));

    let script = ScriptedAgent::new(vec![vec![
        move_action(a, Direction::Right),
        move_action(b, Direction::Left),
        move_action(lone, Direction::Up),
    ]]);
    let mut game = Game::with_world(world, 5, [Box::new(script), Box::new(NullAgent)]);
    let record = game.step();

    assert_eq!(record.collisions, vec![Vec2::new(3, 5)]);
    assert!(!game.world.entities.contains(a));
    assert!(!game.world.entities.contains(b));
    assert_eq!(game.world.map.get(Vec2::new(3, 5)), Cell::Empty);
    // collision losses are not part of the combat sweep
    assert!(record.destroyed.is_empty());
    // the uncontested mover arrives and is recorded
    assert_eq!(record.moves.get(&lone.to_string()), Some(&'U'));
    assert_eq!(
        game.world.entities.get(lone).map(|e| e.pos),
        Some(Vec2::new(7, 7))
    );
}

#[test]
fn swapping_ships_pass_through_each_other() {
    let mut world = arena(10, 10);
    let a = world.spawn(EntityKind::Miner, 1, Vec2::new(3, 5));
    let b = world.spawn(EntityKind::Miner, 1, Vec2::new(4, 5));

    let script = ScriptedAgent::new(vec![vec![
        move_action(a, Direction::Right),
        move_action(b, Direction::Left),
    ]]);
    let mut game = Game::with_world(world, 5, [Box::new(script), Box::new(NullAgent)]);
    let record = game.step();

    assert!(record.collisions.is_empty());
    assert_eq!(game.world.entities.get(a).map(|e| e.pos), Some(Vec2::new(4, 5)));
    assert_eq!(game.world.entities.get(b).map(|e| e.pos), Some(Vec2::new(3, 5)));
}

#[test]
fn build_orders_beyond_the_bank_are_dropped() {
    let mut world = arena(10, 10);
    let base = world.inventory(1).bases[0];
    {
        let inv = world.inventory_mut(1);
        inv.ore = 10;
        inv.fuel = 3;
    }

    let mut build = Action::new(base);
    build.set_build(BuildKind::Ship(ShipKind::Miner));
    let script = ScriptedAgent::new(vec![vec![build.clone(), build]]);
    let mut game = Game::with_world(world, 5, [Box::new(script), Box::new(NullAgent)]);
    game.step();

    // the first order spends 8 ore / 2 fuel, the second no longer fits
    assert_eq!(game.world.inventory(1).miners.len(), 1);
    assert_eq!(game.world.inventory(1).ore, 2);
    assert_eq!(game.world.inventory(1).fuel, 1);
}

#[test]
fn mutual_attack_keeps_one_cancelled_record_but_both_strikes_land() {
    let mut world = arena(12, 12);
    let f1 = world.spawn(EntityKind::Fighter, 1, Vec2::new(5, 5));
    let f2 = world.spawn(EntityKind::Fighter, 2, Vec2::new(5, 7));

    let mut game = Game::with_world(
        world,
        5,
        [Box::new(NullAgent), Box::new(NullAgent)],
    );
    let record = game.step();

    assert_eq!(record.attacks.len(), 1);
    assert_eq!(record.attacks[0].player, 0);
    let damage = game.world.params.fighters.attack.damage;
    for id in [f1, f2] {
        let ent = game.world.entities.get(id).unwrap();
        assert_eq!(ent.health, ent.max_health - damage);
    }
}

#[test]
fn one_sided_attack_carries_the_attacker_id() {
    let mut world = arena(12, 12);
    // a turret only strikes ships, and ships cannot strike it back
    world.spawn(EntityKind::Turret, 1, Vec2::new(5, 5));
    let victim = world.spawn(EntityKind::Miner, 2, Vec2::new(5, 8));

    let mut game = Game::with_world(
        world,
        5,
        [Box::new(NullAgent), Box::new(NullAgent)],
    );
    let record = game.step();

    // the miner's counter-strike is out of range (turret range 4, miner 2),
    // and miners cannot target buildings anyway
    assert_eq!(record.attacks.len(), 1);
    assert_eq!(record.attacks[0].player, 1);
    assert_eq!(record.attacks[0].from, Vec2::new(5, 5));
    assert_eq!(record.attacks[0].to, Vec2::new(5, 8));
    let ent = game.world.entities.get(victim).unwrap();
    assert_eq!(ent.health, ent.max_health - game.world.params.turrets.attack.damage);
}

#[test]
fn losing_the_last_base_ends_the_game_and_sinks_hosted_ships() {
    let mut world = arena(10, 10);
    let base2 = world.inventory(2).bases[0];
    let base2_pos = world.entities.get(base2).unwrap().pos;
    let hosted = world.spawn(EntityKind::Miner, 2, base2_pos);
    // one fighter strike finishes the weakened base
    world.entities.get_mut(base2).unwrap().health = 500;
    world.spawn(EntityKind::Fighter, 1, base2_pos + Direction::Left.vec());

    let mut game = Game::with_world(
        world,
        50,
        [Box::new(NullAgent), Box::new(NullAgent)],
    );
    let record = game.step();

    assert!(game.is_over());
    assert!(record.destroyed.contains(&base2_pos));
    assert!(!game.world.entities.contains(base2));
    assert!(!game.world.entities.contains(hosted));
    assert!(game.world.inventory(2).bases.is_empty());
    assert!(game.world.inventory(2).miners.is_empty());
}

#[test]
fn mining_haul_and_dropoff_across_turns() {
    let mut world = arena(10, 10);
    let home = world.spawn(EntityKind::Base, 1, Vec2::new(1, 5));
    let miner = world.spawn(EntityKind::Miner, 1, Vec2::new(2, 5));
    world
        .map
        .place_deposit(Vec2::new(3, 5), ResourceDeposit::new(2, Resource::Ore));

    let mut mine = Action::new(miner);
    mine.set_mine(Direction::Right);
    let mut dock = Action::new(miner);
    dock.set_move(Direction::Left);
    let mut unload = Action::new(miner);
    unload.set_cargo(Vec::new());

    let script = ScriptedAgent::new(vec![
        vec![mine.clone()],
        vec![mine],
        vec![dock],
        vec![unload],
    ]);
    let mut game = Game::with_world(world, 10, [Box::new(script), Box::new(NullAgent)]);

    game.step();
    game.step();
    // two units hauled, deposit exhausted and gone
    assert_eq!(
        game.world.entities.get(miner).unwrap().cargo,
        vec![Resource::Ore, Resource::Ore]
    );
    assert_eq!(game.world.map.get(Vec2::new(3, 5)), Cell::Empty);

    game.step();
    assert_eq!(game.world.entities.get(home).unwrap().vehicles, vec![miner]);

    game.step();
    assert_eq!(game.world.inventory(1).ore, 2);
    assert!(game.world.entities.get(miner).unwrap().cargo.is_empty());
}

#[test]
fn mining_resolves_before_movement_within_a_turn() {
    let mut world = arena(10, 10);
    let miner = world.spawn(EntityKind::Miner, 1, Vec2::new(2, 5));
    world
        .map
        .place_deposit(Vec2::new(3, 5), ResourceDeposit::new(5, Resource::Ore));

    // mine and step away in the same turn: the unit is still collected
    let mut action = Action::new(miner);
    action.set_mine(Direction::Right);
    action.set_move(Direction::Up);
    let script = ScriptedAgent::new(vec![vec![action]]);
    let mut game = Game::with_world(world, 5, [Box::new(script), Box::new(NullAgent)]);
    game.step();

    let ent = game.world.entities.get(miner).unwrap();
    assert_eq!(ent.pos, Vec2::new(2, 4));
    assert_eq!(ent.cargo, vec![Resource::Ore]);
    assert_eq!(
        game.world.map.deposit_at(Vec2::new(3, 5)).map(|d| d.amount),
        Some(4)
    );
}

#[test]
fn oversubscribed_deposit_grants_nothing_that_turn() {
    let mut world = arena(10, 10);
    let a = world.spawn(EntityKind::Miner, 1, Vec2::new(2, 5));
    let b = world.spawn(EntityKind::Miner, 1, Vec2::new(4, 5));
    world
        .map
        .place_deposit(Vec2::new(3, 5), ResourceDeposit::new(1, Resource::Fuel));

    let mut mine_a = Action::new(a);
    mine_a.set_mine(Direction::Right);
    let mut mine_b = Action::new(b);
    mine_b.set_mine(Direction::Left);
    let script = ScriptedAgent::new(vec![vec![mine_a, mine_b]]);
    let mut game = Game::with_world(world, 5, [Box::new(script), Box::new(NullAgent)]);
    game.step();

    assert!(game.world.entities.get(a).unwrap().cargo.is_empty());
    assert!(game.world.entities.get(b).unwrap().cargo.is_empty());
    assert_eq!(
        game.world.map.deposit_at(Vec2::new(3, 5)).map(|d| d.amount),
        Some(1)
    );
}

#[test]
fn turret_construction_through_scripted_turns() {
    let mut world = arena(10, 10);
    let miner = world.spawn(EntityKind::Miner, 1, Vec2::new(4, 4));

    let mut build = Action::new(miner);
    build.set_build(BuildKind::Building(BuildingKind::Turret));
    let script = ScriptedAgent::new(vec![vec![build]]);
    let mut game = Game::with_world(world, 5, [Box::new(script), Box::new(NullAgent)]);
    game.step();

    // the miner now sits inside a fresh construction site
    let uc = game.world.inventory(1).under_construction.clone();
    assert_eq!(uc.len(), 1);
    let site = game.world.entities.get(uc[0]).unwrap();
    assert_eq!(site.pos, Vec2::new(4, 4));
    assert_eq!(site.vehicles, vec![miner]);
    assert_eq!(game.world.map.get(Vec2::new(4, 4)), Cell::Entity(uc[0]));
}

#[test]
fn full_match_replay_has_a_closing_frame() {
    let world = arena(10, 10);
    let mut game = Game::with_world(world, 4, [Box::new(NullAgent), Box::new(NullAgent)]);
    let replay = game.play();

    assert_eq!(replay.frames.len(), 5);
    let last = replay.frames.last().unwrap();
    assert!(last.moves.is_empty());
    assert!(last.collisions.is_empty());
    assert!(last.attacks.is_empty());
    assert!(last.destroyed.is_empty());
    // the closing frame still carries the final inventories
    assert_eq!(last.info[0].bases, 1);
    assert_eq!(last.info[1].bases, 1);
}
