//! Procedural map generation
//!
//! Deposits are only ever placed on the left half of the map and mirrored
//! across the vertical midline, so both players start with identical
//! surroundings. A clearance radius around the left base keeps the opening
//! area free of deposits; the mirrored base is protected by symmetry.

use ahash::AHashSet;
use rand::Rng;

use crate::core::config::{DepositParams, GameParams};
use crate::entity::EntityKind;
use crate::grid::map::{Cell, ResourceDeposit};
use crate::grid::vec2::{diamond, Vec2};
use crate::world::World;

/// Roll map dimensions, place both bases, and grow the deposit clusters
pub fn generate_map<R: Rng>(params: GameParams, rng: &mut R) -> World {
    let start = params.start;
    let width = rng.gen_range(start.min_w..=start.max_w);
    let height = rng.gen_range(start.min_h..=start.max_h);
    let mut world = World::new(params, width, height);

    let base_x = rng.gen_range(start.clear..=start.clear + start.base_off);
    let base_y = rng.gen_range(
        (height - 1) / 2 - start.base_off..=height / 2 + start.base_off,
    );
    let base_pos = Vec2::new(base_x, base_y);
    let mirrored = Vec2::new(width - base_x - 1, base_y);
    world.spawn(EntityKind::Base, 1, base_pos);
    world.spawn(EntityKind::Base, 2, mirrored);

    // deposit generation never leaves the left half, so only the left base
    // needs an explicit clearance zone
    let blocked: AHashSet<Vec2> = diamond(base_pos, start.clear, width, height)
        .into_iter()
        .collect();

    let ore = world.params.ore_deposits.0;
    let fuel = world.params.fuel_deposits.0;
    let num_ore = rng.gen_range(ore.min_num..=ore.max_num);
    let num_fuel = rng.gen_range(fuel.min_num..=fuel.max_num);
    for _ in 0..num_ore {
        generate_deposit(&mut world, &blocked, &ore, rng);
    }
    for _ in 0..num_fuel {
        generate_deposit(&mut world, &blocked, &fuel, rng);
    }
    world
}

/// Grow one deposit cluster on the left half of the map, mirroring every
/// placement and every amount change onto the right half
fn generate_deposit<R: Rng>(
    world: &mut World,
    blocked: &AHashSet<Vec2>,
    params: &DepositParams,
    rng: &mut R,
) {
    let width = world.map.width();
    let height = world.map.height();
    let half = (width + 1) / 2;

    let free = |world: &World, pos: Vec2| {
        world.map.get(pos) == Cell::Empty && !blocked.contains(&pos)
    };

    let mut seed = Vec2::default();
    let mut placed = false;
    for _ in 0..11 {
        let candidate = Vec2::new(
            rng.gen_range(params.left_offset..half - params.right_offset),
            rng.gen_range(0..height),
        );
        if free(world, candidate) {
            seed = candidate;
            placed = true;
            break;
        }
    }
    if !placed {
        // the map is too crowded here; drop this cluster
        return;
    }

    let mirror = |pos: Vec2| Vec2::new(width - pos.x - 1, pos.y);
    let place = |world: &mut World, pos: Vec2, amount: i32| {
        world
            .map
            .place_deposit(pos, ResourceDeposit::new(amount, params.resource));
        world
            .map
            .place_deposit(mirror(pos), ResourceDeposit::new(amount, params.resource));
    };

    let amount = rng.gen_range(params.min_start_amt..=params.max_start_amt);
    place(world, seed, amount);

    let size = rng.gen_range(params.min_size..=params.max_size);
    let mut frontier = vec![seed];
    let mut grown = 0;
    while grown < size && !frontier.is_empty() {
        let idx = rng.gen_range(0..frontier.len());
        let from = frontier[idx];
        let candidates: Vec<Vec2> = diamond(from, 1, half, height)
            .into_iter()
            .filter(|&p| free(world, p))
            .collect();
        if candidates.is_empty() {
            frontier.remove(idx);
            continue;
        }
        let next = candidates[rng.gen_range(0..candidates.len())];
        let amount = rng.gen_range(params.min_start_amt..=params.max_start_amt);
        place(world, next, amount);
        frontier.push(next);
        grown += 1;

        // growing from a cell also enriches it, up to the cap
        let inc = rng.gen_range(params.min_inc_amt..=params.max_inc_amt);
        for pos in [from, mirror(from)] {
            if let Some(dep) = world.map.deposit_at_mut(pos) {
                dep.amount += inc;
            }
        }
        if world.map.deposit_at(from).is_some_and(|d| d.amount > params.max_amt) {
            for pos in [from, mirror(from)] {
                if let Some(dep) = world.map.deposit_at_mut(pos) {
                    dep.amount = params.max_amt;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generated(seed: u64) -> World {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate_map(GameParams::default(), &mut rng)
    }

    #[test]
    fn dimensions_and_bases_are_within_bounds() {
        for seed in 0..10 {
            let world = generated(seed);
            let start = world.params.start;
            assert!((start.min_w..=start.max_w).contains(&world.map.width()));
            assert!((start.min_h..=start.max_h).contains(&world.map.height()));
            assert_eq!(world.inventory(1).bases.len(), 1);
            assert_eq!(world.inventory(2).bases.len(), 1);
        }
    }

    #[test]
    fn bases_are_mirror_images() {
        for seed in 0..10 {
            let world = generated(seed);
            let p1 = world.entities.get(world.inventory(1).bases[0]).unwrap().pos;
            let p2 = world.entities.get(world.inventory(2).bases[0]).unwrap().pos;
            assert_eq!(p2, Vec2::new(world.map.width() - p1.x - 1, p1.y));
        }
    }

    #[test]
    fn deposits_are_mirrored_with_equal_amounts() {
        for seed in 0..10 {
            let world = generated(seed);
            let w = world.map.width();
            assert!(!world.map.deposits.is_empty());
            for (&pos, dep) in &world.map.deposits {
                let twin = world
                    .map
                    .deposit_at(Vec2::new(w - pos.x - 1, pos.y))
                    .expect("mirrored deposit missing");
                assert_eq!(twin.amount, dep.amount);
                assert_eq!(twin.resource, dep.resource);
            }
        }
    }

    #[test]
    fn deposits_respect_both_clearance_zones() {
        for seed in 0..10 {
            let world = generated(seed);
            let clear = world.params.start.clear;
            for player in [1, 2] {
                let base = world
                    .entities
                    .get(world.inventory(player).bases[0])
                    .unwrap()
                    .pos;
                for p in diamond(base, clear, world.map.width(), world.map.height()) {
                    assert!(
                        world.map.deposit_at(p).is_none(),
                        "deposit at {p} inside the clearance of base {base}"
                    );
                }
            }
        }
    }

    #[test]
    fn deposit_amounts_never_exceed_the_cap() {
        for seed in 0..10 {
            let world = generated(seed);
            for dep in world.map.deposits.values() {
                let cap = match dep.resource {
                    crate::grid::map::Resource::Ore => world.params.ore_deposits.0.max_amt,
                    crate::grid::map::Resource::Fuel => world.params.fuel_deposits.0.max_amt,
                };
                assert!(dep.amount >= 1 && dep.amount <= cap);
            }
        }
    }
}
