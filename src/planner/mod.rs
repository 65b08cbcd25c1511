//! Multi-agent path planning
//!
//! [`astar`] holds the resumable grid search, [`spacetime`] the cooperative
//! planner that layers time and a shared reservation table on top of it.

pub mod astar;
pub mod spacetime;

pub use astar::{astar, AStarMap, CapacityGrid};
pub use spacetime::{space_time_astar, ReservationTable};

use crate::core::types::PlayerId;
use crate::grid::map::Cell;
use crate::grid::vec2::Vec2;
use crate::world::World;

/// Project the world into a capacity grid from one player's point of view:
/// open ground holds one ship, deposits and enemy buildings are impassable,
/// and own buildings admit as many ships as they can host.
pub fn capacity_grid(world: &World, player: PlayerId) -> CapacityGrid {
    let map = &world.map;
    let mut grid = CapacityGrid::new(map.width(), map.height(), 1);
    for x in 0..map.width() {
        for y in 0..map.height() {
            let pos = Vec2::new(x, y);
            match map.get(pos) {
                Cell::Empty => {}
                Cell::Deposit => grid.set(pos, 0),
                Cell::Entity(id) => {
                    let Some(ent) = world.entities.get(id) else {
                        continue;
                    };
                    if ent.is_building() {
                        if ent.player == player {
                            grid.set(pos, world.params.vehicle_capacity(ent.kind) as u32);
                        } else {
                            grid.set(pos, 0);
                        }
                    }
                }
            }
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameParams;
    use crate::entity::EntityKind;

    #[test]
    fn grid_reflects_deposits_and_building_ownership() {
        let params = GameParams::default();
        let mut world = World::new(params, 10, 10);
        world.map.place_deposit(
            Vec2::new(2, 2),
            crate::grid::map::ResourceDeposit::new(5, crate::grid::map::Resource::Ore),
        );
        world.spawn(EntityKind::Base, 1, Vec2::new(4, 4));
        world.spawn(EntityKind::Turret, 2, Vec2::new(6, 6));
        world.spawn(EntityKind::Miner, 1, Vec2::new(8, 8));

        let grid = capacity_grid(&world, 1);
        assert_eq!(grid.get(Vec2::new(0, 0)), 1);
        assert_eq!(grid.get(Vec2::new(2, 2)), 0);
        // own base admits its full complement, enemy turret blocks
        assert_eq!(grid.get(Vec2::new(4, 4)), 30);
        assert_eq!(grid.get(Vec2::new(6, 6)), 0);
        // ships do not block planning
        assert_eq!(grid.get(Vec2::new(8, 8)), 1);

        let grid = capacity_grid(&world, 2);
        assert_eq!(grid.get(Vec2::new(4, 4)), 0);
        assert_eq!(grid.get(Vec2::new(6, 6)), 4);
    }
}
