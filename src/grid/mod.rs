//! Grid geometry and the shared game map

pub mod map;
pub mod vec2;

pub use map::{Cell, GameMap, Resource, ResourceDeposit};
pub use vec2::{diamond, ring, Direction, Vec2};
