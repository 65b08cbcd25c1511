//! The player-controller seam
//!
//! The engine owns the world; controllers only read it. Each turn every
//! controller is shown the current state and hands back the commands for its
//! own entities.

use crate::action::Action;
use crate::core::types::Tick;
use crate::world::World;

pub trait Agent {
    /// Produce this player's commands for the given turn
    fn act(&mut self, turn: Tick, world: &World) -> Vec<Action>;

    /// Called once after the final turn
    fn close(&mut self) {}
}

/// A controller that never issues a command
#[derive(Debug, Default)]
pub struct NullAgent;

impl Agent for NullAgent {
    fn act(&mut self, _turn: Tick, _world: &World) -> Vec<Action> {
        Vec::new()
    }
}
