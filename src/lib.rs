//! Astromine - deterministic two-player grid strategy simulation
//!
//! Two fleets mine ore and fuel, construct bases and turrets, and fight over
//! a mirrored map. Turns resolve synchronously in a fixed phase order, so a
//! seed and a pair of controllers fully determine the match. The [`planner`]
//! module provides the cooperative space-time pathfinding the bundled
//! [`bot`] controller is built on.

pub mod action;
pub mod agent;
pub mod bot;
pub mod core;
pub mod engine;
pub mod entity;
pub mod grid;
pub mod planner;
pub mod world;
