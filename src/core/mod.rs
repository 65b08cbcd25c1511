pub mod config;
pub mod error;
pub mod types;

pub use config::GameParams;
pub use error::{GameError, Result};
