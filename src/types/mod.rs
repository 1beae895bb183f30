//! Core types for GripLock

mod command;
mod config;
mod hand;
mod output;
mod side;
mod vec3;

pub use command::AuthorityCommand;
pub use config::{ConfigError, SqueezeConfig};
pub use hand::HandState;
pub use output::TickOutput;
pub use side::Side;
pub use vec3::Vec3;
