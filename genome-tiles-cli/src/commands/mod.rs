//! Subcommand implementations.

mod common;
pub mod config;
pub mod fetch;
pub mod plan;
pub mod validate;

pub use config::ConfigCommands;
pub use fetch::FetchArgs;
pub use plan::PlanArgs;
pub use validate::ValidateArgs;
