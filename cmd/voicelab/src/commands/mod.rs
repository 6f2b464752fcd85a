//! CLI commands module.

mod cache;
mod config;
mod learning;
mod matching;
mod util;

pub use cache::CacheCommand;
pub use config::ConfigCommand;
pub use learning::LearningCommand;
pub use matching::MatchCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
