//! Subcommand implementations

pub mod batch;
pub mod cache;
pub mod nearest;
pub mod resolve;
pub mod search;
