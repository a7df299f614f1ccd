//! CLI subcommands

pub mod extract;
pub mod graph;
pub mod health;
