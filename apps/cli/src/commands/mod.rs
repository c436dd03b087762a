//! CLI subcommands

pub mod face;
pub mod show;
pub mod validate;
