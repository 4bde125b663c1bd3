//! CLI subcommand implementations.

pub mod input;
pub mod layout;
pub mod scales;
pub mod tree;
