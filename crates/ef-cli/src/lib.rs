//! Event flow CLI library.
//!
//! This crate provides the CLI interface for event flow aggregation.

mod cli;
pub mod commands;
mod config;

pub use cli::{AlignArgs, Cli, Commands, InputArgs, SizeArgs};
pub use config::{Config, XAxis};
