//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::XAxis;

/// Event flow aggregation.
///
/// Aligns sessions of events on a chosen event and merges them into a counted
/// tree, then derives the scales and layout used to draw it.
#[derive(Debug, Parser)]
#[command(name = "ef", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the aggregated event tree.
    Tree {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        align: AlignArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the scales derived from the tree.
    Scales {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        align: AlignArgs,

        #[command(flatten)]
        size: SizeArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print positioned nodes and links as JSONL.
    Layout {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        align: AlignArgs,

        #[command(flatten)]
        size: SizeArgs,

        /// Horizontal positioning of nodes.
        #[arg(long, value_enum)]
        x_axis: Option<XAxis>,
    },
}

/// Where event records are read from.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// JSONL file of event records (`-` or omitted reads stdin).
    pub input: Option<PathBuf>,
}

/// Alignment overrides.
#[derive(Debug, Clone, Default, Args)]
pub struct AlignArgs {
    /// Event name to align on (`*` for any event).
    #[arg(long)]
    pub align_event: Option<String>,

    /// Which matching event to align on (1-based, negative counts from the end).
    #[arg(long, allow_hyphen_values = true)]
    pub align_index: Option<i32>,
}

/// Drawing size overrides.
#[derive(Debug, Clone, Default, Args)]
pub struct SizeArgs {
    /// Drawing width in pixels.
    #[arg(long)]
    pub width: Option<f64>,

    /// Drawing height in pixels.
    #[arg(long)]
    pub height: Option<f64>,
}
