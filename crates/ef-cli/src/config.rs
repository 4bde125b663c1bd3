//! Configuration loading and management.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use ef_core::{Alignment, EventMatcher, FlowError, Measure};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Horizontal positioning of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum XAxis {
    /// Mean time from the alignment event.
    #[default]
    Elapsed,
    /// Position in the event sequence.
    Sequence,
}

impl XAxis {
    pub const fn measure(self) -> Measure {
        match self {
            Self::Elapsed => Measure::ElapsedTime,
            Self::Sequence => Measure::EventSequence,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Drawing width in pixels.
    pub width: f64,
    /// Drawing height in pixels.
    pub height: f64,
    /// Event name to align on, or `*` for any event.
    pub align_event: String,
    /// Which matching event to align on (1-based, negative from the end).
    pub align_index: i32,
    /// Horizontal positioning used by `ef layout`.
    pub x_axis: XAxis,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            align_event: "*".to_string(),
            align_index: 1,
            x_axis: XAxis::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Environment variables (EF_*)
        figment = figment.merge(Env::prefixed("EF_"));

        figment.extract()
    }

    /// Builds the alignment, letting command-line values win over the file.
    pub fn alignment(
        &self,
        event: Option<&str>,
        index: Option<i32>,
    ) -> Result<Alignment, FlowError> {
        let event = event.unwrap_or(&self.align_event);
        let matcher: EventMatcher = match event.parse() {
            Ok(matcher) => matcher,
            Err(never) => match never {},
        };
        Alignment::new(matcher, index.unwrap_or(self.align_index))
    }

    /// Drawing dimensions, with command-line values winning over the file.
    pub fn dimensions(&self, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
        (width.unwrap_or(self.width), height.unwrap_or(self.height))
    }
}

/// Returns the platform-specific config directory for ef.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ef"))
}
