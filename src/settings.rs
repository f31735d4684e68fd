use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::parser::lines::DEFAULT_LINE_TOLERANCE;

/// Optional settings file looked up in the working directory (`season_index.toml`).
const CONFIG_NAME: &str = "season_index";
const ENV_PREFIX: &str = "SEASON";

/// Wrapped track names are joined when the next line is at most this long.
pub const DEFAULT_SHORT_JOIN_MAX: usize = 18;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParseSettings {
    /// Max vertical distance between fragments of the same row.
    pub line_tolerance: f64,
    pub short_join_max: usize,
}

impl Default for ParseSettings {
    fn default() -> Self {
        ParseSettings {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            short_join_max: DEFAULT_SHORT_JOIN_MAX,
        }
    }
}

impl ParseSettings {
    /// Defaults, then the settings file, then `SEASON_*` environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(CONFIG_NAME).required(false),
        };
        let settings: ParseSettings = Config::builder()
            .set_default("line_tolerance", DEFAULT_LINE_TOLERANCE)?
            .set_default("short_join_max", DEFAULT_SHORT_JOIN_MAX as u64)?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.line_tolerance.is_finite() || self.line_tolerance < 0.0 {
            return Err(ConfigError::Message(format!(
                "line_tolerance must be a non-negative number, got {}",
                self.line_tolerance
            )));
        }
        Ok(())
    }
}
