//! Toolkit configuration.
//!
//! Loaded once at startup, either from defaults or from a TOML file:
//!
//! ```toml
//! theme = "dark"
//! supersample = 2.0
//! aa_factor = 4.0
//! title_height = 32
//! close_button_width = 48
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::style::Theme;

/// Oversampling used by nested anti-aliased painters.
pub const DEFAULT_AA_FACTOR: f32 = 4.0;

/// Process-wide toolkit settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolkitConfig {
    /// Theme for the default style table.
    pub theme: Theme,
    /// Supersample factor for the top-level window painter.
    ///
    /// Clamped up to the DPI scale at paint time, so `1.0` means
    /// "render at device density".
    pub supersample: f32,
    /// Supersample factor for `Painter::with_aa` sub-passes.
    pub aa_factor: f32,
    /// Height of the title/drag region in logical units.
    pub title_height: i32,
    /// Width of the synthetic close button in logical units.
    pub close_button_width: i32,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            supersample: 1.0,
            aa_factor: DEFAULT_AA_FACTOR,
            title_height: 32,
            close_button_width: 48,
        }
    }
}

impl ToolkitConfig {
    /// Parses a config from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Sets the theme.
    #[must_use]
    pub const fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Sets the top-level supersample factor.
    #[must_use]
    pub const fn with_supersample(mut self, factor: f32) -> Self {
        self.supersample = factor;
        self
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(self.supersample.is_finite() && self.supersample > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "supersample",
                reason: format!("must be a positive number, got {}", self.supersample),
            });
        }
        if !(self.aa_factor.is_finite() && self.aa_factor >= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "aa_factor",
                reason: format!("must be at least 1.0, got {}", self.aa_factor),
            });
        }
        if self.title_height < 0 || self.close_button_width < 0 {
            return Err(ConfigError::InvalidValue {
                field: "title_height",
                reason: "chrome sizes cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}
