//! # minui Core
//!
//! Value types shared by every part of the toolkit:
//! - Integer geometry with the logical → physical scaling transform
//! - Colors, style snapshots and the fixed-capacity style registry
//! - Toolkit configuration loaded from TOML
//!
//! Nothing here touches a window, a thread or a pixel.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod style;

pub use config::{ToolkitConfig, DEFAULT_AA_FACTOR};
pub use error::{ConfigError, ConfigResult};
pub use geometry::{Point, Rect};
pub use style::{
    names, Color, Style, StyleRegistry, Theme, HOVER_SUFFIX, MAX_FONT_FAMILIES, PRESS_SUFFIX,
    STYLE_CAPACITY,
};
