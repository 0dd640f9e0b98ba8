//! Styling: colors, style snapshots and the name-keyed style registry.
//!
//! The registry is a flat string-keyed table. Pseudo-states are plain
//! name suffixes built by the caller:
//!
//! ```text
//!   "button"        normal
//!   "button:hover"  pointer over the widget
//!   "button:press"  button held down over the widget
//! ```
//!
//! A lookup never fails: a missing name resolves to the registry's default
//! style for its theme.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Maximum number of entries in a font fallback list.
pub const MAX_FONT_FAMILIES: usize = 6;

/// Maximum number of named styles a registry holds.
pub const STYLE_CAPACITY: usize = 128;

/// Suffix selecting the hover appearance of a style.
pub const HOVER_SUFFIX: &str = ":hover";

/// Suffix selecting the pressed appearance of a style.
pub const PRESS_SUFFIX: &str = ":press";

/// 8-bit RGB color.
///
/// `#[repr(C)]` and `Pod` so pixel buffers can be viewed as bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Solid black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Solid white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Neutral gray used for window frames.
    pub const FRAME: Self = Self::rgb(130, 130, 130);

    /// Creates a color from RGB channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a color from a hex value (0xRRGGBB).
    #[must_use]
    pub const fn hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }
}

/// Process-level theme selecting the default style table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark text on light surfaces.
    #[default]
    Light,
    /// Light text on dark surfaces.
    Dark,
}

/// Immutable appearance snapshot for a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    /// Lookup key in the registry.
    pub name: String,
    /// Foreground (text, stroke, progress fill) color.
    pub color: Color,
    /// Background fill color.
    pub background_color: Color,
    /// Corner radius in logical units.
    pub radius: i32,
    /// Font size in logical units.
    pub font_size: i32,
    /// Ordered font fallback list, at most [`MAX_FONT_FAMILIES`] entries.
    pub font_family: Vec<String>,
}

impl Style {
    /// Name carried by the compiled-in defaults.
    pub const DEFAULT_NAME: &'static str = "default";

    /// Compiled-in light default.
    #[must_use]
    pub fn light() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            color: Color::rgb(50, 50, 50),
            background_color: Color::rgb(250, 250, 251),
            radius: 6,
            font_size: 18,
            font_family: default_families(),
        }
    }

    /// Compiled-in dark default.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            color: Color::rgb(230, 230, 232),
            background_color: Color::rgb(32, 32, 34),
            radius: 6,
            font_size: 18,
            font_family: default_families(),
        }
    }

    /// Returns the compiled-in default for a theme.
    #[must_use]
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
        }
    }

    /// Sets the registry name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the foreground color.
    #[must_use]
    pub const fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the background color.
    #[must_use]
    pub const fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Sets the corner radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: i32) -> Self {
        self.radius = radius;
        self
    }

    /// Sets the font size.
    #[must_use]
    pub const fn with_font_size(mut self, size: i32) -> Self {
        self.font_size = size;
        self
    }

    /// Replaces the font fallback list. Entries past [`MAX_FONT_FAMILIES`] are dropped.
    #[must_use]
    pub fn with_font_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.font_family = families
            .into_iter()
            .take(MAX_FONT_FAMILIES)
            .map(Into::into)
            .collect();
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::light()
    }
}

fn default_families() -> Vec<String> {
    ["Microsoft YaHei UI", "SimSun", "sans-serif", "sans", "Arial"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Fixed-capacity name → style table.
///
/// Names are unique. Setting an existing name replaces the entry in its
/// slot; the slot order is insertion order of first appearance.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: Vec<Style>,
    default: Style,
    theme: Theme,
}

impl StyleRegistry {
    /// Creates an empty registry whose misses resolve to the theme default.
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            styles: Vec::with_capacity(STYLE_CAPACITY),
            default: Style::for_theme(theme),
            theme,
        }
    }

    /// Creates a registry pre-populated with the built-in widget styles.
    #[must_use]
    pub fn with_builtin(theme: Theme) -> Self {
        let mut registry = Self::new(theme);
        for style in builtin_styles(theme) {
            let name = style.name.clone();
            registry.set_style(name, style);
        }
        registry
    }

    /// Switches light/dark at runtime.
    ///
    /// Every built-in entry is replaced in its slot with the `theme`
    /// variant (re-added if it was never set) and misses resolve to the new
    /// default. Styles registered under other names are kept as they are.
    pub fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.default = Style::for_theme(theme);
        for style in builtin_styles(theme) {
            let name = style.name.clone();
            self.set_style(name, style);
        }
        tracing::debug!("style registry switched to {:?}", theme);
    }

    /// Inserts or replaces the style stored under `name`.
    ///
    /// The stored style's `name` is set to `name` and its font list is cut
    /// to [`MAX_FONT_FAMILIES`]. Returns `false` and drops the style when
    /// the name is new and the registry is full.
    pub fn set_style(&mut self, name: impl Into<String>, mut style: Style) -> bool {
        let name = name.into();
        style.font_family.truncate(MAX_FONT_FAMILIES);

        if let Some(slot) = self.styles.iter_mut().find(|s| s.name == name) {
            *slot = Style { name, ..style };
            return true;
        }

        if self.styles.len() >= STYLE_CAPACITY {
            tracing::debug!("style registry full, ignoring {}", name);
            return false;
        }

        self.styles.push(Style { name, ..style });
        true
    }

    /// Returns the style stored under `name`, or the default style.
    #[must_use]
    pub fn get_style(&self, name: &str) -> &Style {
        self.styles
            .iter()
            .find(|s| s.name == name)
            .unwrap_or(&self.default)
    }

    /// Returns the style for `base` in a pseudo-state, e.g. `("button", ":hover")`.
    #[must_use]
    pub fn get_state_style(&self, base: &str, suffix: &str) -> &Style {
        if suffix.is_empty() {
            return self.get_style(base);
        }
        self.get_style(&format!("{base}{suffix}"))
    }

    /// Returns true if `name` has an explicit entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.styles.iter().any(|s| s.name == name)
    }

    /// Returns the style used for misses.
    #[must_use]
    pub fn default_style(&self) -> &Style {
        &self.default
    }

    /// Returns the theme the default style was chosen for.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Returns true if no style has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Maximum number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        STYLE_CAPACITY
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::with_builtin(Theme::Light)
    }
}

/// Well-known style names used by the built-in widgets.
pub mod names {
    /// Window background.
    pub const WINDOW: &str = "window";
    /// Text labels.
    pub const LABEL: &str = "label";
    /// Image widgets.
    pub const IMAGE: &str = "image";
    /// Push buttons.
    pub const BUTTON: &str = "button";
    /// Progress bars.
    pub const PROGRESS: &str = "progress";
    /// The window's close control.
    pub const CLOSE: &str = "close";
}

fn builtin_styles(theme: Theme) -> Vec<Style> {
    let base = Style::for_theme(theme);
    let (button, hover, press, track) = match theme {
        Theme::Light => (
            Color::rgb(230, 230, 230),
            Color::rgb(220, 220, 221),
            Color::rgb(190, 190, 192),
            Color::rgb(235, 232, 230),
        ),
        Theme::Dark => (
            Color::rgb(58, 58, 60),
            Color::rgb(72, 72, 74),
            Color::rgb(42, 42, 44),
            Color::rgb(60, 60, 62),
        ),
    };
    let accent = Color::rgb(53, 132, 228);
    let close = base.clone().with_radius(0);

    vec![
        base.clone().with_name(names::WINDOW),
        base.clone().with_name(names::LABEL),
        base.clone().with_name(names::IMAGE),
        base.clone().with_name(names::BUTTON).with_background(button),
        base.clone()
            .with_name(format!("{}{HOVER_SUFFIX}", names::BUTTON))
            .with_background(hover),
        base.clone()
            .with_name(format!("{}{PRESS_SUFFIX}", names::BUTTON))
            .with_background(press),
        base.with_name(names::PROGRESS)
            .with_color(accent)
            .with_background(track),
        close.clone().with_name(names::CLOSE),
        close
            .clone()
            .with_name(format!("{}{HOVER_SUFFIX}", names::CLOSE))
            .with_background(Color::rgb(196, 43, 28)),
        close
            .with_name(format!("{}{PRESS_SUFFIX}", names::CLOSE))
            .with_background(Color::rgb(181, 43, 30)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_round_trip() {
        let mut registry = StyleRegistry::new(Theme::Light);
        let style = Style::light().with_color(Color::rgb(1, 2, 3)).with_radius(9);

        assert!(registry.set_style("x", style.clone()));
        assert_eq!(registry.get_style("x"), &style.with_name("x"));
    }

    #[test]
    fn test_replace_keeps_slot_count() {
        let mut registry = StyleRegistry::new(Theme::Light);
        registry.set_style("a", Style::light());
        registry.set_style("x", Style::light());
        let before = registry.len();

        registry.set_style("x", Style::dark());

        assert_eq!(registry.len(), before);
        assert_eq!(registry.get_style("x").background_color, Style::dark().background_color);
    }

    #[test]
    fn test_miss_returns_theme_default() {
        let light = StyleRegistry::new(Theme::Light);
        let dark = StyleRegistry::new(Theme::Dark);

        assert_eq!(light.get_style("nope"), &Style::light());
        assert_eq!(dark.get_style("nope"), &Style::dark());
    }

    #[test]
    fn test_capacity_ignores_new_names() {
        let mut registry = StyleRegistry::new(Theme::Light);
        for i in 0..STYLE_CAPACITY {
            assert!(registry.set_style(format!("s{i}"), Style::light()));
        }

        assert!(!registry.set_style("overflow", Style::dark()));
        assert!(!registry.contains("overflow"));
        assert_eq!(registry.len(), STYLE_CAPACITY);

        // Replacing still works when full.
        assert!(registry.set_style("s0", Style::dark()));
    }

    #[test]
    fn test_state_style_falls_back_to_default() {
        let registry = StyleRegistry::with_builtin(Theme::Light);

        let hover = registry.get_state_style(names::BUTTON, HOVER_SUFFIX);
        assert_eq!(hover.background_color, Color::rgb(220, 220, 221));

        // No ":hover" entry for labels: the whole default style comes back.
        let label_hover = registry.get_state_style(names::LABEL, HOVER_SUFFIX);
        assert_eq!(label_hover, registry.default_style());
    }

    #[test]
    fn test_font_families_truncated() {
        let style = Style::light().with_font_families(["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(style.font_family.len(), MAX_FONT_FAMILIES);
    }

    #[test]
    fn test_set_style_truncates_fonts() {
        let mut registry = StyleRegistry::new(Theme::Light);
        let mut style = Style::light();
        style.font_family = (0..10).map(|i| format!("f{i}")).collect();

        registry.set_style("wide", style);
        assert_eq!(registry.get_style("wide").font_family.len(), MAX_FONT_FAMILIES);
        assert_eq!(registry.get_style("wide").font_family[0], "f0");
    }

    #[test]
    fn test_apply_theme_swaps_builtins_in_place() {
        let mut registry = StyleRegistry::with_builtin(Theme::Light);
        let custom = Style::light().with_color(Color::rgb(9, 9, 9));
        registry.set_style("custom", custom.clone());
        let slots = registry.len();

        registry.apply_theme(Theme::Dark);

        assert_eq!(registry.theme(), Theme::Dark);
        assert_eq!(registry.len(), slots);
        assert_eq!(registry.get_style("nope"), &Style::dark());
        assert_eq!(
            registry.get_style(names::WINDOW),
            StyleRegistry::with_builtin(Theme::Dark).get_style(names::WINDOW)
        );
        assert_eq!(registry.get_style("custom"), &custom.with_name("custom"));

        registry.apply_theme(Theme::Light);
        assert_eq!(
            registry.get_style(names::BUTTON),
            StyleRegistry::with_builtin(Theme::Light).get_style(names::BUTTON)
        );
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::hex(0x3584E4), Color::rgb(53, 132, 228));
    }
}
