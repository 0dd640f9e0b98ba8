//! Static text.

use minui_core::{names, Rect, Style};

use super::core::{Widget, WidgetBase};
use crate::painter::Painter;

/// A single line of centered text.
#[derive(Debug)]
pub struct Label {
    base: WidgetBase,
    text: String,
}

impl Label {
    /// Creates a label with the `label` style.
    #[must_use]
    pub fn new(rect: Rect, text: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(rect, names::LABEL),
            text: text.into(),
        }
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the text and requests a repaint.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.base.update();
    }
}

impl Widget for Label {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&self, painter: &mut Painter<'_>, style: &Style) {
        if !self.text.is_empty() {
            painter.draw_text(self.base.rect, &self.text, style);
        }
    }
}
