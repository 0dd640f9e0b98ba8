//! Bitmap display.

use std::sync::Arc;

use minui_core::{names, Rect, Style};

use super::core::{Widget, WidgetBase};
use crate::painter::Painter;

/// Draws encoded image data stretched to its rectangle.
///
/// The data is decoded at paint time by the backend's decoder; data that
/// fails to decode leaves the area blank.
#[derive(Debug)]
pub struct Image {
    base: WidgetBase,
    data: Option<Arc<[u8]>>,
}

impl Image {
    /// Creates an empty image widget with the `image` style.
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self {
            base: WidgetBase::new(rect, names::IMAGE),
            data: None,
        }
    }

    /// Replaces the encoded image data and requests a repaint.
    pub fn set_data(&mut self, data: impl Into<Arc<[u8]>>) {
        self.data = Some(data.into());
        self.base.update();
    }

    /// Removes the image.
    pub fn clear(&mut self) {
        self.data = None;
        self.base.update();
    }

    /// Returns true if image data is set.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

impl Widget for Image {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&self, painter: &mut Painter<'_>, _style: &Style) {
        if let Some(data) = &self.data {
            painter.draw_image_data(self.base.rect, data);
        }
    }
}
