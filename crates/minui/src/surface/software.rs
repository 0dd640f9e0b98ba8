//! In-memory raster surface.
//!
//! Used by the headless backend and by tests. Rectangles, rounded
//! rectangles, lines and images are rasterized into a [`Bitmap`]. Text is
//! not rasterized (there is no glyph source); text commands are only
//! visible through the command log.

use std::cell::RefCell;
use std::rc::Rc;

use minui_core::{Color, Point, Rect};

use super::{Bitmap, DrawCommand, Surface};

/// Draw commands recorded by a surface and every surface derived from it.
pub type CommandLog = Rc<RefCell<Vec<DrawCommand>>>;

/// A software-rendered surface.
pub struct SoftwareSurface {
    bitmap: Bitmap,
    clip: Option<Rect>,
    /// Families this surface can materialize. Empty accepts any family.
    fonts: Rc<[String]>,
    log: Option<CommandLog>,
}

impl SoftwareSurface {
    /// Creates a surface filled with black.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            bitmap: Bitmap::new(width, height, Color::BLACK),
            clip: None,
            fonts: Rc::from(Vec::<String>::new()),
            log: None,
        }
    }

    /// Limits the font families this surface reports as available.
    #[must_use]
    pub fn with_fonts<I, S>(mut self, fonts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fonts = fonts.into_iter().map(Into::into).collect::<Vec<_>>().into();
        self
    }

    /// Records every draw command (including those issued on compatible
    /// surfaces created from this one) into a shared log.
    #[must_use]
    pub fn with_recording(mut self) -> Self {
        self.log = Some(Rc::new(RefCell::new(Vec::new())));
        self
    }

    /// Returns the shared command log, if recording.
    #[must_use]
    pub fn command_log(&self) -> Option<CommandLog> {
        self.log.clone()
    }

    /// Returns the raster contents.
    #[must_use]
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Returns the pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.bitmap.get(x, y)
    }

    /// Fills the whole surface, ignoring the clip.
    pub fn clear(&mut self, color: Color) {
        self.bitmap = Bitmap::new(self.bitmap.width(), self.bitmap.height(), color);
    }

    /// Visible area: surface bounds intersected with the clip.
    fn visible(&self, rect: Rect) -> Option<Rect> {
        let bounded = rect.intersection(&self.bounds())?;
        match self.clip {
            Some(clip) => bounded.intersection(&clip),
            None => Some(bounded),
        }
    }

    fn fill(&mut self, rect: Rect, color: Color) {
        let Some(area) = self.visible(rect) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.bitmap.set(x, y, color);
            }
        }
    }

    fn fill_shape(&mut self, rect: Rect, color: Color, inside: impl Fn(f32, f32) -> bool) {
        let Some(area) = self.visible(rect) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if inside(x as f32 + 0.5, y as f32 + 0.5) {
                    self.bitmap.set(x, y, color);
                }
            }
        }
    }

    fn line(&mut self, from: Point, to: Point, width: i32, color: Color) {
        let width = width.max(1);
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let steps = dx.abs().max(dy.abs()).max(1);
        for i in 0..=steps {
            let x = from.x + dx * i / steps;
            let y = from.y + dy * i / steps;
            self.fill(Rect::new(x - width / 2, y - width / 2, width, width), color);
        }
    }
}

/// Point-in-rounded-rectangle test on pixel centers.
fn inside_rounded(rect: Rect, radius: i32, fx: f32, fy: f32) -> bool {
    if rect.is_empty() {
        return false;
    }
    let left = rect.x as f32;
    let top = rect.y as f32;
    let right = rect.right() as f32;
    let bottom = rect.bottom() as f32;
    if fx < left || fx > right || fy < top || fy > bottom {
        return false;
    }

    let r = radius.clamp(0, rect.width.min(rect.height) / 2) as f32;
    let cx = fx.clamp(left + r, right - r);
    let cy = fy.clamp(top + r, bottom - r);
    let (ex, ey) = (fx - cx, fy - cy);
    ex * ex + ey * ey <= r * r
}

impl Surface for SoftwareSurface {
    fn width(&self) -> i32 {
        self.bitmap.width()
    }

    fn height(&self) -> i32 {
        self.bitmap.height()
    }

    fn create_compatible(&self, width: i32, height: i32) -> Box<dyn Surface> {
        Box::new(Self {
            bitmap: Bitmap::new(width, height, Color::BLACK),
            clip: None,
            fonts: Rc::clone(&self.fonts),
            log: self.log.clone(),
        })
    }

    fn clip(&self) -> Option<Rect> {
        self.clip
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn draw(&mut self, command: &DrawCommand) {
        if let Some(log) = &self.log {
            log.borrow_mut().push(command.clone());
        }

        match command {
            DrawCommand::Line { from, to, width, color } => self.line(*from, *to, *width, *color),
            DrawCommand::FillRect { rect, color } => self.fill(*rect, *color),
            DrawCommand::FrameRect { rect, width, color } => {
                let w = (*width).max(1);
                self.fill(Rect::new(rect.x, rect.y, rect.width, w), *color);
                self.fill(Rect::new(rect.x, rect.bottom() - w, rect.width, w), *color);
                self.fill(Rect::new(rect.x, rect.y, w, rect.height), *color);
                self.fill(Rect::new(rect.right() - w, rect.y, w, rect.height), *color);
            }
            DrawCommand::FillRoundRect { rect, radius, color } => {
                let (rect, radius) = (*rect, *radius);
                self.fill_shape(rect, *color, |x, y| inside_rounded(rect, radius, x, y));
            }
            DrawCommand::RoundRect { rect, width, radius, color } => {
                let (outer, radius) = (*rect, *radius);
                let w = (*width).max(1);
                let inner = outer.inset(w);
                self.fill_shape(outer, *color, |x, y| {
                    inside_rounded(outer, radius, x, y)
                        && !inside_rounded(inner, (radius - w).max(0), x, y)
                });
            }
            DrawCommand::Text { .. } => {}
            DrawCommand::Image { rect, bitmap } => self.stretch_blit(*rect, bitmap),
        }
    }

    fn snapshot(&self, region: Rect) -> Bitmap {
        let mut out = Bitmap::new(region.width, region.height, Color::BLACK);
        for y in 0..region.height.max(0) {
            for x in 0..region.width.max(0) {
                if let Some(px) = self.bitmap.get(region.x + x, region.y + y) {
                    out.set(x, y, px);
                }
            }
        }
        out
    }

    fn stretch_blit(&mut self, dst: Rect, bitmap: &Bitmap) {
        let Some(area) = self.visible(dst) else {
            return;
        };
        let scaled = bitmap.resample(dst.width, dst.height);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(px) = scaled.get(x - dst.x, y - dst.y) {
                    self.bitmap.set(x, y, px);
                }
            }
        }
    }

    fn has_font(&self, family: &str) -> bool {
        self.fonts.is_empty() || self.fonts.iter().any(|f| f == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_respects_clip() {
        let mut surface = SoftwareSurface::new(10, 10);
        surface.set_clip(Some(Rect::new(0, 0, 5, 10)));
        surface.draw(&DrawCommand::FillRect {
            rect: Rect::new(0, 0, 10, 10),
            color: Color::WHITE,
        });

        assert_eq!(surface.pixel(4, 4), Some(Color::WHITE));
        assert_eq!(surface.pixel(5, 4), Some(Color::BLACK));
    }

    #[test]
    fn test_round_rect_leaves_corners() {
        let mut surface = SoftwareSurface::new(20, 20);
        surface.draw(&DrawCommand::FillRoundRect {
            rect: Rect::new(0, 0, 20, 20),
            radius: 8,
            color: Color::WHITE,
        });

        assert_eq!(surface.pixel(0, 0), Some(Color::BLACK));
        assert_eq!(surface.pixel(10, 10), Some(Color::WHITE));
        assert_eq!(surface.pixel(10, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_compatible_surfaces_share_log() {
        let surface = SoftwareSurface::new(4, 4).with_recording();
        let mut child = surface.create_compatible(8, 8);
        child.draw(&DrawCommand::FillRect {
            rect: Rect::new(0, 0, 1, 1),
            color: Color::WHITE,
        });

        let log = surface.command_log().unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_font_lookup() {
        let surface = SoftwareSurface::new(1, 1).with_fonts(["sans"]);
        assert!(surface.has_font("sans"));
        assert!(!surface.has_font("SimSun"));
    }
}
