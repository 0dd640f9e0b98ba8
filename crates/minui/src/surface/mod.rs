//! Drawing surfaces and the draw-command boundary.
//!
//! The toolkit never touches a native device context directly. Everything
//! it draws is an opaque [`DrawCommand`] issued against a [`Surface`]:
//!
//! ```text
//! ┌──────────┐  DrawCommand   ┌─────────────────────────┐
//! │ Painter  │ ─────────────> │ Surface (native / soft) │
//! │          │ <── snapshot ─ │                         │
//! │          │ ─ stretch_blit>│                         │
//! └──────────┘                └─────────────────────────┘
//! ```
//!
//! `snapshot` and `stretch_blit` move pixels between surfaces; they are
//! what the painter uses to seed and composite its supersampled buffer.

mod software;

use bytemuck::{cast_slice, try_cast_slice};
use minui_core::{Color, Point, Rect};

pub use software::SoftwareSurface;

/// A primitive drawing operation, in the target surface's pixel space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Straight line.
    Line {
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
        /// Stroke width in pixels.
        width: i32,
        /// Stroke color.
        color: Color,
    },
    /// Filled rectangle.
    FillRect {
        /// Bounds.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// Rectangle outline.
    FrameRect {
        /// Bounds.
        rect: Rect,
        /// Stroke width in pixels.
        width: i32,
        /// Stroke color.
        color: Color,
    },
    /// Filled rectangle with rounded corners.
    FillRoundRect {
        /// Bounds.
        rect: Rect,
        /// Corner radius in pixels.
        radius: i32,
        /// Fill color.
        color: Color,
    },
    /// Rounded rectangle outline.
    RoundRect {
        /// Bounds.
        rect: Rect,
        /// Stroke width in pixels.
        width: i32,
        /// Corner radius in pixels.
        radius: i32,
        /// Stroke color.
        color: Color,
    },
    /// Single line of text, centered in `rect`.
    Text {
        /// Layout box.
        rect: Rect,
        /// UTF-8 text.
        text: String,
        /// Text color.
        color: Color,
        /// Font size in pixels.
        font_size: i32,
        /// Family to use, or None for the surface default.
        font: Option<String>,
    },
    /// Decoded bitmap stretched into `rect`.
    Image {
        /// Destination bounds.
        rect: Rect,
        /// Pixels.
        bitmap: Bitmap,
    },
}

/// A target for draw commands and pixel transfers.
pub trait Surface {
    /// Width in pixels.
    fn width(&self) -> i32;

    /// Height in pixels.
    fn height(&self) -> i32;

    /// Returns the full surface rectangle.
    fn bounds(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    /// Allocates an off-screen surface with the same pixel format.
    fn create_compatible(&self, width: i32, height: i32) -> Box<dyn Surface>;

    /// Returns the active clip rectangle.
    fn clip(&self) -> Option<Rect>;

    /// Restricts subsequent drawing and blits to `clip`.
    fn set_clip(&mut self, clip: Option<Rect>);

    /// Executes a draw command.
    fn draw(&mut self, command: &DrawCommand);

    /// Copies the pixels under `region`. Pixels outside the surface read as black.
    fn snapshot(&self, region: Rect) -> Bitmap;

    /// Resamples `bitmap` into `dst`, honoring the clip.
    fn stretch_blit(&mut self, dst: Rect, bitmap: &Bitmap);

    /// Returns true if the surface can materialize a font of this family.
    fn has_font(&self, family: &str) -> bool {
        let _ = family;
        true
    }
}

/// A decoded RGB pixel buffer, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: i32,
    height: i32,
    pixels: Vec<Color>,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    /// Creates a bitmap filled with one color.
    #[must_use]
    pub fn new(width: i32, height: i32, fill: Color) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![fill; (width * height) as usize],
        }
    }

    /// Wraps a pixel vector. Returns None if the length doesn't match.
    #[must_use]
    pub fn from_pixels(width: i32, height: i32, pixels: Vec<Color>) -> Option<Self> {
        if width < 0 || height < 0 || pixels.len() != (width * height) as usize {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    /// Builds a bitmap from tightly packed RGB bytes.
    #[must_use]
    pub fn from_rgb_bytes(width: i32, height: i32, bytes: &[u8]) -> Option<Self> {
        let pixels: &[Color] = try_cast_slice(bytes).ok()?;
        Self::from_pixels(width, height, pixels.to_vec())
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Returns true if the bitmap has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major pixel slice.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Packed RGB bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        cast_slice(&self.pixels)
    }

    /// Returns the pixel at `(x, y)`, or None outside the bitmap.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Writes a pixel. Writes outside the bitmap are ignored.
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    /// Resamples to a new size with a box filter.
    ///
    /// Shrinking averages every source pixel that a destination pixel
    /// covers; enlarging replicates the covering source pixel. An integer
    /// enlarge followed by the matching shrink reproduces the original.
    #[must_use]
    pub fn resample(&self, width: i32, height: i32) -> Self {
        if width == self.width && height == self.height {
            return self.clone();
        }
        if self.is_empty() || width <= 0 || height <= 0 {
            return Self::new(width, height, Color::BLACK);
        }

        let mut pixels = Vec::with_capacity((width * height) as usize);
        for dy in 0..height {
            let (y0, y1) = source_span(dy, height, self.height);
            for dx in 0..width {
                let (x0, x1) = source_span(dx, width, self.width);
                pixels.push(self.average(x0, x1, y0, y1));
            }
        }

        Self { width, height, pixels }
    }

    fn average(&self, x0: i32, x1: i32, y0: i32, y1: i32) -> Color {
        let (mut r, mut g, mut b, mut n) = (0u32, 0u32, 0u32, 0u32);
        for y in y0..y1 {
            let row = (y * self.width) as usize;
            for px in &self.pixels[row + x0 as usize..row + x1 as usize] {
                r += u32::from(px.r);
                g += u32::from(px.g);
                b += u32::from(px.b);
                n += 1;
            }
        }
        let n = n.max(1);
        Color::rgb(
            ((r + n / 2) / n) as u8,
            ((g + n / 2) / n) as u8,
            ((b + n / 2) / n) as u8,
        )
    }
}

/// Source pixel range `[start, end)` covered by destination pixel `d`.
fn source_span(d: i32, dst: i32, src: i32) -> (i32, i32) {
    let (d, dst, src) = (i64::from(d), i64::from(dst), i64::from(src));
    let start = d * src / dst;
    let end = ((d + 1) * src + dst - 1) / dst;
    let end = end.max(start + 1).min(src);
    (start as i32, end as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_up_then_down_is_identity() {
        let mut bmp = Bitmap::new(3, 2, Color::WHITE);
        bmp.set(1, 0, Color::rgb(10, 20, 30));
        bmp.set(2, 1, Color::rgb(200, 0, 5));

        let up = bmp.resample(12, 8);
        assert_eq!(up.get(4, 0), Some(Color::rgb(10, 20, 30)));
        assert_eq!(up.resample(3, 2), bmp);
    }

    #[test]
    fn test_resample_down_averages() {
        let mut bmp = Bitmap::new(2, 2, Color::BLACK);
        bmp.set(0, 0, Color::WHITE);
        bmp.set(1, 1, Color::WHITE);

        let one = bmp.resample(1, 1);
        assert_eq!(one.get(0, 0), Some(Color::rgb(128, 128, 128)));
    }

    #[test]
    fn test_rgb_bytes_view() {
        let bytes = [1u8, 2, 3, 4, 5, 6];
        let bmp = Bitmap::from_rgb_bytes(2, 1, &bytes).unwrap();
        assert_eq!(bmp.get(1, 0), Some(Color::rgb(4, 5, 6)));
        assert_eq!(bmp.as_bytes(), &bytes);
        assert!(Bitmap::from_rgb_bytes(3, 1, &bytes).is_none());
    }
}
