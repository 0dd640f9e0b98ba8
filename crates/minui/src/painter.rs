//! # Supersampled Painter
//!
//! A [`Painter`] is a scoped compositor. It renders into a private working
//! surface at a higher pixel density than its target and downsamples back
//! when it goes out of scope:
//!
//! ```text
//!   new():   target ──snapshot(region)──> resample ↑ ──> working surface
//!   draw_*:  logical rect ─offset(-origin)─scale(ss)─> working surface
//!   drop():  working surface ──resample ↓──> target region
//! ```
//!
//! `ss` is never lower than the DPI scale, so a painter at `ss == dpi`
//! draws at device density and the composite is a straight copy.
//!
//! ## Nested anti-aliasing
//!
//! [`Painter::with_aa`] opens a child painter whose target is this
//! painter's working surface, oversampled by the AA factor. Only the
//! requested sub-rectangle pays the extra cost.
//!
//! ## Text
//!
//! Glyph rendering already anti-aliases. When the working surface is
//! denser than the device, text is queued in device coordinates on the
//! outermost painter, including text drawn through [`Painter::with_aa`].
//! The queue is flushed whenever the clip changes and on drop: the working
//! surface is composited, the text is drawn on the device surface, and the
//! working surface is reseeded from the result. A widget's text therefore
//! stays below every widget painted after it.

use minui_core::{Color, Point, Rect, Style, DEFAULT_AA_FACTOR};

use crate::image::ImageDecoder;
use crate::surface::{Bitmap, DrawCommand, Surface};

/// Text queued for the target, with the target-space clip active when it was drawn.
struct DeferredText {
    clip: Option<Rect>,
    command: DrawCommand,
}

/// Scoped, optionally supersampled drawing context.
pub struct Painter<'a> {
    /// Surface this painter composites into on drop.
    target: &'a mut dyn Surface,
    /// Destination of the composite, in target pixels.
    target_region: Rect,
    /// Target pixels per logical unit.
    target_scale: f32,
    /// Private working surface.
    work: Box<dyn Surface>,
    /// Logical rectangle this painter covers.
    rect: Rect,
    /// Working pixels per logical unit.
    scale: f32,
    /// Device pixels per logical unit.
    dpi: f32,
    /// Oversampling for nested AA passes.
    aa_factor: f32,
    decoder: &'a dyn ImageDecoder,
    /// Logical clip rectangle.
    clip: Option<Rect>,
    /// Logical clip of the enclosing painters.
    outer_clip: Option<Rect>,
    /// Logical origin and device pixel offset of the outermost painter.
    device_origin: Point,
    device_offset: Point,
    deferred: Vec<DeferredText>,
    /// Queue of the outermost painter, for nested painters.
    sink: Option<&'a mut Vec<DeferredText>>,
}

impl<'a> Painter<'a> {
    /// Opens a painter over `rect` (logical units) of a device surface.
    ///
    /// `supersample` is clamped up to `dpi`. The working surface is seeded
    /// with the current target pixels under `rect.scale(dpi)`, so drawing
    /// composes over what is already there.
    pub fn new(
        target: &'a mut dyn Surface,
        rect: Rect,
        dpi: f32,
        supersample: f32,
        decoder: &'a dyn ImageDecoder,
    ) -> Self {
        let dpi = sanitize_scale(dpi);
        let region = rect.scale(dpi);
        Self::compose(target, region, dpi, rect, supersample, dpi, decoder)
    }

    fn compose(
        target: &'a mut dyn Surface,
        target_region: Rect,
        target_scale: f32,
        rect: Rect,
        supersample: f32,
        dpi: f32,
        decoder: &'a dyn ImageDecoder,
    ) -> Self {
        let scale = sanitize_scale(supersample).max(target_scale);
        let size = Rect::from_size(rect.width, rect.height).scale(scale);

        let mut work = target.create_compatible(size.width, size.height);
        let seed = target.snapshot(target_region);
        let full = work.bounds();
        work.stretch_blit(full, &seed);

        Self {
            target,
            target_region,
            target_scale,
            work,
            rect,
            scale,
            dpi,
            aa_factor: DEFAULT_AA_FACTOR,
            decoder,
            clip: None,
            outer_clip: None,
            device_origin: rect.origin(),
            device_offset: target_region.origin(),
            deferred: Vec::new(),
            sink: None,
        }
    }

    /// Sets the oversampling used by [`Painter::with_aa`].
    #[must_use]
    pub fn with_aa_factor(mut self, factor: f32) -> Self {
        self.aa_factor = sanitize_scale(factor);
        self
    }

    /// Logical rectangle covered by this painter.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// Working-surface pixels per logical unit.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Device pixels per logical unit.
    #[must_use]
    pub const fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Size of the working surface in pixels.
    #[must_use]
    pub fn working_size(&self) -> (i32, i32) {
        (self.work.width(), self.work.height())
    }

    /// Logical rect → working surface. Translate first, then scale.
    fn to_work(&self, rect: Rect) -> Rect {
        rect.relative_to(self.rect.origin()).scale(self.scale)
    }

    fn to_work_point(&self, pt: Point) -> Point {
        Point::new(pt.x - self.rect.x, pt.y - self.rect.y).scale(self.scale)
    }

    /// Logical rect → device surface of the outermost painter.
    fn to_device(&self, rect: Rect) -> Rect {
        rect.relative_to(self.device_origin)
            .scale(self.dpi)
            .offset(self.device_offset.x, self.device_offset.y)
    }

    fn to_work_len(&self, len: i32) -> i32 {
        ((len as f32 * self.scale) as i32).max(1)
    }

    fn supersampled(&self) -> bool {
        self.scale > self.dpi + f32::EPSILON
    }

    /// Clip in effect for this painter and its ancestors. `Err` when nothing is visible.
    fn effective_clip(&self) -> Result<Option<Rect>, ()> {
        match (self.outer_clip, self.clip) {
            (Some(outer), Some(inner)) => outer.intersection(&inner).map(Some).ok_or(()),
            (Some(clip), None) | (None, Some(clip)) if clip.is_empty() => Err(()),
            (outer, inner) => Ok(inner.or(outer)),
        }
    }

    /// Restricts drawing to `rect` until the clip is changed.
    ///
    /// Queued text is flushed first, so it stays below anything drawn
    /// under the new clip.
    pub fn set_clip(&mut self, rect: Rect) {
        self.flush_text();
        self.clip = Some(rect);
        let clip = self.to_work(rect);
        self.work.set_clip(Some(clip));
    }

    /// Removes the clip.
    pub fn clear_clip(&mut self) {
        self.flush_text();
        self.clip = None;
        self.work.set_clip(None);
    }

    /// Draws a straight line.
    pub fn draw_line(&mut self, from: Point, to: Point, width: i32, color: Color) {
        let command = DrawCommand::Line {
            from: self.to_work_point(from),
            to: self.to_work_point(to),
            width: self.to_work_len(width),
            color,
        };
        self.work.draw(&command);
    }

    /// Fills a rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let command = DrawCommand::FillRect {
            rect: self.to_work(rect),
            color,
        };
        self.work.draw(&command);
    }

    /// Outlines a rectangle.
    pub fn frame_rect(&mut self, rect: Rect, width: i32, color: Color) {
        let command = DrawCommand::FrameRect {
            rect: self.to_work(rect),
            width: self.to_work_len(width),
            color,
        };
        self.work.draw(&command);
    }

    /// Fills a rectangle with rounded corners.
    pub fn fill_round_rect(&mut self, rect: Rect, radius: i32, color: Color) {
        let command = DrawCommand::FillRoundRect {
            rect: self.to_work(rect),
            radius: (radius as f32 * self.scale) as i32,
            color,
        };
        self.work.draw(&command);
    }

    /// Outlines a rectangle with rounded corners.
    pub fn round_rect(&mut self, rect: Rect, width: i32, radius: i32, color: Color) {
        let command = DrawCommand::RoundRect {
            rect: self.to_work(rect),
            width: self.to_work_len(width),
            radius: (radius as f32 * self.scale) as i32,
            color,
        };
        self.work.draw(&command);
    }

    /// Draws a single centered line of text with the style's color and font.
    ///
    /// The font is the first family in `style.font_family` the surface can
    /// materialize, or the surface default if none can.
    pub fn draw_text(&mut self, rect: Rect, text: &str, style: &Style) {
        let font = style
            .font_family
            .iter()
            .find(|family| self.work.has_font(family))
            .cloned();

        if self.supersampled() {
            let Ok(clip) = self.effective_clip() else {
                return;
            };
            let command = DrawCommand::Text {
                rect: self.to_device(rect),
                text: text.to_string(),
                color: style.color,
                font_size: (style.font_size as f32 * self.dpi) as i32,
                font,
            };
            let clip = clip.map(|c| self.to_device(c));
            let text = DeferredText { clip, command };
            match self.sink.as_deref_mut() {
                Some(queue) => queue.push(text),
                None => self.deferred.push(text),
            }
        } else {
            let command = DrawCommand::Text {
                rect: self.to_work(rect),
                text: text.to_string(),
                color: style.color,
                font_size: (style.font_size as f32 * self.scale) as i32,
                font,
            };
            self.work.draw(&command);
        }
    }

    /// Stretches a decoded bitmap into `rect`.
    pub fn draw_image(&mut self, rect: Rect, bitmap: &Bitmap) {
        let command = DrawCommand::Image {
            rect: self.to_work(rect),
            bitmap: bitmap.clone(),
        };
        self.work.draw(&command);
    }

    /// Decodes `data` and stretches it into `rect`.
    ///
    /// Undecodable data is skipped; the area stays as it was.
    pub fn draw_image_data(&mut self, rect: Rect, data: &[u8]) {
        match self.decoder.decode(data) {
            Ok(bitmap) => {
                let command = DrawCommand::Image {
                    rect: self.to_work(rect),
                    bitmap,
                };
                self.work.draw(&command);
            }
            Err(e) => {
                tracing::debug!("skipping image at {:?}: {}", rect, e);
            }
        }
    }

    /// Runs `f` with a nested painter over `rect`, oversampled by the AA factor.
    ///
    /// The nested painter composites into this painter's working surface
    /// when `f` returns, clipped by this painter's current clip. Its text
    /// joins the outermost painter's queue.
    pub fn with_aa<R>(&mut self, rect: Rect, f: impl FnOnce(&mut Painter<'_>) -> R) -> R {
        let region = self.to_work(rect);
        let outer_clip = self
            .effective_clip()
            .unwrap_or(Some(Rect::new(rect.x, rect.y, 0, 0)));
        let sink = match self.sink.as_deref_mut() {
            Some(queue) => queue,
            None => &mut self.deferred,
        };
        let mut nested = Painter::compose(
            &mut *self.work,
            region,
            self.scale,
            rect,
            self.aa_factor.max(self.scale),
            self.dpi,
            self.decoder,
        );
        nested.aa_factor = self.aa_factor;
        nested.outer_clip = outer_clip;
        nested.device_origin = self.device_origin;
        nested.device_offset = self.device_offset;
        nested.sink = Some(sink);
        f(&mut nested)
    }

    /// Composites, draws queued text on the device, then reseeds the
    /// working surface so later drawing lands above the text.
    fn flush_text(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        self.composite();

        let seed = self.target.snapshot(self.target_region);
        let clip = self.work.clip();
        let full = self.work.bounds();
        self.work.set_clip(None);
        self.work.stretch_blit(full, &seed);
        self.work.set_clip(clip);
    }

    fn composite(&mut self) {
        let pixels = self.work.snapshot(self.work.bounds());
        self.target.stretch_blit(self.target_region, &pixels);

        if self.deferred.is_empty() {
            return;
        }

        let saved = self.target.clip();
        for text in self.deferred.drain(..) {
            let clip = match (saved, text.clip) {
                (Some(outer), Some(inner)) => match outer.intersection(&inner) {
                    Some(clip) => Some(clip),
                    None => continue,
                },
                (outer, inner) => inner.or(outer),
            };
            self.target.set_clip(clip);
            self.target.draw(&text.command);
        }
        self.target.set_clip(saved);
    }
}

impl Drop for Painter<'_> {
    fn drop(&mut self) {
        self.composite();
    }
}

fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::encode_bmp;
    use crate::image::BmpDecoder;
    use crate::surface::SoftwareSurface;

    fn commands(surface: &SoftwareSurface) -> Vec<DrawCommand> {
        surface.command_log().unwrap().borrow().clone()
    }

    #[test]
    fn test_supersample_clamped_to_dpi() {
        let mut surface = SoftwareSurface::new(40, 40);
        let painter = Painter::new(&mut surface, Rect::new(0, 0, 20, 20), 2.0, 1.0, &BmpDecoder);
        assert!((painter.scale() - 2.0).abs() < f32::EPSILON);
        assert_eq!(painter.working_size(), (40, 40));
    }

    #[test]
    fn test_translate_before_scale() {
        let mut surface = SoftwareSurface::new(100, 100).with_recording();
        {
            let mut painter =
                Painter::new(&mut surface, Rect::new(10, 10, 30, 30), 1.0, 3.0, &BmpDecoder);
            painter.fill_rect(Rect::new(20, 20, 5, 5), Color::WHITE);
        }

        assert_eq!(
            commands(&surface)[0],
            DrawCommand::FillRect {
                rect: Rect::new(30, 30, 15, 15),
                color: Color::WHITE,
            }
        );
    }

    #[test]
    fn test_composite_on_drop() {
        let mut surface = SoftwareSurface::new(40, 40);
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 20, 20), 2.0, 4.0, &BmpDecoder);
            painter.fill_rect(Rect::new(5, 5, 10, 10), Color::WHITE);
            assert_eq!(painter.working_size(), (80, 80));
        }

        // Logical (5,5)-(15,15) at DPI 2 is device (10,10)-(30,30).
        assert_eq!(surface.pixel(10, 10), Some(Color::WHITE));
        assert_eq!(surface.pixel(29, 29), Some(Color::WHITE));
        assert_eq!(surface.pixel(9, 9), Some(Color::BLACK));
        assert_eq!(surface.pixel(30, 30), Some(Color::BLACK));
    }

    #[test]
    fn test_seeded_from_existing_pixels() {
        let mut surface = SoftwareSurface::new(20, 20);
        surface.clear(Color::rgb(10, 200, 30));
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 20, 20), 1.0, 2.0, &BmpDecoder);
            painter.fill_rect(Rect::new(0, 0, 5, 5), Color::WHITE);
        }

        assert_eq!(surface.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(surface.pixel(15, 15), Some(Color::rgb(10, 200, 30)));
    }

    #[test]
    fn test_composite_runs_on_early_return() {
        fn draw(painter: &mut Painter<'_>, bail: bool) {
            painter.fill_rect(Rect::new(0, 0, 4, 4), Color::WHITE);
            if bail {
                return;
            }
            painter.fill_rect(Rect::new(4, 4, 4, 4), Color::WHITE);
        }

        let mut surface = SoftwareSurface::new(8, 8);
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 8, 8), 1.0, 2.0, &BmpDecoder);
            draw(&mut painter, true);
        }
        assert_eq!(surface.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(surface.pixel(5, 5), Some(Color::BLACK));
    }

    #[test]
    fn test_clip_limits_drawing() {
        let mut surface = SoftwareSurface::new(20, 20);
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 20, 20), 1.0, 1.0, &BmpDecoder);
            painter.set_clip(Rect::new(0, 0, 10, 20));
            painter.fill_rect(Rect::new(0, 0, 20, 20), Color::WHITE);
        }
        assert_eq!(surface.pixel(9, 5), Some(Color::WHITE));
        assert_eq!(surface.pixel(10, 5), Some(Color::BLACK));
    }

    #[test]
    fn test_with_aa_oversamples_sub_region() {
        let mut surface = SoftwareSurface::new(40, 40).with_recording();
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 40, 40), 1.0, 1.0, &BmpDecoder);
            painter.with_aa(Rect::new(10, 10, 10, 10), |aa| {
                assert!((aa.scale() - DEFAULT_AA_FACTOR).abs() < f32::EPSILON);
                assert_eq!(aa.working_size(), (40, 40));
                aa.fill_round_rect(Rect::new(10, 10, 10, 10), 3, Color::WHITE);
            });
        }

        assert_eq!(
            commands(&surface)[0],
            DrawCommand::FillRoundRect {
                rect: Rect::new(0, 0, 40, 40),
                radius: 12,
                color: Color::WHITE,
            }
        );
        assert_eq!(surface.pixel(15, 15), Some(Color::WHITE));
        assert_eq!(surface.pixel(25, 25), Some(Color::BLACK));
    }

    #[test]
    fn test_text_not_oversampled() {
        let mut surface = SoftwareSurface::new(40, 40)
            .with_fonts(["sans"])
            .with_recording();
        let style = Style::light().with_font_size(10).with_font_families(["SimSun", "sans"]);
        let log = surface.command_log().unwrap();
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 20, 20), 2.0, 6.0, &BmpDecoder);
            painter.set_clip(Rect::new(0, 0, 10, 10));
            painter.draw_text(Rect::new(1, 1, 8, 4), "hi", &style);
            assert!(log.borrow().is_empty(), "text waits for the composite");
        }

        let log = commands(&surface);
        assert_eq!(
            log.last(),
            Some(&DrawCommand::Text {
                rect: Rect::new(2, 2, 16, 8),
                text: "hi".to_string(),
                color: style.color,
                font_size: 20,
                font: Some("sans".to_string()),
            })
        );
        assert_eq!(surface.clip(), None, "target clip restored");
    }

    #[test]
    fn test_text_stays_below_later_clip_scopes() {
        let mut surface = SoftwareSurface::new(40, 40).with_recording();
        let log = surface.command_log().unwrap();
        let style = Style::light().with_font_size(8);
        let upper = Color::rgb(200, 10, 10);
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 40, 40), 1.0, 2.0, &BmpDecoder);
            painter.set_clip(Rect::new(0, 0, 20, 20));
            painter.draw_text(Rect::new(0, 0, 20, 20), "lower", &style);
            painter.set_clip(Rect::new(10, 10, 20, 20));
            painter.fill_rect(Rect::new(10, 10, 20, 20), upper);
        }

        let log = log.borrow();
        let text = log
            .iter()
            .position(|c| matches!(c, DrawCommand::Text { .. }))
            .unwrap();
        let fill = log
            .iter()
            .position(|c| matches!(c, DrawCommand::FillRect { color, .. } if *color == upper))
            .unwrap();
        assert!(text < fill, "lower text drawn before the upper fill");
        assert_eq!(surface.pixel(15, 15), Some(upper));
        assert_eq!(surface.pixel(5, 5), Some(Color::BLACK), "reseed keeps earlier pixels");
    }

    #[test]
    fn test_nested_text_reaches_device() {
        let mut surface = SoftwareSurface::new(80, 80).with_recording();
        let style = Style::light().with_font_size(10);
        {
            let mut painter =
                Painter::new(&mut surface, Rect::new(0, 0, 40, 40), 2.0, 3.0, &BmpDecoder);
            painter.set_clip(Rect::new(5, 5, 20, 20));
            painter.with_aa(Rect::new(10, 10, 20, 20), |aa| {
                aa.draw_text(Rect::new(10, 10, 20, 10), "ok", &style);
            });
        }

        assert_eq!(
            commands(&surface).last(),
            Some(&DrawCommand::Text {
                rect: Rect::new(20, 20, 40, 20),
                text: "ok".to_string(),
                color: style.color,
                font_size: 20,
                font: style.font_family.first().cloned(),
            })
        );
    }

    #[test]
    fn test_nested_text_outside_outer_clip_dropped() {
        let mut surface = SoftwareSurface::new(40, 40).with_recording();
        let style = Style::light();
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 40, 40), 1.0, 2.0, &BmpDecoder);
            painter.set_clip(Rect::new(0, 0, 5, 5));
            painter.with_aa(Rect::new(20, 20, 10, 10), |aa| {
                aa.set_clip(Rect::new(20, 20, 10, 10));
                aa.draw_text(Rect::new(20, 20, 10, 10), "hidden", &style);
            });
        }
        assert!(!commands(&surface)
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { .. })));
    }

    #[test]
    fn test_bad_image_data_skipped() {
        let mut surface = SoftwareSurface::new(10, 10).with_recording();
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 10, 10), 1.0, 1.0, &BmpDecoder);
            painter.draw_image_data(Rect::new(0, 0, 10, 10), b"not an image");
        }
        assert!(commands(&surface).is_empty());
        assert_eq!(surface.pixel(5, 5), Some(Color::BLACK));
    }

    #[test]
    fn test_image_data_stretched() {
        let red = Color::rgb(255, 0, 0);
        let data = encode_bmp(2, &[vec![red, red], vec![red, red]]);
        let mut surface = SoftwareSurface::new(10, 10);
        {
            let mut painter = Painter::new(&mut surface, Rect::new(0, 0, 10, 10), 1.0, 1.0, &BmpDecoder);
            painter.draw_image_data(Rect::new(2, 2, 6, 6), &data);
        }
        assert_eq!(surface.pixel(2, 2), Some(red));
        assert_eq!(surface.pixel(7, 7), Some(red));
        assert_eq!(surface.pixel(8, 8), Some(Color::BLACK));
    }
}
