//! Determinate progress bar.

use minui_core::{names, Rect, Style};

use super::core::{Widget, WidgetBase};
use crate::painter::Painter;

/// Horizontal bar filled proportionally to a step in `0.0..=1.0`.
#[derive(Debug)]
pub struct Progress {
    base: WidgetBase,
    step: f32,
}

impl Progress {
    /// Creates an empty progress bar with the `progress` style.
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self {
            base: WidgetBase::new(rect, names::PROGRESS),
            step: 0.0,
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> f32 {
        self.step
    }

    /// Sets the step. Values outside `0.0..=1.0` (and NaN) are ignored.
    pub fn set_step(&mut self, step: f32) -> bool {
        if !(0.0..=1.0).contains(&step) {
            return false;
        }
        self.step = step;
        self.base.update();
        true
    }

    /// The filled part of the bar.
    #[must_use]
    pub fn filled_rect(&self) -> Rect {
        let rect = self.base.rect;
        Rect::new(rect.x, rect.y, (rect.width as f32 * self.step) as i32, rect.height)
    }
}

impl Widget for Progress {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&self, painter: &mut Painter<'_>, style: &Style) {
        let rect = self.base.rect;
        let filled = self.filled_rect();
        painter.with_aa(rect, |aa| {
            aa.fill_round_rect(rect, style.radius, style.background_color);
            if filled.width > 0 {
                aa.fill_round_rect(filled, style.radius, style.color);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_range() {
        let mut bar = Progress::new(Rect::new(0, 0, 200, 10));
        assert!(bar.set_step(0.25));
        assert!(!bar.set_step(1.5));
        assert!(!bar.set_step(-0.1));
        assert!(!bar.set_step(f32::NAN));
        assert!((bar.step() - 0.25).abs() < f32::EPSILON);
        assert_eq!(bar.filled_rect(), Rect::new(0, 0, 50, 10));
    }
}
