//! Push button with hover and press feedback.
//!
//! ```text
//!            enter              press
//!   Normal ────────> Hover ──────────> Press
//!     ^     <────────   ^  <──────────   │
//!     │       leave     │    release     │
//!     │                 │   (click!)     │
//!     └─────────────────┴──── leave ─────┘
//! ```
//!
//! A click fires only on a release that follows a press, while the pointer
//! is still over the button.

use std::rc::Rc;

use minui_core::{names, Rect, Style, HOVER_SUFFIX, PRESS_SUFFIX};

use super::core::{ClickHandler, Widget, WidgetBase, WidgetResponse};
use crate::painter::Painter;

/// Visual state of a [`Button`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonState {
    /// Pointer elsewhere.
    #[default]
    Normal,
    /// Pointer over the button.
    Hover,
    /// Button held down.
    Press,
}

impl ButtonState {
    /// Style suffix for this state.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Hover => HOVER_SUFFIX,
            Self::Press => PRESS_SUFFIX,
        }
    }
}

/// A clickable button.
pub struct Button {
    base: WidgetBase,
    text: String,
    state: ButtonState,
    on_click: Option<ClickHandler>,
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button")
            .field("base", &self.base)
            .field("text", &self.text)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Button {
    /// Creates a button with the `button` style.
    #[must_use]
    pub fn new(rect: Rect, text: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(rect, names::BUTTON),
            text: text.into(),
            state: ButtonState::Normal,
            on_click: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ButtonState {
        self.state
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

    /// Sets the click callback.
    pub fn set_on_click(&mut self, f: impl Fn() + 'static) {
        self.on_click = Some(Rc::new(f));
    }

    fn transition(&mut self, state: ButtonState) -> WidgetResponse {
        if self.state == state {
            return WidgetResponse::default();
        }
        self.state = state;
        self.base.update();
        WidgetResponse::CHANGED
    }
}

impl Widget for Button {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&self, painter: &mut Painter<'_>, style: &Style) {
        let rect = self.base.rect;
        if style.radius > 0 {
            painter.with_aa(rect, |aa| {
                aa.fill_round_rect(rect, style.radius, style.background_color);
            });
        } else {
            painter.fill_rect(rect, style.background_color);
        }
        if !self.text.is_empty() {
            painter.draw_text(rect, &self.text, style);
        }
    }

    fn on_mouse_move(&mut self, leave: bool) -> WidgetResponse {
        let next = if leave { ButtonState::Normal } else { ButtonState::Hover };
        self.transition(next)
    }

    fn on_mouse_button(&mut self, pressed: bool) -> WidgetResponse {
        if pressed {
            return self.transition(ButtonState::Press);
        }
        let clicked = self.state == ButtonState::Press;
        let response = self.transition(ButtonState::Hover);
        WidgetResponse { clicked, ..response }
    }

    fn click_handler(&self) -> Option<ClickHandler> {
        self.on_click.clone()
    }

    fn state_suffix(&self) -> &'static str {
        self.state.suffix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_fires_on_release_only() {
        let mut button = Button::new(Rect::new(0, 0, 10, 10), "ok");
        button.on_mouse_move(false);
        assert_eq!(button.state(), ButtonState::Hover);

        let press = button.on_mouse_button(true);
        assert_eq!(button.state(), ButtonState::Press);
        assert!(!press.clicked);

        let release = button.on_mouse_button(false);
        assert_eq!(button.state(), ButtonState::Hover);
        assert!(release.clicked);
    }

    #[test]
    fn test_release_without_press_is_not_a_click() {
        let mut button = Button::new(Rect::new(0, 0, 10, 10), "ok");
        button.on_mouse_move(false);
        assert!(!button.on_mouse_button(false).clicked);
    }

    #[test]
    fn test_leave_cancels_press() {
        let mut button = Button::new(Rect::new(0, 0, 10, 10), "ok");
        button.on_mouse_move(false);
        button.on_mouse_button(true);
        button.on_mouse_move(true);
        assert_eq!(button.state(), ButtonState::Normal);
        assert!(!button.on_mouse_button(false).clicked);
    }

    #[test]
    fn test_state_suffix_selects_style() {
        let mut button = Button::new(Rect::new(0, 0, 10, 10), "ok");
        assert_eq!(button.state_suffix(), "");
        button.on_mouse_move(false);
        assert_eq!(button.state_suffix(), ":hover");
        button.on_mouse_button(true);
        assert_eq!(button.state_suffix(), ":press");
    }
}
