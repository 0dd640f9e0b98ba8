//! Core widget types and traits.

use std::cell::RefCell;
use std::rc::Rc;

use minui_core::{Rect, Style, StyleRegistry};

use crate::painter::Painter;

/// A widget shared between its owner and the window that dispatches to it.
pub type Shared<W> = Rc<RefCell<W>>;

/// Type-erased widget handle as stored by a window.
pub type WidgetRef = Rc<RefCell<dyn Widget>>;

/// Replaces a widget's own drawing. Receives the resolved style and the widget rect.
pub type DrawOverride = Box<dyn Fn(&mut Painter<'_>, &Style, Rect)>;

/// Repaint request into the owning window.
pub type Invalidator = Rc<dyn Fn()>;

/// Click callback, run by the window after the widget borrow is released.
pub type ClickHandler = Rc<dyn Fn()>;

/// Wraps a widget for registration with a window.
#[must_use]
pub fn shared<W: Widget>(widget: W) -> Shared<W> {
    Rc::new(RefCell::new(widget))
}

/// State common to every widget.
pub struct WidgetBase {
    /// Rectangle in logical units.
    pub rect: Rect,
    /// Hidden widgets are neither painted nor hit-tested.
    pub visible: bool,
    /// Base style name.
    pub style: String,
    on_draw: Option<DrawOverride>,
    invalidator: Option<Invalidator>,
}

impl std::fmt::Debug for WidgetBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetBase")
            .field("rect", &self.rect)
            .field("visible", &self.visible)
            .field("style", &self.style)
            .field("on_draw", &self.on_draw.is_some())
            .field("attached", &self.invalidator.is_some())
            .finish()
    }
}

impl WidgetBase {
    /// Creates a visible, detached widget base.
    #[must_use]
    pub fn new(rect: Rect, style: impl Into<String>) -> Self {
        Self {
            rect,
            visible: true,
            style: style.into(),
            on_draw: None,
            invalidator: None,
        }
    }

    /// Installs a draw override.
    pub fn set_on_draw(&mut self, f: impl Fn(&mut Painter<'_>, &Style, Rect) + 'static) {
        self.on_draw = Some(Box::new(f));
    }

    /// Connects the widget to its window's repaint handle.
    pub fn attach(&mut self, invalidator: Invalidator) {
        self.invalidator = Some(invalidator);
    }

    /// Returns true once the widget belongs to a window.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.invalidator.is_some()
    }

    /// Requests a repaint of the owning window. No-op while hidden or detached.
    pub fn update(&self) {
        if !self.visible {
            return;
        }
        if let Some(invalidate) = &self.invalidator {
            invalidate();
        }
    }
}

/// Response from a pointer notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetResponse {
    /// Widget was clicked.
    pub clicked: bool,
    /// Widget's visual state changed.
    pub changed: bool,
}

impl WidgetResponse {
    /// A visual change with no click.
    pub const CHANGED: Self = Self {
        clicked: false,
        changed: true,
    };
}

/// Base trait for all widgets.
///
/// Every notification has a no-op default, so a widget only implements
/// what it reacts to.
pub trait Widget {
    /// Returns the common state.
    fn base(&self) -> &WidgetBase;

    /// Returns mutable access to the common state.
    fn base_mut(&mut self) -> &mut WidgetBase;

    /// Draws the widget with its resolved style.
    fn draw(&self, painter: &mut Painter<'_>, style: &Style) {
        let _ = (painter, style);
    }

    /// Pointer entered (`leave == false`) or left (`leave == true`).
    fn on_mouse_move(&mut self, leave: bool) -> WidgetResponse {
        let _ = leave;
        WidgetResponse::default()
    }

    /// Button pressed or released while this widget is entered.
    fn on_mouse_button(&mut self, pressed: bool) -> WidgetResponse {
        let _ = pressed;
        WidgetResponse::default()
    }

    /// Callback to run when [`WidgetResponse::clicked`] is reported.
    fn click_handler(&self) -> Option<ClickHandler> {
        None
    }

    /// Pseudo-state suffix appended to the base style name.
    fn state_suffix(&self) -> &'static str {
        ""
    }

    /// Rectangle in logical units.
    fn rect(&self) -> Rect {
        self.base().rect
    }

    /// Returns true if the widget is painted and hit-tested.
    fn is_visible(&self) -> bool {
        self.base().visible
    }

    /// Shows or hides the widget.
    fn set_visible(&mut self, visible: bool) {
        let was = self.base().visible;
        self.base_mut().visible = visible;
        if was || visible {
            // Hiding must still repaint the area once.
            if let Some(invalidate) = &self.base().invalidator {
                invalidate();
            }
        }
    }

    /// Moves or resizes the widget.
    fn set_rect(&mut self, rect: Rect) {
        self.base_mut().rect = rect;
        self.base().update();
    }

    /// Changes the base style name.
    fn set_style(&mut self, style: &str) {
        style.clone_into(&mut self.base_mut().style);
        self.base().update();
    }

    /// Resolves this widget's style for its current state.
    fn resolve_style<'r>(&self, styles: &'r StyleRegistry) -> &'r Style {
        styles.get_state_style(&self.base().style, self.state_suffix())
    }

    /// Paints the widget: the draw override if set, otherwise [`Widget::draw`].
    fn paint(&self, painter: &mut Painter<'_>, styles: &StyleRegistry) {
        let style = self.resolve_style(styles);
        match &self.base().on_draw {
            Some(on_draw) => on_draw(painter, style, self.rect()),
            None => self.draw(painter, style),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Plain(WidgetBase);

    impl Widget for Plain {
        fn base(&self) -> &WidgetBase {
            &self.0
        }

        fn base_mut(&mut self) -> &mut WidgetBase {
            &mut self.0
        }
    }

    #[test]
    fn test_update_requires_attach_and_visibility() {
        let hits = Rc::new(Cell::new(0));
        let mut w = Plain(WidgetBase::new(Rect::new(0, 0, 10, 10), "label"));
        w.base().update();
        assert_eq!(hits.get(), 0);

        let counter = Rc::clone(&hits);
        w.base_mut().attach(Rc::new(move || counter.set(counter.get() + 1)));
        w.base().update();
        assert_eq!(hits.get(), 1);

        w.set_visible(false);
        assert_eq!(hits.get(), 2);
        w.base().update();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_defaults_are_inert() {
        let mut w = Plain(WidgetBase::new(Rect::ZERO, "label"));
        assert_eq!(w.on_mouse_move(false), WidgetResponse::default());
        assert_eq!(w.on_mouse_button(true), WidgetResponse::default());
        assert!(w.click_handler().is_none());
    }
}
