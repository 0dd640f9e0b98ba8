//! # Window Dispatch
//!
//! A [`Window`] owns an ordered widget list and turns native events into
//! widget notifications:
//!
//! ```text
//!  NativeEvent ──> handle_event ──┬─ Paint ──────> one Painter, widgets in order
//!                                 ├─ PointerMoved > title test, reverse hit test
//!                                 ├─ PointerLeft ─> leave current widget
//!                                 ├─ Button ──────> current widget (no hit test)
//!                                 ├─ Timer ───────> timer slot
//!                                 └─ CloseRequested > on_close callback
//! ```
//!
//! Insertion order is z-order: later widgets paint on top and win hit
//! tests. The only widget the window creates itself is the close button.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use minui_core::{names, Color, Point, Rect, StyleRegistry, ToolkitConfig};

use crate::backend::{NativeEvent, NativeWindow, WindowKey};
use crate::image::ImageDecoder;
use crate::painter::Painter;
use crate::surface::Bitmap;
use crate::timer::{TimerFire, TimerTable};
use crate::widget::{shared, Button, Invalidator, Shared, Widget, WidgetRef};

/// Maximum widgets per window, the close button included.
pub const WIDGET_CAPACITY: usize = 64;

/// Half the extent of the close glyph, logical units.
const CLOSE_GLYPH_HALF: i32 = 6;

/// Where a pointer move landed, for the native non-client test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    /// Title bar: the native system may start a window drag.
    Caption,
    /// Everything else.
    Client,
}

/// Lifecycle of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Created, not yet shown.
    Created,
    /// Visible.
    Shown,
    /// Torn down. Further events are ignored.
    Closed,
}

/// Close callback. Receives the window so it can call [`Window::close`].
pub type CloseHandler = Box<dyn FnMut(&mut Window)>;

/// A top-level window and its widgets.
pub struct Window {
    native: Box<dyn NativeWindow>,
    invalidator: Invalidator,
    styles: Rc<RefCell<StyleRegistry>>,
    decoder: Arc<dyn ImageDecoder>,
    config: ToolkitConfig,
    widgets: Vec<WidgetRef>,
    timers: TimerTable,
    /// Widget currently considered entered.
    mouse_widget: Option<usize>,
    /// Leave notification armed with the native window.
    mouse_tracking: bool,
    title: String,
    /// Drag region, logical units.
    title_rect: Rect,
    close_button: Option<Shared<Button>>,
    close_index: Option<usize>,
    closeable: bool,
    on_close: Option<CloseHandler>,
    dpi: f32,
    state: WindowState,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("key", &self.native.key())
            .field("title", &self.title)
            .field("widgets", &self.widgets.len())
            .field("timers", &self.timers)
            .field("mouse_widget", &self.mouse_widget)
            .field("mouse_tracking", &self.mouse_tracking)
            .field("dpi", &self.dpi)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Wraps a native window.
    #[must_use]
    pub fn new(
        native: Box<dyn NativeWindow>,
        styles: Rc<RefCell<StyleRegistry>>,
        decoder: Arc<dyn ImageDecoder>,
        config: ToolkitConfig,
    ) -> Self {
        let invalidator = native.invalidator();
        let dpi = sanitize_dpi(native.dpi_scale());
        Self {
            native,
            invalidator,
            styles,
            decoder,
            config,
            widgets: Vec::with_capacity(WIDGET_CAPACITY),
            timers: TimerTable::new(),
            mouse_widget: None,
            mouse_tracking: false,
            title: String::new(),
            title_rect: Rect::ZERO,
            close_button: None,
            close_index: None,
            closeable: true,
            on_close: None,
            dpi,
            state: WindowState::Created,
        }
    }

    /// Routing key of the native window.
    #[must_use]
    pub fn key(&self) -> WindowKey {
        self.native.key()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> WindowState {
        self.state
    }

    /// Current DPI scale.
    #[must_use]
    pub const fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Style registry shared with the application.
    #[must_use]
    pub fn styles(&self) -> &Rc<RefCell<StyleRegistry>> {
        &self.styles
    }

    /// Caption text.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sets the caption text.
    pub fn set_title(&mut self, title: impl Into<String>) {
        if self.is_closed("set_title") {
            return;
        }
        self.title = title.into();
        self.native.set_title(&self.title);
    }

    /// Resizes the window (logical units).
    pub fn set_size(&mut self, width: i32, height: i32) {
        if self.is_closed("set_size") {
            return;
        }
        let size = Rect::from_size(width, height).scale(self.dpi);
        self.native.set_size(size.width, size.height);
        self.layout_chrome();
    }

    /// Drag region, logical units. Empty until shown.
    #[must_use]
    pub const fn title_rect(&self) -> Rect {
        self.title_rect
    }

    /// Index of the entered widget.
    #[must_use]
    pub const fn mouse_widget(&self) -> Option<usize> {
        self.mouse_widget
    }

    /// Returns true while a leave notification is armed.
    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.mouse_tracking
    }

    /// Number of registered widgets.
    #[must_use]
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// Widget at `index` in z-order.
    #[must_use]
    pub fn widget(&self, index: usize) -> Option<WidgetRef> {
        self.widgets.get(index).cloned()
    }

    /// The synthetic close button, once shown.
    #[must_use]
    pub fn close_button(&self) -> Option<Shared<Button>> {
        self.close_button.clone()
    }

    /// Appends a widget on top of the others.
    ///
    /// Returns false (and ignores the widget) when the window is full or closed.
    pub fn add_widget(&mut self, widget: WidgetRef) -> bool {
        if self.is_closed("add_widget") {
            return false;
        }
        if self.widgets.len() >= WIDGET_CAPACITY {
            tracing::debug!("window {:?}: widget table full", self.key());
            return false;
        }
        widget.borrow_mut().base_mut().attach(Rc::clone(&self.invalidator));
        self.widgets.push(widget);
        self.update();
        true
    }

    /// Starts a periodic timer. The callback returns true to stop it.
    ///
    /// Returns false (and ignores the timer) when the timer table is full.
    pub fn add_timer(&mut self, interval_ms: u32, callback: impl FnMut() -> bool + 'static) -> bool {
        if self.is_closed("add_timer") {
            return false;
        }
        let Some(id) = self.timers.add(interval_ms, callback) else {
            tracing::debug!("window {:?}: timer table full", self.key());
            return false;
        };
        self.native.start_timer(id, interval_ms);
        true
    }

    /// Registers the close callback, replacing any previous one.
    pub fn set_on_close(&mut self, f: impl FnMut(&mut Window) + 'static) {
        self.on_close = Some(Box::new(f));
    }

    /// Allows or suppresses close requests. The close button follows.
    pub fn set_closeable(&mut self, closeable: bool) {
        self.closeable = closeable;
        if let Some(button) = &self.close_button {
            button.borrow_mut().set_visible(closeable);
        }
    }

    /// Returns true if close requests reach the callback.
    #[must_use]
    pub const fn is_closeable(&self) -> bool {
        self.closeable
    }

    /// Makes the window visible, creating the close button on first show.
    pub fn show(&mut self) {
        if self.is_closed("show") {
            return;
        }
        if self.close_button.is_none() {
            self.create_close_button();
        }
        self.native.show();
        self.layout_chrome();
        self.state = WindowState::Shown;
        tracing::debug!("window {:?} shown", self.key());
        self.update();
    }

    /// Requests a repaint.
    pub fn update(&self) {
        if self.state != WindowState::Closed {
            (self.invalidator)();
        }
    }

    /// Runs the close callback, unless closing is suppressed.
    ///
    /// Nothing is torn down here; the callback decides whether to call
    /// [`Window::close`].
    pub fn request_close(&mut self) {
        if !self.closeable {
            tracing::debug!("window {:?}: close suppressed", self.key());
            return;
        }
        if let Some(mut on_close) = self.on_close.take() {
            on_close(self);
            if self.on_close.is_none() {
                self.on_close = Some(on_close);
            }
        }
    }

    /// Destroys the native window and stops its timers.
    pub fn close(&mut self) {
        if self.state == WindowState::Closed {
            return;
        }
        for id in self.timers.stop_all() {
            self.native.stop_timer(id);
        }
        self.mouse_widget = None;
        self.mouse_tracking = false;
        self.native.destroy();
        self.state = WindowState::Closed;
        tracing::debug!("window {:?} closed", self.key());
    }

    /// Copies the current client-area pixels.
    pub fn capture(&mut self) -> Bitmap {
        let surface = self.native.surface();
        surface.snapshot(surface.bounds())
    }

    /// Dispatches one native event.
    pub fn handle_event(&mut self, event: NativeEvent) {
        if self.state == WindowState::Closed {
            tracing::debug!("window {:?}: dropping {:?} after close", self.key(), event);
            return;
        }
        match event {
            NativeEvent::Paint => self.on_paint(),
            NativeEvent::PointerMoved(pt) => {
                self.on_pointer_move(pt);
            }
            NativeEvent::PointerLeft => self.on_pointer_left(),
            NativeEvent::Button { pressed } => self.on_button(pressed),
            NativeEvent::Timer(id) => self.on_timer(id),
            NativeEvent::CloseRequested => self.request_close(),
            NativeEvent::DpiChanged(dpi) => {
                self.dpi = sanitize_dpi(dpi);
                self.layout_chrome();
                self.update();
            }
            NativeEvent::Resized { .. } => {
                self.layout_chrome();
                self.update();
            }
        }
    }

    /// Pointer moved to physical point `pt`.
    ///
    /// Runs the title test and the widget hit test. The caption wins the
    /// returned region even when a widget was hit.
    pub fn on_pointer_move(&mut self, pt: Point) -> HitRegion {
        let caption = self.title_rect.scale(self.dpi).contains(pt);

        if !self.mouse_tracking {
            self.mouse_tracking = self.native.track_leave();
        }

        let dpi = self.dpi;
        let hit = self.widgets.iter().rposition(|widget| {
            let widget = widget.borrow();
            widget.is_visible() && widget.rect().scale(dpi).contains(pt)
        });

        match hit {
            Some(index) if self.mouse_widget == Some(index) => {}
            Some(index) => {
                if let Some(previous) = self.mouse_widget.replace(index) {
                    self.notify_move(previous, true);
                }
                self.notify_move(index, false);
            }
            None => {
                if let Some(previous) = self.mouse_widget.take() {
                    self.notify_move(previous, true);
                }
            }
        }

        if caption {
            HitRegion::Caption
        } else {
            HitRegion::Client
        }
    }

    /// Pointer left the client area.
    pub fn on_pointer_left(&mut self) {
        if let Some(previous) = self.mouse_widget.take() {
            self.notify_move(previous, true);
        }
        self.mouse_tracking = false;
    }

    /// Primary button changed. Goes to the entered widget, if any.
    pub fn on_button(&mut self, pressed: bool) {
        let Some(index) = self.mouse_widget else {
            return;
        };
        let widget = Rc::clone(&self.widgets[index]);
        let (response, handler) = {
            let mut widget = widget.borrow_mut();
            let response = widget.on_mouse_button(pressed);
            let handler = if response.clicked { widget.click_handler() } else { None };
            (response, handler)
        };

        if !response.clicked {
            return;
        }
        if self.close_index == Some(index) {
            self.request_close();
        } else if let Some(handler) = handler {
            handler();
        }
    }

    /// Timer slot `id` fired.
    pub fn on_timer(&mut self, id: usize) {
        if self.timers.fire(id) == TimerFire::Stopped {
            self.native.stop_timer(id);
            tracing::debug!("window {:?}: timer {} stopped", self.key(), id);
        }
    }

    /// Paints every visible widget over the window background.
    pub fn on_paint(&mut self) {
        let styles = Rc::clone(&self.styles);
        let styles = styles.borrow();
        let decoder = Arc::clone(&self.decoder);
        let dpi = self.dpi;

        let surface = self.native.surface();
        let rect = Rect::from_size(
            (surface.width() as f32 / dpi) as i32,
            (surface.height() as f32 / dpi) as i32,
        );

        {
            let mut painter = Painter::new(surface, rect, dpi, self.config.supersample, &*decoder)
                .with_aa_factor(self.config.aa_factor);

            painter.fill_rect(rect, styles.get_style(names::WINDOW).background_color);
            painter.frame_rect(rect, 1, Color::FRAME);

            for widget in &self.widgets {
                let Ok(widget) = widget.try_borrow() else {
                    continue;
                };
                if !widget.is_visible() {
                    continue;
                }
                painter.set_clip(widget.rect());
                widget.paint(&mut painter, &styles);
            }
        }

        self.native.present();
    }

    fn notify_move(&self, index: usize, leave: bool) {
        if let Some(widget) = self.widgets.get(index) {
            widget.borrow_mut().on_mouse_move(leave);
        }
    }

    fn create_close_button(&mut self) {
        let mut button = Button::new(Rect::ZERO, "");
        button.set_style(names::CLOSE);
        button.base_mut().set_on_draw(|painter, style, rect| {
            painter.fill_rect(rect, style.background_color);
            let c = rect.center();
            let h = CLOSE_GLYPH_HALF;
            for (dx, dy) in [(-h, h), (h, h), (h, -h), (-h, -h)] {
                painter.draw_line(c, Point::new(c.x + dx, c.y + dy), 1, style.color);
            }
        });
        button.set_visible(self.closeable);

        let button = shared(button);
        if self.add_widget(button.clone()) {
            self.close_index = Some(self.widgets.len() - 1);
            self.close_button = Some(button);
        }
    }

    /// Recomputes the drag region and close button from the client size.
    fn layout_chrome(&mut self) {
        let (width, _) = self.native.client_size();
        let width = (width as f32 / self.dpi) as i32;
        let button_width = self.config.close_button_width;
        let height = self.config.title_height;

        self.title_rect = Rect::new(0, 0, (width - button_width).max(0), height);
        if let Some(button) = &self.close_button {
            button.borrow_mut().base_mut().rect =
                Rect::new(self.title_rect.width, 0, button_width, height);
        }
    }

    fn is_closed(&self, op: &str) -> bool {
        if self.state == WindowState::Closed {
            tracing::debug!("window {:?}: {} ignored after close", self.key(), op);
            return true;
        }
        false
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.state != WindowState::Closed {
            self.native.destroy();
        }
    }
}

fn sanitize_dpi(dpi: f32) -> f32 {
    if dpi.is_finite() && dpi > 0.0 {
        dpi
    } else {
        1.0
    }
}
