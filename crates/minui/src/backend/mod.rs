//! # Native Backend Boundary
//!
//! Everything platform-specific sits behind two traits:
//!
//! ```text
//! ┌──────────────────┐ create_window ┌──────────────────┐
//! │ GraphicsBackend  │ ────────────> │  NativeWindow    │
//! │  (process-wide)  │               │  (one per Window)│
//! │                  │               │                  │
//! │  wait_event() ───┼── BackendEvent{window, event} ──>│ Window::handle_event
//! └──────────────────┘               └──────────────────┘
//! ```
//!
//! Cross-thread callers use [`GraphicsBackend::wake`] to get the UI
//! thread out of `wait_event` when they have queued work for it.
//!
//! A backend reports what it can do as [`Capabilities`]. The application
//! checks them once at startup; a backend missing anything in
//! [`Capabilities::REQUIRED`] is a startup error rather than a runtime
//! surprise.

mod headless;

use std::sync::Arc;

use minui_core::Point;

use crate::error::MinuiResult;
use crate::image::ImageDecoder;
use crate::surface::Surface;
use crate::widget::Invalidator;

pub use headless::{HeadlessBackend, HeadlessProbe, ProbeState};

/// Backend feature set (bitfield).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u32);

impl Capabilities {
    /// Can create top-level windows.
    pub const WINDOWS: Self = Self(1 << 0);
    /// Can execute draw commands and pixel transfers.
    pub const DRAWING: Self = Self(1 << 1);
    /// Can render text.
    pub const TEXT: Self = Self(1 << 2);
    /// Provides an image decoder.
    pub const IMAGES: Self = Self(1 << 3);
    /// Can run periodic timers.
    pub const TIMERS: Self = Self(1 << 4);
    /// Can deliver pointer-left notifications.
    pub const LEAVE_TRACKING: Self = Self(1 << 5);
    /// Reports per-window DPI changes.
    pub const DPI_AWARE: Self = Self(1 << 6);

    /// What the toolkit cannot run without.
    pub const REQUIRED: Self = Self(
        Self::WINDOWS.0 | Self::DRAWING.0 | Self::TIMERS.0 | Self::LEAVE_TRACKING.0,
    );

    /// Everything.
    pub const ALL: Self = Self(
        Self::REQUIRED.0 | Self::TEXT.0 | Self::IMAGES.0 | Self::DPI_AWARE.0,
    );

    const NAMES: [(Self, &'static str); 7] = [
        (Self::WINDOWS, "WINDOWS"),
        (Self::DRAWING, "DRAWING"),
        (Self::TEXT, "TEXT"),
        (Self::IMAGES, "IMAGES"),
        (Self::TIMERS, "TIMERS"),
        (Self::LEAVE_TRACKING, "LEAVE_TRACKING"),
        (Self::DPI_AWARE, "DPI_AWARE"),
    ];

    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every capability in `other` is present.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns true if no capability is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of both sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Capabilities in `self` that are not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// Identifies a native window within its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey(pub u64);

/// A notification from the native window system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeEvent {
    /// The client area needs repainting.
    Paint,
    /// Pointer moved to a physical client coordinate.
    PointerMoved(Point),
    /// Pointer left the client area.
    PointerLeft,
    /// Primary button pressed or released.
    Button {
        /// True on press, false on release.
        pressed: bool,
    },
    /// Timer slot fired.
    Timer(usize),
    /// The user asked to close the window.
    CloseRequested,
    /// Window moved to a display with a different scale.
    DpiChanged(f32),
    /// Client area resized (physical pixels).
    Resized {
        /// New width.
        width: i32,
        /// New height.
        height: i32,
    },
}

/// A native event addressed to one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendEvent {
    /// Target window.
    pub window: WindowKey,
    /// What happened.
    pub event: NativeEvent,
}

/// What a wait on the native queue produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopEvent {
    /// A native event for one window.
    Native(BackendEvent),
    /// [`GraphicsBackend::wake`] was called.
    Woken,
}

/// One native top-level window.
///
/// All sizes are physical pixels.
pub trait NativeWindow {
    /// Identity used to route [`BackendEvent`]s.
    fn key(&self) -> WindowKey;

    /// Sets the caption text.
    fn set_title(&mut self, title: &str);

    /// Resizes the outer window.
    fn set_size(&mut self, width: i32, height: i32);

    /// Current client size.
    fn client_size(&self) -> (i32, i32);

    /// Device pixels per logical unit.
    fn dpi_scale(&self) -> f32;

    /// Makes the window visible.
    fn show(&mut self);

    /// Tears the native window down. Further calls are ignored.
    fn destroy(&mut self);

    /// Returns a handle that requests a repaint when called.
    fn invalidator(&self) -> Invalidator;

    /// Arms a one-shot pointer-left notification. Returns true if armed.
    fn track_leave(&mut self) -> bool;

    /// Starts a periodic timer that delivers [`NativeEvent::Timer`] with `id`.
    fn start_timer(&mut self, id: usize, interval_ms: u32);

    /// Stops a timer. Unknown ids are ignored.
    fn stop_timer(&mut self, id: usize);

    /// Surface covering the client area.
    fn surface(&mut self) -> &mut dyn Surface;

    /// Pushes the painted surface to the screen.
    fn present(&mut self);
}

/// A windowing system.
pub trait GraphicsBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Features this backend supports.
    fn capabilities(&self) -> Capabilities;

    /// Creates a hidden window.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MinuiError::Backend`] if the native window could not be created.
    fn create_window(&self) -> MinuiResult<Box<dyn NativeWindow>>;

    /// Image decoder for this platform.
    fn decoder(&self) -> Arc<dyn ImageDecoder>;

    /// Returns the next event, or None once the loop should end.
    ///
    /// A pending [`GraphicsBackend::wake`] is reported as
    /// [`LoopEvent::Woken`], even if it arrived before the call.
    fn wait_event(&self) -> Option<LoopEvent>;

    /// Interrupts a blocked `wait_event`. Safe to call from any thread.
    fn wake(&self);

    /// Ends the event loop. Safe to call from any thread.
    fn post_quit(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_sets() {
        let caps = Capabilities::WINDOWS | Capabilities::DRAWING | Capabilities::TIMERS;
        assert!(!caps.contains(Capabilities::REQUIRED));
        assert_eq!(
            Capabilities::REQUIRED.difference(caps),
            Capabilities::LEAVE_TRACKING
        );
        assert!(Capabilities::ALL.contains(Capabilities::REQUIRED));
        assert_eq!(format!("{:?}", Capabilities::TEXT), "{TEXT}");
    }
}
