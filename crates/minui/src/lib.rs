//! # minui
//!
//! Small retained-mode desktop UI toolkit:
//! - Windows with label, button, progress and image widgets
//! - Supersampled, DPI-aware compositing painter
//! - Pointer enter/leave/click state machine with z-ordered hit testing
//! - Flat style registry with `:hover` / `:press` pseudo-states
//! - Optional dedicated UI thread driven from any other thread
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        EVENT PIPELINE                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │ GraphicsBackend → Window::handle_event → Widget → update()   │
//! │        ↑                                            ↓        │
//! │    present ← Surface ← Painter (ss × dpi) ← Window::on_paint │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Native windowing is abstracted by [`backend::GraphicsBackend`];
//! [`backend::HeadlessBackend`] renders into memory and is what the tests
//! drive.
//!
//! ## Threading
//!
//! Widgets, windows and the style registry are `!Send`. Either run
//! [`Application::exec`] on the thread that created them, or start a
//! [`ThreadedApplication`] and reach the UI through marshaled closures.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod application;
pub mod backend;
pub mod error;
pub mod image;
pub mod marshal;
pub mod painter;
pub mod surface;
pub mod timer;
pub mod widget;
pub mod window;

pub use application::{Application, QuitHandle, ThreadedApplication, UiContext};
pub use backend::{
    BackendEvent, Capabilities, GraphicsBackend, HeadlessBackend, LoopEvent, NativeEvent,
    NativeWindow, WindowKey,
};
pub use error::{MinuiError, MinuiResult};
pub use image::{BmpDecoder, ImageDecoder, ImageError};
pub use marshal::{EventLoop, MarshalError, UiHandle, UiThread, Waker};
pub use painter::Painter;
pub use surface::{Bitmap, DrawCommand, SoftwareSurface, Surface};
pub use timer::TIMER_CAPACITY;
pub use widget::{shared, Button, ButtonState, Image, Label, Progress, Shared, Widget};
pub use window::{HitRegion, Window, WindowState, WIDGET_CAPACITY};

pub use minui_core::{
    names, Color, Point, Rect, Style, StyleRegistry, Theme, ToolkitConfig, DEFAULT_AA_FACTOR,
};
