//! Widgets: label, button, progress bar and image.
//!
//! Widgets are created by the caller, shared with exactly one window via
//! [`shared`], and positioned with fixed rectangles in logical units.

mod button;
mod core;
mod image;
mod label;
mod progress;

pub use button::{Button, ButtonState};
pub use self::core::{
    shared, ClickHandler, DrawOverride, Invalidator, Shared, Widget, WidgetBase, WidgetRef,
    WidgetResponse,
};
pub use image::Image;
pub use label::Label;
pub use progress::Progress;
