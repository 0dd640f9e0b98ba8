//! # Toolkit Error Types
//!
//! Only startup and plumbing failures are errors. Inside the UI core,
//! failures degrade silently (default styles, skipped draws, `false`
//! returns from capacity-bounded tables).

use thiserror::Error;

use minui_core::ConfigError;

use crate::backend::Capabilities;
use crate::marshal::MarshalError;

/// Errors that can occur while starting or driving the toolkit.
#[derive(Error, Debug)]
pub enum MinuiError {
    /// The graphics backend lacks entry points the toolkit requires.
    #[error("backend {backend} is missing required capabilities: {missing:?}")]
    MissingCapability {
        /// Backend name.
        backend: String,
        /// Capabilities that were not reported.
        missing: Capabilities,
    },

    /// The backend failed to create a native resource.
    #[error("backend failure: {0}")]
    Backend(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A marshaled call could not be delivered to the UI thread.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// A window handle does not refer to a live window.
    #[error("no such window: {0}")]
    UnknownWindow(u64),
}

/// Result type for toolkit operations.
pub type MinuiResult<T> = Result<T, MinuiError>;
