//! # Application
//!
//! Process-level context: validated backend, shared style registry and
//! configuration. Two ways to drive it:
//!
//! - [`Application::exec`]: the calling thread runs the event loop and
//!   owns every window (single-threaded cooperative).
//! - [`ThreadedApplication`]: the toolkit lives on a dedicated UI thread
//!   that runs the native event loop; every call is marshaled there and
//!   waits for completion.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use minui_core::{Style, StyleRegistry, Theme, ToolkitConfig};

use crate::backend::{BackendEvent, Capabilities, GraphicsBackend, LoopEvent, WindowKey};
use crate::error::{MinuiError, MinuiResult};
use crate::image::ImageDecoder;
use crate::marshal::{EventLoop, UiHandle, UiThread, Waker};
use crate::window::Window;

/// Name of the dedicated UI thread.
const UI_THREAD_NAME: &str = "minui-ui";

/// Ends an event loop from any thread.
#[derive(Clone)]
pub struct QuitHandle {
    backend: Arc<dyn GraphicsBackend>,
}

impl QuitHandle {
    /// Makes the event loop return once pending events are handled.
    pub fn quit(&self) {
        self.backend.post_quit();
    }
}

impl std::fmt::Debug for QuitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuitHandle")
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Toolkit context for one UI thread.
pub struct Application {
    backend: Arc<dyn GraphicsBackend>,
    decoder: Arc<dyn ImageDecoder>,
    styles: Rc<RefCell<StyleRegistry>>,
    config: ToolkitConfig,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("backend", &self.backend.name())
            .field("styles", &self.styles.borrow().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Validates the backend and registers the built-in styles.
    ///
    /// # Errors
    ///
    /// [`MinuiError::MissingCapability`] if the backend lacks anything in
    /// [`Capabilities::REQUIRED`].
    pub fn initialize(backend: Arc<dyn GraphicsBackend>, config: ToolkitConfig) -> MinuiResult<Self> {
        let missing = Capabilities::REQUIRED.difference(backend.capabilities());
        if !missing.is_empty() {
            return Err(MinuiError::MissingCapability {
                backend: backend.name().to_string(),
                missing,
            });
        }

        let styles = StyleRegistry::with_builtin(config.theme);
        tracing::info!(
            "minui initialized: backend={} theme={:?} supersample={} styles={}",
            backend.name(),
            config.theme,
            config.supersample,
            styles.len()
        );

        Ok(Self {
            decoder: backend.decoder(),
            backend,
            styles: Rc::new(RefCell::new(styles)),
            config,
        })
    }

    /// Like [`Application::initialize`], with configuration read from a TOML file.
    ///
    /// # Errors
    ///
    /// [`MinuiError::Config`] if the file can't be read or parsed, plus
    /// everything [`Application::initialize`] returns.
    pub fn from_config_file(
        backend: Arc<dyn GraphicsBackend>,
        path: impl AsRef<Path>,
    ) -> MinuiResult<Self> {
        let config = ToolkitConfig::load(path)?;
        Self::initialize(backend, config)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    /// The backend this application runs on.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn GraphicsBackend> {
        &self.backend
    }

    /// Shared style registry.
    #[must_use]
    pub fn styles(&self) -> Rc<RefCell<StyleRegistry>> {
        Rc::clone(&self.styles)
    }

    /// Registers or replaces a style. Returns false when the registry is full.
    pub fn set_style(&self, name: &str, style: Style) -> bool {
        self.styles.borrow_mut().set_style(name, style)
    }

    /// Switches the built-in styles and the miss default to `theme`.
    ///
    /// Windows pick the change up on their next paint; call
    /// [`Window::update`] to repaint now.
    pub fn set_theme(&self, theme: Theme) {
        self.styles.borrow_mut().apply_theme(theme);
    }

    /// Active theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.styles.borrow().theme()
    }

    /// Looks up a style, falling back to the default.
    #[must_use]
    pub fn get_style(&self, name: &str) -> Style {
        self.styles.borrow().get_style(name).clone()
    }

    /// Creates a hidden window.
    ///
    /// # Errors
    ///
    /// Whatever the backend reports when the native window can't be created.
    pub fn create_window(&self) -> MinuiResult<Window> {
        let native = self.backend.create_window()?;
        Ok(Window::new(
            native,
            Rc::clone(&self.styles),
            Arc::clone(&self.decoder),
            self.config.clone(),
        ))
    }

    /// Runs the event loop until the backend has no more events or quit is posted.
    pub fn exec(&self, windows: &mut [&mut Window]) {
        while let Some(event) = self.backend.wait_event() {
            if let LoopEvent::Native(event) = event {
                dispatch(windows.iter_mut().map(|w| &mut **w), event);
            }
        }
        tracing::debug!("event loop finished");
    }

    /// Posts a quit request to the event loop.
    pub fn quit(&self) {
        self.backend.post_quit();
    }

    /// Returns a thread-safe handle that ends the event loop.
    #[must_use]
    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle {
            backend: Arc::clone(&self.backend),
        }
    }
}

/// Routes one event to the window it addresses. Returns false if none matched.
fn dispatch<'w>(windows: impl IntoIterator<Item = &'w mut Window>, event: BackendEvent) -> bool {
    for window in windows {
        if window.key() == event.window {
            window.handle_event(event.event);
            return true;
        }
    }
    tracing::debug!("no window for {:?}", event);
    false
}

/// Toolkit state owned by the UI thread.
pub struct UiContext {
    /// Application context.
    pub app: Application,
    /// Windows created through [`ThreadedApplication::create_window`].
    pub windows: BTreeMap<WindowKey, Window>,
}

impl UiContext {
    /// Routes one backend event.
    pub fn dispatch(&mut self, event: BackendEvent) -> bool {
        dispatch(self.windows.values_mut(), event)
    }

    /// Looks up a window.
    ///
    /// # Errors
    ///
    /// [`MinuiError::UnknownWindow`] if no window has this key.
    pub fn window(&mut self, key: WindowKey) -> MinuiResult<&mut Window> {
        self.windows
            .get_mut(&key)
            .ok_or(MinuiError::UnknownWindow(key.0))
    }
}

impl EventLoop for UiContext {
    fn waker(&self) -> Waker {
        let backend = Arc::clone(self.app.backend());
        Arc::new(move || backend.wake())
    }

    fn run_once(&mut self) -> bool {
        let backend = Arc::clone(self.app.backend());
        match backend.wait_event() {
            Some(LoopEvent::Native(event)) => {
                self.dispatch(event);
                true
            }
            Some(LoopEvent::Woken) => true,
            None => false,
        }
    }
}

/// The toolkit on its own UI thread, driven from the owner thread.
///
/// The UI thread dispatches native events as they arrive and runs
/// marshaled calls in between.
pub struct ThreadedApplication {
    ui: UiThread<UiContext>,
}

impl std::fmt::Debug for ThreadedApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedApplication")
            .field("ui", &*self.ui)
            .finish()
    }
}

impl ThreadedApplication {
    /// Spawns the UI thread, initializes the application on it and starts
    /// its event loop.
    ///
    /// # Errors
    ///
    /// Any [`Application::initialize`] failure, reported from the UI thread.
    pub fn start(backend: Arc<dyn GraphicsBackend>, config: ToolkitConfig) -> MinuiResult<Self> {
        let ui = UiThread::spawn_event_loop(UI_THREAD_NAME, move || {
            let app = Application::initialize(backend, config)?;
            Ok(UiContext {
                app,
                windows: BTreeMap::new(),
            })
        })?;
        Ok(Self { ui })
    }

    /// Handle for marshaling arbitrary work onto the UI thread.
    #[must_use]
    pub fn handle(&self) -> UiHandle<UiContext> {
        self.ui.handle()
    }

    /// Registers or replaces a style. Visible to every paint after this returns.
    ///
    /// # Errors
    ///
    /// [`MinuiError::Marshal`] if the UI thread is gone.
    pub fn set_style(&self, name: &str, style: Style) -> MinuiResult<bool> {
        let name = name.to_string();
        Ok(self.ui.run(move |ctx| ctx.app.set_style(&name, style))?)
    }

    /// Switches the theme and repaints every window.
    ///
    /// # Errors
    ///
    /// [`MinuiError::Marshal`] if the UI thread is gone.
    pub fn set_theme(&self, theme: Theme) -> MinuiResult<()> {
        Ok(self.ui.run(move |ctx| {
            ctx.app.set_theme(theme);
            for window in ctx.windows.values() {
                window.update();
            }
        })?)
    }

    /// Looks up a style on the UI thread.
    ///
    /// # Errors
    ///
    /// [`MinuiError::Marshal`] if the UI thread is gone.
    pub fn get_style(&self, name: &str) -> MinuiResult<Style> {
        let name = name.to_string();
        Ok(self.ui.run(move |ctx| ctx.app.get_style(&name))?)
    }

    /// Creates a window on the UI thread.
    ///
    /// # Errors
    ///
    /// Backend failures, or [`MinuiError::Marshal`] if the UI thread is gone.
    pub fn create_window(&self) -> MinuiResult<WindowKey> {
        self.ui.run(|ctx| {
            let window = ctx.app.create_window()?;
            let key = window.key();
            ctx.windows.insert(key, window);
            Ok(key)
        })?
    }

    /// Runs `f` against a window on the UI thread.
    ///
    /// # Errors
    ///
    /// [`MinuiError::UnknownWindow`] or [`MinuiError::Marshal`].
    pub fn with_window<R, F>(&self, key: WindowKey, f: F) -> MinuiResult<R>
    where
        F: FnOnce(&mut Window) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.ui.run(move |ctx| ctx.window(key).map(f))?
    }

    /// Queues a native event for dispatch without waiting.
    ///
    /// # Errors
    ///
    /// [`MinuiError::Marshal`] if the UI thread is gone.
    pub fn post_event(&self, event: BackendEvent) -> MinuiResult<()> {
        self.ui.post(move |ctx| {
            ctx.dispatch(event);
        })?;
        Ok(())
    }

    /// Closes a window and forgets it.
    ///
    /// # Errors
    ///
    /// [`MinuiError::UnknownWindow`] or [`MinuiError::Marshal`].
    pub fn close_window(&self, key: WindowKey) -> MinuiResult<()> {
        self.ui.run(move |ctx| {
            let mut window = ctx
                .windows
                .remove(&key)
                .ok_or(MinuiError::UnknownWindow(key.0))?;
            window.close();
            Ok(())
        })?
    }

    /// Closes every window and joins the UI thread.
    pub fn shutdown(self) {
        let closed = self.ui.run(|ctx| {
            for window in ctx.windows.values_mut() {
                window.close();
            }
            ctx.windows.clear();
        });
        if closed.is_err() {
            tracing::warn!("UI thread exited before shutdown");
        }
        self.ui.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use minui_core::names;

    #[test]
    fn test_missing_capability_is_startup_error() {
        let backend = HeadlessBackend::new()
            .with_capabilities(Capabilities::WINDOWS | Capabilities::DRAWING);
        let err = Application::initialize(Arc::new(backend), ToolkitConfig::default()).unwrap_err();
        match err {
            MinuiError::MissingCapability { backend, missing } => {
                assert_eq!(backend, "headless");
                assert!(missing.contains(Capabilities::TIMERS));
                assert!(missing.contains(Capabilities::LEAVE_TRACKING));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builtin_styles_registered() {
        let app = Application::initialize(Arc::new(HeadlessBackend::new()), ToolkitConfig::default())
            .unwrap();
        assert!(app.styles().borrow().contains("button:hover"));
        assert_eq!(app.get_style("nope"), *app.styles().borrow().default_style());
    }

    #[test]
    fn test_theme_switch_repaints_dark_background() {
        let backend = HeadlessBackend::new().with_client_size(100, 80);
        let app = Application::initialize(Arc::new(backend), ToolkitConfig::default()).unwrap();
        let mut window = app.create_window().unwrap();
        window.show();
        app.exec(&mut [&mut window]);

        let light = app.get_style(names::WINDOW).background_color;
        assert_eq!(window.capture().get(50, 50), Some(light));

        app.set_theme(Theme::Dark);
        window.update();
        app.exec(&mut [&mut window]);

        let dark = app.get_style(names::WINDOW).background_color;
        assert_ne!(dark, light);
        assert_eq!(app.theme(), Theme::Dark);
        assert_eq!(window.capture().get(50, 50), Some(dark));
    }

    #[test]
    fn test_threaded_start_failure() {
        let backend = HeadlessBackend::new().with_capabilities(Capabilities::empty());
        let result = ThreadedApplication::start(Arc::new(backend), ToolkitConfig::default());
        assert!(matches!(result, Err(MinuiError::MissingCapability { .. })));
    }
}
