//! Headless backend.
//!
//! Windows render into [`SoftwareSurface`]s and events come from an
//! in-process queue that tests (or a driver thread) feed with
//! [`HeadlessBackend::inject`]. Each window exposes a [`HeadlessProbe`]
//! recording what the toolkit asked of it.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::{
    BackendEvent, Capabilities, GraphicsBackend, LoopEvent, NativeEvent, NativeWindow, WindowKey,
};
use crate::error::MinuiResult;
use crate::image::{BmpDecoder, ImageDecoder};
use crate::surface::{SoftwareSurface, Surface};
use crate::widget::Invalidator;

/// Default client size of a new window, physical pixels.
const DEFAULT_CLIENT_SIZE: (i32, i32) = (800, 600);

#[derive(Default)]
struct Queue {
    events: VecDeque<BackendEvent>,
    woken: bool,
    quit: bool,
}

/// State shared between the backend and its windows.
#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    ready: Condvar,
    probes: Mutex<HashMap<WindowKey, Arc<HeadlessProbe>>>,
}

impl Shared {
    fn push(&self, event: BackendEvent) {
        self.queue.lock().events.push_back(event);
        self.ready.notify_one();
    }
}

/// What the toolkit has done to one headless window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeState {
    /// Caption text.
    pub title: String,
    /// Client size.
    pub size: (i32, i32),
    /// `show` was called.
    pub shown: bool,
    /// `destroy` was called.
    pub destroyed: bool,
    /// Number of repaint requests.
    pub invalidations: usize,
    /// A repaint is queued and not yet presented.
    pub paint_pending: bool,
    /// Number of times leave tracking was armed.
    pub leave_tracking_armed: usize,
    /// Running timers: slot → interval in milliseconds.
    pub timers: BTreeMap<usize, u32>,
    /// Number of completed paint passes.
    pub presents: usize,
}

/// Observation handle for a headless window.
#[derive(Debug, Default)]
pub struct HeadlessProbe {
    state: Mutex<ProbeState>,
}

impl HeadlessProbe {
    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ProbeState {
        self.state.lock().clone()
    }
}

/// In-process backend without a display.
pub struct HeadlessBackend {
    shared: Arc<Shared>,
    capabilities: Capabilities,
    dpi: f32,
    client_size: (i32, i32),
    fonts: Vec<String>,
    blocking: bool,
    next_key: AtomicU64,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Creates a backend with every capability at DPI scale 1.
    ///
    /// `wait_event` returns None as soon as the queue is empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            capabilities: Capabilities::ALL,
            dpi: 1.0,
            client_size: DEFAULT_CLIENT_SIZE,
            fonts: Vec::new(),
            blocking: false,
            next_key: AtomicU64::new(1),
        }
    }

    /// Overrides the reported capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the DPI scale of new windows.
    #[must_use]
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Sets the client size of new windows.
    #[must_use]
    pub fn with_client_size(mut self, width: i32, height: i32) -> Self {
        self.client_size = (width, height);
        self
    }

    /// Limits the font families windows can materialize.
    #[must_use]
    pub fn with_fonts<I, S>(mut self, fonts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fonts = fonts.into_iter().map(Into::into).collect();
        self
    }

    /// Makes `wait_event` block on an empty queue until an event, a wake or quit arrives.
    #[must_use]
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// Queues a native event for a window.
    pub fn inject(&self, window: WindowKey, event: NativeEvent) {
        self.shared.push(BackendEvent { window, event });
    }

    /// Queues one [`NativeEvent::Timer`] for every running timer.
    pub fn tick_timers(&self) {
        let probes: Vec<_> = self
            .shared
            .probes
            .lock()
            .iter()
            .map(|(key, probe)| (*key, Arc::clone(probe)))
            .collect();

        for (key, probe) in probes {
            let ids: Vec<usize> = probe.state.lock().timers.keys().copied().collect();
            for id in ids {
                self.inject(key, NativeEvent::Timer(id));
            }
        }
    }

    /// Observation handle for a window.
    #[must_use]
    pub fn probe(&self, window: WindowKey) -> Option<Arc<HeadlessProbe>> {
        self.shared.probes.lock().get(&window).cloned()
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().events.len()
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn create_window(&self) -> MinuiResult<Box<dyn NativeWindow>> {
        let key = WindowKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        let (width, height) = self.client_size;

        let probe = Arc::new(HeadlessProbe::default());
        probe.state.lock().size = (width, height);
        self.shared.probes.lock().insert(key, Arc::clone(&probe));

        tracing::debug!("headless window {:?} created ({}x{})", key, width, height);

        Ok(Box::new(HeadlessWindow {
            key,
            dpi: self.dpi,
            fonts: self.fonts.clone(),
            surface: SoftwareSurface::new(width, height).with_fonts(self.fonts.clone()),
            probe,
            shared: Arc::clone(&self.shared),
            destroyed: false,
        }))
    }

    fn decoder(&self) -> Arc<dyn ImageDecoder> {
        Arc::new(BmpDecoder)
    }

    fn wait_event(&self) -> Option<LoopEvent> {
        let mut queue = self.shared.queue.lock();
        loop {
            if queue.woken {
                queue.woken = false;
                return Some(LoopEvent::Woken);
            }
            if let Some(event) = queue.events.pop_front() {
                return Some(LoopEvent::Native(event));
            }
            if queue.quit || !self.blocking {
                return None;
            }
            self.shared.ready.wait(&mut queue);
        }
    }

    fn wake(&self) {
        self.shared.queue.lock().woken = true;
        self.shared.ready.notify_all();
    }

    fn post_quit(&self) {
        self.shared.queue.lock().quit = true;
        self.shared.ready.notify_all();
    }
}

struct HeadlessWindow {
    key: WindowKey,
    dpi: f32,
    fonts: Vec<String>,
    surface: SoftwareSurface,
    probe: Arc<HeadlessProbe>,
    shared: Arc<Shared>,
    destroyed: bool,
}

impl NativeWindow for HeadlessWindow {
    fn key(&self) -> WindowKey {
        self.key
    }

    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.probe.state.lock().title);
    }

    fn set_size(&mut self, width: i32, height: i32) {
        if self.destroyed {
            return;
        }
        self.surface = SoftwareSurface::new(width, height).with_fonts(self.fonts.clone());
        self.probe.state.lock().size = (width, height);
        self.shared.push(BackendEvent {
            window: self.key,
            event: NativeEvent::Resized { width, height },
        });
    }

    fn client_size(&self) -> (i32, i32) {
        (self.surface.width(), self.surface.height())
    }

    fn dpi_scale(&self) -> f32 {
        self.dpi
    }

    fn show(&mut self) {
        self.probe.state.lock().shown = true;
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let mut state = self.probe.state.lock();
        state.destroyed = true;
        state.shown = false;
        state.timers.clear();
    }

    fn invalidator(&self) -> Invalidator {
        let key = self.key;
        let probe = Arc::clone(&self.probe);
        let shared = Arc::clone(&self.shared);
        std::rc::Rc::new(move || {
            let mut state = probe.state.lock();
            if state.destroyed {
                return;
            }
            state.invalidations += 1;
            if !state.paint_pending {
                state.paint_pending = true;
                drop(state);
                shared.push(BackendEvent {
                    window: key,
                    event: NativeEvent::Paint,
                });
            }
        })
    }

    fn track_leave(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.probe.state.lock().leave_tracking_armed += 1;
        true
    }

    fn start_timer(&mut self, id: usize, interval_ms: u32) {
        if !self.destroyed {
            self.probe.state.lock().timers.insert(id, interval_ms);
        }
    }

    fn stop_timer(&mut self, id: usize) {
        self.probe.state.lock().timers.remove(&id);
    }

    fn surface(&mut self) -> &mut dyn Surface {
        &mut self.surface
    }

    fn present(&mut self) {
        let mut state = self.probe.state.lock();
        state.paint_pending = false;
        state.presents += 1;
    }
}
