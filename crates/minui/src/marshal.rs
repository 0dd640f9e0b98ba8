//! # UI Thread Marshal
//!
//! Runs all toolkit state on one dedicated thread and lets any other
//! thread act on it by sending closures:
//!
//! ```text
//!  caller thread                        UI thread
//!  ─────────────                        ─────────
//!  run(f) ──── Message::Run(job) ────>  job(&mut state)
//!    │          (FIFO channel)            │
//!    └── wait on ReplySlot <── complete ──┘
//! ```
//!
//! The state `S` is built on the UI thread by the `init` closure and never
//! leaves it, so it does not need to be `Send`. Only the closures and
//! their results cross threads.
//!
//! With [`UiThread::spawn_event_loop`] the UI thread also runs the native
//! event loop of its state. Between jobs it blocks in [`EventLoop::run_once`];
//! every send wakes it through the state's [`Waker`] so queued jobs run
//! promptly.
//!
//! There is no timeout: a caller blocks until the UI thread has run its
//! closure, or learns that the thread is gone.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::error::{MinuiError, MinuiResult};

/// Why a marshaled call did not run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalError {
    /// The UI thread has exited, or dropped the call without running it.
    #[error("UI thread is not running")]
    Disconnected,

    /// Called on the UI thread while the state is already in use.
    #[error("UI state is already borrowed on the UI thread")]
    Reentrant,
}

thread_local! {
    /// The UI thread's state, as `Rc<RefCell<S>>`.
    static UI_STATE: RefCell<Option<Rc<dyn Any>>> = const { RefCell::new(None) };
}

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Interrupts a blocked [`EventLoop::run_once`] from any thread.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Native event source serviced by the UI thread between marshaled jobs.
pub trait EventLoop {
    /// Handle that makes a blocked [`EventLoop::run_once`] return.
    fn waker(&self) -> Waker;

    /// Waits for one native event or wakeup and handles it.
    ///
    /// Returns false once the native loop has nothing more to deliver; the
    /// UI thread then waits for jobs only.
    fn run_once(&mut self) -> bool;
}

enum Message<S> {
    Run(Job<S>),
    Quit,
}

enum Reply<R> {
    Pending,
    Done(R),
    Dropped,
}

/// One-shot rendezvous between a caller and the UI thread.
struct ReplySlot<R> {
    reply: Mutex<Reply<R>>,
    ready: Condvar,
}

impl<R> ReplySlot<R> {
    fn new() -> Self {
        Self {
            reply: Mutex::new(Reply::Pending),
            ready: Condvar::new(),
        }
    }

    fn finish(&self, reply: Reply<R>) {
        *self.reply.lock() = reply;
        self.ready.notify_all();
    }

    fn wait(&self) -> Result<R, MarshalError> {
        let mut guard = self.reply.lock();
        loop {
            match std::mem::replace(&mut *guard, Reply::Pending) {
                Reply::Pending => self.ready.wait(&mut guard),
                Reply::Done(value) => return Ok(value),
                Reply::Dropped => return Err(MarshalError::Disconnected),
            }
        }
    }
}

/// Completes a reply slot. Dropping it unfinished wakes the caller with
/// [`MarshalError::Disconnected`].
struct Completer<R> {
    slot: Option<Arc<ReplySlot<R>>>,
}

impl<R> Completer<R> {
    fn complete(mut self, value: R) {
        if let Some(slot) = self.slot.take() {
            slot.finish(Reply::Done(value));
        }
    }
}

impl<R> Drop for Completer<R> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.finish(Reply::Dropped);
        }
    }
}

/// Sends work to a [`UiThread`]. Cheap to clone, usable from any thread.
pub struct UiHandle<S> {
    tx: Sender<Message<S>>,
    ui_thread: ThreadId,
    waker: Option<Waker>,
}

impl<S> Clone for UiHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            ui_thread: self.ui_thread,
            waker: self.waker.clone(),
        }
    }
}

impl<S> std::fmt::Debug for UiHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle")
            .field("ui_thread", &self.ui_thread)
            .field("queued", &self.tx.len())
            .field("event_loop", &self.waker.is_some())
            .finish()
    }
}

impl<S: 'static> UiHandle<S> {
    /// Returns true when called on the UI thread.
    #[must_use]
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// Runs `f` on the UI thread and returns its result.
    ///
    /// From another thread this blocks until the UI thread has run `f`.
    /// On the UI thread `f` runs immediately.
    ///
    /// # Errors
    ///
    /// [`MarshalError::Disconnected`] if the UI thread is gone or dropped
    /// the call. [`MarshalError::Reentrant`] if called on the UI thread
    /// from inside another marshaled call.
    pub fn run<R, F>(&self, f: F) -> Result<R, MarshalError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_ui_thread() {
            return Self::run_in_place(f);
        }

        let slot = Arc::new(ReplySlot::new());
        let completer = Completer {
            slot: Some(Arc::clone(&slot)),
        };
        let job: Job<S> = Box::new(move |state| completer.complete(f(state)));

        if self.send(Message::Run(job)).is_err() {
            tracing::warn!("marshaled call after UI thread exit");
            return Err(MarshalError::Disconnected);
        }
        slot.wait()
    }

    /// Queues `f` to run on the UI thread without waiting.
    ///
    /// # Errors
    ///
    /// [`MarshalError::Disconnected`] if the UI thread is gone.
    pub fn post<F>(&self, f: F) -> Result<(), MarshalError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.send(Message::Run(Box::new(f)))
    }

    fn send(&self, message: Message<S>) -> Result<(), MarshalError> {
        self.tx
            .send(message)
            .map_err(|_| MarshalError::Disconnected)?;
        if let Some(wake) = &self.waker {
            wake();
        }
        Ok(())
    }

    fn run_in_place<R>(f: impl FnOnce(&mut S) -> R) -> Result<R, MarshalError> {
        let state = UI_STATE
            .with(|slot| slot.borrow().clone())
            .and_then(|any| any.downcast::<RefCell<S>>().ok())
            .ok_or(MarshalError::Disconnected)?;

        let Ok(mut guard) = state.try_borrow_mut() else {
            tracing::warn!("reentrant marshaled call on the UI thread");
            return Err(MarshalError::Reentrant);
        };
        Ok(f(&mut guard))
    }
}

/// The dedicated UI thread and its job loop.
pub struct UiThread<S: 'static> {
    handle: UiHandle<S>,
    thread: Option<JoinHandle<()>>,
}

impl<S: 'static> UiThread<S> {
    /// Spawns the UI thread and builds its state there with `init`.
    ///
    /// The thread only runs marshaled jobs. Returns once `init` has finished.
    ///
    /// # Errors
    ///
    /// Whatever `init` returns, or [`MinuiError::Backend`] if the thread
    /// could not be spawned.
    pub fn spawn<F>(name: &str, init: F) -> MinuiResult<Self>
    where
        F: FnOnce() -> MinuiResult<S> + Send + 'static,
    {
        Self::start(name, move || init().map(|state| (state, None)), job_loop)
    }

    /// Like [`UiThread::spawn`], but the thread also runs the state's
    /// native event loop for as long as it lives.
    ///
    /// # Errors
    ///
    /// Same as [`UiThread::spawn`].
    pub fn spawn_event_loop<F>(name: &str, init: F) -> MinuiResult<Self>
    where
        S: EventLoop,
        F: FnOnce() -> MinuiResult<S> + Send + 'static,
    {
        let init = move || {
            init().map(|state| {
                let waker = state.waker();
                (state, Some(waker))
            })
        };
        Self::start(name, init, event_loop)
    }

    fn start<F>(
        name: &str,
        init: F,
        run: fn(&RefCell<S>, &Receiver<Message<S>>),
    ) -> MinuiResult<Self>
    where
        F: FnOnce() -> MinuiResult<(S, Option<Waker>)> + Send + 'static,
    {
        let (tx, rx) = unbounded::<Message<S>>();
        let (ready_tx, ready_rx) = bounded::<MinuiResult<Option<Waker>>>(1);

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let state = match init() {
                    Ok((state, waker)) => {
                        let state = Rc::new(RefCell::new(state));
                        UI_STATE.with(|slot| {
                            *slot.borrow_mut() = Some(Rc::clone(&state) as Rc<dyn Any>);
                        });
                        let _ = ready_tx.send(Ok(waker));
                        state
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                run(&state, &rx);

                UI_STATE.with(|slot| slot.borrow_mut().take());
            })
            .map_err(|e| MinuiError::Backend(format!("failed to spawn UI thread: {e}")))?;

        let ui_thread = thread.thread().id();
        let waker = match ready_rx.recv().unwrap_or(Err(MarshalError::Disconnected.into())) {
            Ok(waker) => waker,
            Err(e) => {
                let _ = thread.join();
                return Err(e);
            }
        };

        tracing::debug!("UI thread {:?} started", name);
        Ok(Self {
            handle: UiHandle {
                tx,
                ui_thread,
                waker,
            },
            thread: Some(thread),
        })
    }

    /// Returns a handle for other threads.
    #[must_use]
    pub fn handle(&self) -> UiHandle<S> {
        self.handle.clone()
    }

    /// Stops the job loop after the already queued jobs and joins the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.handle.send(Message::Quit);
        if self.handle.is_ui_thread() {
            return;
        }
        if thread.join().is_err() {
            tracing::warn!("UI thread panicked");
        }
    }
}

impl<S: 'static> std::ops::Deref for UiThread<S> {
    type Target = UiHandle<S>;

    fn deref(&self) -> &UiHandle<S> {
        &self.handle
    }
}

impl<S: 'static> Drop for UiThread<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn job_loop<S>(state: &RefCell<S>, rx: &Receiver<Message<S>>) {
    for message in rx {
        match message {
            Message::Run(job) => job(&mut state.borrow_mut()),
            Message::Quit => break,
        }
    }
}

fn event_loop<S: EventLoop>(state: &RefCell<S>, rx: &Receiver<Message<S>>) {
    loop {
        for message in rx.try_iter() {
            match message {
                Message::Run(job) => job(&mut state.borrow_mut()),
                Message::Quit => return,
            }
        }

        if state.borrow_mut().run_once() {
            continue;
        }

        // Native loop finished or idle.
        match rx.recv() {
            Ok(Message::Run(job)) => job(&mut state.borrow_mut()),
            Ok(Message::Quit) | Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Deliberately `!Send` state.
    struct Counter {
        value: Rc<Cell<u32>>,
        log: Vec<u32>,
    }

    fn spawn_counter() -> UiThread<Counter> {
        UiThread::spawn("ui-test", || {
            Ok(Counter {
                value: Rc::new(Cell::new(0)),
                log: Vec::new(),
            })
        })
        .unwrap()
    }

    #[test]
    fn test_run_returns_result() {
        let ui = spawn_counter();
        let value = ui
            .run(|c| {
                c.value.set(c.value.get() + 5);
                c.value.get()
            })
            .unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn test_posts_run_in_order() {
        let ui = spawn_counter();
        for i in 0..100 {
            ui.post(move |c| c.log.push(i)).unwrap();
        }
        let log = ui.run(|c| c.log.clone()).unwrap();
        assert_eq!(log, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_reentrant_call_is_rejected() {
        let ui = spawn_counter();
        let handle = ui.handle();
        let inner = ui
            .run(move |_| handle.run(|c| c.value.get()))
            .unwrap();
        assert_eq!(inner, Err(MarshalError::Reentrant));
    }

    #[test]
    fn test_init_failure_is_reported() {
        let result = UiThread::<Counter>::spawn("ui-fail", || {
            Err(MinuiError::Backend("no display".to_string()))
        });
        assert!(matches!(result, Err(MinuiError::Backend(_))));
    }

    #[test]
    fn test_call_after_shutdown() {
        let ui = spawn_counter();
        let handle = ui.handle();
        ui.shutdown();
        assert_eq!(handle.run(|c| c.value.get()), Err(MarshalError::Disconnected));
    }

    /// Native source fed by the test; `None` is a wakeup.
    struct Feed {
        native: Receiver<Option<u32>>,
        wake: Sender<Option<u32>>,
        seen: Vec<u32>,
    }

    impl EventLoop for Feed {
        fn waker(&self) -> Waker {
            let wake = self.wake.clone();
            Arc::new(move || {
                let _ = wake.send(None);
            })
        }

        fn run_once(&mut self) -> bool {
            match self.native.recv() {
                Ok(Some(value)) => {
                    self.seen.push(value);
                    true
                }
                Ok(None) => true,
                Err(_) => false,
            }
        }
    }

    #[test]
    fn test_event_loop_interleaves_native_events_and_jobs() {
        let (native_tx, native_rx) = unbounded();
        let wake = native_tx.clone();
        let ui = UiThread::spawn_event_loop("ui-feed", move || {
            Ok(Feed {
                native: native_rx,
                wake,
                seen: Vec::new(),
            })
        })
        .unwrap();

        // Jobs complete while the loop is parked in `run_once`.
        assert!(ui.run(|feed| feed.seen.is_empty()).unwrap());

        native_tx.send(Some(1)).unwrap();
        native_tx.send(Some(2)).unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            let seen = ui.run(|feed| feed.seen.clone()).unwrap();
            if seen == [1, 2] {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "native events not handled: {seen:?}");
            thread::sleep(std::time::Duration::from_millis(1));
        }
        ui.shutdown();
    }

    #[test]
    fn test_panicking_job_wakes_caller() {
        let ui = spawn_counter();
        let handle = ui.handle();
        let result = handle.run(|_| -> u32 { panic!("boom") });
        assert_eq!(result, Err(MarshalError::Disconnected));
    }
}
