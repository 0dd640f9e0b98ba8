//! Fixed-capacity timer table.
//!
//! Slots are handed out in order and never reused. A callback returns
//! `true` to stop its timer; the slot is then deactivated, so fires the
//! native system had already queued are ignored.

/// Maximum timers per window.
pub const TIMER_CAPACITY: usize = 32;

/// Timer callback. Returns true to stop the timer.
pub type TimerFn = Box<dyn FnMut() -> bool>;

/// Outcome of delivering a fire to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFire {
    /// Callback ran and asked to keep going.
    Continue,
    /// Callback ran and asked to stop; the native timer must be killed.
    Stopped,
    /// Slot is unknown or already stopped; nothing ran.
    Inactive,
}

struct TimerSlot {
    interval_ms: u32,
    callback: TimerFn,
    active: bool,
}

/// Timer slots for one window.
#[derive(Default)]
pub struct TimerTable {
    slots: Vec<TimerSlot>,
}

impl std::fmt::Debug for TimerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerTable")
            .field("slots", &self.slots.len())
            .field("active", &self.active_count())
            .finish()
    }
}

impl TimerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(TIMER_CAPACITY),
        }
    }

    /// Registers a timer. Returns its slot id, or None when the table is full.
    pub fn add(&mut self, interval_ms: u32, callback: impl FnMut() -> bool + 'static) -> Option<usize> {
        if self.slots.len() >= TIMER_CAPACITY {
            return None;
        }
        self.slots.push(TimerSlot {
            interval_ms,
            callback: Box::new(callback),
            active: true,
        });
        Some(self.slots.len() - 1)
    }

    /// Runs the callback for `id` if it is still active.
    pub fn fire(&mut self, id: usize) -> TimerFire {
        let Some(slot) = self.slots.get_mut(id) else {
            return TimerFire::Inactive;
        };
        if !slot.active {
            return TimerFire::Inactive;
        }
        if (slot.callback)() {
            slot.active = false;
            TimerFire::Stopped
        } else {
            TimerFire::Continue
        }
    }

    /// Deactivates every slot and returns the ids that were running.
    pub fn stop_all(&mut self) -> Vec<usize> {
        let mut stopped = Vec::new();
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if slot.active {
                slot.active = false;
                stopped.push(id);
            }
        }
        stopped
    }

    /// Returns true if `id` is registered and running.
    #[must_use]
    pub fn is_active(&self, id: usize) -> bool {
        self.slots.get(id).is_some_and(|s| s.active)
    }

    /// Interval of `id` in milliseconds.
    #[must_use]
    pub fn interval(&self, id: usize) -> Option<u32> {
        self.slots.get(id).map(|s| s.interval_ms)
    }

    /// Number of slots handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no timer was ever added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of running timers.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }
}
