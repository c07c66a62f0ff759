//! Host loop
//!
//! The scheduler has no timer of its own. Something outside it (a frame
//! callback, a tokio interval, a test) calls [`HostLoop::tick`] with the time
//! that passed, and every in-flight action is evaluated once.
//!
//! Single-threaded by construction: the loop is an `Rc` handle and all
//! callbacks run on the caller's thread, in the caller's turn.

use crate::action::{ActionDriver, Callback};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Cloneable handle to a logical-clock host loop
#[derive(Clone, Default)]
pub struct HostLoop {
    inner: Rc<RefCell<HostState>>,
}

#[derive(Default)]
struct HostState {
    now: Duration,
    ticks: u64,
    running: Vec<ActionDriver>,
    ticking: bool,
}

impl HostLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical time: the sum of every `dt` passed to `tick`
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of ticks run so far
    pub fn ticks(&self) -> u64 {
        self.inner.borrow().ticks
    }

    /// Actions started and not yet completed
    pub fn in_flight(&self) -> usize {
        self.inner.borrow().running.len()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.borrow().running.is_empty()
    }

    /// Hand a started action to the loop
    ///
    /// The first evaluation happens immediately; an action that is already
    /// done (pre-skipped, zero duration) completes before this returns and
    /// is never stored.
    pub(crate) fn launch(&self, mut driver: ActionDriver) {
        let mut deferred = Vec::new();
        if !driver.begin(&mut deferred) {
            self.inner.borrow_mut().running.push(driver);
        }
        run_deferred(deferred);
    }

    /// Advance the clock by `dt` and evaluate every in-flight action once
    ///
    /// Returns the number of actions that completed on this tick.
    ///
    /// Evaluation runs first for all actions; cue hooks and completion
    /// callbacks run afterwards, in action start order, with no borrow of
    /// the loop held. Actions they start are first evaluated on the next
    /// tick.
    pub fn tick(&self, dt: Duration) -> usize {
        let mut running = {
            let mut state = self.inner.borrow_mut();
            if state.ticking {
                error!("HostLoop::tick called from inside a tick callback; ignoring");
                return 0;
            }
            state.ticking = true;
            state.now = state.now.saturating_add(dt);
            state.ticks += 1;
            std::mem::take(&mut state.running)
        };

        let before = running.len();
        let mut deferred = Vec::new();
        running.retain_mut(|driver| !driver.advance(dt, &mut deferred));
        let completed = before - running.len();

        {
            let mut state = self.inner.borrow_mut();
            // Anything launched while evaluating goes after the survivors
            let launched = std::mem::replace(&mut state.running, running);
            state.running.extend(launched);
        }

        run_deferred(deferred);
        self.inner.borrow_mut().ticking = false;

        completed
    }

    /// Tick with a fixed step until nothing is in flight
    ///
    /// Stops after `max_ticks` so a stalled effect cannot hang the caller.
    /// Returns the number of ticks run.
    pub fn run_until_idle(&self, step: Duration, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while !self.is_idle() && ticks < max_ticks {
            self.tick(step);
            ticks += 1;
        }

        if self.is_idle() {
            debug!(ticks, "Host loop idle");
        } else {
            warn!(
                ticks,
                in_flight = self.in_flight(),
                "Host loop still busy after tick limit"
            );
        }
        ticks
    }
}

fn run_deferred(deferred: Vec<Callback>) {
    for callback in deferred {
        callback();
    }
}

impl fmt::Debug for HostLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("HostLoop")
            .field("now", &state.now)
            .field("ticks", &state.ticks)
            .field("in_flight", &state.running.len())
            .finish()
    }
}
