//! Shared test helpers for ckit-player integration tests
//!
//! `Probe` is an effect that writes `"<name> begin"` / `"<name> finish"` to
//! a shared log, so tests can assert cross-group start and finish order.

#![allow(dead_code)]

use ckit_player::{Effect, Group, HostLoop, TimedAction};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct Probe {
    name: String,
    duration: Duration,
    log: Log,
}

impl Effect for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn begin(&mut self) {
        self.log.borrow_mut().push(format!("{} begin", self.name));
    }

    fn update(&mut self, _progress: f32) {}

    fn finish(&mut self) {
        self.log.borrow_mut().push(format!("{} finish", self.name));
    }
}

pub fn probe(log: &Log, name: &str, secs: u64) -> TimedAction {
    TimedAction::new(Probe {
        name: name.to_string(),
        duration: Duration::from_secs(secs),
        log: log.clone(),
    })
}

/// Group labelled `name` whose members are named `name0`, `name1`, ...
pub fn probe_group(log: &Log, name: &str, durations: &[u64]) -> Group {
    Group::from_actions(
        durations
            .iter()
            .enumerate()
            .map(|(i, &secs)| probe(log, &format!("{}{}", name, i), secs)),
    )
    .expect("fresh actions")
    .with_label(name)
}

/// Position of `entry` in the log; panics if absent
pub fn position(log: &Log, entry: &str) -> usize {
    log.borrow()
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("'{}' not in log: {:?}", entry, log.borrow()))
}

pub fn contains(log: &Log, entry: &str) -> bool {
    log.borrow().iter().any(|e| e == entry)
}

/// Records how often and at which logical time a completion fired
#[derive(Clone)]
pub struct Completion {
    count: Rc<Cell<u32>>,
    at: Rc<Cell<Option<Duration>>>,
}

impl Completion {
    pub fn new() -> Self {
        Self {
            count: Rc::new(Cell::new(0)),
            at: Rc::new(Cell::new(None)),
        }
    }

    pub fn callback(&self, host: &HostLoop) -> impl FnOnce() + 'static {
        let me = self.clone();
        let host = host.clone();
        move || {
            me.count.set(me.count.get() + 1);
            me.at.set(Some(host.now()));
        }
    }

    pub fn count(&self) -> u32 {
        self.count.get()
    }

    pub fn fired_at(&self) -> Option<Duration> {
        self.at.get()
    }
}

pub fn tick_secs(host: &HostLoop, n: u64) {
    for _ in 0..n {
        host.tick(Duration::from_secs(1));
    }
}
