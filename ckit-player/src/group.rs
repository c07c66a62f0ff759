//! Groups: concurrent batches of timed actions
//!
//! All members of a group start together. The group's single completion is
//! driven by its designated member, the one with the strictly greatest
//! nominal duration (first inserted wins ties). Other members' completions
//! are ignored.

use crate::action::{SkipToken, TimedAction};
use crate::error::{Error, Result};
use crate::host::HostLoop;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Group lifecycle: `Idle → Running → Completed`
///
/// A skipped group completes through its designated member like any other,
/// so there is no separate skipped state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPhase {
    Idle,
    Running,
    Completed,
}

/// An unordered batch of actions with one derived completion signal
#[derive(Debug)]
pub struct Group {
    id: Uuid,
    label: Option<String>,
    /// Insertion order; only used for start order and tie-breaks
    members: Vec<TimedAction>,
    phase: Rc<Cell<GroupPhase>>,
}

impl Group {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            label: None,
            members: Vec::new(),
            phase: Rc::new(Cell::new(GroupPhase::Idle)),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build a group from actions, in order
    pub fn from_actions(actions: impl IntoIterator<Item = TimedAction>) -> Result<Self> {
        let mut group = Self::new();
        for action in actions {
            group.push(action)?;
        }
        Ok(group)
    }

    /// Append a member
    ///
    /// # Errors
    /// `Error::InvalidState` if the group already ran or the action was
    /// already started elsewhere.
    pub fn push(&mut self, action: TimedAction) -> Result<()> {
        if self.phase() != GroupPhase::Idle {
            return Err(Error::InvalidState(format!(
                "cannot add members to group {} after it started",
                self.id
            )));
        }
        if action.is_started() {
            return Err(Error::InvalidState(format!(
                "action {} was already started",
                action.id()
            )));
        }
        self.members.push(action);
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[TimedAction] {
        &self.members
    }

    pub fn phase(&self) -> GroupPhase {
        self.phase.get()
    }

    /// Longest nominal duration among members (zero for an empty group)
    pub fn nominal_duration(&self) -> Duration {
        self.designated_index()
            .map(|index| self.members[index].nominal_duration())
            .unwrap_or(Duration::ZERO)
    }

    /// Index of the member that drives completion
    ///
    /// Strictly-greater scan: among equal maxima the earliest member wins.
    /// `None` for an empty group.
    pub fn designated_index(&self) -> Option<usize> {
        let mut best: Option<(usize, Duration)> = None;
        for (index, member) in self.members.iter().enumerate() {
            let duration = member.nominal_duration();
            match best {
                Some((_, longest)) if duration <= longest => {}
                _ => best = Some((index, duration)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Start every member on `host`
    ///
    /// `on_complete` fires exactly once, when the designated member
    /// completes, and never before every member's `start` has returned. An
    /// empty group completes before `run` returns.
    ///
    /// # Errors
    /// `Error::InvalidState` if the group is not Idle.
    pub fn run(&mut self, host: &HostLoop, on_complete: impl FnOnce() + 'static) -> Result<()> {
        if self.phase() != GroupPhase::Idle {
            return Err(Error::InvalidState(format!(
                "group {} already ran ({:?})",
                self.id,
                self.phase()
            )));
        }
        self.phase.set(GroupPhase::Running);

        let phase = self.phase.clone();
        let finish = move || {
            phase.set(GroupPhase::Completed);
            on_complete();
        };

        let Some(designated) = self.designated_index() else {
            debug!(group_id = %self.id, "Empty group, completing immediately");
            finish();
            return Ok(());
        };

        debug!(
            group_id = %self.id,
            members = self.members.len(),
            designated,
            "Running group"
        );

        let gate = CompletionGate::new(finish);
        for (index, member) in self.members.iter_mut().enumerate() {
            if index == designated {
                let gate = gate.clone();
                member.start(host, move || gate.trigger())?;
            } else {
                member.start(host, || {})?;
            }
        }
        gate.open();
        Ok(())
    }

    /// Force-finish every member, in member order
    ///
    /// Does not call the completion itself: the designated member reports
    /// completion on its next evaluation and that drives it.
    pub fn skip(&self) {
        debug!(group_id = %self.id, "Skipping group");
        for member in &self.members {
            member.force_finish();
        }
    }

    /// Non-owning view used to route skip and observe phase
    pub fn handle(&self) -> GroupHandle {
        GroupHandle {
            id: self.id,
            label: self.label.clone(),
            tokens: self.members.iter().map(TimedAction::skip_token).collect(),
            designated: self.designated_index(),
            phase: self.phase.clone(),
        }
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

/// Observation handle on a group
///
/// Holds clones of the members' skip tokens, not the members themselves.
#[derive(Debug, Clone)]
pub struct GroupHandle {
    id: Uuid,
    label: Option<String>,
    tokens: Vec<SkipToken>,
    designated: Option<usize>,
    phase: Rc<Cell<GroupPhase>>,
}

impl GroupHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn member_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn designated_index(&self) -> Option<usize> {
        self.designated
    }

    pub fn phase(&self) -> GroupPhase {
        self.phase.get()
    }

    /// Whether any member has a forced finish pending or done
    pub fn skip_requested(&self) -> bool {
        self.tokens.iter().any(SkipToken::is_cancelled)
    }

    /// Same effect as [`Group::skip`]
    pub fn skip(&self) {
        debug!(group_id = %self.id, "Skipping group");
        for token in &self.tokens {
            token.request_cancel();
        }
    }
}

/// Holds the group completion until every member has been started
#[derive(Clone)]
struct CompletionGate {
    inner: Rc<RefCell<GateState>>,
}

struct GateState {
    open: bool,
    triggered: bool,
    callback: Option<Box<dyn FnOnce()>>,
}

impl CompletionGate {
    fn new(callback: impl FnOnce() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GateState {
                open: false,
                triggered: false,
                callback: Some(Box::new(callback)),
            })),
        }
    }

    fn trigger(&self) {
        let callback = {
            let mut state = self.inner.borrow_mut();
            state.triggered = true;
            if state.open {
                state.callback.take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    fn open(&self) {
        let callback = {
            let mut state = self.inner.borrow_mut();
            state.open = true;
            if state.triggered {
                state.callback.take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}
