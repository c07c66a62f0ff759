//! Timed actions
//!
//! A [`TimedAction`] pairs an [`Effect`] with a nominal duration, an easing
//! curve and a [`SkipToken`]. Starting it hands an [`ActionDriver`] to the
//! [`HostLoop`], which evaluates the action's progress once per tick.
//!
//! Forced finish is cooperative: `force_finish` only raises the token. The
//! driver consults the token on every evaluation and, once it is raised,
//! reports progress 1.0 and completes on that evaluation.

use crate::effect::Effect;
use crate::error::{Error, Result};
use crate::host::HostLoop;
use ckit_common::time::format_duration;
use ckit_common::Easing;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// One-shot callback run by the host after an evaluation pass
pub(crate) type Callback = Box<dyn FnOnce()>;

/// Cooperative cancellation token
///
/// Clones share the same flag. Cancellation is terminal: once requested it
/// can never be cleared.
#[derive(Debug, Clone, Default)]
pub struct SkipToken {
    cancelled: Rc<Cell<bool>>,
}

impl SkipToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    ///
    /// Returns `true` only for the request that actually raised it.
    pub fn request_cancel(&self) -> bool {
        !self.cancelled.replace(true)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Hook fired when an action's elapsed time reaches `at`
struct Cue {
    at: Duration,
    hook: Callback,
}

/// How an action reached completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitReason {
    /// Elapsed time reached the nominal duration
    Natural,
    /// The skip token was raised
    Forced,
}

/// A unit of timed work with a forced-finish capability
pub struct TimedAction {
    id: Uuid,
    name: String,
    duration: Duration,
    easing: Easing,
    skip: SkipToken,
    cues: Vec<Cue>,
    /// Taken by `start`; `None` means the action was started
    effect: Option<Box<dyn Effect>>,
}

impl TimedAction {
    /// Wrap an effect; the nominal duration is read from it once, here
    pub fn new<E: Effect + 'static>(effect: E) -> Self {
        let duration = effect.duration();
        let name = effect.name().to_string();
        Self {
            id: Uuid::new_v4(),
            name,
            duration,
            easing: Easing::default(),
            skip: SkipToken::new(),
            cues: Vec::new(),
            effect: Some(Box::new(effect)),
        }
    }

    /// Set the easing curve applied to progress
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Register a hook fired once when elapsed time first reaches `at`
    ///
    /// Cues fire in offset order (registration order for equal offsets).
    /// A forced finish discards cues that were not reached yet, as does a
    /// natural finish for cues placed beyond the nominal duration.
    pub fn with_cue(mut self, at: Duration, hook: impl FnOnce() + 'static) -> Self {
        let index = self.cues.partition_point(|cue| cue.at <= at);
        self.cues.insert(
            index,
            Cue {
                at,
                hook: Box::new(hook),
            },
        );
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nominal_duration(&self) -> Duration {
        self.duration
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn is_started(&self) -> bool {
        self.effect.is_none()
    }

    pub fn is_skip_requested(&self) -> bool {
        self.skip.is_cancelled()
    }

    /// Token shared with the running driver
    pub fn skip_token(&self) -> SkipToken {
        self.skip.clone()
    }

    /// Request that the action report completion on its next evaluation
    ///
    /// Safe before `start` (the start then completes immediately) and
    /// idempotent: the completion callback still fires exactly once.
    pub fn force_finish(&self) {
        if self.skip.request_cancel() {
            debug!(action_id = %self.id, effect = %self.name, "Forced finish requested");
        }
    }

    /// Start the effect on `host`
    ///
    /// `on_complete` fires exactly once, after the effect's `finish`. If the
    /// skip token is already raised, or the nominal duration is zero, the
    /// action completes before `start` returns.
    ///
    /// # Errors
    /// `Error::AlreadyStarted` if the action was started before.
    pub fn start(&mut self, host: &HostLoop, on_complete: impl FnOnce() + 'static) -> Result<()> {
        let effect = self.effect.take().ok_or(Error::AlreadyStarted(self.id))?;

        debug!(
            action_id = %self.id,
            effect = %self.name,
            duration = %format_duration(self.duration),
            "Starting action"
        );

        host.launch(ActionDriver {
            id: self.id,
            name: self.name.clone(),
            duration: self.duration,
            easing: self.easing,
            skip: self.skip.clone(),
            cues: std::mem::take(&mut self.cues),
            effect,
            elapsed: Duration::ZERO,
            on_complete: Some(Box::new(on_complete)),
        });
        Ok(())
    }
}

impl fmt::Debug for TimedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedAction")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("skip_requested", &self.skip.is_cancelled())
            .field("started", &self.is_started())
            .field("cues", &self.cues.len())
            .finish()
    }
}

/// Running state of a started action, owned by the host loop
pub(crate) struct ActionDriver {
    id: Uuid,
    name: String,
    duration: Duration,
    easing: Easing,
    skip: SkipToken,
    cues: Vec<Cue>,
    effect: Box<dyn Effect>,
    elapsed: Duration,
    on_complete: Option<Callback>,
}

impl ActionDriver {
    /// First evaluation, at elapsed zero. Returns `true` when done.
    pub(crate) fn begin(&mut self, deferred: &mut Vec<Callback>) -> bool {
        self.effect.begin();
        self.evaluate(deferred)
    }

    /// Advance elapsed time by `dt` and evaluate. Returns `true` when done.
    pub(crate) fn advance(&mut self, dt: Duration, deferred: &mut Vec<Callback>) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.evaluate(deferred)
    }

    /// The progress function: forced finish wins over elapsed time
    fn evaluate(&mut self, deferred: &mut Vec<Callback>) -> bool {
        if self.skip.is_cancelled() {
            self.effect.update(1.0);
            self.complete(ExitReason::Forced, deferred);
            return true;
        }

        while self.cues.first().is_some_and(|cue| self.elapsed >= cue.at) {
            let cue = self.cues.remove(0);
            deferred.push(cue.hook);
        }

        if self.elapsed >= self.duration {
            self.effect.update(1.0);
            self.complete(ExitReason::Natural, deferred);
            return true;
        }

        // elapsed < duration, so duration is non-zero here
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.effect.update(self.easing.apply(t as f32));
        false
    }

    fn complete(&mut self, exit: ExitReason, deferred: &mut Vec<Callback>) {
        // Single cleanup path for both exits
        self.effect.finish();

        if !self.cues.is_empty() {
            debug!(
                action_id = %self.id,
                count = self.cues.len(),
                "Discarding unreached cues"
            );
            self.cues.clear();
        }

        debug!(
            action_id = %self.id,
            effect = %self.name,
            exit = ?exit,
            elapsed = %format_duration(self.elapsed),
            "Action completed"
        );

        if let Some(callback) = self.on_complete.take() {
            deferred.push(callback);
        }
    }
}
