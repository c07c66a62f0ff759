//! Effect contract
//!
//! An effect is the concrete work behind a [`TimedAction`](crate::TimedAction):
//! a move, a fade, a caption, a video. The scheduler never looks inside an
//! effect; it only drives it through this trait.

use std::time::Duration;

/// Capability set the scheduler needs from an effect
///
/// Call order for one start is always
/// `begin` → `update`* → `finish`, with `finish` called exactly once on
/// every exit path (natural end or forced finish). Anything the effect
/// attached to the presentation layer in `begin` is released in `finish`.
pub trait Effect {
    /// Short name used in logs
    fn name(&self) -> &str {
        "effect"
    }

    /// Nominal running time
    fn duration(&self) -> Duration;

    /// The owning action started
    fn begin(&mut self) {}

    /// Apply progress (0.0..=1.0, already eased)
    ///
    /// A forced finish is reported as a final `update(1.0)`.
    fn update(&mut self, progress: f32);

    /// The action is done; release transient resources
    fn finish(&mut self) {}
}

impl<E: Effect + ?Sized> Effect for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn duration(&self) -> Duration {
        (**self).duration()
    }

    fn begin(&mut self) {
        (**self).begin()
    }

    fn update(&mut self, progress: f32) {
        (**self).update(progress)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}
