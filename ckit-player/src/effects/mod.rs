//! Stock effects
//!
//! - [`Wait`]: holds for its duration
//! - [`Caption`]: shows a text overlay on a stage node
//! - [`Tween`]: interpolates a stage node property

mod caption;
mod tween;
mod wait;

pub use caption::Caption;
pub use tween::Tween;
pub use wait::Wait;
