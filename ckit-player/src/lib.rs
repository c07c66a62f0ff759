//! # CutsceneKit Player
//!
//! Cooperative, single-threaded cutscene scheduler:
//!
//! - [`TimedAction`]: one effect with a nominal duration and a skip token
//! - [`Group`]: actions started together, completing with their longest member
//! - [`Playlist`]: a FIFO of groups played strictly one after another
//! - [`HostLoop`]: the logical clock that evaluates running actions
//!
//! Plus a minimal [`Stage`] for effects to draw on and a TOML [`script`]
//! format for authoring cutscenes.

pub mod action;
pub mod effect;
pub mod effects;
pub mod error;
pub mod group;
pub mod host;
pub mod playlist;
pub mod script;
pub mod stage;

pub use action::{SkipToken, TimedAction};
pub use effect::Effect;
pub use error::{Error, Result};
pub use group::{Group, GroupHandle, GroupPhase};
pub use host::HostLoop;
pub use playlist::{Playlist, PlaylistPhase};
pub use stage::Stage;
