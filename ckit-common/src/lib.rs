//! # CutsceneKit Common Library
//!
//! Shared code for the CutsceneKit scheduler and player including:
//! - Error types
//! - Time and duration helpers
//! - Easing curve definitions
//! - Event types (CutsceneEvent enum) and the EventBus
//! - Configuration loading

pub mod config;
pub mod easing;
pub mod error;
pub mod events;
pub mod time;

pub use easing::Easing;
pub use error::{Error, Result};
