//! Easing curves for timed actions
//!
//! An easing curve maps normalized elapsed time (0.0 at start, 1.0 at the
//! nominal duration) to the progress value handed to an effect. Curves only
//! shape progress; they never change when an action completes.
//!
//! Every curve satisfies `apply(0.0) == 0.0` and `apply(1.0) == 1.0`.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Easing curve types
///
/// - Linear: Constant rate of change
/// - EaseIn: Slow start, fast finish
/// - EaseOut: Fast start, slow finish
/// - EaseInOut: Smooth acceleration and deceleration (cosine S-curve)
/// - SmoothStep: Hermite polynomial, flat tangents at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// v(t) = t
    #[default]
    Linear,

    /// v(t) = t²
    EaseIn,

    /// v(t) = 1 - (1-t)²
    EaseOut,

    /// v(t) = 0.5 × (1 - cos(π × t))
    EaseInOut,

    /// v(t) = t² × (3 - 2t)
    SmoothStep,
}

impl Easing {
    /// Map normalized time to progress
    ///
    /// # Arguments
    /// * `t` - Normalized elapsed time, clamped to 0.0..=1.0
    ///
    /// # Returns
    /// Progress in 0.0..=1.0
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            Easing::EaseInOut => 0.5 * (1.0 - (PI * t).cos()),
            Easing::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Parse curve from string (config files and scripts)
    ///
    /// Case-insensitive. Accepts:
    /// - 'linear'
    /// - 'ease_in', 'easein', 'ease-in', 'in'
    /// - 'ease_out', 'easeout', 'ease-out', 'out'
    /// - 'ease_in_out', 'easeinout', 'ease-in-out', 'in_out', 'cosine'
    /// - 'smooth_step', 'smoothstep'
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(Easing::Linear),
            "ease_in" | "easein" | "ease-in" | "in" => Some(Easing::EaseIn),
            "ease_out" | "easeout" | "ease-out" | "out" => Some(Easing::EaseOut),
            "ease_in_out" | "easeinout" | "ease-in-out" | "in_out" | "cosine" => {
                Some(Easing::EaseInOut)
            }
            "smooth_step" | "smoothstep" => Some(Easing::SmoothStep),
            _ => None,
        }
    }

    /// Canonical string representation (lowercase, underscored)
    pub fn as_str(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease_in",
            Easing::EaseOut => "ease_out",
            Easing::EaseInOut => "ease_in_out",
            Easing::SmoothStep => "smooth_step",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::EaseIn => "Ease In",
            Easing::EaseOut => "Ease Out",
            Easing::EaseInOut => "Ease In-Out",
            Easing::SmoothStep => "Smooth Step",
        }
    }

    /// Get all available easing variants
    pub fn all_variants() -> &'static [Easing] {
        &[
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::SmoothStep,
        ]
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for easing in Easing::all_variants() {
            let start = easing.apply(0.0);
            let end = easing.apply(1.0);
            assert!(
                start.abs() < 1e-6,
                "{:?} at 0.0 should be 0.0, got {}",
                easing,
                start
            );
            assert!(
                (end - 1.0).abs() < 1e-6,
                "{:?} at 1.0 should be 1.0, got {}",
                easing,
                end
            );
        }
    }

    #[test]
    fn test_monotonic() {
        for easing in Easing::all_variants() {
            let mut previous = easing.apply(0.0);
            for step in 1..=100 {
                let value = easing.apply(step as f32 / 100.0);
                assert!(
                    value + 1e-6 >= previous,
                    "{:?} decreased at step {}",
                    easing,
                    step
                );
                previous = value;
            }
        }
    }

    #[test]
    fn test_clamps_out_of_range_input() {
        assert_eq!(Easing::EaseIn.apply(-3.0), 0.0);
        assert_eq!(Easing::EaseOut.apply(7.5), 1.0);
        assert_eq!(Easing::Linear.apply(f32::NAN), 0.0);
    }

    #[test]
    fn test_curve_shapes_at_midpoint() {
        assert!((Easing::Linear.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::EaseIn.apply(0.5) - 0.25).abs() < 1e-6);
        assert!((Easing::EaseOut.apply(0.5) - 0.75).abs() < 1e-6);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::SmoothStep.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_canonical_names() {
        for easing in Easing::all_variants() {
            assert_eq!(Easing::parse(easing.as_str()), Some(*easing));
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Easing::parse("ease-in"), Some(Easing::EaseIn));
        assert_eq!(Easing::parse("OUT"), Some(Easing::EaseOut));
        assert_eq!(Easing::parse("cosine"), Some(Easing::EaseInOut));
        assert_eq!(Easing::parse("SmoothStep"), Some(Easing::SmoothStep));
        assert_eq!(Easing::parse("bounce"), None);
        assert_eq!(Easing::parse(""), None);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            easing: Easing,
        }
        let parsed: Wrapper = toml::from_str("easing = \"ease_in_out\"").unwrap();
        assert_eq!(parsed.easing, Easing::EaseInOut);
    }

    #[test]
    fn test_default_and_display() {
        assert_eq!(Easing::default(), Easing::Linear);
        assert_eq!(format!("{}", Easing::EaseInOut), "Ease In-Out");
    }
}
