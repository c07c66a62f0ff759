//! Dialogue caption
//!
//! The overlay is owned by the effect: attached in `begin`, detached in
//! `finish`, so natural and forced exits share the same cleanup.

use crate::effect::Effect;
use crate::stage::{OverlayId, Stage};
use std::time::Duration;

/// Shows `text` on `target` for `duration`
#[derive(Debug)]
pub struct Caption {
    stage: Stage,
    target: String,
    text: String,
    duration: Duration,
    overlay: Option<OverlayId>,
}

impl Caption {
    pub fn new(
        stage: &Stage,
        target: impl Into<String>,
        text: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            stage: stage.clone(),
            target: target.into(),
            text: text.into(),
            duration,
            overlay: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Effect for Caption {
    fn name(&self) -> &str {
        "caption"
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn begin(&mut self) {
        self.overlay = Some(self.stage.attach_overlay(&self.target, self.text.clone()));
    }

    fn update(&mut self, _progress: f32) {}

    fn finish(&mut self) {
        if let Some(id) = self.overlay.take() {
            self.stage.detach_overlay(&self.target, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HostLoop, TimedAction};

    #[test]
    fn test_overlay_lives_for_duration() {
        let stage = Stage::new();
        let host = HostLoop::new();
        let mut action =
            TimedAction::new(Caption::new(&stage, "hero", "Hello World", Duration::from_secs(3)));

        action.start(&host, || {}).unwrap();
        assert_eq!(stage.overlays("hero")[0].text, "Hello World");

        host.tick(Duration::from_secs(2));
        assert_eq!(stage.overlay_count(), 1);

        host.tick(Duration::from_secs(1));
        assert_eq!(stage.overlay_count(), 0);
    }

    #[test]
    fn test_overlay_removed_on_forced_finish() {
        let stage = Stage::new();
        let host = HostLoop::new();
        let mut action =
            TimedAction::new(Caption::new(&stage, "hero", "Skip me", Duration::from_secs(30)));

        action.start(&host, || {}).unwrap();
        action.force_finish();
        host.tick(Duration::from_millis(16));

        assert_eq!(stage.overlay_count(), 0);
    }
}
