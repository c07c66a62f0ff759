use crate::effect::Effect;
use crate::stage::Stage;
use std::time::Duration;

/// Interpolates `target.property` to `to` over `duration`
///
/// Starts from `from` when given, otherwise from the property's value at
/// `begin` (0.0 if unset). `finish` always leaves the property at `to`.
#[derive(Debug)]
pub struct Tween {
    stage: Stage,
    target: String,
    property: String,
    from: Option<f32>,
    to: f32,
    duration: Duration,
    start_value: f32,
}

impl Tween {
    pub fn new(
        stage: &Stage,
        target: impl Into<String>,
        property: impl Into<String>,
        to: f32,
        duration: Duration,
    ) -> Self {
        Self {
            stage: stage.clone(),
            target: target.into(),
            property: property.into(),
            from: None,
            to,
            duration,
            start_value: 0.0,
        }
    }

    pub fn from_value(mut self, from: f32) -> Self {
        self.from = Some(from);
        self
    }
}

impl Effect for Tween {
    fn name(&self) -> &str {
        "tween"
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn begin(&mut self) {
        self.start_value = self
            .from
            .or_else(|| self.stage.property(&self.target, &self.property))
            .unwrap_or(0.0);
    }

    fn update(&mut self, progress: f32) {
        let value = self.start_value + (self.to - self.start_value) * progress;
        self.stage.set_property(&self.target, &self.property, value);
    }

    fn finish(&mut self) {
        self.stage.set_property(&self.target, &self.property, self.to);
    }
}
