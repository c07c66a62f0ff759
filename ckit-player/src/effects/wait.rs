use crate::effect::Effect;
use std::time::Duration;

/// Does nothing for `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    duration: Duration,
}

impl Wait {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Effect for Wait {
    fn name(&self) -> &str {
        "wait"
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn update(&mut self, _progress: f32) {}
}
