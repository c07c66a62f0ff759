//! TOML cutscene scripts
//!
//! ```toml
//! [[group]]
//! label = "intro"
//!
//! [[group.action]]
//! kind = "caption"
//! target = "hero"
//! text = "Where am I?"
//! duration = 2.5
//! cues = [{ at = 1.0, note = "blink" }]
//!
//! [[group.action]]
//! kind = "tween"
//! target = "camera"
//! property = "x"
//! to = 40.0
//! duration = 4.0
//! easing = "ease_in_out"
//! ```
//!
//! Each `[[group]]` becomes one [`Group`]; groups play in file order.

use crate::action::TimedAction;
use crate::effect::Effect;
use crate::effects::{Caption, Tween, Wait};
use crate::error::{Error, Result};
use crate::group::Group;
use crate::stage::Stage;
use ckit_common::time::seconds_to_duration;
use ckit_common::Easing;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Parsed script, not yet bound to a stage
///
/// Every table rejects keys it does not know: a misspelled table or field
/// name is a parse error, not an empty cutscene or a silent default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    pub label: Option<String>,
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionSpec>,
}

/// One `[[group.action]]`, selected by `kind`
///
/// `duration` is in seconds. `easing` names a curve; the player default
/// applies when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ActionSpec {
    Wait {
        duration: f64,
        easing: Option<String>,
        #[serde(default)]
        cues: Vec<CueSpec>,
    },
    Caption {
        target: String,
        text: String,
        duration: f64,
        easing: Option<String>,
        #[serde(default)]
        cues: Vec<CueSpec>,
    },
    Tween {
        target: String,
        property: String,
        to: f32,
        from: Option<f32>,
        duration: f64,
        easing: Option<String>,
        #[serde(default)]
        cues: Vec<CueSpec>,
    },
}

/// A log line emitted when elapsed time reaches `at` seconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CueSpec {
    pub at: f64,
    pub note: String,
}

impl Script {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Script(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let script: Self = toml::from_str(&content)
            .map_err(|e| Error::Script(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), groups = script.groups.len(), "Loaded script");
        Ok(script)
    }

    /// Total number of actions across all groups
    pub fn action_count(&self) -> usize {
        self.groups.iter().map(|g| g.actions.len()).sum()
    }

    /// Build one group per `[[group]]`, with effects drawing on `stage`
    ///
    /// # Errors
    /// `Error::Script` naming the group and action for an invalid duration,
    /// cue offset, easing name or empty target.
    pub fn build(&self, stage: &Stage, default_easing: Easing) -> Result<Vec<Group>> {
        self.groups
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.build(index, stage, default_easing))
            .collect()
    }
}

impl GroupSpec {
    fn build(&self, index: usize, stage: &Stage, default_easing: Easing) -> Result<Group> {
        let mut group = Group::new();
        if let Some(label) = &self.label {
            group = group.with_label(label.clone());
        }
        let group_name = self
            .label
            .clone()
            .unwrap_or_else(|| format!("#{}", index + 1));

        for (action_index, spec) in self.actions.iter().enumerate() {
            let action = spec.build(&group_name, stage, default_easing).map_err(|e| {
                Error::Script(format!(
                    "group {} action {}: {}",
                    group_name,
                    action_index + 1,
                    e
                ))
            })?;
            group.push(action)?;
        }
        Ok(group)
    }
}

impl ActionSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionSpec::Wait { .. } => "wait",
            ActionSpec::Caption { .. } => "caption",
            ActionSpec::Tween { .. } => "tween",
        }
    }

    /// Nominal duration in seconds, as written
    pub fn duration(&self) -> f64 {
        match self {
            ActionSpec::Wait { duration, .. }
            | ActionSpec::Caption { duration, .. }
            | ActionSpec::Tween { duration, .. } => *duration,
        }
    }

    pub fn easing(&self) -> Option<&str> {
        match self {
            ActionSpec::Wait { easing, .. }
            | ActionSpec::Caption { easing, .. }
            | ActionSpec::Tween { easing, .. } => easing.as_deref(),
        }
    }

    pub fn cues(&self) -> &[CueSpec] {
        match self {
            ActionSpec::Wait { cues, .. }
            | ActionSpec::Caption { cues, .. }
            | ActionSpec::Tween { cues, .. } => cues,
        }
    }

    fn build(
        &self,
        group_name: &str,
        stage: &Stage,
        default_easing: Easing,
    ) -> Result<TimedAction> {
        let duration = seconds_to_duration(self.duration())?;
        let easing = match self.easing() {
            Some(name) => Easing::parse(name)
                .ok_or_else(|| Error::Script(format!("unknown easing '{}'", name)))?,
            None => default_easing,
        };

        let effect: Box<dyn Effect> = match self {
            ActionSpec::Wait { .. } => Box::new(Wait::new(duration)),
            ActionSpec::Caption { target, text, .. } => {
                require_target(target)?;
                Box::new(Caption::new(stage, target.as_str(), text.as_str(), duration))
            }
            ActionSpec::Tween {
                target,
                property,
                to,
                from,
                ..
            } => {
                require_target(target)?;
                let tween = Tween::new(stage, target.as_str(), property.as_str(), *to, duration);
                Box::new(match from {
                    Some(from) => tween.from_value(*from),
                    None => tween,
                })
            }
        };

        let mut action = TimedAction::new(effect).with_easing(easing);
        for cue in self.cues() {
            let at = seconds_to_duration(cue.at)?;
            let group = group_name.to_string();
            let note = cue.note.clone();
            action = action.with_cue(at, move || info!(group = %group, "Cue: {}", note));
        }
        Ok(action)
    }
}

fn require_target(target: &str) -> Result<()> {
    if target.trim().is_empty() {
        return Err(Error::Script("target must not be empty".to_string()));
    }
    Ok(())
}
