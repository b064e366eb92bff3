use std::{collections::BTreeMap, path::Path};

use crate::foundation::error::{IsavizError, IsavizResult};

pub const DEFAULT_STEP_MS: f64 = 900.0;
pub const DEFAULT_FPS: f64 = 60.0;
pub const MAX_SPEED: f64 = 4.0;

/// Presentation timing for a document. Step durations are not part of the
/// [`Document`](crate::Document); they come from here.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub default_step_ms: f64,
    pub step_ms: BTreeMap<String, f64>, // per step id
    pub speed: f64,
    pub autoplay: bool,
    pub fps: Option<f64>, // None = emit a frame on every tick
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_step_ms: DEFAULT_STEP_MS,
            step_ms: BTreeMap::new(),
            speed: 1.0,
            autoplay: true,
            fps: Some(DEFAULT_FPS),
        }
    }
}

impl PlaybackConfig {
    pub fn duration_for(&self, step_id: &str) -> f64 {
        self.step_ms
            .get(step_id)
            .copied()
            .unwrap_or(self.default_step_ms)
    }

    pub fn validate(&self) -> IsavizResult<()> {
        let bad_ms = |v: f64| !v.is_finite() || v < 0.0;
        if bad_ms(self.default_step_ms) {
            return Err(IsavizError::config(
                "default_step_ms must be a finite value >= 0",
            ));
        }
        if let Some((id, _)) = self.step_ms.iter().find(|(_, v)| bad_ms(**v)) {
            return Err(IsavizError::config(format!(
                "step_ms['{id}'] must be a finite value >= 0"
            )));
        }
        if !self.speed.is_finite() || !(0.0..=MAX_SPEED).contains(&self.speed) {
            return Err(IsavizError::config(format!(
                "speed must be within [0, {MAX_SPEED}]"
            )));
        }
        if let Some(fps) = self.fps
            && (!fps.is_finite() || fps <= 0.0)
        {
            return Err(IsavizError::config("fps must be > 0"));
        }
        Ok(())
    }

    pub fn from_json(s: &str) -> IsavizResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> IsavizResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            IsavizError::config(format!("read playback config '{}': {e}", path.display()))
        })?;
        Self::from_json(&s)
    }
}
