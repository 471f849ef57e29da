use crate::collision::ProbeRanges;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Director tunables. Handlers read them fresh every frame, so a debug UI
/// can rewrite them live.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorConfig {
    #[serde(default = "DirectorConfig::default_rotation_multiplier")]
    pub rotation_multiplier: f32,
    #[serde(default = "DirectorConfig::default_hover_multiplier")]
    pub hover_multiplier: f32,
    #[serde(default = "DirectorConfig::default_wobble_amount")]
    pub wobble_amount: f32,
    #[serde(default = "DirectorConfig::default_wobble_speed")]
    pub wobble_speed: f32,
    #[serde(default = "DirectorConfig::default_intro_duration")]
    pub intro_duration: f32,
    #[serde(default = "DirectorConfig::default_focus_duration")]
    pub focus_duration: f32,
    #[serde(default = "DirectorConfig::default_start_move_duration")]
    pub start_move_duration: f32,
    #[serde(default = "DirectorConfig::default_parallax_scale")]
    pub parallax_scale: f32,
}

impl DirectorConfig {
    const fn default_rotation_multiplier() -> f32 {
        1.0
    }

    const fn default_hover_multiplier() -> f32 {
        0.25
    }

    const fn default_wobble_amount() -> f32 {
        0.1
    }

    const fn default_wobble_speed() -> f32 {
        3.0
    }

    const fn default_intro_duration() -> f32 {
        0.5
    }

    const fn default_focus_duration() -> f32 {
        0.3
    }

    const fn default_start_move_duration() -> f32 {
        2.0
    }

    const fn default_parallax_scale() -> f32 {
        0.05
    }
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            rotation_multiplier: Self::default_rotation_multiplier(),
            hover_multiplier: Self::default_hover_multiplier(),
            wobble_amount: Self::default_wobble_amount(),
            wobble_speed: Self::default_wobble_speed(),
            intro_duration: Self::default_intro_duration(),
            focus_duration: Self::default_focus_duration(),
            start_move_duration: Self::default_start_move_duration(),
            parallax_scale: Self::default_parallax_scale(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorConfig {
    /// Per-frame blend factor toward the desired follow offset. Not
    /// dt-scaled.
    #[serde(default = "OperatorConfig::default_follow_blend")]
    pub follow_blend: f32,
    #[serde(default = "OperatorConfig::default_follow_snap_epsilon")]
    pub follow_snap_epsilon: f32,
}

impl OperatorConfig {
    const fn default_follow_blend() -> f32 {
        0.075
    }

    const fn default_follow_snap_epsilon() -> f32 {
        0.01
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            follow_blend: Self::default_follow_blend(),
            follow_snap_epsilon: Self::default_follow_snap_epsilon(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "PlayerConfig::default_move_speed")]
    pub move_speed: f32,
    /// Radians per frame while a turn key is held (frame-locked on purpose,
    /// matching the feel the content was authored against).
    #[serde(default = "PlayerConfig::default_rotation_speed")]
    pub rotation_speed: f32,
}

impl PlayerConfig {
    const fn default_move_speed() -> f32 {
        10.0
    }

    const fn default_rotation_speed() -> f32 {
        0.05
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { move_speed: Self::default_move_speed(), rotation_speed: Self::default_rotation_speed() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollisionConfig {
    #[serde(default = "CollisionConfig::default_front_back_range")]
    pub front_back_range: f32,
    #[serde(default = "CollisionConfig::default_lateral_range")]
    pub lateral_range: f32,
    #[serde(default = "CollisionConfig::default_vertical_range")]
    pub vertical_range: f32,
    #[serde(default = "CollisionConfig::default_ground_range")]
    pub ground_range: f32,
    #[serde(default = "CollisionConfig::default_ground_epsilon")]
    pub ground_epsilon: f32,
}

impl CollisionConfig {
    const fn default_front_back_range() -> f32 {
        0.75
    }

    const fn default_lateral_range() -> f32 {
        1.0
    }

    const fn default_vertical_range() -> f32 {
        1.0
    }

    const fn default_ground_range() -> f32 {
        1.5
    }

    const fn default_ground_epsilon() -> f32 {
        0.01
    }

    pub fn probe_ranges(&self) -> ProbeRanges {
        ProbeRanges {
            front_back: self.front_back_range,
            lateral: self.lateral_range,
            vertical: self.vertical_range,
            ground: self.ground_range,
            ground_epsilon: self.ground_epsilon,
        }
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            front_back_range: Self::default_front_back_range(),
            lateral_range: Self::default_lateral_range(),
            vertical_range: Self::default_vertical_range(),
            ground_range: Self::default_ground_range(),
            ground_epsilon: Self::default_ground_epsilon(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub director: DirectorConfig,
    #[serde(default)]
    pub operator: OperatorConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
}

impl StageConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[config] load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: StageConfig =
            serde_json::from_str(r#"{ "director": { "rotation_multiplier": 0.5 } }"#).expect("parse");
        assert_eq!(cfg.director.rotation_multiplier, 0.5);
        assert_eq!(cfg.director.wobble_speed, 3.0);
        assert_eq!(cfg.operator.follow_blend, 0.075);
        assert_eq!(cfg.player.move_speed, 10.0);
    }

    #[test]
    fn load_reads_a_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "player": {{ "move_speed": 4.5 }} }}"#).expect("write config");
        let cfg = StageConfig::load(file.path()).expect("load config");
        assert_eq!(cfg.player.move_speed, 4.5);
        assert_eq!(cfg.player.rotation_speed, 0.05);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = StageConfig::load_or_default("does/not/exist.json");
        assert_eq!(cfg.collision.front_back_range, 0.75);
    }
}
