use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Failure to parse an engine configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for the engine, provided by the host.
/// Every field has a default, so a config document only names what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Largest frame delta the world accepts; longer stalls are clamped.
    pub max_frame_dt: f32,
    /// Spiral-of-death guard for the runner.
    pub max_steps_per_frame: u32,
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub camera: CameraConfig,
    pub world: WorldConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_frame_dt: 1.0 / 30.0,
            max_steps_per_frame: 10,
            physics: PhysicsConfig::default(),
            player: PlayerConfig::default(),
            camera: CameraConfig::default(),
            world: WorldConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Physics tuning. Y grows downward, so gravity is positive Y.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec2,
    /// Maximum downward speed gravity can produce.
    pub terminal_velocity: f32,
    pub sub_steps: u32,
    /// Broad-phase grid cell size in world units.
    pub cell_size: f32,
    /// Fraction of penetration removed per resolution pass.
    pub correction_percent: f32,
    /// Gap within which two boxes count as touching.
    pub contact_slop: f32,
    /// Length of the grounded / wall probe rays.
    pub ground_probe: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 800.0),
            terminal_velocity: 1000.0,
            sub_steps: 4,
            cell_size: 64.0,
            correction_percent: 0.8,
            contact_slop: 0.01,
            ground_probe: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub size: Vec2,
    pub move_speed: f32,
    pub ground_accel: f32,
    pub air_accel: f32,
    pub jump_speed: f32,
    /// Grace window after leaving the ground where a jump still counts as grounded.
    pub coyote_time: f32,
    /// How long an early jump press is remembered.
    pub jump_buffer: f32,
    pub invulnerability: f32,
    /// Visibility toggles per second while invulnerable.
    pub flicker_rate: f32,
    pub max_health: f32,
    pub lives: u32,
    pub knockback: f32,
    pub respawn_delay: f32,
    /// Distance below the level bottom at which the player dies.
    pub fall_death_margin: f32,
    pub wall_slide_speed: f32,
    pub glide_fall_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(24.0, 32.0),
            move_speed: 220.0,
            ground_accel: 1800.0,
            air_accel: 1100.0,
            jump_speed: 420.0,
            coyote_time: 0.1,
            jump_buffer: 0.1,
            invulnerability: 1.5,
            flicker_rate: 12.0,
            max_health: 100.0,
            lives: 3,
            knockback: 260.0,
            respawn_delay: 1.0,
            fall_death_margin: 200.0,
            wall_slide_speed: 90.0,
            glide_fall_speed: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub viewport: Vec2,
    /// Half-size of the box around the camera center the target may roam freely.
    pub deadzone: Vec2,
    /// Distance ahead of the target along its horizontal motion.
    pub look_ahead: f32,
    /// 0.0 = instant snap, 0.9 = very smooth/slow.
    pub smoothing: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport: Vec2::new(800.0, 600.0),
            deadzone: Vec2::new(40.0, 60.0),
            look_ahead: 60.0,
            smoothing: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Merge solid tile runs into rectangles instead of one collider per tile.
    pub merge_tile_colliders: bool,
    pub rng_seed: u64,
    /// Keep the camera on the player at the end of every update.
    pub follow_player: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            merge_tile_colliders: true,
            rng_seed: 0x5eed,
            follow_player: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platformer_tuning() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.physics.sub_steps, 4);
        assert!((cfg.physics.cell_size - 64.0).abs() < 1e-6);
        assert!((cfg.physics.correction_percent - 0.8).abs() < 1e-6);
        assert!((cfg.max_frame_dt - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "physics": { "gravity": [0.0, 500.0] } }"#)
            .expect("config should parse");
        assert!((cfg.physics.gravity.y - 500.0).abs() < 1e-6);
        assert_eq!(cfg.physics.sub_steps, 4);
        assert_eq!(cfg.player.lives, 3);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EngineConfig::from_json("{ nope").is_err());
    }
}
