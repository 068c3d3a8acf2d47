use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an object in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A gameplay event raised by the simulation.
/// Listeners subscribe by `name()`; the host can also drain them per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    LevelLoaded { level_id: String },
    CheckpointActivated { id: String, position: Vec2 },
    PlayerDamaged { amount: f32, health: f32 },
    PlayerDied { lives: u32 },
    PlayerRespawned { position: Vec2 },
    GameOver,
    EnemyKilled { id: ObjectId, score: u32 },
    ItemCollected { collectible_id: Option<String>, kind: String },
    AbilityUnlocked { name: String, level: u32 },
    FlagChanged { key: String, value: bool },
    Explosion { center: Vec2, radius: f32 },
    PlatformCrumbled { id: ObjectId },
}

impl WorldEvent {
    /// Listener key for this event.
    pub fn name(&self) -> &'static str {
        match self {
            WorldEvent::LevelLoaded { .. } => "levelLoaded",
            WorldEvent::CheckpointActivated { .. } => "checkpointActivated",
            WorldEvent::PlayerDamaged { .. } => "playerDamaged",
            WorldEvent::PlayerDied { .. } => "playerDied",
            WorldEvent::PlayerRespawned { .. } => "playerRespawned",
            WorldEvent::GameOver => "gameOver",
            WorldEvent::EnemyKilled { .. } => "enemyKilled",
            WorldEvent::ItemCollected { .. } => "itemCollected",
            WorldEvent::AbilityUnlocked { .. } => "abilityUnlocked",
            WorldEvent::FlagChanged { .. } => "flagChanged",
            WorldEvent::Explosion { .. } => "explosion",
            WorldEvent::PlatformCrumbled { .. } => "platformCrumbled",
        }
    }
}

/// Failure inside a single object's update. The world logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("object {0} is in an invalid state: {1}")]
    InvalidState(ObjectId, String),
    #[error("non-finite position on object {0}")]
    NonFinite(ObjectId),
}
