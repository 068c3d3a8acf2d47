//! Serializable snapshot of progression state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::time::WorldClock;
use crate::entities::player::PlayerSnapshot;

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to serialize game state: {0}")]
    Serialize(serde_json::Error),
    #[error("failed to read game state: {0}")]
    Deserialize(serde_json::Error),
    #[error("unsupported save version {0}")]
    Version(u32),
}

/// When and where a collectible was picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedRecord {
    /// World clock at pickup.
    pub time: f64,
    pub level_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub version: u32,
    pub level_id: String,
    pub checkpoint_id: Option<String>,
    pub player: Option<PlayerSnapshot>,
    pub flags: BTreeMap<String, bool>,
    pub collectibles: BTreeMap<String, CollectedRecord>,
    pub clock: WorldClock,
}

impl GameState {
    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string(self).map_err(SaveError::Serialize)
    }

    pub fn from_json(text: &str) -> Result<Self, SaveError> {
        let state: GameState = serde_json::from_str(text).map_err(SaveError::Deserialize)?;
        if state.version > SAVE_VERSION {
            return Err(SaveError::Version(state.version));
        }
        Ok(state)
    }
}
