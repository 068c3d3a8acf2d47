use serde::{Deserialize, Serialize};

/// World layer: controls paint order, never simulation order.
///
/// Layers are drawn back-to-front: Background first, UI last.
/// Every live object belongs to exactly one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WorldLayer {
    Background = 0,
    Tiles = 1,
    Platforms = 2,
    #[default]
    Entities = 3,
    Player = 4,
    Projectiles = 5,
    Effects = 6,
    Ui = 7,
}

impl WorldLayer {
    /// Total number of layers.
    pub const COUNT: usize = 8;

    /// All layers in paint order.
    pub const ALL: [WorldLayer; Self::COUNT] = [
        WorldLayer::Background,
        WorldLayer::Tiles,
        WorldLayer::Platforms,
        WorldLayer::Entities,
        WorldLayer::Player,
        WorldLayer::Projectiles,
        WorldLayer::Effects,
        WorldLayer::Ui,
    ];

    /// Convert from a u8 value. Returns None if out of range.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Paint order of the layer.
    pub fn z_index(self) -> i32 {
        self as i32 * 100
    }

    pub fn name(self) -> &'static str {
        match self {
            WorldLayer::Background => "background",
            WorldLayer::Tiles => "tiles",
            WorldLayer::Platforms => "platforms",
            WorldLayer::Entities => "entities",
            WorldLayer::Player => "player",
            WorldLayer::Projectiles => "projectiles",
            WorldLayer::Effects => "effects",
            WorldLayer::Ui => "ui",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|layer| layer.name() == name)
    }
}
