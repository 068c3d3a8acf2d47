//! Level description and spawn-list interpretation.
//!
//! Loading is best-effort: malformed tile layers are padded, malformed
//! spawn entries and unknown spawn types are skipped, and everything
//! skipped is reported. Spawn and checkpoint entries stay raw JSON until
//! load time so one bad entry cannot reject the whole level.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::components::object::GameObject;
use crate::components::tilemap::TileLayer;
use crate::entities::enemy::{Enemy, EnemyConfig, EnemyKind};
use crate::entities::platform::{Fragile, Platform, PlatformMotion};
use crate::entities::powerup::{PowerUp, PowerUpKind};

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("invalid level data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid level dimensions {width}x{height} with tile size {tile_size}")]
    InvalidDimensions { width: u32, height: u32, tile_size: f32 },
}

/// Gravity given either as a downward magnitude or a full vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GravitySpec {
    Down(f32),
    Vector(Vec2),
}

impl GravitySpec {
    pub fn vector(self) -> Vec2 {
        match self {
            GravitySpec::Down(g) => Vec2::new(0.0, g),
            GravitySpec::Vector(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelProperties {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    pub tile_size: f32,
    pub gravity: Option<GravitySpec>,
    /// `#rrggbb` or `#rrggbbaa`.
    pub background_color: Option<String>,
}

impl Default for LevelProperties {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            tile_size: 32.0,
            gravity: None,
            background_color: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelLayers {
    pub background: Vec<u32>,
    pub collision: Vec<u32>,
    pub foreground: Vec<u32>,
    /// Raw spawn entries, read one by one with [`EntitySpawn::from_value`].
    pub entities: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpawn {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl EntitySpawn {
    /// Read one raw spawn entry. A malformed entry comes back as a skip
    /// record carrying whatever id and type could still be read.
    pub fn from_value(raw: &Value) -> Result<Self, SkippedSpawn> {
        Self::deserialize(raw).map_err(|e| skipped_entry(raw, "?", e))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSpawn {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

impl CheckpointSpawn {
    pub fn from_value(raw: &Value) -> Result<Self, SkippedSpawn> {
        Self::deserialize(raw).map_err(|e| skipped_entry(raw, "checkpoint", e))
    }
}

fn skipped_entry(raw: &Value, default_kind: &str, err: serde_json::Error) -> SkippedSpawn {
    SkippedSpawn {
        id: raw.get("id").and_then(Value::as_str).map(str::to_string),
        kind: raw.get("type").and_then(Value::as_str).unwrap_or(default_kind).to_string(),
        reason: format!("malformed entry: {err}"),
    }
}

/// A level as authored: tile grids plus a spawn list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub id: String,
    pub properties: LevelProperties,
    pub layers: LevelLayers,
    /// Raw checkpoint entries, read with [`CheckpointSpawn::from_value`].
    pub checkpoints: Vec<Value>,
}

impl LevelData {
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let data: LevelData = serde_json::from_str(text)?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        let p = &self.properties;
        if p.width == 0 || p.height == 0 || !(p.tile_size > 0.0) {
            return Err(LevelError::InvalidDimensions {
                width: p.width,
                height: p.height,
                tile_size: p.tile_size,
            });
        }
        Ok(())
    }

    /// Level size in world units.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.properties.width as f32, self.properties.height as f32) * self.properties.tile_size
    }

    /// Build a named tile layer, logging when it is missing or its size
    /// is off. A missing collision layer warns; missing decoration does not.
    pub fn tile_layer(&self, name: &str, tiles: &[u32]) -> TileLayer {
        let p = &self.properties;
        let (layer, matched) = TileLayer::from_tiles(p.width, p.height, p.tile_size, tiles.to_vec());
        if tiles.is_empty() {
            if name == "collision" {
                log::warn!("level '{}': no collision layer; level has no solid tiles", self.id);
            } else {
                log::debug!("level '{}': no {name} layer", self.id);
            }
        } else if !matched {
            log::warn!(
                "level '{}': {name} layer has {} tiles, expected {}; resized",
                self.id,
                tiles.len(),
                p.width as usize * p.height as usize
            );
        }
        layer
    }
}

/// Parse `#rrggbb` / `#rrggbbaa` into linear 0..1 RGBA.
pub fn parse_color(text: &str) -> Option<[f32; 4]> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let byte = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|b| b as f32 / 255.0)
    };
    let alpha = if hex.len() == 8 { byte(6)? } else { 1.0 };
    Some([byte(0)?, byte(2)?, byte(4)?, alpha])
}

/// A spawn entry skipped during loading.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSpawn {
    pub id: Option<String>,
    pub kind: String,
    pub reason: String,
}

/// Summary of a level load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelLoadReport {
    pub level_id: String,
    pub tile_colliders: usize,
    pub spawned: usize,
    pub checkpoints: usize,
    pub player_spawn: Option<Vec2>,
    pub skipped: Vec<SkippedSpawn>,
}

/// What a spawn entry turns into.
#[derive(Debug)]
pub enum SpawnPlan {
    PlayerSpawn(Vec2),
    Object(GameObject),
    Checkpoint { id: String, position: Vec2 },
    Skip(String),
}

fn num(props: &Map<String, Value>, key: &str, default: f32) -> f32 {
    props.get(key).and_then(Value::as_f64).map_or(default, |v| v as f32)
}

fn text<'a>(props: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    props.get(key).and_then(Value::as_str)
}

/// Enemy tuning: kind defaults overlaid with the spawn's properties.
fn enemy_config(kind: EnemyKind, props: &Map<String, Value>) -> Result<EnemyConfig, String> {
    let base = match kind {
        EnemyKind::Basic => EnemyConfig::default(),
        EnemyKind::Flying => EnemyConfig::flying(),
    };
    if props.is_empty() {
        return Ok(base);
    }
    let mut merged = match serde_json::to_value(base) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err("enemy defaults are not an object".into()),
        Err(e) => return Err(e.to_string()),
    };
    for (k, v) in props {
        merged.insert(k.clone(), v.clone());
    }
    serde_json::from_value(Value::Object(merged)).map_err(|e| format!("bad enemy properties: {e}"))
}

fn powerup_kind(spawn: &EntitySpawn) -> Result<PowerUpKind, String> {
    let props = &spawn.properties;
    if spawn.kind == "health" {
        return Ok(PowerUpKind::Health(num(props, "amount", 25.0)));
    }
    if let Some(name) = text(props, "ability") {
        let level = props.get("level").and_then(Value::as_u64).unwrap_or(1) as u32;
        return Ok(PowerUpKind::Ability {
            name: name.to_string(),
            level,
        });
    }
    match text(props, "kind").unwrap_or("coin") {
        "coin" => Ok(PowerUpKind::Coin(num(props, "value", 10.0).max(0.0) as u32)),
        "health" => Ok(PowerUpKind::Health(num(props, "amount", 25.0))),
        "extra_life" | "extraLife" | "life" => Ok(PowerUpKind::ExtraLife),
        other => Err(format!("unknown powerup kind '{other}'")),
    }
}

fn platform_motion(props: &Map<String, Value>) -> Result<PlatformMotion, String> {
    let distance = num(props, "distance", 100.0);
    let speed = num(props, "speed", 60.0);
    let motion = match text(props, "movement").unwrap_or("static") {
        "static" | "none" => PlatformMotion::Static,
        "horizontal" => PlatformMotion::Horizontal { distance, speed },
        "vertical" => PlatformMotion::Vertical { distance, speed },
        "circular" => PlatformMotion::Circular {
            radius: num(props, "radius", 64.0),
            speed,
        },
        "pendulum" => PlatformMotion::Pendulum {
            radius: num(props, "radius", 96.0),
            amplitude: num(props, "amplitude", 0.6),
            speed: num(props, "speed", 1.5),
        },
        other => return Err(format!("unknown platform movement '{other}'")),
    };
    Ok(motion)
}

/// Interpret one spawn entry. `seed` feeds per-enemy randomness.
pub fn plan_spawn(spawn: &EntitySpawn, seed: u64) -> SpawnPlan {
    let pos = Vec2::new(spawn.x, spawn.y);
    let props = &spawn.properties;
    let result = match spawn.kind.as_str() {
        "player_spawn" => Ok(SpawnPlan::PlayerSpawn(pos)),
        "powerup" | "health" => powerup_kind(spawn)
            .map(|kind| SpawnPlan::Object(PowerUp::spawn(pos, kind, spawn.id.clone()))),
        "basic_enemy" | "flying_enemy" => {
            let kind = if spawn.kind == "flying_enemy" {
                EnemyKind::Flying
            } else {
                EnemyKind::Basic
            };
            enemy_config(kind, props).map(|config| SpawnPlan::Object(Enemy::spawn(pos, kind, config, seed)))
        }
        "checkpoint" => {
            let id = spawn
                .id
                .clone()
                .or_else(|| text(props, "id").map(str::to_string))
                .unwrap_or_else(|| format!("checkpoint_{}_{}", spawn.x as i32, spawn.y as i32));
            Ok(SpawnPlan::Checkpoint { id, position: pos })
        }
        "platform" => platform_motion(props).map(|motion| {
            let size = Vec2::new(num(props, "width", 96.0), num(props, "height", 16.0));
            let fragile = props.get("fragile").and_then(Value::as_bool).unwrap_or(false).then(|| Fragile {
                hits_left: props.get("hits").and_then(Value::as_u64).unwrap_or(1).max(1) as u32,
                crumble_delay: num(props, "crumbleDelay", 0.5),
            });
            SpawnPlan::Object(Platform::spawn(pos, size, motion, fragile))
        }),
        other => Err(format!("unknown spawn type '{other}'")),
    };
    result.unwrap_or_else(SpawnPlan::Skip)
}
