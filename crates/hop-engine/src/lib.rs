//! Simulation core for 2D platformers: sub-stepped AABB physics over a
//! spatial grid, a world with deferred object lifecycle and level
//! streaming, and the player/enemy/platform/projectile/pickup behaviors.
//!
//! Rendering, audio and input are collaborators behind traits; the core
//! never touches devices or pixels.

pub mod api;
pub mod core;
pub mod components;
pub mod entities;
pub mod physics;
pub mod world;
pub mod systems;
pub mod renderer;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::config::{CameraConfig, ConfigError, EngineConfig, PhysicsConfig, PlayerConfig, WorldConfig};
pub use api::runner::GameRunner;
pub use api::services::{AudioSink, Axis, InputSource, NullAudio, NullInput};
pub use api::types::{EntityError, ObjectId, WorldEvent};
pub use components::animation::{Animator, Clip};
pub use components::layer::WorldLayer;
pub use components::object::{Body, GameObject};
pub use components::sprite::{Appearance, AtlasId, Visual};
pub use components::tilemap::TileLayer;
pub use crate::core::math::{Aabb, Vector2, VectorExt};
pub use crate::core::rng::Rng;
pub use crate::core::time::{FixedTimestep, WorldClock};
pub use glam::Vec2;
pub use entities::abilities::{AbilityKind, AbilitySet};
pub use entities::enemy::{Enemy, EnemyConfig, EnemyKind, EnemyState};
pub use entities::platform::{Fragile, Platform, PlatformMotion};
pub use entities::player::{Player, PlayerSnapshot, PlayerState};
pub use entities::powerup::{PowerUp, PowerUpKind};
pub use entities::projectile::{Projectile, ProjectileConfig};
pub use entities::{Behavior, DamageOutcome, ObjectBehavior};
pub use input::actions::{ActionState, InputEvent};
pub use physics::grid::SpatialGrid;
pub use physics::layers::{CollisionLayers, CollisionMatrix};
pub use physics::narrowphase::Contact;
pub use physics::{Physics, RayHit};
pub use renderer::{Camera, FrameData, HeadlessRenderer, LayerBatch, RenderBuffer, RenderInstance, Renderer};
pub use world::level::{LevelData, LevelError, LevelLoadReport};
pub use world::save::{GameState, SaveError};
pub use world::World;
