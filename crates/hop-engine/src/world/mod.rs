//! The world: authoritative object collection, level state, progression
//! and the per-frame update that drives behaviors and physics.

pub mod commands;
pub mod events;
pub mod level;
pub mod save;

use std::collections::BTreeMap;

use glam::Vec2;

use crate::api::config::EngineConfig;
use crate::api::services::{AudioSink, InputSource};
use crate::api::types::{EntityError, ObjectId, WorldEvent};
use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::Appearance;
use crate::components::tilemap::TileLayer;
use crate::core::math::Aabb;
use crate::core::rng::Rng;
use crate::core::store::ObjectStore;
use crate::core::time::WorldClock;
use crate::entities::checkpoint::{respawn_position, Checkpoint};
use crate::entities::enemy::{Enemy, EnemyConfig, EnemyKind};
use crate::entities::platform::{Fragile, Platform, PlatformMotion};
use crate::entities::player::{Player, PlayerSnapshot};
use crate::entities::powerup::{PowerUp, PowerUpKind};
use crate::entities::{EntityContext, LevelView, Neighbors, ObjectBehavior};
use crate::physics::layers::{CollisionLayers, CollisionMatrix};
use crate::physics::Physics;
use crate::renderer::camera::Camera;

use self::commands::{explosion_damage, Command, Commands};
use self::events::EventBus;
use self::level::{
    parse_color, plan_spawn, CheckpointSpawn, EntitySpawn, LevelData, LevelError, LevelLoadReport, SkippedSpawn,
    SpawnPlan,
};
use self::save::{CollectedRecord, GameState, SAVE_VERSION};

/// Rounds of follow-up commands applied per flush before the rest is dropped.
const MAX_COMMAND_ROUNDS: usize = 8;

const DEFAULT_BACKGROUND: [f32; 4] = [0.08, 0.09, 0.12, 1.0];

/// A respawn location registered by the level.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointEntry {
    pub id: String,
    /// Top-left where the player reappears.
    pub position: Vec2,
    pub object: Option<ObjectId>,
}

/// Metadata of the loaded level.
#[derive(Debug, Clone)]
pub struct LevelInfo {
    pub id: String,
    pub bounds: Aabb,
    pub tile_size: f32,
    pub gravity: Vec2,
    pub background_color: [f32; 4],
    pub spawn_point: Vec2,
    pub background: TileLayer,
    pub collision: TileLayer,
    pub foreground: TileLayer,
}

impl LevelInfo {
    fn empty(size: Vec2, gravity: Vec2) -> Self {
        Self {
            id: String::new(),
            bounds: Aabb::new(Vec2::ZERO, size),
            tile_size: 32.0,
            gravity,
            background_color: DEFAULT_BACKGROUND,
            spawn_point: Vec2::ZERO,
            background: TileLayer::new(0, 0, 32.0),
            collision: TileLayer::new(0, 0, 32.0),
            foreground: TileLayer::new(0, 0, 32.0),
        }
    }
}

pub struct World {
    config: EngineConfig,
    store: ObjectStore,
    physics: Physics,
    clock: WorldClock,
    camera: Camera,
    events: EventBus,
    sounds: Vec<String>,
    flags: BTreeMap<String, bool>,
    collectibles: BTreeMap<String, CollectedRecord>,
    checkpoints: Vec<CheckpointEntry>,
    current_checkpoint: Option<String>,
    level: LevelInfo,
    rng: Rng,
    next_id: u32,
    /// Saved player state waiting for a player object to exist.
    pending_player: Option<PlayerSnapshot>,
}

impl World {
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.world.rng_seed;
        Self {
            store: ObjectStore::new(),
            physics: Physics::new(config.physics.clone()),
            clock: WorldClock::new(config.max_frame_dt),
            camera: Camera::from_config(&config.camera, seed ^ 0xca3e),
            events: EventBus::new(),
            sounds: Vec::new(),
            flags: BTreeMap::new(),
            collectibles: BTreeMap::new(),
            checkpoints: Vec::new(),
            current_checkpoint: None,
            level: LevelInfo::empty(config.camera.viewport, config.physics.gravity),
            rng: Rng::new(seed),
            next_id: 0,
            pending_player: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -- Frame --

    /// Advance the simulation by one frame of `dt` raw seconds.
    ///
    /// Order: drain add/remove queues, behaviors, commands, physics,
    /// commands, sweep destroyed objects, camera. A paused or zero-scale
    /// clock leaves everything untouched.
    pub fn update(&mut self, dt: f32, input: &dyn InputSource) {
        let dt = self.clock.advance(dt);
        if dt <= 0.0 {
            return;
        }

        self.store.drain_pending();
        self.apply_pending_player();

        let mut commands = Commands::new();
        self.run_behaviors(dt, input, &mut commands);
        self.apply_commands(&mut commands);

        self.physics.update(self.store.as_mut_slice(), dt, &mut commands);
        self.apply_commands(&mut commands);

        self.sweep_destroyed(&mut commands);
        self.apply_commands(&mut commands);

        self.update_camera(dt);
    }

    fn run_behaviors(&mut self, dt: f32, input: &dyn InputSource, commands: &mut Commands) {
        let level = LevelView {
            bounds: self.level.bounds,
            respawn_point: self.respawn_point(),
        };
        let time = self.clock.elapsed;
        let physics = &self.physics;
        let objects = self.store.as_mut_slice();

        for i in 0..objects.len() {
            let (before, rest) = objects.split_at_mut(i);
            let Some((obj, after)) = rest.split_first_mut() else {
                break;
            };
            let mut ctx = EntityContext {
                dt,
                time,
                input,
                physics,
                neighbors: Neighbors::new(before, after),
                commands: &mut *commands,
                level,
            };
            if let Err(err) = obj.update_logic(&mut ctx) {
                log::warn!("skipping {} '{}': {err}", obj.id, obj.name);
                if matches!(err, EntityError::NonFinite(_)) {
                    obj.active = false;
                }
            }
        }
    }

    /// Apply recorded commands, including follow-ups they produce.
    fn apply_commands(&mut self, commands: &mut Commands) {
        for _ in 0..MAX_COMMAND_ROUNDS {
            if commands.is_empty() {
                return;
            }
            let batch: Vec<Command> = commands.drain().collect();
            for command in batch {
                self.apply_command(command, commands);
            }
        }
        if !commands.is_empty() {
            let dropped = commands.drain().count();
            log::warn!("dropped {dropped} commands still queued after {MAX_COMMAND_ROUNDS} rounds");
        }
    }

    fn apply_command(&mut self, command: Command, follow_up: &mut Commands) {
        match command {
            Command::Spawn(obj) => {
                self.add_object(*obj);
            }
            Command::Damage { target, amount, source } => self.damage(target, amount, source, follow_up),
            Command::Explosion {
                center,
                radius,
                damage,
                targets,
                source,
            } => {
                self.events.emit(WorldEvent::Explosion { center, radius });
                self.camera.shake((radius * 0.1).min(12.0), 0.25);
                let hit: Vec<(ObjectId, f32)> = self
                    .store
                    .iter()
                    .filter(|o| o.is_alive() && Some(o.id) != source && o.body.layers.intersects(targets))
                    .map(|o| (o.id, explosion_damage(damage, radius, o.center().distance(center))))
                    .filter(|(_, amount)| *amount > 0.0)
                    .collect();
                for (id, amount) in hit {
                    self.damage(id, amount, center, follow_up);
                }
            }
            Command::Carry { target, delta } => {
                if let Some(obj) = self.store.get_mut(target) {
                    obj.body.position += delta;
                }
            }
            Command::PlaySound(name) => self.sounds.push(name),
            Command::Emit(event) => {
                if let WorldEvent::EnemyKilled { score, .. } = &event {
                    let score = *score;
                    if let Some(player) = self.player_behavior_mut() {
                        player.add_score(score);
                    }
                }
                self.events.emit(event);
            }
            Command::ActivateCheckpoint { id, position } => self.activate_checkpoint(id, position),
            Command::Collect { collectible_id } => {
                let record = CollectedRecord {
                    time: self.clock.elapsed,
                    level_id: self.level.id.clone(),
                };
                self.collectibles.insert(collectible_id, record);
            }
            Command::SetFlag { key, value } => self.set_flag(key, value),
            Command::ShakeCamera { intensity, duration } => self.camera.shake(intensity, duration),
        }
    }

    fn damage(&mut self, target: ObjectId, amount: f32, source: Vec2, follow_up: &mut Commands) {
        let Some(obj) = self.store.get_mut(target) else {
            return;
        };
        if !obj.is_alive() {
            return;
        }
        obj.with_behavior_mut(|behavior, obj| behavior.on_damage(obj, amount, source, follow_up));
    }

    fn sweep_destroyed(&mut self, commands: &mut Commands) {
        for mut obj in self.store.sweep_destroyed() {
            let mut behavior = std::mem::take(&mut obj.behavior);
            behavior.on_destroy(&obj, commands);
            for entry in self.checkpoints.iter_mut().filter(|c| c.object == Some(obj.id)) {
                entry.object = None;
            }
        }
    }

    fn update_camera(&mut self, dt: f32) {
        if self.config.world.follow_player {
            if let Some(player) = self.player() {
                let (center, velocity) = (player.center(), player.body.velocity);
                self.camera.follow(center, velocity, dt);
            }
        }
        self.camera.update(dt);
    }

    // -- Objects --

    /// Queue an object; it becomes live at the start of the next update.
    pub fn add_object(&mut self, mut obj: GameObject) -> ObjectId {
        if obj.id == GameObject::UNASSIGNED {
            self.next_id += 1;
            obj.id = ObjectId(self.next_id);
        }
        let id = obj.id;
        self.store.enqueue_add(obj);
        id
    }

    /// Queue a removal; applied at the start of the next update.
    pub fn remove_object(&mut self, id: ObjectId) {
        self.store.enqueue_remove(id);
    }

    fn next_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }

    pub fn spawn_player(&mut self, pos: Vec2) -> ObjectId {
        let obj = Player::spawn(pos, self.config.player.clone());
        self.add_object(obj)
    }

    pub fn spawn_enemy(&mut self, pos: Vec2, kind: EnemyKind, config: EnemyConfig) -> ObjectId {
        let seed = self.next_seed();
        self.add_object(Enemy::spawn(pos, kind, config, seed))
    }

    pub fn spawn_platform(&mut self, pos: Vec2, size: Vec2, motion: PlatformMotion, fragile: Option<Fragile>) -> ObjectId {
        self.add_object(Platform::spawn(pos, size, motion, fragile))
    }

    pub fn spawn_powerup(&mut self, pos: Vec2, kind: PowerUpKind, collectible_id: Option<String>) -> ObjectId {
        self.add_object(PowerUp::spawn(pos, kind, collectible_id))
    }

    /// Spawn a checkpoint trigger and register it as a respawn location.
    pub fn spawn_checkpoint(&mut self, pos: Vec2, id: impl Into<String>) -> ObjectId {
        let id = id.into();
        let obj = Checkpoint::spawn(pos, id.clone());
        let position = respawn_position(pos, obj.body.size, self.config.player.size);
        let object = self.add_object(obj);
        match self.checkpoints.iter_mut().find(|c| c.id == id) {
            Some(entry) => {
                entry.position = position;
                entry.object = Some(object);
            }
            None => self.checkpoints.push(CheckpointEntry {
                id,
                position,
                object: Some(object),
            }),
        }
        object
    }

    fn spawn_tile_collider(&mut self, bounds: Aabb) {
        let mut obj = GameObject::new("tile")
            .with_tag("static")
            .with_tag("tile")
            .with_layer(WorldLayer::Tiles)
            .with_pos(bounds.min)
            .with_size(bounds.size())
            .with_appearance(Appearance::default());
        obj.body.gravity_scale = 0.0;
        obj.body.layers = CollisionLayers::SOLID;
        obj.body.mask = CollisionMatrix::default_platformer().mask_for(CollisionLayers::SOLID);
        self.add_object(obj);
    }

    // -- Levels --

    pub fn load_level_json(&mut self, text: &str) -> Result<LevelLoadReport, LevelError> {
        let data = LevelData::from_json(text)?;
        self.load_level(&data)
    }

    /// Replace the current level. Persistent objects (the player) survive
    /// and are moved to the new spawn point.
    pub fn load_level(&mut self, data: &LevelData) -> Result<LevelLoadReport, LevelError> {
        data.validate()?;
        self.clear_level();

        let props = &data.properties;
        let gravity = props.gravity.map_or(self.config.physics.gravity, |g| g.vector());
        let background_color = match props.background_color.as_deref() {
            None => DEFAULT_BACKGROUND,
            Some(text) => parse_color(text).unwrap_or_else(|| {
                log::warn!("level '{}': bad background color '{text}'", data.id);
                DEFAULT_BACKGROUND
            }),
        };
        self.level = LevelInfo {
            id: data.id.clone(),
            bounds: Aabb::new(Vec2::ZERO, data.pixel_size()),
            tile_size: props.tile_size,
            gravity,
            background_color,
            spawn_point: Vec2::ZERO,
            background: data.tile_layer("background", &data.layers.background),
            collision: data.tile_layer("collision", &data.layers.collision),
            foreground: data.tile_layer("foreground", &data.layers.foreground),
        };
        self.physics.set_gravity(gravity);

        let mut report = LevelLoadReport {
            level_id: data.id.clone(),
            ..Default::default()
        };

        let rects = self.level.collision.solid_rects(self.config.world.merge_tile_colliders);
        for rect in &rects {
            let bounds = self.level.collision.rect_bounds(rect);
            self.spawn_tile_collider(bounds);
        }
        report.tile_colliders = rects.len();

        for raw in &data.checkpoints {
            match CheckpointSpawn::from_value(raw) {
                Ok(cp) => {
                    self.spawn_checkpoint(Vec2::new(cp.x, cp.y), cp.id);
                    report.checkpoints += 1;
                }
                Err(skipped) => {
                    log::warn!("level '{}': skipping checkpoint: {}", data.id, skipped.reason);
                    report.skipped.push(skipped);
                }
            }
        }

        for raw in &data.layers.entities {
            let spawn = match EntitySpawn::from_value(raw) {
                Ok(spawn) => spawn,
                Err(skipped) => {
                    log::warn!("level '{}': skipping spawn {:?}: {}", data.id, skipped.id, skipped.reason);
                    report.skipped.push(skipped);
                    continue;
                }
            };
            if let Some(id) = spawn.id.as_deref().filter(|id| self.collectibles.contains_key(*id)) {
                log::debug!("level '{}': '{id}' already collected", data.id);
                report.skipped.push(SkippedSpawn {
                    id: spawn.id.clone(),
                    kind: spawn.kind.clone(),
                    reason: "already collected".into(),
                });
                continue;
            }
            let seed = self.next_seed();
            match plan_spawn(&spawn, seed) {
                SpawnPlan::PlayerSpawn(pos) => {
                    self.level.spawn_point = pos;
                    report.player_spawn = Some(pos);
                }
                SpawnPlan::Object(obj) => {
                    self.add_object(obj);
                    report.spawned += 1;
                }
                SpawnPlan::Checkpoint { id, position } => {
                    self.spawn_checkpoint(position, id);
                    report.checkpoints += 1;
                }
                SpawnPlan::Skip(reason) => {
                    log::warn!("level '{}': skipping spawn {:?}: {reason}", data.id, spawn.id);
                    report.skipped.push(SkippedSpawn {
                        id: spawn.id.clone(),
                        kind: spawn.kind.clone(),
                        reason,
                    });
                }
            }
        }

        let spawn_point = self.level.spawn_point;
        if let Some(id) = self.player_id() {
            if let Some(player) = self.store.get_any_mut(id) {
                player.body.position = spawn_point;
                player.body.velocity = Vec2::ZERO;
            }
        }

        self.camera.set_bounds(self.level.bounds);
        self.camera.look_at(spawn_point + self.config.player.size * 0.5);

        log::info!(
            "level '{}' loaded: {} tile colliders, {} objects, {} checkpoints, {} skipped",
            data.id,
            report.tile_colliders,
            report.spawned,
            report.checkpoints,
            report.skipped.len()
        );
        self.events.emit(WorldEvent::LevelLoaded {
            level_id: data.id.clone(),
        });
        Ok(report)
    }

    /// Drop every non-persistent object and the level's checkpoints.
    pub fn clear_level(&mut self) {
        self.store.retain(|o| o.persistent);
        self.checkpoints.clear();
        self.current_checkpoint = None;
        self.physics.reset();
    }

    // -- Queries --

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.store.get(id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.store.get_mut(id)
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&GameObject> {
        self.store.find_by_tag(tag)
    }

    pub fn find_all_by_tag(&self, tag: &str) -> Vec<&GameObject> {
        self.store.find_all_by_tag(tag)
    }

    /// Live objects in the world.
    pub fn objects(&self) -> &[GameObject] {
        self.store.as_slice()
    }

    /// Objects queued for addition.
    pub fn pending_objects(&self) -> impl Iterator<Item = &GameObject> {
        self.store.pending()
    }

    /// Live, non-destroyed objects of one render layer in paint order.
    pub fn objects_in_layer(&self, layer: WorldLayer) -> Vec<&GameObject> {
        let mut list: Vec<&GameObject> = self
            .store
            .iter()
            .filter(|o| o.layer == layer && !o.destroyed)
            .collect();
        list.sort_by_key(|o| o.z_index);
        list
    }

    pub fn player(&self) -> Option<&GameObject> {
        self.store.find_by_tag("player")
    }

    pub fn player_mut(&mut self) -> Option<&mut GameObject> {
        self.store.iter_mut().find(|o| o.has_tag("player"))
    }

    fn player_id(&self) -> Option<ObjectId> {
        self.store
            .iter()
            .chain(self.store.pending())
            .find(|o| o.has_tag("player"))
            .map(|o| o.id)
    }

    fn player_behavior_mut(&mut self) -> Option<&mut Player> {
        self.player_mut().and_then(|o| o.behavior.as_player_mut())
    }

    /// Collision tile id at a grid cell; 0 outside the level.
    pub fn tile_at(&self, col: i32, row: i32) -> u32 {
        self.level.collision.tile_at(col, row)
    }

    pub fn is_solid_at(&self, pos: Vec2) -> bool {
        self.level.collision.is_solid_at(pos)
    }

    pub fn level(&self) -> &LevelInfo {
        &self.level
    }

    pub fn level_bounds(&self) -> Aabb {
        self.level.bounds
    }

    pub fn spawn_point(&self) -> Vec2 {
        self.level.spawn_point
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut Physics {
        &mut self.physics
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    // -- Checkpoints, flags, collectibles --

    pub fn checkpoints(&self) -> &[CheckpointEntry] {
        &self.checkpoints
    }

    pub fn current_checkpoint(&self) -> Option<&str> {
        self.current_checkpoint.as_deref()
    }

    /// Where the player comes back: the current checkpoint, else the level spawn.
    pub fn respawn_point(&self) -> Vec2 {
        self.current_checkpoint
            .as_deref()
            .and_then(|id| self.checkpoints.iter().find(|c| c.id == id))
            .map_or(self.level.spawn_point, |c| c.position)
    }

    /// Make `id` the current checkpoint. Re-activating the current one is a no-op.
    pub fn activate_checkpoint(&mut self, id: String, position: Vec2) {
        if self.current_checkpoint.as_deref() == Some(id.as_str()) {
            return;
        }
        match self.checkpoints.iter_mut().find(|c| c.id == id) {
            Some(entry) => entry.position = position,
            None => self.checkpoints.push(CheckpointEntry {
                id: id.clone(),
                position,
                object: None,
            }),
        }
        log::info!("checkpoint '{id}' activated");
        self.current_checkpoint = Some(id.clone());
        self.events.emit(WorldEvent::CheckpointActivated { id, position });
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }

    /// Set a progression flag; emits `FlagChanged` when the value changes.
    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        let key = key.into();
        let previous = self.flags.insert(key.clone(), value);
        if previous != Some(value) {
            self.events.emit(WorldEvent::FlagChanged { key, value });
        }
    }

    pub fn is_collected(&self, collectible_id: &str) -> bool {
        self.collectibles.contains_key(collectible_id)
    }

    pub fn collectibles(&self) -> &BTreeMap<String, CollectedRecord> {
        &self.collectibles
    }

    // -- Events and sounds --

    pub fn on(&mut self, event: impl Into<String>, callback: impl FnMut(&WorldEvent) + 'static) {
        self.events.on(event, callback);
    }

    pub fn off(&mut self, event: &str) {
        self.events.off(event);
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.events.drain()
    }

    /// Sounds requested since the last drain, oldest first.
    pub fn sounds(&self) -> &[String] {
        &self.sounds
    }

    pub fn drain_sounds_into(&mut self, sink: &mut dyn AudioSink) {
        for name in self.sounds.drain(..) {
            sink.play_sound(&name);
        }
    }

    // -- Clock --

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.clock.set_time_scale(scale);
    }

    // -- Persistence --

    pub fn save_game_state(&self) -> GameState {
        let player = self
            .player()
            .and_then(|o| o.behavior.as_player().map(|p| p.snapshot(o)))
            .or_else(|| self.pending_player.clone());
        GameState {
            version: SAVE_VERSION,
            level_id: self.level.id.clone(),
            checkpoint_id: self.current_checkpoint.clone(),
            player,
            flags: self.flags.clone(),
            collectibles: self.collectibles.clone(),
            clock: self.clock,
        }
    }

    /// Restore progression. The matching level should already be loaded;
    /// without a player the snapshot waits for one to be spawned.
    pub fn load_game_state(&mut self, state: &GameState) {
        if state.level_id != self.level.id {
            log::warn!(
                "restoring save for level '{}' while '{}' is loaded",
                state.level_id,
                self.level.id
            );
        }
        self.flags = state.flags.clone();
        self.collectibles = state.collectibles.clone();
        self.clock = state.clock;

        self.current_checkpoint = state.checkpoint_id.clone();
        if let Some(id) = state.checkpoint_id.as_deref() {
            let object = self.checkpoints.iter().find(|c| c.id == id).and_then(|c| c.object);
            match object.and_then(|oid| self.store.get_any_mut(oid)) {
                Some(obj) => obj.with_behavior_mut(|behavior, obj| {
                    if let Some(cp) = behavior.as_checkpoint_mut() {
                        cp.mark_activated(obj);
                    }
                }),
                None => log::warn!("saved checkpoint '{id}' is not in this level"),
            }
        }

        self.pending_player = state.player.clone();
        self.apply_pending_player();
        log::info!("game state restored (level '{}')", state.level_id);
    }

    fn apply_pending_player(&mut self) {
        if self.pending_player.is_none() {
            return;
        }
        let Some(id) = self.player_id() else {
            return;
        };
        let Some(snap) = self.pending_player.take() else {
            return;
        };
        if let Some(obj) = self.store.get_any_mut(id) {
            obj.with_behavior_mut(|behavior, obj| {
                if let Some(player) = behavior.as_player_mut() {
                    player.restore(obj, &snap);
                }
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::services::NullInput;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn floor_level() -> LevelData {
        // 10x4 tiles of 32, bottom row solid.
        let mut collision = vec![0; 40];
        for tile in collision.iter_mut().skip(30) {
            *tile = 1;
        }
        let mut data = LevelData::default();
        data.id = "test".into();
        data.properties.width = 10;
        data.properties.height = 4;
        data.properties.tile_size = 32.0;
        data.layers.collision = collision;
        data
    }

    fn step(world: &mut World, frames: usize) {
        for _ in 0..frames {
            world.update(DT, &NullInput);
        }
    }

    #[test]
    fn added_objects_go_live_next_update() {
        let mut world = World::default();
        let id = world.add_object(GameObject::new("crate"));
        assert!(world.get(id).is_none());
        assert_eq!(world.pending_objects().count(), 1);
        step(&mut world, 1);
        assert!(world.get(id).is_some());

        world.remove_object(id);
        assert!(world.get(id).is_some());
        step(&mut world, 1);
        assert!(world.get(id).is_none());
    }

    #[test]
    fn destroyed_objects_are_swept_in_the_same_frame() {
        let mut world = World::default();
        let id = world.add_object(GameObject::new("crate"));
        step(&mut world, 1);
        if let Some(obj) = world.get_mut(id) {
            obj.destroy();
        }
        step(&mut world, 1);
        assert!(world.get(id).is_none());
    }

    #[test]
    fn floor_strip_becomes_one_collider() {
        let mut world = World::default();
        let report = world.load_level(&floor_level()).expect("level loads");
        assert_eq!(report.tile_colliders, 1);
        assert_eq!(world.tile_at(0, 3), 1);
        assert_eq!(world.tile_at(-1, 3), 0);
        assert!(world.is_solid_at(Vec2::new(40.0, 100.0)));
        assert!(!world.is_solid_at(Vec2::new(40.0, 10.0)));
        assert_eq!(world.level_bounds().max, Vec2::new(320.0, 128.0));

        let mut unmerged = World::new(EngineConfig {
            world: crate::api::config::WorldConfig {
                merge_tile_colliders: false,
                ..Default::default()
            },
            ..Default::default()
        });
        let report = unmerged.load_level(&floor_level()).expect("level loads");
        assert_eq!(report.tile_colliders, 10);
    }

    #[test]
    fn reload_keeps_only_persistent_objects() {
        let mut world = World::default();
        world.load_level(&floor_level()).expect("level loads");
        let player = world.spawn_player(Vec2::new(10.0, 10.0));
        world.spawn_enemy(Vec2::new(100.0, 60.0), EnemyKind::Basic, EnemyConfig::default());
        step(&mut world, 1);

        let mut next = floor_level();
        next.id = "next".into();
        next.layers
            .entities
            .push(serde_json::json!({ "type": "player_spawn", "x": 200, "y": 20 }));
        world.load_level(&next).expect("level loads");
        step(&mut world, 1);

        assert!(world.find_by_tag("enemy").is_none());
        let p = world.get(player).expect("player survives");
        assert!((p.body.position.x - 200.0).abs() < 1.0);
        assert_eq!(world.find_all_by_tag("tile").len(), 1);
    }

    #[test]
    fn flags_emit_only_on_change() {
        let mut world = World::default();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        world.on("flagChanged", move |_| *counter.borrow_mut() += 1);
        world.set_flag("door", true);
        world.set_flag("door", true);
        world.set_flag("door", false);
        assert_eq!(*seen.borrow(), 2);
        assert!(!world.flag("door"));
        assert!(!world.flag("unknown"));
    }

    #[test]
    fn paused_world_does_not_advance() {
        let mut world = World::default();
        let id = world.add_object(GameObject::new("crate"));
        world.pause();
        step(&mut world, 3);
        assert!(world.get(id).is_none());
        assert_eq!(world.clock().elapsed, 0.0);
        world.resume();
        step(&mut world, 1);
        assert!(world.get(id).is_some());
    }

    #[test]
    fn checkpoint_activation_moves_respawn_point() {
        let mut world = World::default();
        world.load_level(&floor_level()).expect("level loads");
        assert_eq!(world.respawn_point(), Vec2::ZERO);
        world.spawn_checkpoint(Vec2::new(100.0, 48.0), "cp1");
        let mut cmds = Commands::new();
        cmds.activate_checkpoint("cp1", Vec2::new(100.0, 64.0));
        world.apply_commands(&mut cmds);
        assert_eq!(world.current_checkpoint(), Some("cp1"));
        assert_eq!(world.respawn_point(), Vec2::new(100.0, 64.0));
        let events = world.drain_events();
        assert!(events.iter().any(|e| e.name() == "checkpointActivated"));
    }

    #[test]
    fn explosion_damages_targets_with_falloff() {
        let mut world = World::default();
        let near = world.spawn_enemy(Vec2::new(0.0, 0.0), EnemyKind::Flying, EnemyConfig::flying());
        let far = world.spawn_enemy(Vec2::new(500.0, 0.0), EnemyKind::Flying, EnemyConfig::flying());
        world.store.drain_pending();

        let center = world.get(near).map(GameObject::center).unwrap_or_default();
        let mut cmds = Commands::new();
        cmds.explode(center, 60.0, 5.0, CollisionLayers::ENEMY, None);
        world.apply_commands(&mut cmds);

        let health = |w: &World, id| w.get(id).and_then(|o| o.behavior.as_enemy()).map(|e| e.health);
        assert_eq!(health(&world, near), Some(EnemyConfig::flying().health - 5.0));
        assert_eq!(health(&world, far), Some(EnemyConfig::flying().health));
        assert!(world.drain_events().iter().any(|e| e.name() == "explosion"));
    }

    #[test]
    fn malformed_spawns_are_skipped_and_the_rest_loads() {
        let text = r#"{
            "id": "broken",
            "properties": { "width": 4, "height": 3, "tileSize": 32 },
            "layers": {
                "collision": [0,0,0,0, 0,0,0,0, 1,1,1,1],
                "entities": [
                    { "type": "player_spawn", "x": 10, "y": 20 },
                    { "id": "e1", "type": "basic_enemy", "y": 20 },
                    { "type": "basic_enemy", "x": 60, "y": 20 },
                    "not an entry"
                ]
            },
            "checkpoints": [ { "x": 5, "y": 5 }, { "id": "cp1", "x": 64, "y": 16 } ]
        }"#;
        let mut world = World::default();
        let report = world.load_level_json(text).expect("level loads");
        assert_eq!(report.player_spawn, Some(Vec2::new(10.0, 20.0)));
        assert_eq!(report.spawned, 1);
        assert_eq!(report.checkpoints, 1);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.skipped[0].kind, "checkpoint");
        assert_eq!(report.skipped[1].id.as_deref(), Some("e1"));
        assert!(report.skipped.iter().all(|s| s.reason.starts_with("malformed entry")));

        step(&mut world, 1);
        assert_eq!(world.find_all_by_tag("enemy").len(), 1);
    }

    #[test]
    fn collected_items_do_not_respawn() {
        let mut world = World::default();
        let mut data = floor_level();
        data.layers
            .entities
            .push(serde_json::json!({ "id": "coin_1", "type": "powerup", "x": 50, "y": 50 }));
        assert_eq!(world.load_level(&data).expect("loads").spawned, 1);

        let mut cmds = Commands::new();
        cmds.collect("coin_1");
        world.apply_commands(&mut cmds);
        assert!(world.is_collected("coin_1"));

        let report = world.load_level(&data).expect("loads");
        assert_eq!(report.spawned, 0);
        assert_eq!(report.skipped[0].reason, "already collected");
    }

    #[test]
    fn saved_player_waits_for_a_player_object() {
        let mut world = World::default();
        world.load_level(&floor_level()).expect("level loads");
        world.spawn_player(Vec2::new(10.0, 10.0));
        step(&mut world, 1);
        if let Some(p) = world.player_behavior_mut() {
            p.add_score(70);
            p.unlock_ability("dash", 1);
        }
        world.set_flag("intro_done", true);
        let state = world.save_game_state();

        let mut fresh = World::default();
        fresh.load_level(&floor_level()).expect("level loads");
        fresh.load_game_state(&state);
        assert!(fresh.flag("intro_done"));
        fresh.spawn_player(Vec2::ZERO);
        step(&mut fresh, 1);

        let player = fresh.player().and_then(|o| o.behavior.as_player()).expect("player");
        assert_eq!(player.score, 70);
        assert!(player.has_ability("dash"));
    }

    #[test]
    fn sounds_forward_to_the_sink() {
        let mut world = World::default();
        let mut cmds = Commands::new();
        cmds.play_sound("jump");
        cmds.play_sound("land");
        world.apply_commands(&mut cmds);
        let mut sink: Vec<String> = Vec::new();
        world.drain_sounds_into(&mut sink);
        assert_eq!(sink, vec!["jump".to_string(), "land".to_string()]);
        assert!(world.sounds().is_empty());
    }

    #[test]
    fn faulty_object_does_not_stop_the_frame() {
        let mut world = World::default();
        let bad = world.add_object(GameObject::new("bad"));
        let good = world.add_object(GameObject::new("good"));
        step(&mut world, 1);
        if let Some(obj) = world.get_mut(bad) {
            obj.body.velocity = Vec2::new(f32::NAN, 0.0);
        }
        step(&mut world, 1);
        assert!(!world.get(bad).map_or(true, |o| o.active));
        assert!(world.get(good).map_or(false, |o| o.body.velocity.y > 0.0));
    }
}
