//! Moving and fragile platforms.
//!
//! Motion is a closed-form function of elapsed time, so a platform's
//! position is exactly reproducible for any clock value. Platforms are
//! kinematic: physics never moves them, and riders are carried by a
//! per-frame displacement command.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{EntityError, ObjectId, WorldEvent};
use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::Appearance;
use crate::entities::{other_is_on_top, Behavior, EntityContext, ObjectBehavior};
use crate::physics::layers::{CollisionLayers, CollisionMatrix};
use crate::physics::narrowphase::Contact;
use crate::world::commands::Commands;

/// Distance below which a rider's feet count as on the platform top.
const RIDE_TOLERANCE: f32 = 2.0;
const SHAKE_AMPLITUDE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformMotion {
    #[default]
    Static,
    Horizontal { distance: f32, speed: f32 },
    Vertical { distance: f32, speed: f32 },
    Circular { radius: f32, speed: f32 },
    /// Swings on a rope of `radius` hung above the spawn point;
    /// `amplitude` is the maximum angle in radians.
    Pendulum { radius: f32, amplitude: f32, speed: f32 },
}

impl PlatformMotion {
    /// Displacement from the spawn point at time `t`.
    pub fn offset(&self, t: f32) -> Vec2 {
        match *self {
            PlatformMotion::Static => Vec2::ZERO,
            PlatformMotion::Horizontal { distance, speed } => Vec2::new(oscillate(distance, speed, t), 0.0),
            PlatformMotion::Vertical { distance, speed } => Vec2::new(0.0, oscillate(distance, speed, t)),
            PlatformMotion::Circular { radius, speed } => {
                if radius <= 0.0 {
                    return Vec2::ZERO;
                }
                let a = speed / radius * t;
                Vec2::new(radius * a.cos() - radius, radius * a.sin())
            }
            PlatformMotion::Pendulum { radius, amplitude, speed } => {
                let theta = amplitude * (speed * t).sin();
                Vec2::new(radius * theta.sin(), radius * theta.cos() - radius)
            }
        }
    }
}

/// `distance * sin(speed / distance * t)`: peak speed equals `speed`.
fn oscillate(distance: f32, speed: f32, t: f32) -> f32 {
    if distance <= 0.0 {
        return 0.0;
    }
    distance * (speed / distance * t).sin()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fragile {
    /// Landings left before the platform starts to crumble.
    pub hits_left: u32,
    /// Seconds between the last landing and removal.
    pub crumble_delay: f32,
}

#[derive(Debug, Clone)]
pub struct Platform {
    pub motion: PlatformMotion,
    pub fragile: Option<Fragile>,
    origin: Option<Vec2>,
    time: f32,
    crumble_timer: Option<f32>,
    riders_now: BTreeSet<ObjectId>,
    riders_before: BTreeSet<ObjectId>,
}

impl Platform {
    pub fn new(motion: PlatformMotion, fragile: Option<Fragile>) -> Self {
        Self {
            motion,
            fragile,
            origin: None,
            time: 0.0,
            crumble_timer: None,
            riders_now: BTreeSet::new(),
            riders_before: BTreeSet::new(),
        }
    }

    pub fn spawn(pos: Vec2, size: Vec2, motion: PlatformMotion, fragile: Option<Fragile>) -> GameObject {
        let color = if fragile.is_some() {
            [0.75, 0.55, 0.35, 1.0]
        } else {
            [0.45, 0.45, 0.55, 1.0]
        };
        let mut obj = GameObject::new("platform")
            .with_tag("platform")
            .with_layer(WorldLayer::Platforms)
            .with_pos(pos)
            .with_size(size)
            .with_appearance(Appearance::color(color));
        obj.body.kinematic = true;
        obj.body.gravity_scale = 0.0;
        obj.body.layers = CollisionLayers::PLATFORM;
        obj.body.mask = CollisionMatrix::default_platformer().mask_for(CollisionLayers::PLATFORM);
        obj.with_behavior(Behavior::Platform(Platform::new(motion, fragile)))
    }

    pub fn is_crumbling(&self) -> bool {
        self.crumble_timer.is_some()
    }

    /// Objects standing on `obj`'s top edge.
    fn riders<'a>(obj: &GameObject, ctx: &EntityContext<'a>) -> Vec<ObjectId> {
        let top = obj.bounds();
        ctx.neighbors
            .iter()
            .filter(|o| o.is_alive() && o.is_movable() && o.body.solid && !o.body.trigger)
            .filter(|o| {
                let b = o.bounds();
                (b.max.y - top.min.y).abs() <= RIDE_TOLERANCE && b.max.x > top.min.x && b.min.x < top.max.x
            })
            .map(|o| o.id)
            .collect()
    }
}

impl ObjectBehavior for Platform {
    fn update(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        let dt = ctx.dt;
        let origin = *self.origin.get_or_insert(obj.body.position);
        self.riders_before = std::mem::take(&mut self.riders_now);

        if let Some(timer) = self.crumble_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                ctx.commands.emit(WorldEvent::PlatformCrumbled { id: obj.id });
                ctx.commands.play_sound("crumble");
                obj.destroy();
                return Ok(());
            }
        }

        self.time += dt;
        let mut target = origin + self.motion.offset(self.time);
        if self.crumble_timer.is_some() {
            target.x += (self.time * 60.0).sin() * SHAKE_AMPLITUDE;
        }
        let delta = target - obj.body.position;

        if delta != Vec2::ZERO {
            let carry = Vec2::new(delta.x, delta.y.max(0.0));
            for id in Self::riders(obj, ctx) {
                ctx.commands.carry(id, carry);
            }
        }
        obj.body.position = target;
        obj.body.velocity = if dt > 0.0 { delta / dt } else { Vec2::ZERO };

        if !target.is_finite() {
            return Err(EntityError::NonFinite(obj.id));
        }
        Ok(())
    }

    fn on_collision(&mut self, _obj: &mut GameObject, other: &mut GameObject, contact: &Contact, cmds: &mut Commands) {
        if !other_is_on_top(contact) || !other.is_movable() {
            return;
        }
        // Contacts repeat every sub-step while resting; count landings only.
        let onset = self.riders_now.insert(other.id) && !self.riders_before.contains(&other.id);
        if !onset || self.crumble_timer.is_some() {
            return;
        }
        if let Some(fragile) = self.fragile.as_mut() {
            fragile.hits_left = fragile.hits_left.saturating_sub(1);
            if fragile.hits_left == 0 {
                self.crumble_timer = Some(fragile.crumble_delay);
                cmds.play_sound("crack");
            }
        }
    }
}
