//! Entity behaviors and their dispatch.
//!
//! Each object carries one `Behavior` variant. Capabilities (per-frame
//! logic, collision, trigger, damage) are trait methods with no-op
//! defaults, so a type that does not react to something simply does not
//! override it.

pub mod abilities;
pub mod checkpoint;
pub mod enemy;
pub mod platform;
pub mod player;
pub mod powerup;
pub mod projectile;

use glam::Vec2;

use crate::api::services::InputSource;
use crate::api::types::{EntityError, ObjectId};
use crate::components::object::GameObject;
use crate::core::math::Aabb;
use crate::physics::layers::CollisionLayers;
use crate::physics::narrowphase::Contact;
use crate::physics::Physics;
use crate::world::commands::Commands;

pub use checkpoint::Checkpoint;
pub use enemy::{Enemy, EnemyKind, EnemyState};
pub use platform::{Platform, PlatformMotion};
pub use player::{Player, PlayerState};
pub use powerup::{PowerUp, PowerUpKind};
pub use projectile::Projectile;

/// Result of routing damage to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Refused (invulnerable, shielded, already dead).
    Blocked,
    Damaged,
    Killed,
    /// The object cannot take damage at all.
    Ignored,
}

/// Level facts a behavior may need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelView {
    pub bounds: Aabb,
    pub respawn_point: Vec2,
}

impl Default for LevelView {
    fn default() -> Self {
        Self {
            bounds: Aabb::new(Vec2::ZERO, Vec2::new(800.0, 600.0)),
            respawn_point: Vec2::ZERO,
        }
    }
}

/// Read-only view of every other live object during a behavior update.
#[derive(Clone, Copy)]
pub struct Neighbors<'a> {
    before: &'a [GameObject],
    after: &'a [GameObject],
}

impl<'a> Neighbors<'a> {
    pub fn new(before: &'a [GameObject], after: &'a [GameObject]) -> Self {
        Self { before, after }
    }

    pub fn empty() -> Self {
        Self {
            before: Default::default(),
            after: Default::default(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a GameObject> {
        self.before.iter().chain(self.after.iter())
    }

    pub fn get(&self, id: ObjectId) -> Option<&'a GameObject> {
        self.iter().find(|o| o.id == id)
    }

    /// The live player object, if any.
    pub fn player(&self) -> Option<&'a GameObject> {
        self.iter().find(|o| o.is_alive() && o.behavior.as_player().is_some())
    }

    /// Nearest live object in `layers` within `range` of `from`.
    pub fn nearest_in_layers(&self, from: Vec2, layers: CollisionLayers, range: f32) -> Option<&'a GameObject> {
        self.iter()
            .filter(|o| o.is_alive() && o.body.layers.intersects(layers))
            .map(|o| (o, o.center().distance(from)))
            .filter(|&(_, d)| d <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _)| o)
    }

    /// Live objects whose bounds overlap `area`.
    pub fn overlapping(&self, area: Aabb) -> impl Iterator<Item = &'a GameObject> {
        self.iter().filter(move |o| o.is_alive() && o.bounds().overlaps(&area))
    }
}

/// Everything a behavior sees during its per-frame update.
pub struct EntityContext<'a> {
    pub dt: f32,
    /// World clock, seconds.
    pub time: f64,
    pub input: &'a dyn InputSource,
    /// Settled physics state of the previous step, for probes and sight lines.
    pub physics: &'a Physics,
    pub neighbors: Neighbors<'a>,
    pub commands: &'a mut Commands,
    pub level: LevelView,
}

/// Capabilities an entity may implement. Every hook defaults to "does
/// nothing", which is how a type declines a capability.
pub trait ObjectBehavior {
    /// Per-frame logic, before physics.
    fn update(&mut self, _obj: &mut GameObject, _ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        Ok(())
    }

    /// A solid contact was resolved. `contact.normal` points from `obj` to `other`.
    fn on_collision(&mut self, _obj: &mut GameObject, _other: &mut GameObject, _contact: &Contact, _cmds: &mut Commands) {}

    /// Overlap with `other` began. Fires once per overlap onset.
    fn on_trigger_enter(&mut self, _obj: &mut GameObject, _other: &mut GameObject, _contact: &Contact, _cmds: &mut Commands) {}

    /// Overlap with `other` ended.
    fn on_trigger_exit(&mut self, _obj: &mut GameObject, _other: ObjectId, _cmds: &mut Commands) {}

    fn on_damage(&mut self, _obj: &mut GameObject, _amount: f32, _source: Vec2, _cmds: &mut Commands) -> DamageOutcome {
        DamageOutcome::Ignored
    }

    /// A non-looping animation clip finished.
    fn on_animation_complete(&mut self, _obj: &mut GameObject, _clip: &str) {}

    /// The object is being swept from the world.
    fn on_destroy(&mut self, _obj: &GameObject, _cmds: &mut Commands) {}
}

/// Behavior attached to a game object.
#[derive(Debug, Clone, Default)]
pub enum Behavior {
    /// Plain object (tile collider, decoration).
    #[default]
    None,
    Player(Box<Player>),
    Enemy(Box<Enemy>),
    Platform(Platform),
    Projectile(Projectile),
    Checkpoint(Checkpoint),
    PowerUp(PowerUp),
}

macro_rules! dispatch {
    ($self:expr, $b:ident => $call:expr, $none:expr) => {
        match $self {
            Behavior::None => $none,
            Behavior::Player($b) => $call,
            Behavior::Enemy($b) => $call,
            Behavior::Platform($b) => $call,
            Behavior::Projectile($b) => $call,
            Behavior::Checkpoint($b) => $call,
            Behavior::PowerUp($b) => $call,
        }
    };
}

impl Behavior {
    pub fn kind(&self) -> &'static str {
        match self {
            Behavior::None => "none",
            Behavior::Player(_) => "player",
            Behavior::Enemy(_) => "enemy",
            Behavior::Platform(_) => "platform",
            Behavior::Projectile(_) => "projectile",
            Behavior::Checkpoint(_) => "checkpoint",
            Behavior::PowerUp(_) => "powerup",
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Behavior::Player(p) => Some(&**p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Behavior::Player(p) => Some(&mut **p),
            _ => None,
        }
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match self {
            Behavior::Enemy(e) => Some(&**e),
            _ => None,
        }
    }

    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match self {
            Behavior::Enemy(e) => Some(&mut **e),
            _ => None,
        }
    }

    pub fn as_platform(&self) -> Option<&Platform> {
        match self {
            Behavior::Platform(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_checkpoint_mut(&mut self) -> Option<&mut Checkpoint> {
        match self {
            Behavior::Checkpoint(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_projectile(&self) -> Option<&Projectile> {
        match self {
            Behavior::Projectile(p) => Some(p),
            _ => None,
        }
    }
}

impl ObjectBehavior for Behavior {
    fn update(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        dispatch!(self, b => b.update(obj, ctx), Ok(()))
    }

    fn on_collision(&mut self, obj: &mut GameObject, other: &mut GameObject, contact: &Contact, cmds: &mut Commands) {
        dispatch!(self, b => b.on_collision(obj, other, contact, cmds), ())
    }

    fn on_trigger_enter(&mut self, obj: &mut GameObject, other: &mut GameObject, contact: &Contact, cmds: &mut Commands) {
        dispatch!(self, b => b.on_trigger_enter(obj, other, contact, cmds), ())
    }

    fn on_trigger_exit(&mut self, obj: &mut GameObject, other: ObjectId, cmds: &mut Commands) {
        dispatch!(self, b => b.on_trigger_exit(obj, other, cmds), ())
    }

    fn on_damage(&mut self, obj: &mut GameObject, amount: f32, source: Vec2, cmds: &mut Commands) -> DamageOutcome {
        dispatch!(self, b => b.on_damage(obj, amount, source, cmds), DamageOutcome::Ignored)
    }

    fn on_animation_complete(&mut self, obj: &mut GameObject, clip: &str) {
        dispatch!(self, b => b.on_animation_complete(obj, clip), ())
    }

    fn on_destroy(&mut self, obj: &GameObject, cmds: &mut Commands) {
        dispatch!(self, b => b.on_destroy(obj, cmds), ())
    }
}

/// Horizontal direction from a value: -1, 0 or 1.
pub(crate) fn sign_or_zero(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Move `current` toward `target` by at most `max_delta`.
pub(crate) fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if current < target {
        (current + max_delta).min(target)
    } else {
        (current - max_delta).max(target)
    }
}

/// Contact normal points straight up from `obj` to `other`: `other` is
/// standing on `obj`.
pub(crate) fn other_is_on_top(contact: &Contact) -> bool {
    contact.normal.y < -0.5
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::api::services::NullInput;

    /// Run `f` with a context over an empty world.
    pub fn with_ctx<R>(
        physics: &Physics,
        input: &dyn InputSource,
        others: &[GameObject],
        dt: f32,
        f: impl FnOnce(&mut EntityContext<'_>) -> R,
    ) -> (R, Commands) {
        let mut commands = Commands::new();
        let out = {
            let mut ctx = EntityContext {
                dt,
                time: 0.0,
                input,
                physics,
                neighbors: Neighbors::new(others, Default::default()),
                commands: &mut commands,
                level: LevelView {
                    bounds: Aabb::new(Vec2::ZERO, Vec2::new(2000.0, 1000.0)),
                    respawn_point: Vec2::new(10.0, 10.0),
                },
            };
            f(&mut ctx)
        };
        (out, commands)
    }

    pub fn null_input() -> NullInput {
        NullInput
    }
}
