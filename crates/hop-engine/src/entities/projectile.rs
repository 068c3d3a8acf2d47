//! Projectiles: lifetime and range limits, homing, gravity, bounce,
//! piercing and explosive variants.

use std::collections::BTreeSet;

use glam::Vec2;

use crate::api::types::{EntityError, ObjectId};
use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::Appearance;
use crate::core::math::VectorExt;
use crate::entities::abilities::AbilityParams;
use crate::entities::{Behavior, EntityContext, ObjectBehavior};
use crate::physics::layers::CollisionLayers;
use crate::physics::narrowphase::Contact;
use crate::world::commands::Commands;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homing {
    /// Blend rate toward the target heading, per second.
    pub strength: f32,
    /// Search radius when no explicit target is set.
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    pub limit: u32,
    /// Speed kept on each bounce.
    pub decay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosive {
    pub radius: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileConfig {
    pub size: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub lifetime: f32,
    pub max_range: f32,
    pub gravity_scale: f32,
    pub homing: Option<Homing>,
    pub bounce: Option<Bounce>,
    pub piercing: bool,
    pub explosive: Option<Explosive>,
    /// Layers this projectile damages.
    pub targets: CollisionLayers,
    pub color: [f32; 4],
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(8.0, 8.0),
            speed: 300.0,
            damage: 10.0,
            lifetime: 3.0,
            max_range: 600.0,
            gravity_scale: 0.0,
            homing: None,
            bounce: None,
            piercing: false,
            explosive: None,
            targets: CollisionLayers::ENEMY,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub config: ProjectileConfig,
    pub owner: Option<ObjectId>,
    /// Explicit homing target; otherwise the nearest target in range.
    pub target: Option<ObjectId>,
    age: f32,
    travelled: f32,
    bounces: u32,
    last_position: Option<Vec2>,
    /// Objects already damaged (piercing shots hit each only once).
    hits: BTreeSet<ObjectId>,
}

impl Projectile {
    pub fn new(config: ProjectileConfig, owner: Option<ObjectId>) -> Self {
        Self {
            config,
            owner,
            target: None,
            age: 0.0,
            travelled: 0.0,
            bounces: 0,
            last_position: None,
            hits: BTreeSet::new(),
        }
    }

    /// Build a projectile object centered on `center`, flying along `direction`.
    pub fn spawn(owner: Option<ObjectId>, center: Vec2, direction: Vec2, config: ProjectileConfig) -> GameObject {
        let mut obj = GameObject::new("projectile")
            .with_tag("projectile")
            .with_layer(WorldLayer::Projectiles)
            .with_size(config.size)
            .with_appearance(Appearance::color(config.color));
        obj.body.set_center(center);
        obj.body.velocity = direction.normalized() * config.speed;
        obj.body.gravity_scale = config.gravity_scale;
        obj.body.mass = 0.1;
        obj.body.solid = false;
        obj.body.trigger = true;
        obj.body.layers = CollisionLayers::PROJECTILE;
        obj.body.mask = CollisionLayers::SOLID | config.targets;
        obj.appearance.rotation = obj.body.velocity.y.atan2(obj.body.velocity.x);
        obj.with_behavior(Behavior::Projectile(Projectile::new(config, owner)))
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn travelled(&self) -> f32 {
        self.travelled
    }

    pub fn bounces(&self) -> u32 {
        self.bounces
    }

    /// End of flight: detonate if explosive, then go away.
    fn finish(&mut self, obj: &mut GameObject, cmds: &mut Commands) {
        if let Some(blast) = self.config.explosive {
            cmds.explode(obj.center(), blast.radius, blast.damage, self.config.targets, self.owner);
            cmds.play_sound("explosion");
        }
        obj.destroy();
    }

    fn steer(&self, obj: &mut GameObject, ctx: &EntityContext<'_>, homing: Homing) {
        let here = obj.center();
        let explicit = self
            .target
            .and_then(|id| ctx.neighbors.get(id))
            .filter(|t| t.is_alive());
        let Some(target) =
            explicit.or_else(|| ctx.neighbors.nearest_in_layers(here, self.config.targets, homing.range))
        else {
            return;
        };
        let speed = obj.body.velocity.length().max(self.config.speed);
        let desired = (target.center() - here).normalized() * speed;
        let t = (homing.strength * ctx.dt).clamp(0.0, 1.0);
        obj.body.velocity = obj.body.velocity.lerp(desired, t);
    }

    fn bounce_off(&mut self, obj: &mut GameObject, contact: &Contact, cmds: &mut Commands) -> bool {
        let Some(bounce) = self.config.bounce else {
            return false;
        };
        if self.bounces >= bounce.limit {
            return false;
        }
        self.bounces += 1;
        // Normal points from the projectile into the wall.
        obj.body.position -= contact.normal * contact.depth;
        obj.body.velocity = obj.body.velocity.reflected(contact.normal) * bounce.decay;
        cmds.play_sound("bounce");
        true
    }
}

impl ObjectBehavior for Projectile {
    fn update(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        let pos = obj.body.position;
        if let Some(last) = self.last_position.replace(pos) {
            self.travelled += pos.distance(last);
        }
        self.age += ctx.dt;
        if self.age >= self.config.lifetime || self.travelled >= self.config.max_range {
            self.finish(obj, ctx.commands);
            return Ok(());
        }

        if let Some(homing) = self.config.homing {
            self.steer(obj, ctx, homing);
        }
        let v = obj.body.velocity;
        if v != Vec2::ZERO {
            obj.appearance.rotation = v.y.atan2(v.x);
        }
        if !pos.is_finite() {
            return Err(EntityError::NonFinite(obj.id));
        }
        Ok(())
    }

    fn on_trigger_enter(&mut self, obj: &mut GameObject, other: &mut GameObject, contact: &Contact, cmds: &mut Commands) {
        if Some(other.id) == self.owner || !obj.is_alive() {
            return;
        }
        if other.body.layers.intersects(self.config.targets) {
            if !self.hits.insert(other.id) {
                return;
            }
            cmds.damage(other.id, self.config.damage, obj.center());
            if !self.config.piercing {
                self.finish(obj, cmds);
            } else if let Some(blast) = self.config.explosive {
                cmds.explode(obj.center(), blast.radius, blast.damage, self.config.targets, self.owner);
            }
        } else if other.body.layers.intersects(CollisionLayers::SOLID) && !self.bounce_off(obj, contact, cmds) {
            self.finish(obj, cmds);
        }
    }
}

/// The player's fireball, tuned by ability level.
pub fn fireball(owner: ObjectId, center: Vec2, direction: Vec2, params: &AbilityParams, level: u32) -> GameObject {
    let config = ProjectileConfig {
        size: Vec2::new(12.0, 12.0),
        speed: params.power,
        damage: params.damage,
        lifetime: params.duration,
        max_range: params.range,
        explosive: (level >= 2).then_some(Explosive {
            radius: 40.0,
            damage: params.damage * 0.5,
        }),
        piercing: level >= 3,
        targets: CollisionLayers::ENEMY,
        color: [1.0, 0.55, 0.1, 1.0],
        ..ProjectileConfig::default()
    };
    let mut obj = Projectile::spawn(Some(owner), center, direction, config);
    obj.name = "fireball".into();
    obj
}

/// A flying enemy's shot at the player.
pub fn enemy_shot(owner: ObjectId, center: Vec2, direction: Vec2, damage: f32) -> GameObject {
    let config = ProjectileConfig {
        speed: 220.0,
        damage,
        targets: CollisionLayers::PLAYER,
        color: [0.8, 0.2, 0.9, 1.0],
        ..ProjectileConfig::default()
    };
    Projectile::spawn(Some(owner), center, direction, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_support::{null_input, with_ctx};
    use crate::physics::Physics;
    use crate::world::commands::Command;

    fn take(mut obj: GameObject) -> (GameObject, Projectile) {
        obj.id = ObjectId(3);
        let Behavior::Projectile(p) = std::mem::take(&mut obj.behavior) else {
            unreachable!("spawn always builds a projectile");
        };
        (obj, p)
    }

    fn target(id: u32, layers: CollisionLayers) -> GameObject {
        let mut o = GameObject::new("target").with_pos(Vec2::new(100.0, 0.0));
        o.id = ObjectId(id);
        o.body.layers = layers;
        o
    }

    fn contact(normal: Vec2) -> Contact {
        Contact {
            a: 0,
            b: 1,
            a_id: ObjectId(3),
            b_id: ObjectId(9),
            normal,
            depth: 2.0,
            point: Vec2::ZERO,
        }
    }

    #[test]
    fn expires_after_lifetime() {
        let cfg = ProjectileConfig {
            lifetime: 0.1,
            ..ProjectileConfig::default()
        };
        let (mut obj, mut p) = take(Projectile::spawn(None, Vec2::ZERO, Vec2::X, cfg));
        let physics = Physics::default();
        let input = null_input();
        for _ in 0..3 {
            let _ = with_ctx(&physics, &input, &[], 0.05, |ctx| p.update(&mut obj, ctx));
        }
        assert!(obj.destroyed);
    }

    #[test]
    fn expires_after_range() {
        let cfg = ProjectileConfig {
            max_range: 50.0,
            ..ProjectileConfig::default()
        };
        let (mut obj, mut p) = take(Projectile::spawn(None, Vec2::ZERO, Vec2::X, cfg));
        let physics = Physics::default();
        let input = null_input();
        let _ = with_ctx(&physics, &input, &[], 0.01, |ctx| p.update(&mut obj, ctx));
        obj.body.position.x += 60.0;
        let _ = with_ctx(&physics, &input, &[], 0.01, |ctx| p.update(&mut obj, ctx));
        assert!(obj.destroyed);
    }

    #[test]
    fn ignores_owner_and_hits_target_once() {
        let (mut obj, mut p) = take(Projectile::spawn(Some(ObjectId(1)), Vec2::ZERO, Vec2::X, ProjectileConfig::default()));
        let mut owner = target(1, CollisionLayers::ENEMY);
        let mut cmds = Commands::new();
        p.on_trigger_enter(&mut obj, &mut owner, &contact(Vec2::X), &mut cmds);
        assert!(cmds.is_empty());
        assert!(!obj.destroyed);

        let mut enemy = target(9, CollisionLayers::ENEMY);
        p.on_trigger_enter(&mut obj, &mut enemy, &contact(Vec2::X), &mut cmds);
        assert!(matches!(
            cmds.iter().next(),
            Some(Command::Damage { target: ObjectId(9), .. })
        ));
        assert!(obj.destroyed);
    }

    #[test]
    fn piercing_survives_hits() {
        let cfg = ProjectileConfig {
            piercing: true,
            ..ProjectileConfig::default()
        };
        let (mut obj, mut p) = take(Projectile::spawn(None, Vec2::ZERO, Vec2::X, cfg));
        let mut cmds = Commands::new();
        let mut a = target(9, CollisionLayers::ENEMY);
        p.on_trigger_enter(&mut obj, &mut a, &contact(Vec2::X), &mut cmds);
        p.on_trigger_enter(&mut obj, &mut a, &contact(Vec2::X), &mut cmds);
        assert_eq!(cmds.len(), 1, "one hit per target");
        assert!(!obj.destroyed);
    }

    #[test]
    fn bounces_until_limit() {
        let cfg = ProjectileConfig {
            bounce: Some(Bounce { limit: 1, decay: 0.5 }),
            ..ProjectileConfig::default()
        };
        let (mut obj, mut p) = take(Projectile::spawn(None, Vec2::ZERO, Vec2::X, cfg));
        let mut wall = target(9, CollisionLayers::SOLID);
        let mut cmds = Commands::new();

        p.on_trigger_enter(&mut obj, &mut wall, &contact(Vec2::X), &mut cmds);
        assert!(!obj.destroyed);
        assert!((obj.body.velocity.x + 150.0).abs() < 1e-3);
        assert_eq!(p.bounces(), 1);

        p.on_trigger_enter(&mut obj, &mut wall, &contact(Vec2::NEG_X), &mut cmds);
        assert!(obj.destroyed);
    }

    #[test]
    fn explosive_impact_emits_explosion() {
        let cfg = ProjectileConfig {
            explosive: Some(Explosive { radius: 50.0, damage: 30.0 }),
            ..ProjectileConfig::default()
        };
        let (mut obj, mut p) = take(Projectile::spawn(Some(ObjectId(1)), Vec2::ZERO, Vec2::X, cfg));
        let mut wall = target(9, CollisionLayers::SOLID);
        let mut cmds = Commands::new();
        p.on_trigger_enter(&mut obj, &mut wall, &contact(Vec2::X), &mut cmds);
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::Explosion { radius, source: Some(ObjectId(1)), .. } if *radius == 50.0
        )));
    }

    #[test]
    fn homing_turns_toward_target() {
        let cfg = ProjectileConfig {
            homing: Some(Homing { strength: 5.0, range: 500.0 }),
            ..ProjectileConfig::default()
        };
        let (mut obj, mut p) = take(Projectile::spawn(None, Vec2::ZERO, Vec2::X, cfg));
        let mut enemy = target(9, CollisionLayers::ENEMY);
        enemy.body.position = Vec2::new(0.0, 200.0);
        let physics = Physics::default();
        let input = null_input();
        let others = [enemy];
        let _ = with_ctx(&physics, &input, &others, 0.1, |ctx| p.update(&mut obj, ctx));
        assert!(obj.body.velocity.y > 0.0);
    }

    #[test]
    fn fireball_scales_with_level() {
        let params = crate::entities::abilities::AbilityKind::Fireball.params(3);
        let obj = fireball(ObjectId(1), Vec2::ZERO, Vec2::NEG_X, &params, 3);
        let p = obj.behavior.as_projectile().expect("fireball is a projectile");
        assert!(p.config.piercing);
        assert!(p.config.explosive.is_some());
        assert!(obj.body.velocity.x < 0.0);
        assert!(obj.body.trigger);
    }
}
