use std::collections::BTreeSet;

use glam::Vec2;

use crate::api::types::{EntityError, ObjectId};
use crate::components::animation::Animator;
use crate::components::layer::WorldLayer;
use crate::components::sprite::Appearance;
use crate::core::math::Aabb;
use crate::entities::{Behavior, EntityContext, ObjectBehavior};
use crate::physics::layers::CollisionLayers;

/// Physical state of an object: kinematics, bounds, material and
/// collision participation.
#[derive(Debug, Clone)]
pub struct Body {
    /// Top-left corner in world space (y grows downward).
    pub position: Vec2,
    pub velocity: Vec2,
    /// Frame-transient; cleared after integration.
    pub acceleration: Vec2,
    pub size: Vec2,
    /// Optional collision box relative to `position`: (offset, size).
    pub custom_bounds: Option<(Vec2, Vec2)>,
    pub mass: f32,
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Restitution (bounciness).
    pub restitution: f32,
    pub gravity_scale: f32,
    /// Linear velocity damping per second, applied during logic integration.
    pub drag: f32,
    /// Participates in blocking collision.
    pub solid: bool,
    /// Participates in overlap notification only.
    pub trigger: bool,
    /// Moved by its own behavior, never by the solver.
    pub kinematic: bool,
    pub layers: CollisionLayers,
    pub mask: CollisionLayers,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            size: Vec2::splat(32.0),
            custom_bounds: None,
            mass: 1.0,
            friction: 0.5,
            restitution: 0.0,
            gravity_scale: 1.0,
            drag: 0.0,
            solid: true,
            trigger: false,
            kinematic: false,
            layers: CollisionLayers::empty(),
            mask: CollisionLayers::empty(),
        }
    }
}

impl Body {
    /// World-space AABB, derived from position and size (or custom bounds).
    pub fn bounds(&self) -> Aabb {
        match self.custom_bounds {
            Some((offset, size)) => Aabb::from_pos_size(self.position + offset, size),
            None => Aabb::from_pos_size(self.position, self.size),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    /// Place the body so its collision box is centered on `center`.
    pub fn set_center(&mut self, center: Vec2) {
        let delta = center - self.center();
        self.position += delta;
    }

    /// acceleration += f / mass. Zero-mass bodies ignore forces.
    pub fn add_force(&mut self, force: Vec2) {
        if self.mass > 0.0 {
            self.acceleration += force / self.mass;
        }
    }

    /// velocity += j / mass, instantaneous. Zero-mass bodies ignore impulses.
    pub fn add_impulse(&mut self, impulse: Vec2) {
        if self.mass > 0.0 {
            self.velocity += impulse / self.mass;
        }
    }

    /// Acceleration into velocity (with drag), then clear acceleration.
    pub fn integrate_velocity(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        if self.drag > 0.0 {
            self.velocity /= 1.0 + self.drag * dt;
        }
        self.acceleration = Vec2::ZERO;
    }

    pub fn integrate_position(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

/// Base game object. A single struct with optional components, designed
/// for small object counts and simple ownership.
#[derive(Debug, Clone)]
pub struct GameObject {
    /// Unique identifier, assigned by the world when the object is added.
    pub id: ObjectId,
    pub name: String,
    pub tags: BTreeSet<String>,
    /// Render layer this object is drawn in.
    pub layer: WorldLayer,
    /// Paint order within the layer.
    pub z_index: i32,
    pub active: bool,
    pub visible: bool,
    /// Pending removal; the world sweeps it on its next pass.
    pub destroyed: bool,
    /// Survives level changes.
    pub persistent: bool,
    pub body: Body,
    pub appearance: Appearance,
    pub animation: Option<Animator>,
    pub behavior: Behavior,
}

impl GameObject {
    /// Id placeholder for objects not yet added to a world.
    pub const UNASSIGNED: ObjectId = ObjectId(0);

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Self::UNASSIGNED,
            name: name.into(),
            tags: BTreeSet::new(),
            layer: WorldLayer::Entities,
            z_index: 0,
            active: true,
            visible: true,
            destroyed: false,
            persistent: false,
            body: Body::default(),
            appearance: Appearance::default(),
            animation: None,
            behavior: Behavior::None,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.body.position = pos;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.body.size = size;
        self
    }

    pub fn with_layer(mut self, layer: WorldLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = appearance;
        self
    }

    pub fn with_animation(mut self, animation: Animator) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    // -- Queries --

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Objects tagged `static` never move and never receive impulses.
    pub fn is_static(&self) -> bool {
        self.has_tag("static")
    }

    /// Live and taking part in the simulation.
    pub fn is_alive(&self) -> bool {
        self.active && !self.destroyed
    }

    /// Whether the solver may move this object.
    pub fn is_movable(&self) -> bool {
        !self.is_static() && !self.body.kinematic && self.body.mass > 0.0
    }

    /// Inverse mass for impulse resolution; immovable objects are 0.
    pub fn inverse_mass(&self) -> f32 {
        if self.is_movable() {
            1.0 / self.body.mass
        } else {
            0.0
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.body.bounds()
    }

    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    pub fn add_force(&mut self, force: Vec2) {
        self.body.add_force(force);
    }

    pub fn add_impulse(&mut self, impulse: Vec2) {
        self.body.add_impulse(impulse);
    }

    /// Mark for removal. The world forgets the object on its next sweep.
    /// Returns false if it was already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        self.active = false;
        true
    }

    /// Play an animation clip if the object has one by that name.
    pub fn play_animation(&mut self, name: &str) {
        if let Some(anim) = self.animation.as_mut() {
            anim.switch_to(name);
        }
    }

    /// Run `f` with the behavior temporarily detached, so it can mutate
    /// the rest of the object freely.
    pub fn with_behavior_mut<R>(&mut self, f: impl FnOnce(&mut Behavior, &mut GameObject) -> R) -> R {
        let mut behavior = std::mem::take(&mut self.behavior);
        let out = f(&mut behavior, self);
        self.behavior = behavior;
        out
    }

    /// Advance animation and visual timers. Returns the name of a
    /// non-looping clip that finished during this tick.
    pub(crate) fn tick_visuals(&mut self, dt: f32) -> Option<&'static str> {
        self.appearance.tick(dt);
        let anim = self.animation.as_mut()?;
        let completed = anim.advance(dt);
        if let Some(cell) = anim.cell() {
            self.appearance.set_frame(cell);
        }
        completed
    }

    /// Standalone per-frame update for objects driven outside a world:
    /// animation, then acceleration into velocity, then velocity into
    /// position, then forces are cleared.
    ///
    /// Inside a `World` the behavior hook runs first and the physics
    /// sub-steps own position integration instead.
    pub fn update(&mut self, dt: f32) {
        if !self.is_alive() {
            return;
        }
        self.tick_visuals(dt);
        self.body.integrate_velocity(dt);
        self.body.integrate_position(dt);
    }

    /// In-world per-frame update: behavior hook, animation, then
    /// acceleration into velocity. Position is left to the physics step.
    pub fn update_logic(&mut self, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        if !self.is_alive() {
            return Ok(());
        }
        self.with_behavior_mut(|behavior, obj| behavior.update(obj, ctx))?;
        if !self.is_alive() {
            return Ok(());
        }
        if let Some(clip) = self.tick_visuals(ctx.dt) {
            self.with_behavior_mut(|behavior, obj| behavior.on_animation_complete(obj, clip));
        }
        if !self.body.kinematic {
            self.body.integrate_velocity(ctx.dt);
        }
        if !self.body.position.is_finite() || !self.body.velocity.is_finite() {
            return Err(EntityError::NonFinite(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::Clip;
    use crate::components::sprite::AtlasId;

    #[test]
    fn bounds_follow_position_and_custom_box() {
        let mut obj = GameObject::new("crate")
            .with_pos(Vec2::new(10.0, 20.0))
            .with_size(Vec2::new(30.0, 40.0));
        assert_eq!(obj.bounds(), Aabb::new(Vec2::new(10.0, 20.0), Vec2::new(40.0, 60.0)));
        assert_eq!(obj.center(), Vec2::new(25.0, 40.0));

        obj.body.custom_bounds = Some((Vec2::new(5.0, 0.0), Vec2::new(20.0, 40.0)));
        assert_eq!(obj.bounds(), Aabb::new(Vec2::new(15.0, 20.0), Vec2::new(35.0, 60.0)));
    }

    #[test]
    fn force_is_frame_transient() {
        let mut obj = GameObject::new("ball");
        obj.body.mass = 2.0;
        obj.add_force(Vec2::new(10.0, 0.0));
        assert_eq!(obj.body.acceleration, Vec2::new(5.0, 0.0));
        obj.update(1.0);
        assert_eq!(obj.body.velocity, Vec2::new(5.0, 0.0));
        assert_eq!(obj.body.position, Vec2::new(5.0, 0.0));
        assert_eq!(obj.body.acceleration, Vec2::ZERO);
        obj.update(1.0);
        assert_eq!(obj.body.velocity, Vec2::new(5.0, 0.0), "no force this frame");
    }

    #[test]
    fn impulse_ignores_timestep_and_zero_mass() {
        let mut obj = GameObject::new("ball");
        obj.body.mass = 4.0;
        obj.add_impulse(Vec2::new(0.0, -8.0));
        assert_eq!(obj.body.velocity, Vec2::new(0.0, -2.0));

        let mut weightless = GameObject::new("ghost");
        weightless.body.mass = 0.0;
        weightless.add_impulse(Vec2::new(100.0, 0.0));
        weightless.add_force(Vec2::new(100.0, 0.0));
        assert_eq!(weightless.body.velocity, Vec2::ZERO);
        assert_eq!(weightless.inverse_mass(), 0.0);
    }

    #[test]
    fn inactive_or_destroyed_does_not_update() {
        let mut obj = GameObject::new("ball");
        obj.body.velocity = Vec2::new(1.0, 0.0);
        assert!(obj.destroy());
        assert!(!obj.destroy());
        assert!(!obj.active);
        obj.update(1.0);
        assert_eq!(obj.body.position, Vec2::ZERO);
    }

    #[test]
    fn static_tag_is_immovable() {
        let obj = GameObject::new("wall").with_tag("static");
        assert!(obj.is_static());
        assert!(!obj.is_movable());
        assert_eq!(obj.inverse_mass(), 0.0);
    }

    #[test]
    fn update_advances_sprite_frame_and_reports_completion() {
        let anim = Animator::new("pop", Clip::strip(2.0, 0.0, 2, 10.0).once());
        let mut obj = GameObject::new("fx")
            .with_appearance(Appearance::sprite(AtlasId(1), 0.0, 2.0))
            .with_animation(anim);
        assert_eq!(obj.tick_visuals(0.12), None);
        assert_eq!(
            obj.appearance.visual,
            crate::components::sprite::Visual::Sprite { atlas: AtlasId(1), col: 1.0, row: 2.0 }
        );
        assert_eq!(obj.tick_visuals(0.12), Some("pop"));
    }

    #[test]
    fn update_logic_leaves_position_to_physics() {
        use crate::entities::test_support::{null_input, with_ctx};
        let physics = crate::physics::Physics::default();
        let input = null_input();
        let mut obj = GameObject::new("ball");
        obj.add_force(Vec2::new(60.0, 0.0));
        let (res, _) = with_ctx(&physics, &input, &[], 0.5, |ctx| obj.update_logic(ctx));
        assert!(res.is_ok());
        assert_eq!(obj.body.velocity, Vec2::new(30.0, 0.0));
        assert_eq!(obj.body.position, Vec2::ZERO);
        assert_eq!(obj.body.acceleration, Vec2::ZERO);
    }

    #[test]
    fn update_logic_flags_non_finite_state() {
        use crate::entities::test_support::{null_input, with_ctx};
        let physics = crate::physics::Physics::default();
        let input = null_input();
        let mut obj = GameObject::new("broken");
        obj.id = ObjectId(3);
        obj.body.velocity = Vec2::new(f32::NAN, 0.0);
        let (res, _) = with_ctx(&physics, &input, &[], 0.1, |ctx| obj.update_logic(ctx));
        assert!(matches!(res, Err(EntityError::NonFinite(ObjectId(3)))));
    }
}
