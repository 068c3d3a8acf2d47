//! Sub-stepped AABB physics: gravity, broad phase, narrow phase, sorted
//! resolution (positional correction, impulse, friction) and triggers.
//!
//! Physics owns position integration for world objects. Behaviors move
//! things by setting velocity or applying forces during their update.

pub mod grid;
pub mod layers;
pub mod narrowphase;

use std::collections::HashSet;

use glam::Vec2;

use crate::api::config::PhysicsConfig;
use crate::api::types::ObjectId;
use crate::components::object::GameObject;
use crate::core::math::Aabb;
use crate::core::store::pair_mut;
use crate::entities::ObjectBehavior;
use crate::world::commands::Commands;

use grid::SpatialGrid;
use layers::{CollisionLayers, CollisionMatrix};
use narrowphase::{aabb_contact, ray_aabb, Contact};

/// A raycast result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub id: ObjectId,
    pub distance: f32,
    pub point: Vec2,
    /// Surface normal at the entry point (zero when the ray starts inside).
    pub normal: Vec2,
}

/// Counters from the last `update`, for debugging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsStats {
    pub pairs: usize,
    pub contacts: usize,
    pub triggers_entered: usize,
    pub triggers_exited: usize,
}

type PairKey = (ObjectId, ObjectId);

fn pair_key(a: ObjectId, b: ObjectId) -> PairKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The physics solver. Keeps the settled spatial grid of the last step
/// around so entity queries (ground probes, line of sight) can use it.
pub struct Physics {
    config: PhysicsConfig,
    grid: SpatialGrid,
    /// Trigger pairs overlapping at the end of the last frame.
    active_triggers: HashSet<PairKey>,
    /// Trigger pairs seen overlapping during the current frame.
    frame_triggers: HashSet<PairKey>,
    stats: PhysicsStats,
}

impl Physics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            grid: SpatialGrid::new(config.cell_size),
            config,
            active_triggers: HashSet::new(),
            frame_triggers: HashSet::new(),
            stats: PhysicsStats::default(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn stats(&self) -> PhysicsStats {
        self.stats
    }

    /// Forget trigger overlaps and the settled grid (level change).
    pub fn reset(&mut self) {
        self.grid.clear();
        self.active_triggers.clear();
        self.frame_triggers.clear();
        self.stats = PhysicsStats::default();
    }

    /// Step every object by `dt`.
    pub fn update(&mut self, objects: &mut [GameObject], dt: f32, commands: &mut Commands) {
        self.stats = PhysicsStats::default();
        if dt <= 0.0 {
            return;
        }

        self.apply_gravity(objects);
        self.frame_triggers.clear();

        let steps = self.config.sub_steps.max(1);
        let sub_dt = dt / steps as f32;
        for _ in 0..steps {
            self.integrate_velocity(objects, sub_dt);
            self.grid.rebuild(objects);

            let pairs = self.grid.potential_pairs();
            self.stats.pairs += pairs.len();
            let mut contacts = self.narrow_phase(objects, &pairs);
            // Deepest first, so stacked corrections converge.
            contacts.sort_by(|a, b| b.depth.total_cmp(&a.depth));
            self.stats.contacts += contacts.len();

            for contact in &contacts {
                self.resolve(objects, contact, commands);
            }
            Self::integrate_position(objects, sub_dt);
        }

        for obj in objects.iter_mut() {
            obj.body.acceleration = Vec2::ZERO;
        }
        self.fire_trigger_exits(objects, commands);
        // Settled positions for next frame's queries.
        self.grid.rebuild(objects);
    }

    /// Add gravity as a force on every live object that feels it.
    pub fn apply_gravity(&self, objects: &mut [GameObject]) {
        for obj in objects.iter_mut() {
            if !obj.is_alive() || obj.body.gravity_scale <= 0.0 || !Self::moves_freely(obj) {
                continue;
            }
            let force = self.config.gravity * obj.body.gravity_scale * obj.body.mass;
            obj.body.add_force(force);
        }
    }

    fn moves_freely(obj: &GameObject) -> bool {
        !obj.is_static() && !obj.body.kinematic
    }

    fn integrate_velocity(&self, objects: &mut [GameObject], sub_dt: f32) {
        let terminal = self.config.terminal_velocity;
        for obj in objects.iter_mut() {
            if !obj.is_alive() || !Self::moves_freely(obj) {
                continue;
            }
            obj.body.velocity += obj.body.acceleration * sub_dt;
            if obj.body.gravity_scale != 0.0 && terminal > 0.0 {
                obj.body.velocity.y = obj.body.velocity.y.clamp(-terminal, terminal);
            }
        }
    }

    fn integrate_position(objects: &mut [GameObject], sub_dt: f32) {
        for obj in objects.iter_mut() {
            if obj.is_alive() && Self::moves_freely(obj) {
                obj.body.integrate_position(sub_dt);
            }
        }
    }

    /// Exact tests for candidate pairs.
    pub fn narrow_phase(&self, objects: &[GameObject], pairs: &[(usize, usize)]) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for &(ia, ib) in pairs {
            let (Some(a), Some(b)) = (objects.get(ia), objects.get(ib)) else {
                continue;
            };
            if ia == ib || !a.is_alive() || !b.is_alive() {
                continue;
            }
            let participates = |o: &GameObject| o.body.solid || o.body.trigger;
            if !participates(a) && !participates(b) {
                continue;
            }
            if !CollisionMatrix::allows(a.body.layers, a.body.mask, b.body.layers, b.body.mask) {
                continue;
            }
            let any_trigger = a.body.trigger || b.body.trigger;
            if !any_trigger && !a.is_movable() && !b.is_movable() {
                continue;
            }

            let (ba, bb) = (a.bounds(), b.bounds());
            // Triggers need real overlap; solids also report resting contact.
            let slop = if any_trigger {
                if !ba.overlaps(&bb) {
                    continue;
                }
                0.0
            } else {
                self.config.contact_slop
            };
            if let Some((normal, depth, point)) = aabb_contact(&ba, &bb, slop) {
                contacts.push(Contact {
                    a: ia,
                    b: ib,
                    a_id: a.id,
                    b_id: b.id,
                    normal,
                    depth,
                    point,
                });
            }
        }
        contacts
    }

    fn resolve(&mut self, objects: &mut [GameObject], contact: &Contact, commands: &mut Commands) {
        let Some((a, b)) = pair_mut(objects, contact.a, contact.b) else {
            return;
        };
        // An earlier callback this step may have destroyed one side.
        if !a.is_alive() || !b.is_alive() {
            return;
        }

        if a.body.trigger || b.body.trigger {
            let key = pair_key(a.id, b.id);
            let onset = self.frame_triggers.insert(key) && !self.active_triggers.contains(&key);
            if onset {
                self.stats.triggers_entered += 1;
                if a.body.trigger {
                    a.with_behavior_mut(|behavior, a| behavior.on_trigger_enter(a, b, contact, commands));
                }
                if b.body.trigger && b.is_alive() {
                    let flipped = contact.flipped();
                    b.with_behavior_mut(|behavior, b| behavior.on_trigger_enter(b, a, &flipped, commands));
                }
            }
            return;
        }
        if !a.body.solid && !b.body.solid {
            return;
        }

        let n = contact.normal;
        self.correct_positions(a, b, n, contact.depth);
        Self::apply_impulses(a, b, n);

        a.with_behavior_mut(|behavior, a| behavior.on_collision(a, b, contact, commands));
        let flipped = contact.flipped();
        b.with_behavior_mut(|behavior, b| behavior.on_collision(b, a, &flipped, commands));
    }

    /// Push the pair apart along `n` by a fraction of the penetration,
    /// split by the other object's mass.
    fn correct_positions(&self, a: &mut GameObject, b: &mut GameObject, n: Vec2, depth: f32) {
        if depth <= 0.0 {
            return;
        }
        let (mut wa, mut wb) = match (a.body.solid, b.body.solid) {
            (true, false) => (0.0, 1.0),
            (false, true) => (1.0, 0.0),
            _ => {
                let total = a.body.mass + b.body.mass;
                if total > 0.0 {
                    (b.body.mass / total, a.body.mass / total)
                } else {
                    (0.5, 0.5)
                }
            }
        };
        let (a_fixed, b_fixed) = (!Self::moves_freely(a), !Self::moves_freely(b));
        if a_fixed {
            wb += wa;
            wa = 0.0;
        }
        if b_fixed {
            wa += wb;
            wb = 0.0;
        }
        if a_fixed && b_fixed {
            return;
        }
        let correction = n * depth * self.config.correction_percent;
        a.body.position -= correction * wa;
        b.body.position += correction * wb;
    }

    /// Normal impulse with restitution, then Coulomb friction.
    fn apply_impulses(a: &mut GameObject, b: &mut GameObject, n: Vec2) {
        let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
        let inv_sum = inv_a + inv_b;
        if inv_sum <= 0.0 {
            return;
        }
        let rv = b.body.velocity - a.body.velocity;
        let vn = rv.dot(n);
        if vn > 0.0 {
            return;
        }
        let e = a.body.restitution.min(b.body.restitution);
        let j = -(1.0 + e) * vn / inv_sum;
        a.body.velocity -= n * (j * inv_a);
        b.body.velocity += n * (j * inv_b);

        let rv = b.body.velocity - a.body.velocity;
        let tangent = (rv - n * rv.dot(n)).normalize_or_zero();
        if tangent == Vec2::ZERO {
            return;
        }
        let mu = (a.body.friction.max(0.0) * b.body.friction.max(0.0)).sqrt();
        let limit = j.abs() * mu;
        let jt = (-rv.dot(tangent) / inv_sum).clamp(-limit, limit);
        a.body.velocity -= tangent * (jt * inv_a);
        b.body.velocity += tangent * (jt * inv_b);
    }

    fn fire_trigger_exits(&mut self, objects: &mut [GameObject], commands: &mut Commands) {
        let ended: Vec<PairKey> = self
            .active_triggers
            .difference(&self.frame_triggers)
            .copied()
            .collect();
        for (x, y) in ended {
            for (me, other) in [(x, y), (y, x)] {
                let Some(obj) = objects.iter_mut().find(|o| o.id == me) else {
                    continue;
                };
                if obj.body.trigger && obj.is_alive() {
                    self.stats.triggers_exited += 1;
                    obj.with_behavior_mut(|behavior, obj| behavior.on_trigger_exit(obj, other, commands));
                }
            }
        }
        self.active_triggers = std::mem::take(&mut self.frame_triggers);
    }

    // -- Queries against the settled grid --

    /// All hits along the ray within `max_distance`, nearest first.
    /// `filter` keeps only objects in one of the given layers.
    pub fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: Option<CollisionLayers>,
    ) -> Vec<RayHit> {
        self.raycast_excluding(origin, direction, max_distance, filter, None)
    }

    pub fn raycast_excluding(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: Option<CollisionLayers>,
        exclude: Option<ObjectId>,
    ) -> Vec<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO || max_distance <= 0.0 {
            return Vec::new();
        }
        let mut hits: Vec<RayHit> = self
            .grid
            .objects_in_ray(origin, dir, max_distance)
            .into_iter()
            .filter(|e| Some(e.id) != exclude)
            .filter(|e| filter.map_or(true, |f| e.layers.intersects(f)))
            .filter_map(|e| {
                ray_aabb(origin, dir, max_distance, &e.bounds).map(|(distance, normal)| RayHit {
                    id: e.id,
                    distance,
                    point: origin + dir * distance,
                    normal,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// First blocking hit, if any.
    pub fn raycast_first(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: Option<CollisionLayers>,
    ) -> Option<RayHit> {
        self.raycast(origin, direction, max_distance, filter).into_iter().next()
    }

    /// Whether a straight segment between two points is free of the given layers.
    pub fn line_of_sight(&self, from: Vec2, to: Vec2, blockers: CollisionLayers) -> bool {
        let delta = to - from;
        let dist = delta.length();
        if dist <= f32::EPSILON {
            return true;
        }
        self.raycast_first(from, delta, dist, Some(blockers)).is_none()
    }

    /// Short downward probes from the bottom edge.
    pub fn is_grounded(&self, obj: &GameObject) -> bool {
        let b = obj.bounds();
        let inset = (b.width() * 0.25).min(2.0);
        let reach = 1.0 + self.config.ground_probe;
        let ground = CollisionLayers::SOLID | CollisionLayers::PLATFORM;
        [b.min.x + inset, b.center().x, b.max.x - inset].into_iter().any(|x| {
            !self
                .raycast_excluding(Vec2::new(x, b.max.y - 1.0), Vec2::Y, reach, Some(ground), Some(obj.id))
                .is_empty()
        })
    }

    /// Short sideways probes toward `dir` (sign of x).
    pub fn is_touching_wall(&self, obj: &GameObject, dir: f32) -> bool {
        if dir == 0.0 {
            return false;
        }
        let b = obj.bounds();
        let side = dir.signum();
        let x = if side > 0.0 { b.max.x - 1.0 } else { b.min.x + 1.0 };
        let reach = 1.0 + self.config.ground_probe;
        let inset = (b.height() * 0.25).min(3.0);
        [b.min.y + inset, b.center().y, b.max.y - inset].into_iter().any(|y| {
            !self
                .raycast_excluding(
                    Vec2::new(x, y),
                    Vec2::new(side, 0.0),
                    reach,
                    Some(CollisionLayers::SOLID),
                    Some(obj.id),
                )
                .is_empty()
        })
    }

    /// Ids of objects overlapping `area`, optionally limited to layers.
    pub fn query_aabb(&self, area: &Aabb, filter: Option<CollisionLayers>) -> Vec<ObjectId> {
        self.grid
            .query_aabb(area)
            .into_iter()
            .filter(|e| filter.map_or(true, |f| e.layers.intersects(f)))
            .map(|e| e.id)
            .collect()
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::object::Body;

    fn solid(id: u32, pos: Vec2, size: Vec2) -> GameObject {
        let mut o = GameObject::new("solid").with_pos(pos).with_size(size);
        o.id = ObjectId(id);
        o.body.layers = CollisionLayers::ENEMY;
        o.body.mask = CollisionLayers::ENEMY;
        o
    }

    fn ground(id: u32, pos: Vec2, size: Vec2) -> GameObject {
        let mut o = GameObject::new("ground").with_pos(pos).with_size(size).with_tag("static");
        o.id = ObjectId(id);
        o.body.layers = CollisionLayers::SOLID;
        o.body.mask = CollisionLayers::PLAYER | CollisionLayers::ENEMY;
        o.body.gravity_scale = 0.0;
        o
    }

    #[test]
    fn zero_gravity_scale_never_falls() {
        let mut physics = Physics::default();
        let mut cmds = Commands::new();
        let mut objs = vec![solid(1, Vec2::new(0.0, 0.0), Vec2::splat(10.0))];
        objs[0].body.gravity_scale = 0.0;
        for _ in 0..120 {
            physics.update(&mut objs, 1.0 / 60.0, &mut cmds);
        }
        assert_eq!(objs[0].body.position.y, 0.0);
    }

    #[test]
    fn gravity_over_a_frame_matches_g_dt() {
        let mut physics = Physics::default();
        let mut cmds = Commands::new();
        let mut objs = vec![solid(1, Vec2::ZERO, Vec2::splat(10.0))];
        physics.update(&mut objs, 1.0 / 60.0, &mut cmds);
        assert!((objs[0].body.velocity.y - 800.0 / 60.0).abs() < 1e-3);
        assert_eq!(objs[0].body.acceleration, Vec2::ZERO);
    }

    #[test]
    fn equal_masses_split_correction() {
        let physics = Physics::new(PhysicsConfig {
            gravity: Vec2::ZERO,
            ..PhysicsConfig::default()
        });
        // Overlap of 4 along x.
        let mut objs = vec![
            solid(1, Vec2::new(0.0, 0.0), Vec2::splat(10.0)),
            solid(2, Vec2::new(6.0, 0.0), Vec2::splat(10.0)),
        ];
        let contacts = physics.narrow_phase(&objs, &[(0, 1)]);
        assert_eq!(contacts.len(), 1);
        let c = contacts[0];
        assert_eq!(c.normal, Vec2::X);
        assert!((c.depth - 4.0).abs() < 1e-5);

        let (a, b) = pair_mut(&mut objs, 0, 1).expect("two objects");
        physics.correct_positions(a, b, c.normal, c.depth);
        let moved = (objs[0].body.position.x - 0.0).abs() + (objs[1].body.position.x - 6.0).abs();
        assert!(moved >= 0.8 * 4.0 - 1e-4);
        assert!((objs[0].body.position.x + 1.6).abs() < 1e-4);
        assert!((objs[1].body.position.x - 7.6).abs() < 1e-4);
    }

    #[test]
    fn heavier_object_moves_less() {
        let physics = Physics::default();
        let mut a = solid(1, Vec2::ZERO, Vec2::splat(10.0));
        let mut b = solid(2, Vec2::new(8.0, 0.0), Vec2::splat(10.0));
        a.body.mass = 3.0;
        physics.correct_positions(&mut a, &mut b, Vec2::X, 2.0);
        assert!(a.body.position.x.abs() < (b.body.position.x - 8.0).abs());
    }

    #[test]
    fn static_objects_are_never_pushed_or_paired() {
        let physics = Physics::default();
        let objs = vec![
            ground(1, Vec2::ZERO, Vec2::splat(10.0)),
            ground(2, Vec2::new(5.0, 0.0), Vec2::splat(10.0)),
        ];
        assert!(physics.narrow_phase(&objs, &[(0, 1)]).is_empty());

        let mut wall = ground(1, Vec2::ZERO, Vec2::splat(10.0));
        let mut body = solid(2, Vec2::new(8.0, 0.0), Vec2::splat(10.0));
        body.body.velocity = Vec2::new(-50.0, 0.0);
        physics.correct_positions(&mut wall, &mut body, Vec2::X, 2.0);
        Physics::apply_impulses(&mut wall, &mut body, Vec2::X);
        assert_eq!(wall.body.position, Vec2::ZERO);
        assert!((body.body.position.x - 9.6).abs() < 1e-4);
        assert!(body.body.velocity.x.abs() < 1e-4);
    }

    #[test]
    fn layer_matrix_filters_pairs() {
        let physics = Physics::default();
        let mut pickup = solid(1, Vec2::ZERO, Vec2::splat(10.0));
        pickup.body.layers = CollisionLayers::PICKUP;
        pickup.body.mask = CollisionLayers::PLAYER;
        let wall = ground(2, Vec2::new(5.0, 0.0), Vec2::splat(10.0));
        assert!(physics.narrow_phase(&[pickup, wall], &[(0, 1)]).is_empty());
    }

    #[test]
    fn restitution_uses_the_smaller_value() {
        let mut a = solid(1, Vec2::ZERO, Vec2::splat(10.0));
        let mut b = solid(2, Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        a.body.velocity = Vec2::new(10.0, 0.0);
        a.body.restitution = 1.0;
        b.body.restitution = 0.0;
        Physics::apply_impulses(&mut a, &mut b, Vec2::X);
        // Perfectly inelastic: both move together.
        assert!((a.body.velocity.x - 5.0).abs() < 1e-4);
        assert!((b.body.velocity.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn separating_pair_gets_no_impulse() {
        let mut a = solid(1, Vec2::ZERO, Vec2::splat(10.0));
        let mut b = solid(2, Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        b.body.velocity = Vec2::new(5.0, 0.0);
        Physics::apply_impulses(&mut a, &mut b, Vec2::X);
        assert_eq!(a.body.velocity, Vec2::ZERO);
        assert_eq!(b.body.velocity, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn friction_is_clamped_by_normal_impulse() {
        let mut floor = ground(1, Vec2::new(0.0, 10.0), Vec2::new(100.0, 10.0));
        floor.body.friction = 1.0;
        let mut slider = solid(2, Vec2::ZERO, Vec2::splat(10.0));
        slider.body.friction = 1.0;
        slider.body.velocity = Vec2::new(100.0, 4.0);
        Physics::apply_impulses(&mut slider, &mut floor, Vec2::Y);
        assert!(slider.body.velocity.y.abs() < 1e-4);
        // |j| = 4, mu = 1: at most 4 units of tangential speed removed.
        assert!((slider.body.velocity.x - 96.0).abs() < 1e-3);
    }

    #[test]
    fn zero_mass_is_no_impulse() {
        let mut a = solid(1, Vec2::ZERO, Vec2::splat(10.0));
        let mut b = solid(2, Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        a.body.mass = 0.0;
        b.body.mass = 0.0;
        a.body.velocity = Vec2::new(10.0, 0.0);
        Physics::apply_impulses(&mut a, &mut b, Vec2::X);
        assert_eq!(a.body.velocity, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn body_rests_on_ground() {
        let mut physics = Physics::default();
        let mut cmds = Commands::new();
        let mut objs = vec![
            ground(1, Vec2::new(0.0, 100.0), Vec2::new(200.0, 20.0)),
            solid(2, Vec2::new(50.0, 40.0), Vec2::new(20.0, 20.0)),
        ];
        objs[1].body.layers = CollisionLayers::PLAYER;
        objs[1].body.mask = CollisionLayers::SOLID;
        for _ in 0..180 {
            physics.update(&mut objs, 1.0 / 60.0, &mut cmds);
        }
        let bottom = objs[1].bounds().max.y;
        assert!((bottom - 100.0).abs() < 1.0, "bottom at {bottom}");
        assert!(objs[1].body.velocity.y.abs() < 1.0);
        assert!(physics.is_grounded(&objs[1]));
        assert!(!physics.is_touching_wall(&objs[1], 1.0));
    }

    #[test]
    fn trigger_enters_once_and_never_pushes() {
        let mut physics = Physics::new(PhysicsConfig {
            gravity: Vec2::ZERO,
            ..PhysicsConfig::default()
        });
        let mut cmds = Commands::new();
        let mut zone = GameObject::new("zone");
        zone.id = ObjectId(1);
        zone.body = Body {
            size: Vec2::splat(50.0),
            trigger: true,
            solid: false,
            gravity_scale: 0.0,
            layers: CollisionLayers::PICKUP,
            mask: CollisionLayers::PLAYER,
            ..Body::default()
        };
        let mut walker = solid(2, Vec2::new(-20.0, 10.0), Vec2::splat(10.0));
        walker.body.layers = CollisionLayers::PLAYER;
        walker.body.mask = CollisionLayers::PICKUP;
        walker.body.velocity = Vec2::new(60.0, 0.0);
        let mut objs = vec![zone, walker];

        let (mut entered, mut exited) = (0, 0);
        for _ in 0..120 {
            physics.update(&mut objs, 1.0 / 60.0, &mut cmds);
            entered += physics.stats().triggers_entered;
            exited += physics.stats().triggers_exited;
        }
        assert_eq!(entered, 1);
        assert_eq!(exited, 1);
        assert_eq!(objs[0].body.position, Vec2::ZERO);
        assert!((objs[1].body.velocity.x - 60.0).abs() < 1e-4);
        assert!((objs[1].body.position.x - 100.0).abs() < 0.01);
    }

    #[test]
    fn raycast_reports_slab_distance_and_misses() {
        let mut physics = Physics::new(PhysicsConfig {
            gravity: Vec2::ZERO,
            ..PhysicsConfig::default()
        });
        let mut cmds = Commands::new();
        let mut objs = vec![ground(1, Vec2::new(100.0, -10.0), Vec2::new(20.0, 20.0))];
        physics.update(&mut objs, 1.0 / 60.0, &mut cmds);

        let hits = physics.raycast(Vec2::ZERO, Vec2::X, 500.0, None);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 100.0).abs() < 1e-4);
        assert_eq!(hits[0].normal, Vec2::new(-1.0, 0.0));

        assert!(physics.raycast(Vec2::ZERO, -Vec2::X, 500.0, None).is_empty());
        assert!(physics.raycast(Vec2::ZERO, Vec2::ZERO, 500.0, None).is_empty());
        assert!(physics
            .raycast(Vec2::ZERO, Vec2::X, 500.0, Some(CollisionLayers::ENEMY))
            .is_empty());
    }

    #[test]
    fn raycast_sorts_nearest_first() {
        let mut physics = Physics::default();
        let mut cmds = Commands::new();
        let mut objs = vec![
            ground(1, Vec2::new(300.0, -5.0), Vec2::splat(10.0)),
            ground(2, Vec2::new(50.0, -5.0), Vec2::splat(10.0)),
        ];
        physics.update(&mut objs, 1.0 / 60.0, &mut cmds);
        let hits = physics.raycast(Vec2::ZERO, Vec2::X, 1000.0, None);
        let ids: Vec<u32> = hits.iter().map(|h| h.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(!physics.line_of_sight(Vec2::ZERO, Vec2::new(400.0, 0.0), CollisionLayers::SOLID));
        assert!(physics.line_of_sight(Vec2::ZERO, Vec2::new(40.0, 0.0), CollisionLayers::SOLID));
    }
}
