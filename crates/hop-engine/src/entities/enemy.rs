//! Enemy AI: patrol, chase, attack, investigate, stunned.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{EntityError, WorldEvent};
use crate::components::animation::{Animator, Clip};
use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::{Appearance, AtlasId};
use crate::core::rng::Rng;
use crate::entities::powerup::{PowerUp, PowerUpKind};
use crate::entities::projectile;
use crate::entities::{other_is_on_top, sign_or_zero, Behavior, DamageOutcome, EntityContext, ObjectBehavior};
use crate::physics::layers::{CollisionLayers, CollisionMatrix};
use crate::physics::narrowphase::Contact;
use crate::world::commands::Commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Basic,
    Flying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyState {
    #[default]
    Patrol,
    Chase,
    Attack,
    Investigate,
    Stunned,
}

impl EnemyState {
    pub fn clip(self) -> &'static str {
        match self {
            EnemyState::Patrol | EnemyState::Investigate => "walk",
            EnemyState::Chase => "run",
            EnemyState::Attack => "attack",
            EnemyState::Stunned => "hurt",
        }
    }
}

/// Enemy tuning. Level spawn properties deserialize into this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnemyConfig {
    pub size: Vec2,
    pub speed: f32,
    pub chase_speed: f32,
    /// Distance from the start position at which patrol turns around.
    pub patrol_distance: f32,
    /// Seconds of patrol in one direction before turning around anyway.
    pub patrol_timeout: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub attack_damage: f32,
    pub contact_damage: f32,
    pub health: f32,
    pub score: u32,
    pub drop_chance: f32,
    pub stun_time: f32,
    pub knockback: f32,
    pub investigate_timeout: f32,
    /// Vertical bob amplitude for flying enemies.
    pub bob_amplitude: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(28.0, 28.0),
            speed: 60.0,
            chase_speed: 110.0,
            patrol_distance: 100.0,
            patrol_timeout: 4.0,
            detection_range: 200.0,
            attack_range: 40.0,
            attack_cooldown: 1.5,
            attack_damage: 20.0,
            contact_damage: 10.0,
            health: 30.0,
            score: 100,
            drop_chance: 0.3,
            stun_time: 0.4,
            knockback: 180.0,
            investigate_timeout: 3.0,
            bob_amplitude: 12.0,
        }
    }
}

impl EnemyConfig {
    pub fn flying() -> Self {
        Self {
            attack_range: 180.0,
            health: 20.0,
            score: 150,
            ..Self::default()
        }
    }
}

const ARRIVE_DISTANCE: f32 = 8.0;
const LEDGE_PROBE: f32 = 8.0;
const SHOT_DAMAGE: f32 = 10.0;
const DROP_HEAL: f32 = 25.0;

#[derive(Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub config: EnemyConfig,
    pub state: EnemyState,
    pub health: f32,
    /// -1 or 1.
    pub direction: f32,
    start: Option<Vec2>,
    state_timer: f32,
    attack_timer: f32,
    last_seen: Option<Vec2>,
    bob_time: f32,
    rng: Rng,
}

impl Enemy {
    pub fn new(kind: EnemyKind, config: EnemyConfig, seed: u64) -> Self {
        Self {
            kind,
            health: config.health,
            config,
            state: EnemyState::Patrol,
            direction: 1.0,
            start: None,
            state_timer: 0.0,
            attack_timer: 0.0,
            last_seen: None,
            bob_time: 0.0,
            rng: Rng::new(seed),
        }
    }

    /// Build an enemy object at `pos` (top-left).
    pub fn spawn(pos: Vec2, kind: EnemyKind, config: EnemyConfig, seed: u64) -> GameObject {
        let row = match kind {
            EnemyKind::Basic => 0.0,
            EnemyKind::Flying => 2.0,
        };
        let anims = Animator::new("walk", Clip::strip(row, 0.0, 4, 8.0))
            .with("run", Clip::strip(row, 4.0, 4, 12.0))
            .with("attack", Clip::strip(row + 1.0, 0.0, 3, 10.0).once())
            .with("hurt", Clip::strip(row + 1.0, 3.0, 1, 1.0));
        let mut obj = GameObject::new(match kind {
            EnemyKind::Basic => "enemy",
            EnemyKind::Flying => "flying_enemy",
        })
        .with_tag("enemy")
        .with_layer(WorldLayer::Entities)
        .with_pos(pos)
        .with_size(config.size)
        .with_appearance(Appearance::sprite(AtlasId(1), 0.0, row))
        .with_animation(anims);
        obj.body.layers = CollisionLayers::ENEMY;
        obj.body.mask = CollisionMatrix::default_platformer().mask_for(CollisionLayers::ENEMY);
        if kind == EnemyKind::Flying {
            obj.body.gravity_scale = 0.0;
        }
        obj.with_behavior(Behavior::Enemy(Box::new(Enemy::new(kind, config, seed))))
    }

    pub fn start_position(&self) -> Option<Vec2> {
        self.start
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    fn enter(&mut self, state: EnemyState) {
        if self.state != state {
            self.state = state;
            self.state_timer = 0.0;
        }
    }

    fn turn_around(&mut self) {
        self.direction = -self.direction;
        self.state_timer = 0.0;
    }

    /// Player center if it is within detection range and in plain sight.
    fn visible_player(&self, obj: &GameObject, ctx: &EntityContext<'_>) -> Option<Vec2> {
        let player = ctx.neighbors.player()?;
        if player.behavior.as_player().is_some_and(|p| p.is_dead()) {
            return None;
        }
        let (from, to) = (obj.center(), player.center());
        if from.distance(to) > self.config.detection_range {
            return None;
        }
        ctx.physics
            .line_of_sight(from, to, CollisionLayers::SOLID)
            .then_some(to)
    }

    /// No ground ahead of a walking enemy.
    fn at_ledge(&self, obj: &GameObject, ctx: &EntityContext<'_>) -> bool {
        if self.kind == EnemyKind::Flying || !ctx.physics.is_grounded(obj) {
            return false;
        }
        let b = obj.bounds();
        let x = if self.direction > 0.0 { b.max.x + 1.0 } else { b.min.x - 1.0 };
        ctx.physics
            .raycast_first(
                Vec2::new(x, b.max.y - 1.0),
                Vec2::Y,
                LEDGE_PROBE,
                Some(CollisionLayers::SOLID | CollisionLayers::PLATFORM),
            )
            .is_none()
    }

    fn blocked_ahead(&self, obj: &GameObject, ctx: &EntityContext<'_>) -> bool {
        ctx.physics.is_touching_wall(obj, self.direction) || self.at_ledge(obj, ctx)
    }

    fn patrol(&mut self, obj: &mut GameObject, ctx: &EntityContext<'_>, start: Vec2) {
        let offset = obj.body.position.x - start.x;
        let past_edge = offset * self.direction >= self.config.patrol_distance;
        if past_edge || self.state_timer >= self.config.patrol_timeout || self.blocked_ahead(obj, ctx) {
            self.turn_around();
        }
        obj.body.velocity.x = self.direction * self.config.speed;
    }

    fn chase(&mut self, obj: &mut GameObject, ctx: &EntityContext<'_>, target: Vec2) {
        let dx = target.x - obj.center().x;
        let dir = sign_or_zero(dx);
        if dir != 0.0 {
            self.direction = dir;
        }
        let stop = dx.abs() < 2.0 || (self.kind == EnemyKind::Basic && self.at_ledge(obj, ctx));
        obj.body.velocity.x = if stop { 0.0 } else { self.direction * self.config.chase_speed };
        if self.kind == EnemyKind::Flying {
            let hover = target.y - obj.body.size.y * 2.0;
            obj.body.velocity.y = sign_or_zero(hover - obj.center().y) * self.config.speed * 0.5;
        }
    }

    fn attack(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>, target: Vec2) {
        obj.body.velocity.x = 0.0;
        if self.attack_timer > 0.0 {
            return;
        }
        self.attack_timer = self.config.attack_cooldown;
        let from = obj.center();
        match self.kind {
            EnemyKind::Basic => {
                if let Some(player) = ctx.neighbors.player() {
                    ctx.commands.damage(player.id, self.config.attack_damage, from);
                }
                ctx.commands.play_sound("enemy_attack");
            }
            EnemyKind::Flying => {
                let aim = (target - from).normalize_or_zero();
                if aim != Vec2::ZERO {
                    ctx.commands.spawn(projectile::enemy_shot(obj.id, from, aim, SHOT_DAMAGE));
                    ctx.commands.play_sound("enemy_shoot");
                }
            }
        }
        obj.play_animation(EnemyState::Attack.clip());
    }

    fn investigate(&mut self, obj: &mut GameObject, ctx: &EntityContext<'_>) {
        let Some(spot) = self.last_seen else {
            self.enter(EnemyState::Patrol);
            return;
        };
        let dx = spot.x - obj.center().x;
        let arrived = dx.abs() <= ARRIVE_DISTANCE;
        if arrived || self.state_timer >= self.config.investigate_timeout || self.blocked_ahead(obj, ctx) {
            self.last_seen = None;
            obj.body.velocity.x = 0.0;
            self.enter(EnemyState::Patrol);
            return;
        }
        self.direction = sign_or_zero(dx);
        obj.body.velocity.x = self.direction * self.config.speed;
    }

    /// Flying enemies hover around their start height.
    fn bob(&mut self, obj: &mut GameObject, start: Vec2, dt: f32) {
        self.bob_time += dt;
        let target = start.y + (self.bob_time * 2.0).sin() * self.config.bob_amplitude;
        if dt > 0.0 {
            obj.body.velocity.y = (target - obj.body.position.y) / dt;
        }
    }

    fn die(&mut self, obj: &mut GameObject, cmds: &mut Commands) {
        cmds.emit(WorldEvent::EnemyKilled {
            id: obj.id,
            score: self.config.score,
        });
        cmds.play_sound("enemy_death");
        if self.rng.chance(self.config.drop_chance) {
            let pos = obj.center() - Vec2::splat(8.0);
            cmds.spawn(PowerUp::spawn(pos, PowerUpKind::Health(DROP_HEAL), None));
        }
        obj.destroy();
    }
}

impl ObjectBehavior for Enemy {
    fn update(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        let dt = ctx.dt;
        let start = *self.start.get_or_insert(obj.body.position);
        self.state_timer += dt;
        self.attack_timer = (self.attack_timer - dt).max(0.0);

        if self.state == EnemyState::Stunned {
            obj.body.velocity.x *= 0.9;
            if self.state_timer >= self.config.stun_time {
                self.enter(if self.last_seen.is_some() {
                    EnemyState::Investigate
                } else {
                    EnemyState::Patrol
                });
            }
            obj.play_animation(EnemyState::Stunned.clip());
            return Ok(());
        }

        let seen = self.visible_player(obj, ctx);
        if let Some(target) = seen {
            self.last_seen = Some(target);
            let in_range = obj.center().distance(target) <= self.config.attack_range;
            self.enter(if in_range { EnemyState::Attack } else { EnemyState::Chase });
        } else if matches!(self.state, EnemyState::Chase | EnemyState::Attack) {
            self.enter(EnemyState::Investigate);
        }

        match (self.state, seen) {
            (EnemyState::Attack, Some(target)) => self.attack(obj, ctx, target),
            (EnemyState::Chase, Some(target)) => self.chase(obj, ctx, target),
            (EnemyState::Investigate, _) => self.investigate(obj, ctx),
            _ => self.patrol(obj, ctx, start),
        }

        if self.kind == EnemyKind::Flying && self.state == EnemyState::Patrol {
            self.bob(obj, start, dt);
        }
        if self.state != EnemyState::Attack {
            obj.play_animation(self.state.clip());
        }
        obj.appearance.flip_x = self.direction < 0.0;

        if !obj.body.position.is_finite() {
            return Err(EntityError::NonFinite(obj.id));
        }
        Ok(())
    }

    fn on_collision(&mut self, obj: &mut GameObject, other: &mut GameObject, contact: &Contact, cmds: &mut Commands) {
        if other.behavior.as_player().is_none() || self.is_dead() {
            return;
        }
        // A player landing on top is a stomp, handled from the player's side.
        if other_is_on_top(contact) {
            return;
        }
        cmds.damage(other.id, self.config.contact_damage, obj.center());
    }

    fn on_damage(&mut self, obj: &mut GameObject, amount: f32, source: Vec2, cmds: &mut Commands) -> DamageOutcome {
        if self.is_dead() || !obj.is_alive() {
            return DamageOutcome::Blocked;
        }
        self.health -= amount.max(0.0);
        obj.appearance.flash([1.0, 1.0, 1.0, 1.0], 0.1);
        if self.health <= 0.0 {
            self.die(obj, cmds);
            return DamageOutcome::Killed;
        }
        let away = sign_or_zero(obj.center().x - source.x);
        obj.body.velocity = Vec2::ZERO;
        obj.add_impulse(Vec2::new(away, -0.5) * self.config.knockback * obj.body.mass);
        self.enter(EnemyState::Stunned);
        self.state_timer = 0.0;
        cmds.play_sound("enemy_hurt");
        DamageOutcome::Damaged
    }
}
