//! The player: movement with coyote time and jump buffering, ability-gated
//! moves, damage with invulnerability, death, lives and respawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::config::PlayerConfig;
use crate::api::services::{Axis, InputSource};
use crate::api::types::{EntityError, WorldEvent};
use crate::components::animation::{Animator, Clip};
use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::{Appearance, AtlasId};
use crate::core::math::Aabb;
use crate::entities::abilities::{AbilityKind, AbilitySet};
use crate::entities::projectile;
use crate::entities::{approach, sign_or_zero, DamageOutcome, EntityContext, ObjectBehavior};
use crate::physics::layers::{CollisionLayers, CollisionMatrix};
use crate::physics::narrowphase::Contact;
use crate::world::commands::Commands;

/// Action names the player reads from the input source.
pub mod actions {
    pub const JUMP: &str = "jump";
    pub const DASH: &str = "dash";
    pub const ATTACK: &str = "attack";
    pub const FIREBALL: &str = "fireball";
    pub const SHIELD: &str = "shield";
    pub const BOOST: &str = "boost";
    pub const GLIDE: &str = "glide";
    pub const DOWN: &str = "down";
}

const HURT_TIME: f32 = 0.3;
const STOMP_DAMAGE: f32 = 20.0;
/// Resting contact reports every sub-step; one stomp per bounce.
const STOMP_COOLDOWN: f32 = 0.15;
const DAMAGE_FLASH: [f32; 4] = [1.0, 0.3, 0.3, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Running,
    Jumping,
    Falling,
    WallSliding,
    Dashing,
    Gliding,
    Attacking,
    GroundPounding,
    Hurt,
    Dead,
}

impl PlayerState {
    /// Animation clip shown in this state.
    pub fn clip(self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Running => "run",
            PlayerState::Jumping => "jump",
            PlayerState::Falling => "fall",
            PlayerState::WallSliding => "wall_slide",
            PlayerState::Dashing => "dash",
            PlayerState::Gliding => "glide",
            PlayerState::Attacking => "attack",
            PlayerState::GroundPounding => "ground_pound",
            PlayerState::Hurt => "hurt",
            PlayerState::Dead => "dead",
        }
    }
}

/// Persistent part of the player, for save files and level changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub lives: u32,
    pub score: u32,
    pub abilities: AbilitySet,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub config: PlayerConfig,
    pub abilities: AbilitySet,
    pub state: PlayerState,
    /// -1 (left) or 1 (right).
    pub facing: f32,
    pub health: f32,
    pub max_health: f32,
    pub lives: u32,
    pub score: u32,
    pub grounded: bool,
    pub game_over: bool,
    coyote_timer: f32,
    jump_buffer_timer: f32,
    air_jumps_used: u32,
    invulnerable_timer: f32,
    flicker_timer: f32,
    hurt_timer: f32,
    dash_timer: f32,
    attack_timer: f32,
    shield_timer: f32,
    boost_timer: f32,
    wall_jump_lock: f32,
    stomp_timer: f32,
    respawn_timer: Option<f32>,
    ground_pounding: bool,
    gliding: bool,
    wall_sliding: bool,
    /// Gravity scale to restore when a dash or death ends.
    base_gravity: f32,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            health: config.max_health,
            max_health: config.max_health,
            lives: config.lives,
            config,
            abilities: AbilitySet::new(),
            state: PlayerState::Idle,
            facing: 1.0,
            score: 0,
            grounded: false,
            game_over: false,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            air_jumps_used: 0,
            invulnerable_timer: 0.0,
            flicker_timer: 0.0,
            hurt_timer: 0.0,
            dash_timer: 0.0,
            attack_timer: 0.0,
            shield_timer: 0.0,
            boost_timer: 0.0,
            wall_jump_lock: 0.0,
            stomp_timer: 0.0,
            respawn_timer: None,
            ground_pounding: false,
            gliding: false,
            wall_sliding: false,
            base_gravity: 1.0,
        }
    }

    /// Build the player object at `pos` (top-left).
    pub fn spawn(pos: Vec2, config: PlayerConfig) -> GameObject {
        let mut obj = GameObject::new("player")
            .with_tag("player")
            .with_layer(WorldLayer::Player)
            .with_pos(pos)
            .with_size(config.size)
            .with_appearance(Appearance::sprite(AtlasId(0), 0.0, 0.0))
            .with_animation(player_animations())
            .persistent();
        obj.body.layers = CollisionLayers::PLAYER;
        obj.body.mask = CollisionMatrix::default_platformer().mask_for(CollisionLayers::PLAYER);
        obj.body.friction = 0.2;
        obj.with_behavior(crate::entities::Behavior::Player(Box::new(Player::new(config))))
    }

    // -- Ability API --

    pub fn unlock_ability(&mut self, name: &str, level: u32) -> bool {
        self.abilities.unlock(name, level)
    }

    pub fn upgrade_ability(&mut self, name: &str) -> Option<u32> {
        self.abilities.upgrade(name)
    }

    pub fn has_ability(&self, name: &str) -> bool {
        self.abilities.has(name)
    }

    pub fn get_ability_level(&self, name: &str) -> u32 {
        self.abilities.level(name)
    }

    pub fn get_ability_cooldown(&self, name: &str) -> f32 {
        self.abilities.cooldown(name)
    }

    pub fn is_ability_ready(&self, name: &str) -> bool {
        self.abilities.is_ready(name)
    }

    // -- Status --

    pub fn is_dead(&self) -> bool {
        self.state == PlayerState::Dead
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    pub fn is_shielded(&self) -> bool {
        self.shield_timer > 0.0
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_timer > 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.is_dead() {
            self.health = (self.health + amount.max(0.0)).min(self.max_health);
        }
    }

    pub fn heal_full(&mut self) {
        self.heal(self.max_health);
    }

    pub fn add_life(&mut self) {
        self.lives += 1;
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    fn speed_multiplier(&self) -> f32 {
        if self.boost_timer > 0.0 {
            self.abilities.params(AbilityKind::SpeedBoost).map_or(1.0, |p| p.power)
        } else {
            1.0
        }
    }

    // -- Moves --

    /// Ground (or coyote) jump. Works without any ability.
    pub fn perform_jump(&mut self, obj: &mut GameObject, cmds: &mut Commands) -> bool {
        if !(self.grounded || self.coyote_timer > 0.0) {
            return false;
        }
        obj.body.velocity.y = -self.config.jump_speed;
        self.coyote_timer = 0.0;
        self.grounded = false;
        self.air_jumps_used = 0;
        cmds.play_sound("jump");
        true
    }

    /// Extra jump in the air; needs double or triple jump.
    pub fn perform_air_jump(&mut self, obj: &mut GameObject, cmds: &mut Commands) -> bool {
        let allowed = self.abilities.air_jumps();
        if allowed == 0 || self.air_jumps_used >= allowed || self.grounded {
            return false;
        }
        let kind = if self.abilities.has_kind(AbilityKind::TripleJump) {
            AbilityKind::TripleJump
        } else {
            AbilityKind::DoubleJump
        };
        let scale = self.abilities.params(kind).map_or(0.9, |p| p.power);
        obj.body.velocity.y = -self.config.jump_speed * scale;
        self.air_jumps_used += 1;
        self.ground_pounding = false;
        cmds.play_sound("double_jump");
        true
    }

    /// Kick off a wall at `wall_dir` (-1 left, 1 right); needs wall jump.
    pub fn perform_wall_jump(&mut self, obj: &mut GameObject, wall_dir: f32, cmds: &mut Commands) -> bool {
        if wall_dir == 0.0 || self.grounded || !self.abilities.is_ready_kind(AbilityKind::WallJump) {
            return false;
        }
        let push = self.abilities.params(AbilityKind::WallJump).map_or(1.1, |p| p.power);
        let lock = self.abilities.params(AbilityKind::WallJump).map_or(0.15, |p| p.duration);
        obj.body.velocity = Vec2::new(-wall_dir * self.config.move_speed * push, -self.config.jump_speed);
        self.facing = -wall_dir;
        self.wall_jump_lock = lock;
        self.air_jumps_used = 0;
        self.abilities.start_cooldown(AbilityKind::WallJump);
        cmds.play_sound("wall_jump");
        true
    }

    /// Burst along the facing direction with gravity suspended.
    pub fn perform_dash(&mut self, obj: &mut GameObject, cmds: &mut Commands) -> bool {
        if self.is_dashing() || !self.abilities.is_ready_kind(AbilityKind::Dash) {
            return false;
        }
        let Some(p) = self.abilities.params(AbilityKind::Dash) else {
            return false;
        };
        obj.body.velocity = Vec2::new(self.facing * p.power, 0.0);
        self.dash_timer = p.duration;
        if obj.body.gravity_scale != 0.0 {
            self.base_gravity = obj.body.gravity_scale;
        }
        obj.body.gravity_scale = 0.0;
        self.abilities.start_cooldown(AbilityKind::Dash);
        self.state = PlayerState::Dashing;
        cmds.play_sound("dash");
        true
    }

    fn end_dash(&mut self, obj: &mut GameObject) {
        self.dash_timer = 0.0;
        obj.body.gravity_scale = self.base_gravity;
        obj.body.velocity.x *= 0.5;
    }

    /// Melee hit on enemies in front of the player.
    pub fn perform_attack(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>) -> bool {
        if !self.abilities.is_ready_kind(AbilityKind::Attack) {
            return false;
        }
        let Some(p) = self.abilities.params(AbilityKind::Attack) else {
            return false;
        };
        let b = obj.bounds();
        let reach = if self.facing > 0.0 {
            Aabb::new(Vec2::new(b.max.x, b.min.y), Vec2::new(b.max.x + p.range, b.max.y))
        } else {
            Aabb::new(Vec2::new(b.min.x - p.range, b.min.y), Vec2::new(b.min.x, b.max.y))
        };
        let source = obj.center();
        for target in ctx.neighbors.overlapping(reach) {
            if target.body.layers.intersects(CollisionLayers::ENEMY) {
                ctx.commands.damage(target.id, p.power, source);
            }
        }
        self.attack_timer = p.duration;
        self.abilities.start_cooldown(AbilityKind::Attack);
        ctx.commands.play_sound("attack");
        true
    }

    /// Launch a fireball along the facing direction.
    pub fn shoot_fireball(&mut self, obj: &mut GameObject, cmds: &mut Commands) -> bool {
        if !self.abilities.is_ready_kind(AbilityKind::Fireball) {
            return false;
        }
        let Some(p) = self.abilities.params(AbilityKind::Fireball) else {
            return false;
        };
        let level = self.abilities.level(AbilityKind::Fireball.name());
        let muzzle = obj.center() + Vec2::new(self.facing * obj.body.size.x * 0.5, 0.0);
        cmds.spawn(projectile::fireball(obj.id, muzzle, Vec2::new(self.facing, 0.0), &p, level));
        self.abilities.start_cooldown(AbilityKind::Fireball);
        cmds.play_sound("fireball");
        true
    }

    pub fn activate_shield(&mut self, obj: &mut GameObject, cmds: &mut Commands) -> bool {
        if !self.abilities.is_ready_kind(AbilityKind::Shield) {
            return false;
        }
        let duration = self.abilities.params(AbilityKind::Shield).map_or(0.0, |p| p.duration);
        self.shield_timer = duration;
        self.abilities.start_cooldown(AbilityKind::Shield);
        obj.appearance.flash([0.5, 0.8, 1.0, 1.0], duration);
        cmds.play_sound("shield");
        true
    }

    pub fn activate_speed_boost(&mut self, cmds: &mut Commands) -> bool {
        if !self.abilities.is_ready_kind(AbilityKind::SpeedBoost) {
            return false;
        }
        self.boost_timer = self.abilities.params(AbilityKind::SpeedBoost).map_or(0.0, |p| p.duration);
        self.abilities.start_cooldown(AbilityKind::SpeedBoost);
        cmds.play_sound("speed_boost");
        true
    }

    pub fn start_ground_pound(&mut self, obj: &mut GameObject, cmds: &mut Commands) -> bool {
        if self.grounded || self.ground_pounding || !self.abilities.is_ready_kind(AbilityKind::GroundPound) {
            return false;
        }
        let speed = self.abilities.params(AbilityKind::GroundPound).map_or(700.0, |p| p.power);
        obj.body.velocity = Vec2::new(0.0, speed);
        self.ground_pounding = true;
        self.abilities.start_cooldown(AbilityKind::GroundPound);
        cmds.play_sound("ground_pound_start");
        true
    }

    fn land_ground_pound(&mut self, obj: &GameObject, cmds: &mut Commands) {
        self.ground_pounding = false;
        if let Some(p) = self.abilities.params(AbilityKind::GroundPound) {
            let b = obj.bounds();
            let impact = Vec2::new(b.center().x, b.max.y);
            cmds.explode(impact, p.range, p.damage, CollisionLayers::ENEMY, Some(obj.id));
        }
        cmds.shake_camera(6.0, 0.25);
        cmds.play_sound("ground_pound");
    }

    // -- Damage, death, respawn --

    /// Apply damage from `source`. Refused while invulnerable, shielded or dead.
    pub fn take_damage(&mut self, obj: &mut GameObject, amount: f32, source: Vec2, cmds: &mut Commands) -> DamageOutcome {
        if self.is_dead() || self.is_invulnerable() {
            return DamageOutcome::Blocked;
        }
        if self.is_shielded() {
            cmds.play_sound("shield_block");
            return DamageOutcome::Blocked;
        }

        self.health = (self.health - amount.max(0.0)).max(0.0);
        cmds.emit(WorldEvent::PlayerDamaged {
            amount,
            health: self.health,
        });
        cmds.play_sound("hurt");

        let away = sign_or_zero(obj.center().x - source.x);
        let away = if away == 0.0 { -self.facing } else { away };
        obj.body.velocity = Vec2::ZERO;
        obj.add_impulse(Vec2::new(away, -0.6) * self.config.knockback * obj.body.mass);
        if self.is_dashing() {
            self.end_dash(obj);
        }
        self.ground_pounding = false;
        self.invulnerable_timer = self.config.invulnerability;
        self.flicker_timer = 0.0;
        self.hurt_timer = HURT_TIME;
        obj.appearance.flash(DAMAGE_FLASH, 0.15);

        if self.health <= 0.0 {
            self.die(obj, cmds);
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Lose a life; respawn after a delay or end the game.
    pub fn die(&mut self, obj: &mut GameObject, cmds: &mut Commands) {
        if self.is_dead() {
            return;
        }
        self.health = 0.0;
        self.state = PlayerState::Dead;
        self.lives = self.lives.saturating_sub(1);
        if self.is_dashing() {
            self.end_dash(obj);
        }
        obj.body.velocity = Vec2::ZERO;
        obj.body.gravity_scale = 0.0;
        obj.play_animation(PlayerState::Dead.clip());
        cmds.emit(WorldEvent::PlayerDied { lives: self.lives });
        cmds.play_sound("death");
        log::info!("player died, {} lives left", self.lives);

        if self.lives > 0 {
            self.respawn_timer = Some(self.config.respawn_delay);
        } else {
            self.game_over = true;
            self.respawn_timer = None;
            cmds.emit(WorldEvent::GameOver);
            log::info!("game over");
        }
    }

    /// Back at `point` (top-left) with full health and a grace window.
    pub fn respawn(&mut self, obj: &mut GameObject, point: Vec2, cmds: &mut Commands) {
        self.health = self.max_health;
        self.state = PlayerState::Idle;
        self.respawn_timer = None;
        self.coyote_timer = 0.0;
        self.jump_buffer_timer = 0.0;
        self.air_jumps_used = 0;
        self.dash_timer = 0.0;
        self.ground_pounding = false;
        self.invulnerable_timer = self.config.invulnerability;
        obj.body.position = point;
        obj.body.velocity = Vec2::ZERO;
        obj.body.gravity_scale = self.base_gravity;
        obj.visible = true;
        cmds.emit(WorldEvent::PlayerRespawned { position: point });
        log::info!("player respawned at ({:.0}, {:.0})", point.x, point.y);
    }

    // -- Persistence --

    pub fn snapshot(&self, obj: &GameObject) -> PlayerSnapshot {
        PlayerSnapshot {
            position: obj.body.position,
            health: self.health,
            max_health: self.max_health,
            lives: self.lives,
            score: self.score,
            abilities: self.abilities.clone(),
        }
    }

    pub fn restore(&mut self, obj: &mut GameObject, snap: &PlayerSnapshot) {
        obj.body.position = snap.position;
        obj.body.velocity = Vec2::ZERO;
        self.max_health = snap.max_health;
        self.health = snap.health.min(snap.max_health);
        self.lives = snap.lives;
        self.score = snap.score;
        self.abilities = snap.abilities.clone();
        self.game_over = false;
        if self.is_dead() && self.health > 0.0 {
            self.state = PlayerState::Idle;
            self.respawn_timer = None;
            obj.body.gravity_scale = self.base_gravity;
        }
    }

    // -- Per-frame pieces --

    fn tick_timers(&mut self, obj: &mut GameObject, dt: f32) {
        self.abilities.tick(dt);
        self.hurt_timer = (self.hurt_timer - dt).max(0.0);
        self.attack_timer = (self.attack_timer - dt).max(0.0);
        self.shield_timer = (self.shield_timer - dt).max(0.0);
        self.boost_timer = (self.boost_timer - dt).max(0.0);
        self.wall_jump_lock = (self.wall_jump_lock - dt).max(0.0);
        self.stomp_timer = (self.stomp_timer - dt).max(0.0);

        if self.invulnerable_timer > 0.0 {
            self.invulnerable_timer = (self.invulnerable_timer - dt).max(0.0);
            self.flicker_timer += dt;
            obj.visible = self.invulnerable_timer <= 0.0
                || ((self.flicker_timer * self.config.flicker_rate) as u32) % 2 == 0;
        } else {
            obj.visible = true;
        }

        if self.dash_timer > 0.0 {
            self.dash_timer -= dt;
            if self.dash_timer <= 0.0 {
                self.end_dash(obj);
            }
        }
    }

    fn steer(&mut self, obj: &mut GameObject, input: &dyn InputSource, dt: f32) {
        if self.is_dashing() || self.ground_pounding {
            return;
        }
        let axis = input.movement_axis(Axis::Horizontal).clamp(-1.0, 1.0);
        if axis != 0.0 {
            self.facing = sign_or_zero(axis);
        }
        if self.wall_jump_lock > 0.0 {
            return;
        }
        let target = axis * self.config.move_speed * self.speed_multiplier();
        let accel = if self.grounded { self.config.ground_accel } else { self.config.air_accel };
        obj.body.velocity.x = approach(obj.body.velocity.x, target, accel * dt);
    }

    fn handle_jump(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>, wall_dir: f32) {
        let input = ctx.input;
        if input.is_action_pressed(actions::JUMP) {
            self.jump_buffer_timer = self.config.jump_buffer;
        } else {
            self.jump_buffer_timer = (self.jump_buffer_timer - ctx.dt).max(0.0);
        }

        if self.jump_buffer_timer > 0.0 {
            let fresh_press = input.is_action_pressed(actions::JUMP);
            let jumped = self.perform_jump(obj, ctx.commands)
                // Air moves need a fresh press; only ground jumps are buffered.
                || (fresh_press && self.perform_wall_jump(obj, wall_dir, ctx.commands))
                || (fresh_press && self.perform_air_jump(obj, ctx.commands));
            if jumped {
                self.jump_buffer_timer = 0.0;
            }
        }

        // Variable height: releasing early cuts the rise.
        if input.is_action_up(actions::JUMP) && obj.body.velocity.y < 0.0 && !self.is_dashing() {
            obj.body.velocity.y *= 0.5;
        }
    }

    fn wall_direction(&self, obj: &GameObject, ctx: &EntityContext<'_>) -> f32 {
        if self.grounded {
            return 0.0;
        }
        if ctx.physics.is_touching_wall(obj, 1.0) {
            1.0
        } else if ctx.physics.is_touching_wall(obj, -1.0) {
            -1.0
        } else {
            0.0
        }
    }

    fn apply_air_control(&mut self, obj: &mut GameObject, input: &dyn InputSource, wall_dir: f32) {
        self.wall_sliding = false;
        self.gliding = false;
        if self.grounded || self.is_dashing() || self.ground_pounding {
            return;
        }
        let pushing = sign_or_zero(input.movement_axis(Axis::Horizontal));
        if wall_dir != 0.0
            && pushing == wall_dir
            && obj.body.velocity.y > 0.0
            && self.abilities.has_kind(AbilityKind::WallSlide)
        {
            obj.body.velocity.y = obj.body.velocity.y.min(self.config.wall_slide_speed);
            self.wall_sliding = true;
            return;
        }
        if input.is_action_down(actions::GLIDE) && obj.body.velocity.y > 0.0 {
            if let Some(p) = self.abilities.params(AbilityKind::Glide) {
                let cap = self.config.glide_fall_speed * p.power;
                obj.body.velocity.y = obj.body.velocity.y.min(cap);
                self.gliding = true;
            }
        }
    }

    fn update_state(&mut self, obj: &GameObject) {
        let v = obj.body.velocity;
        self.state = if self.is_dashing() {
            PlayerState::Dashing
        } else if self.ground_pounding {
            PlayerState::GroundPounding
        } else if self.hurt_timer > 0.0 {
            PlayerState::Hurt
        } else if self.attack_timer > 0.0 {
            PlayerState::Attacking
        } else if self.grounded {
            if v.x.abs() > 10.0 {
                PlayerState::Running
            } else {
                PlayerState::Idle
            }
        } else if self.wall_sliding {
            PlayerState::WallSliding
        } else if self.gliding {
            PlayerState::Gliding
        } else if v.y < 0.0 {
            PlayerState::Jumping
        } else {
            PlayerState::Falling
        };
    }
}

impl ObjectBehavior for Player {
    fn update(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        let dt = ctx.dt;
        self.tick_timers(obj, dt);

        if self.is_dead() {
            if let Some(t) = self.respawn_timer.as_mut() {
                *t -= dt;
                if *t <= 0.0 {
                    self.respawn(obj, ctx.level.respawn_point, ctx.commands);
                }
            }
            return Ok(());
        }

        if obj.bounds().min.y > ctx.level.bounds.max.y + self.config.fall_death_margin {
            self.die(obj, ctx.commands);
            return Ok(());
        }

        let was_pounding = self.ground_pounding;
        self.grounded = obj.body.velocity.y >= -1.0 && ctx.physics.is_grounded(obj);
        if self.grounded {
            self.coyote_timer = self.config.coyote_time;
            self.air_jumps_used = 0;
            if was_pounding {
                self.land_ground_pound(obj, ctx.commands);
            }
        } else {
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }

        let input = ctx.input;
        self.steer(obj, input, dt);
        let wall_dir = self.wall_direction(obj, ctx);
        self.handle_jump(obj, ctx, wall_dir);

        if input.is_action_pressed(actions::DASH) {
            self.perform_dash(obj, ctx.commands);
        }
        if input.is_action_pressed(actions::ATTACK) {
            self.perform_attack(obj, ctx);
        }
        if input.is_action_pressed(actions::FIREBALL) {
            self.shoot_fireball(obj, ctx.commands);
        }
        if input.is_action_pressed(actions::SHIELD) {
            self.activate_shield(obj, ctx.commands);
        }
        if input.is_action_pressed(actions::BOOST) {
            self.activate_speed_boost(ctx.commands);
        }
        if input.is_action_pressed(actions::DOWN) {
            self.start_ground_pound(obj, ctx.commands);
        }
        self.apply_air_control(obj, input, wall_dir);

        self.update_state(obj);
        obj.play_animation(self.state.clip());
        obj.appearance.flip_x = self.facing < 0.0;

        if !obj.body.position.is_finite() || !obj.body.velocity.is_finite() {
            return Err(EntityError::NonFinite(obj.id));
        }
        Ok(())
    }

    fn on_collision(&mut self, obj: &mut GameObject, other: &mut GameObject, contact: &Contact, cmds: &mut Commands) {
        // Landing on an enemy's head stomps it.
        let stomp = contact.normal.y > 0.5
            && other.body.layers.intersects(CollisionLayers::ENEMY)
            && self.stomp_timer <= 0.0
            && !self.is_dead();
        if stomp {
            self.stomp_timer = STOMP_COOLDOWN;
            cmds.damage(other.id, STOMP_DAMAGE, obj.center());
            obj.body.velocity.y = -self.config.jump_speed * 0.6;
            cmds.play_sound("stomp");
        }
    }

    fn on_damage(&mut self, obj: &mut GameObject, amount: f32, source: Vec2, cmds: &mut Commands) -> DamageOutcome {
        self.take_damage(obj, amount, source, cmds)
    }
}

fn player_animations() -> Animator {
    Animator::new("idle", Clip::strip(0.0, 0.0, 4, 6.0))
        .with("run", Clip::strip(1.0, 0.0, 6, 12.0))
        .with("jump", Clip::strip(2.0, 0.0, 1, 1.0))
        .with("fall", Clip::strip(2.0, 1.0, 1, 1.0))
        .with("wall_slide", Clip::strip(2.0, 2.0, 1, 1.0))
        .with("dash", Clip::strip(3.0, 0.0, 2, 20.0))
        .with("glide", Clip::strip(3.0, 2.0, 2, 8.0))
        .with("attack", Clip::strip(4.0, 0.0, 3, 12.0).once())
        .with("ground_pound", Clip::strip(4.0, 3.0, 1, 1.0))
        .with("hurt", Clip::strip(5.0, 0.0, 2, 10.0))
        .with("dead", Clip::strip(5.0, 2.0, 3, 8.0).once())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ObjectId;
    use crate::entities::test_support::{null_input, with_ctx};
    use crate::input::actions::ActionState;
    use crate::physics::Physics;

    fn player_obj() -> (GameObject, Player) {
        let mut obj = Player::spawn(Vec2::new(100.0, 100.0), PlayerConfig::default());
        obj.id = ObjectId(1);
        let crate::entities::Behavior::Player(p) = std::mem::take(&mut obj.behavior) else {
            unreachable!("spawn always builds a player");
        };
        (obj, *p)
    }

    #[test]
    fn locked_abilities_do_nothing() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        obj.body.velocity = Vec2::new(12.0, 34.0);
        assert!(!player.perform_dash(&mut obj, &mut cmds));
        assert!(!player.perform_air_jump(&mut obj, &mut cmds));
        assert!(!player.perform_wall_jump(&mut obj, 1.0, &mut cmds));
        assert!(!player.activate_shield(&mut obj, &mut cmds));
        assert_eq!(obj.body.velocity, Vec2::new(12.0, 34.0));
        assert_eq!(player.state, PlayerState::Idle);
        assert!(cmds.is_empty());
    }

    #[test]
    fn dash_sets_velocity_and_cooldown() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        player.facing = -1.0;
        assert!(player.unlock_ability("dash", 1));
        assert!(player.perform_dash(&mut obj, &mut cmds));
        let speed = AbilityKind::Dash.params(1).power;
        assert_eq!(obj.body.velocity, Vec2::new(-speed, 0.0));
        assert_eq!(obj.body.gravity_scale, 0.0);
        assert!(player.get_ability_cooldown("dash") > 0.0);
        assert!(!player.is_ability_ready("dash"));
        assert!(!player.perform_dash(&mut obj, &mut cmds), "still cooling down");
    }

    #[test]
    fn dash_restores_gravity_when_it_ends() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        player.unlock_ability("dash", 1);
        player.perform_dash(&mut obj, &mut cmds);
        player.tick_timers(&mut obj, 1.0);
        assert!(!player.is_dashing());
        assert_eq!(obj.body.gravity_scale, 1.0);
    }

    #[test]
    fn damage_during_invulnerability_is_blocked() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        let out = player.take_damage(&mut obj, 10.0, Vec2::new(0.0, 116.0), &mut cmds);
        assert_eq!(out, DamageOutcome::Damaged);
        assert_eq!(player.health, 90.0);
        assert!(obj.body.velocity.x > 0.0, "knocked away from the source");

        let out = player.take_damage(&mut obj, 10.0, Vec2::ZERO, &mut cmds);
        assert_eq!(out, DamageOutcome::Blocked);
        assert_eq!(player.health, 90.0);
    }

    #[test]
    fn shield_blocks_damage() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        player.unlock_ability("shield", 1);
        assert!(player.activate_shield(&mut obj, &mut cmds));
        assert_eq!(player.take_damage(&mut obj, 50.0, Vec2::ZERO, &mut cmds), DamageOutcome::Blocked);
        assert_eq!(player.health, player.max_health);
    }

    #[test]
    fn lethal_damage_costs_a_life_then_respawns() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        assert_eq!(player.take_damage(&mut obj, 500.0, Vec2::ZERO, &mut cmds), DamageOutcome::Killed);
        assert!(player.is_dead());
        assert_eq!(player.lives, 2);
        assert!(cmds.iter().any(|c| matches!(
            c,
            crate::world::commands::Command::Emit(WorldEvent::PlayerDied { lives: 2 })
        )));

        let physics = Physics::default();
        let input = null_input();
        let (_, cmds) = with_ctx(&physics, &input, &[], 2.0, |ctx| player.update(&mut obj, ctx));
        assert!(!player.is_dead());
        assert_eq!(player.health, player.max_health);
        assert_eq!(obj.body.position, Vec2::new(10.0, 10.0));
        assert!(cmds.iter().any(|c| matches!(
            c,
            crate::world::commands::Command::Emit(WorldEvent::PlayerRespawned { .. })
        )));
    }

    #[test]
    fn last_life_is_game_over() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        player.lives = 1;
        player.die(&mut obj, &mut cmds);
        assert!(player.game_over);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, crate::world::commands::Command::Emit(WorldEvent::GameOver))));
    }

    #[test]
    fn coyote_time_allows_late_jump() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        player.coyote_timer = 0.05;
        player.grounded = false;
        assert!(player.perform_jump(&mut obj, &mut cmds));
        assert_eq!(obj.body.velocity.y, -player.config.jump_speed);
        assert!(!player.perform_jump(&mut obj, &mut cmds), "coyote window is spent");
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let (mut obj, mut player) = player_obj();
        let dt = 1.0 / 60.0;
        let mut physics = Physics::default();
        let mut input = ActionState::new();
        input.set_action(actions::JUMP, true);

        // Airborne: the press is remembered, not used.
        let _ = with_ctx(&physics, &input, &[], dt, |ctx| player.update(&mut obj, ctx));
        assert_eq!(obj.body.velocity.y, 0.0);
        assert!(player.jump_buffer_timer > 0.0);

        // Next frame the player is standing on ground; no new press.
        let mut ground = GameObject::new("ground")
            .with_tag("static")
            .with_pos(Vec2::new(0.0, 132.0))
            .with_size(Vec2::new(400.0, 32.0));
        ground.id = ObjectId(2);
        ground.body.layers = CollisionLayers::SOLID;
        let mut world = vec![ground];
        physics.update(&mut world, dt, &mut Commands::new());
        input.end_frame();

        let _ = with_ctx(&physics, &input, &[], dt, |ctx| player.update(&mut obj, ctx));
        assert_eq!(obj.body.velocity.y, -player.config.jump_speed);
        assert_eq!(player.jump_buffer_timer, 0.0);
    }

    #[test]
    fn stale_buffer_does_not_jump() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        player.jump_buffer_timer = 0.0;
        player.coyote_timer = 0.0;
        assert!(!player.perform_jump(&mut obj, &mut cmds));
    }

    #[test]
    fn double_jump_once_in_air() {
        let (mut obj, mut player) = player_obj();
        let mut cmds = Commands::new();
        player.unlock_ability("double_jump", 1);
        player.grounded = false;
        assert!(player.perform_air_jump(&mut obj, &mut cmds));
        assert!(!player.perform_air_jump(&mut obj, &mut cmds));
    }

    #[test]
    fn snapshot_round_trip() {
        let (obj, mut player) = player_obj();
        player.unlock_ability("glide", 2);
        player.add_score(250);
        let snap = player.snapshot(&obj);

        let (mut obj2, mut fresh) = player_obj();
        fresh.restore(&mut obj2, &snap);
        assert_eq!(fresh.score, 250);
        assert_eq!(fresh.get_ability_level("glide"), 2);
        assert_eq!(obj2.body.position, obj.body.position);
    }
}
