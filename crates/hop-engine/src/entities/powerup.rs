use glam::Vec2;

use crate::api::types::{EntityError, WorldEvent};
use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::Appearance;
use crate::entities::{Behavior, EntityContext, ObjectBehavior};
use crate::physics::layers::CollisionLayers;
use crate::physics::narrowphase::Contact;
use crate::world::commands::Commands;

const BOB_HEIGHT: f32 = 4.0;
const BOB_SPEED: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PowerUpKind {
    /// Unlock an ability, or raise its level if already unlocked.
    Ability { name: String, level: u32 },
    Health(f32),
    ExtraLife,
    Coin(u32),
}

impl PowerUpKind {
    pub fn name(&self) -> &'static str {
        match self {
            PowerUpKind::Ability { .. } => "ability",
            PowerUpKind::Health(_) => "health",
            PowerUpKind::ExtraLife => "extra_life",
            PowerUpKind::Coin(_) => "coin",
        }
    }

    fn color(&self) -> [f32; 4] {
        match self {
            PowerUpKind::Ability { .. } => [0.4, 0.6, 1.0, 1.0],
            PowerUpKind::Health(_) => [1.0, 0.3, 0.4, 1.0],
            PowerUpKind::ExtraLife => [0.3, 1.0, 0.4, 1.0],
            PowerUpKind::Coin(_) => [1.0, 0.85, 0.2, 1.0],
        }
    }
}

/// Pickup that applies its effect to the player on touch.
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    /// Level-wide id recorded once collected, so reloads skip it.
    pub collectible_id: Option<String>,
    base_y: Option<f32>,
    bob_time: f32,
    collected: bool,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, collectible_id: Option<String>) -> Self {
        Self {
            kind,
            collectible_id,
            base_y: None,
            bob_time: 0.0,
            collected: false,
        }
    }

    pub fn spawn(pos: Vec2, kind: PowerUpKind, collectible_id: Option<String>) -> GameObject {
        let mut obj = GameObject::new(kind.name())
            .with_tag("powerup")
            .with_layer(WorldLayer::Entities)
            .with_pos(pos)
            .with_size(Vec2::new(16.0, 16.0))
            .with_appearance(Appearance::color(kind.color()));
        obj.body.kinematic = true;
        obj.body.gravity_scale = 0.0;
        obj.body.solid = false;
        obj.body.trigger = true;
        obj.body.layers = CollisionLayers::PICKUP;
        obj.body.mask = CollisionLayers::PLAYER;
        obj.with_behavior(Behavior::PowerUp(PowerUp::new(kind, collectible_id)))
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }
}

impl ObjectBehavior for PowerUp {
    fn update(&mut self, obj: &mut GameObject, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        let base = *self.base_y.get_or_insert(obj.body.position.y);
        self.bob_time += ctx.dt;
        obj.body.position.y = base + (self.bob_time * BOB_SPEED).sin() * BOB_HEIGHT;
        Ok(())
    }

    fn on_trigger_enter(&mut self, obj: &mut GameObject, other: &mut GameObject, _contact: &Contact, cmds: &mut Commands) {
        if self.collected {
            return;
        }
        let Some(player) = other.behavior.as_player_mut() else {
            return;
        };
        if player.is_dead() {
            return;
        }

        let sound = match &self.kind {
            PowerUpKind::Ability { name, level } => {
                let reached = if player.has_ability(name) {
                    player.upgrade_ability(name)
                } else if player.unlock_ability(name, *level) {
                    Some(player.get_ability_level(name))
                } else {
                    None
                };
                match reached {
                    Some(level) => cmds.emit(WorldEvent::AbilityUnlocked {
                        name: name.clone(),
                        level,
                    }),
                    None => log::debug!("power-up for ability '{name}' had no effect"),
                }
                "ability"
            }
            PowerUpKind::Health(amount) => {
                player.heal(*amount);
                "heal"
            }
            PowerUpKind::ExtraLife => {
                player.add_life();
                "extra_life"
            }
            PowerUpKind::Coin(value) => {
                player.add_score(*value);
                "coin"
            }
        };

        self.collected = true;
        cmds.emit(WorldEvent::ItemCollected {
            collectible_id: self.collectible_id.clone(),
            kind: self.kind.name().to_string(),
        });
        if let Some(id) = &self.collectible_id {
            cmds.collect(id.clone());
        }
        cmds.play_sound(sound);
        obj.destroy();
    }
}
