use glam::Vec2;

use crate::components::layer::WorldLayer;
use crate::components::object::GameObject;
use crate::components::sprite::Appearance;
use crate::entities::{Behavior, ObjectBehavior};
use crate::physics::layers::CollisionLayers;
use crate::physics::narrowphase::Contact;
use crate::world::commands::Commands;

const INACTIVE_COLOR: [f32; 4] = [0.55, 0.55, 0.6, 1.0];
const ACTIVE_COLOR: [f32; 4] = [0.2, 0.9, 0.35, 1.0];

/// Respawn marker. The first touch by the player activates it.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub id: String,
    pub activated: bool,
}

impl Checkpoint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            activated: false,
        }
    }

    pub fn spawn(pos: Vec2, id: impl Into<String>) -> GameObject {
        let mut obj = GameObject::new("checkpoint")
            .with_tag("checkpoint")
            .with_layer(WorldLayer::Entities)
            .with_pos(pos)
            .with_size(Vec2::new(24.0, 48.0))
            .with_appearance(Appearance::color(INACTIVE_COLOR));
        obj.body.kinematic = true;
        obj.body.gravity_scale = 0.0;
        obj.body.solid = false;
        obj.body.trigger = true;
        obj.body.layers = CollisionLayers::PICKUP;
        obj.body.mask = CollisionLayers::PLAYER;
        obj.with_behavior(Behavior::Checkpoint(Checkpoint::new(id)))
    }

    /// Mark as reached without side effects (restoring a save).
    pub fn mark_activated(&mut self, obj: &mut GameObject) {
        self.activated = true;
        obj.appearance = Appearance::color(ACTIVE_COLOR);
    }
}

/// Where a player of `player_size` stands when respawning at a checkpoint
/// occupying `area`: horizontally centered, feet on the checkpoint's base.
pub fn respawn_position(area_pos: Vec2, area_size: Vec2, player_size: Vec2) -> Vec2 {
    Vec2::new(
        area_pos.x + (area_size.x - player_size.x) * 0.5,
        area_pos.y + area_size.y - player_size.y,
    )
}

impl ObjectBehavior for Checkpoint {
    fn on_trigger_enter(&mut self, obj: &mut GameObject, other: &mut GameObject, _contact: &Contact, cmds: &mut Commands) {
        if self.activated {
            return;
        }
        let Some(player) = other.behavior.as_player_mut() else {
            return;
        };
        if player.is_dead() {
            return;
        }
        player.heal_full();
        self.mark_activated(obj);
        let spot = respawn_position(obj.body.position, obj.body.size, other.body.size);
        cmds.activate_checkpoint(self.id.clone(), spot);
        cmds.play_sound("checkpoint");
    }
}
