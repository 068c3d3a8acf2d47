//! Deferred world mutations recorded by behaviors and physics callbacks.
//!
//! Behaviors only see their own object and read-only neighbors, so anything
//! that touches the rest of the world goes through this buffer. The world
//! applies it after the behavior pass and again after physics.

use glam::Vec2;

use crate::api::types::{ObjectId, WorldEvent};
use crate::components::object::GameObject;
use crate::physics::layers::CollisionLayers;

#[derive(Debug, Clone)]
pub enum Command {
    /// Enqueue a new object; it becomes live next frame.
    Spawn(Box<GameObject>),
    /// Route damage to `target`'s behavior.
    Damage {
        target: ObjectId,
        amount: f32,
        /// World position the hit came from (knockback points away from it).
        source: Vec2,
    },
    /// Area damage with linear falloff to zero at `radius`.
    Explosion {
        center: Vec2,
        radius: f32,
        damage: f32,
        targets: CollisionLayers,
        source: Option<ObjectId>,
    },
    /// Move `target` by `delta` before physics (riders on moving platforms).
    Carry { target: ObjectId, delta: Vec2 },
    PlaySound(String),
    Emit(WorldEvent),
    ActivateCheckpoint { id: String, position: Vec2 },
    Collect { collectible_id: String },
    SetFlag { key: String, value: bool },
    ShakeCamera { intensity: f32, duration: f32 },
}

/// Command buffer handed to behaviors.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    pub fn spawn(&mut self, object: GameObject) {
        self.queue.push(Command::Spawn(Box::new(object)));
    }

    pub fn damage(&mut self, target: ObjectId, amount: f32, source: Vec2) {
        self.queue.push(Command::Damage { target, amount, source });
    }

    pub fn explode(&mut self, center: Vec2, radius: f32, damage: f32, targets: CollisionLayers, source: Option<ObjectId>) {
        self.queue.push(Command::Explosion { center, radius, damage, targets, source });
    }

    pub fn carry(&mut self, target: ObjectId, delta: Vec2) {
        self.queue.push(Command::Carry { target, delta });
    }

    pub fn play_sound(&mut self, name: impl Into<String>) {
        self.queue.push(Command::PlaySound(name.into()));
    }

    pub fn emit(&mut self, event: WorldEvent) {
        self.queue.push(Command::Emit(event));
    }

    pub fn activate_checkpoint(&mut self, id: impl Into<String>, position: Vec2) {
        self.queue.push(Command::ActivateCheckpoint { id: id.into(), position });
    }

    pub fn collect(&mut self, collectible_id: impl Into<String>) {
        self.queue.push(Command::Collect { collectible_id: collectible_id.into() });
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.queue.push(Command::SetFlag { key: key.into(), value });
    }

    pub fn shake_camera(&mut self, intensity: f32, duration: f32) {
        self.queue.push(Command::ShakeCamera { intensity, duration });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }

    /// Take every queued command, in recording order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}

/// Damage falloff of an explosion: full at the center, zero at the radius.
pub fn explosion_damage(damage: f32, radius: f32, distance: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    damage * (1.0 - distance / radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_drain_in_order() {
        let mut cmds = Commands::new();
        cmds.play_sound("jump");
        cmds.set_flag("door_open", true);
        let drained: Vec<Command> = cmds.drain().collect();
        assert!(matches!(&drained[0], Command::PlaySound(s) if s == "jump"));
        assert!(matches!(&drained[1], Command::SetFlag { key, value: true } if key == "door_open"));
        assert!(cmds.is_empty());
    }

    #[test]
    fn falloff_is_linear() {
        assert_eq!(explosion_damage(40.0, 100.0, 0.0), 40.0);
        assert!((explosion_damage(40.0, 100.0, 25.0) - 30.0).abs() < 1e-5);
        assert_eq!(explosion_damage(40.0, 100.0, 100.0), 0.0);
        assert_eq!(explosion_damage(40.0, 0.0, 0.0), 0.0);
    }
}
