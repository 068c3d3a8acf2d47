use crate::api::services::AudioSink;
use crate::api::types::WorldEvent;
use crate::core::time::FixedTimestep;
use crate::input::actions::ActionState;
use crate::renderer::instance::RenderBuffer;
use crate::renderer::traits::{FrameData, Renderer};
use crate::systems::render::build_render_buffer;
use crate::world::World;

/// Drives a world at a fixed rate and hands each frame to a renderer and
/// an audio sink.
///
/// The world's event queue is drained every tick into [`Self::events`], so
/// it holds one host frame's events at most. Registered listeners still see
/// every event as it is emitted.
pub struct GameRunner<R: Renderer, A: AudioSink> {
    pub world: World,
    renderer: R,
    audio: A,
    render_buffer: RenderBuffer,
    timestep: FixedTimestep,
    events: Vec<WorldEvent>,
}

impl<R: Renderer, A: AudioSink> GameRunner<R, A> {
    pub fn new(world: World, renderer: R, audio: A) -> Self {
        let config = world.config();
        let timestep = FixedTimestep::with_max_steps(config.fixed_dt, config.max_steps_per_frame);
        Self {
            world,
            renderer,
            audio,
            render_buffer: RenderBuffer::new(),
            timestep,
            events: Vec::new(),
        }
    }

    /// Run one host frame: fixed world steps, sounds, then drawing.
    /// Returns the number of world steps taken.
    ///
    /// Pressed/released edges are consumed by the first step that sees
    /// them; a frame too short for any step keeps them for the next one.
    pub fn tick(&mut self, frame_dt: f32, input: &mut ActionState) -> u32 {
        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.world.update(self.timestep.dt(), &*input);
            input.end_frame();
        }

        self.world.drain_sounds_into(&mut self.audio);
        self.events = self.world.drain_events();

        build_render_buffer(&self.world, &mut self.render_buffer);
        let camera = self.world.camera();
        let frame = FrameData {
            instances: &self.render_buffer.instances,
            batches: &self.render_buffer.batches,
            view: camera.view_rect(),
            background: self.world.level().background_color,
            projection: camera.uniform(),
        };
        self.renderer.draw_frame(&frame);
        steps
    }

    /// Interpolation alpha between the last two world steps.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.render_buffer
    }

    /// Events emitted since the previous tick.
    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::EngineConfig;
    use crate::api::services::InputSource;
    use crate::components::layer::WorldLayer;
    use crate::entities::player::actions;
    use crate::renderer::traits::HeadlessRenderer;
    use glam::Vec2;

    fn runner() -> GameRunner<HeadlessRenderer, Vec<String>> {
        // A power-of-two step keeps the accumulator arithmetic exact.
        let mut world = World::new(EngineConfig {
            fixed_dt: 1.0 / 64.0,
            ..Default::default()
        });
        world.spawn_player(Vec2::new(100.0, 100.0));
        GameRunner::new(world, HeadlessRenderer::default(), Vec::new())
    }

    #[test]
    fn fixed_steps_follow_frame_time() {
        let mut r = runner();
        let mut input = ActionState::new();
        assert_eq!(r.tick(1.0 / 64.0, &mut input), 1);
        assert_eq!(r.tick(0.01, &mut input), 0);
        assert_eq!(r.tick(0.01, &mut input), 1);
        // A stall is capped at max_steps_per_frame.
        assert_eq!(r.tick(5.0, &mut input), 10);
        assert_eq!(r.renderer().frames, 4);
    }

    #[test]
    fn frames_reach_the_renderer_and_sounds_the_sink() {
        let mut r = runner();
        let mut input = ActionState::new();
        r.tick(1.0 / 64.0, &mut input);
        assert_eq!(r.renderer().last_instances, 1);
        assert!(r.render_buffer().batch(WorldLayer::Player).is_some());

        if let Some(p) = r.world.player_mut().and_then(|o| o.behavior.as_player_mut()) {
            p.unlock_ability("shield", 1);
        }
        input.set_action(actions::SHIELD, true);
        r.tick(1.0 / 64.0, &mut input);
        assert!(r.audio().iter().any(|s| s == "shield"));
        assert!(!input.is_action_pressed(actions::SHIELD));
        assert!(input.is_action_down(actions::SHIELD));
    }

    #[test]
    fn event_queue_is_handed_off_every_tick() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut r = runner();
        let heard = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&heard);
        r.world.on("flagChanged", move |_| counter.set(counter.get() + 1));

        let mut input = ActionState::new();
        for i in 0..2000 {
            r.world.set_flag("lever", i % 2 == 0);
            r.tick(1.0 / 64.0, &mut input);
            assert_eq!(r.events().iter().filter(|e| e.name() == "flagChanged").count(), 1);
        }
        assert_eq!(heard.get(), 2000);
        assert!(r.world.drain_events().is_empty());
    }
}
