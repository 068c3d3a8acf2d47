//! Contracts for the collaborators that live outside the simulation core.

/// Analog movement axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Semantic input queries. The core never sees device codes.
pub trait InputSource {
    /// Action went down this frame.
    fn is_action_pressed(&self, action: &str) -> bool;
    /// Action is currently held.
    fn is_action_down(&self, action: &str) -> bool;
    /// Action was released this frame.
    fn is_action_up(&self, action: &str) -> bool;
    /// Analog value in [-1, 1].
    fn movement_axis(&self, axis: Axis) -> f32;
}

/// Input source that never reports anything. Used for headless stepping.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInput;

impl InputSource for NullInput {
    fn is_action_pressed(&self, _action: &str) -> bool {
        false
    }

    fn is_action_down(&self, _action: &str) -> bool {
        false
    }

    fn is_action_up(&self, _action: &str) -> bool {
        false
    }

    fn movement_axis(&self, _axis: Axis) -> f32 {
        0.0
    }
}

/// Fire-and-forget sound playback.
pub trait AudioSink {
    fn play_sound(&mut self, name: &str);
}

/// Sink that discards every sound.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_sound(&mut self, _name: &str) {}
}

/// Sink that remembers what was played, in order.
impl AudioSink for Vec<String> {
    fn play_sound(&mut self, name: &str) {
        self.push(name.to_string());
    }
}
