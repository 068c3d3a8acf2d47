use std::collections::{HashMap, HashSet};

use crate::api::services::{Axis, InputSource};

/// Input event types the engine understands.
/// Already mapped to semantic actions by the host's device layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// An action went down.
    ActionDown(String),
    /// An action was released.
    ActionUp(String),
    /// An analog axis moved to `value` (clamped to [-1, 1]).
    Axis { axis: Axis, value: f32 },
}

/// Per-frame action state fed by input events.
///
/// Push events as they arrive, let the simulation query during the
/// frame, then call `end_frame` to clear the pressed/released edges.
#[derive(Debug, Default)]
pub struct ActionState {
    down: HashSet<String>,
    pressed: HashSet<String>,
    released: HashSet<String>,
    axes: HashMap<Axis, f32>,
}

impl ActionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one input event.
    pub fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::ActionDown(action) => {
                if self.down.insert(action.clone()) {
                    self.pressed.insert(action);
                }
            }
            InputEvent::ActionUp(action) => {
                if self.down.remove(&action) {
                    self.released.insert(action);
                }
            }
            InputEvent::Axis { axis, value } => {
                self.axes.insert(axis, value.clamp(-1.0, 1.0));
            }
        }
    }

    /// Convenience: press (or release) an action.
    pub fn set_action(&mut self, action: &str, down: bool) {
        let event = if down {
            InputEvent::ActionDown(action.to_string())
        } else {
            InputEvent::ActionUp(action.to_string())
        };
        self.push(event);
    }

    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        self.push(InputEvent::Axis { axis, value });
    }

    /// Clear edge-triggered state. Held actions and axes persist.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    /// Release everything (e.g. on focus loss).
    pub fn reset(&mut self) {
        self.down.clear();
        self.pressed.clear();
        self.released.clear();
        self.axes.clear();
    }
}

impl InputSource for ActionState {
    fn is_action_pressed(&self, action: &str) -> bool {
        self.pressed.contains(action)
    }

    fn is_action_down(&self, action: &str) -> bool {
        self.down.contains(action)
    }

    fn is_action_up(&self, action: &str) -> bool {
        self.released.contains(action)
    }

    fn movement_axis(&self, axis: Axis) -> f32 {
        let analog = self.axes.get(&axis).copied().unwrap_or(0.0);
        if analog != 0.0 {
            return analog;
        }
        // Digital fallback from directional actions
        let (neg, pos) = match axis {
            Axis::Horizontal => ("left", "right"),
            Axis::Vertical => ("up", "down"),
        };
        let mut value = 0.0;
        if self.down.contains(neg) {
            value -= 1.0;
        }
        if self.down.contains(pos) {
            value += 1.0;
        }
        value
    }
}
