use serde::{Deserialize, Serialize};

/// Fixed timestep accumulator.
/// Ensures the simulation runs at a consistent rate regardless of frame time.
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
    /// Upper bound on ticks produced by a single frame.
    max_steps: u32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self::with_max_steps(dt, 10)
    }

    pub fn with_max_steps(dt: f32, max_steps: u32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            max_steps: max_steps.max(1),
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        // Cap to prevent spiral of death after a stall
        self.accumulator = self.accumulator.min(self.dt * self.max_steps as f32);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Interpolation alpha for rendering between ticks (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }
}

/// Simulation clock. Separate from wall time: scaled by `time_scale`
/// and frozen while paused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldClock {
    /// Total simulated seconds.
    pub elapsed: f64,
    /// Multiplier applied to every frame delta (1.0 = real time).
    pub time_scale: f32,
    pub paused: bool,
    /// Largest raw delta accepted per frame.
    pub max_frame_dt: f32,
    frame: u64,
}

impl WorldClock {
    pub fn new(max_frame_dt: f32) -> Self {
        Self {
            elapsed: 0.0,
            time_scale: 1.0,
            paused: false,
            max_frame_dt,
            frame: 0,
        }
    }

    /// Clamp and scale a raw frame delta, advance the clock, and return
    /// the simulation delta. Returns 0 while paused.
    pub fn advance(&mut self, raw_dt: f32) -> f32 {
        if self.paused {
            return 0.0;
        }
        let dt = raw_dt.clamp(0.0, self.max_frame_dt) * self.time_scale.max(0.0);
        if dt > 0.0 {
            self.elapsed += dt as f64;
            self.frame += 1;
        }
        dt
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// True when frame deltas currently produce no simulation time.
    pub fn is_frozen(&self) -> bool {
        self.paused || self.time_scale <= 0.0
    }

    /// Number of frames that advanced the clock.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new(1.0 / 30.0)
    }
}
