use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::api::config::CameraConfig;
use crate::core::math::Aabb;
use crate::core::rng::Rng;

/// Follow camera for a y-down 2D world: deadzone, look-ahead, smoothing,
/// level-bounds clamping and screen shake.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Visible size in world units.
    pub viewport: Vec2,
    /// Camera center in world space, before shake.
    pub center: Vec2,
    /// Area the view may not leave.
    pub bounds: Option<Aabb>,
    /// 0.0 = instant snap, 0.9 = very smooth/slow.
    pub smoothing: f32,
    /// Half-size of the box around the center the target may roam freely.
    pub deadzone: Vec2,
    pub look_ahead: f32,
    look_offset: f32,
    shake: Option<Shake>,
    shake_offset: Vec2,
    rng: Rng,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Shake {
    intensity: f32,
    duration: f32,
    remaining: f32,
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            center: viewport * 0.5,
            bounds: None,
            smoothing: 0.0,
            deadzone: Vec2::ZERO,
            look_ahead: 0.0,
            look_offset: 0.0,
            shake: None,
            shake_offset: Vec2::ZERO,
            rng: Rng::new(1),
        }
    }

    pub fn from_config(config: &CameraConfig, seed: u64) -> Self {
        let mut cam = Self::new(config.viewport);
        cam.deadzone = config.deadzone.max(Vec2::ZERO);
        cam.look_ahead = config.look_ahead;
        cam.set_smoothing(config.smoothing);
        cam.rng = Rng::new(seed);
        cam
    }

    /// Orthographic projection, origin top-left, y down, Z in [0, 1].
    pub fn projection_matrix(&self) -> Mat4 {
        let view = self.view_rect();
        Mat4::orthographic_rh(view.min.x, view.max.x, view.max.y, view.min.y, 0.0, 1.0)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            projection: self.projection_matrix().to_cols_array_2d(),
        }
    }

    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = Some(bounds);
        self.clamp_to_bounds();
    }

    pub fn clear_bounds(&mut self) {
        self.bounds = None;
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 0.99);
    }

    /// Center on `target` immediately.
    pub fn look_at(&mut self, target: Vec2) {
        self.center = target;
        self.look_offset = 0.0;
        self.clamp_to_bounds();
    }

    /// Track a target moving at `velocity`. Call once per frame.
    pub fn follow(&mut self, target: Vec2, velocity: Vec2, dt: f32) {
        let blend = if self.smoothing <= 0.0 {
            1.0
        } else {
            1.0 - self.smoothing.powf(dt * 60.0)
        };

        let wanted_look = if velocity.x.abs() > 10.0 {
            velocity.x.signum() * self.look_ahead
        } else {
            0.0
        };
        self.look_offset += (wanted_look - self.look_offset) * blend;
        let focus = target + Vec2::new(self.look_offset, 0.0);

        let mut goal = self.center;
        let delta = focus - self.center;
        if delta.x.abs() > self.deadzone.x {
            goal.x = focus.x - delta.x.signum() * self.deadzone.x;
        }
        if delta.y.abs() > self.deadzone.y {
            goal.y = focus.y - delta.y.signum() * self.deadzone.y;
        }

        self.center += (goal - self.center) * blend;
        self.clamp_to_bounds();
    }

    /// Start a shake. A weaker shake never cuts a stronger one short.
    pub fn shake(&mut self, intensity: f32, duration: f32) {
        if intensity <= 0.0 || duration <= 0.0 {
            return;
        }
        let current = self.shake_intensity();
        if current > intensity {
            return;
        }
        self.shake = Some(Shake {
            intensity,
            duration,
            remaining: duration,
        });
    }

    /// Current shake strength; decays linearly to zero.
    pub fn shake_intensity(&self) -> f32 {
        self.shake
            .map_or(0.0, |s| s.intensity * (s.remaining / s.duration).clamp(0.0, 1.0))
    }

    /// Advance the shake timer and redraw its offset.
    pub fn update(&mut self, dt: f32) {
        let Some(mut s) = self.shake else {
            self.shake_offset = Vec2::ZERO;
            return;
        };
        s.remaining -= dt;
        if s.remaining <= 0.0 {
            self.shake = None;
            self.shake_offset = Vec2::ZERO;
            return;
        }
        self.shake = Some(s);
        let strength = self.shake_intensity();
        self.shake_offset = Vec2::new(self.rng.range(-1.0, 1.0), self.rng.range(-1.0, 1.0)) * strength;
    }

    /// Center actually rendered, shake included.
    pub fn view_center(&self) -> Vec2 {
        self.center + self.shake_offset
    }

    pub fn view_rect(&self) -> Aabb {
        Aabb::from_center_half(self.view_center(), self.viewport * 0.5)
    }

    pub fn is_visible(&self, point: Vec2) -> bool {
        let v = self.view_rect();
        point.x >= v.min.x && point.x <= v.max.x && point.y >= v.min.y && point.y <= v.max.y
    }

    /// Whether `rect` overlaps the view (touching edges count).
    pub fn is_rect_visible(&self, rect: &Aabb) -> bool {
        let v = self.view_rect();
        rect.max.x >= v.min.x && rect.min.x <= v.max.x && rect.max.y >= v.min.y && rect.min.y <= v.max.y
    }

    fn clamp_to_bounds(&mut self) {
        let Some(b) = self.bounds else {
            return;
        };
        let half = self.viewport * 0.5;
        self.center.x = if self.viewport.x >= b.width() {
            b.center().x
        } else {
            self.center.x.clamp(b.min.x + half.x, b.max.x - half.x)
        };
        self.center.y = if self.viewport.y >= b.height() {
            b.center().y
        } else {
            self.center.y.clamp(b.min.y + half.y, b.max.y - half.y)
        };
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1)
    }
}
