//! Exact AABB tests: box-vs-box contact and ray-vs-box (slab method).

use glam::Vec2;

use crate::api::types::ObjectId;
use crate::core::math::Aabb;

/// Collision record produced by the narrow phase and consumed by resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Index of the first object in the slice being resolved.
    pub a: usize,
    pub b: usize,
    pub a_id: ObjectId,
    pub b_id: ObjectId,
    /// Unit normal pointing from `a` toward `b`.
    pub normal: Vec2,
    /// Penetration depth, never negative. Zero for resting (touching) contact.
    pub depth: f32,
    /// Center of the overlap region.
    pub point: Vec2,
}

impl Contact {
    /// Same contact seen from the other side.
    pub fn flipped(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            a_id: self.b_id,
            b_id: self.a_id,
            normal: -self.normal,
            ..*self
        }
    }
}

/// Normal, depth and contact point of two boxes, resolved along the axis
/// of smaller overlap. Boxes separated by no more than `slop` on one axis
/// (and overlapping on the other) count as touching with zero depth.
pub fn aabb_contact(a: &Aabb, b: &Aabb, slop: f32) -> Option<(Vec2, f32, Vec2)> {
    let overlap = a.overlap_extent(b);
    if overlap.x <= -slop || overlap.y <= -slop {
        return None;
    }
    // Corner-to-corner touching is not a contact.
    if overlap.x <= 0.0 && overlap.y <= 0.0 {
        return None;
    }

    let ca = a.center();
    let cb = b.center();
    let (normal, depth) = if overlap.x < overlap.y {
        let sign = if cb.x >= ca.x { 1.0 } else { -1.0 };
        (Vec2::new(sign, 0.0), overlap.x)
    } else {
        let sign = if cb.y >= ca.y { 1.0 } else { -1.0 };
        (Vec2::new(0.0, sign), overlap.y)
    };

    let lo = a.min.max(b.min);
    let hi = a.max.min(b.max);
    Some((normal, depth.max(0.0), (lo + hi) * 0.5))
}

/// Ray against box. `dir` must be unit length. Returns the entry distance
/// and the surface normal at the entry point. An origin inside the box hits
/// at distance 0 with a zero normal. Axis-parallel rays are handled without
/// dividing by zero.
pub fn ray_aabb(origin: Vec2, dir: Vec2, max_distance: f32, aabb: &Aabb) -> Option<(f32, Vec2)> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let (o, d, lo, hi) = (origin[axis], dir[axis], aabb.min[axis], aabb.max[axis]);
        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (mut t1, mut t2) = ((lo - o) * inv, (hi - o) * inv);
        let mut entry_normal = Vec2::ZERO;
        entry_normal[axis] = -d.signum();
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_min {
            t_min = t1;
            normal = entry_normal;
        }
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        return None;
    }
    if t_min < 0.0 {
        return Some((0.0, Vec2::ZERO));
    }
    (t_min <= max_distance).then_some((t_min, normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x: f32, y: f32, w: f32, h: f32) -> Aabb {
        Aabb::from_pos_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn shallow_axis_wins() {
        // b sits slightly into a from below.
        let (n, depth, point) = aabb_contact(&bx(0.0, 0.0, 10.0, 10.0), &bx(2.0, 8.0, 10.0, 10.0), 0.01)
            .expect("overlap");
        assert_eq!(n, Vec2::new(0.0, 1.0));
        assert!((depth - 2.0).abs() < 1e-5);
        assert_eq!(point, Vec2::new(6.0, 9.0));
    }

    #[test]
    fn normal_points_from_a_to_b() {
        let (n, _, _) = aabb_contact(&bx(5.0, 0.0, 10.0, 10.0), &bx(0.0, 1.0, 6.0, 8.0), 0.0).expect("overlap");
        assert_eq!(n, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn touching_counts_within_slop_only() {
        let a = bx(0.0, 0.0, 10.0, 10.0);
        let resting = bx(0.0, 10.0, 10.0, 10.0);
        let (n, depth, _) = aabb_contact(&a, &resting, 0.01).expect("touching");
        assert_eq!(n, Vec2::new(0.0, 1.0));
        assert_eq!(depth, 0.0);
        assert!(aabb_contact(&a, &bx(0.0, 10.5, 10.0, 10.0), 0.01).is_none());
        assert!(aabb_contact(&a, &bx(10.0, 10.0, 5.0, 5.0), 0.01).is_none());
    }

    #[test]
    fn ray_hits_at_slab_distance() {
        let b = bx(10.0, -5.0, 4.0, 10.0);
        let (t, n) = ray_aabb(Vec2::ZERO, Vec2::X, 100.0, &b).expect("hit");
        assert!((t - 10.0).abs() < 1e-5);
        assert_eq!(n, Vec2::new(-1.0, 0.0));

        let dir = Vec2::new(1.0, 1.0).normalize();
        let b = bx(10.0, 10.0, 5.0, 5.0);
        let (t, _) = ray_aabb(Vec2::ZERO, dir, 100.0, &b).expect("diagonal hit");
        assert!((t - 10.0 * 2f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let b = bx(10.0, 10.0, 5.0, 5.0);
        assert!(ray_aabb(Vec2::ZERO, Vec2::X, 100.0, &b).is_none());
        assert!(ray_aabb(Vec2::new(0.0, 12.0), -Vec2::X, 100.0, &b).is_none());
        assert!(ray_aabb(Vec2::new(0.0, 12.0), Vec2::X, 5.0, &b).is_none());
    }

    #[test]
    fn origin_inside_hits_at_zero() {
        let b = bx(0.0, 0.0, 10.0, 10.0);
        let (t, _) = ray_aabb(Vec2::new(5.0, 5.0), Vec2::Y, 1.0, &b).expect("inside");
        assert_eq!(t, 0.0);
    }
}
