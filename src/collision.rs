use bitflags::bitflags;
use glam::Vec3;

/// Anything the short-range probes can raycast against. The scenography
/// implements this; tests substitute flat planes and single boxes.
pub trait RayScene {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }
}

/// Slab-method ray/AABB test. Returns the entry distance and hit point;
/// a ray starting inside the box reports the exit instead.
pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    let origin_arr = origin.to_array();
    let dir_arr = dir.to_array();
    let min_arr = min.to_array();
    let max_arr = max.to_array();
    for i in 0..3 {
        let o = origin_arr[i];
        let d = dir_arr[i];
        if d.abs() < 1e-6 {
            if o < min_arr[i] || o > max_arr[i] {
                return None;
            }
        } else {
            let inv_d = 1.0 / d;
            let mut t1 = (min_arr[i] - o) * inv_d;
            let mut t2 = (max_arr[i] - o) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    if t_max < 0.0 {
        return None;
    }
    let t_hit = if t_min >= 0.0 { t_min } else { t_max };
    Some((t_hit, origin + dir * t_hit))
}

bitflags! {
    /// Which of the six probes reported scene geometry within range.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProbeHits: u8 {
        const FRONT = 1 << 0;
        const BACK  = 1 << 1;
        const LEFT  = 1 << 2;
        const RIGHT = 1 << 3;
        const UP    = 1 << 4;
        const DOWN  = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeRanges {
    pub front_back: f32,
    pub lateral: f32,
    pub vertical: f32,
    pub ground: f32,
    pub ground_epsilon: f32,
}

impl Default for ProbeRanges {
    fn default() -> Self {
        Self { front_back: 0.75, lateral: 1.0, vertical: 1.0, ground: 1.5, ground_epsilon: 0.01 }
    }
}

/// Six short-range probes in an entity's local frame, recomputed every
/// frame from its position and orientation. No sliding or multi-contact
/// resolution.
#[derive(Debug, Clone)]
pub struct CollisionCaster {
    anchor: Vec3,
    feet_y: f32,
    forward: Vec3,
    ranges: ProbeRanges,
}

impl CollisionCaster {
    pub fn new(ranges: ProbeRanges) -> Self {
        Self { anchor: Vec3::ZERO, feet_y: 0.0, forward: Vec3::NEG_Z, ranges }
    }

    /// Re-anchors the probes one unit above the entity's feet and realigns
    /// them with its current orientation.
    pub fn update(&mut self, entity_position: Vec3, orientation: Vec3) {
        self.anchor = entity_position + Vec3::Y;
        self.feet_y = entity_position.y;
        self.forward = if orientation.length_squared() > f32::EPSILON {
            orientation.normalize()
        } else {
            Vec3::NEG_Z
        };
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn directions(&self) -> [(ProbeHits, Vec3, f32); 6] {
        let f = self.forward;
        [
            (ProbeHits::FRONT, f, self.ranges.front_back),
            (ProbeHits::BACK, -f, self.ranges.front_back),
            (ProbeHits::LEFT, Vec3::new(f.z, 0.0, -f.x), self.ranges.lateral),
            (ProbeHits::RIGHT, Vec3::new(-f.z, 0.0, f.x), self.ranges.lateral),
            (ProbeHits::UP, Vec3::Y, self.ranges.vertical),
            (ProbeHits::DOWN, Vec3::NEG_Y, self.ranges.vertical),
        ]
    }

    pub fn check_collisions(&self, scene: &dyn RayScene) -> ProbeHits {
        let mut hits = ProbeHits::empty();
        for (flag, direction, range) in self.directions() {
            let direction = if direction.length_squared() > f32::EPSILON {
                direction.normalize()
            } else {
                continue;
            };
            if scene.raycast(self.anchor, direction, range).is_some() {
                hits |= flag;
            }
        }
        hits
    }

    /// Downward ground query. Returns the corrective offset that snaps the
    /// entity's feet to the surface, the zero vector if already within
    /// epsilon, or `None` when there is no ground in range below (falling).
    pub fn check_ground(&self, scene: &dyn RayScene) -> Option<Vec3> {
        let hit = scene.raycast(self.anchor, Vec3::NEG_Y, self.ranges.ground)?;
        let gap = self.feet_y - hit.point.y;
        if gap.abs() < self.ranges.ground_epsilon {
            Some(Vec3::ZERO)
        } else {
            Some(Vec3::new(0.0, -gap, 0.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Infinite horizontal plane at a fixed height.
    struct FlatGround {
        height: f32,
    }

    impl RayScene for FlatGround {
        fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
            if direction.y.abs() < 1e-6 {
                return None;
            }
            let t = (self.height - origin.y) / direction.y;
            if t < 0.0 || t > max_distance {
                return None;
            }
            Some(RayHit { distance: t, point: origin + direction * t })
        }
    }

    struct OneBox {
        aabb: Aabb,
    }

    impl RayScene for OneBox {
        fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
            let (distance, point) = ray_aabb_intersection(origin, direction, self.aabb.min, self.aabb.max)?;
            (distance <= max_distance).then_some(RayHit { distance, point })
        }
    }

    #[test]
    fn ground_snap_offsets_by_the_gap() {
        let mut caster = CollisionCaster::new(ProbeRanges::default());
        caster.update(Vec3::new(0.0, 5.02, 0.0), Vec3::NEG_Z);
        assert_eq!(caster.anchor(), Vec3::new(0.0, 6.02, 0.0), "probes anchor one unit above the feet");
        let offset = caster.check_ground(&FlatGround { height: 5.0 }).expect("ground below");
        assert!((offset.y - (-0.02)).abs() < 1e-4, "expected (0,-0.02,0), got {offset:?}");
        assert_eq!(offset.x, 0.0);
        assert_eq!(offset.z, 0.0);
    }

    #[test]
    fn ground_within_epsilon_returns_zero() {
        let mut caster = CollisionCaster::new(ProbeRanges::default());
        caster.update(Vec3::new(0.0, 5.001, 0.0), Vec3::NEG_Z);
        let offset = caster.check_ground(&FlatGround { height: 5.0 }).expect("ground below");
        assert_eq!(offset, Vec3::ZERO);
    }

    #[test]
    fn no_ground_in_range_reports_falling() {
        let mut caster = CollisionCaster::new(ProbeRanges::default());
        caster.update(Vec3::new(0.0, 20.0, 0.0), Vec3::NEG_Z);
        assert!(caster.check_ground(&FlatGround { height: 5.0 }).is_none());
    }

    #[test]
    fn wall_ahead_hits_only_the_front_probe() {
        let wall = OneBox { aabb: Aabb::new(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 3.0, -0.6)) };
        let mut caster = CollisionCaster::new(ProbeRanges::default());
        caster.update(Vec3::ZERO, Vec3::NEG_Z);
        let hits = caster.check_collisions(&wall);
        assert!(hits.contains(ProbeHits::FRONT));
        assert!(!hits.contains(ProbeHits::BACK));
        assert!(!hits.contains(ProbeHits::LEFT | ProbeHits::RIGHT));
    }

    #[test]
    fn probes_follow_entity_orientation() {
        // Same wall, entity turned 90 degrees: the wall moves to its right.
        let wall = OneBox { aabb: Aabb::new(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 3.0, -0.6)) };
        let mut caster = CollisionCaster::new(ProbeRanges::default());
        caster.update(Vec3::ZERO, Vec3::NEG_X);
        let hits = caster.check_collisions(&wall);
        assert!(hits.contains(ProbeHits::RIGHT), "wall should sit on the right, got {hits:?}");
        assert!(!hits.contains(ProbeHits::FRONT));
    }

    #[test]
    fn ray_aabb_misses_and_hits() {
        let min = Vec3::new(-1.0, -1.0, -1.0);
        let max = Vec3::ONE;
        assert!(ray_aabb_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, min, max).is_some());
        assert!(ray_aabb_intersection(Vec3::new(0.0, 5.0, 5.0), Vec3::NEG_Z, min, max).is_none());
        // Pointing away from the box.
        assert!(ray_aabb_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, min, max).is_none());
    }
}
