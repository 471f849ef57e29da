use crate::collision::{ray_aabb_intersection, Aabb, RayHit, RayScene};
use crate::script::StageScript;
use glam::Vec3;

/// Static level geometry as axis-aligned blocks. This is the collision-side
/// view of the set; rendering is someone else's problem.
#[derive(Debug, Default)]
pub struct Scenography {
    colliders: Vec<Aabb>,
    loaded: bool,
}

impl Scenography {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_script(script: &StageScript) -> Self {
        let mut scenography = Self::new();
        scenography.load_blocks(script.build_colliders());
        scenography
    }

    pub fn load_blocks(&mut self, colliders: Vec<Aabb>) {
        eprintln!("[scenography] loaded {} collider blocks", colliders.len());
        self.colliders = colliders;
        self.loaded = true;
    }

    pub fn add_collider(&mut self, collider: Aabb) {
        self.colliders.push(collider);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

impl RayScene for Scenography {
    /// Nearest hit across all blocks within `max_distance`.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        for aabb in &self.colliders {
            if let Some((distance, point)) = ray_aabb_intersection(origin, direction, aabb.min, aabb.max) {
                if distance <= max_distance && nearest.map_or(true, |hit| distance < hit.distance) {
                    nearest = Some(RayHit { distance, point });
                }
            }
        }
        nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raycast_returns_the_nearest_block() {
        let mut scenography = Scenography::new();
        scenography.load_blocks(vec![
            Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE),
            Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -2.0), Vec3::ONE),
        ]);
        let hit = scenography.raycast(Vec3::ZERO, Vec3::NEG_Z, 10.0).expect("two blocks ahead");
        assert!((hit.distance - 1.0).abs() < 1e-5, "nearest face is at z=-1, got {hit:?}");

        scenography.add_collider(Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -0.75), Vec3::splat(0.25)));
        assert_eq!(scenography.collider_count(), 3);
        let hit = scenography.raycast(Vec3::ZERO, Vec3::NEG_Z, 10.0).expect("three blocks ahead");
        assert!((hit.distance - 0.5).abs() < 1e-5, "added block is now nearest, got {hit:?}");
    }

    #[test]
    fn raycast_respects_max_distance() {
        let mut scenography = Scenography::new();
        scenography.load_blocks(vec![Aabb::from_center_half_extents(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::ONE,
        )]);
        assert!(scenography.raycast(Vec3::ZERO, Vec3::NEG_Z, 2.0).is_none());
        assert!(scenography.raycast(Vec3::ZERO, Vec3::NEG_Z, 5.0).is_some());
    }

    #[test]
    fn default_script_floor_catches_a_ground_ray() {
        let scenography = Scenography::from_script(&StageScript::default());
        assert!(scenography.is_loaded());
        let hit = scenography
            .raycast(Vec3::new(3.0, 1.0, 4.0), Vec3::NEG_Y, 1.5)
            .expect("floor slab below the spawn area");
        assert!((hit.point.y - 0.0).abs() < 1e-5);
    }
}
