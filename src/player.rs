use crate::collision::{CollisionCaster, ProbeHits, RayScene};
use crate::config::{CollisionConfig, PlayerConfig};
use crate::entity::Entity;
use glam::{Quat, Vec3};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveAction {
    TurnLeft,
    TurnRight,
    Forward,
    Backward,
    Ascend,
    Descend,
}

/// Pressed-key set for the avatar. Disabled during cinematics; disabling
/// also drops anything still held.
#[derive(Debug, Default)]
pub struct ControlState {
    enabled: bool,
    pressed: HashSet<MoveAction>,
}

impl ControlState {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.pressed.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn press(&mut self, action: MoveAction) {
        if self.enabled {
            self.pressed.insert(action);
        }
    }

    pub fn release(&mut self, action: MoveAction) {
        self.pressed.remove(&action);
    }

    pub fn is_pressed(&self, action: MoveAction) -> bool {
        self.pressed.contains(&action)
    }
}

/// The controllable avatar: an entity plus input state and its probe rig.
/// Heading and visual yaw turn together; probes veto each movement axis
/// independently.
pub struct Player {
    pub entity: Entity,
    pub controls: ControlState,
    pub caster: CollisionCaster,
    config: PlayerConfig,
}

impl Player {
    pub fn new(entity: Entity, config: PlayerConfig, collision: &CollisionConfig) -> Self {
        Self {
            entity,
            controls: ControlState::default(),
            caster: CollisionCaster::new(collision.probe_ranges()),
            config,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.entity.spatial.position
    }

    pub fn update(&mut self, dt: f32, scene: &dyn RayScene) {
        self.caster.update(self.entity.spatial.position, self.entity.orientation);
        let hits = self.caster.check_collisions(scene);
        if self.controls.is_enabled() {
            self.apply_turning();
            self.apply_movement(dt, hits);
        }
        // Stick to the ground unless deliberately climbing; no ground in
        // range below means falling.
        if !self.controls.is_pressed(MoveAction::Ascend) {
            if let Some(offset) = self.caster.check_ground(scene) {
                self.entity.spatial.position += offset;
            }
        }
        self.entity.update(dt);
        self.caster.update(self.entity.spatial.position, self.entity.orientation);
    }

    /// Turning is a fixed angle per frame, not dt-scaled; the content was
    /// tuned against a 60 Hz host loop.
    fn apply_turning(&mut self) {
        let mut yaw = 0.0;
        if self.controls.is_pressed(MoveAction::TurnLeft) {
            yaw += self.config.rotation_speed;
        }
        if self.controls.is_pressed(MoveAction::TurnRight) {
            yaw -= self.config.rotation_speed;
        }
        if yaw != 0.0 {
            self.entity.orientation = Quat::from_rotation_y(yaw) * self.entity.orientation;
            self.entity.spatial.rotation.y += yaw;
        }
    }

    fn apply_movement(&mut self, dt: f32, hits: ProbeHits) {
        let step = self.config.move_speed * dt;
        let heading = self.entity.orientation;
        if self.controls.is_pressed(MoveAction::Forward) && !hits.contains(ProbeHits::FRONT) {
            self.entity.spatial.position += heading * step;
        }
        if self.controls.is_pressed(MoveAction::Backward) && !hits.contains(ProbeHits::BACK) {
            self.entity.spatial.position -= heading * step;
        }
        if self.controls.is_pressed(MoveAction::Ascend) && !hits.contains(ProbeHits::UP) {
            self.entity.spatial.position.y += step;
        }
        if self.controls.is_pressed(MoveAction::Descend) && !hits.contains(ProbeHits::DOWN) {
            self.entity.spatial.position.y -= step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{ray_aabb_intersection, Aabb, RayHit};
    use crate::config::StageConfig;

    /// Ground plane at y=0 plus optional blocks.
    struct TestScene {
        ground_height: f32,
        blocks: Vec<Aabb>,
    }

    impl RayScene for TestScene {
        fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
            let mut nearest: Option<RayHit> = None;
            if direction.y.abs() > 1e-6 {
                let t = (self.ground_height - origin.y) / direction.y;
                if t >= 0.0 && t <= max_distance {
                    nearest = Some(RayHit { distance: t, point: origin + direction * t });
                }
            }
            for aabb in &self.blocks {
                if let Some((distance, point)) = ray_aabb_intersection(origin, direction, aabb.min, aabb.max) {
                    if distance <= max_distance && nearest.map_or(true, |hit| distance < hit.distance) {
                        nearest = Some(RayHit { distance, point });
                    }
                }
            }
            nearest
        }
    }

    fn player_on_flat_ground() -> (Player, TestScene) {
        let config = StageConfig::default();
        let mut entity = Entity::new("avatar");
        entity.attach_clips(Vec::new());
        let mut player = Player::new(entity, config.player, &config.collision);
        player.controls.set_enabled(true);
        (player, TestScene { ground_height: 0.0, blocks: Vec::new() })
    }

    #[test]
    fn forward_moves_along_the_heading() {
        let (mut player, scene) = player_on_flat_ground();
        player.controls.press(MoveAction::Forward);
        player.update(0.1, &scene);
        // Default heading is -Z, speed 10: one meter per tenth of a second.
        assert!((player.position().z - (-1.0)).abs() < 1e-4, "got {:?}", player.position());
    }

    #[test]
    fn wall_ahead_blocks_forward_but_not_backward() {
        let (mut player, mut scene) = player_on_flat_ground();
        scene.blocks.push(Aabb::new(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 3.0, -0.5)));
        player.controls.press(MoveAction::Forward);
        player.update(0.1, &scene);
        assert_eq!(player.position().z, 0.0, "front probe should veto the step");
        player.controls.release(MoveAction::Forward);
        player.controls.press(MoveAction::Backward);
        player.update(0.1, &scene);
        assert!(player.position().z > 0.9, "backing away is still allowed");
    }

    #[test]
    fn turning_rotates_a_fixed_angle_per_frame() {
        let (mut player, scene) = player_on_flat_ground();
        player.controls.press(MoveAction::TurnLeft);
        for _ in 0..10 {
            player.update(0.016, &scene);
        }
        let expected = Quat::from_rotation_y(0.05 * 10.0) * Vec3::NEG_Z;
        assert!(player.entity.orientation.distance(expected) < 1e-4);
    }

    #[test]
    fn ground_snap_pulls_the_avatar_down() {
        let (mut player, scene) = player_on_flat_ground();
        player.entity.spatial.position.y = 0.4;
        player.update(0.016, &scene);
        assert!(player.position().y.abs() < 1e-4, "feet should land on y=0, got {}", player.position().y);
    }

    #[test]
    fn ascend_suspends_the_ground_snap() {
        let (mut player, scene) = player_on_flat_ground();
        player.controls.press(MoveAction::Ascend);
        player.update(0.1, &scene);
        assert!(player.position().y > 0.9, "climb should not be undone by the snap");
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let (mut player, scene) = player_on_flat_ground();
        player.controls.press(MoveAction::Forward);
        player.controls.set_enabled(false);
        player.controls.press(MoveAction::Forward);
        player.update(0.1, &scene);
        assert_eq!(player.position(), Vec3::ZERO);
    }
}
