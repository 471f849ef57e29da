use crate::camera::CameraRig;
use crate::config::OperatorConfig;
use crate::signal::Completion;
use crate::track::TrackPair;
use anyhow::{ensure, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Compass quadrant of the follow offset's horizontal components. Trigger
/// zone swing rules match against this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    Se,
    Sw,
    Ne,
    Nw,
}

impl Quadrant {
    /// Sign-only classification: magnitude never matters.
    pub fn of_offset(offset: Vec3) -> Self {
        match (offset.x > 0.0, offset.z > 0.0) {
            (true, true) => Quadrant::Se,
            (false, true) => Quadrant::Sw,
            (true, false) => Quadrant::Ne,
            (false, false) => Quadrant::Nw,
        }
    }
}

/// Exact 90° rotation about the vertical axis; `turn` > 0 is clockwise
/// looking down +Y. Integral so repeated swings never drift.
fn swing_90(v: Vec3, turn: i8) -> Vec3 {
    if turn >= 0 {
        Vec3::new(v.z, v.y, -v.x)
    } else {
        Vec3::new(-v.z, v.y, v.x)
    }
}

struct FollowState {
    current_offset: Vec3,
    desired_offset: Vec3,
    transitioning: bool,
}

enum Motion {
    Idle,
    Playback {
        track: usize,
        progress: f32,
        duration: f32,
        repeat: bool,
        done: Completion,
        on_complete: Option<Box<dyn FnOnce()>>,
    },
    Follow(FollowState),
}

/// Owns the virtual cameras and decides how the active one moves: scripted
/// track playback, target-follow with a smoothed offset, or manual (debug
/// controls own the camera and the Operator stands down). The modes are
/// mutually exclusive.
pub struct Operator {
    rigs: Vec<CameraRig>,
    active: usize,
    tracks: Vec<TrackPair>,
    motion: Motion,
    manual: bool,
    config: OperatorConfig,
}

impl Operator {
    pub fn new(rigs: Vec<CameraRig>, tracks: Vec<TrackPair>, config: OperatorConfig) -> Self {
        Self { rigs, active: 0, tracks, motion: Motion::Idle, manual: false, config }
    }

    pub fn active_rig(&self) -> Option<&CameraRig> {
        self.rigs.get(self.active)
    }

    pub fn active_rig_mut(&mut self) -> Option<&mut CameraRig> {
        self.rigs.get_mut(self.active)
    }

    pub fn set_active_rig(&mut self, index: usize) -> Result<()> {
        ensure!(index < self.rigs.len(), "no camera rig {index} (rig count {})", self.rigs.len());
        self.active = index;
        Ok(())
    }

    pub fn reset_active_rig(&mut self) {
        if let Some(rig) = self.rigs.get_mut(self.active) {
            rig.reset();
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Plays the paired position/look-at tracks over `duration` seconds.
    /// The handle resolves when the camera snaps to the final anchors;
    /// `repeat` loops forever and never resolves. Out-of-range indices are
    /// authored-content bugs and fail.
    pub fn move_along(&mut self, track: usize, duration: f32, repeat: bool) -> Result<Completion> {
        self.move_along_with(track, duration, repeat, || {})
    }

    pub fn move_along_with(
        &mut self,
        track: usize,
        duration: f32,
        repeat: bool,
        on_complete: impl FnOnce() + 'static,
    ) -> Result<Completion> {
        ensure!(track < self.tracks.len(), "no camera track {track} (track count {})", self.tracks.len());
        if duration <= 0.0 && !repeat {
            self.apply_final_sample(track);
            self.motion = Motion::Idle;
            on_complete();
            return Ok(Completion::resolved());
        }
        let done = Completion::new();
        self.motion = Motion::Playback {
            track,
            progress: 0.0,
            duration: duration.max(f32::EPSILON),
            repeat,
            done: done.clone(),
            on_complete: Some(Box::new(on_complete)),
        };
        Ok(done)
    }

    /// Switches to target-follow, preserving the camera's current position
    /// as the offset from the target.
    pub fn set_target(&mut self, target_position: Vec3) {
        let offset = match self.rigs.get(self.active) {
            Some(rig) => rig.position - target_position,
            None => Vec3::ZERO,
        };
        self.motion = Motion::Follow(FollowState {
            current_offset: offset,
            desired_offset: offset,
            transitioning: false,
        });
    }

    pub fn is_following(&self) -> bool {
        matches!(self.motion, Motion::Follow(_))
    }

    /// Rotates the desired follow offset 90° about the vertical axis and
    /// begins blending toward it. No-op outside follow mode.
    pub fn swing_target_offset(&mut self, turn: i8) {
        if let Motion::Follow(follow) = &mut self.motion {
            follow.desired_offset = swing_90(follow.desired_offset, turn);
            follow.transitioning = true;
        }
    }

    /// Quadrant of the current follow offset, None outside follow mode.
    pub fn offset_quadrant(&self) -> Option<Quadrant> {
        match &self.motion {
            Motion::Follow(follow) => Some(Quadrant::of_offset(follow.current_offset)),
            _ => None,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(&self.motion, Motion::Follow(follow) if follow.transitioning)
    }

    /// Manual mode: debug controls drive the camera; playback and follow
    /// are both suspended until it is released.
    pub fn set_manual(&mut self, enabled: bool) {
        self.manual = enabled;
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn handle_resize(&mut self, aspect: f32) {
        for rig in &mut self.rigs {
            rig.set_aspect(aspect);
        }
    }

    fn apply_final_sample(&mut self, track: usize) {
        // End exactly on the track anchors; accumulated stepping error must
        // not leak into the final pose.
        let (position, target) = {
            let pair = &self.tracks[track];
            (pair.position.last_point(), pair.target.last_point())
        };
        if let Some(rig) = self.rigs.get_mut(self.active) {
            rig.look_at(target);
            rig.position = position;
        }
    }

    fn apply_sample(&mut self, track: usize, t: f32) {
        let (position, target) = self.tracks[track].sample(t);
        if let Some(rig) = self.rigs.get_mut(self.active) {
            rig.look_at(target);
            rig.position = position;
        }
    }

    pub fn update(&mut self, dt: f32, follow_target: Option<Vec3>) {
        if self.manual {
            return;
        }
        match std::mem::replace(&mut self.motion, Motion::Idle) {
            Motion::Idle => {}
            Motion::Playback { track, mut progress, duration, repeat, done, mut on_complete } => {
                progress += dt / duration;
                if progress >= 1.0 && !repeat {
                    done.finish();
                    self.apply_final_sample(track);
                    if let Some(callback) = on_complete.take() {
                        callback();
                    }
                    // Motion stays Idle.
                } else {
                    if repeat {
                        progress = progress.rem_euclid(1.0);
                    }
                    self.apply_sample(track, progress);
                    self.motion = Motion::Playback { track, progress, duration, repeat, done, on_complete };
                }
            }
            Motion::Follow(mut follow) => {
                if let Some(target) = follow_target {
                    if follow.transitioning {
                        follow.current_offset =
                            follow.current_offset.lerp(follow.desired_offset, self.config.follow_blend);
                        if follow.current_offset.distance(follow.desired_offset)
                            < self.config.follow_snap_epsilon
                        {
                            follow.current_offset = follow.desired_offset;
                            follow.transitioning = false;
                        }
                    }
                    let position = target + follow.current_offset;
                    if let Some(rig) = self.rigs.get_mut(self.active) {
                        rig.position = position;
                        rig.look_at(target);
                    }
                }
                self.motion = Motion::Follow(follow);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperatorConfig;
    use crate::track::Track;

    fn rig() -> CameraRig {
        CameraRig::new(50.0_f32.to_radians(), 16.0 / 9.0, Vec3::new(0.0, 75.0, 55.0), Vec3::ZERO)
    }

    fn pair(last: Vec3) -> TrackPair {
        TrackPair::new(
            Track::new(vec![Vec3::new(0.0, 75.0, 55.0), Vec3::new(1.0, 40.0, 30.0), last]).expect("position"),
            Track::new(vec![Vec3::new(0.0, 5.0, 0.0), Vec3::new(3.0, 14.0, 25.0)]).expect("target"),
        )
    }

    #[test]
    fn quadrant_classification_is_sign_only() {
        for scale in [0.001, 1.0, 4096.0] {
            assert_eq!(Quadrant::of_offset(Vec3::new(scale, 0.0, scale)), Quadrant::Se);
            assert_eq!(Quadrant::of_offset(Vec3::new(-scale, 0.0, scale)), Quadrant::Sw);
            assert_eq!(Quadrant::of_offset(Vec3::new(scale, 0.0, -scale)), Quadrant::Ne);
            assert_eq!(Quadrant::of_offset(Vec3::new(-scale, 0.0, -scale)), Quadrant::Nw);
        }
    }

    #[test]
    fn move_along_missing_track_fails() {
        let mut operator = Operator::new(vec![rig()], Vec::new(), OperatorConfig::default());
        assert_eq!(operator.track_count(), 0);
        let err = operator.move_along(0, 2.0, false).unwrap_err();
        assert!(err.to_string().contains("no camera track 0"), "unexpected error: {err}");
    }

    #[test]
    fn playback_snaps_exactly_to_the_final_anchor() {
        let last = Vec3::new(3.0, 14.0, 25.0);
        let mut operator = Operator::new(vec![rig()], vec![pair(last)], OperatorConfig::default());
        let done = operator.move_along(0, 2.0, false).expect("track 0 exists");
        // Deliberately uneven steps so naive accumulation would drift.
        let mut remaining = 2.5_f32;
        while remaining > 0.0 {
            operator.update(0.033, None);
            remaining -= 0.033;
        }
        assert!(done.is_done(), "move resolves after duration elapses");
        let rig = operator.active_rig().expect("rig");
        assert_eq!(rig.position, last, "final pose must equal the last anchor exactly");
    }

    #[test]
    fn repeating_playback_never_resolves() {
        let mut operator =
            Operator::new(vec![rig()], vec![pair(Vec3::new(3.0, 14.0, 25.0))], OperatorConfig::default());
        let done = operator.move_along(0, 1.0, true).expect("track 0 exists");
        for _ in 0..120 {
            operator.update(0.033, None);
        }
        assert!(!done.is_done(), "looping playback has no completion");
    }

    #[test]
    fn follow_blends_toward_the_swung_offset_and_snaps() {
        let mut operator = Operator::new(vec![rig()], Vec::new(), OperatorConfig::default());
        let player = Vec3::new(10.0, 0.0, 10.0);
        operator.set_target(player);
        let start_quadrant = operator.offset_quadrant().expect("following");

        operator.swing_target_offset(1);
        assert!(operator.is_transitioning());
        for _ in 0..400 {
            operator.update(0.016, Some(player));
        }
        assert!(!operator.is_transitioning(), "blend must snap once within epsilon");
        let end_quadrant = operator.offset_quadrant().expect("still following");
        assert_ne!(start_quadrant, end_quadrant, "a 90 degree swing changes quadrant");
        let rig = operator.active_rig().expect("rig");
        assert_eq!(rig.target, player, "follow camera always looks at the target");
    }

    #[test]
    fn zero_duration_move_applies_instantly_and_reset_undoes_it() {
        let home = Vec3::new(0.0, 75.0, 55.0);
        let last = Vec3::new(3.0, 14.0, 25.0);
        let mut operator = Operator::new(vec![rig()], vec![pair(last)], OperatorConfig::default());
        let done = operator.move_along(0, 0.0, false).expect("instant move");
        assert!(done.is_done(), "zero duration resolves inline");
        assert_eq!(operator.active_rig().expect("rig").position, last);
        operator.reset_active_rig();
        assert_eq!(operator.active_rig().expect("rig").position, home);
    }

    #[test]
    fn manual_mode_suspends_motion() {
        let mut operator =
            Operator::new(vec![rig()], vec![pair(Vec3::new(3.0, 14.0, 25.0))], OperatorConfig::default());
        let before = operator.active_rig().expect("rig").position;
        operator.move_along(0, 1.0, false).expect("start playback");
        operator.set_manual(true);
        for _ in 0..60 {
            operator.update(0.033, None);
        }
        assert_eq!(operator.active_rig().expect("rig").position, before, "manual camera is hands-off");
        operator.set_manual(false);
        operator.update(0.033, None);
        assert_ne!(operator.active_rig().expect("rig").position, before);
    }
}
