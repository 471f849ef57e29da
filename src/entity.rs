use crate::signal::Completion;
use anyhow::{bail, ensure, Result};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local transform group: position, YXZ euler rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spatial {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Spatial {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Spatial {
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// Model-space forward (-Z) carried into world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::NEG_Z
    }

    /// Points the local -Z axis at `target` (yaw and pitch, roll zeroed).
    pub fn look_at(&mut self, target: Vec3) {
        let to = target - self.position;
        let len = to.length();
        if len <= f32::EPSILON {
            return;
        }
        let yaw = (-to.x).atan2(-to.z);
        let pitch = (to.y / len).asin();
        self.rotation = Vec3::new(pitch, yaw, 0.0);
    }
}

/// Descriptor for one animation clip of a loaded model. Playback timing
/// lives in [`Entity`]; the asset loader only supplies name and duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Loop,
    /// Play once, then clamp on the final frame.
    Once,
}

#[derive(Debug, Clone)]
struct ClipPlayback {
    index: usize,
    mode: LoopMode,
    duration: f32,
    time: f32,
    finished: bool,
}

impl ClipPlayback {
    /// Advances playback; true exactly on the frame a one-shot clip ends.
    fn advance(&mut self, dt: f32) -> bool {
        if self.finished || dt <= 0.0 {
            return false;
        }
        if self.duration <= 0.0 {
            self.finished = true;
            return true;
        }
        self.time += dt;
        match self.mode {
            LoopMode::Loop => {
                self.time = self.time.rem_euclid(self.duration);
                false
            }
            LoopMode::Once => {
                if self.time >= self.duration {
                    self.time = self.duration;
                    self.finished = true;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// One step of a chained clip sequence.
pub struct SequenceStep {
    pub clip: usize,
    pub duration: Option<f32>,
    pub on_complete: Option<Box<dyn FnMut()>>,
}

impl SequenceStep {
    pub fn new(clip: usize) -> Self {
        Self { clip, duration: None, on_complete: None }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_on_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

struct SequencePlayer {
    steps: Vec<SequenceStep>,
    cursor: usize,
    looped: bool,
}

struct PoseTween {
    position: Option<(Vec3, Vec3)>,
    rotation: Option<(Vec3, Vec3)>,
    duration: f32,
    elapsed: f32,
    done: Completion,
}

/// Fixed-speed walk along a waypoint list, ping-ponging at both ends.
#[derive(Debug, Clone)]
struct Patrol {
    waypoints: Vec<Vec3>,
    cursor: usize,
    direction: i32,
    speed: f32,
}

const PATROL_ARRIVAL_RADIUS: f32 = 0.1;

/// An animated, positionable scene object. Created empty at scene load and
/// populated once its asset arrives (`attach_clips`). A clip count of zero
/// is valid.
pub struct Entity {
    name: String,
    pub spatial: Spatial,
    /// Facing direction used by probes and patrol; decoupled from the
    /// visual rotation so cinematics can turn the model without steering it.
    pub orientation: Vec3,
    clips: Vec<AnimationClip>,
    loaded: bool,
    playback: Option<ClipPlayback>,
    sequence: Option<SequencePlayer>,
    tween: Option<PoseTween>,
    patrol: Option<Patrol>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("spatial", &self.spatial)
            .field("orientation", &self.orientation)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spatial: Spatial::default(),
            orientation: Vec3::NEG_Z,
            clips: Vec::new(),
            loaded: false,
            playback: None,
            sequence: None,
            tween: None,
            patrol: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Called by the host once the model's asset load resolves.
    pub fn attach_clips(&mut self, clips: Vec<AnimationClip>) {
        self.clips = clips;
        self.loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn current_clip(&self) -> Option<usize> {
        self.playback.as_ref().map(|playback| playback.index)
    }

    /// Stops every clip and starts the one at `index`. Re-playing the
    /// currently active clip is a silent no-op; an out-of-range index is a
    /// content bug and fails.
    pub fn play(&mut self, index: usize, mode: LoopMode, duration_override: Option<f32>) -> Result<()> {
        if self.current_clip() == Some(index) {
            return Ok(());
        }
        ensure!(
            index < self.clips.len(),
            "entity '{}' has no clip {index} (clip count {})",
            self.name,
            self.clips.len()
        );
        self.start_clip(index, mode, duration_override);
        Ok(())
    }

    fn start_clip(&mut self, index: usize, mode: LoopMode, duration_override: Option<f32>) {
        let duration = duration_override.unwrap_or(self.clips[index].duration);
        self.playback = Some(ClipPlayback { index, mode, duration, time: 0.0, finished: false });
    }

    pub fn stop(&mut self) {
        self.playback = None;
        self.sequence = None;
    }

    /// Chains one-shot clips: each step plays to completion, fires its
    /// callback, then the next starts. With `looped`, the chain restarts
    /// from step 0 after the last. An empty step list is a no-op.
    pub fn play_sequence(&mut self, looped: bool, steps: Vec<SequenceStep>) -> Result<()> {
        if steps.is_empty() {
            return Ok(());
        }
        for step in &steps {
            ensure!(
                step.clip < self.clips.len(),
                "entity '{}' sequence references missing clip {}",
                self.name,
                step.clip
            );
        }
        self.playback = None;
        self.start_clip(steps[0].clip, LoopMode::Once, steps[0].duration);
        self.sequence = Some(SequencePlayer { steps, cursor: 0, looped });
        Ok(())
    }

    /// Tweens position over `duration` seconds. The handle resolves on the
    /// frame the tween lands; a new tween supersedes the old (last write
    /// wins, no cancellation protocol).
    pub fn move_to(&mut self, target: Vec3, duration: f32) -> Completion {
        self.tween_pose(Some(target), None, duration)
    }

    pub fn tween_pose(&mut self, position: Option<Vec3>, rotation: Option<Vec3>, duration: f32) -> Completion {
        if duration <= 0.0 {
            if let Some(target) = position {
                self.spatial.position = target;
            }
            if let Some(target) = rotation {
                self.spatial.rotation = target;
            }
            self.tween = None;
            return Completion::resolved();
        }
        let done = Completion::new();
        self.tween = Some(PoseTween {
            position: position.map(|target| (self.spatial.position, target)),
            rotation: rotation.map(|target| (self.spatial.rotation, target)),
            duration,
            elapsed: 0.0,
            done: done.clone(),
        });
        done
    }

    /// Starts a ping-pong patrol over `waypoints`, beginning toward
    /// `waypoints[start_index]` and advancing the cursor by `direction`.
    pub fn set_targets(&mut self, waypoints: Vec<Vec3>, start_index: usize, direction: i32) -> Result<()> {
        ensure!(!waypoints.is_empty(), "entity '{}' patrol needs waypoints", self.name);
        ensure!(
            start_index < waypoints.len(),
            "entity '{}' patrol start {start_index} out of range ({} waypoints)",
            self.name,
            waypoints.len()
        );
        if direction != 1 && direction != -1 {
            bail!("entity '{}' patrol direction must be +1 or -1, got {direction}", self.name);
        }
        let first = waypoints[start_index];
        self.face_toward(first);
        self.patrol = Some(Patrol { waypoints, cursor: start_index, direction, speed: 2.0 });
        Ok(())
    }

    pub fn set_patrol_speed(&mut self, speed: f32) {
        if let Some(patrol) = self.patrol.as_mut() {
            patrol.speed = speed.max(0.0);
        }
    }

    pub fn clear_targets(&mut self) {
        self.patrol = None;
    }

    fn face_toward(&mut self, target: Vec3) {
        let to = target - self.spatial.position;
        if to.length_squared() > f32::EPSILON {
            self.orientation = to.normalize();
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.update_playback(dt);
        self.update_tween(dt);
        self.update_position(dt);
    }

    fn update_playback(&mut self, dt: f32) {
        let finished_now = match self.playback.as_mut() {
            Some(playback) => playback.advance(dt),
            None => false,
        };
        if !finished_now {
            return;
        }
        let Some(mut sequence) = self.sequence.take() else {
            return;
        };
        if let Some(callback) = sequence.steps[sequence.cursor].on_complete.as_mut() {
            callback();
        }
        sequence.cursor += 1;
        if sequence.cursor >= sequence.steps.len() {
            if !sequence.looped {
                return;
            }
            sequence.cursor = 0;
        }
        let step = &sequence.steps[sequence.cursor];
        self.start_clip(step.clip, LoopMode::Once, step.duration);
        self.sequence = Some(sequence);
    }

    fn update_tween(&mut self, dt: f32) {
        let Some(tween) = self.tween.as_mut() else {
            return;
        };
        tween.elapsed += dt;
        if tween.elapsed >= tween.duration {
            // Land exactly on the targets; interpolation never gets the
            // final frame.
            if let Some((_, to)) = tween.position {
                self.spatial.position = to;
            }
            if let Some((_, to)) = tween.rotation {
                self.spatial.rotation = to;
            }
            tween.done.finish();
            self.tween = None;
            return;
        }
        let t = tween.elapsed / tween.duration;
        if let Some((from, to)) = tween.position {
            self.spatial.position = from.lerp(to, t);
        }
        if let Some((from, to)) = tween.rotation {
            self.spatial.rotation = from.lerp(to, t);
        }
    }

    fn update_position(&mut self, dt: f32) {
        let Some(patrol) = self.patrol.as_mut() else {
            return;
        };
        let target = patrol.waypoints[patrol.cursor];
        let to = target - self.spatial.position;
        let distance = to.length();
        if distance < PATROL_ARRIVAL_RADIUS {
            let len = patrol.waypoints.len() as i32;
            let mut next = patrol.cursor as i32 + patrol.direction;
            if next < 0 || next >= len {
                patrol.direction = -patrol.direction;
                next = patrol.cursor as i32 + patrol.direction;
            }
            patrol.cursor = next.clamp(0, len - 1) as usize;
            let next_target = patrol.waypoints[patrol.cursor];
            self.face_toward(next_target);
            return;
        }
        let step = (patrol.speed * dt).min(distance);
        if distance > f32::EPSILON {
            self.spatial.position += to / distance * step;
        }
    }

    #[cfg(test)]
    fn patrol_cursor_direction(&self) -> Option<(usize, i32)> {
        self.patrol.as_ref().map(|patrol| (patrol.cursor, patrol.direction))
    }
}

/// Registry of the scene's animated entities, keyed by unique name.
/// Lookups on a missing name fail loudly; entity names are authored
/// content, not user input.
#[derive(Default)]
pub struct Producer {
    entities: Vec<Entity>,
}

impl Producer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: Entity) -> Result<()> {
        ensure!(
            self.entities.iter().all(|existing| existing.name() != entity.name()),
            "duplicate entity name '{}'",
            entity.name()
        );
        self.entities.push(entity);
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Entity> {
        match self.entities.iter().find(|entity| entity.name() == name) {
            Some(entity) => Ok(entity),
            None => bail!("no entity named '{name}' in the registry"),
        }
    }

    pub fn get_mut_by_name(&mut self, name: &str) -> Result<&mut Entity> {
        match self.entities.iter_mut().find(|entity| entity.name() == name) {
            Some(entity) => Ok(entity),
            None => bail!("no entity named '{name}' in the registry"),
        }
    }

    pub fn all_loaded(&self) -> bool {
        self.entities.iter().all(Entity::is_loaded)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn update(&mut self, dt: f32) {
        for entity in &mut self.entities {
            entity.update(dt);
        }
    }
}
