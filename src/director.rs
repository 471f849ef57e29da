use crate::config::DirectorConfig;
use crate::entity::Producer;
use crate::operator::Operator;
use crate::player::Player;
use crate::script::ShowcasePoses;
use crate::signal::Completion;
use crate::time::Clock;
use crate::wrap_angle;
use anyhow::Result;
use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, PI};

/// Pickable object names the pointer raycast reports.
pub const POINTER_BODY: &str = "targetBody";
pub const POINTER_QR: &str = "targetQr";
pub const POINTER_SCREEN: &str = "baseScreen";

/// Name of the showcase entity the cinematic beats pose.
pub const SHOWCASE_ENTITY: &str = "showcase";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneId {
    /// Drop the showcase model from its lifted spawn pose.
    Intro,
    /// Ambient state: slow spin plus a pitch/roll wobble, awaiting input.
    TurnAround,
    FocusIn,
    FocusOut,
    FocusLink,
    /// Camera flight from the showcase down into the playable set.
    StartPlay,
    Explore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Player,
    Operator,
    Producer,
    Scenographer,
    EventManager,
}

/// One named flag per collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct Readiness {
    pub player: bool,
    pub operator: bool,
    pub producer: bool,
    pub scenographer: bool,
    pub event_manager: bool,
}

impl Readiness {
    pub fn set(&mut self, subsystem: Subsystem) {
        match subsystem {
            Subsystem::Player => self.player = true,
            Subsystem::Operator => self.operator = true,
            Subsystem::Producer => self.producer = true,
            Subsystem::Scenographer => self.scenographer = true,
            Subsystem::EventManager => self.event_manager = true,
        }
    }

    pub fn all_ready(&self) -> bool {
        self.player && self.operator && self.producer && self.scenographer && self.event_manager
    }
}

/// What the current scene is doing right now. `Waiting` is the busy token:
/// while an async beat is in flight the director ignores pointer input.
/// `Settled` means the beat finished and the scene is holding for input.
enum Activity {
    Idle,
    Waiting { done: Completion, then: Option<SceneId> },
    Settled,
}

/// Scene state machine. Owns no subsystem; each frame the host hands it
/// mutable access to the collaborators it steers.
pub struct Director {
    scene: Option<SceneId>,
    readiness: Readiness,
    activity: Activity,
    hovered: bool,
    portrait: bool,
    showcase: ShowcasePoses,
    pub config: DirectorConfig,
}

impl Director {
    pub fn new(config: DirectorConfig, showcase: ShowcasePoses) -> Self {
        Self {
            scene: None,
            readiness: Readiness::default(),
            activity: Activity::Idle,
            hovered: false,
            portrait: false,
            showcase,
            config,
        }
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.activity, Activity::Waiting { .. })
    }

    pub fn set_portrait(&mut self, portrait: bool) {
        self.portrait = portrait;
    }

    /// Subsystem registration. The show starts on the frame the last
    /// collaborator reports in; repeats after that are harmless.
    pub fn set_ready(&mut self, subsystem: Subsystem) {
        self.readiness.set(subsystem);
        if self.readiness.all_ready() && self.scene.is_none() {
            eprintln!("[director] all subsystems ready, starting the show");
            self.set_scene(SceneId::Intro);
        }
    }

    pub fn set_scene(&mut self, scene: SceneId) {
        eprintln!("[director] scene -> {scene:?}");
        self.scene = Some(scene);
        self.activity = Activity::Idle;
    }

    pub fn update(
        &mut self,
        clock: &Clock,
        operator: &mut Operator,
        producer: &mut Producer,
        player: &mut Player,
    ) -> Result<()> {
        self.poll_activity(operator, player);
        match self.scene {
            Some(SceneId::Intro) => self.run_intro(producer)?,
            Some(SceneId::TurnAround) => self.run_turn_around(clock, producer)?,
            Some(SceneId::FocusIn) => {
                let pose = self.focus_pose();
                self.run_pose_beat(producer, pose, Vec3::ZERO, None)?;
            }
            Some(SceneId::FocusLink) => {
                // Half-turn so the link marker on the model's back faces the
                // camera.
                let pose = self.link_pose();
                self.run_pose_beat(producer, pose, Vec3::new(0.0, PI, 0.0), None)?;
            }
            Some(SceneId::FocusOut) => {
                let pose = self.showcase.base_position.into();
                self.run_pose_beat(producer, pose, Vec3::ZERO, Some(SceneId::TurnAround))?;
            }
            Some(SceneId::StartPlay) => self.run_start_play(operator, player)?,
            Some(SceneId::Explore) | None => {}
        }
        Ok(())
    }

    /// Resolve the in-flight beat, if any. A beat with no follow-up scene
    /// settles in place and waits for input.
    fn poll_activity(&mut self, operator: &mut Operator, player: &mut Player) {
        let resolved = match &self.activity {
            Activity::Waiting { done, .. } => done.is_done(),
            _ => false,
        };
        if !resolved {
            return;
        }
        let Activity::Waiting { then, .. } = std::mem::replace(&mut self.activity, Activity::Settled)
        else {
            return;
        };
        if let Some(next) = then {
            self.set_scene(next);
            if next == SceneId::Explore {
                self.enter_explore(operator, player);
            }
        }
    }

    /// Hand-off to gameplay: the camera keeps its flight-end pose as the
    /// follow offset, and the avatar gets its controls back.
    fn enter_explore(&mut self, operator: &mut Operator, player: &mut Player) {
        operator.set_target(player.position());
        player.controls.set_enabled(true);
    }

    fn run_intro(&mut self, producer: &mut Producer) -> Result<()> {
        if !matches!(self.activity, Activity::Idle) {
            return Ok(());
        }
        let base: Vec3 = self.showcase.base_position.into();
        let lift: Vec3 = self.showcase.group_lift.into();
        let entity = producer.get_mut_by_name(SHOWCASE_ENTITY)?;
        entity.spatial.position = base + lift;
        let done = entity.move_to(base, self.config.intro_duration);
        self.activity = Activity::Waiting { done, then: Some(SceneId::TurnAround) };
        Ok(())
    }

    fn run_turn_around(&mut self, clock: &Clock, producer: &mut Producer) -> Result<()> {
        let multiplier = if self.hovered {
            self.config.hover_multiplier
        } else {
            self.config.rotation_multiplier
        };
        let phase = clock.elapsed_seconds() * self.config.wobble_speed;
        let entity = producer.get_mut_by_name(SHOWCASE_ENTITY)?;
        entity.spatial.rotation.y =
            wrap_angle(entity.spatial.rotation.y + FRAC_PI_2 * clock.delta_seconds() * multiplier);
        entity.spatial.rotation.x = phase.sin() * self.config.wobble_amount;
        entity.spatial.rotation.z = phase.cos() * self.config.wobble_amount;
        Ok(())
    }

    fn run_pose_beat(
        &mut self,
        producer: &mut Producer,
        pose: Vec3,
        rotation: Vec3,
        then: Option<SceneId>,
    ) -> Result<()> {
        if !matches!(self.activity, Activity::Idle) {
            return Ok(());
        }
        let entity = producer.get_mut_by_name(SHOWCASE_ENTITY)?;
        let done = entity.tween_pose(Some(pose), Some(rotation), self.config.focus_duration);
        self.activity = Activity::Waiting { done, then };
        Ok(())
    }

    fn run_start_play(&mut self, operator: &mut Operator, player: &mut Player) -> Result<()> {
        if !matches!(self.activity, Activity::Idle) {
            return Ok(());
        }
        player.controls.set_enabled(false);
        operator.set_active_rig(1)?;
        let done = operator.move_along(0, self.config.start_move_duration, false)?;
        self.activity = Activity::Waiting { done, then: Some(SceneId::Explore) };
        Ok(())
    }

    fn focus_pose(&self) -> Vec3 {
        if self.portrait {
            self.showcase.focus_position_portrait.into()
        } else {
            self.showcase.focus_position.into()
        }
    }

    fn link_pose(&self) -> Vec3 {
        if self.portrait {
            self.showcase.link_position_portrait.into()
        } else {
            self.showcase.link_position.into()
        }
    }

    /// Pointer click with the names of the picked objects, nearest first.
    /// Ignored while a beat is in flight so double-clicks cannot stack
    /// transitions.
    pub fn handle_pointer_down(&mut self, hits: &[String]) {
        if self.is_busy() {
            eprintln!("[director] pointer ignored, a scene beat is in flight");
            return;
        }
        let first = hits.first().map(String::as_str);
        let next = match (self.scene, first) {
            (Some(SceneId::TurnAround), Some(POINTER_BODY)) => Some(SceneId::FocusIn),
            (Some(SceneId::TurnAround), Some(POINTER_QR)) => Some(SceneId::FocusLink),
            (Some(SceneId::FocusIn | SceneId::FocusLink), Some(POINTER_SCREEN)) => Some(SceneId::StartPlay),
            // Anything else while focused, including clicking empty space,
            // backs out to the ambient spin.
            (Some(SceneId::FocusIn | SceneId::FocusLink), _) => Some(SceneId::FocusOut),
            _ => None,
        };
        if let Some(scene) = next {
            self.set_scene(scene);
        }
    }

    /// Pointer parallax while focused: the showcase tracks the cursor with
    /// a slight turn of the head. `x`/`y` are normalized to [-1, 1] with y
    /// up. Suppressed while the focus tween is still in flight.
    pub fn handle_mouse_move(
        &mut self,
        x: f32,
        y: f32,
        operator: &Operator,
        producer: &mut Producer,
    ) -> Result<()> {
        if self.scene != Some(SceneId::FocusIn) || self.is_busy() {
            return Ok(());
        }
        let camera_z = operator.active_rig().map(|rig| rig.position.z).unwrap_or_default();
        let entity = producer.get_mut_by_name(SHOWCASE_ENTITY)?;
        entity.spatial.look_at(Vec3::new(
            x * self.config.parallax_scale,
            y * self.config.parallax_scale,
            camera_z,
        ));
        Ok(())
    }

    /// Hovering the showcase slows the ambient spin.
    pub fn handle_mouse_enter(&mut self) {
        self.hovered = true;
    }

    pub fn handle_mouse_leave(&mut self) {
        self.hovered = false;
    }
}
