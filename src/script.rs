use crate::camera::CameraRig;
use crate::collision::Aabb;
use crate::events::{Direction, EventManager, TriggerZone};
use crate::operator::{Operator, Quadrant};
use crate::track::{Track, TrackPair};
use anyhow::{Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Authored scene content: camera rigs and tracks, trigger zones with their
/// swing rules, showcase poses, patrol routes, and the blocky level
/// geometry. The built-in default is the shipped act-1 content; a JSON file
/// can override all of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageScript {
    #[serde(default)]
    pub camera_rigs: Vec<CameraRigData>,
    #[serde(default)]
    pub camera_tracks: Vec<CameraTrackData>,
    #[serde(default)]
    pub trigger_zones: Vec<TriggerZoneData>,
    #[serde(default)]
    pub blocks: Vec<BlockData>,
    #[serde(default)]
    pub showcase: ShowcasePoses,
    #[serde(default)]
    pub patrols: Vec<PatrolData>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Data {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Data> for Vec3 {
    fn from(v: Vec3Data) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

fn v(x: f32, y: f32, z: f32) -> Vec3Data {
    Vec3Data { x, y, z }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraRigData {
    pub fov_degrees: f32,
    pub position: Vec3Data,
    pub target: Vec3Data,
}

/// Paired waypoint lists: one spline for camera position, one for look-at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraTrackData {
    pub position_points: Vec<Vec3Data>,
    pub target_points: Vec<Vec3Data>,
}

/// One conditional 90° camera swing: applies only when the zone crossing
/// direction matches and the follow offset currently sits in the named
/// quadrant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingRule {
    pub directions: Vec<Direction>,
    pub offset_quadrant: Quadrant,
    pub turn: i8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerZoneData {
    pub id: String,
    pub origin: Vec3Data,
    pub radius: f32,
    #[serde(default)]
    pub enter_rules: Vec<SwingRule>,
    #[serde(default)]
    pub exit_rules: Vec<SwingRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    pub center: Vec3Data,
    pub half_extents: Vec3Data,
}

/// Poses the cinematic beats tween the showcase model between. Portrait
/// variants compensate for narrow viewports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowcasePoses {
    pub group_lift: Vec3Data,
    pub base_position: Vec3Data,
    pub focus_position: Vec3Data,
    pub focus_position_portrait: Vec3Data,
    pub link_position: Vec3Data,
    pub link_position_portrait: Vec3Data,
}

impl Default for ShowcasePoses {
    fn default() -> Self {
        // Derived from the rig-0 camera pose at (0, -1, 2).
        Self {
            group_lift: v(0.0, 5.0, 0.0),
            base_position: v(0.0, -1.0, -1.0),
            focus_position: v(0.0, -1.45, 0.5),
            focus_position_portrait: v(0.0, -1.0, -1.0),
            link_position: v(0.0, -0.5, 1.0),
            link_position_portrait: v(0.0, -0.9, 0.25),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolData {
    pub entity: String,
    pub waypoints: Vec<Vec3Data>,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default = "PatrolData::default_direction")]
    pub direction: i32,
    #[serde(default = "PatrolData::default_speed")]
    pub speed: f32,
}

impl PatrolData {
    const fn default_direction() -> i32 {
        1
    }

    const fn default_speed() -> f32 {
        2.0
    }
}

impl Default for StageScript {
    fn default() -> Self {
        let camera_rigs = vec![
            CameraRigData { fov_degrees: 50.0, position: v(0.0, -1.0, 2.0), target: v(0.0, -1.0, -1.0) },
            CameraRigData { fov_degrees: 75.0, position: v(0.0, 3.0, 2.0), target: v(0.0, 3.0, 0.0) },
        ];
        let camera_tracks = vec![
            CameraTrackData {
                position_points: vec![v(0.0, 75.0, 55.0), v(3.0, 14.0, 25.0)],
                target_points: vec![v(0.0, 75.0, 45.0), v(0.0, 5.0, 0.0)],
            },
            CameraTrackData {
                position_points: vec![
                    v(3.0, 14.0, 25.0),
                    v(3.0, 14.0, -35.0),
                    v(-70.0, 23.0, -35.0),
                    v(-70.0, 28.0, 24.0),
                    v(-13.0, 45.0, 10.0),
                    v(-13.0, 45.0, -16.0),
                    v(-40.0, 45.0, -16.0),
                    v(-40.0, 45.0, 10.0),
                    v(3.0, 14.0, 25.0),
                ],
                target_points: vec![
                    v(0.0, 5.0, 0.0),
                    v(-10.0, 10.0, -20.0),
                    v(-58.0, 16.0, -17.0),
                    v(-58.0, 16.0, -3.0),
                    v(-39.0, 25.0, 7.0),
                    v(-25.0, 38.0, -3.0),
                    v(-28.0, 38.0, -3.0),
                    v(0.0, 5.0, 0.0),
                ],
            },
        ];
        let trigger_zones = vec![
            TriggerZoneData {
                id: "camera-switch-1".to_string(),
                origin: v(-10.0, 0.0, -18.0),
                radius: 7.0,
                enter_rules: vec![
                    SwingRule {
                        directions: vec![Direction::South, Direction::East],
                        offset_quadrant: Quadrant::Se,
                        turn: 1,
                    },
                    SwingRule {
                        directions: vec![Direction::West, Direction::North],
                        offset_quadrant: Quadrant::Ne,
                        turn: -1,
                    },
                ],
                exit_rules: vec![
                    SwingRule {
                        directions: vec![Direction::South, Direction::East],
                        offset_quadrant: Quadrant::Ne,
                        turn: -1,
                    },
                    SwingRule {
                        directions: vec![Direction::West, Direction::North],
                        offset_quadrant: Quadrant::Se,
                        turn: 1,
                    },
                ],
            },
            TriggerZoneData {
                id: "camera-switch-2".to_string(),
                origin: v(-54.0, 3.0, -18.0),
                radius: 7.0,
                enter_rules: vec![
                    SwingRule {
                        directions: vec![Direction::East],
                        offset_quadrant: Quadrant::Ne,
                        turn: 1,
                    },
                    SwingRule {
                        directions: vec![Direction::South],
                        offset_quadrant: Quadrant::Nw,
                        turn: -1,
                    },
                ],
                exit_rules: vec![
                    SwingRule {
                        directions: vec![Direction::East],
                        offset_quadrant: Quadrant::Nw,
                        turn: -1,
                    },
                    SwingRule {
                        directions: vec![Direction::South],
                        offset_quadrant: Quadrant::Ne,
                        turn: 1,
                    },
                ],
            },
            TriggerZoneData {
                id: "camera-switch-3".to_string(),
                origin: v(-52.0, 3.0, 22.0),
                radius: 7.0,
                enter_rules: vec![
                    SwingRule {
                        directions: vec![Direction::North],
                        offset_quadrant: Quadrant::Nw,
                        turn: 1,
                    },
                    SwingRule {
                        directions: vec![Direction::East],
                        offset_quadrant: Quadrant::Sw,
                        turn: -1,
                    },
                ],
                exit_rules: vec![
                    SwingRule {
                        directions: vec![Direction::North],
                        offset_quadrant: Quadrant::Sw,
                        turn: -1,
                    },
                    SwingRule {
                        directions: vec![Direction::East],
                        offset_quadrant: Quadrant::Nw,
                        turn: 1,
                    },
                ],
            },
            TriggerZoneData {
                id: "camera-switch-4".to_string(),
                origin: v(-18.0, 6.0, 22.0),
                radius: 7.0,
                enter_rules: vec![
                    SwingRule {
                        directions: vec![Direction::West],
                        offset_quadrant: Quadrant::Sw,
                        turn: 1,
                    },
                    SwingRule {
                        directions: vec![Direction::North],
                        offset_quadrant: Quadrant::Se,
                        turn: -1,
                    },
                ],
                exit_rules: vec![
                    SwingRule {
                        directions: vec![Direction::West],
                        offset_quadrant: Quadrant::Se,
                        turn: -1,
                    },
                    SwingRule {
                        directions: vec![Direction::North],
                        offset_quadrant: Quadrant::Sw,
                        turn: 1,
                    },
                ],
            },
        ];
        // One large walkable slab; full level layouts come from JSON.
        let blocks = vec![BlockData { center: v(0.0, -0.5, 0.0), half_extents: v(100.0, 0.5, 100.0) }];
        Self {
            camera_rigs,
            camera_tracks,
            trigger_zones,
            blocks,
            showcase: ShowcasePoses::default(),
            patrols: Vec::new(),
        }
    }
}

impl StageScript {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read script file {}", path.display()))?;
        let script = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse script file {}", path.display()))?;
        Ok(script)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(script) => script,
            Err(err) => {
                eprintln!("[script] load error: {err:?}. Falling back to the built-in act-1 script.");
                Self::default()
            }
        }
    }

    pub fn build_rigs(&self, aspect: f32) -> Vec<CameraRig> {
        self.camera_rigs
            .iter()
            .map(|rig| {
                CameraRig::new(rig.fov_degrees.to_radians(), aspect, rig.position.into(), rig.target.into())
            })
            .collect()
    }

    pub fn build_tracks(&self) -> Result<Vec<TrackPair>> {
        self.camera_tracks
            .iter()
            .enumerate()
            .map(|(index, data)| {
                let position = Track::new(data.position_points.iter().copied().map(Vec3::from).collect())
                    .with_context(|| format!("camera track {index}: position spline"))?;
                let target = Track::new(data.target_points.iter().copied().map(Vec3::from).collect())
                    .with_context(|| format!("camera track {index}: look-at spline"))?;
                Ok(TrackPair::new(position, target))
            })
            .collect()
    }

    pub fn build_event_manager(&self) -> EventManager {
        let mut manager = EventManager::new();
        for zone in &self.trigger_zones {
            manager.add(
                TriggerZone::new(zone.id.clone(), zone.origin.into(), zone.radius)
                    .on_start(swing_callback(zone.enter_rules.clone()))
                    .on_finish(swing_callback(zone.exit_rules.clone())),
            );
        }
        manager
    }

    pub fn build_colliders(&self) -> Vec<Aabb> {
        self.blocks
            .iter()
            .map(|block| Aabb::from_center_half_extents(block.center.into(), block.half_extents.into()))
            .collect()
    }
}

/// First matching rule wins; the quadrant guard keeps a zone from swinging
/// a camera that is already oriented the way the crossing demands.
fn swing_callback(rules: Vec<SwingRule>) -> impl FnMut(&mut Operator, Direction) {
    move |operator, direction| {
        for rule in &rules {
            if rule.directions.contains(&direction)
                && operator.offset_quadrant() == Some(rule.offset_quadrant)
            {
                operator.swing_target_offset(rule.turn);
                break;
            }
        }
    }
}
