//! Scene orchestration and camera direction for a browser-hosted 3D set.
//!
//! The [`stage::Stage`] owns the whole production: a [`director::Director`]
//! scene state machine, an [`operator::Operator`] steering the camera rigs
//! along authored [`track`] splines or a smoothed follow offset, a
//! [`entity::Producer`] registry of animated entities, the controllable
//! [`player::Player`], blocky [`scenography::Scenography`] collision
//! geometry, and radial [`events`] trigger zones. Rendering, asset decoding
//! and input decoding are the host's job; this crate only simulates.

pub mod camera;
pub mod collision;
pub mod config;
pub mod director;
pub mod entity;
pub mod events;
pub mod operator;
pub mod player;
pub mod scenography;
pub mod script;
pub mod signal;
pub mod stage;
pub mod time;
pub mod track;

/// Wraps an angle into [0, 2π). Long-running spins accumulate rotation
/// every frame and would lose float precision unwrapped.
pub fn wrap_angle(radians: f32) -> f32 {
    radians.rem_euclid(std::f32::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn wrap_angle_stays_in_one_turn() {
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_angle(-0.5) - (TAU - 0.5)).abs() < 1e-6);
        assert_eq!(wrap_angle(0.0), 0.0);
    }
}
