//! Headless driver for the stage: loads config and script, fakes the asset
//! loads, clicks through the showcase, then walks the avatar through the
//! camera-switch zones at a fixed timestep. Useful for smoke-testing
//! authored content without a browser host.

use anyhow::{anyhow, bail, Context, Result};
use proscenium::config::StageConfig;
use proscenium::director::{POINTER_BODY, POINTER_SCREEN, SHOWCASE_ENTITY};
use proscenium::entity::AnimationClip;
use proscenium::player::MoveAction;
use proscenium::script::StageScript;
use proscenium::stage::{Stage, AVATAR_ENTITY};
use std::env;

#[derive(Debug, Clone, PartialEq)]
struct SimArgs {
    config: Option<String>,
    script: Option<String>,
    seconds: f32,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self { config: None, script: None, seconds: 30.0 }
    }
}

impl SimArgs {
    fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = SimArgs::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --config/--script/--seconds with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => parsed.config = Some(value),
                "script" => parsed.script = Some(value),
                "seconds" => {
                    parsed.seconds = value
                        .parse::<f32>()
                        .with_context(|| format!("Invalid seconds '{value}'"))?;
                }
                _ => bail!("Unknown flag '{flag}'. Supported flags: --config, --script, --seconds."),
            }
        }
        Ok(parsed)
    }
}

const DT: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    let args = SimArgs::parse_from_env()?;
    let config = match &args.config {
        Some(path) => StageConfig::load(path)?,
        None => StageConfig::default(),
    };
    let script = match &args.script {
        Some(path) => StageScript::load(path)?,
        None => StageScript::default(),
    };
    let mut stage = Stage::new(config, &script, 16.0 / 9.0)?;

    // Stand in for the asset pipeline.
    stage.finish_entity_load(AVATAR_ENTITY, Vec::new())?;
    stage.finish_entity_load(
        SHOWCASE_ENTITY,
        vec![AnimationClip { name: "spin".to_string(), duration: 2.0 }],
    )?;
    for patrol in &script.patrols {
        stage.finish_entity_load(
            &patrol.entity,
            vec![AnimationClip { name: "walk".to_string(), duration: 1.0 }],
        )?;
    }

    // Intro and a little ambient spin.
    run_seconds(&mut stage, 2.0)?;
    report(&stage);

    // Click through the showcase into gameplay.
    stage.handle_pointer_down(&[POINTER_BODY.to_string()]);
    run_seconds(&mut stage, 1.0)?;
    stage.handle_pointer_down(&[POINTER_SCREEN.to_string()]);
    run_seconds(&mut stage, 3.0)?;
    report(&stage);

    // Walk forward for the rest of the budget and let the zones steer the
    // camera.
    stage.press(MoveAction::Forward);
    let remaining = (args.seconds - 6.0).max(0.0);
    run_seconds(&mut stage, remaining)?;
    stage.release(MoveAction::Forward);
    report(&stage);
    Ok(())
}

fn run_seconds(stage: &mut Stage, seconds: f32) -> Result<()> {
    let frames = (seconds / DT).ceil() as u32;
    for _ in 0..frames {
        stage.step(DT)?;
    }
    Ok(())
}

fn report(stage: &Stage) {
    let avatar = stage.player.position();
    let camera = stage
        .operator
        .active_rig()
        .map(|rig| rig.position)
        .unwrap_or_default();
    eprintln!(
        "[sim] t={:.2}s scene={:?} avatar=({:.2}, {:.2}, {:.2}) camera=({:.2}, {:.2}, {:.2})",
        stage.clock.elapsed_seconds(),
        stage.director.scene(),
        avatar.x,
        avatar.y,
        avatar.z,
        camera.x,
        camera.y,
        camera.z
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = ["sim", "--config", "stage.json", "--seconds", "12.5"];
        let parsed = SimArgs::parse(args).expect("parse args");
        assert_eq!(parsed.config.as_deref(), Some("stage.json"));
        assert_eq!(parsed.script, None);
        assert!((parsed.seconds - 12.5).abs() < 1e-6);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(SimArgs::parse(["sim", "--fps", "30"]).is_err());
        assert!(SimArgs::parse(["sim", "stray"]).is_err());
    }
}
