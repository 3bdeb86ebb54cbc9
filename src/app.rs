use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::camera::{CameraState, OrbitCamera};
use crate::frame::{draw_frame, Frame};
use crate::scene::SceneData;
use crate::uniforms::RecordedUniforms;

/// Viewport assumed when no window exists.
pub const HEADLESS_VIEWPORT: (u32, u32) = (1280, 720);

/// Loads the scene tables from `path`, or the built-in tables when absent.
pub fn load_scene(path: Option<&Path>) -> Result<SceneData> {
    let Some(path) = path else {
        return Ok(SceneData::builtin());
    };
    let xml = fs::read_to_string(path)
        .with_context(|| format!("unable to read scene {}", path.display()))?;
    SceneData::from_xml(&xml).with_context(|| format!("failed to parse scene {}", path.display()))
}

/// Camera starting from the overview, switched to the close-up, which is also
/// where a reset returns to.
pub fn setup_camera(viewport: (u32, u32)) -> OrbitCamera {
    let mut camera = OrbitCamera::new(CameraState::overview(), viewport);
    camera.set_state(CameraState::close_up());
    camera.set_reset_state(CameraState::close_up());
    camera
}

pub fn describe_scene(out: &mut impl Write, scene: &SceneData) -> io::Result<()> {
    writeln!(
        out,
        "Loaded scene with {} materials, {} directional light(s), {} point light(s)",
        scene.materials.len(),
        scene.directional_lights.len(),
        scene.point_lights.len()
    )
}

pub fn write_frame_summary(
    out: &mut impl Write,
    frame_count: u64,
    uniforms: &RecordedUniforms,
    frame: &Frame,
) -> io::Result<()> {
    writeln!(
        out,
        "Frame {frame_count}: {} uniforms, {} draws",
        uniforms.len(),
        frame.draws.len()
    )?;
    for (name, value) in uniforms.iter() {
        writeln!(out, " - {name} = {value}")?;
    }
    for err in &frame.skipped {
        writeln!(out, " - skipped: {err}")?;
    }
    Ok(())
}

/// Runs `frames` frames without a window and prints the published uniforms.
pub fn run_summary(out: &mut impl Write, scene: &SceneData, frames: u64) -> Result<()> {
    let camera = setup_camera(HEADLESS_VIEWPORT);
    info!("running {frames} headless frame(s)");
    for frame_count in 0..frames {
        let mut uniforms = RecordedUniforms::new();
        if let Some(frame) = draw_frame(&mut uniforms, scene, Some(&camera), frame_count) {
            write_frame_summary(out, frame_count, &uniforms, &frame)?;
        }
    }
    Ok(())
}
