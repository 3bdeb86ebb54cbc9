use std::env;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
use winit::window::WindowBuilder;

use point_lights::app;
use point_lights::{draw_frame, OrbitCamera, PhongUniforms, Renderer, SceneData};

/// Radians of orbit per pixel of mouse drag.
const ORBIT_SPEED: f32 = 0.005;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let scene = app::load_scene(options.scene.as_deref())?;
    app::describe_scene(&mut io::stdout(), &scene)?;

    if options.summary_only {
        return app::run_summary(&mut io::stdout(), &scene, options.frames);
    }
    match run_interactive(&scene) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!("{err}. Falling back to --summary-only mode.");
            app::run_summary(&mut io::stdout(), &scene, options.frames)
        }
        Err(err) => Err(err),
    }
}

fn run_interactive(scene: &SceneData) -> Result<()> {
    let mut event_loop =
        EventLoop::new().map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Point Lights")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window)))?;
    let size = window.inner_size();

    let mut state = AppState {
        renderer,
        scene,
        camera: Some(app::setup_camera((size.width, size.height))),
        frame_count: 0,
        cursor: None,
        dragging: false,
        last_error: None,
    };

    event_loop
        .run_on_demand(|event, target| {
            target.set_control_flow(ControlFlow::Poll);
            if let Err(err) = state.process_event(event, target) {
                state.last_error = Some(err);
                target.exit();
            }
        })
        .map_err(|err| anyhow!("event loop failed: {err}"))?;

    info!("rendered {} frame(s)", state.frame_count);
    match state.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct AppState<'a> {
    renderer: Renderer,
    scene: &'a SceneData,
    camera: Option<OrbitCamera>,
    frame_count: u64,
    cursor: Option<Vec2>,
    dragging: bool,
    last_error: Option<anyhow::Error>,
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

impl AppState<'_> {
    fn process_event(&mut self, event: Event<()>, target: &EventLoopWindowTarget<()>) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => target.exit(),
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(size);
                        if let Some(camera) = self.camera.as_mut() {
                            camera.set_viewport(size.width, size.height);
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state == ElementState::Pressed {
                            self.handle_key(&event.logical_key, target);
                        }
                    }
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        self.dragging = state == ElementState::Pressed;
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let position = Vec2::new(position.x as f32, position.y as f32);
                        if let (true, Some(last), Some(camera)) =
                            (self.dragging, self.cursor, self.camera.as_mut())
                        {
                            let delta = (position - last) * ORBIT_SPEED;
                            camera.orbit(delta.x, delta.y);
                        }
                        self.cursor = Some(position);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let lines = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 100.0,
                        };
                        if let Some(camera) = self.camera.as_mut() {
                            camera.zoom(1.0 - lines.clamp(-5.0, 5.0) * 0.1);
                        }
                    }
                    WindowEvent::RedrawRequested => self.redraw()?,
                    _ => {}
                }
            }
            Event::AboutToWait => self.renderer.window().request_redraw(),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &Key, target: &EventLoopWindowTarget<()>) {
        match key {
            Key::Named(NamedKey::Escape) => target.exit(),
            Key::Character(text) if text.eq_ignore_ascii_case("r") => {
                if let Some(camera) = self.camera.as_mut() {
                    camera.reset();
                }
            }
            _ => {}
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let mut uniforms = PhongUniforms::new();
        let Some(frame) = draw_frame(
            &mut uniforms,
            self.scene,
            self.camera.as_ref(),
            self.frame_count,
        ) else {
            return Ok(());
        };
        uniforms.set_projection(frame.projection);

        match self.renderer.render(&uniforms, &frame.draws) {
            Ok(()) => self.frame_count += 1,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.renderer.size();
                self.renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("GPU is out of memory"));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
            }
        }
        Ok(())
    }
}

struct CliOptions {
    scene: Option<PathBuf>,
    summary_only: bool,
    frames: u64,
}

impl CliOptions {
    const USAGE: &'static str =
        "Usage: point-lights [--scene <scene.xml>] [--summary-only] [--frames <n>]";

    fn parse() -> Result<Self> {
        Self::from_args(env::args().skip(1))
    }

    fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut options = Self {
            scene: None,
            summary_only: false,
            frames: 1,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--scene" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--scene needs a path. {}", Self::USAGE))?;
                    options.scene = Some(PathBuf::from(path));
                }
                "--frames" => {
                    let count = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames needs a count. {}", Self::USAGE))?;
                    options.frames = count
                        .parse()
                        .with_context(|| format!("invalid frame count {count:?}"))?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {}", Self::USAGE));
                }
            }
        }
        if options.frames == 0 {
            warn!("--frames 0 produces no output");
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let options =
            CliOptions::from_args(args(&["--scene", "lights.xml", "--summary-only", "--frames", "3"]))
                .unwrap();
        assert_eq!(options.scene, Some(PathBuf::from("lights.xml")));
        assert!(options.summary_only);
        assert_eq!(options.frames, 3);
    }

    #[test]
    fn rejects_unknown_and_incomplete_arguments() {
        assert!(CliOptions::from_args(args(&["--fullscreen"])).is_err());
        assert!(CliOptions::from_args(args(&["--scene"])).is_err());
        assert!(CliOptions::from_args(args(&["--frames", "many"])).is_err());
    }
}
