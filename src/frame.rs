use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use log::{debug, warn};

use crate::camera::OrbitCamera;
use crate::lighting::{self, LightingError};
use crate::scene::{Material, SceneData};
use crate::stack::MatrixStack;
use crate::uniforms::{UniformPath, UniformSink};

/// Index of the white light swinging above the ground.
pub const SWINGING_LIGHT: usize = 0;
/// Index of the blue light circling the ground.
pub const CIRCLING_LIGHT: usize = 4;

const GROUND_SIZE: Vec3 = Vec3::new(1000.0, 1000.0, 10.0);
const GROUND_MATERIAL: &str = "white";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box(Vec3),
    Sphere(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    Phong(Material),
    /// Unlit color in 0..1.
    Flat(Vec3),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub model_view: Mat4,
    pub shape: Shape,
    pub shading: Shading,
}

/// Everything the renderer needs for one frame besides the uniform sink.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub projection: Mat4,
    pub draws: Vec<DrawCommand>,
    pub skipped: Vec<LightingError>,
}

/// Transform scopes for the animated point lights at `frame_count`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub swing_angle: f32,
    pub swing_height: f32,
    pub orbit_angle: f32,
}

impl LightRig {
    pub fn at(frame_count: u64, torus_major_radius: f32) -> Self {
        let frame = frame_count as f32;
        let ang = (frame * 0.01).sin() * 0.2;
        Self {
            swing_angle: (ang + 1.0) * FRAC_PI_2,
            swing_height: torus_major_radius * 2.0 + (1.0 - ang.abs()) * 100.0,
            orbit_angle: frame * 0.02,
        }
    }
}

/// Publishes every light for one frame and collects the draw list.
///
/// Returns `None` without touching `sink` when there is no camera yet. A light
/// whose transform fails is logged and left out; the rest of the frame is
/// still produced.
pub fn draw_frame(
    sink: &mut impl UniformSink,
    scene: &SceneData,
    camera: Option<&OrbitCamera>,
    frame_count: u64,
) -> Option<Frame> {
    let camera = camera?;
    let mut frame = Frame {
        projection: camera.projection_matrix(),
        ..Frame::default()
    };
    let mut stack = MatrixStack::new(camera.view_matrix());

    sink.set_uniform(&UniformPath::UseLighting.name(), true.into());
    lighting::publish_ambient(sink, scene.ambient_light());
    if let Some(light) = scene.try_directional_light(0) {
        if let Err(err) = lighting::publish_directional(sink, 0, light, &stack.current()) {
            skip(&mut frame, err);
        }
    }

    let rig = LightRig::at(frame_count, scene.torus.major_radius);
    stack.scoped(|stack| {
        stack.scoped(|stack| {
            stack
                .rotate_x(rig.swing_angle)
                .translate(Vec3::new(0.0, rig.swing_height, 0.0));
            place_point_light(sink, scene, SWINGING_LIGHT, stack, &mut frame);
        });
        stack.scoped(|stack| {
            stack
                .rotate_z(rig.orbit_angle)
                .translate(Vec3::new(180.0, 0.0, 10.0));
            place_point_light(sink, scene, CIRCLING_LIGHT, stack, &mut frame);
        });
    });

    let ground = scene
        .material(GROUND_MATERIAL)
        .copied()
        .unwrap_or_default();
    lighting::publish_material(sink, &ground);
    frame.draws.push(DrawCommand {
        model_view: stack.current(),
        shape: Shape::Box(GROUND_SIZE),
        shading: Shading::Phong(ground),
    });

    Some(frame)
}

fn place_point_light(
    sink: &mut impl UniformSink,
    scene: &SceneData,
    index: usize,
    stack: &MatrixStack,
    frame: &mut Frame,
) {
    let Some(light) = scene.try_point_light(index) else {
        debug!("scene has no point light {index}");
        return;
    };
    let model_view = stack.current();
    match lighting::publish_point(sink, index, light, &model_view) {
        Ok(published) => frame.draws.push(DrawCommand {
            model_view,
            shape: Shape::Sphere(published.marker.radius),
            shading: Shading::Flat(published.marker.color()),
        }),
        Err(err) => skip(frame, err),
    }
}

fn skip(frame: &mut Frame, err: LightingError) {
    warn!("skipping light: {err}");
    frame.skipped.push(err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraState;
    use crate::math::MathError;
    use crate::uniforms::{RecordedUniforms, UniformValue};
    use glam::Vec4;

    fn fixed_camera() -> OrbitCamera {
        OrbitCamera::new(CameraState::new(0.0, Vec3::ZERO, [1.0, 0.0, 0.0, 0.0]), (800, 600))
    }

    fn position(sink: &RecordedUniforms, name: &str) -> Vec4 {
        match sink.get(name) {
            Some(UniformValue::Vec4(v)) => v,
            other => panic!("{name} is {other:?}"),
        }
    }

    #[test]
    fn no_camera_is_a_no_op() {
        let mut sink = RecordedUniforms::new();
        assert!(draw_frame(&mut sink, &SceneData::builtin(), None, 0).is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn first_frame_places_lights_in_their_scopes() {
        let mut sink = RecordedUniforms::new();
        let camera = fixed_camera();
        let frame = draw_frame(&mut sink, &SceneData::builtin(), Some(&camera), 0).unwrap();

        assert!(position(&sink, "pointlights[4].pos")
            .abs_diff_eq(Vec4::new(180.0, 0.0, 10.0, 1.0), 1e-3));
        assert!(position(&sink, "pointlights[0].pos")
            .abs_diff_eq(Vec4::new(0.0, 0.0, 300.0, 1.0), 1e-3));
        assert_eq!(sink.get("uUseLighting"), Some(UniformValue::Bool(true)));
        assert_eq!(sink.get("material.spec_exp"), Some(UniformValue::Float(200.0)));
        assert!(sink.get("directlights[0].dir").is_some());
        assert!(sink.get("pointlights[1].pos").is_none());
        assert!(frame.skipped.is_empty());

        assert_eq!(frame.draws.len(), 3);
        let ground = frame.draws.last().unwrap();
        assert_eq!(ground.model_view, Mat4::IDENTITY);
        assert_eq!(ground.shape, Shape::Box(GROUND_SIZE));
    }

    #[test]
    fn markers_share_the_light_transform() {
        let mut sink = RecordedUniforms::new();
        let camera = OrbitCamera::new(CameraState::close_up(), (1280, 720));
        let frame = draw_frame(&mut sink, &SceneData::builtin(), Some(&camera), 250).unwrap();

        let markers: Vec<_> = frame
            .draws
            .iter()
            .filter(|draw| matches!(draw.shape, Shape::Sphere(_)))
            .collect();
        assert_eq!(markers.len(), 2);
        for (marker, index) in markers.iter().zip([SWINGING_LIGHT, CIRCLING_LIGHT]) {
            let origin = marker.model_view * Vec4::W;
            let published = position(&sink, &format!("pointlights[{index}].pos"));
            assert!(origin.abs_diff_eq(published, 1e-2));
        }
        assert_eq!(
            markers[1].shading,
            Shading::Flat(Vec3::new(26.0, 102.0, 255.0) / 255.0)
        );
    }

    #[test]
    fn bad_directional_light_is_skipped_not_fatal() {
        let mut scene = SceneData::builtin();
        scene.directional_lights[0].direction = Vec3::ZERO;
        let mut sink = RecordedUniforms::new();
        let frame = draw_frame(&mut sink, &scene, Some(&fixed_camera()), 0).unwrap();

        assert_eq!(frame.skipped.len(), 1);
        assert_eq!(frame.skipped[0].math(), MathError::ZeroLength);
        assert!(sink.get("directlights[0].dir").is_none());
        assert!(sink.get("pointlights[0].pos").is_some());
        assert_eq!(frame.draws.len(), 3);
    }

    #[test]
    fn missing_lights_are_left_out() {
        let mut scene = SceneData::builtin();
        scene.point_lights.truncate(1);
        scene.directional_lights.clear();
        let mut sink = RecordedUniforms::new();
        let frame = draw_frame(&mut sink, &scene, Some(&fixed_camera()), 0).unwrap();
        assert_eq!(frame.draws.len(), 2);
        assert!(sink.get("pointlights[4].pos").is_none());
        assert!(frame.skipped.is_empty());
    }

    #[test]
    fn rig_follows_frame_count() {
        let rig = LightRig::at(0, 100.0);
        assert_eq!(rig.swing_angle, FRAC_PI_2);
        assert_eq!(rig.swing_height, 300.0);
        assert_eq!(rig.orbit_angle, 0.0);

        let later = LightRig::at(157, 100.0);
        assert!(later.swing_height < 300.0);
        assert!((later.orbit_angle - 3.14).abs() < 1e-4);
    }
}
