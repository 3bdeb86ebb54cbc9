//! Camera-space light publishing.
//!
//! Each function reads the model-view matrix current at the moment it is
//! called. Lights placed inside a local transform scope must be published
//! before that scope is left, otherwise they end up in the wrong frame.

use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;

use crate::math::{self, MathError, TransformMatrix};
use crate::scene::{AmbientLight, DirectionalLight, Material, PointLight};
use crate::uniforms::{
    DirectionalField, MaterialField, PointField, UniformPath, UniformSink, UniformValue,
};

/// Radius of the marker drawn at each point light.
pub const MARKER_RADIUS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LightingError {
    #[error("directional light {index}: {source}")]
    Directional { index: usize, source: MathError },
    #[error("point light {index}: {source}")]
    Point { index: usize, source: MathError },
}

impl LightingError {
    pub fn math(&self) -> MathError {
        match self {
            Self::Directional { source, .. } | Self::Point { source, .. } => *source,
        }
    }
}

/// Flat-colored sphere marking a point light's local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightMarker {
    pub rgb: [u8; 3],
    pub radius: f32,
}

impl LightMarker {
    pub fn for_color(color: Vec3) -> Self {
        let scaled = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        Self {
            rgb: [scaled.x as u8, scaled.y as u8, scaled.z as u8],
            radius: MARKER_RADIUS,
        }
    }

    pub fn color(&self) -> Vec3 {
        Vec3::new(
            f32::from(self.rgb[0]),
            f32::from(self.rgb[1]),
            f32::from(self.rgb[2]),
        ) / 255.0
    }
}

/// Output of [`publish_point`] for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishedPoint {
    pub camera_position: Vec4,
    pub marker: LightMarker,
}

/// Output of [`publish_directional`] for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishedDirectional {
    pub camera_direction: Vec3,
}

pub fn publish_ambient(sink: &mut impl UniformSink, ambient: &AmbientLight) {
    sink.set_uniform(&UniformPath::AmbientColor.name(), ambient.color.into());
}

pub fn publish_material(sink: &mut impl UniformSink, material: &Material) {
    sink.set_uniform(
        &UniformPath::Material(MaterialField::Diffuse).name(),
        material.diffuse.into(),
    );
    sink.set_uniform(
        &UniformPath::Material(MaterialField::Specular).name(),
        material.specular.into(),
    );
    sink.set_uniform(
        &UniformPath::Material(MaterialField::SpecularExponent).name(),
        material.specular_exponent.into(),
    );
}

/// Publishes a directional light transformed by the normal matrix of
/// `model_view`. Nothing is written when the input is rejected.
pub fn publish_directional(
    sink: &mut impl UniformSink,
    index: usize,
    light: &DirectionalLight,
    model_view: &Mat4,
) -> Result<PublishedDirectional, LightingError> {
    let camera_direction = camera_space_direction(light.direction, model_view)
        .map_err(|source| LightingError::Directional { index, source })?;

    let path = |field| UniformPath::Directional { index, field }.name();
    sink.set_uniform(
        &path(DirectionalField::Direction),
        camera_direction.into(),
    );
    sink.set_uniform(&path(DirectionalField::Color), light.color.into());
    Ok(PublishedDirectional { camera_direction })
}

/// Publishes a point light at its camera-space position.
///
/// The returned marker is meant to be drawn with the same `model_view`.
pub fn publish_point(
    sink: &mut impl UniformSink,
    index: usize,
    light: &PointLight,
    model_view: &Mat4,
) -> Result<PublishedPoint, LightingError> {
    let camera_position = camera_space_position(light.position, model_view)
        .map_err(|source| LightingError::Point { index, source })?;

    let path = |field| UniformPath::Point { index, field }.name();
    sink.set_uniform(&path(PointField::Position), camera_position.into());
    sink.set_uniform(&path(PointField::Color), light.color.into());
    sink.set_uniform(&path(PointField::Radius), UniformValue::Float(light.radius));
    Ok(PublishedPoint {
        camera_position,
        marker: LightMarker::for_color(light.color),
    })
}

fn camera_space_direction(direction: Vec3, model_view: &Mat4) -> Result<Vec3, MathError> {
    let normal = TransformMatrix::Linear(math::normal_matrix(model_view)?);
    let direction = math::normalize(direction)?;
    // inverse-transpose keeps the direction but not its length under non-uniform scale
    math::normalize(math::transform(&normal, direction.extend(0.0)).truncate())
}

fn camera_space_position(position: Vec4, model_view: &Mat4) -> Result<Vec4, MathError> {
    let camera = *model_view * position;
    if camera.is_finite() {
        Ok(camera)
    } else {
        Err(MathError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::RecordedUniforms;

    fn white_point(position: Vec4) -> PointLight {
        PointLight {
            position,
            color: Vec3::ONE,
            radius: 450.0,
        }
    }

    #[test]
    fn ambient_is_written_verbatim() {
        let mut sink = RecordedUniforms::new();
        publish_ambient(
            &mut sink,
            &AmbientLight {
                color: Vec3::new(0.1, 0.2, 0.3),
            },
        );
        assert_eq!(
            sink.get("ambientlight.col"),
            Some(UniformValue::Vec3(Vec3::new(0.1, 0.2, 0.3)))
        );
    }

    #[test]
    fn material_writes_three_fields() {
        let mut sink = RecordedUniforms::new();
        publish_material(&mut sink, &Material::new(Vec3::X, Vec3::Y, 400.0));
        assert_eq!(sink.get("material.diff"), Some(UniformValue::Vec3(Vec3::X)));
        assert_eq!(sink.get("material.spec"), Some(UniformValue::Vec3(Vec3::Y)));
        assert_eq!(sink.get("material.spec_exp"), Some(UniformValue::Float(400.0)));
    }

    #[test]
    fn point_at_origin_under_identity_stays_at_origin() {
        let mut sink = RecordedUniforms::new();
        let published =
            publish_point(&mut sink, 0, &white_point(Vec4::W), &Mat4::IDENTITY).unwrap();
        assert_eq!(published.camera_position, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(
            sink.get("pointlights[0].pos"),
            Some(UniformValue::Vec4(Vec4::new(0.0, 0.0, 0.0, 1.0)))
        );
        assert_eq!(sink.get("pointlights[0].col"), Some(UniformValue::Vec3(Vec3::ONE)));
        assert_eq!(sink.get("pointlights[0].rad"), Some(UniformValue::Float(450.0)));
    }

    #[test]
    fn translated_point_lands_in_camera_space() {
        let mut sink = RecordedUniforms::new();
        let model_view = Mat4::from_translation(Vec3::new(0.0, 180.0, 0.0));
        let light = white_point(Vec4::new(0.0, 0.0, 10.0, 1.0));
        let published = publish_point(&mut sink, 3, &light, &model_view).unwrap();
        assert_eq!(published.camera_position, Vec4::new(0.0, 180.0, 10.0, 1.0));
        assert_eq!(
            sink.get("pointlights[3].pos"),
            Some(UniformValue::Vec4(Vec4::new(0.0, 180.0, 10.0, 1.0)))
        );
    }

    #[test]
    fn marker_scales_color_to_display_range() {
        let marker = LightMarker::for_color(Vec3::new(1.0, 0.0, 0.4));
        assert_eq!(marker.rgb, [255, 0, 102]);
        assert_eq!(marker.radius, MARKER_RADIUS);
        assert!(marker.color().abs_diff_eq(Vec3::new(1.0, 0.0, 0.4), 1e-2));
    }

    #[test]
    fn zero_direction_is_rejected_without_writing() {
        let mut sink = RecordedUniforms::new();
        let light = DirectionalLight {
            direction: Vec3::ZERO,
            color: Vec3::ONE,
        };
        let err = publish_directional(&mut sink, 0, &light, &Mat4::IDENTITY).unwrap_err();
        assert_eq!(
            err,
            LightingError::Directional {
                index: 0,
                source: MathError::ZeroLength
            }
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn directional_ignores_camera_translation() {
        let mut sink = RecordedUniforms::new();
        let light = DirectionalLight {
            direction: Vec3::new(-1.0, -1.0, 0.0),
            color: Vec3::splat(0.5),
        };
        let rotation = Mat4::from_rotation_y(0.7);
        let model_view = Mat4::from_translation(Vec3::new(0.0, 0.0, -400.0)) * rotation;

        let moved = publish_directional(&mut sink, 0, &light, &model_view).unwrap();
        let fixed = publish_directional(&mut sink, 0, &light, &rotation).unwrap();
        assert!(moved
            .camera_direction
            .abs_diff_eq(fixed.camera_direction, 1e-5));
        assert!((moved.camera_direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(
            sink.get("directlights[0].col"),
            Some(UniformValue::Vec3(Vec3::splat(0.5)))
        );
    }

    #[test]
    fn directional_stays_unit_length_under_non_uniform_scale() {
        let mut sink = RecordedUniforms::new();
        let light = DirectionalLight {
            direction: Vec3::new(1.0, 1.0, 0.0),
            color: Vec3::ONE,
        };
        let model_view = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let published = publish_directional(&mut sink, 1, &light, &model_view).unwrap();
        let expected = Vec3::new(0.25, 1.0, 0.0).normalize();
        assert!(published.camera_direction.abs_diff_eq(expected, 1e-5));
        assert!(sink.get("directlights[1].dir").is_some());
    }

    #[test]
    fn huge_direction_is_still_published() {
        let mut sink = RecordedUniforms::new();
        let light = DirectionalLight {
            direction: Vec3::new(-3e19, -3e19, 0.0),
            color: Vec3::ONE,
        };
        let published = publish_directional(&mut sink, 0, &light, &Mat4::IDENTITY).unwrap();
        let expected = Vec3::new(-1.0, -1.0, 0.0).normalize();
        assert!(published.camera_direction.abs_diff_eq(expected, 1e-6));
        assert!(sink.get("directlights[0].dir").is_some());
    }

    #[test]
    fn non_finite_point_is_rejected() {
        let mut sink = RecordedUniforms::new();
        let model_view = Mat4::from_translation(Vec3::new(f32::NAN, 0.0, 0.0));
        let err = publish_point(&mut sink, 2, &white_point(Vec4::W), &model_view).unwrap_err();
        assert_eq!(
            err,
            LightingError::Point {
                index: 2,
                source: MathError::NonFinite
            }
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn singular_model_view_is_rejected() {
        let mut sink = RecordedUniforms::new();
        let light = DirectionalLight {
            direction: Vec3::Y,
            color: Vec3::ONE,
        };
        let err = publish_directional(&mut sink, 0, &light, &Mat4::ZERO).unwrap_err();
        assert_eq!(err.math(), MathError::SingularMatrix);
        assert_eq!(err.to_string(), "directional light 0: model-view matrix is singular");
    }
}
