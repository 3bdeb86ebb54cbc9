use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};
use log::{debug, warn};

use crate::frame::{DrawCommand, Shading, Shape};
use crate::math;
use crate::uniforms::{DirectionalField, PointField, UniformPath, UniformSink, UniformValue};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_POINT_LIGHTS: usize = 8;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuDirectionalLight {
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

/// `color.w` carries the falloff radius; zero disables the light.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

/// Global uniform block. `ambient.w` is the lighting switch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightBlock {
    pub projection: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub directional: [GpuDirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    pub point: [GpuPointLight; MAX_POINT_LIGHTS],
}

/// Uniform sink that packs the Phong shader's light uniforms into a
/// [`LightBlock`]. Start a fresh one every frame.
///
/// Material uniforms are not stored here: each draw command carries its own
/// material into [`ObjectConstants`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongUniforms {
    block: LightBlock,
}

impl Default for PhongUniforms {
    fn default() -> Self {
        let mut block = LightBlock::zeroed();
        block.projection = Mat4::IDENTITY.to_cols_array_2d();
        Self { block }
    }
}

impl PhongUniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.block.projection = projection.to_cols_array_2d();
    }

    pub fn block(&self) -> &LightBlock {
        &self.block
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.block)
    }

    fn set_directional(&mut self, index: usize, field: DirectionalField, value: UniformValue) {
        let Some(slot) = self.block.directional.get_mut(index) else {
            warn!("directional light {index} exceeds shader capacity {MAX_DIRECTIONAL_LIGHTS}");
            return;
        };
        match (field, value) {
            (DirectionalField::Direction, UniformValue::Vec3(direction)) => {
                slot.direction = direction.extend(0.0).into();
            }
            (DirectionalField::Color, UniformValue::Vec3(color)) => {
                slot.color = color.extend(1.0).into();
            }
            (field, value) => warn!("directional {field:?} cannot take {value:?}"),
        }
    }

    fn set_point(&mut self, index: usize, field: PointField, value: UniformValue) {
        let Some(slot) = self.block.point.get_mut(index) else {
            warn!("point light {index} exceeds shader capacity {MAX_POINT_LIGHTS}");
            return;
        };
        match (field, value) {
            (PointField::Position, UniformValue::Vec4(position)) => slot.position = position.into(),
            (PointField::Position, UniformValue::Vec3(position)) => {
                slot.position = position.extend(1.0).into();
            }
            (PointField::Color, UniformValue::Vec3(color)) => {
                slot.color = color.extend(slot.color[3]).into();
            }
            (PointField::Radius, UniformValue::Float(radius)) => slot.color[3] = radius.max(0.0),
            (field, value) => warn!("point {field:?} cannot take {value:?}"),
        }
    }
}

impl UniformSink for PhongUniforms {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(path) = UniformPath::parse(name) else {
            debug!("ignoring unknown uniform {name}");
            return;
        };
        match (path, value) {
            (UniformPath::UseLighting, UniformValue::Bool(enabled)) => {
                self.block.ambient[3] = if enabled { 1.0 } else { 0.0 };
            }
            (UniformPath::AmbientColor, UniformValue::Vec3(color)) => {
                self.block.ambient = color.extend(self.block.ambient[3]).into();
            }
            (UniformPath::Material(_), _) => {}
            (UniformPath::Directional { index, field }, value) => {
                self.set_directional(index, field, value);
            }
            (UniformPath::Point { index, field }, value) => self.set_point(index, field, value),
            (path, value) => warn!("uniform {path} cannot take {value:?}"),
        }
    }
}

/// Per-draw uniform block.
///
/// `diffuse.w` is 1 for Phong-lit draws and 0 for flat ones; `specular.w`
/// holds the specular exponent.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub model_view: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl ObjectConstants {
    /// Scales the unit cube mesh to the command's shape. Spheres are drawn as
    /// cubes of the same diameter.
    pub fn from_draw(draw: &DrawCommand) -> Self {
        let size = match draw.shape {
            Shape::Box(size) => size,
            Shape::Sphere(radius) => Vec3::splat(radius * 2.0),
        };
        let model_view = draw.model_view * Mat4::from_scale(size);
        let normal = math::normal_matrix(&model_view).unwrap_or(Mat3::IDENTITY);
        let (diffuse, specular) = match draw.shading {
            Shading::Phong(material) => (
                material.diffuse.extend(1.0),
                material.specular.extend(material.specular_exponent),
            ),
            Shading::Flat(color) => (color.extend(0.0), Vec4::ZERO),
        };
        Self {
            model_view: model_view.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            diffuse: diffuse.into(),
            specular: specular.into(),
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

pub(crate) const SHADER: &str = r#"
struct DirectLight {
    dir: vec4<f32>,
    col: vec4<f32>,
}

struct PointLight {
    pos: vec4<f32>,
    col: vec4<f32>,
}

struct LightBlock {
    projection: mat4x4<f32>,
    ambient: vec4<f32>,
    directlights: array<DirectLight, 4>,
    pointlights: array<PointLight, 8>,
}

struct ObjectConstants {
    model_view: mat4x4<f32>,
    normal: mat3x4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> lights: LightBlock;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) eye_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let eye_position = object.model_view * vec4<f32>(input.position, 1.0);
    out.position = lights.projection * eye_position;
    out.eye_pos = eye_position.xyz;

    let eye_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(eye_normal);
    return out;
}

fn phong(normal: vec3<f32>, view_dir: vec3<f32>, light_dir: vec3<f32>, light_col: vec3<f32>) -> vec3<f32> {
    let lambert = max(dot(normal, light_dir), 0.0);
    if (lambert <= 0.0) {
        return vec3<f32>(0.0);
    }
    let reflected = reflect(-light_dir, normal);
    let highlight = pow(max(dot(reflected, view_dir), 0.0), object.specular.w);
    return light_col * (object.diffuse.rgb * lambert + object.specular.rgb * highlight);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    if (lights.ambient.w < 0.5 || object.diffuse.w < 0.5) {
        return vec4<f32>(object.diffuse.rgb, 1.0);
    }

    let normal = normalize(input.normal);
    let view_dir = normalize(-input.eye_pos);
    var color = lights.ambient.rgb * object.diffuse.rgb;

    for (var i = 0u; i < 4u; i = i + 1u) {
        let light = lights.directlights[i];
        color += phong(normal, view_dir, -light.dir.xyz, light.col.rgb);
    }

    for (var i = 0u; i < 8u; i = i + 1u) {
        let light = lights.pointlights[i];
        let radius = light.col.w;
        if (radius <= 0.0) {
            continue;
        }
        let to_light = light.pos.xyz - input.eye_pos;
        let dist = length(to_light);
        let falloff = clamp(1.0 - dist / radius, 0.0, 1.0);
        color += falloff * phong(normal, view_dir, to_light / max(dist, 0.0001), light.col.rgb);
    }

    return vec4<f32>(color, 1.0);
}
"#;

pub(crate) const UNIT_CUBE_VERTICES: &[f32] = &[
    // positions        // normals
    -0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0,
    -0.5, 0.5, 0.5, 0.0, 0.0, 1.0, -0.5, -0.5, -0.5, 0.0, 0.0, -1.0, 0.5, -0.5, -0.5, 0.0, 0.0,
    -1.0, 0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, -0.5, -0.5, -1.0,
    0.0, 0.0, -0.5, -0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, -0.5,
    -1.0, 0.0, 0.0, 0.5, -0.5, -0.5, 1.0, 0.0, 0.0, 0.5, -0.5, 0.5, 1.0, 0.0, 0.0, 0.5, 0.5, 0.5,
    1.0, 0.0, 0.0, 0.5, 0.5, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, -0.5, 0.0, -1.0, 0.0, 0.5, -0.5,
    -0.5, 0.0, -1.0, 0.0, 0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5,
    0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, -0.5,
    0.5, 0.5, 0.0, 1.0, 0.0,
];

pub(crate) const UNIT_CUBE_INDICES: &[u32] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];
