//! Per-pixel Phong lighting demo.
//!
//! Light definitions live in world space in a read-only [`SceneData`]; every
//! frame they are moved into camera space with the live model-view matrix and
//! published to a [`UniformSink`]. The pipeline itself does not depend on a
//! GPU, so the same frame can be recorded headlessly or packed into the wgpu
//! [`Renderer`]'s uniform block.

pub mod app;
pub mod camera;
pub mod frame;
pub mod lighting;
pub mod math;
pub mod render;
pub mod scene;
pub mod stack;
pub mod uniforms;

pub use camera::{CameraState, OrbitCamera};
pub use frame::{draw_frame, DrawCommand, Frame, Shading, Shape};
pub use lighting::{
    publish_ambient, publish_directional, publish_material, publish_point, LightMarker,
    LightingError, PublishedDirectional, PublishedPoint,
};
pub use math::{MathError, TransformMatrix, Transformed};
pub use render::{PhongUniforms, Renderer};
pub use scene::{AmbientLight, DirectionalLight, Material, PointLight, SceneData, TorusDef};
pub use stack::MatrixStack;
pub use uniforms::{RecordedUniforms, UniformPath, UniformSink, UniformValue};
