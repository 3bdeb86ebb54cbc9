pub mod common;
mod native;

pub use common::{
    GpuDirectionalLight, GpuPointLight, LightBlock, ObjectConstants, PhongUniforms,
    MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS,
};
pub use native::Renderer;
