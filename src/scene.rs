use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use glam::{Vec3, Vec4};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Surface response used by the Phong shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub specular_exponent: f32,
}

impl Material {
    pub const fn new(diffuse: Vec3, specular: Vec3, specular_exponent: f32) -> Self {
        Self {
            diffuse,
            specular,
            specular_exponent,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Vec3::ONE, Vec3::ONE, default_shininess())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Vec3,
}

/// Light arriving from a fixed world-space direction.
///
/// The direction does not need to be normalized; a zero-length direction is
/// rejected when the light is published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
}

/// Light placed at a homogeneous world-space position with a falloff radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    #[serde(default = "default_position")]
    pub position: Vec4,
    pub color: Vec3,
    pub radius: f32,
}

impl PointLight {
    pub fn at_origin(color: Vec3, radius: f32) -> Self {
        Self {
            position: default_position(),
            color,
            radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusDef {
    pub major_radius: f32,
    pub minor_radius: f32,
}

impl Default for TorusDef {
    fn default() -> Self {
        Self {
            major_radius: 100.0,
            minor_radius: 15.0,
        }
    }
}

/// Read-only tables describing the lit scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneData {
    pub materials: BTreeMap<String, Material>,
    pub ambient: AmbientLight,
    pub directional_lights: Vec<DirectionalLight>,
    pub point_lights: Vec<PointLight>,
    #[serde(default)]
    pub torus: TorusDef,
}

impl SceneData {
    /// The built-in scene: six materials, a black ambient, one (black)
    /// directional light and five point lights parked at the origin.
    pub fn builtin() -> Self {
        let materials = [
            ("white", Material::new(Vec3::ONE, Vec3::ONE, 200.0)),
            (
                "dark",
                Material::new(Vec3::new(0.2, 0.3, 0.4), Vec3::ONE, 400.0),
            ),
            (
                "red",
                Material::new(Vec3::new(1.0, 0.05, 0.01), Vec3::X, 400.0),
            ),
            (
                "blue",
                Material::new(Vec3::new(0.01, 0.05, 1.0), Vec3::Z, 400.0),
            ),
            (
                "green",
                Material::new(Vec3::new(0.05, 1.0, 0.01), Vec3::Y, 400.0),
            ),
            (
                "yellow",
                Material::new(Vec3::new(1.0, 1.0, 0.01), Vec3::new(1.0, 1.0, 0.0), 400.0),
            ),
        ]
        .into_iter()
        .map(|(name, material)| (name.to_string(), material))
        .collect();

        Self {
            materials,
            ambient: AmbientLight::default(),
            directional_lights: vec![DirectionalLight {
                direction: Vec3::new(-1.0, -1.0, 0.0),
                color: Vec3::ZERO,
            }],
            point_lights: vec![
                PointLight::at_origin(Vec3::ONE, 450.0),
                PointLight::at_origin(Vec3::new(1.0, 0.0, 0.4), 200.0),
                PointLight::at_origin(Vec3::new(0.0, 0.4, 1.0), 200.0),
                PointLight::at_origin(Vec3::new(1.0, 0.4, 0.0), 300.0),
                PointLight::at_origin(Vec3::new(0.1, 0.4, 1.0), 300.0),
            ],
            torus: TorusDef::default(),
        }
    }

    /// Parses a scene description of `<material>`, `<ambient>`,
    /// `<directional>`, `<point>` and `<torus>` elements.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut scene = Self::default();

        for node in document.root_element().children().filter(|child| child.is_element()) {
            match node.tag_name().name() {
                "material" => {
                    let name = required_text(&node, "name")?;
                    let material = Material {
                        diffuse: parse_vec3(optional_text(&node, "diffuse"), Vec3::ONE)?,
                        specular: parse_vec3(optional_text(&node, "specular"), Vec3::ONE)?,
                        specular_exponent: parse_f32(
                            optional_text(&node, "shininess"),
                            default_shininess(),
                        )?,
                    };
                    if scene.materials.insert(name.clone(), material).is_some() {
                        return Err(anyhow!("material {name} is defined twice"));
                    }
                }
                "ambient" => {
                    scene.ambient.color = parse_vec3(optional_text(&node, "color"), Vec3::ZERO)?;
                }
                "directional" => scene.directional_lights.push(DirectionalLight {
                    direction: parse_vec3(Some(required_text(&node, "direction")?), Vec3::ZERO)?,
                    color: parse_vec3(optional_text(&node, "color"), Vec3::ONE)?,
                }),
                "point" => {
                    let position = parse_vec3(optional_text(&node, "position"), Vec3::ZERO)?;
                    let radius = parse_f32(Some(required_text(&node, "radius")?), 0.0)?;
                    if !(radius.is_finite() && radius > 0.0) {
                        return Err(anyhow!("point light radius must be positive, got {radius}"));
                    }
                    scene.point_lights.push(PointLight {
                        position: position.extend(1.0),
                        color: parse_vec3(optional_text(&node, "color"), Vec3::ONE)?,
                        radius,
                    });
                }
                "torus" => {
                    let defaults = TorusDef::default();
                    scene.torus = TorusDef {
                        major_radius: parse_f32(
                            optional_text(&node, "major"),
                            defaults.major_radius,
                        )?,
                        minor_radius: parse_f32(
                            optional_text(&node, "minor"),
                            defaults.minor_radius,
                        )?,
                    };
                }
                other => return Err(anyhow!("unexpected <{other}> element in scene")),
            }
        }

        Ok(scene)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn ambient_light(&self) -> &AmbientLight {
        &self.ambient
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn point_light(&self, index: usize) -> &PointLight {
        assert!(
            index < self.point_lights.len(),
            "point light {index} out of range ({} defined)",
            self.point_lights.len()
        );
        &self.point_lights[index]
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn directional_light(&self, index: usize) -> &DirectionalLight {
        assert!(
            index < self.directional_lights.len(),
            "directional light {index} out of range ({} defined)",
            self.directional_lights.len()
        );
        &self.directional_lights[index]
    }

    pub fn try_point_light(&self, index: usize) -> Option<&PointLight> {
        self.point_lights.get(index)
    }

    pub fn try_directional_light(&self, index: usize) -> Option<&DirectionalLight> {
        self.directional_lights.get(index)
    }
}

fn default_position() -> Vec4 {
    Vec4::W
}

fn default_shininess() -> f32 {
    200.0
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        other => Err(anyhow!("vector needs 3 components, got {}", other.len())),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}
