use std::collections::BTreeMap;
use std::fmt;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Value accepted by a [`UniformSink`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    Bool(bool),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:.2}"),
            Self::Vec3(v) => write!(f, "({:.2}, {:.2}, {:.2})", v.x, v.y, v.z),
            Self::Vec4(v) => write!(f, "({:.2}, {:.2}, {:.2}, {:.2})", v.x, v.y, v.z, v.w),
        }
    }
}

/// Name-keyed destination for shader constants.
pub trait UniformSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialField {
    Diffuse,
    Specular,
    SpecularExponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionalField {
    Direction,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointField {
    Position,
    Color,
    Radius,
}

/// A uniform slot declared by the Phong shader.
///
/// [`UniformPath::name`] and [`UniformPath::parse`] are inverses, so every
/// sink agrees with the shader on field paths such as `pointlights[2].pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformPath {
    UseLighting,
    Material(MaterialField),
    AmbientColor,
    Directional { index: usize, field: DirectionalField },
    Point { index: usize, field: PointField },
}

impl UniformPath {
    pub fn name(&self) -> String {
        match self {
            Self::UseLighting => "uUseLighting".to_string(),
            Self::Material(field) => format!(
                "material.{}",
                match field {
                    MaterialField::Diffuse => "diff",
                    MaterialField::Specular => "spec",
                    MaterialField::SpecularExponent => "spec_exp",
                }
            ),
            Self::AmbientColor => "ambientlight.col".to_string(),
            Self::Directional { index, field } => format!(
                "directlights[{index}].{}",
                match field {
                    DirectionalField::Direction => "dir",
                    DirectionalField::Color => "col",
                }
            ),
            Self::Point { index, field } => format!(
                "pointlights[{index}].{}",
                match field {
                    PointField::Position => "pos",
                    PointField::Color => "col",
                    PointField::Radius => "rad",
                }
            ),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "uUseLighting" => return Some(Self::UseLighting),
            "ambientlight.col" => return Some(Self::AmbientColor),
            _ => {}
        }
        if let Some(field) = name.strip_prefix("material.") {
            let field = match field {
                "diff" => MaterialField::Diffuse,
                "spec" => MaterialField::Specular,
                "spec_exp" => MaterialField::SpecularExponent,
                _ => return None,
            };
            return Some(Self::Material(field));
        }

        let (array, rest) = name.split_once('[')?;
        let (raw, field) = rest.split_once("].")?;
        let index = raw.parse::<usize>().ok()?;
        if index.to_string() != raw {
            return None;
        }
        match array {
            "directlights" => {
                let field = match field {
                    "dir" => DirectionalField::Direction,
                    "col" => DirectionalField::Color,
                    _ => return None,
                };
                Some(Self::Directional { index, field })
            }
            "pointlights" => {
                let field = match field {
                    "pos" => PointField::Position,
                    "col" => PointField::Color,
                    "rad" => PointField::Radius,
                    _ => return None,
                };
                Some(Self::Point { index, field })
            }
            _ => None,
        }
    }
}

impl fmt::Display for UniformPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Sink that keeps the last value written under each name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedUniforms {
    values: BTreeMap<String, UniformValue>,
}

impl RecordedUniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn path(&self, path: UniformPath) -> Option<UniformValue> {
        self.get(&path.name())
    }

    /// Iterates the recorded uniforms in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl UniformSink for RecordedUniforms {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_string(), value);
    }
}
