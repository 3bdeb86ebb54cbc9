use glam::{Mat3, Mat4, Vec3, Vec4};
use thiserror::Error;

/// Invalid inputs rejected by the transform helpers.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MathError {
    #[error("cannot normalize a zero-length vector")]
    ZeroLength,
    #[error("matrix must have 9 or 16 elements, got {0}")]
    UnsupportedMatrix(usize),
    #[error("vector must have 2, 3 or 4 components, got {0}")]
    UnsupportedVector(usize),
    #[error("model-view matrix is singular")]
    SingularMatrix,
    #[error("transform produced a non-finite result")]
    NonFinite,
}

/// Matrix accepted by [`transform`].
///
/// `Affine` applies rotation, scale, translation and the perspective row to a
/// homogeneous point. `Linear` applies rotation and scale only, which is what
/// directions and normals need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformMatrix {
    Affine(Mat4),
    Linear(Mat3),
}

impl TransformMatrix {
    /// Builds a matrix from column-major elements: 16 for a 4x4, 9 for a 3x3.
    pub fn from_column_major(elements: &[f32]) -> Result<Self, MathError> {
        match elements.len() {
            16 => {
                let mut cols = [0.0; 16];
                cols.copy_from_slice(elements);
                Ok(Self::Affine(Mat4::from_cols_array(&cols)))
            }
            9 => {
                let mut cols = [0.0; 9];
                cols.copy_from_slice(elements);
                Ok(Self::Linear(Mat3::from_cols_array(&cols)))
            }
            len => Err(MathError::UnsupportedMatrix(len)),
        }
    }
}

impl From<Mat4> for TransformMatrix {
    fn from(matrix: Mat4) -> Self {
        Self::Affine(matrix)
    }
}

impl From<Mat3> for TransformMatrix {
    fn from(matrix: Mat3) -> Self {
        Self::Linear(matrix)
    }
}

/// Result of [`transform`]; the variant follows the matrix size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transformed {
    Point(Vec4),
    Direction(Vec3),
}

impl Transformed {
    /// Drops the homogeneous component if there is one.
    pub fn truncate(self) -> Vec3 {
        match self {
            Self::Point(point) => point.truncate(),
            Self::Direction(direction) => direction,
        }
    }

    pub fn to_vec(self) -> Vec<f32> {
        match self {
            Self::Point(point) => point.to_array().to_vec(),
            Self::Direction(direction) => direction.to_array().to_vec(),
        }
    }
}

/// Converts loose components into the homogeneous tuple used by [`transform`].
///
/// A missing `z` becomes 0 and a missing `w` becomes 1.
pub fn to_homogeneous(components: &[f32]) -> Result<Vec4, MathError> {
    match *components {
        [x, y] => Ok(Vec4::new(x, y, 0.0, 1.0)),
        [x, y, z] => Ok(Vec4::new(x, y, z, 1.0)),
        [x, y, z, w] => Ok(Vec4::new(x, y, z, w)),
        _ => Err(MathError::UnsupportedVector(components.len())),
    }
}

/// Transforms `vector` by `matrix`. A 3x3 matrix ignores `w`.
pub fn transform(matrix: &TransformMatrix, vector: Vec4) -> Transformed {
    match matrix {
        TransformMatrix::Affine(m) => Transformed::Point(*m * vector),
        TransformMatrix::Linear(m) => Transformed::Direction(*m * vector.truncate()),
    }
}

/// Slice front end for [`transform`].
pub fn transform_slice(matrix: &[f32], vector: &[f32]) -> Result<Transformed, MathError> {
    let matrix = TransformMatrix::from_column_major(matrix)?;
    let vector = to_homogeneous(vector)?;
    Ok(transform(&matrix, vector))
}

pub fn normalize(vector: Vec3) -> Result<Vec3, MathError> {
    if !vector.is_finite() {
        return Err(MathError::NonFinite);
    }
    let largest = vector.abs().max_element();
    if largest == 0.0 {
        return Err(MathError::ZeroLength);
    }
    // prescaled so the squared length stays representable
    (vector / largest)
        .try_normalize()
        .ok_or(MathError::ZeroLength)
}

/// Inverse-transpose of the upper-left 3x3 of `model_view`.
///
/// The matrix is brought to unit scale before inverting, so a tiny uniform
/// scale is still invertible. Only an exactly zero determinant is singular.
pub fn normal_matrix(model_view: &Mat4) -> Result<Mat3, MathError> {
    let linear = Mat3::from_mat4(*model_view);
    if !linear.is_finite() {
        return Err(MathError::NonFinite);
    }
    let scale = linear
        .to_cols_array()
        .into_iter()
        .map(f32::abs)
        .fold(0.0, f32::max);
    if scale == 0.0 {
        return Err(MathError::SingularMatrix);
    }
    let unit = scale_columns(&linear, scale);
    if unit.determinant() == 0.0 {
        return Err(MathError::SingularMatrix);
    }
    // inverse(s * M) = inverse(M) / s
    let normal = scale_columns(&unit.inverse().transpose(), scale);
    if normal.is_finite() {
        Ok(normal)
    } else {
        Err(MathError::NonFinite)
    }
}

fn scale_columns(matrix: &Mat3, divisor: f32) -> Mat3 {
    Mat3::from_cols(
        matrix.x_axis / divisor,
        matrix.y_axis / divisor,
        matrix.z_axis / divisor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_3;

    const EPS: f32 = 1e-5;

    fn rotation() -> Mat4 {
        Mat4::from_rotation_y(FRAC_PI_3) * Mat4::from_rotation_x(0.4)
    }

    #[test]
    fn normalize_produces_unit_length() {
        for v in [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(3.0, 4.0, 12.0),
            Vec3::new(1e-3, 0.0, -2e-3),
            Vec3::new(-250.0, 1000.0, 7.5),
        ] {
            let n = normalize(v).unwrap();
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn normalize_rejects_zero_vector() {
        assert_eq!(normalize(Vec3::ZERO), Err(MathError::ZeroLength));
    }

    #[test]
    fn identity_4x4_preserves_points() {
        let identity = TransformMatrix::Affine(Mat4::IDENTITY);
        let v = Vec4::new(1.5, -2.0, 3.25, 1.0);
        assert_eq!(transform(&identity, v), Transformed::Point(v));

        let three = transform_slice(&Mat4::IDENTITY.to_cols_array(), &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(three, Transformed::Point(Vec4::new(4.0, 5.0, 6.0, 1.0)));
    }

    #[test]
    fn identity_3x3_preserves_directions() {
        let identity = TransformMatrix::Linear(Mat3::IDENTITY);
        let v = Vec3::new(-0.3, 0.9, 2.0);
        assert_eq!(
            transform(&identity, v.extend(0.0)),
            Transformed::Direction(v)
        );
    }

    #[test]
    fn direction_transform_ignores_translation() {
        let rotation = rotation();
        let moved = Mat4::from_translation(Vec3::new(40.0, -7.0, 300.0)) * rotation;
        let direction = Vec3::new(0.2, -1.0, 0.5);

        let linear = transform(&Mat3::from_mat4(moved).into(), direction.extend(0.0)).truncate();
        let expected = transform(&Mat3::from_mat4(rotation).into(), direction.extend(0.0));
        assert!(linear.abs_diff_eq(expected.truncate(), EPS));

        // w = 0 through the 4x4 has the same effect
        let affine = transform(&moved.into(), direction.extend(0.0)).truncate();
        assert!(affine.abs_diff_eq(linear, EPS));
    }

    #[test]
    fn composed_transform_matches_sequential_application() {
        let first = Mat4::from_translation(Vec3::new(0.0, 180.0, 0.0));
        let second = rotation() * Mat4::from_scale(Vec3::new(2.0, 1.0, 0.5));
        let point = Vec4::new(3.0, -1.0, 10.0, 1.0);

        let Transformed::Point(step) = transform(&first.into(), point) else {
            panic!("4x4 must yield a point");
        };
        let sequential = transform(&second.into(), step).truncate();
        let composed = transform(&(second * first).into(), point).truncate();
        assert!(sequential.abs_diff_eq(composed, 1e-3));
    }

    #[test]
    fn sixteen_and_nine_element_rotations_agree() {
        let rotation = rotation();
        let m4 = rotation.to_cols_array();
        let m3 = Mat3::from_mat4(rotation).to_cols_array();
        let direction = [0.0, 0.6, -0.8];

        let from_m4 = transform_slice(&m4, &[0.0, 0.6, -0.8, 0.0]).unwrap();
        let from_m3 = transform_slice(&m3, &direction).unwrap();
        assert_eq!(from_m3.to_vec().len(), 3);
        assert_eq!(from_m4.to_vec().len(), 4);
        assert!(from_m4.truncate().abs_diff_eq(from_m3.truncate(), EPS));
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        assert_eq!(
            transform_slice(&[1.0; 12], &[0.0, 0.0, 0.0]),
            Err(MathError::UnsupportedMatrix(12))
        );
        assert_eq!(
            transform_slice(&Mat3::IDENTITY.to_cols_array(), &[1.0]),
            Err(MathError::UnsupportedVector(1))
        );
        assert_eq!(
            to_homogeneous(&[1.0, 2.0]),
            Ok(Vec4::new(1.0, 2.0, 0.0, 1.0))
        );
    }

    #[test]
    fn normal_matrix_corrects_non_uniform_scale() {
        let model_view = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let normal = normal_matrix(&model_view).unwrap();
        let transformed = normal * Vec3::new(1.0, 1.0, 0.0);
        assert!(transformed.abs_diff_eq(Vec3::new(0.25, 1.0, 0.0), EPS));
    }

    #[test]
    fn normalize_handles_extreme_magnitudes() {
        for v in [
            Vec3::new(1e20, 0.0, 0.0),
            Vec3::new(1e-25, 0.0, 0.0),
            Vec3::new(-3e19, -3e19, 0.0),
            Vec3::new(1e-40, 0.0, 1e-40),
        ] {
            let n = normalize(v).unwrap();
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
        assert!(normalize(Vec3::new(1e20, 0.0, 0.0))
            .unwrap()
            .abs_diff_eq(Vec3::X, EPS));
    }

    #[test]
    fn normalize_rejects_non_finite_vector() {
        assert_eq!(
            normalize(Vec3::new(f32::INFINITY, 0.0, 0.0)),
            Err(MathError::NonFinite)
        );
        assert_eq!(
            normalize(Vec3::new(f32::NAN, 1.0, 0.0)),
            Err(MathError::NonFinite)
        );
    }

    #[test]
    fn normal_matrix_accepts_tiny_uniform_scale() {
        let model_view = Mat4::from_scale(Vec3::splat(1e-13));
        let normal = normal_matrix(&model_view).unwrap();
        let direction = normalize(normal * Vec3::new(0.0, 0.6, -0.8)).unwrap();
        assert!(direction.abs_diff_eq(Vec3::new(0.0, 0.6, -0.8), EPS));
    }

    #[test]
    fn normal_matrix_rejects_singular_input() {
        let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(&flat), Err(MathError::SingularMatrix));
        assert_eq!(normal_matrix(&Mat4::ZERO), Err(MathError::SingularMatrix));
    }
}
