// Copyright 2020 @TwoCookingMice

use super::constants::{ Vector3f, Matrix4f };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix: matrix,
               inv_matrix: matrix.try_inverse().unwrap_or(Matrix4f::identity())}
    }

    /// `None` when `matrix` has no inverse.
    pub fn try_new(matrix: Matrix4f) -> Option<Self> {
        matrix.try_inverse().map(|inv_matrix| Self { matrix, inv_matrix })
    }

    pub fn translate(offset: Vector3f) -> Self {
        Self::new(Matrix4f::new_translation(&offset))
    }

    pub fn scale(s: Vector3f) -> Self {
        Self::new(Matrix4f::new_nonuniform_scaling(&s))
    }

    /// `self` applied after `inner`.
    pub fn compose(&self, inner: &Transform) -> Self {
        Self { matrix: self.matrix * inner.matrix,
               inv_matrix: inner.inv_matrix * self.inv_matrix }
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        Self::mul_point(&self.matrix, p)
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        Self::mul_vector(&self.matrix, v)
    }

    pub fn inv_apply_point(&self, p: Vector3f) -> Vector3f {
        Self::mul_point(&self.inv_matrix, p)
    }

    fn mul_point(m: &Matrix4f, p: Vector3f) -> Vector3f {
        let x = p[0] * m[(0, 0)] + p[1] * m[(0, 1)] + p[2] * m[(0, 2)] + m[(0, 3)];
        let y = p[0] * m[(1, 0)] + p[1] * m[(1, 1)] + p[2] * m[(1, 2)] + m[(1, 3)];
        let z = p[0] * m[(2, 0)] + p[1] * m[(2, 1)] + p[2] * m[(2, 2)] + m[(2, 3)];
        let w = p[0] * m[(3, 0)] + p[1] * m[(3, 1)] + p[2] * m[(3, 2)] + m[(3, 3)];

        Vector3f::new(x / w, y / w, z / w)
    }

    fn mul_vector(m: &Matrix4f, v: Vector3f) -> Vector3f {
        let x = v[0] * m[(0, 0)] + v[1] * m[(0, 1)] + v[2] * m[(0, 2)];
        let y = v[0] * m[(1, 0)] + v[1] * m[(1, 1)] + v[2] * m[(1, 2)];
        let z = v[0] * m[(2, 0)] + v[1] * m[(2, 1)] + v[2] * m[(2, 2)];

        Vector3f::new(x, y, z)
    }
}
