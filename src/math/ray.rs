// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

/// A ray segment `origin + t * dir` restricted to `[min_t, max_t]`.
///
/// The direction is stored as given. Every parametric distance along the ray
/// (and therefore every optical depth integrated over it) is measured in
/// units of `dir`, so callers that want metric distances should pass a unit
/// direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f,
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Self { origin: o, dir: d,
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(std::f64::INFINITY)}
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn with_range(&self, min_t: Float, max_t: Float) -> Self {
        Self { origin: self.origin, dir: self.dir, min_t, max_t }
    }
}

/* Tests for Ray */
