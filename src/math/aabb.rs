// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f,
                       FLOAT_MIN, FLOAT_MAX };
use super::ray::{ Ray3f };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f
}

impl Default for AABB {
    fn default() -> Self {
        Self { p_min: Vector3f::new(FLOAT_MAX, FLOAT_MAX, FLOAT_MAX),
               p_max: Vector3f::new(FLOAT_MIN, FLOAT_MIN, FLOAT_MIN) }
    }
}

impl AABB {
    pub fn new(p_min: Vector3f, p_max: Vector3f) -> Self {
        let mut min = Vector3f::zeros();
        let mut max = Vector3f::zeros();
        for idx in 0..3 {
            min[idx] = p_min[idx].min(p_max[idx]);
            max[idx] = p_max[idx].max(p_min[idx]);
        }
        Self { p_min: min, p_max: max }
    }

    pub fn expand_by_point(&mut self, p: &Vector3f) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(p[idx]);
            self.p_max[idx] = self.p_max[idx].max(p[idx]);
        }
    }

    /// Whether `p` lies inside the box grown by `margin` on every side.
    pub fn contains(&self, p: &Vector3f, margin: Float) -> bool {
        (0..3).all(|idx| {
            p[idx] >= self.p_min[idx] - margin && p[idx] <= self.p_max[idx] + margin
        })
    }

    /// Parametric overlap of the ray with the box, already clipped against
    /// `[ray.min_t, ray.max_t]`.
    pub fn ray_intersect_range(&self, ray: &Ray3f) -> Option<(Float, Float)> {
        if !self.is_valid() {
            return None;
        }

        let o = ray.origin();
        let d = ray.dir();
        let mut t_min = ray.min_t;
        let mut t_max = ray.max_t;

        for idx in 0..3 {
            let dir = d[idx];
            if dir == 0.0 {
                if o[idx] < self.p_min[idx] || o[idx] > self.p_max[idx] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (self.p_min[idx] - o[idx]) * inv;
            let mut t1 = (self.p_max[idx] - o[idx]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return None;
            }
        }

        Some((t_min, t_max))
    }

    pub fn diagnal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    /// Largest absolute coordinate over both corners.
    pub fn max_abs_coordinate(&self) -> Float {
        self.p_min.amax().max(self.p_max.amax())
    }

    pub fn is_valid(&self) -> bool {
        (0..3).all(|idx| self.p_min[idx] <= self.p_max[idx])
    }
}

/* Test for AABB */
