// Copyright @yucwang 2026

use crate::core::error::MediumError;
use crate::core::phase::PhaseFunction;
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use std::sync::Arc;

/// Relative slack applied to the bounding box test in lookups, so that the
/// clip points computed by the ray/box intersection (which can land a few
/// ulps outside the box) still see the density inside.
const BOUNDARY_SLACK: Float = 1e-9;

/// Extinction density seen by the integrators.
///
/// Combines a scalar density volume, the density multiplier, and (for
/// phase functions whose cross section depends on direction) a particle
/// orientation volume. Immutable once built; every lookup is a pure read.
pub struct DensityField {
    density: Arc<dyn Volume>,
    orientation: Option<Arc<dyn Volume>>,
    phase: Arc<dyn PhaseFunction>,
    multiplier: Float,
    bbox: AABB,
    margin: Float,
    anisotropic: bool,
    max_density: Float,
}

impl DensityField {
    pub fn new(
        density: Arc<dyn Volume>,
        orientation: Option<Arc<dyn Volume>>,
        phase: Arc<dyn PhaseFunction>,
        multiplier: Float,
    ) -> Result<Self, MediumError> {
        if !density.supports_float_lookups() {
            return Err(MediumError::UnsupportedLookup { role: "density", expected: "float" });
        }
        if !(multiplier >= 0.0) || !multiplier.is_finite() {
            return Err(MediumError::InvalidParameter(format!(
                "density multiplier must be finite and non-negative, got {}",
                multiplier
            )));
        }
        if let Some(orientation) = &orientation {
            if !orientation.supports_vector_lookups() {
                return Err(MediumError::UnsupportedLookup { role: "orientation", expected: "vector" });
            }
        }
        let anisotropic = phase.needs_directionally_varying_coefficients();
        if anisotropic && orientation.is_none() {
            return Err(MediumError::MissingOrientation);
        }
        let bbox = density.bbox().ok_or(MediumError::UnboundedDensity)?;

        let mut max_density = multiplier * density.maximum_float_value();
        if anisotropic {
            max_density *= phase.sigma_dir_max();
        }

        Ok(Self {
            margin: BOUNDARY_SLACK * (1.0 + bbox.max_abs_coordinate()),
            density,
            orientation,
            phase,
            multiplier,
            bbox,
            anisotropic,
            max_density,
        })
    }

    pub fn bbox(&self) -> AABB {
        self.bbox
    }

    pub fn is_anisotropic(&self) -> bool {
        self.anisotropic
    }

    /// Global upper bound on `effective_density`.
    pub fn maximum_density(&self) -> Float {
        self.max_density
    }

    pub fn multiplier(&self) -> Float {
        self.multiplier
    }

    /// Natural step size of the nested volumes (infinite when none has one).
    pub fn step_size_hint(&self) -> Float {
        let mut step = self.density.step_size();
        if let Some(orientation) = &self.orientation {
            step = step.min(orientation.step_size());
        }
        step
    }

    /// Raw density (without multiplier), zero outside the bounding box.
    pub fn lookup_scalar_density(&self, p: Vector3f) -> Float {
        if !self.bbox.contains(&p, self.margin) {
            return 0.0;
        }
        self.density.lookup_float(p).max(0.0)
    }

    /// Particle orientation, zero when unknown.
    pub fn lookup_vector(&self, p: Vector3f) -> Vector3f {
        match &self.orientation {
            Some(orientation) => orientation.lookup_vector(p),
            None => Vector3f::zeros(),
        }
    }

    /// Extinction at `p` for light travelling along `d`.
    ///
    /// Points without a defined orientation contribute nothing in an
    /// anisotropic medium.
    pub fn effective_density(&self, p: Vector3f, d: &Vector3f) -> Float {
        let density = self.lookup_scalar_density(p);
        if !self.anisotropic || density == 0.0 {
            return density * self.multiplier;
        }

        let orientation = self.lookup_vector(p);
        let norm = orientation.norm();
        if norm == 0.0 || !norm.is_finite() {
            return 0.0;
        }
        let d_norm = d.norm();
        if d_norm == 0.0 {
            return 0.0;
        }
        let cos_theta = d.dot(&orientation) / (norm * d_norm);
        density * self.multiplier * self.phase.sigma_dir(cos_theta)
    }
}
