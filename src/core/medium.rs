// Copyright @yucwang 2026

use crate::core::error::MediumError;
use crate::core::rng::Sampler;
use crate::core::stats::{NoStats, TransportObserver};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

/// Result of sampling (or evaluating) a distance along a ray segment.
///
/// `t`, `p`, the coefficients and `orientation` are only meaningful when
/// the sampling call reported success. The transmittance and the three
/// densities are always filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediumSamplingRecord {
    pub t: Float,
    pub p: Vector3f,
    pub sigma_a: RGBSpectrum,
    pub sigma_s: RGBSpectrum,
    /// Largest channel of the single-scattering albedo.
    pub albedo: Float,
    pub orientation: Vector3f,
    pub transmittance: RGBSpectrum,
    /// Probability of passing the whole segment without an interaction.
    pub pdf_failure: Float,
    /// Density of interacting at `t` when travelling forward.
    pub pdf_success: Float,
    /// Same density for the reversed path (interaction at `min_t`).
    pub pdf_success_rev: Float,
}

impl Default for MediumSamplingRecord {
    fn default() -> Self {
        Self {
            t: 0.0,
            p: Vector3f::zeros(),
            sigma_a: RGBSpectrum::default(),
            sigma_s: RGBSpectrum::default(),
            albedo: 0.0,
            orientation: Vector3f::zeros(),
            transmittance: RGBSpectrum::from_value(1.0),
            pdf_failure: 1.0,
            pdf_success: 0.0,
            pdf_success_rev: 0.0,
        }
    }
}

impl MediumSamplingRecord {
    pub fn sigma_t(&self) -> RGBSpectrum {
        self.sigma_a + self.sigma_s
    }
}

pub trait Medium: Send + Sync {
    /// Sample a free-flight distance along `ray`. Returns `true` when an
    /// interaction inside `[ray.min_t, ray.max_t]` was found.
    fn sample_distance_observed(
        &self,
        ray: &Ray3f,
        sampler: &mut dyn Sampler,
        observer: &mut dyn TransportObserver,
    ) -> (bool, MediumSamplingRecord);

    /// Transmittance along the whole ray segment. Stochastic estimators
    /// fall back to a deterministic answer when no sampler is given.
    fn transmittance_observed(
        &self,
        ray: &Ray3f,
        sampler: Option<&mut dyn Sampler>,
        observer: &mut dyn TransportObserver,
    ) -> RGBSpectrum;

    /// Densities of the segment `[ray.min_t, ray.max_t]` without drawing a
    /// new sample: `pdf_success` refers to an interaction at `max_t`.
    fn pdf_distance(&self, ray: &Ray3f) -> Result<MediumSamplingRecord, MediumError>;

    fn is_homogeneous(&self) -> bool;

    fn bbox(&self) -> Option<AABB> {
        None
    }

    fn sample_distance(&self, ray: &Ray3f, sampler: &mut dyn Sampler) -> (bool, MediumSamplingRecord) {
        self.sample_distance_observed(ray, sampler, &mut NoStats)
    }

    fn transmittance(&self, ray: &Ray3f, sampler: Option<&mut dyn Sampler>) -> RGBSpectrum {
        self.transmittance_observed(ray, sampler, &mut NoStats)
    }
}
