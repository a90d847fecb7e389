// Copyright @yucwang 2026

//! Delta (Woodcock) tracking against a global density majorant.

use crate::core::rng::Sampler;
use crate::core::stats::TransportObserver;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::media::clip_segment;
use crate::media::density_field::DensityField;

/// A real collision found by delta tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeFlight {
    pub t: Float,
    /// Effective density at `t`.
    pub density: Float,
}

pub struct WoodcockTracker {
    inv_max_density: Float,
}

impl WoodcockTracker {
    /// A zero (or non-finite) majorant never collides.
    pub fn new(max_density: Float) -> Self {
        let inv_max_density = if max_density > 0.0 && max_density.is_finite() {
            1.0 / max_density
        } else {
            0.0
        };
        Self { inv_max_density }
    }

    pub fn inv_max_density(&self) -> Float {
        self.inv_max_density
    }

    /// Distance to the first real collision, `None` when the ray leaves the
    /// segment first.
    pub fn sample_free_flight(
        &self,
        field: &DensityField,
        ray: &Ray3f,
        sampler: &mut dyn Sampler,
        observer: &mut dyn TransportObserver,
    ) -> Option<FreeFlight> {
        let (mint, maxt) = clip_segment(field, ray)?;
        if self.inv_max_density == 0.0 {
            return None;
        }

        let d = ray.dir();
        let mut t = mint;
        let mut lookups = 0u64;
        let flight = loop {
            t -= (1.0 - sampler.next_1d()).ln() * self.inv_max_density;
            if t >= maxt {
                break None;
            }
            let density = field.effective_density(ray.at(t), &d);
            lookups += 1;
            if density * self.inv_max_density > sampler.next_1d() {
                break Some(FreeFlight { t, density });
            }
        };
        observer.sampling_marching_steps(lookups);
        flight
    }

    /// Fraction of `trials` delta-tracking walks that cross the segment
    /// without a collision.
    pub fn estimate_transmittance(
        &self,
        field: &DensityField,
        ray: &Ray3f,
        sampler: &mut dyn Sampler,
        trials: usize,
        observer: &mut dyn TransportObserver,
    ) -> Float {
        let (mint, maxt) = match clip_segment(field, ray) {
            Some(segment) => segment,
            None => return 1.0,
        };
        if self.inv_max_density == 0.0 || trials == 0 {
            return 1.0;
        }

        let d = ray.dir();
        let mut lookups = 0u64;
        let mut passed = 0usize;
        for _ in 0..trials {
            let mut t = mint;
            loop {
                t -= (1.0 - sampler.next_1d()).ln() * self.inv_max_density;
                if t >= maxt {
                    passed += 1;
                    break;
                }
                let density = field.effective_density(ray.at(t), &d);
                lookups += 1;
                if density * self.inv_max_density > sampler.next_1d() {
                    break;
                }
            }
        }
        observer.transmittance_marching_steps(lookups);
        passed as Float / trials as Float
    }
}
