// Copyright @yucwang 2026

use crate::core::error::MediumError;
use crate::core::medium::{Medium, MediumSamplingRecord};
use crate::core::rng::Sampler;
use crate::core::stats::TransportObserver;
use crate::math::aabb::AABB;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

/// Medium with constant coefficients, optionally confined to a box.
pub struct HomogeneousMedium {
    sigma_a: RGBSpectrum,
    sigma_s: RGBSpectrum,
    sigma_t: RGBSpectrum,
    scale: Float,
    bbox: Option<AABB>,
}

impl HomogeneousMedium {
    pub fn new(sigma_a: RGBSpectrum, sigma_s: RGBSpectrum) -> Result<Self, MediumError> {
        for c in 0..3 {
            if !(sigma_a[c] >= 0.0 && sigma_s[c] >= 0.0) || !(sigma_a[c] + sigma_s[c]).is_finite() {
                return Err(MediumError::InvalidParameter(format!(
                    "homogeneous medium coefficients must be finite and non-negative, got sigma_a={:?}, sigma_s={:?}",
                    sigma_a, sigma_s
                )));
            }
        }
        Ok(Self {
            sigma_a,
            sigma_s,
            sigma_t: sigma_a + sigma_s,
            scale: 1.0,
            bbox: None,
        })
    }

    pub fn with_scale(mut self, scale: Float) -> Result<Self, MediumError> {
        if !(scale >= 0.0) || !scale.is_finite() {
            return Err(MediumError::InvalidParameter(format!("scale must be finite and non-negative, got {}", scale)));
        }
        self.scale = scale;
        Ok(self)
    }

    pub fn with_bbox(mut self, bbox: Option<AABB>) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn sigma_a(&self) -> RGBSpectrum {
        self.sigma_a * self.scale
    }

    pub fn sigma_s(&self) -> RGBSpectrum {
        self.sigma_s * self.scale
    }

    pub fn sigma_t(&self) -> RGBSpectrum {
        self.sigma_t * self.scale
    }

    fn segment(&self, ray: &Ray3f) -> Option<(Float, Float)> {
        match &self.bbox {
            Some(bbox) => bbox.ray_intersect_range(ray),
            None if ray.max_t >= ray.min_t => Some((ray.min_t, ray.max_t)),
            None => None,
        }
    }

    fn transmittance_over(&self, distance: Float) -> RGBSpectrum {
        if distance <= 0.0 {
            return RGBSpectrum::from_value(1.0);
        }
        let sigma_t = self.sigma_t();
        let mut tr = RGBSpectrum::default();
        for c in 0..3 {
            // Avoids 0 * inf on transparent channels of infinite rays.
            tr[c] = if sigma_t[c] == 0.0 { 1.0 } else { (-sigma_t[c] * distance).exp() };
        }
        tr
    }
}

impl Medium for HomogeneousMedium {
    fn sample_distance_observed(
        &self,
        ray: &Ray3f,
        sampler: &mut dyn Sampler,
        _observer: &mut dyn TransportObserver,
    ) -> (bool, MediumSamplingRecord) {
        let mut rec = MediumSamplingRecord::default();
        let (mint, maxt) = match self.segment(ray) {
            Some(segment) => segment,
            None => return (false, rec),
        };
        let sigma_t = self.sigma_t();

        let channel = ((sampler.next_1d() * 3.0) as usize).min(2);
        let u = sampler.next_1d();
        let sampled = if sigma_t[channel] > 0.0 {
            -(1.0 - u).ln() / sigma_t[channel]
        } else {
            std::f64::INFINITY
        };

        let distance = maxt - mint;
        let success = sampled < distance;
        let travelled = if success { sampled } else { distance };

        let tr = self.transmittance_over(travelled);
        rec.transmittance = tr;
        rec.pdf_failure = tr.average();
        rec.pdf_success = (sigma_t * tr).average();
        rec.pdf_success_rev = rec.pdf_success;

        if success {
            rec.t = mint + sampled;
            rec.p = ray.at(rec.t);
            rec.sigma_a = self.sigma_a();
            rec.sigma_s = self.sigma_s();
            let mut albedo: Float = 0.0;
            for c in 0..3 {
                if sigma_t[c] > 0.0 {
                    albedo = albedo.max(rec.sigma_s[c] / sigma_t[c]);
                }
            }
            rec.albedo = albedo;
        }
        (success && rec.pdf_success > 0.0, rec)
    }

    fn transmittance_observed(
        &self,
        ray: &Ray3f,
        _sampler: Option<&mut dyn Sampler>,
        _observer: &mut dyn TransportObserver,
    ) -> RGBSpectrum {
        match self.segment(ray) {
            Some((mint, maxt)) => self.transmittance_over(maxt - mint),
            None => RGBSpectrum::from_value(1.0),
        }
    }

    fn pdf_distance(&self, ray: &Ray3f) -> Result<MediumSamplingRecord, MediumError> {
        let mut rec = MediumSamplingRecord::default();
        let tr = self.transmittance(ray, None);
        rec.transmittance = tr;
        rec.pdf_failure = tr.average();
        rec.pdf_success = (self.sigma_t() * tr).average();
        rec.pdf_success_rev = rec.pdf_success;
        Ok(rec)
    }

    fn is_homogeneous(&self) -> bool {
        true
    }

    fn bbox(&self) -> Option<AABB> {
        self.bbox
    }
}
