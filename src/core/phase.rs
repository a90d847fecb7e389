// Copyright @yucwang 2026

use crate::math::constants::Float;

/// The part of a phase function a medium needs for density integration:
/// whether the extinction coefficient depends on the direction of travel
/// relative to the local particle orientation, and by how much.
pub trait PhaseFunction: Send + Sync {
    fn needs_directionally_varying_coefficients(&self) -> bool {
        false
    }

    /// Directional scaling of the extinction coefficient, given the cosine
    /// between the direction of travel and the particle orientation.
    fn sigma_dir(&self, _cos_theta: Float) -> Float {
        1.0
    }

    /// Maximum of `sigma_dir` over all cosines.
    fn sigma_dir_max(&self) -> Float {
        1.0
    }

    fn name(&self) -> &'static str;
}

pub struct IsotropicPhaseFunction;

impl PhaseFunction for IsotropicPhaseFunction {
    fn name(&self) -> &'static str {
        "isotropic"
    }
}

/// Thin fiber-like particles: the projected area seen along the direction
/// of travel is proportional to `sin(theta)`. `isotropic_weight` keeps a
/// fraction of the cross section direction independent, so that light
/// travelling exactly along the fibers is still attenuated.
pub struct KajiyaKayPhaseFunction {
    isotropic_weight: Float,
}

impl KajiyaKayPhaseFunction {
    pub fn new(isotropic_weight: Float) -> Self {
        Self { isotropic_weight: isotropic_weight.max(0.0).min(1.0) }
    }
}

impl Default for KajiyaKayPhaseFunction {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl PhaseFunction for KajiyaKayPhaseFunction {
    fn needs_directionally_varying_coefficients(&self) -> bool {
        true
    }

    fn sigma_dir(&self, cos_theta: Float) -> Float {
        let c = cos_theta.max(-1.0).min(1.0);
        let sin_theta = (1.0 - c * c).max(0.0).sqrt();
        self.isotropic_weight + (1.0 - self.isotropic_weight) * sin_theta
    }

    fn sigma_dir_max(&self) -> Float {
        1.0
    }

    fn name(&self) -> &'static str {
        "kajiyakay"
    }
}
