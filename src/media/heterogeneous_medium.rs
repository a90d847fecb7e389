// Copyright @yucwang 2026

use crate::core::error::MediumError;
use crate::core::medium::{Medium, MediumSamplingRecord};
use crate::core::phase::{IsotropicPhaseFunction, PhaseFunction};
use crate::core::rng::Sampler;
use crate::core::stats::{NoStats, TransportObserver};
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use crate::media::density_field::DensityField;
use crate::media::simpson::SimpsonQuadrature;
use crate::media::woodcock::WoodcockTracker;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Binary trials averaged by one stochastic transmittance estimate.
pub const DEFAULT_TRANSMITTANCE_SAMPLES: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrationMethod {
    /// Deterministic quadrature with Newton-Bisection inversion.
    Simpson,
    /// Unbiased delta tracking.
    Woodcock,
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::Woodcock
    }
}

impl FromStr for IntegrationMethod {
    type Err = MediumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simpson" => Ok(IntegrationMethod::Simpson),
            "woodcock" => Ok(IntegrationMethod::Woodcock),
            _ => Err(MediumError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationMethod::Simpson => write!(f, "simpson"),
            IntegrationMethod::Woodcock => write!(f, "woodcock"),
        }
    }
}

pub struct HeterogeneousMediumBuilder {
    density: Option<Arc<dyn Volume>>,
    albedo: Option<Arc<dyn Volume>>,
    orientation: Option<Arc<dyn Volume>>,
    phase: Arc<dyn PhaseFunction>,
    method: IntegrationMethod,
    step_size: Float,
    density_multiplier: Float,
    transmittance_samples: usize,
}

impl HeterogeneousMediumBuilder {
    pub fn new() -> Self {
        Self {
            density: None,
            albedo: None,
            orientation: None,
            phase: Arc::new(IsotropicPhaseFunction),
            method: IntegrationMethod::default(),
            step_size: 0.0,
            density_multiplier: 1.0,
            transmittance_samples: DEFAULT_TRANSMITTANCE_SAMPLES,
        }
    }

    pub fn with_density(mut self, volume: Arc<dyn Volume>) -> Self {
        self.density = Some(volume);
        self
    }

    pub fn with_albedo(mut self, volume: Arc<dyn Volume>) -> Self {
        self.albedo = Some(volume);
        self
    }

    pub fn with_orientation(mut self, volume: Arc<dyn Volume>) -> Self {
        self.orientation = Some(volume);
        self
    }

    pub fn with_phase_function(mut self, phase: Arc<dyn PhaseFunction>) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    /// Zero selects the smallest step size reported by the volumes.
    pub fn with_step_size(mut self, step_size: Float) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_density_multiplier(mut self, multiplier: Float) -> Self {
        self.density_multiplier = multiplier;
        self
    }

    pub fn with_transmittance_samples(mut self, samples: usize) -> Self {
        self.transmittance_samples = samples;
        self
    }

    pub fn build(self) -> Result<HeterogeneousMedium, MediumError> {
        let density = self.density.ok_or(MediumError::MissingVolume("density"))?;
        let albedo = self.albedo.ok_or(MediumError::MissingVolume("albedo"))?;
        if !albedo.supports_spectrum_lookups() {
            return Err(MediumError::UnsupportedLookup { role: "albedo", expected: "spectrum" });
        }
        if self.transmittance_samples == 0 {
            return Err(MediumError::InvalidParameter(
                "transmittance_samples must be at least 1".to_string(),
            ));
        }
        if !(self.step_size >= 0.0) {
            return Err(MediumError::InvalidParameter(format!(
                "step size must be non-negative, got {}",
                self.step_size
            )));
        }

        let field = DensityField::new(density, self.orientation, self.phase.clone(), self.density_multiplier)?;

        let mut step_size = self.step_size;
        if step_size == 0.0 {
            step_size = field.step_size_hint().min(albedo.step_size());
            if step_size.is_infinite() {
                return Err(MediumError::UnresolvedStepSize);
            }
        }
        let quadrature = SimpsonQuadrature::new(step_size)?;
        let tracker = WoodcockTracker::new(field.maximum_density());

        log::debug!(
            "Heterogeneous medium: method={}, step_size={}, phase={}, max_density={}, multiplier={}",
            self.method,
            step_size,
            self.phase.name(),
            field.maximum_density(),
            field.multiplier()
        );

        Ok(HeterogeneousMedium {
            field,
            albedo,
            phase: self.phase,
            method: self.method,
            quadrature,
            tracker,
            transmittance_samples: self.transmittance_samples,
        })
    }
}

impl Default for HeterogeneousMediumBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Participating medium whose extinction varies in space.
///
/// The density is given by a scalar volume (optionally scaled by the
/// particle orientation for anisotropic phase functions) and integrated
/// either deterministically or by delta tracking. All queries take `&self`
/// and can run from any number of threads.
pub struct HeterogeneousMedium {
    field: DensityField,
    albedo: Arc<dyn Volume>,
    phase: Arc<dyn PhaseFunction>,
    method: IntegrationMethod,
    quadrature: SimpsonQuadrature,
    tracker: WoodcockTracker,
    transmittance_samples: usize,
}

impl HeterogeneousMedium {
    pub fn builder() -> HeterogeneousMediumBuilder {
        HeterogeneousMediumBuilder::new()
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    pub fn step_size(&self) -> Float {
        self.quadrature.step_size()
    }

    pub fn transmittance_samples(&self) -> usize {
        self.transmittance_samples
    }

    pub fn phase_function(&self) -> &Arc<dyn PhaseFunction> {
        &self.phase
    }

    pub fn density_field(&self) -> &DensityField {
        &self.field
    }

    /// Deterministic optical depth of the segment, whatever the sampling
    /// strategy.
    pub fn optical_depth(&self, ray: &Ray3f) -> Float {
        self.quadrature.integrate_density(&self.field, ray, &mut NoStats)
    }

    fn fill_interaction(&self, rec: &mut MediumSamplingRecord, ray: &Ray3f, t: Float, density: Float) {
        rec.t = t;
        rec.p = ray.at(t);
        let albedo = self.albedo.lookup_spectrum(rec.p).clamp(0.0, 1.0);
        rec.sigma_s = albedo * density;
        rec.sigma_a = RGBSpectrum::from_value(density) - rec.sigma_s;
        rec.albedo = albedo.max_value();
        rec.orientation = self.field.lookup_vector(rec.p);
    }
}

impl Medium for HeterogeneousMedium {
    fn sample_distance_observed(
        &self,
        ray: &Ray3f,
        sampler: &mut dyn Sampler,
        observer: &mut dyn TransportObserver,
    ) -> (bool, MediumSamplingRecord) {
        let mut rec = MediumSamplingRecord::default();
        let success = match self.method {
            IntegrationMethod::Simpson => {
                let desired = -(1.0 - sampler.next_1d()).ln();
                let inversion = self.quadrature.invert_density_integral(&self.field, ray, desired, observer);
                let exp_val = (-inversion.integrated_density).exp();

                rec.pdf_failure = exp_val;
                rec.pdf_success = exp_val * inversion.density_at_t;
                rec.pdf_success_rev = exp_val * inversion.density_at_min_t;
                rec.transmittance = RGBSpectrum::from_value(exp_val);

                if inversion.found {
                    self.fill_interaction(&mut rec, ray, inversion.t, inversion.density_at_t);
                }
                inversion.found
            }
            IntegrationMethod::Woodcock => {
                rec.pdf_failure = 1.0;
                rec.pdf_success = 1.0;
                rec.pdf_success_rev = 1.0;
                rec.transmittance = RGBSpectrum::from_value(1.0);

                match self.tracker.sample_free_flight(&self.field, ray, sampler, observer) {
                    Some(flight) => {
                        self.fill_interaction(&mut rec, ray, flight.t, flight.density);
                        rec.transmittance = RGBSpectrum::from_value(1.0 / flight.density);
                        true
                    }
                    None => false,
                }
            }
        };
        (success && rec.pdf_success > 0.0, rec)
    }

    fn transmittance_observed(
        &self,
        ray: &Ray3f,
        sampler: Option<&mut dyn Sampler>,
        observer: &mut dyn TransportObserver,
    ) -> RGBSpectrum {
        match (self.method, sampler) {
            (IntegrationMethod::Woodcock, Some(sampler)) => RGBSpectrum::from_value(self.tracker.estimate_transmittance(
                &self.field,
                ray,
                sampler,
                self.transmittance_samples,
                observer,
            )),
            _ => {
                let depth = self.quadrature.integrate_density(&self.field, ray, observer);
                RGBSpectrum::from_value((-depth).exp())
            }
        }
    }

    fn pdf_distance(&self, ray: &Ray3f) -> Result<MediumSamplingRecord, MediumError> {
        if self.method == IntegrationMethod::Woodcock {
            return Err(MediumError::UnsupportedOperation("pdf_distance"));
        }
        let d = ray.dir();
        let exp_val = (-self.optical_depth(ray)).exp();
        let mut rec = MediumSamplingRecord::default();
        rec.transmittance = RGBSpectrum::from_value(exp_val);
        rec.pdf_failure = exp_val;
        rec.pdf_success = exp_val * self.field.effective_density(ray.at(ray.max_t), &d);
        rec.pdf_success_rev = exp_val * self.field.effective_density(ray.at(ray.min_t), &d);
        Ok(rec)
    }

    fn is_homogeneous(&self) -> bool {
        false
    }

    fn bbox(&self) -> Option<AABB> {
        Some(self.field.bbox())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::KajiyaKayPhaseFunction;
    use crate::core::rng::LcgRng;
    use crate::core::stats::TransportStats;
    use crate::math::constants::Vector3f;
    use crate::volumes::const_volume::ConstantVolume;
    use crate::volumes::test_volumes::{unit_box, PolynomialVolume, WavyVolume};

    fn constant_density(value: Float) -> Arc<dyn Volume> {
        Arc::new(ConstantVolume::new_scalar(value).with_bbox(Some(unit_box())))
    }

    fn albedo(r: Float, g: Float, b: Float) -> Arc<dyn Volume> {
        Arc::new(ConstantVolume::new_rgb(RGBSpectrum::new(r, g, b)))
    }

    fn polynomial_medium(method: IntegrationMethod) -> HeterogeneousMedium {
        let bbox = AABB::new(Vector3f::new(0.0, -1.0, -1.0), Vector3f::new(4.0, 1.0, 1.0));
        HeterogeneousMedium::builder()
            .with_density(Arc::new(PolynomialVolume { coeffs: [0.2, 0.3, 0.1], bbox, step: 0.02 }))
            .with_albedo(albedo(0.8, 0.5, 0.2))
            .with_method(method)
            .build()
            .unwrap()
    }

    fn x_ray() -> Ray3f {
        Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), Some(0.0), Some(4.0))
    }

    #[test]
    fn parses_method_names() {
        assert_eq!("Simpson".parse::<IntegrationMethod>(), Ok(IntegrationMethod::Simpson));
        assert_eq!("WOODCOCK".parse::<IntegrationMethod>(), Ok(IntegrationMethod::Woodcock));
        assert_eq!(
            "trapezoid".parse::<IntegrationMethod>(),
            Err(MediumError::UnknownMethod("trapezoid".to_string()))
        );
        assert_eq!(IntegrationMethod::default(), IntegrationMethod::Woodcock);
    }

    #[test]
    fn configuration_errors() {
        assert_eq!(
            HeterogeneousMedium::builder().with_albedo(albedo(0.5, 0.5, 0.5)).build().err(),
            Some(MediumError::MissingVolume("density"))
        );
        assert_eq!(
            HeterogeneousMedium::builder().with_density(constant_density(1.0)).build().err(),
            Some(MediumError::MissingVolume("albedo"))
        );
        assert!(matches!(
            HeterogeneousMedium::builder()
                .with_density(constant_density(1.0))
                .with_albedo(Arc::new(ConstantVolume::new_vector(Vector3f::zeros())))
                .with_step_size(0.1)
                .build(),
            Err(MediumError::UnsupportedLookup { role: "albedo", .. })
        ));
        // Constant volumes do not suggest a step size.
        assert_eq!(
            HeterogeneousMedium::builder()
                .with_density(constant_density(1.0))
                .with_albedo(albedo(0.5, 0.5, 0.5))
                .build()
                .err(),
            Some(MediumError::UnresolvedStepSize)
        );
        assert!(matches!(
            HeterogeneousMedium::builder()
                .with_density(constant_density(1.0))
                .with_albedo(albedo(0.5, 0.5, 0.5))
                .with_step_size(0.1)
                .with_transmittance_samples(0)
                .build(),
            Err(MediumError::InvalidParameter(_))
        ));
        assert!(matches!(
            HeterogeneousMedium::builder()
                .with_density(constant_density(1.0))
                .with_albedo(albedo(0.5, 0.5, 0.5))
                .with_step_size(-0.5)
                .build(),
            Err(MediumError::InvalidParameter(_))
        ));
        assert_eq!(
            HeterogeneousMedium::builder()
                .with_density(constant_density(1.0))
                .with_albedo(albedo(0.5, 0.5, 0.5))
                .with_step_size(0.1)
                .with_phase_function(Arc::new(KajiyaKayPhaseFunction::default()))
                .build()
                .err(),
            Some(MediumError::MissingOrientation)
        );
    }

    #[test]
    fn step_size_defaults_to_the_finest_volume() {
        let medium = HeterogeneousMedium::builder()
            .with_density(Arc::new(WavyVolume { base: 1.0, amplitude: 0.2, frequency: 10.0, bbox: unit_box() }))
            .with_albedo(albedo(0.5, 0.5, 0.5))
            .build()
            .unwrap();
        assert!((medium.step_size() - 0.005).abs() < 1e-15);
        assert_eq!(medium.transmittance_samples(), DEFAULT_TRANSMITTANCE_SAMPLES);
        assert_eq!(medium.method(), IntegrationMethod::Woodcock);
        assert_eq!(medium.phase_function().name(), "isotropic");

        let explicit = HeterogeneousMedium::builder()
            .with_density(constant_density(1.0))
            .with_albedo(albedo(0.5, 0.5, 0.5))
            .with_step_size(0.25)
            .build()
            .unwrap();
        assert_eq!(explicit.step_size(), 0.25);
    }

    #[test]
    fn simpson_sampling_records_are_consistent() {
        let medium = polynomial_medium(IntegrationMethod::Simpson);
        let ray = x_ray();
        let mut rng = LcgRng::new(42);
        let mut stats = TransportStats::new();
        let mut hits = 0;
        for _ in 0..500 {
            let (success, rec) = medium.sample_distance_observed(&ray, &mut rng, &mut stats);
            assert!(rec.pdf_failure > 0.0 && rec.pdf_failure <= 1.0);
            assert_eq!(rec.transmittance[0], rec.pdf_failure);
            if !success {
                assert!(!rec.pdf_success.is_nan());
                continue;
            }
            hits += 1;
            assert!(rec.t >= ray.min_t && rec.t <= ray.max_t);
            let density = medium.density_field().effective_density(rec.p, &ray.dir());
            assert!((rec.pdf_success / rec.transmittance[0] - density).abs() < 1e-9);
            assert!((rec.sigma_t()[1] - density).abs() < 1e-9);
            assert!((rec.sigma_s[0] - 0.8 * density).abs() < 1e-9);
            assert!((rec.sigma_a[2] - 0.8 * density).abs() < 1e-9);
            assert_eq!(rec.albedo, 0.8);
            // Starts inside the box with density c0.
            assert!((rec.pdf_success_rev / rec.transmittance[0] - 0.2).abs() < 1e-12);
        }
        // Optical depth 0.2 * 4 + 0.15 * 16 + 0.1 * 64 / 3 = 5.33
        assert!(hits > 450);
        assert_eq!(stats.sampling_steps.count(), 500);
    }

    #[test]
    fn simpson_scattering_rate_matches_transmittance() {
        let medium = HeterogeneousMedium::builder()
            .with_density(constant_density(0.7))
            .with_albedo(albedo(1.0, 1.0, 1.0))
            .with_method(IntegrationMethod::Simpson)
            .with_step_size(0.05)
            .build()
            .unwrap();
        let ray = Ray3f::new(Vector3f::new(-1.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let transmittance = medium.transmittance(&ray, None)[0];
        assert!((transmittance - (-0.7f64).exp()).abs() < 1e-12);

        let mut rng = LcgRng::new(5);
        let n = 20_000;
        let mut passed = 0;
        for _ in 0..n {
            let (success, rec) = medium.sample_distance(&ray, &mut rng);
            if !success {
                passed += 1;
                assert!((rec.pdf_failure - transmittance).abs() < 1e-6);
            } else {
                assert!(rec.t >= 1.0 && rec.t <= 2.0);
                // Outside the box at min_t.
                assert_eq!(rec.pdf_success_rev, 0.0);
            }
        }
        assert!((passed as Float / n as Float - transmittance).abs() < 0.02);
    }

    #[test]
    fn woodcock_sampling_weights_give_the_albedo() {
        let medium = polynomial_medium(IntegrationMethod::Woodcock);
        let ray = x_ray();
        let mut rng = LcgRng::new(8);
        let mut hits = 0;
        for _ in 0..500 {
            let (success, rec) = medium.sample_distance(&ray, &mut rng);
            assert_eq!(rec.pdf_failure, 1.0);
            assert_eq!(rec.pdf_success, 1.0);
            if success {
                hits += 1;
                let weight = rec.transmittance * rec.sigma_s * (1.0 / rec.pdf_success);
                assert!((weight[0] - 0.8).abs() < 1e-9);
                assert!((weight[1] - 0.5).abs() < 1e-9);
                assert!((weight[2] - 0.2).abs() < 1e-9);
            } else {
                assert_eq!(rec.transmittance, RGBSpectrum::from_value(1.0));
            }
        }
        assert!(hits > 450);
    }

    #[test]
    fn pdf_distance_depends_on_method() {
        let woodcock = polynomial_medium(IntegrationMethod::Woodcock);
        assert_eq!(
            woodcock.pdf_distance(&x_ray()).err(),
            Some(MediumError::UnsupportedOperation("pdf_distance"))
        );

        let simpson = polynomial_medium(IntegrationMethod::Simpson);
        let ray = x_ray().with_range(0.5, 1.5);
        let rec = simpson.pdf_distance(&ray).unwrap();
        let exact = |x: Float| 0.2 * x + 0.15 * x * x + 0.1 / 3.0 * x * x * x;
        let expected = (-(exact(1.5) - exact(0.5))).exp();
        assert!((rec.pdf_failure - expected).abs() < 1e-9);
        assert_eq!(rec.transmittance[0], rec.pdf_failure);
        let density_at = |x: Float| 0.2 + 0.3 * x + 0.1 * x * x;
        assert!((rec.pdf_success - expected * density_at(1.5)).abs() < 1e-9);
        assert!((rec.pdf_success_rev - expected * density_at(0.5)).abs() < 1e-9);
    }

    #[test]
    fn rays_missing_the_medium() {
        let ray = Ray3f::new(Vector3f::new(0.0, 5.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let mut rng = LcgRng::new(1);
        for method in [IntegrationMethod::Simpson, IntegrationMethod::Woodcock].iter() {
            let medium = polynomial_medium(*method);
            let (success, rec) = medium.sample_distance(&ray, &mut rng);
            assert!(!success);
            assert_eq!(rec.transmittance, RGBSpectrum::from_value(1.0));
            assert_eq!(medium.transmittance(&ray, Some(&mut rng)), RGBSpectrum::from_value(1.0));
            assert_eq!(medium.optical_depth(&ray), 0.0);
        }
    }

    #[test]
    fn woodcock_transmittance_is_unbiased() {
        let medium = polynomial_medium(IntegrationMethod::Woodcock);
        let ray = x_ray().with_range(0.0, 1.0);
        let reference = (-medium.optical_depth(&ray)).exp();
        assert_eq!(medium.transmittance(&ray, None)[0], reference);

        let mut rng = LcgRng::new(2024);
        let n = 5000;
        let mut sum = 0.0;
        for _ in 0..n {
            let value = medium.transmittance(&ray, Some(&mut rng))[0];
            assert!(value == 0.0 || value == 0.5 || value == 1.0);
            sum += value;
        }
        assert!((sum / n as Float - reference).abs() < 0.05 * reference);
    }

    #[test]
    fn fibers_are_transparent_along_their_axis() {
        let medium = HeterogeneousMedium::builder()
            .with_density(constant_density(2.0))
            .with_albedo(albedo(0.9, 0.9, 0.9))
            .with_orientation(Arc::new(ConstantVolume::new_vector(Vector3f::new(1.0, 0.0, 0.0))))
            .with_phase_function(Arc::new(KajiyaKayPhaseFunction::new(0.25)))
            .with_method(IntegrationMethod::Simpson)
            .with_step_size(0.1)
            .build()
            .unwrap();
        let along = Ray3f::new(Vector3f::new(-1.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let across = Ray3f::new(Vector3f::new(0.5, -1.0, 0.5), Vector3f::new(0.0, 1.0, 0.0), None, None);
        assert!((medium.optical_depth(&along) - 0.5).abs() < 1e-12);
        assert!((medium.optical_depth(&across) - 2.0).abs() < 1e-12);
        assert!(!medium.is_homogeneous());
        assert_eq!(medium.bbox(), Some(unit_box()));
    }

    /// Unit density up to `x = 0.47`, infinitely dense beyond.
    struct OpaqueWallVolume;

    impl Volume for OpaqueWallVolume {
        fn bbox(&self) -> Option<AABB> {
            Some(unit_box())
        }

        fn supports_float_lookups(&self) -> bool {
            true
        }

        fn lookup_float(&self, p: Vector3f) -> Float {
            if p.x < 0.47 {
                1.0
            } else {
                Float::INFINITY
            }
        }

        fn maximum_float_value(&self) -> Float {
            Float::INFINITY
        }
    }

    struct FixedSampler(Float);

    impl Sampler for FixedSampler {
        fn next_1d(&mut self) -> Float {
            self.0
        }
    }

    #[test]
    fn failed_root_search_reports_no_interaction() {
        let medium = HeterogeneousMedium::builder()
            .with_density(Arc::new(OpaqueWallVolume))
            .with_albedo(albedo(0.5, 0.5, 0.5))
            .with_method(IntegrationMethod::Simpson)
            .with_step_size(0.05)
            .build()
            .unwrap();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), Some(0.0), Some(1.0));
        let mut stats = TransportStats::new();
        // Depth ln 2 lies past the first four macro steps (depth 0.4).
        let (success, rec) = medium.sample_distance_observed(&ray, &mut FixedSampler(0.5), &mut stats);
        assert!(!success);
        assert_eq!(stats.non_convergences, 1);
        assert!((rec.pdf_failure - (-0.4f64).exp()).abs() < 1e-12);
        assert_eq!(rec.transmittance[0], rec.pdf_failure);
        assert_eq!(rec.pdf_success, 0.0);
    }
}
