// Copyright @yucwang 2026

//! Deterministic density integration with composite Simpson quadrature.

use crate::core::error::MediumError;
use crate::core::stats::TransportObserver;
use crate::math::constants::{Float, MACHINE_EPSILON};
use crate::math::ray::Ray3f;
use crate::media::density_field::DensityField;
use crate::media::{clip_segment, WarnOnce};

/// Residual (in optical depth) at which a root counts as found.
pub const NEWTON_TOLERANCE: Float = 1e-6;
pub const MAX_NEWTON_ITERATIONS: u32 = 30;

/// Upper bound on the number of quadrature intervals along one segment.
const MAX_STEPS: Float = (u32::MAX - 1) as Float;

/// Number of intervals no longer than `step` covering `spatial_length`
/// (both in world units), at least one.
fn step_count(spatial_length: Float, step: Float) -> u64 {
    ((spatial_length / step).ceil().min(MAX_STEPS) as u64).max(1)
}

/// Outcome of `SimpsonQuadrature::invert_density_integral`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DensityInversion {
    pub found: bool,
    /// Solution in ray parameter units, zero when `found` is false.
    pub t: Float,
    /// Optical depth from the clipped start to `t` on success, otherwise the
    /// depth accumulated over the part of the segment that was marched.
    pub integrated_density: Float,
    /// Density at `ray.min_t`; zero when the ray starts outside the bound.
    pub density_at_min_t: Float,
    /// Density at `t` according to the local quadratic model.
    pub density_at_t: Float,
    pub iterations: u32,
}

pub struct SimpsonQuadrature {
    step_size: Float,
    /// Optical depth beyond which the transmittance is below machine precision.
    stop_after_density: Float,
    stall_warning: WarnOnce,
    newton_warning: WarnOnce,
}

impl SimpsonQuadrature {
    pub fn new(step_size: Float) -> Result<Self, MediumError> {
        if !(step_size > 0.0) || !step_size.is_finite() {
            return Err(MediumError::InvalidParameter(format!(
                "step size must be positive and finite, got {}",
                step_size
            )));
        }
        Ok(Self {
            step_size,
            stop_after_density: -MACHINE_EPSILON.ln(),
            stall_warning: WarnOnce::new(),
            newton_warning: WarnOnce::new(),
        })
    }

    pub fn step_size(&self) -> Float {
        self.step_size
    }

    /// Optical depth of `ray` inside the field, i.e. the integral of the
    /// effective density over `[ray.min_t, ray.max_t]`.
    ///
    /// Returns `Float::INFINITY` as soon as the partial sum proves that the
    /// transmittance is below machine precision.
    pub fn integrate_density(
        &self,
        field: &DensityField,
        ray: &Ray3f,
        observer: &mut dyn TransportObserver,
    ) -> Float {
        let (mint, maxt) = match clip_segment(field, ray) {
            Some(segment) => segment,
            None => return 0.0,
        };
        let length = maxt - mint;

        let mut n_steps = step_count(length * ray.dir().norm(), self.step_size);
        n_steps += n_steps % 2;
        let step = length / n_steps as Float;
        let d = ray.dir();

        let mut integrated = field.effective_density(ray.at(mint), &d)
            + field.effective_density(ray.at(maxt), &d);
        let stop_value = self.stop_after_density * 3.0 / step;
        let mut lookups = 2u64;

        let mut p = ray.at(mint + step);
        let mut m = 4.0;
        for i in 1..n_steps {
            integrated += m * field.effective_density(p, &d);
            m = 6.0 - m;
            lookups += 1;

            if integrated > stop_value {
                observer.transmittance_marching_steps(lookups);
                observer.early_exit(true);
                return std::f64::INFINITY;
            }

            let next = ray.at(mint + step * (i + 1) as Float);
            if next == p {
                self.stall_warning.report(&format!(
                    "integrate_density(): unable to make forward progress -- round-off error issues? \
                     The step size was {:e}, mint={}, maxt={}, n_steps={}",
                    step, mint, maxt, n_steps
                ));
                observer.stalled_march();
                break;
            }
            p = next;
        }

        observer.transmittance_marching_steps(lookups);
        observer.early_exit(false);
        integrated * step * (1.0 / 3.0)
    }

    /// Solve `integral_{min_t}^{t} density(ray(x)) dx == desired` for `t`.
    ///
    /// The segment is walked in macro steps of roughly twice the step size,
    /// each sampled at its left, middle and right node. Inside the macro
    /// step that crosses `desired` the density is modelled by the quadratic
    /// through those three nodes and its antiderivative is inverted with
    /// Newton's method safeguarded by bisection.
    pub fn invert_density_integral(
        &self,
        field: &DensityField,
        ray: &Ray3f,
        desired: Float,
        observer: &mut dyn TransportObserver,
    ) -> DensityInversion {
        let mut result = DensityInversion::default();

        let (mint, maxt) = match clip_segment(field, ray) {
            Some(segment) => segment,
            None => return result,
        };
        let length = maxt - mint;

        let n_steps = step_count(length * ray.dir().norm(), 2.0 * self.step_size);
        let step = length / n_steps as Float;
        let multiplier = step * (1.0 / 6.0);
        let d = ray.dir();

        let mut node1 = field.effective_density(ray.at(mint), &d);
        result.density_at_min_t = if ray.min_t == mint { node1 } else { 0.0 };
        let mut lookups = 1u64;
        let mut integrated = 0.0;

        for i in 0..n_steps {
            let t_left = mint + step * i as Float;
            let p = ray.at(t_left);
            let node2 = field.effective_density(ray.at(t_left + 0.5 * step), &d);
            let node3 = field.effective_density(ray.at(t_left + step), &d);
            lookups += 2;
            let new_density = integrated + multiplier * (node1 + 4.0 * node2 + node3);

            if new_density >= desired {
                observer.sampling_marching_steps(lookups);
                let model = QuadraticSegment { step, node1, node2, node3 };
                let mut solved =
                    self.solve_in_segment(&model, t_left, integrated, desired, result, observer);
                if solved.found {
                    solved.t = solved.t.min(maxt);
                }
                return solved;
            }

            if ray.at(t_left + step) == p {
                self.stall_warning.report(&format!(
                    "invert_density_integral(): unable to make forward progress -- round-off error issues? \
                     The step size was {:e}",
                    step
                ));
                observer.stalled_march();
                break;
            }
            integrated = new_density;
            node1 = node3;
        }

        observer.sampling_marching_steps(lookups);
        result.integrated_density = integrated;
        result
    }

    fn solve_in_segment(
        &self,
        model: &QuadraticSegment,
        t_left: Float,
        integrated: Float,
        desired: Float,
        mut result: DensityInversion,
        observer: &mut dyn TransportObserver,
    ) -> DensityInversion {
        let (mut a, mut b, mut x) = (0.0, model.step, 0.0);
        let mut fx = integrated - desired;
        let mut it = 1u32;

        loop {
            let dfx = model.density(x);
            x -= fx / dfx;

            if !(x > a && x < b) || dfx == 0.0 {
                x = 0.5 * (b + a);
            }

            let intval = integrated + model.integral(x);
            fx = intval - desired;

            if fx.abs() < NEWTON_TOLERANCE {
                observer.newton_iterations(it as u64);
                result.found = true;
                result.t = t_left + x;
                result.integrated_density = intval;
                result.density_at_t = model.density(x);
                result.iterations = it;
                return result;
            }

            it += 1;
            if it > MAX_NEWTON_ITERATIONS {
                self.newton_warning.report(&format!(
                    "invert_density_integral(): stuck in Newton-Bisection -- round-off error issues? \
                     The step size was {:e}, fx={}, dfx={}, a={}, b={}",
                    model.step, fx, dfx, a, b
                ));
                observer.newton_iterations(MAX_NEWTON_ITERATIONS as u64);
                observer.non_convergence();
                result.integrated_density = integrated;
                result.iterations = MAX_NEWTON_ITERATIONS;
                return result;
            }

            if fx > 0.0 {
                b = x;
            } else {
                a = x;
            }
        }
    }
}

/// Lagrange quadratic through the densities at `0`, `step / 2` and `step`.
struct QuadraticSegment {
    step: Float,
    node1: Float,
    node2: Float,
    node3: Float,
}

impl QuadraticSegment {
    fn density(&self, x: Float) -> Float {
        let h = self.step;
        (self.node1 * h * h
            - (3.0 * self.node1 - 4.0 * self.node2 + self.node3) * h * x
            + 2.0 * (self.node1 - 2.0 * self.node2 + self.node3) * x * x)
            / (h * h)
    }

    /// Antiderivative of `density` with `integral(0) == 0`.
    fn integral(&self, x: Float) -> Float {
        let h = self.step;
        x * (6.0 * self.node1 * h * h
            - 3.0 * (3.0 * self.node1 - 4.0 * self.node2 + self.node3) * h * x
            + 4.0 * (self.node1 - 2.0 * self.node2 + self.node3) * x * x)
            / (6.0 * h * h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::IsotropicPhaseFunction;
    use crate::core::stats::{NoStats, TransportStats};
    use crate::core::volume::Volume;
    use crate::math::aabb::AABB;
    use crate::math::constants::Vector3f;
    use crate::volumes::const_volume::ConstantVolume;
    use crate::volumes::test_volumes::{unit_box, GaussianSpikeVolume, PolynomialVolume, WavyVolume};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn field_from(volume: Arc<dyn Volume>) -> DensityField {
        DensityField::new(volume, None, Arc::new(IsotropicPhaseFunction), 1.0).unwrap()
    }

    fn constant_field(value: Float, bbox: AABB) -> DensityField {
        field_from(Arc::new(ConstantVolume::new_scalar(value).with_bbox(Some(bbox))))
    }

    fn polynomial_field(coeffs: [Float; 3]) -> DensityField {
        let bbox = AABB::new(Vector3f::new(0.0, -1.0, -1.0), Vector3f::new(4.0, 1.0, 1.0));
        field_from(Arc::new(PolynomialVolume { coeffs, bbox, step: 0.1 }))
    }

    fn x_ray(min_t: Float, max_t: Float) -> Ray3f {
        Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), Some(min_t), Some(max_t))
    }

    #[test]
    fn constant_density_integrates_to_density_times_length() {
        let field = constant_field(0.7, unit_box());
        let quad = SimpsonQuadrature::new(0.03).unwrap();
        let ray = Ray3f::new(Vector3f::new(-1.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let depth = quad.integrate_density(&field, &ray, &mut NoStats);
        assert!((depth - 0.7).abs() < 1e-12);

        // Diagonal through the cube: length sqrt(3).
        let diag = Ray3f::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0), None, None);
        let depth = quad.integrate_density(&field, &diag, &mut NoStats);
        assert!((depth - 0.7).abs() < 1e-12, "parametric depth {}", depth);
    }

    #[test]
    fn direction_scale_is_part_of_the_parameterization() {
        let field = constant_field(1.0, unit_box());
        let quad = SimpsonQuadrature::new(0.05).unwrap();
        // Twice as long a direction covers the box in half the parameter range.
        let ray = Ray3f::new(Vector3f::new(0.0, 0.5, 0.5), Vector3f::new(2.0, 0.0, 0.0), Some(0.0), Some(0.25));
        let depth = quad.integrate_density(&field, &ray, &mut NoStats);
        assert!((depth - 0.25).abs() < 1e-12);
    }

    #[test]
    fn quadratic_density_is_integrated_exactly() {
        let field = polynomial_field([0.5, 0.3, 0.2]);
        let quad = SimpsonQuadrature::new(0.37).unwrap();
        let ray = x_ray(0.25, 3.5);
        let exact = |x: Float| 0.5 * x + 0.15 * x * x + 0.2 / 3.0 * x * x * x;
        let depth = quad.integrate_density(&field, &ray, &mut NoStats);
        assert!((depth - (exact(3.5) - exact(0.25))).abs() < 1e-10);
    }

    #[test]
    fn rays_missing_the_bound_see_nothing() {
        let field = constant_field(3.0, unit_box());
        let quad = SimpsonQuadrature::new(0.1).unwrap();
        let ray = Ray3f::new(Vector3f::new(-1.0, 2.0, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        assert_eq!(quad.integrate_density(&field, &ray, &mut NoStats), 0.0);
        let inversion = quad.invert_density_integral(&field, &ray, 0.1, &mut NoStats);
        assert!(!inversion.found);
        assert_eq!(inversion.integrated_density, 0.0);
        assert_eq!(inversion.t, 0.0);

        // Segment ending before the box.
        let short = Ray3f::new(Vector3f::new(-1.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), Some(0.0), Some(0.5));
        assert_eq!(quad.integrate_density(&field, &short, &mut NoStats), 0.0);
    }

    #[test]
    fn degenerate_segments_are_ignored() {
        let field = constant_field(3.0, unit_box());
        let quad = SimpsonQuadrature::new(0.1).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.5, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), Some(0.1), Some(0.1));
        assert_eq!(quad.integrate_density(&field, &ray, &mut NoStats), 0.0);
        let zero_dir = Ray3f::new(Vector3f::new(0.5, 0.5, 0.5), Vector3f::zeros(), None, None);
        assert_eq!(quad.integrate_density(&field, &zero_dir, &mut NoStats), 0.0);
    }

    #[test]
    fn dense_field_exits_early_with_infinite_depth() {
        let bbox = AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(100.0, 1.0, 1.0));
        let field = constant_field(1e4, bbox);
        let quad = SimpsonQuadrature::new(0.01).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let mut stats = TransportStats::new();
        let depth = quad.integrate_density(&field, &ray, &mut stats);
        assert!(depth.is_infinite() && depth > 0.0);
        assert_eq!((-depth).exp(), 0.0);
        assert_eq!(stats.early_exits, 1);
        // 10^4 substeps would be needed to march the whole segment.
        assert!(stats.transmittance_steps.max() < 10);
    }

    #[test]
    fn thin_field_does_not_exit_early() {
        let field = constant_field(1.0, unit_box());
        let quad = SimpsonQuadrature::new(0.1).unwrap();
        let mut stats = TransportStats::new();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), Some(0.0), Some(1.0));
        let depth = quad.integrate_density(&field, &ray, &mut stats);
        assert!((depth - 1.0).abs() < 1e-12);
        assert_eq!(stats.early_exits, 0);
        assert_eq!(stats.early_exit_checks, 1);
        assert_eq!(stats.transmittance_steps.max(), 11);
    }

    #[test]
    fn inversion_round_trips_through_integration() {
        let quad = SimpsonQuadrature::new(0.05).unwrap();
        for coeffs in [[2.0, 0.0, 0.0], [0.3, 1.1, 0.0], [0.2, 0.4, 0.35]].iter() {
            let field = polynomial_field(*coeffs);
            let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), Some(0.1), Some(3.9));
            for desired in [0.01, 0.2, 0.9, 1.7, 2.5].iter() {
                let inv = quad.invert_density_integral(&field, &ray, *desired, &mut NoStats);
                assert!(inv.found, "coeffs {:?} desired {}", coeffs, desired);
                assert!(inv.t >= ray.min_t && inv.t <= ray.max_t);
                assert!((inv.integrated_density - desired).abs() < NEWTON_TOLERANCE);

                let back = quad.integrate_density(&field, &ray.with_range(ray.min_t, inv.t), &mut NoStats);
                assert!((back - desired).abs() < NEWTON_TOLERANCE, "back {} desired {}", back, desired);

                // The quadratic model is exact here, so it matches the field.
                let exact = field.effective_density(ray.at(inv.t), &ray.dir());
                assert!((inv.density_at_t - exact).abs() < 1e-9);
                assert!((inv.density_at_min_t - field.effective_density(ray.at(0.1), &ray.dir())).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn unreachable_depth_reports_total() {
        let field = constant_field(0.5, unit_box());
        let quad = SimpsonQuadrature::new(0.1).unwrap();
        let ray = Ray3f::new(Vector3f::new(-1.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let inv = quad.invert_density_integral(&field, &ray, 2.0, &mut NoStats);
        assert!(!inv.found);
        assert_eq!(inv.t, 0.0);
        assert!((inv.integrated_density - 0.5).abs() < 1e-12);
        // The ray starts outside the box.
        assert_eq!(inv.density_at_min_t, 0.0);
        assert_eq!(inv.density_at_t, 0.0);
    }

    #[test]
    fn gaussian_spike_inversion_is_bounded() {
        let bbox = AABB::new(Vector3f::new(0.0, -1.0, -1.0), Vector3f::new(2.0, 1.0, 1.0));
        let field = field_from(Arc::new(GaussianSpikeVolume {
            center: 1.0,
            width: 0.01,
            peak: 400.0,
            bbox,
            step: 0.004,
        }));
        let quad = SimpsonQuadrature::new(0.004).unwrap();
        let ray = x_ray(0.0, 2.0);
        let total = quad.integrate_density(&field, &ray, &mut NoStats);
        // peak * width * sqrt(2 pi)
        assert!((total - 400.0 * 0.01 * (2.0 * std::f64::consts::PI).sqrt()).abs() < 1e-3);

        let mut stats = TransportStats::new();
        for k in 1..100 {
            let desired = total * k as Float / 100.0;
            let inv = quad.invert_density_integral(&field, &ray, desired, &mut stats);
            assert!(inv.iterations <= MAX_NEWTON_ITERATIONS);
            if inv.found {
                assert!(inv.t >= 0.0 && inv.t <= 2.0);
                assert!((inv.t - 1.0).abs() < 0.1);
                assert!((inv.integrated_density - desired).abs() < NEWTON_TOLERANCE);
            }
        }
        assert!(stats.newton_iterations.max() <= MAX_NEWTON_ITERATIONS as u64);
    }

    #[test]
    fn rejects_invalid_step_sizes() {
        assert!(SimpsonQuadrature::new(0.0).is_err());
        assert!(SimpsonQuadrature::new(-0.1).is_err());
        assert!(SimpsonQuadrature::new(std::f64::INFINITY).is_err());
    }

    #[test]
    fn step_count_follows_world_length() {
        let field = field_from(Arc::new(WavyVolume {
            base: 1.0,
            amplitude: 0.5,
            frequency: 40.0,
            bbox: unit_box(),
        }));
        let quad = SimpsonQuadrature::new(0.01).unwrap();
        let unit = Ray3f::new(Vector3f::new(0.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), Some(0.0), Some(1.0));
        let fast = Ray3f::new(Vector3f::new(0.0, 0.5, 0.5), Vector3f::new(50.0, 0.0, 0.0), Some(0.0), Some(0.02));

        let depth = quad.integrate_density(&field, &unit, &mut NoStats);
        let rescaled = 50.0 * quad.integrate_density(&field, &fast, &mut NoStats);
        assert!((rescaled - depth).abs() < 1e-9, "rescaled {} vs {}", rescaled, depth);

        let a = quad.invert_density_integral(&field, &unit, 0.6, &mut NoStats);
        let b = quad.invert_density_integral(&field, &fast, 0.6 / 50.0, &mut NoStats);
        assert!(a.found && b.found);
        // Tolerances are in optical depth per parameter unit.
        assert!((50.0 * b.t - a.t).abs() < 2e-4);
    }

    #[test]
    fn huge_step_counts_are_capped() {
        assert_eq!(step_count(1.0, 0.3), 4);
        assert_eq!(step_count(0.5, 1.0), 1);
        let capped = step_count(1e30, 1.0);
        assert_eq!(capped, MAX_STEPS as u64);
        assert_eq!(capped % 2, 0);

        // Tiny direction over an unbounded range.
        let field = constant_field(1.0, unit_box());
        let quad = SimpsonQuadrature::new(1e-9).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.5, 0.5, 0.5), Vector3f::new(1e-12, 0.0, 0.0), None, None);
        assert!(quad.integrate_density(&field, &ray, &mut NoStats).is_infinite());

        let bbox = AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1000.0, 1.0, 1.0));
        let field = constant_field(1e6, bbox);
        let quad = SimpsonQuadrature::new(1e-7).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let mut stats = TransportStats::new();
        let depth = quad.integrate_density(&field, &ray, &mut stats);
        assert!(depth.is_infinite() && depth > 0.0);
        assert_eq!(stats.early_exits, 1);
        assert!(stats.transmittance_steps.max() < 1000);
    }

    #[test]
    fn stalled_march_returns_partial_depth() {
        let field = constant_field(1.0, unit_box());
        let quad = SimpsonQuadrature::new(1e-6).unwrap();
        // The box starts 1e12 parameter units in, so a 1e-6 increment of t
        // is lost to rounding.
        let ray = Ray3f::new(Vector3f::new(-1e12, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let mut stats = TransportStats::new();

        let depth = quad.integrate_density(&field, &ray, &mut stats);
        assert_eq!(stats.stalled_marches, 1);
        assert_eq!(stats.early_exits, 0);
        assert!(depth >= 0.0 && depth < 1e-3, "partial depth {}", depth);

        let inv = quad.invert_density_integral(&field, &ray, 0.5, &mut stats);
        assert_eq!(stats.stalled_marches, 2);
        assert!(!inv.found);
        assert_eq!(inv.t, 0.0);
        assert!(inv.integrated_density < 0.5);
    }

    #[test]
    fn newton_gives_up_after_the_iteration_limit() {
        let quad = SimpsonQuadrature::new(0.1).unwrap();
        let model = QuadraticSegment { step: 0.2, node1: 1.0, node2: Float::NAN, node3: 1.0 };
        let mut stats = TransportStats::new();
        let inv = quad.solve_in_segment(&model, 0.4, 0.3, 0.5, DensityInversion::default(), &mut stats);
        assert!(!inv.found);
        assert_eq!(inv.t, 0.0);
        assert_eq!(inv.iterations, MAX_NEWTON_ITERATIONS);
        assert_eq!(inv.integrated_density, 0.3);
        assert_eq!(stats.non_convergences, 1);
        assert_eq!(stats.newton_iterations.max(), MAX_NEWTON_ITERATIONS as u64);
    }

    proptest! {
        #[test]
        fn newton_bisection_stays_in_segment(
            c0 in 0.0f64..5.0, c1 in 0.0f64..3.0, c2 in 0.0f64..2.0,
            min_t in 0.0f64..1.5, len in 0.05f64..2.5,
            u in 0.0f64..0.999, step in 0.005f64..0.5,
        ) {
            let field = polynomial_field([c0, c1, c2]);
            let quad = SimpsonQuadrature::new(step).unwrap();
            let ray = x_ray(min_t, min_t + len);
            let desired = -(1.0 - u).ln();
            let inv = quad.invert_density_integral(&field, &ray, desired, &mut NoStats);
            prop_assert!(inv.iterations <= MAX_NEWTON_ITERATIONS);
            if inv.found {
                prop_assert!(inv.t >= ray.min_t && inv.t <= ray.max_t);
                prop_assert!((inv.integrated_density - desired).abs() < NEWTON_TOLERANCE);
            } else {
                prop_assert_eq!(inv.t, 0.0);
                let total = quad.integrate_density(&field, &ray, &mut NoStats);
                prop_assert!(inv.integrated_density <= desired);
                prop_assert!((inv.integrated_density - total).abs() < 1e-9 * (1.0 + total));
            }
        }
    }
}
