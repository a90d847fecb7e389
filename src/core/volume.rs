// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// A volume data source: point lookups of a float, spectrum or vector field.
///
/// Which lookups make sense is advertised through the `supports_*` tags so
/// that a medium can check each nested volume against the role it plays
/// (density, albedo, orientation) once, at configuration time. Lookups that
/// are not supported return zero.
pub trait Volume: Send + Sync {
    fn bbox(&self) -> Option<AABB> {
        None
    }

    fn supports_float_lookups(&self) -> bool {
        false
    }

    fn supports_spectrum_lookups(&self) -> bool {
        false
    }

    fn supports_vector_lookups(&self) -> bool {
        false
    }

    fn lookup_float(&self, _p_world: Vector3f) -> Float {
        0.0
    }

    fn lookup_spectrum(&self, _p_world: Vector3f) -> RGBSpectrum {
        RGBSpectrum::default()
    }

    fn lookup_vector(&self, _p_world: Vector3f) -> Vector3f {
        Vector3f::zeros()
    }

    /// Natural ray-marching step size. `Float::INFINITY` means the volume
    /// has no preference (e.g. it is constant).
    fn step_size(&self) -> Float {
        std::f64::INFINITY
    }

    /// Upper bound of `lookup_float` over the whole domain.
    fn maximum_float_value(&self) -> Float;
}
