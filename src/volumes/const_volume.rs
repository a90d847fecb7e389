// Copyright @yucwang 2026

use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    Scalar(Float),
    Spectrum(RGBSpectrum),
    Vector(Vector3f),
}

/// The same value everywhere inside an optional bounding box.
pub struct ConstantVolume {
    value: ConstantValue,
    bbox: Option<AABB>,
}

impl ConstantVolume {
    pub fn new_scalar(value: Float) -> Self {
        Self {
            value: ConstantValue::Scalar(value),
            bbox: None,
        }
    }

    pub fn new_rgb(value: RGBSpectrum) -> Self {
        Self {
            value: ConstantValue::Spectrum(value),
            bbox: None,
        }
    }

    pub fn new_vector(value: Vector3f) -> Self {
        Self {
            value: ConstantValue::Vector(value),
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: Option<AABB>) -> Self {
        self.bbox = bbox;
        self
    }
}

impl Volume for ConstantVolume {
    fn bbox(&self) -> Option<AABB> {
        self.bbox
    }

    fn supports_float_lookups(&self) -> bool {
        matches!(self.value, ConstantValue::Scalar(_))
    }

    fn supports_spectrum_lookups(&self) -> bool {
        // A scalar doubles as a grey spectrum.
        matches!(self.value, ConstantValue::Scalar(_) | ConstantValue::Spectrum(_))
    }

    fn supports_vector_lookups(&self) -> bool {
        matches!(self.value, ConstantValue::Vector(_))
    }

    fn lookup_float(&self, _p_world: Vector3f) -> Float {
        match self.value {
            ConstantValue::Scalar(v) => v,
            _ => 0.0,
        }
    }

    fn lookup_spectrum(&self, _p_world: Vector3f) -> RGBSpectrum {
        match self.value {
            ConstantValue::Scalar(v) => RGBSpectrum::from_value(v),
            ConstantValue::Spectrum(s) => s,
            ConstantValue::Vector(_) => RGBSpectrum::default(),
        }
    }

    fn lookup_vector(&self, _p_world: Vector3f) -> Vector3f {
        match self.value {
            ConstantValue::Vector(v) => v,
            _ => Vector3f::zeros(),
        }
    }

    fn maximum_float_value(&self) -> Float {
        match self.value {
            ConstantValue::Scalar(v) => v,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_volume_scalar() {
        let vol = ConstantVolume::new_scalar(2.0);
        assert!(vol.supports_float_lookups());
        assert!(vol.supports_spectrum_lookups());
        assert!(!vol.supports_vector_lookups());
        assert!(vol.bbox().is_none());
        assert_eq!(vol.lookup_float(Vector3f::new(0.1, 0.2, 0.3)), 2.0);
        assert_eq!(vol.lookup_spectrum(Vector3f::zeros()), RGBSpectrum::from_value(2.0));
        assert_eq!(vol.maximum_float_value(), 2.0);
        assert_eq!(vol.step_size(), std::f64::INFINITY);
    }

    #[test]
    fn constant_volume_rgb_bbox() {
        let bbox = AABB::new(Vector3f::new(-1.0, 0.0, 1.0), Vector3f::new(2.0, 3.0, 4.0));
        let vol = ConstantVolume::new_rgb(RGBSpectrum::new(0.1, 0.2, 0.3)).with_bbox(Some(bbox));
        assert!(!vol.supports_float_lookups());
        assert!(vol.supports_spectrum_lookups());
        let v = vol.lookup_spectrum(Vector3f::new(-0.5, 1.0, 2.0));
        assert_eq!(v, RGBSpectrum::new(0.1, 0.2, 0.3));
        let out = vol.bbox().unwrap();
        assert_eq!(out.p_min, Vector3f::new(-1.0, 0.0, 1.0));
        assert_eq!(out.p_max, Vector3f::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn constant_volume_vector() {
        let vol = ConstantVolume::new_vector(Vector3f::new(0.0, 0.0, 1.0));
        assert!(vol.supports_vector_lookups());
        assert!(!vol.supports_float_lookups());
        assert_eq!(vol.lookup_vector(Vector3f::zeros()), Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(vol.lookup_float(Vector3f::zeros()), 0.0);
    }
}
