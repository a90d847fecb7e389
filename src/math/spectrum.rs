// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

use std::ops;

/// Three independent color channels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RGBSpectrum {
    rgb: Vector3f
}

impl Default for RGBSpectrum {
    fn default() -> Self {
        Self { rgb: Vector3f::zeros() }
    }
}

impl RGBSpectrum {
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        Self { rgb: Vector3f::new(r, g, b) }
    }

    pub fn from_value(value: Float) -> Self {
        Self::new(value, value, value)
    }

    pub fn from_vector(v: Vector3f) -> Self {
        Self { rgb: v }
    }

    pub fn max_value(&self) -> Float {
        self.rgb.x.max(self.rgb.y).max(self.rgb.z)
    }

    pub fn average(&self) -> Float {
        (self.rgb.x + self.rgb.y + self.rgb.z) / 3.0
    }

    pub fn clamp(&self, lo: Float, hi: Float) -> Self {
        Self::from_vector(self.rgb.map(|c| c.max(lo).min(hi)))
    }
}

impl ops::Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, idx: usize) -> &Float {
        &self.rgb[idx]
    }
}

impl ops::IndexMut<usize> for RGBSpectrum {
    fn index_mut(&mut self, idx: usize) -> &mut Float {
        &mut self.rgb[idx]
    }
}

impl ops::Add for RGBSpectrum {
    type Output = RGBSpectrum;

    fn add(self, rhs: RGBSpectrum) -> RGBSpectrum {
        Self::from_vector(self.rgb + rhs.rgb)
    }
}

impl ops::AddAssign for RGBSpectrum {
    fn add_assign(&mut self, rhs: RGBSpectrum) {
        self.rgb += rhs.rgb;
    }
}

impl ops::Sub for RGBSpectrum {
    type Output = RGBSpectrum;

    fn sub(self, rhs: RGBSpectrum) -> RGBSpectrum {
        Self::from_vector(self.rgb - rhs.rgb)
    }
}

impl ops::Mul for RGBSpectrum {
    type Output = RGBSpectrum;

    fn mul(self, rhs: RGBSpectrum) -> RGBSpectrum {
        Self::from_vector(self.rgb.component_mul(&rhs.rgb))
    }
}

impl ops::Mul<Float> for RGBSpectrum {
    type Output = RGBSpectrum;

    fn mul(self, rhs: Float) -> RGBSpectrum {
        Self::from_vector(self.rgb * rhs)
    }
}

impl ops::Div<Float> for RGBSpectrum {
    type Output = RGBSpectrum;

    fn div(self, rhs: Float) -> RGBSpectrum {
        Self::from_vector(self.rgb / rhs)
    }
}

impl ops::Neg for RGBSpectrum {
    type Output = RGBSpectrum;

    fn neg(self) -> RGBSpectrum {
        Self::from_vector(-self.rgb)
    }
}
