// Copyright @yucwang 2026

use crate::math::constants::Float;

/// Source of uniformly distributed numbers in `[0, 1)`.
pub trait Sampler {
    fn next_1d(&mut self) -> Float;
}

pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    pub fn next_f64(&mut self) -> Float {
        // 2^-32 keeps the result strictly below one.
        (self.next_u32() as Float) * (1.0 / 4294967296.0)
    }
}

impl Sampler for LcgRng {
    fn next_1d(&mut self) -> Float {
        self.next_f64()
    }
}
