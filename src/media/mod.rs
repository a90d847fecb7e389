// Copyright @yucwang 2026

pub mod density_field;
pub mod heterogeneous_medium;
pub mod homogeneous_medium;
pub mod simpson;
pub mod woodcock;

use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use density_field::DensityField;
use std::sync::atomic::{AtomicBool, Ordering};

/// Portion of `ray` that overlaps the density bound, or `None` when the
/// overlap is empty or too short to matter relative to the magnitude of its
/// end points.
pub(crate) fn clip_segment(field: &DensityField, ray: &Ray3f) -> Option<(Float, Float)> {
    let (mint, maxt) = field.bbox().ray_intersect_range(ray)?;
    let length = (maxt - mint) * ray.dir().norm();
    let max_comp = ray.at(mint).amax().max(ray.at(maxt).amax());
    if !(length > 0.0 && length >= 1e-6 * max_comp) {
        return None;
    }
    Some((mint, maxt))
}

/// Log latch: the first report of a recoverable numerical problem goes out
/// as a warning, the rest at debug level.
pub(crate) struct WarnOnce {
    fired: AtomicBool,
}

impl WarnOnce {
    pub(crate) fn new() -> Self {
        Self { fired: AtomicBool::new(false) }
    }

    pub(crate) fn report(&self, message: &str) {
        if !self.fired.swap(true, Ordering::Relaxed) {
            log::warn!("{} (further occurrences are logged at debug level)", message);
        } else {
            log::debug!("{}", message);
        }
    }
}
