// Copyright @yucwang 2026

//! Optional statistics for the medium integrators.
//!
//! The integrators report what they did through a `TransportObserver` that
//! the caller passes in. Nothing is global: a render worker keeps its own
//! `TransportStats` and merges it into a total after joining.

use std::fmt;

pub trait TransportObserver {
    /// Density lookups performed by one transmittance query.
    fn transmittance_marching_steps(&mut self, _steps: u64) {}

    /// Density lookups performed by one distance sampling query.
    fn sampling_marching_steps(&mut self, _steps: u64) {}

    /// Newton-Bisection iterations spent on one root.
    fn newton_iterations(&mut self, _iterations: u64) {}

    /// Called once per Simpson transmittance query.
    fn early_exit(&mut self, _taken: bool) {}

    fn non_convergence(&mut self) {}

    fn stalled_march(&mut self) {}
}

/// Observer that discards everything.
pub struct NoStats;

impl TransportObserver for NoStats {}

/// Running average of a per-query count.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StatsAverage {
    sum: u64,
    count: u64,
    max: u64,
}

impl StatsAverage {
    pub fn record(&mut self, value: u64) {
        self.sum += value;
        self.count += 1;
        self.max = self.max.max(value);
    }

    pub fn accumulate(&mut self, other: &StatsAverage) {
        self.sum += other.sum;
        self.count += other.count;
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransportStats {
    pub transmittance_steps: StatsAverage,
    pub sampling_steps: StatsAverage,
    pub newton_iterations: StatsAverage,
    pub early_exits: u64,
    pub early_exit_checks: u64,
    pub non_convergences: u64,
    pub stalled_marches: u64,
}

impl TransportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &TransportStats) {
        self.transmittance_steps.accumulate(&other.transmittance_steps);
        self.sampling_steps.accumulate(&other.sampling_steps);
        self.newton_iterations.accumulate(&other.newton_iterations);
        self.early_exits += other.early_exits;
        self.early_exit_checks += other.early_exit_checks;
        self.non_convergences += other.non_convergences;
        self.stalled_marches += other.stalled_marches;
    }

    pub fn early_exit_ratio(&self) -> f64 {
        if self.early_exit_checks == 0 {
            0.0
        } else {
            self.early_exits as f64 / self.early_exit_checks as f64
        }
    }
}

impl TransportObserver for TransportStats {
    fn transmittance_marching_steps(&mut self, steps: u64) {
        self.transmittance_steps.record(steps);
    }

    fn sampling_marching_steps(&mut self, steps: u64) {
        self.sampling_steps.record(steps);
    }

    fn newton_iterations(&mut self, iterations: u64) {
        self.newton_iterations.record(iterations);
    }

    fn early_exit(&mut self, taken: bool) {
        self.early_exit_checks += 1;
        if taken {
            self.early_exits += 1;
        }
    }

    fn non_convergence(&mut self) {
        self.non_convergences += 1;
    }

    fn stalled_march(&mut self) {
        self.stalled_marches += 1;
    }
}

impl fmt::Display for TransportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Heterogeneous volume")?;
        writeln!(
            f,
            "  Avg. # of ray marching steps (transmittance)  {:>10.3} (max {}, {} queries)",
            self.transmittance_steps.mean(),
            self.transmittance_steps.max(),
            self.transmittance_steps.count()
        )?;
        writeln!(
            f,
            "  Avg. # of ray marching steps (sampling)       {:>10.3} (max {}, {} queries)",
            self.sampling_steps.mean(),
            self.sampling_steps.max(),
            self.sampling_steps.count()
        )?;
        writeln!(
            f,
            "  Avg. # of Newton-Bisection iterations         {:>10.3} (max {})",
            self.newton_iterations.mean(),
            self.newton_iterations.max()
        )?;
        writeln!(
            f,
            "  Early exits                                   {:>10.2} % ({} / {})",
            100.0 * self.early_exit_ratio(),
            self.early_exits,
            self.early_exit_checks
        )?;
        write!(
            f,
            "  Non-converged roots / stalled marches         {:>10} / {}",
            self.non_convergences, self.stalled_marches
        )
    }
}
