// Copyright @yucwang 2026

use crate::core::error::MediumError;
use crate::core::medium::Medium;
use crate::core::rng::{LcgRng, Sampler};
use crate::core::stats::TransportStats;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

pub struct TransmittanceImage {
    pub width: usize,
    pub height: usize,
    /// Row-major, row 0 at the top (largest y).
    pub pixels: Vec<Float>,
    pub stats: TransportStats,
}

/// Orthographic transmittance image of a medium, seen along -z through its
/// bounding box.
pub struct TransmittanceRenderer {
    resolution: usize,
    spp: u32,
    seed: u64,
    show_progress: bool,
}

impl TransmittanceRenderer {
    pub fn new(resolution: usize, spp: u32, seed: u64) -> Self {
        Self {
            resolution: resolution.max(1),
            spp: spp.max(1),
            seed,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn render(&self, medium: &dyn Medium) -> Result<TransmittanceImage, MediumError> {
        let bbox = medium
            .bbox()
            .ok_or_else(|| MediumError::InvalidParameter("the medium has no bounding box to render".to_string()))?;
        let extent = bbox.diagnal();
        if !(extent.x > 0.0 && extent.y > 0.0) {
            return Err(MediumError::InvalidParameter(format!("degenerate medium bound {:?}", bbox)));
        }

        let width = self.resolution;
        let height = ((width as Float * extent.y / extent.x).round() as usize).max(1);
        let inv_spp = 1.0 / (self.spp as Float);
        let margin = 0.01 * extent.z.max(1e-3);
        let z_start = bbox.p_max.z + margin;
        let depth = extent.z + 2.0 * margin;

        let block_size = 32usize;
        let blocks_x = (width + block_size - 1) / block_size;
        let blocks_y = (height + block_size - 1) / block_size;
        let total_blocks = blocks_x * blocks_y;

        let progress = if self.show_progress {
            ProgressBar::new(total_blocks as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let next_block = Arc::new(AtomicUsize::new(0));
        let thread_count = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let (tx, rx) = mpsc::channel::<(usize, usize, usize, usize, Vec<Float>)>();
        let mut output = vec![0.0; width * height];
        let mut stats = TransportStats::new();

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(thread_count);
            for _ in 0..thread_count {
                let next_block = Arc::clone(&next_block);
                let tx = tx.clone();
                handles.push(scope.spawn(move || {
                    let mut local_stats = TransportStats::new();
                    loop {
                        let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                        if block_index >= total_blocks {
                            break;
                        }

                        let x0 = (block_index % blocks_x) * block_size;
                        let y0 = (block_index / blocks_x) * block_size;
                        let x1 = (x0 + block_size).min(width);
                        let y1 = (y0 + block_size).min(height);

                        let mut block = vec![0.0; (x1 - x0) * (y1 - y0)];
                        for y in y0..y1 {
                            for x in x0..x1 {
                                let seed = ((self.seed & 0xFFF) << 32)
                                    | (((y as u64) & 0xFFFF) << 16)
                                    | ((x as u64) & 0xFFFF);
                                let mut rng = LcgRng::new(seed);
                                let mut value = 0.0;
                                for _sample in 0..self.spp {
                                    let px = bbox.p_min.x + (x as Float + rng.next_1d()) / width as Float * extent.x;
                                    let py = bbox.p_max.y - (y as Float + rng.next_1d()) / height as Float * extent.y;
                                    let ray = Ray3f::new(
                                        Vector3f::new(px, py, z_start),
                                        Vector3f::new(0.0, 0.0, -1.0),
                                        Some(0.0),
                                        Some(depth),
                                    );
                                    value += medium.transmittance_observed(&ray, Some(&mut rng), &mut local_stats)[0];
                                }
                                block[(x - x0) + (x1 - x0) * (y - y0)] = value * inv_spp;
                            }
                        }
                        if tx.send((x0, y0, x1, y1, block)).is_err() {
                            break;
                        }
                    }
                    local_stats
                }));
            }

            drop(tx);
            for _ in 0..total_blocks {
                if let Ok((x0, y0, x1, y1, block)) = rx.recv() {
                    for y in y0..y1 {
                        for x in x0..x1 {
                            output[x + width * y] = block[(x - x0) + (x1 - x0) * (y - y0)];
                        }
                    }
                    progress.inc(1);
                }
            }

            for handle in handles {
                match handle.join() {
                    Ok(local_stats) => stats.merge(&local_stats),
                    Err(_) => log::warn!("A render worker panicked, its statistics are lost."),
                }
            }
        });
        progress.finish_and_clear();

        Ok(TransmittanceImage {
            width,
            height,
            pixels: output,
            stats,
        })
    }
}
