// Copyright @yucwang 2026

use hetvol::core::medium_loader::load_medium;
use hetvol::core::rng::LcgRng;
use hetvol::core::stats::TransportStats;
use hetvol::math::constants::{Float, Vector3f};
use hetvol::math::ray::Ray3f;
use std::env;

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 8 {
        eprintln!("Usage: {} <medium.xml> <ox> <oy> <oz> <dx> <dy> <dz> [--samples N] [--seed N]", args[0]);
        std::process::exit(1);
    }

    let medium_path = &args[1];
    let mut coords = [0.0 as Float; 6];
    for (k, value) in coords.iter_mut().enumerate() {
        *value = match args[2 + k].parse::<Float>() {
            Ok(v) => v,
            Err(_) => {
                eprintln!("Invalid coordinate '{}'.", args[2 + k]);
                std::process::exit(1);
            }
        };
    }

    let mut samples: u32 = 10000;
    let mut seed: u64 = 0;

    let mut i = 8;
    while i < args.len() {
        match args[i].as_str() {
            "--samples" => {
                i += 1;
                samples = args.get(i).and_then(|v| v.parse::<u32>().ok()).unwrap_or(samples);
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(seed);
            }
            _ => {}
        }
        i += 1;
    }

    let medium = match load_medium(medium_path) {
        Ok(medium) => medium,
        Err(e) => {
            eprintln!("Failed to load {}: {}", medium_path, e);
            std::process::exit(1);
        }
    };

    let ray = Ray3f::new(
        Vector3f::new(coords[0], coords[1], coords[2]),
        Vector3f::new(coords[3], coords[4], coords[5]),
        None,
        None,
    );
    let mut stats = TransportStats::new();
    let mut rng = LcgRng::new(seed);

    let deterministic = medium.transmittance_observed(&ray, None, &mut stats)[0];
    println!("Optical depth: {:.6}", -deterministic.ln());
    println!("Transmittance: {:.6}", deterministic);

    let mut estimate = 0.0;
    let mut hits = 0u32;
    let mut distance_sum = 0.0;
    for _ in 0..samples {
        estimate += medium.transmittance_observed(&ray, Some(&mut rng), &mut stats)[0];
        let (success, rec) = medium.sample_distance_observed(&ray, &mut rng, &mut stats);
        if success {
            hits += 1;
            distance_sum += rec.t;
        }
    }
    let n = samples.max(1) as Float;
    println!("Transmittance (estimated, {} samples): {:.6}", samples, estimate / n);
    println!("Scattering rate: {:.6}", hits as Float / n);
    if hits > 0 {
        println!("Mean interaction distance: {:.6}", distance_sum / hits as Float);
    }
    match medium.pdf_distance(&ray) {
        Ok(rec) => println!("pdf_failure: {:.6}, pdf_success(max_t): {:.6}", rec.pdf_failure, rec.pdf_success),
        Err(e) => println!("pdf_distance: {}", e),
    }
    println!("{}", stats);
}
