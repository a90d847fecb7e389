// Copyright 2020 TwoCookingMice

use hetvol::core::medium_loader::load_medium;
use hetvol::io::exr_utils;
use hetvol::renderers::transmittance::TransmittanceRenderer;

use std::env;

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <medium.xml> <output.exr> [--res N] [--spp N] [--seed N] [--stats]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut resolution: usize = 256;
    let mut spp: u32 = 4;
    let mut seed: u64 = 0;
    let mut print_stats = false;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--res" => {
                i += 1;
                resolution = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(resolution);
            }
            "--spp" => {
                i += 1;
                spp = args.get(i).and_then(|v| v.parse::<u32>().ok()).unwrap_or(spp);
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
            }
            "--stats" => print_stats = true,
            other => log::warn!("Ignoring unknown argument {}.", other),
        }
        i += 1;
    }

    let medium = match load_medium(input_path) {
        Ok(medium) => medium,
        Err(e) => {
            eprintln!("Failed to load {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let renderer = TransmittanceRenderer::new(resolution, spp, seed);
    let image = match renderer.render(medium.as_ref()) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Failed to render {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = exr_utils::write_grey_exr(&image.pixels, image.width, image.height, output_path) {
        eprintln!("EXR written error: {}.", e);
        std::process::exit(1);
    }

    if print_stats {
        println!("{}", image.stats);
    }
}
