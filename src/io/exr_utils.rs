/* Copyright 2020 @TwoCookingMice */

use crate::math::constants::Float;

use exr::prelude::*;

/// Writes a single-valued image (e.g. transmittance) as a grey RGB EXR.
pub fn write_grey_exr(image: &[Float],
                      width: usize,
                      height: usize,
                      file_path: &str) -> exr::error::Result<()> {
    log::info!("Starting writing openexr images: {}.", file_path);

    write_rgb_file(file_path, width, height, |x, y| {
        let v = image[y * width + x] as f32;
        (v, v, v)
    })?;
    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grey_image_reads_back() {
        let path = std::env::temp_dir().join(format!("hetvol_exr_{}.exr", std::process::id()));
        let path_str = path.to_str().unwrap();
        let pixels: Vec<Float> = (0..12).map(|i| i as Float / 12.0).collect();
        write_grey_exr(&pixels, 4, 3, path_str).unwrap();

        let image = read_first_rgba_layer_from_file(
            path_str,
            |resolution, _| vec![0.0f32; resolution.width() * resolution.height()],
            |data: &mut Vec<f32>, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                assert_eq!(r, g);
                assert_eq!(g, b);
                data[position.y() * 4 + position.x()] = r;
            },
        )
        .unwrap();
        let data = image.layer_data.channel_data.pixels;
        assert!((data[5] - 5.0 / 12.0).abs() < 1e-6);
        std::fs::remove_file(&path).unwrap();
    }
}
