// Copyright @yucwang 2026

use crate::core::error::MediumError;
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::transform::Transform;
use crate::volumes::{wrap_coord3, VolumeFilterMode, VolumeWrapMode};
use std::fs;
use std::path::Path;

/// Dense voxel grid read from a binary `VOL` file (version 3, float32).
///
/// One channel grids serve float lookups, three channel grids serve
/// spectrum and vector lookups. The grid maximum is computed when the data
/// is loaded so that lookups never touch mutable state.
pub struct GridVolume {
    data: Vec<Float>,
    xres: usize,
    yres: usize,
    zres: usize,
    channels: usize,
    bbox: AABB,
    to_world: Transform,
    filter_mode: VolumeFilterMode,
    wrap_mode: VolumeWrapMode,
    max_value: Float,
}

impl GridVolume {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MediumError> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| MediumError::Volume(format!("failed to read {}: {}", path.display(), e)))?;
        let volume = Self::from_bytes(&bytes)?;
        log::info!(
            "Loaded grid volume {}: {}x{}x{}, {} channel(s), max value {}.",
            path.display(),
            volume.xres,
            volume.yres,
            volume.zres,
            volume.channels,
            volume.max_value
        );
        Ok(volume)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MediumError> {
        let mut cursor = 4usize;

        if bytes.len() < 4 {
            return Err(MediumError::Volume("vol file too small".to_string()));
        }
        if &bytes[0..3] != b"VOL" {
            return Err(MediumError::Volume("invalid vol header".to_string()));
        }
        let version = bytes[3];
        if version != 3 {
            return Err(MediumError::Volume(format!("unsupported vol version: {}", version)));
        }

        let encoding = read_i32(bytes, &mut cursor)?;
        let xres = read_i32(bytes, &mut cursor)?;
        let yres = read_i32(bytes, &mut cursor)?;
        let zres = read_i32(bytes, &mut cursor)?;
        let channels = read_i32(bytes, &mut cursor)?;

        if encoding != 1 {
            return Err(MediumError::Volume(format!("unsupported vol encoding: {}", encoding)));
        }
        if xres <= 0 || yres <= 0 || zres <= 0 || channels <= 0 {
            return Err(MediumError::Volume("vol dimensions must be positive".to_string()));
        }

        let mut corners = [0.0; 6];
        for c in corners.iter_mut() {
            *c = read_f32(bytes, &mut cursor)?;
        }
        let bbox = AABB::new(
            Vector3f::new(corners[0], corners[1], corners[2]),
            Vector3f::new(corners[3], corners[4], corners[5]),
        );

        let (xres, yres, zres, channels) = (xres as usize, yres as usize, zres as usize, channels as usize);
        let expected = xres
            .checked_mul(yres)
            .and_then(|v| v.checked_mul(zres))
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| MediumError::Volume("vol dimensions overflow".to_string()))?;
        let mut data = Vec::with_capacity(expected);
        for _ in 0..expected {
            data.push(read_f32(bytes, &mut cursor)?);
        }

        Self::from_data(data, (xres, yres, zres), channels, bbox)
    }

    /// Build a grid from voxel data laid out as `((z * yres + y) * xres + x) * channels + c`.
    pub fn from_data(
        data: Vec<Float>,
        res: (usize, usize, usize),
        channels: usize,
        bbox: AABB,
    ) -> Result<Self, MediumError> {
        let (xres, yres, zres) = res;
        if channels != 1 && channels != 3 {
            return Err(MediumError::Volume(format!("unsupported vol channels: {}", channels)));
        }
        if xres == 0 || yres == 0 || zres == 0 || data.len() != xres * yres * zres * channels {
            return Err(MediumError::Volume(format!(
                "voxel count {} does not match {}x{}x{}x{}",
                data.len(), xres, yres, zres, channels
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(MediumError::Volume("vol data contains non-finite values".to_string()));
        }
        let diag = bbox.diagnal();
        if diag.x <= 0.0 || diag.y <= 0.0 || diag.z <= 0.0 {
            return Err(MediumError::Volume("vol bounding box is degenerate".to_string()));
        }

        let max_value = data.iter().cloned().fold(0.0, Float::max);

        Ok(Self {
            data,
            xres,
            yres,
            zres,
            channels,
            bbox,
            to_world: Transform::default(),
            filter_mode: VolumeFilterMode::Trilinear,
            wrap_mode: VolumeWrapMode::Clamp,
            max_value,
        })
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.to_world = transform;
    }

    pub fn set_filter_mode(&mut self, filter_mode: VolumeFilterMode) {
        self.filter_mode = filter_mode;
    }

    pub fn set_wrap_mode(&mut self, wrap_mode: VolumeWrapMode) {
        self.wrap_mode = wrap_mode;
    }

    fn fetch(&self, x: usize, y: usize, z: usize, channel: usize) -> Float {
        let idx = ((z * self.yres + y) * self.xres + x) * self.channels + channel;
        self.data[idx]
    }

    fn sample_nearest(&self, p: Vector3f) -> Vector3f {
        let x = p.x * (self.xres as Float - 1.0);
        let y = p.y * (self.yres as Float - 1.0);
        let z = p.z * (self.zres as Float - 1.0);

        let x0 = ((x + 0.5).floor() as isize).clamp(0, self.xres as isize - 1) as usize;
        let y0 = ((y + 0.5).floor() as isize).clamp(0, self.yres as isize - 1) as usize;
        let z0 = ((z + 0.5).floor() as isize).clamp(0, self.zres as isize - 1) as usize;

        self.sample_channels(x0, y0, z0)
    }

    fn sample_trilinear(&self, p: Vector3f) -> Vector3f {
        let x = p.x * (self.xres as Float - 1.0);
        let y = p.y * (self.yres as Float - 1.0);
        let z = p.z * (self.zres as Float - 1.0);

        let x0 = x.floor() as isize;
        let y0 = y.floor() as isize;
        let z0 = z.floor() as isize;

        let tx = x - x0 as Float;
        let ty = y - y0 as Float;
        let tz = z - z0 as Float;

        let xi = |v: isize| v.clamp(0, self.xres as isize - 1) as usize;
        let yi = |v: isize| v.clamp(0, self.yres as isize - 1) as usize;
        let zi = |v: isize| v.clamp(0, self.zres as isize - 1) as usize;
        let (x0u, x1u) = (xi(x0), xi(x0 + 1));
        let (y0u, y1u) = (yi(y0), yi(y0 + 1));
        let (z0u, z1u) = (zi(z0), zi(z0 + 1));

        let c00 = self.sample_channels(x0u, y0u, z0u) * (1.0 - tx) + self.sample_channels(x1u, y0u, z0u) * tx;
        let c10 = self.sample_channels(x0u, y1u, z0u) * (1.0 - tx) + self.sample_channels(x1u, y1u, z0u) * tx;
        let c01 = self.sample_channels(x0u, y0u, z1u) * (1.0 - tx) + self.sample_channels(x1u, y0u, z1u) * tx;
        let c11 = self.sample_channels(x0u, y1u, z1u) * (1.0 - tx) + self.sample_channels(x1u, y1u, z1u) * tx;

        let c0 = c00 * (1.0 - ty) + c10 * ty;
        let c1 = c01 * (1.0 - ty) + c11 * ty;

        c0 * (1.0 - tz) + c1 * tz
    }

    fn sample_channels(&self, x: usize, y: usize, z: usize) -> Vector3f {
        if self.channels == 1 {
            let v = self.fetch(x, y, z, 0);
            Vector3f::new(v, v, v)
        } else {
            Vector3f::new(self.fetch(x, y, z, 0), self.fetch(x, y, z, 1), self.fetch(x, y, z, 2))
        }
    }

    fn eval(&self, p_world: Vector3f) -> Vector3f {
        let p = self.to_world.inv_apply_point(p_world);
        let diag = self.bbox.diagnal();
        let p = Vector3f::new(
            (p.x - self.bbox.p_min.x) / diag.x,
            (p.y - self.bbox.p_min.y) / diag.y,
            (p.z - self.bbox.p_min.z) / diag.z,
        );
        let p = wrap_coord3(p, self.wrap_mode);

        match self.filter_mode {
            VolumeFilterMode::Nearest => self.sample_nearest(p),
            VolumeFilterMode::Trilinear => self.sample_trilinear(p),
        }
    }
}

impl Volume for GridVolume {
    fn bbox(&self) -> Option<AABB> {
        let min = self.bbox.p_min;
        let max = self.bbox.p_max;
        let corners = [
            Vector3f::new(min.x, min.y, min.z),
            Vector3f::new(max.x, min.y, min.z),
            Vector3f::new(min.x, max.y, min.z),
            Vector3f::new(max.x, max.y, min.z),
            Vector3f::new(min.x, min.y, max.z),
            Vector3f::new(max.x, min.y, max.z),
            Vector3f::new(min.x, max.y, max.z),
            Vector3f::new(max.x, max.y, max.z),
        ];
        let mut out = AABB::default();
        for corner in corners.iter() {
            out.expand_by_point(&self.to_world.apply_point(*corner));
        }
        Some(out)
    }

    fn supports_float_lookups(&self) -> bool {
        self.channels == 1
    }

    fn supports_spectrum_lookups(&self) -> bool {
        self.channels == 3
    }

    fn supports_vector_lookups(&self) -> bool {
        self.channels == 3
    }

    fn lookup_float(&self, p_world: Vector3f) -> Float {
        if self.channels != 1 {
            return 0.0;
        }
        self.eval(p_world).x
    }

    fn lookup_spectrum(&self, p_world: Vector3f) -> RGBSpectrum {
        if self.channels != 3 {
            return RGBSpectrum::default();
        }
        RGBSpectrum::from_vector(self.eval(p_world))
    }

    fn lookup_vector(&self, p_world: Vector3f) -> Vector3f {
        if self.channels != 3 {
            return Vector3f::zeros();
        }
        self.eval(p_world)
    }

    /// Half of the smallest voxel spacing, measured in world space.
    fn step_size(&self) -> Float {
        let diag = self.bbox.diagnal();
        let res = [self.xres, self.yres, self.zres];
        let mut step = std::f64::INFINITY;
        for axis in 0..3 {
            if res[axis] < 2 {
                continue;
            }
            let mut spacing = Vector3f::zeros();
            spacing[axis] = diag[axis] / (res[axis] - 1) as Float;
            step = step.min(0.5 * self.to_world.apply_vector(spacing).norm());
        }
        step
    }

    fn maximum_float_value(&self) -> Float {
        self.max_value
    }
}

fn read_i32(bytes: &[u8], cursor: &mut usize) -> Result<i32, MediumError> {
    if *cursor + 4 > bytes.len() {
        return Err(MediumError::Volume("unexpected eof while reading i32".to_string()));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32(bytes: &[u8], cursor: &mut usize) -> Result<Float, MediumError> {
    if *cursor + 4 > bytes.len() {
        return Err(MediumError::Volume("unexpected eof while reading f32".to_string()));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(f32::from_le_bytes(buf) as Float)
}
