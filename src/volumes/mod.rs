// Copyright @yucwang 2026

pub mod const_volume;
pub mod grid_volume;

use crate::math::constants::{Float, Vector3f};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeFilterMode {
    Nearest,
    Trilinear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeWrapMode {
    Repeat,
    Mirror,
    Clamp,
}

impl FromStr for VolumeFilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(VolumeFilterMode::Nearest),
            "trilinear" => Ok(VolumeFilterMode::Trilinear),
            other => Err(format!("unknown filter mode: {}", other)),
        }
    }
}

impl FromStr for VolumeWrapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "repeat" => Ok(VolumeWrapMode::Repeat),
            "mirror" => Ok(VolumeWrapMode::Mirror),
            "clamp" => Ok(VolumeWrapMode::Clamp),
            other => Err(format!("unknown wrap mode: {}", other)),
        }
    }
}

fn wrap_coord(value: Float, mode: VolumeWrapMode) -> Float {
    match mode {
        VolumeWrapMode::Clamp => value.clamp(0.0, 1.0),
        VolumeWrapMode::Repeat => {
            let mut v = value - value.floor();
            if v < 0.0 {
                v += 1.0;
            }
            v
        }
        VolumeWrapMode::Mirror => {
            let mut v = value % 2.0;
            if v < 0.0 {
                v += 2.0;
            }
            if v > 1.0 {
                2.0 - v
            } else {
                v
            }
        }
    }
}

pub(crate) fn wrap_coord3(value: Vector3f, mode: VolumeWrapMode) -> Vector3f {
    Vector3f::new(
        wrap_coord(value.x, mode),
        wrap_coord(value.y, mode),
        wrap_coord(value.z, mode),
    )
}
