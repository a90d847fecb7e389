/* Copyright 2020 @Yuchen Wong */

use nalgebra as na;

pub type Float = f64;

pub type Vector3f = na::Vector3<Float>;
pub type Matrix4f = na::Matrix4<Float>;

pub const FLOAT_MIN: Float = std::f64::MIN;
pub const FLOAT_MAX: Float = std::f64::MAX;
pub const MACHINE_EPSILON: Float = std::f64::EPSILON;
