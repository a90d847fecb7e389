// Copyright @yucwang 2021

pub mod core;
pub mod io;
pub mod math;
pub mod media;
pub mod renderers;
pub mod volumes;
