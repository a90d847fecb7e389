// Copyright @yucwang 2021

pub mod error;
pub mod medium;
pub mod medium_loader;
pub mod phase;
pub mod rng;
pub mod stats;
pub mod volume;
