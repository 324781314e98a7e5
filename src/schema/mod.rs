//! Schema module - Circle, image and configuration types for the placement search.

mod circle;
mod config;
mod evolution;
mod image;

pub use circle::*;
pub use config::*;
pub use evolution::*;
pub use image::*;
