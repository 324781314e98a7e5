//! File formats the engine reads and writes.
//!
//! - circle lists: plain text, one `x,y,radius` per line
//! - seed folders: a directory of circle list files
//! - grayscale rasters via the `image` crate
//! - SVG renderings of circle lists

mod circle_file;
mod raster;
mod seed_folder;
mod svg;

pub use circle_file::*;
pub use raster::*;
pub use seed_folder::*;
pub use svg::*;

use std::path::PathBuf;

use crate::schema::ConfigError;

/// Errors from reading or writing external files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("Pixel buffer holds {found} values, expected {expected}")]
    BufferSize { expected: usize, found: usize },
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ConfigError),
}
