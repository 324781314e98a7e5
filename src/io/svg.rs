//! SVG rendering of circle lists.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compute::SegmentLabel;
use crate::schema::Circle;

use super::IoError;

/// Stroke colors indexed by circle tag.
const TAG_COLORS: [&str; 6] = ["blue", "red", "green", "orange", "purple", "teal"];

/// Stroke color for a provenance tag.
pub fn tag_color(tag: u32) -> &'static str {
    TAG_COLORS[tag as usize % TAG_COLORS.len()]
}

/// Rendering options.
#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Width and height of the document in pixels.
    pub size: u32,
    /// Raster drawn underneath the circles, stretched to the full document.
    pub background: Option<PathBuf>,
    /// Segments smaller than this get no label.
    pub min_label_pixels: usize,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            size: 1024,
            background: None,
            min_label_pixels: 20,
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render circles, and optionally segment labels, as an SVG document.
///
/// Coordinates are written as percentages of the document size, so
/// normalized circle coordinates map directly.
pub fn render_svg(circles: &[Circle], labels: &[SegmentLabel], options: &SvgOptions) -> String {
    let mut svg = String::with_capacity(128 + circles.len() * 112 + labels.len() * 96);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{0}px" height="{0}px">"#,
        options.size
    );

    if let Some(background) = &options.background {
        let href = escape(&background.to_string_lossy());
        let _ = writeln!(
            svg,
            r#"  <image x="0%" y="0%" width="100%" height="100%" preserveAspectRatio="none" href="{0}" xlink:href="{0}"/>"#,
            href
        );
    }

    for c in circles {
        let _ = writeln!(
            svg,
            r#"  <circle cx="{}%" cy="{}%" r="{}%" fill="none" stroke="{}"/>"#,
            100.0 * c.x,
            100.0 * c.y,
            100.0 * c.radius,
            tag_color(c.tag)
        );
    }

    for label in labels.iter().filter(|l| l.pixel_count >= options.min_label_pixels) {
        let _ = writeln!(
            svg,
            r#"  <text x="{}%" y="{}%" font-size="10" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            100.0 * label.centroid.0,
            100.0 * label.centroid.1,
            label.level
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render and write an SVG file.
pub fn write_svg(
    path: &Path,
    circles: &[Circle],
    labels: &[SegmentLabel],
    options: &SvgOptions,
) -> Result<(), IoError> {
    fs::write(path, render_svg(circles, labels, options))?;
    Ok(())
}
