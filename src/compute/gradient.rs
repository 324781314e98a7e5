//! Image gradient field and edge-alignment rating of circles.
//!
//! The gradient is estimated per pixel with central differences of the
//! horizontal and vertical neighbours. A circle is rated by sampling the
//! field around its outline and measuring how radial the gradient is there.

use rayon::prelude::*;

use crate::schema::{Circle, SourceImage};

/// Default number of samples taken around a circle's outline.
pub const DEFAULT_RATING_SAMPLES: usize = 200;

/// Lower bound on outline samples.
pub const MIN_RATING_SAMPLES: usize = 100;

/// Compute the central-difference gradient of a grayscale buffer.
/// Returns (gradient_x, gradient_y) as flat vectors.
///
/// Border pixels get a zero gradient.
pub fn central_difference_gradient(
    pixels: &[u8],
    width: usize,
    height: usize,
) -> (Vec<f32>, Vec<f32>) {
    let mut grad_x = vec![0.0f32; width * height];
    let mut grad_y = vec![0.0f32; width * height];
    if width < 3 || height < 3 {
        return (grad_x, grad_y);
    }

    grad_x
        .par_chunks_mut(width)
        .zip(grad_y.par_chunks_mut(width))
        .enumerate()
        .skip(1)
        .take(height - 2)
        .for_each(|(y, (row_x, row_y))| {
            let row_prev = (y - 1) * width;
            let row_curr = y * width;
            let row_next = (y + 1) * width;
            for x in 1..width - 1 {
                row_x[x] =
                    (pixels[row_curr + x + 1] as f32 - pixels[row_curr + x - 1] as f32) * 0.5;
                row_y[x] = (pixels[row_next + x] as f32 - pixels[row_prev + x] as f32) * 0.5;
            }
        });

    (grad_x, grad_y)
}

/// Per-pixel gradient of a source image, used to rate candidate circles.
#[derive(Debug, Clone)]
pub struct GradientField {
    width: usize,
    height: usize,
    grad_x: Vec<f32>,
    grad_y: Vec<f32>,
    samples: usize,
}

impl GradientField {
    /// Build the gradient field for an image.
    pub fn new(image: &SourceImage) -> Self {
        let (grad_x, grad_y) = central_difference_gradient(&image.pixels, image.width, image.height);
        Self {
            width: image.width,
            height: image.height,
            grad_x,
            grad_y,
            samples: DEFAULT_RATING_SAMPLES,
        }
    }

    /// Use a different number of outline samples (at least [`MIN_RATING_SAMPLES`]).
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(MIN_RATING_SAMPLES);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Gradient at integer pixel coordinates; zero outside the image.
    #[inline]
    pub fn lookup(&self, x: i64, y: i64) -> (f32, f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return (0.0, 0.0);
        }
        let idx = y as usize * self.width + x as usize;
        (self.grad_x[idx], self.grad_y[idx])
    }

    /// Bilinearly interpolated gradient at fractional pixel coordinates.
    pub fn sample(&self, px: f32, py: f32) -> (f32, f32) {
        let x0 = px.floor();
        let y0 = py.floor();
        let tx = px - x0;
        let ty = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let lerp = |a: (f32, f32), b: (f32, f32), t: f32| {
            (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
        };
        let top = lerp(self.lookup(x0, y0), self.lookup(x0 + 1, y0), tx);
        let bottom = lerp(self.lookup(x0, y0 + 1), self.lookup(x0 + 1, y0 + 1), tx);
        lerp(top, bottom, ty)
    }

    /// Mean absolute radial gradient around the circle's outline.
    ///
    /// High values mean the outline follows an edge of the source image.
    pub fn rate_circle(&self, circle: &Circle) -> f32 {
        let w = self.width as f32;
        let h = self.height as f32;
        let mut sum = 0.0f32;

        for s in 0..self.samples {
            let angle = s as f32 / self.samples as f32 * std::f32::consts::TAU;
            let (rx, ry) = (angle.cos(), angle.sin());
            // Pixel i has its center at normalized (i + 0.5) / size.
            let px = w * (circle.x + rx * circle.radius) - 0.5;
            let py = h * (circle.y + ry * circle.radius) - 0.5;
            let (gx, gy) = self.sample(px, py);
            sum += (gx * rx + gy * ry).abs();
        }

        sum / self.samples as f32
    }

    /// Finite-difference estimate of d(rating)/d(x, y, radius).
    fn rating_gradient(&self, circle: &Circle) -> (f32, f32, f32) {
        let hx = 1.0 / self.width as f32;
        let hy = 1.0 / self.height as f32;
        let rate = |dx: f32, dy: f32, dr: f32| self.rate_circle(&circle.offset(dx, dy, dr));

        (
            (rate(hx, 0.0, 0.0) - rate(-hx, 0.0, 0.0)) / (2.0 * hx),
            (rate(0.0, hy, 0.0) - rate(0.0, -hy, 0.0)) / (2.0 * hy),
            (rate(0.0, 0.0, hy) - rate(0.0, 0.0, -hy)) / (2.0 * hy),
        )
    }

    /// Hill-climb a circle along the rating gradient.
    ///
    /// Takes `num_steps` steps of `step_size * gradient` and returns the
    /// best-rated circle visited together with its rating.
    pub fn optimize_circle(&self, circle: Circle, num_steps: usize, step_size: f32) -> (Circle, f32) {
        let mut best = circle;
        let mut best_rating = self.rate_circle(&circle);
        let mut current = circle;

        for _ in 0..num_steps {
            let (gx, gy, gr) = self.rating_gradient(&current);
            current = current.offset(gx * step_size, gy * step_size, gr * step_size);
            let rating = self.rate_circle(&current);
            if rating > best_rating {
                best_rating = rating;
                best = current;
            }
        }

        (best, best_rating)
    }

    /// Hill-climb every circle of a list independently.
    pub fn optimize_circles(&self, circles: &[Circle], num_steps: usize, step_size: f32) -> Vec<Circle> {
        circles
            .par_iter()
            .map(|&c| self.optimize_circle(c, num_steps, step_size).0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dark image with a bright disc centered at (0.5, 0.5).
    fn disc_image(size: usize, radius: f32) -> SourceImage {
        let mut pixels = vec![0u8; size * size];
        for y in 0..size {
            for x in 0..size {
                let fx = (x as f32 + 0.5) / size as f32 - 0.5;
                let fy = (y as f32 + 0.5) / size as f32 - 0.5;
                if fx * fx + fy * fy <= radius * radius {
                    pixels[y * size + x] = 255;
                }
            }
        }
        SourceImage::new(size, size, pixels).unwrap()
    }

    #[test]
    fn test_gradient_uniform() {
        let image = SourceImage::uniform(16, 16, 128).unwrap();
        let (gx, gy) = central_difference_gradient(&image.pixels, 16, 16);
        assert!(gx.iter().chain(gy.iter()).all(|&v| v == 0.0));
    }

    #[test]
    fn test_gradient_horizontal_ramp() {
        let width = 16;
        let height = 8;
        let pixels: Vec<u8> = (0..width * height).map(|i| (i % width * 10) as u8).collect();
        let (gx, gy) = central_difference_gradient(&pixels, width, height);

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let idx = y * width + x;
                assert!((gx[idx] - 10.0).abs() < 1e-6, "gx at ({}, {})", x, y);
                assert_eq!(gy[idx], 0.0);
            }
        }
        // Border pixels stay zero.
        for x in 0..width {
            assert_eq!(gx[x], 0.0);
            assert_eq!(gx[(height - 1) * width + x], 0.0);
        }
        for y in 0..height {
            assert_eq!(gx[y * width], 0.0);
            assert_eq!(gx[y * width + width - 1], 0.0);
        }
    }

    #[test]
    fn test_tiny_image_has_zero_gradient() {
        let (gx, gy) = central_difference_gradient(&[0, 255, 0, 255], 2, 2);
        assert!(gx.iter().chain(gy.iter()).all(|&v| v == 0.0));
    }

    #[test]
    fn test_lookup_out_of_bounds_is_zero() {
        let field = GradientField::new(&disc_image(16, 0.3));
        assert_eq!(field.lookup(-1, 3), (0.0, 0.0));
        assert_eq!(field.lookup(3, 16), (0.0, 0.0));
        assert_eq!(field.sample(-10.0, -10.0), (0.0, 0.0));
    }

    #[test]
    fn test_bilinear_sample_midpoint() {
        let width = 8;
        let pixels: Vec<u8> = (0..width * width).map(|i| ((i % width) * (i % width)) as u8).collect();
        let field = GradientField::new(&SourceImage::new(width, width, pixels).unwrap());

        let a = field.lookup(3, 3);
        let b = field.lookup(4, 3);
        let mid = field.sample(3.5, 3.0);
        assert!((mid.0 - 0.5 * (a.0 + b.0)).abs() < 1e-5);
    }

    #[test]
    fn test_rating_prefers_aligned_circle() {
        let field = GradientField::new(&disc_image(64, 0.25));
        let aligned = field.rate_circle(&Circle::new(0.5, 0.5, 0.25));
        let shrunk = field.rate_circle(&Circle::new(0.5, 0.5, 0.1));
        let shifted = field.rate_circle(&Circle::new(0.3, 0.3, 0.15));

        assert!(aligned > 10.0, "aligned rating {}", aligned);
        assert!(aligned > shrunk * 5.0, "{} vs {}", aligned, shrunk);
        assert!(aligned > shifted, "{} vs {}", aligned, shifted);
    }

    #[test]
    fn test_rating_outside_image_is_zero() {
        let field = GradientField::new(&disc_image(32, 0.25));
        assert_eq!(field.rate_circle(&Circle::new(5.0, 5.0, 0.1)), 0.0);
    }

    #[test]
    fn test_with_samples_has_floor() {
        let field = GradientField::new(&disc_image(16, 0.25)).with_samples(3);
        assert_eq!(field.samples, MIN_RATING_SAMPLES);
    }

    #[test]
    fn test_optimize_never_worse() {
        let field = GradientField::new(&disc_image(64, 0.25));
        let start = Circle::new(0.52, 0.5, 0.23);
        let start_rating = field.rate_circle(&start);
        let (best, rating) = field.optimize_circle(start, 10, 1e-5);

        assert!(rating >= start_rating);
        assert!((field.rate_circle(&best) - rating).abs() < 1e-4);
    }

    #[test]
    fn test_optimize_circles_improves_each_circle() {
        let field = GradientField::new(&disc_image(64, 0.25));
        let circles = vec![
            Circle::new(0.52, 0.5, 0.23),
            Circle::new(0.5, 0.47, 0.27),
            Circle::new(0.3, 0.6, 0.1),
        ];

        assert_eq!(field.optimize_circles(&circles, 0, 1e-5), circles);
        assert!(field.optimize_circles(&[], 10, 1e-5).is_empty());

        let optimized = field.optimize_circles(&circles, 10, 1e-5);
        assert_eq!(optimized.len(), circles.len());
        for (before, after) in circles.iter().zip(&optimized) {
            assert!(field.rate_circle(after) >= field.rate_circle(before));
        }
    }
}
