//! Per-pixel coverage fingerprints.
//!
//! For a fixed circle list every pixel gets a bit-vector with one bit per
//! circle, set when the pixel center lies inside that circle. Pixels with
//! equal fingerprints are covered by exactly the same circles.
//!
//! The bits live in one arena owned by [`CoverageIndex`], `words_per_pixel`
//! words per pixel. The index is built once per circle list and must be
//! rebuilt whenever the list changes.

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::schema::Circle;

const WORD_BITS: usize = 64;

/// Owned coverage bit-vector of one pixel.
///
/// Equality and hashing are structural. The circle count is part of the
/// value, so fingerprints built against lists of different length never
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    num_circles: usize,
    words: Box<[u64]>,
}

impl Fingerprint {
    /// Copy a fingerprint out of raw words.
    pub fn from_words(num_circles: usize, words: &[u64]) -> Self {
        Self {
            num_circles,
            words: words.into(),
        }
    }

    /// Fingerprint with the given circle indices set.
    pub fn from_indices(num_circles: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut words = vec![0u64; words_per_pixel(num_circles)];
        for i in indices {
            words[i / WORD_BITS] |= 1 << (i % WORD_BITS);
        }
        Self {
            num_circles,
            words: words.into_boxed_slice(),
        }
    }

    /// Number of circles the fingerprint was built against.
    pub fn num_circles(&self) -> usize {
        self.num_circles
    }

    /// Whether circle `i` covers the pixel.
    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        i < self.num_circles && self.words[i / WORD_BITS] & (1 << (i % WORD_BITS)) != 0
    }

    /// True for pixels covered by no circle.
    pub fn is_background(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of covering circles.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of the covering circles, ascending.
    pub fn circles(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_circles).filter(move |&i| self.contains(i))
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

#[inline]
fn words_per_pixel(num_circles: usize) -> usize {
    num_circles.div_ceil(WORD_BITS).max(1)
}

/// Coverage fingerprints for every pixel of an image.
#[derive(Debug, Clone)]
pub struct CoverageIndex {
    width: usize,
    height: usize,
    num_circles: usize,
    words_per_pixel: usize,
    words: Vec<u64>,
}

impl CoverageIndex {
    /// Build fingerprints for `circles` over a `width` x `height` pixel grid.
    ///
    /// Circles are processed in parallel. Each circle only touches pixels in
    /// its bounding box and only its own bit, so bits are set with an atomic
    /// `fetch_or` and no circle ever reads another circle's bit.
    pub fn build(circles: &[Circle], width: usize, height: usize) -> Self {
        let wpp = words_per_pixel(circles.len());
        let arena: Vec<AtomicU64> = (0..width * height * wpp).map(|_| AtomicU64::new(0)).collect();

        circles.par_iter().enumerate().for_each(|(i, circle)| {
            let word = i / WORD_BITS;
            let bit = 1u64 << (i % WORD_BITS);
            let (x_range, y_range) = pixel_bounds(circle, width, height);
            let r2 = circle.radius * circle.radius;

            for y in y_range {
                let fy = (y as f32 + 0.5) / height as f32 - circle.y;
                for x in x_range.clone() {
                    let fx = (x as f32 + 0.5) / width as f32 - circle.x;
                    if fx * fx + fy * fy <= r2 {
                        arena[(y * width + x) * wpp + word].fetch_or(bit, Ordering::Relaxed);
                    }
                }
            }
        });

        Self {
            width,
            height,
            num_circles: circles.len(),
            words_per_pixel: wpp,
            words: arena.into_iter().map(AtomicU64::into_inner).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_circles(&self) -> usize {
        self.num_circles
    }

    /// Raw fingerprint words of a pixel, borrowed from the arena.
    #[inline]
    pub fn words(&self, pixel: usize) -> &[u64] {
        let start = pixel * self.words_per_pixel;
        &self.words[start..start + self.words_per_pixel]
    }

    /// Owned fingerprint of a pixel.
    pub fn fingerprint(&self, pixel: usize) -> Fingerprint {
        Fingerprint::from_words(self.num_circles, self.words(pixel))
    }

    /// True if no circle covers the pixel.
    #[inline]
    pub fn is_background(&self, pixel: usize) -> bool {
        self.words(pixel).iter().all(|&w| w == 0)
    }
}

/// Pixel ranges (x, y) that can contain centers inside the circle.
fn pixel_bounds(
    circle: &Circle,
    width: usize,
    height: usize,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let clamp = |v: f32, max: usize| v.clamp(0.0, max as f32) as usize;
    let min_x = clamp(((circle.x - circle.radius) * width as f32).floor(), width);
    let max_x = clamp(((circle.x + circle.radius) * width as f32).ceil(), width);
    let min_y = clamp(((circle.y - circle.radius) * height as f32).floor(), height);
    let max_y = clamp(((circle.y + circle.radius) * height as f32).ceil(), height);
    (min_x..max_x, min_y..max_y)
}
