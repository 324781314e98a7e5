//! Grouping pixels into segments by coverage fingerprint.
//!
//! Covered pixels with the same fingerprint form one segment no matter where
//! they are. Background pixels are split further into 4-connected zero
//! patches, each its own segment.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::schema::SourceImage;

use super::{CoverageIndex, Fingerprint};

/// Identity of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKey {
    /// Pixels covered by exactly this set of circles.
    Covered(Fingerprint),
    /// A connected patch of uncovered pixels, numbered in scan order.
    Background { patch: u32 },
}

impl SegmentKey {
    pub fn is_background(&self) -> bool {
        matches!(self, SegmentKey::Background { .. })
    }
}

/// Inclusive pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

/// A group of pixels sharing one fingerprint (or one background patch).
#[derive(Debug, Clone)]
pub struct Segment {
    pub key: SegmentKey,
    pub pixel_count: usize,
    /// Mean source value over the segment.
    pub average: f32,
    /// `average` quantized to the grey step.
    pub color: u8,
    /// Mean pixel center, in pixel units.
    pub centroid: (f32, f32),
    pub bounds: PixelBounds,
}

/// Data for drawing a segment's grey level as text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLabel {
    /// Quantized grey level index, `color / step`.
    pub level: u8,
    /// Centroid in normalized image coordinates.
    pub centroid: (f32, f32),
    pub pixel_count: usize,
}

/// Quantize an average grey value to the nearest multiple of `step`.
///
/// Computed as `floor((avg + step / 2) / step) * step`, clamped to `0..=255`.
#[inline]
pub fn quantize(average: f32, step: u8) -> u8 {
    let step = step.max(1) as f32;
    let level = ((average + step * 0.5) / step).floor();
    (level * step).clamp(0.0, 255.0) as u8
}

/// Running sums for one segment.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: u64,
    color_sum: u64,
    x_sum: u64,
    y_sum: u64,
    first_pixel: usize,
    bounds: PixelBounds,
}

impl Accumulator {
    fn new(x: usize, y: usize, pixel: usize, value: u8) -> Self {
        Self {
            count: 1,
            color_sum: value as u64,
            x_sum: x as u64,
            y_sum: y as u64,
            first_pixel: pixel,
            bounds: PixelBounds {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            },
        }
    }

    fn add(&mut self, x: usize, y: usize, pixel: usize, value: u8) {
        self.merge(&Self::new(x, y, pixel, value));
    }

    fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.color_sum += other.color_sum;
        self.x_sum += other.x_sum;
        self.y_sum += other.y_sum;
        self.first_pixel = self.first_pixel.min(other.first_pixel);
        self.bounds.min_x = self.bounds.min_x.min(other.bounds.min_x);
        self.bounds.min_y = self.bounds.min_y.min(other.bounds.min_y);
        self.bounds.max_x = self.bounds.max_x.max(other.bounds.max_x);
        self.bounds.max_y = self.bounds.max_y.max(other.bounds.max_y);
    }

    fn finish(&self, key: SegmentKey, step: u8) -> Segment {
        let n = self.count as f64;
        let average = (self.color_sum as f64 / n) as f32;
        Segment {
            key,
            pixel_count: self.count as usize,
            average,
            color: quantize(average, step),
            centroid: (
                (self.x_sum as f64 / n + 0.5) as f32,
                (self.y_sum as f64 / n + 0.5) as f32,
            ),
            bounds: self.bounds,
        }
    }
}

const UNASSIGNED: u32 = u32::MAX;

/// Segments of an image plus the segment index of every pixel.
#[derive(Debug, Clone)]
pub struct SegmentMap {
    width: usize,
    height: usize,
    segments: Vec<Segment>,
    assignments: Vec<u32>,
}

impl SegmentMap {
    /// Aggregate `image` over the fingerprints in `index`.
    ///
    /// Segments are ordered by the first pixel (in scan order) that belongs
    /// to them, so the result does not depend on thread scheduling.
    pub fn build(index: &CoverageIndex, image: &SourceImage, grey_step: u8) -> Self {
        let width = image.width;
        let height = image.height;
        debug_assert_eq!(index.len(), image.len());

        // Covered pixels: one parallel pass by row into per-worker maps.
        let covered: HashMap<&[u64], Accumulator> = (0..height)
            .into_par_iter()
            .fold(HashMap::new, |mut map, y| {
                for x in 0..width {
                    let pixel = y * width + x;
                    if index.is_background(pixel) {
                        continue;
                    }
                    let value = image.pixels[pixel];
                    map.entry(index.words(pixel))
                        .and_modify(|acc: &mut Accumulator| acc.add(x, y, pixel, value))
                        .or_insert_with(|| Accumulator::new(x, y, pixel, value));
                }
                map
            })
            .reduce(HashMap::new, |mut into, from| {
                for (key, acc) in from {
                    into.entry(key)
                        .and_modify(|existing| existing.merge(&acc))
                        .or_insert(acc);
                }
                into
            });

        // Background pixels: sequential flood fill into zero patches.
        let mut patch_of = vec![UNASSIGNED; width * height];
        let patches = flood_fill_background(index, image, &mut patch_of);

        let mut entries: Vec<(SegmentKey, Accumulator)> = covered
            .iter()
            .map(|(words, acc)| {
                let key = SegmentKey::Covered(Fingerprint::from_words(index.num_circles(), words));
                (key, *acc)
            })
            .chain(
                patches
                    .iter()
                    .enumerate()
                    .map(|(p, acc)| (SegmentKey::Background { patch: p as u32 }, *acc)),
            )
            .collect();
        entries.sort_by_key(|(_, acc)| acc.first_pixel);

        let mut covered_ids: HashMap<&[u64], u32> = HashMap::with_capacity(covered.len());
        let mut patch_ids = vec![0u32; patches.len()];
        let mut segments = Vec::with_capacity(entries.len());
        for (id, (key, acc)) in entries.into_iter().enumerate() {
            match &key {
                SegmentKey::Covered(_) => {
                    covered_ids.insert(index.words(acc.first_pixel), id as u32);
                }
                SegmentKey::Background { patch } => patch_ids[*patch as usize] = id as u32,
            }
            segments.push(acc.finish(key, grey_step));
        }

        let mut assignments = patch_of;
        assignments
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, slot) in row.iter_mut().enumerate() {
                    let pixel = y * width + x;
                    *slot = if *slot == UNASSIGNED {
                        covered_ids[index.words(pixel)]
                    } else {
                        patch_ids[*slot as usize]
                    };
                }
            });

        Self {
            width,
            height,
            segments,
            assignments,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment index of every pixel, row-major.
    pub fn assignments(&self) -> &[u32] {
        &self.assignments
    }

    /// The segment a pixel belongs to.
    pub fn segment_of(&self, pixel: usize) -> &Segment {
        &self.segments[self.assignments[pixel] as usize]
    }

    /// Paint every pixel with its segment's quantized color.
    pub fn reconstruct(&self) -> Vec<u8> {
        let mut pixels = vec![0u8; self.width * self.height];
        pixels
            .par_chunks_mut(self.width)
            .zip(self.assignments.par_chunks(self.width))
            .for_each(|(row, ids)| {
                for (out, &id) in row.iter_mut().zip(ids) {
                    *out = self.segments[id as usize].color;
                }
            });
        pixels
    }

    /// Label records for every segment, for vector rendering.
    pub fn segment_labels(&self, grey_step: u8) -> Vec<SegmentLabel> {
        let step = grey_step.max(1);
        self.segments
            .iter()
            .map(|s| SegmentLabel {
                level: s.color / step,
                centroid: (
                    s.centroid.0 / self.width as f32,
                    s.centroid.1 / self.height as f32,
                ),
                pixel_count: s.pixel_count,
            })
            .collect()
    }
}

/// Label 4-connected background regions.
///
/// Writes the patch number of every background pixel into `patch_of` and
/// returns one accumulator per patch, numbered in scan order of their first
/// pixel.
fn flood_fill_background(
    index: &CoverageIndex,
    image: &SourceImage,
    patch_of: &mut [u32],
) -> Vec<Accumulator> {
    let width = image.width;
    let height = image.height;
    let mut patches = Vec::new();
    let mut stack = Vec::new();

    for start in 0..width * height {
        if patch_of[start] != UNASSIGNED || !index.is_background(start) {
            continue;
        }
        let patch = patches.len() as u32;
        let mut acc = Accumulator::new(start % width, start / width, start, image.pixels[start]);
        patch_of[start] = patch;
        stack.push(start);

        while let Some(pixel) = stack.pop() {
            let (x, y) = (pixel % width, pixel / width);
            if pixel != start {
                acc.add(x, y, pixel, image.pixels[pixel]);
            }

            let neighbours = [
                (x > 0).then(|| pixel - 1),
                (x + 1 < width).then(|| pixel + 1),
                (y > 0).then(|| pixel - width),
                (y + 1 < height).then(|| pixel + width),
            ];
            for next in neighbours.into_iter().flatten() {
                if patch_of[next] == UNASSIGNED && index.is_background(next) {
                    patch_of[next] = patch;
                    stack.push(next);
                }
            }
        }
        patches.push(acc);
    }

    patches
}
