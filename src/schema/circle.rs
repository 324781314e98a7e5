//! Circle types shared by the placement search and its collaborators.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Provenance tag for circles that came from a seed file or a random draw.
pub const TAG_UNTAGGED: u32 = 0;

/// Provenance tag set on circles accepted by pruning.
pub const TAG_ACCEPTED: u32 = 1;

/// A circle in normalized image space.
///
/// `x`, `y` and `radius` are fractions of the image width/height, so a
/// circle fully inside the image satisfies `radius <= x <= 1 - radius`
/// (likewise for `y`). The `tag` records provenance (seed, pruning, which
/// crossover parent) and is only used for rendering and debugging.
///
/// Circles are values: derived circles are produced with [`Circle::offset`]
/// or [`Circle::with_tag`], never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center X as fraction of image width.
    pub x: f32,
    /// Center Y as fraction of image height.
    pub y: f32,
    /// Radius as fraction of image size.
    pub radius: f32,
    /// Provenance tag.
    #[serde(default)]
    pub tag: u32,
}

impl Circle {
    /// Create an untagged circle.
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            radius,
            tag: TAG_UNTAGGED,
        }
    }

    /// Copy of this circle carrying a different tag.
    pub fn with_tag(self, tag: u32) -> Self {
        Self { tag, ..self }
    }

    /// Copy of this circle moved by `(dx, dy)` with its radius changed by `dr`.
    ///
    /// The radius never goes negative.
    pub fn offset(self, dx: f32, dy: f32, dr: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            radius: (self.radius + dr).max(0.0),
            tag: self.tag,
        }
    }

    /// Center as a 2D point.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Draw a uniformly random circle with radius in `[min_radius, max_radius]`
    /// whose disc lies inside the unit square.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, min_radius: f32, max_radius: f32) -> Self {
        let radius = if max_radius > min_radius {
            rng.gen_range(min_radius..=max_radius)
        } else {
            min_radius
        };
        // Clamp so that a radius over 0.5 still yields a valid center range.
        let span = (1.0 - 2.0 * radius).max(0.0);
        let origin = radius.min(0.5);
        Self::new(
            origin + rng.r#gen::<f32>() * span,
            origin + rng.r#gen::<f32>() * span,
            radius,
        )
    }
}

/// A circle paired with a rating used to order pruning candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatedCircle {
    pub circle: Circle,
    /// Edge-alignment rating plus size-bucket bonus.
    pub rating: f32,
}

impl RatedCircle {
    pub fn new(circle: Circle, rating: f32) -> Self {
        Self { circle, rating }
    }
}
