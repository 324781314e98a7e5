//! Circle algebra: distances, area overlap and circle-circle intersections.
//!
//! Every function returns a well-defined value for degenerate input
//! (coincident or concentric circles, zero radii) instead of NaN.

use crate::schema::Circle;

/// A point in normalized image space.
pub type Point = (f32, f32);

/// Distances below this are treated as zero when classifying intersections.
pub const GEOMETRY_EPSILON: f32 = 1e-6;

/// Reported by [`min_distance_to`] when there is nothing to measure against.
pub const NO_NEIGHBOUR_DISTANCE: f32 = 1.844_674_4e19;

/// Squared distance between two circles treated as points `(x, y, radius)`.
#[inline]
pub fn distance_squared(a: &Circle, b: &Circle) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dr = a.radius - b.radius;
    dx * dx + dy * dy + dr * dr
}

/// Squared distance between two points.
#[inline]
pub fn point_distance_squared(p: Point, q: Point) -> f32 {
    let dx = p.0 - q.0;
    let dy = p.1 - q.1;
    dx * dx + dy * dy
}

/// Distance between two circle centers.
#[inline]
pub fn center_distance(a: &Circle, b: &Circle) -> f32 {
    point_distance_squared(a.center(), b.center()).sqrt()
}

/// Smallest `(x, y, radius)` distance from `circle` to any of `others`.
///
/// Returns [`NO_NEIGHBOUR_DISTANCE`] for an empty slice.
pub fn min_distance_to(circle: &Circle, others: &[Circle]) -> f32 {
    others
        .iter()
        .map(|o| distance_squared(circle, o))
        .fold(None, |acc: Option<f32>, d| Some(acc.map_or(d, |m| m.min(d))))
        .map_or(NO_NEIGHBOUR_DISTANCE, f32::sqrt)
}

/// Largest [`overlap_percentage`] between `circle` and any of `others`.
pub fn max_overlap_with(circle: &Circle, others: &[Circle]) -> f32 {
    others
        .iter()
        .map(|o| overlap_percentage(circle, o))
        .fold(0.0, f32::max)
}

/// Fraction of area shared by two circles.
///
/// - Disjoint or touching circles: `0`.
/// - One circle inside the other: `smaller_area / larger_area`.
/// - Partial overlap: lens area divided by the smaller circle's area.
pub fn overlap_percentage(a: &Circle, b: &Circle) -> f32 {
    let (small, large) = if a.radius <= b.radius {
        (a.radius as f64, b.radius as f64)
    } else {
        (b.radius as f64, a.radius as f64)
    };
    if small <= 0.0 {
        return 0.0;
    }

    let d = center_distance(a, b) as f64;
    if d >= small + large {
        return 0.0;
    }
    if d <= large - small {
        return ((small * small) / (large * large)) as f32;
    }

    // Two circular segments meeting at the common chord.
    let cos_small = ((d * d + small * small - large * large) / (2.0 * d * small)).clamp(-1.0, 1.0);
    let cos_large = ((d * d + large * large - small * small) / (2.0 * d * large)).clamp(-1.0, 1.0);
    let kite = (-d + small + large) * (d + small - large) * (d - small + large) * (d + small + large);
    let lens = small * small * cos_small.acos() + large * large * cos_large.acos()
        - 0.5 * kite.max(0.0).sqrt();

    let small_area = std::f64::consts::PI * small * small;
    (lens / small_area).clamp(0.0, 1.0) as f32
}

/// Result of intersecting two circle outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    /// Disjoint, nested, concentric or coincident outlines.
    None,
    /// Tangent outlines.
    One(Point),
    /// Outlines crossing at two points.
    Two(Point, Point),
}

impl Intersection {
    /// Number of intersection points.
    pub fn count(&self) -> usize {
        match self {
            Intersection::None => 0,
            Intersection::One(_) => 1,
            Intersection::Two(_, _) => 2,
        }
    }

    /// Iterate over the intersection points.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let (first, second) = match *self {
            Intersection::None => (None, None),
            Intersection::One(p) => (Some(p), None),
            Intersection::Two(p, q) => (Some(p), Some(q)),
        };
        first.into_iter().chain(second)
    }
}

/// Intersect the outlines of two circles.
///
/// Centers further apart than the radius sum, nested circles and
/// concentric circles yield [`Intersection::None`]; centers exactly a radius
/// sum (or difference) apart yield a single tangent point.
pub fn intersection_points(a: &Circle, b: &Circle) -> Intersection {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d = (dx * dx + dy * dy).sqrt();

    if d < GEOMETRY_EPSILON {
        return Intersection::None;
    }
    let sum = a.radius + b.radius;
    let diff = (a.radius - b.radius).abs();
    if d > sum + GEOMETRY_EPSILON || d < diff - GEOMETRY_EPSILON {
        return Intersection::None;
    }

    let (ux, uy) = (dx / d, dy / d);
    // Signed distance from a's center to the chord midpoint along the center line.
    let along = (a.radius * a.radius - b.radius * b.radius + d * d) / (2.0 * d);
    let mid = (a.x + ux * along, a.y + uy * along);

    if (d - sum).abs() <= GEOMETRY_EPSILON || (d - diff).abs() <= GEOMETRY_EPSILON {
        return Intersection::One(mid);
    }

    let half_chord = (a.radius * a.radius - along * along).max(0.0).sqrt();
    Intersection::Two(
        (mid.0 - uy * half_chord, mid.1 + ux * half_chord),
        (mid.0 + uy * half_chord, mid.1 - ux * half_chord),
    )
}
