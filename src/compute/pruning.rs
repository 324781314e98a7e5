//! Greedy pruning of candidate circles for legibility.
//!
//! Candidates are taken best first. A candidate is kept when its
//! intersections with the circles kept so far are neither too crowded nor
//! between circles of nearly equal size. Every kept circle then removes the
//! remaining candidates that would form an unacceptable pair with it.

use std::collections::VecDeque;

use rand::Rng;

use crate::schema::{Circle, PruningConfig, RatedCircle, TAG_ACCEPTED};

use super::{Point, distance_squared, intersection_points, point_distance_squared};

/// Circles kept by [`prune_circles`] and every intersection point recorded
/// between them.
#[derive(Debug, Clone, Default)]
pub struct PruneResult {
    pub circles: Vec<Circle>,
    pub intersections: Vec<Point>,
}

/// True when `d2` lies in the "too close but not the same point" band.
#[inline]
fn in_crowded_band(d2: f32, min_distance: f32, config: &PruningConfig) -> bool {
    d2 < min_distance * min_distance
        && d2 > config.max_distance_equality * config.max_distance_equality
}

/// Whether two circles can both be kept.
///
/// Rejects near-duplicates in (x, y, radius) space and pairs whose outline
/// extremes along the center line nearly coincide without being equal.
/// Symmetric in `a` and `b`.
pub fn acceptable_pair(a: &Circle, b: &Circle, config: &PruningConfig) -> bool {
    let d2 = distance_squared(a, b);
    let min_radius = a.radius.min(b.radius);
    if d2 < config.min_distance_3d * config.min_distance_3d || d2 < min_radius * min_radius {
        return false;
    }

    let (dx, dy) = (a.x - b.x, a.y - b.y);
    let len = (dx * dx + dy * dy).sqrt();
    // Concentric circles have no center line; any direction will do.
    let (ux, uy) = if len > 0.0 { (dx / len, dy / len) } else { (1.0, 0.0) };

    let a_ends = [
        (a.x + ux * a.radius, a.y + uy * a.radius),
        (a.x - ux * a.radius, a.y - uy * a.radius),
    ];
    let b_ends = [
        (b.x + ux * b.radius, b.y + uy * b.radius),
        (b.x - ux * b.radius, b.y - uy * b.radius),
    ];

    !a_ends.iter().any(|&p| {
        b_ends
            .iter()
            .any(|&q| in_crowded_band(point_distance_squared(p, q), config.min_distance_segments, config))
    })
}

/// Check a candidate's intersections against the accepted circles.
///
/// Fails if the candidate crosses an accepted circle of nearly the same
/// radius, or if any new intersection point crowds an existing one. On
/// success the candidate's new intersection points are appended to
/// `intersections`; on failure `intersections` is left untouched.
pub fn check_and_update_intersections(
    intersections: &mut Vec<Point>,
    accepted: &[Circle],
    candidate: &Circle,
    config: &PruningConfig,
) -> bool {
    let mut new_points = Vec::new();

    for other in accepted {
        let hits = intersection_points(candidate, other);
        if hits.count() == 0 {
            continue;
        }

        let (small, large) = if candidate.radius < other.radius {
            (candidate.radius, other.radius)
        } else {
            (other.radius, candidate.radius)
        };
        if large / small < config.min_radius_ratio {
            return false;
        }

        for p in hits.points() {
            let crowded = intersections.iter().any(|&q| {
                in_crowded_band(point_distance_squared(p, q), config.min_distance_intersection, config)
            });
            if crowded {
                return false;
            }
            new_points.push(p);
        }
    }

    intersections.extend(new_points);
    true
}

/// Prune a best-first list of candidates.
///
/// Every pair in the returned list passes [`acceptable_pair`]. Kept circles
/// are tagged with [`TAG_ACCEPTED`].
pub fn prune_circles(candidates: Vec<Circle>, config: &PruningConfig) -> PruneResult {
    let mut remaining: VecDeque<Circle> = candidates.into();
    let mut result = PruneResult::default();

    while let Some(candidate) = remaining.pop_front() {
        if !check_and_update_intersections(
            &mut result.intersections,
            &result.circles,
            &candidate,
            config,
        ) {
            continue;
        }

        result.circles.push(candidate.with_tag(TAG_ACCEPTED));
        remaining.retain(|c| acceptable_pair(c, &candidate, config));
    }

    result
}

/// Sort rated circles best first and prune them.
///
/// With a positive `config.wriggle`, each rating gets `U[0, wriggle)` noise
/// before sorting so repeated runs keep different circles.
pub fn prune_rated<R: Rng + ?Sized>(
    rated: &[RatedCircle],
    config: &PruningConfig,
    rng: &mut R,
) -> PruneResult {
    let mut keyed: Vec<(f32, Circle)> = rated
        .iter()
        .map(|rc| {
            let noise = if config.wriggle > 0.0 {
                rng.gen_range(0.0..config.wriggle)
            } else {
                0.0
            };
            (rc.rating + noise, rc.circle)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));

    prune_circles(keyed.into_iter().map(|(_, c)| c).collect(), config)
}
