//! Configuration types for evaluation, circle generation and pruning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for turning a circle list into a reconstructed image and a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Number of grey levels the reconstruction is quantized to.
    #[serde(default = "default_grey_levels")]
    pub grey_levels: u8,
    /// Each segment adds `1 / segment_penalty_divisor` to the raw score.
    #[serde(default = "default_segment_penalty_divisor")]
    pub segment_penalty_divisor: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            grey_levels: default_grey_levels(),
            segment_penalty_divisor: default_segment_penalty_divisor(),
        }
    }
}

fn default_grey_levels() -> u8 {
    5
}
fn default_segment_penalty_divisor() -> f32 {
    500.0
}

impl EvaluationConfig {
    /// Distance between two adjacent quantized grey values.
    #[inline]
    pub fn grey_step(&self) -> u8 {
        255 / self.grey_levels.max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grey_levels == 0 {
            return Err(ConfigError::InvalidGreyLevels);
        }
        if self.segment_penalty_divisor <= 0.0 {
            return Err(ConfigError::InvalidSegmentPenalty);
        }
        Ok(())
    }
}

/// Thresholds for rejection-sampling random circles against an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Radius bounds (min, max) in normalized units.
    #[serde(default = "default_radius_bounds")]
    pub radius_bounds: (f32, f32),
    /// Edge-alignment rating a circle must exceed.
    #[serde(default = "default_min_rating")]
    pub min_rating: f32,
    /// Overlap with every accepted circle must stay below this fraction.
    #[serde(default = "default_max_overlap")]
    pub max_overlap: f32,
    /// 3D distance to every accepted circle must exceed this.
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    /// `rating * (1 - overlap) * distance` must exceed this.
    #[serde(default)]
    pub min_total_score: f32,
    /// Wall-clock budget for time-bounded seeding.
    #[serde(default = "default_time_budget")]
    pub time_budget: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            radius_bounds: default_radius_bounds(),
            min_rating: default_min_rating(),
            max_overlap: default_max_overlap(),
            min_distance: default_min_distance(),
            min_total_score: 0.0,
            time_budget: default_time_budget(),
        }
    }
}

impl GeneratorConfig {
    /// Configuration that accepts every circle within the radius bounds.
    pub fn unconstrained(radius_bounds: (f32, f32)) -> Self {
        Self {
            radius_bounds,
            min_rating: f32::NEG_INFINITY,
            max_overlap: f32::INFINITY,
            min_distance: f32::NEG_INFINITY,
            min_total_score: f32::NEG_INFINITY,
            time_budget: default_time_budget(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_radius_bounds(self.radius_bounds)
    }
}

fn default_radius_bounds() -> (f32, f32) {
    (0.01, 0.1)
}
fn default_min_rating() -> f32 {
    4.0
}
fn default_max_overlap() -> f32 {
    0.3
}
fn default_min_distance() -> f32 {
    0.01
}
fn default_time_budget() -> Duration {
    Duration::from_secs(5)
}

/// Settings for producing rated pruning candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatedGeneratorConfig {
    /// Radius bounds (min, max) in normalized units.
    #[serde(default = "default_rated_radius_bounds")]
    pub radius_bounds: (f32, f32),
    /// Pure edge rating a circle must exceed.
    #[serde(default = "default_min_rating")]
    pub min_rating: f32,
    /// Number of equal-width radius buckets.
    #[serde(default = "default_num_size_buckets")]
    pub num_size_buckets: u32,
    /// Rating bonus per bucket index.
    #[serde(default = "default_bucket_weight")]
    pub bucket_weight: f32,
    /// Random draws before giving up on reaching the requested count.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,
}

impl Default for RatedGeneratorConfig {
    fn default() -> Self {
        Self {
            radius_bounds: default_rated_radius_bounds(),
            min_rating: default_min_rating(),
            num_size_buckets: default_num_size_buckets(),
            bucket_weight: default_bucket_weight(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RatedGeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_radius_bounds(self.radius_bounds)
    }
}

fn default_rated_radius_bounds() -> (f32, f32) {
    (0.005, 0.1)
}
fn default_num_size_buckets() -> u32 {
    10
}
fn default_bucket_weight() -> f32 {
    5.0
}
fn default_max_attempts() -> u64 {
    1_000_000
}

/// Distance tolerances used when pruning circles for legibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruningConfig {
    /// Minimum (x, y, radius) distance between two accepted circles.
    #[serde(default = "default_min_distance_3d")]
    pub min_distance_3d: f32,
    /// Points closer than this are treated as the same point.
    #[serde(default = "default_max_distance_equality")]
    pub max_distance_equality: f32,
    /// Minimum distance between distinct intersection points.
    #[serde(default = "default_min_distance_intersection")]
    pub min_distance_intersection: f32,
    /// Minimum distance between distinct chord endpoints.
    #[serde(default = "default_min_distance_segments")]
    pub min_distance_segments: f32,
    /// Intersecting circles need at least this radius ratio.
    #[serde(default = "default_min_radius_ratio")]
    pub min_radius_ratio: f32,
    /// Upper bound of the uniform noise added to ratings before sorting.
    #[serde(default = "default_wriggle")]
    pub wriggle: f32,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            min_distance_3d: default_min_distance_3d(),
            max_distance_equality: default_max_distance_equality(),
            min_distance_intersection: default_min_distance_intersection(),
            min_distance_segments: default_min_distance_segments(),
            min_radius_ratio: default_min_radius_ratio(),
            wriggle: default_wriggle(),
        }
    }
}

fn default_min_distance_3d() -> f32 {
    0.02
}
fn default_max_distance_equality() -> f32 {
    0.0012
}
fn default_min_distance_intersection() -> f32 {
    0.005
}
fn default_min_distance_segments() -> f32 {
    0.005
}
fn default_min_radius_ratio() -> f32 {
    1.05
}
fn default_wriggle() -> f32 {
    1.0
}

impl PruningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_distance_equality < 0.0
            || self.max_distance_equality > self.min_distance_intersection
            || self.max_distance_equality > self.min_distance_segments
        {
            return Err(ConfigError::InvalidTolerance(format!(
                "equality tolerance {} must lie in [0, min distances]",
                self.max_distance_equality
            )));
        }
        if self.min_radius_ratio < 1.0 {
            return Err(ConfigError::InvalidTolerance(format!(
                "radius ratio {} must be at least 1",
                self.min_radius_ratio
            )));
        }
        Ok(())
    }
}

/// How seed candidates are produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SeedingMethod {
    /// Draw a pool of rated circles and prune it with wriggle.
    #[default]
    Pruned,
    /// Time-bounded rejection sampling with [`GeneratorConfig`] thresholds.
    Search,
}

/// Settings for writing a folder of seed candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingConfig {
    #[serde(default)]
    pub method: SeedingMethod,
    /// Number of seed files to write.
    #[serde(default = "default_num_seeds")]
    pub num_seeds: usize,
    /// Rated circles drawn per seed before pruning.
    #[serde(default = "default_rated_pool")]
    pub rated_pool: usize,
    #[serde(default)]
    pub rated: RatedGeneratorConfig,
    #[serde(default)]
    pub pruning: PruningConfig,
    #[serde(default)]
    pub search: GeneratorConfig,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            method: SeedingMethod::default(),
            num_seeds: default_num_seeds(),
            rated_pool: default_rated_pool(),
            rated: RatedGeneratorConfig::default(),
            pruning: PruningConfig::default(),
            search: GeneratorConfig::default(),
        }
    }
}

fn default_num_seeds() -> usize {
    50
}
fn default_rated_pool() -> usize {
    20_000
}

impl SeedingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rated.validate()?;
        self.pruning.validate()?;
        self.search.validate()
    }
}

fn check_radius_bounds(bounds: (f32, f32)) -> Result<(), ConfigError> {
    if bounds.0 < 0.0 || bounds.0 > bounds.1 {
        return Err(ConfigError::InvalidRadiusBounds {
            min: bounds.0,
            max: bounds.1,
        });
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Image dimensions must be non-zero")]
    InvalidDimensions,
    #[error("Pixel buffer holds {found} values, expected {expected}")]
    BufferSizeMismatch { expected: usize, found: usize },
    #[error("Grey level count must be non-zero")]
    InvalidGreyLevels,
    #[error("Segment penalty divisor must be positive")]
    InvalidSegmentPenalty,
    #[error("Radius bounds invalid: min {min} > max {max} or negative")]
    InvalidRadiusBounds { min: f32, max: f32 },
    #[error("Invalid pruning tolerance: {0}")]
    InvalidTolerance(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(EvaluationConfig::default().validate().is_ok());
        assert!(GeneratorConfig::default().validate().is_ok());
        assert!(RatedGeneratorConfig::default().validate().is_ok());
        assert!(PruningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_grey_step() {
        assert_eq!(EvaluationConfig::default().grey_step(), 51);
        let config = EvaluationConfig {
            grey_levels: 255,
            ..Default::default()
        };
        assert_eq!(config.grey_step(), 1);
    }

    #[test]
    fn test_inverted_radius_bounds() {
        let config = GeneratorConfig {
            radius_bounds: (0.2, 0.1),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRadiusBounds { .. })
        ));
    }

    #[test]
    fn test_seeding_config_from_partial_json() {
        let parsed: SeedingConfig =
            serde_json::from_str(r#"{"method": "Search", "pruning": {"wriggle": 0.5}}"#).unwrap();
        assert_eq!(parsed.method, SeedingMethod::Search);
        assert_eq!(parsed.num_seeds, 50);
        assert_eq!(parsed.pruning.wriggle, 0.5);
        assert_eq!(parsed.pruning.min_distance_3d, 0.02);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let parsed: PruningConfig = serde_json::from_str(r#"{"wriggle": 0.0}"#).unwrap();
        assert_eq!(parsed.wriggle, 0.0);
        assert_eq!(parsed.min_radius_ratio, 1.05);
    }
}
