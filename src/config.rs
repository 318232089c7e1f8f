//! Streaming generator configuration.
//!
//! All tunables for the road/river pipeline live in one [`StreamConfig`] so a
//! host application can deserialize a layout from JSON/TOML, tweak a few
//! fields and pass it to [`crate::streamer::SegmentStreamer::new`]. Defaults
//! match the tuning the generator was developed against.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Width of the road surface.
    pub road_width: f64,
    /// Number of cross-section cuts per road segment mesh.
    pub subdivisions: usize,
    /// How many segments to keep generated ahead of the observer.
    pub segments_ahead: usize,
    /// Minimum random distance between new control points.
    pub min_segment_distance: f64,
    /// Maximum random distance between new control points.
    pub max_segment_distance: f64,
    /// Maximum yaw (degrees) applied left/right when extending the path.
    pub max_turn_angle: f64,
    /// Maximum vertical drift from the previous control point, before clamping.
    pub max_height_variation: f64,
    /// Global lower bound on control point height.
    pub min_global_height: f64,
    /// Global upper bound on control point height.
    pub max_global_height: f64,
    /// Spacing between the four collinear seed points.
    pub seed_spacing: f64,

    /// Samples along each road span when building the river offset curve.
    pub river_subdivisions: usize,
    /// Vertex columns across the river surface, minus one.
    pub river_hoz_subdivisions: usize,
    /// Width of the river surface.
    pub river_width: f64,
    /// Extra gap between the road edge and the river edge.
    pub river_road_distance: f64,
    /// Fixed height of the river surface.
    pub river_height: f64,
    /// Maximum cross-section rows per river chunk mesh.
    pub max_rows_per_chunk: usize,

    /// Per-second rate at which the wind vector chases its target.
    pub wind_lerp_speed: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            road_width: 5.0,
            subdivisions: 20,
            segments_ahead: 5,
            min_segment_distance: 25.0,
            max_segment_distance: 35.0,
            max_turn_angle: 30.0,
            max_height_variation: 2.0,
            min_global_height: -5.0,
            max_global_height: 10.0,
            seed_spacing: 0.1,
            river_subdivisions: 20,
            river_hoz_subdivisions: 8,
            river_width: 10.0,
            river_road_distance: 2.0,
            river_height: -1.0,
            max_rows_per_chunk: 50,
            wind_lerp_speed: 1.0,
        }
    }
}

/// Errors raised by [`StreamConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("segment distance range is inverted or non-positive: [{min}, {max}]")]
    InvalidDistanceRange { min: f64, max: f64 },

    #[error("global height range is inverted: [{min}, {max}]")]
    InvalidHeightRange { min: f64, max: f64 },

    #[error("{name} must be positive, got {value}")]
    NonPositiveDimension { name: &'static str, value: f64 },

    #[error("{name} must be non-negative, got {value}")]
    NegativeValue { name: &'static str, value: f64 },

    #[error("{name} must be at least {min}, got {value}")]
    SubdivisionTooSmall {
        name: &'static str,
        min: usize,
        value: usize,
    },

    #[error("{name} must be finite, got {value}")]
    NonFiniteValue { name: &'static str, value: f64 },
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("max_turn_angle", self.max_turn_angle),
            ("max_height_variation", self.max_height_variation),
            ("river_road_distance", self.river_road_distance),
            ("river_height", self.river_height),
            ("wind_lerp_speed", self.wind_lerp_speed),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue { name, value });
            }
        }

        // Negative spans would make the uniform sampling ranges empty.
        for (name, value) in [
            ("max_turn_angle", self.max_turn_angle),
            ("max_height_variation", self.max_height_variation),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeValue { name, value });
            }
        }

        if !(self.min_segment_distance.is_finite() && self.max_segment_distance.is_finite())
            || self.min_segment_distance <= 0.0
            || self.min_segment_distance > self.max_segment_distance
        {
            return Err(ConfigError::InvalidDistanceRange {
                min: self.min_segment_distance,
                max: self.max_segment_distance,
            });
        }

        if self.min_global_height > self.max_global_height {
            return Err(ConfigError::InvalidHeightRange {
                min: self.min_global_height,
                max: self.max_global_height,
            });
        }

        for (name, value) in [
            ("road_width", self.road_width),
            ("river_width", self.river_width),
            ("seed_spacing", self.seed_spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveDimension { name, value });
            }
        }

        if self.subdivisions < 1 {
            return Err(ConfigError::SubdivisionTooSmall {
                name: "subdivisions",
                min: 1,
                value: self.subdivisions,
            });
        }
        if self.river_subdivisions < 1 {
            return Err(ConfigError::SubdivisionTooSmall {
                name: "river_subdivisions",
                min: 1,
                value: self.river_subdivisions,
            });
        }
        if self.river_hoz_subdivisions < 1 {
            return Err(ConfigError::SubdivisionTooSmall {
                name: "river_hoz_subdivisions",
                min: 1,
                value: self.river_hoz_subdivisions,
            });
        }
        if self.segments_ahead < 1 {
            return Err(ConfigError::SubdivisionTooSmall {
                name: "segments_ahead",
                min: 1,
                value: self.segments_ahead,
            });
        }
        // A chunk window needs at least two rows to form one cell.
        if self.max_rows_per_chunk < 2 {
            return Err(ConfigError::SubdivisionTooSmall {
                name: "max_rows_per_chunk",
                min: 2,
                value: self.max_rows_per_chunk,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(StreamConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_distance_range_rejected() {
        let config = StreamConfig {
            min_segment_distance: 40.0,
            max_segment_distance: 35.0,
            ..StreamConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDistanceRange { .. })
        ));
    }

    #[test]
    fn test_zero_subdivisions_rejected() {
        let config = StreamConfig {
            subdivisions: 0,
            ..StreamConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SubdivisionTooSmall { .. })
        ));
    }

    #[test]
    fn test_tiny_chunk_window_rejected() {
        let config = StreamConfig {
            max_rows_per_chunk: 1,
            ..StreamConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SubdivisionTooSmall {
                name: "max_rows_per_chunk",
                ..
            })
        ));
    }

    #[test]
    fn test_negative_variation_ranges_rejected() {
        let config = StreamConfig {
            max_turn_angle: -1.0,
            ..StreamConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeValue {
                name: "max_turn_angle",
                ..
            })
        ));

        let config = StreamConfig {
            max_height_variation: -0.5,
            ..StreamConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeValue {
                name: "max_height_variation",
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_width_rejected() {
        let config = StreamConfig {
            road_width: f64::NAN,
            ..StreamConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
