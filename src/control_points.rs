//! The append-only control path driving both ribbon generators.
//!
//! The path starts from four collinear seed points and grows one point at a
//! time: each new point continues the direction of the last two with a random
//! yaw, a random distance and a clamped random height drift. Randomness comes
//! from an injected [`rand::Rng`] so layouts are reproducible from a seed.
//!
//! Points are addressed by a stable absolute index even though the storage is
//! a bounded trailing window: the streamer trims points that no active span
//! can reference any more, keeping memory constant over unbounded distance.

use std::collections::VecDeque;

use rand::Rng;

use super::config::StreamConfig;
use super::core::{Point3, Vec3};
use super::spline::CurveSpan;

/// The random draws used to place one control point, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SegmentTrace {
    /// Distance drawn from `[min_segment_distance, max_segment_distance]`.
    pub distance: f64,
    /// Yaw drawn from `[-max_turn_angle, max_turn_angle]`, degrees.
    pub turn_angle: f64,
    /// Applied vertical drift after clamping.
    pub height_offset: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ControlPath {
    points: VecDeque<Point3>,
    /// Absolute index of `points[0]`.
    base: usize,
}

impl ControlPath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize exactly four collinear points along +Z, ending at the
    /// origin, spaced `seed_spacing` apart. Precondition for any span
    /// evaluation; resets any previous contents.
    pub fn seed(&mut self, config: &StreamConfig) {
        self.points.clear();
        self.base = 0;
        for i in 0..4 {
            let z = -config.seed_spacing * f64::from(3 - i);
            self.points.push_back(Point3::new(0.0, 0.0, z));
        }
    }

    /// Total number of points ever appended (absolute length).
    #[must_use]
    pub fn len(&self) -> usize {
        self.base + self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of points currently retained in the trailing window.
    #[must_use]
    pub fn retained_len(&self) -> usize {
        self.points.len()
    }

    /// Point at absolute index `i`, if still retained.
    #[must_use]
    pub fn point(&self, i: usize) -> Option<Point3> {
        let local = i.checked_sub(self.base)?;
        self.points.get(local).copied()
    }

    /// Iterate retained points with their absolute indices, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Point3)> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(|(local, &p)| (self.base + local, p))
    }

    /// The four-point window `[i-1, i, i+1, i+2]` backing span `i`.
    ///
    /// Returns `None` when the span's points are not all retained; callers
    /// append points first to keep the lookahead available.
    #[must_use]
    pub fn span(&self, i: usize) -> Option<CurveSpan> {
        if i < 1 {
            return None;
        }
        Some(CurveSpan::new(
            self.point(i - 1)?,
            self.point(i)?,
            self.point(i + 1)?,
            self.point(i + 2)?,
        ))
    }

    /// Append the next control point, continuing the direction of the last
    /// two points with random variation. Returns the point and the draws used.
    ///
    /// The new height is the previous height plus a uniform offset, clamped to
    /// `[min_global_height, max_global_height]`.
    pub fn append_next<R: Rng>(
        &mut self,
        rng: &mut R,
        config: &StreamConfig,
    ) -> (Point3, SegmentTrace) {
        debug_assert!(self.points.len() >= 2, "path must be seeded before appending");

        let last = self.points[self.points.len() - 1];
        let prev = self.points[self.points.len() - 2];

        // The full 3D unit direction, so the horizontal advance shrinks by
        // cos(pitch) on climbs. Duplicate trailing points would make the
        // direction undefined; keep heading along +Z in that case.
        let dir = (last - prev).normalized().unwrap_or(Vec3::Z);

        let distance = rng.random_range(config.min_segment_distance..=config.max_segment_distance);
        let turn_angle = rng.random_range(-config.max_turn_angle..=config.max_turn_angle);
        let height_draw =
            rng.random_range(-config.max_height_variation..=config.max_height_variation);

        let offset_dir = dir.rotated_y(turn_angle.to_radians());
        let mut point = last + offset_dir * distance;

        let new_y = (last.y + height_draw).clamp(config.min_global_height, config.max_global_height);
        point.y = new_y;

        self.points.push_back(point);

        let trace = SegmentTrace {
            distance,
            turn_angle,
            height_offset: new_y - last.y,
        };
        (point, trace)
    }

    /// Drop retained points with absolute index below `index`.
    ///
    /// Never trims below four retained points, so the newest span and the
    /// append direction always stay evaluable.
    pub fn trim_before(&mut self, index: usize) {
        while self.base < index && self.points.len() > 4 {
            self.points.pop_front();
            self.base += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_seed_is_four_collinear_points() {
        let config = StreamConfig::default();
        let mut path = ControlPath::new();
        path.seed(&config);

        assert_eq!(path.len(), 4);
        let points: Vec<_> = path.iter().map(|(_, p)| p).collect();
        for p in &points {
            assert_eq!(p.x, 0.0);
            assert_eq!(p.y, 0.0);
        }
        assert_eq!(points[3], Point3::ORIGIN);
        let spacing = points[1].z - points[0].z;
        assert!((spacing - config.seed_spacing).abs() < 1e-12);
    }

    #[test]
    fn test_append_respects_height_clamp() {
        let config = StreamConfig {
            max_height_variation: 100.0,
            ..StreamConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut path = ControlPath::new();
        path.seed(&config);

        for _ in 0..200 {
            let (p, _) = path.append_next(&mut rng, &config);
            assert!(p.y >= config.min_global_height);
            assert!(p.y <= config.max_global_height);
        }
    }

    #[test]
    fn test_append_with_zero_turn_stays_on_line() {
        // Seed 10 units apart on the Z axis, then extend without turning.
        let config = StreamConfig {
            seed_spacing: 10.0,
            max_turn_angle: 0.0,
            max_height_variation: 0.0,
            ..StreamConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let mut path = ControlPath::new();
        path.seed(&config);

        let last_before = path.point(3).unwrap();
        let (p, trace) = path.append_next(&mut rng, &config);

        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
        let extension = p.z - last_before.z;
        assert!(extension >= config.min_segment_distance);
        assert!(extension <= config.max_segment_distance);
        assert_eq!(trace.turn_angle, 0.0);
        assert_eq!(trace.height_offset, 0.0);
        assert!((trace.distance - extension).abs() < 1e-12);
    }

    #[test]
    fn test_append_follows_full_3d_direction() {
        // Last two points rise 6 over 8 horizontal, so the unit direction
        // has cos(pitch) = 0.8 and a fixed draw of 10 advances 8 horizontally.
        let config = StreamConfig {
            seed_spacing: 8.0,
            max_turn_angle: 0.0,
            max_height_variation: 0.0,
            min_segment_distance: 10.0,
            max_segment_distance: 10.0,
            ..StreamConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut path = ControlPath::new();
        path.seed(&config);
        path.points[3].y = 6.0;

        let last = path.point(3).unwrap();
        let (p, trace) = path.append_next(&mut rng, &config);

        assert!((trace.distance - 10.0).abs() < 1e-12);
        assert!((p.z - last.z - 8.0).abs() < 1e-12);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 6.0);
    }

    #[test]
    fn test_span_requires_full_window() {
        let config = StreamConfig::default();
        let mut path = ControlPath::new();
        path.seed(&config);

        assert!(path.span(0).is_none());
        assert!(path.span(1).is_some());
        assert!(path.span(2).is_none(), "span 2 needs a fifth point");

        let mut rng = StdRng::seed_from_u64(1);
        path.append_next(&mut rng, &config);
        assert!(path.span(2).is_some());
    }

    #[test]
    fn test_trim_keeps_absolute_indexing() {
        let config = StreamConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut path = ControlPath::new();
        path.seed(&config);
        for _ in 0..20 {
            path.append_next(&mut rng, &config);
        }

        let p10 = path.point(10).unwrap();
        path.trim_before(8);

        assert_eq!(path.len(), 24);
        assert!(path.retained_len() <= 16);
        assert!(path.point(5).is_none());
        assert_eq!(path.point(10), Some(p10));
        assert!(path.span(9).is_some());
    }

    #[test]
    fn test_trim_never_drops_below_four() {
        let config = StreamConfig::default();
        let mut path = ControlPath::new();
        path.seed(&config);

        path.trim_before(usize::MAX);
        assert_eq!(path.retained_len(), 4);
    }

    #[test]
    fn test_seeded_rng_reproduces_layout() {
        let config = StreamConfig::default();

        let mut build = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut path = ControlPath::new();
            path.seed(&config);
            for _ in 0..50 {
                path.append_next(&mut rng, &config);
            }
            path.iter().map(|(_, p)| p).collect::<Vec<_>>()
        };

        assert_eq!(build(99), build(99));
        assert_ne!(build(99), build(100));
    }
}
