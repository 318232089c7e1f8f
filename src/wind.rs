//! Smoothed flow direction for the water material.
//!
//! Every tick the estimator finds the control point nearest the observer,
//! takes the direction toward the following point, projects it onto the
//! horizontal plane and eases the current wind vector toward it. The result
//! is broadcast as the `flow.x` / `flow.y` material parameters on every
//! active river chunk.

use super::control_points::ControlPath;
use super::core::{Point3, Vec2};

/// Current and target flow direction with frame-time scaled smoothing.
///
/// The smoothing factor is `lerp_speed * dt` per tick (clamped to `[0, 1]`),
/// so the effective easing rate varies with tick rate rather than following a
/// fixed exponential decay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindField {
    current: Vec2,
}

impl WindField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently computed flow vector.
    #[must_use]
    pub const fn current(&self) -> Vec2 {
        self.current
    }

    /// Advance the wind one tick and return the new flow vector.
    ///
    /// The nearest retained control point is found by linear scan (ties break
    /// to the lowest index); the target direction points toward the next
    /// point, clamped to the last index. A path with fewer than two retained
    /// points leaves the wind unchanged.
    pub fn update(
        &mut self,
        observer: Point3,
        path: &ControlPath,
        dt: f64,
        lerp_speed: f64,
    ) -> Vec2 {
        let Some(target) = flow_target(observer, path) else {
            return self.current;
        };

        let factor = (lerp_speed * dt).clamp(0.0, 1.0);
        self.current = self.current.lerp(target, factor);
        self.current
    }
}

/// Normalized horizontal direction from the control point nearest `observer`
/// toward its successor.
fn flow_target(observer: Point3, path: &ControlPath) -> Option<Vec2> {
    let mut nearest: Option<(usize, f64)> = None;
    for (index, point) in path.iter() {
        let dist = observer.distance_squared_to(point);
        // Strict comparison keeps the first-found point on ties.
        if nearest.is_none_or(|(_, best)| dist < best) {
            nearest = Some((index, dist));
        }
    }

    let (nearest_index, _) = nearest?;
    let last_index = path.len().checked_sub(1)?;
    let next_index = (nearest_index + 1).min(last_index);
    if next_index == nearest_index {
        return None;
    }

    let from = path.point(nearest_index)?;
    let to = path.point(next_index)?;
    Vec2::new(to.x - from.x, to.z - from.z).normalized()
}
