//! Closed-form Catmull-Rom evaluation over a four-point span.
//!
//! A span maps `t ∈ [0, 1]` onto the curve interval between its two interior
//! control points (`p1` at `t = 0`, `p2` at `t = 1`); `p0` and `p3` only shape
//! the curve. Both functions are pure: identical inputs always yield identical
//! outputs, which the chunk stitching in [`crate::river`] relies on.

use super::core::{Point3, Vec3};

/// Four consecutive control points defining one traversable curve interval.
///
/// Derived from the control path on demand, never stored independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSpan {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CurveSpan {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Curve position at `t`, see [`catmull_rom_position`].
    #[must_use]
    pub fn position(&self, t: f64) -> Point3 {
        catmull_rom_position(self.p0, self.p1, self.p2, self.p3, t)
    }

    /// Curve derivative at `t`, see [`catmull_rom_tangent`].
    #[must_use]
    pub fn tangent(&self, t: f64) -> Vec3 {
        catmull_rom_tangent(self.p0, self.p1, self.p2, self.p3, t)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.p0.is_finite() && self.p1.is_finite() && self.p2.is_finite() && self.p3.is_finite()
    }
}

/// Standard cubic Catmull-Rom position:
/// `0.5 · (2·p1 + (-p0+p2)·t + (2·p0-5·p1+4·p2-p3)·t² + (-p0+3·p1-3·p2+p3)·t³)`.
#[must_use]
pub fn catmull_rom_position(p0: Point3, p1: Point3, p2: Point3, p3: Point3, t: f64) -> Point3 {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = p1.to_vec3().mul_scalar(2.0);
    let b = p2.to_vec3() - p0.to_vec3();
    let c = p0.to_vec3().mul_scalar(2.0) - p1.to_vec3().mul_scalar(5.0)
        + p2.to_vec3().mul_scalar(4.0)
        - p3.to_vec3();
    let d = p1.to_vec3().mul_scalar(3.0) - p0.to_vec3() - p2.to_vec3().mul_scalar(3.0)
        + p3.to_vec3();

    Point3::from((a + b * t + c * t2 + d * t3).mul_scalar(0.5))
}

/// Analytic derivative of [`catmull_rom_position`]:
/// `0.5 · ((-p0+p2) + 2·(2·p0-5·p1+4·p2-p3)·t + 3·(-p0+3·p1-3·p2+p3)·t²)`.
///
/// The result is not renormalized; callers that need a direction normalize it
/// themselves.
#[must_use]
pub fn catmull_rom_tangent(p0: Point3, p1: Point3, p2: Point3, p3: Point3, t: f64) -> Vec3 {
    let t2 = t * t;

    let b = p2.to_vec3() - p0.to_vec3();
    let c = p0.to_vec3().mul_scalar(2.0) - p1.to_vec3().mul_scalar(5.0)
        + p2.to_vec3().mul_scalar(4.0)
        - p3.to_vec3();
    let d = p1.to_vec3().mul_scalar(3.0) - p0.to_vec3() - p2.to_vec3().mul_scalar(3.0)
        + p3.to_vec3();

    (b + c.mul_scalar(2.0 * t) + d.mul_scalar(3.0 * t2)).mul_scalar(0.5)
}
