//! Road ribbon tessellation.
//!
//! [`build_ribbon`] turns one four-point curve span into a quad-strip mesh:
//! `subdivisions + 1` evenly spaced samples, two vertices per sample offset
//! left/right of the centerline by half the road width, two triangles per
//! cell. UVs run `u` across the width and `v` along the span parameter.
//!
//! # Example
//!
//! ```ignore
//! use riband::{build_ribbon, CurveSpan, Point3, RibbonOptions};
//!
//! let span = CurveSpan::new(p0, p1, p2, p3);
//! let (mesh, diag) = build_ribbon(&span, RibbonOptions::new(5.0))?;
//! ```

use log::warn;

use super::core::{Point3, Tolerance, Vec3};
use super::mesh::MeshBuffer;
use super::spline::CurveSpan;

/// Options for ribbon tessellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonOptions {
    /// Full width of the ribbon.
    pub width: f64,
    /// Number of cells along the span; the strip has `subdivisions + 1` rows.
    pub subdivisions: usize,
}

impl RibbonOptions {
    /// Create new ribbon options with the given width.
    #[must_use]
    pub const fn new(width: f64) -> Self {
        Self {
            width,
            subdivisions: 20,
        }
    }

    /// Set the number of subdivisions along the span.
    #[must_use]
    pub const fn subdivisions(mut self, subdivisions: usize) -> Self {
        self.subdivisions = subdivisions;
        self
    }
}

impl Default for RibbonOptions {
    fn default() -> Self {
        Self::new(5.0)
    }
}

/// Errors that can occur during ribbon tessellation.
#[derive(Debug, thiserror::Error)]
pub enum RibbonError {
    /// The ribbon width is zero, negative, or not finite.
    #[error("ribbon width must be positive and finite, got {width}")]
    InvalidWidth { width: f64 },

    /// At least one cell is required to form triangles.
    #[error("ribbon requires at least 1 subdivision")]
    NoSubdivisions,

    /// A control point carries NaN or Inf coordinates.
    #[error("span control points must be finite")]
    NonFiniteSpan,
}

/// Diagnostics for ribbon tessellation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RibbonDiagnostics {
    /// Number of vertices in the produced mesh.
    pub vertex_count: usize,
    /// Number of triangles in the produced mesh.
    pub triangle_count: usize,
    /// Samples where the tangent was degenerate and a fallback direction
    /// was substituted.
    pub degenerate_tangent_count: usize,
    /// Warnings generated during the operation.
    pub warnings: Vec<String>,
}

/// Tessellate a span into a road ribbon mesh.
///
/// At every sample the centerline position and unit tangent are evaluated,
/// and the lateral direction is `up × tangent` kept in the horizontal plane.
/// A near-zero tangent (duplicate consecutive control points) falls back to
/// the previous sample's direction instead of emitting NaN geometry.
///
/// The output mesh has recomputed normals and bounds and is deterministic for
/// identical inputs.
pub fn build_ribbon(
    span: &CurveSpan,
    options: RibbonOptions,
) -> Result<(MeshBuffer, RibbonDiagnostics), RibbonError> {
    if !(options.width.is_finite() && options.width > 0.0) {
        return Err(RibbonError::InvalidWidth {
            width: options.width,
        });
    }
    if options.subdivisions == 0 {
        return Err(RibbonError::NoSubdivisions);
    }
    if !span.is_finite() {
        return Err(RibbonError::NonFiniteSpan);
    }

    let subdiv = options.subdivisions;
    let half_width = options.width * 0.5;
    let tol = Tolerance::ZERO_LENGTH;

    let mut mesh = MeshBuffer::with_capacity((subdiv + 1) * 2, subdiv * 2);
    let mut diagnostics = RibbonDiagnostics::default();

    // Fallback lateral direction for degenerate samples; +Z tangent gives
    // left = +X before the first valid sample.
    let mut last_left = Vec3::X;

    for i in 0..=subdiv {
        let t = i as f64 / subdiv as f64;
        let center = span.position(t);
        let tangent = span.tangent(t);

        let left = lateral_direction(tangent, tol).unwrap_or_else(|| {
            diagnostics.degenerate_tangent_count += 1;
            last_left
        });
        last_left = left;

        let offset = left * half_width;
        let left_index = mesh.push_vertex(center + offset, [0.0, t]);
        let right_index = mesh.push_vertex(center - offset, [1.0, t]);

        if i > 0 {
            let prev_left = left_index - 2;
            let prev_right = right_index - 2;
            mesh.push_triangle(prev_left, prev_right, left_index);
            mesh.push_triangle(right_index, left_index, prev_right);
        }
    }

    if diagnostics.degenerate_tangent_count > 0 {
        let message = format!(
            "{} of {} samples had a degenerate tangent; reused previous lateral direction",
            diagnostics.degenerate_tangent_count,
            subdiv + 1
        );
        warn!("{message}");
        diagnostics.warnings.push(message);
    }

    mesh.finalize();
    diagnostics.vertex_count = mesh.vertex_count();
    diagnostics.triangle_count = mesh.triangle_count();

    Ok((mesh, diagnostics))
}

/// Unit left direction for a centerline tangent: `up × tangent`, normalized.
///
/// Returns `None` when the tangent is near-zero or vertical, both of which
/// make the cross product undefined.
fn lateral_direction(tangent: Vec3, tol: Tolerance) -> Option<Vec3> {
    if tol.is_zero_vec3(tangent) {
        return None;
    }
    let unit = tangent.normalized()?;
    Vec3::Y.cross(unit).normalized()
}
