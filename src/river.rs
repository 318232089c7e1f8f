//! River surface generation: offset rows, chunking, and seam stitching.
//!
//! The river runs parallel to the road. For each road span an offset curve is
//! sampled (`river_subdivisions + 1` rows), every row is expanded into
//! `river_hoz_subdivisions + 1` vertices across the river width, and the row
//! list is split into grid-mesh chunks of at most `max_rows_per_chunk` rows.
//!
//! Consecutive chunks share one boundary row. The builder caches the last row
//! of vertices it emitted and forces the next chunk's first row to reuse those
//! exact positions — within one call, and across calls for adjacent spans —
//! so the water surface is seamless vertex-for-vertex, not merely close.
//!
//! # Example
//!
//! ```ignore
//! use riband::{RiverChunkBuilder, RiverOptions};
//!
//! let mut builder = RiverChunkBuilder::new(RiverOptions::from_config(&config))?;
//! let (chunks, diag) = builder.build_span(&span)?;
//! ```

use log::warn;

use super::config::StreamConfig;
use super::core::{Point3, Tolerance, Vec3};
use super::mesh::MeshBuffer;
use super::spline::CurveSpan;

/// One cross-section row of the river surface.
pub type RiverRow = Vec<Point3>;

/// Options for river surface generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiverOptions {
    /// Width of the river surface.
    pub river_width: f64,
    /// Width of the road the river runs beside.
    pub road_width: f64,
    /// Extra gap between road edge and river edge.
    pub river_road_distance: f64,
    /// Fixed height of the river surface.
    pub river_height: f64,
    /// Samples along the road span; produces `subdivisions + 1` rows.
    pub subdivisions: usize,
    /// Vertex columns across the width, minus one.
    pub width_subdivisions: usize,
    /// Maximum rows per chunk mesh.
    pub max_rows_per_chunk: usize,
}

impl RiverOptions {
    #[must_use]
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            river_width: config.river_width,
            road_width: config.road_width,
            river_road_distance: config.river_road_distance,
            river_height: config.river_height,
            subdivisions: config.river_subdivisions,
            width_subdivisions: config.river_hoz_subdivisions,
            max_rows_per_chunk: config.max_rows_per_chunk,
        }
    }

    /// Lateral distance from the road centerline to the river centerline:
    /// `(river_width + road_width) / 2 + river_road_distance`.
    #[must_use]
    pub fn lateral_offset(&self) -> f64 {
        (self.river_width + self.road_width) * 0.5 + self.river_road_distance
    }

    /// Vertices per row.
    #[must_use]
    pub const fn row_width(&self) -> usize {
        self.width_subdivisions + 1
    }

    pub fn validate(&self) -> Result<(), RiverError> {
        if !(self.river_width.is_finite() && self.river_width > 0.0) {
            return Err(RiverError::InvalidWidth {
                width: self.river_width,
            });
        }
        if self.subdivisions == 0 || self.width_subdivisions == 0 {
            return Err(RiverError::NoSubdivisions);
        }
        if self.max_rows_per_chunk < 2 {
            return Err(RiverError::ChunkWindowTooSmall {
                max_rows: self.max_rows_per_chunk,
            });
        }
        Ok(())
    }
}

impl Default for RiverOptions {
    fn default() -> Self {
        Self::from_config(&StreamConfig::default())
    }
}

/// Errors that can occur during river surface generation.
#[derive(Debug, thiserror::Error)]
pub enum RiverError {
    /// The river width is zero, negative, or not finite.
    #[error("river width must be positive and finite, got {width}")]
    InvalidWidth { width: f64 },

    /// Both subdivision counts must be at least 1.
    #[error("river requires at least 1 subdivision along and across the span")]
    NoSubdivisions,

    /// A chunk window needs two rows to form one cell.
    #[error("max rows per chunk must be at least 2, got {max_rows}")]
    ChunkWindowTooSmall { max_rows: usize },

    /// A control point carries NaN or Inf coordinates.
    #[error("span control points must be finite")]
    NonFiniteSpan,
}

/// Diagnostics for one span's worth of river chunks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiverDiagnostics {
    /// Rows generated for the span.
    pub row_count: usize,
    /// Chunks emitted for the span.
    pub chunk_count: usize,
    /// Samples where the offset direction was degenerate and the previous
    /// direction was substituted.
    pub degenerate_tangent_count: usize,
    /// Whether the first chunk reused a cached boundary row.
    pub stitched_first_row: bool,
    /// Whether a cached row was rejected because its width did not match.
    pub stitch_rejected: bool,
    /// Whether chunking stopped early because fewer than two rows remained.
    pub underflow: bool,
    /// Warnings generated during the operation.
    pub warnings: Vec<String>,
}

/// One river chunk mesh and its row extent.
#[derive(Debug, Clone, PartialEq)]
pub struct RiverChunkMesh {
    pub mesh: MeshBuffer,
    /// Cross-section rows contained in this chunk.
    pub row_count: usize,
}

/// Sample the river offset rows for one road span.
///
/// Each of the `subdivisions + 1` samples takes the road tangent averaged
/// with the next sample's tangent, flattens it to the horizontal plane and
/// offsets the road center along the perpendicular stable-left direction by
/// [`RiverOptions::lateral_offset`]. The row is then expanded across the
/// river width along that same direction, with every vertex at the fixed
/// `river_height`.
///
/// Rows are computed per span with no continuity enforcement between spans;
/// seamlessness across spans comes from chunk stitching alone.
#[must_use]
pub fn offset_rows(span: &CurveSpan, options: &RiverOptions) -> (Vec<RiverRow>, usize) {
    let subdiv = options.subdivisions;
    let tol = Tolerance::ZERO_LENGTH;
    let lateral = options.lateral_offset();

    let mut rows = Vec::with_capacity(subdiv + 1);
    let mut degenerate = 0;
    let mut last_left = Vec3::X;

    for i in 0..=subdiv {
        let t = i as f64 / subdiv as f64;
        let t_next = (i + 1).min(subdiv) as f64 / subdiv as f64;

        // Averaging with the next sample smooths the offset direction.
        let tangent = (span.tangent(t) + span.tangent(t_next)).flattened();
        let left = stable_left(tangent, tol).unwrap_or_else(|| {
            degenerate += 1;
            last_left
        });
        last_left = left;

        let road_center = span.position(t);
        let row_center = Point3::new(
            road_center.x + left.x * lateral,
            options.river_height,
            road_center.z + left.z * lateral,
        );

        let mut row = Vec::with_capacity(options.row_width());
        for c in 0..=options.width_subdivisions {
            let frac = c as f64 / options.width_subdivisions as f64 - 0.5;
            let spread = left * (frac * options.river_width);
            row.push(Point3::new(
                row_center.x + spread.x,
                options.river_height,
                row_center.z + spread.z,
            ));
        }
        rows.push(row);
    }

    (rows, degenerate)
}

/// Perpendicular left direction in the horizontal plane for a flattened
/// tangent. `None` when the tangent is degenerate.
fn stable_left(flat_tangent: Vec3, tol: Tolerance) -> Option<Vec3> {
    if tol.is_zero_vec3(flat_tangent) {
        return None;
    }
    Vec3::Y.cross(flat_tangent).normalized()
}

/// Builds river chunk meshes and owns the boundary-row stitching cache.
///
/// The cache survives across [`RiverChunkBuilder::build_span`] calls so the
/// first chunk of each span seams exactly onto the last chunk of the
/// previous span.
#[derive(Debug, Clone)]
pub struct RiverChunkBuilder {
    options: RiverOptions,
    cache: Option<RiverRow>,
}

impl RiverChunkBuilder {
    pub fn new(options: RiverOptions) -> Result<Self, RiverError> {
        options.validate()?;
        Ok(Self {
            options,
            cache: None,
        })
    }

    #[must_use]
    pub fn options(&self) -> &RiverOptions {
        &self.options
    }

    /// Drop the cached boundary row. The next chunk starts fresh.
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Whether a boundary row is currently cached.
    #[must_use]
    pub fn has_cached_row(&self) -> bool {
        self.cache.is_some()
    }

    /// Generate the offset rows for `span` and split them into stitched
    /// chunk meshes.
    pub fn build_span(
        &mut self,
        span: &CurveSpan,
    ) -> Result<(Vec<RiverChunkMesh>, RiverDiagnostics), RiverError> {
        if !span.is_finite() {
            return Err(RiverError::NonFiniteSpan);
        }

        let (rows, degenerate) = offset_rows(span, &self.options);
        let mut diagnostics = RiverDiagnostics {
            row_count: rows.len(),
            degenerate_tangent_count: degenerate,
            ..RiverDiagnostics::default()
        };
        if degenerate > 0 {
            let message = format!(
                "{degenerate} of {} river samples had a degenerate offset direction",
                rows.len()
            );
            warn!("{message}");
            diagnostics.warnings.push(message);
        }

        let chunks = self.build_chunks(&rows, &mut diagnostics);
        diagnostics.chunk_count = chunks.len();
        Ok((chunks, diagnostics))
    }

    /// Split `rows` into overlapping chunk windows and triangulate each one.
    ///
    /// Windows advance by `row_count - 1` so consecutive chunks share exactly
    /// one boundary row. A cached row (from the previous chunk or a previous
    /// call) replaces the first row of the first window verbatim; a window
    /// with fewer than two rows ends the loop.
    fn build_chunks(
        &mut self,
        rows: &[RiverRow],
        diagnostics: &mut RiverDiagnostics,
    ) -> Vec<RiverChunkMesh> {
        let expected_width = self.options.row_width();

        // A mis-sized cached row means the configuration changed mid-stream;
        // reject it loudly rather than index out of range.
        if let Some(cached) = &self.cache
            && cached.len() != expected_width
        {
            let message = format!(
                "cached boundary row has {} vertices, expected {expected_width}; rebuilding fresh",
                cached.len()
            );
            warn!("{message}");
            diagnostics.stitch_rejected = true;
            diagnostics.warnings.push(message);
            self.cache = None;
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < rows.len() {
            let take = (rows.len() - start).min(self.options.max_rows_per_chunk);
            if take < 2 {
                diagnostics.underflow = true;
                break;
            }

            let window = &rows[start..start + take];
            let first_row = self.cache.take();
            if first_row.is_some() && chunks.is_empty() {
                diagnostics.stitched_first_row = true;
            }

            let mesh = triangulate_window(window, first_row.as_deref(), expected_width);
            self.cache = Some(window[take - 1].clone());
            chunks.push(RiverChunkMesh {
                mesh,
                row_count: take,
            });

            // One row of overlap with the next window.
            start += take - 1;
            if start + 1 >= rows.len() {
                break;
            }
        }

        if rows.len() < 2 {
            diagnostics.underflow = true;
        }

        chunks
    }
}

/// Triangulate one chunk window into a row/column grid mesh.
///
/// `first_row_override` supplies the stitched boundary vertices; when present
/// it replaces the window's first row position-for-position.
fn triangulate_window(
    window: &[RiverRow],
    first_row_override: Option<&[Point3]>,
    row_width: usize,
) -> MeshBuffer {
    let row_count = window.len();
    let mut mesh = MeshBuffer::with_capacity(
        row_count * row_width,
        (row_count - 1) * (row_width - 1) * 2,
    );

    for (r, row) in window.iter().enumerate() {
        let source: &[Point3] = if r == 0 {
            first_row_override.unwrap_or(row)
        } else {
            row
        };
        let v = r as f64 / (row_count - 1) as f64;
        for (c, &point) in source.iter().enumerate() {
            let u = c as f64 / (row_width - 1) as f64;
            mesh.push_vertex(point, [u, v]);
        }
    }

    for r in 0..row_count - 1 {
        for c in 0..row_width - 1 {
            let bottom_left = (r * row_width + c) as u32;
            let bottom_right = bottom_left + 1;
            let top_left = bottom_left + row_width as u32;
            let top_right = top_left + 1;

            mesh.push_triangle(bottom_left, top_left, bottom_right);
            mesh.push_triangle(bottom_right, top_left, top_right);
        }
    }

    mesh.finalize();
    mesh
}
