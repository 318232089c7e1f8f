//! Streaming procedural road/river ribbon generator.
//!
//! `riband` extends a pair of parallel ribbon corridors — a road and an
//! offset river — indefinitely in front of a moving observer. Geometry is
//! generated just-in-time and retired once it falls behind, so memory and
//! render cost stay bounded regardless of distance traveled.
//!
//! The pipeline, in dependency order:
//!
//! - [`spline`] — closed-form Catmull-Rom evaluation over four-point spans.
//! - [`control_points`] — the append-only, randomly extended control path.
//! - [`ribbon`] — road span tessellation into quad-strip meshes.
//! - [`river`] — offset-curve rows, bounded chunks, bit-exact seam stitching.
//! - [`wind`] — smoothed flow direction for the water material.
//! - [`streamer`] — the create-ahead / retire-behind window composing it all.
//!
//! The crate is a pure library: it produces finished [`mesh::MeshBuffer`]s
//! and lifecycle notifications, and leaves rendering, collision and input to
//! the host. Logging goes through the [`log`] facade; no logger is installed.
//!
//! # Example
//!
//! ```ignore
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use riband::{Point3, SegmentStreamer, StreamConfig};
//!
//! let mut streamer = SegmentStreamer::new(StreamConfig::default(), StdRng::seed_from_u64(7))?;
//! streamer.seed()?;
//! loop {
//!     let report = streamer.tick(observer_position(), delta_time())?;
//!     for id in &report.created_segments { /* attach render resources */ }
//!     for id in &report.retired_segments { /* detach render resources */ }
//! }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod control_points;
pub mod core;
pub mod mesh;
pub mod ribbon;
pub mod river;
pub mod spline;
pub mod streamer;
pub mod wind;

pub use config::{ConfigError, StreamConfig};
pub use control_points::{ControlPath, SegmentTrace};
pub use self::core::{BBox, Point3, Tolerance, Vec2, Vec3};
pub use mesh::MeshBuffer;
pub use ribbon::{RibbonDiagnostics, RibbonError, RibbonOptions, build_ribbon};
pub use river::{
    RiverChunkBuilder, RiverChunkMesh, RiverDiagnostics, RiverError, RiverOptions, RiverRow,
    offset_rows,
};
pub use spline::{CurveSpan, catmull_rom_position, catmull_rom_tangent};
pub use streamer::{
    RiverChunk, Segment, SegmentStreamer, StreamError, StreamerState, TickReport,
};
pub use wind::WindField;

#[cfg(test)]
mod tests;
