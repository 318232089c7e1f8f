//! The streaming window: create-ahead / retire-behind orchestration.
//!
//! [`SegmentStreamer`] composes the control path, the ribbon and river
//! builders and the wind estimator into one single-threaded pipeline driven
//! by an external loop calling [`SegmentStreamer::tick`] with the observer
//! position and elapsed time.
//!
//! Lifecycle is explicit: `Empty → Seeded → Steady`. Seeding builds
//! `segments_ahead` segments synchronously; every steady tick then creates
//! one segment when the observer closes in on the window's end and retires
//! the oldest segment (and its river chunks) once it falls far enough behind.
//! Each tick returns a [`TickReport`] naming created and retired geometry so
//! the rendering or physics collaborator can attach and detach its own
//! resources.

use std::collections::VecDeque;

use log::{debug, warn};
use rand::Rng;

use super::config::{ConfigError, StreamConfig};
use super::control_points::{ControlPath, SegmentTrace};
use super::core::{Point3, Vec2, Vec3};
use super::mesh::MeshBuffer;
use super::ribbon::{RibbonOptions, build_ribbon};
use super::river::{RiverChunkBuilder, RiverError, RiverOptions};
use super::spline::CurveSpan;
use super::wind::WindField;

/// Streamer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamerState {
    /// No geometry exists; only [`SegmentStreamer::seed`] is valid.
    Empty,
    /// Seed segments exist; the first tick moves to `Steady`.
    Seeded,
    /// Normal create-ahead / retire-behind operation.
    Steady,
}

/// One generated road segment and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: u64,
    /// Index of the originating curve span.
    pub span_index: usize,
    pub mesh: MeshBuffer,
    pub start_position: Point3,
    pub end_position: Point3,
    /// Unit tangent at the end of the span.
    pub end_tangent: Vec3,
    /// Random draws that shaped this segment's far control point.
    pub trace: SegmentTrace,
}

/// One active river chunk with its material binding.
#[derive(Debug, Clone, PartialEq)]
pub struct RiverChunk {
    pub id: u64,
    /// Segment whose span produced this chunk.
    pub segment_id: u64,
    pub mesh: MeshBuffer,
    pub row_count: usize,
    /// Current `flow.x` / `flow.y` material parameters, refreshed every tick.
    pub flow: Vec2,
}

/// Lifecycle notifications for one seed or tick call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub created_segments: Vec<u64>,
    pub retired_segments: Vec<u64>,
    pub created_chunks: Vec<u64>,
    pub retired_chunks: Vec<u64>,
    /// Wind vector broadcast to all active chunks this tick.
    pub wind: Vec2,
}

/// Errors raised by the streamer surface.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// [`SegmentStreamer::tick`] was called before [`SegmentStreamer::seed`].
    #[error("streamer must be seeded before ticking")]
    NotSeeded,

    /// [`SegmentStreamer::seed`] was called twice.
    #[error("streamer is already seeded")]
    AlreadySeeded,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    River(#[from] RiverError),
}

/// Owns every piece of streamed geometry and drives the generation window.
///
/// All mesh buffers have exactly one owner (their [`Segment`] or
/// [`RiverChunk`] record) and are released exactly once, at retirement.
#[derive(Debug)]
pub struct SegmentStreamer<R: Rng> {
    config: StreamConfig,
    rng: R,
    state: StreamerState,
    path: ControlPath,
    river: RiverChunkBuilder,
    wind: WindField,
    segments: VecDeque<Segment>,
    chunks: VecDeque<RiverChunk>,
    /// Next span index to generate.
    cursor: usize,
    next_segment_id: u64,
    next_chunk_id: u64,
}

impl<R: Rng> SegmentStreamer<R> {
    pub fn new(config: StreamConfig, rng: R) -> Result<Self, StreamError> {
        config.validate()?;
        let river = RiverChunkBuilder::new(RiverOptions::from_config(&config))?;
        Ok(Self {
            config,
            rng,
            state: StreamerState::Empty,
            path: ControlPath::new(),
            river,
            wind: WindField::new(),
            segments: VecDeque::new(),
            chunks: VecDeque::new(),
            cursor: 1,
            next_segment_id: 0,
            next_chunk_id: 0,
        })
    }

    /// Seed the control path and synchronously build the initial
    /// `segments_ahead` segments with their river chunks.
    pub fn seed(&mut self) -> Result<TickReport, StreamError> {
        if self.state != StreamerState::Empty {
            return Err(StreamError::AlreadySeeded);
        }

        self.path.seed(&self.config);
        let mut report = TickReport::default();
        for _ in 0..self.config.segments_ahead {
            self.create_segment(&mut report);
        }
        self.state = StreamerState::Seeded;
        debug!(
            "seeded streamer with {} segments, {} chunks",
            report.created_segments.len(),
            report.created_chunks.len()
        );
        Ok(report)
    }

    /// Advance the streaming window one discrete time step.
    ///
    /// Creation is checked before retirement, so the window may transiently
    /// hold `segments_ahead + 1` segments. All construction completes within
    /// this call; nothing is deferred.
    pub fn tick(&mut self, observer: Point3, dt: f64) -> Result<TickReport, StreamError> {
        if self.state == StreamerState::Empty {
            return Err(StreamError::NotSeeded);
        }
        self.state = StreamerState::Steady;

        let threshold = 2.0 * self.config.max_segment_distance;
        let mut report = TickReport::default();

        // Extend when the observer closes in on the window's end.
        let needs_segment = match self.segments.back() {
            Some(last) => observer.distance_to(last.end_position) < threshold,
            None => true,
        };
        if needs_segment {
            self.create_segment(&mut report);
        }

        // Retire once the oldest segment's end falls far enough behind.
        let should_retire = self
            .segments
            .front()
            .is_some_and(|first| observer.distance_to(first.end_position) > threshold);
        if should_retire {
            self.retire_oldest(&mut report);
        }

        report.wind = self
            .wind
            .update(observer, &self.path, dt, self.config.wind_lerp_speed);
        for chunk in &mut self.chunks {
            chunk.flow = report.wind;
        }

        Ok(report)
    }

    #[must_use]
    pub fn state(&self) -> StreamerState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Active road segments, oldest first.
    #[must_use]
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Active river chunks, oldest first.
    #[must_use]
    pub fn chunks(&self) -> impl Iterator<Item = &RiverChunk> {
        self.chunks.iter()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Retained control points, for diagnostics overlays.
    #[must_use]
    pub fn control_path(&self) -> &ControlPath {
        &self.path
    }

    /// The wind vector broadcast on the most recent tick.
    #[must_use]
    pub fn wind(&self) -> Vec2 {
        self.wind.current()
    }

    /// Build the segment for the cursor span plus its river chunks.
    ///
    /// A failed build is logged and skipped; the cursor does not advance, so
    /// the same span is retried when conditions are reevaluated next tick.
    /// Already-finalized geometry is never touched.
    fn create_segment(&mut self, report: &mut TickReport) {
        // Keep the four-point lookahead available for the cursor span.
        let mut trace = SegmentTrace::default();
        while self.cursor + 2 >= self.path.len() {
            let (_, t) = self.path.append_next(&mut self.rng, &self.config);
            trace = t;
        }

        let Some(span) = self.path.span(self.cursor) else {
            warn!("span {} is not evaluable; skipping creation", self.cursor);
            return;
        };

        let options = RibbonOptions::new(self.config.road_width)
            .subdivisions(self.config.subdivisions);
        let mesh = match build_ribbon(&span, options) {
            Ok((mesh, _)) => mesh,
            Err(err) => {
                warn!("road segment build failed for span {}: {err}", self.cursor);
                return;
            }
        };

        let segment_id = self.next_segment_id;
        self.next_segment_id += 1;

        let end_tangent = span.tangent(1.0).normalized().unwrap_or(Vec3::Z);
        self.segments.push_back(Segment {
            id: segment_id,
            span_index: self.cursor,
            mesh,
            start_position: span.position(0.0),
            end_position: span.position(1.0),
            end_tangent,
            trace,
        });
        report.created_segments.push(segment_id);
        debug!("created segment {segment_id} for span {}", self.cursor);

        self.create_chunks_for(&span, segment_id, report);
        self.cursor += 1;
    }

    /// Build the river chunks backing one span. A failure leaves the road
    /// segment in place and is retried implicitly with later spans.
    fn create_chunks_for(&mut self, span: &CurveSpan, segment_id: u64, report: &mut TickReport) {
        let flow = self.wind.current();
        match self.river.build_span(span) {
            Ok((chunk_meshes, diag)) => {
                for built in chunk_meshes {
                    let chunk_id = self.next_chunk_id;
                    self.next_chunk_id += 1;
                    self.chunks.push_back(RiverChunk {
                        id: chunk_id,
                        segment_id,
                        mesh: built.mesh,
                        row_count: built.row_count,
                        flow,
                    });
                    report.created_chunks.push(chunk_id);
                }
                if diag.underflow {
                    debug!("river chunking stopped early for span at segment {segment_id}");
                }
            }
            Err(err) => {
                warn!("river chunk build failed at segment {segment_id}: {err}");
            }
        }
    }

    /// Retire the oldest segment and every river chunk built from its span,
    /// releasing their mesh buffers, then trim the control path behind the
    /// remaining window.
    ///
    /// A span can yield several chunks when its rows exceed
    /// `max_rows_per_chunk`; they sit contiguously at the queue front and are
    /// all dropped with their segment, keeping the chunk queue bounded.
    fn retire_oldest(&mut self, report: &mut TickReport) {
        if let Some(segment) = self.segments.pop_front() {
            debug!("retired segment {} (span {})", segment.id, segment.span_index);
            report.retired_segments.push(segment.id);

            while self
                .chunks
                .front()
                .is_some_and(|chunk| chunk.segment_id == segment.id)
            {
                if let Some(chunk) = self.chunks.pop_front() {
                    report.retired_chunks.push(chunk.id);
                }
            }
        }

        if let Some(front) = self.segments.front() {
            // Span i reads points i-1..=i+2; everything older is unreachable.
            self.path.trim_before(front.span_index.saturating_sub(1));
        }
    }
}
