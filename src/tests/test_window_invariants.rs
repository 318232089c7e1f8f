use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::StreamConfig;
use crate::core::Point3;
use crate::streamer::SegmentStreamer;

/// Drive the observer along the generated road by chasing the newest
/// segment's end position, the pattern a vehicle following the road
/// approximates one tick at a time.
fn chase_newest(streamer: &mut SegmentStreamer<StdRng>, ticks: usize) -> Vec<usize> {
    let mut counts = Vec::with_capacity(ticks);
    for _ in 0..ticks {
        let observer = streamer.segments().last().unwrap().end_position;
        streamer.tick(observer, 0.016).unwrap();
        counts.push(streamer.segment_count());
    }
    counts
}

#[test]
fn test_window_size_stays_bounded() {
    let mut streamer =
        SegmentStreamer::new(StreamConfig::default(), StdRng::seed_from_u64(11)).unwrap();
    streamer.seed().unwrap();
    let ahead = streamer.config().segments_ahead;

    let counts = chase_newest(&mut streamer, 300);
    for count in counts {
        assert!(
            count >= ahead - 1 && count <= ahead + 1,
            "window size {count} escaped [{}, {}]",
            ahead - 1,
            ahead + 1
        );
    }
}

#[test]
fn test_retirement_is_fifo() {
    let mut streamer =
        SegmentStreamer::new(StreamConfig::default(), StdRng::seed_from_u64(12)).unwrap();
    streamer.seed().unwrap();

    let mut retired = Vec::new();
    for _ in 0..200 {
        let observer = streamer.segments().last().unwrap().end_position;
        let report = streamer.tick(observer, 0.016).unwrap();
        retired.extend(report.retired_segments);
    }

    assert!(!retired.is_empty(), "expected retirements while advancing");
    for pair in retired.windows(2) {
        assert_eq!(pair[1], pair[0] + 1, "segments must retire in creation order");
    }
    // The oldest active segment is always the next id after the last retired.
    let oldest_active = streamer.segments().next().unwrap().id;
    assert_eq!(oldest_active, *retired.last().unwrap() + 1);
}

#[test]
fn test_chunks_retire_in_lockstep() {
    let mut streamer =
        SegmentStreamer::new(StreamConfig::default(), StdRng::seed_from_u64(13)).unwrap();
    streamer.seed().unwrap();

    let mut retired_chunks = Vec::new();
    for _ in 0..200 {
        let observer = streamer.segments().last().unwrap().end_position;
        let report = streamer.tick(observer, 0.016).unwrap();
        assert!(report.retired_chunks.len() <= 1);
        assert_eq!(report.retired_chunks.len(), report.retired_segments.len());
        retired_chunks.extend(report.retired_chunks);
    }

    for pair in retired_chunks.windows(2) {
        assert_eq!(pair[1], pair[0] + 1, "chunks must retire in creation order");
    }
}

#[test]
fn test_multi_chunk_spans_retire_fully() {
    // 120 rows against a 50-row window makes every span produce 3 chunks;
    // retirement must drop all of them, not just the first.
    let config = StreamConfig {
        river_subdivisions: 119,
        ..StreamConfig::default()
    };
    let mut streamer = SegmentStreamer::new(config, StdRng::seed_from_u64(17)).unwrap();
    streamer.seed().unwrap();
    assert_eq!(streamer.chunk_count(), 3 * streamer.segment_count());

    let max_chunks = 3 * (streamer.config().segments_ahead + 1);
    for _ in 0..200 {
        let observer = streamer.segments().last().unwrap().end_position;
        let report = streamer.tick(observer, 0.016).unwrap();
        assert_eq!(
            report.retired_chunks.len(),
            3 * report.retired_segments.len()
        );
        assert!(
            streamer.chunk_count() <= max_chunks,
            "chunk queue grew to {}",
            streamer.chunk_count()
        );
    }
    assert_eq!(streamer.chunk_count(), 3 * streamer.segment_count());
}

#[test]
fn test_control_path_memory_is_bounded() {
    let mut streamer =
        SegmentStreamer::new(StreamConfig::default(), StdRng::seed_from_u64(14)).unwrap();
    streamer.seed().unwrap();
    let ahead = streamer.config().segments_ahead;

    chase_newest(&mut streamer, 500);

    let path = streamer.control_path();
    assert!(
        path.len() > 400,
        "expected hundreds of appended points, got {}",
        path.len()
    );
    // The trailing window holds the active spans plus the lookahead, never
    // the whole history.
    assert!(
        path.retained_len() <= ahead + 8,
        "retained {} points, expected a bounded trailing window",
        path.retained_len()
    );
}

#[test]
fn test_active_spans_always_evaluable_after_trim() {
    let mut streamer =
        SegmentStreamer::new(StreamConfig::default(), StdRng::seed_from_u64(15)).unwrap();
    streamer.seed().unwrap();

    for _ in 0..300 {
        let observer = streamer.segments().last().unwrap().end_position;
        streamer.tick(observer, 0.016).unwrap();

        let path = streamer.control_path();
        for segment in streamer.segments() {
            assert!(
                path.span(segment.span_index).is_some(),
                "active span {} lost its control points",
                segment.span_index
            );
        }
    }
}

#[test]
fn test_standing_still_keeps_window_stable() {
    let mut streamer =
        SegmentStreamer::new(StreamConfig::default(), StdRng::seed_from_u64(16)).unwrap();
    streamer.seed().unwrap();

    // Let a parked observer top up the window, then expect it to hold still.
    for _ in 0..20 {
        streamer.tick(Point3::ORIGIN, 0.016).unwrap();
    }
    let settled = streamer.segment_count();

    for _ in 0..50 {
        let report = streamer.tick(Point3::ORIGIN, 0.016).unwrap();
        assert!(report.created_segments.is_empty());
        assert!(report.retired_segments.is_empty());
    }
    assert_eq!(streamer.segment_count(), settled);
}
