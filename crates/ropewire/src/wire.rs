//! Flat-array codec for engine query results.
//!
//! Ranges cross the boundary as consecutive `[start_row, start_column,
//! end_row, end_column]` quads, points as consecutive pairs. A wrong-length
//! payload is an engine/codec contract violation rather than bad user
//! input, so the decoders fail fast instead of returning errors.

use ropewire_engine_api::{Point, Range};

/// Decode one range from the four integers starting at `offset`.
pub fn decode_range(flat: &[u32], offset: usize) -> Range {
    assert!(
        offset + 4 <= flat.len(),
        "range at offset {offset} overruns a payload of {} values",
        flat.len()
    );
    Range::new(
        Point::new(flat[offset], flat[offset + 1]),
        Point::new(flat[offset + 2], flat[offset + 3]),
    )
}

/// Decode a whole payload into ranges, preserving engine order.
pub fn decode_range_array(flat: &[u32]) -> Vec<Range> {
    assert!(
        flat.len() % 4 == 0,
        "range payload length {} is not a multiple of 4",
        flat.len()
    );
    flat.chunks_exact(4)
        .map(|quad| Range::new(Point::new(quad[0], quad[1]), Point::new(quad[2], quad[3])))
        .collect()
}

/// Decode `count` points starting at `offset`, returning them together with
/// the number of integers consumed so callers can advance a shared cursor.
pub fn decode_point_array(flat: &[u32], offset: usize, count: usize) -> (Vec<Point>, usize) {
    let consumed = count * 2;
    assert!(
        offset + consumed <= flat.len(),
        "point run of {count} at offset {offset} overruns a payload of {} values",
        flat.len()
    );
    let points = flat[offset..offset + consumed]
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect();
    (points, consumed)
}

/// Encode one range as the engine's four-integer quad.
pub fn encode_range(range: &Range) -> [u32; 4] {
    [
        range.start.row,
        range.start.column,
        range.end.row,
        range.end.column,
    ]
}

/// Encode ranges back into a flat payload; the exact inverse of
/// [`decode_range_array`].
pub fn encode_range_array(ranges: &[Range]) -> Vec<u32> {
    ranges.iter().flat_map(encode_range).collect()
}
