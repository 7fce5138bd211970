//! Builders for well-formed sequencer batches.

use alloy_primitives::Bytes;
use alloy_rlp::Encodable;

use crate::{compress, header, types::BatchSegmentKind};

/// Encodes the fixed 40-byte big-endian batch header.
pub fn encode_batch_header(
    min_timestamp: u64,
    max_timestamp: u64,
    min_l1_block: u64,
    max_l1_block: u64,
    after_delayed_messages: u64,
) -> Vec<u8> {
    let mut header = Vec::with_capacity(40);
    header.extend_from_slice(&min_timestamp.to_be_bytes());
    header.extend_from_slice(&max_timestamp.to_be_bytes());
    header.extend_from_slice(&min_l1_block.to_be_bytes());
    header.extend_from_slice(&max_l1_block.to_be_bytes());
    header.extend_from_slice(&after_delayed_messages.to_be_bytes());
    header
}

/// Encodes segments as the consecutive RLP byte strings of a batch stream.
pub fn encode_segments(segments: &[Vec<u8>]) -> Vec<u8> {
    let mut stream = Vec::new();
    for segment in segments {
        Bytes::copy_from_slice(segment).encode(&mut stream);
    }
    stream
}

/// Builds a complete batch: header, brotli marker, compressed segments.
pub fn build_batch(header_bytes: &[u8], segments: &[Vec<u8>]) -> Vec<u8> {
    let mut batch = header_bytes.to_vec();
    batch.push(header::BROTLI_MESSAGE_HEADER_BYTE);
    let stream = encode_segments(segments);
    batch.extend_from_slice(&compress::compress(&stream).expect("compression cannot fail"));
    batch
}

/// A raw L2 message segment.
pub fn l2_segment(body: &[u8]) -> Vec<u8> {
    let mut segment = vec![BatchSegmentKind::L2Message as u8];
    segment.extend_from_slice(body);
    segment
}

/// A brotli-compressed L2 message segment.
pub fn l2_brotli_segment(body: &[u8]) -> Vec<u8> {
    let mut segment = vec![BatchSegmentKind::L2MessageBrotli as u8];
    segment.extend_from_slice(&compress::compress(body).expect("compression cannot fail"));
    segment
}

/// A consume-one-delayed-message marker segment.
pub fn delayed_segment() -> Vec<u8> {
    vec![BatchSegmentKind::DelayedMessages as u8]
}

/// A time or block advance directive with an RLP-encoded delta.
pub fn advance_segment(kind: BatchSegmentKind, delta: u64) -> Vec<u8> {
    let mut segment = vec![kind as u8];
    segment.extend_from_slice(&alloy_rlp::encode(delta));
    segment
}
