//! The parsed sequencer message and its segment tagging.

use alloy_primitives::Bytes;

use crate::{errors::InboxError, params::BATCH_HEADER_LEN};

/// Kind tag carried in the first byte of a non-empty segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatchSegmentKind {
    /// Raw L2 message bytes.
    L2Message = 0,
    /// Brotli-compressed L2 message bytes.
    L2MessageBrotli = 1,
    /// Consume one delayed-inbox message.
    DelayedMessages = 2,
    /// RLP-encoded u64 delta added to the running timestamp.
    AdvanceTimestamp = 3,
    /// RLP-encoded u64 delta added to the running parent-chain block number.
    AdvanceL1BlockNumber = 4,
}

impl BatchSegmentKind {
    /// Maps a tag byte to its kind. Unknown tags degrade to invalid messages
    /// downstream rather than failing the batch.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::L2Message),
            1 => Some(Self::L2MessageBrotli),
            2 => Some(Self::DelayedMessages),
            3 => Some(Self::AdvanceTimestamp),
            4 => Some(Self::AdvanceL1BlockNumber),
            _ => None,
        }
    }
}

/// A sequencer batch after header decoding and payload staging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerMessage {
    /// Lower clamp bound for emitted timestamps.
    pub min_timestamp: u64,
    /// Upper clamp bound for emitted timestamps.
    pub max_timestamp: u64,
    /// Lower clamp bound for emitted parent-chain block numbers.
    pub min_l1_block: u64,
    /// Upper clamp bound for emitted parent-chain block numbers.
    pub max_l1_block: u64,
    /// Delayed-inbox position that must be reached before this batch is
    /// exhausted.
    pub after_delayed_messages: u64,
    /// The decoded segment list, capped at
    /// [crate::params::MAX_SEGMENTS_PER_SEQUENCER_MESSAGE].
    pub segments: Vec<Bytes>,
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

impl SequencerMessage {
    /// Decodes the fixed 40-byte big-endian header
    /// `[minT|maxT|minL1|maxL1|afterDelayed]`. Segments start empty.
    pub fn decode_header(data: &[u8]) -> Result<Self, InboxError> {
        if data.len() < BATCH_HEADER_LEN {
            return Err(InboxError::MissingHeader);
        }
        Ok(Self {
            min_timestamp: be_u64(&data[..8]),
            max_timestamp: be_u64(&data[8..16]),
            min_l1_block: be_u64(&data[16..24]),
            max_l1_block: be_u64(&data[24..32]),
            after_delayed_messages: be_u64(&data[32..40]),
            segments: Vec::new(),
        })
    }
}
