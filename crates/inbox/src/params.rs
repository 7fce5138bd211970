//! Protocol parameters of the sequencer inbox.

use alloy_primitives::{address, Address};

/// Maximum decompressed size of a brotli batch payload (16 MiB).
pub const MAX_DECOMPRESSED_LEN: usize = 1024 * 1024 * 16;

/// Output cap for the zero-heavy decode stage. Slightly above
/// [MAX_DECOMPRESSED_LEN] so the brotli stage stays the binding limit.
pub const MAX_ZEROHEAVY_DECOMPRESSED_LEN: usize = 101 * MAX_DECOMPRESSED_LEN / 100 + 64;

/// Hard cap on the number of segments decoded from one sequencer message.
pub const MAX_SEGMENTS_PER_SEQUENCER_MESSAGE: usize = 100 * 1024;

/// Maximum decompressed size of a single compressed L2 sub-message (256 KiB).
pub const MAX_L2_MESSAGE_SIZE: usize = 256 * 1024;

/// A data availability certificate must outlive the batch window by at least
/// this many seconds (one week).
pub const MIN_LIFETIME_SECS_FOR_DA_CERT: u64 = 7 * 24 * 60 * 60;

/// Length of the fixed big-endian batch header.
pub const BATCH_HEADER_LEN: usize = 40;

/// The well-known address credited as the poster of sequencer-derived L2
/// messages.
pub const BATCH_POSTER_ADDRESS: Address = address!("a4b000000000000000000073657175656e636572");
