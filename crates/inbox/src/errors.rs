//! Error types for the inbox core.

use alloy_primitives::B256;
use thiserror::Error;

/// A hard error escaping the parser or the multiplexer.
///
/// Malformed payload content never surfaces here. Those paths are absorbed
/// into canonical invalid messages so every honest node derives the same
/// stream from the same batches, and the cursor advances regardless.
#[derive(Error, Debug)]
pub enum InboxError {
    /// The sequencer message is shorter than its fixed 40-byte header.
    #[error("sequencer message missing L1 header")]
    MissingHeader,
    /// The parent chain authenticated a header byte this node cannot decode.
    /// Continuing would risk consensus divergence; the process must stop.
    #[error("fatal: node out of date, unsupported authenticated header byte {0:#04x}")]
    NodeOutOfDate(u8),
    /// A content-addressed preimage does not hash back to its key.
    #[error("preimage does not hash to its key {0}")]
    HashMismatch(B256),
    /// The caller cancelled ahead of a network or storage call.
    #[error("inbox operation cancelled")]
    Cancelled,
    /// An infrastructure failure from the backend or an injected reader.
    #[error("backend error: {0}")]
    Backend(anyhow::Error),
}
