//! The storage-facing contract the multiplexer consumes.

use alloy_primitives::{Bytes, B256};
use anyhow::Result;
use async_trait::async_trait;

use crate::types::L1IncomingMessage;

/// Serves sequencer batches and the delayed-inbox stream.
///
/// The backend owns the batch queue and the delayed store; the multiplexer
/// only moves through them via this interface. The backend must not mutate
/// batch bytes after they have been peeked.
#[async_trait]
pub trait InboxBackend {
    /// Returns the current batch bytes and the parent-chain block hash the
    /// batch was found at. Non-destructive. The hash is zero in replay
    /// contexts.
    async fn peek_sequencer_inbox(&mut self) -> Result<(Bytes, B256)>;

    /// Position of the current batch in the sequencer inbox.
    fn get_sequencer_inbox_position(&self) -> u64;

    /// Moves past the current batch.
    fn advance_sequencer_inbox(&mut self);

    /// The sub-message position within the current batch.
    fn get_position_within_message(&self) -> u64;

    /// Persists the sub-message position within the current batch.
    fn set_position_within_message(&mut self, pos: u64);

    /// Reads delayed message `seq_num` from the delayed inbox.
    async fn read_delayed_inbox(&mut self, seq_num: u64) -> Result<L1IncomingMessage>;
}
