//! The data availability recovery capability.

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{das::KeysetValidationMode, errors::InboxError};

/// Recovers an inner payload from a sequencer batch stored off the parent
/// chain.
///
/// At most one provider is consulted per batch: the first whose
/// [`is_valid_header_byte`](Self::is_valid_header_byte) claims the payload's
/// leading byte. The parent-chain inbox contract authenticates a single DA
/// header per batch, so chaining providers would decode data the contract
/// never validated.
#[async_trait]
pub trait DataAvailabilityProvider {
    /// Whether this provider claims the given payload header byte.
    fn is_valid_header_byte(&self, byte: u8) -> bool;

    /// Recovers the inner payload from `sequencer_msg` (the whole batch,
    /// header included).
    ///
    /// `Ok(None)` means the envelope was understood but yields nothing to
    /// decode further; the batch degrades to a header-only parse. Errors are
    /// reserved for infrastructure failures and hash mismatches.
    async fn recover_payload(
        &self,
        ctx: &CancellationToken,
        batch_num: u64,
        batch_block_hash: B256,
        sequencer_msg: &[u8],
        keyset_validation: KeysetValidationMode,
    ) -> Result<Option<Bytes>, InboxError>;
}
