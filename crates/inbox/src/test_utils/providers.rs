//! A provider type for tests that configure no DA sources.

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{das::KeysetValidationMode, errors::InboxError, traits::DataAvailabilityProvider};

/// Uninhabited: names the provider type of an empty provider list.
#[derive(Debug, Clone, Copy)]
pub enum NoProviders {}

impl NoProviders {
    /// The empty provider list.
    pub const NONE: &'static [Self] = &[];
}

#[async_trait]
impl DataAvailabilityProvider for NoProviders {
    fn is_valid_header_byte(&self, _byte: u8) -> bool {
        match *self {}
    }

    async fn recover_payload(
        &self,
        _ctx: &CancellationToken,
        _batch_num: u64,
        _batch_block_hash: B256,
        _sequencer_msg: &[u8],
        _keyset_validation: KeysetValidationMode,
    ) -> Result<Option<Bytes>, InboxError> {
        match *self {}
    }
}
