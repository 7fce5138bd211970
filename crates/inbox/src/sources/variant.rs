//! Closed dispatch over the in-tree data availability sources.

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    das::KeysetValidationMode,
    errors::InboxError,
    sources::{BlobSource, DasSource},
    traits::{BlobReader, DasReader, DataAvailabilityProvider},
};

/// The data availability sources built into the node.
///
/// The set is closed at build time; external integrations implement
/// [DataAvailabilityProvider] directly and sit alongside these in the
/// provider list handed to the multiplexer.
#[derive(Debug)]
pub enum DataSourceVariant<R, B> {
    /// Payload held by a data availability committee.
    Das(DasSource<R>),
    /// Payload carried in parent-chain blobs.
    Blob(BlobSource<B>),
}

#[async_trait]
impl<R, B> DataAvailabilityProvider for DataSourceVariant<R, B>
where
    R: DasReader + Send + Sync,
    B: BlobReader + Send + Sync,
{
    fn is_valid_header_byte(&self, byte: u8) -> bool {
        match self {
            Self::Das(das) => das.is_valid_header_byte(byte),
            Self::Blob(blob) => blob.is_valid_header_byte(byte),
        }
    }

    async fn recover_payload(
        &self,
        ctx: &CancellationToken,
        batch_num: u64,
        batch_block_hash: B256,
        sequencer_msg: &[u8],
        keyset_validation: KeysetValidationMode,
    ) -> Result<Option<Bytes>, InboxError> {
        match self {
            Self::Das(das) => {
                das.recover_payload(ctx, batch_num, batch_block_hash, sequencer_msg, keyset_validation)
                    .await
            }
            Self::Blob(blob) => {
                blob.recover_payload(ctx, batch_num, batch_block_hash, sequencer_msg, keyset_validation)
                    .await
            }
        }
    }
}
