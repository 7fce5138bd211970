//! Payload recovery from parent-chain blobs.

use alloy_eips::eip4844::{Blob, BYTES_PER_BLOB};
use alloy_primitives::{Bytes, B256};
use alloy_rlp::Encodable;
use anyhow::anyhow;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    das::KeysetValidationMode,
    errors::InboxError,
    header,
    params::BATCH_HEADER_LEN,
    traits::{BlobReader, DataAvailabilityProvider},
};

/// Bytes of payload carried per 32-byte field element. The leading byte of
/// every field element stays zero to keep it canonical.
const BYTES_PER_FIELD_ELEMENT: usize = 32;

/// Decodes blob bytes into the payload they carry: the first byte of every
/// field element is dropped and the remainder holds a single RLP byte
/// string, with zero padding after it ignored.
pub fn decode_blobs(blobs: &[Box<Blob>]) -> Result<Bytes, alloy_rlp::Error> {
    let mut packed = Vec::with_capacity(blobs.len() * BYTES_PER_BLOB);
    for blob in blobs {
        for element in blob.as_slice().chunks_exact(BYTES_PER_FIELD_ELEMENT) {
            packed.extend_from_slice(&element[1..]);
        }
    }
    let mut buf = packed.as_slice();
    let rlp_header = alloy_rlp::Header::decode(&mut buf)?;
    if rlp_header.list {
        return Err(alloy_rlp::Error::UnexpectedList);
    }
    if buf.len() < rlp_header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    Ok(Bytes::copy_from_slice(&buf[..rlp_header.payload_length]))
}

/// Packs a payload into blobs, the inverse of [decode_blobs].
pub fn encode_blobs(payload: &[u8]) -> Vec<Box<Blob>> {
    let mut framed = Vec::with_capacity(payload.len() + 8);
    Bytes::copy_from_slice(payload).encode(&mut framed);
    let usable = BYTES_PER_FIELD_ELEMENT - 1;
    let elements_per_blob = BYTES_PER_BLOB / BYTES_PER_FIELD_ELEMENT;
    let mut blobs = Vec::new();
    for chunk in framed.chunks(usable * elements_per_blob) {
        let mut blob = Box::new(Blob::ZERO);
        for (i, element) in chunk.chunks(usable).enumerate() {
            let offset = i * BYTES_PER_FIELD_ELEMENT + 1;
            blob[offset..offset + element.len()].copy_from_slice(element);
        }
        blobs.push(blob);
    }
    blobs
}

/// Recovers batch payloads referenced as packed versioned blob hashes.
#[derive(Debug, Clone)]
pub struct BlobSource<B> {
    reader: B,
}

impl<B> BlobSource<B>
where
    B: BlobReader,
{
    /// Creates a new blob source over the given reader.
    pub const fn new(reader: B) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<B> DataAvailabilityProvider for BlobSource<B>
where
    B: BlobReader + Send + Sync,
{
    fn is_valid_header_byte(&self, byte: u8) -> bool {
        header::is_blob_hashes(byte)
    }

    async fn recover_payload(
        &self,
        ctx: &CancellationToken,
        _batch_num: u64,
        batch_block_hash: B256,
        sequencer_msg: &[u8],
        _keyset_validation: KeysetValidationMode,
    ) -> Result<Option<Bytes>, InboxError> {
        let hash_bytes = sequencer_msg.get(BATCH_HEADER_LEN + 1..).unwrap_or_default();
        if hash_bytes.len() % 32 != 0 {
            return Err(InboxError::Backend(anyhow!(
                "blob batch data is not a list of hashes as expected"
            )));
        }
        let versioned_hashes: Vec<B256> =
            hash_bytes.chunks_exact(32).map(B256::from_slice).collect();
        if ctx.is_cancelled() {
            return Err(InboxError::Cancelled);
        }
        let blobs = self
            .reader
            .get_blobs(batch_block_hash, &versioned_hashes)
            .await
            .map_err(|err| InboxError::Backend(err.context("failed to get blobs")))?;
        match decode_blobs(&blobs) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) => {
                warn!(
                    target: "blob-source",
                    %err,
                    %batch_block_hash,
                    ?versioned_hashes,
                    "failed to decode blobs"
                );
                Ok(None)
            }
        }
    }
}
