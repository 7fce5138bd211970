//! Readers serving off-chain batch payloads.

use alloy_eips::eip4844::Blob;
use alloy_primitives::{Bytes, B256};
use anyhow::Result;
use async_trait::async_trait;

/// A content-addressed store serving DAS preimages.
#[async_trait]
pub trait DasReader {
    /// Fetches the preimage of `hash`. Integrity is re-checked by the
    /// caller, so the store itself is untrusted.
    async fn get_by_hash(&self, hash: B256) -> Result<Bytes>;
}

/// Fetches parent-chain blobs by versioned hash.
#[async_trait]
pub trait BlobReader {
    /// Returns the blobs referenced by the batch found at
    /// `batch_block_hash`, in the order of `versioned_hashes`.
    async fn get_blobs(
        &self,
        batch_block_hash: B256,
        versioned_hashes: &[B256],
    ) -> Result<Vec<Box<Blob>>>;
}
