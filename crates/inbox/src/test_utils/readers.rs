//! In-memory [DasReader] and [BlobReader] implementations.

use std::sync::{Arc, Mutex};

use alloy_eips::eip4844::Blob;
use alloy_primitives::{map::HashMap, Bytes, B256};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::traits::{BlobReader, DasReader};

/// A content-addressed store over a hash map.
#[derive(Debug, Default, Clone)]
pub struct TestDasReader {
    preimages: Arc<Mutex<HashMap<B256, Bytes>>>,
}

impl TestDasReader {
    /// Stores a preimage under the given key.
    pub fn insert(&self, hash: B256, preimage: Bytes) {
        self.preimages.lock().unwrap().insert(hash, preimage);
    }
}

#[async_trait]
impl DasReader for TestDasReader {
    async fn get_by_hash(&self, hash: B256) -> Result<Bytes> {
        self.preimages
            .lock()
            .unwrap()
            .get(&hash)
            .cloned()
            .ok_or_else(|| anyhow!("no preimage for {hash}"))
    }
}

/// A blob store keyed by versioned hash.
#[derive(Debug, Default, Clone)]
pub struct TestBlobReader {
    blobs: Arc<Mutex<HashMap<B256, Box<Blob>>>>,
    fail: Arc<Mutex<bool>>,
}

impl TestBlobReader {
    /// Stores a blob under its versioned hash.
    pub fn insert(&self, versioned_hash: B256, blob: Box<Blob>) {
        self.blobs.lock().unwrap().insert(versioned_hash, blob);
    }

    /// Makes `get_blobs` fail until cleared.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl BlobReader for TestBlobReader {
    async fn get_blobs(
        &self,
        _batch_block_hash: B256,
        versioned_hashes: &[B256],
    ) -> Result<Vec<Box<Blob>>> {
        if *self.fail.lock().unwrap() {
            bail!("blob fetch failure");
        }
        let blobs = self.blobs.lock().unwrap();
        versioned_hashes
            .iter()
            .map(|hash| blobs.get(hash).cloned().ok_or_else(|| anyhow!("no blob for {hash}")))
            .collect()
    }
}
