//! An in-memory [InboxBackend] over fixed batches and delayed messages.

use std::sync::{Arc, Mutex};

use alloy_primitives::{Bytes, B256};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::{traits::InboxBackend, types::L1IncomingMessage};

#[derive(Debug, Default)]
struct Inner {
    batches: Vec<Bytes>,
    batch_block_hash: B256,
    delayed: Vec<L1IncomingMessage>,
    position: u64,
    position_within_message: u64,
    fail_peek: bool,
    fail_delayed: bool,
}

/// A mock backend for tests. Clones share state, so a test can keep a
/// handle to observe positions after the multiplexer takes ownership.
#[derive(Debug, Default, Clone)]
pub struct TestInboxBackend(Arc<Mutex<Inner>>);

impl TestInboxBackend {
    /// Creates a backend serving the given batches and delayed messages.
    pub fn new(batches: Vec<Bytes>, delayed: Vec<L1IncomingMessage>) -> Self {
        Self(Arc::new(Mutex::new(Inner { batches, delayed, ..Default::default() })))
    }

    /// Appends a batch to the queue.
    pub fn push_batch(&self, batch: Bytes) {
        self.0.lock().unwrap().batches.push(batch);
    }

    /// Appends a delayed message to the delayed inbox.
    pub fn push_delayed(&self, msg: L1IncomingMessage) {
        self.0.lock().unwrap().delayed.push(msg);
    }

    /// Makes `peek_sequencer_inbox` fail until cleared.
    pub fn set_fail_peek(&self, fail: bool) {
        self.0.lock().unwrap().fail_peek = fail;
    }

    /// Makes `read_delayed_inbox` fail until cleared.
    pub fn set_fail_delayed(&self, fail: bool) {
        self.0.lock().unwrap().fail_delayed = fail;
    }

    /// The current batch position.
    pub fn position(&self) -> u64 {
        self.0.lock().unwrap().position
    }

    /// The current sub-message position.
    pub fn position_within_message(&self) -> u64 {
        self.0.lock().unwrap().position_within_message
    }
}

#[async_trait]
impl InboxBackend for TestInboxBackend {
    async fn peek_sequencer_inbox(&mut self) -> Result<(Bytes, B256)> {
        let inner = self.0.lock().unwrap();
        if inner.fail_peek {
            bail!("peek failure");
        }
        inner
            .batches
            .get(inner.position as usize)
            .map(|batch| (batch.clone(), inner.batch_block_hash))
            .ok_or_else(|| anyhow!("no batch at position {}", inner.position))
    }

    fn get_sequencer_inbox_position(&self) -> u64 {
        self.0.lock().unwrap().position
    }

    fn advance_sequencer_inbox(&mut self) {
        self.0.lock().unwrap().position += 1;
    }

    fn get_position_within_message(&self) -> u64 {
        self.0.lock().unwrap().position_within_message
    }

    fn set_position_within_message(&mut self, pos: u64) {
        self.0.lock().unwrap().position_within_message = pos;
    }

    async fn read_delayed_inbox(&mut self, seq_num: u64) -> Result<L1IncomingMessage> {
        let inner = self.0.lock().unwrap();
        if inner.fail_delayed {
            bail!("delayed read failure");
        }
        inner
            .delayed
            .get(seq_num as usize)
            .cloned()
            .ok_or_else(|| anyhow!("no delayed message {seq_num}"))
    }
}
