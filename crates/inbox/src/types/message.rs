//! Messages handed to layer-2 execution.

use alloy_primitives::{Address, Bytes, B256, U256};

/// Message kind for ordinary layer-2 payloads.
pub const L1_MESSAGE_TYPE_L2_MESSAGE: u8 = 3;

/// Message kind for the canonical invalid placeholder.
pub const L1_MESSAGE_TYPE_INVALID: u8 = 0xFF;

/// Provenance metadata stamped onto a message when it entered through the
/// parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1IncomingMessageHeader {
    /// The message kind.
    pub kind: u8,
    /// Address credited with posting the message.
    pub poster: Address,
    /// Parent-chain block number assigned to the message.
    pub block_number: u64,
    /// Timestamp assigned to the message.
    pub timestamp: u64,
    /// Request id, present on retryable-style messages.
    pub request_id: Option<B256>,
    /// Parent-chain base fee at inclusion.
    pub base_fee_l1: U256,
}

/// A single message as seen by layer-2 execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1IncomingMessage {
    /// Provenance metadata.
    pub header: L1IncomingMessageHeader,
    /// Opaque layer-2 payload.
    pub l2_msg: Bytes,
}

impl L1IncomingMessage {
    /// The canonical placeholder for a sub-message that could not be
    /// decoded. Every honest node must emit it identically.
    pub fn invalid() -> Self {
        Self {
            header: L1IncomingMessageHeader {
                kind: L1_MESSAGE_TYPE_INVALID,
                poster: Address::ZERO,
                block_number: 0,
                timestamp: 0,
                request_id: None,
                base_fee_l1: U256::ZERO,
            },
            l2_msg: Bytes::new(),
        }
    }
}

/// A popped message together with the delayed-inbox progress after it is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithMetadata {
    /// The message itself.
    pub message: L1IncomingMessage,
    /// How many delayed messages have been read once this message applies.
    pub delayed_messages_read: u64,
}
