//! Core types of the inbox: parsed batches, segment tagging, and the
//! messages handed to layer-2 execution.

mod batch;
pub use batch::{BatchSegmentKind, SequencerMessage};

mod message;
pub use message::{
    L1IncomingMessage, L1IncomingMessageHeader, MessageWithMetadata, L1_MESSAGE_TYPE_INVALID,
    L1_MESSAGE_TYPE_L2_MESSAGE,
};
