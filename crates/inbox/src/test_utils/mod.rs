//! Test fixtures: mock collaborators, batch builders, and a trace
//! collecting layer.

mod backend;
pub use backend::TestInboxBackend;

mod batches;
pub use batches::{
    advance_segment, build_batch, delayed_segment, encode_batch_header, encode_segments,
    l2_brotli_segment, l2_segment,
};

mod providers;
pub use providers::NoProviders;

mod readers;
pub use readers::{TestBlobReader, TestDasReader};

mod tracing;
pub use tracing::{CollectingLayer, TraceStorage};
