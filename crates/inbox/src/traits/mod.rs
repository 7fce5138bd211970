//! Contracts between the inbox core and its collaborators: the batch
//! backend, content-addressed readers, and data availability recovery.

mod backend;
pub use backend::InboxBackend;

mod readers;
pub use readers::{BlobReader, DasReader};

mod provider;
pub use provider::DataAvailabilityProvider;
