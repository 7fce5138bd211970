//! The in-tree data availability sources consulted during payload staging.

mod das;
pub use das::DasSource;

mod blob;
pub use blob::{decode_blobs, encode_blobs, BlobSource};

mod variant;
pub use variant::DataSourceVariant;
