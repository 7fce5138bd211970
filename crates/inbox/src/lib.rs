#![doc = include_str!("../README.md")]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![deny(unused_must_use, rust_2018_idioms)]

pub mod compress;
pub mod das;
pub mod errors;
pub mod header;
pub mod params;
pub mod sources;
pub mod stages;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use errors::InboxError;
pub use stages::{parse_sequencer_message, InboxMultiplexer};
