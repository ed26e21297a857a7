//! dubsplit - split multi-language media containers into per-language files
//!
//! The library crate holds configuration, input discovery and the batch
//! pipeline so they can be exercised by integration tests.

pub mod config;
pub mod discover;
pub mod processor;
pub mod summary;
