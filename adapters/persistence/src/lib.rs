#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence of leaderboards and best-run ghosts.
//!
//! The game talks to a remote key-value store through the [`BlobStore`] port.
//! [`ScoreKeeper`] layers the read-modify-write flows for finished runs on
//! top of it and never lets a store failure reach gameplay.

mod http;
mod score_keeper;
mod store;

pub use http::HttpBlobStore;
pub use score_keeper::{ScoreKeeper, StoreLayout};
pub use store::{BlobStore, MemoryBlobStore, StoreError};
