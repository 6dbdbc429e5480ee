//! Core types and trait definitions for the Folio content store.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the record model, the [`RecordStore`](store::RecordStore) abstraction, and
//! the write pipeline that keeps relationship fields free of dangling
//! references when records are deleted.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cleanup;
pub mod cms;
pub mod error;
pub mod hooks;
pub mod record;
pub mod reference;
pub mod revalidate;
pub mod seed;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{CleanupError, Error, Result};
