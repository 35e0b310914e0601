//! Core types, algorithms and store traits for the Haven café.
//!
//! This crate is free of HTTP and database dependencies. The API and the
//! storage backends depend on it; it depends on nothing of theirs.

// Native `async fn` in traits; the trait methods spell out their `Send`
// futures explicitly.
#![allow(async_fn_in_trait)]

pub mod cafe;
pub mod error;
pub mod gift;
pub mod store;

pub use error::{Error, Result};
