//! In-memory backend for the Haven stores.
//!
//! Everything lives behind one [`tokio::sync::RwLock`], so every write is
//! atomic with respect to readers. Data is lost on restart; use it for tests
//! and for trying the service out.

mod cafe;
mod gift;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::MemoryStore;
