//! Storefront Server Library
//!
//! This library exposes the internal modules for testing and for the
//! visitor CLI.

pub mod config;
pub mod engagement;
pub mod page;
pub mod reviews;
pub mod server;
pub mod sqlite_persistence;
pub mod storefront_store;

// Re-export commonly used types for convenience
pub use engagement::{LikeTracker, RetryPolicy};
pub use server::{run_server, RequestsLoggingLevel};
pub use storefront_store::{
    MemoryStorefrontStore, RemoteStorefrontStore, SqliteStorefrontStore, StoreError,
    StorefrontStore,
};
