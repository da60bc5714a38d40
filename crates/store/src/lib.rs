//! Storage layer for the storefront order core.
//!
//! Defines the [`Store`] seam the order coordinator runs against, with a
//! PostgreSQL implementation for production and an in-memory twin for
//! tests and development.

pub mod backend;
pub mod error;
pub mod memory;
pub mod order;
pub mod paginate;
pub mod postgres;
pub mod product;

pub use backend::{Store, StoreTx};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use order::{LineItem, Order};
pub use paginate::{Page, PageMetadata};
pub use postgres::PostgresStore;
pub use product::Product;
