//! Order core: atomic order creation and read-side queries.
//!
//! [`OrderCoordinator`] runs the transactional order-placement workflow:
//! validate stock, decrement inventory, compute the total and persist the
//! order with its line items as one atomic unit. [`OrderQueries`] provides
//! paginated retrieval of committed orders.

pub mod coordinator;
pub mod error;
pub mod query;

pub use coordinator::{LineItemRequest, OrderCoordinator};
pub use error::OrderError;
pub use query::OrderQueries;
