//! Shared value types for the storefront order core.

pub mod money;
pub mod payment;
pub mod types;

pub use money::Money;
pub use payment::PaymentMethod;
pub use types::{OrderId, ProductId, UserId};
