//! Sales orders domain module.
//!
//! This crate contains business rules for orders and their line items,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod date;
pub mod order;

pub use date::{format_order_date, parse_order_date};
pub use order::{Order, OrderLine, OrderStatus};
