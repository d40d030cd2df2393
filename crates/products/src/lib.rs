//! Products domain module.
//!
//! This crate contains the catalog record, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod product;

pub use product::Product;
