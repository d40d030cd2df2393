//! Customers domain module.
//!
//! This crate contains the customer record and the validation rules for its
//! contact details, implemented purely as deterministic domain logic (no IO,
//! no storage).

pub mod contact;
pub mod customer;

pub use contact::{Address, Email, Phone};
pub use customer::Customer;
