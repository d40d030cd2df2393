//! `shopledger-core`: identifiers, entity identity and the domain error type.
//!
//! Pure domain primitives shared by the customer, product and sales crates.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, OrderId, ProductId};
pub use value_object::ValueObject;
