//! Infrastructure layer: the SQLite store and bulk table transfer.

pub mod db;
pub mod error;
pub mod store;
pub mod transfer;

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use store::ShopStore;
pub use transfer::{ColumnKind, Table, TransferFormat};
