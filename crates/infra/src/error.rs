use thiserror::Error;

use shopledger_core::DomainError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the store and the table transfer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("table {table} has no column {column:?}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("invalid value {value:?} for {table}.{column}: expected {expected}")]
    InvalidValue {
        table: &'static str,
        column: String,
        value: String,
        expected: &'static str,
    },

    /// A stored row no longer satisfies the domain rules.
    #[error("corrupt {table} row {id}: {reason}")]
    CorruptRow {
        table: &'static str,
        id: i64,
        reason: String,
    },

    #[error("malformed import file: {0}")]
    MalformedFile(String),
}

impl StoreError {
    pub(crate) fn corrupt(table: &'static str, id: i64, err: impl std::fmt::Display) -> Self {
        Self::CorruptRow {
            table,
            id,
            reason: err.to_string(),
        }
    }
}
