//! Bulk table transfer: CSV and JSON export/import.
//!
//! A table moves as a whole, column by column as stored. Imports insert one
//! row at a time; a failing row stops the import and leaves the rows already
//! written in place.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};
use sqlx::Row;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use tracing::instrument;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Storage class of a column.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
}

impl ColumnKind {
    fn expected(self) -> &'static str {
        match self {
            ColumnKind::Integer => "an integer",
            ColumnKind::Real => "a number",
            ColumnKind::Text => "text",
        }
    }
}

type Column = (&'static str, ColumnKind);

const CUSTOMER_COLUMNS: &[Column] = &[
    ("id", ColumnKind::Integer),
    ("first_name", ColumnKind::Text),
    ("last_name", ColumnKind::Text),
    ("email", ColumnKind::Text),
    ("phone", ColumnKind::Text),
    ("address", ColumnKind::Text),
];
const PRODUCT_COLUMNS: &[Column] = &[
    ("id", ColumnKind::Integer),
    ("name", ColumnKind::Text),
    ("price", ColumnKind::Real),
    ("category", ColumnKind::Text),
];
const ORDER_COLUMNS: &[Column] = &[
    ("id", ColumnKind::Integer),
    ("customer_id", ColumnKind::Integer),
    ("order_date", ColumnKind::Text),
    ("status", ColumnKind::Text),
];
const ORDER_ITEM_COLUMNS: &[Column] = &[
    ("order_id", ColumnKind::Integer),
    ("product_id", ColumnKind::Integer),
    ("quantity", ColumnKind::Integer),
];

/// A transferable shop table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Table {
    Customers,
    Products,
    Orders,
    OrderItems,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Customers,
        Table::Products,
        Table::Orders,
        Table::OrderItems,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Products => "products",
            Table::Orders => "orders",
            Table::OrderItems => "order_items",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Table::Customers => CUSTOMER_COLUMNS,
            Table::Products => PRODUCT_COLUMNS,
            Table::Orders => ORDER_COLUMNS,
            Table::OrderItems => ORDER_ITEM_COLUMNS,
        }
    }

    fn column(self, name: &str) -> StoreResult<Column> {
        self.columns()
            .iter()
            .copied()
            .find(|(column, _)| *column == name)
            .ok_or_else(|| StoreError::UnknownColumn {
                table: self.name(),
                column: name.to_string(),
            })
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Table::ALL
            .into_iter()
            .find(|table| table.name() == wanted)
            .ok_or_else(|| {
                format!("unknown table {s:?} (expected customers, products, orders or order_items)")
            })
    }
}

impl core::fmt::Display for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// File format of a transfer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransferFormat {
    Csv,
    Json,
}

impl TransferFormat {
    /// Guess the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(TransferFormat::Csv),
            "json" => Some(TransferFormat::Json),
            _ => None,
        }
    }
}

/// One cell, typed by SQLite storage class.
#[derive(Debug, Clone, PartialEq)]
enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    fn to_csv_field(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Integer(v) => v.to_string(),
            SqlValue::Real(v) => v.to_string(),
            SqlValue::Text(v) => v.clone(),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_unit(),
            SqlValue::Integer(v) => serializer.serialize_i64(*v),
            SqlValue::Real(v) => serializer.serialize_f64(*v),
            SqlValue::Text(v) => serializer.serialize_str(v),
        }
    }
}

/// Row serialized as an object in column order.
struct JsonRecord<'a> {
    columns: &'a [Column],
    values: &'a [SqlValue],
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for ((name, _), value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q SqlValue) -> SqliteQuery<'q> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
    }
}

fn read_value(row: &SqliteRow, index: usize, kind: ColumnKind) -> Result<SqlValue, sqlx::Error> {
    Ok(match kind {
        ColumnKind::Integer => row
            .try_get::<Option<i64>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Integer),
        ColumnKind::Real => row
            .try_get::<Option<f64>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Real),
        ColumnKind::Text => row
            .try_get::<Option<String>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Text),
    })
}

fn invalid(table: Table, column: &str, value: impl Into<String>, kind: ColumnKind) -> StoreError {
    StoreError::InvalidValue {
        table: table.name(),
        column: column.to_string(),
        value: value.into(),
        expected: kind.expected(),
    }
}

/// Coerce a text cell. Empty numeric cells become NULL.
fn value_from_text(table: Table, (column, kind): Column, raw: &str) -> StoreResult<SqlValue> {
    match kind {
        ColumnKind::Text => Ok(SqlValue::Text(raw.to_string())),
        _ if raw.trim().is_empty() => Ok(SqlValue::Null),
        ColumnKind::Integer => raw
            .trim()
            .parse()
            .map(SqlValue::Integer)
            .map_err(|_| invalid(table, column, raw, kind)),
        ColumnKind::Real => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(SqlValue::Real)
            .ok_or_else(|| invalid(table, column, raw, kind)),
    }
}

fn value_from_json(table: Table, (column, kind): Column, raw: &serde_json::Value) -> StoreResult<SqlValue> {
    use serde_json::Value;

    match (raw, kind) {
        (Value::Null, _) => Ok(SqlValue::Null),
        (Value::String(text), _) => value_from_text(table, (column, kind), text),
        (Value::Bool(flag), ColumnKind::Text) => Ok(SqlValue::Text(flag.to_string())),
        (Value::Bool(flag), _) => Ok(SqlValue::Integer(i64::from(*flag))),
        (Value::Number(number), ColumnKind::Text) => Ok(SqlValue::Text(number.to_string())),
        (Value::Number(number), ColumnKind::Real) => number
            .as_f64()
            .map(SqlValue::Real)
            .ok_or_else(|| invalid(table, column, number.to_string(), kind)),
        (Value::Number(number), ColumnKind::Integer) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(whole_i64))
            .map(SqlValue::Integer)
            .ok_or_else(|| invalid(table, column, number.to_string(), kind)),
        (other @ (Value::Array(_) | Value::Object(_)), _) => {
            Err(invalid(table, column, other.to_string(), kind))
        }
    }
}

/// Whole floats inside the `i64` range; anything else would saturate on cast.
fn whole_i64(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (in_range && value.fract() == 0.0).then_some(value as i64)
}

async fn read_table(db: &Database, table: Table) -> StoreResult<Vec<Vec<SqlValue>>> {
    let names: Vec<&str> = table.columns().iter().map(|(name, _)| *name).collect();
    let sql = format!("SELECT {} FROM {} ORDER BY rowid", names.join(", "), table.name());
    let rows = sqlx::query(&sql).fetch_all(db.pool()).await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let record = table
            .columns()
            .iter()
            .enumerate()
            .map(|(index, (_, kind))| read_value(row, index, *kind))
            .collect::<Result<Vec<_>, _>>()?;
        records.push(record);
    }
    Ok(records)
}

fn insert_statement(table: Table, columns: &[Column]) -> String {
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        names.join(", "),
        placeholders
    )
}

async fn insert_record(db: &Database, sql: &str, values: &[SqlValue]) -> StoreResult<()> {
    let mut query = sqlx::query(sql);
    for value in values {
        query = bind_value(query, value);
    }
    query.execute(db.pool()).await?;
    Ok(())
}

/// Write `table` to a CSV file with a header row. Returns the number of rows.
#[instrument(skip(db, path), fields(file = %path.as_ref().display()), err)]
pub async fn export_csv(db: &Database, table: Table, path: impl AsRef<Path>) -> StoreResult<usize> {
    let records = read_table(db, table).await?;

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(table.columns().iter().map(|(name, _)| *name))?;
    for record in &records {
        writer.write_record(record.iter().map(SqlValue::to_csv_field))?;
    }
    writer.flush()?;

    tracing::info!(%table, rows = records.len(), "exported csv");
    Ok(records.len())
}

/// Insert every CSV record into `table`. The header names the columns.
#[instrument(skip(db, path), fields(file = %path.as_ref().display()), err)]
pub async fn import_csv(db: &Database, table: Table, path: impl AsRef<Path>) -> StoreResult<usize> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let columns = reader
        .headers()?
        .iter()
        .map(|name| table.column(name.trim()))
        .collect::<StoreResult<Vec<_>>>()?;
    let sql = insert_statement(table, &columns);

    let mut written = 0;
    for record in reader.records() {
        let record = record?;
        let values = columns
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| value_from_text(table, *column, raw))
            .collect::<StoreResult<Vec<_>>>()?;
        insert_record(db, &sql, &values).await?;
        written += 1;
    }

    tracing::info!(%table, rows = written, "imported csv");
    Ok(written)
}

/// Write `table` as a pretty-printed JSON array of objects.
#[instrument(skip(db, path), fields(file = %path.as_ref().display()), err)]
pub async fn export_json(db: &Database, table: Table, path: impl AsRef<Path>) -> StoreResult<usize> {
    let records = read_table(db, table).await?;
    let objects: Vec<JsonRecord<'_>> = records
        .iter()
        .map(|values| JsonRecord {
            columns: table.columns(),
            values,
        })
        .collect();

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    objects.serialize(&mut serializer)?;
    writer.flush()?;

    tracing::info!(%table, rows = records.len(), "exported json");
    Ok(records.len())
}

/// Insert every object of a JSON array into `table`.
///
/// The keys of the first object name the columns; an object missing one of
/// them inserts NULL there.
#[instrument(skip(db, path), fields(file = %path.as_ref().display()), err)]
pub async fn import_json(db: &Database, table: Table, path: impl AsRef<Path>) -> StoreResult<usize> {
    let document: serde_json::Value = serde_json::from_reader(BufReader::new(File::open(path.as_ref())?))?;
    let serde_json::Value::Array(items) = document else {
        return Err(StoreError::MalformedFile("expected a JSON array of objects".to_string()));
    };
    let Some(first) = items.first() else {
        return Ok(0);
    };
    let serde_json::Value::Object(first) = first else {
        return Err(StoreError::MalformedFile("array element 0 is not an object".to_string()));
    };

    let columns = first
        .keys()
        .map(|name| table.column(name))
        .collect::<StoreResult<Vec<_>>>()?;
    let sql = insert_statement(table, &columns);

    let mut written = 0;
    for (index, item) in items.iter().enumerate() {
        let serde_json::Value::Object(object) = item else {
            return Err(StoreError::MalformedFile(format!("array element {index} is not an object")));
        };
        let values = columns
            .iter()
            .map(|column| {
                let raw = object.get(column.0).unwrap_or(&serde_json::Value::Null);
                value_from_json(table, *column, raw)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        insert_record(db, &sql, &values).await?;
        written += 1;
    }

    tracing::info!(%table, rows = written, "imported json");
    Ok(written)
}

/// Export in the given format.
pub async fn export_table(
    db: &Database,
    table: Table,
    path: impl AsRef<Path>,
    format: TransferFormat,
) -> StoreResult<usize> {
    match format {
        TransferFormat::Csv => export_csv(db, table, path).await,
        TransferFormat::Json => export_json(db, table, path).await,
    }
}

/// Import in the given format.
pub async fn import_table(
    db: &Database,
    table: Table,
    path: impl AsRef<Path>,
    format: TransferFormat,
) -> StoreResult<usize> {
    match format {
        TransferFormat::Csv => import_csv(db, table, path).await,
        TransferFormat::Json => import_json(db, table, path).await,
    }
}
