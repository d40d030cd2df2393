//! Command-line surface.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};

use shopledger_analytics::{DEFAULT_MIN_COMMON_PRODUCTS, DEFAULT_TOP_CUSTOMERS, Period};
use shopledger_core::{CustomerId, OrderId, ProductId};
use shopledger_infra::{Table, TransferFormat};
use shopledger_observability::LogFormat;

/// Small-shop ledger: customers, products, orders and sales reports.
#[derive(Debug, Parser)]
#[command(name = "shopledger", author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = "SHOPLEDGER_DB")]
    pub db: Option<PathBuf>,

    /// Log line format: pretty or json.
    #[arg(long, global = true, env = "SHOPLEDGER_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage customers.
    #[command(subcommand)]
    Customer(CustomerCommand),
    /// Manage the product catalog.
    #[command(subcommand)]
    Product(ProductCommand),
    /// Create and inspect orders.
    #[command(subcommand)]
    Order(OrderCommand),
    /// Sales reports.
    #[command(subcommand)]
    Report(ReportCommand),
    /// Export a table to a CSV or JSON file.
    Export(TransferArgs),
    /// Import rows from a CSV or JSON file into a table.
    Import(TransferArgs),
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    Add(NewCustomer),
    List,
    /// Case-insensitive search over names and contact details.
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    Delete { id: CustomerId },
}

#[derive(Debug, Args)]
pub struct NewCustomer {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub address: String,
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
        #[arg(long)]
        category: String,
    },
    List,
    Delete { id: ProductId },
}

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    Create {
        #[arg(long)]
        customer: CustomerId,
        /// Line item as PRODUCT_ID:QUANTITY; repeat for more lines.
        #[arg(long = "item", required = true, value_name = "PRODUCT_ID:QTY")]
        items: Vec<LineItemArg>,
        /// Defaults to the status of a new order.
        #[arg(long)]
        status: Option<String>,
        /// ISO-8601 timestamp; defaults to now.
        #[arg(long)]
        date: Option<String>,
    },
    List,
    Show { id: OrderId },
    SetStatus { id: OrderId, status: String },
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Customers with the most orders.
    TopCustomers {
        #[arg(long, default_value_t = DEFAULT_TOP_CUSTOMERS)]
        limit: usize,
        #[command(flatten)]
        output: ReportOutput,
    },
    /// Orders per day, week or month.
    Trend {
        /// D|day, W|week or M|month.
        #[arg(long, default_value_t = Period::Day)]
        period: Period,
        #[command(flatten)]
        output: ReportOutput,
    },
    /// Customers linked by shared purchases.
    Similarity {
        #[arg(long, default_value_t = DEFAULT_MIN_COMMON_PRODUCTS)]
        min_common: usize,
        #[command(flatten)]
        output: ReportOutput,
    },
    /// Revenue per product.
    Sales {
        #[command(flatten)]
        output: ReportOutput,
    },
    /// Customers per city.
    Geography {
        #[command(flatten)]
        output: ReportOutput,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct ReportOutput {
    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct TransferArgs {
    /// customers, products, orders or order_items.
    pub table: Table,
    pub file: PathBuf,
    /// Inferred from the file extension when omitted.
    #[arg(long, value_enum)]
    pub format: Option<FileFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    Csv,
    Json,
}

impl From<FileFormat> for TransferFormat {
    fn from(value: FileFormat) -> Self {
        match value {
            FileFormat::Csv => TransferFormat::Csv,
            FileFormat::Json => TransferFormat::Json,
        }
    }
}

/// `PRODUCT_ID:QUANTITY`.
///
/// The quantity is kept signed so the order itself decides what is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItemArg {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl FromStr for LineItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product, quantity) = s
            .split_once(':')
            .ok_or_else(|| format!("expected PRODUCT_ID:QTY, got {s:?}"))?;
        let product_id = product.parse::<ProductId>().map_err(|e| e.to_string())?;
        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid quantity {quantity:?}: {e}"))?;
        Ok(Self {
            product_id,
            quantity,
        })
    }
}
