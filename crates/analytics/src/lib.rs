//! Reporting over the shop's orders.
//!
//! The dataset is flattened once into an [`OrderTable`] (one row per order
//! line) and every report is a read-only aggregation over that table. Reports
//! are plain data ([`Report`] of a chart value); drawing them is left to the
//! caller.

pub mod analyzer;
pub mod chart;
pub mod dataset;
pub mod period;
pub mod table;

pub use analyzer::{
    Analyzer, DEFAULT_MIN_COMMON_PRODUCTS, DEFAULT_TOP_CUSTOMERS, GEOGRAPHY_LIMIT,
    OTHER_SLICE_LABEL, SALES_SLICE_LIMIT,
};
pub use chart::{
    Bar, BarChart, GraphChart, GraphEdge, GraphNode, PieChart, PieSlice, Report, TimePoint,
    TimeSeriesChart,
};
pub use dataset::ShopDataset;
pub use period::{Period, PeriodParseError};
pub use table::{OrderRow, OrderTable, UNKNOWN_CUSTOMER, UNKNOWN_PRODUCT};
