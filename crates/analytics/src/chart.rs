//! Report values.
//!
//! Charts carry everything a renderer needs (title, axis labels, series) and
//! nothing about how they are drawn.

use chrono::NaiveDate;
use serde::Serialize;

use shopledger_core::CustomerId;

/// Outcome of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "chart", rename_all = "snake_case")]
pub enum Report<T> {
    Ready(T),
    /// There were no rows to aggregate.
    NoData,
    /// Rows exist but the report has nothing to show (e.g. no graph edges).
    InsufficientData,
}

impl<T> Report<T> {
    pub fn chart(&self) -> Option<&T> {
        match self {
            Report::Ready(chart) => Some(chart),
            Report::NoData | Report::InsufficientData => None,
        }
    }

    pub fn into_chart(self) -> Option<T> {
        match self {
            Report::Ready(chart) => Some(chart),
            Report::NoData | Report::InsufficientData => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Report::Ready(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimePoint {
    /// Start date of the bucket.
    pub bucket: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<TimePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    /// Percentage of the grand total, 0..=100.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub customer_id: CustomerId,
    pub label: String,
    /// Number of distinct products the customer bought.
    pub size: usize,
}

/// Undirected edge; `source` is the node that appears first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: CustomerId,
    pub target: CustomerId,
    /// Number of products both customers bought.
    pub weight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphChart {
    pub title: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}
