//! Aggregations over the flattened order table.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use shopledger_core::{CustomerId, ProductId};
use shopledger_customers::Customer;

use crate::chart::{
    Bar, BarChart, GraphChart, GraphEdge, GraphNode, PieChart, PieSlice, Report, TimePoint,
    TimeSeriesChart,
};
use crate::dataset::ShopDataset;
use crate::period::Period;
use crate::table::OrderTable;

pub const DEFAULT_TOP_CUSTOMERS: usize = 5;
pub const DEFAULT_MIN_COMMON_PRODUCTS: usize = 2;
/// Slices shown individually in the sales breakdown before the rest is folded.
pub const SALES_SLICE_LIMIT: usize = 10;
pub const OTHER_SLICE_LABEL: &str = "Other";
/// Cities shown in the geography report. The tail is dropped, not folded.
pub const GEOGRAPHY_LIMIT: usize = 15;

/// Builds reports from one snapshot of the shop.
///
/// The order table is flattened once on construction; every report is a pure
/// function of that table (and, for geography, of the customer list).
#[derive(Debug, Clone)]
pub struct Analyzer {
    table: OrderTable,
    customers: Vec<Customer>,
}

impl Analyzer {
    pub fn new(dataset: ShopDataset) -> Self {
        let table = OrderTable::build(&dataset);
        Self {
            table,
            customers: dataset.customers,
        }
    }

    pub fn table(&self) -> &OrderTable {
        &self.table
    }

    /// Customers ranked by number of distinct orders, top `n`.
    ///
    /// Customers are grouped by display name. Ties keep first-appearance
    /// order. `n == 0` leaves nothing to chart and yields [`Report::NoData`].
    pub fn top_customers(&self, n: usize) -> Report<BarChart> {
        if self.table.is_empty() {
            return Report::NoData;
        }

        let mut groups: Vec<(&str, HashSet<usize>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for row in self.table.rows() {
            let slot = *index.entry(row.customer_name.as_str()).or_insert_with(|| {
                groups.push((row.customer_name.as_str(), HashSet::new()));
                groups.len() - 1
            });
            groups[slot].1.insert(row.order_index);
        }

        let mut ranked: Vec<(&str, u64)> = groups
            .into_iter()
            .map(|(name, orders)| (name, orders.len() as u64))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        if ranked.is_empty() {
            return Report::NoData;
        }

        tracing::debug!(customers = ranked.len(), n, "computed top customers");
        Report::Ready(BarChart {
            title: format!("Top {n} customers by order count"),
            x_label: "Customer".to_string(),
            y_label: "Orders".to_string(),
            bars: ranked
                .into_iter()
                .map(|(label, value)| Bar {
                    label: label.to_string(),
                    value,
                })
                .collect(),
        })
    }

    /// Orders per time bucket.
    ///
    /// Every bucket between the first and the last observed one is present,
    /// empty buckets count 0.
    pub fn order_trend(&self, period: Period) -> Report<TimeSeriesChart> {
        if self.table.is_empty() {
            return Report::NoData;
        }

        let mut seen = HashSet::new();
        let mut counts: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
        for row in self.table.rows() {
            if !seen.insert(row.order_index) {
                continue;
            }
            let bucket = period.bucket_start(row.order_date.date());
            *counts.entry(bucket).or_default() += 1;
        }

        let mut points = Vec::new();
        if let (Some((&first, _)), Some((&last, _))) =
            (counts.first_key_value(), counts.last_key_value())
        {
            let mut bucket = Some(first);
            while let Some(start) = bucket.filter(|start| *start <= last) {
                points.push(TimePoint {
                    bucket: start,
                    count: counts.get(&start).copied().unwrap_or(0),
                });
                bucket = period.next_bucket(start);
            }
        }

        tracing::debug!(%period, buckets = points.len(), "computed order trend");
        Report::Ready(TimeSeriesChart {
            title: format!("Order volume by {}", period.plural()),
            x_label: "Date".to_string(),
            y_label: "Orders".to_string(),
            points,
        })
    }

    /// Customers linked by the products they both bought.
    ///
    /// An edge joins two customers sharing at least `min_common` distinct
    /// products. Shared products are counted through a product → customers
    /// index, so only actual co-purchases are visited; a threshold of 0 still
    /// links every pair.
    pub fn similarity_graph(&self, min_common: usize) -> Report<GraphChart> {
        if self.table.is_empty() {
            return Report::NoData;
        }

        // Customers in first-appearance order with their distinct products.
        let mut customers: Vec<(CustomerId, &str, BTreeSet<ProductId>)> = Vec::new();
        let mut position: HashMap<CustomerId, usize> = HashMap::new();
        for row in self.table.rows() {
            let slot = *position.entry(row.customer_id).or_insert_with(|| {
                customers.push((row.customer_id, row.customer_name.as_str(), BTreeSet::new()));
                customers.len() - 1
            });
            if let Some(product_id) = row.product_id {
                customers[slot].2.insert(product_id);
            }
        }

        let mut buyers: HashMap<ProductId, Vec<usize>> = HashMap::new();
        for (slot, (_, _, products)) in customers.iter().enumerate() {
            for product_id in products {
                buyers.entry(*product_id).or_default().push(slot);
            }
        }

        let mut shared: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for slots in buyers.values() {
            for (i, &a) in slots.iter().enumerate() {
                for &b in &slots[i + 1..] {
                    *shared.entry((a, b)).or_default() += 1;
                }
            }
        }

        let edge = |a: usize, b: usize, weight: usize| GraphEdge {
            source: customers[a].0,
            target: customers[b].0,
            weight,
        };
        let edges: Vec<GraphEdge> = if min_common == 0 {
            (0..customers.len())
                .flat_map(|a| (a + 1..customers.len()).map(move |b| (a, b)))
                .map(|(a, b)| edge(a, b, shared.get(&(a, b)).copied().unwrap_or(0)))
                .collect()
        } else {
            shared
                .iter()
                .filter(|(_, weight)| **weight >= min_common)
                .map(|(&(a, b), &weight)| edge(a, b, weight))
                .collect()
        };

        tracing::debug!(
            nodes = customers.len(),
            edges = edges.len(),
            min_common,
            "computed similarity graph"
        );
        if edges.is_empty() {
            return Report::InsufficientData;
        }

        Report::Ready(GraphChart {
            title: "Customer connections by shared products".to_string(),
            nodes: customers
                .iter()
                .map(|(customer_id, label, products)| GraphNode {
                    customer_id: *customer_id,
                    label: label.to_string(),
                    size: products.len(),
                })
                .collect(),
            edges,
        })
    }

    /// Revenue share per product.
    ///
    /// Past [`SALES_SLICE_LIMIT`] products the tail is folded into a single
    /// [`OTHER_SLICE_LABEL`] slice. A product already named like that slice
    /// absorbs the tail, so the label never appears twice.
    pub fn sales_breakdown(&self) -> Report<PieChart> {
        if self.table.is_empty() {
            return Report::NoData;
        }

        let mut totals: Vec<(&str, f64)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for row in self.table.rows() {
            let slot = *index.entry(row.product_name.as_str()).or_insert_with(|| {
                totals.push((row.product_name.as_str(), 0.0));
                totals.len() - 1
            });
            totals[slot].1 += row.total;
        }
        totals.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut values: Vec<(String, f64)> = totals
            .iter()
            .take(SALES_SLICE_LIMIT)
            .map(|(label, value)| (label.to_string(), *value))
            .collect();
        if totals.len() > SALES_SLICE_LIMIT {
            let other: f64 = totals[SALES_SLICE_LIMIT..].iter().map(|(_, v)| v).sum();
            match values.iter_mut().find(|(label, _)| label.as_str() == OTHER_SLICE_LABEL) {
                Some((_, value)) => *value += other,
                None => values.push((OTHER_SLICE_LABEL.to_string(), other)),
            }
        }

        let grand_total: f64 = values.iter().map(|(_, v)| v).sum();
        let slices = values
            .into_iter()
            .map(|(label, value)| PieSlice {
                share: if grand_total == 0.0 {
                    0.0
                } else {
                    value / grand_total * 100.0
                },
                label,
                value,
            })
            .collect::<Vec<_>>();

        tracing::debug!(slices = slices.len(), "computed sales breakdown");
        Report::Ready(PieChart {
            title: "Sales by product".to_string(),
            slices,
        })
    }

    /// Customers per city, largest first, at most [`GEOGRAPHY_LIMIT`] cities.
    pub fn customer_geography(&self) -> Report<BarChart> {
        if self.customers.is_empty() {
            return Report::NoData;
        }

        let mut cities: Vec<(&str, u64)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for customer in &self.customers {
            let city = customer.address().city();
            let slot = *index.entry(city).or_insert_with(|| {
                cities.push((city, 0));
                cities.len() - 1
            });
            cities[slot].1 += 1;
        }
        cities.sort_by(|a, b| b.1.cmp(&a.1));
        cities.truncate(GEOGRAPHY_LIMIT);

        tracing::debug!(
            customers = self.customers.len(),
            cities = cities.len(),
            "computed customer geography"
        );
        Report::Ready(BarChart {
            title: "Customer geography".to_string(),
            x_label: "City".to_string(),
            y_label: "Customers".to_string(),
            bars: cities
                .into_iter()
                .map(|(label, value)| Bar {
                    label: label.to_string(),
                    value,
                })
                .collect(),
        })
    }
}
