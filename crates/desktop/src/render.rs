//! Terminal rendering of listings and reports.

use std::collections::HashMap;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use shopledger_analytics::{BarChart, GraphChart, PieChart, Report, TimeSeriesChart};
use shopledger_core::{CustomerId, Entity, ValueObject};
use shopledger_customers::Customer;
use shopledger_products::Product;
use shopledger_sales::Order;

use crate::cli::ReportFormat;

pub const NO_DATA: &str = "No data to display";
pub const NO_GRAPH: &str = "Not enough data to build the similarity graph";
pub const UNKNOWN_CUSTOMER: &str = "Unknown customer";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn align_right(table: &mut Table, columns: &[usize]) {
    for index in columns {
        if let Some(column) = table.column_mut(*index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn id_cell<I: std::fmt::Display>(id: Option<I>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

pub fn customers(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No customers".to_string();
    }
    let mut out = table(&["ID", "First name", "Last name", "Email", "Phone", "Address"]);
    for customer in customers {
        out.add_row(vec![
            id_cell(customer.id()),
            customer.first_name().to_string(),
            customer.last_name().to_string(),
            customer.email().as_str().to_string(),
            customer.phone().as_str().to_string(),
            customer.address().as_str().to_string(),
        ]);
    }
    out.to_string()
}

pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products".to_string();
    }
    let mut out = table(&["ID", "Name", "Price", "Category"]);
    for product in products {
        out.add_row(vec![
            id_cell(product.id()),
            product.name().to_string(),
            format!("{:.2}", product.price()),
            product.category().to_string(),
        ]);
    }
    align_right(&mut out, &[2]);
    out.to_string()
}

/// Order listing; customers are resolved through `names`.
pub fn orders(orders: &[Order], names: &HashMap<CustomerId, String>) -> String {
    if orders.is_empty() {
        return "No orders".to_string();
    }
    let mut out = table(&["ID", "Customer", "Date", "Status", "Total"]);
    for order in orders {
        out.add_row(vec![
            id_cell(order.id()),
            customer_name(names, order.customer_id()),
            order.order_date().format(DATE_FORMAT).to_string(),
            order.status().to_string(),
            format!("{:.2}", order.total_cost()),
        ]);
    }
    align_right(&mut out, &[4]);
    out.to_string()
}

pub fn order_detail(order: &Order, names: &HashMap<CustomerId, String>) -> String {
    let mut lines = table(&["Product", "Quantity", "Price", "Line total"]);
    for line in order.items() {
        lines.add_row(vec![
            line.product.name().to_string(),
            line.quantity.to_string(),
            format!("{:.2}", line.product.price()),
            format!("{:.2}", line.line_total()),
        ]);
    }
    align_right(&mut lines, &[1, 2, 3]);

    format!(
        "{order}\nCustomer: {}\n{lines}\nTotal: {:.2}",
        customer_name(names, order.customer_id()),
        order.total_cost()
    )
}

fn customer_name(names: &HashMap<CustomerId, String>, id: CustomerId) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string())
}

/// Render a report as a table (via `chart`) or as JSON.
pub fn report<T: Serialize>(
    report: &Report<T>,
    format: ReportFormat,
    chart: impl FnOnce(&T) -> String,
) -> serde_json::Result<String> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(report),
        ReportFormat::Table => Ok(match report {
            Report::Ready(value) => chart(value),
            Report::NoData => NO_DATA.to_string(),
            Report::InsufficientData => NO_GRAPH.to_string(),
        }),
    }
}

pub fn bar_chart(chart: &BarChart) -> String {
    let mut out = table(&[chart.x_label.as_str(), chart.y_label.as_str()]);
    for bar in &chart.bars {
        out.add_row(vec![bar.label.clone(), bar.value.to_string()]);
    }
    align_right(&mut out, &[1]);
    format!("{}\n{out}", chart.title)
}

pub fn time_series(chart: &TimeSeriesChart) -> String {
    let mut out = table(&[chart.x_label.as_str(), chart.y_label.as_str()]);
    for point in &chart.points {
        out.add_row(vec![
            point.bucket.format("%Y-%m-%d").to_string(),
            point.count.to_string(),
        ]);
    }
    align_right(&mut out, &[1]);
    format!("{}\n{out}", chart.title)
}

pub fn pie_chart(chart: &PieChart) -> String {
    let mut out = table(&["Product", "Sales", "Share"]);
    for slice in &chart.slices {
        out.add_row(vec![
            slice.label.clone(),
            format!("{:.2}", slice.value),
            format!("{:.1}%", slice.share),
        ]);
    }
    align_right(&mut out, &[1, 2]);
    format!("{}\n{out}", chart.title)
}

pub fn graph(chart: &GraphChart) -> String {
    let labels: HashMap<CustomerId, &str> = chart
        .nodes
        .iter()
        .map(|node| (node.customer_id, node.label.as_str()))
        .collect();
    let label = |id: &CustomerId| labels.get(id).copied().unwrap_or(UNKNOWN_CUSTOMER).to_string();

    let mut nodes = table(&["Customer", "Products bought"]);
    for node in &chart.nodes {
        nodes.add_row(vec![node.label.clone(), node.size.to_string()]);
    }
    align_right(&mut nodes, &[1]);

    let mut edges = table(&["Customer", "Customer", "Shared products"]);
    for edge in &chart.edges {
        edges.add_row(vec![label(&edge.source), label(&edge.target), edge.weight.to_string()]);
    }
    align_right(&mut edges, &[2]);

    format!("{}\n{nodes}\n{edges}", chart.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shopledger_analytics::{Bar, GraphEdge, GraphNode, PieSlice};
    use shopledger_core::{OrderId, ProductId};
    use shopledger_sales::OrderStatus;

    fn sample_order() -> Order {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(10, 30, 45)
            .unwrap();
        let mut order = Order::with_id(OrderId::new(3), CustomerId::new(9), date, OrderStatus::default());
        let mouse = Product::with_id(ProductId::new(2), "Mouse", 1000.0, "Electronics").unwrap();
        order.add_product(mouse, 2).unwrap();
        order
    }

    #[test]
    fn order_list_shows_unknown_customer_and_rounded_total() {
        let text = orders(&[sample_order()], &HashMap::new());
        assert!(text.contains(UNKNOWN_CUSTOMER));
        assert!(text.contains("2023-01-01 10:30"));
        assert!(!text.contains("10:30:45"));
        assert!(text.contains("2000.00"));
    }

    #[test]
    fn order_detail_lists_lines_and_total() {
        let names = HashMap::from([(CustomerId::new(9), "Ivan Ivanov".to_string())]);
        let text = order_detail(&sample_order(), &names);
        assert!(text.starts_with("Order 3 from 2023-01-01 10:30"));
        assert!(text.contains("Customer: Ivan Ivanov"));
        assert!(text.contains("Mouse"));
        assert!(text.ends_with("Total: 2000.00"));
    }

    #[test]
    fn empty_listings_say_so() {
        assert_eq!(customers(&[]), "No customers");
        assert_eq!(products(&[]), "No products");
        assert_eq!(orders(&[], &HashMap::new()), "No orders");
    }

    #[test]
    fn empty_reports_render_messages() {
        let none: Report<BarChart> = Report::NoData;
        assert_eq!(report(&none, ReportFormat::Table, bar_chart).unwrap(), NO_DATA);

        let sparse: Report<GraphChart> = Report::InsufficientData;
        assert_eq!(report(&sparse, ReportFormat::Table, graph).unwrap(), NO_GRAPH);

        let json = report(&sparse, ReportFormat::Json, graph).unwrap();
        assert!(json.contains("insufficient_data"));
    }

    #[test]
    fn charts_render_titles_and_values() {
        let bars = Report::Ready(BarChart {
            title: "Customer geography".to_string(),
            x_label: "City".to_string(),
            y_label: "Customers".to_string(),
            bars: vec![Bar { label: "Москва".to_string(), value: 2 }],
        });
        let text = report(&bars, ReportFormat::Table, bar_chart).unwrap();
        assert!(text.starts_with("Customer geography\n"));
        assert!(text.contains("Москва"));

        let pie = pie_chart(&PieChart {
            title: "Sales by product".to_string(),
            slices: vec![PieSlice { label: "Laptop".to_string(), value: 1500.0, share: 75.0 }],
        });
        assert!(pie.contains("1500.00"));
        assert!(pie.contains("75.0%"));

        let graph_text = graph(&GraphChart {
            title: "Customer connections by shared products".to_string(),
            nodes: vec![
                GraphNode { customer_id: CustomerId::new(1), label: "Ivan".to_string(), size: 2 },
                GraphNode { customer_id: CustomerId::new(2), label: "Petr".to_string(), size: 1 },
            ],
            edges: vec![GraphEdge { source: CustomerId::new(1), target: CustomerId::new(2), weight: 1 }],
        });
        assert!(graph_text.contains("Ivan"));
        assert!(graph_text.contains("Petr"));
        assert!(graph_text.contains("Shared products"));
    }
}
