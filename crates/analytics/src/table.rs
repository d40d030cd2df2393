//! Flattened order lines.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use shopledger_core::{CustomerId, Entity, OrderId, ProductId};

use crate::dataset::ShopDataset;

/// Customer name used when an order points at a customer that is not in the
/// dataset.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

/// Product name used when a line's product is not in the dataset.
pub const UNKNOWN_PRODUCT: &str = "Unknown product";

/// One order line joined with its order header and the resolved display names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    /// Position of the source order in the dataset. Orders that were never
    /// persisted have no id, so distinct-order counting keys on this.
    pub order_index: usize,
    pub order_id: Option<OrderId>,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub order_date: NaiveDateTime,
    pub status: String,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
    pub total: f64,
}

/// Immutable row set built once from a [`ShopDataset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderTable {
    rows: Vec<OrderRow>,
}

impl OrderTable {
    /// Flatten orders into rows: orders outer, lines inner, both in input
    /// order.
    pub fn build(dataset: &ShopDataset) -> Self {
        let customer_names: HashMap<CustomerId, String> = dataset
            .customers
            .iter()
            .filter_map(|c| c.id().map(|id| (id, c.display_name())))
            .collect();
        let product_names: HashMap<ProductId, &str> = dataset
            .products
            .iter()
            .filter_map(|p| p.id().map(|id| (id, p.name())))
            .collect();

        let line_count = dataset.orders.iter().map(|o| o.items().len()).sum();
        let mut rows = Vec::with_capacity(line_count);

        for (order_index, order) in dataset.orders.iter().enumerate() {
            let customer_name = customer_names
                .get(&order.customer_id())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());

            for line in order.items() {
                let product_id = line.product.id();
                let product_name = product_id
                    .and_then(|id| product_names.get(&id).copied())
                    .unwrap_or(UNKNOWN_PRODUCT);

                rows.push(OrderRow {
                    order_index,
                    order_id: order.id(),
                    customer_id: order.customer_id(),
                    customer_name: customer_name.clone(),
                    order_date: order.order_date(),
                    status: order.status().to_string(),
                    product_id,
                    product_name: product_name.to_string(),
                    quantity: line.quantity,
                    price: line.product.price(),
                    total: line.line_total(),
                });
            }
        }

        tracing::debug!(
            orders = dataset.orders.len(),
            rows = rows.len(),
            "flattened order table"
        );
        Self { rows }
    }

    pub fn rows(&self) -> &[OrderRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shopledger_customers::Customer;
    use shopledger_products::Product;
    use shopledger_sales::{Order, OrderStatus};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn dataset() -> ShopDataset {
        let customers = vec![
            Customer::with_id(CustomerId::new(1), "Ivan", "Ivanov", "ivan@example.com", "+79123456789", "Moscow")
                .unwrap(),
        ];
        let laptop = Product::with_id(ProductId::new(1), "Laptop", 50000.0, "Electronics").unwrap();
        let mouse = Product::with_id(ProductId::new(2), "Mouse", 1000.0, "Electronics").unwrap();
        let ghost = Product::with_id(ProductId::new(9), "Ghost", 10.0, "Misc").unwrap();

        let mut first = Order::with_id(OrderId::new(1), CustomerId::new(1), day(1), OrderStatus::default());
        first.add_product(laptop.clone(), 1).unwrap();
        first.add_product(mouse.clone(), 2).unwrap();

        let mut second = Order::with_id(OrderId::new(2), CustomerId::new(42), day(2), OrderStatus::default());
        second.add_product(ghost, 3).unwrap();

        ShopDataset::new(customers, vec![laptop, mouse], vec![first, second])
    }

    #[test]
    fn one_row_per_line_in_input_order() {
        let table = OrderTable::build(&dataset());
        assert_eq!(table.len(), 3);

        let names: Vec<&str> = table.rows().iter().map(|r| r.product_name.as_str()).collect();
        assert_eq!(names, vec!["Laptop", "Mouse", UNKNOWN_PRODUCT]);

        let mouse = &table.rows()[1];
        assert_eq!(mouse.order_id, Some(OrderId::new(1)));
        assert_eq!(mouse.customer_name, "Ivan Ivanov");
        assert_eq!(mouse.quantity, 2);
        assert_eq!(mouse.price, 1000.0);
        assert_eq!(mouse.total, 2000.0);
        assert_eq!(mouse.status, OrderStatus::NEW);
    }

    #[test]
    fn missing_customer_resolves_to_unknown() {
        let table = OrderTable::build(&dataset());
        let orphan = &table.rows()[2];
        assert_eq!(orphan.customer_id, CustomerId::new(42));
        assert_eq!(orphan.customer_name, UNKNOWN_CUSTOMER);
        assert_eq!(orphan.total, 30.0);
    }

    #[test]
    fn orders_without_lines_produce_no_rows() {
        let mut data = dataset();
        data.orders = vec![Order::with_id(OrderId::new(3), CustomerId::new(1), day(3), OrderStatus::default())];
        assert!(OrderTable::build(&data).is_empty());
        assert!(OrderTable::build(&ShopDataset::default()).is_empty());
    }
}
