use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use shopledger_core::{CustomerId, DomainError, DomainResult, Entity, OrderId};
use shopledger_products::Product;

/// Order status.
///
/// Free text: the shop uses a handful of conventional values but any label is
/// stored as entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Status given to freshly created orders.
    pub const NEW: &'static str = "новый";
    pub const COMPLETED: &'static str = "завершен";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::new(Self::NEW)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order line: product snapshot and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: Product,
    pub quantity: u32,
}

impl OrderLine {
    /// Price × quantity.
    pub fn line_total(&self) -> f64 {
        self.product.price() * f64::from(self.quantity)
    }
}

/// A customer order with its line items.
///
/// The customer reference is not checked for existence here; that is the
/// store's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: Option<OrderId>,
    customer_id: CustomerId,
    order_date: NaiveDateTime,
    status: OrderStatus,
    items: Vec<OrderLine>,
}

impl Order {
    /// New order placed now, with the default status.
    pub fn new(customer_id: CustomerId) -> Self {
        Self::placed_at(customer_id, Local::now().naive_local(), OrderStatus::default())
    }

    pub fn placed_at(customer_id: CustomerId, order_date: NaiveDateTime, status: OrderStatus) -> Self {
        Self {
            id: None,
            customer_id,
            order_date,
            status,
            items: Vec::new(),
        }
    }

    /// Rebuild a persisted order header (items are appended afterwards).
    pub fn with_id(
        id: OrderId,
        customer_id: CustomerId,
        order_date: NaiveDateTime,
        status: OrderStatus,
    ) -> Self {
        let mut order = Self::placed_at(customer_id, order_date, status);
        order.id = Some(id);
        order
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn order_date(&self) -> NaiveDateTime {
        self.order_date
    }

    pub fn status(&self) -> &OrderStatus {
        &self.status
    }

    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a line item. Lines keep their insertion order.
    pub fn add_product(&mut self, product: Product, quantity: i64) -> DomainResult<()> {
        if quantity < 1 {
            return Err(DomainError::validation(
                "quantity",
                format!("must be at least 1, got {quantity}"),
            ));
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| DomainError::validation("quantity", format!("{quantity} is too large")))?;

        self.items.push(OrderLine { product, quantity });
        Ok(())
    }

    /// Σ price × quantity over all lines; 0 for an order without lines.
    pub fn total_cost(&self) -> f64 {
        self.items.iter().map(OrderLine::line_total).sum()
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> Option<OrderId> {
        self.id
    }

    fn id_slot(&mut self) -> &mut Option<OrderId> {
        &mut self.id
    }
}

impl core::fmt::Display for Order {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.id {
            Some(id) => write!(f, "Order {id}")?,
            None => f.write_str("Order (new)")?,
        }
        write!(
            f,
            " from {} (Status: {})",
            self.order_date.format("%Y-%m-%d %H:%M"),
            self.status
        )
    }
}
