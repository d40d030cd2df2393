use serde::{Deserialize, Serialize};

use shopledger_customers::Customer;
use shopledger_products::Product;
use shopledger_sales::Order;

/// Everything the reports read: the three full entity sets.
///
/// Orders carry their resolved line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopDataset {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
}

impl ShopDataset {
    pub fn new(customers: Vec<Customer>, products: Vec<Product>, orders: Vec<Order>) -> Self {
        Self {
            customers,
            products,
            orders,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty() && self.products.is_empty() && self.orders.is_empty()
    }
}
