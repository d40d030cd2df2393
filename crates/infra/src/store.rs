//! Entity persistence on top of [`Database`].

use std::collections::HashMap;
use std::path::Path;

use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::instrument;

use shopledger_analytics::ShopDataset;
use shopledger_core::{CustomerId, DomainError, Entity, OrderId, ProductId, ValueObject};
use shopledger_customers::Customer;
use shopledger_products::Product;
use shopledger_sales::{Order, OrderStatus, format_order_date, parse_order_date};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Shop store: customers, products and orders.
///
/// Reads are full-table scans in id order. Each write commits on its own;
/// `add_order` writes the order and its lines in one transaction.
#[derive(Debug, Clone)]
pub struct ShopStore {
    db: Database,
}

impl ShopStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connect to `path` and make sure the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::connect(path).await?;
        db.bootstrap_schema().await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert a new customer and give it its id.
    #[instrument(skip_all, fields(email = %customer.email()), err)]
    pub async fn add_customer(&self, customer: &mut Customer) -> StoreResult<CustomerId> {
        ensure_new("customer", customer.id())?;

        let result = sqlx::query(
            r#"
            INSERT INTO customers (first_name, last_name, email, phone, address)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(customer.first_name())
        .bind(customer.last_name())
        .bind(customer.email().as_str())
        .bind(customer.phone().as_str())
        .bind(customer.address().as_str())
        .execute(self.db.pool())
        .await?;

        let id = CustomerId::new(result.last_insert_rowid());
        customer.assign_id(id)?;
        tracing::info!(customer_id = %id, "added customer");
        Ok(id)
    }

    #[instrument(skip(self), err)]
    pub async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(
            "SELECT id, first_name, last_name, email, phone, address FROM customers ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await?;

        let customers = rows.iter().map(customer_from_row).collect::<StoreResult<Vec<_>>>()?;
        tracing::debug!(count = customers.len(), "loaded customers");
        Ok(customers)
    }

    /// Customers whose name, e-mail, phone or address contains `query`,
    /// ignoring case. An empty query returns everyone.
    #[instrument(skip(self), err)]
    pub async fn search_customers(&self, query: &str) -> StoreResult<Vec<Customer>> {
        // SQLite's LIKE only folds ASCII, so matching happens in memory.
        let mut customers = self.list_customers().await?;
        customers.retain(|c| c.matches(query));
        Ok(customers)
    }

    #[instrument(skip_all, fields(name = %product.name()), err)]
    pub async fn add_product(&self, product: &mut Product) -> StoreResult<ProductId> {
        ensure_new("product", product.id())?;

        let result = sqlx::query("INSERT INTO products (name, price, category) VALUES (?, ?, ?)")
            .bind(product.name())
            .bind(product.price())
            .bind(product.category())
            .execute(self.db.pool())
            .await?;

        let id = ProductId::new(result.last_insert_rowid());
        product.assign_id(id)?;
        tracing::info!(product_id = %id, "added product");
        Ok(id)
    }

    #[instrument(skip(self), err)]
    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, price, category FROM products ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;

        let products = rows.iter().map(product_from_row).collect::<StoreResult<Vec<_>>>()?;
        tracing::debug!(count = products.len(), "loaded products");
        Ok(products)
    }

    #[instrument(skip(self), err)]
    pub async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let row = sqlx::query("SELECT id, name, price, category FROM products WHERE id = ?")
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: id.get(),
            })?;
        product_from_row(&row)
    }

    /// Insert an order with its lines and give it its id.
    ///
    /// Every line must reference a stored product. The customer reference is
    /// written as is.
    #[instrument(skip_all, fields(customer_id = %order.customer_id(), lines = order.items().len()), err)]
    pub async fn add_order(&self, order: &mut Order) -> StoreResult<OrderId> {
        ensure_new("order", order.id())?;
        let product_ids = order
            .items()
            .iter()
            .map(|line| {
                line.product.id().ok_or_else(|| {
                    DomainError::validation(
                        "product",
                        format!("{:?} must be saved before it is ordered", line.product.name()),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query("INSERT INTO orders (customer_id, order_date, status) VALUES (?, ?, ?)")
            .bind(order.customer_id().get())
            .bind(format_order_date(&order.order_date()))
            .bind(order.status().as_str())
            .execute(&mut *tx)
            .await?;
        let order_id = result.last_insert_rowid();

        for (line, product_id) in order.items().iter().zip(&product_ids) {
            sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES (?, ?, ?)")
                .bind(order_id)
                .bind(product_id.get())
                .bind(i64::from(line.quantity))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let id = OrderId::new(order_id);
        order.assign_id(id)?;
        tracing::info!(order_id = %id, "added order");
        Ok(id)
    }

    /// All orders with their lines, each line joined to its product.
    ///
    /// Lines whose product row is gone are skipped.
    #[instrument(skip(self), err)]
    pub async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let headers = sqlx::query("SELECT id, customer_id, order_date, status FROM orders ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;

        let lines = sqlx::query(
            r#"
            SELECT oi.order_id, oi.quantity, p.id, p.name, p.price, p.category
            FROM order_items oi
            JOIN products p ON oi.product_id = p.id
            ORDER BY oi.order_id, oi.rowid
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut lines_by_order: HashMap<i64, Vec<&SqliteRow>> = HashMap::new();
        for line in &lines {
            lines_by_order
                .entry(line.try_get("order_id")?)
                .or_default()
                .push(line);
        }

        let mut orders = Vec::with_capacity(headers.len());
        for header in &headers {
            let mut order = order_from_row(header)?;
            let id = header.try_get::<i64, _>("id")?;
            for line in lines_by_order.remove(&id).unwrap_or_default() {
                attach_line(&mut order, id, line)?;
            }
            orders.push(order);
        }

        tracing::debug!(count = orders.len(), "loaded orders");
        Ok(orders)
    }

    #[instrument(skip(self), err)]
    pub async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        let header = sqlx::query("SELECT id, customer_id, order_date, status FROM orders WHERE id = ?")
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: id.get(),
            })?;
        let mut order = order_from_row(&header)?;

        let lines = sqlx::query(
            r#"
            SELECT oi.quantity, p.id, p.name, p.price, p.category
            FROM order_items oi
            JOIN products p ON oi.product_id = p.id
            WHERE oi.order_id = ?
            ORDER BY oi.rowid
            "#,
        )
        .bind(id.get())
        .fetch_all(self.db.pool())
        .await?;
        for line in &lines {
            attach_line(&mut order, id.get(), line)?;
        }

        Ok(order)
    }

    /// Everything the reports need, in one pass over the three entity sets.
    pub async fn load_dataset(&self) -> StoreResult<ShopDataset> {
        Ok(ShopDataset::new(
            self.list_customers().await?,
            self.list_products().await?,
            self.list_orders().await?,
        ))
    }
}

fn ensure_new<I: std::fmt::Display>(entity: &str, id: Option<I>) -> Result<(), DomainError> {
    match id {
        Some(id) => Err(DomainError::conflict(format!("{entity} {id} is already stored"))),
        None => Ok(()),
    }
}

fn customer_from_row(row: &SqliteRow) -> StoreResult<Customer> {
    let id: i64 = row.try_get("id")?;
    Customer::with_id(
        CustomerId::new(id),
        row.try_get::<String, _>("first_name")?,
        row.try_get::<String, _>("last_name")?,
        row.try_get::<String, _>("email")?,
        row.try_get::<String, _>("phone")?,
        row.try_get::<String, _>("address")?,
    )
    .map_err(|e| StoreError::corrupt("customers", id, e))
}

fn product_from_row(row: &SqliteRow) -> StoreResult<Product> {
    let id: i64 = row.try_get("id")?;
    Product::with_id(
        ProductId::new(id),
        row.try_get::<String, _>("name")?,
        row.try_get::<f64, _>("price")?,
        row.try_get::<String, _>("category")?,
    )
    .map_err(|e| StoreError::corrupt("products", id, e))
}

fn order_from_row(row: &SqliteRow) -> StoreResult<Order> {
    let id: i64 = row.try_get("id")?;
    let raw_date: String = row.try_get("order_date")?;
    let order_date = parse_order_date(&raw_date).map_err(|e| StoreError::corrupt("orders", id, e))?;
    Ok(Order::with_id(
        OrderId::new(id),
        CustomerId::new(row.try_get("customer_id")?),
        order_date,
        OrderStatus::new(row.try_get::<String, _>("status")?),
    ))
}

fn attach_line(order: &mut Order, order_id: i64, row: &SqliteRow) -> StoreResult<()> {
    let product = product_from_row(row)?;
    let quantity: i64 = row.try_get("quantity")?;
    order
        .add_product(product, quantity)
        .map_err(|e| StoreError::corrupt("order_items", order_id, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn open_store(dir: &tempfile::TempDir) -> ShopStore {
        ShopStore::open(dir.path().join("shop.db")).await.unwrap()
    }

    fn ivan() -> Customer {
        Customer::new("Иван", "Иванов", "ivan@example.com", "+79123456789", "Москва, Тверская 1").unwrap()
    }

    fn petr() -> Customer {
        Customer::new("Петр", "Петров", "petr@example.com", "+79123456780", "Санкт-Петербург").unwrap()
    }

    #[tokio::test]
    async fn customers_round_trip_with_assigned_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut first = ivan();
        let mut second = petr();
        let first_id = store.add_customer(&mut first).await.unwrap();
        let second_id = store.add_customer(&mut second).await.unwrap();

        assert_eq!(first.id(), Some(first_id));
        assert!(second_id.get() > first_id.get());
        assert_eq!(store.list_customers().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        store.add_customer(&mut ivan()).await.unwrap();
        let mut twin = ivan();
        match store.add_customer(&mut twin).await {
            Err(StoreError::Database(_)) => {}
            other => panic!("Expected database error, got {other:?}"),
        }
        assert_eq!(twin.id(), None);
        assert_eq!(store.list_customers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stored_entities_cannot_be_added_twice() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut customer = ivan();
        store.add_customer(&mut customer).await.unwrap();
        match store.add_customer(&mut customer).await {
            Err(StoreError::Domain(DomainError::Conflict(_))) => {}
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        store.add_customer(&mut ivan()).await.unwrap();
        store.add_customer(&mut petr()).await.unwrap();

        let found = store.search_customers("ИВАН").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name(), "Иван");

        assert_eq!(store.search_customers("example.com").await.unwrap().len(), 2);
        assert_eq!(store.search_customers("").await.unwrap().len(), 2);
        assert!(store.search_customers("сидор").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_are_read_back_with_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut customer = ivan();
        let customer_id = store.add_customer(&mut customer).await.unwrap();
        let mut laptop = Product::new("Ноутбук", 50000.0, "Электроника").unwrap();
        let mut mouse = Product::new("Мышь", 1000.0, "Электроника").unwrap();
        store.add_product(&mut laptop).await.unwrap();
        store.add_product(&mut mouse).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_micro_opt(10, 30, 0, 250_000)
            .unwrap();
        let mut order = Order::placed_at(customer_id, date, OrderStatus::new(OrderStatus::COMPLETED));
        order.add_product(mouse.clone(), 2).unwrap();
        order.add_product(laptop.clone(), 1).unwrap();
        let order_id = store.add_order(&mut order).await.unwrap();

        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders, vec![order.clone()]);
        assert_eq!(orders[0].order_date(), date);
        assert_eq!(orders[0].total_cost(), 52000.0);

        assert_eq!(store.get_order(order_id).await.unwrap(), order);
        match store.get_order(OrderId::new(99)).await {
            Err(StoreError::NotFound { entity: "order", id: 99 }) => {}
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn order_with_unsaved_product_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut order = Order::new(CustomerId::new(1));
        order.add_product(Product::new("Draft", 1.0, "Misc").unwrap(), 1).unwrap();
        match store.add_order(&mut order).await {
            Err(StoreError::Domain(DomainError::Validation { field: "product", .. })) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
        assert!(store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_product_lines_roll_back_the_whole_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut mouse = Product::new("Мышь", 1000.0, "Электроника").unwrap();
        store.add_product(&mut mouse).await.unwrap();

        let mut order = Order::new(CustomerId::new(1));
        order.add_product(mouse.clone(), 1).unwrap();
        order.add_product(mouse.clone(), 2).unwrap();
        assert!(store.add_order(&mut order).await.is_err());
        assert_eq!(order.id(), None);
        assert!(store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_stored_rows_surface_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        sqlx::query(
            "INSERT INTO customers (first_name, last_name, email, phone, address) VALUES ('A', 'B', 'broken', '+79123456789', 'Moscow')",
        )
        .execute(store.database().pool())
        .await
        .unwrap();

        match store.list_customers().await {
            Err(StoreError::CorruptRow { table: "customers", id: 1, .. }) => {}
            other => panic!("Expected CorruptRow, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dataset_bundles_all_entity_sets() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        assert!(store.load_dataset().await.unwrap().is_empty());

        let mut customer = ivan();
        let customer_id = store.add_customer(&mut customer).await.unwrap();
        let mut laptop = Product::new("Ноутбук", 50000.0, "Электроника").unwrap();
        store.add_product(&mut laptop).await.unwrap();
        let mut order = Order::new(customer_id);
        order.add_product(laptop, 1).unwrap();
        store.add_order(&mut order).await.unwrap();

        let dataset = store.load_dataset().await.unwrap();
        assert_eq!(dataset.customers.len(), 1);
        assert_eq!(dataset.products.len(), 1);
        assert_eq!(dataset.orders, vec![order]);
    }
}
