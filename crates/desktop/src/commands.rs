//! Command execution against the store.

use std::collections::HashMap;
use std::io::Write;

use anyhow::{Context, bail};

use shopledger_analytics::Analyzer;
use shopledger_core::{CustomerId, Entity};
use shopledger_customers::Customer;
use shopledger_infra::transfer::{export_table, import_table};
use shopledger_infra::{ShopStore, TransferFormat};
use shopledger_products::Product;
use shopledger_sales::{Order, OrderStatus, parse_order_date};

use crate::cli::{
    Command, CustomerCommand, OrderCommand, ProductCommand, ReportCommand, TransferArgs,
};
use crate::config::AppConfig;
use crate::render;

/// Open the configured store and execute one command.
pub async fn run(command: Command, config: &AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let store = ShopStore::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;
    let result = execute(command, &store, out).await;
    store.database().close().await;
    result
}

pub async fn execute(command: Command, store: &ShopStore, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Customer(command) => customer(command, store, out).await,
        Command::Product(command) => product(command, store, out).await,
        Command::Order(command) => order(command, store, out).await,
        Command::Report(command) => report(command, store, out).await,
        Command::Export(args) => {
            let format = transfer_format(&args)?;
            let rows = export_table(store.database(), args.table, &args.file, format)
                .await
                .with_context(|| format!("failed to export {} to {}", args.table, args.file.display()))?;
            writeln!(out, "Exported {rows} rows from {} to {}", args.table, args.file.display())?;
            Ok(())
        }
        Command::Import(args) => {
            let format = transfer_format(&args)?;
            let rows = import_table(store.database(), args.table, &args.file, format)
                .await
                .with_context(|| format!("failed to import {} into {}", args.file.display(), args.table))?;
            writeln!(out, "Imported {rows} rows into {}", args.table)?;
            Ok(())
        }
    }
}

fn transfer_format(args: &TransferArgs) -> anyhow::Result<TransferFormat> {
    match args.format {
        Some(format) => Ok(format.into()),
        None => TransferFormat::from_path(&args.file).with_context(|| {
            format!(
                "cannot infer the format of {}; pass --format csv or --format json",
                args.file.display()
            )
        }),
    }
}

/// Acknowledge an action that exists in the interface but is not available yet.
fn not_available(out: &mut impl Write, action: &str) -> anyhow::Result<()> {
    tracing::warn!(action, "requested action is not available");
    writeln!(out, "{action} is not available yet; nothing was changed")?;
    Ok(())
}

async fn customer(command: CustomerCommand, store: &ShopStore, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        CustomerCommand::Add(args) => {
            let mut customer = Customer::new(
                args.first_name,
                args.last_name,
                args.email,
                args.phone,
                args.address,
            )
            .context("invalid customer")?;
            store
                .add_customer(&mut customer)
                .await
                .context("failed to add customer")?;
            writeln!(out, "Added {customer}")?;
        }
        CustomerCommand::List => {
            let customers = store.list_customers().await.context("failed to list customers")?;
            writeln!(out, "{}", render::customers(&customers))?;
        }
        CustomerCommand::Search { query } => {
            let customers = store
                .search_customers(&query)
                .await
                .context("failed to search customers")?;
            writeln!(out, "{}", render::customers(&customers))?;
        }
        CustomerCommand::Delete { id } => {
            not_available(out, &format!("Deleting customer {id}"))?;
        }
    }
    Ok(())
}

async fn product(command: ProductCommand, store: &ShopStore, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        ProductCommand::Add {
            name,
            price,
            category,
        } => {
            let mut product = Product::new(name, price, category).context("invalid product")?;
            store
                .add_product(&mut product)
                .await
                .context("failed to add product")?;
            writeln!(out, "Added {product}")?;
        }
        ProductCommand::List => {
            let products = store.list_products().await.context("failed to list products")?;
            writeln!(out, "{}", render::products(&products))?;
        }
        ProductCommand::Delete { id } => {
            not_available(out, &format!("Deleting product {id}"))?;
        }
    }
    Ok(())
}

async fn customer_names(store: &ShopStore) -> anyhow::Result<HashMap<CustomerId, String>> {
    let customers = store.list_customers().await.context("failed to load customers")?;
    Ok(customers
        .iter()
        .filter_map(|c| c.id().map(|id| (id, c.display_name())))
        .collect())
}

async fn order(command: OrderCommand, store: &ShopStore, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        OrderCommand::Create {
            customer,
            items,
            status,
            date,
        } => {
            let status = status.map(OrderStatus::new).unwrap_or_default();
            let placed_at = match date {
                Some(raw) => parse_order_date(&raw)?,
                None => chrono::Local::now().naive_local(),
            };
            let mut order = Order::placed_at(customer, placed_at, status);
            for item in &items {
                let product = store
                    .get_product(item.product_id)
                    .await
                    .with_context(|| format!("cannot order product {}", item.product_id))?;
                order
                    .add_product(product, item.quantity)
                    .with_context(|| format!("invalid line for product {}", item.product_id))?;
            }
            let id = store.add_order(&mut order).await.context("failed to create order")?;
            writeln!(out, "Created order {id} (total {:.2})", order.total_cost())?;
        }
        OrderCommand::List => {
            let orders = store.list_orders().await.context("failed to list orders")?;
            let names = customer_names(store).await?;
            writeln!(out, "{}", render::orders(&orders, &names))?;
        }
        OrderCommand::Show { id } => {
            let order = store.get_order(id).await.with_context(|| format!("cannot show order {id}"))?;
            let names = customer_names(store).await?;
            writeln!(out, "{}", render::order_detail(&order, &names))?;
        }
        OrderCommand::SetStatus { id, status } => {
            if status.trim().is_empty() {
                bail!("status must not be empty");
            }
            not_available(out, &format!("Changing the status of order {id}"))?;
        }
    }
    Ok(())
}

async fn report(command: ReportCommand, store: &ShopStore, out: &mut impl Write) -> anyhow::Result<()> {
    let dataset = store.load_dataset().await.context("failed to load shop data")?;
    let analyzer = Analyzer::new(dataset);

    let text = match command {
        ReportCommand::TopCustomers { limit, output } => {
            render::report(&analyzer.top_customers(limit), output.format, render::bar_chart)?
        }
        ReportCommand::Trend { period, output } => {
            render::report(&analyzer.order_trend(period), output.format, render::time_series)?
        }
        ReportCommand::Similarity { min_common, output } => {
            render::report(&analyzer.similarity_graph(min_common), output.format, render::graph)?
        }
        ReportCommand::Sales { output } => {
            render::report(&analyzer.sales_breakdown(), output.format, render::pie_chart)?
        }
        ReportCommand::Geography { output } => {
            render::report(&analyzer.customer_geography(), output.format, render::bar_chart)?
        }
    };
    writeln!(out, "{text}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    async fn exec(store: &ShopStore, args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("shopledger").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(cli.command, store, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    async fn seeded(dir: &tempfile::TempDir) -> ShopStore {
        let store = ShopStore::open(dir.path().join("shop.db")).await.unwrap();
        for args in [
            ["customer", "add", "--first-name", "Иван", "--last-name", "Иванов", "--email", "ivan@example.com", "--phone", "+79123456789", "--address", "Москва"],
            ["customer", "add", "--first-name", "Петр", "--last-name", "Петров", "--email", "petr@example.com", "--phone", "+79123456780", "--address", "Санкт-Петербург"],
        ] {
            exec(&store, &args).await.unwrap();
        }
        for args in [
            ["product", "add", "--name", "Ноутбук", "--price", "50000", "--category", "Электроника"],
            ["product", "add", "--name", "Мышь", "--price", "1000", "--category", "Электроника"],
        ] {
            exec(&store, &args).await.unwrap();
        }
        exec(&store, &["order", "create", "--customer", "1", "--item", "1:1", "--item", "2:2", "--date", "2023-01-01T10:00:00"])
            .await
            .unwrap();
        exec(&store, &["order", "create", "--customer", "2", "--item", "1:1", "--date", "2023-01-03"])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn order_create_reports_total() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let text = exec(&store, &["order", "create", "--customer", "1", "--item", "2:3"]).await.unwrap();
        assert_eq!(text, "Created order 3 (total 3000.00)\n");

        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders[2].status().as_str(), OrderStatus::NEW);
    }

    #[tokio::test]
    async fn order_create_rejects_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        assert!(exec(&store, &["order", "create", "--customer", "1", "--item", "2:0"]).await.is_err());
        assert!(exec(&store, &["order", "create", "--customer", "1", "--item", "99:1"]).await.is_err());
        assert_eq!(store.list_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn listings_resolve_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let text = exec(&store, &["order", "list"]).await.unwrap();
        assert!(text.contains("Иван Иванов"));
        assert!(text.contains("52000.00"));
        assert!(text.contains("2023-01-03 00:00"));

        let text = exec(&store, &["customer", "search", "петр"]).await.unwrap();
        assert!(text.contains("Петров"));
        assert!(!text.contains("Иванов"));

        let text = exec(&store, &["order", "show", "1"]).await.unwrap();
        assert!(text.contains("Customer: Иван Иванов"));
        assert!(text.contains("Total: 52000.00"));
    }

    #[tokio::test]
    async fn placeholder_actions_change_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let text = exec(&store, &["customer", "delete", "1"]).await.unwrap();
        assert!(text.contains("not available yet"));
        exec(&store, &["product", "delete", "1"]).await.unwrap();
        exec(&store, &["order", "set-status", "1", "завершен"]).await.unwrap();

        assert_eq!(store.list_customers().await.unwrap().len(), 2);
        assert_eq!(store.list_products().await.unwrap().len(), 2);
        assert_eq!(store.get_order(shopledger_core::OrderId::new(1)).await.unwrap().status().as_str(), OrderStatus::NEW);
    }

    #[tokio::test]
    async fn reports_render_tables_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let text = exec(&store, &["report", "top-customers"]).await.unwrap();
        assert!(text.starts_with("Top 5 customers by order count"));
        let text = exec(&store, &["report", "top-customers", "--limit", "0"]).await.unwrap();
        assert_eq!(text.trim_end(), render::NO_DATA);

        let text = exec(&store, &["report", "similarity", "--min-common", "1"]).await.unwrap();
        assert!(text.contains("Петр Петров"));
        let text = exec(&store, &["report", "similarity"]).await.unwrap();
        assert_eq!(text.trim_end(), render::NO_GRAPH);

        let text = exec(&store, &["report", "trend", "--format", "json"]).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["chart"]["points"].as_array().unwrap().len(), 3);
        assert_eq!(json["chart"]["points"][1]["count"], 0);

        let text = exec(&store, &["report", "geography"]).await.unwrap();
        assert!(text.contains("Санкт-Петербург"));
    }

    #[tokio::test]
    async fn reports_on_empty_store_say_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = ShopStore::open(dir.path().join("empty.db")).await.unwrap();

        for report in ["top-customers", "trend", "similarity", "sales", "geography"] {
            let text = exec(&store, &["report", report]).await.unwrap();
            assert_eq!(text.trim_end(), render::NO_DATA, "report {report}");
        }
    }

    #[tokio::test]
    async fn export_then_import_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;
        let file = dir.path().join("customers.json");
        let file_arg = file.to_str().unwrap();

        let text = exec(&store, &["export", "customers", file_arg]).await.unwrap();
        assert!(text.starts_with("Exported 2 rows from customers"));

        let other = ShopStore::open(dir.path().join("other.db")).await.unwrap();
        let text = exec(&other, &["import", "customers", file_arg]).await.unwrap();
        assert_eq!(text, "Imported 2 rows into customers\n");
        assert_eq!(other.list_customers().await.unwrap(), store.list_customers().await.unwrap());

        let err = exec(&store, &["export", "customers", "dump.xml"]).await.unwrap_err();
        assert!(err.to_string().contains("cannot infer the format"));
    }
}
