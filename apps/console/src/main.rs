use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{ClientOptions, FilterState, OrderBucket, OrderHubClient};
use shared::domain::OrderId;

mod config;

use config::{load_settings, validate_service_url};

#[derive(Parser, Debug)]
#[command(about = "Order hub console: browse the inbox and orders board")]
struct Args {
    /// Overrides the configured Order Service base URL.
    #[arg(long)]
    service_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List inbox messages grouped into orders / not orders.
    Inbox {
        #[arg(long, default_value = "")]
        query: String,
    },
    /// List the orders board grouped by review status.
    Orders,
    /// Open one order's detail view (begins review as a side effect).
    Order { order_id: String },
    /// Trigger a full data refresh on the service.
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(service_url) = args.service_url {
        settings.service_url = service_url;
    }
    validate_service_url(&settings.service_url)?;

    let client = OrderHubClient::with_options(
        settings.service_url.clone(),
        ClientOptions {
            catalog_page_size: settings.catalog_page_size,
            debounce_window: settings.debounce_window(),
        },
    );

    match args.command {
        Command::Inbox { query } => {
            client.refresh_inbox().await?;
            let filter = FilterState {
                query,
                ..FilterState::default()
            };
            let snapshot = client.inbox_snapshot(&filter).await;
            println!(
                "showing {} of {} messages",
                snapshot.shown, snapshot.total
            );
            println!("orders ({})", snapshot.groups.orders.len());
            for view in &snapshot.groups.orders {
                print_message(view);
            }
            println!("not orders ({})", snapshot.groups.not_orders.len());
            for view in &snapshot.groups.not_orders {
                print_message(view);
            }
        }
        Command::Orders => {
            client.refresh_orders().await?;
            let groups = client.orders_snapshot().await;
            for bucket in OrderBucket::ALL {
                println!("{} ({})", bucket.label(), groups.count(bucket));
                for row in groups.rows(bucket) {
                    println!(
                        "  {}  po={}  customer={}  items={}",
                        row.order.order_id.0,
                        row.order.po_number.as_deref().unwrap_or("-"),
                        row.customer_name.as_deref().unwrap_or("Unknown Customer"),
                        row.item_count,
                    );
                }
            }
        }
        Command::Order { order_id } => {
            let view = client.open_order(&OrderId::new(order_id)).await?;
            println!(
                "order {}  status={}  po={}",
                view.order.order_id.0,
                view.order.order_status,
                view.order.po_number.as_deref().unwrap_or("-"),
            );
            if let Some(message) = &view.message {
                println!(
                    "from {} <{}>",
                    message.sender_name.as_deref().unwrap_or("Unknown"),
                    message.sender_email.as_deref().unwrap_or("-"),
                );
                if let Some(body) = message.email_body_text.as_deref() {
                    println!("--\n{body}\n--");
                }
            }
            for item in &view.line_items {
                println!(
                    "  {} x{}  sku={}",
                    item.product_name.as_deref().unwrap_or("(unmatched)"),
                    item.quantity,
                    item.sku.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Refresh => {
            client.trigger_refresh().await?;
            println!("refresh triggered");
        }
    }

    Ok(())
}

fn print_message(view: &client_core::MessageView) {
    println!(
        "  {}  {}  orders={}{}",
        view.message.item_id.0,
        view.message.subject.as_deref().unwrap_or("No Subject"),
        view.orders.len(),
        view.tag
            .as_deref()
            .map(|tag| format!("  [{tag}]"))
            .unwrap_or_default(),
    );
}
