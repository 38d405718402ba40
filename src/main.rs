use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use price_notifier::{AppConfig, NewProduct, Product, ProductManager, ThousandsSeparator};

#[derive(Debug, Parser)]
#[command(name = "price-notifier", version, about = "Track product prices and report drops below a target")]
struct Cli {
    /// Products file to use instead of the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start tracking a product page
    Add {
        name: String,
        url: String,
        target_price: f64,
        /// CSS selector of the price element
        #[arg(long)]
        selector: Option<String>,
        /// Character grouping thousands on the page (',' or '.')
        #[arg(long, default_value_t = ThousandsSeparator::Comma)]
        thousands_separator: ThousandsSeparator,
    },
    /// Show tracked products
    List {
        /// Number of recent prices to show per product
        #[arg(long, default_value_t = 3)]
        history: usize,
    },
    /// Fetch current prices for every product
    Refresh,
    /// Stop tracking the product at the given position (starting at 1)
    Remove { index: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(store) = cli.store {
        config.storage.products_file = store;
    }

    // Logs go to stderr; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("price_notifier={}", config.logging.level)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let manager = ProductManager::from_config(&config)?;
    info!("Using products file {}", config.storage.products_file.display());

    match cli.command {
        Command::Add {
            name,
            url,
            target_price,
            selector,
            thousands_separator,
        } => {
            let product = manager
                .add(NewProduct {
                    name,
                    url,
                    target_price,
                    locator: selector,
                    thousands_separator,
                })
                .await?;

            println!("Product '{}' has been added", product.name);
            println!("    Current price: {}", format_price(product.current_price));
        }
        Command::List { history } => {
            let products = manager.list().await;
            if products.is_empty() {
                println!("There are no tracked products");
                return Ok(());
            }

            println!("=== TRACKED PRODUCTS ({}) ===", products.len());
            for (i, product) in products.iter().enumerate() {
                print_product(i + 1, product, history);
            }
        }
        Command::Refresh => {
            let shutdown = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            let report = manager.refresh_all_with_shutdown(shutdown).await;

            if report.cancelled {
                println!("Refresh interrupted; prices read so far were kept");
            }
            for failure in &report.failures {
                println!("- {}: price not available ({})", failure.name, failure.error);
            }
            if report.triggered.is_empty() {
                println!("No products are at or below their target price");
            } else {
                println!("{} product(s) at or below your target price:", report.triggered.len());
                for product in &report.triggered {
                    println!(
                        "- {}: current price {} (target {})",
                        product.name,
                        format_price(product.current_price),
                        product.target_price
                    );
                }
            }
            if !report.persisted {
                anyhow::bail!("product store was not updated; see the log for details");
            }
        }
        Command::Remove { index } => {
            let removed = manager.remove(index).await?;
            println!("Product #{} ({}) has been removed", index, removed.name);
        }
    }

    Ok(())
}

fn print_product(position: usize, product: &Product, history: usize) {
    println!();
    println!("{}. {}", position, product.name);
    println!("    URL: {}", product.url);
    println!("    Current price: {}", format_price(product.current_price));
    println!("    Target price: {}", product.target_price);

    if history > 0 && !product.price_history.is_empty() {
        println!("    Recent prices:");
        for entry in product.price_history.recent(history) {
            println!("    {} : {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"), entry.price);
        }
    }
}

fn format_price(price: Option<f64>) -> String {
    price.map_or_else(|| "Not available".to_string(), |p| p.to_string())
}
