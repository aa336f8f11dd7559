//! Catalog HTTP server backed by SQLite.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog_rust::{http, Catalog, CatalogConfig, SqliteConfig, SqliteEntityStore};

#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "CATALOG_DB_PATH", default_value = "catalog.db")]
    db_path: PathBuf,

    /// Address to listen on
    #[arg(long, env = "CATALOG_BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind_addr: String,

    /// Page size when a list request omits `size`
    #[arg(long, env = "CATALOG_PAGE_SIZE", default_value = "5")]
    page_size: usize,

    /// Largest page size a client may request
    #[arg(long, env = "CATALOG_MAX_PAGE_SIZE", default_value = "100")]
    max_page_size: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = SqliteEntityStore::open(&SqliteConfig::new(&cli.db_path))?;

    let config = CatalogConfig::new()
        .with_bind_addr(cli.bind_addr)
        .with_default_page_size(cli.page_size)
        .with_max_page_size(cli.max_page_size);

    http::serve(Catalog::new(store), config).await?;
    Ok(())
}
