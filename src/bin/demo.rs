//! dormstore demo composition root.
//!
//! Wires the payment gateway, record store and blob cache explicitly (no
//! globals) and runs a short catalog-plus-checkout scenario. Without a
//! `--base-url` the gateway stays in fallback mode and the whole run is
//! offline.

use bytes::Bytes;
use clap::Parser;
use dormstore::blob::{Blob, BlobCache, BlobFetcher, BlobNamespace, HttpBlobFetcher, StaticBlobFetcher};
use dormstore::payment::Card;
use dormstore::store::{
    MemoryBackend, RecordBackend, RemoteRecordStore, COMPANIES_PATH, STORABLE_OBJECTS_PATH,
};
use dormstore::{AppConfig, PaymentGateway};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Minimal JPEG header used as the demo default asset.
const DEFAULT_ASSET: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

/// Demo composition root for the dormstore data-access layer.
#[derive(Parser, Debug)]
#[command(name = "dormstore-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "DORMSTORE_CONFIG")]
    config: Option<PathBuf>,

    /// Payment backend base URL (absent ⇒ fallback mode).
    #[arg(long, env = "DORMSTORE_BASE_URL")]
    base_url: Option<String>,

    /// Publishable API key.
    #[arg(long, env = "DORMSTORE_PUBLISHABLE_KEY")]
    publishable_key: Option<String>,

    /// Log level filter.
    #[arg(long, default_value = "info", env = "DORMSTORE_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    info!("dormstore-demo v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if cli.base_url.is_some() {
        config.payment.base_url = cli.base_url.clone();
    }
    if let Some(key) = cli.publishable_key {
        config.payment.publishable_key = key;
    }
    if config.payment.publishable_key.contains('#') {
        // The demo should run out of the box, so swap the placeholder for
        // a sandbox key instead of failing the key check.
        config.payment.publishable_key = "pk_test_demo".to_string();
    }

    // The composition root owns every component instance.
    let gateway = PaymentGateway::new(config.payment.clone())?;
    let backend = MemoryBackend::new();
    let store = RemoteRecordStore::new(Arc::new(backend.clone()));

    let fetcher: Arc<dyn BlobFetcher> = match &config.blob.base_url {
        Some(url) => Arc::new(HttpBlobFetcher::new(url)?),
        None => {
            let demo_fetcher = StaticBlobFetcher::new();
            demo_fetcher.insert("minifridge.jpg", Bytes::from_static(DEFAULT_ASSET));
            Arc::new(demo_fetcher)
        }
    };
    let blobs = BlobCache::with_capacity(
        fetcher,
        Blob::new(Bytes::from_static(DEFAULT_ASSET)),
        config.blob.cache_capacity,
        config.blob.max_fetch_bytes,
    );

    // Seed the in-memory catalog the way a live backend would populate it.
    backend
        .put(STORABLE_OBJECTS_PATH, "obj1", json!("Mini Fridge"))
        .await?;
    backend
        .put(STORABLE_OBJECTS_PATH, "obj2", json!("Futon"))
        .await?;
    backend
        .put(
            COMPANIES_PATH,
            "c1",
            json!({
                "name": "Campus Storage Co",
                "Price Index": {
                    "item1": {
                        "name": "Mini Fridge",
                        "standard": { "price": 12.5 }
                    }
                }
            }),
        )
        .await?;

    let mut objects = store.fetch_storable_objects().await?;
    let mut companies = store.fetch_companies().await?;

    if let Some(items) = objects.next_update().await {
        info!("catalog items: {:?}", items.iter().map(|o| &o.name).collect::<Vec<_>>());
        for item in &items {
            let blob = blobs.get_blob(&item.name, BlobNamespace::ObjectImages).await;
            info!(item = %item.name, bytes = blob.len(), "image resolved");
        }
    }
    if let Some(list) = companies.next_update().await {
        for company in &list {
            info!(company = %company.name, prices = ?company.price_index, "company loaded");
        }
    }

    // Checkout flow: attach a card, read the customer back, then charge.
    let card = Card::new("card_demo_visa");
    gateway.attach_source_to_customer(&card).await?;
    let customer = gateway.retrieve_customer().await?;
    info!(
        customer = %customer.id,
        sources = customer.sources.len(),
        default = ?customer.default_source.as_ref().map(|c| &c.id),
        "customer retrieved"
    );

    match gateway.complete_charge(&card.id, 1250).await {
        Ok(()) => info!("charge completed"),
        Err(err) if !gateway.is_configured() => {
            info!("charge skipped in fallback mode: {err}");
        }
        Err(err) => warn!("charge failed: {err}"),
    }

    store
        .create_order("order_demo", &HashMap::from([(
            "item".to_string(),
            "Mini Fridge".to_string(),
        )]))
        .await?;
    info!("demo order written");

    Ok(())
}
