use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod config;
mod constants;
mod crypto;
mod error;
mod format;
mod models;
mod services;
mod store;
mod utils;

use client::{ExplorerApi, HttpExplorerApi};
use config::Config;
use constants::{NATIVE_SYMBOL, STORE_KEY_LOCALE};
use services::{
    AssetAggregator, ExplorerEvent, ExplorerView, ImageSlot, LoadOutcome, SyncStatusPoller,
    TokenValue,
};
use store::{JsonFileStore, KeyValueStore};

const USAGE: &str =
    "usage: tokenscope-explorer [ADDRESS] [--reset] [--expand-nfts] [--page N] [--watch]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    address: Option<String>,
    reset: bool,
    expand_nfts: bool,
    page: Option<usize>,
    watch: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--reset" => parsed.reset = true,
            "--expand-nfts" => parsed.expand_nfts = true,
            "--watch" => parsed.watch = true,
            "--page" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--page needs a number\n{}", USAGE))?;
                parsed.page = Some(
                    value
                        .parse()
                        .map_err(|e| anyhow::anyhow!("invalid page {:?}: {}", value, e))?,
                );
            }
            "-h" | "--help" => anyhow::bail!(USAGE),
            flag if flag.starts_with("--") => anyhow::bail!("unknown flag {}\n{}", flag, USAGE),
            address => {
                if parsed.address.is_some() {
                    anyhow::bail!("only one address may be given\n{}", USAGE);
                }
                parsed.address = Some(address.to_string());
            }
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tokenscope_explorer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting tokenscope explorer");
    tracing::info!("Backend: {}", config.api_base_url);

    let api: Arc<dyn ExplorerApi> = Arc::new(HttpExplorerApi::new(&config)?);
    let store = Arc::new(JsonFileStore::new(config.state_file.clone()));
    tracing::debug!("State file: {}", store.path().display());
    if let Ok(Some(locale)) = store.get(STORE_KEY_LOCALE) {
        tracing::debug!("stored locale: {}", locale);
    }
    let aggregator = AssetAggregator::new(api.clone(), store, &config);

    // Failures surface as short notices on stderr
    let mut events = aggregator.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ExplorerEvent::Error { message }) => eprintln!("! {}", message),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("notice listener skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if cli.reset {
        aggregator.reset().await?;
        println!("Cleared the saved address.");
    }

    let outcome = match cli.address.as_deref() {
        Some(address) => Some(aggregator.load(address).await?),
        None if !cli.reset => aggregator.restore().await?,
        None => None,
    };

    match outcome {
        Some(LoadOutcome::Loaded { .. }) => {
            if let Some(page) = cli.page {
                aggregator.set_page(page).await;
            }
            if cli.expand_nfts {
                expand_all(&aggregator).await;
            }
            print_account(&aggregator, &aggregator.view().await).await;
        }
        Some(LoadOutcome::Superseded) => tracing::warn!("load was superseded"),
        None if cli.address.is_none() && !cli.reset && !cli.watch => println!("{}", USAGE),
        None => {}
    }

    let poller = SyncStatusPoller::new(api, config.sync_poll_interval());
    let handle = poller.start();
    let mut updates = handle.subscribe();

    if !cli.watch {
        if updates.changed().await.is_ok() {
            print_sync(handle.latest());
        }
        handle.stop().await;
        return Ok(());
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print_sync(handle.latest());
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }
    handle.stop().await;

    Ok(())
}

async fn expand_all(aggregator: &AssetAggregator) {
    let collections: Vec<String> = aggregator
        .view()
        .await
        .snapshot
        .map(|s| {
            s.erc721_collections
                .iter()
                .map(|c| c.contract_address.clone())
                .collect()
        })
        .unwrap_or_default();

    let results = join_all(
        collections
            .iter()
            .map(|collection| aggregator.expand_collection(collection)),
    )
    .await;
    for (collection, result) in collections.iter().zip(results) {
        if let Err(err) = result {
            tracing::warn!("could not expand {}: {}", collection, err);
        }
    }
}

async fn print_account(aggregator: &AssetAggregator, view: &ExplorerView) {
    let (Some(snapshot), Some(owner)) = (view.snapshot.as_ref(), view.owner.as_ref()) else {
        return;
    };

    println!("Address  {}", owner);
    match format::format_native(&snapshot.native_balance) {
        Ok(balance) => println!("Balance  {} {}", balance, NATIVE_SYMBOL),
        Err(err) => println!("Balance  unavailable ({})", err),
    }

    if !snapshot.erc20_tokens.is_empty() {
        println!("\nERC-20 tokens");
        for token in &snapshot.erc20_tokens {
            let value = match view.token_value(&token.contract_address) {
                Some(TokenValue::Ready(value)) => value.clone(),
                Some(TokenValue::Failed(_)) => "failed".to_string(),
                None => "…".to_string(),
            };
            println!(
                "  {:<8} {:>24}  {}",
                token.symbol,
                value,
                aggregator.icon_url(&token.contract_address)
            );
        }
    }

    for collection in &snapshot.erc721_collections {
        println!("\nNFT {} ({})", collection.name, collection.contract_address);
        let Some(items) = view.collection_items(&collection.contract_address) else {
            continue;
        };
        let images = view.images_for(&collection.contract_address);
        for (item, image) in items.iter().zip(images) {
            let image = match image {
                ImageSlot::Ready(url) => url,
                ImageSlot::Unavailable => "-".to_string(),
                ImageSlot::Pending => "…".to_string(),
            };
            println!("  #{:<18} {}", item.display_token_id(), image);
        }
    }

    println!(
        "\nTransactions ({} total, page {}/{})",
        snapshot.tx_count,
        view.pagination.current_page,
        aggregator.page_count().await.max(1)
    );
    for tx in aggregator.current_page_transactions().await {
        let value = format::format_tx_value(&tx.value_wei).unwrap_or_else(|_| tx.value_wei.clone());
        println!(
            "  {}  {:?}  {} {}  {}",
            format::format_timestamp(tx.timestamp),
            tx.direction(owner),
            value,
            NATIVE_SYMBOL,
            tx.hash
        );
    }
}

fn print_sync(info: Option<models::SyncInfo>) {
    if let Some(info) = info {
        println!(
            "Sync     {}/{} blocks ({}%)",
            info.current_block_number,
            info.last_block_number,
            info.progress_percent()
        );
    }
}
