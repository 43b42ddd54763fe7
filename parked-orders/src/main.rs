use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use parked_orders::{
    Clock, Config, KeyValueStore, ParkedOrder, ParkedOrderStore, RedbStore, SystemClock,
    TracingSink, init_logger_with_file,
};
use shared::CartItem;

/// 挂单缓存运维工具
#[derive(Debug, Parser)]
#[command(name = "parked-orders", about = "Inspect and manage parked POS orders", long_about = None)]
struct Cli {
    /// Shop / tenant scope (falls back to PARKED_ORDERS_SCOPE)
    #[arg(long, global = true)]
    scope: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List parked orders, newest first
    List,
    /// Park a cart
    Park {
        /// Cart line as NAME:PRICE:QTY, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<String>,

        #[arg(long)]
        note: Option<String>,
    },
    /// Take an order back out (removes it)
    Retrieve { id: String },
    /// Discard an order
    Remove { id: String },
    /// Look up orders by retrieval code
    Find { code: String },
    /// Purge expired orders (every scope unless --scope is given)
    Sweep,
    /// List storage keys holding parked orders
    Keys,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();

    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    std::fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("Failed to create work dir {}", config.work_dir.display()))?;
    let db_path = config.db_path();
    let storage = Arc::new(
        RedbStore::open(&db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))?,
    );

    match cli.command {
        Commands::Sweep => return sweep(&config, &storage, cli.scope.as_deref()),
        Commands::Keys => {
            for (key, count) in scoped_keys(&config, &storage)? {
                println!("{key}\t{count}");
            }
            return Ok(());
        }
        _ => {}
    }

    let scope = cli.scope.or_else(|| config.scope.clone());
    let store = ParkedOrderStore::builder(storage)
        .scope(scope.as_deref())
        .key_prefix(config.key_prefix.clone())
        .notifier(Arc::new(TracingSink))
        .build();

    match cli.command {
        Commands::List => print_table(&store.orders()),
        Commands::Park { items, note } => {
            let cart = items
                .iter()
                .enumerate()
                .map(|(i, spec)| parse_item(i, spec))
                .collect::<anyhow::Result<Vec<_>>>()?;
            match store.park_order(&cart, note.as_deref()) {
                Some(code) => println!("{code}"),
                None => bail!("Order was not parked"),
            }
        }
        Commands::Retrieve { id } => match store.retrieve_order(&id) {
            Some(order) => print_orders(std::slice::from_ref(&order))?,
            None => bail!("No parked order with id {id}"),
        },
        Commands::Remove { id } => {
            if !store.remove_order(&id) {
                bail!("No parked order with id {id}");
            }
        }
        Commands::Find { code } => print_orders(&store.find_by_code(&code))?,
        Commands::Sweep | Commands::Keys => {}
    }

    Ok(())
}

/// Parse `NAME:PRICE:QTY`; the name may itself contain colons
fn parse_item(index: usize, spec: &str) -> anyhow::Result<CartItem> {
    let mut parts = spec.rsplitn(3, ':');
    let (Some(qty), Some(price), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("Invalid item '{spec}', expected NAME:PRICE:QTY");
    };

    let price: f64 = price
        .trim()
        .parse()
        .with_context(|| format!("Invalid price in '{spec}'"))?;
    let quantity: i32 = qty
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity in '{spec}'"))?;
    if quantity <= 0 {
        bail!("Quantity must be positive in '{spec}'");
    }

    Ok(CartItem::new(format!("cli-{}", index + 1), name.trim(), price, quantity))
}

fn print_table(orders: &[ParkedOrder]) {
    let now = SystemClock.now_millis();
    println!(
        "{:<6} {:>6} {:>8} {:>5} {:>10}  {:<36}  NOTE",
        "CODE", "AGE", "EXPIRES", "ITEMS", "TOTAL", "ID"
    );
    for order in orders {
        println!(
            "{:<6} {:>5}m {:>7}m {:>5} {:>10.2}  {:<36}  {}",
            order.code,
            order.age_ms(now) / 60_000,
            order.remaining_ms(now) / 60_000,
            order.item_count(),
            order.total,
            order.id,
            order.note.as_deref().unwrap_or("")
        );
    }
}

fn print_orders(orders: &[ParkedOrder]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(orders)?);
    Ok(())
}

/// Every key under the configured prefix, with the number of entries it holds
fn scoped_keys(config: &Config, storage: &RedbStore) -> anyhow::Result<Vec<(String, usize)>> {
    let mut keys = Vec::new();
    for key in storage.keys()? {
        if !key.starts_with(&config.key_prefix) {
            continue;
        }
        let count = storage
            .get(&key)?
            .and_then(|payload| serde_json::from_str::<Vec<serde_json::Value>>(&payload).ok())
            .map_or(0, |list| list.len());
        keys.push((key, count));
    }
    Ok(keys)
}

/// Loading a scope drops its expired entries, so each key is opened once
fn sweep(config: &Config, storage: &Arc<RedbStore>, only: Option<&str>) -> anyhow::Result<()> {
    for (key, before) in scoped_keys(config, storage)? {
        let scope = key.strip_prefix(config.key_prefix.as_str()).filter(|s| !s.is_empty());
        if only.is_some_and(|only| scope != Some(only)) {
            continue;
        }

        let store = ParkedOrderStore::builder(storage.clone())
            .scope(scope)
            .key_prefix(config.key_prefix.clone())
            .build();
        let purged = before.saturating_sub(store.len()) + store.sweep_expired();
        println!("{key}\tpurged={purged}\tremaining={}", store.len());
    }
    Ok(())
}
