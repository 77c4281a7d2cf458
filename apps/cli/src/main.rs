use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{ListViewModel, RemoteListStore};
use docstore::MemoryCollection;
use shared::domain::{GroceryItem, ItemId, StoreFilter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

/// Interactive demo shell for the synchronized grocery list. Runs against
/// an in-process collection; every visible change still round-trips through
/// the snapshot listener, exactly as it would against the hosted store.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a settings file (defaults to ./grocery.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load_settings(args.config.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let collection = MemoryCollection::new();
    let store = Arc::new(RemoteListStore::new(collection));
    let view = ListViewModel::new(Arc::clone(&store));

    if settings.seed_demo_items {
        seed_demo_items(&store).await?;
    }
    view.attach().await?;
    info!(
        stores = settings.stores.len(),
        seeded = settings.seed_demo_items,
        "grocery shell attached"
    );

    println!("grocery list — ls, add <name> <qty> [store…], rm <id>, filter <store|all>, sort, stores, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => break,
            ["ls"] => print_items(&view.current_items().await),
            ["sort"] => {
                let direction = view.toggle_sort_direction().await;
                println!("sorting {direction:?}");
            }
            ["stores"] => println!("{}", settings.stores.join(", ")),
            ["filter", "all"] => {
                view.set_filter(StoreFilter::All).await;
                print_items(&view.current_items().await);
            }
            ["filter"] => eprintln!("filter expects a store name or `all`"),
            ["filter", rest @ ..] => {
                view.set_filter(StoreFilter::Store(rest.join(" "))).await;
                print_items(&view.current_items().await);
            }
            ["rm", id] => match id.parse::<i64>() {
                Ok(id) => {
                    if let Err(err) = view.request_remove(ItemId(id)).await {
                        eprintln!("remove failed: {err}");
                    }
                }
                Err(_) => eprintln!("rm expects a numeric id"),
            },
            ["add", name, quantity, shop @ ..] => {
                let shop = shop.join(" ");
                if !shop.is_empty() && !settings.stores.iter().any(|known| known == &shop) {
                    eprintln!("unknown store {shop:?}; see `stores`");
                    continue;
                }
                match view.request_add(name, quantity, &shop).await {
                    Ok(id) => println!("submitted item {}", id.0),
                    Err(err) => eprintln!("add failed: {err}"),
                }
            }
            _ => eprintln!("unrecognized command; try ls, add, rm, filter, sort, stores, quit"),
        }
    }

    view.detach().await;
    info!("grocery shell detached");
    Ok(())
}

async fn seed_demo_items(store: &RemoteListStore) -> Result<()> {
    let demo = [
        (1, "Milk", "2", "LIDL"),
        (2, "Bread", "1", "Metro"),
        (3, "Apples", "1 kg", "Carrefour"),
    ];
    for (id, name, quantity, shop) in demo {
        store
            .add(&GroceryItem {
                id: ItemId(id),
                name: name.into(),
                quantity: quantity.into(),
                store: shop.into(),
            })
            .await?;
    }
    Ok(())
}

fn print_items(items: &[GroceryItem]) {
    if items.is_empty() {
        println!("(empty)");
        return;
    }
    for item in items {
        println!(
            "{:>3}  {:<20} {:<10} {}",
            item.id.0, item.name, item.quantity, item.store
        );
    }
}
