//! Example demonstrating snapshot loading and change watching.
//!
//! Uses the in-memory client as a stand-in for a real Apollo connection and
//! pushes a few changes from a background thread.

use apollo_source::client::memory::MemoryClient;
use apollo_source::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    println!("=== Apollo Source Example ===\n");

    let client = Arc::new(MemoryClient::with_entries([
        ("server.port", "8080"),
        ("server.host", "localhost"),
        ("feature.checkout", "off"),
    ]));

    let source = ApolloSource::new(
        SourceOptions::new()
            .with_app_id("order-service")
            .with_cluster("default")
            .with_namespace("application")
            .with_enable_backup()
            .with_backup_path(std::env::temp_dir().join("apollo-source-demo")),
        &client.connector(),
    )?;

    println!("Backup directory: {}", source.backup_dir().display());
    println!("Initial snapshot:");
    let mut initial = source.load()?;
    initial.sort_by(|a, b| a.key.cmp(&b.key));
    for kv in initial {
        println!("  {} = {}", kv.key, String::from_utf8_lossy(&kv.value));
    }
    println!();

    let watcher = Arc::new(source.watch()?);

    let pusher = Arc::clone(&client);
    let stopper = Arc::clone(&watcher);
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        pusher.set("feature.checkout", "on");

        std::thread::sleep(Duration::from_millis(200));
        pusher.publish([
            ("server.port", "9090"),
            ("server.host", "localhost"),
            ("feature.checkout", "on"),
            ("feature.search", "beta"),
        ]);

        std::thread::sleep(Duration::from_millis(200));
        stopper.stop();
    });

    loop {
        match watcher.next().await {
            Ok(changed) => {
                println!("Received {} changed keys:", changed.len());
                for kv in changed {
                    println!("  {} = {}", kv.key, String::from_utf8_lossy(&kv.value));
                }
            }
            Err(e) if e.is_stopped() => {
                println!("Watcher stopped");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
