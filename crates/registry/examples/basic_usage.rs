//! Basic usage example: register, publish, stage, roll back.
//!
//! Run: `RUST_LOG=keyver_registry=debug cargo run --example basic_usage`
//!
//! This example shows:
//! - Registry configuration with the classic three-member etcd endpoint list
//! - Registering a key and publishing new versions
//! - Staging a version and activating it later
//! - Rolling back to an earlier version
//! - Error handling patterns

// Examples are allowed to use expect/unwrap for brevity
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{sync::Arc, time::Duration};

use keyver_registry::{RegistryConfig, RegistryError, Result, VersionedKeyRegistry};
use keyver_store::InMemoryStore;
use tracing_subscriber::EnvFilter;

const SERVICE: &str = "crypto";
const KEY: &str = "BUY_VALUE";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // -------------------------------------------------------------------------
    // 1. Create a registry with configuration
    // -------------------------------------------------------------------------
    let config = RegistryConfig::builder()
        .with_endpoints(["localhost:2379", "localhost:22379", "localhost:32379"])
        .with_connect_timeout(Duration::from_secs(2))
        .with_timeout(Duration::from_secs(10))
        .build()?;

    // The in-memory store stands in for the cluster named by the endpoints.
    let registry = VersionedKeyRegistry::new(Arc::new(InMemoryStore::new()), config);

    // -------------------------------------------------------------------------
    // 2. Register the key (idempotent)
    // -------------------------------------------------------------------------
    let created = registry.create_or_register(SERVICE, KEY, "100").await?;
    println!("Registered {} at v{}", created.key, created.number);

    let again = registry.create_or_register(SERVICE, KEY, "999").await?;
    println!("Registering again keeps v{}", again.number);

    // -------------------------------------------------------------------------
    // 3. Publish and activate a new value
    // -------------------------------------------------------------------------
    let published = registry.publish_new_version(SERVICE, KEY, "105", true).await?;
    println!("Published and activated v{}", published.number);

    // -------------------------------------------------------------------------
    // 4. Stage a value, then promote it
    // -------------------------------------------------------------------------
    let staged = registry.publish_new_version(SERVICE, KEY, "110", false).await?;
    let active = registry.get_active_value(SERVICE, KEY).await?;
    println!("Staged v{}; active is still v{} = {:?}", staged.number, active.number, active.typed_value());

    registry.activate_version(SERVICE, KEY, staged.number.value()).await?;

    // -------------------------------------------------------------------------
    // 5. Roll back
    // -------------------------------------------------------------------------
    registry.activate_version(SERVICE, KEY, 1).await?;
    let active = registry.get_active_value(SERVICE, KEY).await?;
    println!("Rolled back to v{} = {:?}", active.number, active.typed_value());

    println!("History of {SERVICE}/{KEY}:");
    for version in registry.list_versions(SERVICE, KEY).await? {
        let marker = if version.number == active.number { "*" } else { " " };
        println!(
            " {marker} v{} = {:?} ({})",
            version.number,
            version.typed_value(),
            version.created_at.to_rfc3339()
        );
    }

    // -------------------------------------------------------------------------
    // 6. Error handling patterns
    // -------------------------------------------------------------------------
    match registry.publish_new_version(SERVICE, "SELL_VALUE", "1", true).await {
        Err(RegistryError::NotFound { op, .. }) => {
            println!("{op}: key must be registered before publishing");
        },
        Err(e) if e.is_retryable() => println!("Transient failure, try again later: {e}"),
        Err(e) => return Err(e),
        Ok(version) => println!("Unexpectedly published v{}", version.number),
    }

    registry.shutdown();
    Ok(())
}
