//! Gallery Listing API
//!
//! Lists images stored under a namespace in an S3 bucket, maps each object
//! to public full-size and thumbnail URLs, and caches pages in memory with
//! ETag revalidation and stale fallback when the bucket is unreachable.

mod conditional;
mod config;
mod error;
mod fetcher;
mod server;
mod service;
#[cfg(test)]
mod testing;
mod types;
mod validation;

use crate::config::GalleryConfig;
use crate::error::{GalleryError, Result};
use crate::server::{start_server, ServerState, SharedState};
use crate::service::ListingService;
use s3_listing_client::S3ObjectLister;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("gallery_api=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Gallery Listing API...");

    let config = GalleryConfig::from_env()?;
    info!("Port: {}", config.port);
    info!("Bucket: {:?}", config.listing.bucket);
    info!("Public base URL: {:?}", config.listing.public_base_url);
    info!("Namespace policy: {}", config.listing.namespace_policy);
    info!(
        "Cache: ttl {}s, stale retention {}s, max {} entries",
        config.listing.cache_ttl.as_secs(),
        config.listing.stale_retention.as_secs(),
        config.listing.max_entries
    );
    info!("S3: {:?}", config.s3);

    // The SDK client is built on the first listing call
    let lister = Arc::new(S3ObjectLister::new(config.s3));
    let service = ListingService::new(config.listing, lister);

    let state: SharedState = Arc::new(ServerState::new(service, config.cors_origins));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| GalleryError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
