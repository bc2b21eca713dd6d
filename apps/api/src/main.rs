mod access;
mod config;
mod db;
mod errors;
mod models;
mod profiles;
mod repo;
mod routes;
mod state;
mod storage;
mod supabase;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::access::AccessGate;
use crate::config::Config;
use crate::db::create_pool;
use crate::profiles::PgProfileStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::ImageStore;
use crate::supabase::SupabaseAuth;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting salon API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize auth provider client
    let auth = SupabaseAuth::new(&config.supabase_url, config.supabase_anon_key.clone())?;
    info!("Auth provider client initialized ({})", config.supabase_url);

    // Initialize storage
    let s3 = build_s3_client(&config).await;
    let images = ImageStore::new(s3, config.s3_bucket.clone(), &config.storage_public_url);
    info!("Storage client initialized (bucket: {})", config.s3_bucket);

    let gate = AccessGate::new(
        Arc::new(auth.clone()),
        Arc::new(PgProfileStore::new(db.clone())),
        config.cookies.clone(),
    );

    let state = AppState {
        db,
        auth: Arc::new(auth),
        images,
        gate,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the dashboard frontend once its domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for the provider's S3-compatible storage endpoint.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.s3_access_key_id,
        &config.s3_secret_access_key,
        None,
        None,
        "salon-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
