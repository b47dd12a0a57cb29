use std::env;
use std::net::SocketAddr;

use anyhow::Result;
use folio_api::{build_app, ApiConfig};
use folio_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("folio_api");

    let bind = env::var("FOLIO_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let config = ApiConfig::from_env();
    let profile_source = config
        .profile_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "builtin".to_string());

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, profile = %profile_source, "sparkie api started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
