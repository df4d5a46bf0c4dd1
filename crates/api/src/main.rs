use stockroom_api::app::{build_app, AppServices};
use stockroom_auth::TokenConfig;

#[tokio::main]
async fn main() {
    stockroom_observability::init();

    let secret = std::env::var("TOKEN_SECRET").unwrap_or_else(|_| {
        tracing::warn!("TOKEN_SECRET not set; using insecure dev default");
        "insecure-dev-secret-change-me-now!".to_string()
    });

    let access_ttl = std::env::var("ACCESS_TTL").ok();
    let refresh_ttl = std::env::var("REFRESH_TTL").ok();
    let config = TokenConfig::new(secret.into_bytes())
        .with_ttl_literals(access_ttl.as_deref(), refresh_ttl.as_deref());

    let services = AppServices::in_memory(config);
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
