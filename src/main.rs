// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod clients;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

#[cfg(test)]
mod test_support;

use crate::config::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carrega o .env antes de qualquer leitura de configuração
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;

    let app = routes::build_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    tracing::info!("📚 Documentação em http://{}/swagger-ui", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
