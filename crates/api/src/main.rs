use warehub_infra::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warehub_observability::init();

    let config = Config::from_env()?;
    let services = std::sync::Arc::new(warehub_api::app::services::build_services(&config)?);

    let app = warehub_api::app::build_app(services.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    tokio::task::spawn_blocking(move || services.shutdown()).await?;
    Ok(())
}
