use anyhow::Context;

use taskboard_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    taskboard_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr;

    let app = taskboard_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
