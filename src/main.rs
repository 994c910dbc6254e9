use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use serp_extract::api;
use serp_extract::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("serp_extract=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    let addr = config.listen_addr();
    info!(
        default_host = %config.default_search_host,
        max_html_bytes = config.max_html_bytes,
        save_html = config.save_html,
        "configuration loaded"
    );

    let app = api::app(config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
