use std::{env, io, sync::Arc};

use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mycampus_proxy::{cli, server, HttpFetcher, Scraper};

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mycampus_proxy=info")),
        )
        .init();

    let fetcher = match HttpFetcher::new(&args.user_agent) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            error!("failed to build HTTP client: {err}");
            return Err(io::Error::other(err));
        }
    };

    info!(base_url = %args.site.base_url, timezone = %args.site.timezone, "scraping");
    let state = server::AppState::new(Scraper::new(fetcher, args.site), &args.cache);
    let router = server::router(Arc::new(state));

    let listener = TcpListener::bind(args.address).await?;
    info!("Listening at http://{}", args.address);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Received SIGINT, shutting down");
}
