use anyhow::{bail, Context};
use reading_list_api::{config::Config, scripts::index_books::index_books};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reading_list_api=info,index_books=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(seed_path) = args.next().map(PathBuf::from) else {
        bail!("Usage: index-books <seed.json>");
    };
    if !seed_path.exists() {
        bail!("Seed file not found: {}", seed_path.display());
    }

    let config = Config::load().context("Failed to load configuration")?;
    index_books(&config, &seed_path)
        .await
        .context("Indexing failed")?;

    Ok(())
}
