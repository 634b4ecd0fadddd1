//! Reset the database to random sample campgrounds.
//!
//! ```text
//! seed <author-username> [count]
//! ```
//!
//! The author must already have an account.

use anyhow::{bail, Context};
use campground_server::config::Config;
use campground_server::seed::{self, DEFAULT_COUNT};
use campground_server::state::AppState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campground_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(author) = args.next() else {
        bail!("usage: seed <author-username> [count]");
    };
    let count = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("count must be a non-negative integer, got '{raw}'"))?,
        None => DEFAULT_COUNT,
    };

    let config = Config::from_env()?;
    let state = AppState::new(&config).await?;

    let mut rng = StdRng::from_entropy();
    let report = seed::reseed(&state, &author, count, &mut rng).await?;

    tracing::info!(
        deleted = report.deleted_listings,
        created = report.created_listings,
        "Done"
    );
    Ok(())
}
