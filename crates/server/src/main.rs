//! Interactions service entry point.
//!
//! Loads configuration, connects to the database, applies migrations and
//! wires the service graph the HTTP layer is built on.

use std::sync::Arc;

use interactions_common::Config;
use interactions_core::{ConfigResolver, IdentityProvisioner, InteractionStore, VoteLedger};
use interactions_db::repositories::ParticipantRepository;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interactions=debug,sea_orm=info".into()),
        )
        .init();

    info!("Starting interactions service...");

    let config = Config::load()?;

    let db = interactions_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    interactions_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let _identity = IdentityProvisioner::new(
        ParticipantRepository::new(Arc::clone(&db)),
        &config.identity,
    )?;
    let _interactions =
        InteractionStore::new(Arc::clone(&db), ConfigResolver::new(Arc::clone(&db)));
    let _votes = VoteLedger::new(Arc::clone(&db));

    info!(
        identity_endpoint = %config.identity.user_endpoint,
        "Service graph ready"
    );

    Ok(())
}
