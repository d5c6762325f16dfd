use std::sync::Arc;

use anyhow::Context;
use common::push::{ApnsClient, ApnsCredentials, PushSender};
use common::storage::FilesystemFileStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventhub::config::{AppConfig, PushConfig};
use eventhub::state::AppState;
use eventhub::{build_router, database, seed};

async fn push_sender(config: &PushConfig) -> anyhow::Result<Option<Arc<dyn PushSender>>> {
    if !config.enabled {
        info!("Push notifications are disabled");
        return Ok(None);
    }
    let (Some(team_id), Some(key_id), Some(key_path), Some(bundle_id)) = (
        config.team_id.clone(),
        config.key_id.clone(),
        config.private_key_path.as_deref(),
        config.bundle_id.clone(),
    ) else {
        anyhow::bail!("push is enabled but APNs credentials are incomplete");
    };

    let credentials = ApnsCredentials::from_key_file(team_id, key_id, key_path, bundle_id)
        .await
        .context("reading APNs private key")?;
    let client = ApnsClient::new(credentials, config.sandbox, config.concurrency)?;
    info!(sandbox = config.sandbox, "APNs client ready");
    Ok(Some(Arc::new(client)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventhub=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("loading configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("connecting to database")?;
    seed::ensure_indexes(&db).await?;
    if config.seed.enabled {
        seed::seed_initial_users(&db, &config.seed).await?;
        seed::seed_sample_events(&db).await?;
    }

    let files = FilesystemFileStore::new(
        config.storage.root.clone(),
        config.storage.max_upload_size,
    )
    .await
    .context("preparing file storage")?;
    let push = push_sender(&config.push).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        files: Arc::new(files),
        push,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
