use std::sync::Arc;

use axum::routing::get;

use hatchr_api::config::AppConfig;
use hatchr_api::events::publisher::ChangeFeed;
use hatchr_api::{migrations, router, AppState};
use hatchr_shared::clients::db::create_pool;
use hatchr_shared::clients::rabbitmq::RabbitMQClient;
use hatchr_shared::clients::storage::ObjectStorage;
use hatchr_shared::middleware::{init_metrics, init_tracing, AuthSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("hatchr-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url, config.db_pool_size)?;
    if config.run_migrations {
        migrations::run_pending(&db)?;
    }

    // The change feed is optional; the API keeps serving when the broker is down.
    let rabbitmq = match config.rabbitmq_url.as_deref() {
        Some(url) => match RabbitMQClient::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, "rabbitmq unavailable, change feed disabled");
                None
            }
        },
        None => {
            tracing::info!("no rabbitmq url configured, change feed disabled");
            None
        }
    };

    let storage = match config.storage_settings() {
        Some(settings) => Some(ObjectStorage::connect(&settings).await),
        None => {
            tracing::info!("no storage endpoint configured, uploads disabled");
            None
        }
    };

    let auth = AuthSettings::new(&config.jwt_secret, config.jwt_audience.clone());
    let state = Arc::new(AppState {
        db,
        auth,
        feed: ChangeFeed::new(rabbitmq),
        storage,
        config,
    });

    let prometheus = init_metrics()?;
    let app = router(state).route(
        "/metrics",
        get(move || {
            let handle = prometheus.clone();
            async move { handle.render() }
        }),
    );

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "hatchr-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
