use clap::Parser;
use eosc_perf::{AppState, Migrator, Settings, router};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("eosc_perf=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();

    let settings = Settings::parse();
    let limits = settings.page_limits()?;
    let db = Database::connect(settings.database_url()?).await?;

    if settings.run_migrations {
        tracing::info!("running migrations");
        Migrator::up(&db, None).await?;
    }

    let state = AppState::new(db)
        .limits(limits)
        .query_timeout(settings.query_timeout());
    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    tracing::info!(address = %settings.bind_address, env = ?settings.app_env, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
