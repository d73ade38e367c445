use std::sync::Arc;

use portal_service::config::Config;
use portal_service::domain::login::service::LoginService;
use portal_service::inbound::http::router::create_router;
use portal_service::outbound::identity::HttpIdentityProvider;
use portal_service::outbound::repositories::student::PostgresStudentRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "portal-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        identity_url = %config.identity.url,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let student_repository = Arc::new(PostgresStudentRepository::new(pg_pool));
    let identity_provider = Arc::new(HttpIdentityProvider::new(
        reqwest::Client::new(),
        config.identity.clone(),
    ));

    let login_service = Arc::new(LoginService::new(student_repository, identity_provider));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(login_service);
    axum::serve(http_listener, http_application).await?;

    Ok(())
}
