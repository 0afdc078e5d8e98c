use std::sync::Arc;
use std::time::Duration;

use auth::PasswordHasher;
use auth::TokenCodec;
use identity_service::config::Config;
use identity_service::config::StorageBackend;
use identity_service::domain::auth::linker::IdentityLinker;
use identity_service::domain::auth::ports::AuthServicePort;
use identity_service::domain::auth::ports::OAuthProviderClient;
use identity_service::domain::auth::ports::RefreshTokenStore;
use identity_service::domain::auth::registry::RefreshTokenRegistry;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::user::ports::MembershipChecker;
use identity_service::domain::user::ports::UserRepository;
use identity_service::inbound::grpc::IdentityGrpcService;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::inbound::http::router::OAuthState;
use identity_service::outbound::exchange_codes::InMemoryExchangeCodeStore;
use identity_service::outbound::oauth::GoogleOAuthClient;
use identity_service::outbound::repositories::InMemoryMembershipChecker;
use identity_service::outbound::repositories::InMemoryRefreshTokenStore;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::outbound::repositories::PostgresMembershipChecker;
use identity_service::outbound::repositories::PostgresRefreshTokenStore;
use identity_service::outbound::repositories::PostgresUserRepository;
use identity_service::proto::identity_service_server::IdentityServiceServer;
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn build_auth_service<UR, RS>(
    users: Arc<UR>,
    refresh_tokens: Arc<RS>,
    config: &Config,
) -> Result<Arc<dyn AuthServicePort>, anyhow::Error>
where
    UR: UserRepository,
    RS: RefreshTokenStore,
{
    let codec = Arc::new(TokenCodec::new(config.token_codec_config())?);
    let hasher = PasswordHasher::with_cost(config.hashing_cost())?;
    let registry = RefreshTokenRegistry::new(refresh_tokens, config.sessions.max_per_user);
    let linker = IdentityLinker::new(config.provider_config(), Arc::clone(&users));

    Ok(Arc::new(AuthService::new(
        users, registry, linker, codec, hasher,
    )))
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        grpc_port = config.server.grpc_port,
        storage = ?config.storage.backend,
        oauth_enabled = config.oauth.enabled,
        max_sessions_per_user = ?config.sessions.max_per_user,
        "Configuration loaded"
    );

    let (auth_service, membership): (Arc<dyn AuthServicePort>, Arc<dyn MembershipChecker>) =
        match config.storage.backend {
            StorageBackend::Postgres => {
                let pg_pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .connect(&config.database.url)
                    .await?;
                tracing::info!(
                    max_connections = config.database.max_connections,
                    database = "postgresql",
                    "Database connection pool created"
                );

                sqlx::migrate!("./migrations").run(&pg_pool).await?;
                tracing::info!(database = "postgresql", "Database migrations completed");

                (
                    build_auth_service(
                        Arc::new(PostgresUserRepository::new(pg_pool.clone())),
                        Arc::new(PostgresRefreshTokenStore::new(pg_pool.clone())),
                        &config,
                    )?,
                    Arc::new(PostgresMembershipChecker::new(pg_pool)) as Arc<dyn MembershipChecker>,
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; all state is lost on restart");
                (
                    build_auth_service(
                        Arc::new(InMemoryUserRepository::new()),
                        Arc::new(InMemoryRefreshTokenStore::new()),
                        &config,
                    )?,
                    Arc::new(InMemoryMembershipChecker::new()) as Arc<dyn MembershipChecker>,
                )
            }
        };

    let oauth = config.oauth.enabled.then(|| {
        let client: Arc<dyn OAuthProviderClient> =
            Arc::new(GoogleOAuthClient::new(config.provider_config()));
        OAuthState {
            client,
            state_secret: config.oauth.state_secret.as_bytes().to_vec(),
            frontend_url: config.oauth.frontend_url.trim_end_matches('/').to_string(),
            secure_cookies: config.oauth.callback_url.starts_with("https://"),
        }
    });

    let state = AppState {
        auth_service: Arc::clone(&auth_service),
        membership,
        exchange_codes: Arc::new(InMemoryExchangeCodeStore::new(Duration::from_secs(
            config.oauth.exchange_code_ttl_seconds,
        ))),
        oauth,
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(state);
    let http_server =
        tokio::spawn(async move { axum::serve(http_listener, http_application).await });

    let grpc_address = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_service = IdentityGrpcService::new(Arc::clone(&auth_service));
    tracing::info!(
        address = %grpc_address,
        port = config.server.grpc_port,
        protocol = "grpc",
        "gRpc server listening"
    );

    let grpc_server = tokio::spawn(async move {
        Server::builder()
            .add_service(IdentityServiceServer::new(grpc_service))
            .serve(grpc_address)
            .await
    });

    match tokio::try_join!(http_server, grpc_server) {
        Ok((_, _)) => tracing::info!("Servers exited successfully"),
        Err(e) => tracing::error!(error = %e, "Server error"),
    };

    Ok(())
}
