use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use credential_backend::application::auth_service::AuthService;
use credential_backend::data;
use credential_backend::infrastructure::config::{AppConfig, StartupError};
use credential_backend::infrastructure::logging::init_logging;
use credential_backend::infrastructure::security::Argon2Hasher;
use credential_backend::presentation::handlers::AppState;
use credential_backend::presentation::middleware::RequestTracing;
use credential_backend::presentation::routes;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the environment too; fall back to defaults.
            init_logging(Default::default());
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(store = %config.store, "Connecting to credential store");
    let user_repository = data::connect(&config.store)
        .await
        .map_err(StartupError::from)?;
    info!(store = %config.store, "Credential store connected");

    let hasher = Argon2Hasher::new(config.hash).map_err(|e| StartupError::Hasher(e.to_string()))?;
    let auth_service = AuthService::new(user_repository, Arc::new(hasher));
    let state = web::Data::new(AppState { auth_service });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(RequestTracing)
            .configure(routes::configure)
    });

    let bind_addr = format!("{}:{}", config.host, config.port);
    let server = server.bind((config.host.as_str(), config.port))?;
    info!(
        address = %bind_addr,
        routes = %"GET /, POST /register, POST /login",
        "Starting HTTP server"
    );
    server.run().await?;
    Ok(())
}
