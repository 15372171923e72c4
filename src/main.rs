//! Storefront application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Select the store backend and check connectivity
//! 3. Build the router: static assets, session pipeline, route groups
//! 4. Start Axum server
//!
//! Also supports the `adduser` subcommand for creating accounts.

use std::process::ExitCode;
use std::sync::Arc;
use storefront::{
    auth::{self, AppState},
    config::Config,
    routes,
    storage::Backend,
};

fn print_adduser_usage() {
    eprintln!("Usage: storefront adduser <username> <password> [email]");
    eprintln!();
    eprintln!("Create a user in the store named by DATABASE_URL.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  storefront adduser alice 'correct horse battery staple' alice@example.com");
}

async fn adduser(config: &Config, args: &[String]) -> ExitCode {
    if args.len() < 2 || args.len() > 3 {
        print_adduser_usage();
        return ExitCode::FAILURE;
    }

    let backend = match Backend::open(&config.database_url) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if matches!(backend, Backend::Memory) {
        eprintln!("Error: adduser needs a persistent DATABASE_URL");
        return ExitCode::FAILURE;
    }

    let (users, _) = backend.stores(config.store_timeout());
    match auth::register(users.as_ref(), &args[0], &args[1], args.get(2).cloned()).await {
        Ok(user) => {
            println!("{}", user.id);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error creating user: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,storefront=debug")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("adduser") {
        return adduser(&config, &args[1..]).await;
    }

    tracing::info!(?config, "Starting storefront on {}", config.bind_addr);

    let backend = match Backend::open(&config.database_url) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!(error = %e, "Invalid database URL");
            return ExitCode::FAILURE;
        }
    };
    if matches!(backend, Backend::Memory) {
        tracing::warn!("Using in-memory stores; sessions and users are lost on restart");
    }

    // Requests degrade to in-memory sessions while the store is down.
    match backend.ping(config.store_timeout()).await {
        Ok(()) => tracing::info!("Store connection verified"),
        Err(e) => tracing::error!(error = %e, "Store unreachable, serving in degraded mode"),
    }

    // Build the timing dummy hash before the first login needs it.
    if let Err(e) = tokio::task::spawn_blocking(auth::password::dummy_hash).await {
        tracing::warn!(error = %e, "Could not prepare dummy password hash");
    }

    let (users, sessions) = backend.stores(config.store_timeout());
    let bind_addr = config.bind_addr;
    let state = AppState {
        users,
        sessions,
        config: Arc::new(config),
    };

    let app = routes::app(state, routes::default_groups());

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %bind_addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Listening on {}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
