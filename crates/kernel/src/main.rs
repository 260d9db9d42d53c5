//! Oglas classifieds server.

use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use oglas_kernel::models::NewUser;
use oglas_kernel::store::{PgStore, Store, UserStore};
use oglas_kernel::{AppState, Config, db, routes};

/// Oglas classifieds backend.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Register a user (requires DATABASE_URL).
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },

    /// Issue an API token for an existing user (requires DATABASE_URL).
    IssueToken {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateUser {
            email,
            first_name,
            last_name,
        } => {
            let store = pg_store(&config).await?;
            let input = NewUser {
                email,
                first_name,
                last_name,
                ..Default::default()
            };
            match store.create_user(input).await? {
                Some(user) => println!("{}", user.id),
                None => bail!("a user with that email already exists"),
            }
            Ok(())
        }
        Command::IssueToken { email } => {
            let store = pg_store(&config).await?;
            let user = store
                .find_user_by_email(&email)
                .await?
                .with_context(|| format!("no user with email {email}"))?;
            let token = store.issue_token(user.id).await?;
            info!(user_id = %user.id, "issued API token");
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Oglas kernel");
    info!(port = config.port, site_url = %config.site_url, "Configuration loaded");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;
    info!(backend = state.store().backend(), "Store ready");

    let app = routes::app(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn pg_store(config: &Config) -> Result<PgStore> {
    let Some(url) = &config.database_url else {
        bail!("DATABASE_URL must be set for this command");
    };
    let pool = db::create_pool(url, config.database_max_connections).await?;
    Ok(PgStore::new(pool))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
