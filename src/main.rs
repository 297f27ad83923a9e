use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use log::info;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};

use foodgram::{
    actions::import_products,
    api,
    config::Config,
    form::{read_products_csv, ProductForm},
    jwt::JwtKeys,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Foodgram recipe backend")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations, then serve the API
    Serve {
        /// Overrides FOODGRAM_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending migrations and exit
    Migrate,
    /// Import products from a `.csv` of `name,measurement_unit` rows or a JSON array of
    /// `{name, measurement_unit}`
    LoadProducts { file: PathBuf },
}

async fn connect(config: &Config) -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    Ok(pool)
}

async fn migrate(pool: &Pool<Postgres>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;

    info!("Migrations applied");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn serve(config: &Config, port: Option<u16>) -> Result<()> {
    let pool = connect(config).await?;
    migrate(&pool).await?;

    let keys = JwtKeys::new(config.jwt_secret.as_bytes(), config.token_lifetime_hours)?;
    let ctx = api::Context::new(pool, keys);

    let address = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));
    let (address, server) = warp::serve(api::routes(&ctx))
        .try_bind_with_graceful_shutdown(address, shutdown_signal())
        .context("Failed to bind the listener")?;

    info!("Server running on {address}");
    server.await;
    info!("Server stopped");

    Ok(())
}

async fn load_products(config: &Config, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let products: Vec<ProductForm> = match file.extension().and_then(|e| e.to_str()) {
        Some("csv") => read_products_csv(content.as_bytes())?,
        _ => serde_json::from_str(&content).context("Expected a JSON array of products")?,
    };

    let pool = connect(config).await?;
    let inserted = import_products(&products, &pool).await?;

    info!(
        "Imported {inserted} of {} products from {}",
        products.len(),
        file.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load()?;

    match args.command {
        Command::Serve { port } => serve(&config, port).await,
        Command::Migrate => {
            let pool = connect(&config).await?;
            migrate(&pool).await
        }
        Command::LoadProducts { file } => load_products(&config, &file).await,
    }
}
