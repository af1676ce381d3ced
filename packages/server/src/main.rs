use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use foodgram_server::config::AppConfig;
use foodgram_server::state::AppState;
use foodgram_server::{build_router, database, seed};

#[derive(Parser, Debug)]
#[command(name = "foodgram-server")]
#[command(about = "Recipe sharing backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Load an ingredient catalog and exit. Accepts headerless
    /// `name,measurement_unit` CSV or a JSON array of objects.
    LoadIngredients {
        /// Path to the catalog file.
        path: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::LoadIngredients { path } => {
            let added = seed::load_ingredients_file(&db, &path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()))?;
            info!("Catalog {} loaded, {} new ingredients", path.display(), added);
            Ok(())
        }
        Command::Serve => {
            if let Some(ref path) = config.seed.ingredients_path {
                seed::load_ingredients_file(&db, path)
                    .await
                    .with_context(|| format!("Failed to load {}", path))?;
            }

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let state = AppState { db, config };
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Server running at http://{}", addr);
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}
