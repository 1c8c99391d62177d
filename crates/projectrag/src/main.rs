use anyhow::Result;
use clap::{Parser, Subcommand};
use projectrag_common::{logger, AppConfig};
use projectrag_server::AppState;
use std::path::PathBuf;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "projectrag")]
#[command(about = "ProjectRAG - grounded question answering over a project catalogue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        /// Project export (JSON array)
        #[arg(long)]
        projects: Option<PathBuf>,
    },

    /// Rebuild the vector index once and exit
    Index {
        /// Project export (JSON array)
        #[arg(long)]
        projects: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();
    let mut config = AppConfig::from_env()?;

    match cli.command {
        Some(Commands::Index { projects }) => {
            if let Some(path) = projects {
                config.projects_path = path;
            }

            logger::setup_console_logging(&config.log_level)?;
            tracing::info!("Indexing projects from {}", config.projects_path.display());

            let state = AppState::new(config).await?;
            let report = state.indexer.run().await?;

            println!(
                "Indexed {} projects ({} skipped)",
                report.processed, report.skipped
            );
        }
        command => {
            if let Some(Commands::Serve {
                host,
                port,
                projects,
            }) = command
            {
                if let Some(host) = host {
                    config.server_host = host;
                }
                if let Some(port) = port {
                    config.server_port = port;
                }
                if let Some(path) = projects {
                    config.projects_path = path;
                }
            }

            logger::setup_logging(&config.log_dir, &config.log_level)?;

            tracing::info!("ProjectRAG starting...");
            tracing::info!("Configuration loaded:");
            tracing::info!("  Bind: {}", config.server_bind_address());
            tracing::info!("  Projects: {}", config.projects_path.display());
            tracing::info!(
                "  Embedding: {} ({} dims)",
                config.embedding_model,
                config.embedding_dimension
            );
            tracing::info!("  Generation: {}", config.llm_model);

            println!("Server listening on http://{}", config.server_bind_address());

            projectrag_server::start_server(config).await?;
        }
    }

    Ok(())
}
