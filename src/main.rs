//! CLI entry point for khaudum-site

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "khaudum-site")]
#[command(version)]
#[command(about = "Content-managed website for the Khaudum conservancies", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Initialize a new site directory
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// List site content
    List {
        /// Type of content to list (pages, articles)
        #[arg(default_value = "pages")]
        r#type: String,
    },

    /// Report stored uploads no page refers to
    Orphans,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "khaudum_site=debug,tower_http=debug,info"
    } else {
        "khaudum_site=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = khaudum_site::Site::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            site.serve(&ip, port).await?;
        }

        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            khaudum_site::Site::new(&target_dir)?.init()?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::List { r#type } => {
            let site = khaudum_site::Site::new(&base_dir)?;
            khaudum_site::commands::list::run(&site, &r#type).await?;
        }

        Commands::Orphans => {
            let site = khaudum_site::Site::new(&base_dir)?;
            khaudum_site::commands::orphans::run(&site).await?;
        }

        Commands::Version => {
            println!("khaudum-site version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
