//! CLI entry point for cms-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cms-blog")]
#[command(version)]
#[command(about = "A blog front end for a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
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
    /// Initialize a new blog with sample content
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Keep regenerating every `revalidate_secs`
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a server that renders pages on request
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder
    Clean,

    /// List posts from the content source
    List,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "cms_blog=debug,info"
    } else {
        "cms_blog=info"
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
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            cms_blog::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::Generate { watch } => {
            let blog = cms_blog::Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");

            blog.generate().await?;
            println!("Generated successfully!");

            if watch {
                cms_blog::commands::generate::watch(&blog).await?;
            }
        }

        Commands::Server { port, ip, open } => {
            let blog = cms_blog::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            cms_blog::server::start(&blog, &ip, port, open).await?;
        }

        Commands::Clean => {
            tracing::info!("Cleaning public folder...");
            cms_blog::commands::clean::run_in(&base_dir)?;
            println!("Cleaned successfully!");
        }

        Commands::List => {
            let blog = cms_blog::Blog::new(&base_dir)?;
            cms_blog::commands::list::run(&blog).await?;
        }

        Commands::Version => {
            println!("cms-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
