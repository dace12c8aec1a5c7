//! CLI entry point for techblog

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techblog::commands;
use techblog::Blog;

#[derive(Parser)]
#[command(name = "techblog")]
#[command(version)]
#[command(about = "A personal technology blog: browse, search, generate and serve posts", long_about = None)]
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
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new markdown post
    New {
        /// Title of the new post
        title: String,

        /// Comma separated tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// List posts or tags
    List {
        /// What to list (post, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Show one post by key or id
    Show {
        key: String,
    },

    /// Search posts by title or excerpt, optionally within a tag
    Search {
        /// Search term; empty matches every post
        #[arg(default_value = "")]
        term: String,

        /// Only posts carrying this tag
        #[arg(short, long, default_value = "")]
        tag: String,
    },

    /// Show the featured posts
    Featured {
        /// Number of posts (defaults to `featured_count` from the config)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "techblog=debug,info"
    } else {
        "techblog=info"
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
            commands::init::init_site(&target_dir)?;
            println!("Initialized empty blog in {:?}", target_dir);
        }

        Commands::New { title, tags } => {
            let blog = Blog::new(&base_dir)?;
            let path = commands::new::create_post(&blog, &title, &tags)?;
            println!("Created: {}", path.display());
        }

        Commands::List { r#type } => {
            let blog = Blog::new(&base_dir)?;
            let store = blog.load_store().await?;
            print!("{}", commands::list::render(&store, &r#type, Utc::now())?);
        }

        Commands::Show { key } => {
            let blog = Blog::new(&base_dir)?;
            let store = blog.load_store().await?;
            print!("{}", commands::show::render(&store, &key)?);
        }

        Commands::Search { term, tag } => {
            let blog = Blog::new(&base_dir)?;
            let store = blog.load_store().await?;
            print!("{}", commands::search::render(&store, &term, &tag, Utc::now()));
        }

        Commands::Featured { count } => {
            let blog = Blog::new(&base_dir)?;
            let count = count.unwrap_or(blog.config.featured_count);
            let store = blog.load_store().await?;
            print!("{}", commands::featured::render(&store, count, Utc::now()));
        }

        Commands::Generate => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");
            let stats = blog.generate().await?;
            println!(
                "Generated {} files ({} posts, {} tags)",
                stats.files, stats.posts, stats.tags
            );
        }

        Commands::Server { port, ip } => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            techblog::server::start(&blog, &ip, port).await?;
        }

        Commands::Clean => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("techblog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
