mod collect;
mod list;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mentions-cli")]
#[command(about = "Social mention tracker command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Fetch every configured source and upsert the results.
    Collect,
    /// Fetch and print the merged feed as JSON without touching the database.
    Live {
        /// Comma-separated topics; defaults to the tracking file topics.
        #[arg(long, value_delimiter = ',')]
        topics: Vec<String>,
        /// Comma-separated source ids; defaults to the tracking file sources.
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
    },
    /// Print stored mentions, newest first.
    List {
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = mentions_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr so `live` output stays pipeable JSON.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Migrate) => {
            let pool = mentions_db::connect_pool_from_config(&config).await?;
            let applied = mentions_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
        }
        Some(Commands::Collect) => {
            let pool = mentions_db::connect_pool_from_config(&config).await?;
            collect::run_collect(&pool, &config).await?;
        }
        Some(Commands::Live { topics, sources }) => {
            collect::run_live(&config, &topics, &sources).await?;
        }
        Some(Commands::List {
            platform,
            topic,
            limit,
            offset,
        }) => {
            let pool = mentions_db::connect_pool_from_config(&config).await?;
            let filters = mentions_db::MentionFilters {
                platform,
                topic,
                limit: limit.clamp(1, 200),
                offset: offset.max(0),
            };
            list::run_list(&pool, &filters).await?;
        }
        None => println!("mentions-cli: run with --help to see commands"),
    }

    Ok(())
}
