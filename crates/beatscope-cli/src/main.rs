mod collect;
mod context;
mod extract;
mod insights;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "beatscope-cli")]
#[command(about = "beatscope command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance commands.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run one collection cycle and print its report.
    Collect {
        /// Use an in-memory store instead of Postgres; results are printed
        /// and then discarded.
        #[arg(long)]
        memory: bool,
    },
    /// Print the entities extracted from a single video title.
    Extract {
        title: String,
        /// Seed term; titles that do not contain it yield nothing.
        #[arg(long)]
        seed: Option<String>,
    },
    /// Print trend predictions as JSON.
    Insights {
        /// Collect into an in-memory store first, then predict from it.
        #[arg(long)]
        memory: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => run_db(command).await?,
        Some(Commands::Collect { memory }) => collect::run_collect(memory).await?,
        Some(Commands::Extract { title, seed }) => extract::run_extract(&title, seed.as_deref())?,
        Some(Commands::Insights { memory }) => insights::run_insights(memory).await?,
        None => println!("beatscope-cli: try `--help`"),
    }

    Ok(())
}

async fn run_db(command: DbCommands) -> anyhow::Result<()> {
    let config = beatscope_core::load_app_config()?;
    let pool = beatscope_db::connect(&config).await?;
    match command {
        DbCommands::Ping => {
            beatscope_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            match beatscope_db::migrate(&pool).await? {
                Some(version) => println!("schema at version {version}"),
                None => println!("no migrations embedded"),
            }
        }
    }
    Ok(())
}
