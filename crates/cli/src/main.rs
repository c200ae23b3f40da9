//! coursefinder CLI - semantic search over a course catalog

use anyhow::Result;
use clap::{Parser, Subcommand};
use finder_core::Config;
use std::path::PathBuf;

mod commands;
mod format;
mod logging;

use commands::{
  cmd_config_init, cmd_config_show, cmd_courses, cmd_filters, cmd_preload, cmd_search, cmd_suggestions,
};
use logging::init_cli_logging;

#[derive(Parser, Debug)]
#[command(name = "coursefinder")]
#[command(about = "Semantic search over a course catalog")]
#[command(after_help = "\
QUICK START:
  coursefinder config init              # Write ./coursefinder.toml
  coursefinder preload                  # Embed the catalog once
  coursefinder search \"data science\"    # Find matching courses

ENVIRONMENT:
  USE_OPENAI_EMBEDDING=true             # Use the OpenAI embeddings API
  OPENAI_API_KEY=sk-...                 # API key for the openai provider
  COURSEFINDER_CATALOG=path.json        # Catalog file
  RUST_LOG=debug                        # Log filter (overrides logging.level)")]
struct Cli {
  /// Config file (default: ./coursefinder.toml, then the user config)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Catalog JSON file (overrides catalog.path)
  #[arg(long, global = true, value_name = "FILE")]
  catalog: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

/// Subcommands for `coursefinder config`
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommand {
  /// Show current effective configuration
  Show,
  /// Write a default config file
  Init {
    /// Write to the user config path instead of ./coursefinder.toml
    #[arg(long)]
    user: bool,
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
  },
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
  /// Search the catalog with a free-text query
  #[command(after_help = "\
EXAMPLES:
  coursefinder search \"intro to machine learning\"
  coursefinder search marketing --limit 3
  coursefinder search \"lab safety\" --json")]
  Search {
    /// Search query
    query: String,
    /// Maximum number of courses (default: search.max_results)
    #[arg(short, long)]
    limit: Option<usize>,
    /// Minimum cosine similarity (default: search.min_similarity)
    #[arg(long)]
    min_similarity: Option<f64>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
  /// Load the catalog and build corpus embeddings
  Preload,
  /// List catalog courses
  Courses {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
  /// Show distinct department, level, domain and type values
  Filters {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
  /// Show up to four suggested searches
  Suggestions {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
  /// Manage configuration
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let log_level = init_cli_logging();

  let mut config = Config::load(cli.config.as_deref())?;
  if let Some(catalog) = cli.catalog {
    config.catalog.path = catalog;
  }
  log_level.set(&config.logging.level);

  match cli.command {
    Commands::Search {
      query,
      limit,
      min_similarity,
      json,
    } => {
      if let Some(limit) = limit {
        config.search.max_results = limit;
      }
      if let Some(min_similarity) = min_similarity {
        config.search.min_similarity = min_similarity;
      }
      cmd_search(&config, &query, json).await
    }
    Commands::Preload => cmd_preload(&config).await,
    Commands::Courses { json } => cmd_courses(&config, json).await,
    Commands::Filters { json } => cmd_filters(&config, json).await,
    Commands::Suggestions { json } => cmd_suggestions(&config, json).await,
    Commands::Config { command } => match command {
      ConfigCommand::Show => cmd_config_show(&config, cli.config.as_deref()),
      ConfigCommand::Init { user, force } => cmd_config_init(user, force),
    },
  }
}
