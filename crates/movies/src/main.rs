use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movies::config::Config;
use movies::storage::DynamoDbBackend;
use movies::MovieCatalog;
use movies_core::movie::{demo_movies, Movie, YearRange};
use movies_core::storage::{TableExistence, TableHandle};

/// Movies - Manage a DynamoDB table of movies keyed by year and title
#[derive(Parser, Debug)]
#[command(name = "movies")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Table to operate on
    #[arg(long, global = true, env = "MOVIES_TABLE_NAME")]
    table_name: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Pretty)]
    format: Format,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Pretty,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the demo movies, creating the table first if it is missing
    Demo,

    /// Create the movies table and wait until it is active
    CreateTable,

    /// Check whether the table exists
    Exists,

    /// Delete the table and wait until it is gone
    DeleteTable,

    /// List every table in the account and region
    ListTables,

    /// Add a movie, replacing any movie with the same year and title
    Put {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        title: String,
        #[arg(long)]
        plot: String,
        #[arg(long)]
        rating: Decimal,
    },

    /// Get a movie by year and title
    Get {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        title: String,
    },

    /// Set a movie's rating and plot
    Update {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        title: String,
        #[arg(long)]
        plot: String,
        #[arg(long)]
        rating: Decimal,
    },

    /// Delete a movie by year and title
    Delete {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        title: String,
    },

    /// Write many movies from a JSON array (the demo movies when no file is given)
    WriteBatch {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Get every movie released in a year
    Query {
        #[arg(long)]
        year: i32,
    },

    /// Find movies released between two years, inclusive
    Scan {
        #[arg(long)]
        start: i32,
        #[arg(long)]
        end: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movies=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(table_name) = cli.table_name {
        config = config.with_table_name(table_name);
    }
    tracing::debug!(endpoint = %config.target_display(), table = %config.table_name, "Configured");

    let backend = DynamoDbBackend::from_config(&config).await;
    let mut catalog = MovieCatalog::new(backend);
    let out = Output(cli.format);

    match cli.command.unwrap_or(Command::Demo) {
        Command::Demo => run_demo(&mut catalog, &config.table_name, out).await?,
        Command::CreateTable => {
            let handle = catalog.create_table(&config.table_name).await?;
            out.emit(handle, |h| format!("Created table {}", h.name));
        }
        Command::Exists => {
            let found = require_existence(&mut catalog, &config.table_name).await?;
            out.emit(
                &serde_json::json!({ "table": config.table_name, "exists": found }),
                |_| format!("Table {} exists: {}", config.table_name, found),
            );
        }
        Command::DeleteTable => {
            load_table(&mut catalog, &config.table_name).await?;
            catalog.delete_table().await?;
            out.emit(&TableHandle::new(&config.table_name), |h| {
                format!("Deleted table {}", h.name)
            });
        }
        Command::ListTables => {
            let tables = catalog.list_tables().await?;
            out.emit(&tables, |tables| {
                tables
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
        Command::Put {
            year,
            title,
            plot,
            rating,
        } => {
            load_table(&mut catalog, &config.table_name).await?;
            let movie = Movie::new(year, title, plot, rating);
            catalog.put_movie(&movie).await?;
            out.emit(&movie, |m| format!("Added {}", m.key()));
        }
        Command::Get { year, title } => {
            load_table(&mut catalog, &config.table_name).await?;
            let movie = catalog.get_movie(&title, year).await?;
            out.emit(&movie, |movie| match movie {
                Some(m) => describe_movie(m),
                None => format!("{} ({}) not found", title, year),
            });
        }
        Command::Update {
            year,
            title,
            plot,
            rating,
        } => {
            load_table(&mut catalog, &config.table_name).await?;
            let updated = catalog.update_movie(&title, year, rating, &plot).await?;
            out.emit(&updated, |u| {
                format!("Updated {} ({}): rating {}, plot: {}", title, year, u.rating, u.plot)
            });
        }
        Command::Delete { year, title } => {
            load_table(&mut catalog, &config.table_name).await?;
            catalog.delete_movie(&title, year).await?;
            out.emit(
                &serde_json::json!({ "year": year, "title": title, "deleted": true }),
                |_| format!("Deleted {} ({})", title, year),
            );
        }
        Command::WriteBatch { file } => {
            load_table(&mut catalog, &config.table_name).await?;
            let movies = match file {
                Some(path) => read_movies(&path)?,
                None => demo_movies(),
            };
            catalog.write_batch(&movies).await?;
            out.emit(
                &serde_json::json!({ "written": movies.len() }),
                |_| format!("Wrote {} movies", movies.len()),
            );
        }
        Command::Query { year } => {
            load_table(&mut catalog, &config.table_name).await?;
            let movies = catalog.query_movies(year).await?;
            out.emit(&movies, |movies| {
                movies.iter().map(describe_movie).collect::<Vec<_>>().join("\n")
            });
        }
        Command::Scan { start, end } => {
            load_table(&mut catalog, &config.table_name).await?;
            let range = YearRange::new(start, end)?;
            let movies = catalog.scan_movies(range).await?;
            out.emit(&movies, |movies| {
                movies
                    .iter()
                    .map(|m| format!("{} ({}) rated {}", m.title, m.year, m.rating))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
    }

    Ok(())
}

/// Writes the demo movies when the table exists, creates it otherwise.
async fn run_demo(
    catalog: &mut MovieCatalog<DynamoDbBackend>,
    table_name: &str,
    out: Output,
) -> Result<()> {
    if require_existence(catalog, table_name).await? {
        let movies = demo_movies();
        catalog.write_batch(&movies).await?;
        out.emit(&movies, |movies| {
            format!("Wrote {} demo movies to {}", movies.len(), table_name)
        });
    } else {
        let handle = catalog.create_table(table_name).await?;
        out.emit(handle, |h| format!("Created table {}", h.name));
    }
    Ok(())
}

/// Resolves whether the table exists, failing on anything but a clean answer.
async fn require_existence(
    catalog: &mut MovieCatalog<DynamoDbBackend>,
    table_name: &str,
) -> Result<bool> {
    match catalog.exists(table_name).await {
        TableExistence::Found => Ok(true),
        TableExistence::NotFound => Ok(false),
        TableExistence::Failed(err) => {
            Err(anyhow::Error::new(err).context(format!("Couldn't check for table {}", table_name)))
        }
    }
}

async fn load_table(catalog: &mut MovieCatalog<DynamoDbBackend>, table_name: &str) -> Result<()> {
    if !require_existence(catalog, table_name).await? {
        anyhow::bail!("Table {} does not exist; run `movies create-table` first", table_name);
    }
    Ok(())
}

fn read_movies(path: &Path) -> Result<Vec<Movie>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Couldn't read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Couldn't parse movies from {}", path.display()))
}

fn describe_movie(movie: &Movie) -> String {
    format!(
        "{} ({}) rated {}: {}",
        movie.title, movie.year, movie.info.rating, movie.info.plot
    )
}

#[derive(Debug, Clone, Copy)]
struct Output(Format);

impl Output {
    fn emit<T: Serialize + ?Sized>(&self, value: &T, pretty: impl FnOnce(&T) -> String) {
        match self.0 {
            Format::Json => match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{}", json),
                Err(err) => tracing::error!(error = %err, "Couldn't serialize output"),
            },
            Format::Pretty => println!("{}", pretty(value)),
        }
    }
}
