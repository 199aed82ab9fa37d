//! learntrack CLI - browse learning projects and track completion.

mod config;

use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use learntrack_core::{Catalog, Category, ProjectQuery, SortBy};
use learntrack_progress::{export_file_name, ProgressStore};
use learntrack_storage::{JsonFileStorage, ProgressStorage};
use config::Config;

#[derive(Parser)]
#[command(name = "learntrack")]
#[command(about = "Browse learning projects and track your progress", long_about = None)]
struct Cli {
    /// Config file (default: ./learntrack.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the progress snapshot
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Catalog JSON file
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects
    List {
        /// Only this category (basic, intermediate, advanced)
        #[arg(long)]
        category: Option<Category>,
        /// Only projects with this tag
        #[arg(long)]
        tag: Option<String>,
        /// Search title, description and tags
        #[arg(long)]
        search: Option<String>,
        /// Ordering
        #[arg(long, value_enum, default_value = "difficulty")]
        sort: SortArg,
    },
    /// Toggle completion of a project
    Toggle {
        /// Project ID
        id: String,
    },
    /// Set notes on a project; omit the text to clear them
    Note {
        /// Project ID
        id: String,
        /// Note text
        text: Option<String>,
    },
    /// Show progress
    Status,
    /// Export progress as JSON
    Export {
        /// Output file, `-` for stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import progress from an exported JSON file
    Import {
        /// File to import
        path: PathBuf,
    },
    /// Erase all progress
    Reset {
        /// Confirm; this cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// List community showcases
    Showcases {
        /// Only featured showcases
        #[arg(long)]
        featured: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Difficulty,
    None,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Difficulty => SortBy::Difficulty,
            SortArg::None => SortBy::None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog = catalog;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(?config, "configuration loaded");

    let storage = JsonFileStorage::new(&config.data_dir)
        .await
        .with_context(|| format!("failed to open {}", config.data_dir.display()))?;
    let mut store = ProgressStore::open(storage).await;

    match cli.command {
        Commands::List { category, tag, search, sort } => {
            let catalog = load_catalog(&config.catalog).await?;
            let query = ProjectQuery {
                category,
                tag,
                search,
                sort: sort.into(),
            };
            let projects = query.apply(&catalog.projects);

            println!("Projects ({})", projects.len());
            for project in projects {
                println!("  [{}] {} | {} | {} | {}",
                    if store.is_completed(project.id.as_str()) { "x" } else { " " },
                    project.id,
                    project.category.as_str(),
                    "*".repeat(project.difficulty as usize),
                    project.title,
                );
            }
        }
        Commands::Toggle { id } => {
            warn_if_unknown(&config.catalog, &id).await;
            store.toggle_completion(&id).await;
            ensure_saved(&store)?;
            if store.is_completed(&id) {
                println!("Completed: {id}");
            } else {
                println!("Not completed: {id}");
            }
        }
        Commands::Note { id, text } => {
            warn_if_unknown(&config.catalog, &id).await;
            store.set_notes(&id, text).await;
            ensure_saved(&store)?;
            match store.notes(&id) {
                Some(notes) => println!("Notes for {id}: {notes}"),
                None => println!("Cleared notes for {id}"),
            }
        }
        Commands::Status => {
            let catalog = load_catalog(&config.catalog).await?;
            let stats = store.stats(catalog.len());

            println!("Progress: {}%", stats.percentage);
            println!("  Completed {}/{} projects", stats.completed, stats.total);
            if let Some(updated) = stats.last_updated {
                println!("  Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            for id in store.completed_ids() {
                let title = catalog.project(id.as_str()).map_or("(not in catalog)", |p| p.title.as_str());
                println!("  [x] {id} - {title}");
            }
        }
        Commands::Export { output } => {
            let text = store.export_snapshot();
            match output {
                Some(path) if path.as_os_str() == "-" => println!("{text}"),
                output => {
                    let path = output.unwrap_or_else(|| {
                        PathBuf::from(export_file_name(chrono::Local::now().date_naive()))
                    });
                    tokio::fs::write(&path, format!("{text}\n"))
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported progress to {}", path.display());
                }
            }
        }
        Commands::Import { path } => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            if let Err(e) = store.try_import_snapshot(&text).await {
                bail!("import failed, check the file format: {e}");
            }
            ensure_saved(&store)?;
            println!("Imported progress: {} completed", store.completed_count());
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("reset erases all progress and cannot be undone; rerun with --yes");
            }
            store.reset().await;
            ensure_saved(&store)?;
            println!("Progress reset");
        }
        Commands::Showcases { featured } => {
            let catalog = load_catalog(&config.catalog).await?;
            let showcases: Vec<_> = if featured {
                catalog.featured_showcases().collect()
            } else {
                catalog.showcases.iter().collect()
            };

            println!("Showcases ({})", showcases.len());
            for showcase in showcases {
                println!("  {} | {} | by {} | {} likes | {} comments",
                    showcase.id,
                    showcase.title,
                    showcase.author,
                    showcase.likes,
                    showcase.comment_count(),
                );
            }
        }
    }

    Ok(())
}

async fn load_catalog(path: &Path) -> Result<Catalog> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    Catalog::from_json(&raw).with_context(|| format!("invalid catalog {}", path.display()))
}

/// Ids are not validated against the catalog; only tell the user.
async fn warn_if_unknown(path: &Path, id: &str) {
    match load_catalog(path).await {
        Ok(catalog) if catalog.project(id).is_none() => {
            eprintln!("note: {id} is not in the catalog, tracking it anyway");
        }
        Ok(_) => {}
        Err(e) => debug!(error = %e, "catalog unavailable, skipping id check"),
    }
}

fn ensure_saved<S: ProgressStorage>(store: &ProgressStore<S>) -> Result<()> {
    if !store.is_durable() {
        warn!(key = store.storage().key(), "progress change was not saved");
        bail!("progress could not be saved to disk");
    }
    Ok(())
}
