//! # Latent Assets CLI (`latent`)
//!
//! The `latent` binary drives the asset index: schema initialization,
//! ingestion of local image files, similarity queries, tag management, and
//! the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! latent --config ./config/latent.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `latent init` | Create the SQLite database and the vector collection |
//! | `latent add <files>... --tags "cat,pet"` | Ingest local image files |
//! | `latent query "<text>"` | Natural-language similarity search |
//! | `latent delete <path>` | Remove an asset by stored path |
//! | `latent tags <path> <tags>...` | Replace an asset's tags |
//! | `latent stats` | Show collection size and dimension |
//! | `latent serve` | Start the HTTP server |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use latent_assets::embedding::{Embedder, HttpEmbedder};
use latent_assets::models::Upload;
use latent_assets::storage::AssetStorage;
use latent_assets::store::{AssetStore, SqliteStore};
use latent_assets::{config, ingest, search, server};

/// Latent Assets — index images by multimodal embedding and search them
/// with natural language, optionally biased by tags.
#[derive(Parser)]
#[command(
    name = "latent",
    about = "Latent Assets — image indexing and tag-aware similarity search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/latent.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and the vector collection.
    ///
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Ingest local image files.
    Add {
        /// Image files to upload.
        files: Vec<PathBuf>,

        /// Comma-separated tags applied to every file in the batch.
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// Search indexed assets with a natural-language query.
    Query {
        /// The query text.
        text: String,

        /// Maximum number of results.
        #[arg(long)]
        top_k: Option<i64>,

        /// Prefer assets carrying this tag; remaining slots are backfilled
        /// by pure similarity.
        #[arg(long)]
        tag: Option<String>,
    },

    /// Delete an asset by its stored path.
    Delete {
        /// The path as returned by `query` (e.g. `data/assets/cat.jpg`).
        path: String,
    },

    /// Replace the tags on an asset.
    Tags {
        /// The asset's stored path.
        path: String,

        /// New tag set (replaces existing tags wholesale).
        tags: Vec<String>,
    },

    /// Show collection statistics.
    Stats,

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = SqliteStore::open(&config.db.path, config.embedding.dims).await?;
            store.ensure_collection().await?;
            store.close().await;
            println!("initialized {}", config.db.path.display());
        }

        Commands::Add { files, tags } => {
            if files.is_empty() {
                anyhow::bail!("no files given");
            }

            let mut uploads = Vec::with_capacity(files.len());
            for file in &files {
                let filename = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string());
                let bytes = std::fs::read(file)?;
                uploads.push(Upload { filename, bytes });
            }

            let store = SqliteStore::open(&config.db.path, config.embedding.dims).await?;
            store.ensure_collection().await?;
            let embedder = HttpEmbedder::new(&config.embedding)?;
            let storage = AssetStorage::new(&config.assets.dir)?;

            let report = ingest::ingest_batch(&store, &embedder, &storage, &uploads, &tags).await?;

            println!("add");
            println!("  added: {}", report.added);
            println!("  skipped: {}", report.skipped);
            for failure in &report.failures {
                println!("  failed: {} ({})", failure.filename, failure.reason);
            }
            store.close().await;
        }

        Commands::Query { text, top_k, tag } => {
            let store = SqliteStore::open(&config.db.path, config.embedding.dims).await?;
            store.ensure_collection().await?;
            let embedder = HttpEmbedder::new(&config.embedding)?;

            let top_k = top_k.unwrap_or(config.retrieval.default_top_k);
            let query_vector = embedder.embed_text(&text).await?;
            let hits = search::search(&store, &query_vector, top_k, tag.as_deref().unwrap_or(""))
                .await?;

            if hits.is_empty() {
                println!("No results.");
            }
            for (i, hit) in hits.iter().enumerate() {
                let marker = if hit.tag_match { "tag" } else { "sim" };
                println!("{}. [{}] {}", i + 1, marker, hit.path);
                if !hit.tags.is_empty() {
                    println!("    tags: {}", hit.tags.join(", "));
                }
            }
            store.close().await;
        }

        Commands::Delete { path } => {
            let store = SqliteStore::open(&config.db.path, config.embedding.dims).await?;
            store.ensure_collection().await?;
            let storage = AssetStorage::new(&config.assets.dir)?;

            let removed = store.delete_by_path(&path).await?;
            storage.delete(&path)?;
            println!("deleted {} record(s) for {}", removed, path);
            store.close().await;
        }

        Commands::Tags { path, tags } => {
            let store = SqliteStore::open(&config.db.path, config.embedding.dims).await?;
            store.ensure_collection().await?;

            let updated = store.update_tags(&path, &tags).await?;
            if updated {
                println!("updated tags for {}", path);
            } else {
                println!("no asset at {}", path);
            }
            store.close().await;
        }

        Commands::Stats => {
            let store = SqliteStore::open(&config.db.path, config.embedding.dims).await?;
            store.ensure_collection().await?;

            println!("assets: {}", store.count().await?);
            println!("dimension: {}", config.embedding.dims);
            store.close().await;
        }

        Commands::Serve => {
            server::run_server(&config).await?;
        }
    }

    Ok(())
}
