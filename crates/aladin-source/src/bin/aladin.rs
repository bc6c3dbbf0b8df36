//! Debug CLI for the aladin.co.kr metadata source.
//!
//! Runs the same identify/search/cover paths a host application would,
//! printing records as text or JSON. Logging follows `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use aladin_source::{
    AladinSource, Identifiers, LookupRequest, MemoryHost, MetadataRecord, SearchQuery,
    SourceConfig,
};

#[derive(Parser)]
#[command(name = "aladin", version, about = "Query aladin.co.kr for book metadata")]
struct Cli {
    /// TOML config file (SourceConfig fields, all optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override both search and detail timeouts (seconds)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a book query into ranked metadata records
    Identify {
        #[arg(long)]
        title: Option<String>,
        /// May be given multiple times, in contribution order
        #[arg(long = "author")]
        authors: Vec<String>,
        #[arg(long)]
        isbn: Option<String>,
        /// The origin's ItemId
        #[arg(long)]
        item_id: Option<String>,
        /// Print records as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Download a cover image
    Cover {
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        item_id: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "author")]
        authors: Vec<String>,
        /// Output file
        #[arg(long, default_value = "cover.jpg")]
        out: PathBuf,
    },
    /// Print candidate detail-page URLs without fetching details
    Search {
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "author")]
        authors: Vec<String>,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long, default_value_t = 5)]
        max: usize,
    },
}

fn load_config(cli: &Cli) -> Result<SourceConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            toml::from_str(&raw).map_err(|e| format!("bad config {}: {e}", path.display()))?
        }
        None => SourceConfig::default(),
    };
    if let Some(timeout) = cli.timeout {
        config.search_timeout_secs = timeout;
        config.detail_timeout_secs = timeout;
    }
    Ok(config)
}

fn request_from(
    title: Option<String>,
    authors: Vec<String>,
    isbn: Option<String>,
    item_id: Option<String>,
) -> LookupRequest {
    LookupRequest {
        title,
        authors,
        identifiers: Identifiers {
            isbn,
            item_id,
        },
    }
}

fn print_record(record: &MetadataRecord) {
    println!("[{}] {}", record.source_relevance, record.title);
    println!("  authors:   {}", record.authors.join(", "));
    if let Some(series) = &record.series {
        println!("  series:    {} #{}", series.name, series.index);
    }
    if let Some(isbn) = &record.identifiers.isbn {
        println!("  isbn:      {isbn}");
    }
    if let Some(item_id) = &record.identifiers.item_id {
        println!("  item id:   {item_id}");
    }
    if let Some(rating) = record.rating {
        println!("  rating:    {rating}");
    }
    if let Some(publisher) = &record.publisher {
        println!("  publisher: {publisher}");
    }
    if let Some(pubdate) = record.pubdate {
        println!("  pubdate:   {pubdate}");
    }
    if !record.tags.is_empty() {
        println!("  tags:      {}", record.tags.join(", "));
    }
    if let Some(language) = &record.language {
        println!("  language:  {language}");
    }
    if let Some(cover) = &record.cover_url {
        println!("  cover:     {cover}");
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(&cli)?;
    let source = AladinSource::with_collaborators(
        std::sync::Arc::new(aladin_source::HttpTransport::new()),
        std::sync::Arc::new(MemoryHost::new()),
        config,
    );
    let abort = CancellationToken::new();

    match cli.command {
        Command::Identify {
            title,
            authors,
            isbn,
            item_id,
            json,
        } => {
            let request = request_from(title, authors, isbn, item_id);
            let (tx, mut rx) = mpsc::unbounded_channel();
            source
                .identify(&request, tx, &abort)
                .await
                .map_err(|e| e.to_string())?;

            let mut records = Vec::new();
            while let Ok(record) = rx.try_recv() {
                records.push(record);
            }
            records.sort_by_key(|record| record.source_relevance);

            if json {
                let out =
                    serde_json::to_string_pretty(&records).map_err(|e| e.to_string())?;
                println!("{out}");
            } else if records.is_empty() {
                println!("no matches");
            } else {
                for record in &records {
                    print_record(record);
                }
            }
        }
        Command::Cover {
            isbn,
            item_id,
            title,
            authors,
            out,
        } => {
            let request = request_from(title, authors, isbn, item_id);
            match source
                .download_cover(&request, &abort)
                .await
                .map_err(|e| e.to_string())?
            {
                Some(cover) => {
                    std::fs::write(&out, &cover.bytes)
                        .map_err(|e| format!("cannot write {}: {e}", out.display()))?;
                    println!("wrote {} bytes to {}", cover.bytes.len(), out.display());
                }
                None => println!("no cover found"),
            }
        }
        Command::Search {
            title,
            authors,
            isbn,
            max,
        } => {
            let identifiers = Identifiers {
                isbn,
                item_id: None,
            };
            let query = SearchQuery::build(title.as_deref(), &authors, &identifiers)
                .map_err(|e| e.to_string())?;
            let candidates = source
                .search(&query, max)
                .await
                .map_err(|e| e.to_string())?;
            if candidates.is_empty() {
                println!("no candidates");
            }
            for candidate in candidates {
                println!("[{}] {}", candidate.rank, candidate.url);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
