use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use story_parser::config::Settings;
use story_parser::parser::title;
use story_parser::{fetch, parse_document_with, store, Document, ParseOptions};

#[derive(Parser)]
#[command(name = "story_parser", about = "Word-processor story export → structured JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one exported HTML file
    Parse {
        input: PathBuf,
        /// Output JSON path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Download an export by URL and parse it
    Fetch {
        url: String,
        /// Output JSON path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse every .html/.htm file in a directory, one <slug>.json each
    Batch {
        dir: PathBuf,
        /// Output directory (default: STORY_OUTPUT_DIR or ./out)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the slug for a title
    Slug { title: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load settings")?;
    let options = settings.parse_options();

    let result = match cli.command {
        Commands::Parse { input, output } => {
            let raw = store::read_export(&input)?;
            let doc = parse_one(&raw, &options, None);
            emit(&doc, output.as_deref(), settings.pretty)
        }
        Commands::Fetch { url, output } => {
            let raw = fetch::fetch_export(&url).await?;
            let doc = parse_one(&raw, &options, None);
            emit(&doc, output.as_deref(), settings.pretty)
        }
        Commands::Batch { dir, out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| settings.output_dir.clone());
            let files = store::export_files(&dir)?;
            if files.is_empty() {
                println!("No .html exports in {}", dir.display());
                return Ok(());
            }
            println!("Parsing {} exports into {}...", files.len(), out_dir.display());
            let counts = parse_batch(&files, &out_dir, &options, settings.pretty)?;
            counts.print();
            Ok(())
        }
        Commands::Slug { title: text } => {
            println!("{}", title::slug_for(Some(text.as_str())));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Parse and fill in a synthetic title when the export has none. `stem`
/// (the input file name) keeps batch slugs unique.
fn parse_one(raw: &str, options: &ParseOptions, stem: Option<&str>) -> Document {
    let mut doc = parse_document_with(raw, options).document;
    if doc.title.is_none() {
        let now = Utc::now();
        doc.title = Some(title::synthetic_title(now));
        if let Some(slug) = stem.map(title::slugify).filter(|s| !s.is_empty()) {
            doc.slug = slug;
        }
    }
    doc
}

fn emit(doc: &Document, output: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            store::write_document(doc, path, pretty)?;
            println!(
                "Wrote {} ({} blocks) to {}",
                doc.slug,
                doc.paragraphs.len(),
                path.display()
            );
        }
        None => println!("{}", store::to_json(doc, pretty)?),
    }
    Ok(())
}

struct BatchCounts {
    ok: usize,
    errors: usize,
    blocks: usize,
}

impl BatchCounts {
    fn print(&self) {
        println!(
            "Done: {} parsed ({} blocks), {} errors.",
            self.ok, self.blocks, self.errors
        );
    }
}

fn parse_batch(
    files: &[PathBuf],
    out_dir: &Path,
    options: &ParseOptions,
    pretty: bool,
) -> anyhow::Result<BatchCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let results: Vec<story_parser::Result<usize>> = files
        .par_iter()
        .map(|path| {
            let result = parse_file(path, out_dir, options, pretty);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    let mut counts = BatchCounts {
        ok: 0,
        errors: 0,
        blocks: 0,
    };
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(blocks) => {
                counts.ok += 1;
                counts.blocks += blocks;
            }
            Err(e) => {
                counts.errors += 1;
                warn!("{}: {}", path.display(), e);
            }
        }
    }
    info!(ok = counts.ok, errors = counts.errors, "batch finished");
    Ok(counts)
}

fn parse_file(
    path: &Path,
    out_dir: &Path,
    options: &ParseOptions,
    pretty: bool,
) -> story_parser::Result<usize> {
    let raw = store::read_export(path)?;
    let stem = path.file_stem().and_then(|s| s.to_str());
    let doc = parse_one(&raw, options, stem);
    store::write_document(&doc, &out_dir.join(format!("{}.json", doc.slug)), pretty)?;
    Ok(doc.paragraphs.len())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
