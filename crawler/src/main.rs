use anyhow::{bail, Context, Result};
use clap::Parser;
use crawler::{CrawlArgs, Crawler};
use search_core::WebPage;
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl sites from seed URLs and write the pages as JSONL")]
struct Cli {
    /// Seed URLs
    urls: Vec<String>,
    /// File with more seed URLs (one per line, '#' for comments)
    #[arg(long)]
    seeds: Option<String>,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/crawl.jsonl")]
    output: String,
    #[command(flatten)]
    crawl: CrawlArgs,
}

#[derive(Serialize)]
struct OutDoc<'a> {
    id: String,
    #[serde(flatten)]
    page: &'a WebPage,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let mut seeds = args.urls.clone();
    if let Some(path) = &args.seeds {
        seeds.extend(read_seed_file(Path::new(path))?);
    }
    if seeds.is_empty() {
        bail!("no seeds given");
    }

    let config = args.crawl.into_config(&seeds);
    tracing::info!(seeds = seeds.len(), domains = ?config.allowed_domains, output = %args.output, "crawler starting");
    let crawler = Crawler::http(config)?;
    let pages = crawler.crawl(&seeds).await?;

    write_jsonl(Path::new(&args.output), &pages)?;

    tracing::info!(pages = pages.len(), output = %args.output, "done");
    Ok(())
}

/// One `{id: sha1(url), ...page}` line per page. Missing parent directories
/// are created.
fn write_jsonl(path: &Path, pages: &[WebPage]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for page in pages {
        let mut hasher = Sha1::new();
        hasher.update(page.url.as_bytes());
        let rec = OutDoc { id: format!("{:x}", hasher.finalize()), page };
        serde_json::to_writer(&mut out, &rec)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Bare hosts get an `https://` scheme; anything else is passed through and
/// validated by the crawl.
fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening seeds file {}", path.display()))?;
    let mut seeds = Vec::new();
    for line in BufReader::new(file).lines() {
        let s = line?.trim().to_string();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        seeds.push(if s.contains("://") { s } else { format!("https://{s}") });
    }
    Ok(seeds)
}
