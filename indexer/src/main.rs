use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crawler::CrawlArgs;
use indexer::{load_pages, SiteSearch, SiteStats};
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Crawl a website and search it with a TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl seed URLs, index the pages and print statistics
    Crawl {
        /// Seed URLs
        #[arg(required = true)]
        urls: Vec<String>,
        /// Also write the crawled pages as JSONL
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        crawl: CrawlArgs,
    },
    /// Search pages previously written by a crawl
    Search {
        #[command(flatten)]
        source: Source,
        /// Query text
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long, default_value_t = 10)]
        max_results: usize,
        /// Disable typo correction
        #[arg(long, default_value_t = false)]
        no_fuzzy: bool,
    },
    /// Print index statistics
    Stats {
        #[command(flatten)]
        source: Source,
    },
    /// Write index statistics to a text file
    Export {
        #[command(flatten)]
        source: Source,
        /// Output file (defaults to search_index_<unix time>.txt)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Read `search <query>`, `stats` and `exit` commands from stdin
    Interactive {
        #[command(flatten)]
        source: Source,
    },
}

#[derive(Args)]
struct Source {
    /// JSONL file or directory of JSONL files with crawled pages
    #[arg(long)]
    pages: PathBuf,
}

impl Source {
    fn open(&self) -> Result<SiteSearch> {
        let pages = load_pages(&self.pages)?;
        if pages.is_empty() {
            bail!("no pages found in {}", self.pages.display());
        }
        let mut site = SiteSearch::new();
        site.index_pages(pages);
        Ok(site)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl { urls, output, crawl } => crawl_and_index(urls, output, crawl).await,
        Commands::Search { source, query, max_results, no_fuzzy } => {
            let site = source.open()?;
            print_results(&site, &query.join(" "), max_results, !no_fuzzy);
            Ok(())
        }
        Commands::Stats { source } => {
            print_stats(&mut io::stdout().lock(), &source.open()?.stats())?;
            Ok(())
        }
        Commands::Export { source, file } => {
            let site = source.open()?;
            let file = file.unwrap_or_else(|| {
                PathBuf::from(format!("search_index_{}.txt", time::OffsetDateTime::now_utc().unix_timestamp()))
            });
            let mut out = BufWriter::new(File::create(&file).with_context(|| format!("creating {}", file.display()))?);
            print_stats(&mut out, &site.stats())?;
            out.flush()?;
            println!("Stats exported to {}", file.display());
            Ok(())
        }
        Commands::Interactive { source } => interactive(&source.open()?),
    }
}

async fn crawl_and_index(urls: Vec<String>, output: Option<PathBuf>, args: CrawlArgs) -> Result<()> {
    let config = args.into_config(&urls);
    let pages = crawler::Crawler::http(config)?.crawl(&urls).await?;
    if pages.is_empty() {
        tracing::warn!(seeds = urls.len(), "crawl produced no pages");
    }

    if let Some(path) = &output {
        let mut out = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
        for page in &pages {
            serde_json::to_writer(&mut out, page)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        tracing::info!(pages = pages.len(), output = %path.display(), "pages written");
    }

    let mut site = SiteSearch::new();
    site.index_pages(pages);
    print_stats(&mut io::stdout().lock(), &site.stats())?;
    Ok(())
}

fn print_results(site: &SiteSearch, query: &str, max_results: usize, fuzzy: bool) {
    let results = site.search(query, max_results, fuzzy);
    if results.is_empty() {
        println!("No results for \"{query}\"");
        if fuzzy {
            let suggestions = site.suggestions(query);
            if !suggestions.is_empty() {
                println!("Did you mean: {}", suggestions.join(", "));
            }
        }
        return;
    }
    for (i, hit) in results.iter().enumerate() {
        println!("{}. {}", i + 1, hit.page.title);
        println!("   {}", hit.page.url);
        println!("   score {:.4}, {} matches", hit.score, hit.match_count);
        if !hit.corrections.is_empty() {
            let fixes: Vec<String> = hit.corrections.iter().map(|(from, to)| format!("{from} -> {to}")).collect();
            println!("   corrected: {}", fixes.join(", "));
        }
        println!("   {}", hit.snippet);
    }
}

fn print_stats(out: &mut impl Write, stats: &SiteStats) -> Result<()> {
    writeln!(out, "total_documents: {}", stats.total_documents)?;
    writeln!(out, "total_terms: {}", stats.total_terms)?;
    writeln!(out, "average_terms_per_document: {}", stats.average_terms_per_document)?;
    writeln!(out, "indexed_pages: {}", stats.indexed_pages)?;
    writeln!(out, "total_content_size: {}", stats.total_content_size)?;
    writeln!(out, "average_page_size: {}", stats.average_page_size)?;
    if let Some(mem) = stats.memory {
        writeln!(
            out,
            "memory: resident {} MB, virtual {} MB",
            mem.resident_bytes / 1024 / 1024,
            mem.virtual_bytes / 1024 / 1024
        )?;
    }
    Ok(())
}

fn interactive(site: &SiteSearch) -> Result<()> {
    println!("Commands: search <query>, stats, exit");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "stats" => print_stats(&mut io::stdout().lock(), &site.stats())?,
            _ => match input.strip_prefix("search") {
                Some(query) if !query.trim().is_empty() => print_results(site, query.trim(), 10, true),
                _ => println!("Unknown command: {input}"),
            },
        }
    }
    Ok(())
}
