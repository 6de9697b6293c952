use anyhow::{bail, Result};
use axum::Router;
use clap::Parser;
use crawler::CrawlArgs;
use indexer::{load_pages, SiteSearch};
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Seed URL to crawl at startup (repeatable)
    #[arg(long = "seed")]
    seeds: Vec<String>,
    /// Serve pages from a crawl JSONL file or directory instead of crawling
    #[arg(long, conflicts_with = "seeds")]
    pages: Option<PathBuf>,
    #[command(flatten)]
    crawl: CrawlArgs,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut site = SiteSearch::new();
    match (&args.pages, args.seeds.is_empty()) {
        (Some(path), _) => {
            site.index_pages(load_pages(path)?);
        }
        (None, false) => {
            let config = args.crawl.clone().into_config(&args.seeds);
            site.index_website(&args.seeds, config).await?;
        }
        (None, true) => bail!("pass --seed URL or --pages PATH"),
    }

    let app: Router = build_app(site);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
