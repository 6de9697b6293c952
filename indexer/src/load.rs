use anyhow::{Context, Result};
use search_core::WebPage;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read crawled pages from a JSONL file, or from every `.jsonl` file under a
/// directory. Blank lines are skipped; a malformed line fails the load.
pub fn load_pages(path: impl AsRef<Path>) -> Result<Vec<WebPage>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        anyhow::bail!("{} does not exist", path.display());
    }

    let mut pages = Vec::new();
    for file in &files {
        let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let page: WebPage = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: invalid page record", file.display(), n + 1))?;
            pages.push(page);
        }
    }
    tracing::info!(files = files.len(), pages = pages.len(), path = %path.display(), "loaded pages");
    Ok(pages)
}
