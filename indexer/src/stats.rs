use serde::Serialize;

/// Index and corpus statistics for a [`crate::SiteSearch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteStats {
    pub total_documents: u32,
    pub total_terms: usize,
    pub average_terms_per_document: usize,
    pub indexed_pages: usize,
    /// Sum of page content lengths, in characters.
    pub total_content_size: usize,
    pub average_page_size: usize,
    pub memory: Option<MemorySnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

impl MemorySnapshot {
    /// Current process memory, where the platform exposes `/proc/self/status`.
    pub fn current() -> Option<Self> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        Self::parse(&status)
    }

    fn parse(status: &str) -> Option<Self> {
        let field = |name: &str| -> Option<u64> {
            let line = status.lines().find(|l| l.starts_with(name))?;
            let kb: u64 = line[name.len()..].trim().trim_end_matches("kB").trim().parse().ok()?;
            Some(kb * 1024)
        };
        Some(Self { resident_bytes: field("VmRSS:")?, virtual_bytes: field("VmSize:")? })
    }
}
