pub mod load;
pub mod site;
pub mod snippet;
pub mod stats;

pub use load::load_pages;
pub use site::{SiteSearch, WebSearchResult};
pub use stats::{MemorySnapshot, SiteStats};
