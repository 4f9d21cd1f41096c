//! Units of crawl work: sections and the pages inside them

use std::fmt;
use url::Url;

/// A catalog section to crawl, identified by its base address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionTarget {
    url: Url,
}

impl SectionTarget {
    /// Wraps an already parsed section address
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parses a section address
    pub fn parse(address: &str) -> Result<Self, url::ParseError> {
        Url::parse(address).map(Self::new)
    }

    /// The section's base address
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Builds the page unit for a 1-based page index in this section
    pub fn page(&self, page: u32) -> PageUnit {
        PageUnit {
            section: self.clone(),
            page,
        }
    }

    /// All page units covering `page_count` pages, in page order
    pub fn pages(&self, page_count: u32) -> Vec<PageUnit> {
        (1..=page_count).map(|page| self.page(page)).collect()
    }
}

impl fmt::Display for SectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// One result page of a section
///
/// Page indices start at 1. Identity is the (section, page) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageUnit {
    pub section: SectionTarget,
    pub page: u32,
}

impl fmt::Display for PageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (page {})", self.section, self.page)
    }
}
