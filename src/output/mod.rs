//! Output module for collected records and crawl summaries
//!
//! This module handles:
//! - The shared, append-only record store
//! - Writing records as JSON Lines
//! - Run summaries, logged and optionally written as markdown

mod jsonl;
mod markdown;
mod record;
mod store;
mod summary;

pub use jsonl::{write_jsonl, write_jsonl_file};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use record::ProductRecord;
pub use store::RecordStore;
pub use summary::{CrawlSummary, OutputError, OutputResult};
