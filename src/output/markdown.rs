//! Markdown summary generation
//!
//! Writes a human-readable report of a finished crawl, including the units
//! that never succeeded within the retry ceiling.

use crate::output::summary::{CrawlSummary, OutputResult};
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of the crawl to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Catalog-Sweep Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    let _ = writeln!(md, "- **Started**: {}", summary.started_at.to_rfc3339());
    let _ = writeln!(md, "- **Finished**: {}", summary.finished_at.to_rfc3339());
    let _ = writeln!(
        md,
        "- **Duration**: {} seconds ({:.2} minutes)",
        summary.duration_seconds(),
        summary.duration_seconds() as f64 / 60.0
    );
    let _ = writeln!(md, "- **Output**: {}\n", summary.records_path);

    md.push_str("## Overall Statistics\n\n");
    let _ = writeln!(md, "- **Sections**: {}", summary.sections_total);
    let _ = writeln!(md, "- **Records Written**: {}", summary.records_written);
    let _ = writeln!(md, "- **Page Retry Passes**: {}", summary.page_retry_passes);
    let _ = writeln!(
        md,
        "- **Section Retry Passes**: {}",
        summary.section_retry_passes
    );
    let _ = writeln!(md, "- **Missing Pages**: {}", summary.failed_pages.len());
    let _ = writeln!(
        md,
        "- **Missing Sections**: {}\n",
        summary.failed_sections.len()
    );

    if summary.is_complete() {
        md.push_str("All sections and pages were collected.\n");
        return md;
    }

    if !summary.failed_sections.is_empty() {
        md.push_str("## Missing Sections\n\n");
        md.push_str("Probe never succeeded; no pages were fetched.\n\n");
        for section in &summary.failed_sections {
            let _ = writeln!(md, "- {}", section);
        }
        md.push('\n');
    }

    if !summary.failed_pages.is_empty() {
        md.push_str("## Missing Pages\n\n");
        md.push_str("| Section | Page |\n");
        md.push_str("|---------|------|\n");
        for unit in &summary.failed_pages {
            let _ = writeln!(md, "| {} | {} |", unit.section, unit.page);
        }
        md.push('\n');
    }

    md
}
