//! State module for tracking crawl progress
//!
//! This module provides the units of work handled by the crawl engine and
//! the failure sets that carry them from one pass to the next.
//!
//! # Components
//!
//! - `SectionTarget`: A catalog section entry point
//! - `PageUnit`: One result page within a section
//! - `FailureSet`: Units that failed in the most recent pass

mod failures;
mod unit;

// Re-export main types
pub use failures::FailureSet;
pub use unit::{PageUnit, SectionTarget};
