//! JSON Lines output writer

use crate::output::record::ProductRecord;
use crate::output::OutputResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes records as JSON Lines, one object per line
///
/// Non-ASCII text is written as UTF-8, not escaped.
///
/// # Returns
///
/// The number of records written
pub fn write_jsonl<W: Write>(mut writer: W, records: &[ProductRecord]) -> OutputResult<usize> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Truncates `path` and writes every record to it as JSON Lines
pub fn write_jsonl_file(path: &Path, records: &[ProductRecord]) -> OutputResult<usize> {
    let file = File::create(path)?;
    write_jsonl(BufWriter::new(file), records)
}
