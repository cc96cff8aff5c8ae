//! Reading trace records from JSONL files.
//!
//! One JSON object per line; blank lines are skipped.

use std::fs;
use std::path::Path;

use crate::types::TraceRecord;

/// Error type for reading recorded traces.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error on line {line}: {source}")]
    Serialization {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse trace records from JSONL text.
pub fn parse_traces(content: &str) -> Result<Vec<TraceRecord>, JsonlError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| JsonlError::Serialization {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Read trace records from a JSONL file.
pub fn read_traces(path: &Path) -> Result<Vec<TraceRecord>, JsonlError> {
    let content = fs::read_to_string(path)?;
    parse_traces(&content)
}
