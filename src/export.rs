//! Curated dataset export
//!
//! The export set is recomputed from the store on every call: all
//! conversations not flagged negative, in their original order, written as
//! newline-delimited JSON.

use crate::model::Conversation;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize conversation: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of writing an export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub count: usize,
}

impl ExportSummary {
    pub fn message(&self) -> String {
        format!("{} conversations downloaded successfully!", self.count)
    }
}

/// Conversations eligible for export, order preserved
pub fn filter(conversations: &[Arc<Conversation>]) -> Vec<Arc<Conversation>> {
    conversations
        .iter()
        .filter(|c| !c.is_negative)
        .cloned()
        .collect()
}

/// One JSON object per line, in the order given
pub fn to_jsonl(conversations: &[Arc<Conversation>]) -> Result<String, serde_json::Error> {
    let lines = conversations
        .iter()
        .map(|c| serde_json::to_string(c.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("chat-conversations-{}.jsonl", date.format("%Y-%m-%d"))
}

/// Filter, serialize and write the export into `dir`
pub fn write_export(
    dir: &Path,
    conversations: &[Arc<Conversation>],
    date: NaiveDate,
) -> Result<ExportSummary, ExportError> {
    let exportable = filter(conversations);
    let body = to_jsonl(&exportable)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(date));
    std::fs::write(&path, body)?;

    tracing::info!(
        path = %path.display(),
        count = exportable.len(),
        excluded = conversations.len() - exportable.len(),
        "Wrote conversation export"
    );

    Ok(ExportSummary {
        path,
        count: exportable.len(),
    })
}
