use serde::{Deserialize, Serialize};

use crate::{error::ExportError, ExecutionMode, FilterState, ViewportState};

/// Point-in-time copy of the visualizer state handed to export collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_step: usize,
    pub selected_node_id: Option<String>,
    pub filter: FilterState,
    pub viewport: ViewportState,
    pub mode: ExecutionMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Pdf,
    Png,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Pdf,
        ExportFormat::Png,
        ExportFormat::Html,
        ExportFormat::Json,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Html => "html",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "Export Data (JSON)",
            ExportFormat::Pdf => "Export as PDF",
            ExportFormat::Png => "Export as PNG",
            ExportFormat::Html => "Export as HTML",
        }
    }

    /// Download name for an export taken at `timestamp_ms`.
    pub fn file_name(self, timestamp_ms: u128) -> String {
        format!("execution-data-{timestamp_ms}.{}", self.extension())
    }
}

/// Turns a [`Snapshot`] into bytes of some external format.
pub trait SnapshotExporter {
    fn format(&self) -> ExportFormat;

    /// # Errors
    ///
    /// Returns [`ExportError`] when the snapshot cannot be encoded.
    fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError>;
}

/// Pretty-printed JSON, the only format rendered in-process.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonExporter;

impl SnapshotExporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(snapshot)?)
    }
}

/// Picks the in-process exporter for `format`.
///
/// # Errors
///
/// Returns [`ExportError::Unsupported`] for formats rendered by external collaborators.
pub fn exporter_for(format: ExportFormat) -> Result<Box<dyn SnapshotExporter>, ExportError> {
    match format {
        ExportFormat::Json => Ok(Box::new(JsonExporter)),
        other => Err(ExportError::Unsupported(other)),
    }
}
