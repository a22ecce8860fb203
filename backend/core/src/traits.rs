use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ExtractionError;
use crate::types::ExtractionResult;

/// A vision-capable model endpoint used for receipt extraction and material
/// classification.
///
/// One long-lived instance is constructed at startup and shared behind
/// `Arc<dyn VisionModel>`; tests substitute an in-memory fake.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Extract structured receipt fields from a normalized image.
    async fn extract_receipt(
        &self,
        image: &Bytes,
        mime_type: &str,
    ) -> Result<ExtractionResult, ExtractionError>;

    /// Classify a raw material name into one of the closed category labels.
    /// Returns the label text exactly as the model produced it.
    async fn classify_material(&self, material_name: &str) -> Result<String, ExtractionError>;
}

/// A row-oriented external tabular store: one fixed-column sheet, ordered
/// rows of strings, no transactions, no conditional writes.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Total number of rows currently in the sheet, header included.
    async fn row_count(&self, sheet: &str) -> Result<u32>;

    /// Read rows in the 1-indexed inclusive range `start..=end`.
    async fn read_rows(&self, sheet: &str, start: u32, end: u32) -> Result<Vec<Vec<String>>>;

    /// Append rows after the last row. Returns the number of rows written.
    async fn append_rows(&self, sheet: &str, rows: &[Vec<String>]) -> Result<u32>;
}

/// Store for archived receipt images.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Store bytes under a logical, date-partitioned object name and return
    /// a retrievable URL.
    async fn store(&self, object_name: &str, data: Bytes, content_type: &str) -> Result<String>;
}
