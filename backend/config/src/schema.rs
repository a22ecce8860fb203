//! Timbang runtime settings schema.
//!
//! One explicit `Settings` struct is built at process start and passed by
//! reference into every component; there is no ambient configuration
//! lookup anywhere else in the workspace.

use serde::{Deserialize, Serialize};
use timbang_core::RetryPolicy;

/// Root settings for the Timbang pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Vision inference endpoint.
    pub vision: VisionSettings,

    /// Image normalization bounds.
    pub media: MediaSettings,

    /// Categorization cache sizing.
    pub categorize: CategorizeSettings,

    /// Validation gate thresholds.
    pub pipeline: PipelineSettings,

    /// Spreadsheet ledger.
    pub ledger: LedgerSettings,

    /// Receipt image archive.
    pub archive: ArchiveSettings,

    /// Logging output.
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisionSettings {
    /// API key for the Gemini endpoint (use `${GEMINI_API_KEY}`).
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash-lite".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaSettings {
    /// Pixel cap per side before inference. Receipts don't need full
    /// resolution.
    pub max_dimension: u32,
    /// JPEG re-encode quality, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self { max_dimension: 800, jpeg_quality: 85 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategorizeSettings {
    /// Bounded capacity of each categorization cache tier.
    pub cache_capacity: u64,
}

impl Default for CategorizeSettings {
    fn default() -> Self {
        Self { cache_capacity: 128 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSettings {
    /// Extractions below this confidence are rejected.
    pub min_confidence: f64,
    /// Passing extractions below this confidence persist as flagged.
    pub review_confidence: f64,
    /// Allowed |gross − empty − net| in tons.
    pub weight_tolerance: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            review_confidence: 0.8,
            weight_tolerance: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// OAuth bearer token for the Sheets API (use `${SHEETS_ACCESS_TOKEN}`).
    /// Token provisioning/refresh is the deployment's concern.
    pub access_token: String,
    /// How many trailing rows to scan for the next sequence number.
    pub tail_rows: u32,
    pub retry: RetryPolicy,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: "Pengiriman".to_string(),
            access_token: String::new(),
            tail_rows: 10,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveSettings {
    pub bucket: String,
    /// OAuth bearer token for the storage API (may equal the ledger token).
    pub access_token: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self { bucket: String::new(), access_token: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub dir: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), dir: "logs".to_string() }
    }
}
