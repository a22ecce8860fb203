//! Settings validation with field-path error messages.

use crate::schema::Settings;
use thiserror::Error;

/// A settings validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

/// Validate settings and return a report of all errors and warnings.
pub fn validate(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();

    if settings.vision.api_key.trim().is_empty() {
        report.error("vision.apiKey", "Vision API key is required");
    }
    if settings.vision.timeout_secs == 0 {
        report.error("vision.timeoutSecs", "Per-call timeout must be > 0");
    }
    if settings.vision.retry.max_attempts == 0 {
        report.error("vision.retry.maxAttempts", "At least one attempt is required");
    }

    if settings.media.max_dimension == 0 {
        report.error("media.maxDimension", "Pixel cap must be > 0");
    }
    if settings.media.jpeg_quality == 0 || settings.media.jpeg_quality > 100 {
        report.error("media.jpegQuality", "JPEG quality must be in 1..=100");
    }

    if settings.categorize.cache_capacity == 0 {
        report.warn("categorize.cacheCapacity", "Capacity 0 disables categorization caching");
    }

    if !(0.0..=1.0).contains(&settings.pipeline.min_confidence) {
        report.error("pipeline.minConfidence", "Confidence threshold must be in [0, 1]");
    }
    if settings.pipeline.review_confidence < settings.pipeline.min_confidence {
        report.warn(
            "pipeline.reviewConfidence",
            "Review threshold below acceptance threshold; no record will ever be flagged",
        );
    }
    if settings.pipeline.weight_tolerance < 0.0 {
        report.error("pipeline.weightTolerance", "Tolerance cannot be negative");
    }

    if settings.ledger.spreadsheet_id.trim().is_empty() {
        report.error("ledger.spreadsheetId", "Spreadsheet id is required");
    }
    if settings.ledger.sheet_name.trim().is_empty() {
        report.error("ledger.sheetName", "Sheet name is required");
    }
    if settings.ledger.tail_rows == 0 {
        report.error("ledger.tailRows", "Tail window must be > 0");
    }

    if settings.archive.bucket.trim().is_empty() {
        report.warn("archive.bucket", "No archive bucket configured; receipt images will not be archived");
    }

    report
}
