//! Cloud Storage archive for receipt images.
//!
//! Archival is best-effort: a failed upload is reported to the caller but
//! never blocks the ledger write.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use timbang_config::ArchiveSettings;
use timbang_core::ArchiveStore;
use tracing::info;

const UPLOAD_API_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const PUBLIC_BASE: &str = "https://storage.googleapis.com";

/// Date-partitioned object name for one receipt image, with the receipt
/// number reduced to filename-safe characters.
pub fn object_name(date: &str, receipt_number: &str) -> String {
    let safe: String = receipt_number
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let safe = if safe.is_empty() { "nota".to_string() } else { safe };
    format!("{date}/{safe}.jpg")
}

/// Google Cloud Storage implementation of [`ArchiveStore`].
pub struct GcsArchive {
    client: Client,
    bucket: String,
    access_token: String,
    upload_base: String,
    public_base: String,
}

impl GcsArchive {
    pub fn new(settings: &ArchiveSettings) -> Self {
        Self {
            client: Client::new(),
            bucket: settings.bucket.clone(),
            access_token: settings.access_token.clone(),
            upload_base: UPLOAD_API_BASE.to_string(),
            public_base: PUBLIC_BASE.to_string(),
        }
    }

    pub fn with_base_urls(mut self, upload: impl Into<String>, public: impl Into<String>) -> Self {
        self.upload_base = upload.into().trim_end_matches('/').to_string();
        self.public_base = public.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ArchiveStore for GcsArchive {
    async fn store(&self, object_name: &str, data: Bytes, content_type: &str) -> Result<String> {
        if self.bucket.is_empty() {
            bail!("no archive bucket configured");
        }

        let url = format!(
            "{}/b/{}/o?uploadType=media&name={}",
            self.upload_base,
            self.bucket,
            urlencoding::encode(object_name),
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .context("Archive upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Archive upload returned {status}: {body}");
        }

        let public_url = format!("{}/{}/{}", self.public_base, self.bucket, object_name);
        info!(object = object_name, url = %public_url, "Archived receipt image");
        Ok(public_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_is_date_partitioned_and_sanitized() {
        assert_eq!(
            object_name("2025-12-24", "A125/BD 00183?"),
            "2025-12-24/A125BD00183.jpg"
        );
        assert_eq!(object_name("2025-12-24", "NOTA_01-X"), "2025-12-24/NOTA_01-X.jpg");
    }

    #[test]
    fn unreadable_receipt_number_still_names_an_object() {
        assert_eq!(object_name("2025-12-24", "???"), "2025-12-24/nota.jpg");
    }
}
