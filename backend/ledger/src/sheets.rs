//! Google Sheets v4 client implementing [`TabularStore`].
//!
//! Row counts come from the `rowMetadata` fields mask instead of reading
//! the column itself, so sizing the tail costs one metadata call no matter
//! how long the ledger grows.

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use timbang_config::LedgerSettings;
use timbang_core::{RetryPolicy, TabularStore};
use tracing::{debug, warn};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Last ledger column (15 columns, A..O).
const LAST_COLUMN: char = 'O';

/// Statuses worth retrying: timeout, rate limit, server-side failure.
fn is_transient_status(code: u16) -> bool {
    code == 408 || code == 429 || code >= 500
}

enum CallError {
    Transient(String),
    Terminal(String),
}

impl CallError {
    fn into_message(self) -> String {
        match self {
            Self::Transient(msg) | Self::Terminal(msg) => msg,
        }
    }
}

/// One long-lived Sheets client per process, injected where needed.
pub struct SheetsStore {
    client: Client,
    spreadsheet_id: String,
    access_token: String,
    base_url: String,
    retry: RetryPolicy,
}

impl SheetsStore {
    pub fn new(settings: &LedgerSettings) -> Self {
        Self {
            client: Client::new(),
            spreadsheet_id: settings.spreadsheet_id.clone(),
            access_token: settings.access_token.clone(),
            base_url: SHEETS_API_BASE.to_string(),
            retry: settings.retry.clone(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send_once(request: reqwest::RequestBuilder) -> Result<serde_json::Value, CallError> {
        let response = request
            .send()
            .await
            .map_err(|e| CallError::Transient(e.to_string()))?;

        let status = response.status();
        if is_transient_status(status.as_u16()) {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Transient(format!("HTTP {status}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Terminal(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| CallError::Terminal(format!("invalid response body: {e}")))
    }

    /// Issue a request, retrying transient failures per the policy.
    async fn send_with_retry<F>(&self, make_request: F, what: &str) -> Result<serde_json::Value>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::send_once(make_request()).await {
                Ok(value) => return Ok(value),
                Err(CallError::Transient(msg)) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %msg,
                        "Sheets {what} failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => bail!("Sheets {what} failed: {}", err.into_message()),
            }
        }
    }

    fn range(&self, sheet: &str, start: u32, end: u32) -> String {
        format!("{sheet}!A{start}:{LAST_COLUMN}{end}")
    }
}

#[async_trait]
impl TabularStore for SheetsStore {
    async fn row_count(&self, sheet: &str) -> Result<u32> {
        let url = format!(
            "{}/{}?ranges={}&fields=sheets.data.rowMetadata",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(&format!("{sheet}!A:A")),
        );
        let value = self
            .send_with_retry(|| self.client.get(&url).bearer_auth(&self.access_token), "row count")
            .await?;

        let count = value["sheets"][0]["data"][0]["rowMetadata"]
            .as_array()
            .map(|rows| rows.len() as u32)
            .unwrap_or(0);
        debug!(sheet, count, "Fetched ledger row count");
        Ok(count)
    }

    async fn read_rows(&self, sheet: &str, start: u32, end: u32) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{}/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(&self.range(sheet, start, end)),
        );
        let value = self
            .send_with_retry(|| self.client.get(&url).bearer_auth(&self.access_token), "read")
            .await?;

        let rows = value["values"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| {
                                cells
                                    .iter()
                                    .map(|cell| {
                                        cell.as_str()
                                            .map(str::to_string)
                                            .unwrap_or_else(|| cell.to_string())
                                    })
                                    .collect()
                            })
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn append_rows(&self, sheet: &str, rows: &[Vec<String>]) -> Result<u32> {
        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(&format!("{sheet}!A:{LAST_COLUMN}")),
        );
        let body = serde_json::json!({ "values": rows });
        let value = self
            .send_with_retry(
                || self.client.post(&url).bearer_auth(&self.access_token).json(&body),
                "append",
            )
            .await?;

        let written = value["updates"]["updatedRows"]
            .as_u64()
            .unwrap_or(rows.len() as u64) as u32;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_covers_all_fifteen_columns() {
        let store = SheetsStore::new(&LedgerSettings::default());
        assert_eq!(store.range("Pengiriman", 2, 11), "Pengiriman!A2:O11");
    }

    #[test]
    fn transient_statuses_classify_for_retry() {
        for code in [408u16, 429, 500, 503] {
            assert!(is_transient_status(code), "{code} should retry");
        }
        for code in [400u16, 401, 403, 404] {
            assert!(!is_transient_status(code), "{code} should not retry");
        }
    }
}
