//! Ledger writer: sequence assignment, row formatting, bounded tail reads.
//!
//! The external store is the single source of truth for ordering. Sequence
//! assignment is read-then-append: two concurrent submissions can observe
//! the same tail and assign overlapping numbers; this is accepted and
//! not coordinated in-process.

use std::sync::Arc;

use serde::Serialize;
use timbang_config::LedgerSettings;
use timbang_core::{DeliveryRecord, TabularStore, TimbangError};
use tracing::info;

/// Position of an appended row in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowReference {
    /// 1-indexed sheet row, header included.
    pub row: u32,
    pub sequence: u64,
}

/// Append-only writer over a [`TabularStore`] sheet.
pub struct LedgerWriter {
    store: Arc<dyn TabularStore>,
    sheet: String,
    tail_rows: u32,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn TabularStore>, settings: &LedgerSettings) -> Self {
        Self {
            store,
            sheet: settings.sheet_name.clone(),
            tail_rows: settings.tail_rows.max(1),
        }
    }

    /// Current row total and the next free sequence number, from a bounded
    /// tail read, never the full history.
    async fn tail_state(&self) -> Result<(u32, u64), TimbangError> {
        let total = self
            .store
            .row_count(&self.sheet)
            .await
            .map_err(|e| TimbangError::Persistence(e.to_string()))?;
        if total <= 1 {
            // Header only, or a sheet that was never initialized.
            return Ok((total, 1));
        }

        let start = total.saturating_sub(self.tail_rows - 1).max(2);
        let rows = self
            .store
            .read_rows(&self.sheet, start, total)
            .await
            .map_err(|e| TimbangError::Persistence(e.to_string()))?;

        let next = rows
            .iter()
            .filter_map(|row| row.first())
            .filter_map(|cell| cell.trim().parse::<u64>().ok())
            .max()
            .map(|max| max + 1)
            .unwrap_or(1);
        Ok((total, next))
    }

    /// The sequence number the next appended record will receive.
    pub async fn next_sequence(&self) -> Result<u64, TimbangError> {
        Ok(self.tail_state().await?.1)
    }

    /// Append a single record.
    pub async fn append(&self, record: DeliveryRecord) -> Result<RowReference, TimbangError> {
        let refs = self.append_batch(vec![record]).await?;
        refs.into_iter()
            .next()
            .ok_or_else(|| TimbangError::Persistence("append reported no written rows".into()))
    }

    /// Append a batch of records with consecutive sequence numbers in one
    /// underlying store call.
    ///
    /// The store gives no atomicity: on error, some rows may still have
    /// become visible; callers re-verify by re-reading the tail before
    /// retrying.
    pub async fn append_batch(
        &self,
        records: Vec<DeliveryRecord>,
    ) -> Result<Vec<RowReference>, TimbangError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let (total, start_sequence) = self.tail_state().await?;
        let rows: Vec<Vec<String>> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let mut numbered = record.clone();
                numbered.sequence = start_sequence + i as u64;
                numbered.to_row()
            })
            .collect();

        let written = self
            .store
            .append_rows(&self.sheet, &rows)
            .await
            .map_err(|e| TimbangError::Persistence(e.to_string()))?;
        if written as usize != rows.len() {
            return Err(TimbangError::Persistence(format!(
                "append wrote {written} of {} rows",
                rows.len()
            )));
        }

        info!(count = rows.len(), start_sequence, sheet = %self.sheet, "Appended delivery rows");
        Ok((0..records.len())
            .map(|i| RowReference {
                row: total + 1 + i as u32,
                sequence: start_sequence + i as u64,
            })
            .collect())
    }

    /// The most recent `n` records, newest first, reading only the minimal
    /// row range.
    pub async fn latest(&self, n: u32) -> Result<Vec<DeliveryRecord>, TimbangError> {
        let total = self
            .store
            .row_count(&self.sheet)
            .await
            .map_err(|e| TimbangError::Persistence(e.to_string()))?;
        if total <= 1 || n == 0 {
            return Ok(Vec::new());
        }

        let start = total.saturating_sub(n - 1).max(2);
        let rows = self
            .store
            .read_rows(&self.sheet, start, total)
            .await
            .map_err(|e| TimbangError::Persistence(e.to_string()))?;

        Ok(rows.iter().rev().filter_map(|row| DeliveryRecord::from_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use timbang_core::{DeliveryStatus, ExtractionResult, MaterialCategory};

    /// In-memory sheet that records every requested read range.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Vec<String>>>,
        reads: Mutex<Vec<(u32, u32)>>,
        appends: Mutex<u32>,
    }

    impl MemoryStore {
        fn with_header() -> Self {
            let store = Self::default();
            store.rows.lock().unwrap().push(vec!["No".into(), "Tanggal".into()]);
            store
        }
    }

    #[async_trait]
    impl TabularStore for MemoryStore {
        async fn row_count(&self, _sheet: &str) -> Result<u32> {
            Ok(self.rows.lock().unwrap().len() as u32)
        }

        async fn read_rows(&self, _sheet: &str, start: u32, end: u32) -> Result<Vec<Vec<String>>> {
            self.reads.lock().unwrap().push((start, end));
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .skip(start as usize - 1)
                .take((end - start + 1) as usize)
                .cloned()
                .collect())
        }

        async fn append_rows(&self, _sheet: &str, new_rows: &[Vec<String>]) -> Result<u32> {
            *self.appends.lock().unwrap() += 1;
            let mut rows = self.rows.lock().unwrap();
            rows.extend_from_slice(new_rows);
            Ok(new_rows.len() as u32)
        }
    }

    fn record(receipt: &str, net: f64) -> DeliveryRecord {
        let extraction = ExtractionResult {
            receipt_number: receipt.into(),
            scale_number: "T21".into(),
            weighing_datetime: "2025-12-24 15:23:34".into(),
            vehicle_number: "B9683TVX".into(),
            material_name: "BATU PECAH 1/2 石子".into(),
            gross_weight: net + 8.05,
            empty_weight: 8.05,
            net_weight: net,
            confidence: 0.9,
        };
        DeliveryRecord::from_extraction(
            &extraction,
            MaterialCategory::BatuPecah12,
            DeliveryStatus::Delivered,
            "",
            "",
            Utc::now(),
        )
    }

    fn writer(store: Arc<MemoryStore>) -> LedgerWriter {
        LedgerWriter::new(store, &LedgerSettings::default())
    }

    #[tokio::test]
    async fn empty_ledger_starts_at_one() {
        let store = Arc::new(MemoryStore::with_header());
        let writer = writer(store.clone());

        assert_eq!(writer.next_sequence().await.unwrap(), 1);
        let reference = writer.append(record("N1", 15.24)).await.unwrap();
        assert_eq!(reference.sequence, 1);
        assert_eq!(reference.row, 2);
    }

    #[tokio::test]
    async fn sequences_are_strictly_increasing() {
        let store = Arc::new(MemoryStore::with_header());
        let writer = writer(store.clone());

        let mut last = 0;
        for i in 0..5 {
            let reference = writer.append(record(&format!("N{i}"), 10.0)).await.unwrap();
            assert!(reference.sequence > last);
            last = reference.sequence;
        }
        assert_eq!(last, 5);
    }

    #[tokio::test]
    async fn batch_append_is_one_store_call_with_consecutive_sequences() {
        let store = Arc::new(MemoryStore::with_header());
        let writer = writer(store.clone());
        writer.append(record("N0", 10.0)).await.unwrap();
        *store.appends.lock().unwrap() = 0;

        let refs = writer
            .append_batch(vec![record("N1", 11.0), record("N2", 12.0), record("N3", 13.0)])
            .await
            .unwrap();

        assert_eq!(*store.appends.lock().unwrap(), 1);
        let sequences: Vec<u64> = refs.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn next_sequence_reads_only_the_tail() {
        let store = Arc::new(MemoryStore::with_header());
        {
            let mut rows = store.rows.lock().unwrap();
            for i in 1..=1000u64 {
                let mut row = record(&format!("N{i}"), 10.0);
                row.sequence = i;
                rows.push(row.to_row());
            }
        }
        let writer = writer(store.clone());

        assert_eq!(writer.next_sequence().await.unwrap(), 1001);
        let reads = store.reads.lock().unwrap();
        assert_eq!(reads.len(), 1);
        let (start, end) = reads[0];
        assert_eq!(end, 1001);
        assert!(end - start + 1 <= 10, "tail read spanned {} rows", end - start + 1);
    }

    #[tokio::test]
    async fn latest_reads_bounded_range_newest_first() {
        let store = Arc::new(MemoryStore::with_header());
        {
            let mut rows = store.rows.lock().unwrap();
            for i in 1..=1000u64 {
                let mut row = record(&format!("N{i}"), 10.0);
                row.sequence = i;
                rows.push(row.to_row());
            }
        }
        let writer = writer(store.clone());

        let latest = writer.latest(5).await.unwrap();
        assert_eq!(latest.len(), 5);
        let sequences: Vec<u64> = latest.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1000, 999, 998, 997, 996]);

        let reads = store.reads.lock().unwrap();
        assert_eq!(reads.len(), 1);
        let (start, end) = reads[0];
        assert!(end - start + 1 <= 5, "latest(5) read {} rows", end - start + 1);
    }

    #[tokio::test]
    async fn appended_record_round_trips_through_latest() {
        let store = Arc::new(MemoryStore::with_header());
        let writer = writer(store.clone());

        let mut original = record("A125BD00183725122415O1", 15.24);
        original.note = "batch kedua".into();
        original.image_url = "https://storage.googleapis.com/receipts/2025-12-24/A125.jpg".into();
        original.created_at = "2025-12-24T15:30:00Z".parse().unwrap();

        let reference = writer.append(original.clone()).await.unwrap();
        let fetched = writer.latest(1).await.unwrap().remove(0);

        original.sequence = reference.sequence;
        assert_eq!(fetched, original);
    }
}
