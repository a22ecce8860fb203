use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Datetime format used across the ledger (weighing time and write time).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Structured fields extracted from one weighing receipt image.
///
/// Produced once by the vision client and immutable afterwards. Weights are
/// in tons. `weighing_datetime` is kept in the model's reported
/// `YYYY-MM-DD HH:MM:SS` form; validation checks that it parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub receipt_number: String,
    pub scale_number: String,
    pub weighing_datetime: String,
    pub vehicle_number: String,
    pub material_name: String,
    pub gross_weight: f64,
    pub empty_weight: f64,
    pub net_weight: f64,
    /// Extraction confidence in [0, 1].
    pub confidence: f64,
}

impl ExtractionResult {
    /// Absolute difference between the reported net weight and gross − tare.
    pub fn weight_discrepancy(&self) -> f64 {
        (self.gross_weight - self.empty_weight - self.net_weight).abs()
    }

    /// The weighing timestamp, if it parses in the ledger format.
    pub fn weighing_time(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.weighing_datetime.trim(), DATETIME_FORMAT).ok()
    }
}

/// Canonical material categories as written in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    BatuPecah12,
    BatuPecah23,
    BatuPecah35,
    BatuSungai,
    Boulder,
    Kerikil,
    Pasir,
    AbuBatu,
    /// Fallback for anything the rules and the model cannot place.
    Lainnya,
}

impl MaterialCategory {
    pub const ALL: [MaterialCategory; 9] = [
        Self::BatuPecah12,
        Self::BatuPecah23,
        Self::BatuPecah35,
        Self::BatuSungai,
        Self::Boulder,
        Self::Kerikil,
        Self::Pasir,
        Self::AbuBatu,
        Self::Lainnya,
    ];

    /// Ledger label (Indonesian, as written in the sheet).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BatuPecah12 => "Batu Pecah 1/2",
            Self::BatuPecah23 => "Batu Pecah 2/3",
            Self::BatuPecah35 => "Batu Pecah 3/5",
            Self::BatuSungai => "Batu Sungai",
            Self::Boulder => "Boulder",
            Self::Kerikil => "Kerikil",
            Self::Pasir => "Pasir",
            Self::AbuBatu => "Abu Batu",
            Self::Lainnya => "Lainnya",
        }
    }

    /// Parse an exact ledger label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let needle = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome status written into the ledger's Status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Clean pass through the confidence gate.
    Delivered,
    /// Persisted, but marked for manual review.
    Flagged,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "Terkirim",
            Self::Flagged => "Ditandai",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Terkirim" => Some(Self::Delivered),
            "Ditandai" => Some(Self::Flagged),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage a submission was in when an outcome was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Normalized,
    Extracted,
    Categorized,
    Validated,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Normalized => "normalized",
            Self::Extracted => "extracted",
            Self::Categorized => "categorized",
            Self::Validated => "validated",
            Self::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Why validation refused a record. A terminal business outcome, not an
/// error; carries a machine code and a corrective hint for the submitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    MissingField { field: &'static str },
    WeightMismatch { expected_net: f64, reported_net: f64 },
    LowConfidence { score: f64, threshold: f64 },
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::WeightMismatch { .. } => "weight_mismatch",
            Self::LowConfidence { .. } => "low_confidence",
        }
    }

    /// Corrective action for the submitter.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => {
                "A required field could not be read. Retake the photo with the whole receipt in frame."
            }
            Self::WeightMismatch { .. } => {
                "The weights on the receipt do not add up. Check the receipt and retake the photo."
            }
            Self::LowConfidence { .. } => {
                "The photo is too unclear to read reliably. Retake it with better lighting and focus."
            }
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "required field '{field}' is missing"),
            Self::WeightMismatch { expected_net, reported_net } => write!(
                f,
                "net weight {reported_net} does not match gross - empty = {expected_net}"
            ),
            Self::LowConfidence { score, threshold } => {
                write!(f, "extraction confidence {score:.2} below threshold {threshold:.2}")
            }
        }
    }
}

/// One persisted delivery: the unit the ledger stores, one row per record.
///
/// `sequence` is assigned by the ledger writer at append time; records are
/// never mutated after they are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub sequence: u64,
    /// Weighing date, `YYYY-MM-DD`.
    pub date: String,
    pub receipt_number: String,
    /// Weighing time, `HH:MM:SS`.
    pub time: String,
    pub scale_number: String,
    pub vehicle_number: String,
    pub material_name: String,
    pub category: MaterialCategory,
    pub gross_weight: f64,
    pub empty_weight: f64,
    pub net_weight: f64,
    pub status: DeliveryStatus,
    pub note: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl DeliveryRecord {
    /// Fixed ledger column count: No | Tanggal | No Nota | Waktu |
    /// No Timbangan | No Kendaraan | Nama Material | Jenis Material |
    /// Berat Isi | Berat Kosong | Berat Bersih | Status | Catatan |
    /// URL Bukti | Ditambahkan.
    pub const COLUMN_COUNT: usize = 15;

    /// Build a record from an extraction. The sequence number stays 0 until
    /// the ledger writer assigns one.
    pub fn from_extraction(
        extraction: &ExtractionResult,
        category: MaterialCategory,
        status: DeliveryStatus,
        note: impl Into<String>,
        image_url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (date, time) = match extraction.weighing_time() {
            Some(dt) => (dt.format("%Y-%m-%d").to_string(), dt.format("%H:%M:%S").to_string()),
            None => {
                let mut parts = extraction.weighing_datetime.splitn(2, ' ');
                (
                    parts.next().unwrap_or_default().to_string(),
                    parts.next().unwrap_or_default().to_string(),
                )
            }
        };
        Self {
            sequence: 0,
            date,
            receipt_number: extraction.receipt_number.clone(),
            time,
            scale_number: extraction.scale_number.clone(),
            vehicle_number: extraction.vehicle_number.clone(),
            material_name: extraction.material_name.clone(),
            category,
            gross_weight: extraction.gross_weight,
            empty_weight: extraction.empty_weight,
            net_weight: extraction.net_weight,
            status,
            note: note.into(),
            image_url: image_url.into(),
            created_at,
        }
    }

    /// Project into the fixed ledger column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.sequence.to_string(),
            self.date.clone(),
            self.receipt_number.clone(),
            self.time.clone(),
            self.scale_number.clone(),
            self.vehicle_number.clone(),
            self.material_name.clone(),
            self.category.as_str().to_string(),
            self.gross_weight.to_string(),
            self.empty_weight.to_string(),
            self.net_weight.to_string(),
            self.status.as_str().to_string(),
            self.note.clone(),
            self.image_url.clone(),
            self.created_at.format(DATETIME_FORMAT).to_string(),
        ]
    }

    /// Parse a ledger row back into a record.
    ///
    /// Lenient about hand-edited rows: short rows are padded, unparseable
    /// weights read as 0 and unknown labels fall back, but a row whose
    /// first cell is not a sequence number is not a record at all.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        let weight = |i: usize| cell(i).trim().parse::<f64>().unwrap_or(0.0);

        let sequence = cell(0).trim().parse::<u64>().ok()?;
        let created_at = NaiveDateTime::parse_from_str(cell(14).trim(), DATETIME_FORMAT)
            .map(|dt| dt.and_utc())
            .unwrap_or(DateTime::UNIX_EPOCH);

        Some(Self {
            sequence,
            date: cell(1).to_string(),
            receipt_number: cell(2).to_string(),
            time: cell(3).to_string(),
            scale_number: cell(4).to_string(),
            vehicle_number: cell(5).to_string(),
            material_name: cell(6).to_string(),
            category: MaterialCategory::from_label(cell(7)).unwrap_or(MaterialCategory::Lainnya),
            gross_weight: weight(8),
            empty_weight: weight(9),
            net_weight: weight(10),
            status: DeliveryStatus::from_label(cell(11)).unwrap_or(DeliveryStatus::Delivered),
            note: cell(12).to_string(),
            image_url: cell(13).to_string(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction() -> ExtractionResult {
        ExtractionResult {
            receipt_number: "A125BD00183725122415O1".into(),
            scale_number: "T21".into(),
            weighing_datetime: "2025-12-24 15:23:34".into(),
            vehicle_number: "B9683TVX".into(),
            material_name: "BATU PECAH 1/2 石子".into(),
            gross_weight: 23.29,
            empty_weight: 8.05,
            net_weight: 15.24,
            confidence: 0.93,
        }
    }

    #[test]
    fn weight_discrepancy_is_zero_for_consistent_receipt() {
        assert!(extraction().weight_discrepancy() < 1e-9);
    }

    #[test]
    fn category_labels_round_trip() {
        for category in MaterialCategory::ALL {
            assert_eq!(MaterialCategory::from_label(category.as_str()), Some(category));
        }
        assert_eq!(MaterialCategory::from_label("batu pecah 1/2"), Some(MaterialCategory::BatuPecah12));
        assert_eq!(MaterialCategory::from_label("granite"), None);
    }

    #[test]
    fn record_splits_weighing_datetime() {
        let record = DeliveryRecord::from_extraction(
            &extraction(),
            MaterialCategory::BatuPecah12,
            DeliveryStatus::Delivered,
            "",
            "",
            Utc::now(),
        );
        assert_eq!(record.date, "2025-12-24");
        assert_eq!(record.time, "15:23:34");
        assert_eq!(record.sequence, 0);
    }

    #[test]
    fn row_codec_round_trips() {
        let mut record = DeliveryRecord::from_extraction(
            &extraction(),
            MaterialCategory::BatuPecah12,
            DeliveryStatus::Flagged,
            "catatan",
            "https://storage.googleapis.com/bucket/2025-12-24/A125.jpg",
            NaiveDateTime::parse_from_str("2025-12-24 15:30:00", DATETIME_FORMAT)
                .unwrap()
                .and_utc(),
        );
        record.sequence = 42;

        let row = record.to_row();
        assert_eq!(row.len(), DeliveryRecord::COLUMN_COUNT);
        assert_eq!(row[0], "42");
        assert_eq!(row[7], "Batu Pecah 1/2");
        assert_eq!(row[11], "Ditandai");

        let parsed = DeliveryRecord::from_row(&row).expect("row should parse");
        assert_eq!(parsed, record);
    }

    #[test]
    fn from_row_pads_short_rows_and_rejects_header() {
        let header: Vec<String> = ["No", "Tanggal", "No Nota"].iter().map(|s| s.to_string()).collect();
        assert!(DeliveryRecord::from_row(&header).is_none());

        let short: Vec<String> = ["7", "2025-12-24", "NOTA1"].iter().map(|s| s.to_string()).collect();
        let parsed = DeliveryRecord::from_row(&short).expect("short row should still parse");
        assert_eq!(parsed.sequence, 7);
        assert_eq!(parsed.receipt_number, "NOTA1");
        assert_eq!(parsed.net_weight, 0.0);
        assert_eq!(parsed.category, MaterialCategory::Lainnya);
    }
}
