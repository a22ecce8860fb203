//! Submission coordinator: sequences the pipeline stages and translates
//! every failure into a submitter-visible outcome.
//!
//! Per-image state machine: Received → Normalized → Extracted →
//! Categorized → Validated → Persisted, exiting to Rejected (from
//! Validated) or Failed (any stage). Images in one submission run the
//! chain concurrently; the final Persisted transition is one batch append
//! so sequence numbers follow submission order.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use timbang_config::Settings;
use timbang_core::{
    ArchiveStore, DeliveryRecord, ExtractionResult, RejectReason, Stage, TabularStore,
    TimbangError, VisionModel,
};
use timbang_extract::Categorizer;
use timbang_ledger::{object_name, LedgerWriter, RowReference};
use timbang_logging::redact_sensitive;
use timbang_media::{is_image, normalize, ReceiptImage};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::validate::validate;

/// One batch of receipt photos from one submitter.
#[derive(Debug)]
pub struct Submission {
    pub id: Uuid,
    /// Opaque submitter identity from the chat front-end.
    pub submitter: String,
    pub images: Vec<ReceiptImage>,
}

impl Submission {
    pub fn new(submitter: impl Into<String>, images: Vec<ReceiptImage>) -> Self {
        Self { id: Uuid::new_v4(), submitter: submitter.into(), images }
    }
}

/// Per-image result handed back to the front-end: exactly one per image,
/// nothing propagates as an unhandled fault.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImageOutcome {
    /// Persisted; the record carries its assigned sequence number.
    Saved { record: DeliveryRecord, row: RowReference },
    /// Validation refused the extraction. A terminal business outcome
    /// with a machine code and a corrective hint.
    Rejected { reason: RejectReason, message: String },
    /// A stage failed unrecoverably. `image_url` is set when the receipt
    /// image was already archived, so a retry needs no re-upload.
    Failed { stage: Stage, message: String, image_url: Option<String> },
}

enum Staged {
    Ready(DeliveryRecord),
    Done(ImageOutcome),
}

/// Drives submissions through the pipeline. One per process, holding the
/// long-lived clients injected at startup.
pub struct Coordinator {
    settings: Arc<Settings>,
    vision: Arc<dyn VisionModel>,
    categorizer: Categorizer,
    ledger: LedgerWriter,
    archive: Arc<dyn ArchiveStore>,
}

impl Coordinator {
    pub fn new(
        settings: Arc<Settings>,
        vision: Arc<dyn VisionModel>,
        store: Arc<dyn TabularStore>,
        archive: Arc<dyn ArchiveStore>,
    ) -> Self {
        let categorizer = Categorizer::new(vision.clone(), settings.categorize.cache_capacity);
        let ledger = LedgerWriter::new(store, &settings.ledger);
        Self { settings, vision, categorizer, ledger, archive }
    }

    /// Read access for status queries ("show the last N deliveries").
    pub fn ledger(&self) -> &LedgerWriter {
        &self.ledger
    }

    /// Process one submission: every image independently through
    /// Received→Validated, then a single batch append for all validated
    /// records. Returns one outcome per image, in submission order.
    pub async fn process(&self, submission: &Submission) -> Vec<ImageOutcome> {
        info!(
            submission = %submission.id,
            submitter = %submission.submitter,
            images = submission.images.len(),
            "Processing submission"
        );

        let staged =
            join_all(submission.images.iter().map(|image| self.stage_image(image))).await;

        let mut outcomes: Vec<Option<ImageOutcome>> = Vec::with_capacity(staged.len());
        let mut ready: Vec<(usize, DeliveryRecord)> = Vec::new();
        for (index, stage) in staged.into_iter().enumerate() {
            match stage {
                Staged::Ready(record) => {
                    outcomes.push(None);
                    ready.push((index, record));
                }
                Staged::Done(outcome) => outcomes.push(Some(outcome)),
            }
        }

        if !ready.is_empty() {
            let records: Vec<DeliveryRecord> = ready.iter().map(|(_, r)| r.clone()).collect();
            match self.ledger.append_batch(records).await {
                Ok(references) => {
                    for ((index, mut record), reference) in ready.into_iter().zip(references) {
                        record.sequence = reference.sequence;
                        outcomes[index] = Some(ImageOutcome::Saved { record, row: reference });
                    }
                }
                Err(err) => {
                    let message = redact_sensitive(&err.to_string());
                    error!(submission = %submission.id, error = %message, "Ledger append failed");
                    for (index, record) in ready {
                        let image_url =
                            (!record.image_url.is_empty()).then(|| record.image_url.clone());
                        outcomes[index] = Some(ImageOutcome::Failed {
                            stage: Stage::Persisted,
                            message: message.clone(),
                            image_url,
                        });
                    }
                }
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| ImageOutcome::Failed {
                    stage: Stage::Persisted,
                    message: "internal error: image produced no outcome".into(),
                    image_url: None,
                })
            })
            .collect()
    }

    /// Run one image through Received→Validated, plus the best-effort
    /// archive upload.
    async fn stage_image(&self, image: &ReceiptImage) -> Staged {
        if !is_image(&image.mime_type) {
            return Staged::Done(ImageOutcome::Failed {
                stage: Stage::Received,
                message: format!("unsupported payload type '{}'", image.mime_type),
                image_url: None,
            });
        }

        let normalized = match normalize(image, &self.settings.media) {
            Ok(normalized) => normalized,
            Err(err) => return Staged::Done(self.failed(Stage::Normalized, &err)),
        };

        let extraction = match self
            .vision
            .extract_receipt(&normalized.data, &normalized.mime_type)
            .await
        {
            Ok(extraction) => extraction,
            Err(err) => {
                return Staged::Done(self.failed(Stage::Extracted, &TimbangError::from(err)))
            }
        };

        // Model-tier errors degrade to Lainnya inside the categorizer;
        // categorization never blocks persistence.
        let category = self.categorizer.categorize(&extraction.material_name).await;

        let status = match validate(&extraction, &self.settings.pipeline) {
            Ok(status) => status,
            Err(reason) => {
                info!(source = %image.source, code = reason.code(), "Submission rejected");
                let message = format!("{reason}. {}", reason.hint());
                return Staged::Done(ImageOutcome::Rejected { reason, message });
            }
        };

        let image_url = self.archive_image(&normalized, &extraction).await;

        let record = DeliveryRecord::from_extraction(
            &extraction,
            category,
            status,
            "",
            image_url,
            Utc::now(),
        );
        Staged::Ready(record)
    }

    /// Archive the normalized image. Best-effort: failure leaves the URL
    /// empty and never blocks the ledger write.
    async fn archive_image(
        &self,
        normalized: &ReceiptImage,
        extraction: &ExtractionResult,
    ) -> String {
        let date = extraction
            .weighing_time()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "undated".to_string());
        let object = object_name(&date, &extraction.receipt_number);

        match self
            .archive
            .store(&object, normalized.data.clone(), &normalized.mime_type)
            .await
        {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    object = %object,
                    error = %redact_sensitive(&err.to_string()),
                    "Receipt archive failed; continuing without URL"
                );
                String::new()
            }
        }
    }

    fn failed(&self, stage: Stage, err: &TimbangError) -> ImageOutcome {
        let message = redact_sensitive(&err.to_string());
        warn!(stage = %stage, error = %message, "Pipeline stage failed");
        ImageOutcome::Failed { stage, message, image_url: None }
    }
}
