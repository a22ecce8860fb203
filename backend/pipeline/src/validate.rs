//! Validation and confidence gate.
//!
//! Checks run in a fixed order and short-circuit on the first failure:
//! required fields, weight arithmetic, then the confidence threshold.
//! Rejection is a terminal business outcome, never an error; nothing
//! partial is persisted.

use timbang_config::PipelineSettings;
use timbang_core::{DeliveryStatus, ExtractionResult, RejectReason};

/// Gate an extraction. A pass yields the status the record will persist
/// with: `Flagged` when confidence clears the acceptance threshold but not
/// the review threshold.
pub fn validate(
    extraction: &ExtractionResult,
    settings: &PipelineSettings,
) -> Result<DeliveryStatus, RejectReason> {
    if let Some(field) = first_missing_field(extraction) {
        return Err(RejectReason::MissingField { field });
    }

    let expected_net = extraction.gross_weight - extraction.empty_weight;
    if (expected_net - extraction.net_weight).abs() > settings.weight_tolerance {
        return Err(RejectReason::WeightMismatch {
            expected_net,
            reported_net: extraction.net_weight,
        });
    }

    if extraction.confidence < settings.min_confidence {
        return Err(RejectReason::LowConfidence {
            score: extraction.confidence,
            threshold: settings.min_confidence,
        });
    }

    if extraction.confidence < settings.review_confidence {
        Ok(DeliveryStatus::Flagged)
    } else {
        Ok(DeliveryStatus::Delivered)
    }
}

/// First required field that is empty or unreadable. The extraction prompt
/// reports unreadable receipts as empty strings and zero weights.
fn first_missing_field(extraction: &ExtractionResult) -> Option<&'static str> {
    if extraction.receipt_number.trim().is_empty() {
        return Some("receipt_number");
    }
    if extraction.scale_number.trim().is_empty() {
        return Some("scale_number");
    }
    if extraction.weighing_time().is_none() {
        return Some("weighing_datetime");
    }
    if extraction.vehicle_number.trim().is_empty() {
        return Some("vehicle_number");
    }
    if extraction.material_name.trim().is_empty() {
        return Some("material_name");
    }
    if extraction.gross_weight <= 0.0 {
        return Some("gross_weight");
    }
    if extraction.empty_weight <= 0.0 {
        return Some("empty_weight");
    }
    if extraction.net_weight <= 0.0 {
        return Some("net_weight");
    }
    None
}
