//! `timbang-extract` — receipt field extraction and material
//! categorization against a vision-capable model endpoint.

pub mod categorize;
pub mod prompts;
pub mod vision;

pub use categorize::{match_rules, Categorizer};
pub use vision::GeminiVision;
