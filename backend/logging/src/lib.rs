//! Structured logging for the Timbang pipeline.
//!
//! Handles tracing initialization (console + rolling NDJSON file) and
//! redaction of credentials before text leaves the process.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive;
