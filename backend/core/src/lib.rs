pub mod error;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::{ExtractionError, TimbangError};
pub use retry::RetryPolicy;
pub use traits::{ArchiveStore, TabularStore, VisionModel};
pub use types::{
    DeliveryRecord, DeliveryStatus, ExtractionResult, MaterialCategory, RejectReason, Stage,
};
