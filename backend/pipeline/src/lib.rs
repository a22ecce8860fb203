//! `timbang-pipeline` — the submission coordinator and validation gate.
//!
//! A chat adapter hands in a [`Submission`]; every image runs the
//! extraction chain independently, validated records persist as one batch,
//! and each image comes back as exactly one [`ImageOutcome`].

pub mod coordinator;
pub mod validate;

pub use coordinator::{Coordinator, ImageOutcome, Submission};
pub use validate::validate;
