//! `timbang-ledger` — the append-only delivery ledger and receipt image
//! archive.

pub mod archive;
pub mod sheets;
pub mod writer;

pub use archive::{object_name, GcsArchive};
pub use sheets::SheetsStore;
pub use writer::{LedgerWriter, RowReference};
