//! Append-only ledger vocabulary and reference generation.

pub mod reference;
pub mod types;

pub use reference::generate_reference;
pub use types::{TransactionKind, TransactionSource, TransactionStatus};
