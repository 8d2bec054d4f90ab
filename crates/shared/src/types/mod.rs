//! Shared value types.

pub mod amount;
pub mod pagination;

pub use amount::{is_valid_amount, round_amount};
pub use pagination::{PageMeta, PageRequest, PageResponse};
