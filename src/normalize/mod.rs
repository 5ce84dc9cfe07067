//! List Normalizer
//!
//! Pure transforms from raw admin-API results to the canonical client-side
//! shape. Nothing here talks to the network or touches the store.

mod details;
mod lists;
mod stats;
mod wire;

pub use details::{normalize_server_details, normalize_server_details_refresh};
pub use lists::{normalize_lists, read_only_flag};
pub use stats::{filter_server_stat, normalize_server_stat};
