//! Catalog Store
//!
//! Durable table -> column-list metadata kept in `_meta_json_t`, the
//! client-side snapshot of it, and the payload backfills that keep
//! `_data_json_t` consistent with every catalog change.

mod backfill;
mod cache;
mod store;

pub use backfill::DataBackfill;
pub(crate) use backfill::{malformed, parse_payload, write_payload};
pub use cache::MetaCache;
pub use store::CatalogStore;
