//! Per-jurisdiction adapters.
//!
//! Each module implements the [`JurisdictionAdapter`](crate::JurisdictionAdapter)
//! trait for one jurisdiction, overriding only the hooks its source needs.

pub mod austin;
pub mod boston;
pub mod chicago;
pub mod nyc;
pub mod seattle;
pub mod standard;
