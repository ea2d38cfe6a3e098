//! Catalog - credential signature loading
//!
//! Reads the on-disk YAML catalog into an ordered [`Catalog`], rejecting
//! entries the fingerprinting core cannot use.

mod loader;
mod validate;

pub use defcred_common::Catalog;
pub use loader::{load_catalog, load_entry, parse_entry};
pub use validate::validate_entry;
