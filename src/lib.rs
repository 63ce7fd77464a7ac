//! Tabula - tabular record transcoder
//!
//! This library maps rectangular table regions (rows, or columns in pivot
//! orientation) to keyed records and back, against any store implementing
//! the [`TableStore`](store::TableStore) capability.
//!
//! # Features
//!
//! - Header resolution with blank-header skipping and duplicate detection
//! - Decode with empty-line filtering and date display substitution
//! - Overwrite / append / overlay writes with optional formula preservation
//! - Upsert and find-and-update keyed on one field
//! - Excel (.xlsx) import/export through an in-memory store
//!
//! # Example
//!
//! ```
//! use tabula::config::TranscodeOptions;
//! use tabula::core::{decode, upsert};
//! use tabula::store::MemoryStore;
//! use tabula::types::{CellValue, Record};
//!
//! let mut store = MemoryStore::new().with_rows(
//!     "People",
//!     vec![
//!         vec!["Name".into(), "Age".into()],
//!         vec!["Bob".into(), 25.into()],
//!     ],
//! );
//! let opts = TranscodeOptions::default();
//!
//! upsert(&mut store, "People", &[Record::new().with("Name", "Bob").with("Age", 26)], "Name", &opts)?;
//!
//! let records = decode(&store, "People", &opts)?.into_records();
//! assert_eq!(records[0].get("Age"), Some(&CellValue::from(26)));
//! # Ok::<(), tabula::error::TabulaError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::TranscodeOptions;
pub use error::{TabulaError, TabulaResult};
pub use store::{MemoryStore, TableStore};
pub use types::{CellValue, Decoded, Record};
