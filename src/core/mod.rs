//! Transcoding core: header resolution, record codec and write strategies

pub mod codec;
pub mod header;
pub mod lines;
pub mod strategy;
pub mod upsert;

pub use codec::{decode, decode_line, encode, encode_line};
pub use header::{resolve_fields, Field, FieldList};
pub use strategy::{write_records, WriteMode, WriteReport};
pub use upsert::{find_and_update, upsert, UpdateReport, UpsertReport};
