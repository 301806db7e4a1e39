//! Gazette index: CSV records, the draft set, and index construction.

mod builder;
mod record;

pub use builder::{build_index, DraftSet, Index, IndexOptions, DEFAULT_MAX_ENTRIES};
pub use record::{file_name_of, file_stem_of, parse_records, Record, PLACEHOLDER_ID};
