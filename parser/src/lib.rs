// Parser crate for Matrix chat dumps
// Splits a dump into records, normalizes them and derives stable message ids

pub mod types;
pub mod splitter;
pub mod extractor;
pub mod message_id;

// Delivery side
pub mod sink;
pub mod pipeline;

// Re-export main types
pub use types::*;
pub use splitter::{read_dump, split, records};
pub use extractor::extract;
pub use sink::{EventSink, SOURCE_TAG};
pub use pipeline::{prepare, ErrorPolicy, FeedError, FeedReport, Pipeline};
