//! Bus domain types.

mod partition;
mod record;

pub use partition::partition_for_key;
pub use record::{BusRecord, RecordPosition};
