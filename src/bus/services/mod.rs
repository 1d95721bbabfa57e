//! Bus services.

mod consume_loop;
mod publisher;

pub use consume_loop::{ConsumeLoop, ConsumeSettings, RecordDisposition};
pub use publisher::EnvelopePublisher;
