//! Port trait definitions for the bus.

pub mod consumer;
pub mod handler;
pub mod producer;

pub use consumer::BusConsumer;
pub use handler::{HandlerError, RecordHandler};
pub use producer::BusProducer;
