//! Delivery adapters.

pub mod channel;
pub mod memory;
pub mod postgres;
