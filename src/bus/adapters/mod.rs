//! Bus adapters.
//!
//! - [`memory::InMemoryBus`]: partitioned in-process broker used by the local
//!   pipeline and by tests

pub mod memory;
