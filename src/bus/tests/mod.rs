//! Unit tests for the bus module.

mod broker_tests;
mod consume_loop_tests;
