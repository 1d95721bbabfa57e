//! Unit tests for the delivery module.

mod gateway_tests;
mod support;
