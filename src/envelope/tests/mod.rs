//! Unit tests for the envelope module.

mod envelope_tests;
