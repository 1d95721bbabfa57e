//! Unit tests for the agent module.

mod assistant_tests;
mod prompt_tests;
mod support;
