//! Step definitions for delivery ordering scenarios.

mod given;
mod then;
mod when;
pub mod world;
