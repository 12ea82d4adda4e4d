// Common fixtures for integration tests

pub mod fixtures;

pub use fixtures::*;
