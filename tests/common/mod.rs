//! Shared test helpers

pub mod mocks;
