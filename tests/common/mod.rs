// tests/common/mod.rs
//! Shared fixtures for the integration tests.

pub mod mock_backend;

pub use mock_backend::MockBackend;
