//! Shared fixtures for delivery integration tests

pub mod mock_server;
