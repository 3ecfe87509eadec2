//! Integration tests with mock HTTP endpoints

mod executor;
mod mock_server;
mod scheduler;
