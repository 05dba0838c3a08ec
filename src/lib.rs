// Library target shared by the binary, integration tests, and criterion
// benchmarks. The binary entry point is main.rs.

pub mod app;
pub mod config;
pub mod deck;
pub mod engine;
pub mod error;
pub mod event;
pub mod feedback;
pub mod logging;
pub mod session;
pub mod store;
pub mod ui;
