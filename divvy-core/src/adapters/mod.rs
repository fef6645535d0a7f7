//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - HTTP client for the Divvy server (the real system of record)
//! - In-memory demo provider for demo mode and trait-level test mocking

pub mod demo;
pub mod http;

pub use demo::DemoProvider;
pub use http::HttpProvider;
