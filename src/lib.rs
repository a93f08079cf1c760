pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod memo;
pub mod metrics;
pub mod payload;
pub mod phone;
pub mod qualifier;
pub mod report;
pub mod server;
pub mod table;

// Application use cases and the adapters they are wired to
pub mod app;
pub mod infra;
