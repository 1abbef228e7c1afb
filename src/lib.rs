// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod logging;
pub mod runtime;
pub mod scores;
pub mod service;
pub mod words;
