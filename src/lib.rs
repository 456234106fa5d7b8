pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod launcher;
pub mod metrics;
pub mod preset;
pub mod shutdown;
pub mod submit;
