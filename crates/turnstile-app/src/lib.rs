pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pipeline_handler;
pub mod seed;
