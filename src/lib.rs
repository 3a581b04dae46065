pub mod api;
pub mod billing;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod reporting;
pub mod utils;
