pub mod cli;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod render;
pub mod session;
pub mod upload;
