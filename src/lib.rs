#![forbid(unsafe_code)]

pub mod bestsellers;
pub mod cli;
pub mod config;
pub mod error;
pub mod formats;
pub mod logging;
pub mod nyt;
pub mod ollama;
pub mod preview;
pub mod report;
pub mod snapshot;
