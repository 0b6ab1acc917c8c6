pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod evaluator;
pub mod pipeline;
pub mod report;
pub mod transcript;
pub mod youtube;

#[cfg(test)]
mod test_http;
