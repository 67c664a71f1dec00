pub mod config;
pub mod languages;
pub mod report;
pub mod types;
