pub mod config;
pub mod runner;
pub mod services;
pub mod types;
