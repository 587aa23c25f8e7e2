pub mod config;
pub mod errors;
pub mod jobs;
pub mod rules;
pub mod services;
