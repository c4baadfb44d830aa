//! Subcommand implementations

pub mod audit;
pub mod caption;
pub mod config;
pub mod doctor;
pub mod run;
