pub mod action;
pub mod config;
pub mod project;
pub mod report;
pub mod runner;
pub mod style;
pub mod surefire;
pub mod swap;

pub use crate::config::Config;
