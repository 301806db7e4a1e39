pub mod app;
pub mod cli;
pub mod config;
pub mod document;
pub mod export;
pub mod highlight;
pub mod index;
pub mod remote;
pub mod search;
pub mod tutorial;
pub mod ui;
pub mod viewer;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
