//! CLI commands.

pub mod apps;
pub mod catalog;
pub mod common;
pub mod config;
pub mod duplicates;
pub mod install;
pub mod languages;
pub mod plan;
pub mod script;
