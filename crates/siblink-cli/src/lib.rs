//! siblink CLI library
//!
//! Configuration loading, argument parsing and the `scan`, `watch` and
//! `init` commands behind the `siblink` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod notifier;
