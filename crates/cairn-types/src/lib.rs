//! Foundation types for the cairn shell.
//!
//! This crate holds the pieces shared by the engine and the binary: the
//! error taxonomy and the TOML configuration.

pub mod config;
pub mod error;
