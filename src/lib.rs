//! ffkit - command-line front end for ffkit-av
//!
//! This library crate exposes the CLI definition and configuration loading
//! for integration testing.

pub mod cli;
pub mod config;
