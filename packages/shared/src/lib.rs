//! Shared utilities for the Idobata workspace.
//!
//! This crate provides logging setup and time helpers used by both the
//! server and the CLI client.

pub mod logger;
pub mod time;
