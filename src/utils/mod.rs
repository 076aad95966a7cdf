//! Shared utilities for the host

pub mod error;
