//! HTTP middleware for the host

pub mod limits;

pub use limits::HeaderLimits;
