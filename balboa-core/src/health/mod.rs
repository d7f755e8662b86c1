//! Link health monitoring
//!
//! Detects a silent bus and reports loss and recovery edges.

pub mod monitor;

pub use monitor::{LinkMonitor, LinkStatus, LinkTransition};
