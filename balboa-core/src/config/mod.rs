//! Configuration types
//!
//! Board-agnostic configuration structures and their TOML loader.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
