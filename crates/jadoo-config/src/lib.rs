//! Configuration parsing for jadoo
//!
//! This crate handles parsing the KDL configuration file: the key sequence,
//! the ambient element policy and the sound cue bindings.

mod error;
mod model;
mod parser;

pub use error::{ConfigError, InvalidSymbolInfo};
pub use model::*;
pub use parser::{load_config, parse_config, parse_config_str};
