//! Configuration loading and parsing for envreplace.
//!
//! This module handles:
//! - TOML config file parsing
//! - Splitting reserved flags from replacement values
//! - Config file discovery

pub mod discovery;
pub mod parser;
pub mod types;

pub use discovery::{
	CONFIG_FILE_NAME, discover_config, load_config, load_config_file, user_config_path,
};
pub use parser::{options_from_table, parse_config_file, parse_config_str};
pub use types::{LoadedConfig, Options, RESERVED_KEYS, is_reserved_key};
