//! Replacement table construction for envreplace.
//!
//! This module handles:
//! - Literal and function value producers
//! - Ordered, de-duplicated key tables
//! - Synthesis of `process.env.*` keys from configuration and environment

pub mod builder;
pub mod producer;

pub use builder::{
	ENV_ACCESSOR, ENV_PREFIX, Entry, ReplacementTable, build_table, build_table_from_process_env,
};
pub use producer::{Literal, Replacement, ValueProducer};
