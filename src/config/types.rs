use crate::filter::DEFAULT_INCLUDE;
use crate::table::{Replacement, ReplacementTable};
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level keys that configure the replacer instead of naming a
/// replacement.
pub const RESERVED_KEYS: &[&str] = &[
	"include",
	"exclude",
	"delimiters",
	"preventAssignment",
	"prevent-assignment",
	"prevent_assignment",
	"sourcemap",
	"sourceMap",
	"values",
];

/// Returns true if `key` is a reserved configuration name.
pub fn is_reserved_key(key: &str) -> bool {
	RESERVED_KEYS.contains(&key)
}

/// Normalized replacer configuration.
#[derive(Debug, Clone)]
pub struct Options {
	/// Globs of ids to transform. Empty means everything.
	pub include: Vec<String>,

	/// Globs of ids to skip, even if included.
	pub exclude: Vec<String>,

	/// Opening and closing markers around keys. Without them keys match as
	/// whole identifiers.
	pub delimiters: Option<(String, String)>,

	/// Leave keys alone when they are the target of a bare `=`.
	pub prevent_assignment: bool,

	/// Produce position maps for rewritten text.
	pub sourcemap: bool,

	/// Configured replacement values, in configuration order.
	pub values: ReplacementTable,

	/// Directory absolute ids are resolved against when filtering.
	pub base_dir: Option<PathBuf>,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			include: vec![DEFAULT_INCLUDE.to_string()],
			exclude: Vec::new(),
			delimiters: None,
			prevent_assignment: true,
			sourcemap: true,
			values: ReplacementTable::new(),
			base_dir: None,
		}
	}
}

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add or replace a replacement value.
	pub fn value(mut self, key: impl Into<String>, value: impl Into<Replacement>) -> Self {
		self.values.insert(key, value);
		self
	}

	pub fn include<I, S>(mut self, patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.include = patterns.into_iter().map(Into::into).collect();
		self
	}

	pub fn exclude<I, S>(mut self, patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exclude = patterns.into_iter().map(Into::into).collect();
		self
	}

	pub fn delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
		self.delimiters = Some((open.into(), close.into()));
		self
	}

	pub fn prevent_assignment(mut self, enabled: bool) -> Self {
		self.prevent_assignment = enabled;
		self
	}

	pub fn sourcemap(mut self, enabled: bool) -> Self {
		self.sourcemap = enabled;
		self
	}

	pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.base_dir = Some(dir.into());
		self
	}
}

/// The reserved part of a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Flags {
	#[serde(default)]
	pub include: Option<Patterns>,

	#[serde(default)]
	pub exclude: Option<Patterns>,

	#[serde(default)]
	pub delimiters: Option<Vec<String>>,

	#[serde(default, alias = "prevent-assignment", alias = "prevent_assignment")]
	pub prevent_assignment: Option<bool>,

	#[serde(default)]
	pub sourcemap: Option<bool>,

	#[serde(default, rename = "sourceMap")]
	pub source_map: Option<bool>,

	#[serde(default)]
	pub values: Option<toml::Table>,
}

/// One glob or a list of globs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Patterns {
	One(String),
	Many(Vec<String>),
}

impl Patterns {
	pub fn into_vec(self) -> Vec<String> {
		match self {
			Patterns::One(pattern) => vec![pattern],
			Patterns::Many(patterns) => patterns,
		}
	}
}

/// Options loaded from disk, with the file they came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The normalized options.
	pub options: Options,

	/// The config file, if one was found.
	pub path: Option<PathBuf>,
}
