use crate::error::{ReplaceError, Result};
use crate::table::producer::{Literal, Replacement};
use std::collections::HashMap;
use tracing::debug;

/// Accessor prefix for environment-style keys.
pub const ENV_ACCESSOR: &str = "process.env";

/// Environment variables starting with this prefix are always exposed
/// as `process.env.<NAME>` keys.
pub const ENV_PREFIX: &str = "NUXT_ENV";

/// A single key and its value producer.
#[derive(Debug, Clone)]
pub struct Entry {
	pub key: String,
	pub value: Replacement,
}

/// An ordered set of distinct replacement keys.
///
/// Inserting an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct ReplacementTable {
	entries: Vec<Entry>,
	index: HashMap<String, usize>,
}

impl ReplacementTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace a key.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Replacement>) {
		let key = key.into();
		let value = value.into();
		if let Some(&i) = self.index.get(&key) {
			self.entries[i].value = value;
		} else {
			self.index.insert(key.clone(), self.entries.len());
			self.entries.push(Entry { key, value });
		}
	}

	pub fn get(&self, key: &str) -> Option<&Replacement> {
		self.index.get(key).map(|&i| &self.entries[i].value)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.index.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Entry> {
		self.entries.iter()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|e| e.key.as_str())
	}
}

impl<K, V> FromIterator<(K, V)> for ReplacementTable
where
	K: Into<String>,
	V: Into<Replacement>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut table = ReplacementTable::new();
		for (key, value) in iter {
			table.insert(key, value);
		}
		table
	}
}

/// Build the full replacement table from configured values and the
/// process environment.
///
/// Every configured key `K` also gets a `process.env.K` key whose value is
/// the JSON form of the original. Environment variables starting with
/// [`ENV_PREFIX`] are exposed the same way, and a bare `process.env` key
/// resolving to `{}` is added unless one already exists.
pub fn build_table<I, K, V>(values: &ReplacementTable, env: I) -> Result<ReplacementTable>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut table = values.clone();

	for entry in values.iter() {
		if entry.key.is_empty() {
			return Err(ReplaceError::EmptyKey);
		}
		table.insert(
			format!("{ENV_ACCESSOR}.{}", entry.key),
			entry.value.json_quoted(),
		);
	}

	for (name, value) in env {
		let name = name.as_ref();
		if name.starts_with(ENV_PREFIX) {
			let json = Literal::String(value.as_ref().to_string()).to_json();
			table.insert(format!("{ENV_ACCESSOR}.{name}"), json);
		}
	}

	if !table.contains_key(ENV_ACCESSOR) {
		table.insert(ENV_ACCESSOR, "{}");
	}

	debug!(
		configured = values.len(),
		total = table.len(),
		"built replacement table"
	);

	Ok(table)
}

/// Build the replacement table using the current process environment.
pub fn build_table_from_process_env(values: &ReplacementTable) -> Result<ReplacementTable> {
	build_table(values, std::env::vars())
}
