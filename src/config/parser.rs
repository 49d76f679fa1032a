use crate::config::types::{Flags, Options, is_reserved_key};
use crate::error::{ReplaceError, Result};
use crate::table::{Literal, Replacement, ReplacementTable};
use std::path::Path;
use tracing::debug;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Options> {
	let content = std::fs::read_to_string(path).map_err(|source| ReplaceError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Options> {
	let table: toml::Table =
		toml::from_str(content).map_err(|source| ReplaceError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	options_from_table(table, path)
}

/// Normalize a config table into [`Options`].
///
/// Reserved keys are read as flags. If a `values` table is present it is the
/// only source of replacements; otherwise every other top-level key is one.
pub fn options_from_table(table: toml::Table, path: &Path) -> Result<Options> {
	let (reserved, rest): (toml::Table, toml::Table) =
		table.into_iter().partition(|(key, _)| is_reserved_key(key));

	let flags: Flags = toml::Value::Table(reserved).try_into().map_err(|source| {
		ReplaceError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		}
	})?;

	let mut options = Options::default();

	if let Some(include) = flags.include {
		options.include = include.into_vec();
	}
	if let Some(exclude) = flags.exclude {
		options.exclude = exclude.into_vec();
	}
	if let Some(delimiters) = flags.delimiters {
		options.delimiters = Some(parse_delimiters(delimiters)?);
	}
	if let Some(prevent_assignment) = flags.prevent_assignment {
		options.prevent_assignment = prevent_assignment;
	}
	options.sourcemap = flags.sourcemap != Some(false) && flags.source_map != Some(false);

	options.values = match flags.values {
		Some(values) => {
			if !rest.is_empty() {
				debug!(
					ignored = rest.len(),
					"`values` table present, ignoring top-level keys"
				);
			}
			values_from_table(values)?
		}
		None => values_from_table(rest)?,
	};

	Ok(options)
}

fn parse_delimiters(delimiters: Vec<String>) -> Result<(String, String)> {
	match <[String; 2]>::try_from(delimiters) {
		Ok([open, close]) => Ok((open, close)),
		Err(delimiters) => Err(ReplaceError::InvalidDelimiters {
			reason: format!("expected 2 strings, found {}", delimiters.len()),
		}),
	}
}

fn values_from_table(table: toml::Table) -> Result<ReplacementTable> {
	let mut values = ReplacementTable::new();
	for (key, value) in table {
		if key.is_empty() {
			return Err(ReplaceError::EmptyKey);
		}
		let literal = match value {
			toml::Value::String(s) => Literal::String(s),
			toml::Value::Integer(i) => Literal::Integer(i),
			toml::Value::Float(f) => Literal::Float(f),
			toml::Value::Boolean(b) => Literal::Boolean(b),
			other => {
				return Err(ReplaceError::InvalidValue {
					key,
					kind: other.type_str().to_string(),
				});
			}
		};
		values.insert(key, Replacement::Literal(literal));
	}
	Ok(values)
}
