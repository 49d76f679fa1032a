use std::path::PathBuf;

/// Boxed error returned by fallible value producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Library-level structured errors for envreplace.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ReplaceError {
	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Unsupported value for replacement key {key}: expected string, number or boolean, found {kind}")]
	InvalidValue { key: String, kind: String },

	#[error("Replacement keys must not be empty")]
	EmptyKey,

	#[error("Invalid delimiters: {reason}")]
	InvalidDelimiters { reason: String },

	#[error("Invalid glob pattern: {pattern}")]
	InvalidGlob {
		pattern: String,
		#[source]
		source: globset::Error,
	},

	#[error("Failed to compile replacement pattern: {pattern}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Value for {key} failed while processing {context_id}")]
	ProducerFailed {
		key: String,
		context_id: String,
		#[source]
		source: BoxError,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using ReplaceError.
pub type Result<T> = std::result::Result<T, ReplaceError>;
