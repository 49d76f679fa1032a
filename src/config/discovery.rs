use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, Options};
use crate::error::{ReplaceError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the config file looked up during discovery.
pub const CONFIG_FILE_NAME: &str = ".envreplace.toml";

/// Find the config file that applies to `start_dir`.
///
/// The lookup order is:
/// 1. `start_dir` and each of its parents, nearest first
/// 2. `~/.envreplace.toml`
///
/// Returns `None` if no config file exists.
pub fn discover_config(start_dir: &Path) -> Result<Option<PathBuf>> {
	let home_dir = dirs::home_dir();
	Ok(find_config(start_dir, home_dir.as_deref()))
}

fn find_config(start_dir: &Path, home_dir: Option<&Path>) -> Option<PathBuf> {
	let mut current_dir = Some(start_dir);

	while let Some(dir) = current_dir {
		let config_path = dir.join(CONFIG_FILE_NAME);
		if config_path.is_file() {
			return Some(config_path);
		}
		current_dir = dir.parent();
	}

	// No home directory means no user config.
	let user_config = home_dir?.join(CONFIG_FILE_NAME);
	user_config.is_file().then_some(user_config)
}

/// Discover and load the config for `start_dir`.
///
/// Without a config file the default options are used. Absolute ids are
/// filtered relative to `start_dir` either way.
pub fn load_config(start_dir: &Path) -> Result<LoadedConfig> {
	let path = discover_config(start_dir)?;
	let options = match &path {
		Some(path) => {
			debug!(path = %path.display(), "loading config");
			parse_config_file(path)?
		}
		None => {
			debug!(dir = %start_dir.display(), "no config file found, using defaults");
			Options::default()
		}
	};

	Ok(LoadedConfig {
		options: options.base_dir(start_dir),
		path,
	})
}

/// Load an explicitly named config file.
pub fn load_config_file(path: &Path, base_dir: &Path) -> Result<LoadedConfig> {
	if !path.is_file() {
		return Err(ReplaceError::ConfigNotFound {
			path: path.to_path_buf(),
		});
	}

	let options = parse_config_file(path)?;
	Ok(LoadedConfig {
		options: options.base_dir(base_dir),
		path: Some(path.to_path_buf()),
	})
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(ReplaceError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn test_discover_nearest_config() {
		let temp_dir = tempfile::tempdir().unwrap();
		let nested = temp_dir.path().join("a/b");
		fs::create_dir_all(&nested).unwrap();

		fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "OUTER = 1").unwrap();
		fs::write(temp_dir.path().join("a").join(CONFIG_FILE_NAME), "INNER = 1").unwrap();

		let found = discover_config(&nested).unwrap();
		assert_eq!(found, Some(temp_dir.path().join("a").join(CONFIG_FILE_NAME)));
	}

	#[test]
	fn test_missing_home_is_not_an_error() {
		let temp_dir = tempfile::tempdir().unwrap();
		assert_eq!(find_config(temp_dir.path(), None), None);
	}

	#[test]
	fn test_falls_back_to_home_config() {
		let project = tempfile::tempdir().unwrap();
		let home = tempfile::tempdir().unwrap();
		fs::write(home.path().join(CONFIG_FILE_NAME), "FOO = 1").unwrap();

		assert_eq!(
			find_config(project.path(), Some(home.path())),
			Some(home.path().join(CONFIG_FILE_NAME))
		);
	}

	#[test]
	fn test_load_config_sets_base_dir() {
		let temp_dir = tempfile::tempdir().unwrap();
		fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "FOO = \"bar\"").unwrap();

		let loaded = load_config(temp_dir.path()).unwrap();
		assert_eq!(loaded.path, Some(temp_dir.path().join(CONFIG_FILE_NAME)));
		assert_eq!(loaded.options.base_dir.as_deref(), Some(temp_dir.path()));
		assert!(loaded.options.values.contains_key("FOO"));
	}

	#[test]
	fn test_load_missing_explicit_config() {
		let temp_dir = tempfile::tempdir().unwrap();
		let missing = temp_dir.path().join("nope.toml");

		match load_config_file(&missing, temp_dir.path()).unwrap_err() {
			ReplaceError::ConfigNotFound { path } => assert_eq!(path, missing),
			_ => panic!("Expected ConfigNotFound error"),
		}
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path();
		assert!(path.is_ok());
		let path = path.unwrap();
		assert!(path.ends_with(CONFIG_FILE_NAME));
	}
}
