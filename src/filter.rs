use crate::error::{ReplaceError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

/// Include pattern used when none is configured.
pub const DEFAULT_INCLUDE: &str = "./src/**/*";

/// Decides which context ids (file paths) are transformed.
#[derive(Debug, Clone)]
pub struct Filter {
	include: Option<GlobSet>,
	exclude: GlobSet,
	base_dir: Option<PathBuf>,
}

impl Filter {
	/// Build a filter from include and exclude globs.
	///
	/// An empty include list admits every id. Absolute ids under `base_dir`
	/// are matched relative to it.
	pub fn new(include: &[String], exclude: &[String], base_dir: Option<&Path>) -> Result<Self> {
		let include = if include.is_empty() {
			None
		} else {
			Some(build_glob_set(include)?)
		};

		Ok(Filter {
			include,
			exclude: build_glob_set(exclude)?,
			base_dir: base_dir.map(Path::to_path_buf),
		})
	}

	/// Whether `id` should be transformed.
	pub fn matches(&self, id: &str) -> bool {
		// Ids with a NUL byte belong to virtual modules.
		if id.contains('\0') {
			return false;
		}

		let normalized = self.normalize(id);
		if self.exclude.is_match(&normalized) {
			return false;
		}

		self.include
			.as_ref()
			.is_none_or(|include| include.is_match(&normalized))
	}

	fn normalize(&self, id: &str) -> String {
		let path = Path::new(id);
		let relative = match &self.base_dir {
			Some(base) if path.is_absolute() => path.strip_prefix(base).unwrap_or(path),
			_ => path,
		};
		let id = relative.to_string_lossy().replace('\\', "/");
		strip_dot_slash(&id).to_string()
	}
}

fn strip_dot_slash(s: &str) -> &str {
	let mut s = s;
	while let Some(rest) = s.strip_prefix("./") {
		s = rest;
	}
	s
}

/// Build a `GlobSet` from a list of glob pattern strings.
///
/// `*` stops at `/`; only `**` crosses directories.
fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let normalized = strip_dot_slash(pattern);
		let glob = GlobBuilder::new(normalized)
			.literal_separator(true)
			.build()
			.map_err(|source| ReplaceError::InvalidGlob {
				pattern: pattern.clone(),
				source,
			})?;
		builder.add(glob);
	}
	builder.build().map_err(|source| ReplaceError::InvalidGlob {
		pattern: patterns.join(", "),
		source,
	})
}
