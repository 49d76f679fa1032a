use crate::config::Options;
use crate::error::Result;
use crate::filter::Filter;
use crate::matcher::{CompiledMatcher, MatcherOptions, RewriteResult, rewrite};
use crate::table::{ReplacementTable, build_table, build_table_from_process_env};
use tracing::debug;

/// A configured replacement step.
///
/// Built once per configuration and reused for every text unit.
#[derive(Debug)]
pub struct Replacer {
	matcher: CompiledMatcher,
	filter: Filter,
	sourcemap: bool,
}

impl Replacer {
	/// Build a replacer, reading prefixed variables from the process
	/// environment.
	pub fn new(options: Options) -> Result<Self> {
		let table = build_table_from_process_env(&options.values)?;
		Self::from_parts(table, &options)
	}

	/// Build a replacer with an explicit environment.
	pub fn with_env<I, K, V>(options: Options, env: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let table = build_table(&options.values, env)?;
		Self::from_parts(table, &options)
	}

	fn from_parts(table: ReplacementTable, options: &Options) -> Result<Self> {
		let filter = Filter::new(
			&options.include,
			&options.exclude,
			options.base_dir.as_deref(),
		)?;
		let matcher = CompiledMatcher::compile(
			table,
			&MatcherOptions {
				delimiters: options.delimiters.clone(),
				prevent_assignment: options.prevent_assignment,
			},
		)?;

		Ok(Replacer {
			matcher,
			filter,
			sourcemap: options.sourcemap,
		})
	}

	/// Keys in match priority order.
	pub fn keys(&self) -> &[String] {
		self.matcher.keys()
	}

	pub fn matcher(&self) -> &CompiledMatcher {
		&self.matcher
	}

	/// Whether `context_id` is in scope for this replacer.
	pub fn is_included(&self, context_id: &str) -> bool {
		self.filter.matches(context_id)
	}

	/// Transform one text unit.
	///
	/// Returns `None` when the text should pass through unmodified: no keys,
	/// an excluded id, or no matches.
	pub fn transform(&self, code: &str, context_id: &str) -> Result<Option<RewriteResult>> {
		if self.matcher.is_empty() {
			return Ok(None);
		}
		if !self.filter.matches(context_id) {
			debug!(id = context_id, "excluded by filter");
			return Ok(None);
		}

		let result = rewrite(&self.matcher, code, context_id, self.sourcemap)?;
		if result.is_none() {
			debug!(id = context_id, "no replacements");
		}
		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::table::Replacement;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	const NO_ENV: [(&str, &str); 0] = [];

	fn replacer(options: Options) -> Replacer {
		Replacer::with_env(options.include(Vec::<String>::new()), NO_ENV).unwrap()
	}

	fn transform(replacer: &Replacer, code: &str) -> Option<String> {
		replacer
			.transform(code, "src/index.js")
			.unwrap()
			.map(|r| r.code)
	}

	#[test]
	fn test_word_boundary_default() {
		let r = replacer(Options::new().value("FOO", "X"));
		assert_eq!(transform(&r, "FOOBAR"), None);
		assert_eq!(transform(&r, "a FOO b"), Some("a X b".to_string()));
	}

	#[test]
	fn test_delimiter_mode() {
		let r = replacer(Options::new().value("FOO", "X").delimiters("<@", "@>"));
		assert_eq!(transform(&r, "<@FOO@>"), Some("X".to_string()));
		assert_eq!(transform(&r, "FOO"), None);
	}

	#[test]
	fn test_assignment_guard_default() {
		let r = replacer(Options::new().value("FOO", "X"));
		assert_eq!(transform(&r, "FOO = 1"), None);
		assert_eq!(transform(&r, "FOO == 1"), Some("X == 1".to_string()));
		assert_eq!(transform(&r, "x = FOO"), Some("x = X".to_string()));
	}

	#[test]
	fn test_assignment_guard_disabled() {
		let r = replacer(Options::new().value("FOO", "X").prevent_assignment(false));
		assert_eq!(transform(&r, "FOO = 1"), Some("X = 1".to_string()));
	}

	#[test]
	fn test_value_coercion_and_derived_keys() {
		let r = replacer(Options::new().value("N", 42_i64).value("S", "hi"));
		assert_eq!(transform(&r, "N"), Some("42".to_string()));
		assert_eq!(transform(&r, "process.env.S"), Some("\"hi\"".to_string()));
		assert_eq!(transform(&r, "process.env.N"), Some("42".to_string()));
	}

	#[test]
	fn test_float_same_text_for_bare_and_derived_keys() {
		let r = replacer(Options::new().value("F", 2.0));
		assert_eq!(transform(&r, "F"), Some("2".to_string()));
		assert_eq!(transform(&r, "process.env.F"), Some("2".to_string()));
	}

	#[test]
	fn test_empty_delimiters_match_inside_words() {
		let r = replacer(Options::new().value("FOO", "X").delimiters("", ""));
		assert_eq!(transform(&r, "aFOOb"), Some("aXb".to_string()));
	}

	#[test]
	fn test_bare_env_accessor_always_resolves() {
		let r = replacer(Options::new());
		assert_eq!(
			transform(&r, "const env = process.env;"),
			Some("const env = {};".to_string())
		);
		assert_eq!(
			transform(&r, "process.env.UNKNOWN"),
			Some("{}.UNKNOWN".to_string())
		);
	}

	#[test]
	fn test_prefixed_env_variables() {
		let options = Options::new().include(Vec::<String>::new());
		let r = Replacer::with_env(options, [("NUXT_ENV_TOKEN", "abc"), ("PATH", "/bin")]).unwrap();
		assert_eq!(
			transform(&r, "fetch(process.env.NUXT_ENV_TOKEN)"),
			Some("fetch(\"abc\")".to_string())
		);
		assert!(!r.keys().iter().any(|k| k == "process.env.PATH"));
	}

	#[test]
	fn test_excluded_id_passes_through() {
		let options = Options::new().value("FOO", "X");
		let r = Replacer::with_env(options, NO_ENV).unwrap();

		assert!(r.transform("FOO", "src/a.js").unwrap().is_some());
		assert!(r.transform("FOO", "lib/a.js").unwrap().is_none());
		assert!(!r.is_included("lib/a.js"));
	}

	#[test]
	fn test_exclude_pattern() {
		let options = Options::new()
			.value("FOO", "X")
			.exclude(["src/vendor/**"]);
		let r = Replacer::with_env(options, NO_ENV).unwrap();

		assert!(r.transform("FOO", "src/vendor/lib.js").unwrap().is_none());
		assert!(r.transform("FOO", "src/app.js").unwrap().is_some());
	}

	#[test]
	fn test_keys_sorted_longest_first() {
		let r = replacer(Options::new().value("A", "1").value("ABC", "2"));
		assert_eq!(
			r.keys(),
			&[
				"process.env.ABC",
				"process.env.A",
				"process.env",
				"ABC",
				"A"
			]
		);
	}

	#[test]
	fn test_function_values_get_context_id() {
		let r = replacer(Options::new().value(
			"__FILE__",
			Replacement::from_fn(|id| Ok(format!("'{id}'"))),
		));
		let result = r.transform("log(__FILE__)", "src/util/log.js").unwrap();
		assert_eq!(result.unwrap().code, "log('src/util/log.js')");
	}

	#[test]
	fn test_stateful_producer_called_per_occurrence() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let r = replacer(Options::new().value(
			"NEXT",
			Replacement::from_fn(move |_| Ok((counter.fetch_add(1, Ordering::SeqCst) + 1).to_string())),
		));

		assert_eq!(
			transform(&r, "[NEXT, NEXT, NEXT]"),
			Some("[1, 2, 3]".to_string())
		);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn test_sourcemap_toggle() {
		let with_map = replacer(Options::new().value("FOO", "X"));
		let result = with_map.transform("FOO", "a.js").unwrap().unwrap();
		assert!(result.map.is_some());

		let without_map = replacer(Options::new().value("FOO", "X").sourcemap(false));
		let result = without_map.transform("FOO", "a.js").unwrap().unwrap();
		assert!(result.map.is_none());
	}

	#[test]
	fn test_replacer_shared_across_threads() {
		let r = Arc::new(replacer(Options::new().value("FOO", "X")));
		let handles: Vec<_> = (0..4)
			.map(|i| {
				let r = Arc::clone(&r);
				std::thread::spawn(move || {
					let code = format!("{} FOO", i);
					r.transform(&code, "a.js").unwrap().unwrap().code
				})
			})
			.collect();

		for (i, handle) in handles.into_iter().enumerate() {
			assert_eq!(handle.join().unwrap(), format!("{} X", i));
		}
	}
}
