use crate::error::{ReplaceError, Result};
use crate::table::{Replacement, ReplacementTable};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use tracing::{debug, trace};

/// ASCII word boundary, matching `\b` of the JavaScript pattern language.
const WORD_BOUNDARY: &str = r"(?-u:\b)";

/// Options that shape the compiled pattern.
#[derive(Debug, Clone)]
pub struct MatcherOptions {
	/// Opening and closing markers that must surround a key.
	pub delimiters: Option<(String, String)>,

	/// Skip matches that are the target of a bare `=` assignment.
	pub prevent_assignment: bool,
}

impl Default for MatcherOptions {
	fn default() -> Self {
		Self {
			delimiters: None,
			prevent_assignment: true,
		}
	}
}

/// Characters with syntactic meaning in a pattern.
const META_CHARACTERS: &[char] = &[
	'\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$', '-', '#', '&', '~',
];

/// Escape a key for literal use inside a pattern.
///
/// `/` has no special meaning in this pattern language and is kept as-is.
pub fn escape(key: &str) -> String {
	let mut escaped = String::with_capacity(key.len());
	for c in key.chars() {
		if META_CHARACTERS.contains(&c) {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

/// Sort keys longest-first, keeping the original order among equal lengths.
pub fn sort_longest_first<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	let mut keys: Vec<String> = keys.into_iter().map(str::to_string).collect();
	keys.sort_by(|a, b| b.len().cmp(&a.len()));
	keys
}

/// Build the pattern source for an already sorted key list.
pub fn build_pattern(sorted_keys: &[String], delimiters: Option<(&str, &str)>) -> String {
	let alternation = sorted_keys
		.iter()
		.map(|k| escape(k))
		.collect::<Vec<_>>()
		.join("|");

	match delimiters {
		Some((open, close)) => format!("{}({}){}", escape(open), alternation, escape(close)),
		None => format!("{WORD_BOUNDARY}({alternation}){WORD_BOUNDARY}"),
	}
}

/// A single match of a replacement key in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMatch<'m> {
	/// Start of the matched span, delimiters included.
	pub start: usize,

	/// End of the matched span, delimiters included.
	pub end: usize,

	/// The key that matched.
	pub key: &'m str,
}

/// A pattern compiled from a replacement table.
///
/// Immutable once built. Every scan keeps its own cursor, so one matcher can
/// be shared across texts and threads.
#[derive(Debug)]
pub struct CompiledMatcher {
	regex: Regex,
	keys: Vec<String>,
	rank: HashMap<String, usize>,
	table: ReplacementTable,
	delimiters: Option<(String, String)>,
	prevent_assignment: bool,
}

impl CompiledMatcher {
	/// Compile a matcher for `table`.
	pub fn compile(table: ReplacementTable, options: &MatcherOptions) -> Result<Self> {
		if table.keys().any(str::is_empty) {
			return Err(ReplaceError::EmptyKey);
		}

		let keys = sort_longest_first(table.keys());
		let rank = keys
			.iter()
			.enumerate()
			.map(|(i, k)| (k.clone(), i))
			.collect();

		let delimiters = options
			.delimiters
			.as_ref()
			.map(|(open, close)| (open.as_str(), close.as_str()));
		let pattern = build_pattern(&keys, delimiters);
		let regex = RegexBuilder::new(&pattern)
			.build()
			.map_err(|source| ReplaceError::InvalidPattern {
				pattern: pattern.clone(),
				source,
			})?;

		debug!(
			keys = keys.len(),
			pattern_len = pattern.len(),
			delimited = options.delimiters.is_some(),
			prevent_assignment = options.prevent_assignment,
			"compiled replacement pattern"
		);

		Ok(CompiledMatcher {
			regex,
			keys,
			rank,
			table,
			delimiters: options.delimiters.clone(),
			prevent_assignment: options.prevent_assignment,
		})
	}

	/// The pattern source.
	pub fn pattern(&self) -> &str {
		self.regex.as_str()
	}

	/// Keys in match priority order (longest first).
	pub fn keys(&self) -> &[String] {
		&self.keys
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	pub fn table(&self) -> &ReplacementTable {
		&self.table
	}

	/// Value producer for a matched key.
	pub fn replacement(&self, key: &str) -> Option<&Replacement> {
		self.table.get(key)
	}

	/// All non-overlapping matches in `text`, left to right.
	pub fn find_iter<'m, 't>(&'m self, text: &'t str) -> KeyMatches<'m, 't> {
		KeyMatches {
			matcher: self,
			text,
			pos: 0,
		}
	}

	/// Whether `key` (with delimiters, if any) matches at `start`.
	/// Returns the end of the span.
	fn match_key_at(&self, text: &str, start: usize, key: &str) -> Option<usize> {
		let rest = text.get(start..)?;
		match &self.delimiters {
			Some((open, close)) => {
				let rest = rest.strip_prefix(open.as_str())?;
				let rest = rest.strip_prefix(key)?;
				rest.starts_with(close.as_str())
					.then(|| start + open.len() + key.len() + close.len())
			}
			None => {
				let end = start + key.len();
				(rest.starts_with(key)
					&& is_word_boundary(text, start)
					&& is_word_boundary(text, end))
				.then_some(end)
			}
		}
	}

	fn accepts(&self, text: &str, end: usize) -> bool {
		!(self.prevent_assignment && is_assignment_target(text, end))
	}
}

/// Iterator over the matches of a [`CompiledMatcher`] in one text.
#[derive(Debug)]
pub struct KeyMatches<'m, 't> {
	matcher: &'m CompiledMatcher,
	text: &'t str,
	pos: usize,
}

impl<'m> Iterator for KeyMatches<'m, '_> {
	type Item = KeyMatch<'m>;

	fn next(&mut self) -> Option<Self::Item> {
		let matcher = self.matcher;
		let text = self.text;
		if matcher.is_empty() {
			return None;
		}

		while self.pos <= text.len() {
			let caps = matcher.regex.captures_at(text, self.pos)?;
			let whole = caps.get(0)?;
			let start = whole.start();
			let first = *matcher.rank.get(caps.get(1)?.as_str())?;

			// A guarded match falls back to shorter keys at the same start
			// before the scan moves on.
			let found = std::iter::once((first, whole.end()))
				.chain(matcher.keys[first + 1..].iter().enumerate().filter_map(
					|(offset, key)| {
						matcher
							.match_key_at(text, start, key)
							.map(|end| (first + 1 + offset, end))
					},
				))
				.find(|&(_, end)| {
					let accepted = matcher.accepts(text, end);
					if !accepted {
						debug!(start, end, "skipping assignment target");
					}
					accepted
				});

			if let Some((rank, end)) = found {
				self.pos = if end > start {
					end
				} else {
					next_char_boundary(text, start)
				};
				let key = matcher.keys[rank].as_str();
				trace!(key, start, end, "matched replacement key");
				return Some(KeyMatch { start, end, key });
			}

			self.pos = next_char_boundary(text, start);
		}

		None
	}
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
	text[pos..]
		.chars()
		.next()
		.map_or(pos + 1, |c| pos + c.len_utf8())
}

fn is_word_byte(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b == b'_'
}

/// ASCII word boundary at byte offset `pos`.
fn is_word_boundary(text: &str, pos: usize) -> bool {
	let bytes = text.as_bytes();
	let before = pos > 0 && bytes.get(pos - 1).copied().is_some_and(is_word_byte);
	let after = bytes.get(pos).copied().is_some_and(is_word_byte);
	before != after
}

/// Whitespace as understood by `\s` in the JavaScript pattern language.
fn is_pattern_whitespace(c: char) -> bool {
	(c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// True when the text at `end` is optional whitespace, a single `=`, and one
/// more character that is not `=`.
pub fn is_assignment_target(text: &str, end: usize) -> bool {
	let Some(rest) = text.get(end..) else {
		return false;
	};
	let mut chars = rest.trim_start_matches(is_pattern_whitespace).chars();
	chars.next() == Some('=') && chars.next().is_some_and(|c| c != '=')
}

#[cfg(test)]
mod tests {
	use super::*;

	fn compile(pairs: &[(&str, &str)], options: MatcherOptions) -> CompiledMatcher {
		let table: ReplacementTable = pairs.iter().copied().collect();
		CompiledMatcher::compile(table, &options).unwrap()
	}

	fn matched_keys(matcher: &CompiledMatcher, text: &str) -> Vec<String> {
		matcher
			.find_iter(text)
			.map(|m| m.key.to_string())
			.collect()
	}

	fn delimited(open: &str, close: &str) -> MatcherOptions {
		MatcherOptions {
			delimiters: Some((open.to_string(), close.to_string())),
			..Default::default()
		}
	}

	#[test]
	fn test_escape_metacharacters() {
		assert_eq!(escape("process.env.FOO"), r"process\.env\.FOO");
		assert_eq!(escape("a+b*c?"), r"a\+b\*c\?");
		assert_eq!(escape("[x]{y}(z)"), r"\[x\]\{y\}\(z\)");
		assert_eq!(escape(r"^a|b$\"), r"\^a\|b\$\\");
		assert_eq!(escape("a-b"), r"a\-b");
		assert_eq!(escape("a/b"), "a/b");
		assert_eq!(escape("plain_KEY1"), "plain_KEY1");
	}

	#[test]
	fn test_escaped_keys_compile_as_literals() {
		for key in ["a.b", "(x)", "[y]", "z+", "$HOME", "a|b", r"back\slash", "{c}"] {
			let regex = Regex::new(&format!("^{}$", escape(key))).unwrap();
			assert!(regex.is_match(key), "{key} should match itself");
		}
		let regex = Regex::new(&escape("a.b")).unwrap();
		assert!(!regex.is_match("axb"));
	}

	#[test]
	fn test_sort_longest_first_is_stable() {
		let sorted = sort_longest_first(["A", "BB", "C", "DDD", "EE"]);
		assert_eq!(sorted, vec!["DDD", "BB", "EE", "A", "C"]);
	}

	#[test]
	fn test_build_pattern_word_mode() {
		let keys = vec!["AB".to_string(), "A".to_string()];
		assert_eq!(build_pattern(&keys, None), r"(?-u:\b)(AB|A)(?-u:\b)");
	}

	#[test]
	fn test_build_pattern_delimiter_mode() {
		let keys = vec!["FOO".to_string()];
		assert_eq!(build_pattern(&keys, Some(("<@", "@>"))), "<@(FOO)@>");
		assert_eq!(build_pattern(&keys, Some(("${", "}"))), r"\$\{(FOO)\}");
	}

	#[test]
	fn test_longest_match_wins() {
		let matcher = compile(&[("A", "1"), ("AB", "2")], MatcherOptions::default());
		assert_eq!(matched_keys(&matcher, "AB"), vec!["AB"]);
		assert_eq!(matched_keys(&matcher, "A AB"), vec!["A", "AB"]);
	}

	#[test]
	fn test_whole_identifier_only() {
		let matcher = compile(&[("FOO", "X")], MatcherOptions::default());
		assert!(matched_keys(&matcher, "FOOBAR").is_empty());
		assert!(matched_keys(&matcher, "_FOO").is_empty());
		assert_eq!(matched_keys(&matcher, "a FOO b"), vec!["FOO"]);
		assert_eq!(matched_keys(&matcher, "(FOO)"), vec!["FOO"]);
		assert_eq!(matched_keys(&matcher, "éFOO"), vec!["FOO"]);
	}

	#[test]
	fn test_delimiter_mode() {
		let matcher = compile(&[("FOO", "X")], delimited("<@", "@>"));
		let matches: Vec<_> = matcher.find_iter("<@FOO@>").collect();
		assert_eq!(
			matches,
			vec![KeyMatch {
				start: 0,
				end: 7,
				key: "FOO"
			}]
		);
		assert!(matched_keys(&matcher, "FOO").is_empty());
		assert_eq!(matched_keys(&matcher, "x<@FOO@>y"), vec!["FOO"]);
	}

	#[test]
	fn test_empty_closing_delimiter() {
		let matcher = compile(&[("FOO", "X")], delimited("$", ""));
		assert_eq!(matched_keys(&matcher, "a $FOO b FOO"), vec!["FOO"]);
	}

	#[test]
	fn test_empty_delimiters_drop_word_boundaries() {
		let matcher = compile(&[("FOO", "X")], delimited("", ""));
		let matches: Vec<_> = matcher.find_iter("aFOOb").collect();
		assert_eq!(
			matches,
			vec![KeyMatch {
				start: 1,
				end: 4,
				key: "FOO"
			}]
		);
	}

	#[test]
	fn test_assignment_guard() {
		let matcher = compile(&[("FOO", "X")], MatcherOptions::default());
		assert!(matched_keys(&matcher, "FOO = 1").is_empty());
		assert!(matched_keys(&matcher, "FOO=1").is_empty());
		assert!(matched_keys(&matcher, "FOO\n\t= 1").is_empty());
		assert_eq!(matched_keys(&matcher, "FOO == 1"), vec!["FOO"]);
		assert_eq!(matched_keys(&matcher, "FOO === 1"), vec!["FOO"]);
		assert_eq!(matched_keys(&matcher, "x = FOO"), vec!["FOO"]);
		assert_eq!(matched_keys(&matcher, "FOO =>"), vec![] as Vec<String>);
	}

	#[test]
	fn test_assignment_guard_needs_following_character() {
		let matcher = compile(&[("FOO", "X")], MatcherOptions::default());
		assert_eq!(matched_keys(&matcher, "FOO ="), vec!["FOO"]);
	}

	#[test]
	fn test_assignment_guard_disabled() {
		let options = MatcherOptions {
			prevent_assignment: false,
			..Default::default()
		};
		let matcher = compile(&[("FOO", "X")], options);
		assert_eq!(matched_keys(&matcher, "FOO = 1"), vec!["FOO"]);
	}

	#[test]
	fn test_guard_falls_back_to_shorter_key() {
		let matcher = compile(
			&[("process.env", "{}"), ("process.env.FOO", "\"x\"")],
			MatcherOptions::default(),
		);
		let matches: Vec<_> = matcher.find_iter("process.env.FOO = 1").collect();
		assert_eq!(
			matches,
			vec![KeyMatch {
				start: 0,
				end: 11,
				key: "process.env"
			}]
		);
	}

	#[test]
	fn test_guard_in_delimiter_mode() {
		let matcher = compile(&[("FOO", "X")], delimited("<@", "@>"));
		assert!(matched_keys(&matcher, "<@FOO@> = 1").is_empty());
		assert_eq!(matched_keys(&matcher, "<@FOO@> == 1"), vec!["FOO"]);
	}

	#[test]
	fn test_scan_is_independent_per_call() {
		let matcher = compile(&[("FOO", "X")], MatcherOptions::default());
		assert_eq!(matched_keys(&matcher, "FOO FOO").len(), 2);
		assert_eq!(matched_keys(&matcher, "FOO").len(), 1);
		assert_eq!(matched_keys(&matcher, "FOO FOO").len(), 2);
	}

	#[test]
	fn test_non_word_keys() {
		let matcher = compile(&[("process.env", "{}")], MatcherOptions::default());
		assert_eq!(matched_keys(&matcher, "x(process.env)"), vec!["process.env"]);
		assert!(matched_keys(&matcher, "myprocess.env").is_empty());
	}

	#[test]
	fn test_is_assignment_target() {
		assert!(is_assignment_target("A = 1", 1));
		assert!(is_assignment_target("A=b", 1));
		assert!(!is_assignment_target("A == 1", 1));
		assert!(!is_assignment_target("A + 1", 1));
		assert!(!is_assignment_target("A=", 1));
		assert!(!is_assignment_target("A", 1));
	}

	#[test]
	fn test_empty_table_matches_nothing() {
		let matcher = CompiledMatcher::compile(ReplacementTable::new(), &MatcherOptions::default())
			.unwrap();
		assert!(matcher.is_empty());
		assert_eq!(matcher.find_iter("anything").count(), 0);
	}
}
