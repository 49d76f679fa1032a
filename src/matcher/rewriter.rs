use crate::error::{ReplaceError, Result};
use crate::matcher::pattern::CompiledMatcher;
use crate::sourcemap::{PositionMap, SegmentKind, SourceMap};
use tracing::trace;

/// Output of a rewrite that changed something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
	/// The rewritten text.
	pub code: String,

	/// Output to input position mapping, unless disabled.
	pub map: Option<PositionMap>,
}

impl RewriteResult {
	/// Source Map for this result, given the input it was produced from.
	pub fn source_map(&self, source_name: &str, original: &str) -> Option<SourceMap> {
		self.map
			.as_ref()
			.map(|map| map.to_source_map(source_name, original, &self.code))
	}
}

/// A pending overwrite of `start..end` in the input.
#[derive(Debug)]
struct Edit {
	start: usize,
	end: usize,
	replacement: String,
}

/// Replace every match in `text`.
///
/// Value producers are called once per match, left to right, with
/// `context_id`. Returns `None` when nothing matched.
pub fn rewrite(
	matcher: &CompiledMatcher,
	text: &str,
	context_id: &str,
	generate_map: bool,
) -> Result<Option<RewriteResult>> {
	let mut edits = Vec::new();

	for m in matcher.find_iter(text) {
		let Some(value) = matcher.replacement(m.key) else {
			continue;
		};
		let replacement = value
			.produce(context_id)
			.map_err(|source| ReplaceError::ProducerFailed {
				key: m.key.to_string(),
				context_id: context_id.to_string(),
				source,
			})?;
		trace!(key = m.key, start = m.start, end = m.end, "replacing");
		edits.push(Edit {
			start: m.start,
			end: m.end,
			replacement,
		});
	}

	if edits.is_empty() {
		return Ok(None);
	}

	Ok(Some(apply_edits(text, &edits, generate_map)))
}

/// Apply non-overlapping, ordered edits in one pass.
fn apply_edits(text: &str, edits: &[Edit], generate_map: bool) -> RewriteResult {
	let mut code = String::with_capacity(text.len());
	let mut map = PositionMap::new(text.len());
	let mut pos = 0;

	for edit in edits {
		if edit.start > pos {
			code.push_str(&text[pos..edit.start]);
			map.push(SegmentKind::Unchanged, edit.start - pos, pos..edit.start);
		}
		code.push_str(&edit.replacement);
		map.push(
			SegmentKind::Replaced,
			edit.replacement.len(),
			edit.start..edit.end,
		);
		pos = edit.end;
	}

	if pos < text.len() {
		code.push_str(&text[pos..]);
		map.push(SegmentKind::Unchanged, text.len() - pos, pos..text.len());
	}

	RewriteResult {
		code,
		map: generate_map.then_some(map),
	}
}
