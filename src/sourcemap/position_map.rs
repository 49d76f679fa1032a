use crate::sourcemap::vlq;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Whether a segment was copied from the input or written by a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
	Unchanged,
	Replaced,
}

/// A contiguous run of output text and the input span it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	pub kind: SegmentKind,
	pub output: Range<usize>,
	pub original: Range<usize>,
}

/// Maps byte offsets in rewritten text back to byte offsets in the input.
///
/// Offsets in unchanged text map one-to-one. Offsets inside a replacement map
/// to the start of the span it replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
	segments: Vec<Segment>,
	output_len: usize,
	original_len: usize,
}

impl PositionMap {
	pub(crate) fn new(original_len: usize) -> Self {
		Self {
			segments: Vec::new(),
			output_len: 0,
			original_len,
		}
	}

	/// Record the next segment. Segments must be pushed in output order.
	pub(crate) fn push(&mut self, kind: SegmentKind, output_len: usize, original: Range<usize>) {
		let output = self.output_len..self.output_len + output_len;
		self.output_len = output.end;
		self.segments.push(Segment {
			kind,
			output,
			original,
		});
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Length of the rewritten text.
	pub fn output_len(&self) -> usize {
		self.output_len
	}

	/// Length of the input text.
	pub fn original_len(&self) -> usize {
		self.original_len
	}

	/// Input offset for an output offset. The end of the output maps to the
	/// end of the input; anything past it maps to nothing.
	pub fn original_offset(&self, output_offset: usize) -> Option<usize> {
		if output_offset > self.output_len {
			return None;
		}
		if output_offset == self.output_len {
			return Some(self.original_len);
		}

		let i = self
			.segments
			.partition_point(|s| s.output.end <= output_offset);
		let segment = self.segments.get(i)?;
		Some(match segment.kind {
			SegmentKind::Unchanged => segment.original.start + (output_offset - segment.output.start),
			SegmentKind::Replaced => segment.original.start,
		})
	}

	/// Build a high-resolution Source Map (revision 3) for this rewrite.
	///
	/// Every character of unchanged text gets its own mapping, and each line
	/// of replacement text maps to the start of the replaced span. Columns
	/// count UTF-16 code units.
	pub fn to_source_map(&self, source_name: &str, original: &str, output: &str) -> SourceMap {
		let original_lines = LineIndex::new(original);
		let mut writer = MappingsWriter::default();

		for segment in &self.segments {
			let text = &output[segment.output.clone()];
			match segment.kind {
				SegmentKind::Unchanged => {
					let (mut line, mut column) = original_lines.location(original, segment.original.start);
					for c in text.chars() {
						if c == '\n' {
							writer.newline();
							line += 1;
							column = 0;
						} else {
							writer.add(line, column);
							writer.advance(c);
							column += c.len_utf16();
						}
					}
				}
				SegmentKind::Replaced => {
					let (line, column) = original_lines.location(original, segment.original.start);
					let mut line_start = true;
					for c in text.chars() {
						if c == '\n' {
							writer.newline();
							line_start = true;
						} else {
							if line_start {
								writer.add(line, column);
								line_start = false;
							}
							writer.advance(c);
						}
					}
				}
			}
		}

		SourceMap {
			version: 3,
			file: None,
			sources: vec![source_name.to_string()],
			sources_content: vec![Some(original.to_string())],
			names: Vec::new(),
			mappings: writer.finish(),
		}
	}
}

/// Line start offsets of a text, for offset to line/column conversion.
struct LineIndex {
	starts: Vec<usize>,
}

impl LineIndex {
	fn new(text: &str) -> Self {
		let starts = std::iter::once(0)
			.chain(text.match_indices('\n').map(|(i, _)| i + 1))
			.collect();
		Self { starts }
	}

	/// Zero-based line and UTF-16 column of a byte offset.
	fn location(&self, text: &str, offset: usize) -> (usize, usize) {
		let line = self.starts.partition_point(|&s| s <= offset) - 1;
		let column = text[self.starts[line]..offset].encode_utf16().count();
		(line, column)
	}
}

/// Accumulates the `mappings` field, tracking the previous values each
/// field is delta-encoded against.
#[derive(Default)]
struct MappingsWriter {
	mappings: String,
	column: usize,
	segment_on_line: bool,
	previous_column: i64,
	previous_line: i64,
	previous_original_column: i64,
}

impl MappingsWriter {
	fn add(&mut self, original_line: usize, original_column: usize) {
		if self.segment_on_line {
			self.mappings.push(',');
		}
		let column = self.column as i64;
		let original_line = original_line as i64;
		let original_column = original_column as i64;

		vlq::encode(column - self.previous_column, &mut self.mappings);
		// Single source, so the source index delta is always zero.
		vlq::encode(0, &mut self.mappings);
		vlq::encode(original_line - self.previous_line, &mut self.mappings);
		vlq::encode(original_column - self.previous_original_column, &mut self.mappings);

		self.previous_column = column;
		self.previous_line = original_line;
		self.previous_original_column = original_column;
		self.segment_on_line = true;
	}

	fn advance(&mut self, c: char) {
		self.column += c.len_utf16();
	}

	fn newline(&mut self) {
		self.mappings.push(';');
		self.column = 0;
		self.previous_column = 0;
		self.segment_on_line = false;
	}

	fn finish(self) -> String {
		self.mappings
	}
}

/// A Source Map revision 3 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
	pub version: u8,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub file: Option<String>,

	pub sources: Vec<String>,

	#[serde(default)]
	pub sources_content: Vec<Option<String>>,

	#[serde(default)]
	pub names: Vec<String>,

	pub mappings: String,
}

impl SourceMap {
	/// Set the generated file name.
	pub fn with_file(mut self, file: impl Into<String>) -> Self {
		self.file = Some(file.into());
		self
	}

	/// Serialize to JSON.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}
