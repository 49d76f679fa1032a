//! Position mapping for rewritten text.
//!
//! This module handles:
//! - Output to input offset mapping
//! - Source Map (revision 3) generation with base64 VLQ mappings

pub mod position_map;
mod vlq;

pub use position_map::{PositionMap, Segment, SegmentKind, SourceMap};
