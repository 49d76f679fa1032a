//! Pattern matching and text rewriting for envreplace.
//!
//! This module handles:
//! - Escaping keys and compiling them into one longest-first pattern
//! - Delimiter wrapping and the assignment guard
//! - Rewriting matched spans with position mapping

pub mod pattern;
pub mod rewriter;

pub use pattern::{CompiledMatcher, KeyMatch, KeyMatches, MatcherOptions, escape};
pub use rewriter::{RewriteResult, rewrite};
