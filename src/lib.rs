//! Envreplace - compile-time replacement of identifiers and environment
//! variable references.
//!
//! This library provides the core functionality for envreplace, including:
//! - Configuration file parsing and discovery
//! - Replacement table construction with `process.env.*` keys
//! - Longest-first pattern compilation with delimiters and assignment guard
//! - Text rewriting with position maps and Source Map output
//!
//! # Example
//!
//! ```
//! use envreplace::{Options, Replacer};
//!
//! let options = Options::new()
//!     .include(["src/**/*"])
//!     .value("__VERSION__", "1.2.0")
//!     .value("API_URL", "https://example.com");
//! let replacer = Replacer::new(options).unwrap();
//!
//! let result = replacer
//!     .transform("fetch(process.env.API_URL + __VERSION__)", "src/api.js")
//!     .unwrap()
//!     .expect("text contains replacement keys");
//! assert_eq!(result.code, "fetch(\"https://example.com\" + 1.2.0)");
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod sourcemap;
pub mod table;
pub mod transform;

pub use config::Options;
pub use error::{ReplaceError, Result};
pub use matcher::RewriteResult;
pub use table::{Replacement, ValueProducer};
pub use transform::Replacer;
