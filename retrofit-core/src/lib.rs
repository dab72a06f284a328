//! retrofit-core: codemod library for migrating polling test helpers
//!
//! This library provides:
//! - TreeSitter-based parsing for JavaScript, TypeScript and TSX
//! - An arena-backed syntax tree with explicit mutation operations
//! - The `check(fn, expected)` to `retry(fn)` call-site rewrite
//! - Span-splicing serialization that leaves untouched code byte-for-byte
//!   identical, comments included

pub mod ast;
pub mod builder;
pub mod diagnostics;
pub mod parallel;
pub mod parser;
pub mod transform;

pub use ast::{Ast, NodeId, NodeKind, Span};
pub use diagnostics::{should_use_color, Diagnostics};
pub use parallel::{expand_globs, filter_supported_files, process_files_parallel};
pub use parser::{detect_language, parse_string, ParseError, ParseResult, SUPPORTED_LANGUAGES};
pub use transform::{transform_source, FileOutcome, Options, TransformError};
