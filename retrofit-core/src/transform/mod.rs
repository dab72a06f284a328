//! Per-file transform: find legacy `check(fn, expected)` call sites and
//! rewrite them to `retry(fn)` with inline assertions.
//!
//! One invocation owns one fresh tree; no state crosses files. All
//! expected irregularities are handled per call site with a diagnostic;
//! only invariant violations propagate to the caller.

pub mod imports;
pub mod matcher;
pub mod rewrite;

use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::parser::{detect_language, parse_string, ParseError};

/// What to migrate: the module the legacy helper comes from and the two
/// symbol names involved.
#[derive(Debug, Clone)]
pub struct Options {
    /// Module specifier the legacy helper is imported from.
    pub module: String,
    /// Helper being migrated away from.
    pub legacy_symbol: String,
    /// Helper that replaces it.
    pub replacement_symbol: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            module: "next-test-utils".to_string(),
            legacy_symbol: "check".to_string(),
            replacement_symbol: "retry".to_string(),
        }
    }
}

/// Result of transforming one file.
#[derive(Debug)]
pub struct FileOutcome {
    /// New source text, or `None` when the file is unchanged.
    pub output: Option<String>,
    /// Call sites rewritten with an assertion strategy.
    pub rewrites: usize,
    /// Call sites wrapped in the replacement helper without a strategy
    /// (no success value or no terminal return).
    pub wrapped: usize,
    /// Call sites skipped with a diagnostic.
    pub skipped: usize,
}

/// Errors that abort a file. Everything else is a per-call-site skip.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A node matched by a type-filtered query had an unexpected runtime
    /// shape. This is a bug in the matcher, not a data condition, and is
    /// intentionally not caught anywhere below the CLI.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Transform one file's source. Returns the rewritten text, or an outcome
/// with `output: None` when nothing changed (including when the file does
/// not import the legacy symbol at all).
pub fn transform_source(
    source: &str,
    file_path: &str,
    lang_override: Option<&str>,
    options: &Options,
    diag: &Diagnostics,
) -> Result<FileOutcome, TransformError> {
    let lang = lang_override.unwrap_or_else(|| detect_language(file_path));
    let parsed = parse_string(source, lang, file_path)?;
    let mut ast = parsed.ast;
    let root = parsed.root;

    if !matcher::imports_symbol(&ast, root, &options.module, &options.legacy_symbol) {
        return Ok(FileOutcome {
            output: None,
            rewrites: 0,
            wrapped: 0,
            skipped: 0,
        });
    }

    let candidates = matcher::candidate_calls(&ast, root, &options.legacy_symbol);
    let mut rewrites = 0;
    let mut wrapped = 0;
    let mut skipped = 0;
    for call in candidates {
        match rewrite::rewrite_call_site(&mut ast, call, source, &options.replacement_symbol, diag)?
        {
            rewrite::CallOutcome::Rewritten => rewrites += 1,
            rewrite::CallOutcome::Wrapped => wrapped += 1,
            rewrite::CallOutcome::Skipped => skipped += 1,
        }
    }

    // The import list is only amended when an assertion rewrite landed.
    if rewrites > 0 {
        imports::update_imports(&mut ast, root, options);
    }

    let printed = ast.print(root, source);
    let output = if printed == source { None } else { Some(printed) };
    Ok(FileOutcome {
        output,
        rewrites,
        wrapped,
        skipped,
    })
}
