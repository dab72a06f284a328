//! Parallel file processing using Rayon

use rayon::prelude::*;
use std::fs;

use crate::diagnostics::Diagnostics;
use crate::parser::detect_language;
use crate::transform::{transform_source, FileOutcome, Options, TransformError};

/// Transform multiple files in parallel. Results come back paired with
/// their path, in the same order as `files`.
pub fn process_files_parallel(
    files: &[String],
    lang_override: Option<&str>,
    options: &Options,
    diag: &Diagnostics,
    concurrency: Option<usize>,
) -> Vec<(String, Result<FileOutcome, TransformError>)> {
    // Configure thread pool
    if let Some(num_threads) = concurrency {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if pool already initialized
    }

    files
        .par_iter()
        .map(|path| {
            let result = fs::read_to_string(path)
                .map_err(|e| TransformError::Parse(e.into()))
                .and_then(|source| {
                    transform_source(&source, path, lang_override, options, diag)
                });
            (path.clone(), result)
        })
        .collect()
}

/// Expand glob patterns to file paths
pub fn expand_globs(patterns: &[String]) -> Vec<String> {
    let mut files = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') {
            match glob::glob(pattern) {
                Ok(paths) => {
                    for entry in paths.flatten() {
                        if entry.is_file() {
                            if let Some(path) = entry.to_str() {
                                files.push(path.to_string());
                            }
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Invalid glob pattern '{}': {}", pattern, e);
                }
            }
        } else {
            // Not a glob, use as-is
            files.push(pattern.clone());
        }
    }

    files
}

/// Filter files by supported languages
pub fn filter_supported_files(files: Vec<String>) -> Vec<String> {
    files
        .into_iter()
        .filter(|f| detect_language(f) != "unknown")
        .collect()
}
