//! TreeSitter-based parsing for JavaScript and TypeScript test files,
//! lowering the CST into the arena AST the transform operates on.

use thiserror::Error;

use crate::ast::{Ast, NodeId};
use crate::builder::AstBuilder;

/// Supported languages and their extensions
pub static SUPPORTED_LANGUAGES: &[(&str, &[&str])] = &[
    ("javascript", &["js", "mjs", "cjs", "jsx"]),
    ("typescript", &["ts", "mts", "cts"]),
    ("tsx", &["tsx"]),
];

/// Errors that can occur during parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse: {0}")]
    Parse(String),
    #[error("TreeSitter error: {0}")]
    TreeSitter(String),
}

/// Parse result holding the arena AST for one file
pub struct ParseResult {
    /// The arena containing the AST
    pub ast: Ast,
    /// Root node (the program)
    pub root: NodeId,
    /// File path or "<stdin>"
    pub file_path: String,
    /// Language used for parsing
    pub language: String,
}

/// Detect language from file path extension
pub fn detect_language(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("");
    match ext.to_lowercase().as_str() {
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "tsx",
        _ => "unknown",
    }
}

/// Get TreeSitter language for a language name
fn get_tree_sitter_language(lang: &str) -> Result<tree_sitter::Language, ParseError> {
    match lang {
        "javascript" | "js" => Ok(tree_sitter_javascript::LANGUAGE.into()),
        "typescript" | "ts" => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        _ => Err(ParseError::UnsupportedLanguage(lang.to_string())),
    }
}

/// Parse a source string into an arena AST
pub fn parse_string(source: &str, lang: &str, file_path: &str) -> Result<ParseResult, ParseError> {
    let language = get_tree_sitter_language(lang)?;

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::TreeSitter(e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Parse("Failed to parse source".to_string()))?;

    let (ast, root) = AstBuilder::new(source).build(tree.root_node());

    Ok(ParseResult {
        ast,
        root,
        file_path: file_path.to_string(),
        language: lang.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("foo.js"), "javascript");
        assert_eq!(detect_language("foo.test.ts"), "typescript");
        assert_eq!(detect_language("foo.tsx"), "tsx");
        assert_eq!(detect_language("foo.py"), "unknown");
    }

    #[test]
    fn test_parse_call_with_arrow() {
        let source = r#"check(() => { return "ready"; }, "ready");"#;
        let result = parse_string(source, "typescript", "<test>").unwrap();
        let ast = &result.ast;

        let calls = ast.find_all(result.root, |a, n| a.is_call(n));
        assert_eq!(calls.len(), 1);
        let call = calls[0];
        assert_eq!(
            ast.call_callee(call).and_then(|c| ast.ident_name(c)),
            Some("check")
        );
        let args = ast.call_args(call);
        assert_eq!(args.len(), 2);
        assert!(ast.is_arrow(args[0]));
        assert_eq!(ast.str_value(args[1]), Some("ready"));
    }

    #[test]
    fn test_parse_import_declaration() {
        let source = "import { check, waitFor } from \"next-test-utils\";\n";
        let result = parse_string(source, "typescript", "<test>").unwrap();
        let ast = &result.ast;

        let imports = ast.find_all(result.root, |a, n| {
            matches!(a.kind(n), NodeKind::ImportDecl { .. })
        });
        assert_eq!(imports.len(), 1);
        assert_eq!(ast.import_source(imports[0]), Some("next-test-utils"));
        let names: Vec<&str> = ast
            .children(imports[0])
            .iter()
            .filter_map(|&s| ast.specifier_name(s))
            .collect();
        assert_eq!(names, vec!["check", "waitFor"]);
    }

    #[test]
    fn test_parse_regex_literal() {
        let source = "check(() => value, /ready|done/);";
        let result = parse_string(source, "javascript", "<test>").unwrap();
        let ast = &result.ast;

        let calls = ast.find_all(result.root, |a, n| a.is_call(n));
        let args = ast.call_args(calls[0]);
        assert_eq!(ast.regex_pattern(args[1]), Some("ready|done"));
    }

    #[test]
    fn test_parse_async_arrow() {
        let source = "check(async () => { return await poll(); }, /ok/);";
        let result = parse_string(source, "javascript", "<test>").unwrap();
        let ast = &result.ast;

        let arrows = ast.find_all(result.root, |a, n| a.is_arrow(n));
        assert_eq!(arrows.len(), 1);
        assert!(ast.arrow_is_async(arrows[0]));
        assert!(ast.any(arrows[0], |a, n| a.is_await(n)));
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(matches!(
            parse_string("x", "python", "<test>"),
            Err(ParseError::UnsupportedLanguage(_))
        ));
    }
}
