//! Queries that locate the import declarations and call sites the
//! transform operates on.

use crate::ast::{Ast, NodeId};

/// True when `root` contains an import from `module` whose named
/// specifiers include `symbol`.
pub fn imports_symbol(ast: &Ast, root: NodeId, module: &str, symbol: &str) -> bool {
    ast.find_all(root, |a, n| a.import_source(n) == Some(module))
        .iter()
        .any(|&decl| {
            ast.children(decl)
                .iter()
                .any(|&spec| ast.specifier_name(spec) == Some(symbol))
        })
}

/// All calls whose callee is the bare identifier `callee`, in document
/// order. Property accesses like `utils.check(...)` do not match.
pub fn candidate_calls(ast: &Ast, root: NodeId, callee: &str) -> Vec<NodeId> {
    ast.find_all(root, |a, n| {
        a.is_call(n) && a.call_callee(n).and_then(|c| a.ident_name(c)) == Some(callee)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_string;

    #[test]
    fn finds_named_import() {
        let src = r#"import { check, retry } from "next-test-utils";"#;
        let parsed = parse_string(src, "typescript", "a.ts").unwrap();
        assert!(imports_symbol(&parsed.ast, parsed.root, "next-test-utils", "check"));
        assert!(!imports_symbol(&parsed.ast, parsed.root, "next-test-utils", "waitFor"));
        assert!(!imports_symbol(&parsed.ast, parsed.root, "other-module", "check"));
    }

    #[test]
    fn candidate_calls_ignore_member_calls() {
        let src = "check(a, b); utils.check(a, b); other(); check(c);";
        let parsed = parse_string(src, "javascript", "a.js").unwrap();
        let calls = candidate_calls(&parsed.ast, parsed.root, "check");
        assert_eq!(calls.len(), 2);
    }
}
