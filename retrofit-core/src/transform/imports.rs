//! Import maintenance after a successful rewrite: add the replacement
//! helper to the legacy module's import list and drop the legacy symbol
//! once no call to it remains.

use crate::ast::{Ast, NodeId};

use super::Options;

pub fn update_imports(ast: &mut Ast, root: NodeId, options: &Options) {
    let decls = ast.find_all(root, |a, n| {
        a.import_source(n) == Some(options.module.as_str())
    });
    for decl in decls {
        let has_replacement = ast.children(decl).iter().any(|&spec| {
            ast.specifier_name(spec) == Some(options.replacement_symbol.as_str())
        });
        if !has_replacement {
            let spec = ast.import_specifier(&options.replacement_symbol);
            ast.push_specifier(decl, spec);
        }

        // Only call expressions count as remaining references; a bare
        // identifier mention does not keep the import alive.
        let legacy_still_called = ast.any(root, |a, n| {
            a.is_call(n)
                && a.call_callee(n).and_then(|c| a.ident_name(c))
                    == Some(options.legacy_symbol.as_str())
        });
        if !legacy_still_called {
            ast.remove_specifier(decl, &options.legacy_symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_string;
    use crate::transform::Options;

    #[test]
    fn swaps_legacy_for_replacement_when_no_calls_remain() {
        let src = "import { check, findPort } from \"next-test-utils\";\n";
        let parsed = parse_string(src, "typescript", "a.ts").unwrap();
        let mut ast = parsed.ast;
        update_imports(&mut ast, parsed.root, &Options::default());
        let out = ast.print(parsed.root, src);
        assert_eq!(out, "import { findPort, retry } from \"next-test-utils\";\n");
    }

    #[test]
    fn keeps_legacy_while_calls_remain() {
        let src = "import { check } from \"next-test-utils\";\ncheck(a, b);\n";
        let parsed = parse_string(src, "typescript", "a.ts").unwrap();
        let mut ast = parsed.ast;
        update_imports(&mut ast, parsed.root, &Options::default());
        let out = ast.print(parsed.root, src);
        assert!(out.contains("import { check, retry } from \"next-test-utils\";"));
    }

    #[test]
    fn does_not_duplicate_an_existing_replacement() {
        let src = "import { check, retry } from \"next-test-utils\";\n";
        let parsed = parse_string(src, "typescript", "a.ts").unwrap();
        let mut ast = parsed.ast;
        update_imports(&mut ast, parsed.root, &Options::default());
        let out = ast.print(parsed.root, src);
        assert_eq!(out, "import { retry } from \"next-test-utils\";\n");
    }
}
