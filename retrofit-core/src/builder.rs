//! Lower a TreeSitter CST into the arena AST.
//!
//! The lowering is shallow on purpose: only the node shapes the rewrite
//! rules inspect get typed variants. Everything else becomes a `Raw` node
//! that keeps its span for verbatim printing and its named children for
//! traversal. Comments are not lowered at all; they live in the source
//! gaps between sibling spans and survive printing untouched.

use tree_sitter::Node as TsNode;

use crate::ast::{Ast, NodeId, NodeKind, Span};

pub struct AstBuilder<'s> {
    src: &'s str,
    ast: Ast,
}

impl<'s> AstBuilder<'s> {
    pub fn new(src: &'s str) -> Self {
        AstBuilder {
            src,
            ast: Ast::new(),
        }
    }

    /// Build the arena from a parsed tree's root node.
    pub fn build(mut self, root: TsNode) -> (Ast, NodeId) {
        let program = self.ast.alloc(NodeKind::Program, Span::new(0, self.src.len()));
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if let Some(id) = self.lower(child) {
                self.ast.attach(program, id);
            }
        }
        (self.ast, program)
    }

    fn text(&self, n: TsNode) -> &'s str {
        &self.src[n.start_byte()..n.end_byte()]
    }

    fn span(n: TsNode) -> Span {
        Span::new(n.start_byte(), n.end_byte())
    }

    fn lower(&mut self, n: TsNode) -> Option<NodeId> {
        if n.kind() == "comment" {
            return None;
        }
        let id = match n.kind() {
            "import_statement" => self.lower_import(n),
            "call_expression" => self.lower_call(n),
            "arrow_function" => self.lower_arrow(n),
            "statement_block" => self.lower_generic(n, NodeKind::Block),
            "return_statement" => self.lower_generic(n, NodeKind::Return),
            "expression_statement" => self.lower_generic(n, NodeKind::ExprStmt),
            "if_statement" => self.lower_if(n),
            "ternary_expression" => self.lower_cond(n),
            "await_expression" => self.lower_generic(n, NodeKind::Await),
            "member_expression" => self.lower_member(n),
            "identifier" => self.ast.alloc(
                NodeKind::Ident {
                    name: self.text(n).to_string(),
                },
                Self::span(n),
            ),
            "string" => {
                let kind = NodeKind::Str {
                    value: self.cook_string(n),
                    raw: self.text(n).to_string(),
                };
                self.ast.alloc(kind, Self::span(n))
            }
            "number" => {
                let raw = self.text(n).to_string();
                let kind = NodeKind::Num {
                    value: parse_number(&raw),
                    raw,
                };
                self.ast.alloc(kind, Self::span(n))
            }
            "regex" => {
                let pattern = n
                    .child_by_field_name("pattern")
                    .map(|p| self.text(p).to_string())
                    .unwrap_or_default();
                let kind = NodeKind::Regex {
                    pattern,
                    raw: self.text(n).to_string(),
                };
                self.ast.alloc(kind, Self::span(n))
            }
            "true" => self
                .ast
                .alloc(NodeKind::Bool { value: true }, Self::span(n)),
            "false" => self
                .ast
                .alloc(NodeKind::Bool { value: false }, Self::span(n)),
            other => self.lower_generic(
                n,
                NodeKind::Raw {
                    kind: other.to_string(),
                },
            ),
        };
        Some(id)
    }

    /// Lower a node whose children are simply its named children in order.
    fn lower_generic(&mut self, n: TsNode, kind: NodeKind) -> NodeId {
        let id = self.ast.alloc(kind, Self::span(n));
        let mut cursor = n.walk();
        let children: Vec<TsNode> = n.named_children(&mut cursor).collect();
        for child in children {
            if let Some(c) = self.lower(child) {
                self.ast.attach(id, c);
            }
        }
        id
    }

    fn lower_call(&mut self, n: TsNode) -> NodeId {
        let callee = n.child_by_field_name("function");
        let args = n.child_by_field_name("arguments");
        let (callee, args) = match (callee, args) {
            // Template-string calls and other exotic shapes stay raw.
            (Some(c), Some(a)) if a.kind() == "arguments" => (c, a),
            _ => {
                return self.lower_generic(
                    n,
                    NodeKind::Raw {
                        kind: n.kind().to_string(),
                    },
                )
            }
        };
        let id = self.ast.alloc(NodeKind::Call, Self::span(n));
        if let Some(c) = self.lower(callee) {
            self.ast.attach(id, c);
        }
        let mut cursor = args.walk();
        let arg_nodes: Vec<TsNode> = args.named_children(&mut cursor).collect();
        for arg in arg_nodes {
            if let Some(a) = self.lower(arg) {
                self.ast.attach(id, a);
            }
        }
        id
    }

    fn lower_arrow(&mut self, n: TsNode) -> NodeId {
        let mut async_span = None;
        let mut cursor = n.walk();
        for child in n.children(&mut cursor) {
            if child.kind() == "async" {
                async_span = Some(Self::span(child));
                break;
            }
        }
        let id = self.ast.alloc(
            NodeKind::Arrow {
                is_async: async_span.is_some(),
                async_span,
            },
            Self::span(n),
        );
        if let Some(body) = n.child_by_field_name("body") {
            if let Some(b) = self.lower(body) {
                self.ast.attach(id, b);
            }
        }
        id
    }

    fn lower_if(&mut self, n: TsNode) -> NodeId {
        let id = self.ast.alloc(NodeKind::If, Self::span(n));
        if let Some(cond) = n.child_by_field_name("condition") {
            // The grammar wraps the test in a parenthesized_expression;
            // unwrap it so assertions emit the bare condition.
            let test = if cond.kind() == "parenthesized_expression" {
                cond.named_child(0).unwrap_or(cond)
            } else {
                cond
            };
            if let Some(t) = self.lower(test) {
                self.ast.attach(id, t);
            }
        }
        if let Some(cons) = n.child_by_field_name("consequence") {
            if let Some(c) = self.lower(cons) {
                self.ast.attach(id, c);
            }
        }
        if let Some(alt) = n.child_by_field_name("alternative") {
            // alternative is an else_clause wrapping the statement
            let stmt = if alt.kind() == "else_clause" {
                alt.named_child(0).unwrap_or(alt)
            } else {
                alt
            };
            if let Some(a) = self.lower(stmt) {
                self.ast.attach(id, a);
            }
        }
        id
    }

    fn lower_cond(&mut self, n: TsNode) -> NodeId {
        let id = self.ast.alloc(NodeKind::Cond, Self::span(n));
        for field in ["condition", "consequence", "alternative"] {
            if let Some(part) = n.child_by_field_name(field) {
                if let Some(p) = self.lower(part) {
                    self.ast.attach(id, p);
                }
            }
        }
        id
    }

    fn lower_member(&mut self, n: TsNode) -> NodeId {
        let id = self.ast.alloc(NodeKind::Member, Self::span(n));
        for field in ["object", "property"] {
            if let Some(part) = n.child_by_field_name(field) {
                if let Some(p) = self.lower(part) {
                    self.ast.attach(id, p);
                }
            }
        }
        id
    }

    fn lower_import(&mut self, n: TsNode) -> NodeId {
        let source_node = n.child_by_field_name("source");
        let mut cursor = n.walk();
        let clause = n
            .named_children(&mut cursor)
            .find(|c| c.kind() == "import_clause");
        let (source_node, clause) = match (source_node, clause) {
            (Some(s), Some(c)) => (s, c),
            // Side-effect imports (`import "x";`) carry no specifiers the
            // updater could touch; keep them opaque.
            _ => {
                return self.lower_generic(
                    n,
                    NodeKind::Raw {
                        kind: n.kind().to_string(),
                    },
                )
            }
        };

        let source = self.cook_string(source_node);
        let header = self.src[n.start_byte()..clause.start_byte()].to_string();
        let tail = self.src[clause.end_byte()..n.end_byte()].to_string();

        let mut default_raw = None;
        let mut namespace_raw = None;
        let mut specs: Vec<NodeId> = Vec::new();

        let mut clause_cursor = clause.walk();
        let clause_children: Vec<TsNode> = clause.named_children(&mut clause_cursor).collect();
        for part in clause_children {
            match part.kind() {
                "identifier" => default_raw = Some(self.text(part).to_string()),
                "namespace_import" => namespace_raw = Some(self.text(part).to_string()),
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    let entries: Vec<TsNode> =
                        part.named_children(&mut spec_cursor).collect();
                    for entry in entries {
                        if entry.kind() != "import_specifier" {
                            continue;
                        }
                        let imported = match entry.child_by_field_name("name") {
                            Some(name) if name.kind() == "string" => self.cook_string(name),
                            Some(name) => self.text(name).to_string(),
                            None => continue,
                        };
                        let spec = self.ast.alloc(
                            NodeKind::ImportSpecifier {
                                imported,
                                raw: Some(self.text(entry).to_string()),
                            },
                            Self::span(entry),
                        );
                        specs.push(spec);
                    }
                }
                _ => {}
            }
        }

        let id = self.ast.alloc(
            NodeKind::ImportDecl {
                source,
                header,
                tail,
                default_raw,
                namespace_raw,
            },
            Self::span(n),
        );
        for spec in specs {
            self.ast.attach(id, spec);
        }
        id
    }

    /// Cooked value of a string literal (quotes stripped, escapes applied).
    fn cook_string(&self, n: TsNode) -> String {
        let mut out = String::new();
        let mut cursor = n.walk();
        for child in n.named_children(&mut cursor) {
            match child.kind() {
                "string_fragment" => out.push_str(self.text(child)),
                "escape_sequence" => out.push_str(&unescape(self.text(child))),
                _ => {}
            }
        }
        out
    }
}

fn unescape(seq: &str) -> String {
    let mut chars = seq.chars();
    if chars.next() != Some('\\') {
        return seq.to_string();
    }
    match chars.next() {
        Some('n') => "\n".to_string(),
        Some('t') => "\t".to_string(),
        Some('r') => "\r".to_string(),
        Some('0') => "\0".to_string(),
        Some('b') => "\u{8}".to_string(),
        Some('f') => "\u{c}".to_string(),
        Some('v') => "\u{b}".to_string(),
        Some('u') => {
            let rest: String = chars.collect();
            let hex = rest
                .trim_start_matches('{')
                .trim_end_matches('}')
                .to_string();
            u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| seq.to_string())
        }
        Some('x') => {
            let hex: String = chars.collect();
            u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| seq.to_string())
        }
        Some(other) => other.to_string(),
        None => seq.to_string(),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.replace('_', "");
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return i64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_common_sequences() {
        assert_eq!(unescape("\\n"), "\n");
        assert_eq!(unescape("\\\""), "\"");
        assert_eq!(unescape("\\\\"), "\\");
        assert_eq!(unescape("\\u0041"), "A");
        assert_eq!(unescape("\\u{1F600}"), "\u{1F600}");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("200"), Some(200.0));
        assert_eq!(parse_number("1.5"), Some(1.5));
        assert_eq!(parse_number("0x10"), Some(16.0));
        assert_eq!(parse_number("1_000"), Some(1000.0));
    }
}
