//! Span-splice serialization: tree -> source text.
//!
//! Untouched subtrees are copied verbatim from the original source bytes.
//! Only nodes that were mutated (or synthesized by a rewrite) are
//! generated, and they are spliced into the gaps their predecessors
//! occupied. Precise layout of rewritten regions is a formatter concern.

use super::{widen_over_trailing_ws, Ast, NodeId, NodeKind, Span};

impl Ast {
    /// Serialize the tree rooted at `root` back to source text.
    pub fn print(&self, root: NodeId, src: &str) -> String {
        let mut out = String::with_capacity(src.len() + 128);
        self.print_node(root, src, &mut out);
        out
    }

    fn print_node(&self, id: NodeId, src: &str, out: &mut String) {
        match self.span(id) {
            Some(span) if !self.is_dirty(id) => out.push_str(span.text(src)),
            Some(span) => {
                if matches!(self.kind(id), NodeKind::ImportDecl { .. }) {
                    self.print_import(id, out);
                } else {
                    self.print_spliced(id, span, src, out);
                }
            }
            None => self.print_generated(id, src, out),
        }
    }

    /// Print a node that still has its source span but holds mutated
    /// children: copy the gaps, recurse into positioned children, skip
    /// removed spans, and append new children before the closing text.
    fn print_spliced(&self, id: NodeId, span: Span, src: &str, out: &mut String) {
        // (start of the region, node to print there if any)
        let mut events: Vec<(Span, Option<NodeId>)> = Vec::new();
        let mut appended: Vec<NodeId> = Vec::new();

        for &child in self.children(id) {
            match self.anchor_span(child) {
                Some(s) => events.push((s, Some(child))),
                None => appended.push(child),
            }
        }
        for &removed in self.removed_spans(id) {
            events.push((removed, None));
        }

        // A demoted arrow drops its original `async` keyword; a promoted
        // one gains the keyword up front.
        if let NodeKind::Arrow {
            is_async,
            async_span,
        } = self.kind(id)
        {
            match (is_async, async_span) {
                (false, Some(kw)) => {
                    events.push((widen_over_trailing_ws(src, *kw), None));
                }
                (true, None) => out.push_str("async "),
                _ => {}
            }
        }

        events.sort_by_key(|(s, _)| s.start);

        let mut pos = span.start;
        for (s, child) in events {
            // Overlapping splice regions would mean two rewrites claimed
            // the same bytes; the mutation API never produces that.
            debug_assert!(s.start >= pos, "overlapping splice at byte {}", s.start);
            if s.start > pos {
                out.push_str(&src[pos..s.start]);
            }
            if let Some(child) = child {
                self.print_node(child, src, out);
            }
            pos = pos.max(s.end);
        }

        if !appended.is_empty() {
            let indent = self.appended_indent(id, span, src);
            for child in appended {
                out.push('\n');
                out.push_str(&indent);
                self.print_node(child, src, out);
            }
        }

        if pos < span.end {
            out.push_str(&src[pos..span.end]);
        }
    }

    /// Indentation for statements appended to a block: reuse the line
    /// indent of the block's last original occupant.
    fn appended_indent(&self, id: NodeId, span: Span, src: &str) -> String {
        let mut best: Option<usize> = None;
        for &child in self.children(id) {
            if let Some(s) = self.anchor_span(child) {
                best = Some(best.map_or(s.start, |b: usize| b.max(s.start)));
            }
        }
        for &s in self.removed_spans(id) {
            best = Some(best.map_or(s.start, |b| b.max(s.start)));
        }
        match best {
            Some(mut offset) => {
                // Removed spans are widened back over the preceding line
                // break; step past it to land on the statement's own line.
                let bytes = src.as_bytes();
                while offset < bytes.len() && matches!(bytes[offset], b'\n' | b'\r') {
                    offset += 1;
                }
                line_indent(src, offset)
            }
            None => {
                let mut indent = line_indent(src, span.start);
                indent.push_str("  ");
                indent
            }
        }
    }

    /// Print a synthetic node by its kind.
    fn print_generated(&self, id: NodeId, src: &str, out: &mut String) {
        match self.kind(id) {
            NodeKind::Ident { name } => out.push_str(name),
            NodeKind::Call => {
                let children = self.children(id);
                if let Some(&callee) = children.first() {
                    self.print_node(callee, src, out);
                }
                out.push('(');
                for (i, &arg) in children.iter().skip(1).enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.print_node(arg, src, out);
                }
                out.push(')');
            }
            NodeKind::Member => {
                let children = self.children(id);
                if let Some(&object) = children.first() {
                    self.print_node(object, src, out);
                }
                out.push('.');
                if let Some(&property) = children.get(1) {
                    self.print_node(property, src, out);
                }
            }
            NodeKind::ExprStmt => {
                if let Some(&expr) = self.children(id).first() {
                    self.print_node(expr, src, out);
                }
                out.push(';');
            }
            NodeKind::Await => {
                out.push_str("await ");
                if let Some(&arg) = self.children(id).first() {
                    self.print_node(arg, src, out);
                }
            }
            NodeKind::Return => {
                out.push_str("return");
                if let Some(&arg) = self.children(id).first() {
                    out.push(' ');
                    self.print_node(arg, src, out);
                }
                out.push(';');
            }
            NodeKind::Block => {
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str("{}");
                } else {
                    out.push_str("{ ");
                    for (i, &stmt) in children.iter().enumerate() {
                        if i > 0 {
                            out.push(' ');
                        }
                        self.print_node(stmt, src, out);
                    }
                    out.push_str(" }");
                }
            }
            NodeKind::ImportDecl { .. } => self.print_import(id, out),
            NodeKind::ImportSpecifier { imported, raw } => {
                out.push_str(raw.as_deref().unwrap_or(imported));
            }
            NodeKind::Str { raw, .. }
            | NodeKind::Num { raw, .. }
            | NodeKind::Regex { raw, .. } => out.push_str(raw),
            NodeKind::Bool { value } => out.push_str(if *value { "true" } else { "false" }),
            // Synthetic Program/Arrow/If/Cond/Raw nodes are never built by
            // the rewrite rules; print children as a best effort.
            _ => {
                for &child in self.children(id) {
                    self.print_node(child, src, out);
                }
            }
        }
    }

    /// Regenerate a touched import declaration. Clause parts the rewrite
    /// never edits (default and namespace imports) are kept verbatim.
    fn print_import(&self, id: NodeId, out: &mut String) {
        let (header, tail, default_raw, namespace_raw) = match self.kind(id) {
            NodeKind::ImportDecl {
                header,
                tail,
                default_raw,
                namespace_raw,
                ..
            } => (header, tail, default_raw, namespace_raw),
            _ => return,
        };

        let mut parts: Vec<String> = Vec::new();
        if let Some(d) = default_raw {
            parts.push(d.clone());
        }
        if let Some(ns) = namespace_raw {
            parts.push(ns.clone());
        }
        let named: Vec<&str> = self
            .children(id)
            .iter()
            .map(|&s| match self.kind(s) {
                NodeKind::ImportSpecifier { imported, raw } => {
                    raw.as_deref().unwrap_or(imported.as_str())
                }
                _ => "",
            })
            .collect();
        if !named.is_empty() {
            parts.push(format!("{{ {} }}", named.join(", ")));
        }

        out.push_str(header);
        out.push_str(&parts.join(", "));
        out.push_str(tail);
    }
}

/// Leading whitespace of the line containing `offset`.
fn line_indent(src: &str, offset: usize) -> String {
    let bytes = src.as_bytes();
    let mut line_start = offset;
    while line_start > 0 && bytes[line_start - 1] != b'\n' {
        line_start -= 1;
    }
    let mut end = line_start;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    src[line_start..end].to_string()
}
