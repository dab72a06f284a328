//! Arena-backed syntax tree for the JavaScript/TypeScript subset the
//! codemod reasons about.
//!
//! Nodes the rewrite rules never inspect are kept as opaque [`NodeKind::Raw`]
//! entries that still expose typed children, so queries like "every return
//! statement under this call" see the whole subtree. Mutation goes through
//! an explicit arena API (replace, pop/push, async toggle) instead of
//! aliased references; serialization in [`print`] is span-based, so a file
//! with zero mutations round-trips byte-for-byte.

mod print;

/// Byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Slice the original source for this span.
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        &src[self.start..self.end]
    }
}

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tagged union of the node shapes the codemod distinguishes.
///
/// Children are positional and documented per variant; anything not listed
/// here lowers to `Raw` with its tree-sitter kind preserved for debugging.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Whole file. Children: top-level statements.
    Program,
    /// `import <clause> from "<source>";`. Children: named specifiers.
    /// The surrounding text (`header`, `tail`) and any default or namespace
    /// import are kept verbatim so a touched declaration can be
    /// regenerated without disturbing the rest of the line.
    ImportDecl {
        source: String,
        header: String,
        tail: String,
        default_raw: Option<String>,
        namespace_raw: Option<String>,
    },
    /// One entry of a named-import list, e.g. `check` or `check as poll`.
    ImportSpecifier { imported: String, raw: Option<String> },
    /// Call expression. Children: callee, then arguments.
    Call,
    Ident { name: String },
    /// Arrow function. Children: body only; parameters stay in the source
    /// gap. `async_span` is the original `async` keyword token, if any.
    Arrow { is_async: bool, async_span: Option<Span> },
    /// `{ ... }`. Children: statements.
    Block,
    /// `return <expr>;`. Children: the optional argument.
    Return,
    /// Statement wrapping an expression. Children: the expression.
    ExprStmt,
    /// `if (test) cons else alt`. Children: test, consequent, optional
    /// alternate. The test is unwrapped from its parentheses.
    If,
    /// Ternary. Children: test, consequent, alternate.
    Cond,
    /// `await <expr>`. Children: the argument.
    Await,
    /// `obj.prop`. Children: object, property.
    Member,
    Str { value: String, raw: String },
    Num { value: Option<f64>, raw: String },
    Regex { pattern: String, raw: String },
    Bool { value: bool },
    /// Anything else, with typed children for traversal and its span for
    /// verbatim printing.
    Raw { kind: String },
}

struct Node {
    kind: NodeKind,
    /// Original source span; `None` for synthetic nodes.
    span: Option<Span>,
    /// For a synthetic node that replaced an original one: the replaced
    /// node's span, used to position it during span-splice printing.
    anchor: Option<Span>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Spans of removed children, skipped during printing.
    removed: Vec<Span>,
    /// This node's own structure changed (children, flags).
    self_dirty: bool,
    /// Some descendant changed.
    sub_dirty: bool,
}

/// The arena. All nodes of one parsed file live here; ids stay valid for
/// the lifetime of the arena, including for detached subtrees.
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast { nodes: Vec::new() }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Allocate a node lowered from the source, with its span.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.alloc_inner(kind, Some(span))
    }

    /// Allocate a synthetic node (no source span).
    pub fn synth(&mut self, kind: NodeKind) -> NodeId {
        self.alloc_inner(kind, None)
    }

    fn alloc_inner(&mut self, kind: NodeKind, span: Option<Span>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            anchor: None,
            parent: None,
            children: Vec::new(),
            removed: Vec::new(),
            self_dirty: false,
            sub_dirty: false,
        });
        id
    }

    /// Attach `child` as the last child of `parent` (tree construction,
    /// does not mark anything dirty).
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.synth(NodeKind::Ident {
            name: name.to_string(),
        })
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let id = self.synth(NodeKind::Call);
        self.attach(id, callee);
        for arg in args {
            self.attach(id, arg);
        }
        id
    }

    pub fn member(&mut self, object: NodeId, property: NodeId) -> NodeId {
        let id = self.synth(NodeKind::Member);
        self.attach(id, object);
        self.attach(id, property);
        id
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        let id = self.synth(NodeKind::ExprStmt);
        self.attach(id, expr);
        id
    }

    pub fn await_expr(&mut self, arg: NodeId) -> NodeId {
        let id = self.synth(NodeKind::Await);
        self.attach(id, arg);
        id
    }

    pub fn ret(&mut self, arg: Option<NodeId>) -> NodeId {
        let id = self.synth(NodeKind::Return);
        if let Some(arg) = arg {
            self.attach(id, arg);
        }
        id
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        let id = self.synth(NodeKind::Block);
        for stmt in stmts {
            self.attach(id, stmt);
        }
        id
    }

    pub fn import_specifier(&mut self, imported: &str) -> NodeId {
        self.synth(NodeKind::ImportSpecifier {
            imported: imported.to_string(),
            raw: None,
        })
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.node(id).span
    }

    /// Span used to position this node in its parent's source: its own
    /// span, or the span of the node it replaced.
    pub fn anchor_span(&self, id: NodeId) -> Option<Span> {
        let n = self.node(id);
        n.span.or(n.anchor)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        let n = self.node(id);
        n.self_dirty || n.sub_dirty
    }

    pub fn ident_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    pub fn str_value(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Str { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn regex_pattern(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Regex { pattern, .. } => Some(pattern),
            _ => None,
        }
    }

    pub fn is_return(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Return)
    }

    pub fn is_call(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Call)
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Block)
    }

    pub fn is_arrow(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Arrow { .. })
    }

    pub fn is_await(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Await)
    }

    pub fn call_callee(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Call => self.children(id).first().copied(),
            _ => None,
        }
    }

    pub fn call_args(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Call => {
                let children = self.children(id);
                if children.is_empty() {
                    children
                } else {
                    &children[1..]
                }
            }
            _ => &[],
        }
    }

    pub fn arrow_body(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Arrow { .. } => self.children(id).first().copied(),
            _ => None,
        }
    }

    pub fn arrow_is_async(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Arrow { is_async: true, .. })
    }

    pub fn return_arg(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Return => self.children(id).first().copied(),
            _ => None,
        }
    }

    /// (test, consequent, alternate) of an if-statement.
    pub fn if_parts(&self, id: NodeId) -> Option<(NodeId, NodeId, Option<NodeId>)> {
        match self.kind(id) {
            NodeKind::If => {
                let c = self.children(id);
                Some((*c.first()?, *c.get(1)?, c.get(2).copied()))
            }
            _ => None,
        }
    }

    /// (test, consequent, alternate) of a ternary expression.
    pub fn cond_parts(&self, id: NodeId) -> Option<(NodeId, NodeId, NodeId)> {
        match self.kind(id) {
            NodeKind::Cond => {
                let c = self.children(id);
                Some((*c.first()?, *c.get(1)?, *c.get(2)?))
            }
            _ => None,
        }
    }

    pub fn import_source(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::ImportDecl { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn specifier_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::ImportSpecifier { imported, .. } => Some(imported),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Collect every descendant of `scope` (preorder, excluding `scope`
    /// itself) for which the predicate holds.
    pub fn find_all<F>(&self, scope: NodeId, pred: F) -> Vec<NodeId>
    where
        F: Fn(&Ast, NodeId) -> bool,
    {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if pred(self, id) {
                out.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Does any descendant of `scope` satisfy the predicate?
    pub fn any<F>(&self, scope: NodeId, pred: F) -> bool
    where
        F: Fn(&Ast, NodeId) -> bool,
    {
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if pred(self, id) {
                return true;
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        false
    }

    /// Is `id` still reachable from `scope` by walking parent links?
    /// Replaced subtrees stay in the arena but detach from the tree.
    pub fn is_attached(&self, scope: NodeId, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == scope {
                return true;
            }
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    fn mark_dirty(&mut self, id: NodeId) {
        self.node_mut(id).self_dirty = true;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if self.node(p).sub_dirty {
                break;
            }
            self.node_mut(p).sub_dirty = true;
            cur = self.parent(p);
        }
    }

    /// Replace `old` with `new` in `old`'s parent, keeping `old`'s source
    /// position as the anchor of `new`. Comments around the replaced span
    /// live in the parent's source gaps and are untouched by the splice,
    /// so they survive the replacement.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let parent = match self.parent(old) {
            Some(p) => p,
            None => return,
        };
        let anchor = self.anchor_span(old);
        if let Some(pos) = self.node(parent).children.iter().position(|&c| c == old) {
            self.node_mut(parent).children[pos] = new;
        } else {
            return;
        }
        self.node_mut(new).parent = Some(parent);
        if self.node(new).span.is_none() {
            self.node_mut(new).anchor = anchor;
        }
        self.node_mut(old).parent = None;
        self.mark_dirty(parent);
    }

    /// Remove and return the last statement of a block. The popped
    /// statement's span (widened over its leading indentation and line
    /// break) is recorded so printing skips it.
    pub fn pop_stmt(&mut self, block: NodeId, src: &str) -> Option<NodeId> {
        let popped = self.node_mut(block).children.pop()?;
        self.node_mut(popped).parent = None;
        if let Some(span) = self.node(popped).span {
            let widened = widen_over_leading_ws(src, span);
            self.node_mut(block).removed.push(widened);
        }
        self.mark_dirty(block);
        Some(popped)
    }

    /// Append a statement to a block.
    pub fn push_stmt(&mut self, block: NodeId, stmt: NodeId) {
        self.node_mut(stmt).parent = Some(block);
        self.node_mut(block).children.push(stmt);
        self.mark_dirty(block);
    }

    /// Toggle the async flag on an arrow function. No-op if already set.
    pub fn set_async(&mut self, arrow: NodeId, value: bool) {
        match &mut self.node_mut(arrow).kind {
            NodeKind::Arrow { is_async, .. } => {
                if *is_async == value {
                    return;
                }
                *is_async = value;
            }
            _ => return,
        }
        self.mark_dirty(arrow);
    }

    /// Add a named specifier to an import declaration.
    pub fn push_specifier(&mut self, decl: NodeId, spec: NodeId) {
        self.node_mut(spec).parent = Some(decl);
        self.node_mut(decl).children.push(spec);
        self.mark_dirty(decl);
    }

    /// Remove every named specifier importing `name` from a declaration.
    pub fn remove_specifier(&mut self, decl: NodeId, name: &str) {
        let keep: Vec<NodeId> = self
            .node(decl)
            .children
            .iter()
            .copied()
            .filter(|&s| self.specifier_name(s) != Some(name))
            .collect();
        if keep.len() == self.node(decl).children.len() {
            return;
        }
        self.node_mut(decl).children = keep;
        self.mark_dirty(decl);
    }

    pub(crate) fn removed_spans(&self, id: NodeId) -> &[Span] {
        &self.node(id).removed
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

/// Extend a span's start back over spaces and tabs and at most one line
/// break, so removing a statement also removes the line it occupied.
fn widen_over_leading_ws(src: &str, span: Span) -> Span {
    let bytes = src.as_bytes();
    let mut start = span.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] == b'\n' {
        start -= 1;
        if start > 0 && bytes[start - 1] == b'\r' {
            start -= 1;
        }
    }
    Span::new(start, span.end)
}

/// Extend a span's end forward over spaces and tabs, so removing a token
/// (the `async` keyword) also removes its trailing gap.
pub(crate) fn widen_over_trailing_ws(src: &str, span: Span) -> Span {
    let bytes = src.as_bytes();
    let mut end = span.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    Span::new(span.start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(ast: &mut Ast, name: &str, start: usize, end: usize) -> NodeId {
        ast.alloc(
            NodeKind::Ident {
                name: name.to_string(),
            },
            Span::new(start, end),
        )
    }

    #[test]
    fn test_find_all_descendants() {
        let mut ast = Ast::new();
        let root = ast.alloc(NodeKind::Program, Span::new(0, 10));
        let block = ast.alloc(NodeKind::Block, Span::new(0, 10));
        ast.attach(root, block);
        let a = leaf(&mut ast, "a", 1, 2);
        let b = leaf(&mut ast, "b", 3, 4);
        ast.attach(block, a);
        ast.attach(block, b);

        let idents = ast.find_all(root, |a, n| matches!(a.kind(n), NodeKind::Ident { .. }));
        assert_eq!(idents, vec![a, b]);
        assert!(ast.any(root, |a, n| a.ident_name(n) == Some("b")));
        assert!(!ast.any(root, |a, n| a.ident_name(n) == Some("c")));
    }

    #[test]
    fn test_replace_detaches_old_subtree() {
        let mut ast = Ast::new();
        let root = ast.alloc(NodeKind::Program, Span::new(0, 5));
        let old = leaf(&mut ast, "old", 0, 3);
        ast.attach(root, old);

        let new = ast.ident("new");
        ast.replace(old, new);

        assert!(ast.is_attached(root, new));
        assert!(!ast.is_attached(root, old));
        // The replacement inherits the old node's position.
        assert_eq!(ast.anchor_span(new), Some(Span::new(0, 3)));
        assert!(ast.is_dirty(root));
    }

    #[test]
    fn test_pop_stmt_records_widened_span() {
        let src = "{\n  return x;\n}";
        let mut ast = Ast::new();
        let block = ast.alloc(NodeKind::Block, Span::new(0, src.len()));
        let ret = ast.alloc(NodeKind::Return, Span::new(4, 13));
        ast.attach(block, ret);

        let popped = ast.pop_stmt(block, src).unwrap();
        assert_eq!(popped, ret);
        assert!(ast.children(block).is_empty());
        // Widened back over the two-space indent and the newline.
        assert_eq!(ast.removed_spans(block), &[Span::new(1, 13)]);
    }

    #[test]
    fn test_set_async_is_idempotent() {
        let mut ast = Ast::new();
        let arrow = ast.alloc(
            NodeKind::Arrow {
                is_async: false,
                async_span: None,
            },
            Span::new(0, 8),
        );
        ast.set_async(arrow, false);
        assert!(!ast.is_dirty(arrow));
        ast.set_async(arrow, true);
        assert!(ast.arrow_is_async(arrow));
        assert!(ast.is_dirty(arrow));
    }
}
