use std::ops::Index;

use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    BreakStmt, ContinueStmt, ExportSpecifier, Expr, ExprOrSpread, Ident, ImportSpecifier, JSXAttr, JSXElement,
    JSXExprContainer, JSXFragment, MemberProp, ModuleDecl, Pat, ReturnStmt, Stmt, SuperProp,
    ThrowStmt, YieldExpr,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::parse::ParsedFile;

/// Index of a node inside a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The node kinds the locator and resolver care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An `import ... from "..."` declaration.
    ImportDecl,

    /// An `export { ... }` list or an `export * from "..."` declaration.
    NamedExport,

    /// Any other module declaration (`export function`, `export default`, ...).
    ModuleDecl,

    /// A member of an import declaration's specifier list.
    ImportSpecifier,

    /// A member of an export declaration's specifier list.
    ExportSpecifier,

    /// A statement.
    Stmt,

    /// An expression.
    Expr,

    /// A binding pattern (parameters, declared variables, ...).
    Pat,

    /// An identifier in any position.
    Ident,

    /// The `.name` part of a property access.
    MemberProp,

    /// A spread argument (`...args`).
    Spread,

    /// JSX markup: an element, a fragment or an attribute.
    Jsx,

    /// A `{ ... }` container embedding an expression in JSX.
    JsxExprContainer,

    /// A `return`, `throw`, `break`, `continue` or `yield` whose argument may not be preceded
    /// by a line break.
    Restricted {
        /// Where the argument starts.
        arg_start: u32,

        /// Whether this is a statement rather than a `yield` expression.
        statement: bool,
    },
}

/// A node of a [`SyntaxTree`].
///
/// Offsets are byte offsets relative to the start of the file. A child's span is always
/// contained in its parent's span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// Where the node starts.
    pub start: u32,

    /// Where the node ends (exclusive).
    pub end: u32,

    /// What kind of node this is.
    pub kind: NodeKind,

    /// The nearest recorded ancestor.
    pub parent: Option<NodeId>,
}

impl SyntaxNode {
    /// Length of the node's span.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Checks whether the node's span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Checks whether `offset` falls within the node's span, both ends included.
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// A flat, pre-order view of a parsed module.
///
/// The tree is built once per file and never changes shape; it only answers which node a
/// diagnostic belongs to and which node should carry the suppression comment.
#[derive(Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Records every node of `file` in traversal order.
    pub fn build(file: &ParsedFile) -> Self {
        let mut collector = NodeCollector {
            file,
            tree: SyntaxTree::default(),
            stack: Vec::new(),
        };
        file.module.visit_with(&mut collector);
        collector.tree
    }

    pub(crate) fn push(
        &mut self,
        start: u32,
        end: u32,
        kind: NodeKind,
        parent: Option<NodeId>,
    ) -> NodeId {
        debug_assert!(start <= end);
        self.nodes.push(SyntaxNode {
            start,
            end,
            kind,
            parent,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks whether no node was recorded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The parent of `id`, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    /// Iterates over `id` and then each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&id| self.parent(id))
    }

    /// Finds the smallest node whose span contains `offset`.
    ///
    /// When several candidates have the same length the one seen first in traversal order
    /// wins, which is always the outermost of them.
    pub fn locate(&self, offset: u32) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.contains(offset))
            .min_by_key(|(_, node)| node.len())
            .map(|(i, _)| NodeId(i))
    }

    /// Picks the node that should carry the suppression comment for the located node `id`.
    ///
    /// Specifiers are hoisted to their import or export declaration, JSX markup to the
    /// statement holding its outermost element, property names to their member expression,
    /// spread operands to the spread, and the first token of a `return`, `throw`, `break`,
    /// `continue` or `yield` argument to the keyword itself.
    pub fn resolve(&self, id: NodeId) -> NodeId {
        if let Some(decl) = self
            .ancestors(id)
            .find(|&a| matches!(self[a].kind, NodeKind::ImportDecl | NodeKind::NamedExport))
        {
            return decl;
        }

        let mut target = self.hoist_out_of_jsx(id).unwrap_or(id);
        if matches!(self[target].kind, NodeKind::Jsx | NodeKind::JsxExprContainer) {
            // the code generator drops comments in front of JSX markup
            target = self.enclosing_statement(target);
        }
        target = self.hoist_out_of_member(target);

        if let Some(parent) = self.parent(target) {
            if self[parent].kind == NodeKind::Spread {
                target = parent;
            }
        }

        self.hoist_out_of_restricted(target)
    }

    fn hoist_out_of_jsx(&self, id: NodeId) -> Option<NodeId> {
        let mut part = None;
        for a in self.ancestors(id) {
            match self[a].kind {
                NodeKind::Jsx => part = Some(a),
                NodeKind::JsxExprContainer if a == id => part = Some(a),
                // the contents of `{ ... }` are plain expressions
                NodeKind::JsxExprContainer => break,
                _ if part.is_some() => break,
                _ => {}
            }
        }
        part
    }

    fn enclosing_statement(&self, id: NodeId) -> NodeId {
        self.ancestors(id)
            .find(|&a| {
                matches!(
                    self[a].kind,
                    NodeKind::Stmt
                        | NodeKind::ModuleDecl
                        | NodeKind::ImportDecl
                        | NodeKind::NamedExport
                        | NodeKind::Restricted {
                            statement: true,
                            ..
                        }
                )
            })
            .unwrap_or(id)
    }

    fn hoist_out_of_member(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if self[current].kind == NodeKind::MemberProp || self[parent].kind == NodeKind::MemberProp
            {
                current = parent;
            } else {
                break;
            }
        }
        current
    }

    fn hoist_out_of_restricted(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            let start = self[current].start;
            let keyword = self.ancestors(current).find(|&a| {
                matches!(self[a].kind, NodeKind::Restricted { arg_start, .. } if arg_start == start)
            });

            match keyword {
                Some(keyword) if keyword != current => current = keyword,
                _ => return current,
            }
        }
    }
}

impl Index<NodeId> for SyntaxTree {
    type Output = SyntaxNode;

    fn index(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }
}

/// Walks a module and records the spans of every node kind in [`NodeKind`].
struct NodeCollector<'a> {
    file: &'a ParsedFile,
    tree: SyntaxTree,
    stack: Vec<NodeId>,
}

impl NodeCollector<'_> {
    /// Records a node, then visits its children with the node as their parent.
    fn record<N>(&mut self, span: Span, kind: NodeKind, node: &N)
    where
        N: VisitWith<Self>,
    {
        let entered = match self.file.offsets(span) {
            Some((start, end)) => {
                let parent = self.stack.last().copied();
                let id = self.tree.push(start, end, kind, parent);
                self.stack.push(id);
                true
            }
            None => false,
        };

        node.visit_children_with(self);

        if entered {
            self.stack.pop();
        }
    }

    fn restricted(&self, arg: Span, otherwise: NodeKind) -> NodeKind {
        match self.file.offsets(arg) {
            Some((arg_start, _)) => NodeKind::Restricted {
                arg_start,
                statement: otherwise == NodeKind::Stmt,
            },
            None => otherwise,
        }
    }
}

impl Visit for NodeCollector<'_> {
    fn visit_module_decl(&mut self, n: &ModuleDecl) {
        let kind = match n {
            ModuleDecl::Import(_) => NodeKind::ImportDecl,
            ModuleDecl::ExportNamed(_) | ModuleDecl::ExportAll(_) => NodeKind::NamedExport,
            _ => NodeKind::ModuleDecl,
        };
        self.record(n.span(), kind, n);
    }

    fn visit_import_specifier(&mut self, n: &ImportSpecifier) {
        self.record(n.span(), NodeKind::ImportSpecifier, n);
    }

    fn visit_export_specifier(&mut self, n: &ExportSpecifier) {
        self.record(n.span(), NodeKind::ExportSpecifier, n);
    }

    fn visit_stmt(&mut self, n: &Stmt) {
        let kind = match n {
            Stmt::Return(ReturnStmt { arg: Some(arg), .. }) | Stmt::Throw(ThrowStmt { arg, .. }) => {
                self.restricted(arg.span(), NodeKind::Stmt)
            }
            Stmt::Break(BreakStmt {
                label: Some(label), ..
            })
            | Stmt::Continue(ContinueStmt {
                label: Some(label), ..
            }) => self.restricted(label.span, NodeKind::Stmt),
            _ => NodeKind::Stmt,
        };
        self.record(n.span(), kind, n);
    }

    fn visit_expr(&mut self, n: &Expr) {
        let kind = match n {
            Expr::Yield(YieldExpr { arg: Some(arg), .. }) => {
                self.restricted(arg.span(), NodeKind::Expr)
            }
            _ => NodeKind::Expr,
        };
        self.record(n.span(), kind, n);
    }

    fn visit_pat(&mut self, n: &Pat) {
        self.record(n.span(), NodeKind::Pat, n);
    }

    fn visit_ident(&mut self, n: &Ident) {
        self.record(n.span, NodeKind::Ident, n);
    }

    fn visit_member_prop(&mut self, n: &MemberProp) {
        match n {
            MemberProp::Computed(_) => n.visit_children_with(self),
            _ => self.record(n.span(), NodeKind::MemberProp, n),
        }
    }

    fn visit_super_prop(&mut self, n: &SuperProp) {
        match n {
            SuperProp::Computed(_) => n.visit_children_with(self),
            _ => self.record(n.span(), NodeKind::MemberProp, n),
        }
    }

    fn visit_expr_or_spread(&mut self, n: &ExprOrSpread) {
        match n.spread {
            Some(dots) => self.record(dots.with_hi(n.expr.span().hi), NodeKind::Spread, n),
            None => n.visit_children_with(self),
        }
    }

    fn visit_jsx_element(&mut self, n: &JSXElement) {
        self.record(n.span, NodeKind::Jsx, n);
    }

    fn visit_jsx_fragment(&mut self, n: &JSXFragment) {
        self.record(n.span, NodeKind::Jsx, n);
    }

    fn visit_jsx_attr(&mut self, n: &JSXAttr) {
        self.record(n.span, NodeKind::Jsx, n);
    }

    fn visit_jsx_expr_container(&mut self, n: &JSXExprContainer) {
        self.record(n.span, NodeKind::JsxExprContainer, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn resolved_at(file: &ParsedFile, needle: &str) -> SyntaxNode {
        let tree = SyntaxTree::build(file);
        let id = tree
            .locate(offset_of(file.source(), needle))
            .expect("a node at the needle");
        tree[tree.resolve(id)].clone()
    }

    #[test]
    fn smallest_covering_span_wins() {
        let mut tree = SyntaxTree::default();
        let outer = tree.push(0, 10, NodeKind::Stmt, None);
        let middle = tree.push(2, 8, NodeKind::Expr, Some(outer));
        let inner = tree.push(3, 6, NodeKind::Expr, Some(middle));

        assert_eq!(tree.locate(4), Some(inner));
        assert_eq!(tree.locate(6), Some(inner));
        assert_eq!(tree.locate(7), Some(middle));
        assert_eq!(tree.locate(10), Some(outer));
        assert_eq!(tree.locate(11), None);
    }

    #[test]
    fn first_seen_wins_ties() {
        let mut tree = SyntaxTree::default();
        let expr = tree.push(4, 7, NodeKind::Expr, None);
        tree.push(4, 7, NodeKind::Ident, Some(expr));

        assert_eq!(tree.locate(5), Some(expr));
    }

    #[test]
    fn empty_tree() {
        let file = parse_helper("");
        let tree = SyntaxTree::build(&file);

        assert!(tree.is_empty());
        assert_eq!(tree.locate(0), None);
    }

    #[test]
    fn spans_nest() {
        let file = parse_helper("function foo(str: string): number {\n  return 3 * str;\n}\n");
        let tree = SyntaxTree::build(&file);

        assert!(!tree.is_empty());
        for i in 0..tree.len() {
            let node = &tree[NodeId(i)];
            assert!(node.start <= node.end);
            if let Some(parent) = node.parent {
                assert!(tree[parent].start <= node.start && node.end <= tree[parent].end);
            }
        }
    }

    #[test]
    fn narrows_to_operand() {
        let source = "function foo(str: string): number {\n  return 3 * str;\n}\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "str;");

        assert_eq!(node.kind, NodeKind::Expr);
        assert_eq!(node.start, offset_of(source, "str;"));
        assert_eq!(node.end, offset_of(source, ";\n}"));
    }

    #[test]
    fn import_specifier_resolves_to_declaration() {
        let source = "import { help } from \"./helpers\";\nexport function fingerprintUrl(url) {}\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "help");

        assert_eq!(node.kind, NodeKind::ImportDecl);
        assert_eq!(node.start, 0);
    }

    #[test]
    fn default_import_resolves_to_declaration() {
        let file = parse_helper("import Foo from \"./noDefaultExport\";\n");
        let node = resolved_at(&file, "Foo");

        assert_eq!(node.kind, NodeKind::ImportDecl);
    }

    #[test]
    fn export_specifier_resolves_to_declaration() {
        let file = parse_helper("const a = 1;\nexport { a as b };\n");
        let node = resolved_at(&file, "a as b");

        assert_eq!(node.kind, NodeKind::NamedExport);
    }

    #[test]
    fn property_access_resolves_to_chain() {
        let source = "this.events[type].push(callback);\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "push");

        assert_eq!(node.kind, NodeKind::Expr);
        assert_eq!(node.start, 0);
        assert_eq!(node.end, offset_of(source, "(callback)"));
    }

    #[test]
    fn computed_property_is_not_hoisted() {
        let source = "this.events[type] = [];\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "type");

        assert_eq!(node.kind, NodeKind::Expr);
        assert_eq!(node.start, offset_of(source, "type"));
    }

    #[test]
    fn spread_operand_resolves_to_spread() {
        let source = "class A extends B {\n  constructor() {\n    super(...arguments);\n  }\n}\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "arguments");

        assert_eq!(node.kind, NodeKind::Spread);
        assert_eq!(node.start, offset_of(source, "...arguments"));
    }

    #[test]
    fn return_argument_start_resolves_to_return() {
        let source = "function f(a, b) {\n  return a + b;\n}\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "a + b");

        assert!(matches!(node.kind, NodeKind::Restricted { .. }));
        assert_eq!(node.start, offset_of(source, "return"));
    }

    #[test]
    fn throw_argument_resolves_to_throw() {
        let source = "function f(e) {\n  throw e.message;\n}\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "message");

        assert_eq!(node.start, offset_of(source, "throw"));
    }

    #[test]
    fn jsx_markup_resolves_to_statement() {
        let source = "const dom = <div>\n  <h1 foo=\"bar\">My Text</h1>\n</div>;\n";
        let file = parse_file_helper("index.tsx", source);
        let node = resolved_at(&file, "h1");

        assert_eq!(node.kind, NodeKind::Stmt);
        assert_eq!(node.start, 0);
    }

    #[test]
    fn returned_jsx_resolves_to_return() {
        let source = "const items = list.map(item => {\n  return <Item key={item} />;\n});\n";
        let file = parse_file_helper("index.tsx", source);
        let node = resolved_at(&file, "Item key");

        assert!(matches!(node.kind, NodeKind::Restricted { statement: true, .. }));
        assert_eq!(node.start, offset_of(source, "return"));
    }

    #[test]
    fn jsx_in_arrow_body_resolves_to_statement() {
        let source = "const items = list.map(item => <Item key={item} />);\n";
        let file = parse_file_helper("index.tsx", source);
        let node = resolved_at(&file, "Item key");

        assert_eq!(node.kind, NodeKind::Stmt);
        assert_eq!(node.start, 0);
    }

    #[test]
    fn break_label_resolves_to_break() {
        let source = "outer: for (;;) {\n  break outer;\n}\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "outer;");

        assert!(matches!(node.kind, NodeKind::Restricted { statement: true, .. }));
        assert_eq!(node.start, offset_of(source, "break"));
    }

    #[test]
    fn continue_label_resolves_to_continue() {
        let source = "outer: while (ok) {\n  continue outer;\n}\n";
        let file = parse_helper(source);
        let node = resolved_at(&file, "outer;");

        assert_eq!(node.start, offset_of(source, "continue"));
    }

    #[test]
    fn jsx_expression_container_is_plain_code() {
        let source = "const dom = <div>{count * \"Cats\"}</div>;\n";
        let file = parse_file_helper("index.tsx", source);
        let node = resolved_at(&file, "\"Cats\"");

        assert_eq!(node.kind, NodeKind::Expr);
        assert_eq!(node.start, offset_of(source, "\"Cats\""));
    }
}
