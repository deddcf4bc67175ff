//! Tree-sitter AST helpers shared by the analysis passes.
//!
//! The walk helper is the only traversal primitive the engine uses: a
//! depth-first pre-order visit with a predicate-based early stop per
//! subtree.

use tree_sitter::Node;

/// Depth-first pre-order walk. The visitor returns `false` to skip the
/// subtree rooted at the current node.
pub fn walk<'t, F>(node: Node<'t>, f: &mut F)
where
    F: FnMut(Node<'t>) -> bool,
{
    if !f(node) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

/// Decode the source text of a node. Invalid UTF-8 ranges decode empty.
#[inline]
pub fn node_text<'s>(source: &'s str, node: Node) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// First named child with the given field name.
#[inline]
pub fn field<'t>(node: Node<'t>, name: &str) -> Option<Node<'t>> {
    node.child_by_field_name(name)
}

/// All named children of a node, collected.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children bound to a repeated field, collected.
pub fn field_children<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(name, &mut cursor).collect()
}

/// True if the node is a call expression.
#[inline]
pub fn is_call_expression(node: Node) -> bool {
    node.kind() == "call_expression"
}

/// True if the node is a function literal.
#[inline]
pub fn is_func_literal(node: Node) -> bool {
    node.kind() == "func_literal"
}

/// 1-indexed (line, column) of a node's start, for diagnostics.
#[inline]
pub fn position(node: Node) -> (usize, usize) {
    let point = node.start_position();
    (point.row + 1, point.column + 1)
}
