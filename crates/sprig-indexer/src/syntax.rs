//! Syntax tree walking and control-flow counting

use sprig_core::Span;
use tree_sitter::Node;

/// Visit every node overlapping `span` in pre-order. Returning `false` from
/// `visit` skips that node's children.
pub fn visit_within<'t>(root: Node<'t>, span: &Span, visit: &mut impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        let overlaps = (node.start_byte() < span.end && span.start < node.end_byte())
            || (node.start_byte() == span.start && node.end_byte() == span.end);

        if overlaps && visit(node) && cursor.goto_first_child() {
            continue;
        }

        if cursor.goto_next_sibling() {
            continue;
        }
        loop {
            if !cursor.goto_parent() {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

/// Visit every node of the tree under `root` in pre-order.
pub fn visit_all<'t>(root: Node<'t>, visit: &mut impl FnMut(Node<'t>) -> bool) {
    let span = Span::new(root.start_byte(), root.end_byte(), 0, 0);
    visit_within(root, &span, visit);
}

/// Count nodes inside `span` whose kind is in `kinds`. A span without any
/// control flow scores zero.
pub fn cyclomatic_complexity(root: Node, span: &Span, kinds: &[&str]) -> usize {
    let mut count = 0;
    visit_within(root, span, &mut |node| {
        let inside = node.start_byte() >= span.start && node.end_byte() <= span.end;
        if inside && kinds.contains(&node.kind()) {
            count += 1;
        }
        true
    });
    count
}

/// Walk named children of `node`.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children bound to `field`.
pub fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Whether `node` has a direct child (named or not) of `kind`.
pub fn has_child_kind(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}
