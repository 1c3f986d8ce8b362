// regast.rs - AST node types, the node container and the visitor contract.
//
// Nodes live in a single arena (`Ast`) and refer to their children by
// `NodeId`. The parser appends bottom-up, so the last node is the root and
// every child precedes its parent.

use std::ops::Index;

use crate::error::RegexError;
use crate::regint::{CodePoint, NodeId};

// === Node Variants ===

/// Bounded or unbounded repetition of an operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeNode {
    pub node: NodeId,
    pub min: u32,
    /// `None` means no upper bound.
    pub max: Option<u32>,
}

/// A bracketed character class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetNode {
    ranges: Vec<(char, char)>,
    positive: bool,
}

impl SetNode {
    pub fn new(positive: bool) -> Self {
        SetNode {
            ranges: Vec::new(),
            positive,
        }
    }

    /// Add the inclusive range `low..=high`.
    pub fn add_range(&mut self, low: char, high: char) -> &mut Self {
        self.ranges.push((low, high));
        self
    }

    pub fn add_char(&mut self, c: char) -> &mut Self {
        self.add_range(c, c)
    }

    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Sort the ranges by lower bound and coalesce overlapping or adjacent ones.
    pub fn merge(&mut self) {
        if self.ranges.len() < 2 {
            return;
        }
        self.ranges.sort_by_key(|&(low, _)| low);

        let mut merged: Vec<(char, char)> = Vec::with_capacity(self.ranges.len());
        for &(low, high) in &self.ranges {
            if let Some(last) = merged.last_mut() {
                if low as CodePoint <= last.1 as CodePoint + 1 {
                    if high > last.1 {
                        last.1 = high;
                    }
                    continue;
                }
            }
            merged.push((low, high));
        }
        self.ranges = merged;
    }

    /// Whether the ranges (ignoring the polarity flag) contain `cp`.
    pub fn ranges_contain(&self, cp: CodePoint) -> bool {
        self.ranges
            .iter()
            .any(|&(low, high)| low as CodePoint <= cp && cp <= high as CodePoint)
    }

    /// Whether the class matches `cp`, honoring the polarity flag.
    pub fn matches(&self, cp: CodePoint) -> bool {
        self.ranges_contain(cp) == self.positive
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Char(char),
    Range(RangeNode),
    Set(SetNode),
    Concatenation { left: NodeId, right: NodeId },
    Alternation { left: NodeId, right: NodeId },
    Star(NodeId),
    Plus(NodeId),
    Ques(NodeId),
    EndOfString(Option<NodeId>),
}

// === Visitor ===

/// One handler per node variant.
///
/// [`Node::accept_visitor`] calls exactly one of these with the node's own
/// data. Handlers that need to descend call [`Ast::accept`] on the children.
pub trait NodeVisitor {
    type Output;

    fn visit_char(&mut self, ast: &Ast, id: NodeId, c: char) -> Self::Output;
    fn visit_range(&mut self, ast: &Ast, id: NodeId, range: &RangeNode) -> Self::Output;
    fn visit_set(&mut self, ast: &Ast, id: NodeId, set: &SetNode) -> Self::Output;
    fn visit_concatenation(
        &mut self,
        ast: &Ast,
        id: NodeId,
        left: NodeId,
        right: NodeId,
    ) -> Self::Output;
    fn visit_alternation(
        &mut self,
        ast: &Ast,
        id: NodeId,
        left: NodeId,
        right: NodeId,
    ) -> Self::Output;
    fn visit_star(&mut self, ast: &Ast, id: NodeId, operand: NodeId) -> Self::Output;
    fn visit_plus(&mut self, ast: &Ast, id: NodeId, operand: NodeId) -> Self::Output;
    fn visit_ques(&mut self, ast: &Ast, id: NodeId, operand: NodeId) -> Self::Output;
    fn visit_end_of_string(
        &mut self,
        ast: &Ast,
        id: NodeId,
        operand: Option<NodeId>,
    ) -> Self::Output;
}

impl Node {
    pub fn accept_visitor<V: NodeVisitor>(
        &self,
        ast: &Ast,
        id: NodeId,
        visitor: &mut V,
    ) -> V::Output {
        match self {
            Node::Char(c) => visitor.visit_char(ast, id, *c),
            Node::Range(range) => visitor.visit_range(ast, id, range),
            Node::Set(set) => visitor.visit_set(ast, id, set),
            Node::Concatenation { left, right } => {
                visitor.visit_concatenation(ast, id, *left, *right)
            }
            Node::Alternation { left, right } => {
                visitor.visit_alternation(ast, id, *left, *right)
            }
            Node::Star(operand) => visitor.visit_star(ast, id, *operand),
            Node::Plus(operand) => visitor.visit_plus(ast, id, *operand),
            Node::Ques(operand) => visitor.visit_ques(ast, id, *operand),
            Node::EndOfString(operand) => visitor.visit_end_of_string(ast, id, *operand),
        }
    }

    /// Child ids in left-to-right order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        let (a, b) = match *self {
            Node::Char(_) | Node::Set(_) | Node::EndOfString(None) => (None, None),
            Node::Range(RangeNode { node, .. }) => (Some(node), None),
            Node::Concatenation { left, right } | Node::Alternation { left, right } => {
                (Some(left), Some(right))
            }
            Node::Star(n) | Node::Plus(n) | Node::Ques(n) | Node::EndOfString(Some(n)) => {
                (Some(n), None)
            }
        };
        a.into_iter().chain(b)
    }
}

// === Container ===

/// Arena of every node created while parsing, in creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The top of the tree: the most recently created node.
    pub fn root(&self) -> Option<NodeId> {
        self.nodes.len().checked_sub(1)
    }

    /// Dispatch `visitor` on node `id`.
    pub fn accept<V: NodeVisitor>(&self, id: NodeId, visitor: &mut V) -> V::Output {
        self.nodes[id].accept_visitor(self, id, visitor)
    }

    // --- builders ---

    pub fn char(&mut self, c: char) -> NodeId {
        self.push(Node::Char(c))
    }

    pub fn set(&mut self, set: SetNode) -> NodeId {
        self.push(Node::Set(set))
    }

    pub fn concat(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::Concatenation { left, right })
    }

    pub fn alternate(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::Alternation { left, right })
    }

    pub fn star(&mut self, operand: NodeId) -> NodeId {
        self.push(Node::Star(operand))
    }

    pub fn plus(&mut self, operand: NodeId) -> NodeId {
        self.push(Node::Plus(operand))
    }

    pub fn ques(&mut self, operand: NodeId) -> NodeId {
        self.push(Node::Ques(operand))
    }

    pub fn range(&mut self, operand: NodeId, min: u32, max: Option<u32>) -> NodeId {
        self.push(Node::Range(RangeNode {
            node: operand,
            min,
            max,
        }))
    }

    pub fn end_of_string(&mut self, operand: Option<NodeId>) -> NodeId {
        self.push(Node::EndOfString(operand))
    }

    /// Check the structural invariants the automaton builders rely on.
    pub fn validate(&self) -> Result<(), RegexError> {
        if self.nodes.is_empty() {
            return Err(RegexError::invalid_ast(0, "empty AST"));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            for child in node.children() {
                if child >= self.nodes.len() {
                    return Err(RegexError::invalid_ast(
                        id,
                        format!("child {} out of bounds", child),
                    ));
                }
                if child >= id {
                    return Err(RegexError::invalid_ast(
                        id,
                        format!("child {} does not precede its parent", child),
                    ));
                }
            }
            match node {
                Node::Range(RangeNode {
                    min,
                    max: Some(max),
                    ..
                }) if max < min => {
                    return Err(RegexError::invalid_ast(
                        id,
                        format!("repeat upper bound {} below lower bound {}", max, min),
                    ));
                }
                Node::Set(set) => {
                    if let Some(&(low, high)) = set.ranges().iter().find(|(l, h)| l > h) {
                        return Err(RegexError::invalid_ast(
                            id,
                            format!("set range {:?}-{:?} is reversed", low, high),
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_coalesces_overlapping_and_adjacent() {
        let mut set = SetNode::new(true);
        set.add_range('m', 'p')
            .add_range('a', 'c')
            .add_range('d', 'f')
            .add_range('n', 'z')
            .add_char('0');
        set.merge();
        assert_eq!(set.ranges(), &[('0', '0'), ('a', 'f'), ('m', 'z')]);
    }

    #[test]
    fn merge_keeps_gaps() {
        let mut set = SetNode::new(true);
        set.add_char('c').add_char('a');
        set.merge();
        assert_eq!(set.ranges(), &[('a', 'a'), ('c', 'c')]);
    }

    #[test]
    fn merge_contained_range() {
        let mut set = SetNode::new(false);
        set.add_range('a', 'z').add_range('c', 'd');
        set.merge();
        assert_eq!(set.ranges(), &[('a', 'z')]);
        assert!(!set.is_positive());
    }

    #[test]
    fn set_matches_honors_polarity() {
        let mut pos = SetNode::new(true);
        pos.add_range('a', 'c');
        assert!(pos.matches('b' as u32));
        assert!(!pos.matches('d' as u32));

        let mut neg = SetNode::new(false);
        neg.add_range('a', 'c');
        assert!(!neg.matches('b' as u32));
        assert!(neg.matches('d' as u32));
    }

    #[test]
    fn root_is_last_node() {
        let mut ast = Ast::new();
        assert_eq!(ast.root(), None);
        let a = ast.char('a');
        let b = ast.char('b');
        let ab = ast.concat(a, b);
        assert_eq!(ast.root(), Some(ab));
        assert_eq!(ast.len(), 3);
    }

    struct Counter {
        chars: usize,
        others: usize,
    }

    impl NodeVisitor for Counter {
        type Output = ();

        fn visit_char(&mut self, _: &Ast, _: NodeId, _: char) {
            self.chars += 1;
        }
        fn visit_range(&mut self, _: &Ast, _: NodeId, _: &RangeNode) {
            self.others += 1;
        }
        fn visit_set(&mut self, _: &Ast, _: NodeId, _: &SetNode) {
            self.others += 1;
        }
        fn visit_concatenation(&mut self, ast: &Ast, _: NodeId, l: NodeId, r: NodeId) {
            self.others += 1;
            ast.accept(l, self);
            ast.accept(r, self);
        }
        fn visit_alternation(&mut self, ast: &Ast, _: NodeId, l: NodeId, r: NodeId) {
            self.others += 1;
            ast.accept(l, self);
            ast.accept(r, self);
        }
        fn visit_star(&mut self, ast: &Ast, _: NodeId, n: NodeId) {
            self.others += 1;
            ast.accept(n, self);
        }
        fn visit_plus(&mut self, ast: &Ast, _: NodeId, n: NodeId) {
            self.others += 1;
            ast.accept(n, self);
        }
        fn visit_ques(&mut self, ast: &Ast, _: NodeId, n: NodeId) {
            self.others += 1;
            ast.accept(n, self);
        }
        fn visit_end_of_string(&mut self, ast: &Ast, _: NodeId, n: Option<NodeId>) {
            self.others += 1;
            if let Some(n) = n {
                ast.accept(n, self);
            }
        }
    }

    #[test]
    fn visitor_dispatches_per_variant() {
        let mut ast = Ast::new();
        let a = ast.char('a');
        let b = ast.char('b');
        let alt = ast.alternate(a, b);
        let star = ast.star(alt);
        let root = ast.end_of_string(Some(star));

        let mut counter = Counter { chars: 0, others: 0 };
        ast.accept(root, &mut counter);
        assert_eq!(counter.chars, 2);
        assert_eq!(counter.others, 3);
    }

    #[test]
    fn validate_accepts_well_formed() {
        let mut ast = Ast::new();
        let a = ast.char('a');
        ast.range(a, 2, None);
        assert!(ast.validate().is_ok());
    }

    #[test]
    fn validate_rejects_reversed_bounds() {
        let mut ast = Ast::new();
        let a = ast.char('a');
        ast.range(a, 3, Some(2));
        let err = ast.validate().unwrap_err();
        assert!(matches!(err, RegexError::InvalidAst { node: 1, .. }));
    }

    #[test]
    fn validate_rejects_forward_reference() {
        let mut ast = Ast::new();
        ast.push(Node::Star(1));
        ast.char('a');
        assert!(matches!(
            ast.validate(),
            Err(RegexError::InvalidAst { node: 0, .. })
        ));
    }

    #[test]
    fn validate_rejects_dangling_child() {
        let mut ast = Ast::new();
        ast.char('a');
        ast.push(Node::Concatenation { left: 0, right: 9 });
        assert!(ast.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty() {
        assert!(Ast::new().validate().is_err());
    }

    #[test]
    fn children_order() {
        let node = Node::Concatenation { left: 3, right: 5 };
        assert_eq!(node.children().collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(Node::EndOfString(None).children().count(), 0);
    }
}
