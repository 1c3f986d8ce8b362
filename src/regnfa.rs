// regnfa.rs - NFA representation and Thompson construction.
//
// States live in an arena and are addressed by `StateId`. Edges are labelled
// either epsilon or with a set of class indices from the `CharSet`; raw
// characters never appear in the automaton.

use smallvec::{smallvec, SmallVec};

use crate::error::RegexError;
use crate::regast::{Ast, Node, NodeVisitor, RangeNode, SetNode};
use crate::regclass::CharSet;
use crate::regint::{ClassIndex, NodeId, StateId, DEFAULT_NEST_LIMIT};

// === Representation ===

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeLabel {
    Epsilon,
    /// Consumes one character of any listed class. An empty list never fires.
    Classes(SmallVec<[ClassIndex; 4]>),
}

impl EdgeLabel {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, EdgeLabel::Epsilon)
    }

    pub fn matches(&self, class: ClassIndex) -> bool {
        match self {
            EdgeLabel::Epsilon => false,
            EdgeLabel::Classes(classes) => classes.contains(&class),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub target: StateId,
    pub label: EdgeLabel,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NfaState {
    edges: SmallVec<[Edge; 2]>,
}

impl NfaState {
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// A Thompson NFA with one start and one final state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Nfa {
    states: Vec<NfaState>,
    start: StateId,
    final_state: StateId,
}

impl Nfa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self) -> StateId {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    pub fn add_edge(&mut self, from: StateId, target: StateId, label: EdgeLabel) {
        self.states[from].edges.push(Edge { target, label });
    }

    pub fn add_epsilon(&mut self, from: StateId, target: StateId) {
        self.add_edge(from, target, EdgeLabel::Epsilon);
    }

    pub fn set_start(&mut self, state: StateId) {
        self.start = state;
    }

    pub fn set_final(&mut self, state: StateId) {
        self.final_state = state;
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn final_state(&self) -> StateId {
        self.final_state
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn edges(&self, state: StateId) -> &[Edge] {
        self.states[state].edges()
    }

    pub fn states(&self) -> &[NfaState] {
        &self.states
    }
}

// === Thompson Construction ===

/// Entry and exit state of a partially built automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub start: StateId,
    pub end: StateId,
}

/// Visitor lowering an AST subtree into an NFA fragment.
///
/// Subtrees may be visited more than once (bounded repetition copies its
/// operand); each visit creates fresh states. Lowering recurses once per tree
/// level below the flattened concatenation and alternation spines, bounded by
/// the nest limit.
pub struct NfaBuilder<'c> {
    charset: &'c CharSet,
    nfa: Nfa,
    state_limit: usize,
    nest_limit: usize,
    depth: usize,
}

impl<'c> NfaBuilder<'c> {
    pub fn new(charset: &'c CharSet, state_limit: usize) -> Self {
        NfaBuilder {
            charset,
            nfa: Nfa::new(),
            state_limit,
            nest_limit: DEFAULT_NEST_LIMIT,
            depth: 0,
        }
    }

    /// Maximum tree depth lowered before failing with `NestLimitOver`.
    pub fn nest_limit(mut self, limit: usize) -> Self {
        self.nest_limit = limit;
        self
    }

    /// Lower the tree rooted at `root` and finish the automaton.
    pub fn invoke(mut self, ast: &Ast, root: NodeId) -> Result<Nfa, RegexError> {
        let frag = self.lower(ast, root)?;
        self.nfa.set_start(frag.start);
        self.nfa.set_final(frag.end);
        Ok(self.nfa)
    }

    fn lower(&mut self, ast: &Ast, node: NodeId) -> Result<Fragment, RegexError> {
        if self.depth >= self.nest_limit {
            return Err(RegexError::NestLimitOver {
                limit: self.nest_limit,
            });
        }
        self.depth += 1;
        let frag = ast.accept(node, self);
        self.depth -= 1;
        frag
    }

    fn new_state(&mut self) -> Result<StateId, RegexError> {
        if self.nfa.len() >= self.state_limit {
            return Err(RegexError::NfaTooLarge {
                limit: self.state_limit,
            });
        }
        Ok(self.nfa.add_state())
    }

    fn labelled(&mut self, label: EdgeLabel) -> Result<Fragment, RegexError> {
        let start = self.new_state()?;
        let end = self.new_state()?;
        self.nfa.add_edge(start, end, label);
        Ok(Fragment { start, end })
    }

    /// `frag` repeated zero or more times, entered from `from`.
    fn kleene(&mut self, from: StateId, frag: Fragment) -> Result<StateId, RegexError> {
        let end = self.new_state()?;
        self.nfa.add_epsilon(from, frag.start);
        self.nfa.add_epsilon(from, end);
        self.nfa.add_epsilon(frag.end, frag.start);
        self.nfa.add_epsilon(frag.end, end);
        Ok(end)
    }
}

impl NodeVisitor for NfaBuilder<'_> {
    type Output = Result<Fragment, RegexError>;

    fn visit_char(&mut self, _ast: &Ast, _id: NodeId, c: char) -> Self::Output {
        let classes = self.charset.class_of(c).into_iter().collect();
        self.labelled(EdgeLabel::Classes(classes))
    }

    fn visit_range(&mut self, ast: &Ast, _id: NodeId, range: &RangeNode) -> Self::Output {
        let start = self.new_state()?;
        let mut cur = start;
        for _ in 0..range.min {
            let frag = self.lower(ast, range.node)?;
            self.nfa.add_epsilon(cur, frag.start);
            cur = frag.end;
        }
        match range.max {
            None => {
                let frag = self.lower(ast, range.node)?;
                cur = self.kleene(cur, frag)?;
            }
            Some(max) => {
                let end = self.new_state()?;
                self.nfa.add_epsilon(cur, end);
                for _ in range.min..max {
                    let frag = self.lower(ast, range.node)?;
                    self.nfa.add_epsilon(cur, frag.start);
                    self.nfa.add_epsilon(frag.end, end);
                    cur = frag.end;
                }
                cur = end;
            }
        }
        Ok(Fragment { start, end: cur })
    }

    fn visit_set(&mut self, _ast: &Ast, _id: NodeId, set: &SetNode) -> Self::Output {
        let classes = self.charset.classes_for_set(set).into_iter().collect();
        self.labelled(EdgeLabel::Classes(classes))
    }

    fn visit_concatenation(
        &mut self,
        ast: &Ast,
        _id: NodeId,
        left: NodeId,
        right: NodeId,
    ) -> Self::Output {
        // Walk the left spine iteratively; long literals nest deeply.
        let mut rights = vec![right];
        let mut cur = left;
        while let Node::Concatenation { left, right } = &ast[cur] {
            rights.push(*right);
            cur = *left;
        }
        let mut frag = self.lower(ast, cur)?;
        for &node in rights.iter().rev() {
            let next = self.lower(ast, node)?;
            self.nfa.add_epsilon(frag.end, next.start);
            frag.end = next.end;
        }
        Ok(frag)
    }

    fn visit_alternation(
        &mut self,
        ast: &Ast,
        _id: NodeId,
        left: NodeId,
        right: NodeId,
    ) -> Self::Output {
        let start = self.new_state()?;
        let mut branches = vec![right];
        let mut cur = left;
        while let Node::Alternation { left, right } = &ast[cur] {
            branches.push(*right);
            cur = *left;
        }
        branches.push(cur);

        let mut exits: SmallVec<[StateId; 4]> = smallvec![];
        for &node in branches.iter().rev() {
            let frag = self.lower(ast, node)?;
            self.nfa.add_epsilon(start, frag.start);
            exits.push(frag.end);
        }
        let end = self.new_state()?;
        for exit in exits {
            self.nfa.add_epsilon(exit, end);
        }
        Ok(Fragment { start, end })
    }

    fn visit_star(&mut self, ast: &Ast, _id: NodeId, operand: NodeId) -> Self::Output {
        let start = self.new_state()?;
        let frag = self.lower(ast, operand)?;
        let end = self.kleene(start, frag)?;
        Ok(Fragment { start, end })
    }

    fn visit_plus(&mut self, ast: &Ast, _id: NodeId, operand: NodeId) -> Self::Output {
        let frag = self.lower(ast, operand)?;
        let end = self.new_state()?;
        self.nfa.add_epsilon(frag.end, frag.start);
        self.nfa.add_epsilon(frag.end, end);
        Ok(Fragment {
            start: frag.start,
            end,
        })
    }

    fn visit_ques(&mut self, ast: &Ast, _id: NodeId, operand: NodeId) -> Self::Output {
        let start = self.new_state()?;
        let frag = self.lower(ast, operand)?;
        let end = self.new_state()?;
        self.nfa.add_epsilon(start, frag.start);
        self.nfa.add_epsilon(start, end);
        self.nfa.add_epsilon(frag.end, end);
        Ok(Fragment { start, end })
    }

    fn visit_end_of_string(
        &mut self,
        ast: &Ast,
        _id: NodeId,
        operand: Option<NodeId>,
    ) -> Self::Output {
        let anchor: SmallVec<[ClassIndex; 4]> = self.charset.end_class().into_iter().collect();
        match operand {
            Some(node) => {
                let frag = self.lower(ast, node)?;
                let end = self.new_state()?;
                self.nfa.add_edge(frag.end, end, EdgeLabel::Classes(anchor));
                Ok(Fragment {
                    start: frag.start,
                    end,
                })
            }
            None => self.labelled(EdgeLabel::Classes(anchor)),
        }
    }
}

/// Build the NFA for the tree rooted at `root`, labelling edges with `charset`.
pub fn build_nfa(
    ast: &Ast,
    root: NodeId,
    charset: &CharSet,
    state_limit: usize,
) -> Result<Nfa, RegexError> {
    NfaBuilder::new(charset, state_limit).invoke(ast, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regint::DEFAULT_NFA_STATE_LIMIT;
    use crate::regparse::parse;

    fn nfa(pattern: &str) -> Nfa {
        let ast = parse(pattern).unwrap();
        let cs = CharSet::from_ast(&ast);
        build_nfa(&ast, ast.root().unwrap(), &cs, DEFAULT_NFA_STATE_LIMIT).unwrap()
    }

    #[test]
    fn single_char_is_one_edge() {
        let nfa = nfa("a");
        assert_eq!(nfa.len(), 2);
        let edges = nfa.edges(nfa.start());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, nfa.final_state());
        assert_eq!(edges[0].label, EdgeLabel::Classes(smallvec![0]));
        assert!(nfa.edges(nfa.final_state()).is_empty());
    }

    #[test]
    fn concatenation_links_with_epsilon() {
        let nfa = nfa("ab");
        assert_eq!(nfa.len(), 4);
        let eps: Vec<_> = nfa
            .states()
            .iter()
            .flat_map(|s| s.edges())
            .filter(|e| e.label.is_epsilon())
            .collect();
        assert_eq!(eps.len(), 1);
    }

    #[test]
    fn alternation_chain_is_flat() {
        let nfa = nfa("a|b|c");
        // split, three branches of two states, join
        assert_eq!(nfa.len(), 8);
        assert_eq!(nfa.edges(nfa.start()).len(), 3);
        assert!(nfa.edges(nfa.start()).iter().all(|e| e.label.is_epsilon()));
    }

    #[test]
    fn star_has_loop_and_skip() {
        let nfa = nfa("a*");
        assert_eq!(nfa.len(), 4);
        let start_targets: Vec<_> = nfa.edges(nfa.start()).iter().map(|e| e.target).collect();
        assert!(start_targets.contains(&nfa.final_state()));
    }

    #[test]
    fn zero_zero_range_is_single_epsilon() {
        let nfa = nfa("a{0}");
        assert_eq!(nfa.len(), 2);
        assert_eq!(nfa.edges(nfa.start()).len(), 1);
        assert!(nfa.edges(nfa.start())[0].label.is_epsilon());
    }

    #[test]
    fn bounded_range_copies_operand() {
        let nfa = nfa("a{2,3}");
        let labelled = nfa
            .states()
            .iter()
            .flat_map(|s| s.edges())
            .filter(|e| !e.label.is_epsilon())
            .count();
        assert_eq!(labelled, 3);
    }

    #[test]
    fn empty_positive_set_is_dead_edge() {
        let mut ast = Ast::new();
        ast.set(SetNode::new(true));
        let cs = CharSet::from_ast(&ast);
        let nfa = build_nfa(&ast, 0, &cs, DEFAULT_NFA_STATE_LIMIT).unwrap();
        let edge = &nfa.edges(nfa.start())[0];
        assert!(!edge.label.is_epsilon());
        assert_eq!(edge.label, EdgeLabel::Classes(SmallVec::new()));
    }

    #[test]
    fn end_anchor_uses_end_class() {
        let nfa = nfa("a$");
        let cs = CharSet::from_ast(&parse("a$").unwrap());
        let end = cs.end_class().unwrap();
        let into_final = nfa
            .states()
            .iter()
            .flat_map(|s| s.edges())
            .find(|e| e.target == nfa.final_state())
            .unwrap();
        assert!(into_final.label.matches(end));
    }

    #[test]
    fn state_limit() {
        let ast = parse("a{1000}").unwrap();
        let cs = CharSet::from_ast(&ast);
        let err = build_nfa(&ast, ast.root().unwrap(), &cs, 100).unwrap_err();
        assert_eq!(err, RegexError::NfaTooLarge { limit: 100 });
    }

    #[test]
    fn nest_limit() {
        let ast = parse("((a*)*)*").unwrap();
        let cs = CharSet::from_ast(&ast);
        let root = ast.root().unwrap();
        let err = NfaBuilder::new(&cs, DEFAULT_NFA_STATE_LIMIT)
            .nest_limit(3)
            .invoke(&ast, root)
            .unwrap_err();
        assert_eq!(err, RegexError::NestLimitOver { limit: 3 });
        assert!(NfaBuilder::new(&cs, DEFAULT_NFA_STATE_LIMIT)
            .nest_limit(4)
            .invoke(&ast, root)
            .is_ok());
    }

    #[test]
    fn long_literal_does_not_recurse_deeply() {
        let pattern = "x".repeat(20_000);
        let nfa = nfa(&pattern);
        assert_eq!(nfa.len(), 40_000);
    }
}
