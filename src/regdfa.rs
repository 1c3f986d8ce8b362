// regdfa.rs - Subset construction: NFA -> DFA transition table.
//
// A DFA state stands for the set of NFA states the automaton can be in at
// once. States are discovered breadth-first and numbered in order of first
// discovery, so the same NFA always yields the same table.

use std::collections::HashMap;
use std::ops::Index;

use log::{debug, trace};

use crate::error::RegexError;
use crate::regclass::CharSet;
use crate::regint::{ClassIndex, StateId};
use crate::regnfa::{EdgeLabel, Nfa};

/// Sorted, duplicate-free list of NFA state ids.
pub type StateSet = Vec<StateId>;

// === DFA Table ===

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfaState {
    nfa_set: StateSet,
    is_final: bool,
    trans: Vec<Option<usize>>,
}

impl DfaState {
    pub fn new(nfa_set: StateSet, is_final: bool, width: usize) -> Self {
        DfaState {
            nfa_set,
            is_final,
            trans: vec![None; width],
        }
    }

    /// The NFA states this DFA state stands for.
    pub fn nfa_set(&self) -> &[StateId] {
        &self.nfa_set
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn transition(&self, class: ClassIndex) -> Option<usize> {
        self.trans.get(class).copied().flatten()
    }

    pub fn transitions(&self) -> &[Option<usize>] {
        &self.trans
    }

    pub fn set_transition(&mut self, class: ClassIndex, target: Option<usize>) {
        self.trans[class] = target;
    }
}

/// DFA transition table. State 0 is the start state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dtran {
    states: Vec<DfaState>,
    width: usize,
}

impl Dtran {
    /// An empty table with `width` class columns.
    pub fn new(width: usize) -> Self {
        Dtran {
            states: Vec::new(),
            width,
        }
    }

    pub fn push(&mut self, state: DfaState) -> usize {
        debug_assert_eq!(state.trans.len(), self.width);
        self.states.push(state);
        self.states.len() - 1
    }

    /// Number of class columns (the partition's `max_index`).
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    pub fn get(&self, state: usize) -> Option<&DfaState> {
        self.states.get(state)
    }

    pub fn step(&self, state: usize, class: ClassIndex) -> Option<usize> {
        self.states.get(state)?.transition(class)
    }

    pub fn final_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_final).count()
    }
}

impl Index<usize> for Dtran {
    type Output = DfaState;

    fn index(&self, state: usize) -> &DfaState {
        &self.states[state]
    }
}

// === Closure / Move ===

/// Scratch space for epsilon-closure. Owned by one determinization call.
struct Closure<'n> {
    nfa: &'n Nfa,
    seen: Vec<bool>,
    stack: Vec<StateId>,
    members: Vec<StateId>,
}

impl<'n> Closure<'n> {
    fn new(nfa: &'n Nfa) -> Self {
        Closure {
            nfa,
            seen: vec![false; nfa.len()],
            stack: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Add `state` and everything epsilon-reachable from it.
    fn add(&mut self, state: StateId) {
        if self.seen[state] {
            return;
        }
        self.seen[state] = true;
        self.members.push(state);
        self.stack.push(state);
        while let Some(cur) = self.stack.pop() {
            for edge in self.nfa.edges(cur) {
                if edge.label.is_epsilon() && !self.seen[edge.target] {
                    self.seen[edge.target] = true;
                    self.members.push(edge.target);
                    self.stack.push(edge.target);
                }
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drain the accumulated set, sorted, and reset the scratch.
    fn take(&mut self) -> StateSet {
        for &s in &self.members {
            self.seen[s] = false;
        }
        let mut set = std::mem::take(&mut self.members);
        set.sort_unstable();
        set
    }
}

/// All states reachable from `state` through epsilon edges, `state` included.
pub fn epsilon_closure(nfa: &Nfa, state: StateId) -> StateSet {
    let mut closure = Closure::new(nfa);
    closure.add(state);
    closure.take()
}

/// Union of the epsilon-closures of `states`.
pub fn epsilon_closure_set(nfa: &Nfa, states: &[StateId]) -> StateSet {
    let mut closure = Closure::new(nfa);
    for &s in states {
        closure.add(s);
    }
    closure.take()
}

/// States reached from `states` by one edge accepting `class`.
pub fn move_on(nfa: &Nfa, states: &[StateId], class: ClassIndex) -> StateSet {
    let mut out: StateSet = states
        .iter()
        .flat_map(|&s| nfa.edges(s))
        .filter(|e| e.label.matches(class))
        .map(|e| e.target)
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Every labelled edge must use classes in `[0, max_index)`.
pub fn check_classes(nfa: &Nfa, max_index: usize) -> Result<(), RegexError> {
    for state in nfa.states() {
        for edge in state.edges() {
            if let EdgeLabel::Classes(classes) = &edge.label {
                if let Some(&class) = classes.iter().find(|&&c| c >= max_index) {
                    return Err(RegexError::ClassOutOfRange { class, max_index });
                }
            }
        }
    }
    Ok(())
}

/// Start, final and every edge target must be states of `nfa`.
pub fn check_states(nfa: &Nfa) -> Result<(), RegexError> {
    let len = nfa.len();
    let targets = nfa.states().iter().flat_map(|s| s.edges()).map(|e| e.target);
    for state in [nfa.start(), nfa.final_state()].into_iter().chain(targets) {
        if state >= len {
            return Err(RegexError::StateOutOfRange { state, len });
        }
    }
    Ok(())
}

// === Subset Construction ===

/// Determinize `nfa` over the classes of `charset`.
///
/// Each unmarked subset is stepped with `move_on` for every class and the
/// result closed over epsilon edges.
///
/// Fails with `DfaTooLarge` once more than `state_limit` DFA states would be
/// needed, and with `NoAcceptingState` when no reachable subset contains the
/// NFA's final state.
pub fn determinize(
    nfa: &Nfa,
    charset: &CharSet,
    state_limit: usize,
) -> Result<Dtran, RegexError> {
    let width = charset.max_index();
    check_states(nfa)?;
    check_classes(nfa, width)?;

    let final_state = nfa.final_state();
    let mut closure = Closure::new(nfa);
    let mut dtran = Dtran::new(width);
    let mut index: HashMap<StateSet, usize> = HashMap::new();

    closure.add(nfa.start());
    let start = closure.take();
    let start_final = start.binary_search(&final_state).is_ok();
    index.insert(start.clone(), 0);
    dtran.push(DfaState::new(start, start_final, width));

    let mut current = 0;
    while current < dtran.len() {
        for class in 0..width {
            for s in move_on(nfa, dtran.states[current].nfa_set(), class) {
                closure.add(s);
            }
            if closure.is_empty() {
                continue;
            }
            let candidate = closure.take();
            let target = match index.get(&candidate) {
                Some(&existing) => existing,
                None => {
                    if dtran.len() >= state_limit {
                        return Err(RegexError::DfaTooLarge { limit: state_limit });
                    }
                    let is_final = candidate.binary_search(&final_state).is_ok();
                    let id = dtran.push(DfaState::new(candidate.clone(), is_final, width));
                    trace!(
                        "dfa state {} = {:?} (final: {})",
                        id,
                        candidate,
                        is_final
                    );
                    index.insert(candidate, id);
                    id
                }
            };
            dtran.states[current].trans[class] = Some(target);
        }
        current += 1;
    }

    if dtran.final_count() == 0 {
        return Err(RegexError::NoAcceptingState);
    }
    debug!(
        "subset construction: {} NFA states -> {} DFA states over {} classes",
        nfa.len(),
        dtran.len(),
        width
    );
    Ok(dtran)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regast::{Ast, SetNode};
    use crate::regint::{DEFAULT_DFA_STATE_LIMIT, DEFAULT_NFA_STATE_LIMIT};
    use crate::regnfa::build_nfa;
    use crate::regparse::parse;
    use smallvec::smallvec;

    fn lower(ast: &Ast) -> (CharSet, Nfa) {
        let cs = CharSet::from_ast(ast);
        let nfa = build_nfa(ast, ast.root().unwrap(), &cs, DEFAULT_NFA_STATE_LIMIT).unwrap();
        (cs, nfa)
    }

    fn dfa(pattern: &str) -> Dtran {
        let (cs, nfa) = lower(&parse(pattern).unwrap());
        determinize(&nfa, &cs, DEFAULT_DFA_STATE_LIMIT).unwrap()
    }

    #[test]
    fn closure_contains_start() {
        let (_, nfa) = lower(&parse("(a|b)*c?").unwrap());
        for s in 0..nfa.len() {
            assert!(epsilon_closure(&nfa, s).contains(&s));
        }
    }

    #[test]
    fn closure_is_idempotent() {
        let (_, nfa) = lower(&parse("(a*|b+)*(c?d){0,2}").unwrap());
        for s in 0..nfa.len() {
            let once = epsilon_closure(&nfa, s);
            let twice = epsilon_closure_set(&nfa, &once);
            assert_eq!(once, twice);
        }
        let all: Vec<_> = (0..nfa.len()).step_by(3).collect();
        let once = epsilon_closure_set(&nfa, &all);
        assert_eq!(epsilon_closure_set(&nfa, &once), once);
    }

    #[test]
    fn closure_survives_epsilon_cycles() {
        let mut nfa = Nfa::new();
        let a = nfa.add_state();
        let b = nfa.add_state();
        let c = nfa.add_state();
        nfa.add_epsilon(a, b);
        nfa.add_epsilon(b, a);
        nfa.add_epsilon(b, c);
        nfa.add_epsilon(c, c);
        assert_eq!(epsilon_closure(&nfa, a), vec![a, b, c]);
        assert_eq!(epsilon_closure(&nfa, c), vec![c]);
    }

    #[test]
    fn move_ignores_epsilon_edges() {
        let mut nfa = Nfa::new();
        let a = nfa.add_state();
        let b = nfa.add_state();
        let c = nfa.add_state();
        nfa.add_epsilon(a, b);
        nfa.add_edge(a, c, EdgeLabel::Classes(smallvec![0, 2]));
        nfa.add_edge(b, c, EdgeLabel::Classes(smallvec![0]));
        assert_eq!(move_on(&nfa, &[a, b], 0), vec![c]);
        assert_eq!(move_on(&nfa, &[a], 2), vec![c]);
        assert!(move_on(&nfa, &[a, b], 1).is_empty());
    }

    #[test]
    fn single_char() {
        let d = dfa("a");
        assert_eq!(d.width(), 1);
        assert_eq!(d.len(), 2);
        assert!(!d[0].is_final());
        assert_eq!(d.step(0, 0), Some(1));
        assert!(d[1].is_final());
        assert_eq!(d.step(1, 0), None);
    }

    #[test]
    fn concatenation_is_linear() {
        let d = dfa("ab");
        assert_eq!(d.width(), 2);
        assert_eq!(d.len(), 3);
        assert_eq!(d.step(0, 0), Some(1));
        assert_eq!(d.step(0, 1), None);
        assert_eq!(d.step(1, 1), Some(2));
        assert_eq!(d.step(1, 0), None);
        assert_eq!(
            d.states().iter().map(|s| s.is_final()).collect::<Vec<_>>(),
            vec![false, false, true]
        );
    }

    #[test]
    fn alternation_splits() {
        let d = dfa("a|b");
        assert_eq!(d.len(), 3);
        let on_a = d.step(0, 0).unwrap();
        let on_b = d.step(0, 1).unwrap();
        assert_ne!(on_a, on_b);
        assert!(d[on_a].is_final());
        assert!(d[on_b].is_final());
    }

    #[test]
    fn star_loops() {
        let d = dfa("a*");
        assert!(d[0].is_final());
        let next = d.step(0, 0).unwrap();
        assert!(d[next].is_final());
        assert_eq!(d.step(next, 0), Some(next));
    }

    #[test]
    fn transitions_are_deterministic() {
        let d = dfa("(a|ab)(c|bcd)(d*)");
        for state in d.states() {
            assert_eq!(state.transitions().len(), d.width());
            for target in state.transitions().iter().flatten() {
                assert!(*target < d.len());
            }
        }
    }

    #[test]
    fn numbering_is_reproducible() {
        assert_eq!(dfa("(a|b)*abb"), dfa("(a|b)*abb"));
    }

    #[test]
    fn empty_set_branch_contributes_nothing() {
        let mut ast = Ast::new();
        let a = ast.char('a');
        let none = ast.set(SetNode::new(true));
        ast.alternate(a, none);
        let (cs, nfa) = lower(&ast);
        let d = determinize(&nfa, &cs, DEFAULT_DFA_STATE_LIMIT).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.width(), 1);
    }

    #[test]
    fn unreachable_final_fails() {
        let mut ast = Ast::new();
        let none = ast.set(SetNode::new(true));
        let b = ast.char('b');
        ast.concat(none, b);
        let (cs, nfa) = lower(&ast);
        assert_eq!(
            determinize(&nfa, &cs, DEFAULT_DFA_STATE_LIMIT).unwrap_err(),
            RegexError::NoAcceptingState
        );
    }

    #[test]
    fn class_out_of_range_is_reported() {
        let (cs, _) = lower(&parse("a").unwrap());
        let mut nfa = Nfa::new();
        let s = nfa.add_state();
        let f = nfa.add_state();
        nfa.add_edge(s, f, EdgeLabel::Classes(smallvec![3]));
        nfa.set_start(s);
        nfa.set_final(f);
        assert_eq!(
            determinize(&nfa, &cs, DEFAULT_DFA_STATE_LIMIT).unwrap_err(),
            RegexError::ClassOutOfRange {
                class: 3,
                max_index: 1
            }
        );
    }

    #[test]
    fn dangling_states_are_reported() {
        let (cs, _) = lower(&parse("a").unwrap());
        assert_eq!(
            determinize(&Nfa::new(), &cs, DEFAULT_DFA_STATE_LIMIT).unwrap_err(),
            RegexError::StateOutOfRange { state: 0, len: 0 }
        );

        let mut nfa = Nfa::new();
        let s = nfa.add_state();
        let f = nfa.add_state();
        nfa.add_edge(s, 5, EdgeLabel::Classes(smallvec![0]));
        nfa.add_epsilon(s, f);
        nfa.set_start(s);
        nfa.set_final(f);
        let err = determinize(&nfa, &cs, DEFAULT_DFA_STATE_LIMIT).unwrap_err();
        assert_eq!(err, RegexError::StateOutOfRange { state: 5, len: 2 });
        assert!(err.is_internal());

        nfa.set_final(9);
        assert_eq!(
            check_states(&nfa).unwrap_err(),
            RegexError::StateOutOfRange { state: 9, len: 2 }
        );
    }

    #[test]
    fn state_limit() {
        // (a|b)*a(a|b){6} needs 2^7 DFA states.
        let (cs, nfa) = lower(&parse("(a|b)*a(a|b){6}").unwrap());
        assert_eq!(
            determinize(&nfa, &cs, 64).unwrap_err(),
            RegexError::DfaTooLarge { limit: 64 }
        );
        assert!(determinize(&nfa, &cs, 1024).is_ok());
    }
}
