// regmin.rs - DFA minimization by partition refinement (Moore).
//
// Start from the blocks {final} and {non-final}; split every block by the
// blocks its transitions lead to until no block splits. A missing transition
// is its own distinct target. Blocks are numbered by their first member in
// state order, so the start state stays 0 and a minimal table maps onto
// itself unchanged.

use std::collections::HashMap;

use log::debug;
use smallvec::SmallVec;

use crate::regdfa::{DfaState, Dtran, StateSet};

type Signature = (usize, SmallVec<[Option<usize>; 16]>);

/// Renumber `keys` by order of first occurrence. Returns the block count.
fn number_by_first_occurrence<K, I>(keys: I, blocks: &mut Vec<usize>) -> usize
where
    K: std::hash::Hash + Eq,
    I: IntoIterator<Item = K>,
{
    let mut ids: HashMap<K, usize> = HashMap::new();
    blocks.clear();
    for key in keys {
        let next = ids.len();
        blocks.push(*ids.entry(key).or_insert(next));
    }
    ids.len()
}

/// Block id of every state in the coarsest stable partition.
pub fn refine_partition(dtran: &Dtran) -> (Vec<usize>, usize) {
    let mut block = Vec::with_capacity(dtran.len());
    let mut count = number_by_first_occurrence(
        dtran.states().iter().map(|s| s.is_final()),
        &mut block,
    );

    let mut next = Vec::with_capacity(dtran.len());
    loop {
        let signatures = dtran.states().iter().enumerate().map(|(i, s)| -> Signature {
            let targets = s
                .transitions()
                .iter()
                .map(|t| t.map(|t| block[t]))
                .collect();
            (block[i], targets)
        });
        let refined = number_by_first_occurrence(signatures, &mut next);
        std::mem::swap(&mut block, &mut next);
        if refined == count {
            break;
        }
        count = refined;
    }
    (block, count)
}

/// Collapse equivalent states of `dtran`.
///
/// Every block keeps the transitions of its first member, remapped to block
/// ids, and the sorted union of its members' NFA subsets.
pub fn minimize(dtran: &Dtran) -> Dtran {
    if dtran.is_empty() {
        return dtran.clone();
    }
    let width = dtran.width();
    let (block, count) = refine_partition(dtran);

    let mut subsets: Vec<StateSet> = vec![Vec::new(); count];
    let mut reps: Vec<Option<usize>> = vec![None; count];
    for (i, state) in dtran.states().iter().enumerate() {
        subsets[block[i]].extend_from_slice(state.nfa_set());
        reps[block[i]].get_or_insert(i);
    }

    let mut out = Dtran::new(width);
    for (b, (mut subset, rep)) in subsets.into_iter().zip(reps).enumerate() {
        subset.sort_unstable();
        subset.dedup();
        let rep = &dtran[rep.unwrap_or(b)];
        let mut state = DfaState::new(subset, rep.is_final(), width);
        for (class, target) in rep.transitions().iter().enumerate() {
            state.set_transition(class, target.map(|t| block[t]));
        }
        out.push(state);
    }

    debug!("minimization: {} -> {} DFA states", dtran.len(), out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regclass::CharSet;
    use crate::regdfa::determinize;
    use crate::regint::{DEFAULT_DFA_STATE_LIMIT, DEFAULT_NFA_STATE_LIMIT};
    use crate::regnfa::build_nfa;
    use crate::regparse::parse;

    fn dfa(pattern: &str) -> Dtran {
        let ast = parse(pattern).unwrap();
        let cs = CharSet::from_ast(&ast);
        let nfa = build_nfa(&ast, ast.root().unwrap(), &cs, DEFAULT_NFA_STATE_LIMIT).unwrap();
        determinize(&nfa, &cs, DEFAULT_DFA_STATE_LIMIT).unwrap()
    }

    #[test]
    fn merges_equivalent_finals() {
        let d = dfa("a|b");
        assert_eq!(d.len(), 3);
        let m = minimize(&d);
        assert_eq!(m.len(), 2);
        assert_eq!(m.step(0, 0), Some(1));
        assert_eq!(m.step(0, 1), Some(1));
        assert!(m[1].is_final());
    }

    #[test]
    fn star_collapses_to_one_state() {
        let m = minimize(&dfa("a*"));
        assert_eq!(m.len(), 1);
        assert!(m[0].is_final());
        assert_eq!(m.step(0, 0), Some(0));
    }

    #[test]
    fn classic_abb() {
        let d = dfa("(a|b)*abb");
        assert!(d.len() >= 4);
        let m = minimize(&d);
        assert_eq!(m.len(), 4);
        assert_eq!(m.final_count(), 1);
    }

    #[test]
    fn minimal_dfa_is_unchanged() {
        let d = dfa("ab");
        assert_eq!(minimize(&d), d);
    }

    #[test]
    fn idempotent() {
        for pattern in ["(a|b)*abb", "a+b*|c{2,4}", "[a-c]x|[b-d]y", "(ab|ac)*$"] {
            let once = minimize(&dfa(pattern));
            assert_eq!(minimize(&once), once, "{}", pattern);
        }
    }

    #[test]
    fn start_stays_zero() {
        let m = minimize(&dfa("x(a|b)*"));
        assert!(!m[0].is_final());
        assert!(m.step(0, 0).is_some() || m.step(0, 1).is_some() || m.step(0, 2).is_some());
    }

    #[test]
    fn missing_transition_distinguishes() {
        // After "a" both "b" and end are accepted; after "c" only end.
        let m = minimize(&dfa("ab?|c"));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn merged_subset_is_union() {
        let d = dfa("a|b");
        let m = minimize(&d);
        let mut expected: Vec<_> = d[1]
            .nfa_set()
            .iter()
            .chain(d[2].nfa_set())
            .copied()
            .collect();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(m[1].nfa_set(), expected.as_slice());
    }
}
