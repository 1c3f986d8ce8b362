// regclass.rs - Character partition: code point -> class index.
//
// Every `Char` and `Set` node of the pattern is a "distinguisher". The code
// point space is cut into elementary intervals at every range boundary and
// each interval is labelled by the set of distinguishers containing it. Two
// code points share a class iff their labels are equal, so the NFA and DFA
// only need one column per class instead of one per character.

use std::collections::{BTreeSet, HashMap};

use smallvec::SmallVec;

use crate::regast::{Ast, NodeVisitor, RangeNode, SetNode};
use crate::regint::{ClassIndex, CodePoint, NodeId, CODE_POINT_MAX};

type Signature = SmallVec<[u64; 2]>;

const SURROGATE_LOW: CodePoint = 0xD800;
const SURROGATE_HIGH: CodePoint = 0xDFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ClassInterval {
    low: CodePoint,
    high: CodePoint,
    class: ClassIndex,
}

/// The character partition of one pattern.
///
/// Classes are numbered by the lowest code point they contain. When the
/// pattern has a negative set, every code point outside all literals and
/// ranges maps to one extra "other" class; without a negative set such code
/// points have no class. When the pattern has an end-of-string anchor, the
/// last class is the end-of-input class, which no code point maps to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharSet {
    intervals: Vec<ClassInterval>,
    representatives: Vec<CodePoint>,
    other: Option<ClassIndex>,
    end: Option<ClassIndex>,
    max_index: usize,
}

impl CharSet {
    /// Build the partition from every node of `ast`, linked into the tree or not.
    pub fn from_ast(ast: &Ast) -> CharSet {
        let mut builder = CharSetBuilder::new();
        for id in 0..ast.len() {
            ast.accept(id, &mut builder);
        }
        builder.build()
    }

    /// Number of classes, including the other and end classes when present.
    pub fn max_index(&self) -> usize {
        self.max_index
    }

    pub fn class_of(&self, c: char) -> Option<ClassIndex> {
        self.class_of_code(c as CodePoint)
    }

    pub fn class_of_code(&self, cp: CodePoint) -> Option<ClassIndex> {
        let idx = self.intervals.partition_point(|iv| iv.low <= cp);
        match idx.checked_sub(1).map(|i| &self.intervals[i]) {
            Some(iv) if cp <= iv.high => Some(iv.class),
            _ => self.other,
        }
    }

    /// Class fed to the automaton after the last input character.
    pub fn end_class(&self) -> Option<ClassIndex> {
        self.end
    }

    pub fn other_class(&self) -> Option<ClassIndex> {
        self.other
    }

    /// A code point belonging to `class`; `None` for the end class.
    pub fn representative(&self, class: ClassIndex) -> Option<CodePoint> {
        self.representatives.get(class).copied()
    }

    /// Every character class whose members `set` matches.
    ///
    /// `set` must be one of the nodes the partition was built from; the end
    /// class is never included.
    pub fn classes_for_set(&self, set: &SetNode) -> SmallVec<[ClassIndex; 8]> {
        self.representatives
            .iter()
            .enumerate()
            .filter(|&(_, &rep)| set.matches(rep))
            .map(|(class, _)| class)
            .collect()
    }
}

/// Visitor collecting the distinguishers of a pattern.
///
/// Visits one node at a time and does not descend: the caller dispatches it
/// on every node of the container.
#[derive(Debug, Default)]
pub struct CharSetBuilder {
    distinguishers: Vec<SmallVec<[(CodePoint, CodePoint); 2]>>,
    has_negative: bool,
    has_end: bool,
}

impl CharSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> CharSet {
        let mut bounds = BTreeSet::new();
        bounds.insert(0);
        bounds.insert(CODE_POINT_MAX + 1);
        for ranges in &self.distinguishers {
            for &(low, high) in ranges {
                bounds.insert(low);
                bounds.insert(high + 1);
            }
        }
        let bounds: Vec<CodePoint> = bounds.into_iter().collect();
        let n_intervals = bounds.len() - 1;

        let words = self.distinguishers.len().div_ceil(64);
        let mut signatures: Vec<Signature> = vec![SmallVec::from_elem(0, words); n_intervals];
        for (d, ranges) in self.distinguishers.iter().enumerate() {
            for &(low, high) in ranges {
                let mut i = bounds.partition_point(|&b| b < low);
                while i < n_intervals && bounds[i] <= high {
                    signatures[i][d / 64] |= 1 << (d % 64);
                    i += 1;
                }
            }
        }

        let mut intervals = Vec::new();
        let mut representatives = Vec::new();
        let mut by_signature: HashMap<&Signature, ClassIndex> = HashMap::new();
        let mut first_uncovered: Option<CodePoint> = None;

        for (i, sig) in signatures.iter().enumerate() {
            let low = bounds[i];
            let high = bounds[i + 1] - 1;
            if sig.iter().all(|&w| w == 0) {
                if first_uncovered.is_none() {
                    first_uncovered = first_scalar_in(low, high);
                }
                continue;
            }
            let class = *by_signature.entry(sig).or_insert_with(|| {
                representatives.push(low);
                representatives.len() - 1
            });
            intervals.push(ClassInterval { low, high, class });
        }

        let mut max_index = representatives.len();
        let other = match first_uncovered {
            Some(rep) if self.has_negative => {
                representatives.push(rep);
                max_index += 1;
                Some(max_index - 1)
            }
            _ => None,
        };
        let end = self.has_end.then(|| {
            max_index += 1;
            max_index - 1
        });

        CharSet {
            intervals,
            representatives,
            other,
            end,
            max_index,
        }
    }
}

/// First Unicode scalar value in `low..=high`, skipping surrogates.
fn first_scalar_in(low: CodePoint, high: CodePoint) -> Option<CodePoint> {
    let cp = if (SURROGATE_LOW..=SURROGATE_HIGH).contains(&low) {
        SURROGATE_HIGH + 1
    } else {
        low
    };
    (cp <= high).then_some(cp)
}

impl NodeVisitor for CharSetBuilder {
    type Output = ();

    fn visit_char(&mut self, _ast: &Ast, _id: NodeId, c: char) {
        let cp = c as CodePoint;
        self.distinguishers.push(SmallVec::from_elem((cp, cp), 1));
    }

    fn visit_range(&mut self, _ast: &Ast, _id: NodeId, _range: &RangeNode) {}

    fn visit_set(&mut self, _ast: &Ast, _id: NodeId, set: &SetNode) {
        if !set.is_positive() {
            self.has_negative = true;
        }
        if set.ranges().is_empty() {
            return;
        }
        self.distinguishers.push(
            set.ranges()
                .iter()
                .map(|&(low, high)| (low as CodePoint, high as CodePoint))
                .collect(),
        );
    }

    fn visit_concatenation(&mut self, _ast: &Ast, _id: NodeId, _left: NodeId, _right: NodeId) {}

    fn visit_alternation(&mut self, _ast: &Ast, _id: NodeId, _left: NodeId, _right: NodeId) {}

    fn visit_star(&mut self, _ast: &Ast, _id: NodeId, _operand: NodeId) {}

    fn visit_plus(&mut self, _ast: &Ast, _id: NodeId, _operand: NodeId) {}

    fn visit_ques(&mut self, _ast: &Ast, _id: NodeId, _operand: NodeId) {}

    fn visit_end_of_string(&mut self, _ast: &Ast, _id: NodeId, _operand: Option<NodeId>) {
        self.has_end = true;
    }
}
