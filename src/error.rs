// error.rs - Error type for pattern compilation.
//
// One variant per failure class of the pipeline: parsing, AST validation,
// automaton construction and resource limits.

use std::fmt;

use crate::regint::{ClassIndex, NodeId, StateId};

/// Error type for regex compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// Syntax error in the pattern. `offset` is a byte offset into the pattern.
    Syntax { offset: usize, message: String },
    /// Group nesting exceeded the configured parse depth.
    ParseDepthLimitOver,
    /// The AST violates a structural invariant.
    InvalidAst { node: NodeId, message: String },
    /// The AST nests deeper than the configured limit.
    NestLimitOver { limit: usize },
    /// The automaton has no accepting state reachable from its start.
    NoAcceptingState,
    /// An NFA edge carries a class index outside `[0, max_index)` (bug).
    ClassOutOfRange { class: ClassIndex, max_index: usize },
    /// An NFA state id points past the end of the automaton (bug).
    StateOutOfRange { state: StateId, len: usize },
    /// NFA construction exceeded the configured state limit.
    NfaTooLarge { limit: usize },
    /// Subset construction exceeded the configured state limit.
    DfaTooLarge { limit: usize },
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexError::Syntax { offset, message } => {
                write!(f, "syntax error at offset {}: {}", offset, message)
            }
            RegexError::ParseDepthLimitOver => write!(f, "parse depth limit over"),
            RegexError::InvalidAst { node, message } => {
                write!(f, "invalid AST node {}: {}", node, message)
            }
            RegexError::NestLimitOver { limit } => {
                write!(f, "nest limit over ({} levels)", limit)
            }
            RegexError::NoAcceptingState => write!(f, "automaton has no accepting state"),
            RegexError::ClassOutOfRange { class, max_index } => write!(
                f,
                "internal error: class index {} out of range (max {})",
                class, max_index
            ),
            RegexError::StateOutOfRange { state, len } => write!(
                f,
                "internal error: NFA state {} out of range ({} states)",
                state, len
            ),
            RegexError::NfaTooLarge { limit } => {
                write!(f, "NFA state limit over ({} states)", limit)
            }
            RegexError::DfaTooLarge { limit } => {
                write!(f, "DFA state limit over ({} states)", limit)
            }
        }
    }
}

impl std::error::Error for RegexError {}

impl RegexError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        RegexError::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_ast(node: NodeId, message: impl Into<String>) -> Self {
        RegexError::InvalidAst {
            node,
            message: message.into(),
        }
    }

    /// True for errors caused by the pattern text itself.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            RegexError::Syntax { .. } | RegexError::ParseDepthLimitOver
        )
    }

    /// True for errors that indicate a defect inside the crate.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            RegexError::ClassOutOfRange { .. } | RegexError::StateOutOfRange { .. }
        )
    }
}
