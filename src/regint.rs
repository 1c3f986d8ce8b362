// regint.rs - Internal types, limits and syntax flags shared by the pipeline.

use bitflags::bitflags;

// === Basic Types ===
pub type CodePoint = u32;

/// Index of a character class produced by the partition builder.
pub type ClassIndex = usize;

/// Dense index of an NFA state.
pub type StateId = usize;

/// Dense index of an AST node inside its container.
pub type NodeId = usize;

// === Code Point Space ===
pub const CODE_POINT_MAX: CodePoint = char::MAX as CodePoint;

// === Config Constants ===
// Group nesting plus stacked quantifiers and anchors. Kept low enough for the
// recursive parser to stay within a 2 MiB thread stack.
pub const DEFAULT_PARSE_DEPTH_LIMIT: u32 = 128;
// Depth of the tree the NFA builder walks. A parsed pattern nests at most
// three levels (alternation, concatenation, quantifier) per parse level.
pub const DEFAULT_NEST_LIMIT: usize = 512;
pub const DEFAULT_NFA_STATE_LIMIT: usize = 100_000;
pub const DEFAULT_DFA_STATE_LIMIT: usize = 10_000;

bitflags! {
    /// Pattern syntax flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SyntaxOptions: u32 {
        /// Whitespace and `#` comments outside classes are ignored.
        const EXTENDED = 1 << 0;
        /// Every character of the pattern is a literal.
        const LITERAL = 1 << 1;
    }
}

/// Resource caps and switches for one compilation.
///
/// Each call to [`crate::regcomp::compile_with`] reads its own config; there is
/// no process-wide state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileConfig {
    pub options: SyntaxOptions,
    pub parse_depth_limit: u32,
    pub nest_limit: usize,
    pub nfa_state_limit: usize,
    pub dfa_state_limit: usize,
    pub minimize: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            options: SyntaxOptions::empty(),
            parse_depth_limit: DEFAULT_PARSE_DEPTH_LIMIT,
            nest_limit: DEFAULT_NEST_LIMIT,
            nfa_state_limit: DEFAULT_NFA_STATE_LIMIT,
            dfa_state_limit: DEFAULT_DFA_STATE_LIMIT,
            minimize: true,
        }
    }
}
