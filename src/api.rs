// api.rs - Idiomatic Rust API for lwregex.
//
// Wraps the pipeline (compile_with, is_match, longest_prefix) with
// Rust-native types: Regex, RegexBuilder, Match.

use std::fmt;
use std::ops::Range;

use crate::error::RegexError;
use crate::regclass::CharSet;
use crate::regcomp::compile_with;
use crate::regdfa::Dtran;
use crate::regexec;
use crate::regint::{CompileConfig, SyntaxOptions};

/// A pattern compiled to a minimal DFA.
///
/// Matching is anchored at the start of the text.
///
/// # Examples
///
/// ```
/// use lwregex::api::Regex;
///
/// let re = Regex::new(r"\d+-\d+").unwrap();
/// assert!(re.is_match("2026-10"));
///
/// let m = re.prefix_match("12-34 rest").unwrap();
/// assert_eq!(m.as_str(), "12-34");
/// assert_eq!(m.end(), 5);
/// ```
#[derive(Clone)]
pub struct Regex {
    pattern: String,
    charset: CharSet,
    dtran: Dtran,
}

impl Regex {
    /// Compile a pattern using default settings.
    pub fn new(pattern: &str) -> Result<Regex, RegexError> {
        RegexBuilder::new(pattern).build()
    }

    /// Create a [`RegexBuilder`] for fine-grained control over compilation.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether the whole of `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        regexec::is_match(&self.charset, &self.dtran, text)
    }

    /// Byte length of the longest prefix of `text` that matches.
    pub fn longest_prefix(&self, text: &str) -> Option<usize> {
        regexec::longest_prefix(&self.charset, &self.dtran, text)
    }

    /// The longest matching prefix of `text`, or `None`.
    pub fn prefix_match<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        let end = self.longest_prefix(text)?;
        Some(Match {
            text,
            start: 0,
            end,
        })
    }

    /// The character partition used to label transitions.
    pub fn charset(&self) -> &CharSet {
        &self.charset
    }

    /// The DFA transition table.
    pub fn dtran(&self) -> &Dtran {
        &self.dtran
    }

    /// Take the compiled artifact apart.
    pub fn into_parts(self) -> (CharSet, Dtran) {
        (self.charset, self.dtran)
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &self.pattern)
            .field("classes", &self.charset.max_index())
            .field("states", &self.dtran.len())
            .finish()
    }
}

impl std::str::FromStr for Regex {
    type Err = RegexError;

    fn from_str(pattern: &str) -> Result<Regex, RegexError> {
        Regex::new(pattern)
    }
}

// === RegexBuilder ===

/// Builder for compiling a [`Regex`] with custom options and limits.
///
/// # Examples
///
/// ```
/// use lwregex::api::Regex;
///
/// let re = Regex::builder("a b c  # spaced out")
///     .extended(true)
///     .build()
///     .unwrap();
/// assert!(re.is_match("abc"));
/// ```
pub struct RegexBuilder {
    pattern: String,
    config: CompileConfig,
}

impl RegexBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> Self {
        RegexBuilder {
            pattern: pattern.to_string(),
            config: CompileConfig::default(),
        }
    }

    /// Enable or disable extended mode (whitespace and `#` comments ignored).
    pub fn extended(mut self, yes: bool) -> Self {
        self.config.options.set(SyntaxOptions::EXTENDED, yes);
        self
    }

    /// Enable or disable literal mode (no metacharacters).
    pub fn literal(mut self, yes: bool) -> Self {
        self.config.options.set(SyntaxOptions::LITERAL, yes);
        self
    }

    /// Set raw syntax flags, replacing any set before.
    pub fn options(mut self, options: SyntaxOptions) -> Self {
        self.config.options = options;
        self
    }

    /// Maximum nesting of groups, stacked quantifiers and `$` anchors.
    pub fn parse_depth_limit(mut self, depth: u32) -> Self {
        self.config.parse_depth_limit = depth;
        self
    }

    /// Maximum depth of the syntax tree lowered into the NFA.
    pub fn nest_limit(mut self, limit: usize) -> Self {
        self.config.nest_limit = limit;
        self
    }

    /// Maximum number of NFA states.
    pub fn nfa_state_limit(mut self, limit: usize) -> Self {
        self.config.nfa_state_limit = limit;
        self
    }

    /// Maximum number of DFA states produced by subset construction.
    pub fn dfa_state_limit(mut self, limit: usize) -> Self {
        self.config.dfa_state_limit = limit;
        self
    }

    /// Enable or disable DFA minimization (enabled by default).
    pub fn minimize(mut self, yes: bool) -> Self {
        self.config.minimize = yes;
        self
    }

    /// Compile the pattern into a [`Regex`].
    pub fn build(self) -> Result<Regex, RegexError> {
        let (charset, dtran) = compile_with(&self.pattern, &self.config)?;
        Ok(Regex {
            pattern: self.pattern,
            charset,
            dtran,
        })
    }
}

// === Match ===

/// A single match result referencing the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    /// Byte offset of the start of the match.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the end of the match (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Byte range of the match.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched text.
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }

    /// Returns the length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the match is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
