//! # lwregex
//!
//! Regular expression compiler producing a minimal deterministic automaton.
//!
//! A pattern is parsed into an arena AST, the alphabet is split into
//! character classes, a Thompson NFA is built over those classes, subset
//! construction turns it into a DFA and partition refinement minimizes it.
//! The result is a [`CharSet`](regclass::CharSet) plus a transition table
//! ([`Dtran`](regdfa::Dtran)) that can be walked without backtracking.
//!
//! ## Quick Start
//!
//! ```rust
//! use lwregex::prelude::*;
//!
//! let re = Regex::new(r"(a|b)*abb").unwrap();
//! assert!(re.is_match("babaabb"));
//! assert!(!re.is_match("abab"));
//! assert_eq!(re.dtran().len(), 4);
//! ```
//!
//! For fine-grained control, use [`RegexBuilder`](api::RegexBuilder):
//!
//! ```rust
//! use lwregex::prelude::*;
//!
//! let re = Regex::builder(r"[0-9]+ \. [0-9]*  # decimal")
//!     .extended(true)
//!     .dfa_state_limit(256)
//!     .build()
//!     .unwrap();
//! assert!(re.is_match("3.14"));
//! ```
//!
//! ## Pipeline API
//!
//! Each stage is also callable on its own:
//!
//! ```rust
//! use lwregex::regclass::CharSet;
//! use lwregex::regdfa::determinize;
//! use lwregex::regint::{DEFAULT_DFA_STATE_LIMIT, DEFAULT_NFA_STATE_LIMIT};
//! use lwregex::regmin::minimize;
//! use lwregex::regnfa::build_nfa;
//! use lwregex::regparse::parse;
//!
//! let ast = parse("a|b").unwrap();
//! let charset = CharSet::from_ast(&ast);
//! let root = ast.root().unwrap();
//! let nfa = build_nfa(&ast, root, &charset, DEFAULT_NFA_STATE_LIMIT).unwrap();
//! let dtran = determinize(&nfa, &charset, DEFAULT_DFA_STATE_LIMIT).unwrap();
//! assert_eq!(dtran.len(), 3);
//! assert_eq!(minimize(&dtran).len(), 2);
//! ```
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`regparse`] | Pattern parser |
//! | [`regast`] | AST node arena and visitor |
//! | [`regclass`] | Character class partition |
//! | [`regnfa`] | Thompson NFA construction |
//! | [`regdfa`] | Epsilon closure, move, subset construction |
//! | [`regmin`] | DFA minimization |
//! | [`regcomp`] | Compilation pipeline |
//! | [`regexec`] | DFA executor |
//! | [`regint`] | Shared types, options and limits |
//! | [`error`] | Error type |

// Enable #[coverage(off)] attribute when running under cargo-llvm-cov on nightly.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod error;
pub mod prelude;
pub mod regast;
pub mod regclass;
pub mod regcomp;
pub mod regdfa;
pub mod regexec;
pub mod regint;
pub mod regmin;
pub mod regnfa;
pub mod regparse;
