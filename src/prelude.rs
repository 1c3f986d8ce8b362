// prelude.rs - Convenient re-exports for the idiomatic API.
//
//! # Prelude
//!
//! ```
//! use lwregex::prelude::*;
//!
//! let re = Regex::new(r"[a-z]+\d?").unwrap();
//! assert!(re.is_match("abc7"));
//! ```

pub use crate::api::{Match, Regex, RegexBuilder};
pub use crate::error::RegexError;
pub use crate::regint::{CompileConfig, SyntaxOptions};
