// regcomp.rs - Compilation pipeline.
//
// parse -> validate -> partition -> NFA -> (AST dropped) -> subset
// construction -> minimization. Every stage is a pure function of its
// inputs; errors propagate unchanged and no partial result is returned.

use log::debug;

use crate::error::RegexError;
use crate::regast::Ast;
use crate::regclass::CharSet;
use crate::regdfa::{determinize, Dtran};
use crate::regint::CompileConfig;
use crate::regmin::minimize;
use crate::regnfa::NfaBuilder;
use crate::regparse::parse_with;

/// Compile `pattern` with default settings.
pub fn compile(pattern: &str) -> Result<(CharSet, Dtran), RegexError> {
    compile_with(pattern, &CompileConfig::default())
}

/// Compile `pattern` under `config`.
pub fn compile_with(pattern: &str, config: &CompileConfig) -> Result<(CharSet, Dtran), RegexError> {
    let ast = parse_with(pattern, config)?;
    debug!("parsed {:?}: {} AST nodes", pattern, ast.len());
    compile_ast(ast, config)
}

/// Compile an already built AST. The AST is consumed and released as soon as
/// the NFA exists.
pub fn compile_ast(ast: Ast, config: &CompileConfig) -> Result<(CharSet, Dtran), RegexError> {
    ast.validate()?;
    let root = ast
        .root()
        .ok_or_else(|| RegexError::invalid_ast(0, "empty AST"))?;

    let charset = CharSet::from_ast(&ast);
    debug!("character partition: {} classes", charset.max_index());

    let nfa = NfaBuilder::new(&charset, config.nfa_state_limit)
        .nest_limit(config.nest_limit)
        .invoke(&ast, root)?;
    drop(ast);
    debug!(
        "NFA: {} states, start {}, final {}",
        nfa.len(),
        nfa.start(),
        nfa.final_state()
    );

    let dtran = determinize(&nfa, &charset, config.dfa_state_limit)?;
    drop(nfa);

    let dtran = if config.minimize {
        minimize(&dtran)
    } else {
        dtran
    };
    Ok((charset, dtran))
}
