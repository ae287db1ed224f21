//! Multi-stage pipeline for compiling _AkbarLang_ source text into C++
//! source text.
//!
//! The pipeline is a strict left-to-right composition of six stages, each a
//! pure function from one data shape to the next: lexer, parser, semantic
//! analyzer, _IR_ generator, optimizer, and emitter. Stages share no mutable
//! state; a run is fully deterministic.

pub mod emit;
pub mod ir;
pub mod lexer;
pub mod opt;
pub mod parser;

use crate::error::Result;

/// Compiles _AkbarLang_ source text into a C++ translation unit.
///
/// # Errors
///
/// Returns the first lexical or syntax error, or the batch of semantic
/// findings. An instruction list that fails [`ir::verify`] aborts the run
/// with an internal error; it indicates a bug in an earlier stage.
pub fn compile(source: &str) -> Result<String> {
    let tokens = lexer::lex(source)?;
    tracing::debug!(tokens = tokens.len(), "lexical analysis complete");

    let program = parser::parse_program(tokens)?;
    tracing::debug!(statements = program.stmts.len(), "parsing complete");

    let table = parser::sema::analyze(&program)?;
    tracing::debug!(symbols = table.len(), "semantic analysis complete");

    let instructions = ir::generate_ir(&program);
    ir::verify(&instructions)?;
    tracing::debug!(instructions = instructions.len(), "lowering complete");

    let instructions = opt::optimize(instructions);
    ir::verify(&instructions)?;
    tracing::debug!(instructions = instructions.len(), "optimization complete");

    Ok(emit::emit_cpp(&instructions))
}
