//! Compiler Optimization
//!
//! Three conservative passes run in order over the linear instruction list,
//! each producing a new list: constant folding, dead-code removal, and
//! control-flow simplification. None of them changes the observable
//! input/output behavior of a valid source program.

pub mod dce;
pub mod fold;
pub mod jumps;

use std::collections::HashSet;

use crate::compiler::ir::Instruction;

/// Runs the optimization passes, in order, over the provided instruction
/// list.
///
/// A later pass can expose further work for an earlier one (a dropped label
/// merges two straight-line regions), so the sequence repeats until the list
/// stops changing.
pub fn optimize(ir: Vec<Instruction>) -> Vec<Instruction> {
    let mut current = ir;

    loop {
        let next = fold::fold_constants(current.clone());
        let next = dce::remove_dead_code(next);
        let next = jumps::simplify_jumps(next);

        if next == current {
            return next;
        }
        current = next;
    }
}

/// Collects the set of label names referenced by a jump.
pub(crate) fn referenced_labels(ir: &[Instruction]) -> HashSet<String> {
    ir.iter()
        .filter_map(|inst| match inst {
            Instruction::Jump(target) | Instruction::JumpIfFalse { target, .. } => {
                Some(target.clone())
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{ir, lexer, parser};

    fn optimized(source: &str) -> Vec<Instruction> {
        let tokens = lexer::lex(source).expect("source should lex");
        let program = parser::parse_program(tokens).expect("source should parse");
        optimize(ir::generate_ir(&program))
    }

    #[test]
    fn optimize_is_idempotent() {
        let sources = [
            "benvis(\"Hello, World!\");",
            "sahih x = 2 + 3 * 4; benvis(x);",
            "sahih n = 3; vaghti (n > 0) { benvis(n); n = n - 1; }",
            "sahih a = 10; age (a > 5) { benvis(\"big\"); } vagarna { benvis(\"small\"); }",
            "sahih n; begir(n); baraye (sahih i = 1; i <= n; i = i + 1) { benvis(i); }",
        ];

        for source in sources {
            let once = optimized(source);
            let twice = optimize(once.clone());
            assert_eq!(once, twice, "optimization not idempotent for {source:?}");
        }
    }
}
