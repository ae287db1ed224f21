//! Dead-Code Removal
//!
//! Transforms the instruction list by dropping instructions that can never
//! execute and values that are never consumed.

use std::collections::HashSet;

use crate::compiler::ir::{Instruction, is_temp};

use super::referenced_labels;

/// Removes dead code from the instruction list.
///
/// Unreachable instructions sit between an unconditional jump and the next
/// label some jump still targets. Dead values are declarations of names no
/// other instruction mentions, and temporaries no instruction consumes;
/// removing one can orphan another, so the sweep repeats to a fixpoint.
pub fn remove_dead_code(ir: Vec<Instruction>) -> Vec<Instruction> {
    let referenced = referenced_labels(&ir);

    let mut reachable = true;
    let mut out = Vec::with_capacity(ir.len());

    for inst in ir {
        match &inst {
            Instruction::Label(name) => {
                if referenced.contains(name) {
                    reachable = true;
                }
                out.push(inst);
            }
            // Structural markers are kept regardless of reachability; braces
            // and the main brackets must stay balanced.
            Instruction::Include(_)
            | Instruction::MainBegin
            | Instruction::MainEnd
            | Instruction::ScopeBegin
            | Instruction::ScopeEnd
            | Instruction::ForLoopStart { .. }
            | Instruction::ForLoopEnd => out.push(inst),
            _ => {
                if reachable {
                    let ends_flow = matches!(inst, Instruction::Jump(_));
                    out.push(inst);
                    if ends_flow {
                        reachable = false;
                    }
                }
            }
        }
    }

    loop {
        let used = used_names(&out);
        let before = out.len();

        out.retain(|inst| match inst {
            Instruction::Declare { name, .. } => used.contains(name.as_str()),
            Instruction::Load { dest, .. }
            | Instruction::Binary { dest, .. }
            | Instruction::Neg { dest, .. } => !is_temp(dest) || used.contains(dest.as_str()),
            _ => true,
        });

        if out.len() == before {
            break;
        }
    }

    out
}

/// Collects every name an instruction mentions, other than a declaration of
/// that name itself. `FOR_LOOP_START` fragments are scanned for identifier
/// runs.
fn used_names(ir: &[Instruction]) -> HashSet<String> {
    let mut used = HashSet::new();

    let mut add = |operand: &str| {
        if operand
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            used.insert(operand.to_string());
        }
    };

    for inst in ir {
        match inst {
            Instruction::DeclareInit { value, .. } => add(value),
            Instruction::Assign { name, value } => {
                add(name);
                add(value);
            }
            Instruction::Binary { lhs, rhs, .. } => {
                add(lhs);
                add(rhs);
            }
            Instruction::Neg { operand, .. } => add(operand),
            Instruction::Input { name } => add(name),
            Instruction::Output { value } => add(value),
            Instruction::JumpIfFalse { cond, .. } => add(cond),
            Instruction::ForLoopStart { init, cond, post } => {
                for fragment in [init, cond, post] {
                    for ident in identifier_runs(fragment) {
                        add(&ident);
                    }
                }
            }
            _ => {}
        }
    }

    used
}

/// Splits a C++ source fragment into its identifier-shaped runs.
fn identifier_runs(fragment: &str) -> Vec<String> {
    let mut runs = vec![];
    let mut current = String::new();

    for c in fragment.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs.retain(|run| {
        run.chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    });
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::opt::fold;
    use crate::compiler::{ir, lexer, parser};

    fn cleaned(source: &str) -> Vec<Instruction> {
        let tokens = lexer::lex(source).expect("source should lex");
        let program = parser::parse_program(tokens).expect("source should parse");
        remove_dead_code(fold::fold_constants(ir::generate_ir(&program)))
    }

    #[test]
    fn dce_drops_untouched_declaration() {
        let ir = cleaned("sahih unused; sahih x = 1; benvis(x);");

        assert!(
            !ir.iter()
                .any(|i| matches!(i, Instruction::Declare { name, .. } if name == "unused"))
        );
    }

    #[test]
    fn dce_keeps_declaration_of_input_target() {
        let ir = cleaned("sahih n; begir(n);");

        assert!(
            ir.iter()
                .any(|i| matches!(i, Instruction::Declare { name, .. } if name == "n"))
        );
    }

    #[test]
    fn dce_keeps_declaration_used_in_for_header() {
        let ir = cleaned("sahih n; begir(n); baraye (sahih i = 1; i <= n; i = i + 1) benvis(i);");

        assert!(
            ir.iter()
                .any(|i| matches!(i, Instruction::Declare { name, .. } if name == "n"))
        );
    }

    #[test]
    fn dce_drops_folded_away_temporaries() {
        // After folding, only the final LOAD feeds the declaration.
        let ir = cleaned("sahih x = 2 + 3 * 4; benvis(x);");

        let loads: Vec<_> = ir
            .iter()
            .filter_map(|i| match i {
                Instruction::Load { dest, value } => Some((dest.clone(), value.clone())),
                _ => None,
            })
            .collect();

        assert_eq!(loads, vec![("t4".into(), "14".into())]);
    }

    #[test]
    fn dce_keeps_assignment_to_write_only_variable() {
        // `x` is never read, but its declaration and store survive: the
        // store still names it.
        let ir = cleaned("sahih x; x = 5;");

        assert!(
            ir.iter()
                .any(|i| matches!(i, Instruction::Declare { name, .. } if name == "x"))
        );
        assert!(
            ir.iter()
                .any(|i| matches!(i, Instruction::Assign { name, .. } if name == "x"))
        );
    }

    #[test]
    fn identifier_runs_skip_numbers() {
        assert_eq!(
            identifier_runs("int i2 = n0 + 17"),
            vec!["int".to_string(), "i2".into(), "n0".into()]
        );
    }
}
