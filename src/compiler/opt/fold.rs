//! Constant Folding
//!
//! Transforms the instruction list by evaluating arithmetic, comparison and
//! negation instructions whose operands are compile-time constants.

use std::collections::HashMap;

use crate::compiler::ir::{self, BinaryOp, Instruction};

/// Compile-time value tracked for a temporary or variable name.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Const {
    Int(i64),
    Float(f64),
}

impl Const {
    /// Renders the value as a C++ literal.
    fn render(self) -> String {
        match self {
            Const::Int(v) => v.to_string(),
            Const::Float(v) => ir::float_literal(v),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Const::Int(v) => v as f64,
            Const::Float(v) => v,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Const::Int(v) => v == 0,
            Const::Float(v) => v == 0.0,
        }
    }
}

/// Folds constant expressions, replacing each foldable instruction with a
/// `LOAD` of the precomputed result.
///
/// The known-value map is cleared at every label and at the boundaries of a
/// `for` region: knowledge must not flow into or out of code that can run
/// more than once, or be reached from elsewhere.
pub fn fold_constants(ir: Vec<Instruction>) -> Vec<Instruction> {
    let mut known: HashMap<String, Const> = HashMap::new();
    let mut out = Vec::with_capacity(ir.len());

    for inst in ir {
        match inst {
            Instruction::Load { dest, value } => {
                match parse_literal(&value) {
                    Some(c) => known.insert(dest.clone(), c),
                    None => known.remove(&dest),
                };
                out.push(Instruction::Load { dest, value });
            }
            Instruction::Binary { op, dest, lhs, rhs } => {
                let folded = match (
                    operand_value(&lhs, &known),
                    operand_value(&rhs, &known),
                ) {
                    (Some(a), Some(b)) => eval_binary(op, a, b),
                    _ => None,
                };

                match folded {
                    Some(c) => {
                        known.insert(dest.clone(), c);
                        out.push(Instruction::Load {
                            dest,
                            value: c.render(),
                        });
                    }
                    None => {
                        known.remove(&dest);
                        out.push(Instruction::Binary { op, dest, lhs, rhs });
                    }
                }
            }
            Instruction::Neg { dest, operand } => match operand_value(&operand, &known) {
                Some(c) => {
                    let c = eval_neg(c);
                    known.insert(dest.clone(), c);
                    out.push(Instruction::Load {
                        dest,
                        value: c.render(),
                    });
                }
                None => {
                    known.remove(&dest);
                    out.push(Instruction::Neg { dest, operand });
                }
            },
            Instruction::Assign { name, value } => {
                match operand_value(&value, &known) {
                    Some(c) => known.insert(name.clone(), c),
                    None => known.remove(&name),
                };
                out.push(Instruction::Assign { name, value });
            }
            Instruction::DeclareInit { ty, name, value } => {
                match operand_value(&value, &known) {
                    Some(c) => known.insert(name.clone(), c),
                    None => known.remove(&name),
                };
                out.push(Instruction::DeclareInit { ty, name, value });
            }
            Instruction::Input { name } => {
                known.remove(&name);
                out.push(Instruction::Input { name });
            }
            Instruction::Label(_)
            | Instruction::ForLoopStart { .. }
            | Instruction::ForLoopEnd => {
                known.clear();
                out.push(inst);
            }
            other => out.push(other),
        }
    }

    out
}

/// Returns the compile-time value of an operand: a numeric literal, or a
/// name present in the known-value map.
fn operand_value(operand: &str, known: &HashMap<String, Const>) -> Option<Const> {
    if operand
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    {
        return known.get(operand).copied();
    }
    parse_literal(operand)
}

/// Parses a rendered numeric literal. String and character literals are
/// never folded.
fn parse_literal(text: &str) -> Option<Const> {
    if text.starts_with('"') || text.starts_with('\'') {
        return None;
    }
    if let Ok(v) = text.parse::<i64>() {
        return Some(Const::Int(v));
    }
    text.parse::<f64>().ok().map(Const::Float)
}

/// Evaluates a binary opcode over two constants, or `None` when the
/// instruction must be left alone: logical opcodes, division by a known
/// zero, and evaluations that leave the finite range.
fn eval_binary(op: BinaryOp, lhs: Const, rhs: Const) -> Option<Const> {
    // Logical AND/OR are not folded.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        return None;
    }

    if op == BinaryOp::Div && rhs.is_zero() {
        return None;
    }

    if let (Const::Int(a), Const::Int(b)) = (lhs, rhs) {
        let value = match op {
            BinaryOp::Add => Const::Int(a.wrapping_add(b)),
            BinaryOp::Sub => Const::Int(a.wrapping_sub(b)),
            BinaryOp::Mul => Const::Int(a.wrapping_mul(b)),
            BinaryOp::Div => Const::Int(a.wrapping_div(b)),
            BinaryOp::Eq => Const::Int(i64::from(a == b)),
            BinaryOp::Neq => Const::Int(i64::from(a != b)),
            BinaryOp::Lt => Const::Int(i64::from(a < b)),
            BinaryOp::Gt => Const::Int(i64::from(a > b)),
            BinaryOp::Le => Const::Int(i64::from(a <= b)),
            BinaryOp::Ge => Const::Int(i64::from(a >= b)),
            BinaryOp::And | BinaryOp::Or => unreachable!("logical opcodes are not folded"),
        };
        return Some(value);
    }

    let (a, b) = (lhs.as_f64(), rhs.as_f64());
    let value = match op {
        BinaryOp::Add => Const::Float(a + b),
        BinaryOp::Sub => Const::Float(a - b),
        BinaryOp::Mul => Const::Float(a * b),
        BinaryOp::Div => Const::Float(a / b),
        BinaryOp::Eq => Const::Int(i64::from(a == b)),
        BinaryOp::Neq => Const::Int(i64::from(a != b)),
        BinaryOp::Lt => Const::Int(i64::from(a < b)),
        BinaryOp::Gt => Const::Int(i64::from(a > b)),
        BinaryOp::Le => Const::Int(i64::from(a <= b)),
        BinaryOp::Ge => Const::Int(i64::from(a >= b)),
        BinaryOp::And | BinaryOp::Or => unreachable!("logical opcodes are not folded"),
    };

    if let Const::Float(v) = value
        && !v.is_finite()
    {
        return None;
    }

    Some(value)
}

/// Evaluates arithmetic negation over a constant.
fn eval_neg(operand: Const) -> Const {
    match operand {
        Const::Int(v) => Const::Int(v.wrapping_neg()),
        Const::Float(v) => Const::Float(-v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{ir, lexer, parser};

    fn folded(source: &str) -> Vec<Instruction> {
        let tokens = lexer::lex(source).expect("source should lex");
        let program = parser::parse_program(tokens).expect("source should parse");
        fold_constants(ir::generate_ir(&program))
    }

    fn loads(ir: &[Instruction]) -> Vec<(&str, &str)> {
        ir.iter()
            .filter_map(|i| match i {
                Instruction::Load { dest, value } => Some((dest.as_str(), value.as_str())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fold_arithmetic_chain() {
        // 2 + 3 * 4 collapses to 14.
        let ir = folded("sahih x = 2 + 3 * 4;");

        assert!(loads(&ir).contains(&("t4", "14")));
        assert!(!ir.iter().any(|i| matches!(i, Instruction::Binary { .. })));
    }

    #[test]
    fn fold_through_declared_variable() {
        // The initializer value propagates into the comparison.
        let ir = folded("sahih a = 10; sahih b = a > 5;");

        assert!(loads(&ir).iter().any(|(_, v)| *v == "1"));
    }

    #[test]
    fn fold_comparison_false_is_zero() {
        let ir = folded("sahih x = 3 < 2;");
        assert!(loads(&ir).iter().any(|(_, v)| *v == "0"));
    }

    #[test]
    fn fold_negation() {
        let ir = folded("sahih x = -(2 + 3);");
        assert!(loads(&ir).iter().any(|(_, v)| *v == "-5"));
    }

    #[test]
    fn fold_float_arithmetic() {
        let ir = folded("ashar x = 1.5 + 2.5;");
        assert!(loads(&ir).iter().any(|(_, v)| *v == "4.0"));
    }

    #[test]
    fn fold_mixed_arithmetic_widen() {
        let ir = folded("ashar x = 1 + 0.5;");
        assert!(loads(&ir).iter().any(|(_, v)| *v == "1.5"));
    }

    #[test]
    fn fold_skips_division_by_zero() {
        let ir = folded("sahih x = 1 / 0;");
        assert!(
            ir.iter().any(|i| matches!(
                i,
                Instruction::Binary {
                    op: BinaryOp::Div,
                    ..
                }
            ))
        );
    }

    #[test]
    fn fold_skips_logical_operators() {
        let ir = folded("sahih x = 1 va 0;");
        assert!(
            ir.iter().any(|i| matches!(
                i,
                Instruction::Binary {
                    op: BinaryOp::And,
                    ..
                }
            ))
        );
    }

    #[test]
    fn fold_knowledge_cleared_at_labels() {
        // `n` is reassigned inside the loop; the comparison and the
        // subtraction must stay runtime operations.
        let ir = folded("sahih n = 3; vaghti (n > 0) { benvis(n); n = n - 1; }");

        let binary_ops: Vec<_> = ir
            .iter()
            .filter_map(|i| match i {
                Instruction::Binary { op, .. } => Some(*op),
                _ => None,
            })
            .collect();

        assert!(binary_ops.contains(&BinaryOp::Gt));
        assert!(binary_ops.contains(&BinaryOp::Sub));
    }

    #[test]
    fn fold_knowledge_cleared_at_for_region() {
        // `f` starts known, but the loop body multiplies it; the multiply
        // must not fold against the pre-loop value.
        let ir = folded(
            "sahih f = 1; baraye (sahih i = 1; i <= 3; i = i + 1) { f = f * i; } benvis(f);",
        );

        assert!(
            ir.iter().any(|i| matches!(
                i,
                Instruction::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            ))
        );
    }

    #[test]
    fn fold_input_invalidates_knowledge() {
        let ir = folded("sahih n = 1; begir(n); sahih x = n + 1;");

        assert!(
            ir.iter().any(|i| matches!(
                i,
                Instruction::Binary {
                    op: BinaryOp::Add,
                    ..
                }
            ))
        );
    }
}
