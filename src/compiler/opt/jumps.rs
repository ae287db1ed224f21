//! Control-Flow Simplification
//!
//! Transforms the instruction list by removing labels nothing targets,
//! jumps that fall through anyway, and one-hop jump chains.

use crate::compiler::ir::Instruction;

use super::referenced_labels;

/// Simplifies the control flow of the instruction list.
pub fn simplify_jumps(ir: Vec<Instruction>) -> Vec<Instruction> {
    // Drop labels no jump targets.
    let referenced = referenced_labels(&ir);
    let mut out: Vec<Instruction> = ir
        .into_iter()
        .filter(|inst| match inst {
            Instruction::Label(name) => referenced.contains(name),
            _ => true,
        })
        .collect();

    // Drop a jump that lands on the immediately following label.
    let mut i = 0;
    while i < out.len() {
        let falls_through = match (&out[i], out.get(i + 1)) {
            (Instruction::Jump(target), Some(Instruction::Label(name))) => target == name,
            _ => false,
        };

        if falls_through {
            out.remove(i);
        } else {
            i += 1;
        }
    }

    // One-hop jump threading: a jump that lands on another jump is retargeted
    // to the final destination.
    for i in 0..out.len() {
        let Instruction::Jump(target) = &out[i] else {
            continue;
        };

        let Some(pos) = out
            .iter()
            .position(|inst| matches!(inst, Instruction::Label(name) if name == target))
        else {
            continue;
        };

        let hop = match out.get(pos + 1) {
            Some(Instruction::Jump(hop)) => Some(hop.clone()),
            _ => None,
        };

        if let Some(hop) = hop {
            out[i] = Instruction::Jump(hop);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str) -> Instruction {
        Instruction::Label(name.into())
    }

    fn jump(target: &str) -> Instruction {
        Instruction::Jump(target.into())
    }

    #[test]
    fn jumps_drop_unreferenced_label() {
        let ir = vec![
            Instruction::MainBegin,
            label("L0"),
            Instruction::Output { value: "1".into() },
            Instruction::MainEnd,
        ];

        let out = simplify_jumps(ir);
        assert!(!out.iter().any(|i| matches!(i, Instruction::Label(_))));
    }

    #[test]
    fn jumps_drop_jump_to_next_label() {
        let ir = vec![
            jump("L0"),
            label("L0"),
            Instruction::Output { value: "1".into() },
        ];

        let out = simplify_jumps(ir);
        assert!(!out.iter().any(|i| matches!(i, Instruction::Jump(_))));
        // The label was still referenced when label-dropping ran.
        assert!(out.contains(&label("L0")));
    }

    #[test]
    fn jumps_thread_one_hop() {
        let ir = vec![
            jump("L0"),
            Instruction::Output { value: "1".into() },
            label("L0"),
            jump("L2"),
            Instruction::Output { value: "2".into() },
            label("L2"),
            Instruction::Output { value: "3".into() },
        ];

        let out = simplify_jumps(ir);

        // The first jump now targets L2 directly.
        assert_eq!(out[0], jump("L2"));
        assert!(out.contains(&jump("L2")));
    }

    #[test]
    fn jumps_adjacent_jump_and_label_collapse() {
        let ir = vec![
            jump("L1"),
            label("L0"),
            label("L1"),
            Instruction::Output { value: "1".into() },
        ];

        // L0 is unreferenced and dropped first, which makes the jump land on
        // the immediately following label.
        let out = simplify_jumps(ir);
        assert_eq!(
            out,
            vec![label("L1"), Instruction::Output { value: "1".into() }]
        );
    }

    #[test]
    fn jumps_keep_loop_back_edge() {
        let ir = vec![
            label("L0"),
            Instruction::Binary {
                op: crate::compiler::ir::BinaryOp::Gt,
                dest: "t0".into(),
                lhs: "n".into(),
                rhs: "0".into(),
            },
            Instruction::JumpIfFalse {
                cond: "t0".into(),
                target: "L1".into(),
            },
            Instruction::Output { value: "n".into() },
            jump("L0"),
            label("L1"),
        ];

        let out = simplify_jumps(ir.clone());
        assert_eq!(out, ir);
    }
}
