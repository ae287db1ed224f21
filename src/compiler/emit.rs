//! Code Emission
//!
//! Compiler pass that reconstructs well-formed C++ source text from the
//! optimized instruction list.
//!
//! Emission runs in two passes: a scan that collects program variables and
//! temporaries with their inferred C++ types, then a translation of each
//! instruction under a running indentation level. The preamble and the
//! `main` wrapper are fixed; `INCLUDE` and `MAIN_BEGIN`/`MAIN_END` carry no
//! additional information.

use std::fmt::Write;

use crate::compiler::ir::{Instruction, is_temp};

/// Inferred C++ type of a declared name.
type CppType = &'static str;

/// Emits a standalone C++ translation unit from the instruction list.
///
/// The output is deterministic and compiles under a conforming C++11
/// compiler for any list that satisfies the _IR_ invariants.
pub fn emit_cpp(ir: &[Instruction]) -> String {
    let decls = scan_declarations(ir);

    let mut out = String::new();
    out.push_str("#include <iostream>\n#include <string>\n\nint main() {\n");

    for (name, ty) in &decls.vars {
        let _ = writeln!(out, "  {ty} {name};");
    }
    for (name, ty) in &decls.temps {
        let _ = writeln!(out, "  {ty} {name};");
    }
    if !decls.vars.is_empty() || !decls.temps.is_empty() {
        out.push('\n');
    }

    let mut level = 1usize;

    for inst in ir {
        match inst {
            // Replaced by the fixed preamble and wrapper.
            Instruction::Include(_)
            | Instruction::MainBegin
            | Instruction::MainEnd
            | Instruction::Declare { .. } => {}
            Instruction::DeclareInit { name, value, .. }
            | Instruction::Assign { name, value } => {
                let _ = writeln!(out, "{}{name} = {value};", indent(level));
            }
            Instruction::Load { dest, value } => {
                let _ = writeln!(out, "{}{dest} = {value};", indent(level));
            }
            Instruction::Binary { op, dest, lhs, rhs } => {
                let _ = writeln!(
                    out,
                    "{}{dest} = {lhs} {} {rhs};",
                    indent(level),
                    op.cpp()
                );
            }
            Instruction::Neg { dest, operand } => {
                let _ = writeln!(out, "{}{dest} = -{operand};", indent(level));
            }
            Instruction::Input { name } => {
                let _ = writeln!(out, "{}std::cin >> {name};", indent(level));
            }
            Instruction::Output { value } => {
                let _ = writeln!(out, "{}std::cout << {value} << std::endl;", indent(level));
            }
            // The null statement keeps a label valid immediately before a
            // closing brace under C++11.
            Instruction::Label(name) => {
                let _ = writeln!(out, "{}{name}:;", indent(level));
            }
            Instruction::Jump(target) => {
                let _ = writeln!(out, "{}goto {target};", indent(level));
            }
            Instruction::JumpIfFalse { cond, target } => {
                let _ = writeln!(out, "{}if (!({cond})) goto {target};", indent(level));
            }
            Instruction::ScopeBegin => {
                let _ = writeln!(out, "{}{{", indent(level));
                level += 1;
            }
            Instruction::ScopeEnd => {
                level = level.saturating_sub(1).max(1);
                let _ = writeln!(out, "{}}}", indent(level));
            }
            Instruction::ForLoopStart { init, cond, post } => {
                let _ = writeln!(out, "{}for ({init}; {cond}; {post}) {{", indent(level));
                level += 1;
            }
            Instruction::ForLoopEnd => {
                level = level.saturating_sub(1).max(1);
                let _ = writeln!(out, "{}}}", indent(level));
            }
        }
    }

    out.push_str("  return 0;\n}\n");
    out
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

/// Declarations collected by the scan pass, in first-appearance order.
#[derive(Debug, Default)]
struct Declarations {
    /// Program variables, typed from their declaration instruction.
    vars: Vec<(String, CppType)>,
    /// Temporaries, typed from the instruction that defines them.
    temps: Vec<(String, CppType)>,
}

impl Declarations {
    fn record_var(&mut self, name: &str, ty: CppType) {
        if !self.vars.iter().any(|(n, _)| n == name) {
            self.vars.push((name.to_string(), ty));
        }
    }

    fn record_temp(&mut self, name: &str, ty: CppType) {
        if !self.temps.iter().any(|(n, _)| n == name) {
            self.temps.push((name.to_string(), ty));
        }
    }

    /// Returns the recorded type of a variable or temporary.
    fn type_of(&self, name: &str) -> Option<CppType> {
        self.vars
            .iter()
            .chain(self.temps.iter())
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }

    /// Returns `true` if the operand has floating-point type: a `.`-literal,
    /// or a name recorded as `double`.
    fn is_double(&self, operand: &str) -> bool {
        if operand.starts_with('"') || operand.starts_with('\'') {
            return false;
        }
        if operand
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            return self.type_of(operand) == Some("double");
        }
        operand.contains('.')
    }
}

/// Collects every program variable and temporary with its C++ type.
///
/// Temporaries take their type from the defining instruction: the literal
/// shape for `LOAD`, operand types for arithmetic and negation, and `int`
/// for comparisons and logical operations. Each temporary is defined once,
/// so the first record wins.
fn scan_declarations(ir: &[Instruction]) -> Declarations {
    let mut decls = Declarations::default();

    for inst in ir {
        match inst {
            Instruction::Declare { ty, name } | Instruction::DeclareInit { ty, name, .. } => {
                decls.record_var(name, *ty);
            }
            // An input target normally carries a declaration; default the
            // type when it does not.
            Instruction::Input { name } => decls.record_var(name, "int"),
            Instruction::Load { dest, value } if is_temp(dest) => {
                let ty = if value.starts_with('"') {
                    "std::string"
                } else if value.starts_with('\'') {
                    "char"
                } else if value.contains('.') {
                    "double"
                } else {
                    "int"
                };
                decls.record_temp(dest, ty);
            }
            Instruction::Binary { op, dest, lhs, rhs } if is_temp(dest) => {
                let ty = if op.is_arithmetic() && (decls.is_double(lhs) || decls.is_double(rhs))
                {
                    "double"
                } else {
                    "int"
                };
                decls.record_temp(dest, ty);
            }
            Instruction::Neg { dest, operand } if is_temp(dest) => {
                let ty = if decls.is_double(operand) { "double" } else { "int" };
                decls.record_temp(dest, ty);
            }
            _ => {}
        }
    }

    decls
}
