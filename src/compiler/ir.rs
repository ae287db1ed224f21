//! Intermediate Representation
//!
//! Compiler pass that lowers an abstract syntax tree (_AST_) into a flat list
//! of three-address instructions with labels and jumps.
//!
//! Every expression lowers to an instruction sequence followed by a _place_:
//! a variable name, a temporary of the form `t<N>`, or a literal rendered in
//! C++ syntax. Temporaries and labels are allocated from monotonically
//! increasing counters scoped to one run; each temporary is assigned exactly
//! once.

use std::collections::HashSet;
use std::fmt;

use crate::compiler::parser::ast::{
    BinaryOperator, Expression, Program, Statement, UnaryOperator,
};
use crate::error::{CompileError, Result};

/// Binary opcode of an _IR_ instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Returns the opcode mnemonic used in textual _IR_.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "ADD",
            BinaryOp::Sub => "SUB",
            BinaryOp::Mul => "MUL",
            BinaryOp::Div => "DIV",
            BinaryOp::Eq => "EQ",
            BinaryOp::Neq => "NEQ",
            BinaryOp::Lt => "LT",
            BinaryOp::Gt => "GT",
            BinaryOp::Le => "LE",
            BinaryOp::Ge => "GE",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    /// Returns the C++ spelling of the operator.
    pub fn cpp(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Returns `true` for the arithmetic opcodes.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    fn from_ast(op: BinaryOperator) -> BinaryOp {
        match op {
            BinaryOperator::Add => BinaryOp::Add,
            BinaryOperator::Subtract => BinaryOp::Sub,
            BinaryOperator::Multiply => BinaryOp::Mul,
            BinaryOperator::Divide => BinaryOp::Div,
            BinaryOperator::Eq => BinaryOp::Eq,
            BinaryOperator::NotEq => BinaryOp::Neq,
            BinaryOperator::OrdLess => BinaryOp::Lt,
            BinaryOperator::OrdGreater => BinaryOp::Gt,
            BinaryOperator::OrdLessEq => BinaryOp::Le,
            BinaryOperator::OrdGreaterEq => BinaryOp::Ge,
            BinaryOperator::LogAnd => BinaryOp::And,
            BinaryOperator::LogOr => BinaryOp::Or,
        }
    }
}

/// _IR_ instruction. Operands are strings: an identifier, a temporary of the
/// form `t<N>`, a literal rendered in C++ syntax, a C++ type name, or a label
/// name.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Request a `#include <header>` in the emitted preamble. Appears only
    /// before [`Instruction::MainBegin`].
    Include(String),
    /// Begin of the main body; appears exactly once.
    MainBegin,
    /// End of the main body; appears exactly once.
    MainEnd,
    /// Declare a variable.
    #[allow(missing_docs)]
    Declare { ty: &'static str, name: String },
    /// Declare and initialize a variable.
    #[allow(missing_docs)]
    DeclareInit {
        ty: &'static str,
        name: String,
        value: String,
    },
    /// Store a value into a named variable.
    #[allow(missing_docs)]
    Assign { name: String, value: String },
    /// Materialize a literal into a temporary.
    #[allow(missing_docs)]
    Load { dest: String, value: String },
    /// Perform a binary operation, storing the result in `dest`. Comparison
    /// and logical opcodes produce 0 or 1.
    #[allow(missing_docs)]
    Binary {
        op: BinaryOp,
        dest: String,
        lhs: String,
        rhs: String,
    },
    /// Arithmetic negation.
    #[allow(missing_docs)]
    Neg { dest: String, operand: String },
    /// Read a variable from stdin.
    #[allow(missing_docs)]
    Input { name: String },
    /// Write a value to stdout.
    #[allow(missing_docs)]
    Output { value: String },
    /// Associates a name with a location in the list.
    Label(String),
    /// Unconditional jump to a label.
    Jump(String),
    /// Jump to `target` if `cond` evaluates to zero.
    #[allow(missing_docs)]
    JumpIfFalse { cond: String, target: String },
    /// Emit `{`.
    ScopeBegin,
    /// Emit `}`.
    ScopeEnd,
    /// Emit a C++ `for (init; cond; post) {` header from pre-rendered source
    /// fragments.
    #[allow(missing_docs)]
    ForLoopStart {
        init: String,
        cond: String,
        post: String,
    },
    /// Close the corresponding `for`.
    ForLoopEnd,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Include(header) => write!(f, "{:<16}{header}", "INCLUDE"),
            Instruction::MainBegin => write!(f, "MAIN_BEGIN"),
            Instruction::MainEnd => write!(f, "MAIN_END"),
            Instruction::Declare { ty, name } => write!(f, "{:<16}{ty}, {name}", "DECLARE"),
            Instruction::DeclareInit { ty, name, value } => {
                write!(f, "{:<16}{ty}, {name}, {value}", "DECLARE_INIT")
            }
            Instruction::Assign { name, value } => write!(f, "{:<16}{name}, {value}", "ASSIGN"),
            Instruction::Load { dest, value } => write!(f, "{:<16}{dest}, {value}", "LOAD"),
            Instruction::Binary { op, dest, lhs, rhs } => {
                write!(f, "{:<16}{dest}, {lhs}, {rhs}", op.mnemonic())
            }
            Instruction::Neg { dest, operand } => write!(f, "{:<16}{dest}, {operand}", "NEG"),
            Instruction::Input { name } => write!(f, "{:<16}{name}", "INPUT"),
            Instruction::Output { value } => write!(f, "{:<16}{value}", "OUTPUT"),
            Instruction::Label(name) => write!(f, "{:<16}{name}", "LABEL"),
            Instruction::Jump(target) => write!(f, "{:<16}{target}", "JUMP"),
            Instruction::JumpIfFalse { cond, target } => {
                write!(f, "{:<16}{cond}, {target}", "JUMP_IF_FALSE")
            }
            Instruction::ScopeBegin => write!(f, "SCOPE_BEGIN"),
            Instruction::ScopeEnd => write!(f, "SCOPE_END"),
            Instruction::ForLoopStart { init, cond, post } => {
                write!(f, "{:<16}\"{init}\", \"{cond}\", \"{post}\"", "FOR_LOOP_START")
            }
            Instruction::ForLoopEnd => write!(f, "FOR_LOOP_END"),
        }
    }
}

/// Returns `true` if `name` has the reserved temporary form `t<N>`.
pub(crate) fn is_temp(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('t') && {
        let rest = chars.as_str();
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
    }
}

/// Renders a floating-point value as a C++ literal. Whole values keep one
/// fractional digit so the literal stays floating-point.
pub(crate) fn float_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Renders a string value as a quoted, escaped C++ literal.
pub(crate) fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders a character value as a quoted, escaped C++ literal.
pub(crate) fn char_literal(value: char) -> String {
    match value {
        '\\' => "'\\\\'".into(),
        '\'' => "'\\''".into(),
        '\n' => "'\\n'".into(),
        '\t' => "'\\t'".into(),
        '\r' => "'\\r'".into(),
        c => format!("'{c}'"),
    }
}

/// Helper for lowering nested _AST_ constructs into the flat instruction
/// list.
struct IrBuilder {
    instructions: Vec<Instruction>,
    tmp_count: usize,
    label_count: usize,
}

impl IrBuilder {
    /// Allocates and returns a fresh temporary name.
    fn new_tmp(&mut self) -> String {
        let name = format!("t{}", self.tmp_count);
        self.tmp_count += 1;
        name
    }

    /// Allocates and returns a fresh label name.
    fn new_label(&mut self) -> String {
        let name = format!("L{}", self.label_count);
        self.label_count += 1;
        name
    }

    fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    fn lower_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl {
                ty, ident, init, ..
            } => match init {
                Some(init) => {
                    let value = self.lower_expression(init);
                    self.push(Instruction::DeclareInit {
                        ty: ty.cpp_name(),
                        name: ident.clone(),
                        value,
                    });
                }
                None => self.push(Instruction::Declare {
                    ty: ty.cpp_name(),
                    name: ident.clone(),
                }),
            },
            Statement::Expr(expr) => {
                // Generate the side effects; the resulting place is unused.
                let _ = self.lower_expression(expr);
            }
            Statement::Input { ident, .. } => self.push(Instruction::Input {
                name: ident.clone(),
            }),
            Statement::Output { expr, .. } => {
                let value = self.lower_expression(expr);
                self.push(Instruction::Output { value });
            }
            Statement::If {
                cond,
                then,
                opt_else,
                ..
            } => {
                let cond = self.lower_expression(cond);
                let else_label = self.new_label();
                let end_label = self.new_label();

                self.push(Instruction::JumpIfFalse {
                    cond,
                    target: else_label.clone(),
                });
                self.lower_statement(then);
                self.push(Instruction::Jump(end_label.clone()));
                self.push(Instruction::Label(else_label));
                if let Some(else_stmt) = opt_else {
                    self.lower_statement(else_stmt);
                }
                self.push(Instruction::Label(end_label));
            }
            Statement::While { cond, body, .. } => {
                let top_label = self.new_label();
                let end_label = self.new_label();

                self.push(Instruction::Label(top_label.clone()));
                let cond = self.lower_expression(cond);
                self.push(Instruction::JumpIfFalse {
                    cond,
                    target: end_label.clone(),
                });
                self.lower_statement(body);
                self.push(Instruction::Jump(top_label));
                self.push(Instruction::Label(end_label));
            }
            Statement::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                // The loop header is delegated to the emitter as C++ source
                // fragments rendered from the actual clause nodes.
                self.push(Instruction::ForLoopStart {
                    init: render_for_init(init),
                    cond: render_expression(cond),
                    post: render_expression(post),
                });

                // The header already opens a brace; the body statements lower
                // without an extra scope wrapper.
                match &**body {
                    Statement::Block { stmts, .. } => {
                        for stmt in stmts {
                            self.lower_statement(stmt);
                        }
                    }
                    single => self.lower_statement(single),
                }

                self.push(Instruction::ForLoopEnd);
            }
            Statement::Block { stmts, .. } => {
                self.push(Instruction::ScopeBegin);
                for stmt in stmts {
                    self.lower_statement(stmt);
                }
                self.push(Instruction::ScopeEnd);
            }
            Statement::Empty => {}
        }
    }

    /// Lowers an expression, returning the place that denotes its result.
    fn lower_expression(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::IntConstant { value, .. } => self.load(value.to_string()),
            Expression::FloatConstant { value, .. } => self.load(float_literal(*value)),
            Expression::StringConstant { value, .. } => self.load(string_literal(value)),
            Expression::CharConstant { value, .. } => self.load(char_literal(*value)),
            Expression::Var { ident, .. } => ident.clone(),
            Expression::Unary { op, expr, .. } => {
                let operand = self.lower_expression(expr);
                let dest = self.new_tmp();

                match op {
                    UnaryOperator::Negate => self.push(Instruction::Neg {
                        dest: dest.clone(),
                        operand,
                    }),
                }

                dest
            }
            Expression::Binary { op, lhs, rhs, .. } => {
                let lhs = self.lower_expression(lhs);
                let rhs = self.lower_expression(rhs);
                let dest = self.new_tmp();

                self.push(Instruction::Binary {
                    op: BinaryOp::from_ast(*op),
                    dest: dest.clone(),
                    lhs,
                    rhs,
                });

                dest
            }
            Expression::Assignment { ident, value, .. } => {
                let value = self.lower_expression(value);

                self.push(Instruction::Assign {
                    name: ident.clone(),
                    value,
                });

                ident.clone()
            }
        }
    }

    /// Materializes a literal into a fresh temporary, returning it.
    fn load(&mut self, value: String) -> String {
        let dest = self.new_tmp();
        self.push(Instruction::Load {
            dest: dest.clone(),
            value,
        });
        dest
    }
}

/// Renders an expression as a C++ source fragment for a `for` header clause.
fn render_expression(expr: &Expression) -> String {
    match expr {
        Expression::IntConstant { value, .. } => value.to_string(),
        Expression::FloatConstant { value, .. } => float_literal(*value),
        Expression::StringConstant { value, .. } => string_literal(value),
        Expression::CharConstant { value, .. } => char_literal(*value),
        Expression::Var { ident, .. } => ident.clone(),
        Expression::Unary { op, expr, .. } => match op {
            UnaryOperator::Negate => format!("-{}", render_operand(expr)),
        },
        Expression::Binary { op, lhs, rhs, .. } => format!(
            "{} {} {}",
            render_operand(lhs),
            op.cpp(),
            render_operand(rhs)
        ),
        Expression::Assignment { ident, value, .. } => {
            format!("{ident} = {}", render_expression(value))
        }
    }
}

/// Renders a sub-expression, parenthesizing compound forms.
fn render_operand(expr: &Expression) -> String {
    match expr {
        Expression::Binary { .. } | Expression::Assignment { .. } => {
            format!("({})", render_expression(expr))
        }
        _ => render_expression(expr),
    }
}

/// Renders a `for` initializer clause (a declaration or an expression
/// statement) as a C++ source fragment.
fn render_for_init(stmt: &Statement) -> String {
    match stmt {
        Statement::VarDecl {
            ty, ident, init, ..
        } => match init {
            Some(init) => format!(
                "{} {ident} = {}",
                ty.cpp_name(),
                render_expression(init)
            ),
            None => format!("{} {ident}", ty.cpp_name()),
        },
        Statement::Expr(expr) => render_expression(expr),
        _ => unreachable!("parser restricts for initializers to declarations and expressions"),
    }
}

/// Checks the structural invariants of an instruction list: every temporary
/// operand is defined by an earlier instruction and assigned exactly once,
/// every jump targets an existing label, `MAIN_BEGIN`/`MAIN_END` bracket
/// the body exactly once, and includes appear only in the preamble.
///
/// The optimizer and the emitter are total over lists that pass. A failure
/// here is a bug in an earlier stage and aborts the run.
///
/// # Errors
///
/// Returns a [`CompileError::Internal`] naming the first violation.
pub fn verify(ir: &[Instruction]) -> Result<()> {
    let labels: HashSet<&str> = ir
        .iter()
        .filter_map(|inst| match inst {
            Instruction::Label(name) => Some(name.as_str()),
            _ => None,
        })
        .collect();

    let mut defined: HashSet<&str> = HashSet::new();
    let mut seen_main_begin = false;
    let mut seen_main_end = false;

    for inst in ir {
        if seen_main_end {
            return Err(CompileError::Internal(format!(
                "instruction after MAIN_END: {inst}"
            )));
        }

        match inst {
            Instruction::Include(_) => {
                if seen_main_begin {
                    return Err(CompileError::Internal(
                        "INCLUDE after MAIN_BEGIN".into(),
                    ));
                }
            }
            Instruction::MainBegin => {
                if seen_main_begin {
                    return Err(CompileError::Internal(
                        "MAIN_BEGIN appears more than once".into(),
                    ));
                }
                seen_main_begin = true;
            }
            Instruction::MainEnd => seen_main_end = true,
            _ => {
                if !seen_main_begin {
                    return Err(CompileError::Internal(format!(
                        "instruction before MAIN_BEGIN: {inst}"
                    )));
                }
            }
        }

        for operand in source_operands(inst) {
            if is_temp(operand) && !defined.contains(operand) {
                return Err(CompileError::Internal(format!(
                    "temporary '{operand}' used before definition"
                )));
            }
        }

        match inst {
            Instruction::Load { dest, .. }
            | Instruction::Binary { dest, .. }
            | Instruction::Neg { dest, .. } => {
                if is_temp(dest) && !defined.insert(dest.as_str()) {
                    return Err(CompileError::Internal(format!(
                        "temporary '{dest}' assigned more than once"
                    )));
                }
            }
            Instruction::Jump(target) | Instruction::JumpIfFalse { target, .. } => {
                if !labels.contains(target.as_str()) {
                    return Err(CompileError::Internal(format!(
                        "jump to undefined label '{target}'"
                    )));
                }
            }
            _ => {}
        }
    }

    if !seen_main_begin {
        return Err(CompileError::Internal("missing MAIN_BEGIN".into()));
    }
    if !seen_main_end {
        return Err(CompileError::Internal("missing MAIN_END".into()));
    }

    Ok(())
}

/// Returns the value operands an instruction reads (never its destination).
fn source_operands(inst: &Instruction) -> Vec<&str> {
    match inst {
        Instruction::DeclareInit { value, .. }
        | Instruction::Assign { value, .. }
        | Instruction::Output { value } => vec![value.as_str()],
        Instruction::Binary { lhs, rhs, .. } => vec![lhs.as_str(), rhs.as_str()],
        Instruction::Neg { operand, .. } => vec![operand.as_str()],
        Instruction::JumpIfFalse { cond, .. } => vec![cond.as_str()],
        _ => vec![],
    }
}

/// Generates the _IR_ instruction list for the provided program. Counters
/// are local to one run, so the pipeline stays deterministic over concurrent
/// inputs.
pub fn generate_ir(program: &Program) -> Vec<Instruction> {
    let mut builder = IrBuilder {
        instructions: vec![],
        tmp_count: 0,
        label_count: 0,
    };

    builder.push(Instruction::Include("iostream".into()));
    builder.push(Instruction::Include("string".into()));
    builder.push(Instruction::MainBegin);

    for stmt in &program.stmts {
        builder.lower_statement(stmt);
    }

    builder.push(Instruction::MainEnd);
    builder.instructions
}
