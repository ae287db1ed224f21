//! Semantic Analysis
//!
//! Compiler pass that checks the semantic correctness of an abstract syntax
//! tree (_AST_), building the flat symbol table. Findings are collected
//! across the whole program and reported as one batch.

use std::collections::HashMap;
use std::fmt;

use crate::compiler::lexer::Location;
use crate::compiler::parser::ast::{
    BinaryOperator, DeclType, Expression, Program, Statement, UnaryOperator,
};
use crate::error::{CompileError, Diagnostic, Result};

/// Declared state of a program variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Declared type tag.
    pub ty: DeclType,
    /// Whether the variable has been given a value (initializer, assignment,
    /// or input).
    pub initialized: bool,
}

/// Flat mapping of identifier to symbol state. The language has a single
/// scope; block statements do not introduce scopes.
pub type SymbolTable = HashMap<String, Symbol>;

/// Value category of a checked expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprType {
    Int,
    Float,
    Char,
    Str,
}

impl ExprType {
    fn is_numeric(self) -> bool {
        matches!(self, ExprType::Int | ExprType::Float)
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExprType::Int => "integer",
            ExprType::Float => "floating-point",
            ExprType::Char => "character",
            ExprType::Str => "string",
        };
        write!(f, "{name}")
    }
}

impl From<DeclType> for ExprType {
    fn from(ty: DeclType) -> Self {
        match ty {
            DeclType::Int => ExprType::Int,
            DeclType::Float => ExprType::Float,
            DeclType::Char => ExprType::Char,
        }
    }
}

/// Returns `true` if a value of type `value` may be stored in a variable
/// declared as `decl`. Integer values widen to floating-point declarations;
/// characters never mix with numeric declarations; strings have no declared
/// type at all.
fn compatible(decl: DeclType, value: ExprType) -> bool {
    matches!(
        (decl, value),
        (DeclType::Int, ExprType::Int)
            | (DeclType::Float, ExprType::Float | ExprType::Int)
            | (DeclType::Char, ExprType::Char)
    )
}

/// Analyzes the provided program, returning its symbol table on success.
///
/// # Errors
///
/// Returns a [`CompileError::Semantic`] batching every finding, in source
/// order.
pub fn analyze(program: &Program) -> Result<SymbolTable> {
    let mut analyzer = Analyzer {
        table: SymbolTable::new(),
        diags: vec![],
    };

    for stmt in &program.stmts {
        analyzer.check_statement(stmt);
    }

    if analyzer.diags.is_empty() {
        Ok(analyzer.table)
    } else {
        Err(CompileError::Semantic(analyzer.diags))
    }
}

struct Analyzer {
    table: SymbolTable,
    diags: Vec<Diagnostic>,
}

impl Analyzer {
    fn report(&mut self, loc: Location, message: impl Into<String>) {
        self.diags.push(Diagnostic {
            line: loc.line,
            col: loc.col,
            message: message.into(),
        });
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl {
                ty,
                ident,
                init,
                loc,
            } => {
                let init_ty = init.as_ref().and_then(|expr| self.check_expression(expr));

                if self.table.contains_key(ident) {
                    self.report(*loc, format!("redeclaration of '{ident}'"));
                    return;
                }

                if let Some(init_ty) = init_ty
                    && !compatible(*ty, init_ty)
                {
                    self.report(
                        *loc,
                        format!("cannot initialize '{ty}' variable '{ident}' with a {init_ty} value"),
                    );
                }

                self.table.insert(
                    ident.clone(),
                    Symbol {
                        ty: *ty,
                        initialized: init.is_some(),
                    },
                );
            }
            Statement::Expr(expr) => {
                let _ = self.check_expression(expr);
            }
            Statement::Input { ident, loc } => match self.table.get_mut(ident) {
                Some(symbol) => symbol.initialized = true,
                None => {
                    self.report(*loc, format!("use of undeclared variable '{ident}'"));
                }
            },
            Statement::Output { expr, .. } => {
                // String literals are permitted here and nowhere else.
                let _ = self.check_expression(expr);
            }
            Statement::If {
                cond,
                then,
                opt_else,
                ..
            } => {
                // Conditions accept any type; integers and characters are
                // implicitly boolean-valued.
                let _ = self.check_expression(cond);
                self.check_statement(then);
                if let Some(else_stmt) = opt_else {
                    self.check_statement(else_stmt);
                }
            }
            Statement::While { cond, body, .. } => {
                let _ = self.check_expression(cond);
                self.check_statement(body);
            }
            Statement::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                self.check_statement(init);
                let _ = self.check_expression(cond);
                let _ = self.check_expression(post);
                self.check_statement(body);
            }
            Statement::Block { stmts, .. } => {
                for stmt in stmts {
                    self.check_statement(stmt);
                }
            }
            Statement::Empty => {}
        }
    }

    /// Checks an expression, returning its type. `None` indicates the
    /// expression (or a sub-expression) was already diagnosed.
    fn check_expression(&mut self, expr: &Expression) -> Option<ExprType> {
        match expr {
            Expression::IntConstant { .. } => Some(ExprType::Int),
            Expression::FloatConstant { .. } => Some(ExprType::Float),
            Expression::StringConstant { .. } => Some(ExprType::Str),
            Expression::CharConstant { .. } => Some(ExprType::Char),
            Expression::Var { ident, loc } => match self.table.get(ident) {
                Some(symbol) => {
                    if !symbol.initialized {
                        self.report(*loc, format!("variable '{ident}' is used uninitialized"));
                        return None;
                    }
                    Some(symbol.ty.into())
                }
                None => {
                    self.report(*loc, format!("use of undeclared variable '{ident}'"));
                    None
                }
            },
            Expression::Unary { op, expr, loc } => {
                let ty = self.check_expression(expr)?;

                match op {
                    UnaryOperator::Negate => {
                        if !ty.is_numeric() {
                            self.report(
                                *loc,
                                format!("unary '-' requires a numeric operand, found {ty}"),
                            );
                            return None;
                        }
                        Some(ty)
                    }
                }
            }
            Expression::Binary { op, lhs, rhs, loc } => {
                let lhs_ty = self.check_expression(lhs);
                let rhs_ty = self.check_expression(rhs);
                let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);

                match op {
                    BinaryOperator::Add
                    | BinaryOperator::Subtract
                    | BinaryOperator::Multiply
                    | BinaryOperator::Divide => {
                        if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
                            self.report(
                                *loc,
                                format!("operator '{op}' requires numeric operands"),
                            );
                            return None;
                        }
                        if lhs_ty == ExprType::Float || rhs_ty == ExprType::Float {
                            Some(ExprType::Float)
                        } else {
                            Some(ExprType::Int)
                        }
                    }
                    BinaryOperator::OrdLess
                    | BinaryOperator::OrdLessEq
                    | BinaryOperator::OrdGreater
                    | BinaryOperator::OrdGreaterEq => {
                        if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
                            self.report(
                                *loc,
                                format!("operator '{op}' requires numeric operands"),
                            );
                            return None;
                        }
                        Some(ExprType::Int)
                    }
                    BinaryOperator::Eq | BinaryOperator::NotEq => {
                        let comparable = (lhs_ty.is_numeric() && rhs_ty.is_numeric())
                            || (lhs_ty == ExprType::Char && rhs_ty == ExprType::Char);

                        if !comparable {
                            self.report(
                                *loc,
                                format!("cannot compare {lhs_ty} and {rhs_ty} values"),
                            );
                            return None;
                        }
                        Some(ExprType::Int)
                    }
                    BinaryOperator::LogAnd | BinaryOperator::LogOr => {
                        if lhs_ty == ExprType::Str || rhs_ty == ExprType::Str {
                            self.report(
                                *loc,
                                format!("operator '{op}' cannot be applied to string values"),
                            );
                            return None;
                        }
                        Some(ExprType::Int)
                    }
                }
            }
            Expression::Assignment { ident, value, loc } => {
                let value_ty = self.check_expression(value);

                let decl_ty = match self.table.get_mut(ident) {
                    Some(symbol) => {
                        symbol.initialized = true;
                        symbol.ty
                    }
                    None => {
                        self.report(*loc, format!("use of undeclared variable '{ident}'"));
                        return None;
                    }
                };

                if let Some(value_ty) = value_ty
                    && !compatible(decl_ty, value_ty)
                {
                    self.report(
                        *loc,
                        format!("cannot assign a {value_ty} value to '{decl_ty}' variable '{ident}'"),
                    );
                    return None;
                }

                Some(decl_ty.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{lexer, parser};

    fn analyze_source(source: &str) -> Result<SymbolTable> {
        let tokens = lexer::lex(source).expect("source should lex");
        let program = parser::parse_program(tokens).expect("source should parse");
        analyze(&program)
    }

    fn diagnostics(source: &str) -> Vec<Diagnostic> {
        match analyze_source(source) {
            Err(CompileError::Semantic(diags)) => diags,
            other => panic!("expected a semantic error batch, got {other:?}"),
        }
    }

    #[test]
    fn sema_valid_declares_each_name_once() {
        let table =
            analyze_source("sahih x = 1; ashar y = 2.5; harf c = 'a';").expect("should analyze");

        assert_eq!(table.len(), 3);
        assert_eq!(
            table["x"],
            Symbol {
                ty: DeclType::Int,
                initialized: true
            }
        );
        assert_eq!(table["y"].ty, DeclType::Float);
        assert_eq!(table["c"].ty, DeclType::Char);
    }

    #[test]
    fn sema_valid_integer_widens_to_float() {
        assert!(analyze_source("ashar y = 2;").is_ok());
    }

    #[test]
    fn sema_valid_input_initializes() {
        assert!(analyze_source("sahih n; begir(n); benvis(n);").is_ok());
    }

    #[test]
    fn sema_valid_string_in_output() {
        assert!(analyze_source("benvis(\"hi\");").is_ok());
    }

    #[test]
    fn sema_valid_char_condition() {
        // Conditions are deliberately permissive.
        assert!(analyze_source("harf c = 'y'; age (c) benvis(c);").is_ok());
    }

    #[test]
    fn sema_invalid_error_batching() {
        let diags = diagnostics("benvis(x);\nsahih x = 1;\nsahih x = 2;");

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].line, 1);
        assert!(diags[0].message.contains("undeclared variable 'x'"));
        assert_eq!(diags[1].line, 3);
        assert!(diags[1].message.contains("redeclaration of 'x'"));
    }

    #[test]
    fn sema_invalid_use_before_initialization() {
        let diags = diagnostics("sahih x; benvis(x);");

        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("used uninitialized"));
    }

    #[test]
    fn sema_invalid_float_narrows_to_int() {
        let diags = diagnostics("sahih x = 2.5;");

        assert_eq!(diags.len(), 1);
        assert!(
            diags[0]
                .message
                .contains("cannot initialize 'sahih' variable 'x'")
        );
    }

    #[test]
    fn sema_invalid_char_in_arithmetic() {
        let diags = diagnostics("harf c = 'a'; sahih x = c + 1;");

        assert!(
            diags
                .iter()
                .any(|d| d.message.contains("requires numeric operands"))
        );
    }

    #[test]
    fn sema_invalid_string_assignment() {
        let diags = diagnostics("sahih x = 1; x = \"oops\";");

        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("cannot assign a string value"));
    }

    #[test]
    fn sema_invalid_ordered_comparison_of_chars() {
        let diags = diagnostics("harf a = 'a'; harf b = 'b'; sahih x = a < b;");

        assert!(
            diags
                .iter()
                .any(|d| d.message.contains("requires numeric operands"))
        );
    }

    #[test]
    fn sema_valid_char_equality() {
        assert!(analyze_source("harf a = 'a'; benvis(a == 'b');").is_ok());
    }

    #[test]
    fn sema_invalid_assignment_to_undeclared() {
        let diags = diagnostics("x = 1;");

        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("undeclared variable 'x'"));
    }

    #[test]
    fn sema_valid_for_declares_in_flat_scope() {
        // The loop variable lands in the single flat scope, so a second
        // declaration of the same name is an error.
        let diags = diagnostics(
            "baraye (sahih i = 0; i < 2; i = i + 1) benvis(i);\n\
             baraye (sahih i = 0; i < 2; i = i + 1) benvis(i);",
        );

        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("redeclaration of 'i'"));
    }
}
