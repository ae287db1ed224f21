//! Abstract Syntax Tree
//!
//! Compiler pass that parses a stream of tokens into an abstract syntax tree
//! (_AST_) by recursive descent. Operator precedence and associativity are
//! encoded by the climbing order of the grammar rules.

use std::fmt;

use crate::compiler::lexer::{Keyword, Location, OperatorKind, Token, TokenType};
use crate::error::{CompileError, Result};

/// Declared type of an _AkbarLang_ variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclType {
    /// `sahih` - integer.
    Int,
    /// `ashar` - floating-point.
    Float,
    /// `harf` - character.
    Char,
}

impl DeclType {
    /// Returns the C++ type name the declaration lowers to.
    pub fn cpp_name(self) -> &'static str {
        match self {
            DeclType::Int => "int",
            DeclType::Float => "double",
            DeclType::Char => "char",
        }
    }
}

impl fmt::Display for DeclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclType::Int => "sahih",
            DeclType::Float => "ashar",
            DeclType::Char => "harf",
        };
        write!(f, "{name}")
    }
}

/// Abstract syntax tree of a whole program: one implicit main body.
#[derive(Debug, PartialEq)]
pub struct Program {
    /// Ordered top-level statements.
    pub stmts: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program")?;
        for stmt in &self.stmts {
            stmt.fmt_with_indent(f, 1)?;
        }
        Ok(())
    }
}

/// _AST_ statement.
#[derive(Debug, PartialEq)]
pub enum Statement {
    /// Variable declaration with an optional initializer.
    VarDecl {
        /// Declared type tag.
        ty: DeclType,
        /// Declared identifier.
        ident: String,
        /// Optional initializer expression.
        init: Option<Expression>,
        /// Position of the declared identifier.
        loc: Location,
    },
    /// Expression evaluated for its effect.
    Expr(Expression),
    /// `begir` - read a variable from stdin.
    Input {
        /// Target identifier.
        ident: String,
        /// Position of the target identifier.
        loc: Location,
    },
    /// `benvis` - write an expression to stdout.
    Output {
        /// Expression to print.
        expr: Expression,
        /// Position of the `benvis` keyword.
        loc: Location,
    },
    /// `age` statement with an optional else branch.
    If {
        /// Controlling expression.
        cond: Expression,
        /// Executes when `cond` is truthy.
        then: Box<Statement>,
        /// Optional `vali`/`vagarna` branch.
        opt_else: Option<Box<Statement>>,
        /// Position of the `age` keyword.
        loc: Location,
    },
    /// `vaghti` - conditional loop.
    While {
        /// Controlling expression.
        cond: Expression,
        /// Loop body.
        body: Box<Statement>,
        /// Position of the `vaghti` keyword.
        loc: Location,
    },
    /// `baraye` - counted loop.
    For {
        /// Initializer clause: a declaration or an expression statement.
        init: Box<Statement>,
        /// Controlling expression.
        cond: Expression,
        /// Increment expression.
        post: Expression,
        /// Loop body.
        body: Box<Statement>,
        /// Position of the `baraye` keyword.
        loc: Location,
    },
    /// Brace-delimited statement list. Does not introduce a scope.
    Block {
        /// Ordered statements.
        stmts: Vec<Statement>,
        /// Position of the opening brace.
        loc: Location,
    },
    /// Statement without an expression (`;`).
    Empty,
}

impl Statement {
    fn fmt_with_indent(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);

        match self {
            Statement::VarDecl {
                ty, ident, init, ..
            } => match init {
                Some(expr) => writeln!(f, "{pad}Decl: {ty} {ident:?} = {expr}"),
                None => writeln!(f, "{pad}Decl: {ty} {ident:?}"),
            },
            Statement::Expr(expr) => writeln!(f, "{pad}Expr: {expr}"),
            Statement::Input { ident, .. } => writeln!(f, "{pad}Input {ident:?}"),
            Statement::Output { expr, .. } => writeln!(f, "{pad}Output {expr}"),
            Statement::If {
                cond,
                then,
                opt_else,
                ..
            } => {
                writeln!(f, "{pad}If ({cond})")?;
                writeln!(f, "{pad}Then:")?;
                then.fmt_with_indent(f, indent + 1)?;

                if let Some(else_stmt) = opt_else {
                    writeln!(f, "{pad}Else:")?;
                    else_stmt.fmt_with_indent(f, indent + 1)?;
                }

                Ok(())
            }
            Statement::While { cond, body, .. } => {
                writeln!(f, "{pad}While ({cond})")?;
                body.fmt_with_indent(f, indent + 1)
            }
            Statement::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                writeln!(f, "{pad}For (")?;
                init.fmt_with_indent(f, indent + 1)?;
                writeln!(f, "{}Cond: {cond}", "  ".repeat(indent + 1))?;
                writeln!(f, "{}Post: {post}", "  ".repeat(indent + 1))?;
                writeln!(f, "{pad})")?;
                body.fmt_with_indent(f, indent + 1)
            }
            Statement::Block { stmts, .. } => {
                writeln!(f, "{pad}Block: {{")?;
                for stmt in stmts {
                    stmt.fmt_with_indent(f, indent + 1)?;
                }
                writeln!(f, "{pad}}}")
            }
            Statement::Empty => writeln!(f, "{pad}Empty \";\""),
        }
    }
}

/// _AST_ expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Integer constant.
    #[allow(missing_docs)]
    IntConstant { value: i64, loc: Location },
    /// Floating-point constant.
    #[allow(missing_docs)]
    FloatConstant { value: f64, loc: Location },
    /// String constant. Valid only directly inside an output statement.
    #[allow(missing_docs)]
    StringConstant { value: String, loc: Location },
    /// Character constant.
    #[allow(missing_docs)]
    CharConstant { value: char, loc: Location },
    /// Variable reference.
    #[allow(missing_docs)]
    Var { ident: String, loc: Location },
    /// Unary operator applied to an expression.
    #[allow(missing_docs)]
    Unary {
        op: UnaryOperator,
        expr: Box<Expression>,
        loc: Location,
    },
    /// Binary operator applied to two expressions.
    #[allow(missing_docs)]
    Binary {
        op: BinaryOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
        loc: Location,
    },
    /// Assigns a value to a named variable.
    #[allow(missing_docs)]
    Assignment {
        ident: String,
        value: Box<Expression>,
        loc: Location,
    },
}

impl Expression {
    /// Returns the originating source position of the expression.
    pub fn loc(&self) -> Location {
        match self {
            Expression::IntConstant { loc, .. }
            | Expression::FloatConstant { loc, .. }
            | Expression::StringConstant { loc, .. }
            | Expression::CharConstant { loc, .. }
            | Expression::Var { loc, .. }
            | Expression::Unary { loc, .. }
            | Expression::Binary { loc, .. }
            | Expression::Assignment { loc, .. } => *loc,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::IntConstant { value, .. } => write!(f, "Int({value})"),
            Expression::FloatConstant { value, .. } => write!(f, "Float({value})"),
            Expression::StringConstant { value, .. } => write!(f, "Str({value:?})"),
            Expression::CharConstant { value, .. } => write!(f, "Char({value:?})"),
            Expression::Var { ident, .. } => write!(f, "Var({ident:?})"),
            Expression::Unary { op, expr, .. } => write!(f, "{op}{expr}"),
            Expression::Binary { op, lhs, rhs, .. } => write!(f, "{lhs} {op} {rhs}"),
            Expression::Assignment { ident, value, .. } => write!(f, "{ident:?} = {value}"),
        }
    }
}

/// _AST_ unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-` - arithmetic negation.
    Negate,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

/// _AST_ binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Eq,
    NotEq,
    OrdLess,
    OrdLessEq,
    OrdGreater,
    OrdGreaterEq,
    LogAnd,
    LogOr,
}

impl BinaryOperator {
    /// Returns the C++ spelling of the operator.
    pub fn cpp(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::OrdLess => "<",
            BinaryOperator::OrdLessEq => "<=",
            BinaryOperator::OrdGreater => ">",
            BinaryOperator::OrdGreaterEq => ">=",
            BinaryOperator::LogAnd => "&&",
            BinaryOperator::LogOr => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cpp())
    }
}

type TokenIter = std::iter::Peekable<std::vec::IntoIter<Token>>;

/// Parses a [`Program`] from the provided token sequence.
///
/// # Errors
///
/// Returns a [`CompileError::Syntax`] on the first token that does not match
/// the grammar, naming what was expected.
pub fn parse_program(tokens: Vec<Token>) -> Result<Program> {
    let mut iter = tokens.into_iter().peekable();
    let mut stmts = vec![];

    while !matches!(peek(&mut iter).ty, TokenType::Eof) {
        stmts.push(parse_statement(&mut iter)?);
    }

    Ok(Program { stmts })
}

/// Parses an _AST_ statement from the provided token iterator.
fn parse_statement(iter: &mut TokenIter) -> Result<Statement> {
    match &peek(iter).ty {
        TokenType::Keyword(Keyword::Sahih | Keyword::Ashar | Keyword::Harf) => {
            parse_var_decl(iter)
        }
        TokenType::Keyword(Keyword::Begir) => {
            // Consume the "begir" token.
            let _ = iter.next();

            expect_token(iter, TokenType::LParen)?;
            let (ident, loc) = parse_ident(iter)?;
            expect_token(iter, TokenType::RParen)?;
            expect_token(iter, TokenType::Semicolon)?;

            Ok(Statement::Input { ident, loc })
        }
        TokenType::Keyword(Keyword::Benvis) => {
            let loc = next_token(iter).loc;

            expect_token(iter, TokenType::LParen)?;
            let expr = parse_expression(iter)?;
            expect_token(iter, TokenType::RParen)?;
            expect_token(iter, TokenType::Semicolon)?;

            Ok(Statement::Output { expr, loc })
        }
        TokenType::Keyword(Keyword::Age) => parse_if(iter),
        TokenType::Keyword(Keyword::Vaghti) => {
            let loc = next_token(iter).loc;

            expect_token(iter, TokenType::LParen)?;
            let cond = parse_expression(iter)?;
            expect_token(iter, TokenType::RParen)?;

            let body = parse_statement(iter)?;

            Ok(Statement::While {
                cond,
                body: Box::new(body),
                loc,
            })
        }
        TokenType::Keyword(Keyword::Baraye) => parse_for(iter),
        TokenType::LBrace => {
            let loc = next_token(iter).loc;
            let mut stmts = vec![];

            while !matches!(peek(iter).ty, TokenType::RBrace | TokenType::Eof) {
                stmts.push(parse_statement(iter)?);
            }

            expect_token(iter, TokenType::RBrace)?;

            Ok(Statement::Block { stmts, loc })
        }
        TokenType::Semicolon => {
            // Consume the ";" token.
            let _ = iter.next();
            Ok(Statement::Empty)
        }
        _ => {
            let expr = parse_expression(iter)?;
            expect_token(iter, TokenType::Semicolon)?;
            Ok(Statement::Expr(expr))
        }
    }
}

/// Parses an _AST_ variable declaration, including the trailing `;`.
fn parse_var_decl(iter: &mut TokenIter) -> Result<Statement> {
    let token = next_token(iter);
    let ty = match token.ty {
        TokenType::Keyword(Keyword::Sahih) => DeclType::Int,
        TokenType::Keyword(Keyword::Ashar) => DeclType::Float,
        TokenType::Keyword(Keyword::Harf) => DeclType::Char,
        _ => unreachable!("caller dispatches on a declaration keyword"),
    };

    let (ident, loc) = parse_ident(iter)?;

    let mut init = None;
    if peek(iter).ty == TokenType::Operator(OperatorKind::Assign) {
        // Consume the "=" token.
        let _ = iter.next();
        init = Some(parse_expression(iter)?);
    }

    expect_token(iter, TokenType::Semicolon)?;

    Ok(Statement::VarDecl {
        ty,
        ident,
        init,
        loc,
    })
}

/// Parses an `age` statement. The alternative branch is introduced
/// explicitly by `vali` (chainable with a following `age`) or `vagarna`, so
/// a dangling alternative binds to the nearest preceding `age`.
fn parse_if(iter: &mut TokenIter) -> Result<Statement> {
    // Consume the "age" token.
    let loc = next_token(iter).loc;

    expect_token(iter, TokenType::LParen)?;
    let cond = parse_expression(iter)?;
    expect_token(iter, TokenType::RParen)?;

    let then = parse_statement(iter)?;

    let mut opt_else = None;
    match peek(iter).ty {
        TokenType::Keyword(Keyword::Vali | Keyword::Vagarna) => {
            // Consume the "vali"/"vagarna" token. After "vali", a following
            // "age" re-enters this function and forms the else-if chain.
            let _ = iter.next();
            opt_else = Some(Box::new(parse_statement(iter)?));
        }
        _ => {}
    }

    Ok(Statement::If {
        cond,
        then: Box::new(then),
        opt_else,
        loc,
    })
}

/// Parses a `baraye` statement. The reserved `ta` keyword is tolerated and
/// discarded between header clauses.
fn parse_for(iter: &mut TokenIter) -> Result<Statement> {
    // Consume the "baraye" token.
    let loc = next_token(iter).loc;

    expect_token(iter, TokenType::LParen)?;
    skip_ta(iter);

    let init = match peek(iter).ty {
        TokenType::Keyword(Keyword::Sahih | Keyword::Ashar | Keyword::Harf) => {
            parse_var_decl(iter)?
        }
        _ => {
            let expr = parse_expression(iter)?;
            expect_token(iter, TokenType::Semicolon)?;
            Statement::Expr(expr)
        }
    };
    skip_ta(iter);

    let cond = parse_expression(iter)?;
    expect_token(iter, TokenType::Semicolon)?;
    skip_ta(iter);

    let post = parse_expression(iter)?;
    skip_ta(iter);

    expect_token(iter, TokenType::RParen)?;

    let body = parse_statement(iter)?;

    Ok(Statement::For {
        init: Box::new(init),
        cond,
        post,
        body: Box::new(body),
        loc,
    })
}

/// Parses an _AST_ expression. Assignment is recognized by parsing the
/// higher-precedence levels first and converting a variable reference
/// followed by `=` into an assignment, keeping lookahead to one token.
fn parse_expression(iter: &mut TokenIter) -> Result<Expression> {
    let expr = parse_logical(iter)?;

    if peek(iter).ty == TokenType::Operator(OperatorKind::Assign) {
        // Consume the "=" token.
        let op_loc = next_token(iter).loc;

        return match expr {
            Expression::Var { ident, loc } => {
                // Right-recursion makes assignment right-associative.
                let value = parse_expression(iter)?;
                Ok(Expression::Assignment {
                    ident,
                    value: Box::new(value),
                    loc,
                })
            }
            _ => Err(CompileError::syntax(
                op_loc.line,
                op_loc.col,
                "invalid assignment target",
            )),
        };
    }

    Ok(expr)
}

/// `logical := equality ( ('va'|'ya') equality )*`
fn parse_logical(iter: &mut TokenIter) -> Result<Expression> {
    let mut lhs = parse_equality(iter)?;

    loop {
        let op = match peek(iter).ty {
            TokenType::Keyword(Keyword::Va) => BinaryOperator::LogAnd,
            TokenType::Keyword(Keyword::Ya) => BinaryOperator::LogOr,
            _ => break,
        };
        let loc = next_token(iter).loc;

        let rhs = parse_equality(iter)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            loc,
        };
    }

    Ok(lhs)
}

/// `equality := comparison ( ('=='|'!=') comparison )*`
fn parse_equality(iter: &mut TokenIter) -> Result<Expression> {
    let mut lhs = parse_comparison(iter)?;

    loop {
        let op = match peek(iter).ty {
            TokenType::Operator(OperatorKind::Eq) => BinaryOperator::Eq,
            TokenType::Operator(OperatorKind::NotEq) => BinaryOperator::NotEq,
            _ => break,
        };
        let loc = next_token(iter).loc;

        let rhs = parse_comparison(iter)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            loc,
        };
    }

    Ok(lhs)
}

/// `comparison := term ( ('<'|'>'|'<='|'>=') term )*`
fn parse_comparison(iter: &mut TokenIter) -> Result<Expression> {
    let mut lhs = parse_term(iter)?;

    loop {
        let op = match peek(iter).ty {
            TokenType::Operator(OperatorKind::LessThan) => BinaryOperator::OrdLess,
            TokenType::Operator(OperatorKind::GreaterThan) => BinaryOperator::OrdGreater,
            TokenType::Operator(OperatorKind::LessThanEq) => BinaryOperator::OrdLessEq,
            TokenType::Operator(OperatorKind::GreaterThanEq) => BinaryOperator::OrdGreaterEq,
            _ => break,
        };
        let loc = next_token(iter).loc;

        let rhs = parse_term(iter)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            loc,
        };
    }

    Ok(lhs)
}

/// `term := factor ( ('+'|'-') factor )*`
fn parse_term(iter: &mut TokenIter) -> Result<Expression> {
    let mut lhs = parse_factor(iter)?;

    loop {
        let op = match peek(iter).ty {
            TokenType::Operator(OperatorKind::Plus) => BinaryOperator::Add,
            TokenType::Operator(OperatorKind::Minus) => BinaryOperator::Subtract,
            _ => break,
        };
        let loc = next_token(iter).loc;

        let rhs = parse_factor(iter)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            loc,
        };
    }

    Ok(lhs)
}

/// `factor := unary ( ('*'|'/') unary )*`
fn parse_factor(iter: &mut TokenIter) -> Result<Expression> {
    let mut lhs = parse_unary(iter)?;

    loop {
        let op = match peek(iter).ty {
            TokenType::Operator(OperatorKind::Asterisk) => BinaryOperator::Multiply,
            TokenType::Operator(OperatorKind::Division) => BinaryOperator::Divide,
            _ => break,
        };
        let loc = next_token(iter).loc;

        let rhs = parse_unary(iter)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            loc,
        };
    }

    Ok(lhs)
}

/// `unary := '-' unary | primary`
fn parse_unary(iter: &mut TokenIter) -> Result<Expression> {
    if peek(iter).ty == TokenType::Operator(OperatorKind::Minus) {
        let loc = next_token(iter).loc;

        let expr = parse_unary(iter)?;
        return Ok(Expression::Unary {
            op: UnaryOperator::Negate,
            expr: Box::new(expr),
            loc,
        });
    }

    parse_primary(iter)
}

/// `primary := INT | FLOAT | STRING | CHAR | IDENT | '(' expression ')'`
fn parse_primary(iter: &mut TokenIter) -> Result<Expression> {
    let token = next_token(iter);
    let loc = token.loc;

    match token.ty {
        TokenType::IntConstant(value) => Ok(Expression::IntConstant { value, loc }),
        TokenType::FloatConstant(value) => Ok(Expression::FloatConstant { value, loc }),
        TokenType::StringLiteral(value) => Ok(Expression::StringConstant { value, loc }),
        TokenType::CharLiteral(value) => Ok(Expression::CharConstant { value, loc }),
        TokenType::Ident(ident) => Ok(Expression::Var { ident, loc }),
        TokenType::LParen => {
            let inner = parse_expression(iter)?;
            expect_token(iter, TokenType::RParen)?;
            Ok(inner)
        }
        ty => Err(CompileError::syntax(
            loc.line,
            loc.col,
            format!("expected expression, but found {ty}"),
        )),
    }
}

/// Parses an identifier, returning its name and position.
fn parse_ident(iter: &mut TokenIter) -> Result<(String, Location)> {
    let token = next_token(iter);

    match token.ty {
        TokenType::Ident(ident) => Ok((ident, token.loc)),
        ty => Err(CompileError::syntax(
            token.loc.line,
            token.loc.col,
            format!("expected identifier, but found {ty}"),
        )),
    }
}

/// Discards any `ta` tokens at the cursor (tolerated inside `for` headers).
fn skip_ta(iter: &mut TokenIter) {
    while peek(iter).ty == TokenType::Keyword(Keyword::Ta) {
        let _ = iter.next();
    }
}

/// Advances the token iterator if it matches the expected token type.
fn expect_token(iter: &mut TokenIter, expected: TokenType) -> Result<Token> {
    let found = peek(iter);

    if found.ty == expected {
        Ok(next_token(iter))
    } else {
        Err(CompileError::syntax(
            found.loc.line,
            found.loc.col,
            format!("expected {expected}, but found {}", found.ty),
        ))
    }
}

/// Returns a reference to the next token without consuming it.
///
/// The lexer terminates every sequence with `Eof`, which no rule consumes, so
/// a token is always present.
fn peek(iter: &mut TokenIter) -> &Token {
    iter.peek().expect("token stream should end with Eof")
}

/// Returns the next token in sequence.
fn next_token(iter: &mut TokenIter) -> Token {
    iter.next().expect("token stream should end with Eof")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer;

    fn parse(source: &str) -> Program {
        parse_program(lexer::lex(source).expect("source should lex"))
            .expect("source should parse")
    }

    fn parse_err(source: &str) -> CompileError {
        parse_program(lexer::lex(source).expect("source should lex")).unwrap_err()
    }

    #[test]
    fn parser_valid_precedence_term_over_factor() {
        // 2 + 3 * 4 parses as 2 + (3 * 4).
        let program = parse("sahih x = 2 + 3 * 4;");

        let Statement::VarDecl {
            init: Some(Expression::Binary { op, rhs, .. }),
            ..
        } = &program.stmts[0]
        else {
            panic!("expected a declaration with a binary initializer");
        };

        assert_eq!(*op, BinaryOperator::Add);
        assert!(matches!(
            **rhs,
            Expression::Binary {
                op: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn parser_valid_left_associative_subtraction() {
        // 10 - 4 - 3 parses as (10 - 4) - 3.
        let program = parse("sahih x = 10 - 4 - 3;");

        let Statement::VarDecl {
            init: Some(Expression::Binary { op, lhs, .. }),
            ..
        } = &program.stmts[0]
        else {
            panic!("expected a declaration with a binary initializer");
        };

        assert_eq!(*op, BinaryOperator::Subtract);
        assert!(matches!(
            **lhs,
            Expression::Binary {
                op: BinaryOperator::Subtract,
                ..
            }
        ));
    }

    #[test]
    fn parser_valid_parenthesized_grouping() {
        // (2 + 3) * 4 keeps the addition on the left of the multiply.
        let program = parse("sahih x = (2 + 3) * 4;");

        let Statement::VarDecl {
            init: Some(Expression::Binary { op, lhs, .. }),
            ..
        } = &program.stmts[0]
        else {
            panic!("expected a declaration with a binary initializer");
        };

        assert_eq!(*op, BinaryOperator::Multiply);
        assert!(matches!(
            **lhs,
            Expression::Binary {
                op: BinaryOperator::Add,
                ..
            }
        ));
    }

    #[test]
    fn parser_valid_logical_binds_loosest() {
        // a > 1 va b < 2 parses as (a > 1) va (b < 2).
        let program = parse("x = a > 1 va b < 2;");

        let Statement::Expr(Expression::Assignment { value, .. }) = &program.stmts[0] else {
            panic!("expected an assignment statement");
        };
        assert!(matches!(
            **value,
            Expression::Binary {
                op: BinaryOperator::LogAnd,
                ..
            }
        ));
    }

    #[test]
    fn parser_valid_assignment_right_associative() {
        let program = parse("x = y = 2;");

        let Statement::Expr(Expression::Assignment { ident, value, .. }) = &program.stmts[0]
        else {
            panic!("expected an assignment statement");
        };

        assert_eq!(ident, "x");
        assert!(matches!(**value, Expression::Assignment { .. }));
    }

    #[test]
    fn parser_valid_else_if_chain() {
        let program = parse("age (a) x = 1; vali age (b) x = 2; vali x = 3;");

        let Statement::If { opt_else, .. } = &program.stmts[0] else {
            panic!("expected an if statement");
        };

        // The alternative of the outer if is itself an if with an else.
        let Some(else_stmt) = opt_else else {
            panic!("expected an else branch");
        };
        let Statement::If { opt_else, .. } = &**else_stmt else {
            panic!("expected an else-if");
        };
        assert!(opt_else.is_some());
    }

    #[test]
    fn parser_valid_dangling_else_binds_nearest() {
        let program = parse("age (a) age (b) x = 1; vagarna x = 2;");

        let Statement::If { then, opt_else, .. } = &program.stmts[0] else {
            panic!("expected an if statement");
        };

        // The alternative belongs to the inner if, not the outer one.
        assert!(opt_else.is_none());
        let Statement::If { opt_else, .. } = &**then else {
            panic!("expected a nested if");
        };
        assert!(opt_else.is_some());
    }

    #[test]
    fn parser_valid_for_header() {
        let program = parse("baraye (sahih i = 1; i <= 10; i = i + 1) { benvis(i); }");

        let Statement::For { init, body, .. } = &program.stmts[0] else {
            panic!("expected a for statement");
        };
        assert!(matches!(**init, Statement::VarDecl { .. }));
        assert!(matches!(**body, Statement::Block { .. }));
    }

    #[test]
    fn parser_valid_for_header_tolerates_ta() {
        let program = parse("baraye (sahih i = 1; ta i <= 10; i = i + 1) benvis(i);");
        assert!(matches!(program.stmts[0], Statement::For { .. }));
    }

    #[test]
    fn parser_valid_for_expression_initializer() {
        let program = parse("baraye (i = 0; i < 3; i = i + 1) benvis(i);");

        let Statement::For { init, .. } = &program.stmts[0] else {
            panic!("expected a for statement");
        };
        assert!(matches!(**init, Statement::Expr(_)));
    }

    #[test]
    fn parser_valid_stray_semicolon() {
        let program = parse("age (a) { benvis(a); } vagarna { benvis(b); };");

        assert_eq!(program.stmts.len(), 2);
        assert!(matches!(program.stmts[1], Statement::Empty));
    }

    #[test]
    fn parser_invalid_missing_semicolon() {
        let err = parse_err("sahih x = 1");
        assert!(err.to_string().contains("expected ';'"));
    }

    #[test]
    fn parser_invalid_missing_close_paren() {
        let err = parse_err("benvis(x;");
        assert!(err.to_string().contains("expected ')'"));
    }

    #[test]
    fn parser_invalid_assignment_target() {
        let err = parse_err("1 = x;");
        assert!(err.to_string().contains("invalid assignment target"));
    }

    #[test]
    fn parser_invalid_dangling_vali() {
        let err = parse_err("vali x = 1;");
        assert!(err.to_string().contains("expected expression"));
    }

    #[test]
    fn parser_invalid_input_requires_ident() {
        let err = parse_err("begir(1);");
        assert!(err.to_string().contains("expected identifier"));
    }
}
