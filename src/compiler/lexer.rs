//! Lexical Analysis
//!
//! Compiler pass that tokenizes _AkbarLang_ source code, producing a finite
//! token sequence terminated by a single end-of-input token.

use std::fmt;

use crate::error::{CompileError, Result};

/// Reserved words of the _AkbarLang_ language.
const KEYWORDS: [(&str, Keyword); 13] = [
    ("sahih", Keyword::Sahih),
    ("ashar", Keyword::Ashar),
    ("harf", Keyword::Harf),
    ("begir", Keyword::Begir),
    ("benvis", Keyword::Benvis),
    ("age", Keyword::Age),
    ("vali", Keyword::Vali),
    ("vagarna", Keyword::Vagarna),
    ("baraye", Keyword::Baraye),
    ("vaghti", Keyword::Vaghti),
    ("ta", Keyword::Ta),
    ("va", Keyword::Va),
    ("ya", Keyword::Ya),
];

/// Keywords of the _AkbarLang_ language, by semantic role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `sahih` - integer declaration.
    Sahih,
    /// `ashar` - floating-point declaration.
    Ashar,
    /// `harf` - character declaration.
    Harf,
    /// `begir` - read-from-stdin statement.
    Begir,
    /// `benvis` - write-to-stdout statement.
    Benvis,
    /// `age` - conditional statement.
    Age,
    /// `vali` - introduces an else branch; followed by `age` forms else-if.
    Vali,
    /// `vagarna` - alternative else keyword (no chaining).
    Vagarna,
    /// `baraye` - counted loop.
    Baraye,
    /// `vaghti` - conditional loop.
    Vaghti,
    /// `ta` - loop bound connective (reserved; tolerated in `for` headers).
    Ta,
    /// `va` - logical AND.
    Va,
    /// `ya` - logical OR.
    Ya,
}

impl Keyword {
    /// Returns the keyword for the given identifier run, or `None` if it is a
    /// plain identifier.
    fn lookup(ident: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(lexeme, _)| *lexeme == ident)
            .map(|(_, kw)| *kw)
    }

    /// Returns the source lexeme of the keyword.
    pub fn lexeme(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == self)
            .map(|(lexeme, _)| *lexeme)
            .expect("every keyword has an entry in the keyword table")
    }
}

/// Operators of the _AkbarLang_ language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum OperatorKind {
    Plus,
    Minus,
    Asterisk,
    Division,
    Assign,
    Eq,
    NotEq,
    LessThan,
    GreaterThan,
    LessThanEq,
    GreaterThanEq,
}

impl OperatorKind {
    /// Returns the source lexeme of the operator.
    pub fn lexeme(self) -> &'static str {
        match self {
            OperatorKind::Plus => "+",
            OperatorKind::Minus => "-",
            OperatorKind::Asterisk => "*",
            OperatorKind::Division => "/",
            OperatorKind::Assign => "=",
            OperatorKind::Eq => "==",
            OperatorKind::NotEq => "!=",
            OperatorKind::LessThan => "<",
            OperatorKind::GreaterThan => ">",
            OperatorKind::LessThanEq => "<=",
            OperatorKind::GreaterThanEq => ">=",
        }
    }
}

/// Types of lexical elements.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum TokenType {
    Keyword(Keyword),
    Ident(String),
    IntConstant(i64),
    FloatConstant(f64),
    StringLiteral(String),
    CharLiteral(char),
    Operator(OperatorKind),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    /// End of input.
    Eof,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Keyword(kw) => write!(f, "keyword '{}'", kw.lexeme()),
            TokenType::Ident(s) => write!(f, "identifier '{s}'"),
            TokenType::IntConstant(v) => write!(f, "integer constant '{v}'"),
            TokenType::FloatConstant(v) => write!(f, "floating-point constant '{v}'"),
            TokenType::StringLiteral(_) => write!(f, "string literal"),
            TokenType::CharLiteral(c) => write!(f, "character constant '{c}'"),
            TokenType::Operator(op) => write!(f, "'{}'", op.lexeme()),
            TokenType::LParen => write!(f, "'('"),
            TokenType::RParen => write!(f, "')'"),
            TokenType::LBrace => write!(f, "'{{'"),
            TokenType::RBrace => write!(f, "'}}'"),
            TokenType::Semicolon => write!(f, "';'"),
            TokenType::Comma => write!(f, "','"),
            TokenType::Eof => write!(f, "end of input"),
        }
    }
}

/// Source position of a processed `Token` (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

/// Minimal lexical element of an _AkbarLang_ source text.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct Token {
    pub ty: TokenType,
    pub loc: Location,
}

/// Tokenizes the provided source text.
///
/// Whitespace and `#` line comments are discarded; the returned sequence ends
/// with exactly one [`TokenType::Eof`] token.
///
/// # Errors
///
/// Returns a [`CompileError::Lexical`] on the first malformed lexeme.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    lexer.run()?;
    Ok(lexer.tokens)
}

/// Cursor over the source text with 1-based line and column tracking.
struct Lexer {
    src: Vec<char>,
    cur: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            src: source.chars().collect(),
            cur: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        while self.has_next() {
            let loc = self.loc();

            match self.first() {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' => {
                    // Line comment; the terminating newline is consumed as
                    // ordinary whitespace on the next iteration.
                    while self.has_next() && self.first() != '\n' {
                        self.bump();
                    }
                }
                '0'..='9' => self.lex_number(loc)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident_or_keyword(loc),
                '"' => self.lex_string(loc)?,
                '\'' => self.lex_char(loc)?,
                '(' => self.push_single(TokenType::LParen, loc),
                ')' => self.push_single(TokenType::RParen, loc),
                '{' => self.push_single(TokenType::LBrace, loc),
                '}' => self.push_single(TokenType::RBrace, loc),
                ';' => self.push_single(TokenType::Semicolon, loc),
                ',' => self.push_single(TokenType::Comma, loc),
                '+' => self.push_single(TokenType::Operator(OperatorKind::Plus), loc),
                '-' => self.push_single(TokenType::Operator(OperatorKind::Minus), loc),
                '*' => self.push_single(TokenType::Operator(OperatorKind::Asterisk), loc),
                '/' => self.push_single(TokenType::Operator(OperatorKind::Division), loc),
                '=' => {
                    self.bump();
                    if self.has_next() && self.first() == '=' {
                        self.bump();
                        self.push(TokenType::Operator(OperatorKind::Eq), loc);
                    } else {
                        self.push(TokenType::Operator(OperatorKind::Assign), loc);
                    }
                }
                '<' => {
                    self.bump();
                    if self.has_next() && self.first() == '=' {
                        self.bump();
                        self.push(TokenType::Operator(OperatorKind::LessThanEq), loc);
                    } else {
                        self.push(TokenType::Operator(OperatorKind::LessThan), loc);
                    }
                }
                '>' => {
                    self.bump();
                    if self.has_next() && self.first() == '=' {
                        self.bump();
                        self.push(TokenType::Operator(OperatorKind::GreaterThanEq), loc);
                    } else {
                        self.push(TokenType::Operator(OperatorKind::GreaterThan), loc);
                    }
                }
                '!' => {
                    self.bump();
                    if self.has_next() && self.first() == '=' {
                        self.bump();
                        self.push(TokenType::Operator(OperatorKind::NotEq), loc);
                    } else {
                        // The language has no logical-not operator.
                        return Err(CompileError::lexical(
                            loc.line,
                            loc.col,
                            "unrecognized character '!'",
                        ));
                    }
                }
                c => {
                    return Err(CompileError::lexical(
                        loc.line,
                        loc.col,
                        format!("unrecognized character '{c}'"),
                    ));
                }
            }
        }

        self.tokens.push(Token {
            ty: TokenType::Eof,
            loc: self.loc(),
        });

        Ok(())
    }

    /// Lexes an integer constant, or a floating-point constant if the digit
    /// run is immediately followed by `.` and at least one further digit.
    fn lex_number(&mut self, loc: Location) -> Result<()> {
        let start = self.cur;

        while self.has_next() && self.first().is_ascii_digit() {
            self.bump();
        }

        let is_float = self.has_next()
            && self.first() == '.'
            && self
                .src
                .get(self.cur + 1)
                .is_some_and(char::is_ascii_digit);

        if is_float {
            // Consume the '.' and the fraction digits.
            self.bump();
            while self.has_next() && self.first().is_ascii_digit() {
                self.bump();
            }

            let lexeme: String = self.src[start..self.cur].iter().collect();
            let value = lexeme.parse::<f64>().map_err(|_| {
                CompileError::lexical(
                    loc.line,
                    loc.col,
                    format!("invalid floating-point constant '{lexeme}'"),
                )
            })?;

            self.push(TokenType::FloatConstant(value), loc);
        } else {
            let lexeme: String = self.src[start..self.cur].iter().collect();
            let value = lexeme.parse::<i64>().map_err(|_| {
                CompileError::lexical(
                    loc.line,
                    loc.col,
                    format!("integer constant '{lexeme}' is out of range"),
                )
            })?;

            self.push(TokenType::IntConstant(value), loc);
        }

        Ok(())
    }

    /// Lexes an identifier run and resolves it against the keyword table.
    ///
    /// The run is maximal, so keyword matching is longest-match: `vali` never
    /// splits into `va` followed by `li`, and `valid` stays an identifier.
    fn lex_ident_or_keyword(&mut self, loc: Location) {
        let start = self.cur;

        while self.has_next() && (self.first().is_ascii_alphanumeric() || self.first() == '_') {
            self.bump();
        }

        let lexeme: String = self.src[start..self.cur].iter().collect();

        match Keyword::lookup(&lexeme) {
            Some(kw) => self.push(TokenType::Keyword(kw), loc),
            None => self.push(TokenType::Ident(lexeme), loc),
        }
    }

    /// Lexes a string literal. Interior newlines are permitted and update the
    /// line/column state.
    fn lex_string(&mut self, loc: Location) -> Result<()> {
        // Consume the opening '"'.
        self.bump();

        let start = self.cur;

        while self.has_next() && self.first() != '"' {
            self.bump();
        }

        if !self.has_next() {
            return Err(CompileError::lexical(
                loc.line,
                loc.col,
                "unterminated string literal",
            ));
        }

        let value: String = self.src[start..self.cur].iter().collect();

        // Consume the closing '"'.
        self.bump();
        self.push(TokenType::StringLiteral(value), loc);

        Ok(())
    }

    /// Lexes a character literal: exactly one character between single quotes.
    fn lex_char(&mut self, loc: Location) -> Result<()> {
        // Consume the opening '\''.
        self.bump();

        if !self.has_next() {
            return Err(CompileError::lexical(
                loc.line,
                loc.col,
                "unterminated character literal",
            ));
        }

        let value = self.first();
        if value == '\'' {
            return Err(CompileError::lexical(
                loc.line,
                loc.col,
                "empty character literal",
            ));
        }
        self.bump();

        if !self.has_next() {
            return Err(CompileError::lexical(
                loc.line,
                loc.col,
                "unterminated character literal",
            ));
        }

        if self.first() != '\'' {
            return Err(CompileError::lexical(
                loc.line,
                loc.col,
                "character literal must contain exactly one character",
            ));
        }

        // Consume the closing '\''.
        self.bump();
        self.push(TokenType::CharLiteral(value), loc);

        Ok(())
    }

    fn push_single(&mut self, ty: TokenType, loc: Location) {
        self.bump();
        self.push(ty, loc);
    }

    fn push(&mut self, ty: TokenType, loc: Location) {
        self.tokens.push(Token { ty, loc });
    }

    /// Returns the current source position.
    fn loc(&self) -> Location {
        Location {
            line: self.line,
            col: self.col,
        }
    }

    /// Returns the character at the current cursor position without consuming
    /// it.
    ///
    /// # Panics
    ///
    /// Panics if the cursor position is out of bounds.
    #[inline]
    fn first(&self) -> char {
        self.src[self.cur]
    }

    /// Advances the cursor by one character, updating line and column state.
    fn bump(&mut self) {
        if self.first() == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.cur += 1;
    }

    /// Returns `true` if the cursor position is within bounds of the source.
    #[inline]
    fn has_next(&self) -> bool {
        self.cur < self.src.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(source: &str) -> Vec<TokenType> {
        lex(source)
            .expect("source should lex")
            .into_iter()
            .map(|tok| tok.ty)
            .collect()
    }

    #[test]
    fn lexer_valid_output_statement() {
        assert_eq!(
            types("benvis(\"Hello, World!\");"),
            vec![
                TokenType::Keyword(Keyword::Benvis),
                TokenType::LParen,
                TokenType::StringLiteral("Hello, World!".into()),
                TokenType::RParen,
                TokenType::Semicolon,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lexer_valid_declaration() {
        assert_eq!(
            types("sahih x = 42;"),
            vec![
                TokenType::Keyword(Keyword::Sahih),
                TokenType::Ident("x".into()),
                TokenType::Operator(OperatorKind::Assign),
                TokenType::IntConstant(42),
                TokenType::Semicolon,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lexer_valid_float_constant() {
        assert_eq!(
            types("3.25"),
            vec![TokenType::FloatConstant(3.25), TokenType::Eof]
        );
    }

    #[test]
    fn lexer_valid_integer_then_dot_needs_digit() {
        // `5.` is an integer constant followed by an unrecognized '.'.
        let err = lex("5.").unwrap_err();
        assert!(matches!(err, CompileError::Lexical { col: 2, .. }));
    }

    #[test]
    fn lexer_valid_keyword_longest_match() {
        assert_eq!(
            types("va vali valid ya yar ta vaghti vagarna"),
            vec![
                TokenType::Keyword(Keyword::Va),
                TokenType::Keyword(Keyword::Vali),
                TokenType::Ident("valid".into()),
                TokenType::Keyword(Keyword::Ya),
                TokenType::Ident("yar".into()),
                TokenType::Keyword(Keyword::Ta),
                TokenType::Keyword(Keyword::Vaghti),
                TokenType::Keyword(Keyword::Vagarna),
            ]
            .into_iter()
            .chain(std::iter::once(TokenType::Eof))
            .collect::<Vec<_>>()
        );
    }

    #[test]
    fn lexer_valid_vali_age_stays_two_tokens() {
        assert_eq!(
            types("vali age"),
            vec![
                TokenType::Keyword(Keyword::Vali),
                TokenType::Keyword(Keyword::Age),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lexer_valid_compound_operators() {
        assert_eq!(
            types("= == < <= > >= !="),
            vec![
                TokenType::Operator(OperatorKind::Assign),
                TokenType::Operator(OperatorKind::Eq),
                TokenType::Operator(OperatorKind::LessThan),
                TokenType::Operator(OperatorKind::LessThanEq),
                TokenType::Operator(OperatorKind::GreaterThan),
                TokenType::Operator(OperatorKind::GreaterThanEq),
                TokenType::Operator(OperatorKind::NotEq),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lexer_valid_comment_produces_no_token() {
        assert_eq!(
            types("# a comment\nsahih x;"),
            vec![
                TokenType::Keyword(Keyword::Sahih),
                TokenType::Ident("x".into()),
                TokenType::Semicolon,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lexer_valid_single_eof_token() {
        let tokens = lex("  \t\r\n# only a comment").expect("source should lex");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].ty, TokenType::Eof);
    }

    #[test]
    fn lexer_valid_positions() {
        let tokens = lex("sahih x;\n  x = 1;").expect("source should lex");

        let locs: Vec<(usize, usize)> = tokens.iter().map(|t| (t.loc.line, t.loc.col)).collect();
        assert_eq!(
            locs,
            vec![
                (1, 1),
                (1, 7),
                (1, 8),
                (2, 3),
                (2, 5),
                (2, 7),
                (2, 8),
                (2, 9),
            ]
        );
    }

    #[test]
    fn lexer_valid_string_with_interior_newline() {
        let tokens = lex("benvis(\"a\nb\"); sahih x;").expect("source should lex");

        assert_eq!(tokens[2].ty, TokenType::StringLiteral("a\nb".into()));
        // The token after the multi-line string sits on line 2.
        assert_eq!(tokens[3].loc.line, 2);
    }

    #[test]
    fn lexer_valid_char_literal() {
        assert_eq!(
            types("'a'"),
            vec![TokenType::CharLiteral('a'), TokenType::Eof]
        );
    }

    #[test]
    fn lexer_invalid_multi_char_literal() {
        let err = lex("'ab'").unwrap_err();
        assert!(err.to_string().contains("exactly one character"));
    }

    #[test]
    fn lexer_invalid_unterminated_string() {
        let err = lex("benvis(\"oops").unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn lexer_invalid_unterminated_char() {
        let err = lex("'a").unwrap_err();
        assert!(err.to_string().contains("unterminated character"));
    }

    #[test]
    fn lexer_invalid_lone_bang() {
        let err = lex("sahih x = !1;").unwrap_err();
        assert!(matches!(err, CompileError::Lexical { line: 1, col: 11, .. }));
    }

    #[test]
    fn lexer_invalid_unexpected_symbol() {
        let err = lex("sahih x = 1 @ 2;").unwrap_err();
        assert!(err.to_string().contains("unrecognized character '@'"));
    }
}
