//! Error types shared by every stage of the compilation pipeline.

use std::fmt;

use thiserror::Error;

/// Result alias used at every stage boundary of the compiler.
pub type Result<T> = std::result::Result<T, CompileError>;

/// A single positioned semantic finding.
///
/// Semantic analysis collects these instead of failing fast, so one run
/// reports every problem in the source at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line.
    pub line: usize,
    /// 1-based source column.
    pub col: usize,
    /// Human-readable description of the finding.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "semantic error at line {}, column {}: {}",
            self.line, self.col, self.message
        )
    }
}

/// Failure raised by any stage of the compiler, or by the driver around it.
///
/// Lexical and syntax errors are raised on the first finding; semantic
/// findings are batched into a single [`CompileError::Semantic`] value.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed lexeme in the source text.
    #[error("lexical error at line {line}, column {col}: {message}")]
    Lexical {
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
        /// Human-readable description of the finding.
        message: String,
    },
    /// Token sequence that does not match the grammar.
    #[error("syntax error at line {line}, column {col}: {message}")]
    Syntax {
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
        /// Human-readable description of the finding.
        message: String,
    },
    /// Every semantic finding of the run, reported together.
    #[error("{}", format_batch(.0))]
    Semantic(Vec<Diagnostic>),
    /// Pipeline contract violation; indicates a bug in an earlier stage.
    #[error("internal error: {0}")]
    Internal(String),
    /// Driver-side failure whose message carries its own context (the path
    /// or the command involved).
    #[error("{0}")]
    Driver(String),
    /// Underlying I/O failure in the driver.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Returns a lexical error at the given position.
    pub fn lexical(line: usize, col: usize, message: impl Into<String>) -> Self {
        CompileError::Lexical {
            line,
            col,
            message: message.into(),
        }
    }

    /// Returns a syntax error at the given position.
    pub fn syntax(line: usize, col: usize, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            line,
            col,
            message: message.into(),
        }
    }
}

fn format_batch(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_batch_one_line_per_diagnostic() {
        let err = CompileError::Semantic(vec![
            Diagnostic {
                line: 1,
                col: 8,
                message: "use of undeclared variable 'x'".into(),
            },
            Diagnostic {
                line: 3,
                col: 7,
                message: "redeclaration of 'x'".into(),
            },
        ]);

        let rendered = err.to_string();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "semantic error at line 1, column 8: use of undeclared variable 'x'"
        );
        assert_eq!(
            lines[1],
            "semantic error at line 3, column 7: redeclaration of 'x'"
        );
    }

    #[test]
    fn lexical_error_format() {
        let err = CompileError::lexical(2, 14, "unterminated string literal");
        assert_eq!(
            err.to_string(),
            "lexical error at line 2, column 14: unterminated string literal"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: CompileError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();

        assert!(matches!(err, CompileError::Io(_)));
        assert!(err.to_string().starts_with("i/o error: "));
    }
}
