//! Source positions and error management.
//!
//! Every stage of the pipeline fails with exactly one error value. The three stage errors are
//! collected into [`CompileError`] for callers that run the whole pipeline.

use std::fmt;

use thiserror::Error;

/// A byte offset into the source code together with its 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Computes the line and column of `offset` inside `content`.
    /// Offsets past the end of `content` are clamped to the end.
    pub fn locate(content: &str, offset: usize) -> Self {
        let offset = offset.min(content.len());
        let before = &content[..floor_char_boundary(content, offset)];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Self {
            offset,
            line,
            column,
        }
    }
}

fn floor_char_boundary(content: &str, mut offset: usize) -> usize {
    while !content.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The different ways the lexer can reject its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexicalErrorKind {
    /// A character that starts no token.
    UnexpectedCharacter(char),
    /// A digit run immediately followed by a letter (e.g. `12abc`).
    NumberFollowedByLetter,
    /// A float with a second decimal point (e.g. `1.2.3`).
    MultipleDecimalPoints,
    /// A string literal that is not closed before the end of its line.
    UnterminatedString,
}

impl fmt::Display for LexicalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexicalErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            LexicalErrorKind::NumberFollowedByLetter => {
                f.write_str("invalid token starting with a number")
            }
            LexicalErrorKind::MultipleDecimalPoints => {
                f.write_str("invalid float format with multiple decimal points")
            }
            LexicalErrorKind::UnterminatedString => f.write_str("unterminated string literal"),
        }
    }
}

/// Raised by the lexer. No tokens are produced when this happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lexical error: {kind} at position {position}")]
pub struct LexicalError {
    pub kind: LexicalErrorKind,
    /// Byte offset where the offending token starts.
    pub position: usize,
}

impl LexicalError {
    /// Create a new lexical error of `kind` at byte offset `position`.
    pub fn new(kind: LexicalErrorKind, position: usize) -> Self {
        Self { kind, position }
    }

    /// Resolves the byte offset of this error against `content`.
    pub fn locate(&self, content: &str) -> Position {
        Position::locate(content, self.position)
    }
}

/// Represents a syntax error (compile time error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error: {message}")]
pub struct SyntaxError {
    message: String,
}

impl SyntaxError {
    /// Create a new syntax error with the specified `message`.
    pub fn new(message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    /// Creates the error raised when the parser wanted `expected` but saw `found`.
    /// `found` is `None` at the end of input.
    pub fn unexpected(expected: impl fmt::Display, found: Option<impl fmt::Display>) -> Self {
        match found {
            Some(found) => Self::new(format!("expected {}, but found {}", expected, found)),
            None => Self::new(format!("expected {}, but found EOF", expected)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Raised by the code generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("function '{function}' returns both {first} and {found}")]
    InconsistentReturnTypes {
        function: String,
        first: String,
        found: String,
    },
    #[error("function '{0}' returns an array, which is not allowed")]
    ArrayReturn(String),
    #[error("variable '{0}' cannot be declared with an array type")]
    ArrayVariable(String),
    #[error("malformed AST: {0}")]
    MalformedAst(String),
}

/// Any error produced by one compilation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// The AST could not be written in the JSON interchange format.
    #[error("cannot serialize AST: {0}")]
    Serialization(String),
}
