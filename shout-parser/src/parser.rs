use crate::ast::Program;
use crate::lexer::{Token, TokenKind};
use shout_source::SyntaxError;
use tracing::debug;

mod expr;
mod stmt;

/// Parses a complete token sequence into a [`Program`].
pub fn parse(tokens: &[Token]) -> Result<Program, SyntaxError> {
    Parser::new(tokens).parse_program()
}

/// Recursive descent parser with one token of lookahead.
/// A `Parser` is only ever used for a single token sequence.
pub struct Parser<'a> {
    tokens: &'a [Token],
    /// Index of the current token.
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }
}

impl<'a> Parser<'a> {
    pub fn parse_program(&mut self) -> Result<Program, SyntaxError> {
        let mut body = Vec::new();
        while self.current().is_some() {
            body.push(self.parse_stmt()?);
        }
        debug!(statements = body.len(), "parsed program");
        Ok(Program { body })
    }
}

/// Parse utilities
impl<'a> Parser<'a> {
    /// Returns the current token or `None` at the end of input.
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Returns the token after the current one.
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos + 1)
    }

    /// Predicate that tests whether the current token has the specified `kind` (and `lexeme` if not `None`).
    fn check(&self, kind: TokenKind, lexeme: Option<&str>) -> bool {
        self.current().map_or(false, |token| token.is(kind, lexeme))
    }

    /// Eats the current token if it matches. Returns whether a token was eaten.
    fn eat(&mut self, kind: TokenKind, lexeme: Option<&str>) -> bool {
        self.check(kind, lexeme) && self.expect(kind, lexeme).is_ok()
    }

    /// Consumes and returns the current token if it matches `kind` (and `lexeme` if not `None`).
    /// Every token the parser consumes goes through this method.
    fn expect(&mut self, kind: TokenKind, lexeme: Option<&str>) -> Result<&'a Token, SyntaxError> {
        match self.current() {
            Some(token) if token.is(kind, lexeme) => {
                self.pos += 1;
                Ok(token)
            }
            _ => {
                let expected = match lexeme {
                    Some(lexeme) => format!("{} '{}'", kind, lexeme),
                    None => kind.to_string(),
                };
                Err(self.unexpected(expected))
            }
        }
    }

    /// Creates an unexpected token error for the current token.
    fn unexpected(&self, expected: impl std::fmt::Display) -> SyntaxError {
        SyntaxError::unexpected(expected, self.current().map(describe))
    }
}

/// Formats a token as `KIND 'lexeme'` for error messages.
fn describe(token: &Token) -> String {
    format!("{} '{}'", token.kind, token.lexeme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::lexer::scan;

    fn program(source: &str) -> Program {
        parse(&scan(source).unwrap()).unwrap()
    }

    fn error(source: &str) -> String {
        parse(&scan(source).unwrap()).unwrap_err().message().to_string()
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(program(""), Program { body: vec![] });
        assert_eq!(program("// nothing"), Program { body: vec![] });
    }

    #[test]
    fn test_expect_reports_expected_and_found() {
        assert_eq!(
            error("make x assign 1"),
            "expected SEMICOLON, but found EOF"
        );
        assert_eq!(
            error("make x 1;"),
            "expected OPERATOR '=', but found INTLITERAL '1'"
        );
        assert_eq!(error("shout(1;"), "expected RPAR, but found SEMICOLON ';'");
    }

    #[test]
    fn test_statement_sequence() {
        let ast = program("make x assign 1; shout(x); ;");
        assert_eq!(ast.body.len(), 3);
        assert!(matches!(ast.body[0], Stmt::VarDeclaration(_)));
        assert!(matches!(ast.body[1], Stmt::Output(Expr::Identifier(_))));
        assert_eq!(ast.body[2], Stmt::EmptyStatement(";".to_string()));
    }
}
