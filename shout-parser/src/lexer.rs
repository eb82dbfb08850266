//! DFA tokenizer and the token stream interchange format.
//!
//! The automaton is generated by [`logos`]. Each state family of the scanner maps onto one
//! pattern of [`RawToken`]:
//!
//! * `START` is the automaton root: whitespace is skipped and punctuation is emitted directly.
//! * `IDENTIFIER` is [`RawToken::Word`], later classified as keyword, operator word or identifier.
//! * `NUMBER` and `FLOAT` are [`RawToken::IntLit`] and [`RawToken::FloatLit`]. A `.` only
//!   continues a number when it is immediately followed by a digit.
//! * `STRING` is [`RawToken::StringLit`]. The quotes are kept in the lexeme and a string must
//!   be closed on the line it starts on, so every token fits on one interchange line.
//! * `COMMENT` is a skipped `//` run up to the end of the line.
//!
//! Malformed input is matched by dedicated error patterns so that the longest match itself
//! decides which lexical error to report.

use std::fmt;
use std::str::FromStr;

use logos::Logos;
use shout_source::{LexicalError, LexicalErrorKind, SyntaxError};
use tracing::{debug, trace};

#[derive(Debug, Logos, Clone, Copy, PartialEq)]
enum RawToken {
    // words: keywords, operator words and identifiers
    #[regex("[a-zA-Z][a-zA-Z0-9_]*")]
    Word,

    // literals
    #[regex("[0-9]+")]
    IntLit,
    #[regex(r"[0-9]+\.[0-9]+")]
    FloatLit,
    #[regex(r#""[^"\n]*""#)]
    StringLit,

    // punctuation
    #[token("(")]
    LPar,
    #[token(")")]
    RPar,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // malformed input
    #[regex(r"[0-9]+(\.[0-9]+)?[a-zA-Z]")]
    NumberFollowedByLetter,
    #[regex(r"[0-9]+\.[0-9]+\.")]
    MultipleDecimalPoints,
    #[regex(r#""[^"\n]*"#)]
    UnterminatedString,

    // misc
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)] // single line comments
    #[error]
    Error,
}

/// The closed set of keywords.
pub const KEYWORDS: [&str; 8] = [
    "make", "check", "shout", "if", "else", "return", "def", "call",
];

/// Maps an operator word to the operator symbol it stands for.
pub fn operator_symbol(word: &str) -> Option<&'static str> {
    let symbol = match word {
        "add" => "+",
        "subtract" => "-",
        "multiply" => "*",
        "divide" => "/",
        "less_than" => "<",
        "greater_than" => ">",
        "less_equal" => "<=",
        "greater_equal" => ">=",
        "equal_to" => "==",
        "not_equal_to" => "!=",
        "assign" => "=",
        _ => return None,
    };
    Some(symbol)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Operator,
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    LPar,
    RPar,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
}

impl TokenKind {
    /// The name of this kind in the token stream interchange format.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::IntLiteral => "INTLITERAL",
            TokenKind::FloatLiteral => "FLOATLITERAL",
            TokenKind::StringLiteral => "STRINGLITERAL",
            TokenKind::LPar => "LPAR",
            TokenKind::RPar => "RPAR",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "KEYWORD" => TokenKind::Keyword,
            "OPERATOR" => TokenKind::Operator,
            "IDENTIFIER" => TokenKind::Identifier,
            "INTLITERAL" => TokenKind::IntLiteral,
            "FLOATLITERAL" => TokenKind::FloatLiteral,
            "STRINGLITERAL" => TokenKind::StringLiteral,
            "LPAR" => TokenKind::LPar,
            "RPAR" => TokenKind::RPar,
            "LBRACKET" => TokenKind::LBracket,
            "RBRACKET" => TokenKind::RBracket,
            "LBRACE" => TokenKind::LBrace,
            "RBRACE" => TokenKind::RBrace,
            "COMMA" => TokenKind::Comma,
            "SEMICOLON" => TokenKind::Semicolon,
            _ => return Err(SyntaxError::new(format!("unknown token kind '{}'", s))),
        };
        Ok(kind)
    }
}

/// A `(kind, lexeme)` pair.
/// Operator tokens hold the operator symbol (e.g. `+`), not the word it was spelled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
        }
    }

    /// Returns `true` if this token has the specified `kind` and, when given, the exact `lexeme`.
    pub fn is(&self, kind: TokenKind, lexeme: Option<&str>) -> bool {
        self.kind == kind && lexeme.map_or(true, |lexeme| self.lexeme == lexeme)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.kind, self.lexeme)
    }
}

/// Classifies a maximal alphanumeric run.
fn classify_word(word: &str) -> Token {
    if KEYWORDS.contains(&word) {
        Token::new(TokenKind::Keyword, word)
    } else if let Some(symbol) = operator_symbol(word) {
        Token::new(TokenKind::Operator, symbol)
    } else {
        Token::new(TokenKind::Identifier, word)
    }
}

/// Scans `source` into tokens.
/// Fails on the first malformed token; no partial token sequence is returned.
pub fn scan(source: &str) -> Result<Vec<Token>, LexicalError> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(raw) = lexer.next() {
        let slice = lexer.slice();
        let start = lexer.span().start;
        let error = |kind| Err(LexicalError::new(kind, start));

        let token = match raw {
            RawToken::Word => classify_word(slice),
            RawToken::IntLit => Token::new(TokenKind::IntLiteral, slice),
            RawToken::FloatLit => Token::new(TokenKind::FloatLiteral, slice),
            RawToken::StringLit => Token::new(TokenKind::StringLiteral, slice),
            RawToken::LPar => Token::new(TokenKind::LPar, slice),
            RawToken::RPar => Token::new(TokenKind::RPar, slice),
            RawToken::LBracket => Token::new(TokenKind::LBracket, slice),
            RawToken::RBracket => Token::new(TokenKind::RBracket, slice),
            RawToken::LBrace => Token::new(TokenKind::LBrace, slice),
            RawToken::RBrace => Token::new(TokenKind::RBrace, slice),
            RawToken::Comma => Token::new(TokenKind::Comma, slice),
            RawToken::Semicolon => Token::new(TokenKind::Semicolon, slice),
            RawToken::NumberFollowedByLetter => {
                return error(LexicalErrorKind::NumberFollowedByLetter)
            }
            RawToken::MultipleDecimalPoints => {
                return error(LexicalErrorKind::MultipleDecimalPoints)
            }
            RawToken::UnterminatedString => return error(LexicalErrorKind::UnterminatedString),
            RawToken::Error => {
                // The error slice may span several bytes; report the first character.
                let c = slice.chars().next().unwrap_or('\0');
                return error(LexicalErrorKind::UnexpectedCharacter(c));
            }
        };
        trace!(token = %token, "scanned token");
        tokens.push(token);
    }

    debug!(tokens = tokens.len(), "scanned source");
    Ok(tokens)
}

/// Writes `tokens` in the interchange format, one `<KIND, value>` per line.
pub fn format_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&token.to_string());
        out.push('\n');
    }
    out
}

/// Reads a token stream written by [`format_tokens`].
/// Blank lines are ignored. Any other line that is not a `<KIND, value>` pair is an error.
pub fn read_tokens(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed =
            || SyntaxError::new(format!("incorrect token format on line {}: {}", index + 1, line));

        let inner = line
            .strip_prefix('<')
            .and_then(|line| line.strip_suffix('>'))
            .ok_or_else(malformed)?;
        let (kind, lexeme) = inner.split_once(',').ok_or_else(malformed)?;
        let lexeme = lexeme.trim();
        if lexeme.is_empty() {
            return Err(malformed());
        }
        tokens.push(Token::new(kind.trim().parse()?, lexeme));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn error_kind(source: &str) -> LexicalErrorKind {
        scan(source).unwrap_err().kind
    }

    #[test]
    fn test_declaration() {
        let tokens = scan("make x assign 10;").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Keyword, "make"),
                Token::new(TokenKind::Identifier, "x"),
                Token::new(TokenKind::Operator, "="),
                Token::new(TokenKind::IntLiteral, "10"),
                Token::new(TokenKind::Semicolon, ";"),
            ]
        );
    }

    #[test]
    fn test_operator_words() {
        let tokens = scan("a add b less_equal c not_equal_to d").unwrap();
        let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["a", "+", "b", "<=", "c", "!=", "d"]);
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        // a word that merely starts with an operator word is an identifier
        assert_eq!(kinds("adder"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("make_x"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_numbers() {
        let tokens = scan("12 3.25 0").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::IntLiteral, "12"));
        assert_eq!(tokens[1], Token::new(TokenKind::FloatLiteral, "3.25"));
        assert_eq!(tokens[2], Token::new(TokenKind::IntLiteral, "0"));
    }

    #[test]
    fn test_string_keeps_quotes() {
        let tokens = scan(r#"shout("hello world");"#).unwrap();
        assert_eq!(
            tokens[2],
            Token::new(TokenKind::StringLiteral, "\"hello world\"")
        );
    }

    #[test]
    fn test_punctuation() {
        use TokenKind::*;
        assert_eq!(
            kinds("( ) [ ] { } , ;"),
            vec![LPar, RPar, LBracket, RBracket, LBrace, RBrace, Comma, Semicolon]
        );
        assert_eq!(kinds("xs[0]"), vec![Identifier, LBracket, IntLiteral, RBracket]);
    }

    #[test]
    fn test_comments() {
        let tokens = scan("make x assign 1; // a comment\nshout(x); // trailing").unwrap();
        assert_eq!(tokens.len(), 10);
        assert_eq!(tokens[5], Token::new(TokenKind::Keyword, "shout"));
        assert!(scan("// only a comment").unwrap().is_empty());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            error_kind("make x assign 1 + 2;"),
            LexicalErrorKind::UnexpectedCharacter('+')
        );
        assert_eq!(error_kind("make 12abc;"), LexicalErrorKind::NumberFollowedByLetter);
        assert_eq!(error_kind("1.5x"), LexicalErrorKind::NumberFollowedByLetter);
        assert_eq!(error_kind("1.2.3"), LexicalErrorKind::MultipleDecimalPoints);
        assert_eq!(error_kind("shout(\"abc"), LexicalErrorKind::UnterminatedString);
    }

    #[test]
    fn test_unterminated_string_position() {
        let err = scan("make s assign \"abc").unwrap_err();
        assert_eq!(err.kind, LexicalErrorKind::UnterminatedString);
        assert_eq!(err.position, 14);
    }

    #[test]
    fn test_string_ends_at_newline() {
        let err = scan("shout(\"two\nlines\");").unwrap_err();
        assert_eq!(err.kind, LexicalErrorKind::UnterminatedString);
        assert_eq!(err.position, 6);

        let tokens = scan("shout(\"one line\");\nshout(\"next\");").unwrap();
        assert_eq!(read_tokens(&format_tokens(&tokens)).unwrap(), tokens);
    }

    #[test]
    fn test_dot_not_followed_by_digit() {
        // The `.` does not belong to the number and starts no token of its own.
        assert!(scan("1.").is_err());
        assert!(scan("shout(1.);").is_err());
    }

    #[test]
    fn test_interchange() {
        let tokens = scan("make msg assign \"a, b\"; shout(msg add 1.5);").unwrap();
        let text = format_tokens(&tokens);
        assert!(text.starts_with("<KEYWORD, make>\n<IDENTIFIER, msg>\n<OPERATOR, =>\n"));
        assert!(text.contains("<STRINGLITERAL, \"a, b\">\n"));
        assert_eq!(read_tokens(&text).unwrap(), tokens);
    }

    #[test]
    fn test_read_tokens_rejects_garbage() {
        assert!(read_tokens("<KEYWORD make>").is_err());
        assert!(read_tokens("KEYWORD, make").is_err());
        assert!(read_tokens("<WHATEVER, make>").is_err());
        assert_eq!(read_tokens("\n\n").unwrap(), vec![]);
    }
}
