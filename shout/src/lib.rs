//! Compiles shout source code to C.
//!
//! Each stage can also be run on its own through the interchange formats: the token stream
//! (`<KIND, value>` lines) between the lexer and the parser, and the JSON AST between the parser
//! and the code generator.

use shout_parser::ast::Program;
use shout_parser::lexer::{self, Token};
use shout_parser::{parser, tree};
use shout_source::CompileError;
use tracing::info;

/// Scans `source` and returns the token stream in the interchange format.
pub fn scan(source: &str) -> Result<String, CompileError> {
    let tokens = lexer::scan(source)?;
    Ok(lexer::format_tokens(&tokens))
}

/// Parses a token stream in the interchange format.
pub fn parse_tokens(input: &str) -> Result<Program, CompileError> {
    let tokens: Vec<Token> = lexer::read_tokens(input)?;
    Ok(parser::parse(&tokens)?)
}

/// Parses a token stream and returns the JSON AST.
pub fn parse(input: &str) -> Result<String, CompileError> {
    parse_tokens(input)?
        .to_json()
        .map_err(|err| CompileError::Serialization(err.to_string()))
}

/// Parses a token stream and returns the human-readable tree of the AST.
pub fn parse_tree(input: &str) -> Result<String, CompileError> {
    Ok(tree::render_tree(&parse_tokens(input)?))
}

/// Generates C from a JSON AST.
pub fn generate(json: &str) -> Result<String, CompileError> {
    Ok(shout_codegen::generate_json(json)?)
}

/// Runs the whole pipeline on `source` and returns the C translation.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = lexer::scan(source)?;
    let program = parser::parse(&tokens)?;
    let output = shout_codegen::generate(&program)?;
    info!(
        tokens = tokens.len(),
        statements = program.body.len(),
        "compiled program"
    );
    Ok(output)
}
