//! Front end of the compiler: lexer, parser and abstract syntax tree.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod tree;
