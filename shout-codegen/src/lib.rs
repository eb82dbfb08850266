//! Generates C source code from the AST.

pub mod codegen;
pub mod value;

pub use codegen::{generate, generate_json};
