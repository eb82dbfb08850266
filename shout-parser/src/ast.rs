//! Abstract syntax tree.
//!
//! Every node serializes as a single-key JSON object whose key is the node tag, which is the AST
//! interchange format between the parser and the code generator. Deserialization rejects objects
//! with zero keys, more than one key, unknown tags or unknown fields.

use serde::{Deserialize, Serialize};

/// The root node, `{"Program": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Program {
    #[serde(rename = "Program")]
    pub body: Vec<Stmt>,
}

impl Program {
    /// Serializes the program into the JSON interchange format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads a program from the JSON interchange format.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A brace-delimited statement list, `{"Block": [...]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    #[serde(rename = "Block")]
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `make x assign 1;`
    VarDeclaration(VarDeclaration),
    /// `x assign 1;` or `xs[0] assign 1;`
    Assignment(Assignment),
    /// `shout(x);`
    Output(Expr),
    Return(Expr),
    /// `call foo(1, 2);`
    FunctionCallStatement(FunctionCall),
    IfStatement(IfStatement),
    /// `check (cond) { ... }`
    Loop(Loop),
    FunctionDef(FunctionDef),
    /// A lone `;`. The payload is always `";"`.
    EmptyStatement(String),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct VarDeclaration {
    pub identifier: String,
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Assignment {
    pub assignable: Assignable,
    pub expression: Expr,
}

/// The target of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Assignable {
    Identifier(String),
    IndexedIdentifier(IndexedIdentifier),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct IfStatement {
    pub condition: Expr,
    pub then: Block,
    #[serde(rename = "Else", default)]
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Loop {
    pub condition: Expr,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FunctionDef {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    IntegerLiteral(i64),
    FloatLiteral(f64),
    /// The lexeme of a string literal, including its surrounding quotes.
    StringLiteral(String),
    /// An identifier (e.g. `foo`).
    Identifier(String),
    /// An indexed read (e.g. `xs[1]`).
    IndexedIdentifier(IndexedIdentifier),
    /// `foo(1)` or `call foo(1)`.
    FunctionCall(FunctionCall),
    /// `*` and `/`.
    Term(BinaryExpr),
    /// `+` and `-`.
    ArithmeticExpression(BinaryExpr),
    /// `<`, `>`, `<=`, `>=`, `==` and `!=`.
    RelationalExpression(BinaryExpr),
    UnaryExpression(UnaryExpr),
    /// A list literal (e.g. `[1, 2, 3]`).
    ListExpression(ListExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct IndexedIdentifier {
    pub identifier: String,
    pub index: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct UnaryExpr {
    pub operator: UnaryOp,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ListExpr {
    /// The category of the first element. `None` for an empty list.
    #[serde(rename = "Type")]
    pub element_type: Option<ElementType>,
    pub elements: Vec<Expr>,
}

/// The coarse syntactic category used to keep list literals homogeneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Int,
    Float,
    String,
    Identifier,
    Unknown,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Int => "int",
            ElementType::Float => "float",
            ElementType::String => "string",
            ElementType::Identifier => "identifier",
            ElementType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl BinaryOp {
    /// Converts an operator symbol into a binary operator. `=` is not a binary operator.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessEqual,
            ">=" => BinaryOp::GreaterEqual,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Less
                | BinaryOp::Greater
                | BinaryOp::LessEqual
                | BinaryOp::GreaterEqual
                | BinaryOp::Equal
                | BinaryOp::NotEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
}
