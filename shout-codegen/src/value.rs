//! Inferred types and compile-time constant values.

use std::convert::TryFrom;
use std::fmt;

use shout_parser::ast::BinaryOp;

/// The type lattice of the language.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    Str,
    Array(Box<Type>),
}

impl Type {
    /// The C type used for values of this type. Arrays map to their element type.
    pub fn c_type(&self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Float => "double",
            Type::Str => "char*",
            Type::Array(element) => element.c_type(),
        }
    }

    /// The `printf` conversion used to output a value of this type.
    pub fn format_specifier(&self) -> &'static str {
        match self {
            Type::Int => "%d",
            Type::Float => "%f",
            Type::Str | Type::Array(_) => "%s",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// The result type of `+`, `-`, `*` and `/`: float if either side is float, int otherwise.
    pub fn promote(lhs: &Type, rhs: &Type) -> Type {
        if *lhs == Type::Float || *rhs == Type::Float {
            Type::Float
        } else {
            Type::Int
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Str => f.write_str("string"),
            Type::Array(element) => write!(f, "array of {}", element),
        }
    }
}

/// A value known at generation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Const {
    Int(i64),
    Float(f64),
}

impl Const {
    pub fn ty(self) -> Type {
        match self {
            Const::Int(_) => Type::Int,
            Const::Float(_) => Type::Float,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Const::Int(val) => val as f64,
            Const::Float(val) => val,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Const::Int(val) => val == 0,
            Const::Float(val) => val == 0.0,
        }
    }

    /// Renders the value as a C literal.
    pub fn literal(self) -> String {
        match self {
            Const::Int(val) => val.to_string(),
            Const::Float(val) => float_literal(val),
        }
    }

    /// Evaluates `lhs op rhs` for an arithmetic operator.
    /// Returns `None` when the expression must stay unevaluated: division by zero, an int operand
    /// or result outside the 32-bit range, a non-finite float result or a relational operator.
    pub fn fold(op: BinaryOp, lhs: Const, rhs: Const) -> Option<Const> {
        if op == BinaryOp::Div && rhs.is_zero() {
            return None;
        }
        match (lhs, rhs) {
            (Const::Int(lhs), Const::Int(rhs)) => {
                // `int` is 32 bits wide in the generated C.
                let (lhs, rhs) = (i32::try_from(lhs).ok()?, i32::try_from(rhs).ok()?);
                let val = match op {
                    BinaryOp::Add => lhs.checked_add(rhs),
                    BinaryOp::Sub => lhs.checked_sub(rhs),
                    BinaryOp::Mul => lhs.checked_mul(rhs),
                    // truncates toward zero like C integer division
                    BinaryOp::Div => lhs.checked_div(rhs),
                    _ => None,
                }?;
                Some(Const::Int(i64::from(val)))
            }
            _ => {
                let (lhs, rhs) = (lhs.as_f64(), rhs.as_f64());
                let val = match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => lhs / rhs,
                    _ => return None,
                };
                if val.is_finite() {
                    Some(Const::Float(val))
                } else {
                    None
                }
            }
        }
    }

    /// Evaluates `lhs op rhs` for a relational operator. Returns `None` for arithmetic operators.
    pub fn compare(op: BinaryOp, lhs: Const, rhs: Const) -> Option<bool> {
        match (lhs, rhs) {
            (Const::Int(lhs), Const::Int(rhs)) => compare_with(op, &lhs, &rhs),
            _ => compare_with(op, &lhs.as_f64(), &rhs.as_f64()),
        }
    }

    pub fn negate(self) -> Option<Const> {
        match self {
            Const::Int(val) => i32::try_from(val)
                .ok()?
                .checked_neg()
                .map(|val| Const::Int(i64::from(val))),
            Const::Float(val) => Some(Const::Float(-val)),
        }
    }
}

fn compare_with<T: PartialOrd>(op: BinaryOp, lhs: &T, rhs: &T) -> Option<bool> {
    let result = match op {
        BinaryOp::Less => lhs < rhs,
        BinaryOp::Greater => lhs > rhs,
        BinaryOp::LessEqual => lhs <= rhs,
        BinaryOp::GreaterEqual => lhs >= rhs,
        BinaryOp::Equal => lhs == rhs,
        BinaryOp::NotEqual => lhs != rhs,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => return None,
    };
    Some(result)
}

/// Formats a float so that it always reads back as a floating point literal (`2.0`, not `2`).
pub fn float_literal(val: f64) -> String {
    format!("{:?}", val)
}

/// A generated expression: its C text, its inferred type and its value if known.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub code: String,
    pub ty: Type,
    pub value: Option<Const>,
}

impl Fragment {
    pub fn new(code: impl Into<String>, ty: Type) -> Self {
        Self {
            code: code.into(),
            ty,
            value: None,
        }
    }

    pub fn constant(value: Const) -> Self {
        Self {
            code: value.literal(),
            ty: value.ty(),
            value: Some(value),
        }
    }
}
