use super::*;
use crate::ast::{
    BinaryExpr, BinaryOp, ElementType, Expr, FunctionCall, IndexedIdentifier, ListExpr, UnaryExpr,
    UnaryOp,
};

impl<'a> Parser<'a> {
    /* Expressions */
    /// Parses any expression.
    /// An expression starting with `[` is a list literal, anything else a relational expression.
    pub fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(TokenKind::LBracket, None) {
            self.parse_list_expr()
        } else {
            self.parse_relational_expr()
        }
    }

    /// Eats the current token if it is a binary operator accepted by `accept`.
    fn eat_binary_op(&mut self, accept: fn(BinaryOp) -> bool) -> Option<BinaryOp> {
        let op = self
            .current()
            .filter(|token| token.kind == TokenKind::Operator)
            .and_then(|token| BinaryOp::from_symbol(&token.lexeme))
            .filter(|op| accept(*op))?;
        if self.eat(TokenKind::Operator, Some(op.symbol())) {
            Some(op)
        } else {
            None
        }
    }

    /// Comparisons fold to the left (`a < b < c` is `(a < b) < c`).
    fn parse_relational_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_arithmetic_expr()?;
        while let Some(operator) = self.eat_binary_op(BinaryOp::is_relational) {
            let right = self.parse_arithmetic_expr()?;
            left = Expr::RelationalExpression(binary(left, operator, right));
        }
        Ok(left)
    }

    fn parse_arithmetic_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_term()?;
        while let Some(operator) =
            self.eat_binary_op(|op| matches!(op, BinaryOp::Add | BinaryOp::Sub))
        {
            let right = self.parse_term()?;
            left = Expr::ArithmeticExpression(binary(left, operator, right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_factor()?;
        while let Some(operator) =
            self.eat_binary_op(|op| matches!(op, BinaryOp::Mul | BinaryOp::Div))
        {
            let right = self.parse_factor()?;
            left = Expr::Term(binary(left, operator, right));
        }
        Ok(left)
    }

    /// Parses a factor. Prefix operators and `call` are handled here.
    fn parse_factor(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(TokenKind::Keyword, Some("call")) {
            let name = self.parse_identifier()?;
            return Ok(Expr::FunctionCall(self.parse_call_args(name)?));
        }
        if self.eat(TokenKind::Operator, Some("-")) {
            let operand = self.parse_factor()?;
            return Ok(Expr::UnaryExpression(UnaryExpr {
                operator: UnaryOp::Neg,
                operand: Box::new(operand),
            }));
        }
        self.parse_primary_expr()
    }

    /// Parses a primary (atom) expression.
    fn parse_primary_expr(&mut self) -> Result<Expr, SyntaxError> {
        let token = match self.current() {
            Some(token) => token,
            None => return Err(self.unexpected("expression")),
        };

        match token.kind {
            TokenKind::IntLiteral => {
                self.expect(TokenKind::IntLiteral, None)?;
                let value = token.lexeme.parse().map_err(|_| {
                    SyntaxError::new(format!("integer literal out of range: {}", token.lexeme))
                })?;
                Ok(Expr::IntegerLiteral(value))
            }
            TokenKind::FloatLiteral => {
                self.expect(TokenKind::FloatLiteral, None)?;
                let value: f64 = token.lexeme.parse().map_err(|_| {
                    SyntaxError::new(format!("invalid float literal: {}", token.lexeme))
                })?;
                if !value.is_finite() {
                    return Err(SyntaxError::new(format!(
                        "float literal out of range: {}",
                        token.lexeme
                    )));
                }
                Ok(Expr::FloatLiteral(value))
            }
            TokenKind::StringLiteral => {
                self.expect(TokenKind::StringLiteral, None)?;
                Ok(Expr::StringLiteral(token.lexeme.clone()))
            }
            TokenKind::Identifier => self.parse_identifier_expr(),
            TokenKind::LPar => {
                self.expect(TokenKind::LPar, None)?;
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RPar, None)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_list_expr(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /* Expressions.Identifier */
    /// Parses an identifier, an indexed read or a call expression.
    fn parse_identifier_expr(&mut self) -> Result<Expr, SyntaxError> {
        let identifier = self.parse_identifier()?;

        if self.eat(TokenKind::LBracket, None) {
            let index = self.parse_expr()?;
            self.expect(TokenKind::RBracket, None)?;
            Ok(Expr::IndexedIdentifier(IndexedIdentifier {
                identifier,
                index: Box::new(index),
            }))
        } else if self.check(TokenKind::LPar, None) {
            Ok(Expr::FunctionCall(self.parse_call_args(identifier)?))
        } else {
            Ok(Expr::Identifier(identifier))
        }
    }

    /// Parses the parenthesized argument list of a call to `name`.
    pub(super) fn parse_call_args(&mut self, name: String) -> Result<FunctionCall, SyntaxError> {
        self.expect(TokenKind::LPar, None)?;
        let mut arguments = Vec::new();
        if self.current().is_some() && !self.check(TokenKind::RPar, None) {
            arguments.push(self.parse_expr()?);
            while self.eat(TokenKind::Comma, None) {
                arguments.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RPar, None)?;
        Ok(FunctionCall { name, arguments })
    }

    /* Expressions.List */
    /// Parses a list literal. Every element must have the category of the first one.
    fn parse_list_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.expect(TokenKind::LBracket, None)?;

        let mut elements = Vec::new();
        let mut element_type = None;
        if !self.check(TokenKind::RBracket, None) {
            let first = self.parse_expr()?;
            let expected = element_type_of(&first);
            elements.push(first);

            while self.eat(TokenKind::Comma, None) {
                let element = self.parse_expr()?;
                let found = element_type_of(&element);
                if found != expected {
                    return Err(SyntaxError::new(format!(
                        "type mismatch in list elements: expected {}, found {}",
                        expected.as_str(),
                        found.as_str()
                    )));
                }
                elements.push(element);
            }
            element_type = Some(expected);
        }
        self.expect(TokenKind::RBracket, None)?;

        Ok(Expr::ListExpression(ListExpr {
            element_type,
            elements,
        }))
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> BinaryExpr {
    BinaryExpr {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

/// The syntactic category of a list element.
/// Only literals are categorized by type; names and calls are not checked against real types.
pub fn element_type_of(expr: &Expr) -> ElementType {
    match expr {
        Expr::IntegerLiteral(_) => ElementType::Int,
        Expr::FloatLiteral(_) => ElementType::Float,
        Expr::StringLiteral(_) => ElementType::String,
        Expr::Identifier(_) | Expr::IndexedIdentifier(_) => ElementType::Identifier,
        Expr::FunctionCall(_) | Expr::ListExpression(_) => ElementType::Unknown,
        Expr::Term(expr) | Expr::ArithmeticExpression(expr) | Expr::RelationalExpression(expr) => {
            element_type_of(&expr.left)
        }
        Expr::UnaryExpression(expr) => element_type_of(&expr.operand),
    }
}
