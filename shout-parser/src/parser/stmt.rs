use super::*;
use crate::ast::{
    Assignable, Assignment, Block, FunctionDef, IfStatement, IndexedIdentifier, Loop, Stmt,
    VarDeclaration,
};

impl<'a> Parser<'a> {
    /// Parses a statement.
    /// Dispatch only looks at the current token, and at the next one for a leading identifier.
    pub fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let token = match self.current() {
            Some(token) => token,
            None => return Err(self.unexpected("statement")),
        };

        match token.kind {
            TokenKind::Keyword => match token.lexeme.as_str() {
                "make" => self.parse_var_declaration(),
                "shout" => self.parse_output_stmt(),
                "return" => self.parse_return_stmt(),
                "call" => self.parse_function_call_stmt(),
                "if" => self.parse_if_stmt(),
                "check" => self.parse_loop_stmt(),
                "def" => self.parse_function_def(),
                _ => Err(SyntaxError::new(format!(
                    "unexpected keyword: {}",
                    token.lexeme
                ))),
            },
            TokenKind::Identifier => {
                // Expression statements are not allowed, so a leading identifier must start an assignment.
                match self.peek() {
                    Some(next)
                        if next.is(TokenKind::Operator, Some("="))
                            || next.kind == TokenKind::LBracket =>
                    {
                        self.parse_assignment()
                    }
                    Some(next) => Err(SyntaxError::new(format!(
                        "unexpected token after identifier '{}': {}",
                        token.lexeme,
                        describe(next)
                    ))),
                    None => Err(SyntaxError::new(format!(
                        "unexpected end of input after identifier '{}'",
                        token.lexeme
                    ))),
                }
            }
            TokenKind::Semicolon => {
                self.expect(TokenKind::Semicolon, None)?;
                Ok(Stmt::EmptyStatement(";".to_string()))
            }
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?.stmts)),
            _ => Err(SyntaxError::new(format!(
                "unexpected token: {}",
                describe(token)
            ))),
        }
    }

    /// Parses a `{ ... }` statement list.
    pub fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        self.expect(TokenKind::LBrace, None)?;

        let mut stmts = Vec::new();
        while self.current().is_some() && !self.check(TokenKind::RBrace, None) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace, None)?;

        Ok(Block { stmts })
    }

    pub(super) fn parse_identifier(&mut self) -> Result<String, SyntaxError> {
        Ok(self.expect(TokenKind::Identifier, None)?.lexeme.clone())
    }

    fn parse_var_declaration(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(TokenKind::Keyword, Some("make"))?;
        let identifier = self.parse_identifier()?;
        self.expect(TokenKind::Operator, Some("="))?;
        let expression = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, None)?;
        Ok(Stmt::VarDeclaration(VarDeclaration {
            identifier,
            expression,
        }))
    }

    fn parse_assignment(&mut self) -> Result<Stmt, SyntaxError> {
        let identifier = self.parse_identifier()?;
        let assignable = if self.eat(TokenKind::LBracket, None) {
            let index = self.parse_expr()?;
            self.expect(TokenKind::RBracket, None)?;
            Assignable::IndexedIdentifier(IndexedIdentifier {
                identifier,
                index: Box::new(index),
            })
        } else {
            Assignable::Identifier(identifier)
        };
        self.expect(TokenKind::Operator, Some("="))?;
        let expression = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, None)?;
        Ok(Stmt::Assignment(Assignment {
            assignable,
            expression,
        }))
    }

    fn parse_output_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(TokenKind::Keyword, Some("shout"))?;
        self.expect(TokenKind::LPar, None)?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RPar, None)?;
        self.expect(TokenKind::Semicolon, None)?;
        Ok(Stmt::Output(expr))
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(TokenKind::Keyword, Some("return"))?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, None)?;
        Ok(Stmt::Return(expr))
    }

    fn parse_function_call_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(TokenKind::Keyword, Some("call"))?;
        let name = self.parse_identifier()?;
        let call = self.parse_call_args(name)?;
        self.expect(TokenKind::Semicolon, None)?;
        Ok(Stmt::FunctionCallStatement(call))
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(TokenKind::Keyword, Some("if"))?;
        self.expect(TokenKind::LPar, None)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RPar, None)?;
        let then = self.parse_block()?;
        let else_block = if self.eat(TokenKind::Keyword, Some("else")) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::IfStatement(IfStatement {
            condition,
            then,
            else_block,
        }))
    }

    fn parse_loop_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(TokenKind::Keyword, Some("check"))?;
        self.expect(TokenKind::LPar, None)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RPar, None)?;
        let block = self.parse_block()?;
        Ok(Stmt::Loop(Loop { condition, block }))
    }

    fn parse_function_def(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(TokenKind::Keyword, Some("def"))?;
        let name = self.parse_identifier()?;
        self.expect(TokenKind::LPar, None)?;
        let mut parameters = Vec::new();
        if self.check(TokenKind::Identifier, None) {
            parameters.push(self.parse_identifier()?);
            while self.eat(TokenKind::Comma, None) {
                parameters.push(self.parse_identifier()?);
            }
        }
        self.expect(TokenKind::RPar, None)?;
        let body = self.parse_block()?;
        Ok(Stmt::FunctionDef(FunctionDef {
            name,
            parameters,
            body,
        }))
    }
}
