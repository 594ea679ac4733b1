use crate::ast::*;
use crate::lexeme::Lexeme;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    pub(super) fn parse_block(&mut self) -> Spanned<Block> {
        let start = self.current_span();
        self.expect(&Lexeme::LBrace);
        if !self.enter_nesting() {
            self.exit_nesting();
            self.synchronize_block();
            return Spanned::new(Block { stmts: Vec::new() }, start.merge(self.prev_span()));
        }

        let mut stmts = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let before = self.pos;
            stmts.push(self.parse_stmt());
            if self.pos == before {
                self.advance();
            }
        }
        self.exit_nesting();

        let end = self.expect(&Lexeme::RBrace);
        Spanned::new(Block { stmts }, start.merge(end))
    }

    /// Skip to the brace closing the current block.
    fn synchronize_block(&mut self) {
        let mut depth = 1u32;
        while !self.at(&Lexeme::Eof) {
            match self.peek() {
                Lexeme::LBrace => depth += 1,
                Lexeme::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_stmt(&mut self) -> Spanned<Stmt> {
        let start = self.current_span();
        let errors_before = self.diagnostics.len();
        let stmt = match self.peek().clone() {
            Lexeme::LBrace => {
                let block = self.parse_block();
                return Spanned::new(Stmt::Block(block.node), block.span);
            }
            Lexeme::Semicolon => {
                self.advance();
                Stmt::Empty
            }
            Lexeme::If => self.parse_if(),
            Lexeme::While => {
                self.advance();
                let cond = self.parse_paren_cond();
                let body = Box::new(self.parse_stmt());
                Stmt::While { cond, body }
            }
            Lexeme::Do => {
                self.advance();
                let body = Box::new(self.parse_stmt());
                self.expect(&Lexeme::While);
                let cond = self.parse_paren_cond();
                self.end_simple_stmt(errors_before);
                Stmt::DoWhile { body, cond }
            }
            Lexeme::For => self.parse_for(),
            Lexeme::Switch => {
                self.advance();
                let cond = self.parse_paren_cond();
                let body = Box::new(self.parse_stmt());
                Stmt::Switch { cond, body }
            }
            Lexeme::Case => {
                self.advance();
                let value = self.parse_conditional();
                self.expect(&Lexeme::Colon);
                Stmt::Case(value)
            }
            Lexeme::Default => {
                self.advance();
                self.expect(&Lexeme::Colon);
                Stmt::Default
            }
            Lexeme::Return => {
                self.advance();
                let value = if self.at(&Lexeme::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                self.end_simple_stmt(errors_before);
                Stmt::Return(value)
            }
            Lexeme::Break => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Break
            }
            Lexeme::Continue => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Continue
            }
            _ if self.at_declaration() => {
                let group = self.parse_local_decl();
                self.end_simple_stmt(errors_before);
                Stmt::Decl(group)
            }
            _ => {
                let expr = self.parse_expr();
                self.end_simple_stmt(errors_before);
                Stmt::Expr(expr)
            }
        };
        Spanned::new(stmt, start.merge(self.prev_span()))
    }

    /// Consume the terminating `;`, or skip past it after a parse error
    /// inside the statement.
    fn end_simple_stmt(&mut self, errors_before: usize) {
        if self.diagnostics.len() > errors_before && !self.at(&Lexeme::Semicolon) {
            self.synchronize();
        } else {
            self.expect(&Lexeme::Semicolon);
        }
    }

    fn parse_paren_cond(&mut self) -> Spanned<Expr> {
        self.expect(&Lexeme::LParen);
        let cond = self.parse_expr();
        self.expect(&Lexeme::RParen);
        cond
    }

    fn parse_if(&mut self) -> Stmt {
        self.expect(&Lexeme::If);
        let cond = self.parse_paren_cond();
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.eat(&Lexeme::Else) {
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        }
    }

    fn parse_for(&mut self) -> Stmt {
        self.expect(&Lexeme::For);
        self.expect(&Lexeme::LParen);

        let init_start = self.current_span();
        let init = if self.eat(&Lexeme::Semicolon) {
            None
        } else if self.at_declaration() {
            let group = self.parse_local_decl();
            self.expect(&Lexeme::Semicolon);
            let span = init_start.merge(self.prev_span());
            Some(Box::new(Spanned::new(Stmt::Decl(group), span)))
        } else {
            let expr = self.parse_expr();
            self.expect(&Lexeme::Semicolon);
            let span = expr.span;
            Some(Box::new(Spanned::new(Stmt::Expr(expr), span)))
        };

        let cond = if self.at(&Lexeme::Semicolon) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&Lexeme::Semicolon);

        let step = if self.at(&Lexeme::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&Lexeme::RParen);

        let body = Box::new(self.parse_stmt());
        Stmt::For {
            init,
            cond,
            step,
            body,
        }
    }
}
