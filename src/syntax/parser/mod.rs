mod expr;
mod items;
mod stmts;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use crate::ast::*;
use crate::cuda;
use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

const MAX_NESTING_DEPTH: u32 = 256;

pub(crate) struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    depth: u32,
    next_decl: u32,
    /// Names introduced by `typedef` in this file.
    typedefs: HashSet<String>,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            depth: 0,
            next_decl: 0,
            typedefs: HashSet::new(),
        }
    }

    pub(crate) fn parse_file(mut self) -> Result<File, Vec<Diagnostic>> {
        let mut items = Vec::new();
        while !self.at(&Lexeme::Eof) {
            let before = self.pos;
            let start = self.current_span();
            let item = self.parse_item();
            let span = start.merge(self.prev_span());
            items.push(Spanned::new(item, span));
            if self.pos == before {
                // No progress: drop the offending token so the loop terminates.
                self.advance();
            }
        }

        if !self.diagnostics.is_empty() {
            return Err(self.diagnostics);
        }
        Ok(File {
            items,
            decl_count: self.next_decl,
        })
    }

    fn enter_nesting(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.error_with_help(
                "nesting depth exceeded (maximum 256 levels)",
                "simplify the program by extracting deeply nested code into functions",
            );
            return false;
        }
        true
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    fn fresh_decl_id(&mut self) -> DeclId {
        let id = DeclId(self.next_decl);
        self.next_decl += 1;
        id
    }

    /// Identifier that names a type: a typedef from this file or a
    /// well-known CUDA header type.
    fn is_type_name(&self, name: &str) -> bool {
        self.typedefs.contains(name) || cuda::is_header_type_name(name)
    }

    /// True if the current statement is a declaration rather than an
    /// expression. A header type name followed by `(` is a construction
    /// expression (`dim3(1, 2)`), not a declaration. Two identifiers in a
    /// row can only be `Type name`, so an unknown header type is accepted
    /// in that position.
    fn at_declaration(&self) -> bool {
        match self.peek() {
            Lexeme::Ident(name) if self.is_type_name(name) => matches!(
                self.peek_at(1),
                Lexeme::Ident(_)
                    | Lexeme::Star
                    | Lexeme::Amp
                    | Lexeme::Const
                    | Lexeme::Volatile
                    | Lexeme::Restrict
            ),
            Lexeme::Ident(_) => matches!(self.peek_at(1), Lexeme::Ident(_)),
            tok => tok.starts_declaration(),
        }
    }

    /// Skip tokens until just past the next `;` or up to a `}` at the
    /// current brace depth.
    fn synchronize(&mut self) {
        let mut depth = 0u32;
        while !self.at(&Lexeme::Eof) {
            match self.peek() {
                Lexeme::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                Lexeme::LBrace => depth += 1,
                Lexeme::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // --- Utility methods ---

    fn peek(&self) -> &Lexeme {
        &self.tokens[self.pos].node
    }

    fn peek_at(&self, offset: usize) -> &Lexeme {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].node
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    fn advance(&mut self) -> &Spanned<Lexeme> {
        let tok = &self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, token: &Lexeme) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn eat(&mut self, token: &Lexeme) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Lexeme) -> Span {
        if self.at(token) {
            let span = self.current_span();
            self.advance();
            span
        } else {
            self.error_at_current(&format!(
                "expected {}, found {}",
                token.description(),
                self.peek().description()
            ));
            self.current_span()
        }
    }

    fn expect_ident(&mut self) -> Spanned<String> {
        if let Lexeme::Ident(name) = self.peek().clone() {
            let span = self.current_span();
            self.advance();
            Spanned::new(name, span)
        } else {
            self.error_at_current(&format!(
                "expected identifier, found {}",
                self.peek().description()
            ));
            Spanned::new("_error_".to_string(), self.current_span())
        }
    }

    fn try_ident(&mut self) -> Option<Spanned<String>> {
        if let Lexeme::Ident(name) = self.peek().clone() {
            let span = self.current_span();
            self.advance();
            Some(Spanned::new(name, span))
        } else {
            None
        }
    }

    fn error_at_current(&mut self, msg: &str) {
        self.diagnostics
            .push(Diagnostic::error(msg.to_string(), self.current_span()));
    }

    fn error_with_help(&mut self, msg: &str, help: &str) {
        self.diagnostics.push(
            Diagnostic::error(msg.to_string(), self.current_span()).with_help(help.to_string()),
        );
    }
}
