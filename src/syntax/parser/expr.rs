use crate::ast::*;
use crate::lexeme::Lexeme;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    /// Full expression, including the comma operator.
    pub(super) fn parse_expr(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        if !self.enter_nesting() {
            self.exit_nesting();
            return Spanned::new(Expr::IntLit(0), start);
        }

        let mut lhs = self.parse_assignment();
        while self.eat(&Lexeme::Comma) {
            let rhs = self.parse_assignment();
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op: BinOp::Comma,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        self.exit_nesting();
        lhs
    }

    /// Assignment expression: the operand grammar of call arguments and
    /// initializers. Right-associative.
    pub(super) fn parse_assignment(&mut self) -> Spanned<Expr> {
        let target = self.parse_conditional();
        let op = match self.peek() {
            Lexeme::Eq => AssignOp::Assign,
            Lexeme::PlusEq => AssignOp::Compound(BinOp::Add),
            Lexeme::MinusEq => AssignOp::Compound(BinOp::Sub),
            Lexeme::StarEq => AssignOp::Compound(BinOp::Mul),
            Lexeme::SlashEq => AssignOp::Compound(BinOp::Div),
            Lexeme::PercentEq => AssignOp::Compound(BinOp::Rem),
            Lexeme::AmpEq => AssignOp::Compound(BinOp::BitAnd),
            Lexeme::PipeEq => AssignOp::Compound(BinOp::BitOr),
            Lexeme::CaretEq => AssignOp::Compound(BinOp::BitXor),
            Lexeme::ShlEq => AssignOp::Compound(BinOp::Shl),
            Lexeme::ShrEq => AssignOp::Compound(BinOp::Shr),
            _ => return target,
        };
        self.advance();

        let value = self.parse_assignment();
        let span = target.span.merge(value.span);
        Spanned::new(
            Expr::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    pub(super) fn parse_conditional(&mut self) -> Spanned<Expr> {
        // Binding power 3 stops before the comma operator.
        let cond = self.parse_binary(3);
        if !self.eat(&Lexeme::Question) {
            return cond;
        }
        let then_expr = self.parse_expr();
        self.expect(&Lexeme::Colon);
        let else_expr = self.parse_conditional();
        let span = cond.span.merge(else_expr.span);
        Spanned::new(
            Expr::Conditional {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        )
    }

    fn parse_binary(&mut self, min_bp: u8) -> Spanned<Expr> {
        let mut lhs = self.parse_unary();

        loop {
            let op = match self.peek() {
                Lexeme::PipePipe => BinOp::Or,
                Lexeme::AmpAmp => BinOp::And,
                Lexeme::Pipe => BinOp::BitOr,
                Lexeme::Caret => BinOp::BitXor,
                Lexeme::Amp => BinOp::BitAnd,
                Lexeme::EqEq => BinOp::Eq,
                Lexeme::Ne => BinOp::Ne,
                Lexeme::Lt => BinOp::Lt,
                Lexeme::Gt => BinOp::Gt,
                Lexeme::Le => BinOp::Le,
                Lexeme::Ge => BinOp::Ge,
                Lexeme::Shl => BinOp::Shl,
                Lexeme::Shr => BinOp::Shr,
                Lexeme::Plus => BinOp::Add,
                Lexeme::Minus => BinOp::Sub,
                Lexeme::Star => BinOp::Mul,
                Lexeme::Slash => BinOp::Div,
                Lexeme::Percent => BinOp::Rem,
                _ => break,
            };

            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }

            self.advance(); // consume operator
            let rhs = self.parse_binary(r_bp);
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        lhs
    }

    fn parse_unary(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let op = match self.peek().clone() {
            Lexeme::Minus => UnaryOp::Neg,
            Lexeme::Plus => UnaryOp::Plus,
            Lexeme::Bang => UnaryOp::Not,
            Lexeme::Tilde => UnaryOp::BitNot,
            Lexeme::Star => UnaryOp::Deref,
            Lexeme::Amp => UnaryOp::AddrOf,
            Lexeme::PlusPlus => UnaryOp::PreInc,
            Lexeme::MinusMinus => UnaryOp::PreDec,
            Lexeme::Sizeof => return self.parse_sizeof(),
            Lexeme::LParen if self.at_cast() => {
                self.advance();
                let ty = self.parse_type_name();
                self.expect(&Lexeme::RParen);
                let operand = self.parse_unary();
                let span = start.merge(operand.span);
                return Spanned::new(
                    Expr::Cast {
                        ty,
                        expr: Box::new(operand),
                    },
                    span,
                );
            }
            _ => {
                let primary = self.parse_primary();
                return self.parse_postfix(primary);
            }
        };
        self.advance();

        let operand = self.parse_unary();
        let span = start.merge(operand.span);
        Spanned::new(
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    /// True at a `(` that opens a type name rather than an expression.
    fn at_cast(&self) -> bool {
        if !self.at(&Lexeme::LParen) {
            return false;
        }
        match self.peek_at(1) {
            // `(dim3(1, 2))` is a parenthesized construction.
            Lexeme::Ident(name) if self.is_type_name(name) => {
                !matches!(self.peek_at(2), Lexeme::LParen)
            }
            // Unknown header type: `(T)x` or `(T *)p`.
            Lexeme::Ident(_) => {
                matches!(
                    (self.peek_at(2), self.peek_at(3)),
                    (
                        Lexeme::RParen,
                        Lexeme::Ident(_) | Lexeme::Integer(_) | Lexeme::FloatLit(_)
                    ) | (Lexeme::Star, Lexeme::RParen)
                )
            }
            tok => tok.starts_declaration(),
        }
    }

    fn parse_sizeof(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        self.expect(&Lexeme::Sizeof);
        if self.at_cast() {
            self.advance();
            let ty = self.parse_type_name();
            let end = self.expect(&Lexeme::RParen);
            return Spanned::new(Expr::SizeofType(ty), start.merge(end));
        }
        let operand = self.parse_unary();
        let span = start.merge(operand.span);
        Spanned::new(Expr::SizeofExpr(Box::new(operand)), span)
    }

    /// Postfix operators: calls, indexing, member access, `++`/`--` and
    /// kernel launches.
    fn parse_postfix(&mut self, mut expr: Spanned<Expr>) -> Spanned<Expr> {
        loop {
            match self.peek().clone() {
                Lexeme::LBracket => {
                    self.advance();
                    let index = self.parse_expr();
                    self.expect(&Lexeme::RBracket);
                    let span = expr.span.merge(self.prev_span());
                    expr = Spanned::new(
                        Expr::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                Lexeme::LParen => {
                    self.advance();
                    let args = self.parse_call_args();
                    let end = self.expect(&Lexeme::RParen);
                    let span = expr.span.merge(end);
                    expr = Spanned::new(
                        Expr::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                Lexeme::Dot | Lexeme::Arrow => {
                    let arrow = self.at(&Lexeme::Arrow);
                    self.advance();
                    let member = self.expect_ident();
                    let span = expr.span.merge(member.span);
                    expr = Spanned::new(
                        Expr::Member {
                            base: Box::new(expr),
                            member,
                            arrow,
                        },
                        span,
                    );
                }
                Lexeme::PlusPlus | Lexeme::MinusMinus => {
                    let op = if self.at(&Lexeme::PlusPlus) {
                        PostfixOp::Inc
                    } else {
                        PostfixOp::Dec
                    };
                    let end = self.current_span();
                    self.advance();
                    let span = expr.span.merge(end);
                    expr = Spanned::new(
                        Expr::Postfix {
                            op,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                Lexeme::LaunchOpen => {
                    self.advance();
                    let config = self.parse_call_args();
                    self.expect(&Lexeme::LaunchClose);
                    self.expect(&Lexeme::LParen);
                    let args = self.parse_call_args();
                    let end = self.expect(&Lexeme::RParen);
                    let span = expr.span.merge(end);
                    expr = Spanned::new(
                        Expr::Launch {
                            kernel: Box::new(expr),
                            config,
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Spanned<Expr> {
        let start = self.current_span();

        match self.peek().clone() {
            Lexeme::Integer(n) => {
                self.advance();
                Spanned::new(Expr::IntLit(n), start)
            }
            Lexeme::FloatLit(text) => {
                self.advance();
                Spanned::new(Expr::FloatLit(text), start)
            }
            Lexeme::Str(first) => {
                self.advance();
                // Adjacent literals concatenate: "a" "b"
                let mut text = first;
                while let Lexeme::Str(next) = self.peek().clone() {
                    self.advance();
                    text.push_str(&next);
                }
                Spanned::new(Expr::StrLit(text), start.merge(self.prev_span()))
            }
            Lexeme::CharLit(text) => {
                self.advance();
                Spanned::new(Expr::CharLit(text), start)
            }
            Lexeme::Ident(name)
                if self.is_type_name(&name) && matches!(self.peek_at(1), Lexeme::LParen) =>
            {
                self.advance();
                self.parse_construct(Spanned::new(Type::named(&name), start))
            }
            tok if tok.is_type_keyword() && matches!(self.peek_at(1), Lexeme::LParen) => {
                self.advance();
                self.parse_construct(Spanned::new(Type::named(tok.spelling()), start))
            }
            Lexeme::Ident(name) => {
                self.advance();
                Spanned::new(Expr::Ident(Ident::new(name)), start)
            }
            Lexeme::LParen => {
                self.advance();
                let inner = self.parse_expr();
                let end = self.expect(&Lexeme::RParen);
                Spanned::new(Expr::Paren(Box::new(inner)), start.merge(end))
            }
            Lexeme::LBrace => self.parse_init_list(),
            _ => {
                self.error_at_current(&format!(
                    "expected expression, found {}",
                    self.peek().description()
                ));
                Spanned::new(Expr::IntLit(0), start)
            }
        }
    }

    /// `T(args)` after the type name has been consumed.
    fn parse_construct(&mut self, ty: Spanned<Type>) -> Spanned<Expr> {
        self.expect(&Lexeme::LParen);
        let args = self.parse_call_args();
        let end = self.expect(&Lexeme::RParen);
        let span = ty.span.merge(end);
        Spanned::new(Expr::Construct { ty, args }, span)
    }

    /// Comma-separated assignment expressions, stopping before the closing
    /// token (`)` for calls, `>>>` for launch configurations).
    pub(super) fn parse_call_args(&mut self) -> Vec<Spanned<Expr>> {
        let mut args = Vec::new();
        if matches!(self.peek(), Lexeme::RParen | Lexeme::LaunchClose) {
            return args;
        }
        loop {
            args.push(self.parse_assignment());
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        args
    }

    /// `{ 1, 2, { 3 } }`
    pub(super) fn parse_init_list(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        self.expect(&Lexeme::LBrace);
        let mut elems = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let elem = if self.at(&Lexeme::LBrace) {
                self.parse_init_list()
            } else {
                self.parse_assignment()
            };
            elems.push(elem);
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        let end = self.expect(&Lexeme::RBrace);
        Spanned::new(Expr::InitList(elems), start.merge(end))
    }
}
