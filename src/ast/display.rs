//! Pretty-printing utilities for AST nodes.
//!
//! Types print the way a C compiler spells them in diagnostics
//! (`float *`, `int [4]`), which is also the spelling the launch
//! rewriter needs for `sizeof(T)`.

use std::fmt;

use super::{AssignOp, BinOp, Expr, FnDef, PostfixOp, Type, UnaryOp};
use crate::span::Spanned;

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base.join(" "))?;
        if self.pointers > 0 {
            write!(f, " {}", "*".repeat(self.pointers))?;
        }
        if !self.arrays.is_empty() && self.pointers == 0 {
            f.write_str(" ")?;
        }
        for extent in &self.arrays {
            write!(f, "[{}]", extent.as_deref().unwrap_or(""))?;
        }
        Ok(())
    }
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Comma => ",",
        }
    }
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
            UnaryOp::PreInc => "++",
            UnaryOp::PreDec => "--",
        }
    }
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Compound(BinOp::Add) => "+=",
            AssignOp::Compound(BinOp::Sub) => "-=",
            AssignOp::Compound(BinOp::Mul) => "*=",
            AssignOp::Compound(BinOp::Div) => "/=",
            AssignOp::Compound(BinOp::Rem) => "%=",
            AssignOp::Compound(BinOp::BitAnd) => "&=",
            AssignOp::Compound(BinOp::BitOr) => "|=",
            AssignOp::Compound(BinOp::BitXor) => "^=",
            AssignOp::Compound(BinOp::Shl) => "<<=",
            AssignOp::Compound(BinOp::Shr) => ">>=",
            AssignOp::Compound(_) => "?=",
        }
    }
}

fn join_args(args: &[Spanned<Expr>]) -> String {
    args.iter()
        .map(|a| a.node.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// C rendering of an expression. Parentheses appear only where the
/// source wrote them.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLit(n) => write!(f, "{}", n),
            Expr::FloatLit(text) => f.write_str(text),
            Expr::StrLit(text) => write!(f, "\"{}\"", text),
            Expr::CharLit(text) => write!(f, "'{}'", text),
            Expr::Ident(ident) => f.write_str(&ident.name),
            Expr::Member {
                base,
                member,
                arrow,
            } => {
                let sep = if *arrow { "->" } else { "." };
                write!(f, "{}{}{}", base.node, sep, member.node)
            }
            Expr::Index { base, index } => write!(f, "{}[{}]", base.node, index.node),
            Expr::Call { callee, args } => write!(f, "{}({})", callee.node, join_args(args)),
            Expr::Launch {
                kernel,
                config,
                args,
            } => write!(
                f,
                "{}<<<{}>>>({})",
                kernel.node,
                join_args(config),
                join_args(args)
            ),
            Expr::Construct { ty, args } => write!(f, "{}({})", ty.node, join_args(args)),
            Expr::Unary { op, operand } => write!(f, "{}{}", op.as_str(), operand.node),
            Expr::Postfix { op, operand } => {
                let op = match op {
                    PostfixOp::Inc => "++",
                    PostfixOp::Dec => "--",
                };
                write!(f, "{}{}", operand.node, op)
            }
            Expr::Binary {
                op: BinOp::Comma,
                lhs,
                rhs,
            } => write!(f, "{}, {}", lhs.node, rhs.node),
            Expr::Binary { op, lhs, rhs } => {
                write!(f, "{} {} {}", lhs.node, op.as_str(), rhs.node)
            }
            Expr::Assign { op, target, value } => {
                write!(f, "{} {} {}", target.node, op.as_str(), value.node)
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => write!(f, "{} ? {} : {}", cond.node, then_expr.node, else_expr.node),
            Expr::Cast { ty, expr } => write!(f, "({}){}", ty.node, expr.node),
            Expr::SizeofType(ty) => write!(f, "sizeof({})", ty.node),
            Expr::SizeofExpr(operand) => write!(f, "sizeof {}", operand.node),
            Expr::Paren(inner) => write!(f, "({})", inner.node),
            Expr::InitList(elems) => write!(f, "{{{}}}", join_args(elems)),
        }
    }
}

/// Format a function signature for display (diagnostics, `check` output).
pub fn format_fn_signature(func: &FnDef) -> String {
    let mut sig = String::new();
    let ret = func.return_ty.to_string();
    sig.push_str(&ret);
    if !ret.ends_with('*') {
        sig.push(' ');
    }
    sig.push_str(&func.name.node);

    sig.push('(');
    let mut params: Vec<String> = func
        .params
        .iter()
        .map(|p| {
            let ty = p.ty.to_string();
            if p.name.node.is_empty() {
                ty
            } else if ty.ends_with('*') {
                format!("{}{}", ty, p.name.node)
            } else {
                format!("{} {}", ty, p.name.node)
            }
        })
        .collect();
    if func.variadic {
        params.push("...".to_string());
    }
    sig.push_str(&params.join(", "));
    sig.push(')');

    sig
}
