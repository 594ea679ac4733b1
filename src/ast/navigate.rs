//! AST navigation: lookups by name and a read-only visitor that walks
//! statements and expressions in source order.

use super::{Block, Expr, File, FnDef, Ident, Initializer, Item, Stmt, VarDecl};
use crate::span::Spanned;

/// Find a function by name in a parsed file. Definitions win over
/// prototypes; among definitions the last one wins.
pub fn find_function<'a>(file: &'a File, name: &str) -> Option<&'a FnDef> {
    let mut found: Option<&FnDef> = None;
    for item in &file.items {
        if let Item::Function(func) = &item.node {
            if func.name.node == name && (func.body.is_some() || found.is_none()) {
                found = Some(func);
            }
        }
    }
    found
}

/// First identifier in a pre-order walk of `expr` that resolves to a
/// variable: `buf` in `(void **)&buf`.
pub fn find_decl_ref(expr: &Spanned<Expr>) -> Option<&Ident> {
    if let Expr::Ident(ident) = &expr.node {
        return ident.variable().map(|_| ident);
    }
    children(&expr.node).into_iter().find_map(find_decl_ref)
}

/// Direct sub-expressions of `expr` in source order.
pub fn children(expr: &Expr) -> Vec<&Spanned<Expr>> {
    match expr {
        Expr::IntLit(_)
        | Expr::FloatLit(_)
        | Expr::StrLit(_)
        | Expr::CharLit(_)
        | Expr::Ident(_)
        | Expr::SizeofType(_) => Vec::new(),
        Expr::Member { base, .. } => vec![base.as_ref()],
        Expr::Index { base, index } => vec![base.as_ref(), index.as_ref()],
        Expr::Call { callee, args } => {
            let mut out = vec![callee.as_ref()];
            out.extend(args.iter());
            out
        }
        Expr::Launch {
            kernel,
            config,
            args,
        } => {
            let mut out = vec![kernel.as_ref()];
            out.extend(config.iter());
            out.extend(args.iter());
            out
        }
        Expr::Construct { args, .. } | Expr::InitList(args) => args.iter().collect(),
        Expr::Unary { operand, .. }
        | Expr::Postfix { operand, .. }
        | Expr::SizeofExpr(operand)
        | Expr::Paren(operand) => vec![operand.as_ref()],
        Expr::Cast { expr, .. } => vec![expr.as_ref()],
        Expr::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
        Expr::Assign { target, value, .. } => vec![target.as_ref(), value.as_ref()],
        Expr::Conditional {
            cond,
            then_expr,
            else_expr,
        } => vec![cond.as_ref(), then_expr.as_ref(), else_expr.as_ref()],
    }
}

/// Read-only traversal hooks. Every hook has a no-op default.
pub trait Visitor {
    /// Called before an expression's children. Returning `false` skips
    /// the children and the matching `leave_expr`.
    fn enter_expr(&mut self, _expr: &Spanned<Expr>) -> bool {
        true
    }

    /// Called after all children of `expr` have been walked.
    fn leave_expr(&mut self, _expr: &Spanned<Expr>) {}

    /// Called for every declarator before its initializer is walked.
    fn visit_var(&mut self, _var: &VarDecl) {}
}

pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    for stmt in &block.stmts {
        walk_stmt(visitor, stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Spanned<Stmt>) {
    match &stmt.node {
        Stmt::Decl(group) => {
            for var in &group.vars {
                walk_var(visitor, var);
            }
        }
        Stmt::Expr(expr) | Stmt::Case(expr) => walk_expr(visitor, expr),
        Stmt::Block(block) => walk_block(visitor, block),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            walk_expr(visitor, cond);
            walk_stmt(visitor, then_branch);
            if let Some(else_branch) = else_branch {
                walk_stmt(visitor, else_branch);
            }
        }
        Stmt::While { cond, body } | Stmt::Switch { cond, body } => {
            walk_expr(visitor, cond);
            walk_stmt(visitor, body);
        }
        Stmt::DoWhile { body, cond } => {
            walk_stmt(visitor, body);
            walk_expr(visitor, cond);
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(init) = init {
                walk_stmt(visitor, init);
            }
            if let Some(cond) = cond {
                walk_expr(visitor, cond);
            }
            if let Some(step) = step {
                walk_expr(visitor, step);
            }
            walk_stmt(visitor, body);
        }
        Stmt::Return(value) => {
            if let Some(value) = value {
                walk_expr(visitor, value);
            }
        }
        Stmt::Default | Stmt::Break | Stmt::Continue | Stmt::Empty => {}
    }
}

pub fn walk_var<V: Visitor + ?Sized>(visitor: &mut V, var: &VarDecl) {
    visitor.visit_var(var);
    match &var.init {
        Some(Initializer::Assign(expr)) => walk_expr(visitor, expr),
        Some(Initializer::Construct(args)) => {
            for arg in &args.node {
                walk_expr(visitor, arg);
            }
        }
        None => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Spanned<Expr>) {
    if !visitor.enter_expr(expr) {
        return;
    }
    for child in children(&expr.node) {
        walk_expr(visitor, child);
    }
    visitor.leave_expr(expr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::resolve;

    fn parse_file(source: &str) -> File {
        crate::parse_source_silent(source, "test.cu").unwrap()
    }

    fn resolved(source: &str) -> File {
        let mut file = parse_file(source);
        resolve::resolve(&mut file);
        file
    }

    #[test]
    fn test_find_function_by_name() {
        let file = parse_file("void helper(int);\nint main() { return 0; }\nvoid helper(int x) {}\n");
        assert!(find_function(&file, "main").is_some());
        let helper = find_function(&file, "helper").expect("helper should exist");
        assert!(helper.body.is_some(), "definition preferred over prototype");
        assert!(find_function(&file, "nonexistent").is_none());
    }

    #[test]
    fn test_find_decl_ref_through_cast_and_address_of() {
        let file = resolved("void f() { float *buf; g((void **)&buf, N); }");
        let func = find_function(&file, "f").unwrap();
        let body = &func.body.as_ref().unwrap().node;
        let Stmt::Expr(call) = &body.stmts[1].node else {
            panic!("expected call statement");
        };
        let Expr::Call { args, .. } = &call.node else {
            panic!("expected call");
        };
        assert_eq!(find_decl_ref(&args[0]).map(|i| i.name.as_str()), Some("buf"));
        // `N` is not declared in this file, so it is not a variable.
        assert!(find_decl_ref(&args[1]).is_none());
    }

    #[test]
    fn test_visitor_order_children_first() {
        struct Order(Vec<String>);
        impl Visitor for Order {
            fn leave_expr(&mut self, expr: &Spanned<Expr>) {
                if let Expr::Ident(ident) = &expr.node {
                    self.0.push(ident.name.clone());
                }
            }
        }

        let file = parse_file("void f() { a = b + c; if (d) { e(f); } }");
        let func = find_function(&file, "f").unwrap();
        let mut order = Order(Vec::new());
        walk_block(&mut order, &func.body.as_ref().unwrap().node);
        assert_eq!(order.0, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_visitor_skip_children() {
        struct SkipCalls(usize);
        impl Visitor for SkipCalls {
            fn enter_expr(&mut self, expr: &Spanned<Expr>) -> bool {
                if matches!(expr.node, Expr::Call { .. }) {
                    self.0 += 1;
                    return false;
                }
                true
            }
        }

        let file = parse_file("void f() { g(h(1)); }");
        let func = find_function(&file, "f").unwrap();
        let mut skip = SkipCalls(0);
        walk_block(&mut skip, &func.body.as_ref().unwrap().node);
        assert_eq!(skip.0, 1);
    }
}
