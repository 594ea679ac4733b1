//! Scoped name resolution.
//!
//! Binds every identifier reference in a parsed file to the declaration
//! it denotes, so the rewriters can match on resolved symbols instead of
//! on spelling. Names nobody in the file declares fall back to CUDA
//! built-ins and then to `External`.

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::cuda::Builtin;
use crate::span::{Span, Spanned};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Global,
    Param,
    Local,
    Field,
    Enumerator,
}

/// What the rewriters need to know about one declaration.
#[derive(Clone, Debug)]
pub struct DeclInfo {
    pub name: String,
    pub kind: DeclKind,
    pub ty: Type,
    pub type_span: Span,
    pub shares_specifiers: bool,
    /// Span of the declared name.
    pub span: Span,
}

/// Declarations of one file, keyed by identity.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    decls: HashMap<DeclId, DeclInfo>,
}

impl SymbolTable {
    pub fn get(&self, id: DeclId) -> Option<&DeclInfo> {
        self.decls.get(&id)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    fn insert_var(&mut self, var: &VarDecl, kind: DeclKind) {
        self.decls.insert(
            var.id,
            DeclInfo {
                name: var.name.node.clone(),
                kind,
                ty: var.ty.clone(),
                type_span: var.type_span,
                shares_specifiers: var.shares_specifiers,
                span: var.name.span,
            },
        );
    }
}

#[derive(Clone, Copy)]
enum Binding {
    Variable(DeclId),
    Enumerator(DeclId),
    Function,
}

struct Resolver {
    scopes: Vec<HashMap<String, Binding>>,
    table: SymbolTable,
}

/// Resolve all identifier references in `file` in place and return the
/// declarations they point at.
pub fn resolve(file: &mut File) -> SymbolTable {
    let functions: HashSet<String> = file
        .items
        .iter()
        .filter_map(|item| match &item.node {
            Item::Function(func) => Some(func.name.node.clone()),
            _ => None,
        })
        .collect();

    let mut resolver = Resolver {
        scopes: vec![HashMap::new()],
        table: SymbolTable::default(),
    };
    for name in functions {
        resolver.bind(name, Binding::Function);
    }
    for item in &mut file.items {
        resolver.resolve_item(&mut item.node);
    }
    resolver.table
}

impl Resolver {
    fn bind(&mut self, name: String, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, binding);
        }
    }

    fn lookup(&self, name: &str) -> Resolution {
        for scope in self.scopes.iter().rev() {
            if let Some(binding) = scope.get(name) {
                return match *binding {
                    Binding::Variable(id) => Resolution::Variable(id),
                    Binding::Enumerator(id) => Resolution::Enumerator(id),
                    Binding::Function => Resolution::Function,
                };
            }
        }
        match Builtin::from_name(name) {
            Some(builtin) => Resolution::Builtin(builtin),
            None => Resolution::External,
        }
    }

    fn with_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }

    fn resolve_item(&mut self, item: &mut Item) {
        match item {
            Item::Function(func) => self.resolve_function(func),
            Item::Vars(group) => self.declare_vars(&mut group.vars, DeclKind::Global),
            Item::Record(record) => {
                for field in &record.fields {
                    self.table.insert_var(field, DeclKind::Field);
                }
                self.declare_vars(&mut record.vars, DeclKind::Global);
            }
            Item::Enum(enum_def) => {
                self.declare_enumerators(&mut enum_def.variants);
                self.declare_vars(&mut enum_def.vars, DeclKind::Global);
            }
            Item::Directive(_) | Item::Typedef(_) | Item::Empty => {}
        }
    }

    fn declare_enumerators(&mut self, variants: &mut [Enumerator]) {
        for variant in variants {
            if let Some(value) = &mut variant.value {
                self.resolve_expr(value);
            }
            self.table.decls.insert(
                variant.id,
                DeclInfo {
                    name: variant.name.node.clone(),
                    kind: DeclKind::Enumerator,
                    ty: Type::named("int"),
                    type_span: Span::point(variant.name.span.file_id, variant.name.span.start),
                    shares_specifiers: false,
                    span: variant.name.span,
                },
            );
            self.bind(variant.name.node.clone(), Binding::Enumerator(variant.id));
        }
    }

    fn resolve_function(&mut self, func: &mut FnDef) {
        self.with_scope(|r| {
            for param in &func.params {
                if param.name.node.is_empty() {
                    continue;
                }
                r.table.insert_var(param, DeclKind::Param);
                r.bind(param.name.node.clone(), Binding::Variable(param.id));
            }
            if let Some(body) = &mut func.body {
                r.resolve_block(&mut body.node);
            }
        });
    }

    /// A declarator is in scope from the end of its own declarator on, so
    /// its initializer already sees it.
    fn declare_vars(&mut self, vars: &mut [VarDecl], kind: DeclKind) {
        for var in vars {
            self.table.insert_var(var, kind);
            self.bind(var.name.node.clone(), Binding::Variable(var.id));
            match &mut var.init {
                Some(Initializer::Assign(expr)) => self.resolve_expr(expr),
                Some(Initializer::Construct(args)) => {
                    for arg in &mut args.node {
                        self.resolve_expr(arg);
                    }
                }
                None => {}
            }
        }
    }

    fn resolve_block(&mut self, block: &mut Block) {
        self.with_scope(|r| {
            for stmt in &mut block.stmts {
                r.resolve_stmt(stmt);
            }
        });
    }

    fn resolve_stmt(&mut self, stmt: &mut Spanned<Stmt>) {
        match &mut stmt.node {
            Stmt::Decl(group) => self.declare_vars(&mut group.vars, DeclKind::Local),
            Stmt::Expr(expr) | Stmt::Case(expr) => self.resolve_expr(expr),
            Stmt::Block(block) => self.resolve_block(block),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(cond);
                self.resolve_branch(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_branch(else_branch);
                }
            }
            Stmt::While { cond, body } | Stmt::Switch { cond, body } => {
                self.resolve_expr(cond);
                self.resolve_branch(body);
            }
            Stmt::DoWhile { body, cond } => {
                self.resolve_branch(body);
                self.resolve_expr(cond);
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.with_scope(|r| {
                if let Some(init) = init {
                    r.resolve_stmt(init);
                }
                if let Some(cond) = cond {
                    r.resolve_expr(cond);
                }
                if let Some(step) = step {
                    r.resolve_expr(step);
                }
                r.resolve_branch(body);
            }),
            Stmt::Return(Some(value)) => self.resolve_expr(value),
            Stmt::Return(None) | Stmt::Default | Stmt::Break | Stmt::Continue | Stmt::Empty => {}
        }
    }

    /// A sub-statement is its own scope even without braces.
    fn resolve_branch(&mut self, stmt: &mut Spanned<Stmt>) {
        self.with_scope(|r| r.resolve_stmt(stmt));
    }

    fn resolve_expr(&mut self, expr: &mut Spanned<Expr>) {
        match &mut expr.node {
            Expr::Ident(ident) => ident.resolution = self.lookup(&ident.name),
            Expr::IntLit(_)
            | Expr::FloatLit(_)
            | Expr::StrLit(_)
            | Expr::CharLit(_)
            | Expr::SizeofType(_) => {}
            // The member name is a field, not a scoped identifier.
            Expr::Member { base, .. } => self.resolve_expr(base),
            Expr::Index { base, index } => {
                self.resolve_expr(base);
                self.resolve_expr(index);
            }
            Expr::Call { callee, args } => {
                self.resolve_expr(callee);
                self.resolve_all(args);
            }
            Expr::Launch {
                kernel,
                config,
                args,
            } => {
                self.resolve_expr(kernel);
                self.resolve_all(config);
                self.resolve_all(args);
            }
            Expr::Construct { args, .. } | Expr::InitList(args) => self.resolve_all(args),
            Expr::Unary { operand, .. }
            | Expr::Postfix { operand, .. }
            | Expr::SizeofExpr(operand)
            | Expr::Paren(operand) => self.resolve_expr(operand),
            Expr::Cast { expr: inner, .. } => self.resolve_expr(inner),
            Expr::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
            }
            Expr::Assign { target, value, .. } => {
                self.resolve_expr(target);
                self.resolve_expr(value);
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.resolve_expr(cond);
                self.resolve_expr(then_expr);
                self.resolve_expr(else_expr);
            }
        }
    }

    fn resolve_all(&mut self, exprs: &mut [Spanned<Expr>]) {
        for expr in exprs {
            self.resolve_expr(expr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::navigate::{find_function, walk_block, Visitor};
    use crate::cuda::BuiltinVar;

    fn resolved(source: &str) -> (File, SymbolTable) {
        let mut file = crate::parse_source_silent(source, "test.cu").unwrap();
        let table = resolve(&mut file);
        (file, table)
    }

    /// Resolutions of every identifier in `func`'s body, in source order.
    fn resolutions(file: &File, func: &str) -> Vec<(String, Resolution)> {
        struct Collect(Vec<(String, Resolution)>);
        impl Visitor for Collect {
            fn enter_expr(&mut self, expr: &Spanned<Expr>) -> bool {
                if let Expr::Ident(ident) = &expr.node {
                    self.0.push((ident.name.clone(), ident.resolution));
                }
                true
            }
        }
        let func = find_function(file, func).unwrap();
        let mut collect = Collect(Vec::new());
        walk_block(&mut collect, &func.body.as_ref().unwrap().node);
        collect.0
    }

    #[test]
    fn test_builtins_resolve_unless_shadowed() {
        let (file, _) = resolved(
            "__global__ void k(float *a) { a[threadIdx.x] = 0; }\n\
             void h() { int threadIdx; threadIdx = 1; }\n",
        );
        let k = resolutions(&file, "k");
        assert!(matches!(k[0].1, Resolution::Variable(_)));
        assert_eq!(
            k[1].1,
            Resolution::Builtin(Builtin::Var(BuiltinVar::ThreadIdx))
        );

        let h = resolutions(&file, "h");
        assert!(matches!(h[0].1, Resolution::Variable(_)));
    }

    #[test]
    fn test_scopes_give_distinct_identities() {
        let (file, table) = resolved(
            "void f() { int x; { float *x; x = 0; } x = 1; }\n",
        );
        let refs = resolutions(&file, "f");
        let (Resolution::Variable(inner), Resolution::Variable(outer)) = (refs[0].1, refs[1].1)
        else {
            panic!("both references should resolve to variables: {:?}", refs);
        };
        assert_ne!(inner, outer);
        assert_eq!(table.get(inner).unwrap().ty.to_string(), "float *");
        assert_eq!(table.get(outer).unwrap().ty.to_string(), "int");
        assert_eq!(table.get(outer).unwrap().kind, DeclKind::Local);
    }

    #[test]
    fn test_functions_enumerators_and_externals() {
        let (file, _) = resolved(
            "enum Mode { FAST, SLOW };\n\
             void g();\n\
             void f() { g(FAST, cudaMemcpyHostToDevice); }\n",
        );
        let refs = resolutions(&file, "f");
        assert_eq!(refs[0].1, Resolution::Function);
        assert!(matches!(refs[1].1, Resolution::Enumerator(_)));
        assert_eq!(refs[2].1, Resolution::External);
    }

    #[test]
    fn test_for_scope_and_params() {
        let (file, table) = resolved(
            "void f(int n) { for (int i = 0; i < n; i++) {} }\n",
        );
        let refs = resolutions(&file, "f");
        let names: Vec<&str> = refs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["i", "n", "i"]);
        let Resolution::Variable(n) = refs[1].1 else {
            panic!("n should be a variable");
        };
        assert_eq!(table.get(n).unwrap().kind, DeclKind::Param);
    }

    #[test]
    fn test_declarator_type_spans() {
        let source = "float *a, *b;\nint c;\n";
        let (_, table) = resolved(source);
        let a = table.get(DeclId(0)).unwrap();
        let b = table.get(DeclId(1)).unwrap();
        let c = table.get(DeclId(2)).unwrap();
        assert_eq!(a.type_span.text(source), "float *");
        assert!(a.shares_specifiers);
        assert!(b.shares_specifiers);
        assert!(!c.shares_specifiers);
    }
}
