use crate::lexer::Lexer;

use super::*;

fn parse(source: &str) -> File {
    let (tokens, lex_errors) = Lexer::new(source, 0).tokenize();
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
    match Parser::new(tokens).parse_file() {
        Ok(file) => file,
        Err(errors) => panic!("parse errors: {:?}", errors),
    }
}

fn parse_err(source: &str) -> Vec<Diagnostic> {
    let (tokens, _) = Lexer::new(source, 0).tokenize();
    match Parser::new(tokens).parse_file() {
        Ok(_) => panic!("expected parse errors for {:?}", source),
        Err(errors) => errors,
    }
}

fn function<'a>(file: &'a File, name: &str) -> &'a FnDef {
    crate::ast::navigate::find_function(file, name).expect("function should exist")
}

fn body_stmts<'a>(file: &'a File, name: &str) -> &'a [Spanned<Stmt>] {
    &function(file, name)
        .body
        .as_ref()
        .expect("function has a body")
        .node
        .stmts
}

fn expr_stmt(stmt: &Spanned<Stmt>) -> &Spanned<Expr> {
    match &stmt.node {
        Stmt::Expr(e) => e,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

// --- Items ---

#[test]
fn test_kernel_definition() {
    let file = parse("__global__ void add(float *a, const float *b, int n) { }\n");
    let add = function(&file, "add");
    assert_eq!(add.cuda, vec![CudaAttr::Global]);
    assert!(add.runs_on_device());
    assert_eq!(add.params.len(), 3);
    assert_eq!(add.params[1].ty.to_string(), "const float *");
    assert_eq!(add.params[2].ty.to_string(), "int");
}

#[test]
fn test_prototype_and_directives() {
    let file = parse("#include <cuda.h>\n__device__ float sq(float);\nint main(void) { return 0; }\n");
    assert!(matches!(&file.items[0].node, Item::Directive(d) if d == "#include <cuda.h>"));
    let sq = function(&file, "sq");
    assert!(sq.body.is_none());
    assert_eq!(sq.params.len(), 1);
    assert!(sq.params[0].name.node.is_empty());
    assert!(function(&file, "main").params.is_empty());
}

#[test]
fn test_multi_declarator_type_spans() {
    let source = "static float *a, b, **c;\n";
    let file = parse(source);
    let Item::Vars(group) = &file.items[0].node else {
        panic!("expected variable group");
    };
    assert_eq!(group.storage, vec![Storage::Static]);
    let texts: Vec<&str> = group.vars.iter().map(|v| v.type_span.text(source)).collect();
    assert_eq!(texts, vec!["float *", "float", "float *a, b, **"]);
    let shares: Vec<bool> = group.vars.iter().map(|v| v.shares_specifiers).collect();
    assert_eq!(shares, vec![true, true, true]);
    assert_eq!(group.vars[2].ty.pointers, 2);
}

#[test]
fn test_struct_enum_typedef() {
    let file = parse(
        "typedef struct { float x, y; } Point;\n\
         enum Mode { FAST = 1, SLOW };\n\
         Point origin;\n",
    );
    assert!(matches!(&file.items[0].node, Item::Typedef(_)));
    let Item::Enum(mode) = &file.items[1].node else {
        panic!("expected enum");
    };
    assert_eq!(mode.variants.len(), 2);
    assert!(mode.variants[0].value.is_some());
    let Item::Vars(group) = &file.items[2].node else {
        panic!("typedef name should start a declaration");
    };
    assert_eq!(group.vars[0].ty.to_string(), "Point");
}

#[test]
fn test_decl_ids_are_unique() {
    let file = parse("int a;\nvoid f(int b) { int c; { int a; } }\n");
    assert!(file.decl_count >= 4);
}

// --- Statements ---

#[test]
fn test_control_flow() {
    let file = parse(
        "void f(int n) {\n\
           for (int i = 0; i < n; i++) { if (i % 2) continue; else break; }\n\
           while (n > 0) n--;\n\
           do { n++; } while (n < 10);\n\
           switch (n) { case 1: n = 2; break; default: ; }\n\
           return;\n\
         }\n",
    );
    let stmts = body_stmts(&file, "f");
    assert!(matches!(stmts[0].node, Stmt::For { .. }));
    assert!(matches!(stmts[1].node, Stmt::While { .. }));
    assert!(matches!(stmts[2].node, Stmt::DoWhile { .. }));
    assert!(matches!(stmts[3].node, Stmt::Switch { .. }));
    assert!(matches!(stmts[4].node, Stmt::Return(None)));
}

#[test]
fn test_header_types_declare_and_construct() {
    let file = parse("void f() { dim3 grid(2, 1); dim3 block = dim3(128); size_t n = 4; }\n");
    let stmts = body_stmts(&file, "f");
    let Stmt::Decl(grid) = &stmts[0].node else {
        panic!("expected declaration");
    };
    assert!(matches!(
        &grid.vars[0].init,
        Some(Initializer::Construct(args)) if args.node.len() == 2
    ));
    let Stmt::Decl(block) = &stmts[1].node else {
        panic!("expected declaration");
    };
    assert!(matches!(
        &block.vars[0].init,
        Some(Initializer::Assign(e)) if matches!(e.node, Expr::Construct { .. })
    ));
    assert!(matches!(stmts[2].node, Stmt::Decl(_)));
}

#[test]
fn test_unknown_header_type_declaration() {
    let file = parse("void f() { curandState state; }\n");
    let stmts = body_stmts(&file, "f");
    let Stmt::Decl(group) = &stmts[0].node else {
        panic!("two identifiers in a row should declare");
    };
    assert_eq!(group.vars[0].ty.to_string(), "curandState");
}

// --- Expressions ---

#[test]
fn test_launch_expression() {
    let source = "void f() { add<<<dim3(4), 64>>>(a, b, n); }\n";
    let file = parse(source);
    let stmts = body_stmts(&file, "f");
    let launch = expr_stmt(&stmts[0]);
    let Expr::Launch {
        kernel,
        config,
        args,
    } = &launch.node
    else {
        panic!("expected launch");
    };
    assert!(matches!(&kernel.node, Expr::Ident(i) if i.name == "add"));
    assert_eq!(config.len(), 2);
    assert_eq!(args.len(), 3);
    assert_eq!(launch.span.text(source), "add<<<dim3(4), 64>>>(a, b, n)");
}

#[test]
fn test_precedence() {
    let file = parse("void f() { x = a + b * c == d && e; }\n");
    let stmts = body_stmts(&file, "f");
    let Expr::Assign { value, .. } = &expr_stmt(&stmts[0]).node else {
        panic!("expected assignment");
    };
    let Expr::Binary { op, lhs, .. } = &value.node else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinOp::And);
    let Expr::Binary { op, lhs, .. } = &lhs.node else {
        panic!("expected equality");
    };
    assert_eq!(*op, BinOp::Eq);
    assert!(matches!(&lhs.node, Expr::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_casts_and_sizeof() {
    let source = "void f() { cudaMalloc((void **)&d_a, N * sizeof(float)); }\n";
    let file = parse(source);
    let stmts = body_stmts(&file, "f");
    let Expr::Call { args, .. } = &expr_stmt(&stmts[0]).node else {
        panic!("expected call");
    };
    let Expr::Cast { ty, expr } = &args[0].node else {
        panic!("expected cast");
    };
    assert_eq!(ty.node.to_string(), "void **");
    assert!(matches!(
        &expr.node,
        Expr::Unary {
            op: UnaryOp::AddrOf,
            ..
        }
    ));
    assert_eq!(args[1].span.text(source), "N * sizeof(float)");
}

#[test]
fn test_member_access_and_postfix() {
    let file = parse("void f() { i = blockIdx.x * blockDim.x + threadIdx.x; p->n++; }\n");
    let stmts = body_stmts(&file, "f");
    assert_eq!(
        expr_stmt(&stmts[0]).node.to_string(),
        "i = blockIdx.x * blockDim.x + threadIdx.x"
    );
    assert!(matches!(
        &expr_stmt(&stmts[1]).node,
        Expr::Postfix {
            op: PostfixOp::Inc,
            ..
        }
    ));
}

#[test]
fn test_conditional_and_comma() {
    let file = parse("void f() { for (i = 0, j = n; i < j; i++, j--) x = i < j ? i : j; }\n");
    let stmts = body_stmts(&file, "f");
    let Stmt::For { init, step, .. } = &stmts[0].node else {
        panic!("expected for");
    };
    let init = init.as_ref().unwrap();
    assert!(matches!(
        &expr_stmt(init).node,
        Expr::Binary {
            op: BinOp::Comma,
            ..
        }
    ));
    assert!(step.is_some());
}

#[test]
fn test_string_concatenation() {
    let file = parse("void f() { printf(\"a\" \"b\\n\", 1); }\n");
    let stmts = body_stmts(&file, "f");
    let Expr::Call { args, .. } = &expr_stmt(&stmts[0]).node else {
        panic!("expected call");
    };
    assert!(matches!(&args[0].node, Expr::StrLit(s) if s == "ab\\n"));
}

// --- Errors ---

#[test]
fn test_missing_semicolon_reported() {
    let errors = parse_err("void f() { x = 1 }\n");
    assert!(errors[0].message.contains("expected ';'"));
}

#[test]
fn test_garbage_at_file_scope() {
    let errors = parse_err("+ 1;\nint main() { return 0; }\n");
    assert!(errors[0].message.contains("expected declaration"));
}

#[test]
fn test_recovers_after_bad_statement() {
    let errors = parse_err("void f() { x = ; y = 2; z = ; }\n");
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_deep_nesting_is_rejected() {
    let mut source = String::from("void f() { x = ");
    source.push_str(&"(".repeat(300));
    source.push('1');
    source.push_str(&")".repeat(300));
    source.push_str("; }\n");
    let errors = parse_err(&source);
    assert!(errors.iter().any(|e| e.message.contains("nesting depth")));
}
