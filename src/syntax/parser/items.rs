use crate::ast::*;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

use super::Parser;

/// Declaration specifiers shared by every declarator of one declaration.
#[derive(Default)]
pub(super) struct DeclSpec {
    cuda: Vec<CudaAttr>,
    storage: Vec<Storage>,
    is_typedef: bool,
    base: Vec<String>,
    /// Range of the qualifier and type words, excluding CUDA attributes
    /// and storage classes.
    type_span: Option<Span>,
    record: Option<RecordDef>,
    enum_def: Option<EnumDef>,
}

impl DeclSpec {
    fn has_type(&self) -> bool {
        !self.base.is_empty()
    }

    fn extend_type_span(&mut self, span: Span) {
        self.type_span = Some(match self.type_span {
            Some(ts) => ts.merge(span),
            None => span,
        });
    }
}

/// One declarator: `*name[4]`.
struct Declarator {
    name: Option<Spanned<String>>,
    pointers: usize,
    last_star: Option<Span>,
    arrays: Vec<Option<String>>,
}

impl Parser {
    pub(super) fn parse_item(&mut self) -> Item {
        if let Lexeme::Directive(text) = self.peek().clone() {
            self.advance();
            return Item::Directive(text);
        }
        if self.eat(&Lexeme::Semicolon) {
            return Item::Empty;
        }

        let spec = self.parse_decl_spec();
        if !spec.has_type() {
            self.error_with_help(
                &format!("expected declaration, found {}", self.peek().description()),
                "every file-scope item must start with a type or a storage class",
            );
            self.synchronize();
            return Item::Empty;
        }

        if spec.is_typedef {
            let vars = self.parse_var_declarators(&spec);
            self.expect(&Lexeme::Semicolon);
            for var in &vars {
                self.typedefs.insert(var.name.node.clone());
            }
            return Item::Typedef(DeclGroup {
                cuda: spec.cuda,
                storage: spec.storage,
                vars,
            });
        }

        if self.eat(&Lexeme::Semicolon) {
            return Self::bare_specifier_item(spec, Vec::new());
        }

        let first = self.parse_declarator();
        if first.name.is_some() && self.at(&Lexeme::LParen) {
            return Item::Function(self.parse_function(spec, first));
        }

        let vars = self.parse_declarators_from(&spec, first);
        self.expect(&Lexeme::Semicolon);
        Self::bare_specifier_item(spec, vars)
    }

    /// A record or enum definition keeps its trailing variables; anything
    /// else is a plain variable group.
    fn bare_specifier_item(spec: DeclSpec, vars: Vec<VarDecl>) -> Item {
        if let Some(mut record) = spec.record {
            record.vars = vars;
            return Item::Record(record);
        }
        if let Some(mut enum_def) = spec.enum_def {
            enum_def.vars = vars;
            return Item::Enum(enum_def);
        }
        Item::Vars(DeclGroup {
            cuda: spec.cuda,
            storage: spec.storage,
            vars,
        })
    }

    fn parse_function(&mut self, spec: DeclSpec, decl: Declarator) -> FnDef {
        let name = decl
            .name
            .unwrap_or_else(|| Spanned::new("_error_".to_string(), self.current_span()));
        let return_ty = Type {
            base: spec.base,
            pointers: decl.pointers,
            arrays: Vec::new(),
        };

        self.expect(&Lexeme::LParen);
        let (params, variadic) = self.parse_params();
        self.expect(&Lexeme::RParen);

        let body = if self.at(&Lexeme::LBrace) {
            Some(self.parse_block())
        } else {
            self.expect(&Lexeme::Semicolon);
            None
        };

        FnDef {
            cuda: spec.cuda,
            storage: spec.storage,
            return_ty,
            name,
            params,
            variadic,
            body,
        }
    }

    fn parse_params(&mut self) -> (Vec<VarDecl>, bool) {
        let mut params = Vec::new();
        if self.at(&Lexeme::RParen) {
            return (params, false);
        }
        if self.at(&Lexeme::Void) && matches!(self.peek_at(1), Lexeme::RParen) {
            self.advance();
            return (params, false);
        }

        let mut variadic = false;
        loop {
            if self.eat(&Lexeme::Ellipsis) {
                variadic = true;
                break;
            }
            let spec = self.parse_decl_spec();
            if !spec.has_type() {
                self.error_at_current(&format!(
                    "expected parameter type, found {}",
                    self.peek().description()
                ));
                break;
            }
            let decl = self.parse_declarator();
            // Unnamed parameters are legal in prototypes.
            let fallback = Span::point(self.prev_span().file_id, self.prev_span().end);
            params.push(self.make_var(&spec, decl, None, fallback));
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        (params, variadic)
    }

    /// A declaration inside a block: `float *a, *b = NULL;`
    pub(super) fn parse_local_decl(&mut self) -> DeclGroup {
        let spec = self.parse_decl_spec();
        if spec.is_typedef {
            let vars = self.parse_var_declarators(&spec);
            for var in &vars {
                self.typedefs.insert(var.name.node.clone());
            }
            return DeclGroup {
                cuda: spec.cuda,
                storage: spec.storage,
                vars: Vec::new(),
            };
        }
        let vars = if self.at(&Lexeme::Semicolon) {
            Vec::new()
        } else {
            self.parse_var_declarators(&spec)
        };
        DeclGroup {
            cuda: spec.cuda,
            storage: spec.storage,
            vars,
        }
    }

    pub(super) fn parse_decl_spec(&mut self) -> DeclSpec {
        let mut spec = DeclSpec::default();
        let mut named_type = false;
        loop {
            let span = self.current_span();
            match self.peek().clone() {
                Lexeme::CudaGlobal => spec.cuda.push(CudaAttr::Global),
                Lexeme::CudaDevice => spec.cuda.push(CudaAttr::Device),
                Lexeme::CudaHost => spec.cuda.push(CudaAttr::Host),
                Lexeme::CudaShared => spec.cuda.push(CudaAttr::Shared),
                Lexeme::CudaConstant => spec.cuda.push(CudaAttr::Constant),
                Lexeme::Static => spec.storage.push(Storage::Static),
                Lexeme::Extern => spec.storage.push(Storage::Extern),
                Lexeme::Inline => spec.storage.push(Storage::Inline),
                Lexeme::Typedef => spec.is_typedef = true,
                Lexeme::Restrict => {}
                tok @ (Lexeme::Const | Lexeme::Volatile) => {
                    spec.base.push(tok.spelling().to_string());
                    spec.extend_type_span(span);
                }
                tok if tok.is_type_keyword() => {
                    spec.base.push(tok.spelling().to_string());
                    spec.extend_type_span(span);
                    named_type = true;
                }
                Lexeme::Struct | Lexeme::Union => {
                    let (words, record) = self.parse_record();
                    spec.base.extend(words);
                    spec.extend_type_span(span.merge(self.prev_span()));
                    spec.record = record;
                    named_type = true;
                    continue;
                }
                Lexeme::Enum => {
                    let (words, enum_def) = self.parse_enum();
                    spec.base.extend(words);
                    spec.extend_type_span(span.merge(self.prev_span()));
                    spec.enum_def = enum_def;
                    named_type = true;
                    continue;
                }
                Lexeme::Ident(name)
                    if !named_type
                        && (self.is_type_name(&name)
                            || matches!(self.peek_at(1), Lexeme::Ident(_))) =>
                {
                    spec.base.push(name);
                    spec.extend_type_span(span);
                    named_type = true;
                }
                _ => break,
            }
            self.advance();
        }
        spec
    }

    /// `struct Name`, `struct Name { fields }` or `struct { fields }`.
    fn parse_record(&mut self) -> (Vec<String>, Option<RecordDef>) {
        let kind = if self.eat(&Lexeme::Union) {
            RecordKind::Union
        } else {
            self.expect(&Lexeme::Struct);
            RecordKind::Struct
        };
        let keyword = match kind {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
        };
        let name = self.try_ident();
        let words = vec![
            keyword.to_string(),
            name.as_ref()
                .map_or_else(|| "<anonymous>".to_string(), |n| n.node.clone()),
        ];

        if !self.eat(&Lexeme::LBrace) {
            return (words, None);
        }
        let mut fields = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let before = self.pos;
            let spec = self.parse_decl_spec();
            if spec.has_type() && !self.at(&Lexeme::Semicolon) {
                fields.extend(self.parse_var_declarators(&spec));
            }
            self.expect(&Lexeme::Semicolon);
            if self.pos == before {
                self.advance();
            }
        }
        self.expect(&Lexeme::RBrace);

        let record = RecordDef {
            kind,
            name,
            fields,
            vars: Vec::new(),
        };
        (words, Some(record))
    }

    fn parse_enum(&mut self) -> (Vec<String>, Option<EnumDef>) {
        self.expect(&Lexeme::Enum);
        let name = self.try_ident();
        let words = vec![
            "enum".to_string(),
            name.as_ref()
                .map_or_else(|| "<anonymous>".to_string(), |n| n.node.clone()),
        ];

        if !self.eat(&Lexeme::LBrace) {
            return (words, None);
        }
        let mut variants = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let variant_name = self.expect_ident();
            let value = if self.eat(&Lexeme::Eq) {
                Some(self.parse_assignment())
            } else {
                None
            };
            variants.push(Enumerator {
                id: self.fresh_decl_id(),
                name: variant_name,
                value,
            });
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        self.expect(&Lexeme::RBrace);

        let enum_def = EnumDef {
            name,
            variants,
            vars: Vec::new(),
        };
        (words, Some(enum_def))
    }

    fn parse_declarator(&mut self) -> Declarator {
        let mut pointers = 0;
        let mut last_star = None;
        loop {
            if self.at(&Lexeme::Star) {
                last_star = Some(self.current_span());
                self.advance();
                pointers += 1;
                while matches!(
                    self.peek(),
                    Lexeme::Const | Lexeme::Volatile | Lexeme::Restrict
                ) {
                    self.advance();
                }
            } else if self.at(&Lexeme::Amp) {
                // C++ reference parameter; treated like the referenced type.
                self.advance();
            } else {
                break;
            }
        }
        let name = self.try_ident();
        let arrays = self.parse_array_suffixes();
        Declarator {
            name,
            pointers,
            last_star,
            arrays,
        }
    }

    fn parse_array_suffixes(&mut self) -> Vec<Option<String>> {
        let mut arrays = Vec::new();
        while self.eat(&Lexeme::LBracket) {
            if self.eat(&Lexeme::RBracket) {
                arrays.push(None);
                continue;
            }
            let extent = self.parse_expr();
            arrays.push(Some(extent.node.to_string()));
            self.expect(&Lexeme::RBracket);
        }
        arrays
    }

    fn parse_var_declarators(&mut self, spec: &DeclSpec) -> Vec<VarDecl> {
        let first = self.parse_declarator();
        self.parse_declarators_from(spec, first)
    }

    fn parse_declarators_from(&mut self, spec: &DeclSpec, first: Declarator) -> Vec<VarDecl> {
        let mut vars = Vec::new();
        let mut decl = first;
        loop {
            if decl.name.is_none() {
                self.error_at_current(&format!(
                    "expected identifier in declaration, found {}",
                    self.peek().description()
                ));
                self.synchronize_declarators();
                break;
            }
            let init = self.parse_initializer();
            let fallback = self.current_span();
            vars.push(self.make_var(spec, decl, init, fallback));
            if !self.eat(&Lexeme::Comma) {
                break;
            }
            decl = self.parse_declarator();
        }
        if vars.len() > 1 {
            for var in &mut vars {
                var.shares_specifiers = true;
            }
        }
        vars
    }

    /// Skip to the `;` ending a broken declaration, leaving it in place.
    fn synchronize_declarators(&mut self) {
        while !matches!(
            self.peek(),
            Lexeme::Semicolon | Lexeme::RBrace | Lexeme::Eof
        ) {
            self.advance();
        }
    }

    fn parse_initializer(&mut self) -> Option<Initializer> {
        if self.eat(&Lexeme::Eq) {
            let value = if self.at(&Lexeme::LBrace) {
                self.parse_init_list()
            } else {
                self.parse_assignment()
            };
            return Some(Initializer::Assign(value));
        }
        if self.at(&Lexeme::LParen) {
            let start = self.current_span();
            self.advance();
            let args = self.parse_call_args();
            let end = self.expect(&Lexeme::RParen);
            return Some(Initializer::Construct(Spanned::new(args, start.merge(end))));
        }
        None
    }

    fn make_var(
        &mut self,
        spec: &DeclSpec,
        decl: Declarator,
        init: Option<Initializer>,
        fallback: Span,
    ) -> VarDecl {
        let name = decl
            .name
            .unwrap_or_else(|| Spanned::new(String::new(), fallback));
        let type_span = match (spec.type_span, decl.last_star) {
            (Some(ts), Some(star)) => ts.merge(star),
            (Some(ts), None) => ts,
            (None, _) => Span::point(name.span.file_id, name.span.start),
        };
        VarDecl {
            id: self.fresh_decl_id(),
            name,
            ty: Type {
                base: spec.base.clone(),
                pointers: decl.pointers,
                arrays: decl.arrays,
            },
            type_span,
            shares_specifiers: false,
            init,
        }
    }

    /// A type name without a declared identifier, as in casts and
    /// `sizeof(float *)`.
    pub(super) fn parse_type_name(&mut self) -> Spanned<Type> {
        let start = self.current_span();
        let mut spec = self.parse_decl_spec();
        if !spec.has_type() {
            if let Lexeme::Ident(name) = self.peek().clone() {
                // A header type this file never declares: `(T *)p`.
                spec.base.push(name);
                self.advance();
            } else {
                self.error_at_current(&format!(
                    "expected type, found {}",
                    self.peek().description()
                ));
            }
        }
        let mut pointers = 0;
        while self.eat(&Lexeme::Star) {
            pointers += 1;
            while matches!(
                self.peek(),
                Lexeme::Const | Lexeme::Volatile | Lexeme::Restrict
            ) {
                self.advance();
            }
        }
        let arrays = self.parse_array_suffixes();
        let ty = Type {
            base: spec.base,
            pointers,
            arrays,
        };
        Spanned::new(ty, start.merge(self.prev_span()))
    }
}
