use crate::ast::ty::{PrimitiveType, RuleContext, TypeHint, TypeRule};
use crate::ast::{Node, NodeId, NodeKind, Param};
use crate::loc::Loc;
use crate::parser::transform::Capture;
use crate::parser::{FunctionContext, Parser};
use crate::registry::{
    ClassDescriptor, ClassField, FunctionDescriptor, FunctionFlags, FunctionId, FunctionKind,
    Visibility, mangle_class_const, mangle_method_name,
};
use crate::token::TokenKind;

/// Class declaration being parsed; members accumulate here and the class is
/// registered when the closing brace is reached.
pub(crate) struct ClassContext<'ast> {
    pub name: &'ast str,
    pub parent: Option<String>,
    pub fields: Vec<ClassField<'ast>>,
    pub static_fields: Vec<ClassField<'ast>>,
    pub methods: Vec<FunctionId>,
    pub static_methods: Vec<FunctionId>,
    pub constructor: Option<FunctionId>,
    /// Constants and static-field initializers, in declaration order. They
    /// end up in the statement sequence the class declaration leaves behind.
    pub body_stmts: Vec<NodeId<'ast>>,
    pub loc: Loc,
}

impl<'a, 'ast, 'src> Parser<'a, 'ast, 'src> {
    /// `[throws|resumable|auto]* (function|extern_function) name(...) ...`
    pub(crate) fn parse_function_statement(&mut self, is_static: bool) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        let mut flags = FunctionFlags::default();
        loop {
            match self.cur.kind() {
                TokenKind::Throws => flags.throws = true,
                TokenKind::Resumable => flags.resumable = true,
                TokenKind::Auto => flags.auto = true,
                _ => break,
            }
            self.cur.bump();
        }
        let is_extern = match self.cur.kind() {
            TokenKind::Function => false,
            TokenKind::ExternFunction => true,
            _ => {
                self.diag
                    .error(self.cur.loc(), "expected 'function' after specifiers");
                return None;
            }
        };
        self.cur.bump();
        self.parse_function_decl(flags, is_extern, is_static, loc)?;
        Some(self.node(NodeKind::Empty, loc))
    }

    fn parse_function_decl(
        &mut self,
        flags: FunctionFlags,
        is_extern: bool,
        is_static: bool,
        loc: Loc,
    ) -> Option<FunctionId> {
        if self.cur.kind() != TokenKind::Identifier {
            self.diag.error(self.cur.loc(), "expected function name");
            return None;
        }
        let local_name = self.cur.text().to_string();
        self.cur.bump();

        let class_name = self.class_stack.last().map(|c| c.name);
        let (name, kind) = match class_name {
            // static methods are plain functions with a mangled name
            Some(class) if is_static => {
                (mangle_method_name(class, &local_name), FunctionKind::Global)
            }
            Some(class) => (
                mangle_method_name(class, &local_name),
                FunctionKind::InstanceMethod,
            ),
            None => {
                let kind = if is_extern {
                    FunctionKind::Extern
                } else if self
                    .function_stack
                    .last()
                    .is_some_and(|f| f.kind != FunctionKind::UnitMain)
                {
                    FunctionKind::Local
                } else {
                    FunctionKind::Global
                };
                (local_name.clone(), kind)
            }
        };
        if is_extern && class_name.is_some() {
            self.diag.error(loc, "extern functions cannot be class members");
        }

        let mut params = self.parse_params()?;
        if let Some(class) = class_name {
            if !is_static {
                params.insert(0, self.this_param(class, loc));
            }
        }
        let return_rule = self.parse_optional_rule()?;

        let root = if is_extern {
            self.expect(TokenKind::SemiColon, "';' after extern prototype")?;
            None
        } else {
            self.function_stack.push(FunctionContext {
                name: name.clone(),
                kind,
            });
            let body = self.parse_block();
            self.function_stack.pop();
            let body = body?;
            // constructor bodies get their return appended when the class
            // is finished
            if class_name.is_some() && !is_static && local_name == "__construct" {
                Some(body)
            } else {
                Some(self.force_return(body))
            }
        };

        let desc = FunctionDescriptor {
            name: name.clone(),
            kind,
            flags,
            params,
            root,
            class: None,
            created_inside: None,
            file: self.unit.file_name.clone(),
            return_rule,
            loc,
        };
        let id = match self.registry.register_function(desc) {
            Ok(id) => id,
            Err(prev) => {
                self.diag
                    .error(loc, format!("function '{name}' is already declared"));
                return Some(prev);
            }
        };
        if !is_extern {
            self.registry.stream.push(id);
        }
        if let Some(ctx) = self.class_stack.last_mut() {
            if is_static {
                ctx.static_methods.push(id);
            } else {
                ctx.methods.push(id);
                if local_name == "__construct" {
                    ctx.constructor = Some(id);
                }
            }
        }
        Some(id)
    }

    pub(crate) fn parse_params(&mut self) -> Option<Vec<Param<'ast>>> {
        self.expect(TokenKind::OpenParen, "'(' before parameters")?;
        let mut params = Vec::new();
        if self.eat(TokenKind::CloseParen) {
            return Some(params);
        }
        loop {
            params.push(self.parse_param()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')' after parameters")?;
        Some(params)
    }

    fn parse_param(&mut self) -> Option<Param<'ast>> {
        let loc = self.cur.loc();
        let mut type_name = None;
        let mut type_help = PrimitiveType::Unknown;
        match self.cur.kind() {
            TokenKind::Identifier => {
                let text = self.cur.text();
                if let Some(prim) = PrimitiveType::from_name(text) {
                    type_help = prim;
                } else {
                    type_help = PrimitiveType::Class;
                    type_name = Some(self.intern(&self.unit.resolve_class_name(text)));
                }
                self.cur.bump();
            }
            TokenKind::Array => {
                type_help = PrimitiveType::Array;
                self.cur.bump();
            }
            TokenKind::Tuple => {
                type_help = PrimitiveType::Tuple;
                self.cur.bump();
            }
            TokenKind::Exception => {
                type_help = PrimitiveType::Exception;
                self.cur.bump();
            }
            TokenKind::Var => {
                type_help = PrimitiveType::Mixed;
                self.cur.bump();
            }
            _ => {}
        }

        let by_ref = self.eat(TokenKind::Ampersand);
        if self.cur.kind() != TokenKind::Variable {
            self.diag.error(self.cur.loc(), "expected parameter variable");
            return None;
        }
        let name = self.intern(self.cur.text());
        let var_loc = self.cur.loc();
        self.cur.bump();
        let mut var = Node::new(NodeKind::Var { name }, var_loc);
        var.flags.by_ref = by_ref;
        let var = self.alloc_node(var);

        // a parameter followed by its own parameter list is a callback
        let callback = if self.cur.kind() == TokenKind::OpenParen {
            let nested = self.parse_params()?;
            Some(&*self.arena.alloc_slice_copy(&nested))
        } else {
            None
        };

        let default = if self.eat(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let type_rule = self.parse_optional_rule()?;

        Some(Param {
            var,
            type_name,
            type_help,
            type_rule,
            default,
            callback,
            loc,
        })
    }

    // ----- type rules -----

    /// Outer `Option` is parse failure; inner `Option` is "no rule written".
    pub(crate) fn parse_optional_rule(&mut self) -> Option<Option<TypeHint<'ast>>> {
        let context = match self.cur.kind() {
            TokenKind::TripleColon => RuleContext::Declare,
            TokenKind::TripleEq => RuleContext::Exact,
            TokenKind::TripleLt => RuleContext::UpperBound,
            TokenKind::TripleGt => RuleContext::LowerBound,
            _ => return Some(None),
        };
        self.cur.bump();
        let rule = self.parse_type_rule()?;
        Some(Some(TypeHint { context, rule }))
    }

    fn parse_type_rule(&mut self) -> Option<&'ast TypeRule<'ast>> {
        let mut rule = self.parse_rule_base()?;
        loop {
            if self.cur.kind() == TokenKind::OpenBracket
                && self.cur.peek(1).kind == TokenKind::CloseBracket
            {
                self.cur.bump();
                self.cur.bump();
                rule = self.arena.alloc(TypeRule::Index { inner: rule });
            } else if self.cur.kind() == TokenKind::OpenParen
                && self.cur.peek(1).kind == TokenKind::CloseParen
            {
                self.cur.bump();
                self.cur.bump();
                rule = self.arena.alloc(TypeRule::CallbackCall { inner: rule });
            } else {
                break;
            }
        }
        Some(rule)
    }

    fn parse_rule_base(&mut self) -> Option<&'ast TypeRule<'ast>> {
        let loc = self.cur.loc();
        match self.cur.kind() {
            TokenKind::Caret => {
                self.cur.bump();
                if self.cur.kind() != TokenKind::IntLiteral {
                    self.diag.error(self.cur.loc(), "expected argument number after '^'");
                    return None;
                }
                let index = match self.cur.text().parse::<u32>() {
                    Ok(index) => index,
                    Err(_) => {
                        self.diag.error(loc, "argument reference out of range");
                        0
                    }
                };
                self.cur.bump();
                Some(self.arena.alloc(TypeRule::ArgRef { index }))
            }
            TokenKind::Array => {
                self.cur.bump();
                let args = self.parse_rule_args()?;
                Some(self.arena.alloc(TypeRule::Prim { ty: PrimitiveType::Array, args }))
            }
            TokenKind::Tuple => {
                self.cur.bump();
                let args = self.parse_rule_args()?;
                Some(self.arena.alloc(TypeRule::Prim { ty: PrimitiveType::Tuple, args }))
            }
            TokenKind::Exception => {
                self.cur.bump();
                Some(self.arena.alloc(TypeRule::Prim {
                    ty: PrimitiveType::Exception,
                    args: &[],
                }))
            }
            TokenKind::Identifier => {
                let text = self.cur.text();
                if text == "self" {
                    self.cur.bump();
                    if self.class_stack.is_empty() {
                        self.diag.error(loc, "'self' used outside of a class");
                    }
                    return Some(self.arena.alloc(TypeRule::SelfRef));
                }
                if text == "CONST" {
                    self.cur.bump();
                    let inner = self.parse_type_rule()?;
                    return Some(self.arena.alloc(TypeRule::Const { inner }));
                }
                if let Some(ty) = PrimitiveType::from_name(text) {
                    self.cur.bump();
                    let args = self.parse_rule_args()?;
                    return Some(self.arena.alloc(TypeRule::Prim { ty, args }));
                }
                let name = self.intern(text);
                self.cur.bump();
                if self.cur.kind() == TokenKind::Lt {
                    let args = self.parse_rule_args()?;
                    Some(self.arena.alloc(TypeRule::Func { name, args }))
                } else {
                    let class = self.intern(&self.unit.resolve_class_name(name));
                    Some(self.arena.alloc(TypeRule::Instance { class }))
                }
            }
            _ => {
                self.diag
                    .error(loc, format!("unexpected {:?} in type rule", self.cur.kind()));
                None
            }
        }
    }

    fn parse_rule_args(&mut self) -> Option<&'ast [&'ast TypeRule<'ast>]> {
        if self.cur.kind() != TokenKind::Lt {
            return Some(&[]);
        }
        self.cur.bump();
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type_rule()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if self.cur.kind() == TokenKind::Shr {
            self.diag.error(
                self.cur.loc(),
                "nested type rules need a space between closing angle brackets",
            );
            return None;
        }
        self.expect(TokenKind::Gt, "'>' closing type arguments")?;
        Some(self.arena.alloc_slice_copy(&args))
    }

    // ----- classes -----

    pub(crate) fn parse_class(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        if self.cur.kind() != TokenKind::Identifier {
            self.diag.error(self.cur.loc(), "expected class name");
            return None;
        }
        let raw = self.cur.text().to_string();
        self.cur.bump();
        let full = if self.unit.namespace_name.is_empty() {
            raw
        } else {
            format!("{}\\{raw}", self.unit.namespace_name)
        };
        let name = self.intern(&full);

        let parent = if self.eat(TokenKind::Extends) {
            if self.cur.kind() != TokenKind::Identifier {
                self.diag.error(self.cur.loc(), "expected parent class name");
                return None;
            }
            let parent = self.unit.resolve_class_name(self.cur.text());
            self.cur.bump();
            Some(parent)
        } else {
            None
        };

        self.class_stack.push(ClassContext {
            name,
            parent,
            fields: Vec::new(),
            static_fields: Vec::new(),
            methods: Vec::new(),
            static_methods: Vec::new(),
            constructor: None,
            body_stmts: Vec::new(),
            loc,
        });
        self.expect(TokenKind::OpenBrace, "'{' after class header")?;
        while self.cur.kind() != TokenKind::CloseBrace {
            if self.cur.at_end() {
                self.diag.error(self.cur.loc(), "unclosed class body");
                self.class_stack.pop();
                return None;
            }
            if self.parse_class_member().is_none() {
                self.resync();
            }
        }
        self.cur.bump();

        let ctx = self.class_stack.pop().unwrap();
        self.finish_class(ctx, loc)
    }

    /// Close out a class: synthesize the hidden class-name constant, patch
    /// or synthesize the constructor, register the descriptor and point its
    /// methods back at it. The returned statement carries the class's
    /// backing body: the class-name constant, then every constant and
    /// static-field initializer in declaration order.
    fn finish_class(&mut self, ctx: ClassContext<'ast>, loc: Loc) -> Option<NodeId<'ast>> {
        let class_const = mangle_class_const(ctx.name, "class");
        let class_name_value = self.node(NodeKind::Str { value: ctx.name }, loc);
        let mut body = Vec::with_capacity(ctx.body_stmts.len() + 1);
        if self.registry.register_define(&class_const, class_name_value) {
            let const_name = self.intern(&class_const);
            let name_node = self.node(NodeKind::Str { value: const_name }, loc);
            body.push(self.node(
                NodeKind::Define { args: self.slice(&[name_node, class_name_value]) },
                loc,
            ));
        }
        body.extend(ctx.body_stmts.iter().copied());

        // a class with no instance state and no instance methods never gets
        // constructed, so it keeps no constructor either
        let constructor = match ctx.constructor {
            Some(id) => {
                let root = self.registry.function(id).root;
                if let Some(root) = root {
                    let patched = self.patch_constructor(root, ctx.name, &ctx.fields);
                    self.registry.function_mut(id).root = Some(patched);
                }
                Some(id)
            }
            None if !ctx.fields.is_empty() || !ctx.methods.is_empty() => {
                let desc = self.create_default_constructor(ctx.name, &ctx.fields, loc);
                match self.registry.register_function(desc) {
                    Ok(id) => {
                        self.registry.stream.push(id);
                        Some(id)
                    }
                    Err(id) => Some(id),
                }
            }
            None => None,
        };

        let desc = ClassDescriptor {
            name: ctx.name.to_string(),
            parent: ctx.parent,
            fields: ctx.fields,
            static_fields: ctx.static_fields,
            methods: ctx.methods.clone(),
            static_methods: ctx.static_methods.clone(),
            constructor,
            is_lambda: false,
            file: self.unit.file_name.clone(),
            loc: ctx.loc,
        };
        match self.registry.register_class(desc) {
            Ok(class_id) => {
                let members = ctx
                    .methods
                    .iter()
                    .chain(ctx.static_methods.iter())
                    .chain(constructor.iter());
                for &method in members {
                    self.registry.function_mut(method).class = Some(class_id);
                }
            }
            Err(_) => {
                self.diag
                    .error(loc, format!("class '{}' is already declared", ctx.name));
            }
        }
        Some(self.node(NodeKind::Seq { stmts: self.slice(&body) }, loc))
    }

    /// One class member. Access modifiers and `static` may come in any
    /// order before the member itself.
    fn parse_class_member(&mut self) -> Option<()> {
        let loc = self.cur.loc();
        let mut visibility = None;
        let mut is_static = false;
        loop {
            match self.cur.kind() {
                kind if kind.is_access_modifier() => {
                    if visibility.is_some() {
                        self.diag.error(self.cur.loc(), "duplicate access modifier");
                    }
                    visibility = Some(match kind {
                        TokenKind::Public => Visibility::Public,
                        TokenKind::Private => Visibility::Private,
                        _ => Visibility::Protected,
                    });
                }
                TokenKind::Static => {
                    if is_static {
                        self.diag.error(self.cur.loc(), "duplicate 'static' modifier");
                    }
                    is_static = true;
                }
                _ => break,
            }
            self.cur.bump();
        }
        match self.cur.kind() {
            TokenKind::Var => {
                if visibility.is_some() || is_static {
                    self.diag
                        .error(loc, "'var' cannot be combined with other modifiers");
                }
                self.cur.bump();
                self.parse_field_list(Visibility::Public, false)
            }
            TokenKind::Variable => {
                let vis = match visibility {
                    Some(vis) => vis,
                    None => {
                        self.diag
                            .error(loc, "class field needs 'var' or an access modifier");
                        Visibility::Public
                    }
                };
                self.parse_field_list(vis, is_static)
            }
            TokenKind::Function
            | TokenKind::ExternFunction
            | TokenKind::Throws
            | TokenKind::Resumable
            | TokenKind::Auto => {
                self.parse_function_statement(is_static)?;
                Some(())
            }
            TokenKind::Const => {
                if is_static {
                    self.diag.error(loc, "'static' cannot be applied to a constant");
                }
                self.parse_class_const()
            }
            _ => {
                self.diag.error(loc, "expected class member");
                None
            }
        }
    }

    fn parse_field_list(&mut self, visibility: Visibility, is_static: bool) -> Option<()> {
        loop {
            let loc = self.cur.loc();
            if self.cur.kind() != TokenKind::Variable {
                self.diag.error(loc, "expected field variable");
                return None;
            }
            let name = self.cur.text().to_string();
            self.cur.bump();
            let default = if self.eat(TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let ctx = self.class_stack.last().unwrap();
            let duplicate = ctx
                .fields
                .iter()
                .chain(ctx.static_fields.iter())
                .any(|f| f.name == name);
            if duplicate {
                self.diag
                    .error(loc, format!("field '${name}' is already declared"));
            } else if is_static {
                // a static field lives as a mangled global; its initializer
                // joins the class's backing body
                let class = ctx.name;
                let mangled = self.intern(&mangle_method_name(class, &name));
                let var = self.node(NodeKind::Var { name: mangled }, loc);
                let stmt = match default {
                    Some(rhs) => self.node(NodeKind::Assign { lhs: var, rhs }, loc),
                    None => var,
                };
                let ctx = self.class_stack.last_mut().unwrap();
                ctx.body_stmts.push(stmt);
                ctx.static_fields.push(ClassField {
                    name,
                    visibility,
                    default,
                    loc,
                });
            } else {
                self.class_stack.last_mut().unwrap().fields.push(ClassField {
                    name,
                    visibility,
                    default,
                    loc,
                });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::SemiColon, "';' after field declaration")?;
        Some(())
    }

    /// `const NAME = expr;` inside a class registers a mangled define.
    fn parse_class_const(&mut self) -> Option<()> {
        let loc = self.cur.loc();
        self.cur.bump();
        if self.cur.kind() != TokenKind::Identifier {
            self.diag.error(self.cur.loc(), "expected constant name");
            return None;
        }
        let name = self.cur.text().to_string();
        self.cur.bump();
        self.expect(TokenKind::Eq, "'=' in constant declaration")?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::SemiColon, "';' after constant")?;
        let class = self.class_stack.last().unwrap().name;
        let mangled = mangle_class_const(class, &name);
        if !self.registry.register_define(&mangled, value) {
            self.diag
                .error(loc, format!("constant '{name}' already defined on this class"));
        }
        let const_name = self.intern(&mangled);
        let name_node = self.node(NodeKind::Str { value: const_name }, loc);
        let define = self.node(
            NodeKind::Define { args: self.slice(&[name_node, value]) },
            loc,
        );
        self.class_stack.last_mut().unwrap().body_stmts.push(define);
        Some(())
    }

    // ----- lambdas -----

    /// Anonymous function in expression position. Parsed like any function,
    /// then immediately lowered to a hidden class instance.
    pub(crate) fn parse_lambda(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let params = self.parse_params()?;
        let mut captures: Vec<Capture<'ast>> = Vec::new();
        if self.eat(TokenKind::Use) {
            self.expect(TokenKind::OpenParen, "'(' after 'use'")?;
            loop {
                let cap_loc = self.cur.loc();
                if self.eat(TokenKind::Ampersand) {
                    self.diag
                        .error(cap_loc, "capture by reference is not supported");
                }
                if self.cur.kind() != TokenKind::Variable {
                    self.diag.error(self.cur.loc(), "expected captured variable");
                    return None;
                }
                let name = self.intern(self.cur.text());
                self.cur.bump();
                if name == "this" {
                    self.diag.error(cap_loc, "$this is captured implicitly");
                } else if captures.iter().any(|c| c.name == name) {
                    self.diag
                        .error(cap_loc, format!("'${name}' is captured twice"));
                } else if params.iter().any(|p| p.name() == name) {
                    self.diag.error(
                        cap_loc,
                        format!("'${name}' is captured but shadowed by a parameter"),
                    );
                } else {
                    captures.push(Capture { name, loc: cap_loc });
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseParen, "')' after captures")?;
        }

        self.function_stack.push(FunctionContext {
            name: "{closure}".to_string(),
            kind: FunctionKind::Lambda,
        });
        let body = self.parse_block();
        self.function_stack.pop();
        let body = body?;
        Some(self.generate_lambda_class(params, captures, body, loc))
    }
}
