use std::collections::HashSet;

use bumpalo::Bump;

use crate::ast::ty::{ConvKind, PrimitiveType, RuleContext, TypeHint, TypeRule};
use crate::ast::{Node, NodeId, NodeKind, Param};
use crate::loc::Loc;
use crate::parser::Parser;
use crate::registry::{
    ClassDescriptor, ClassField, FunctionDescriptor, FunctionFlags, FunctionId, FunctionKind,
    Visibility, mangle_method_name,
};

/// A variable captured by an anonymous function's `use` clause.
pub(crate) struct Capture<'ast> {
    pub name: &'ast str,
    pub loc: Loc,
}

impl<'a, 'ast, 'src> Parser<'a, 'ast, 'src> {
    /// Wrap `expr` in an explicit conversion. The wrap is unconditional
    /// except that a conversion of the same kind is never stacked, so every
    /// coerced position carries exactly one conversion node.
    pub(crate) fn conv_to(&self, expr: NodeId<'ast>, kind: ConvKind) -> NodeId<'ast> {
        if matches!(expr.kind, NodeKind::Conv { kind: k, .. } if k == kind) {
            return expr;
        }
        self.node(NodeKind::Conv { kind, expr }, expr.loc)
    }

    /// Every function body ends with an explicit return. A body that falls
    /// off the end gets `return null` with the void marker set.
    pub(crate) fn force_return(&self, body: NodeId<'ast>) -> NodeId<'ast> {
        let NodeKind::Seq { stmts } = body.kind else {
            return body;
        };
        if let Some(last) = stmts.last() {
            if matches!(last.kind, NodeKind::Return { .. }) {
                return body;
            }
        }
        let loc = stmts.last().map_or(body.loc, |s| s.loc);
        let expr = self.node(NodeKind::Null, loc);
        let mut ret = Node::new(NodeKind::Return { expr }, loc);
        ret.flags.void_return = true;
        let ret = self.alloc_node(ret);
        let stmts: Vec<NodeId<'ast>> = stmts.iter().copied().chain(std::iter::once(ret)).collect();
        self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, body.loc)
    }

    /// Lower `cond ?: els` so the condition is evaluated exactly once:
    /// a hidden temporary receives the boolean value of the condition and
    /// is moved out in the true branch.
    pub(crate) fn create_shorthand_ternary(
        &mut self,
        cond: NodeId<'ast>,
        els: NodeId<'ast>,
        loc: Loc,
    ) -> NodeId<'ast> {
        let generated = self.names.unique("shorthand_ternary_cond");
        let temp_name = self.intern(&generated);
        let cond = self.conv_to(cond, ConvKind::Bool);

        let mut lhs = Node::new(NodeKind::Var { name: temp_name }, loc);
        lhs.flags.superlocal = true;
        let lhs = self.alloc_node(lhs);
        let assign = self.node(NodeKind::Assign { lhs, rhs: cond }, loc);

        let mut read = Node::new(NodeKind::Var { name: temp_name }, loc);
        read.flags.superlocal = true;
        let read = self.alloc_node(read);
        let then = self.node(NodeKind::Move { expr: read }, loc);

        self.node(NodeKind::Ternary { cond: assign, then, els }, loc)
    }

    /// `$this`, typed as an instance of `class`.
    pub(crate) fn create_this_node(&self, class: &'ast str, loc: Loc) -> NodeId<'ast> {
        let rule: &'ast TypeRule<'ast> = self.arena.alloc(TypeRule::Instance { class });
        let mut node = Node::new(NodeKind::Var { name: "this" }, loc);
        node.type_rule = Some(TypeHint { context: RuleContext::Exact, rule });
        self.alloc_node(node)
    }

    /// The implicit first parameter of every instance method.
    pub(crate) fn this_param(&self, class: &'ast str, loc: Loc) -> Param<'ast> {
        Param {
            var: self.create_this_node(class, loc),
            type_name: Some(class),
            type_help: PrimitiveType::Class,
            type_rule: None,
            default: None,
            callback: None,
            loc,
        }
    }

    /// Rebuild a constructor body into its full form: declare `$this`,
    /// assign field defaults, run the written statements, return `$this`.
    pub(crate) fn patch_constructor(
        &mut self,
        body: NodeId<'ast>,
        class: &'ast str,
        fields: &[ClassField<'ast>],
    ) -> NodeId<'ast> {
        let loc = body.loc;
        let this_decl = self.create_this_node(class, loc);
        let mut stmts: Vec<NodeId<'ast>> = vec![this_decl];
        for field in fields {
            if let Some(default) = field.default {
                let object = self.create_this_node(class, field.loc);
                let name = self.intern(&field.name);
                let lhs = self.node(NodeKind::InstanceProp { object, name }, field.loc);
                stmts.push(self.node(NodeKind::Assign { lhs, rhs: default }, field.loc));
            }
        }
        if let NodeKind::Seq { stmts: inner } = body.kind {
            stmts.extend(inner.iter().copied());
        } else {
            stmts.push(body);
        }
        let this_read = self.create_this_node(class, loc);
        stmts.push(self.node(NodeKind::Return { expr: this_read }, loc));
        self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, loc)
    }

    /// Synthesize `__construct` for a class that does not declare one.
    pub(crate) fn create_default_constructor(
        &mut self,
        class: &'ast str,
        fields: &[ClassField<'ast>],
        loc: Loc,
    ) -> FunctionDescriptor<'ast> {
        let empty = self.node(NodeKind::Seq { stmts: self.slice(&[]) }, loc);
        let body = self.patch_constructor(empty, class, fields);
        FunctionDescriptor {
            name: mangle_method_name(class, "__construct"),
            kind: FunctionKind::InstanceMethod,
            flags: FunctionFlags::default(),
            params: vec![self.this_param(class, loc)],
            root: Some(body),
            class: None,
            created_inside: None,
            file: self.unit.file_name.clone(),
            return_rule: None,
            loc,
        }
    }

    /// Turn an anonymous function into a hidden class: captures become
    /// fields, the body becomes `__invoke`, and the lambda expression is
    /// replaced by a constructor call passing the captured values.
    pub(crate) fn generate_lambda_class(
        &mut self,
        params: Vec<Param<'ast>>,
        captures: Vec<Capture<'ast>>,
        body: NodeId<'ast>,
        loc: Loc,
    ) -> NodeId<'ast> {
        let prefix = format!("Lambda${}", self.unit.main_func_name);
        let generated = self.names.unique(&prefix);
        let class = self.intern(&generated);

        // rewrite captured reads and $this into field reads off the
        // lambda object
        let arena = self.arena;
        let capture_names: HashSet<&str> = captures.iter().map(|c| c.name).collect();
        let rule: &'ast TypeRule<'ast> = arena.alloc(TypeRule::Instance { class });
        let hint = TypeHint { context: RuleContext::Exact, rule };
        let mut used_parent_this = false;
        let body = rewrite(arena, body, &mut |n| {
            let name = match n.kind {
                NodeKind::Var { name } if !n.flags.superlocal => name,
                _ => return None,
            };
            let field = if name == "this" {
                used_parent_this = true;
                "parent$this"
            } else if capture_names.contains(name) {
                name
            } else {
                return None;
            };
            let mut this_var = Node::new(NodeKind::Var { name: "this" }, n.loc);
            this_var.type_rule = Some(hint);
            let object = &*arena.alloc(this_var);
            Some(&*arena.alloc(Node::new(NodeKind::InstanceProp { object, name: field }, n.loc)))
        });

        let enclosing_kind = self.function_stack.last().map(|f| f.kind);
        let enclosing_name = self.function_stack.last().map(|f| f.name.clone());
        if used_parent_this
            && !matches!(
                enclosing_kind,
                Some(FunctionKind::InstanceMethod | FunctionKind::Lambda)
            )
        {
            self.diag
                .error(loc, "$this captured outside of an instance method");
        }

        let mut fields: Vec<ClassField<'ast>> = captures
            .iter()
            .map(|c| ClassField {
                name: c.name.to_string(),
                visibility: Visibility::Public,
                default: None,
                loc: c.loc,
            })
            .collect();
        if used_parent_this {
            fields.push(ClassField {
                name: "parent$this".to_string(),
                visibility: Visibility::Public,
                default: None,
                loc,
            });
        }

        let class_id = match self.registry.register_class(ClassDescriptor {
            name: class.to_string(),
            parent: None,
            fields: Vec::new(),
            static_fields: Vec::new(),
            methods: Vec::new(),
            static_methods: Vec::new(),
            constructor: None,
            is_lambda: true,
            file: self.unit.file_name.clone(),
            loc,
        }) {
            Ok(id) => id,
            // generated names are unique, so this cannot clash
            Err(id) => id,
        };

        // __invoke carries the lambda body
        let mut invoke_params = Vec::with_capacity(params.len() + 1);
        invoke_params.push(self.this_param(class, loc));
        invoke_params.extend(params);
        let invoke_body = self.force_return(body);
        let invoke = self.register_generated_method(FunctionDescriptor {
            name: mangle_method_name(class, "__invoke"),
            kind: FunctionKind::InstanceMethod,
            flags: FunctionFlags::default(),
            params: invoke_params,
            root: Some(invoke_body),
            class: Some(class_id),
            created_inside: enclosing_name,
            file: self.unit.file_name.clone(),
            return_rule: None,
            loc,
        });

        // the constructor stores every captured value in its field
        let mut ctor_params = vec![self.this_param(class, loc)];
        let mut ctor_stmts = Vec::new();
        for field in &fields {
            let name = self.intern(&field.name);
            let var = self.node(NodeKind::Var { name }, field.loc);
            ctor_params.push(Param {
                var,
                type_name: None,
                type_help: PrimitiveType::Unknown,
                type_rule: None,
                default: None,
                callback: None,
                loc: field.loc,
            });
            let object = self.create_this_node(class, field.loc);
            let lhs = self.node(NodeKind::InstanceProp { object, name }, field.loc);
            let rhs = self.node(NodeKind::Var { name }, field.loc);
            ctor_stmts.push(self.node(NodeKind::Assign { lhs, rhs }, field.loc));
        }
        let ctor_body = self.node(NodeKind::Seq { stmts: self.slice(&ctor_stmts) }, loc);
        let ctor_body = self.patch_constructor(ctor_body, class, &[]);
        let ctor = self.register_generated_method(FunctionDescriptor {
            name: mangle_method_name(class, "__construct"),
            kind: FunctionKind::InstanceMethod,
            flags: FunctionFlags::default(),
            params: ctor_params,
            root: Some(ctor_body),
            class: Some(class_id),
            created_inside: None,
            file: self.unit.file_name.clone(),
            return_rule: None,
            loc,
        });

        {
            let mut desc = self.registry.class_mut(class_id);
            desc.fields = fields;
            desc.methods = vec![invoke];
            desc.constructor = Some(ctor);
        }

        // the lambda expression itself becomes allocation plus capture
        let args: Vec<NodeId<'ast>> = captures
            .iter()
            .map(|c| self.node(NodeKind::Var { name: c.name }, c.loc))
            .chain(
                used_parent_this
                    .then(|| self.node(NodeKind::Var { name: "this" }, loc)),
            )
            .collect();
        self.node(
            NodeKind::ConstructorCall { class, args: self.slice(&args) },
            loc,
        )
    }

    fn register_generated_method(&mut self, desc: FunctionDescriptor<'ast>) -> FunctionId {
        let name = desc.name.clone();
        let loc = desc.loc;
        match self.registry.register_function(desc) {
            Ok(id) => {
                self.registry.stream.push(id);
                id
            }
            Err(id) => {
                self.diag
                    .error(loc, format!("generated function '{name}' clashes"));
                id
            }
        }
    }
}

/// Structurally rebuild a tree, replacing the nodes `subst` claims. The
/// substitution sees every node before its children; returning `None` keeps
/// the node and descends. Shared nodes are never mutated in place.
pub fn rewrite<'ast>(
    arena: &'ast Bump,
    node: NodeId<'ast>,
    subst: &mut dyn FnMut(NodeId<'ast>) -> Option<NodeId<'ast>>,
) -> NodeId<'ast> {
    if let Some(replacement) = subst(node) {
        return replacement;
    }

    macro_rules! one {
        ($child:expr) => {
            rewrite(arena, $child, subst)
        };
    }
    macro_rules! many {
        ($children:expr) => {{
            let mapped: Vec<NodeId<'ast>> =
                $children.iter().map(|&c| rewrite(arena, c, subst)).collect();
            &*arena.alloc_slice_copy(&mapped)
        }};
    }

    use NodeKind::*;
    let kind = match node.kind {
        Int { .. } | Float { .. } | Str { .. } | Bool { .. } | Null | CurrentFunction
        | Var { .. } | FuncName { .. } | Empty | Error => return node,

        StringBuild { parts } => StringBuild { parts: many!(parts) },
        Conv { kind, expr } => Conv { kind, expr: one!(expr) },
        Unary { op, expr } => Unary { op, expr: one!(expr) },
        Binary { op, lhs, rhs } => Binary { op, lhs: one!(lhs), rhs: one!(rhs) },
        Assign { lhs, rhs } => Assign { lhs: one!(lhs), rhs: one!(rhs) },
        AssignOp { op, lhs, rhs } => AssignOp { op, lhs: one!(lhs), rhs: one!(rhs) },
        Ternary { cond, then, els } => Ternary {
            cond: one!(cond),
            then: one!(then),
            els: one!(els),
        },
        Move { expr } => Move { expr: one!(expr) },
        FuncCall { name, args } => FuncCall { name, args: many!(args) },
        ConstructorCall { class, args } => ConstructorCall { class, args: many!(args) },
        MemberAccess { object, member } => MemberAccess {
            object: one!(object),
            member: one!(member),
        },
        InstanceProp { object, name } => InstanceProp { object: one!(object), name },
        Index { array, index } => Index {
            array: one!(array),
            index: index.map(|i| one!(i)),
        },
        KeyValue { key, value } => KeyValue { key: one!(key), value: one!(value) },
        Isset { expr } => Isset { expr: one!(expr) },
        Exit { expr } => Exit { expr: one!(expr) },
        Require { once, expr } => Require { once, expr: one!(expr) },
        Print { expr } => Print { expr: one!(expr) },
        Array { items } => Array { items: many!(items) },
        Tuple { args } => Tuple { args: many!(args) },
        List { items } => List { items: many!(items) },
        Define { args } => Define { args: many!(args) },
        Defined { args } => Defined { args: many!(args) },
        Unset { args } => Unset { args: many!(args) },
        VarDump { args } => VarDump { args: many!(args) },

        Seq { stmts } => Seq { stmts: many!(stmts) },
        SeqComma { exprs } => SeqComma { exprs: many!(exprs) },
        If { cond, then, els } => If {
            cond: one!(cond),
            then: one!(then),
            els: els.map(|e| one!(e)),
        },
        While { cond, body } => While { cond: one!(cond), body: one!(body) },
        DoWhile { cond, body } => DoWhile { cond: one!(cond), body: one!(body) },
        For { init, cond, post, body } => For {
            init: one!(init),
            cond: one!(cond),
            post: one!(post),
            body: one!(body),
        },
        Foreach { params, body, temp } => Foreach {
            params: one!(params),
            body: one!(body),
            temp: one!(temp),
        },
        ForeachParam { source, value, iter_slot, key } => ForeachParam {
            source: one!(source),
            value: one!(value),
            iter_slot: one!(iter_slot),
            key: key.map(|k| one!(k)),
        },
        Switch { cond, temps, cases } => Switch {
            cond: one!(cond),
            temps: many!(temps),
            cases: many!(cases),
        },
        Case { value, body } => Case {
            value: value.map(|v| one!(v)),
            body: one!(body),
        },
        Try { body, exception, catch } => Try {
            body: one!(body),
            exception: one!(exception),
            catch: one!(catch),
        },
        Throw { expr } => Throw { expr: one!(expr) },
        Return { expr } => Return { expr: one!(expr) },
        Break { level } => Break { level: one!(level) },
        Continue { level } => Continue { level: one!(level) },
        Echo { expr } => Echo { expr: one!(expr) },
        Global { var } => Global { var: one!(var) },
        StaticDecl { expr } => StaticDecl { expr: one!(expr) },
        Noerr { stmt } => Noerr { stmt: one!(stmt) },
    };
    arena.alloc(Node { kind, ..*node })
}
