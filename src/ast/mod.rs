pub mod sexpr;
pub mod ty;

use crate::loc::Loc;
use ty::{ConvKind, PrimitiveType, TypeHint};

pub type NodeId<'ast> = &'ast Node<'ast>;

/// One AST node: a kind tag with fixed, positional child slots, a source
/// location, a small set of orthogonal flags and an optional attached type
/// rule. Nodes are arena-allocated and `Copy`; rewrites always rebuild
/// instead of mutating, so a node handed out is never changed under a reader.
#[derive(Debug, Clone, Copy)]
pub struct Node<'ast> {
    pub kind: NodeKind<'ast>,
    pub loc: Loc,
    pub flags: NodeFlags,
    pub type_rule: Option<TypeHint<'ast>>,
}

impl<'ast> Node<'ast> {
    pub fn new(kind: NodeKind<'ast>, loc: Loc) -> Self {
        Self {
            kind,
            loc,
            flags: NodeFlags::default(),
            type_rule: None,
        }
    }

    /// Name of a plain variable node, if this is one.
    pub fn var_name(&self) -> Option<&'ast str> {
        match self.kind {
            NodeKind::Var { name } => Some(name),
            _ => None,
        }
    }
}

/// Orthogonal structural markers. These must survive every clone and
/// rewrite; dropping one silently changes meaning downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// `&$x` in parameter, capture or foreach-value position.
    pub by_ref: bool,
    /// `return;` whose payload child is a synthesized null placeholder.
    pub void_return: bool,
    /// The expression was written inside parentheses.
    pub parenthesized: bool,
    /// Compiler-generated variable, never visible to user code.
    pub superlocal: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'ast> {
    // ----- expressions -----
    Int { value: &'ast str },
    Float { value: &'ast str },
    Str { value: &'ast str },
    Bool { value: bool },
    Null,
    /// `__FUNCTION__`; resolved by a later pass.
    CurrentFunction,
    Var { name: &'ast str },
    /// Interpolated string: literal and expression segments, concatenated.
    StringBuild { parts: &'ast [NodeId<'ast>] },
    Conv { kind: ConvKind, expr: NodeId<'ast> },
    Unary { op: UnaryOp, expr: NodeId<'ast> },
    Binary { op: BinaryOp, lhs: NodeId<'ast>, rhs: NodeId<'ast> },
    Assign { lhs: NodeId<'ast>, rhs: NodeId<'ast> },
    AssignOp { op: BinaryOp, lhs: NodeId<'ast>, rhs: NodeId<'ast> },
    Ternary { cond: NodeId<'ast>, then: NodeId<'ast>, els: NodeId<'ast> },
    /// Move-read of a superlocal temporary, produced when lowering the
    /// shorthand ternary.
    Move { expr: NodeId<'ast> },
    /// Bare function or constant name in expression position.
    FuncName { name: &'ast str },
    FuncCall { name: &'ast str, args: &'ast [NodeId<'ast>] },
    ConstructorCall { class: &'ast str, args: &'ast [NodeId<'ast>] },
    /// `$obj->member` with an arbitrary parsed right side.
    MemberAccess { object: NodeId<'ast>, member: NodeId<'ast> },
    /// Field access on a known receiver; produced by the transforms.
    InstanceProp { object: NodeId<'ast>, name: &'ast str },
    /// `$a[i]` / `$a{i}`; a missing index means "append".
    Index { array: NodeId<'ast>, index: Option<NodeId<'ast>> },
    /// `key => value` inside an array literal.
    KeyValue { key: NodeId<'ast>, value: NodeId<'ast> },
    Isset { expr: NodeId<'ast> },
    Exit { expr: NodeId<'ast> },
    Require { once: bool, expr: NodeId<'ast> },
    Print { expr: NodeId<'ast> },
    Array { items: &'ast [NodeId<'ast>] },
    Tuple { args: &'ast [NodeId<'ast>] },
    List { items: &'ast [NodeId<'ast>] },
    Define { args: &'ast [NodeId<'ast>] },
    Defined { args: &'ast [NodeId<'ast>] },
    Unset { args: &'ast [NodeId<'ast>] },
    VarDump { args: &'ast [NodeId<'ast>] },
    /// Placeholder: reserved slot or elided list element.
    Empty,
    /// Best-effort placeholder left behind by error recovery.
    Error,

    // ----- statements -----
    Seq { stmts: &'ast [NodeId<'ast>] },
    /// Comma-joined expression list whose value is the last element.
    SeqComma { exprs: &'ast [NodeId<'ast>] },
    If { cond: NodeId<'ast>, then: NodeId<'ast>, els: Option<NodeId<'ast>> },
    While { cond: NodeId<'ast>, body: NodeId<'ast> },
    DoWhile { cond: NodeId<'ast>, body: NodeId<'ast> },
    For {
        init: NodeId<'ast>,
        cond: NodeId<'ast>,
        post: NodeId<'ast>,
        body: NodeId<'ast>,
    },
    Foreach {
        params: NodeId<'ast>,
        body: NodeId<'ast>,
        temp: NodeId<'ast>,
    },
    /// `source as [key =>] value`; `iter_slot` is reserved for the iterator
    /// handle a later pass fills in.
    ForeachParam {
        source: NodeId<'ast>,
        value: NodeId<'ast>,
        iter_slot: NodeId<'ast>,
        key: Option<NodeId<'ast>>,
    },
    /// `temps` holds four reserved slots for loop-control temporaries that
    /// only exist once name generation runs.
    Switch {
        cond: NodeId<'ast>,
        temps: &'ast [NodeId<'ast>],
        cases: &'ast [NodeId<'ast>],
    },
    /// `value: None` is the `default:` arm.
    Case { value: Option<NodeId<'ast>>, body: NodeId<'ast> },
    Try {
        body: NodeId<'ast>,
        exception: NodeId<'ast>,
        catch: NodeId<'ast>,
    },
    Throw { expr: NodeId<'ast> },
    Return { expr: NodeId<'ast> },
    Break { level: NodeId<'ast> },
    Continue { level: NodeId<'ast> },
    Echo { expr: NodeId<'ast> },
    Global { var: NodeId<'ast> },
    StaticDecl { expr: NodeId<'ast> },
    /// `@stmt` error suppression.
    Noerr { stmt: NodeId<'ast> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitNot,
    Minus,
    Plus,
    PrefixInc,
    PrefixDec,
    PostfixInc,
    PostfixDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    Ne,
    Identical,
    NotIdentical,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    /// Operators that coerce both operands to boolean.
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::LogicalAnd
                | BinaryOp::LogicalOr
                | BinaryOp::LogicalXor
        )
    }

    /// Operators that coerce both operands to integer.
    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
    }

    /// Compound assignments whose right side is coerced to integer.
    pub fn assign_coerces_rhs_to_int(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }
}

/// One function parameter. `callback` is set for callback-typed parameters,
/// which carry their own nested parameter list instead of a value type.
#[derive(Debug, Clone, Copy)]
pub struct Param<'ast> {
    pub var: NodeId<'ast>,
    pub type_name: Option<&'ast str>,
    pub type_help: PrimitiveType,
    pub type_rule: Option<TypeHint<'ast>>,
    pub default: Option<NodeId<'ast>>,
    pub callback: Option<&'ast [Param<'ast>]>,
    pub loc: Loc,
}

impl<'ast> Param<'ast> {
    pub fn name(&self) -> &'ast str {
        self.var.var_name().unwrap_or("")
    }
}
