/// Primitive types the front end knows about. Inference happens downstream;
/// the parser only records explicit conversions and declared rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Unknown,
    Int,
    Bool,
    Float,
    String,
    Array,
    Mixed,
    Tuple,
    Exception,
    Class,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => PrimitiveType::Int,
            "bool" => PrimitiveType::Bool,
            "float" => PrimitiveType::Float,
            "string" => PrimitiveType::String,
            "array" => PrimitiveType::Array,
            "var" | "mixed" => PrimitiveType::Mixed,
            "tuple" => PrimitiveType::Tuple,
            "Exception" => PrimitiveType::Exception,
            _ => return None,
        })
    }
}

/// Tag on explicit conversion nodes, both user-written casts and the
/// implicit coercions the parser inserts (boolean contexts, bitwise
/// operands, echoed values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvKind {
    Int,
    Bool,
    Float,
    String,
    Array,
}

/// A structural type rule. Rules are parsed but not checked here; they are
/// handed to the inference stage attached to nodes, parameters and function
/// descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule<'ast> {
    /// A primitive, optionally parameterized: `array<T>`, `tuple<A, B>`.
    Prim {
        ty: PrimitiveType,
        args: &'ast [&'ast TypeRule<'ast>],
    },
    /// Rule combinators: `lca<...>`, `or_false<...>`.
    Func {
        name: &'ast str,
        args: &'ast [&'ast TypeRule<'ast>],
    },
    /// `self`: the class currently being declared.
    SelfRef,
    /// "Instance of the named class"; used for receiver typing.
    Instance { class: &'ast str },
    /// `^n`: the type of the n-th argument of the annotated function.
    ArgRef { index: u32 },
    /// Element type of an argument back-reference: `^1[]`.
    Index { inner: &'ast TypeRule<'ast> },
    /// Call result of a callback-typed argument back-reference: `^1()`.
    CallbackCall { inner: &'ast TypeRule<'ast> },
    /// `CONST`-qualified rule.
    Const { inner: &'ast TypeRule<'ast> },
}

/// How a rule binds to the annotated item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleContext {
    /// `:::`: declared type, enforced by implicit cast at the boundary.
    Declare,
    /// `===`: the type is exactly this rule.
    Exact,
    /// `<==`: upper bound.
    UpperBound,
    /// `==>`: lower bound.
    LowerBound,
}

/// A rule together with its binding context; this is what gets attached to
/// nodes, parameters and return positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeHint<'ast> {
    pub context: RuleContext,
    pub rule: &'ast TypeRule<'ast>,
}
