use crate::ast::ty::ConvKind;
use crate::ast::{BinaryOp, NodeId, NodeKind, Param, UnaryOp};

/// Render a node as a compact single-line s-expression. Used by the snapshot
/// tests and the driver's debug output.
pub fn print(node: NodeId<'_>) -> String {
    let mut f = SExprFormatter::new();
    f.node(node);
    f.finish()
}

pub struct SExprFormatter {
    output: String,
}

impl SExprFormatter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn head(&mut self, tag: &str, children: &[NodeId<'_>]) {
        self.write("(");
        self.write(tag);
        for child in children {
            self.write(" ");
            self.node(child);
        }
        self.write(")");
    }

    pub fn node(&mut self, node: NodeId<'_>) {
        match node.kind {
            NodeKind::Int { value } => {
                self.write("(int ");
                self.write(value);
                self.write(")");
            }
            NodeKind::Float { value } => {
                self.write("(float ");
                self.write(value);
                self.write(")");
            }
            NodeKind::Str { value } => {
                self.write("(str \"");
                self.write(value);
                self.write("\")");
            }
            NodeKind::Bool { value } => {
                self.write(if value { "(true)" } else { "(false)" });
            }
            NodeKind::Null => self.write("(null)"),
            NodeKind::CurrentFunction => self.write("(current-function)"),
            NodeKind::Var { name } => {
                self.write("(var $");
                self.write(name);
                if node.flags.by_ref {
                    self.write(" &");
                }
                if node.flags.superlocal {
                    self.write(" superlocal");
                }
                self.write(")");
            }
            NodeKind::StringBuild { parts } => self.head("string-build", parts),
            NodeKind::Conv { kind, expr } => {
                let tag = match kind {
                    ConvKind::Int => "conv-int",
                    ConvKind::Bool => "conv-bool",
                    ConvKind::Float => "conv-float",
                    ConvKind::String => "conv-string",
                    ConvKind::Array => "conv-array",
                };
                self.head(tag, &[expr]);
            }
            NodeKind::Unary { op, expr } => self.head(unary_tag(op), &[expr]),
            NodeKind::Binary { op, lhs, rhs } => self.head(binary_tag(op), &[lhs, rhs]),
            NodeKind::Assign { lhs, rhs } => self.head("assign", &[lhs, rhs]),
            NodeKind::AssignOp { op, lhs, rhs } => {
                self.write("(assign-");
                self.write(binary_tag(op));
                self.write(" ");
                self.node(lhs);
                self.write(" ");
                self.node(rhs);
                self.write(")");
            }
            NodeKind::Ternary { cond, then, els } => self.head("ternary", &[cond, then, els]),
            NodeKind::Move { expr } => self.head("move", &[expr]),
            NodeKind::FuncName { name } => {
                self.write("(func-name ");
                self.write(name);
                self.write(")");
            }
            NodeKind::FuncCall { name, args } => {
                self.write("(call ");
                self.write(name);
                for arg in args {
                    self.write(" ");
                    self.node(arg);
                }
                self.write(")");
            }
            NodeKind::ConstructorCall { class, args } => {
                self.write("(new ");
                self.write(class);
                for arg in args {
                    self.write(" ");
                    self.node(arg);
                }
                self.write(")");
            }
            NodeKind::MemberAccess { object, member } => self.head("member", &[object, member]),
            NodeKind::InstanceProp { object, name } => {
                self.write("(prop ");
                self.node(object);
                self.write(" ");
                self.write(name);
                self.write(")");
            }
            NodeKind::Index { array, index } => match index {
                Some(index) => self.head("index", &[array, index]),
                None => self.head("index-append", &[array]),
            },
            NodeKind::KeyValue { key, value } => self.head("=>", &[key, value]),
            NodeKind::Isset { expr } => self.head("isset", &[expr]),
            NodeKind::Exit { expr } => self.head("exit", &[expr]),
            NodeKind::Require { once, expr } => {
                self.head(if once { "require-once" } else { "require" }, &[expr]);
            }
            NodeKind::Print { expr } => self.head("print", &[expr]),
            NodeKind::Array { items } => self.head("array", items),
            NodeKind::Tuple { args } => self.head("tuple", args),
            NodeKind::List { items } => self.head("list", items),
            NodeKind::Define { args } => self.head("define", args),
            NodeKind::Defined { args } => self.head("defined", args),
            NodeKind::Unset { args } => self.head("unset", args),
            NodeKind::VarDump { args } => self.head("var-dump", args),
            NodeKind::Empty => self.write("(empty)"),
            NodeKind::Error => self.write("(error)"),

            NodeKind::Seq { stmts } => self.head("seq", stmts),
            NodeKind::SeqComma { exprs } => self.head("seq-comma", exprs),
            NodeKind::If { cond, then, els } => match els {
                Some(els) => self.head("if", &[cond, then, els]),
                None => self.head("if", &[cond, then]),
            },
            NodeKind::While { cond, body } => self.head("while", &[cond, body]),
            NodeKind::DoWhile { cond, body } => self.head("do-while", &[cond, body]),
            NodeKind::For {
                init,
                cond,
                post,
                body,
            } => self.head("for", &[init, cond, post, body]),
            NodeKind::Foreach { params, body, temp } => self.head("foreach", &[params, body, temp]),
            NodeKind::ForeachParam {
                source,
                value,
                iter_slot,
                key,
            } => match key {
                Some(key) => self.head("foreach-param", &[source, value, iter_slot, key]),
                None => self.head("foreach-param", &[source, value, iter_slot]),
            },
            NodeKind::Switch { cond, temps, cases } => {
                self.write("(switch ");
                self.node(cond);
                self.write(" ");
                self.head("temps", temps);
                for case in cases {
                    self.write(" ");
                    self.node(case);
                }
                self.write(")");
            }
            NodeKind::Case { value, body } => match value {
                Some(value) => self.head("case", &[value, body]),
                None => self.head("default", &[body]),
            },
            NodeKind::Try {
                body,
                exception,
                catch,
            } => self.head("try", &[body, exception, catch]),
            NodeKind::Throw { expr } => self.head("throw", &[expr]),
            NodeKind::Return { expr } => {
                if node.flags.void_return {
                    self.write("(return)");
                } else {
                    self.head("return", &[expr]);
                }
            }
            NodeKind::Break { level } => self.head("break", &[level]),
            NodeKind::Continue { level } => self.head("continue", &[level]),
            NodeKind::Echo { expr } => self.head("echo", &[expr]),
            NodeKind::Global { var } => self.head("global", &[var]),
            NodeKind::StaticDecl { expr } => self.head("static", &[expr]),
            NodeKind::Noerr { stmt } => self.head("noerr", &[stmt]),
        }
    }

    pub fn param(&mut self, param: &Param<'_>) {
        self.write("(param ");
        self.node(param.var);
        if let Some(type_name) = param.type_name {
            self.write(" :class ");
            self.write(type_name);
        }
        if let Some(default) = param.default {
            self.write(" :default ");
            self.node(default);
        }
        if param.callback.is_some() {
            self.write(" :callback");
        }
        self.write(")");
    }
}

fn unary_tag(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "not",
        UnaryOp::BitNot => "bit-not",
        UnaryOp::Minus => "neg",
        UnaryOp::Plus => "pos",
        UnaryOp::PrefixInc => "pre-inc",
        UnaryOp::PrefixDec => "pre-dec",
        UnaryOp::PostfixInc => "post-inc",
        UnaryOp::PostfixDec => "post-dec",
    }
}

fn binary_tag(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Concat => ".",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Identical => "===",
        BinaryOp::NotIdentical => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::LogicalAnd => "and",
        BinaryOp::LogicalOr => "or",
        BinaryOp::LogicalXor => "xor",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
    }
}
