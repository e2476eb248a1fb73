use crate::ast::ty::ConvKind;
use crate::ast::{BinaryOp, Node, NodeId, NodeKind, UnaryOp};
use crate::op_info::{
    self, Fixity, InfixKind, NOT_PRIORITY, PRIORITY_BEGIN, PRIORITY_END, TERNARY_PRIORITY,
};
use crate::parser::Parser;
use crate::loc::Loc;
use crate::token::TokenKind;

impl<'a, 'ast, 'src> Parser<'a, 'ast, 'src> {
    pub(crate) fn parse_expression(&mut self) -> Option<NodeId<'ast>> {
        // a fresh expression, e.g. inside parentheses or an argument list,
        // is never cut short by an enclosing ternary
        let outer = std::mem::replace(&mut self.stop_at_ternary, false);
        let result = self.parse_binary(PRIORITY_BEGIN);
        self.stop_at_ternary = outer;
        result
    }

    /// Parse a binary expression at one priority band, climbing into the
    /// next band for operands. Each band first checks for its own prefix
    /// operators so unary minus and friends bind at the right tightness.
    pub(crate) fn parse_binary(&mut self, priority: u8) -> Option<NodeId<'ast>> {
        if priority == PRIORITY_END {
            return self.parse_postfix_expr();
        }
        if let Some(op) = op_info::unary_op(self.cur.kind(), priority) {
            let loc = self.cur.loc();
            self.cur.bump();
            let expr = self.parse_binary(priority)?;
            let expr = match op {
                UnaryOp::Not => self.conv_to(expr, ConvKind::Bool),
                UnaryOp::BitNot => self.conv_to(expr, ConvKind::Int),
                _ => expr,
            };
            return Some(self.node(NodeKind::Unary { op, expr }, loc));
        }
        if priority == TERNARY_PRIORITY {
            return self.parse_ternary_band();
        }

        let mut lhs = self.parse_binary(priority + 1)?;
        while let Some(info) = op_info::infix_op(self.cur.kind(), priority) {
            let loc = self.cur.loc();
            self.cur.bump();
            let rhs = match info.fixity {
                Fixity::Right => self.parse_binary(priority)?,
                Fixity::Left => self.parse_binary(priority + 1)?,
            };
            lhs = self.build_infix(info.kind, lhs, rhs, loc);
            if info.fixity == Fixity::Right {
                break;
            }
        }
        Some(lhs)
    }

    fn build_infix(
        &mut self,
        kind: InfixKind,
        lhs: NodeId<'ast>,
        rhs: NodeId<'ast>,
        loc: Loc,
    ) -> NodeId<'ast> {
        match kind {
            InfixKind::Assign => self.node(NodeKind::Assign { lhs, rhs }, loc),
            InfixKind::AssignOp(op) => {
                let rhs = if op.assign_coerces_rhs_to_int() {
                    self.conv_to(rhs, ConvKind::Int)
                } else {
                    rhs
                };
                self.node(NodeKind::AssignOp { op, lhs, rhs }, loc)
            }
            InfixKind::Binary(op) => {
                let (lhs, rhs) = if op.is_logical() {
                    (self.conv_to(lhs, ConvKind::Bool), self.conv_to(rhs, ConvKind::Bool))
                } else if op.is_bitwise() {
                    (self.conv_to(lhs, ConvKind::Int), self.conv_to(rhs, ConvKind::Int))
                } else {
                    (lhs, rhs)
                };
                self.node(NodeKind::Binary { op, lhs, rhs }, loc)
            }
        }
    }

    /// The ternary band. `a ? b : c` loops so chained ternaries associate
    /// to the left; `a ?: c` is rewritten so the condition is evaluated
    /// once through a hidden temporary.
    fn parse_ternary_band(&mut self) -> Option<NodeId<'ast>> {
        let mut result = self.parse_binary(TERNARY_PRIORITY + 1)?;
        if self.stop_at_ternary {
            return Some(result);
        }
        while self.cur.kind() == TokenKind::Question {
            let loc = self.cur.loc();
            self.cur.bump();
            if self.eat(TokenKind::Colon) {
                let els = self.parse_else_operand()?;
                result = self.create_shorthand_ternary(result, els, loc);
            } else {
                let then = self.parse_expression()?;
                self.expect(TokenKind::Colon, "':' in ternary")?;
                let els = self.parse_else_operand()?;
                let cond = self.conv_to(result, ConvKind::Bool);
                result = self.node(NodeKind::Ternary { cond, then, els }, loc);
            }
        }
        Some(result)
    }

    /// The else operand spans the rest of the expression, including the
    /// keyword logical operators and assignments, but stops before a
    /// further `?` so the enclosing loop chains it.
    fn parse_else_operand(&mut self) -> Option<NodeId<'ast>> {
        let outer = std::mem::replace(&mut self.stop_at_ternary, true);
        let els = self.parse_binary(PRIORITY_BEGIN);
        self.stop_at_ternary = outer;
        els
    }

    // ----- postfix and primary -----

    fn parse_postfix_expr(&mut self) -> Option<NodeId<'ast>> {
        let mut expr = self.parse_primary()?;
        loop {
            let loc = self.cur.loc();
            match self.cur.kind() {
                TokenKind::OpenBracket => {
                    self.cur.bump();
                    let index = if self.cur.kind() == TokenKind::CloseBracket {
                        None
                    } else {
                        Some(self.parse_expression()?)
                    };
                    self.expect(TokenKind::CloseBracket, "']' after index")?;
                    expr = self.node(NodeKind::Index { array: expr, index }, loc);
                }
                TokenKind::OpenBrace => {
                    self.cur.bump();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::CloseBrace, "'}' after index")?;
                    expr = self.node(NodeKind::Index { array: expr, index: Some(index) }, loc);
                }
                TokenKind::Arrow => {
                    self.cur.bump();
                    let member = self.parse_member_rhs()?;
                    expr = self.node(NodeKind::MemberAccess { object: expr, member }, loc);
                }
                TokenKind::OpenParen => {
                    // calling a computed value invokes it as a callable
                    let args = self.parse_call_args()?;
                    let member = self.node(
                        NodeKind::FuncCall { name: "__invoke", args },
                        loc,
                    );
                    expr = self.node(NodeKind::MemberAccess { object: expr, member }, loc);
                }
                TokenKind::Inc => {
                    self.cur.bump();
                    expr = self.node(NodeKind::Unary { op: UnaryOp::PostfixInc, expr }, loc);
                }
                TokenKind::Dec => {
                    self.cur.bump();
                    expr = self.node(NodeKind::Unary { op: UnaryOp::PostfixDec, expr }, loc);
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_member_rhs(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        match self.cur.kind() {
            TokenKind::Identifier => {
                let name = self.intern(self.cur.text());
                self.cur.bump();
                if self.cur.kind() == TokenKind::OpenParen {
                    let args = self.parse_call_args()?;
                    Some(self.node(NodeKind::FuncCall { name, args }, loc))
                } else {
                    Some(self.node(NodeKind::FuncName { name }, loc))
                }
            }
            _ => {
                self.diag.error(loc, "expected member name after '->'");
                None
            }
        }
    }

    fn parse_primary(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        match self.cur.kind() {
            TokenKind::IntLiteral => {
                let value = self.intern(self.cur.text());
                self.cur.bump();
                Some(self.node(NodeKind::Int { value }, loc))
            }
            TokenKind::FloatLiteral => {
                let value = self.intern(self.cur.text());
                self.cur.bump();
                Some(self.node(NodeKind::Float { value }, loc))
            }
            TokenKind::StringLiteral => {
                let value = self.intern(self.cur.text());
                self.cur.bump();
                Some(self.node(NodeKind::Str { value }, loc))
            }
            TokenKind::True => {
                self.cur.bump();
                Some(self.node(NodeKind::Bool { value: true }, loc))
            }
            TokenKind::False => {
                self.cur.bump();
                Some(self.node(NodeKind::Bool { value: false }, loc))
            }
            TokenKind::Null => {
                self.cur.bump();
                Some(self.node(NodeKind::Null, loc))
            }
            TokenKind::MagicLine => {
                self.cur.bump();
                let value = self.intern(&loc.line.to_string());
                Some(self.node(NodeKind::Int { value }, loc))
            }
            TokenKind::MagicFile => {
                self.cur.bump();
                let value = self.intern(&self.unit.file_name);
                Some(self.node(NodeKind::Str { value }, loc))
            }
            TokenKind::MagicFunction => {
                self.cur.bump();
                Some(self.node(NodeKind::CurrentFunction, loc))
            }
            TokenKind::Variable => {
                let name = self.intern(self.cur.text());
                self.cur.bump();
                Some(self.node(NodeKind::Var { name }, loc))
            }
            TokenKind::Identifier => {
                let name = self.intern(self.cur.text());
                self.cur.bump();
                if self.cur.kind() == TokenKind::OpenParen {
                    let args = self.parse_call_args()?;
                    Some(self.node(NodeKind::FuncCall { name, args }, loc))
                } else {
                    Some(self.node(NodeKind::FuncName { name }, loc))
                }
            }
            TokenKind::OpenParen => {
                self.cur.bump();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::CloseParen, "')'")?;
                let mut node = *inner;
                node.flags.parenthesized = true;
                Some(self.alloc_node(node))
            }
            TokenKind::ConvInt
            | TokenKind::ConvBool
            | TokenKind::ConvFloat
            | TokenKind::ConvString
            | TokenKind::ConvArray => {
                let kind = match self.cur.kind() {
                    TokenKind::ConvInt => ConvKind::Int,
                    TokenKind::ConvBool => ConvKind::Bool,
                    TokenKind::ConvFloat => ConvKind::Float,
                    TokenKind::ConvString => ConvKind::String,
                    _ => ConvKind::Array,
                };
                self.cur.bump();
                let expr = self.parse_binary(NOT_PRIORITY)?;
                Some(self.node(NodeKind::Conv { kind, expr }, loc))
            }
            TokenKind::New => self.parse_constructor_call(),
            TokenKind::Isset => self.parse_isset(),
            TokenKind::Unset => {
                self.cur.bump();
                let args = self.parse_call_args()?;
                Some(self.node(NodeKind::Unset { args }, loc))
            }
            TokenKind::VarDump => {
                self.cur.bump();
                let args = self.parse_call_args()?;
                Some(self.node(NodeKind::VarDump { args }, loc))
            }
            TokenKind::Defined => {
                self.cur.bump();
                let args = self.parse_call_args()?;
                Some(self.node(NodeKind::Defined { args }, loc))
            }
            TokenKind::Define => {
                self.cur.bump();
                let args = self.parse_call_args()?;
                if let &[name, value] = args {
                    if let NodeKind::Str { value: name } = name.kind {
                        if !self.registry.register_define(name, value) {
                            self.diag
                                .error(loc, format!("constant '{name}' already defined"));
                        }
                    }
                } else {
                    self.diag.error(loc, "define() takes exactly two arguments");
                }
                Some(self.node(NodeKind::Define { args }, loc))
            }
            TokenKind::List => self.parse_list_literal(),
            TokenKind::Tuple => {
                self.cur.bump();
                let args = self.parse_call_args()?;
                if args.is_empty() {
                    self.diag.error(loc, "tuple() needs at least one element");
                }
                Some(self.node(NodeKind::Tuple { args }, loc))
            }
            TokenKind::Array => {
                self.cur.bump();
                self.expect(TokenKind::OpenParen, "'(' after 'array'")?;
                self.parse_array_items(TokenKind::CloseParen, loc)
            }
            TokenKind::OpenBracket => {
                self.cur.bump();
                self.parse_array_items(TokenKind::CloseBracket, loc)
            }
            TokenKind::StrBegin => self.parse_string_build(),
            TokenKind::Exit => {
                self.cur.bump();
                let expr = if self.eat(TokenKind::OpenParen) {
                    if self.eat(TokenKind::CloseParen) {
                        self.node(NodeKind::Int { value: "0" }, loc)
                    } else {
                        let expr = self.parse_expression()?;
                        self.expect(TokenKind::CloseParen, "')' after exit code")?;
                        expr
                    }
                } else {
                    self.node(NodeKind::Int { value: "0" }, loc)
                };
                Some(self.node(NodeKind::Exit { expr }, loc))
            }
            TokenKind::Function => self.parse_lambda(),
            _ => {
                self.diag.error(
                    loc,
                    format!("unexpected {:?} in expression", self.cur.kind()),
                );
                None
            }
        }
    }

    fn parse_constructor_call(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let raw = match self.cur.kind() {
            TokenKind::Identifier => self.cur.text().to_string(),
            TokenKind::Exception => "Exception".to_string(),
            _ => {
                self.diag.error(self.cur.loc(), "expected class name after 'new'");
                return None;
            }
        };
        self.cur.bump();
        let class = self.intern(&self.unit.resolve_class_name(&raw));
        let args = if self.cur.kind() == TokenKind::OpenParen {
            self.parse_call_args()?
        } else {
            self.slice(&[])
        };
        Some(self.node(NodeKind::ConstructorCall { class, args }, loc))
    }

    /// `isset(a, b, ...)` folds into a conjunction of single checks.
    fn parse_isset(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let args = self.parse_call_args()?;
        if args.is_empty() {
            self.diag.error(loc, "isset() needs at least one argument");
            return None;
        }
        let mut result = self.node(NodeKind::Isset { expr: args[0] }, loc);
        for &arg in &args[1..] {
            let rhs = self.node(NodeKind::Isset { expr: arg }, loc);
            result = self.node(
                NodeKind::Binary { op: BinaryOp::And, lhs: result, rhs },
                loc,
            );
        }
        Some(result)
    }

    /// Argument list of a call. Empty elements are an error; call sites do
    /// not allow trailing commas.
    pub(crate) fn parse_call_args(&mut self) -> Option<&'ast [NodeId<'ast>]> {
        self.expect(TokenKind::OpenParen, "'('")?;
        let mut args = Vec::new();
        if self.eat(TokenKind::CloseParen) {
            return Some(self.slice(&args));
        }
        loop {
            if matches!(self.cur.kind(), TokenKind::Comma | TokenKind::CloseParen) {
                self.diag.error(self.cur.loc(), "empty argument in call");
                return None;
            }
            args.push(self.parse_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')' after arguments")?;
        Some(self.slice(&args))
    }

    /// Array literal body, after the opening token. Trailing commas are
    /// allowed; `k => v` pairs become key-value nodes.
    fn parse_array_items(
        &mut self,
        close: TokenKind,
        loc: Loc,
    ) -> Option<NodeId<'ast>> {
        let mut items = Vec::new();
        while self.cur.kind() != close {
            if self.cur.at_end() {
                self.diag.error(self.cur.loc(), "unclosed array literal");
                return None;
            }
            let item_loc = self.cur.loc();
            let item = self.parse_expression()?;
            let item = if self.eat(TokenKind::DoubleArrow) {
                let value = self.parse_expression()?;
                self.node(NodeKind::KeyValue { key: item, value }, item_loc)
            } else {
                item
            };
            items.push(item);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(close, "closing bracket of array literal")?;
        Some(self.node(NodeKind::Array { items: self.slice(&items) }, loc))
    }

    /// `list(...)` destructuring target. Skipped positions keep a
    /// placeholder so element indices stay aligned.
    fn parse_list_literal(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        self.expect(TokenKind::OpenParen, "'(' after 'list'")?;
        let mut items = Vec::new();
        loop {
            match self.cur.kind() {
                TokenKind::Comma => {
                    items.push(self.node(NodeKind::Empty, self.cur.loc()));
                    self.cur.bump();
                    continue;
                }
                TokenKind::CloseParen => {
                    items.push(self.node(NodeKind::Empty, self.cur.loc()));
                    break;
                }
                _ => {}
            }
            let target = self.parse_expression()?;
            if !is_lvalue(target) {
                self.diag.error(target.loc, "list() target must be assignable");
            }
            items.push(target);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')' after list targets")?;
        Some(self.node(NodeKind::List { items: self.slice(&items) }, loc))
    }

    /// Interpolated string: fragments and embedded expressions concatenate
    /// in order. A lone literal fragment collapses to a plain string.
    fn parse_string_build(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.expect(TokenKind::StrBegin, "string start")?;
        let mut parts: Vec<NodeId<'ast>> = Vec::new();
        let mut last_was_var = false;
        loop {
            let part_loc = self.cur.loc();
            match self.cur.kind() {
                TokenKind::StrFragment => {
                    if last_was_var && self.cur.text().starts_with('[') {
                        self.diag.warning(
                            part_loc,
                            "indexing a variable inside a string needs curly braces",
                        );
                    }
                    let value = self.intern(self.cur.text());
                    self.cur.bump();
                    parts.push(self.node(NodeKind::Str { value }, part_loc));
                    last_was_var = false;
                }
                TokenKind::Variable => {
                    let name = self.intern(self.cur.text());
                    self.cur.bump();
                    parts.push(self.node(NodeKind::Var { name }, part_loc));
                    last_was_var = true;
                }
                TokenKind::ExprBegin => {
                    self.cur.bump();
                    let expr = self.parse_expression()?;
                    self.expect(TokenKind::ExprEnd, "'}' after embedded expression")?;
                    parts.push(expr);
                    last_was_var = false;
                }
                TokenKind::StrEnd => {
                    self.cur.bump();
                    break;
                }
                _ => {
                    self.diag.error(part_loc, "unterminated interpolated string");
                    return None;
                }
            }
        }
        match parts.as_slice() {
            [] => Some(self.node(NodeKind::Str { value: "" }, loc)),
            &[single] if matches!(single.kind, NodeKind::Str { .. }) => Some(single),
            _ => Some(self.node(NodeKind::StringBuild { parts: self.slice(&parts) }, loc)),
        }
    }
}

fn is_lvalue(node: &Node<'_>) -> bool {
    matches!(
        node.kind,
        NodeKind::Var { .. }
            | NodeKind::Index { .. }
            | NodeKind::MemberAccess { .. }
            | NodeKind::InstanceProp { .. }
    )
}
