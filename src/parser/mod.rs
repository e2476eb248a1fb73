pub mod decl;
pub mod expr;
pub mod transform;

use bumpalo::Bump;

use crate::ast::ty::ConvKind;
use crate::ast::{Node, NodeId, NodeKind};
use crate::cursor::TokenCursor;
use crate::diag::{Diagnostic, DiagnosticSink, FatalError};
use crate::loc::Loc;
use crate::registry::{
    FunctionDescriptor, FunctionFlags, FunctionId, FunctionKind, NameGen, Registry,
};
use crate::source::SourceUnit;
use crate::token::{Token, TokenKind};

/// What parsing one file produced. Functions, classes and defines land in
/// the shared registry; the unit's top-level code becomes `main_function`.
#[derive(Debug)]
pub struct UnitOutput {
    pub main_function: Option<FunctionId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse one pre-lexed file into the registry.
pub fn parse_unit<'ast>(
    arena: &'ast Bump,
    registry: &Registry<'ast>,
    unit: SourceUnit,
    tokens: &[Token<'_>],
) -> Result<UnitOutput, FatalError> {
    let cur = TokenCursor::new(tokens)?;
    let mut parser = Parser {
        arena,
        registry,
        cur,
        diag: DiagnosticSink::new(),
        unit,
        names: NameGen::new(),
        function_stack: Vec::new(),
        class_stack: Vec::new(),
        stop_at_ternary: false,
    };
    let main_function = parser.parse_unit_main();
    Ok(UnitOutput {
        main_function,
        diagnostics: parser.diag.into_diagnostics(),
    })
}

pub(crate) struct FunctionContext {
    pub name: String,
    pub kind: FunctionKind,
}

pub struct Parser<'a, 'ast, 'src> {
    pub(crate) arena: &'ast Bump,
    pub(crate) registry: &'a Registry<'ast>,
    pub(crate) cur: TokenCursor<'src>,
    pub diag: DiagnosticSink,
    pub unit: SourceUnit,
    pub(crate) names: NameGen,
    pub(crate) function_stack: Vec<FunctionContext>,
    pub(crate) class_stack: Vec<decl::ClassContext<'ast>>,
    /// Set while parsing a ternary else operand so a further `?` is left
    /// for the enclosing ternary to chain.
    pub(crate) stop_at_ternary: bool,
}

impl<'a, 'ast, 'src> Parser<'a, 'ast, 'src> {
    // ----- arena and token helpers -----

    pub(crate) fn node(&self, kind: NodeKind<'ast>, loc: Loc) -> NodeId<'ast> {
        self.arena.alloc(Node::new(kind, loc))
    }

    pub(crate) fn alloc_node(&self, node: Node<'ast>) -> NodeId<'ast> {
        self.arena.alloc(node)
    }

    pub(crate) fn intern(&self, s: &str) -> &'ast str {
        self.arena.alloc_str(s)
    }

    pub(crate) fn slice(&self, items: &[NodeId<'ast>]) -> &'ast [NodeId<'ast>] {
        self.arena.alloc_slice_copy(items)
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.cur.kind() == kind {
            self.cur.bump();
            true
        } else {
            false
        }
    }

    /// Require and consume a token, recording a diagnostic on mismatch.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Option<()> {
        if self.cur.kind() == kind {
            self.cur.bump();
            Some(())
        } else {
            let loc = self.cur.loc();
            self.diag
                .error(loc, format!("expected {what}, found {:?}", self.cur.kind()));
            None
        }
    }

    pub(crate) fn error_node(&self, loc: Loc) -> NodeId<'ast> {
        self.node(NodeKind::Error, loc)
    }

    /// Skip forward to a statement boundary after a parse failure. Stops
    /// after a `;`, or before a `}` so the enclosing block still closes.
    pub(crate) fn resync(&mut self) {
        loop {
            match self.cur.kind() {
                TokenKind::SemiColon => {
                    self.cur.bump();
                    return;
                }
                TokenKind::CloseBrace | TokenKind::End => return,
                _ => self.cur.bump(),
            }
        }
    }

    // ----- unit entry -----

    /// Parse the whole token stream. Top-level statements accumulate into a
    /// synthesized function named after the file, so every piece of code in
    /// the program lives in some function.
    fn parse_unit_main(&mut self) -> Option<FunctionId> {
        let loc = self.cur.loc();
        self.function_stack.push(FunctionContext {
            name: self.unit.main_func_name.clone(),
            kind: FunctionKind::UnitMain,
        });

        let mut stmts = Vec::new();
        let mut first = true;
        while !self.cur.at_end() {
            if self.cur.kind() == TokenKind::CloseBrace {
                let loc = self.cur.loc();
                self.diag.error(loc, "unmatched '}' at top level");
                self.cur.bump();
                continue;
            }
            if self.cur.kind() == TokenKind::Namespace && !first {
                let loc = self.cur.loc();
                self.diag
                    .error(loc, "namespace declaration must be the first statement");
            }
            stmts.push(self.stmt_or_recover());
            first = false;
        }

        self.function_stack.pop();

        let body = self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, loc);
        let body = self.force_return(body);
        let desc = FunctionDescriptor {
            name: self.unit.main_func_name.clone(),
            kind: FunctionKind::UnitMain,
            flags: FunctionFlags::default(),
            params: Vec::new(),
            root: Some(body),
            class: None,
            created_inside: None,
            file: self.unit.file_name.clone(),
            return_rule: None,
            loc,
        };
        match self.registry.register_function(desc) {
            Ok(id) => {
                self.registry.stream.push(id);
                Some(id)
            }
            Err(_) => {
                self.diag.error(
                    loc,
                    format!("duplicate source file entry '{}'", self.unit.main_func_name),
                );
                None
            }
        }
    }

    // ----- statements -----

    pub(crate) fn stmt_or_recover(&mut self) -> NodeId<'ast> {
        let loc = self.cur.loc();
        match self.parse_statement() {
            Some(stmt) => stmt,
            None => {
                self.resync();
                self.error_node(loc)
            }
        }
    }

    pub(crate) fn parse_statement(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        match self.cur.kind() {
            TokenKind::OpenBrace => self.parse_block(),
            TokenKind::SemiColon => {
                self.cur.bump();
                Some(self.node(NodeKind::Empty, loc))
            }
            TokenKind::At => {
                self.cur.bump();
                let stmt = self.parse_statement()?;
                Some(self.node(NodeKind::Noerr { stmt }, loc))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw => {
                self.cur.bump();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::SemiColon, "';' after throw")?;
                Some(self.node(NodeKind::Throw { expr }, loc))
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_break_continue(true),
            TokenKind::Continue => self.parse_break_continue(false),
            TokenKind::Echo => self.parse_echo(),
            TokenKind::Print => {
                self.cur.bump();
                let expr = self.parse_expression()?;
                let expr = self.conv_to(expr, ConvKind::String);
                self.expect(TokenKind::SemiColon, "';' after print")?;
                Some(self.node(NodeKind::Print { expr }, loc))
            }
            TokenKind::Require | TokenKind::RequireOnce => self.parse_require(),
            TokenKind::Global => self.parse_global(),
            TokenKind::Static if self.cur.peek(1).kind == TokenKind::Variable => {
                self.parse_static_decl()
            }
            TokenKind::Const => self.parse_const(),
            TokenKind::Function
            | TokenKind::ExternFunction
            | TokenKind::Throws
            | TokenKind::Resumable
            | TokenKind::Auto => self.parse_function_statement(false),
            TokenKind::Class => self.parse_class(),
            TokenKind::Namespace => self.parse_namespace(),
            TokenKind::Use => self.parse_use(),
            _ => {
                let expr = self.parse_expression()?;
                // a trailing type rule annotates the whole statement
                let expr = match self.parse_optional_rule()? {
                    Some(rule) => {
                        let mut node = *expr;
                        node.type_rule = Some(rule);
                        self.alloc_node(node)
                    }
                    None => expr,
                };
                self.expect(TokenKind::SemiColon, "';' after expression")?;
                Some(expr)
            }
        }
    }

    pub(crate) fn parse_block(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.expect(TokenKind::OpenBrace, "'{'")?;
        let mut stmts = Vec::new();
        while self.cur.kind() != TokenKind::CloseBrace {
            if self.cur.at_end() {
                self.diag.error(self.cur.loc(), "unclosed block");
                return None;
            }
            stmts.push(self.stmt_or_recover());
        }
        self.cur.bump();
        Some(self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, loc))
    }

    /// Loop and branch bodies are always sequences, even when written as a
    /// single statement.
    pub(crate) fn embrace(&mut self, stmt: NodeId<'ast>) -> NodeId<'ast> {
        match stmt.kind {
            NodeKind::Seq { .. } => stmt,
            _ => self.node(NodeKind::Seq { stmts: self.slice(&[stmt]) }, stmt.loc),
        }
    }

    fn parse_body(&mut self) -> Option<NodeId<'ast>> {
        if self.cur.kind() == TokenKind::OpenBrace {
            self.parse_block()
        } else {
            let stmt = self.parse_statement()?;
            Some(self.embrace(stmt))
        }
    }

    fn parse_if(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        self.expect(TokenKind::OpenParen, "'(' after 'if'")?;
        let cond = self.parse_expression()?;
        let cond = self.conv_to(cond, ConvKind::Bool);
        self.expect(TokenKind::CloseParen, "')' after condition")?;
        let then = self.parse_body()?;
        let els = if self.eat(TokenKind::Else) {
            if self.cur.kind() == TokenKind::If {
                let nested = self.parse_if()?;
                Some(self.embrace(nested))
            } else {
                Some(self.parse_body()?)
            }
        } else {
            None
        };
        Some(self.node(NodeKind::If { cond, then, els }, loc))
    }

    fn parse_while(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        self.expect(TokenKind::OpenParen, "'(' after 'while'")?;
        let cond = self.parse_expression()?;
        let cond = self.conv_to(cond, ConvKind::Bool);
        self.expect(TokenKind::CloseParen, "')' after condition")?;
        let body = self.parse_body()?;
        Some(self.node(NodeKind::While { cond, body }, loc))
    }

    fn parse_do_while(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let body = self.parse_body()?;
        self.expect(TokenKind::While, "'while' after do body")?;
        self.expect(TokenKind::OpenParen, "'(' after 'while'")?;
        let cond = self.parse_expression()?;
        let cond = self.conv_to(cond, ConvKind::Bool);
        self.expect(TokenKind::CloseParen, "')' after condition")?;
        self.expect(TokenKind::SemiColon, "';' after do-while")?;
        Some(self.node(NodeKind::DoWhile { cond, body }, loc))
    }

    /// `for (init; cond; post)`. Each clause is a comma list; only the last
    /// element of the condition list is coerced to boolean, the earlier ones
    /// are evaluated for effect.
    fn parse_for(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        self.expect(TokenKind::OpenParen, "'(' after 'for'")?;
        let init = self.parse_for_clause(TokenKind::SemiColon, false)?;
        self.expect(TokenKind::SemiColon, "';' in for")?;
        let cond = self.parse_for_clause(TokenKind::SemiColon, true)?;
        self.expect(TokenKind::SemiColon, "';' in for")?;
        let post = self.parse_for_clause(TokenKind::CloseParen, false)?;
        self.expect(TokenKind::CloseParen, "')' after for clauses")?;
        let body = self.parse_body()?;
        Some(self.node(NodeKind::For { init, cond, post, body }, loc))
    }

    fn parse_for_clause(&mut self, stop: TokenKind, is_cond: bool) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        if self.cur.kind() == stop {
            if is_cond {
                // an absent condition is an infinite loop
                return Some(self.node(NodeKind::Bool { value: true }, loc));
            }
            return Some(self.node(NodeKind::Empty, loc));
        }
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if is_cond {
            let last = exprs.pop().unwrap();
            exprs.push(self.conv_to(last, ConvKind::Bool));
        }
        if exprs.len() == 1 {
            return Some(exprs[0]);
        }
        Some(self.node(NodeKind::SeqComma { exprs: self.slice(&exprs) }, loc))
    }

    fn parse_foreach(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        self.expect(TokenKind::OpenParen, "'(' after 'foreach'")?;
        let source = self.parse_expression()?;
        self.expect(TokenKind::As, "'as' in foreach")?;
        let first = self.parse_foreach_target()?;
        let (key, value) = if self.eat(TokenKind::DoubleArrow) {
            if first.flags.by_ref {
                self.diag.error(first.loc, "foreach key cannot be by reference");
            }
            (Some(first), self.parse_foreach_target()?)
        } else {
            (None, first)
        };
        self.expect(TokenKind::CloseParen, "')' after foreach target")?;
        let body = self.parse_body()?;

        let param_loc = value.loc;
        let iter_slot = self.node(NodeKind::Empty, param_loc);
        let params = self.node(
            NodeKind::ForeachParam { source, value, iter_slot, key },
            param_loc,
        );
        // slot for the copied source when iterating by value
        let temp = self.node(NodeKind::Empty, param_loc);
        Some(self.node(NodeKind::Foreach { params, body, temp }, loc))
    }

    fn parse_foreach_target(&mut self) -> Option<NodeId<'ast>> {
        let by_ref = self.eat(TokenKind::Ampersand);
        let loc = self.cur.loc();
        if self.cur.kind() != TokenKind::Variable {
            self.diag.error(loc, "expected variable in foreach target");
            return None;
        }
        let name = self.intern(self.cur.text());
        self.cur.bump();
        let mut node = Node::new(NodeKind::Var { name }, loc);
        node.flags.by_ref = by_ref;
        Some(self.alloc_node(node))
    }

    fn parse_switch(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        self.expect(TokenKind::OpenParen, "'(' after 'switch'")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::CloseParen, "')' after switch subject")?;
        self.expect(TokenKind::OpenBrace, "'{' after switch")?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while self.cur.kind() != TokenKind::CloseBrace {
            let case_loc = self.cur.loc();
            let value = match self.cur.kind() {
                TokenKind::Case => {
                    self.cur.bump();
                    let value = self.parse_expression()?;
                    Some(value)
                }
                TokenKind::Default => {
                    if seen_default {
                        self.diag.error(case_loc, "duplicate default case");
                    }
                    seen_default = true;
                    self.cur.bump();
                    None
                }
                TokenKind::End => {
                    self.diag.error(self.cur.loc(), "unclosed switch");
                    return None;
                }
                _ => {
                    self.diag
                        .error(case_loc, "expected 'case' or 'default' in switch");
                    return None;
                }
            };
            self.expect(TokenKind::Colon, "':' after case label")?;
            let mut stmts = Vec::new();
            while !matches!(
                self.cur.kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::CloseBrace | TokenKind::End
            ) {
                stmts.push(self.stmt_or_recover());
            }
            let body = self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, case_loc);
            cases.push(self.node(NodeKind::Case { value, body }, case_loc));
        }
        self.cur.bump();

        // four slots for the matched flag and working temporaries the
        // lowering of fallthrough introduces later
        let temps: Vec<NodeId<'ast>> =
            (0..4).map(|_| self.node(NodeKind::Empty, loc)).collect();
        Some(self.node(
            NodeKind::Switch {
                cond,
                temps: self.slice(&temps),
                cases: self.slice(&cases),
            },
            loc,
        ))
    }

    fn parse_try(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let body = self.parse_block()?;
        self.expect(TokenKind::Catch, "'catch' after try block")?;
        self.expect(TokenKind::OpenParen, "'(' after 'catch'")?;
        match self.cur.kind() {
            TokenKind::Exception => self.cur.bump(),
            TokenKind::Identifier if self.cur.text() == "Exception" => self.cur.bump(),
            _ => {
                self.diag
                    .error(self.cur.loc(), "only 'Exception' can be caught");
                self.cur.bump();
            }
        }
        let exc_loc = self.cur.loc();
        if self.cur.kind() != TokenKind::Variable {
            self.diag.error(exc_loc, "expected exception variable");
            return None;
        }
        let name = self.intern(self.cur.text());
        self.cur.bump();
        let exception = self.node(NodeKind::Var { name }, exc_loc);
        self.expect(TokenKind::CloseParen, "')' after catch clause")?;
        let catch = self.parse_block()?;
        Some(self.node(NodeKind::Try { body, exception, catch }, loc))
    }

    fn parse_return(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        if self.eat(TokenKind::SemiColon) {
            let expr = self.node(NodeKind::Null, loc);
            let mut node = Node::new(NodeKind::Return { expr }, loc);
            node.flags.void_return = true;
            return Some(self.alloc_node(node));
        }
        let expr = self.parse_expression()?;
        self.expect(TokenKind::SemiColon, "';' after return value")?;
        Some(self.node(NodeKind::Return { expr }, loc))
    }

    fn parse_break_continue(&mut self, is_break: bool) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let level = if self.cur.kind() == TokenKind::IntLiteral {
            let value = self.intern(self.cur.text());
            self.cur.bump();
            self.node(NodeKind::Int { value }, loc)
        } else {
            self.node(NodeKind::Int { value: "1" }, loc)
        };
        self.expect(TokenKind::SemiColon, "';' after break/continue")?;
        Some(if is_break {
            self.node(NodeKind::Break { level }, loc)
        } else {
            self.node(NodeKind::Continue { level }, loc)
        })
    }

    fn parse_echo(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let mut stmts = Vec::new();
        loop {
            let expr = self.parse_expression()?;
            let expr = self.conv_to(expr, ConvKind::String);
            stmts.push(self.node(NodeKind::Echo { expr }, loc));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::SemiColon, "';' after echo")?;
        if stmts.len() == 1 {
            return Some(stmts[0]);
        }
        Some(self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, loc))
    }

    fn parse_require(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        let once = self.cur.kind() == TokenKind::RequireOnce;
        self.cur.bump();
        let mut stmts = Vec::new();
        loop {
            let expr = self.parse_expression()?;
            stmts.push(self.node(NodeKind::Require { once, expr }, loc));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::SemiColon, "';' after require")?;
        if stmts.len() == 1 {
            return Some(stmts[0]);
        }
        Some(self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, loc))
    }

    fn parse_global(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let mut stmts = Vec::new();
        loop {
            let var_loc = self.cur.loc();
            if self.cur.kind() != TokenKind::Variable {
                self.diag.error(var_loc, "expected variable after 'global'");
                return None;
            }
            let name = self.intern(self.cur.text());
            self.cur.bump();
            let var = self.node(NodeKind::Var { name }, var_loc);
            stmts.push(self.node(NodeKind::Global { var }, var_loc));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::SemiColon, "';' after global")?;
        if stmts.len() == 1 {
            return Some(stmts[0]);
        }
        Some(self.node(NodeKind::Seq { stmts: self.slice(&stmts) }, loc))
    }

    fn parse_static_decl(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        let mut exprs = Vec::new();
        loop {
            let var_loc = self.cur.loc();
            if self.cur.kind() != TokenKind::Variable {
                self.diag.error(var_loc, "expected variable after 'static'");
                return None;
            }
            let name = self.intern(self.cur.text());
            self.cur.bump();
            let var = self.node(NodeKind::Var { name }, var_loc);
            let item = if self.eat(TokenKind::Eq) {
                let rhs = self.parse_expression()?;
                self.node(NodeKind::Assign { lhs: var, rhs }, var_loc)
            } else {
                var
            };
            exprs.push(item);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::SemiColon, "';' after static declaration")?;
        let expr = if exprs.len() == 1 {
            exprs[0]
        } else {
            self.node(NodeKind::SeqComma { exprs: self.slice(&exprs) }, loc)
        };
        Some(self.node(NodeKind::StaticDecl { expr }, loc))
    }

    /// `const NAME = expr;` outside a class registers a global define.
    fn parse_const(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        if self.cur.kind() != TokenKind::Identifier {
            self.diag.error(self.cur.loc(), "expected constant name");
            return None;
        }
        let name = self.intern(self.cur.text());
        self.cur.bump();
        self.expect(TokenKind::Eq, "'=' in constant declaration")?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::SemiColon, "';' after constant")?;
        if !self.registry.register_define(name, value) {
            self.diag.error(loc, format!("constant '{name}' already defined"));
        }
        let name_node = self.node(NodeKind::Str { value: name }, loc);
        Some(self.node(
            NodeKind::Define { args: self.slice(&[name_node, value]) },
            loc,
        ))
    }

    fn parse_namespace(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        if self.cur.kind() != TokenKind::Identifier {
            self.diag.error(self.cur.loc(), "expected namespace name");
            return None;
        }
        let name = self.cur.text().to_string();
        self.cur.bump();
        self.expect(TokenKind::SemiColon, "';' after namespace")?;
        let expected = self.unit.expected_namespace();
        if name != expected {
            self.diag.error(
                loc,
                format!(
                    "namespace '{name}' does not match file location, expected '{expected}'"
                ),
            );
        }
        self.unit.namespace_name = name;
        Some(self.node(NodeKind::Empty, loc))
    }

    fn parse_use(&mut self) -> Option<NodeId<'ast>> {
        let loc = self.cur.loc();
        self.cur.bump();
        if !self.function_stack.iter().all(|f| f.kind == FunctionKind::UnitMain) {
            self.diag.error(loc, "'use' is only allowed at the top level");
        }
        if self.cur.kind() != TokenKind::Identifier {
            self.diag.error(self.cur.loc(), "expected class name after 'use'");
            return None;
        }
        let full = self.cur.text().to_string();
        self.cur.bump();
        let alias = if self.eat(TokenKind::As) {
            if self.cur.kind() != TokenKind::Identifier {
                self.diag.error(self.cur.loc(), "expected alias after 'as'");
                return None;
            }
            let alias = self.cur.text().to_string();
            self.cur.bump();
            alias
        } else {
            full.rsplit('\\').next().unwrap_or(&full).to_string()
        };
        self.expect(TokenKind::SemiColon, "';' after use")?;
        if !self.unit.add_use(&alias, &full) {
            self.diag
                .warning(loc, format!("use alias '{alias}' already declared, ignored"));
        }
        Some(self.node(NodeKind::Empty, loc))
    }
}
