#![allow(dead_code)]

use bumpalo::Bump;
use php_frontend::ast::sexpr;
use php_frontend::diag::Diagnostic;
use php_frontend::parse_unit;
use php_frontend::registry::Registry;
use php_frontend::source::SourceUnit;
use php_frontend::token::{Token, TokenKind};

pub fn t(kind: TokenKind) -> Token<'static> {
    Token::new(kind, "", 1)
}

pub fn tx(kind: TokenKind, text: &'static str) -> Token<'static> {
    Token::new(kind, text, 1)
}

pub fn var(name: &'static str) -> Token<'static> {
    tx(TokenKind::Variable, name)
}

pub fn ident(name: &'static str) -> Token<'static> {
    tx(TokenKind::Identifier, name)
}

pub fn int(value: &'static str) -> Token<'static> {
    tx(TokenKind::IntLiteral, value)
}

pub fn string(value: &'static str) -> Token<'static> {
    tx(TokenKind::StringLiteral, value)
}

/// Terminate a hand-built token stream.
pub fn stream(body: &[Token<'static>]) -> Vec<Token<'static>> {
    let mut tokens = body.to_vec();
    tokens.push(t(TokenKind::End));
    tokens
}

/// Parse `body` as the file `test.php` and return the rendered body of the
/// synthesized top-level function together with the diagnostics.
pub fn parse_main(body: &[Token<'static>]) -> (String, Vec<Diagnostic>) {
    let tokens = stream(body);
    let arena = Bump::new();
    let registry = Registry::new();
    let unit = SourceUnit::new("test.php", "");
    let out = parse_unit(&arena, &registry, unit, &tokens).expect("token stream is well formed");
    let main = out.main_function.expect("unit main function");
    let root = registry.function(main).root.expect("unit main body");
    (sexpr::print(root), out.diagnostics)
}

/// Like [`parse_main`] but asserts the parse was clean.
pub fn parse_main_ok(body: &[Token<'static>]) -> String {
    let (rendered, diagnostics) = parse_main(body);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    rendered
}
