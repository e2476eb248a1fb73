mod common;

use bumpalo::Bump;
use common::*;
use php_frontend::ast::sexpr;
use php_frontend::ast::ty::{RuleContext, TypeRule};
use php_frontend::parse_unit;
use php_frontend::registry::{FunctionKind, Registry};
use php_frontend::source::SourceUnit;
use php_frontend::token::TokenKind as T;

#[test]
fn extern_prototype_keeps_flags_and_rules() {
    let tokens = stream(&[
        t(T::Throws),
        t(T::ExternFunction),
        ident("f"),
        t(T::OpenParen),
        var("x"),
        t(T::TripleColon),
        ident("int"),
        t(T::CloseParen),
        t(T::TripleColon),
        ident("int"),
        t(T::SemiColon),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let f = registry.function(registry.lookup_function("f").unwrap());
    assert_eq!(f.kind, FunctionKind::Extern);
    assert!(f.flags.throws);
    assert!(f.root.is_none());
    assert_eq!(f.params.len(), 1);
    let rule = f.params[0].type_rule.expect("parameter rule");
    assert_eq!(rule.context, RuleContext::Declare);
    assert!(matches!(rule.rule, TypeRule::Prim { .. }));
    assert!(f.return_rule.is_some());
    drop(f);
    // prototypes are not queued for compilation, only the unit main is
    let queued = registry.stream.drain();
    assert_eq!(queued, vec![out.main_function.unwrap()]);
}

#[test]
fn definition_replaces_the_prototype() {
    let tokens = stream(&[
        t(T::ExternFunction),
        ident("f"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::SemiColon),
        t(T::Function),
        ident("f"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Return),
        int("1"),
        t(T::SemiColon),
        t(T::CloseBrace),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let f = registry.function(registry.lookup_function("f").unwrap());
    assert_eq!(f.kind, FunctionKind::Global);
    assert_eq!(sexpr::print(f.root.unwrap()), "(seq (return (int 1)))");
}

#[test]
fn redeclaring_a_function_is_reported() {
    let tokens = stream(&[
        t(T::Function),
        ident("g"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
        t(T::Function),
        ident("g"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(
        out.diagnostics
            .iter()
            .any(|d| d.message.contains("already declared"))
    );
}

#[test]
fn nested_functions_are_local() {
    let tokens = stream(&[
        t(T::Function),
        ident("outer"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Function),
        ident("inner"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
        t(T::CloseBrace),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let outer = registry.function(registry.lookup_function("outer").unwrap());
    assert_eq!(outer.kind, FunctionKind::Global);
    drop(outer);
    let inner = registry.function(registry.lookup_function("inner").unwrap());
    assert_eq!(inner.kind, FunctionKind::Local);
}

#[test]
fn a_body_without_return_gets_a_void_one() {
    let tokens = stream(&[
        t(T::Function),
        ident("f"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Echo),
        int("1"),
        t(T::SemiColon),
        t(T::CloseBrace),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let f = registry.function(registry.lookup_function("f").unwrap());
    assert_eq!(
        sexpr::print(f.root.unwrap()),
        "(seq (echo (conv-string (int 1))) (return))"
    );
}

#[test]
fn declared_functions_are_queued_in_order() {
    let tokens = stream(&[
        t(T::Function),
        ident("a"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
        t(T::Function),
        ident("b"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let queued = registry.stream.drain();
    let names: Vec<String> = queued
        .iter()
        .map(|&id| registry.function(id).name.clone())
        .collect();
    assert_eq!(names, ["a", "b", "src_test"]);
    assert_eq!(Some(queued[2]), out.main_function);
}
