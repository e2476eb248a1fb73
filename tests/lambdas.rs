mod common;

use bumpalo::Bump;
use common::*;
use php_frontend::ast::sexpr;
use php_frontend::parse_unit;
use php_frontend::registry::Registry;
use php_frontend::source::SourceUnit;
use php_frontend::token::TokenKind as T;

fn lambda_tokens() -> Vec<php_frontend::token::Token<'static>> {
    // $f = function ($x) use ($c) { return $x + $c; };
    stream(&[
        var("f"),
        t(T::Eq),
        t(T::Function),
        t(T::OpenParen),
        var("x"),
        t(T::CloseParen),
        t(T::Use),
        t(T::OpenParen),
        var("c"),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Return),
        var("x"),
        t(T::Plus),
        var("c"),
        t(T::SemiColon),
        t(T::CloseBrace),
        t(T::SemiColon),
    ])
}

#[test]
fn lambda_becomes_a_hidden_class_allocation() {
    let tokens = lambda_tokens();
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let main = registry.function(out.main_function.unwrap());
    assert_eq!(
        sexpr::print(main.root.unwrap()),
        "(seq (assign (var $f) (new Lambda$src_test$u0 (var $c))) (return))"
    );
}

#[test]
fn captures_become_fields_read_through_the_receiver() {
    let tokens = lambda_tokens();
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let class = registry.class(registry.lookup_class("Lambda$src_test$u0").unwrap());
    assert!(class.is_lambda);
    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "c");
    let ctor = class.constructor.unwrap();
    drop(class);

    let invoke_id = registry
        .lookup_function("Lambda$src_test$u0$$__invoke")
        .expect("generated __invoke");
    let invoke = registry.function(invoke_id);
    assert_eq!(invoke.created_inside.as_deref(), Some("src_test"));
    assert_eq!(invoke.params.len(), 2);
    assert_eq!(invoke.params[0].name(), "this");
    assert_eq!(invoke.params[1].name(), "x");
    assert_eq!(
        sexpr::print(invoke.root.unwrap()),
        "(seq (return (+ (var $x) (prop (var $this) c))))"
    );
    drop(invoke);

    assert_eq!(
        sexpr::print(registry.function(ctor).root.unwrap()),
        "(seq (var $this) (assign (prop (var $this) c) (var $c)) (return (var $this)))"
    );
}

#[test]
fn this_in_a_method_lambda_rides_along_as_a_field() {
    let tokens = stream(&[
        t(T::Class),
        ident("A"),
        t(T::OpenBrace),
        t(T::Function),
        ident("m"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Return),
        t(T::Function),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Return),
        var("this"),
        t(T::SemiColon),
        t(T::CloseBrace),
        t(T::SemiColon),
        t(T::CloseBrace),
        t(T::CloseBrace),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let class = registry.class(registry.lookup_class("Lambda$src_test$u0").unwrap());
    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "parent$this");
    drop(class);

    let invoke = registry
        .function(registry.lookup_function("Lambda$src_test$u0$$__invoke").unwrap());
    assert_eq!(
        sexpr::print(invoke.root.unwrap()),
        "(seq (return (prop (var $this) parent$this)))"
    );
    drop(invoke);

    // the enclosing method allocates the lambda and passes its own $this
    let method = registry.function(registry.lookup_function("A$$m").unwrap());
    assert_eq!(
        sexpr::print(method.root.unwrap()),
        "(seq (return (new Lambda$src_test$u0 (var $this))))"
    );
}

#[test]
fn this_at_the_top_level_is_rejected() {
    let (_, diagnostics) = parse_main(&[
        var("f"),
        t(T::Eq),
        t(T::Function),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Return),
        var("this"),
        t(T::SemiColon),
        t(T::CloseBrace),
        t(T::SemiColon),
    ]);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.message.contains("captured outside"))
    );
}

#[test]
fn capture_by_reference_is_rejected() {
    let (_, diagnostics) = parse_main(&[
        var("f"),
        t(T::Eq),
        t(T::Function),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::Use),
        t(T::OpenParen),
        t(T::Ampersand),
        var("c"),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
        t(T::SemiColon),
    ]);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.message.contains("capture by reference"))
    );
}

#[test]
fn two_lambdas_get_distinct_classes() {
    let tokens = stream(&[
        var("a"),
        t(T::Eq),
        t(T::Function),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
        t(T::SemiColon),
        var("b"),
        t(T::Eq),
        t(T::Function),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
        t(T::SemiColon),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert!(registry.lookup_class("Lambda$src_test$u0").is_some());
    assert!(registry.lookup_class("Lambda$src_test$u1").is_some());
}
