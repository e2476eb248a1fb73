mod common;

use common::*;
use php_frontend::token::TokenKind as T;

#[test]
fn if_else_bodies_are_sequences() {
    let rendered = parse_main_ok(&[
        t(T::If),
        t(T::OpenParen),
        var("a"),
        t(T::CloseParen),
        t(T::Echo),
        int("1"),
        t(T::SemiColon),
        t(T::Else),
        t(T::OpenBrace),
        t(T::Echo),
        int("2"),
        t(T::SemiColon),
        t(T::CloseBrace),
    ]);
    assert_eq!(
        rendered,
        "(seq (if (conv-bool (var $a)) (seq (echo (conv-string (int 1)))) (seq (echo (conv-string (int 2))))) (return))"
    );
}

#[test]
fn for_coerces_only_the_last_condition_clause() {
    let rendered = parse_main_ok(&[
        t(T::For),
        t(T::OpenParen),
        var("i"),
        t(T::Eq),
        int("0"),
        t(T::SemiColon),
        var("j"),
        t(T::Comma),
        var("i"),
        t(T::Lt),
        int("3"),
        t(T::SemiColon),
        var("i"),
        t(T::Inc),
        t(T::CloseParen),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (for (assign (var $i) (int 0)) (seq-comma (var $j) (conv-bool (< (var $i) (int 3)))) (post-inc (var $i)) (seq (empty))) (return))"
    );
}

#[test]
fn empty_for_condition_is_an_infinite_loop() {
    let rendered = parse_main_ok(&[
        t(T::For),
        t(T::OpenParen),
        t(T::SemiColon),
        t(T::SemiColon),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Break),
        t(T::SemiColon),
        t(T::CloseBrace),
    ]);
    assert_eq!(
        rendered,
        "(seq (for (empty) (true) (empty) (seq (break (int 1)))) (return))"
    );
}

#[test]
fn foreach_reserves_iterator_and_copy_slots() {
    let rendered = parse_main_ok(&[
        t(T::Foreach),
        t(T::OpenParen),
        var("a"),
        t(T::As),
        var("k"),
        t(T::DoubleArrow),
        t(T::Ampersand),
        var("v"),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
    ]);
    insta::assert_snapshot!(
        rendered,
        @"(seq (foreach (foreach-param (var $a) (var $v &) (empty) (var $k)) (seq) (empty)) (return))"
    );
}

#[test]
fn switch_carries_four_reserved_slots() {
    let rendered = parse_main_ok(&[
        t(T::Switch),
        t(T::OpenParen),
        var("a"),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::Case),
        int("1"),
        t(T::Colon),
        t(T::Break),
        t(T::SemiColon),
        t(T::Default),
        t(T::Colon),
        t(T::Echo),
        int("2"),
        t(T::SemiColon),
        t(T::CloseBrace),
    ]);
    insta::assert_snapshot!(
        rendered,
        @"(seq (switch (var $a) (temps (empty) (empty) (empty) (empty)) (case (int 1) (seq (break (int 1)))) (default (seq (echo (conv-string (int 2)))))) (return))"
    );
}

#[test]
fn try_catch_is_fixed_to_exception() {
    let rendered = parse_main_ok(&[
        t(T::Try),
        t(T::OpenBrace),
        t(T::Throw),
        t(T::New),
        t(T::Exception),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::SemiColon),
        t(T::CloseBrace),
        t(T::Catch),
        t(T::OpenParen),
        t(T::Exception),
        var("e"),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
    ]);
    assert_eq!(
        rendered,
        "(seq (try (seq (throw (new Exception))) (var $e) (seq)) (return))"
    );
}

#[test]
fn catching_another_class_is_rejected() {
    let (_, diagnostics) = parse_main(&[
        t(T::Try),
        t(T::OpenBrace),
        t(T::CloseBrace),
        t(T::Catch),
        t(T::OpenParen),
        ident("MyError"),
        var("e"),
        t(T::CloseParen),
        t(T::OpenBrace),
        t(T::CloseBrace),
    ]);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.message.contains("only 'Exception' can be caught"))
    );
}

#[test]
fn require_once_expands_per_target() {
    let rendered = parse_main_ok(&[
        t(T::RequireOnce),
        string("a.php"),
        t(T::Comma),
        string("b.php"),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (seq (require-once (str \"a.php\")) (require-once (str \"b.php\"))) (return))"
    );
}

#[test]
fn echo_expands_per_argument_with_string_conversion() {
    let rendered = parse_main_ok(&[
        t(T::Echo),
        var("a"),
        t(T::Comma),
        string("x"),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (seq (echo (conv-string (var $a))) (echo (conv-string (str \"x\")))) (return))"
    );
}

#[test]
fn boolean_literal_condition_is_still_coerced() {
    let rendered = parse_main_ok(&[
        t(T::If),
        t(T::OpenParen),
        t(T::True),
        t(T::CloseParen),
        t(T::SemiColon),
    ]);
    assert_eq!(rendered, "(seq (if (conv-bool (true)) (seq (empty))) (return))");
}

#[test]
fn isset_folds_into_a_conjunction() {
    let rendered = parse_main_ok(&[
        var("x"),
        t(T::Eq),
        t(T::Isset),
        t(T::OpenParen),
        var("a"),
        t(T::Comma),
        var("b"),
        t(T::CloseParen),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (assign (var $x) (&& (isset (var $a)) (isset (var $b)))) (return))"
    );
}

#[test]
fn exit_defaults_to_zero() {
    let rendered = parse_main_ok(&[
        t(T::Exit),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::SemiColon),
    ]);
    assert_eq!(rendered, "(seq (exit (int 0)) (return))");
}

#[test]
fn at_sign_wraps_the_statement() {
    let rendered = parse_main_ok(&[
        t(T::At),
        ident("f"),
        t(T::OpenParen),
        t(T::CloseParen),
        t(T::SemiColon),
    ]);
    assert_eq!(rendered, "(seq (noerr (call f)) (return))");
}

#[test]
fn list_assignment_keeps_skipped_slots() {
    let rendered = parse_main_ok(&[
        t(T::List),
        t(T::OpenParen),
        var("a"),
        t(T::Comma),
        t(T::Comma),
        var("b"),
        t(T::CloseParen),
        t(T::Eq),
        var("c"),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (assign (list (var $a) (empty) (var $b)) (var $c)) (return))"
    );
}

#[test]
fn static_declaration_keeps_initializers() {
    let rendered = parse_main_ok(&[
        t(T::Static),
        var("n"),
        t(T::Eq),
        int("0"),
        t(T::Comma),
        var("m"),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (static (seq-comma (assign (var $n) (int 0)) (var $m))) (return))"
    );
}

#[test]
fn explicit_trailing_return_is_not_duplicated() {
    let rendered = parse_main_ok(&[t(T::Return), int("3"), t(T::SemiColon)]);
    assert_eq!(rendered, "(seq (return (int 3)))");
}

#[test]
fn trailing_type_rule_annotates_the_statement() {
    use bumpalo::Bump;
    use php_frontend::ast::NodeKind;
    use php_frontend::ast::ty::RuleContext;
    use php_frontend::parse_unit;
    use php_frontend::registry::Registry;
    use php_frontend::source::SourceUnit;

    let tokens = stream(&[
        var("x"),
        t(T::Eq),
        int("1"),
        t(T::TripleEq),
        ident("int"),
        t(T::SemiColon),
    ]);
    let arena = Bump::new();
    let registry = Registry::new();
    let out = parse_unit(&arena, &registry, SourceUnit::new("test.php", ""), &tokens).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let root = registry.function(out.main_function.unwrap()).root.unwrap();
    let NodeKind::Seq { stmts } = root.kind else {
        panic!("unit main body is a sequence");
    };
    let hint = stmts[0].type_rule.expect("rule attached to the assignment");
    assert_eq!(hint.context, RuleContext::Exact);
    assert!(matches!(stmts[0].kind, NodeKind::Assign { .. }));
}
