mod common;

use common::*;
use php_frontend::token::TokenKind as T;

#[test]
fn condition_is_coerced_to_bool() {
    let rendered = parse_main_ok(&[
        var("x"),
        t(T::Eq),
        var("a"),
        t(T::Question),
        int("1"),
        t(T::Colon),
        int("2"),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (assign (var $x) (ternary (conv-bool (var $a)) (int 1) (int 2))) (return))"
    );
}

#[test]
fn chained_ternary_associates_leftward() {
    let rendered = parse_main_ok(&[
        var("x"),
        t(T::Eq),
        var("a"),
        t(T::Question),
        int("1"),
        t(T::Colon),
        var("b"),
        t(T::Question),
        int("2"),
        t(T::Colon),
        int("3"),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (assign (var $x) (ternary (conv-bool (ternary (conv-bool (var $a)) (int 1) (var $b))) (int 2) (int 3))) (return))"
    );
}

#[test]
fn shorthand_evaluates_condition_once() {
    let rendered = parse_main_ok(&[
        var("x"),
        t(T::Eq),
        var("a"),
        t(T::Question),
        t(T::Colon),
        int("2"),
        t(T::SemiColon),
    ]);
    insta::assert_snapshot!(
        rendered,
        @"(seq (assign (var $x) (ternary (assign (var $shorthand_ternary_cond$u0 superlocal) (conv-bool (var $a))) (move (var $shorthand_ternary_cond$u0 superlocal)) (int 2))) (return))"
    );
}

#[test]
fn else_branch_spans_keyword_operators() {
    let rendered = parse_main_ok(&[
        var("x"),
        t(T::Eq),
        var("a"),
        t(T::Question),
        var("b"),
        t(T::Colon),
        var("c"),
        t(T::LogicalAnd),
        var("d"),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (assign (var $x) (ternary (conv-bool (var $a)) (var $b) (and (conv-bool (var $c)) (conv-bool (var $d))))) (return))"
    );
}

#[test]
fn parenthesized_ternary_in_the_else_branch_stays_nested() {
    let rendered = parse_main_ok(&[
        var("x"),
        t(T::Eq),
        var("a"),
        t(T::Question),
        int("1"),
        t(T::Colon),
        t(T::OpenParen),
        var("b"),
        t(T::Question),
        int("2"),
        t(T::Colon),
        int("3"),
        t(T::CloseParen),
        t(T::SemiColon),
    ]);
    assert_eq!(
        rendered,
        "(seq (assign (var $x) (ternary (conv-bool (var $a)) (int 1) (ternary (conv-bool (var $b)) (int 2) (int 3)))) (return))"
    );
}

#[test]
fn two_shorthands_get_distinct_temporaries() {
    let (rendered, diagnostics) = parse_main(&[
        var("x"),
        t(T::Eq),
        var("a"),
        t(T::Question),
        t(T::Colon),
        var("b"),
        t(T::Question),
        t(T::Colon),
        int("3"),
        t(T::SemiColon),
    ]);
    assert!(diagnostics.is_empty());
    assert!(rendered.contains("shorthand_ternary_cond$u0"));
    assert!(rendered.contains("shorthand_ternary_cond$u1"));
}
