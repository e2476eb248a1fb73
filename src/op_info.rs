//! Operator tables for the band-based expression parser.
//!
//! Expressions are parsed by climbing a fixed ladder of priority bands, from
//! the loosest binding (keyword `or`) down to unary operators and finally the
//! primary grammar. Each band owns a small set of operators; the parser asks
//! these tables whether the current token belongs to the band it is working
//! on and recurses into the next band for operands.

use crate::ast::{BinaryOp, UnaryOp};
use crate::token::TokenKind;

/// First (loosest) band.
pub const PRIORITY_BEGIN: u8 = 1;
/// The band reserved for `?:`; handled specially by the parser.
pub const TERNARY_PRIORITY: u8 = 5;
/// The band of `!`; explicit casts parse their operand here too.
pub const NOT_PRIORITY: u8 = 16;
/// The band of the remaining prefix operators (`~ - + ++ --`).
pub const PREFIX_PRIORITY: u8 = 17;
/// One past the tightest operator band; parsing a "binary expression" at
/// this priority parses a primary expression instead.
pub const PRIORITY_END: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Left,
    Right,
}

/// What an infix token means: plain binary operator, plain assignment, or
/// compound assignment carrying its underlying binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixKind {
    Binary(BinaryOp),
    Assign,
    AssignOp(BinaryOp),
}

#[derive(Debug, Clone, Copy)]
pub struct InfixOp {
    pub kind: InfixKind,
    pub fixity: Fixity,
}

/// Infix operator of `token` if it lives in band `priority`.
pub fn infix_op(token: TokenKind, priority: u8) -> Option<InfixOp> {
    use BinaryOp::*;
    use TokenKind as T;

    let (kind, fixity) = match (priority, token) {
        (1, T::LogicalOr) => (InfixKind::Binary(LogicalOr), Fixity::Left),
        (2, T::LogicalXor) => (InfixKind::Binary(LogicalXor), Fixity::Left),
        (3, T::LogicalAnd) => (InfixKind::Binary(LogicalAnd), Fixity::Left),

        (4, T::Eq) => (InfixKind::Assign, Fixity::Right),
        (4, T::PlusEq) => (InfixKind::AssignOp(Add), Fixity::Right),
        (4, T::MinusEq) => (InfixKind::AssignOp(Sub), Fixity::Right),
        (4, T::MulEq) => (InfixKind::AssignOp(Mul), Fixity::Right),
        (4, T::DivEq) => (InfixKind::AssignOp(Div), Fixity::Right),
        (4, T::ModEq) => (InfixKind::AssignOp(Mod), Fixity::Right),
        (4, T::DotEq) => (InfixKind::AssignOp(Concat), Fixity::Right),
        (4, T::AndEq) => (InfixKind::AssignOp(BitAnd), Fixity::Right),
        (4, T::OrEq) => (InfixKind::AssignOp(BitOr), Fixity::Right),
        (4, T::XorEq) => (InfixKind::AssignOp(BitXor), Fixity::Right),
        (4, T::ShlEq) => (InfixKind::AssignOp(Shl), Fixity::Right),
        (4, T::ShrEq) => (InfixKind::AssignOp(Shr), Fixity::Right),

        // band 5 is the ternary; it has no entry here

        (6, T::PipePipe) => (InfixKind::Binary(Or), Fixity::Left),
        (7, T::AmpAmp) => (InfixKind::Binary(And), Fixity::Left),
        (8, T::Pipe) => (InfixKind::Binary(BitOr), Fixity::Left),
        (9, T::Caret) => (InfixKind::Binary(BitXor), Fixity::Left),
        (10, T::Ampersand) => (InfixKind::Binary(BitAnd), Fixity::Left),

        (11, T::EqEq) => (InfixKind::Binary(Eq), Fixity::Left),
        (11, T::NotEq) => (InfixKind::Binary(Ne), Fixity::Left),
        (11, T::Identical) => (InfixKind::Binary(Identical), Fixity::Left),
        (11, T::NotIdentical) => (InfixKind::Binary(NotIdentical), Fixity::Left),

        (12, T::Lt) => (InfixKind::Binary(Lt), Fixity::Left),
        (12, T::LtEq) => (InfixKind::Binary(Le), Fixity::Left),
        (12, T::Gt) => (InfixKind::Binary(Gt), Fixity::Left),
        (12, T::GtEq) => (InfixKind::Binary(Ge), Fixity::Left),

        (13, T::Shl) => (InfixKind::Binary(Shl), Fixity::Left),
        (13, T::Shr) => (InfixKind::Binary(Shr), Fixity::Left),

        (14, T::Plus) => (InfixKind::Binary(Add), Fixity::Left),
        (14, T::Minus) => (InfixKind::Binary(Sub), Fixity::Left),
        (14, T::Dot) => (InfixKind::Binary(Concat), Fixity::Left),

        (15, T::Asterisk) => (InfixKind::Binary(Mul), Fixity::Left),
        (15, T::Slash) => (InfixKind::Binary(Div), Fixity::Left),
        (15, T::Percent) => (InfixKind::Binary(Mod), Fixity::Left),

        _ => return None,
    };
    Some(InfixOp { kind, fixity })
}

/// Prefix operator of `token` if it lives in band `priority`. Checked before
/// descending into a band's operand so that, e.g., `-$x * $y` parses the
/// negation at the right tightness.
pub fn unary_op(token: TokenKind, priority: u8) -> Option<UnaryOp> {
    use TokenKind as T;

    match (priority, token) {
        (NOT_PRIORITY, T::Bang) => Some(UnaryOp::Not),
        (PREFIX_PRIORITY, T::Tilde) => Some(UnaryOp::BitNot),
        (PREFIX_PRIORITY, T::Minus) => Some(UnaryOp::Minus),
        (PREFIX_PRIORITY, T::Plus) => Some(UnaryOp::Plus),
        (PREFIX_PRIORITY, T::Inc) => Some(UnaryOp::PrefixInc),
        (PREFIX_PRIORITY, T::Dec) => Some(UnaryOp::PrefixDec),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_band_is_reachable() {
        for p in PRIORITY_BEGIN..PRIORITY_END {
            if p == TERNARY_PRIORITY || p == NOT_PRIORITY || p == PREFIX_PRIORITY {
                continue;
            }
            let found = all_tokens()
                .iter()
                .any(|&t| infix_op(t, p).is_some());
            assert!(found, "band {p} has no infix operators");
        }
        assert!(all_tokens().iter().any(|&t| unary_op(t, NOT_PRIORITY).is_some()));
        assert!(all_tokens().iter().any(|&t| unary_op(t, PREFIX_PRIORITY).is_some()));
    }

    #[test]
    fn assignments_are_right_associative() {
        let op = infix_op(TokenKind::Eq, 4).unwrap();
        assert_eq!(op.fixity, Fixity::Right);
        let op = infix_op(TokenKind::ShlEq, 4).unwrap();
        assert!(matches!(op.kind, InfixKind::AssignOp(BinaryOp::Shl)));
    }

    #[test]
    fn each_operator_lives_in_one_band() {
        for &t in all_tokens() {
            let bands: Vec<u8> = (PRIORITY_BEGIN..PRIORITY_END)
                .filter(|&p| infix_op(t, p).is_some())
                .collect();
            assert!(bands.len() <= 1, "{t:?} appears in bands {bands:?}");
        }
    }

    fn all_tokens() -> &'static [TokenKind] {
        use TokenKind as T;
        &[
            T::LogicalOr,
            T::LogicalXor,
            T::LogicalAnd,
            T::Eq,
            T::PlusEq,
            T::MinusEq,
            T::MulEq,
            T::DivEq,
            T::ModEq,
            T::DotEq,
            T::AndEq,
            T::OrEq,
            T::XorEq,
            T::ShlEq,
            T::ShrEq,
            T::PipePipe,
            T::AmpAmp,
            T::Pipe,
            T::Caret,
            T::Ampersand,
            T::EqEq,
            T::NotEq,
            T::Identical,
            T::NotIdentical,
            T::Lt,
            T::LtEq,
            T::Gt,
            T::GtEq,
            T::Shl,
            T::Shr,
            T::Plus,
            T::Minus,
            T::Dot,
            T::Asterisk,
            T::Slash,
            T::Percent,
            T::Bang,
            T::Tilde,
            T::Inc,
            T::Dec,
        ]
    }
}
