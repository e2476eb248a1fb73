use crate::diag::FatalError;
use crate::loc::Loc;
use crate::token::{Token, TokenKind};

/// Read-only view over one unit's token stream with bounded lookahead.
///
/// The cursor never rewinds: the only disambiguation the grammar needs is
/// peeking one or two tokens ahead (identifier vs. call, `static` declaration
/// vs. `static` expression). Advancing tracks the current source line so
/// diagnostics and freshly created nodes get a meaningful location.
pub struct TokenCursor<'src> {
    tokens: &'src [Token<'src>],
    pos: usize,
    line: u32,
}

impl<'src> TokenCursor<'src> {
    pub fn new(tokens: &'src [Token<'src>]) -> Result<Self, FatalError> {
        let last = tokens.last().ok_or(FatalError::EmptyTokenStream)?;
        if last.kind != TokenKind::End {
            return Err(FatalError::MissingEndSentinel);
        }
        Ok(Self {
            tokens,
            pos: 0,
            line: tokens[0].line,
        })
    }

    pub fn current(&self) -> &Token<'src> {
        &self.tokens[self.pos]
    }

    pub fn kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    pub fn text(&self) -> &'src str {
        self.tokens[self.pos].text
    }

    /// Lookahead at `cursor + n`, saturating at the end sentinel.
    pub fn peek(&self, n: usize) -> &Token<'src> {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn at_end(&self) -> bool {
        self.kind() == TokenKind::End
    }

    pub fn bump(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
            let line = self.tokens[self.pos].line;
            if line != 0 {
                self.line = line;
            }
        }
    }

    /// Line of the most recently observed token, for diagnostics.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn loc(&self) -> Loc {
        Loc::new(self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(kind: TokenKind, line: u32) -> Token<'static> {
        Token::new(kind, "", line)
    }

    #[test]
    fn rejects_empty_stream() {
        assert!(matches!(
            TokenCursor::new(&[]),
            Err(FatalError::EmptyTokenStream)
        ));
    }

    #[test]
    fn rejects_unterminated_stream() {
        let toks = [t(TokenKind::SemiColon, 1)];
        assert!(matches!(
            TokenCursor::new(&toks),
            Err(FatalError::MissingEndSentinel)
        ));
    }

    #[test]
    fn tracks_lines_and_saturates_lookahead() {
        let toks = [
            t(TokenKind::Echo, 1),
            t(TokenKind::IntLiteral, 2),
            t(TokenKind::SemiColon, 2),
            t(TokenKind::End, 3),
        ];
        let mut cur = TokenCursor::new(&toks).unwrap();
        assert_eq!(cur.line(), 1);
        assert_eq!(cur.peek(10).kind, TokenKind::End);
        cur.bump();
        assert_eq!(cur.line(), 2);
        cur.bump();
        cur.bump();
        assert!(cur.at_end());
        cur.bump(); // stays on the sentinel
        assert!(cur.at_end());
    }
}
