//! Backtracking token cursor.
//!
//! The token sequence is immutable once lexed; the cursor only moves an
//! index over it, so saving and restoring a position is a copy.

use crate::lexer::{Token, TokenKind};

/// Opaque saved cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(usize);

pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
    end: Token,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens
            .last()
            .filter(|t| t.kind == TokenKind::EndMarker)
            .cloned()
            .unwrap_or_else(|| Token::synthetic(TokenKind::EndMarker, ""));
        TokenCursor {
            tokens,
            pos: 0,
            end,
        }
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    /// Current token; past the end this is always ENDMARKER
    pub fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    pub fn peek_nth(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.end)
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// True once only ENDMARKER remains
    pub fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::EndMarker
    }
}
