//! Error types for parsing, target retagging and rendering

use thiserror::Error;

use crate::ast::ExprContext;
use crate::lexer::{LexError, Token};

/// A fatal parse failure. Ordinary alternative mismatches never surface as
/// errors; they are `Ok(None)` results inside the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("invalid syntax at {line}:{column}: unexpected {token}")]
    InvalidSyntax {
        token: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("expected 'else' in conditional expression at {line}:{column}, found {found}")]
    ExpectedElse {
        found: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("nesting deeper than {limit} levels at {line}:{column}")]
    TooDeeplyNested {
        limit: usize,
        line: usize,
        column: usize,
        offset: usize,
    },
}

impl ParseError {
    pub(crate) fn invalid_syntax(at: &Token) -> Self {
        ParseError::InvalidSyntax {
            token: at.describe(),
            line: at.line,
            column: at.column,
            offset: at.start,
        }
    }

    pub(crate) fn expected_else(at: &Token) -> Self {
        ParseError::ExpectedElse {
            found: at.describe(),
            line: at.line,
            column: at.column,
            offset: at.start,
        }
    }

    pub(crate) fn too_deeply_nested(limit: usize, at: &Token) -> Self {
        ParseError::TooDeeplyNested {
            limit,
            line: at.line,
            column: at.column,
            offset: at.start,
        }
    }

    /// 1-indexed line and column of the failure
    pub fn location(&self) -> (usize, usize) {
        match self {
            ParseError::Lex(e) => (e.line, e.column),
            ParseError::InvalidSyntax { line, column, .. }
            | ParseError::ExpectedElse { line, column, .. }
            | ParseError::TooDeeplyNested { line, column, .. } => (*line, *column),
        }
    }

    /// Byte offset of the failure in the source
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Lex(e) => e.offset,
            ParseError::InvalidSyntax { offset, .. }
            | ParseError::ExpectedElse { offset, .. }
            | ParseError::TooDeeplyNested { offset, .. } => *offset,
        }
    }
}

/// Rejected binding-context rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("cannot use {kind} as a {ctx:?} target")]
    NotAssignable { kind: &'static str, ctx: ExprContext },

    #[error("a starred target cannot itself be starred")]
    NestedStarred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("{0} is not supported by this renderer")]
    Unsupported(&'static str),
}
