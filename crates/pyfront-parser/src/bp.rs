//! Binding-power tables for the Pratt expression engine.
//!
//! The precedence table below is ordered from loosest to tightest. Level `L`
//! (1-based) maps to:
//!
//! | fixity           | left       | right      |
//! |------------------|------------|------------|
//! | infix, left      | `2L - 1`   | `2L`       |
//! | infix, right     | `2L`       | `2L - 1`   |
//! | prefix           | none       | `2L`       |
//! | postfix          | `2L`       | none       |
//!
//! The engine only ever compares with `<` / `>=`, so associativity falls out
//! of which side of a pair is tighter.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingPower {
    pub left: Option<u8>,
    pub right: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fixity {
    Prefix,
    Infix(Assoc),
    Postfix,
}

type Level = (Fixity, &'static [(TokenKind, &'static str)]);

const PRECEDENCE: &[Level] = &[
    (Fixity::Infix(Assoc::Left), &[(TokenKind::Comma, ",")]),
    (Fixity::Infix(Assoc::Left), &[(TokenKind::Name, "if")]),
    (Fixity::Infix(Assoc::Left), &[(TokenKind::Name, "or")]),
    (Fixity::Infix(Assoc::Left), &[(TokenKind::Name, "and")]),
    (Fixity::Prefix, &[(TokenKind::Name, "not")]),
    (
        Fixity::Infix(Assoc::Left),
        &[
            (TokenKind::EqEqual, "=="),
            (TokenKind::NotEqual, "!="),
            (TokenKind::Less, "<"),
            (TokenKind::LessEqual, "<="),
            (TokenKind::Greater, ">"),
            (TokenKind::GreaterEqual, ">="),
            (TokenKind::Name, "is"),
            (TokenKind::Name, "in"),
            // First half of `not in`
            (TokenKind::Name, "not"),
        ],
    ),
    // Iterable unpacking
    (Fixity::Prefix, &[(TokenKind::Star, "*")]),
    (Fixity::Infix(Assoc::Left), &[(TokenKind::VBar, "|")]),
    (Fixity::Infix(Assoc::Left), &[(TokenKind::Circumflex, "^")]),
    (Fixity::Infix(Assoc::Left), &[(TokenKind::Amper, "&")]),
    (
        Fixity::Infix(Assoc::Left),
        &[(TokenKind::LeftShift, "<<"), (TokenKind::RightShift, ">>")],
    ),
    (
        Fixity::Infix(Assoc::Left),
        &[(TokenKind::Plus, "+"), (TokenKind::Minus, "-")],
    ),
    (
        Fixity::Infix(Assoc::Left),
        &[
            (TokenKind::Star, "*"),
            (TokenKind::Slash, "/"),
            (TokenKind::DoubleSlash, "//"),
            (TokenKind::Percent, "%"),
            (TokenKind::At, "@"),
        ],
    ),
    (
        Fixity::Prefix,
        &[
            (TokenKind::Plus, "+"),
            (TokenKind::Minus, "-"),
            (TokenKind::Tilde, "~"),
        ],
    ),
    (Fixity::Infix(Assoc::Right), &[(TokenKind::DoubleStar, "**")]),
    (Fixity::Prefix, &[(TokenKind::Name, "await")]),
    (
        Fixity::Postfix,
        &[
            (TokenKind::Dot, "."),
            (TokenKind::LPar, "("),
            (TokenKind::LSqb, "["),
        ],
    ),
];

/// Prefix, infix and postfix lookup maps keyed by token value
#[derive(Debug)]
pub struct BindingPowerTable {
    prefix: HashMap<Token, BindingPower>,
    infix: HashMap<Token, BindingPower>,
    postfix: HashMap<Token, BindingPower>,
}

impl BindingPowerTable {
    fn build() -> Self {
        let mut table = BindingPowerTable {
            prefix: HashMap::new(),
            infix: HashMap::new(),
            postfix: HashMap::new(),
        };
        for (index, (fixity, tokens)) in PRECEDENCE.iter().enumerate() {
            let level = index as u8 + 1;
            let (map, bp) = match fixity {
                Fixity::Prefix => (&mut table.prefix, (None, Some(2 * level))),
                Fixity::Postfix => (&mut table.postfix, (Some(2 * level), None)),
                Fixity::Infix(Assoc::Left) => {
                    (&mut table.infix, (Some(2 * level - 1), Some(2 * level)))
                }
                Fixity::Infix(Assoc::Right) => {
                    (&mut table.infix, (Some(2 * level), Some(2 * level - 1)))
                }
            };
            for (kind, raw) in tokens.iter() {
                map.insert(
                    Token::synthetic(*kind, raw),
                    BindingPower {
                        left: bp.0,
                        right: bp.1,
                    },
                );
            }
        }
        table
    }

    pub fn prefix(&self, token: &Token) -> Option<BindingPower> {
        self.prefix.get(token).copied()
    }

    pub fn infix(&self, token: &Token) -> Option<BindingPower> {
        self.infix.get(token).copied()
    }

    pub fn postfix(&self, token: &Token) -> Option<BindingPower> {
        self.postfix.get(token).copied()
    }

    fn infix_of(&self, kind: TokenKind, raw: &str) -> Option<BindingPower> {
        self.infix(&Token::synthetic(kind, raw))
    }

    /// Minimum power at which a tuple element (possibly starred) is parsed
    pub fn tuple_element_bp(&self) -> u8 {
        self.infix_of(TokenKind::Comma, ",")
            .and_then(|bp| bp.right)
            .unwrap_or(0)
    }

    /// Minimum power of a plain expression: everything but the comma
    pub fn expression_bp(&self) -> u8 {
        self.tuple_element_bp() + 1
    }

    /// Minimum power of a `bitwise_or` operand
    pub fn bitwise_or_bp(&self) -> u8 {
        self.infix_of(TokenKind::VBar, "|")
            .and_then(|bp| bp.left)
            .unwrap_or(0)
    }

    /// Minimum power of a primary: an atom plus its `.`, `(` and `[` trailers
    pub fn primary_bp(&self) -> u8 {
        self.postfix(&Token::synthetic(TokenKind::Dot, "."))
            .and_then(|bp| bp.left)
            .unwrap_or(0)
    }
}

/// The process-wide table, built on first use
pub fn table() -> &'static BindingPowerTable {
    static TABLE: OnceLock<BindingPowerTable> = OnceLock::new();
    TABLE.get_or_init(BindingPowerTable::build)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn op(kind: TokenKind, raw: &str) -> Token {
        Token::synthetic(kind, raw)
    }

    #[test]
    fn test_left_associative_pair() {
        let bp = table().infix(&op(TokenKind::Minus, "-")).unwrap();
        assert!(bp.left.unwrap() < bp.right.unwrap());
        assert_eq!(table().infix(&op(TokenKind::Comma, ",")).unwrap(), BindingPower {
            left: Some(1),
            right: Some(2)
        });
    }

    #[test]
    fn test_right_associative_pair() {
        let bp = table().infix(&op(TokenKind::DoubleStar, "**")).unwrap();
        assert!(bp.left.unwrap() > bp.right.unwrap());
    }

    #[test]
    fn test_prefix_and_postfix_shapes() {
        let neg = table().prefix(&op(TokenKind::Minus, "-")).unwrap();
        assert_eq!(neg.left, None);
        let dot = table().postfix(&op(TokenKind::Dot, ".")).unwrap();
        assert_eq!(dot.right, None);
        // Unary minus binds looser than `**`, so -2**2 is -(2**2)
        let pow = table().infix(&op(TokenKind::DoubleStar, "**")).unwrap();
        assert!(pow.left.unwrap() > neg.right.unwrap());
    }

    #[test]
    fn test_keyword_operators_share_the_tables() {
        let not = op(TokenKind::Name, "not");
        assert!(table().prefix(&not).is_some());
        assert!(table().infix(&not).is_some());
        assert_eq!(
            table().infix(&op(TokenKind::Name, "is")),
            table().infix(&op(TokenKind::Less, "<"))
        );
        assert!(table().infix(&op(TokenKind::Name, "x")).is_none());
    }

    #[test]
    fn test_levels_never_collide() {
        let mut seen = std::collections::HashSet::new();
        let tables = table();
        for map in [&tables.infix, &tables.prefix, &tables.postfix] {
            for bp in map.values() {
                seen.insert((bp.left, bp.right));
            }
        }
        let mut powers: Vec<u8> = seen
            .iter()
            .flat_map(|(l, r)| l.iter().chain(r.iter()).copied())
            .collect();
        powers.sort_unstable();
        powers.dedup();
        // Each distinct pair contributes its own numbers
        assert_eq!(
            powers.len(),
            seen.iter()
                .map(|(l, r)| l.is_some() as usize + r.is_some() as usize)
                .sum::<usize>()
        );
    }

    #[test]
    fn test_derived_thresholds() {
        let tables = table();
        assert_eq!(tables.tuple_element_bp(), 2);
        assert_eq!(tables.expression_bp(), 3);
        assert!(tables.bitwise_or_bp() > tables.expression_bp());
        assert!(tables.primary_bp() > tables.bitwise_or_bp());
        assert!(std::ptr::eq(tables, table()));
    }
}
