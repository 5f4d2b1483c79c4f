//! Pratt expression engine and the expression-level grammar rules.
//!
//! `parse_expr(min_bp)` parses a prefix operator or an atom, then keeps
//! extending the left-hand side with postfix trailers and infix operators
//! whose left binding power clears `min_bp`. Boolean, comparison and comma
//! runs are merged into a single node while they come from the same loop.

use tracing::debug;

use crate::ast::*;
use crate::bp::{self, BindingPower};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};
use crate::parser::{PResult, Parser, is_keyword};

/// Infix operator families, each with its own node-building rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Binary(Operator),
    Bool(BoolOperator),
    Compare,
    Comma,
    Conditional,
}

impl Family {
    fn of(token: &Token) -> Option<Family> {
        let family = match token.kind {
            TokenKind::Comma => Family::Comma,
            TokenKind::Plus => Family::Binary(Operator::Add),
            TokenKind::Minus => Family::Binary(Operator::Sub),
            TokenKind::Star => Family::Binary(Operator::Mult),
            TokenKind::At => Family::Binary(Operator::MatMult),
            TokenKind::Slash => Family::Binary(Operator::Div),
            TokenKind::DoubleSlash => Family::Binary(Operator::FloorDiv),
            TokenKind::Percent => Family::Binary(Operator::Mod),
            TokenKind::DoubleStar => Family::Binary(Operator::Pow),
            TokenKind::LeftShift => Family::Binary(Operator::LShift),
            TokenKind::RightShift => Family::Binary(Operator::RShift),
            TokenKind::VBar => Family::Binary(Operator::BitOr),
            TokenKind::Circumflex => Family::Binary(Operator::BitXor),
            TokenKind::Amper => Family::Binary(Operator::BitAnd),
            TokenKind::EqEqual
            | TokenKind::NotEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual => Family::Compare,
            TokenKind::Name => match token.raw.as_str() {
                "if" => Family::Conditional,
                "or" => Family::Bool(BoolOperator::Or),
                "and" => Family::Bool(BoolOperator::And),
                "is" | "in" | "not" => Family::Compare,
                _ => return None,
            },
            _ => return None,
        };
        Some(family)
    }
}

/// Which run the current left-hand side belongs to. Only a node built by
/// this loop may absorb more operands, so `(a and b) and c` stays nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    Bool(BoolOperator),
    Compare,
    Tuple,
}

/// What follows a primary: `.name`, `(args)` or `[slices]`
enum Trailer {
    Attribute(String),
    Call(Vec<Expr>, Vec<Keyword>),
    Subscript(Expr),
}

impl Trailer {
    fn attach(self, value: Expr) -> Expr {
        let value = Box::new(value);
        match self {
            Trailer::Attribute(attr) => Expr::Attribute(Attribute {
                value,
                attr,
                ctx: ExprContext::Load,
            }),
            Trailer::Call(args, keywords) => Expr::Call(Call {
                func: value,
                args,
                keywords,
            }),
            Trailer::Subscript(slice) => Expr::Subscript(Subscript {
                value,
                slice: Box::new(slice),
                ctx: ExprContext::Load,
            }),
        }
    }
}

fn prefix_node(token: &Token, operand: Expr) -> Option<Expr> {
    let operand = Box::new(operand);
    let op = match token.kind {
        TokenKind::Plus => UnaryOperator::UAdd,
        TokenKind::Minus => UnaryOperator::USub,
        TokenKind::Tilde => UnaryOperator::Invert,
        TokenKind::Name if token.raw == "not" => UnaryOperator::Not,
        TokenKind::Star => {
            return Some(Expr::Starred(Starred {
                value: operand,
                ctx: ExprContext::Load,
            }));
        }
        TokenKind::Name if token.raw == "await" => {
            return Some(Expr::Await(Await { value: operand }));
        }
        _ => return None,
    };
    Some(Expr::UnaryOp(UnaryOp { op, operand }))
}

fn comparison_symbol(kind: TokenKind) -> Option<CmpOperator> {
    Some(match kind {
        TokenKind::EqEqual => CmpOperator::Eq,
        TokenKind::NotEqual => CmpOperator::NotEq,
        TokenKind::Less => CmpOperator::Lt,
        TokenKind::LessEqual => CmpOperator::LtE,
        TokenKind::Greater => CmpOperator::Gt,
        TokenKind::GreaterEqual => CmpOperator::GtE,
        _ => return None,
    })
}

impl Parser {
    // ─── Pratt engine ───────────────────────────────────────────────────────

    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> PResult<Option<Expr>> {
        self.nested(|p| p.attempt(|p| p.pratt(min_bp)))
    }

    fn pratt(&mut self, min_bp: u8) -> PResult<Option<Expr>> {
        let table = bp::table();
        let Some((mut lhs, mut bare_star)) = self.prefix_or_atom(min_bp)? else {
            return Ok(None);
        };
        let mut chain: Option<Chain> = None;

        loop {
            let tok = self.tokens.peek().clone();

            if let Some(BindingPower { left: Some(lbp), .. }) = table.postfix(&tok) {
                if lbp < min_bp || bare_star {
                    break;
                }
                let mark = self.tokens.mark();
                self.tokens.advance();
                let Some(trailer) = self.trailer(tok.kind)? else {
                    self.tokens.reset(mark);
                    break;
                };
                lhs = trailer.attach(lhs);
                chain = None;
                continue;
            }

            let Some(BindingPower {
                left: Some(lbp),
                right: Some(rbp),
            }) = table.infix(&tok)
            else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            let Some(family) = Family::of(&tok) else {
                break;
            };
            // An unpacking star only continues into a tuple
            if bare_star && family != Family::Comma {
                break;
            }

            let mark = self.tokens.mark();
            self.tokens.advance();

            match family {
                Family::Binary(op) => {
                    let Some(right) = self.parse_expr(rbp)? else {
                        self.tokens.reset(mark);
                        break;
                    };
                    lhs = Expr::BinOp(BinOp {
                        left: Box::new(lhs),
                        op,
                        right: Box::new(right),
                    });
                    chain = None;
                }
                Family::Bool(op) => {
                    let Some(right) = self.parse_expr(rbp)? else {
                        self.tokens.reset(mark);
                        break;
                    };
                    lhs = match (chain, lhs) {
                        (Some(Chain::Bool(current)), Expr::BoolOp(mut node)) if current == op => {
                            node.values.push(right);
                            Expr::BoolOp(node)
                        }
                        (_, left) => Expr::BoolOp(BoolOp {
                            op,
                            values: vec![left, right],
                        }),
                    };
                    chain = Some(Chain::Bool(op));
                }
                Family::Compare => {
                    let Some(op) = self.comparison_operator(&tok) else {
                        self.tokens.reset(mark);
                        break;
                    };
                    let Some(right) = self.parse_expr(rbp)? else {
                        self.tokens.reset(mark);
                        break;
                    };
                    lhs = match (chain, lhs) {
                        (Some(Chain::Compare), Expr::Compare(mut node)) => {
                            node.ops.push(op);
                            node.comparators.push(right);
                            Expr::Compare(node)
                        }
                        (_, left) => Expr::Compare(Compare {
                            left: Box::new(left),
                            ops: vec![op],
                            comparators: vec![right],
                        }),
                    };
                    chain = Some(Chain::Compare);
                }
                Family::Comma => {
                    let element = self.parse_expr(rbp)?;
                    let trailing = element.is_none();
                    lhs = match (chain, lhs) {
                        (Some(Chain::Tuple), Expr::Tuple(mut node)) => {
                            node.elts.extend(element);
                            Expr::Tuple(node)
                        }
                        (_, first) => Expr::Tuple(Tuple {
                            elts: std::iter::once(first).chain(element).collect(),
                            ctx: ExprContext::Load,
                        }),
                    };
                    chain = Some(Chain::Tuple);
                    bare_star = false;
                    // `a, b,` ends the tuple at its trailing comma
                    if trailing {
                        break;
                    }
                }
                Family::Conditional => {
                    let Some(test) = self.parse_expr(rbp)? else {
                        self.tokens.reset(mark);
                        break;
                    };
                    // Past `x if cond` only `else` may follow
                    if !self.eat_word("else") {
                        let err = ParseError::expected_else(self.tokens.peek());
                        debug!(%err, "conditional expression without else");
                        return Err(err);
                    }
                    let Some(orelse) = self.parse_expr(lbp)? else {
                        return Err(ParseError::invalid_syntax(self.tokens.peek()));
                    };
                    lhs = Expr::IfExp(IfExp {
                        test: Box::new(test),
                        body: Box::new(lhs),
                        orelse: Box::new(orelse),
                    });
                    chain = None;
                }
            }
        }

        Ok(Some(lhs))
    }

    /// Left-hand side: a prefix operator applied to its operand, or an atom.
    /// The flag reports a bare unpacking star.
    fn prefix_or_atom(&mut self, min_bp: u8) -> PResult<Option<(Expr, bool)>> {
        let table = bp::table();
        let tok = self.tokens.peek().clone();
        let prefix = table.prefix(&tok).and_then(|bp| bp.right);
        let star_allowed = min_bp <= table.tuple_element_bp();

        match prefix {
            // `not` never appears as an operand of a tighter operator
            Some(rbp) if tok.is_word("not") && min_bp > rbp => Ok(None),
            Some(rbp) if tok.kind != TokenKind::Star || star_allowed => {
                self.tokens.advance();
                let Some(operand) = self.parse_expr(rbp)? else {
                    return Ok(None);
                };
                let bare_star = tok.kind == TokenKind::Star;
                Ok(prefix_node(&tok, operand).map(|node| (node, bare_star)))
            }
            _ => Ok(self.atom()?.map(|atom| (atom, false))),
        }
    }

    /// Resolve `is` / `is not` / `in` / `not in` and the symbolic comparisons.
    /// `operator` has already been consumed.
    fn comparison_operator(&mut self, operator: &Token) -> Option<CmpOperator> {
        if operator.is_word("is") {
            return Some(if self.eat_word("not") {
                CmpOperator::IsNot
            } else {
                CmpOperator::Is
            });
        }
        if operator.is_word("not") {
            return self.eat_word("in").then_some(CmpOperator::NotIn);
        }
        if operator.is_word("in") {
            return Some(CmpOperator::In);
        }
        comparison_symbol(operator.kind)
    }

    fn trailer(&mut self, opener: TokenKind) -> PResult<Option<Trailer>> {
        match opener {
            TokenKind::Dot => Ok(self.name().map(Trailer::Attribute)),
            TokenKind::LPar => {
                let Some((args, keywords)) = self.arguments()? else {
                    return Ok(None);
                };
                Ok(self
                    .eat(TokenKind::RPar)
                    .then_some(Trailer::Call(args, keywords)))
            }
            TokenKind::LSqb => {
                let Some(slice) = self.slices()? else {
                    return Ok(None);
                };
                Ok(self.eat(TokenKind::RSqb).then_some(Trailer::Subscript(slice)))
            }
            _ => Ok(None),
        }
    }

    // ─── Entry rules at fixed binding powers ────────────────────────────────

    /// star_expressions: a possibly starred, possibly comma-separated run
    pub(crate) fn star_expressions(&mut self) -> PResult<Option<Expr>> {
        self.parse_expr(0)
    }

    /// expression: everything except a bare tuple or star
    pub(crate) fn expression(&mut self) -> PResult<Option<Expr>> {
        self.parse_expr(bp::table().expression_bp())
    }

    pub(crate) fn bitwise_or(&mut self) -> PResult<Option<Expr>> {
        self.parse_expr(bp::table().bitwise_or_bp())
    }

    /// t_primary: an atom followed by any number of trailers
    pub(crate) fn t_primary(&mut self) -> PResult<Option<Expr>> {
        self.parse_expr(bp::table().primary_bp())
    }

    /// named_expression: NAME ':=' expression | expression !':='
    pub(crate) fn named_expression(&mut self) -> PResult<Option<Expr>> {
        let walrus = self.attempt(|p| {
            let Some(id) = p.name() else {
                return Ok(None);
            };
            if !p.eat(TokenKind::ColonEqual) {
                return Ok(None);
            }
            let Some(value) = p.expression()? else {
                return Ok(None);
            };
            Ok(Some(Expr::NamedExpr(NamedExpr {
                target: Box::new(Expr::name(id, ExprContext::Store)),
                value: Box::new(value),
            })))
        })?;
        if walrus.is_some() {
            return Ok(walrus);
        }
        self.attempt(|p| {
            let expr = p.expression()?;
            Ok(expr.filter(|_| !p.check(TokenKind::ColonEqual)))
        })
    }

    /// star_named_expression: '*' bitwise_or | named_expression
    pub(crate) fn star_named_expression(&mut self) -> PResult<Option<Expr>> {
        let starred = self.attempt(|p| {
            if !p.eat(TokenKind::Star) {
                return Ok(None);
            }
            Ok(p.bitwise_or()?.map(|value| {
                Expr::Starred(Starred {
                    value: Box::new(value),
                    ctx: ExprContext::Load,
                })
            }))
        })?;
        if starred.is_some() {
            return Ok(starred);
        }
        self.named_expression()
    }

    /// yield_expr: 'yield' 'from' expression | 'yield' [star_expressions]
    pub(crate) fn yield_expr(&mut self) -> PResult<Option<Expr>> {
        self.attempt(|p| {
            if !p.eat_word("yield") {
                return Ok(None);
            }
            if p.eat_word("from") {
                return Ok(p.expression()?.map(|value| {
                    Expr::YieldFrom(YieldFrom {
                        value: Box::new(value),
                    })
                }));
            }
            let value = p.star_expressions()?.map(Box::new);
            Ok(Some(Expr::Yield(Yield { value })))
        })
    }

    // ─── Atoms ──────────────────────────────────────────────────────────────

    /// atom: NAME | True | False | None | NUMBER | STRING+ | '...' | group | tuple | list
    pub(crate) fn atom(&mut self) -> PResult<Option<Expr>> {
        let tok = self.tokens.peek().clone();
        let value = match tok.kind {
            TokenKind::Name => match tok.raw.as_str() {
                "True" => ConstantValue::Bool(true),
                "False" => ConstantValue::Bool(false),
                "None" => ConstantValue::None,
                word if is_keyword(word) => return Ok(None),
                name => {
                    let id = name.to_string();
                    self.tokens.advance();
                    return Ok(Some(Expr::name(id, ExprContext::Load)));
                }
            },
            TokenKind::Number => ConstantValue::Num(tok.raw),
            TokenKind::Ellipsis => ConstantValue::Ellipsis,
            TokenKind::String => return Ok(Some(self.strings())),
            TokenKind::LPar => return self.group_or_tuple(),
            TokenKind::LSqb => return self.list_display(),
            _ => return Ok(None),
        };
        self.tokens.advance();
        Ok(Some(Expr::constant(value)))
    }

    /// Adjacent string literals form one constant
    fn strings(&mut self) -> Expr {
        let mut parts = Vec::new();
        while self.check(TokenKind::String) {
            parts.push(self.tokens.advance().raw);
        }
        let kind = parts
            .first()
            .filter(|raw| raw.starts_with(['u', 'U']))
            .map(|_| "u".to_string());
        Expr::Constant(Constant {
            value: ConstantValue::Str(parts.join(" ")),
            kind,
        })
    }

    /// '(' ')' | '(' yield_expr ')' | '(' named_expression ')' | '(' star_named_expression ',' [star_named_expressions] ')'
    fn group_or_tuple(&mut self) -> PResult<Option<Expr>> {
        self.attempt(|p| {
            if !p.eat(TokenKind::LPar) {
                return Ok(None);
            }
            if p.eat(TokenKind::RPar) {
                return Ok(Some(Expr::Tuple(Tuple {
                    elts: Vec::new(),
                    ctx: ExprContext::Load,
                })));
            }
            if let Some(value) = p.attempt(|p| {
                let value = p.yield_expr()?;
                Ok(value.filter(|_| p.eat(TokenKind::RPar)))
            })? {
                return Ok(Some(value));
            }
            let Some(first) = p.star_named_expression()? else {
                return Ok(None);
            };
            if p.eat(TokenKind::RPar) {
                return Ok(Some(first));
            }
            let mut elts = vec![first];
            while p.eat(TokenKind::Comma) {
                if p.check(TokenKind::RPar) {
                    break;
                }
                let Some(next) = p.star_named_expression()? else {
                    return Ok(None);
                };
                elts.push(next);
            }
            if !p.eat(TokenKind::RPar) {
                return Ok(None);
            }
            Ok(Some(Expr::Tuple(Tuple {
                elts,
                ctx: ExprContext::Load,
            })))
        })
    }

    /// list: '[' [star_named_expressions] ']'
    fn list_display(&mut self) -> PResult<Option<Expr>> {
        self.attempt(|p| {
            if !p.eat(TokenKind::LSqb) {
                return Ok(None);
            }
            let elts = p.gather(Self::star_named_expression)?.unwrap_or_default();
            if !elts.is_empty() {
                p.eat(TokenKind::Comma);
            }
            if !p.eat(TokenKind::RSqb) {
                return Ok(None);
            }
            Ok(Some(Expr::List(List {
                elts,
                ctx: ExprContext::Load,
            })))
        })
    }

    // ─── Trailers ───────────────────────────────────────────────────────────

    /// Call arguments up to, not including, the closing parenthesis:
    /// positional, `*iterable`, `name=value` and `**mapping`.
    /// Positionals may not follow a keyword, and `*` may not follow `**`.
    fn arguments(&mut self) -> PResult<Option<(Vec<Expr>, Vec<Keyword>)>> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        let mut seen_keyword = false;
        let mut seen_double_star = false;
        loop {
            if self.check(TokenKind::RPar) {
                break;
            }
            if self.eat(TokenKind::Star) {
                if seen_double_star {
                    return Ok(None);
                }
                let Some(value) = self.expression()? else {
                    return Ok(None);
                };
                args.push(Expr::Starred(Starred {
                    value: Box::new(value),
                    ctx: ExprContext::Load,
                }));
            } else if self.eat(TokenKind::DoubleStar) {
                let Some(value) = self.expression()? else {
                    return Ok(None);
                };
                keywords.push(Keyword { arg: None, value });
                seen_double_star = true;
            } else if let Some(keyword) = self.attempt(|p| {
                let Some(arg) = p.name() else {
                    return Ok(None);
                };
                if !p.eat(TokenKind::Equal) {
                    return Ok(None);
                }
                Ok(p.expression()?.map(|value| Keyword {
                    arg: Some(arg),
                    value,
                }))
            })? {
                keywords.push(keyword);
                seen_keyword = true;
            } else {
                if seen_keyword || seen_double_star {
                    return Ok(None);
                }
                let Some(arg) = self.named_expression()? else {
                    return Ok(None);
                };
                args.push(arg);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(Some((args, keywords)))
    }

    /// slices: slice !',' | ','.slice+ [',']
    fn slices(&mut self) -> PResult<Option<Expr>> {
        let Some(first) = self.slice()? else {
            return Ok(None);
        };
        if !self.check(TokenKind::Comma) {
            return Ok(Some(first));
        }
        let mut elts = vec![first];
        while self.eat(TokenKind::Comma) {
            match self.slice()? {
                Some(next) => elts.push(next),
                None => break,
            }
        }
        Ok(Some(Expr::Tuple(Tuple {
            elts,
            ctx: ExprContext::Load,
        })))
    }

    /// slice: [expression] ':' [expression] [':' [expression]] | named_expression
    fn slice(&mut self) -> PResult<Option<Expr>> {
        let mark = self.tokens.mark();
        let lower = self.expression()?;
        if self.eat(TokenKind::Colon) {
            let upper = self.expression()?.map(Box::new);
            let step = if self.eat(TokenKind::Colon) {
                self.expression()?.map(Box::new)
            } else {
                None
            };
            return Ok(Some(Expr::Slice(Slice {
                lower: lower.map(Box::new),
                upper,
                step,
            })));
        }
        match lower {
            Some(index) if !self.check(TokenKind::ColonEqual) => Ok(Some(index)),
            _ => {
                self.tokens.reset(mark);
                self.named_expression()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::parse_module;

    /// Parse a single expression statement and return its value
    fn expr(source: &str) -> Expr {
        let module = parse_module(source).unwrap();
        match module.body.as_slice() {
            [Stmt::Expr(stmt)] => (*stmt.value).clone(),
            other => panic!("Expected one expression statement, got {other:?}"),
        }
    }

    fn num(expr: &Expr) -> &str {
        match expr {
            Expr::Constant(Constant {
                value: ConstantValue::Num(raw),
                ..
            }) => raw,
            other => panic!("Expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let Expr::BinOp(outer) = expr("2 ** 3 ** 2") else {
            panic!("Expected BinOp");
        };
        assert_eq!(outer.op, Operator::Pow);
        assert_eq!(num(&outer.left), "2");
        let Expr::BinOp(inner) = *outer.right else {
            panic!("Expected nested BinOp on the right");
        };
        assert_eq!((num(&inner.left), num(&inner.right)), ("3", "2"));
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let Expr::BinOp(outer) = expr("2 - 3 - 2") else {
            panic!("Expected BinOp");
        };
        assert_eq!(num(&outer.right), "2");
        let Expr::BinOp(inner) = *outer.left else {
            panic!("Expected nested BinOp on the left");
        };
        assert_eq!(inner.op, Operator::Sub);
        assert_eq!((num(&inner.left), num(&inner.right)), ("2", "3"));
    }

    #[test]
    fn test_precedence_of_mixed_operators() {
        // -x - 1 + (2 ** (y ** z))
        let Expr::BinOp(add) = expr("-x-1 + 2**y**z") else {
            panic!("Expected BinOp");
        };
        assert_eq!(add.op, Operator::Add);
        let Expr::BinOp(sub) = *add.left else {
            panic!("Expected subtraction");
        };
        assert!(matches!(
            *sub.left,
            Expr::UnaryOp(UnaryOp {
                op: UnaryOperator::USub,
                ..
            })
        ));
        assert!(matches!(*add.right, Expr::BinOp(BinOp { op: Operator::Pow, .. })));
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        let Expr::UnaryOp(neg) = expr("-2 ** 2") else {
            panic!("Expected UnaryOp");
        };
        assert!(matches!(*neg.operand, Expr::BinOp(_)));
    }

    #[test]
    fn test_bool_chain_is_flat() {
        let Expr::BoolOp(node) = expr("a and b and c") else {
            panic!("Expected BoolOp");
        };
        assert_eq!(node.op, BoolOperator::And);
        assert_eq!(node.values.len(), 3);
        assert!(node.values.iter().all(|v| matches!(v, Expr::Name(_))));
    }

    #[test]
    fn test_mixed_bool_chains() {
        let Expr::BoolOp(or) = expr("a and b and c or c and not d or f") else {
            panic!("Expected BoolOp");
        };
        assert_eq!(or.op, BoolOperator::Or);
        assert_eq!(or.values.len(), 3);
        let Expr::BoolOp(second) = &or.values[1] else {
            panic!("Expected nested and");
        };
        assert!(matches!(
            second.values[1],
            Expr::UnaryOp(UnaryOp {
                op: UnaryOperator::Not,
                ..
            })
        ));
    }

    #[test]
    fn test_parenthesized_bool_is_not_merged() {
        let Expr::BoolOp(node) = expr("(a and b) and c") else {
            panic!("Expected BoolOp");
        };
        assert_eq!(node.values.len(), 2);
        assert!(matches!(node.values[0], Expr::BoolOp(_)));
    }

    #[test]
    fn test_compare_chain_is_flat() {
        let Expr::Compare(node) = expr("a < b == c") else {
            panic!("Expected Compare");
        };
        assert_eq!(node.ops, [CmpOperator::Lt, CmpOperator::Eq]);
        assert_eq!(node.comparators.len(), 2);
    }

    #[test]
    fn test_keyword_comparisons() {
        let Expr::Compare(node) = expr("a < b > c == d is not e in f not in g is h") else {
            panic!("Expected Compare");
        };
        assert_eq!(
            node.ops,
            [
                CmpOperator::Lt,
                CmpOperator::Gt,
                CmpOperator::Eq,
                CmpOperator::IsNot,
                CmpOperator::In,
                CmpOperator::NotIn,
                CmpOperator::Is,
            ]
        );
    }

    #[test]
    fn test_constants() {
        let Expr::Compare(node) = expr("True is None") else {
            panic!("Expected Compare");
        };
        assert_eq!(*node.left, Expr::constant(ConstantValue::Bool(true)));
        assert_eq!(node.comparators[0], Expr::constant(ConstantValue::None));
    }

    #[test]
    fn test_tuple_is_flat() {
        let Expr::Tuple(node) = expr("a, b, c\n") else {
            panic!("Expected Tuple");
        };
        assert_eq!(node.elts.len(), 3);
        assert!(node.elts.iter().all(|e| matches!(e, Expr::Name(_))));
    }

    #[test]
    fn test_trailing_comma_tuple() {
        let Expr::Tuple(node) = expr("1,\n") else {
            panic!("Expected Tuple");
        };
        assert_eq!(node.elts.len(), 1);
    }

    #[test]
    fn test_conditional_inside_tuple() {
        let Expr::Tuple(node) = expr("1 if 2 else a, b, c\n") else {
            panic!("Expected Tuple");
        };
        assert_eq!(node.elts.len(), 3);
        assert!(matches!(node.elts[0], Expr::IfExp(_)));
    }

    #[test]
    fn test_conditional_nests_to_the_right() {
        let Expr::IfExp(outer) = expr("a if b else c if d else e") else {
            panic!("Expected IfExp");
        };
        assert!(matches!(*outer.orelse, Expr::IfExp(_)));
    }

    #[test]
    fn test_conditional_without_else_is_fatal() {
        let err = parse_module("a if b\n").unwrap_err();
        assert!(matches!(err, ParseError::ExpectedElse { .. }));
    }

    #[test]
    fn test_starred_expressions() {
        let Expr::Starred(star) = expr("*a | b\n") else {
            panic!("Expected Starred");
        };
        assert!(matches!(
            *star.value,
            Expr::BinOp(BinOp {
                op: Operator::BitOr,
                ..
            })
        ));
        // A starred operand cannot be compared
        assert!(parse_module("*a is b\n").is_err());
    }

    #[test]
    fn test_not_binds_looser_than_comparisons() {
        assert!(parse_module("a + not b\n").is_err());
        assert!(parse_module("a == not b\n").is_err());
        assert!(parse_module("a is not not b\n").is_err());
        assert!(parse_module("[*not a]\n").is_err());

        let Expr::BoolOp(node) = expr("a and not b") else {
            panic!("Expected BoolOp");
        };
        assert!(matches!(
            node.values[1],
            Expr::UnaryOp(UnaryOp {
                op: UnaryOperator::Not,
                ..
            })
        ));
        let Expr::UnaryOp(outer) = expr("not not a == b") else {
            panic!("Expected UnaryOp");
        };
        assert!(matches!(*outer.operand, Expr::UnaryOp(_)));
    }

    #[test]
    fn test_attribute_chain() {
        let Expr::Attribute(outer) = expr("a.b.c") else {
            panic!("Expected Attribute");
        };
        assert_eq!(outer.attr, "c");
        assert!(matches!(*outer.value, Expr::Attribute(_)));
    }

    #[test]
    fn test_subscript_slices() {
        let Expr::Subscript(sub) = expr("a[a, a:b, a:b:c]") else {
            panic!("Expected Subscript");
        };
        let Expr::Tuple(slices) = *sub.slice else {
            panic!("Expected Tuple of slices");
        };
        assert_eq!(slices.elts.len(), 3);
        assert!(matches!(slices.elts[0], Expr::Name(_)));
        let Expr::Slice(full) = &slices.elts[2] else {
            panic!("Expected Slice");
        };
        assert!(full.lower.is_some() && full.upper.is_some() && full.step.is_some());
    }

    #[test]
    fn test_empty_slice_parts() {
        let Expr::Subscript(sub) = expr("a[::2]") else {
            panic!("Expected Subscript");
        };
        let Expr::Slice(slice) = *sub.slice else {
            panic!("Expected Slice");
        };
        assert!(slice.lower.is_none() && slice.upper.is_none());
        assert_eq!(num(slice.step.as_deref().unwrap()), "2");
    }

    #[test]
    fn test_call_arguments() {
        let Expr::Call(call) = expr("f(a, *b, k=1, **m,)") else {
            panic!("Expected Call");
        };
        assert_eq!(call.args.len(), 2);
        assert!(matches!(call.args[1], Expr::Starred(_)));
        assert_eq!(call.keywords.len(), 2);
        assert_eq!(call.keywords[0].arg.as_deref(), Some("k"));
        assert_eq!(call.keywords[1].arg, None);
    }

    #[test]
    fn test_call_argument_order() {
        assert!(parse_module("f(a=1, b)\n").is_err());
        assert!(parse_module("f(**a, b)\n").is_err());
        assert!(parse_module("f(**a, *b)\n").is_err());

        // Unpacking an iterable after a keyword is still allowed
        let Expr::Call(call) = expr("f(a=1, *b)") else {
            panic!("Expected Call");
        };
        assert!(matches!(call.args[0], Expr::Starred(_)));
        assert_eq!(call.keywords.len(), 1);
    }

    #[test]
    fn test_call_then_attribute() {
        let Expr::Attribute(attr) = expr("f().x") else {
            panic!("Expected Attribute");
        };
        assert!(matches!(*attr.value, Expr::Call(_)));
    }

    #[test]
    fn test_await_and_yield() {
        assert!(matches!(expr("await True"), Expr::Await(_)));
        assert!(matches!(expr("yield from a\n"), Expr::YieldFrom(_)));
        assert!(matches!(expr("yield\n"), Expr::Yield(Yield { value: None })));
    }

    #[test]
    fn test_mixed_literal_operands() {
        let Expr::BinOp(node) = expr("1 + 'a' + None + True") else {
            panic!("Expected BinOp");
        };
        assert_eq!(*node.right, Expr::constant(ConstantValue::Bool(true)));
    }

    #[test]
    fn test_string_concatenation() {
        let Expr::Constant(constant) = expr("u'a' \"b\"") else {
            panic!("Expected Constant");
        };
        assert_eq!(constant.value, ConstantValue::Str("u'a' \"b\"".into()));
        assert_eq!(constant.kind.as_deref(), Some("u"));
    }

    #[test]
    fn test_groups_tuples_and_lists() {
        assert!(matches!(expr("(a)"), Expr::Name(_)));
        assert!(matches!(expr("()"), Expr::Tuple(Tuple { ref elts, .. }) if elts.is_empty()));
        assert!(matches!(expr("(a,)"), Expr::Tuple(Tuple { ref elts, .. }) if elts.len() == 1));
        assert!(matches!(expr("[a, *b,]"), Expr::List(List { ref elts, .. }) if elts.len() == 2));
        assert!(matches!(expr("(yield)"), Expr::Yield(_)));
    }

    #[test]
    fn test_named_expression() {
        let Expr::NamedExpr(node) = expr("(n := len(a))") else {
            panic!("Expected NamedExpr");
        };
        assert_eq!(node.target.context(), Some(ExprContext::Store));
        assert!(matches!(*node.value, Expr::Call(_)));
    }

    #[test]
    fn test_keyword_is_not_an_atom() {
        assert!(parse_module("x = pass\n").is_err());
        assert!(parse_module("a.if\n").is_err());
    }

    #[test]
    fn test_expression_nesting_limit() {
        let source = format!("{}x{}\n", "(".repeat(20), ")".repeat(20));
        let options = crate::ParseOptions { max_depth: 10 };
        let err = crate::parse_module_with(&source, &options).unwrap_err();
        assert!(matches!(err, ParseError::TooDeeplyNested { limit: 10, .. }));
        assert!(parse_module(&source).is_ok());
    }
}
