//! Pyfront Parser - Backtracking recursive descent over a token cursor
//!
//! Every rule is an ordered choice: alternatives are tried in declaration
//! order and the first full match wins. A rule that does not match returns
//! `Ok(None)` with the cursor back where it started; `Err` is reserved for
//! fatal syntax errors that abort the whole parse.
//!
//! Expressions are handed to the Pratt engine in `expr.rs`.
use tracing::{debug, trace};

use crate::ast::*;
use crate::cursor::TokenCursor;
use crate::error::ParseError;
use crate::lexer::{TokenKind, tokenize};

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Words that can never be a plain name
const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield", "True",
    "False", "None",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Tunables for a parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest allowed nesting of expressions and blocks
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { max_depth: 100 }
    }
}

type Rule<T> = fn(&mut Parser) -> PResult<Option<T>>;

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

pub struct Parser {
    pub(crate) tokens: TokenCursor,
    max_depth: usize,
    depth: usize,
}

impl Parser {
    pub fn new(source: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: TokenCursor::new(tokenize(source)?),
            max_depth: options.max_depth,
            depth: 0,
        })
    }

    // ─── Cursor helpers ─────────────────────────────────────────────────────

    /// Run `rule`, restoring the cursor unless it produced a match
    pub(crate) fn attempt<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> PResult<Option<T>>,
    ) -> PResult<Option<T>> {
        let mark = self.tokens.mark();
        let result = rule(self);
        if !matches!(result, Ok(Some(_))) {
            self.tokens.reset(mark);
        }
        result
    }

    /// Ordered choice over `rules`
    fn first_of<T>(&mut self, rules: &[Rule<T>]) -> PResult<Option<T>> {
        for rule in rules {
            if let Some(found) = self.attempt(*rule)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Run `rule` one nesting level deeper, failing once `max_depth` is hit
    pub(crate) fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.max_depth {
            let err = ParseError::too_deeply_nested(self.max_depth, self.tokens.peek());
            debug!(%err, "nesting limit reached");
            return Err(err);
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.tokens.peek().kind == kind
    }

    pub(crate) fn check_word(&self, word: &str) -> bool {
        self.tokens.peek().is_word(word)
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    /// A NAME that is not a keyword
    pub(crate) fn name(&mut self) -> Option<String> {
        let tok = self.tokens.peek();
        if tok.kind == TokenKind::Name && !is_keyword(&tok.raw) {
            Some(self.tokens.advance().raw)
        } else {
            None
        }
    }

    /// `item (',' item)*`; a trailing comma is left unconsumed
    pub(crate) fn gather<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> PResult<Option<T>>,
    ) -> PResult<Option<Vec<T>>> {
        let Some(first) = self.attempt(&mut item)? else {
            return Ok(None);
        };
        let mut items = vec![first];
        loop {
            let mark = self.tokens.mark();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            match self.attempt(&mut item)? {
                Some(next) => items.push(next),
                None => {
                    self.tokens.reset(mark);
                    break;
                }
            }
        }
        Ok(Some(items))
    }

    fn trace_rule(&self, rule: &'static str) {
        let tok = self.tokens.peek();
        trace!(rule, line = tok.line, column = tok.column, "trying rule");
    }

    // ─── Entry points ───────────────────────────────────────────────────────

    /// file: [statements] ENDMARKER
    pub fn parse_module(&mut self) -> Result<Module, ParseError> {
        let body = self.statements()?.unwrap_or_default();
        while self.eat(TokenKind::Newline) {}
        if !self.tokens.at_end() {
            let err = ParseError::invalid_syntax(self.tokens.peek());
            debug!(%err, "trailing tokens after statements");
            return Err(err);
        }
        debug!(statements = body.len(), "parsed module");
        Ok(Module { body })
    }

    /// The while-statement rule on its own; trailing input is not checked
    pub fn parse_while_statement(&mut self) -> PResult<Option<Stmt>> {
        self.attempt(Self::while_stmt)
    }

    // ─── Statements ─────────────────────────────────────────────────────────

    /// statements: statement+
    fn statements(&mut self) -> PResult<Option<Vec<Stmt>>> {
        let mut body = Vec::new();
        while let Some(stmts) = self.statement()? {
            body.extend(stmts);
        }
        Ok(if body.is_empty() { None } else { Some(body) })
    }

    /// statement: compound_stmt | simple_stmts
    fn statement(&mut self) -> PResult<Option<Vec<Stmt>>> {
        if let Some(stmt) = self.compound_stmt()? {
            return Ok(Some(vec![stmt]));
        }
        self.simple_stmts()
    }

    fn compound_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.first_of(&[
            Self::function_def,
            Self::if_stmt,
            Self::class_def,
            Self::with_stmt,
            Self::for_stmt,
            Self::try_stmt,
            Self::while_stmt,
            Self::match_stmt,
        ])
    }

    /// simple_stmts: simple_stmt (';' simple_stmt)* [';'] NEWLINE
    fn simple_stmts(&mut self) -> PResult<Option<Vec<Stmt>>> {
        self.attempt(|p| {
            let Some(first) = p.simple_stmt()? else {
                return Ok(None);
            };
            let mut stmts = vec![first];
            while p.eat(TokenKind::Semi) {
                match p.simple_stmt()? {
                    Some(stmt) => stmts.push(stmt),
                    None => break,
                }
            }
            if !p.eat(TokenKind::Newline) {
                return Ok(None);
            }
            Ok(Some(stmts))
        })
    }

    fn simple_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.first_of(&[
            Self::assignment,
            Self::expr_stmt,
            Self::return_stmt,
            Self::import_stmt,
            Self::raise_stmt,
            Self::pass_stmt,
            Self::del_stmt,
            Self::yield_stmt,
            Self::assert_stmt,
            Self::break_stmt,
            Self::continue_stmt,
            Self::global_stmt,
            Self::nonlocal_stmt,
        ])
    }

    /// block: NEWLINE INDENT statements DEDENT | simple_stmts
    fn block(&mut self) -> PResult<Option<Vec<Stmt>>> {
        self.nested(|p| {
            let indented = p.attempt(|p| {
                if !p.eat(TokenKind::Newline) || !p.eat(TokenKind::Indent) {
                    return Ok(None);
                }
                let Some(body) = p.statements()? else {
                    return Ok(None);
                };
                if !p.eat(TokenKind::Dedent) {
                    return Ok(None);
                }
                Ok(Some(body))
            })?;
            match indented {
                Some(body) => Ok(Some(body)),
                None => p.simple_stmts(),
            }
        })
    }

    // ─── Compound statements ────────────────────────────────────────────────

    /// Productions this grammar does not cover; they never match
    fn unimplemented(&mut self, rule: &'static str) -> PResult<Option<Stmt>> {
        trace!(rule, "production not implemented");
        Ok(None)
    }

    fn function_def(&mut self) -> PResult<Option<Stmt>> {
        self.unimplemented("function_def")
    }

    fn class_def(&mut self) -> PResult<Option<Stmt>> {
        self.unimplemented("class_def")
    }

    fn with_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.unimplemented("with_stmt")
    }

    fn try_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.unimplemented("try_stmt")
    }

    fn match_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.unimplemented("match_stmt")
    }

    /// if_stmt: 'if' named_expression ':' block (elif_stmt | [else_block])
    fn if_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.trace_rule("if_stmt");
        self.attempt(|p| {
            if !p.eat_word("if") {
                return Ok(None);
            }
            p.conditional_tail()
        })
    }

    /// Everything after `if` / `elif`
    fn conditional_tail(&mut self) -> PResult<Option<Stmt>> {
        let Some(test) = self.named_expression()? else {
            return Ok(None);
        };
        if !self.eat(TokenKind::Colon) {
            return Ok(None);
        }
        let Some(body) = self.block()? else {
            return Ok(None);
        };
        let orelse = if self.eat_word("elif") {
            let Some(elif) = self.conditional_tail()? else {
                return Ok(None);
            };
            vec![elif]
        } else {
            self.else_block()?.unwrap_or_default()
        };
        Ok(Some(Stmt::If(IfStmt {
            test: Box::new(test),
            body,
            orelse,
        })))
    }

    /// else_block: 'else' ':' block
    fn else_block(&mut self) -> PResult<Option<Vec<Stmt>>> {
        self.attempt(|p| {
            if !p.eat_word("else") || !p.eat(TokenKind::Colon) {
                return Ok(None);
            }
            p.block()
        })
    }

    /// while_stmt: 'while' named_expression ':' block [else_block]
    fn while_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.trace_rule("while_stmt");
        self.attempt(|p| {
            if !p.eat_word("while") {
                return Ok(None);
            }
            let Some(test) = p.named_expression()? else {
                return Ok(None);
            };
            if !p.eat(TokenKind::Colon) {
                return Ok(None);
            }
            let Some(body) = p.block()? else {
                return Ok(None);
            };
            let orelse = p.else_block()?.unwrap_or_default();
            Ok(Some(Stmt::While(WhileStmt {
                test: Box::new(test),
                body,
                orelse,
            })))
        })
    }

    /// for_stmt: 'for' star_targets 'in' star_expressions ':' block [else_block]
    fn for_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.trace_rule("for_stmt");
        self.attempt(|p| {
            if !p.eat_word("for") {
                return Ok(None);
            }
            let Some(target) = p.star_targets()? else {
                return Ok(None);
            };
            if !p.eat_word("in") {
                return Ok(None);
            }
            let Some(iter) = p.star_expressions()? else {
                return Ok(None);
            };
            if !p.eat(TokenKind::Colon) {
                return Ok(None);
            }
            let Some(body) = p.block()? else {
                return Ok(None);
            };
            let orelse = p.else_block()?.unwrap_or_default();
            Ok(Some(Stmt::For(ForStmt {
                target: Box::new(target),
                iter: Box::new(iter),
                body,
                orelse,
            })))
        })
    }

    // ─── Assignment ─────────────────────────────────────────────────────────

    /// assignment:
    ///     | NAME ':' expression ['=' annotated_rhs]
    ///     | ('(' single_target ')' | single_subscript_attribute_target) ':' expression ['=' annotated_rhs]
    ///     | (star_targets '=')+ (yield_expr | star_expressions) !'='
    ///     | single_target augassign (yield_expr | star_expressions)
    fn assignment(&mut self) -> PResult<Option<Stmt>> {
        self.trace_rule("assignment");
        self.first_of(&[
            Self::annotated_name_assignment,
            Self::annotated_target_assignment,
            Self::chained_assignment,
            Self::augmented_assignment,
        ])
    }

    fn annotated_name_assignment(&mut self) -> PResult<Option<Stmt>> {
        let Some(id) = self.name() else {
            return Ok(None);
        };
        if !self.eat(TokenKind::Colon) {
            return Ok(None);
        }
        self.annotation_tail(Expr::name(id, ExprContext::Store), true)
    }

    fn annotated_target_assignment(&mut self) -> PResult<Option<Stmt>> {
        let parenthesized = self.attempt(|p| {
            if !p.eat(TokenKind::LPar) {
                return Ok(None);
            }
            let Some(target) = p.single_target()? else {
                return Ok(None);
            };
            Ok(p.eat(TokenKind::RPar).then_some(target))
        })?;
        let target = match parenthesized {
            Some(target) => target,
            None => match self.single_subscript_attribute_target()? {
                Some(target) => target,
                None => return Ok(None),
            },
        };
        if !self.eat(TokenKind::Colon) {
            return Ok(None);
        }
        self.annotation_tail(target, false)
    }

    /// expression ['=' annotated_rhs], after the colon
    fn annotation_tail(&mut self, target: Expr, simple: bool) -> PResult<Option<Stmt>> {
        let Some(annotation) = self.expression()? else {
            return Ok(None);
        };
        let value = if self.eat(TokenKind::Equal) {
            let Some(value) = self.annotated_rhs()? else {
                return Ok(None);
            };
            Some(Box::new(value))
        } else {
            None
        };
        Ok(Some(Stmt::AnnAssign(AnnAssign {
            target: Box::new(target),
            annotation: Box::new(annotation),
            value,
            simple,
        })))
    }

    /// Each target is parsed as an ordinary expression and then retagged to
    /// Store; anything that refuses the retag is not a target.
    fn chained_assignment(&mut self) -> PResult<Option<Stmt>> {
        let mut targets = Vec::new();
        loop {
            let target = self.attempt(|p| {
                let Some(mut target) = p.star_expressions()? else {
                    return Ok(None);
                };
                if !p.eat(TokenKind::Equal) || matches!(target, Expr::Starred(_)) {
                    return Ok(None);
                }
                Ok(target.set_context(ExprContext::Store).ok().map(|()| target))
            })?;
            match target {
                Some(target) => targets.push(target),
                None => break,
            }
        }
        if targets.is_empty() {
            return Ok(None);
        }
        let Some(value) = self.annotated_rhs()? else {
            return Ok(None);
        };
        if self.check(TokenKind::Equal) {
            return Ok(None);
        }
        Ok(Some(Stmt::Assign(Assign {
            targets,
            value: Box::new(value),
        })))
    }

    fn augmented_assignment(&mut self) -> PResult<Option<Stmt>> {
        let Some(target) = self.single_target()? else {
            return Ok(None);
        };
        let Some(op) = self.augassign() else {
            return Ok(None);
        };
        let Some(value) = self.annotated_rhs()? else {
            return Ok(None);
        };
        Ok(Some(Stmt::AugAssign(AugAssign {
            target: Box::new(target),
            op,
            value: Box::new(value),
        })))
    }

    /// annotated_rhs: yield_expr | star_expressions
    ///
    /// A starred value is only assignable inside a tuple.
    fn annotated_rhs(&mut self) -> PResult<Option<Expr>> {
        if let Some(value) = self.yield_expr()? {
            return Ok(Some(value));
        }
        Ok(self
            .star_expressions()?
            .filter(|value| !matches!(value, Expr::Starred(_))))
    }

    fn augassign(&mut self) -> Option<Operator> {
        let op = match self.tokens.peek().kind {
            TokenKind::PlusEqual => Operator::Add,
            TokenKind::MinEqual => Operator::Sub,
            TokenKind::StarEqual => Operator::Mult,
            TokenKind::AtEqual => Operator::MatMult,
            TokenKind::SlashEqual => Operator::Div,
            TokenKind::PercentEqual => Operator::Mod,
            TokenKind::AmperEqual => Operator::BitAnd,
            TokenKind::VBarEqual => Operator::BitOr,
            TokenKind::CircumflexEqual => Operator::BitXor,
            TokenKind::LeftShiftEqual => Operator::LShift,
            TokenKind::RightShiftEqual => Operator::RShift,
            TokenKind::DoubleStarEqual => Operator::Pow,
            TokenKind::DoubleSlashEqual => Operator::FloorDiv,
            _ => return None,
        };
        self.tokens.advance();
        Some(op)
    }

    // ─── Targets ────────────────────────────────────────────────────────────

    /// single_target: single_subscript_attribute_target | NAME | '(' single_target ')'
    fn single_target(&mut self) -> PResult<Option<Expr>> {
        if let Some(target) = self.single_subscript_attribute_target()? {
            return Ok(Some(target));
        }
        if let Some(id) = self.name() {
            return Ok(Some(Expr::name(id, ExprContext::Store)));
        }
        self.attempt(|p| {
            if !p.eat(TokenKind::LPar) {
                return Ok(None);
            }
            let Some(target) = p.single_target()? else {
                return Ok(None);
            };
            Ok(p.eat(TokenKind::RPar).then_some(target))
        })
    }

    /// A primary chain ending in `.NAME` or `[slices]`, as a Store target
    fn single_subscript_attribute_target(&mut self) -> PResult<Option<Expr>> {
        self.attempt(|p| {
            let Some(mut target) = p.t_primary()? else {
                return Ok(None);
            };
            if !target.is_single_target() {
                return Ok(None);
            }
            Ok(target.set_context(ExprContext::Store).ok().map(|()| target))
        })
    }

    /// star_targets: star_target !',' | star_target (',' star_target)* [',']
    pub(crate) fn star_targets(&mut self) -> PResult<Option<Expr>> {
        self.attempt(|p| {
            let Some(mut targets) = p.gather(Self::star_target)? else {
                return Ok(None);
            };
            if targets.len() == 1 && !p.eat(TokenKind::Comma) {
                return Ok(targets.pop());
            }
            p.eat(TokenKind::Comma);
            Ok(Some(Expr::Tuple(Tuple {
                elts: targets,
                ctx: ExprContext::Store,
            })))
        })
    }

    /// star_target: '*' (!'*' star_target) | target_with_star_atom
    fn star_target(&mut self) -> PResult<Option<Expr>> {
        self.attempt(|p| {
            if p.eat(TokenKind::Star) {
                if p.check(TokenKind::Star) {
                    return Ok(None);
                }
                let Some(inner) = p.star_target()? else {
                    return Ok(None);
                };
                let mut starred = Expr::Starred(Starred {
                    value: Box::new(inner),
                    ctx: ExprContext::Load,
                });
                return Ok(starred.set_context(ExprContext::Store).ok().map(|()| starred));
            }
            p.target_with_star_atom()
        })
    }

    /// target_with_star_atom: single_subscript_attribute_target | star_atom
    fn target_with_star_atom(&mut self) -> PResult<Option<Expr>> {
        if let Some(target) = self.single_subscript_attribute_target()? {
            return Ok(Some(target));
        }
        self.star_atom()
    }

    /// star_atom:
    ///     | NAME
    ///     | '(' target_with_star_atom ')'
    ///     | '(' [star_targets_tuple_seq] ')'
    ///     | '[' [star_targets_list_seq] ']'
    fn star_atom(&mut self) -> PResult<Option<Expr>> {
        if let Some(id) = self.name() {
            return Ok(Some(Expr::name(id, ExprContext::Store)));
        }
        let grouped = self.attempt(|p| {
            if !p.eat(TokenKind::LPar) {
                return Ok(None);
            }
            let Some(target) = p.target_with_star_atom()? else {
                return Ok(None);
            };
            Ok(p.eat(TokenKind::RPar).then_some(target))
        })?;
        if grouped.is_some() {
            return Ok(grouped);
        }
        let tuple = self.attempt(|p| {
            if !p.eat(TokenKind::LPar) {
                return Ok(None);
            }
            let elts = p.star_targets_tuple_seq()?.unwrap_or_default();
            if !p.eat(TokenKind::RPar) {
                return Ok(None);
            }
            Ok(Some(Expr::Tuple(Tuple {
                elts,
                ctx: ExprContext::Store,
            })))
        })?;
        if tuple.is_some() {
            return Ok(tuple);
        }
        self.attempt(|p| {
            if !p.eat(TokenKind::LSqb) {
                return Ok(None);
            }
            let elts = p.star_targets_list_seq()?.unwrap_or_default();
            if !p.eat(TokenKind::RSqb) {
                return Ok(None);
            }
            Ok(Some(Expr::List(List {
                elts,
                ctx: ExprContext::Store,
            })))
        })
    }

    /// star_targets_list_seq: ','.star_target+ [',']
    fn star_targets_list_seq(&mut self) -> PResult<Option<Vec<Expr>>> {
        let targets = self.gather(Self::star_target)?;
        if targets.is_some() {
            self.eat(TokenKind::Comma);
        }
        Ok(targets)
    }

    /// star_targets_tuple_seq: star_target (',' star_target)+ [','] | star_target ','
    fn star_targets_tuple_seq(&mut self) -> PResult<Option<Vec<Expr>>> {
        self.attempt(|p| {
            let Some(targets) = p.gather(Self::star_target)? else {
                return Ok(None);
            };
            let trailing = p.eat(TokenKind::Comma);
            if targets.len() == 1 && !trailing {
                return Ok(None);
            }
            Ok(Some(targets))
        })
    }

    // ─── Simple statements ──────────────────────────────────────────────────

    fn expr_stmt(&mut self) -> PResult<Option<Stmt>> {
        Ok(self.star_expressions()?.map(|value| {
            Stmt::Expr(ExprStmt {
                value: Box::new(value),
            })
        }))
    }

    /// return_stmt: 'return' [star_expressions]
    fn return_stmt(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("return") {
            return Ok(None);
        }
        let value = self.star_expressions()?.map(Box::new);
        Ok(Some(Stmt::Return(ReturnStmt { value })))
    }

    /// raise_stmt: 'raise' expression ['from' expression] | 'raise'
    fn raise_stmt(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("raise") {
            return Ok(None);
        }
        let Some(exc) = self.expression()? else {
            return Ok(Some(Stmt::Raise(RaiseStmt {
                exc: None,
                cause: None,
            })));
        };
        let cause = if self.eat_word("from") {
            let Some(cause) = self.expression()? else {
                return Ok(None);
            };
            Some(Box::new(cause))
        } else {
            None
        };
        Ok(Some(Stmt::Raise(RaiseStmt {
            exc: Some(Box::new(exc)),
            cause,
        })))
    }

    fn pass_stmt(&mut self) -> PResult<Option<Stmt>> {
        Ok(self.eat_word("pass").then_some(Stmt::Pass))
    }

    fn break_stmt(&mut self) -> PResult<Option<Stmt>> {
        Ok(self.eat_word("break").then_some(Stmt::Break))
    }

    fn continue_stmt(&mut self) -> PResult<Option<Stmt>> {
        Ok(self.eat_word("continue").then_some(Stmt::Continue))
    }

    /// del_stmt: 'del' del_targets &(';' | NEWLINE)
    fn del_stmt(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("del") {
            return Ok(None);
        }
        let Some(targets) = self.gather(|p| {
            let Some(mut target) = p.expression()? else {
                return Ok(None);
            };
            Ok(target.set_context(ExprContext::Del).ok().map(|()| target))
        })?
        else {
            return Ok(None);
        };
        self.eat(TokenKind::Comma);
        if !self.check(TokenKind::Semi) && !self.check(TokenKind::Newline) {
            return Ok(None);
        }
        Ok(Some(Stmt::Delete(DeleteStmt { targets })))
    }

    /// yield_stmt: yield_expr
    fn yield_stmt(&mut self) -> PResult<Option<Stmt>> {
        Ok(self.yield_expr()?.map(|value| {
            Stmt::Expr(ExprStmt {
                value: Box::new(value),
            })
        }))
    }

    /// assert_stmt: 'assert' expression [',' expression]
    fn assert_stmt(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("assert") {
            return Ok(None);
        }
        let Some(test) = self.expression()? else {
            return Ok(None);
        };
        let msg = if self.eat(TokenKind::Comma) {
            let Some(msg) = self.expression()? else {
                return Ok(None);
            };
            Some(Box::new(msg))
        } else {
            None
        };
        Ok(Some(Stmt::Assert(AssertStmt {
            test: Box::new(test),
            msg,
        })))
    }

    /// global_stmt: 'global' ','.NAME+
    fn global_stmt(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("global") {
            return Ok(None);
        }
        Ok(self
            .gather(|p| Ok(p.name()))?
            .map(|names| Stmt::Global(GlobalStmt { names })))
    }

    /// nonlocal_stmt: 'nonlocal' ','.NAME+
    fn nonlocal_stmt(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("nonlocal") {
            return Ok(None);
        }
        Ok(self
            .gather(|p| Ok(p.name()))?
            .map(|names| Stmt::Nonlocal(NonlocalStmt { names })))
    }

    // ─── Imports ────────────────────────────────────────────────────────────

    /// import_stmt: import_name | import_from
    fn import_stmt(&mut self) -> PResult<Option<Stmt>> {
        self.trace_rule("import_stmt");
        self.first_of(&[Self::import_name, Self::import_from])
    }

    /// import_name: 'import' dotted_as_names
    fn import_name(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("import") {
            return Ok(None);
        }
        Ok(self
            .gather(Self::dotted_as_name)?
            .map(|names| Stmt::Import(Import { names })))
    }

    /// dotted_as_name: dotted_name ['as' NAME]
    fn dotted_as_name(&mut self) -> PResult<Option<Alias>> {
        let Some(name) = self.dotted_name() else {
            return Ok(None);
        };
        self.alias_tail(name)
    }

    /// ['as' NAME] after an imported name
    fn alias_tail(&mut self, name: String) -> PResult<Option<Alias>> {
        if !self.eat_word("as") {
            return Ok(Some(Alias { name, asname: None }));
        }
        Ok(self.name().map(|asname| Alias {
            name,
            asname: Some(asname),
        }))
    }

    /// dotted_name: NAME ('.' NAME)*
    fn dotted_name(&mut self) -> Option<String> {
        let mut dotted = self.name()?;
        loop {
            let mark = self.tokens.mark();
            if !self.eat(TokenKind::Dot) {
                break;
            }
            match self.name() {
                Some(part) => {
                    dotted.push('.');
                    dotted.push_str(&part);
                }
                None => {
                    self.tokens.reset(mark);
                    break;
                }
            }
        }
        Some(dotted)
    }

    /// import_from:
    ///     | 'from' ('.' | '...')* dotted_name 'import' import_from_targets
    ///     | 'from' ('.' | '...')+ 'import' import_from_targets
    fn import_from(&mut self) -> PResult<Option<Stmt>> {
        if !self.eat_word("from") {
            return Ok(None);
        }
        let mut level = 0;
        loop {
            if self.eat(TokenKind::Dot) {
                level += 1;
            } else if self.eat(TokenKind::Ellipsis) {
                level += 3;
            } else {
                break;
            }
        }
        let module = self.dotted_name();
        if module.is_none() && level == 0 {
            return Ok(None);
        }
        if !self.eat_word("import") {
            return Ok(None);
        }
        let Some(names) = self.import_from_targets()? else {
            return Ok(None);
        };
        Ok(Some(Stmt::ImportFrom(ImportFrom {
            module,
            names,
            level,
        })))
    }

    /// import_from_targets:
    ///     | '(' import_from_as_names [','] ')'
    ///     | import_from_as_names !','
    ///     | '*'
    fn import_from_targets(&mut self) -> PResult<Option<Vec<Alias>>> {
        let parenthesized = self.attempt(|p| {
            if !p.eat(TokenKind::LPar) {
                return Ok(None);
            }
            let Some(names) = p.gather(Self::import_from_as_name)? else {
                return Ok(None);
            };
            p.eat(TokenKind::Comma);
            Ok(p.eat(TokenKind::RPar).then_some(names))
        })?;
        if parenthesized.is_some() {
            return Ok(parenthesized);
        }
        let bare = self.attempt(|p| {
            let names = p.gather(Self::import_from_as_name)?;
            Ok(names.filter(|_| !p.check(TokenKind::Comma)))
        })?;
        if bare.is_some() {
            return Ok(bare);
        }
        Ok(self.eat(TokenKind::Star).then(|| {
            vec![Alias {
                name: "*".to_string(),
                asname: None,
            }]
        }))
    }

    /// import_from_as_name: NAME ['as' NAME]
    fn import_from_as_name(&mut self) -> PResult<Option<Alias>> {
        let Some(name) = self.name() else {
            return Ok(None);
        };
        self.alias_tail(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{parse_module, parse_module_with, parse_while_statement};

    fn parse_one(source: &str) -> Stmt {
        let module = parse_module(source).unwrap();
        assert_eq!(module.body.len(), 1, "expected one statement in {source:?}");
        module.body.into_iter().next().unwrap()
    }

    fn name_id(expr: &Expr) -> &str {
        match expr {
            Expr::Name(name) => &name.id,
            other => panic!("Expected Name, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_module() {
        assert!(parse_module("").unwrap().body.is_empty());
        assert!(parse_module("\n\n# nothing\n").unwrap().body.is_empty());
    }

    #[test]
    fn test_attribute_chain_assignment_is_store() {
        let Stmt::Assign(assign) = parse_one("a.b.c = 1\n") else {
            panic!("Expected Assign");
        };
        assert_eq!(assign.targets.len(), 1);
        let Expr::Attribute(attr) = &assign.targets[0] else {
            panic!("Expected Attribute target");
        };
        assert_eq!(attr.attr, "c");
        assert_eq!(attr.ctx, ExprContext::Store);
        // The inner chain is still read, not written
        assert_eq!(attr.value.context(), Some(ExprContext::Load));
    }

    #[test]
    fn test_chained_assignment() {
        let module = parse_module("a = b = c = d + e\na += b * d\n").unwrap();
        let Stmt::Assign(assign) = &module.body[0] else {
            panic!("Expected Assign");
        };
        let ids: Vec<&str> = assign.targets.iter().map(name_id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(
            assign
                .targets
                .iter()
                .all(|t| t.context() == Some(ExprContext::Store))
        );
        let Stmt::AugAssign(aug) = &module.body[1] else {
            panic!("Expected AugAssign");
        };
        assert_eq!(aug.op, Operator::Add);
        assert!(matches!(*aug.value, Expr::BinOp(BinOp { op: Operator::Mult, .. })));
    }

    #[test]
    fn test_literal_target_is_a_syntax_error() {
        let err = parse_module("1 = x\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
        assert!(parse_module("f() = x\n").is_err());
        assert!(parse_module("a + b = x\n").is_err());
    }

    #[test]
    fn test_tuple_and_starred_targets() {
        let Stmt::Assign(assign) = parse_one("a, *b = c\n") else {
            panic!("Expected Assign");
        };
        let Expr::Tuple(tuple) = &assign.targets[0] else {
            panic!("Expected Tuple target");
        };
        assert_eq!(tuple.ctx, ExprContext::Store);
        let Expr::Starred(star) = &tuple.elts[1] else {
            panic!("Expected Starred");
        };
        assert_eq!(star.value.context(), Some(ExprContext::Store));
    }

    #[test]
    fn test_bare_starred_is_not_assignable() {
        assert!(parse_module("x = *a\n").is_err());
        assert!(parse_module("*a = b\n").is_err());
        assert!(parse_module("x: list = *a\n").is_err());
        assert!(parse_module("x += *a\n").is_err());

        let Stmt::Assign(assign) = parse_one("x = *a, b\n") else {
            panic!("Expected Assign");
        };
        assert!(matches!(*assign.value, Expr::Tuple(_)));
    }

    #[test]
    fn test_annotated_name() {
        let Stmt::AnnAssign(ann) = parse_one("a: int = 1\n") else {
            panic!("Expected AnnAssign");
        };
        assert!(ann.simple);
        assert_eq!(name_id(&ann.target), "a");
        assert_eq!(name_id(&ann.annotation), "int");
        assert!(ann.value.is_some());
    }

    #[test]
    fn test_annotated_attribute_target() {
        let Stmt::AnnAssign(ann) = parse_one("a[b].c: int = 1\n") else {
            panic!("Expected AnnAssign");
        };
        assert!(!ann.simple);
        let Expr::Attribute(attr) = &*ann.target else {
            panic!("Expected Attribute target");
        };
        assert_eq!(attr.ctx, ExprContext::Store);
        assert!(matches!(*attr.value, Expr::Subscript(_)));
    }

    #[test]
    fn test_annotated_parenthesized_name() {
        let Stmt::AnnAssign(ann) = parse_one("(a): int\n") else {
            panic!("Expected AnnAssign");
        };
        assert!(!ann.simple);
        assert!(ann.value.is_none());
    }

    #[test]
    fn test_backtracking_leaves_no_residue() {
        // Both take different assignment alternatives and still end cleanly
        let module = parse_module("a: int = 1\na[b].c: int = 1\nx = 2\n").unwrap();
        assert_eq!(module.body.len(), 3);
        assert!(matches!(module.body[2], Stmt::Assign(_)));
    }

    #[test]
    fn test_augmented_attribute_target() {
        let Stmt::AugAssign(aug) = parse_one("self.count //= 2\n") else {
            panic!("Expected AugAssign");
        };
        assert_eq!(aug.op, Operator::FloorDiv);
        assert_eq!(aug.target.context(), Some(ExprContext::Store));
    }

    #[test]
    fn test_yield_assignment_value() {
        let Stmt::Assign(assign) = parse_one("x = yield y\n") else {
            panic!("Expected Assign");
        };
        assert!(matches!(*assign.value, Expr::Yield(_)));
    }

    #[test]
    fn test_while_with_block_and_else() {
        let Stmt::While(stmt) = parse_one("while x:\n    -x-1 + 2**y**z and u\nelse:\n    pass\n")
        else {
            panic!("Expected While");
        };
        assert_eq!(stmt.body.len(), 1);
        assert_eq!(stmt.orelse, vec![Stmt::Pass]);
    }

    #[test]
    fn test_while_missing_colon_is_fatal_at_top_level() {
        let err = parse_module("while x\n").unwrap_err();
        let ParseError::InvalidSyntax { token, line, column, .. } = err else {
            panic!("Expected InvalidSyntax");
        };
        assert_eq!(token, "'while'");
        assert_eq!((line, column), (1, 1));
    }

    #[test]
    fn test_while_rule_alone() {
        assert!(matches!(
            parse_while_statement("while a: pass\n").unwrap(),
            Some(Stmt::While(_))
        ));
        assert_eq!(parse_while_statement("while x\n").unwrap(), None);
        assert_eq!(parse_while_statement("x = 1\n").unwrap(), None);
    }

    #[test]
    fn test_if_elif_else_chain() {
        let source = "if a:\n    x\nelif b:\n    y\nelse:\n    z\n";
        let Stmt::If(stmt) = parse_one(source) else {
            panic!("Expected If");
        };
        let [Stmt::If(elif)] = stmt.orelse.as_slice() else {
            panic!("Expected nested If for elif");
        };
        assert_eq!(name_id(&elif.test), "b");
        assert_eq!(elif.orelse.len(), 1);
    }

    #[test]
    fn test_for_loop_targets() {
        let Stmt::For(stmt) = parse_one("for i, (j, *k) in pairs:\n    pass\n") else {
            panic!("Expected For");
        };
        let Expr::Tuple(target) = &*stmt.target else {
            panic!("Expected Tuple target");
        };
        assert_eq!(target.elts.len(), 2);
        let Expr::Tuple(inner) = &target.elts[1] else {
            panic!("Expected nested Tuple");
        };
        assert!(matches!(inner.elts[1], Expr::Starred(_)));
        assert!(parse_module("for * *a in b: pass\n").is_err());
    }

    #[test]
    fn test_nested_blocks() {
        let source = "while a:\n    if b:\n        break\n    continue\n";
        let Stmt::While(stmt) = parse_one(source) else {
            panic!("Expected While");
        };
        assert_eq!(stmt.body.len(), 2);
        assert_eq!(stmt.body[1], Stmt::Continue);
    }

    #[test]
    fn test_semicolon_separated_statements() {
        let module = parse_module("a = 1; b = 2;\n").unwrap();
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn test_imports() {
        let Stmt::Import(import) = parse_one("import os.path as p, sys\n") else {
            panic!("Expected Import");
        };
        assert_eq!(import.names[0].name, "os.path");
        assert_eq!(import.names[0].asname.as_deref(), Some("p"));
        assert_eq!(import.names[1].name, "sys");
    }

    #[test]
    fn test_relative_import_levels() {
        let Stmt::ImportFrom(from) = parse_one("from ...pkg.mod import (a as b, c,)\n") else {
            panic!("Expected ImportFrom");
        };
        assert_eq!(from.level, 3);
        assert_eq!(from.module.as_deref(), Some("pkg.mod"));
        assert_eq!(from.names.len(), 2);

        let Stmt::ImportFrom(from) = parse_one("from .. import *\n") else {
            panic!("Expected ImportFrom");
        };
        assert_eq!(from.level, 2);
        assert_eq!(from.module, None);
        assert_eq!(from.names[0].name, "*");

        assert!(parse_module("from import x\n").is_err());
        assert!(parse_module("from a import b,\n").is_err());
    }

    #[test]
    fn test_keyword_is_not_a_module_name() {
        assert!(parse_module("import import\n").is_err());
    }

    #[test]
    fn test_simple_keyword_statements() {
        let module =
            parse_module("pass\nreturn\nreturn a, b\nraise E from c\nglobal a, b\nnonlocal c\n")
                .unwrap();
        assert_eq!(module.body.len(), 6);
        assert!(matches!(&module.body[2], Stmt::Return(ReturnStmt { value: Some(v) }) if matches!(**v, Expr::Tuple(_))));
        let Stmt::Global(global) = &module.body[4] else {
            panic!("Expected Global");
        };
        assert_eq!(global.names, ["a", "b"]);
    }

    #[test]
    fn test_del_targets_use_del_context() {
        let Stmt::Delete(del) = parse_one("del a, b[0], c.d\n") else {
            panic!("Expected Delete");
        };
        assert_eq!(del.targets.len(), 3);
        assert!(
            del.targets
                .iter()
                .all(|t| t.context() == Some(ExprContext::Del))
        );
        assert!(parse_module("del 1\n").is_err());
    }

    #[test]
    fn test_assert_with_message() {
        let Stmt::Assert(stmt) = parse_one("assert x, 'boom'\n") else {
            panic!("Expected Assert");
        };
        assert!(stmt.msg.is_some());
    }

    #[test]
    fn test_unimplemented_productions_never_match() {
        assert!(matches!(
            parse_module("def f():\n    pass\n").unwrap_err(),
            ParseError::InvalidSyntax { .. }
        ));
        assert!(parse_module("class A: pass\n").is_err());
    }

    #[test]
    fn test_block_nesting_limit() {
        let options = ParseOptions { max_depth: 3 };
        let source = "while a:\n    while b:\n        while c:\n            while d:\n                pass\n";
        let err = parse_module_with(source, &options).unwrap_err();
        assert!(matches!(err, ParseError::TooDeeplyNested { limit: 3, .. }));
        assert!(parse_module(source).is_ok());
    }
}
