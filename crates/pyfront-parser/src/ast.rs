//! Abstract syntax tree produced by the parser.
//!
//! Node and field names follow Python's `ast` module. Every node owns its
//! children outright. Expressions that may appear as assignment targets carry
//! an [`ExprContext`] which starts as `Load` and is rewritten by
//! [`Expr::set_context`] once the grammar knows the expression is a target.

use serde::Serialize;

use crate::error::ContextError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum Stmt {
    Expr(ExprStmt),
    Assign(Assign),
    AugAssign(AugAssign),
    AnnAssign(AnnAssign),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Import(Import),
    ImportFrom(ImportFrom),
    Assert(AssertStmt),
    Return(ReturnStmt),
    Raise(RaiseStmt),
    Delete(DeleteStmt),
    Global(GlobalStmt),
    Nonlocal(NonlocalStmt),
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExprStmt {
    pub value: Box<Expr>,
}

/// `a = b = value`; targets in source order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assign {
    pub targets: Vec<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AugAssign {
    pub target: Box<Expr>,
    pub op: Operator,
    pub value: Box<Expr>,
}

/// `simple` is true only for a bare, unparenthesized name target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnAssign {
    pub target: Box<Expr>,
    pub annotation: Box<Expr>,
    pub value: Option<Box<Expr>>,
    pub simple: bool,
}

/// `elif` chains are nested `IfStmt`s in `orelse`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStmt {
    pub test: Box<Expr>,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileStmt {
    pub test: Box<Expr>,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForStmt {
    pub target: Box<Expr>,
    pub iter: Box<Expr>,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub names: Vec<Alias>,
}

/// `level` counts leading dots; `...` counts as three
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFrom {
    pub module: Option<String>,
    pub names: Vec<Alias>,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertStmt {
    pub test: Box<Expr>,
    pub msg: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaiseStmt {
    pub exc: Option<Box<Expr>>,
    pub cause: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteStmt {
    pub targets: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStmt {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonlocalStmt {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum Expr {
    BoolOp(BoolOp),
    NamedExpr(NamedExpr),
    BinOp(BinOp),
    UnaryOp(UnaryOp),
    IfExp(IfExp),
    Await(Await),
    Yield(Yield),
    YieldFrom(YieldFrom),
    Compare(Compare),
    Call(Call),
    Constant(Constant),
    Attribute(Attribute),
    Subscript(Subscript),
    Starred(Starred),
    Name(Name),
    List(List),
    Tuple(Tuple),
    Slice(Slice),
}

/// `a and b and c` is one node with three values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoolOp {
    pub op: BoolOperator,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedExpr {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinOp {
    pub left: Box<Expr>,
    pub op: Operator,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryOp {
    pub op: UnaryOperator,
    pub operand: Box<Expr>,
}

/// `body if test else orelse`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfExp {
    pub test: Box<Expr>,
    pub body: Box<Expr>,
    pub orelse: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Await {
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Yield {
    pub value: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldFrom {
    pub value: Box<Expr>,
}

/// `ops` and `comparators` always have the same length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compare {
    pub left: Box<Expr>,
    pub ops: Vec<CmpOperator>,
    pub comparators: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    pub keywords: Vec<Keyword>,
}

/// `arg` is `None` for `**mapping`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// Literal with its source spelling. `kind` is `Some("u")` for u-strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    pub value: ConstantValue,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstantValue {
    None,
    Bool(bool),
    Ellipsis,
    Num(String),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub value: Box<Expr>,
    pub attr: String,
    pub ctx: ExprContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscript {
    pub value: Box<Expr>,
    pub slice: Box<Expr>,
    pub ctx: ExprContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Starred {
    pub value: Box<Expr>,
    pub ctx: ExprContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Name {
    pub id: String,
    pub ctx: ExprContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub elts: Vec<Expr>,
    pub ctx: ExprContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tuple {
    pub elts: Vec<Expr>,
    pub ctx: ExprContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub lower: Option<Box<Expr>>,
    pub upper: Option<Box<Expr>>,
    pub step: Option<Box<Expr>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators and contexts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExprContext {
    Load,
    Store,
    Del,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mult => "*",
            Operator::MatMult => "@",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitAnd => "&",
            Operator::FloorDiv => "//",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoolOperator {
    And,
    Or,
}

impl BoolOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            BoolOperator::And => "and",
            BoolOperator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    Invert,
    Not,
    UAdd,
    USub,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Invert => "~",
            UnaryOperator::Not => "not ",
            UnaryOperator::UAdd => "+",
            UnaryOperator::USub => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOperator::Eq => "==",
            CmpOperator::NotEq => "!=",
            CmpOperator::Lt => "<",
            CmpOperator::LtE => "<=",
            CmpOperator::Gt => ">",
            CmpOperator::GtE => ">=",
            CmpOperator::Is => "is",
            CmpOperator::IsNot => "is not",
            CmpOperator::In => "in",
            CmpOperator::NotIn => "not in",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expression helpers
// ─────────────────────────────────────────────────────────────────────────────

impl Expr {
    pub fn name(id: impl Into<String>, ctx: ExprContext) -> Expr {
        Expr::Name(Name { id: id.into(), ctx })
    }

    pub fn constant(value: ConstantValue) -> Expr {
        Expr::Constant(Constant { value, kind: None })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::BoolOp(_) => "BoolOp",
            Expr::NamedExpr(_) => "NamedExpr",
            Expr::BinOp(_) => "BinOp",
            Expr::UnaryOp(_) => "UnaryOp",
            Expr::IfExp(_) => "IfExp",
            Expr::Await(_) => "Await",
            Expr::Yield(_) => "Yield",
            Expr::YieldFrom(_) => "YieldFrom",
            Expr::Compare(_) => "Compare",
            Expr::Call(_) => "Call",
            Expr::Constant(_) => "Constant",
            Expr::Attribute(_) => "Attribute",
            Expr::Subscript(_) => "Subscript",
            Expr::Starred(_) => "Starred",
            Expr::Name(_) => "Name",
            Expr::List(_) => "List",
            Expr::Tuple(_) => "Tuple",
            Expr::Slice(_) => "Slice",
        }
    }

    /// Binding context, for the kinds that have one
    pub fn context(&self) -> Option<ExprContext> {
        match self {
            Expr::Attribute(node) => Some(node.ctx),
            Expr::Subscript(node) => Some(node.ctx),
            Expr::Starred(node) => Some(node.ctx),
            Expr::Name(node) => Some(node.ctx),
            Expr::List(node) => Some(node.ctx),
            Expr::Tuple(node) => Some(node.ctx),
            _ => None,
        }
    }

    /// An attribute or subscript at the end of a primary chain: the shape
    /// accepted as a single annotated or augmented target besides a name
    pub fn is_single_target(&self) -> bool {
        matches!(self, Expr::Attribute(_) | Expr::Subscript(_))
    }

    /// Check that this expression can take `ctx`, without changing anything
    pub fn check_context(&self, ctx: ExprContext) -> Result<(), ContextError> {
        match self {
            Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => Ok(()),
            Expr::Starred(node) => {
                if ctx == ExprContext::Del {
                    return Err(ContextError::NotAssignable {
                        kind: "Starred",
                        ctx,
                    });
                }
                if matches!(*node.value, Expr::Starred(_)) {
                    return Err(ContextError::NestedStarred);
                }
                node.value.check_context(ctx)
            }
            Expr::List(List { elts, .. }) | Expr::Tuple(Tuple { elts, .. }) => {
                elts.iter().try_for_each(|elt| elt.check_context(ctx))
            }
            other => Err(ContextError::NotAssignable {
                kind: other.kind_name(),
                ctx,
            }),
        }
    }

    /// Rewrite the binding context of this expression and, for tuples,
    /// lists and starred nodes, of every nested target. On error the tree
    /// is left untouched.
    pub fn set_context(&mut self, ctx: ExprContext) -> Result<(), ContextError> {
        self.check_context(ctx)?;
        self.apply_context(ctx);
        Ok(())
    }

    fn apply_context(&mut self, ctx: ExprContext) {
        match self {
            Expr::Name(node) => node.ctx = ctx,
            Expr::Attribute(node) => node.ctx = ctx,
            Expr::Subscript(node) => node.ctx = ctx,
            Expr::Starred(node) => {
                node.ctx = ctx;
                node.value.apply_context(ctx);
            }
            Expr::List(List { elts, ctx: own }) | Expr::Tuple(Tuple { elts, ctx: own }) => {
                *own = ctx;
                for elt in elts.iter_mut() {
                    elt.apply_context(ctx);
                }
            }
            _ => {}
        }
    }
}
