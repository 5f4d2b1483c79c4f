//! Double-dispatch visitor over the AST.
//!
//! Every concrete node kind has its own `visit_*` method. The defaults
//! report [`RenderError::Unsupported`] so a renderer that only covers part
//! of the tree fails loudly on the rest instead of printing something wrong.

use crate::ast::*;
use crate::error::RenderError;

pub type VisitResult<T> = Result<T, RenderError>;

macro_rules! unsupported_by_default {
    ($($method:ident($node:ty) => $kind:literal;)*) => {
        $(
            fn $method(&mut self, node: &$node) -> VisitResult<Self::Output> {
                let _ = node;
                Err(RenderError::Unsupported($kind))
            }
        )*
    };
}

pub trait Visitor {
    type Output;

    fn visit_module(&mut self, node: &Module) -> VisitResult<Self::Output> {
        let _ = node;
        Err(RenderError::Unsupported("Module"))
    }

    fn visit_pass(&mut self) -> VisitResult<Self::Output> {
        Err(RenderError::Unsupported("Pass"))
    }

    fn visit_break(&mut self) -> VisitResult<Self::Output> {
        Err(RenderError::Unsupported("Break"))
    }

    fn visit_continue(&mut self) -> VisitResult<Self::Output> {
        Err(RenderError::Unsupported("Continue"))
    }

    unsupported_by_default! {
        visit_expr_stmt(ExprStmt) => "Expr";
        visit_assign(Assign) => "Assign";
        visit_aug_assign(AugAssign) => "AugAssign";
        visit_ann_assign(AnnAssign) => "AnnAssign";
        visit_if(IfStmt) => "If";
        visit_while(WhileStmt) => "While";
        visit_for(ForStmt) => "For";
        visit_import(Import) => "Import";
        visit_import_from(ImportFrom) => "ImportFrom";
        visit_assert(AssertStmt) => "Assert";
        visit_return(ReturnStmt) => "Return";
        visit_raise(RaiseStmt) => "Raise";
        visit_delete(DeleteStmt) => "Delete";
        visit_global(GlobalStmt) => "Global";
        visit_nonlocal(NonlocalStmt) => "Nonlocal";

        visit_bool_op(BoolOp) => "BoolOp";
        visit_named_expr(NamedExpr) => "NamedExpr";
        visit_bin_op(BinOp) => "BinOp";
        visit_unary_op(UnaryOp) => "UnaryOp";
        visit_if_exp(IfExp) => "IfExp";
        visit_await(Await) => "Await";
        visit_yield(Yield) => "Yield";
        visit_yield_from(YieldFrom) => "YieldFrom";
        visit_compare(Compare) => "Compare";
        visit_call(Call) => "Call";
        visit_constant(Constant) => "Constant";
        visit_attribute(Attribute) => "Attribute";
        visit_subscript(Subscript) => "Subscript";
        visit_starred(Starred) => "Starred";
        visit_name(Name) => "Name";
        visit_list(List) => "List";
        visit_tuple(Tuple) => "Tuple";
        visit_slice(Slice) => "Slice";
    }
}

impl Module {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> VisitResult<V::Output> {
        visitor.visit_module(self)
    }
}

impl Stmt {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> VisitResult<V::Output> {
        match self {
            Stmt::Expr(node) => visitor.visit_expr_stmt(node),
            Stmt::Assign(node) => visitor.visit_assign(node),
            Stmt::AugAssign(node) => visitor.visit_aug_assign(node),
            Stmt::AnnAssign(node) => visitor.visit_ann_assign(node),
            Stmt::If(node) => visitor.visit_if(node),
            Stmt::While(node) => visitor.visit_while(node),
            Stmt::For(node) => visitor.visit_for(node),
            Stmt::Import(node) => visitor.visit_import(node),
            Stmt::ImportFrom(node) => visitor.visit_import_from(node),
            Stmt::Assert(node) => visitor.visit_assert(node),
            Stmt::Return(node) => visitor.visit_return(node),
            Stmt::Raise(node) => visitor.visit_raise(node),
            Stmt::Delete(node) => visitor.visit_delete(node),
            Stmt::Global(node) => visitor.visit_global(node),
            Stmt::Nonlocal(node) => visitor.visit_nonlocal(node),
            Stmt::Pass => visitor.visit_pass(),
            Stmt::Break => visitor.visit_break(),
            Stmt::Continue => visitor.visit_continue(),
        }
    }
}

impl Expr {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> VisitResult<V::Output> {
        match self {
            Expr::BoolOp(node) => visitor.visit_bool_op(node),
            Expr::NamedExpr(node) => visitor.visit_named_expr(node),
            Expr::BinOp(node) => visitor.visit_bin_op(node),
            Expr::UnaryOp(node) => visitor.visit_unary_op(node),
            Expr::IfExp(node) => visitor.visit_if_exp(node),
            Expr::Await(node) => visitor.visit_await(node),
            Expr::Yield(node) => visitor.visit_yield(node),
            Expr::YieldFrom(node) => visitor.visit_yield_from(node),
            Expr::Compare(node) => visitor.visit_compare(node),
            Expr::Call(node) => visitor.visit_call(node),
            Expr::Constant(node) => visitor.visit_constant(node),
            Expr::Attribute(node) => visitor.visit_attribute(node),
            Expr::Subscript(node) => visitor.visit_subscript(node),
            Expr::Starred(node) => visitor.visit_starred(node),
            Expr::Name(node) => visitor.visit_name(node),
            Expr::List(node) => visitor.visit_list(node),
            Expr::Tuple(node) => visitor.visit_tuple(node),
            Expr::Slice(node) => visitor.visit_slice(node),
        }
    }
}
