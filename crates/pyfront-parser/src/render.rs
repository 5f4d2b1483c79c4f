//! Renderers built on the [`Visitor`] contract.
//!
//! [`Dumper`] prints an indented structural dump in the layout of
//! `astpretty`. [`Unparser`] prints source text back, wrapping every
//! compound sub-expression in parentheses so that parsing the output again
//! yields the same tree.

use crate::ast::*;
use crate::visitor::{VisitResult, Visitor};

const INDENT: &str = "    ";

// ─────────────────────────────────────────────────────────────────────────────
// Dump
// ─────────────────────────────────────────────────────────────────────────────

/// One node of the dump before layout
#[derive(Debug, Clone, PartialEq)]
pub struct DumpNode {
    kind: &'static str,
    fields: Vec<(&'static str, Field)>,
}

#[derive(Debug, Clone, PartialEq)]
enum Field {
    Node(Box<DumpNode>),
    Nodes(Vec<DumpNode>),
    Names(Vec<String>),
    Text(String),
}

impl DumpNode {
    fn new(kind: &'static str) -> Self {
        DumpNode {
            kind,
            fields: Vec::new(),
        }
    }

    fn node(mut self, name: &'static str, node: DumpNode) -> Self {
        self.fields.push((name, Field::Node(Box::new(node))));
        self
    }

    fn nodes(mut self, name: &'static str, nodes: Vec<DumpNode>) -> Self {
        self.fields.push((name, Field::Nodes(nodes)));
        self
    }

    fn names(mut self, name: &'static str, names: &[String]) -> Self {
        self.fields.push((name, Field::Names(names.to_vec())));
        self
    }

    fn text(mut self, name: &'static str, text: impl Into<String>) -> Self {
        self.fields.push((name, Field::Text(text.into())));
        self
    }

    /// A node is printed on one line when nothing below it is a non-empty list
    fn is_leaf(&self) -> bool {
        self.fields.iter().all(|(_, field)| match field {
            Field::Node(node) => node.is_leaf(),
            Field::Nodes(nodes) => nodes.is_empty(),
            Field::Names(names) => names.is_empty(),
            Field::Text(_) => true,
        })
    }

    fn inline(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, field)| {
                let value = match field {
                    Field::Node(node) => node.inline(),
                    Field::Nodes(_) | Field::Names(_) => "[]".to_string(),
                    Field::Text(text) => text.clone(),
                };
                format!("{}={}", name, value)
            })
            .collect();
        format!("{}({})", self.kind, fields.join(", "))
    }

    fn write(&self, out: &mut String, depth: usize) {
        if self.is_leaf() {
            out.push_str(&self.inline());
            return;
        }
        out.push_str(self.kind);
        out.push_str("(\n");
        for (name, field) in &self.fields {
            out.push_str(&INDENT.repeat(depth + 1));
            out.push_str(name);
            out.push('=');
            match field {
                Field::Node(node) => node.write(out, depth + 1),
                Field::Nodes(nodes) => write_list(out, depth + 1, nodes, |node, out, depth| {
                    node.write(out, depth)
                }),
                Field::Names(names) => write_list(out, depth + 1, names, |name, out, _| {
                    out.push_str(&quote(name))
                }),
                Field::Text(text) => out.push_str(text),
            }
            out.push_str(",\n");
        }
        out.push_str(&INDENT.repeat(depth));
        out.push(')');
    }
}

fn write_list<T>(
    out: &mut String,
    depth: usize,
    items: &[T],
    mut write_item: impl FnMut(&T, &mut String, usize),
) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push_str("[\n");
    for item in items {
        out.push_str(&INDENT.repeat(depth + 1));
        write_item(item, out, depth + 1);
        out.push_str(",\n");
    }
    out.push_str(&INDENT.repeat(depth));
    out.push(']');
}

fn quote(text: &str) -> String {
    format!("'{}'", text)
}

fn optional_name(name: &Option<String>) -> String {
    name.as_deref().map_or_else(|| "None".to_string(), quote)
}

fn context_node(ctx: ExprContext) -> DumpNode {
    DumpNode::new(match ctx {
        ExprContext::Load => "Load",
        ExprContext::Store => "Store",
        ExprContext::Del => "Del",
    })
}

fn operator_node(op: Operator) -> DumpNode {
    DumpNode::new(match op {
        Operator::Add => "Add",
        Operator::Sub => "Sub",
        Operator::Mult => "Mult",
        Operator::MatMult => "MatMult",
        Operator::Div => "Div",
        Operator::Mod => "Mod",
        Operator::Pow => "Pow",
        Operator::LShift => "LShift",
        Operator::RShift => "RShift",
        Operator::BitOr => "BitOr",
        Operator::BitXor => "BitXor",
        Operator::BitAnd => "BitAnd",
        Operator::FloorDiv => "FloorDiv",
    })
}

fn cmp_operator_node(op: CmpOperator) -> DumpNode {
    DumpNode::new(match op {
        CmpOperator::Eq => "Eq",
        CmpOperator::NotEq => "NotEq",
        CmpOperator::Lt => "Lt",
        CmpOperator::LtE => "LtE",
        CmpOperator::Gt => "Gt",
        CmpOperator::GtE => "GtE",
        CmpOperator::Is => "Is",
        CmpOperator::IsNot => "IsNot",
        CmpOperator::In => "In",
        CmpOperator::NotIn => "NotIn",
    })
}

fn alias_node(alias: &Alias) -> DumpNode {
    DumpNode::new("alias")
        .text("name", quote(&alias.name))
        .text("asname", optional_name(&alias.asname))
}

/// Builds [`DumpNode`] trees; see [`dump`] for the text form
#[derive(Debug, Default)]
pub struct Dumper;

impl Dumper {
    fn expr(&mut self, expr: &Expr) -> VisitResult<DumpNode> {
        expr.accept(self)
    }

    fn exprs(&mut self, exprs: &[Expr]) -> VisitResult<Vec<DumpNode>> {
        exprs.iter().map(|expr| expr.accept(self)).collect()
    }

    fn optional(&mut self, expr: &Option<Box<Expr>>) -> VisitResult<Option<DumpNode>> {
        expr.as_deref().map(|expr| expr.accept(self)).transpose()
    }

    fn body(&mut self, body: &[Stmt]) -> VisitResult<Vec<DumpNode>> {
        body.iter().map(|stmt| stmt.accept(self)).collect()
    }
}

/// Attach an optional child, printing `None` when absent
fn with_optional(node: DumpNode, name: &'static str, child: Option<DumpNode>) -> DumpNode {
    match child {
        Some(child) => node.node(name, child),
        None => node.text(name, "None"),
    }
}

impl Visitor for Dumper {
    type Output = DumpNode;

    fn visit_module(&mut self, node: &Module) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Module")
            .nodes("body", self.body(&node.body)?)
            .nodes("type_ignores", Vec::new()))
    }

    fn visit_pass(&mut self) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Pass"))
    }

    fn visit_break(&mut self) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Break"))
    }

    fn visit_continue(&mut self) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Continue"))
    }

    fn visit_expr_stmt(&mut self, node: &ExprStmt) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Expr").node("value", self.expr(&node.value)?))
    }

    fn visit_assign(&mut self, node: &Assign) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Assign")
            .nodes("targets", self.exprs(&node.targets)?)
            .node("value", self.expr(&node.value)?)
            .text("type_comment", "None"))
    }

    fn visit_aug_assign(&mut self, node: &AugAssign) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("AugAssign")
            .node("target", self.expr(&node.target)?)
            .node("op", operator_node(node.op))
            .node("value", self.expr(&node.value)?))
    }

    fn visit_ann_assign(&mut self, node: &AnnAssign) -> VisitResult<DumpNode> {
        let dumped = DumpNode::new("AnnAssign")
            .node("target", self.expr(&node.target)?)
            .node("annotation", self.expr(&node.annotation)?);
        let value = self.optional(&node.value)?;
        Ok(with_optional(dumped, "value", value).text("simple", if node.simple { "1" } else { "0" }))
    }

    fn visit_if(&mut self, node: &IfStmt) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("If")
            .node("test", self.expr(&node.test)?)
            .nodes("body", self.body(&node.body)?)
            .nodes("orelse", self.body(&node.orelse)?))
    }

    fn visit_while(&mut self, node: &WhileStmt) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("While")
            .node("test", self.expr(&node.test)?)
            .nodes("body", self.body(&node.body)?)
            .nodes("orelse", self.body(&node.orelse)?))
    }

    fn visit_for(&mut self, node: &ForStmt) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("For")
            .node("target", self.expr(&node.target)?)
            .node("iter", self.expr(&node.iter)?)
            .nodes("body", self.body(&node.body)?)
            .nodes("orelse", self.body(&node.orelse)?)
            .text("type_comment", "None"))
    }

    fn visit_import(&mut self, node: &Import) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Import").nodes("names", node.names.iter().map(alias_node).collect()))
    }

    fn visit_import_from(&mut self, node: &ImportFrom) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("ImportFrom")
            .text("module", optional_name(&node.module))
            .nodes("names", node.names.iter().map(alias_node).collect())
            .text("level", node.level.to_string()))
    }

    fn visit_assert(&mut self, node: &AssertStmt) -> VisitResult<DumpNode> {
        let dumped = DumpNode::new("Assert").node("test", self.expr(&node.test)?);
        let msg = self.optional(&node.msg)?;
        Ok(with_optional(dumped, "msg", msg))
    }

    fn visit_return(&mut self, node: &ReturnStmt) -> VisitResult<DumpNode> {
        let value = self.optional(&node.value)?;
        Ok(with_optional(DumpNode::new("Return"), "value", value))
    }

    fn visit_raise(&mut self, node: &RaiseStmt) -> VisitResult<DumpNode> {
        let exc = self.optional(&node.exc)?;
        let cause = self.optional(&node.cause)?;
        Ok(with_optional(
            with_optional(DumpNode::new("Raise"), "exc", exc),
            "cause",
            cause,
        ))
    }

    fn visit_delete(&mut self, node: &DeleteStmt) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Delete").nodes("targets", self.exprs(&node.targets)?))
    }

    fn visit_global(&mut self, node: &GlobalStmt) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Global").names("names", &node.names))
    }

    fn visit_nonlocal(&mut self, node: &NonlocalStmt) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Nonlocal").names("names", &node.names))
    }

    fn visit_bool_op(&mut self, node: &BoolOp) -> VisitResult<DumpNode> {
        let op = match node.op {
            BoolOperator::And => "And",
            BoolOperator::Or => "Or",
        };
        Ok(DumpNode::new("BoolOp")
            .node("op", DumpNode::new(op))
            .nodes("values", self.exprs(&node.values)?))
    }

    fn visit_named_expr(&mut self, node: &NamedExpr) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("NamedExpr")
            .node("target", self.expr(&node.target)?)
            .node("value", self.expr(&node.value)?))
    }

    fn visit_bin_op(&mut self, node: &BinOp) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("BinOp")
            .node("left", self.expr(&node.left)?)
            .node("op", operator_node(node.op))
            .node("right", self.expr(&node.right)?))
    }

    fn visit_unary_op(&mut self, node: &UnaryOp) -> VisitResult<DumpNode> {
        let op = match node.op {
            UnaryOperator::Invert => "Invert",
            UnaryOperator::Not => "Not",
            UnaryOperator::UAdd => "UAdd",
            UnaryOperator::USub => "USub",
        };
        Ok(DumpNode::new("UnaryOp")
            .node("op", DumpNode::new(op))
            .node("operand", self.expr(&node.operand)?))
    }

    fn visit_if_exp(&mut self, node: &IfExp) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("IfExp")
            .node("test", self.expr(&node.test)?)
            .node("body", self.expr(&node.body)?)
            .node("orelse", self.expr(&node.orelse)?))
    }

    fn visit_await(&mut self, node: &Await) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Await").node("value", self.expr(&node.value)?))
    }

    fn visit_yield(&mut self, node: &Yield) -> VisitResult<DumpNode> {
        let value = self.optional(&node.value)?;
        Ok(with_optional(DumpNode::new("Yield"), "value", value))
    }

    fn visit_yield_from(&mut self, node: &YieldFrom) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("YieldFrom").node("value", self.expr(&node.value)?))
    }

    fn visit_compare(&mut self, node: &Compare) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Compare")
            .node("left", self.expr(&node.left)?)
            .nodes("ops", node.ops.iter().copied().map(cmp_operator_node).collect())
            .nodes("comparators", self.exprs(&node.comparators)?))
    }

    fn visit_call(&mut self, node: &Call) -> VisitResult<DumpNode> {
        let keywords = node
            .keywords
            .iter()
            .map(|keyword| {
                Ok(DumpNode::new("keyword")
                    .text("arg", optional_name(&keyword.arg))
                    .node("value", self.expr(&keyword.value)?))
            })
            .collect::<VisitResult<Vec<_>>>()?;
        Ok(DumpNode::new("Call")
            .node("func", self.expr(&node.func)?)
            .nodes("args", self.exprs(&node.args)?)
            .nodes("keywords", keywords))
    }

    fn visit_constant(&mut self, node: &Constant) -> VisitResult<DumpNode> {
        let value = match &node.value {
            ConstantValue::None => "None".to_string(),
            ConstantValue::Bool(true) => "True".to_string(),
            ConstantValue::Bool(false) => "False".to_string(),
            ConstantValue::Ellipsis => "Ellipsis".to_string(),
            ConstantValue::Num(raw) | ConstantValue::Str(raw) => raw.clone(),
        };
        Ok(DumpNode::new("Constant")
            .text("value", value)
            .text("kind", optional_name(&node.kind)))
    }

    fn visit_attribute(&mut self, node: &Attribute) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Attribute")
            .node("value", self.expr(&node.value)?)
            .text("attr", quote(&node.attr))
            .node("ctx", context_node(node.ctx)))
    }

    fn visit_subscript(&mut self, node: &Subscript) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Subscript")
            .node("value", self.expr(&node.value)?)
            .node("slice", self.expr(&node.slice)?)
            .node("ctx", context_node(node.ctx)))
    }

    fn visit_starred(&mut self, node: &Starred) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Starred")
            .node("value", self.expr(&node.value)?)
            .node("ctx", context_node(node.ctx)))
    }

    fn visit_name(&mut self, node: &Name) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Name")
            .text("id", quote(&node.id))
            .node("ctx", context_node(node.ctx)))
    }

    fn visit_list(&mut self, node: &List) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("List")
            .nodes("elts", self.exprs(&node.elts)?)
            .node("ctx", context_node(node.ctx)))
    }

    fn visit_tuple(&mut self, node: &Tuple) -> VisitResult<DumpNode> {
        Ok(DumpNode::new("Tuple")
            .nodes("elts", self.exprs(&node.elts)?)
            .node("ctx", context_node(node.ctx)))
    }

    fn visit_slice(&mut self, node: &Slice) -> VisitResult<DumpNode> {
        let lower = self.optional(&node.lower)?;
        let upper = self.optional(&node.upper)?;
        let step = self.optional(&node.step)?;
        let dumped = with_optional(DumpNode::new("Slice"), "lower", lower);
        Ok(with_optional(with_optional(dumped, "upper", upper), "step", step))
    }
}

fn layout(tree: DumpNode) -> String {
    let mut out = String::new();
    tree.write(&mut out, 0);
    out
}

/// Indented structural dump of a module
pub fn dump(module: &Module) -> VisitResult<String> {
    Ok(layout(module.accept(&mut Dumper)?))
}

/// Structural dump of a single statement
pub fn dump_stmt(stmt: &Stmt) -> VisitResult<String> {
    Ok(layout(stmt.accept(&mut Dumper)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Unparse
// ─────────────────────────────────────────────────────────────────────────────

/// Renders statements back to source, one per line
#[derive(Debug, Default)]
pub struct Unparser {
    depth: usize,
}

/// Kinds that need parentheses when they appear inside another expression
fn is_compound(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::BoolOp(_)
            | Expr::BinOp(_)
            | Expr::UnaryOp(_)
            | Expr::IfExp(_)
            | Expr::Await(_)
            | Expr::Compare(_)
    )
}

impl Unparser {
    fn line(&self, text: impl AsRef<str>) -> String {
        format!("{}{}\n", INDENT.repeat(self.depth), text.as_ref())
    }

    /// An operand of a larger expression
    fn operand(&mut self, expr: &Expr) -> VisitResult<String> {
        let text = expr.accept(self)?;
        Ok(if is_compound(expr) {
            format!("({})", text)
        } else {
            text
        })
    }

    fn join(&mut self, exprs: &[Expr]) -> VisitResult<String> {
        let parts = exprs
            .iter()
            .map(|expr| expr.accept(self))
            .collect::<VisitResult<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn block(&mut self, header: String, body: &[Stmt]) -> VisitResult<String> {
        let mut out = self.line(header);
        self.depth += 1;
        for stmt in body {
            out.push_str(&stmt.accept(self)?);
        }
        self.depth -= 1;
        Ok(out)
    }

    fn else_block(&mut self, orelse: &[Stmt]) -> VisitResult<String> {
        if orelse.is_empty() {
            Ok(String::new())
        } else {
            self.block("else:".to_string(), orelse)
        }
    }
}

fn aliases(names: &[Alias]) -> String {
    names
        .iter()
        .map(|alias| match &alias.asname {
            Some(asname) => format!("{} as {}", alias.name, asname),
            None => alias.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Visitor for Unparser {
    type Output = String;

    fn visit_module(&mut self, node: &Module) -> VisitResult<String> {
        node.body.iter().map(|stmt| stmt.accept(self)).collect()
    }

    fn visit_pass(&mut self) -> VisitResult<String> {
        Ok(self.line("pass"))
    }

    fn visit_break(&mut self) -> VisitResult<String> {
        Ok(self.line("break"))
    }

    fn visit_continue(&mut self) -> VisitResult<String> {
        Ok(self.line("continue"))
    }

    fn visit_expr_stmt(&mut self, node: &ExprStmt) -> VisitResult<String> {
        let value = node.value.accept(self)?;
        Ok(self.line(value))
    }

    fn visit_assign(&mut self, node: &Assign) -> VisitResult<String> {
        let mut parts = node
            .targets
            .iter()
            .map(|target| target.accept(self))
            .collect::<VisitResult<Vec<_>>>()?;
        parts.push(node.value.accept(self)?);
        Ok(self.line(parts.join(" = ")))
    }

    fn visit_aug_assign(&mut self, node: &AugAssign) -> VisitResult<String> {
        let target = node.target.accept(self)?;
        let value = node.value.accept(self)?;
        Ok(self.line(format!("{} {}= {}", target, node.op.symbol(), value)))
    }

    fn visit_ann_assign(&mut self, node: &AnnAssign) -> VisitResult<String> {
        let mut target = node.target.accept(self)?;
        if !node.simple && matches!(*node.target, Expr::Name(_)) {
            target = format!("({})", target);
        }
        let mut text = format!("{}: {}", target, node.annotation.accept(self)?);
        if let Some(value) = &node.value {
            text.push_str(" = ");
            text.push_str(&value.accept(self)?);
        }
        Ok(self.line(text))
    }

    fn visit_if(&mut self, node: &IfStmt) -> VisitResult<String> {
        let header = format!("if {}:", node.test.accept(self)?);
        let mut out = self.block(header, &node.body)?;
        out.push_str(&self.else_block(&node.orelse)?);
        Ok(out)
    }

    fn visit_while(&mut self, node: &WhileStmt) -> VisitResult<String> {
        let header = format!("while {}:", node.test.accept(self)?);
        let mut out = self.block(header, &node.body)?;
        out.push_str(&self.else_block(&node.orelse)?);
        Ok(out)
    }

    fn visit_for(&mut self, node: &ForStmt) -> VisitResult<String> {
        let header = format!(
            "for {} in {}:",
            node.target.accept(self)?,
            node.iter.accept(self)?
        );
        let mut out = self.block(header, &node.body)?;
        out.push_str(&self.else_block(&node.orelse)?);
        Ok(out)
    }

    fn visit_import(&mut self, node: &Import) -> VisitResult<String> {
        Ok(self.line(format!("import {}", aliases(&node.names))))
    }

    fn visit_import_from(&mut self, node: &ImportFrom) -> VisitResult<String> {
        Ok(self.line(format!(
            "from {}{} import {}",
            ".".repeat(node.level as usize),
            node.module.as_deref().unwrap_or(""),
            aliases(&node.names)
        )))
    }

    fn visit_assert(&mut self, node: &AssertStmt) -> VisitResult<String> {
        let mut text = format!("assert {}", node.test.accept(self)?);
        if let Some(msg) = &node.msg {
            text.push_str(", ");
            text.push_str(&msg.accept(self)?);
        }
        Ok(self.line(text))
    }

    fn visit_return(&mut self, node: &ReturnStmt) -> VisitResult<String> {
        let text = match &node.value {
            Some(value) => format!("return {}", value.accept(self)?),
            None => "return".to_string(),
        };
        Ok(self.line(text))
    }

    fn visit_raise(&mut self, node: &RaiseStmt) -> VisitResult<String> {
        let mut text = "raise".to_string();
        if let Some(exc) = &node.exc {
            text.push(' ');
            text.push_str(&exc.accept(self)?);
        }
        if let Some(cause) = &node.cause {
            text.push_str(" from ");
            text.push_str(&cause.accept(self)?);
        }
        Ok(self.line(text))
    }

    fn visit_delete(&mut self, node: &DeleteStmt) -> VisitResult<String> {
        let targets = self.join(&node.targets)?;
        Ok(self.line(format!("del {}", targets)))
    }

    fn visit_global(&mut self, node: &GlobalStmt) -> VisitResult<String> {
        Ok(self.line(format!("global {}", node.names.join(", "))))
    }

    fn visit_nonlocal(&mut self, node: &NonlocalStmt) -> VisitResult<String> {
        Ok(self.line(format!("nonlocal {}", node.names.join(", "))))
    }

    fn visit_bool_op(&mut self, node: &BoolOp) -> VisitResult<String> {
        let values = node
            .values
            .iter()
            .map(|value| self.operand(value))
            .collect::<VisitResult<Vec<_>>>()?;
        Ok(values.join(&format!(" {} ", node.op.keyword())))
    }

    fn visit_named_expr(&mut self, node: &NamedExpr) -> VisitResult<String> {
        Ok(format!(
            "({} := {})",
            node.target.accept(self)?,
            node.value.accept(self)?
        ))
    }

    fn visit_bin_op(&mut self, node: &BinOp) -> VisitResult<String> {
        Ok(format!(
            "{} {} {}",
            self.operand(&node.left)?,
            node.op.symbol(),
            self.operand(&node.right)?
        ))
    }

    fn visit_unary_op(&mut self, node: &UnaryOp) -> VisitResult<String> {
        Ok(format!("{}{}", node.op.symbol(), self.operand(&node.operand)?))
    }

    fn visit_if_exp(&mut self, node: &IfExp) -> VisitResult<String> {
        Ok(format!(
            "{} if {} else {}",
            self.operand(&node.body)?,
            self.operand(&node.test)?,
            self.operand(&node.orelse)?
        ))
    }

    fn visit_await(&mut self, node: &Await) -> VisitResult<String> {
        Ok(format!("await {}", self.operand(&node.value)?))
    }

    fn visit_yield(&mut self, node: &Yield) -> VisitResult<String> {
        Ok(match &node.value {
            Some(value) => format!("(yield {})", value.accept(self)?),
            None => "(yield)".to_string(),
        })
    }

    fn visit_yield_from(&mut self, node: &YieldFrom) -> VisitResult<String> {
        Ok(format!("(yield from {})", node.value.accept(self)?))
    }

    fn visit_compare(&mut self, node: &Compare) -> VisitResult<String> {
        let mut text = self.operand(&node.left)?;
        for (op, comparator) in node.ops.iter().zip(&node.comparators) {
            text.push(' ');
            text.push_str(op.symbol());
            text.push(' ');
            text.push_str(&self.operand(comparator)?);
        }
        Ok(text)
    }

    fn visit_call(&mut self, node: &Call) -> VisitResult<String> {
        let mut args = node
            .args
            .iter()
            .map(|arg| arg.accept(self))
            .collect::<VisitResult<Vec<_>>>()?;
        for keyword in &node.keywords {
            let value = keyword.value.accept(self)?;
            args.push(match &keyword.arg {
                Some(arg) => format!("{}={}", arg, value),
                None => format!("**{}", value),
            });
        }
        Ok(format!("{}({})", self.operand(&node.func)?, args.join(", ")))
    }

    fn visit_constant(&mut self, node: &Constant) -> VisitResult<String> {
        Ok(match &node.value {
            ConstantValue::None => "None".to_string(),
            ConstantValue::Bool(true) => "True".to_string(),
            ConstantValue::Bool(false) => "False".to_string(),
            ConstantValue::Ellipsis => "...".to_string(),
            ConstantValue::Num(raw) | ConstantValue::Str(raw) => raw.clone(),
        })
    }

    fn visit_attribute(&mut self, node: &Attribute) -> VisitResult<String> {
        let value = self.operand(&node.value)?;
        // `1.real` would lex as a float followed by a name
        let value = match &*node.value {
            Expr::Constant(Constant {
                value: ConstantValue::Num(_),
                ..
            }) => format!("({})", value),
            _ => value,
        };
        Ok(format!("{}.{}", value, node.attr))
    }

    fn visit_subscript(&mut self, node: &Subscript) -> VisitResult<String> {
        let slice = match &*node.slice {
            Expr::Tuple(Tuple { elts, .. }) if elts.len() == 1 => {
                format!("{},", elts[0].accept(self)?)
            }
            Expr::Tuple(Tuple { elts, .. }) if !elts.is_empty() => self.join(elts)?,
            other => other.accept(self)?,
        };
        Ok(format!("{}[{}]", self.operand(&node.value)?, slice))
    }

    fn visit_starred(&mut self, node: &Starred) -> VisitResult<String> {
        Ok(format!("*{}", self.operand(&node.value)?))
    }

    fn visit_name(&mut self, node: &Name) -> VisitResult<String> {
        Ok(node.id.clone())
    }

    fn visit_list(&mut self, node: &List) -> VisitResult<String> {
        Ok(format!("[{}]", self.join(&node.elts)?))
    }

    fn visit_tuple(&mut self, node: &Tuple) -> VisitResult<String> {
        Ok(match node.elts.as_slice() {
            [single] => format!("({},)", single.accept(self)?),
            elts => format!("({})", self.join(elts)?),
        })
    }

    fn visit_slice(&mut self, node: &Slice) -> VisitResult<String> {
        let mut text = String::new();
        if let Some(lower) = &node.lower {
            text.push_str(&lower.accept(self)?);
        }
        text.push(':');
        if let Some(upper) = &node.upper {
            text.push_str(&upper.accept(self)?);
        }
        if let Some(step) = &node.step {
            text.push(':');
            text.push_str(&step.accept(self)?);
        }
        Ok(text)
    }
}

/// Source text for a module
pub fn unparse(module: &Module) -> VisitResult<String> {
    module.accept(&mut Unparser::default())
}
