//! Generic tree walk and the debug `print` operation (§4.2).
//!
//! `walk` is a pre-order traversal callback used by tooling (the CLI's `--cleanup`
//! diagnostic dump, tests asserting a shape appears somewhere in the tree) that has no
//! business knowing every `NodeKind` variant. `destroy` has no counterpart here: Rust's
//! `Drop` already walks and frees the owned tree when a `Node` goes out of scope, so the
//! teacher's explicit destroy-visitor (which a GC'd-by-hand C tree needs) collapses to
//! nothing worth writing.

use super::{Node, NodeKind};

impl Node {
    /// Visits `self` and every descendant, pre-order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        match &self.kind {
            NodeKind::Array(items) => items.iter().for_each(|n| n.walk(visit)),
            NodeKind::Map(entries) => entries.iter().for_each(|e| e.value.walk(visit)),
            NodeKind::Unary { operand, .. } => operand.walk(visit),
            NodeKind::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            NodeKind::Cast { expr, .. } => expr.walk(visit),
            NodeKind::Ternary { cond, if_true, if_false } => {
                cond.walk(visit);
                if_true.walk(visit);
                if_false.walk(visit);
            }
            NodeKind::Index { receiver, index } => {
                receiver.walk(visit);
                index.walk(visit);
            }
            NodeKind::Period { receiver, .. } => receiver.walk(visit),
            NodeKind::Slice { receiver, start, end, skip } => {
                receiver.walk(visit);
                for n in [start, end, skip].into_iter().flatten() {
                    n.walk(visit);
                }
            }
            NodeKind::FunctionCall { callee, args } => {
                callee.walk(visit);
                args.iter().for_each(|a| a.walk(visit));
            }
            NodeKind::Assign { target, value } => {
                target.walk(visit);
                value.walk(visit);
            }
            NodeKind::Global { initializer, .. } => {
                if let Some(n) = initializer {
                    n.walk(visit);
                }
            }
            NodeKind::IfElse { cond, if_block, else_block } => {
                cond.walk(visit);
                if_block.walk(visit);
                if let Some(e) = else_block {
                    e.walk(visit);
                }
            }
            NodeKind::While { cond, body } | NodeKind::DoWhile { cond, body } => {
                cond.walk(visit);
                body.walk(visit);
            }
            NodeKind::For { init, cond, step, body } => {
                for n in [init, cond, step].into_iter().flatten() {
                    n.walk(visit);
                }
                body.walk(visit);
            }
            NodeKind::RangedFor { iterable, body, .. } => {
                iterable.walk(visit);
                body.walk(visit);
            }
            NodeKind::Return(expr) | NodeKind::Print(expr) => {
                if let Some(e) = expr.as_deref() {
                    e.walk(visit);
                }
            }
            NodeKind::Block(stmts) => stmts.iter().for_each(|s| s.walk(visit)),
            NodeKind::Function { body, .. } => body.iter().for_each(|s| s.walk(visit)),
            NodeKind::Null
            | NodeKind::Integer(_)
            | NodeKind::Float(_)
            | NodeKind::Boolean(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::Identifier(_)
            | NodeKind::Library { .. }
            | NodeKind::Use { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::ParseError(_) => {}
        }
    }

    /// An indented, single-line-per-node textual dump used by the CLI's `--cleanup`
    /// diagnostic mode and by tests asserting the overall tree shape.
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        self.print_into(&mut out, 0);
        out
    }

    fn print_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.label());
        out.push('\n');
        self.walk_children(&mut |child| child.print_into(out, depth + 1));
    }

    fn walk_children<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        match &self.kind {
            NodeKind::Array(items) => items.iter().for_each(|n| visit(n)),
            NodeKind::Map(entries) => entries.iter().for_each(|e| visit(&e.value)),
            NodeKind::Unary { operand, .. } => visit(operand),
            NodeKind::Binary { lhs, rhs, .. } => {
                visit(lhs);
                visit(rhs);
            }
            NodeKind::Cast { expr, .. } => visit(expr),
            NodeKind::Ternary { cond, if_true, if_false } => {
                visit(cond);
                visit(if_true);
                visit(if_false);
            }
            NodeKind::Index { receiver, index } => {
                visit(receiver);
                visit(index);
            }
            NodeKind::Period { receiver, .. } => visit(receiver),
            NodeKind::Slice { receiver, start, end, skip } => {
                visit(receiver);
                for n in [start, end, skip].into_iter().flatten() {
                    visit(n);
                }
            }
            NodeKind::FunctionCall { callee, args } => {
                visit(callee);
                args.iter().for_each(|a| visit(a));
            }
            NodeKind::Assign { target, value } => {
                visit(target);
                visit(value);
            }
            NodeKind::Global { initializer, .. } => {
                if let Some(n) = initializer {
                    visit(n);
                }
            }
            NodeKind::IfElse { cond, if_block, else_block } => {
                visit(cond);
                visit(if_block);
                if let Some(e) = else_block {
                    visit(e);
                }
            }
            NodeKind::While { cond, body } | NodeKind::DoWhile { cond, body } => {
                visit(cond);
                visit(body);
            }
            NodeKind::For { init, cond, step, body } => {
                for n in [init, cond, step].into_iter().flatten() {
                    visit(n);
                }
                visit(body);
            }
            NodeKind::RangedFor { iterable, body, .. } => {
                visit(iterable);
                visit(body);
            }
            NodeKind::Return(expr) | NodeKind::Print(expr) => {
                if let Some(e) = expr.as_deref() {
                    visit(e);
                }
            }
            NodeKind::Block(stmts) => stmts.iter().for_each(|s| visit(s)),
            NodeKind::Function { body, .. } => body.iter().for_each(|s| visit(s)),
            _ => {}
        }
    }

    fn label(&self) -> String {
        match &self.kind {
            NodeKind::Null => "Null".to_string(),
            NodeKind::Integer(i) => format!("Integer({i})"),
            NodeKind::Float(f) => format!("Float({f})"),
            NodeKind::Boolean(b) => format!("Boolean({b})"),
            NodeKind::StringLiteral(s) => format!("String({:?})", s.as_str()),
            NodeKind::Identifier(info) => format!("Identifier({})", info.name),
            NodeKind::Library { name, .. } => format!("Library({name})"),
            NodeKind::Array(_) => "Array".to_string(),
            NodeKind::Map(_) => "Map".to_string(),
            NodeKind::Unary { op, .. } => format!("Unary({op:?})"),
            NodeKind::Binary { op, .. } => format!("Binary({op:?})"),
            NodeKind::Cast { target, .. } => format!("Cast({target:?})"),
            NodeKind::Ternary { .. } => "Ternary".to_string(),
            NodeKind::Index { .. } => "Index".to_string(),
            NodeKind::Period { name, .. } => format!("Period(.{name})"),
            NodeKind::Slice { .. } => "Slice".to_string(),
            NodeKind::FunctionCall { .. } => "FunctionCall".to_string(),
            NodeKind::Assign { .. } => "Assign".to_string(),
            NodeKind::Global { name, .. } => format!("Global({name})"),
            NodeKind::Use { identifier, library_name } => format!("Use({identifier} = {library_name})"),
            NodeKind::IfElse { .. } => "IfElse".to_string(),
            NodeKind::While { .. } => "While".to_string(),
            NodeKind::DoWhile { .. } => "DoWhile".to_string(),
            NodeKind::For { .. } => "For".to_string(),
            NodeKind::RangedFor { var_name, .. } => format!("RangedFor({var_name})"),
            NodeKind::Break => "Break".to_string(),
            NodeKind::Continue => "Continue".to_string(),
            NodeKind::Return(_) => "Return".to_string(),
            NodeKind::Print(_) => "Print".to_string(),
            NodeKind::Block(_) => "Block".to_string(),
            NodeKind::Function { name, .. } => format!("Function({name})"),
            NodeKind::ParseError(e) => format!("ParseError({e})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinOp;

    #[test]
    fn walk_visits_every_node_once() {
        let tree = Node::new(NodeKind::Binary {
            op: BinOp::Add,
            lhs: Box::new(Node::new(NodeKind::Integer(1))),
            rhs: Box::new(Node::new(NodeKind::Integer(2))),
        });
        let mut count = 0;
        tree.walk(&mut |_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn print_tree_is_indented() {
        let tree = Node::new(NodeKind::Block(vec![Node::new(NodeKind::Integer(7))]));
        let printed = tree.print_tree();
        assert!(printed.contains("Block"));
        assert!(printed.contains("  Integer(7)"));
    }
}
