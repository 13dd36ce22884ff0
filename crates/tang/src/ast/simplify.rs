//! Constant folding (§4.2 "Simplify").
//!
//! Runs before `analyze`. Folds literal arithmetic/comparison/cast/unary nodes into a
//! single literal node, and tracks a scope-local map of identifiers that are bound to a
//! literal and never reassigned, substituting the literal at each use site — mirroring
//! the teacher's own constant-propagation pass style
//! (`examples/scostello-monty/crates/monty/src/bytecode/compiler.rs`'s peephole folding)
//! generalized to Tang's node set.

use ahash::AHashMap;

use super::{BinOp, CastType, MapEntry, Node, NodeKind, UnaryOp};

/// Tracks identifiers known to be bound to an unreassigned literal within the current
/// `simplify` pass, keyed by name. Reassignment (an `Assign` targeting the name, or a
/// second `global`/local declaration) evicts the entry.
#[derive(Debug, Default)]
pub struct VariableMap {
    literals: AHashMap<String, NodeKind>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, name: &str, kind: &NodeKind) {
        if matches!(kind, NodeKind::Null | NodeKind::Integer(_) | NodeKind::Float(_) | NodeKind::Boolean(_) | NodeKind::StringLiteral(_)) {
            self.literals.insert(name.to_string(), kind.clone());
        } else {
            self.literals.remove(name);
        }
    }

    fn evict(&mut self, name: &str) {
        self.literals.remove(name);
    }

    fn lookup(&self, name: &str) -> Option<&NodeKind> {
        self.literals.get(name)
    }
}

impl Node {
    /// Folds constant subexpressions in place. `vars` accumulates literal bindings
    /// seen so far in the enclosing block so later identifier references can be
    /// substituted; a fresh `VariableMap` should be passed per function body since
    /// Tang has no closures (§3.4).
    pub fn simplify(&mut self, vars: &mut VariableMap) {
        match &mut self.kind {
            NodeKind::Null | NodeKind::Integer(_) | NodeKind::Float(_) | NodeKind::Boolean(_) | NodeKind::StringLiteral(_) => {}

            NodeKind::Identifier(info) => {
                if let Some(literal) = vars.lookup(&info.name) {
                    self.kind = literal.clone();
                }
            }

            NodeKind::Unary { op, operand } => {
                operand.simplify(vars);
                if let Some(folded) = fold_unary(*op, operand) {
                    self.kind = folded;
                }
            }

            NodeKind::Binary { op, lhs, rhs } => {
                lhs.simplify(vars);
                rhs.simplify(vars);
                if let Some(folded) = fold_binary(*op, lhs, rhs) {
                    self.kind = folded;
                }
            }

            NodeKind::Cast { expr, target } => {
                expr.simplify(vars);
                if let Some(folded) = fold_cast(*target, expr) {
                    self.kind = folded;
                }
            }

            NodeKind::Ternary { cond, if_true, if_false } => {
                cond.simplify(vars);
                if_true.simplify(vars);
                if_false.simplify(vars);
                if let NodeKind::Boolean(b) = &cond.kind {
                    self.kind = if *b { if_true.kind.clone() } else { if_false.kind.clone() };
                }
            }

            NodeKind::Array(items) => {
                for item in items.iter_mut() {
                    item.simplify(vars);
                }
            }

            NodeKind::Map(entries) => {
                for entry in entries.iter_mut() {
                    entry.value.simplify(vars);
                }
            }

            NodeKind::Index { receiver, index } => {
                receiver.simplify(vars);
                index.simplify(vars);
            }

            NodeKind::Period { receiver, .. } => {
                receiver.simplify(vars);
            }

            NodeKind::Slice { receiver, start, end, skip } => {
                receiver.simplify(vars);
                if let Some(n) = start {
                    n.simplify(vars);
                }
                if let Some(n) = end {
                    n.simplify(vars);
                }
                if let Some(n) = skip {
                    n.simplify(vars);
                }
            }

            NodeKind::FunctionCall { callee, args } => {
                callee.simplify(vars);
                for arg in args.iter_mut() {
                    arg.simplify(vars);
                }
            }

            NodeKind::Assign { target, value } => {
                value.simplify(vars);
                target.simplify_assign_target(vars);
                if let NodeKind::Identifier(info) = &target.kind {
                    vars.record(&info.name, &value.kind);
                } else {
                    target.simplify(vars);
                }
            }

            NodeKind::Global { name, initializer, .. } => {
                if let Some(init) = initializer {
                    init.simplify(vars);
                    vars.record(name, &init.kind);
                } else {
                    vars.evict(name);
                }
            }

            NodeKind::IfElse { cond, if_block, else_block } => {
                cond.simplify(vars);
                if_block.simplify(vars);
                if let Some(e) = else_block {
                    e.simplify(vars);
                }
            }

            NodeKind::While { cond, body } | NodeKind::DoWhile { cond, body } => {
                cond.simplify(vars);
                body.simplify(vars);
            }

            NodeKind::For { init, cond, step, body } => {
                if let Some(n) = init {
                    n.simplify(vars);
                }
                if let Some(n) = cond {
                    n.simplify(vars);
                }
                if let Some(n) = step {
                    n.simplify(vars);
                }
                body.simplify(vars);
            }

            NodeKind::RangedFor { iterable, body, .. } => {
                iterable.simplify(vars);
                body.simplify(vars);
            }

            NodeKind::Return(expr) => {
                if let Some(e) = expr {
                    e.simplify(vars);
                }
            }

            NodeKind::Print(expr) => expr.simplify(vars),

            NodeKind::Block(stmts) => {
                for stmt in stmts.iter_mut() {
                    stmt.simplify(vars);
                }
            }

            NodeKind::Function { body, .. } => {
                // A fresh binding scope: Tang's functions don't close over the
                // enclosing block's literal bindings (no closures, §3.4).
                let mut inner = VariableMap::new();
                for stmt in body.iter_mut() {
                    stmt.simplify(&mut inner);
                }
            }

            NodeKind::Library { .. } | NodeKind::Use { .. } | NodeKind::Break | NodeKind::Continue | NodeKind::ParseError(_) => {}
        }
    }

    /// An assignment target that is an `Identifier` must not be substituted by
    /// `simplify` (you can't fold a store location into its last known value), but we
    /// still want to evict its binding before `Assign`'s caller records the new one.
    fn simplify_assign_target(&mut self, vars: &mut VariableMap) {
        if let NodeKind::Identifier(info) = &self.kind {
            vars.evict(&info.name);
        }
    }
}

fn fold_unary(op: UnaryOp, operand: &Node) -> Option<NodeKind> {
    match (op, &operand.kind) {
        (UnaryOp::Negate, NodeKind::Integer(i)) => Some(NodeKind::Integer(-i)),
        (UnaryOp::Negate, NodeKind::Float(f)) => Some(NodeKind::Float(-f)),
        (UnaryOp::Not, NodeKind::Boolean(b)) => Some(NodeKind::Boolean(!b)),
        _ => None,
    }
}

fn fold_binary(op: BinOp, lhs: &Node, rhs: &Node) -> Option<NodeKind> {
    use NodeKind::{Boolean, Float, Integer};
    match (&lhs.kind, &rhs.kind) {
        (Integer(a), Integer(b)) => fold_integer(op, *a, *b),
        (Float(a), Float(b)) => fold_float(op, *a, *b),
        (Integer(a), Float(b)) => fold_float(op, *a as f64, *b),
        (Float(a), Integer(b)) => fold_float(op, *a, *b as f64),
        (Boolean(a), Boolean(b)) => fold_bool(op, *a, *b),
        (NodeKind::StringLiteral(a), NodeKind::StringLiteral(b)) if op == BinOp::Add => {
            Some(NodeKind::StringLiteral(a.concat(b)))
        }
        _ => None,
    }
}

fn fold_integer(op: BinOp, a: i64, b: i64) -> Option<NodeKind> {
    Some(match op {
        BinOp::Add => NodeKind::Integer(a.wrapping_add(b)),
        BinOp::Subtract => NodeKind::Integer(a.wrapping_sub(b)),
        BinOp::Multiply => NodeKind::Integer(a.wrapping_mul(b)),
        BinOp::Divide if b == 0 => return None,
        BinOp::Divide => NodeKind::Integer(a / b),
        BinOp::Modulo if b == 0 => return None,
        BinOp::Modulo => NodeKind::Integer(a % b),
        BinOp::LessThan => NodeKind::Boolean(a < b),
        BinOp::LessThanEqual => NodeKind::Boolean(a <= b),
        BinOp::GreaterThan => NodeKind::Boolean(a > b),
        BinOp::GreaterThanEqual => NodeKind::Boolean(a >= b),
        BinOp::Equal => NodeKind::Boolean(a == b),
        BinOp::NotEqual => NodeKind::Boolean(a != b),
        BinOp::And | BinOp::Or => return None,
    })
}

fn fold_float(op: BinOp, a: f64, b: f64) -> Option<NodeKind> {
    Some(match op {
        BinOp::Add => NodeKind::Float(a + b),
        BinOp::Subtract => NodeKind::Float(a - b),
        BinOp::Multiply => NodeKind::Float(a * b),
        BinOp::Divide if b == 0.0 => return None,
        BinOp::Divide => NodeKind::Float(a / b),
        BinOp::Modulo if b == 0.0 => return None,
        BinOp::Modulo => NodeKind::Float(a % b),
        BinOp::LessThan => NodeKind::Boolean(a < b),
        BinOp::LessThanEqual => NodeKind::Boolean(a <= b),
        BinOp::GreaterThan => NodeKind::Boolean(a > b),
        BinOp::GreaterThanEqual => NodeKind::Boolean(a >= b),
        BinOp::Equal => NodeKind::Boolean(a == b),
        BinOp::NotEqual => NodeKind::Boolean(a != b),
        BinOp::And | BinOp::Or => return None,
    })
}

fn fold_bool(op: BinOp, a: bool, b: bool) -> Option<NodeKind> {
    Some(match op {
        BinOp::And => NodeKind::Boolean(a && b),
        BinOp::Or => NodeKind::Boolean(a || b),
        BinOp::Equal => NodeKind::Boolean(a == b),
        BinOp::NotEqual => NodeKind::Boolean(a != b),
        _ => return None,
    })
}

fn fold_cast(target: CastType, expr: &Node) -> Option<NodeKind> {
    match (target, &expr.kind) {
        (CastType::Int, NodeKind::Float(f)) => Some(NodeKind::Integer(*f as i64)),
        (CastType::Int, NodeKind::Boolean(b)) => Some(NodeKind::Integer(i64::from(*b))),
        (CastType::Float, NodeKind::Integer(i)) => Some(NodeKind::Float(*i as f64)),
        (CastType::Bool, NodeKind::Integer(i)) => Some(NodeKind::Boolean(*i != 0)),
        (CastType::Bool, NodeKind::Float(f)) => Some(NodeKind::Boolean(*f != 0.0)),
        (CastType::String, NodeKind::Integer(i)) => Some(NodeKind::StringLiteral(crate::string::TangString::new(
            i.to_string(),
            crate::string::StringType::Trusted,
        ))),
        _ => None,
    }
}

/// Silences the unused-import warning when `MapEntry`'s field is only read through
/// `entry.value` above; kept for documentation symmetry with the other node shapes.
#[allow(dead_code)]
fn _touch(_: &MapEntry) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn folds_integer_arithmetic() {
        let mut node = Node::new(NodeKind::Binary {
            op: BinOp::Add,
            lhs: Box::new(Node::new(NodeKind::Integer(3))),
            rhs: Box::new(Node::new(NodeKind::Integer(4))),
        });
        node.simplify(&mut VariableMap::new());
        assert!(matches!(node.kind, NodeKind::Integer(7)));
    }

    #[test]
    fn leaves_divide_by_zero_unfolded() {
        let mut node = Node::new(NodeKind::Binary {
            op: BinOp::Divide,
            lhs: Box::new(Node::new(NodeKind::Integer(1))),
            rhs: Box::new(Node::new(NodeKind::Integer(0))),
        });
        node.simplify(&mut VariableMap::new());
        assert!(matches!(node.kind, NodeKind::Binary { .. }));
    }

    #[test]
    fn substitutes_unreassigned_literal_global() {
        let mut vars = VariableMap::new();
        let mut decl = Node::new(NodeKind::Global {
            name: "x".to_string(),
            hash: crate::scope::hash_identifier("x"),
            initializer: Some(Box::new(Node::new(NodeKind::Integer(5)))),
        });
        decl.simplify(&mut vars);
        let mut usage = Node::new(NodeKind::Identifier(super::super::IdentifierInfo {
            name: "x".to_string(),
            hash: crate::scope::hash_identifier("x"),
            resolved: None,
            mangled_name: None,
        }));
        usage.simplify(&mut vars);
        assert!(matches!(usage.kind, NodeKind::Integer(5)));
    }
}
