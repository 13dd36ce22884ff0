//! Semantic analysis (§4.2 "Analyze"): runs after `simplify`, walks the tree once,
//! and resolves every `Identifier` to a [`crate::scope::Binding`] following §3.4's
//! order, allocating locals/globals/mangled function names as it goes.
//!
//! `use` and `global` are only legal as direct statements of the root `Block`; nested
//! occurrences are rejected here rather than by the parser, matching the original's
//! split between syntax and semantic validation
//! (`examples/original_source/include/tang/program/compilerContext.h` keeps the same
//! two-pass shape).

use std::fmt;

use super::{Node, NodeKind};
use crate::scope::{hash_identifier, ScopeArena, ScopeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    FunctionRedeclared(String),
    IdentifierRedeclared(String),
    GlobalIdentifierRedeclared(String),
    MisplacedUse,
    MisplacedGlobal,
    UnknownIdentifier(String),
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FunctionRedeclared(n) => write!(f, "function '{n}' redeclared"),
            Self::IdentifierRedeclared(n) => write!(f, "identifier '{n}' redeclared"),
            Self::GlobalIdentifierRedeclared(n) => write!(f, "global identifier '{n}' redeclared"),
            Self::MisplacedUse => write!(f, "'use' may only appear in the root scope"),
            Self::MisplacedGlobal => write!(f, "'global' may only appear in the root scope"),
            Self::UnknownIdentifier(n) => write!(f, "unknown identifier '{n}'"),
        }
    }
}

impl Node {
    /// Entry point for a freshly parsed (and simplified) program: analyzes `self` as
    /// the root `Block`.
    pub fn analyze_program(&mut self, arena: &mut ScopeArena) -> Result<(), AnalyzeError> {
        let root = arena.root();
        self.analyze(arena, root, true)
    }

    fn analyze(&mut self, arena: &mut ScopeArena, scope: ScopeId, is_root_statement_position: bool) -> Result<(), AnalyzeError> {
        match &mut self.kind {
            NodeKind::Null | NodeKind::Integer(_) | NodeKind::Float(_) | NodeKind::Boolean(_) | NodeKind::StringLiteral(_) | NodeKind::Break | NodeKind::Continue | NodeKind::ParseError(_) => Ok(()),

            NodeKind::Identifier(info) => {
                match arena.resolve(scope, info.hash) {
                    Some(binding) => {
                        info.resolved = Some(binding);
                        if let crate::scope::Binding::Function = binding {
                            info.mangled_name = Some(arena.get(scope).name.clone());
                        }
                        Ok(())
                    }
                    None => Err(AnalyzeError::UnknownIdentifier(info.name.clone())),
                }
            }

            NodeKind::Library { .. } => Ok(()),

            NodeKind::Array(items) => {
                for item in items.iter_mut() {
                    item.analyze(arena, scope, false)?;
                }
                Ok(())
            }

            NodeKind::Map(entries) => {
                for entry in entries.iter_mut() {
                    entry.value.analyze(arena, scope, false)?;
                }
                Ok(())
            }

            NodeKind::Unary { operand, .. } => operand.analyze(arena, scope, false),

            NodeKind::Binary { lhs, rhs, .. } => {
                lhs.analyze(arena, scope, false)?;
                rhs.analyze(arena, scope, false)
            }

            NodeKind::Cast { expr, .. } => expr.analyze(arena, scope, false),

            NodeKind::Ternary { cond, if_true, if_false } => {
                cond.analyze(arena, scope, false)?;
                if_true.analyze(arena, scope, false)?;
                if_false.analyze(arena, scope, false)
            }

            NodeKind::Index { receiver, index } => {
                receiver.analyze(arena, scope, false)?;
                index.analyze(arena, scope, false)
            }

            NodeKind::Period { receiver, .. } => receiver.analyze(arena, scope, false),

            NodeKind::Slice { receiver, start, end, skip } => {
                receiver.analyze(arena, scope, false)?;
                for n in [start, end, skip].into_iter().flatten() {
                    n.analyze(arena, scope, false)?;
                }
                Ok(())
            }

            NodeKind::FunctionCall { callee, args } => {
                callee.analyze(arena, scope, false)?;
                for arg in args.iter_mut() {
                    arg.analyze(arena, scope, false)?;
                }
                Ok(())
            }

            NodeKind::Assign { target, value } => {
                value.analyze(arena, scope, false)?;
                // Assigning to an identifier that hasn't resolved yet declares a new
                // local in the current scope rather than rejecting the program — Tang
                // has no separate `let`, so first assignment is the declaration.
                if let NodeKind::Identifier(info) = &mut target.kind {
                    match arena.resolve(scope, info.hash) {
                        Some(binding) => info.resolved = Some(binding),
                        None => {
                            let slot = arena.declare_local(scope, info.hash);
                            info.resolved = Some(crate::scope::Binding::Local(slot));
                        }
                    }
                    Ok(())
                } else {
                    target.analyze(arena, scope, false)
                }
            }

            NodeKind::Global { name, hash, initializer } => {
                if !is_root_statement_position {
                    return Err(AnalyzeError::MisplacedGlobal);
                }
                let root = arena.root();
                if arena.get(root).variable_positions.contains_key(hash) {
                    return Err(AnalyzeError::GlobalIdentifierRedeclared(name.clone()));
                }
                if let Some(init) = initializer {
                    init.analyze(arena, scope, false)?;
                }
                arena.declare_global(*hash);
                Ok(())
            }

            NodeKind::Use { identifier, library_name } => {
                if !is_root_statement_position {
                    return Err(AnalyzeError::MisplacedUse);
                }
                let hash = hash_identifier(identifier);
                let root = arena.root();
                if arena.get(root).identified_variables.contains_key(&hash) {
                    return Err(AnalyzeError::IdentifierRedeclared(identifier.clone()));
                }
                arena.declare_library(root, hash, library_name.clone());
                Ok(())
            }

            NodeKind::IfElse { cond, if_block, else_block } => {
                cond.analyze(arena, scope, false)?;
                if_block.analyze(arena, scope, false)?;
                if let Some(e) = else_block {
                    e.analyze(arena, scope, false)?;
                }
                Ok(())
            }

            NodeKind::While { cond, body } | NodeKind::DoWhile { cond, body } => {
                cond.analyze(arena, scope, false)?;
                body.analyze(arena, scope, false)
            }

            NodeKind::For { init, cond, step, body } => {
                if let Some(n) = init {
                    n.analyze(arena, scope, false)?;
                }
                if let Some(n) = cond {
                    n.analyze(arena, scope, false)?;
                }
                if let Some(n) = step {
                    n.analyze(arena, scope, false)?;
                }
                body.analyze(arena, scope, false)
            }

            NodeKind::RangedFor { var_name, var_hash, var_slot, iterable, body } => {
                iterable.analyze(arena, scope, false)?;
                if arena.get(scope).variable_positions.contains_key(var_hash) {
                    return Err(AnalyzeError::IdentifierRedeclared(var_name.clone()));
                }
                *var_slot = Some(arena.declare_local(scope, *var_hash));
                body.analyze(arena, scope, false)
            }

            NodeKind::Return(expr) => {
                if let Some(e) = expr {
                    e.analyze(arena, scope, false)?;
                }
                Ok(())
            }

            NodeKind::Print(expr) => expr.analyze(arena, scope, false),

            NodeKind::Block(stmts) => {
                for stmt in stmts.iter_mut() {
                    stmt.analyze(arena, scope, is_root_statement_position)?;
                }
                Ok(())
            }

            NodeKind::Function { name, params, body, scope: fn_scope } => {
                let root = arena.root();
                let mangled = name.clone();
                if arena.get(root).function_scopes.contains_key(&hash_identifier(&mangled)) {
                    return Err(AnalyzeError::FunctionRedeclared(name.clone()));
                }
                let declaring = arena.root();
                let child = arena.declare_function(declaring, mangled);
                for (offset, param) in params.iter().enumerate() {
                    arena.declare_parameter(child, hash_identifier(param), offset as u16);
                }
                for stmt in body.iter_mut() {
                    stmt.analyze(arena, child, false)?;
                }
                *fn_scope = Some(child);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IdentifierInfo, NodeKind};

    fn ident(name: &str) -> Node {
        Node::new(NodeKind::Identifier(IdentifierInfo {
            name: name.to_string(),
            hash: hash_identifier(name),
            resolved: None,
            mangled_name: None,
        }))
    }

    #[test]
    fn global_at_root_resolves() {
        let mut arena = ScopeArena::new();
        let mut program = Node::new(NodeKind::Block(vec![
            Node::new(NodeKind::Global {
                name: "x".to_string(),
                hash: hash_identifier("x"),
                initializer: Some(Box::new(Node::new(NodeKind::Integer(1)))),
            }),
            ident("x"),
        ]));
        assert!(program.analyze_program(&mut arena).is_ok());
    }

    #[test]
    fn use_outside_root_is_rejected() {
        let mut arena = ScopeArena::new();
        let mut program = Node::new(NodeKind::Block(vec![Node::new(NodeKind::IfElse {
            cond: Box::new(Node::new(NodeKind::Boolean(true))),
            if_block: Box::new(Node::new(NodeKind::Block(vec![Node::new(NodeKind::Use {
                identifier: "math".to_string(),
                library_name: "Math".to_string(),
            })]))),
            else_block: None,
        })]));
        assert_eq!(program.analyze_program(&mut arena), Err(AnalyzeError::MisplacedUse));
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let mut arena = ScopeArena::new();
        let mut program = Node::new(NodeKind::Block(vec![ident("ghost")]));
        assert_eq!(
            program.analyze_program(&mut arena),
            Err(AnalyzeError::UnknownIdentifier("ghost".to_string()))
        );
    }
}
