//! Variable Scope & Resolver (§3.4, §4.2 "Analyze").
//!
//! Scopes are arranged as a tree, but rather than give each [`Scope`] an owning
//! parent back-reference (a cycle in a language with ownership), the tree is an arena
//! (`Vec<Scope>`) indexed by [`ScopeId`] — the Design Notes (§9) call this out
//! explicitly: "An arena of scopes with integer indices... cleanly removes the
//! cycle."

use ahash::AHashMap;

/// Where an identifier resolved to, following §3.4's resolution order: function
/// declaration in the chain → library name in root → `global` declaration in root →
/// local in the nearest enclosing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Function,
    Library,
    Global(u16),
    Local(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Stable FNV-1a hash of an identifier name, used as the key into every scope map
/// (§3.4: "keyed by identifier hash").
pub fn hash_identifier(name: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;
    let mut hash = OFFSET;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[derive(Debug, Clone)]
pub struct Scope {
    /// Dot-joined path from the root, e.g. `"/outer/inner"`.
    pub name: String,
    pub name_hash: u64,
    pub parent: Option<ScopeId>,
    /// `use`-bound library identifiers; only meaningful in the root scope.
    pub library_declarations: AHashMap<u64, String>,
    /// First-binding lookup cache: identifier hash → resolved binding.
    pub identified_variables: AHashMap<u64, Binding>,
    /// identifier hash → stack offset from the frame's base pointer.
    pub variable_positions: AHashMap<u64, u16>,
    /// Mangled-name hash → child scope; only meaningful in the root scope.
    pub function_scopes: AHashMap<u64, ScopeId>,
    /// Owned mangled name strings allocated while analyzing this scope's functions.
    pub allocated_mangled_names: Vec<String>,
    /// True for a scope introduced by a function declaration. Tang has no closures:
    /// a function's locals live at stack offsets relative to its own frame, so the
    /// `Local` arm of the resolution rule never crosses a function boundary to an
    /// enclosing function's locals (it may still see the root's `global`s, which are
    /// resolved separately and don't depend on frame layout).
    pub is_function_boundary: bool,
    next_local_slot: u16,
}

impl Scope {
    fn new(name: String, parent: Option<ScopeId>, is_function_boundary: bool) -> Self {
        let name_hash = hash_identifier(&name);
        Self {
            name,
            name_hash,
            parent,
            library_declarations: AHashMap::new(),
            identified_variables: AHashMap::new(),
            variable_positions: AHashMap::new(),
            function_scopes: AHashMap::new(),
            allocated_mangled_names: Vec::new(),
            is_function_boundary,
            next_local_slot: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena owning every [`Scope`] created while analyzing a program.
#[derive(Debug, Clone, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        let mut arena = Self { scopes: Vec::new() };
        arena.scopes.push(Scope::new("".to_string(), None, false));
        arena
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    /// Declares a new local in `scope`, returning its stack offset.
    pub fn declare_local(&mut self, scope: ScopeId, identifier_hash: u64) -> u16 {
        let slot = {
            let s = self.get_mut(scope);
            let slot = s.next_local_slot;
            s.next_local_slot += 1;
            slot
        };
        self.get_mut(scope).variable_positions.insert(identifier_hash, slot);
        self.get_mut(scope).identified_variables.insert(identifier_hash, Binding::Local(slot));
        slot
    }

    /// Pre-inserts a parameter at a fixed offset (§4.2: "Parameters are pre-inserted
    /// as locals at offsets 0..N-1").
    pub fn declare_parameter(&mut self, scope: ScopeId, identifier_hash: u64, offset: u16) {
        self.get_mut(scope).variable_positions.insert(identifier_hash, offset);
        self.get_mut(scope)
            .identified_variables
            .insert(identifier_hash, Binding::Local(offset));
        let s = self.get_mut(scope);
        s.next_local_slot = s.next_local_slot.max(offset + 1);
    }

    /// Creates a child scope for a function declaration and registers its mangled
    /// name in the root scope's `function_scopes` (§4.2).
    pub fn declare_function(&mut self, declaring_scope: ScopeId, mangled_name: String) -> ScopeId {
        let mangled_hash = hash_identifier(&mangled_name);
        let parent_path = self.get(declaring_scope).name.clone();
        let full_name = format!("{parent_path}/{mangled_name}");
        let child = Scope::new(full_name, Some(declaring_scope), true);
        let id = ScopeId(self.scopes.len());
        self.scopes.push(child);

        let root = self.root();
        self.get_mut(root).function_scopes.insert(mangled_hash, id);
        self.get_mut(declaring_scope).allocated_mangled_names.push(mangled_name);
        id
    }

    pub fn declare_global(&mut self, identifier_hash: u64) -> u16 {
        let root = self.root();
        let slot = {
            let s = self.get_mut(root);
            let slot = s.next_local_slot;
            s.next_local_slot += 1;
            slot
        };
        self.get_mut(root).variable_positions.insert(identifier_hash, slot);
        self.get_mut(root)
            .identified_variables
            .insert(identifier_hash, Binding::Global(slot));
        slot
    }

    pub fn declare_library(&mut self, root: ScopeId, identifier_hash: u64, name: String) {
        self.get_mut(root).library_declarations.insert(identifier_hash, name);
        self.get_mut(root).identified_variables.insert(identifier_hash, Binding::Library);
    }

    /// Resolves `identifier_hash` starting from `scope`, following §3.4's order:
    /// function declaration in the chain → library in root → global in root → local
    /// in the nearest enclosing scope.
    pub fn resolve(&self, scope: ScopeId, identifier_hash: u64) -> Option<Binding> {
        // Function declarations shadow everything, searched up the chain first.
        let root = self.root();
        if self.get(root).function_scopes.contains_key(&identifier_hash) {
            return Some(Binding::Function);
        }
        if let Some(Binding::Library) = self.get(root).identified_variables.get(&identifier_hash) {
            return Some(Binding::Library);
        }
        if let Some(binding @ Binding::Global(_)) = self.get(root).identified_variables.get(&identifier_hash) {
            return Some(*binding);
        }
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.get(id);
            if let Some(binding @ Binding::Local(_)) = s.identified_variables.get(&identifier_hash) {
                return Some(*binding);
            }
            if s.is_function_boundary {
                break;
            }
            current = s.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_declarations_shadow_locals() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let x_hash = hash_identifier("x");
        arena.declare_local(root, x_hash);
        let fn_scope = arena.declare_function(root, "x".to_string());
        assert_eq!(arena.resolve(fn_scope, x_hash), Some(Binding::Function));
    }

    #[test]
    fn nested_scope_resolves_outer_local() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let y_hash = hash_identifier("y");
        arena.declare_local(root, y_hash);
        let inner = arena.declare_function(root, "f".to_string());
        assert_eq!(arena.resolve(inner, y_hash), None, "locals don't cross function boundaries implicitly");
        assert_eq!(arena.resolve(root, y_hash), Some(Binding::Local(0)));
    }

    #[test]
    fn mangled_name_is_parent_path_plus_slash_plus_name() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let child = arena.declare_function(root, "helper".to_string());
        assert_eq!(arena.get(child).name, "/helper");
    }
}
