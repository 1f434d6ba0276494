//! Scope representations: ordered name → declarations mappings with point
//! lookup and name enumeration, plus the member-scope computation reachable
//! from a type.

use crate::provider::SymbolProviderGraph;
use fxhash::{FxHashMap, FxHashSet};
use prism_store::{ClassId, Declaration, Symbol, TypeRef};
use std::sync::Arc;

/// An ordered mapping from simple names to declarations.
///
/// Lookup is by name; enumeration follows insertion order so that two scopes
/// built from the same declarations enumerate identically. The storage is
/// `Arc`-shared, so cloning a scope is cheap.
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    inner: Arc<ScopeData>,
}

#[derive(Debug, Default)]
struct ScopeData {
    order: Vec<String>,
    entries: FxHashMap<String, Vec<Arc<Declaration>>>,
}

impl NameScope {
    pub fn empty() -> Self {
        NameScope::default()
    }

    /// Builds a scope from declarations in the given order.
    pub fn from_declarations<I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = Arc<Declaration>>,
    {
        let mut data = ScopeData::default();
        for decl in declarations {
            data.push(decl);
        }
        NameScope { inner: Arc::new(data) }
    }

    /// All declarations registered under `name`, in insertion order.
    pub fn lookup(&self, name: &str) -> &[Arc<Declaration>] {
        self.inner.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Enumerates the names in this scope, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.order.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.order.is_empty()
    }
}

impl ScopeData {
    fn push(&mut self, decl: Arc<Declaration>) {
        let slot = self.entries.entry(decl.name.clone()).or_default();
        if slot.is_empty() {
            self.order.push(decl.name.clone());
        }
        slot.push(decl);
    }
}

/// Identity of a local scope, stable across its incremental extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(Symbol);

impl ScopeId {
    fn fresh() -> Self {
        ScopeId(Symbol::fresh())
    }
}

/// A local (block) scope.
///
/// `LocalScope` is a persistent value: `store` returns a new scope and
/// leaves the receiver untouched. Crucially, the extension keeps the same
/// [`ScopeId`] — a block incrementally gaining declarations is still the
/// same block, which is what lets the tower context replace it in place
/// rather than nesting a fresh scope.
#[derive(Debug, Clone)]
pub struct LocalScope {
    id: ScopeId,
    order: Vec<String>,
    entries: FxHashMap<String, Vec<Arc<Declaration>>>,
}

impl Default for LocalScope {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalScope {
    /// A fresh, empty block scope with a new identity.
    pub fn new() -> Self {
        LocalScope { id: ScopeId::fresh(), order: Vec::new(), entries: FxHashMap::default() }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Returns a new scope with `decl` added, keeping this scope's identity.
    pub fn store(&self, decl: Arc<Declaration>) -> Self {
        let mut next = self.clone();
        let slot = next.entries.entry(decl.name.clone()).or_default();
        if slot.is_empty() {
            next.order.push(decl.name.clone());
        }
        slot.push(decl);
        next
    }

    pub fn lookup(&self, name: &str) -> &[Arc<Declaration>] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Computes the member scope reachable from `type_ref`: the type's own
/// members first, then each superclass's members in inheritance order,
/// closest first.
///
/// An error/placeholder type yields an empty scope; a missing class does
/// too. One bad expression must not abort resolution elsewhere.
pub fn member_scope_for(type_ref: &TypeRef, graph: &SymbolProviderGraph) -> NameScope {
    let class_id = match type_ref.class_id() {
        Some(id) => id,
        None => return NameScope::empty(),
    };

    let mut members: Vec<Arc<Declaration>> = Vec::new();
    let mut visited: FxHashSet<ClassId> = FxHashSet::default();
    let mut worklist: Vec<ClassId> = vec![class_id.clone()];

    // Breadth-first over the inheritance chain keeps closer classes earlier
    // in enumeration order.
    while !worklist.is_empty() {
        let mut next_level = Vec::new();
        for id in worklist.drain(..) {
            if !visited.insert(id.clone()) {
                continue;
            }
            let class = match graph.lookup_class(&id) {
                Some(class) => class,
                None => continue,
            };
            if let Some(details) = class.class_details() {
                members.extend(details.members.iter().cloned());
                next_level.extend(details.superclasses.iter().cloned());
            }
        }
        worklist = next_level;
    }

    NameScope::from_declarations(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_store::{value, ModuleId, TypeRef};

    fn decl(name: &str) -> Arc<Declaration> {
        Arc::new(value(name, TypeRef::Error, ModuleId(0)))
    }

    #[test]
    fn name_scope_enumerates_in_insertion_order() {
        let scope = NameScope::from_declarations(vec![decl("b"), decl("a"), decl("b")]);
        assert_eq!(scope.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(scope.lookup("b").len(), 2);
        assert!(scope.lookup("missing").is_empty());
    }

    #[test]
    fn local_scope_store_keeps_identity() {
        let block = LocalScope::new();
        let extended = block.store(decl("x"));

        assert_eq!(block.id(), extended.id());
        assert!(block.lookup("x").is_empty());
        assert_eq!(extended.lookup("x").len(), 1);
    }

    #[test]
    fn fresh_local_scopes_have_distinct_identity() {
        assert_ne!(LocalScope::new().id(), LocalScope::new().id());
    }
}
