//! The `DeclarationStore` collaborator contract and the stores shipped with
//! the workspace.
//!
//! Absence of a declaration is never an error at this layer: a miss is
//! `None` or an empty list. Only the resolver turns "nothing found" into a
//! diagnostic.

use crate::decl::Declaration;
use crate::symbol::{ClassId, FqName, PackageName};
use dashmap::DashMap;
use fxhash::FxHashMap;
use std::sync::Arc;

/// Loads declarations from modules on demand.
///
/// Implementations may decode compiled units, read caches, or hold
/// everything in memory; the resolver never sees the difference. All methods
/// must be safe to call from multiple threads.
pub trait DeclarationStore: Send + Sync {
    /// Looks up a class by id. `None` means the store does not know it.
    fn find_class(&self, id: &ClassId) -> Option<Arc<Declaration>>;

    /// Returns the top-level callables named `name` in `package`, in a
    /// deterministic order. The result is finite and the call is
    /// restartable: calling twice yields the same declarations.
    fn find_top_level_callables(&self, package: &PackageName, name: &str) -> Vec<Arc<Declaration>>;

    /// Returns the package name back if the store knows the package.
    fn find_package(&self, fq_name: &FqName) -> Option<FqName>;
}

/// A store wrapper that memoizes class lookups per `ClassId`.
///
/// Concurrent callers racing on the same id converge on one computed result
/// through the map entry for that id; unrelated lookups are never
/// serialized behind a global lock. Negative results are memoized too, so a
/// repeated miss does not hit the underlying store again.
pub struct MemoizedStore<S> {
    inner: S,
    classes: DashMap<ClassId, Option<Arc<Declaration>>>,
}

impl<S: DeclarationStore> MemoizedStore<S> {
    pub fn new(inner: S) -> Self {
        MemoizedStore { inner, classes: DashMap::default() }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: DeclarationStore> DeclarationStore for MemoizedStore<S> {
    fn find_class(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        if let Some(cached) = self.classes.get(id) {
            return cached.clone();
        }
        // The computation may race; or_insert_with keeps whichever entry
        // wins, and every caller observes that single result afterwards.
        self.classes
            .entry(id.clone())
            .or_insert_with(|| {
                log::trace!("loading class {id}");
                self.inner.find_class(id)
            })
            .clone()
    }

    fn find_top_level_callables(&self, package: &PackageName, name: &str) -> Vec<Arc<Declaration>> {
        self.inner.find_top_level_callables(package, name)
    }

    fn find_package(&self, fq_name: &FqName) -> Option<FqName> {
        self.inner.find_package(fq_name)
    }
}

/// An in-memory declaration store.
///
/// Used by tests and by frontends small enough to load everything upfront.
/// Iteration order for callables is insertion order, which keeps results
/// deterministic.
#[derive(Default)]
pub struct InMemoryStore {
    classes: FxHashMap<ClassId, Arc<Declaration>>,
    callables: FxHashMap<(PackageName, String), Vec<Arc<Declaration>>>,
    packages: FxHashMap<FqName, ()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class declaration under its id. Replaces any previous
    /// registration for the same id.
    pub fn add_class(&mut self, id: ClassId, declaration: Arc<Declaration>) -> &mut Self {
        self.packages.insert(FqName::parse(&id.package.0), ());
        self.classes.insert(id, declaration);
        self
    }

    /// Registers a top-level callable in a package.
    pub fn add_callable(&mut self, package: PackageName, declaration: Arc<Declaration>) -> &mut Self {
        self.packages.insert(FqName::parse(&package.0), ());
        self.callables
            .entry((package, declaration.name.clone()))
            .or_default()
            .push(declaration);
        self
    }

    /// Registers a package with no contents (a namespace-only package).
    pub fn add_package(&mut self, fq_name: FqName) -> &mut Self {
        self.packages.insert(fq_name, ());
        self
    }
}

impl DeclarationStore for InMemoryStore {
    fn find_class(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        self.classes.get(id).cloned()
    }

    fn find_top_level_callables(&self, package: &PackageName, name: &str) -> Vec<Arc<Declaration>> {
        self.callables
            .get(&(package.clone(), name.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn find_package(&self, fq_name: &FqName) -> Option<FqName> {
        self.packages.get(fq_name).map(|_| fq_name.clone())
    }
}

impl<S: DeclarationStore + ?Sized> DeclarationStore for Arc<S> {
    fn find_class(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        (**self).find_class(id)
    }

    fn find_top_level_callables(&self, package: &PackageName, name: &str) -> Vec<Arc<Declaration>> {
        (**self).find_top_level_callables(package, name)
    }

    fn find_package(&self, fq_name: &FqName) -> Option<FqName> {
        (**self).find_package(fq_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{callable, TypeRef};
    use crate::symbol::ModuleId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts how often the underlying class lookup runs.
    struct CountingStore {
        inner: InMemoryStore,
        hits: AtomicUsize,
    }

    impl DeclarationStore for CountingStore {
        fn find_class(&self, id: &ClassId) -> Option<Arc<Declaration>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.find_class(id)
        }

        fn find_top_level_callables(&self, package: &PackageName, name: &str) -> Vec<Arc<Declaration>> {
            self.inner.find_top_level_callables(package, name)
        }

        fn find_package(&self, fq_name: &FqName) -> Option<FqName> {
            self.inner.find_package(fq_name)
        }
    }

    #[test]
    fn memoized_store_loads_once() {
        let store = CountingStore { inner: InMemoryStore::new(), hits: AtomicUsize::new(0) };
        let memo = MemoizedStore::new(store);
        let id = ClassId::new(PackageName::new("core"), "Missing");

        assert!(memo.find_class(&id).is_none());
        assert!(memo.find_class(&id).is_none());
        // The negative result is memoized as well.
        assert_eq!(memo.inner().hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callables_are_restartable() {
        let mut store = InMemoryStore::new();
        let pkg = PackageName::new("util");
        store.add_callable(
            pkg.clone(),
            Arc::new(callable("trim", vec![], TypeRef::Error, ModuleId(0))),
        );

        let first = store.find_top_level_callables(&pkg, "trim");
        let second = store.find_top_level_callables(&pkg, "trim");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn registering_a_class_registers_its_package() {
        let mut store = InMemoryStore::new();
        let id = ClassId::new(PackageName::new("core.collections"), "List");
        store.add_class(
            id.clone(),
            Arc::new(Declaration::new(
                "List",
                crate::decl::DeclarationKind::Class(crate::decl::ClassDetails {
                    class_id: id.clone(),
                    members: vec![],
                    statics: vec![],
                    companion: None,
                    superclasses: vec![],
                }),
                ModuleId(0),
            )),
        );
        assert!(store.find_package(&FqName::parse("core.collections")).is_some());
        assert!(store.find_package(&FqName::parse("core.missing")).is_none());
    }
}
