//! Symbol providers and their composition.
//!
//! A [`SymbolProvider`] answers class, top-level-callable and package
//! queries for one source of declarations. [`SymbolProviderGraph`] composes
//! the providers of the module being resolved (own providers) with the
//! providers of its dependencies, in dependency order.
//!
//! Own providers always win over dependency providers: local shadowing of a
//! dependency symbol is a hard invariant, not a heuristic.

use fxhash::FxHashSet;
use prism_store::{ClassId, Declaration, DeclarationStore, FacadeId, FqName, PackageName};
use std::sync::Arc;

/// A source of declarations for resolution.
pub trait SymbolProvider: Send + Sync {
    /// Looks up a class by id. `None` is a normal miss, not an error.
    fn class_by_id(&self, id: &ClassId) -> Option<Arc<Declaration>>;

    /// Appends every top-level callable named `name` in `package` to `sink`.
    fn top_level_callables(&self, package: &PackageName, name: &str, sink: &mut Vec<Arc<Declaration>>);

    /// Returns the package back if this provider knows it.
    fn package(&self, fq_name: &FqName) -> Option<FqName>;

    /// Whether this provider is itself a composition of providers. Composite
    /// providers must not be nested inside a dependency list.
    fn is_composite(&self) -> bool {
        false
    }
}

/// Adapts a [`DeclarationStore`] to the provider interface.
pub struct StoreProvider<S> {
    store: S,
}

impl<S: DeclarationStore> StoreProvider<S> {
    pub fn new(store: S) -> Self {
        StoreProvider { store }
    }
}

impl<S: DeclarationStore> SymbolProvider for StoreProvider<S> {
    fn class_by_id(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        self.store.find_class(id)
    }

    fn top_level_callables(&self, package: &PackageName, name: &str, sink: &mut Vec<Arc<Declaration>>) {
        sink.extend(self.store.find_top_level_callables(package, name));
    }

    fn package(&self, fq_name: &FqName) -> Option<FqName> {
        self.store.find_package(fq_name)
    }
}

/// The ordered providers of a module's dependencies.
///
/// Construction fails fast if any element is itself a composite provider:
/// the dependency list must stay flat so that provider order alone defines
/// lookup priority.
pub struct DependencyProviders {
    providers: Vec<Arc<dyn SymbolProvider>>,
}

impl DependencyProviders {
    /// # Panics
    ///
    /// Panics if any provider in `providers` is composite. That is a bug in
    /// the caller building the graph, not a user-facing error.
    pub fn new(providers: Vec<Arc<dyn SymbolProvider>>) -> Self {
        for (index, provider) in providers.iter().enumerate() {
            assert!(
                !provider.is_composite(),
                "dependency provider at index {index} is a composite provider; \
                 flatten the dependency list before constructing the graph"
            );
        }
        DependencyProviders { providers }
    }

    pub fn empty() -> Self {
        DependencyProviders { providers: Vec::new() }
    }

    fn class_by_id(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        self.providers.iter().find_map(|p| p.class_by_id(id))
    }

    /// Collects dependency callables with per-call facade deduplication.
    ///
    /// Providers are visited in dependency order. Each provider's newly
    /// found symbols are partitioned by facade identity: symbols whose
    /// facade already contributed earlier in *this call* are dropped, all
    /// others are kept. A compiled unit split across physical parts thus
    /// contributes each name once per call, while distinct facades stay
    /// independent. Symbols without a facade are never deduplicated.
    fn top_level_callables(&self, package: &PackageName, name: &str, sink: &mut Vec<Arc<Declaration>>) {
        let mut seen_facades: FxHashSet<FacadeId> = FxHashSet::default();
        let mut found = Vec::new();
        for provider in &self.providers {
            found.clear();
            provider.top_level_callables(package, name, &mut found);

            let mut contributed: FxHashSet<FacadeId> = FxHashSet::default();
            for decl in found.drain(..) {
                match decl.facade {
                    Some(facade) if seen_facades.contains(&facade) => {
                        log::trace!("dropping {}.{} from already-seen facade {facade:?}", package, decl.name);
                    }
                    Some(facade) => {
                        contributed.insert(facade);
                        sink.push(decl);
                    }
                    None => sink.push(decl),
                }
            }
            seen_facades.extend(contributed);
        }
    }

    fn package(&self, fq_name: &FqName) -> Option<FqName> {
        self.providers.iter().find_map(|p| p.package(fq_name))
    }
}

impl SymbolProvider for DependencyProviders {
    fn class_by_id(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        DependencyProviders::class_by_id(self, id)
    }

    fn top_level_callables(&self, package: &PackageName, name: &str, sink: &mut Vec<Arc<Declaration>>) {
        DependencyProviders::top_level_callables(self, package, name, sink)
    }

    fn package(&self, fq_name: &FqName) -> Option<FqName> {
        DependencyProviders::package(self, fq_name)
    }

    fn is_composite(&self) -> bool {
        true
    }
}

/// Own providers composed with one dependency-provider list.
pub struct SymbolProviderGraph {
    own: Vec<Arc<dyn SymbolProvider>>,
    dependencies: DependencyProviders,
}

impl SymbolProviderGraph {
    pub fn new(own: Vec<Arc<dyn SymbolProvider>>, dependencies: DependencyProviders) -> Self {
        SymbolProviderGraph { own, dependencies }
    }

    /// Own providers are tried first, in list order; the dependency list is
    /// consulted only on a total own miss.
    pub fn lookup_class(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        self.own
            .iter()
            .find_map(|p| p.class_by_id(id))
            .or_else(|| self.dependencies.class_by_id(id))
    }

    /// Every own provider contributes unconditionally (no dedup); the
    /// dependency list then contributes with per-call facade dedup.
    pub fn lookup_callables(&self, package: &PackageName, name: &str, sink: &mut Vec<Arc<Declaration>>) {
        for provider in &self.own {
            provider.top_level_callables(package, name, sink);
        }
        self.dependencies.top_level_callables(package, name, sink);
    }

    /// First match wins, own before dependency.
    pub fn lookup_package(&self, fq_name: &FqName) -> Option<FqName> {
        self.own
            .iter()
            .find_map(|p| p.package(fq_name))
            .or_else(|| self.dependencies.package(fq_name))
    }
}

impl SymbolProvider for SymbolProviderGraph {
    fn class_by_id(&self, id: &ClassId) -> Option<Arc<Declaration>> {
        self.lookup_class(id)
    }

    fn top_level_callables(&self, package: &PackageName, name: &str, sink: &mut Vec<Arc<Declaration>>) {
        self.lookup_callables(package, name, sink)
    }

    fn package(&self, fq_name: &FqName) -> Option<FqName> {
        self.lookup_package(fq_name)
    }

    fn is_composite(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_store::{callable, InMemoryStore, ModuleId, TypeRef};

    fn provider_with(package: &PackageName, decls: Vec<Arc<Declaration>>) -> Arc<dyn SymbolProvider> {
        let mut store = InMemoryStore::new();
        for decl in decls {
            store.add_callable(package.clone(), decl);
        }
        Arc::new(StoreProvider::new(store))
    }

    fn foo(module: u32, facade: Option<FacadeId>) -> Arc<Declaration> {
        let mut decl = callable("foo", vec![], TypeRef::Error, ModuleId(module));
        decl.facade = facade;
        Arc::new(decl)
    }

    #[test]
    fn same_facade_contributes_once_per_call() {
        let pkg = PackageName::new("lib");
        let facade = FacadeId(7);
        let deps = DependencyProviders::new(vec![
            provider_with(&pkg, vec![foo(1, Some(facade))]),
            provider_with(&pkg, vec![foo(2, Some(facade))]),
        ]);

        let mut sink = Vec::new();
        deps.top_level_callables(&pkg, "foo", &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].module, ModuleId(1));

        // Per-call scoping: a second call sees the same single result again.
        let mut again = Vec::new();
        deps.top_level_callables(&pkg, "foo", &mut again);
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn distinct_facades_stay_independent() {
        let pkg = PackageName::new("lib");
        let deps = DependencyProviders::new(vec![
            provider_with(&pkg, vec![foo(1, Some(FacadeId(1)))]),
            provider_with(&pkg, vec![foo(2, Some(FacadeId(2)))]),
        ]);

        let mut sink = Vec::new();
        deps.top_level_callables(&pkg, "foo", &mut sink);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn overloads_within_one_facade_part_are_kept() {
        let pkg = PackageName::new("lib");
        let facade = FacadeId(3);
        let deps = DependencyProviders::new(vec![provider_with(
            &pkg,
            vec![foo(1, Some(facade)), foo(1, Some(facade))],
        )]);

        let mut sink = Vec::new();
        deps.top_level_callables(&pkg, "foo", &mut sink);
        assert_eq!(sink.len(), 2, "overloads in one part are not facade-duplicates");
    }

    #[test]
    fn unfacaded_symbols_never_dedup() {
        let pkg = PackageName::new("lib");
        let deps = DependencyProviders::new(vec![
            provider_with(&pkg, vec![foo(1, None)]),
            provider_with(&pkg, vec![foo(2, None)]),
        ]);

        let mut sink = Vec::new();
        deps.top_level_callables(&pkg, "foo", &mut sink);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn own_providers_skip_dedup() {
        let pkg = PackageName::new("lib");
        let facade = FacadeId(9);
        let graph = SymbolProviderGraph::new(
            vec![
                provider_with(&pkg, vec![foo(1, Some(facade))]),
                provider_with(&pkg, vec![foo(2, Some(facade))]),
            ],
            DependencyProviders::empty(),
        );

        let mut sink = Vec::new();
        graph.lookup_callables(&pkg, "foo", &mut sink);
        assert_eq!(sink.len(), 2, "own providers contribute unconditionally");
    }

    #[test]
    #[should_panic(expected = "composite provider")]
    fn nested_composite_dependency_fails_fast() {
        let nested: Arc<dyn SymbolProvider> = Arc::new(DependencyProviders::empty());
        let _ = DependencyProviders::new(vec![nested]);
    }

    #[test]
    fn own_class_shadows_dependency_class() {
        let pkg = PackageName::new("lib");
        let id = ClassId::new(pkg.clone(), "Thing");

        let class = |module: u32| {
            Arc::new(Declaration::new(
                "Thing",
                prism_store::DeclarationKind::Class(prism_store::ClassDetails {
                    class_id: id.clone(),
                    members: vec![],
                    statics: vec![],
                    companion: None,
                    superclasses: vec![],
                }),
                ModuleId(module),
            ))
        };

        let mut own_store = InMemoryStore::new();
        own_store.add_class(id.clone(), class(1));
        let mut dep_store = InMemoryStore::new();
        dep_store.add_class(id.clone(), class(2));

        let graph = SymbolProviderGraph::new(
            vec![Arc::new(StoreProvider::new(own_store))],
            DependencyProviders::new(vec![Arc::new(StoreProvider::new(dep_store))]),
        );

        assert_eq!(graph.lookup_class(&id).unwrap().module, ModuleId(1));
    }
}
