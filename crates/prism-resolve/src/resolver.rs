//! The resolver: given a name and a tower context, produce one best
//! candidate or a structured diagnostic.

use crate::candidate::{
    select_best, Applicability, ApplicabilityJudge, Candidate, CandidateFlags, ExactJudge,
    Judgement, Substitution,
};
use crate::diagnostics::Diagnostic;
use crate::provider::SymbolProviderGraph;
use crate::tower::{ImplicitReceiver, TowerContext, TowerElement, TowerElementKind};
use prism_store::{ClassId, Declaration, FqName, PackageName, TypeRef};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// How a name occurrence should be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Simple value/type identifier: the first tower element yielding any
    /// match is a hard shadowing cutoff.
    ValueOrType,
    /// Callable name: matches are collected from the entire chain and the
    /// symbol graph, because overload ranking governs callables, not
    /// lexical cutoff.
    Callable,
}

/// Names that follow an operator convention. Ambiguity among these is
/// reported as [`Diagnostic::OperatorAmbiguity`].
pub const OPERATOR_NAMES: &[&str] = &[
    "plus", "minus", "times", "div", "rem", "get", "set", "invoke", "contains", "compareTo",
    "equals",
];

pub fn is_operator_name(name: &str) -> bool {
    OPERATOR_NAMES.contains(&name)
}

/// Cooperative cancellation for long resolutions. The resolver checks the
/// flag between visits to successive tower elements; a visit itself is the
/// minimum cancellation granularity.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), Interrupted> {
        if self.is_interrupted() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Resolution was interrupted before completing. Not a resolution failure:
/// the caller chose to stop, no diagnostic is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("resolution interrupted")]
pub struct Interrupted;

/// Resolves identifiers against a tower context and a symbol graph.
pub struct Resolver {
    graph: SymbolProviderGraph,
    judge: Box<dyn ApplicabilityJudge>,
    /// The package unqualified cross-module lookups are rooted in.
    package: PackageName,
}

impl Resolver {
    /// A resolver that classifies every candidate as an exact match. Wire
    /// in a real judge with [`with_judge`](Resolver::with_judge) once a
    /// type checker exists.
    pub fn new(graph: SymbolProviderGraph, package: PackageName) -> Self {
        Resolver { graph, judge: Box::new(ExactJudge), package }
    }

    pub fn with_judge(mut self, judge: Box<dyn ApplicabilityJudge>) -> Self {
        self.judge = judge;
        self
    }

    pub fn graph(&self) -> &SymbolProviderGraph {
        &self.graph
    }

    /// Resolves `name` at the program point described by `context`.
    pub fn resolve(
        &self,
        name: &str,
        context: &TowerContext,
        mode: ResolveMode,
    ) -> Result<Candidate, Diagnostic> {
        match self.resolve_interruptible(name, context, mode, &InterruptFlag::new()) {
            Ok(result) => result,
            Err(Interrupted) => unreachable!("a private fresh flag is never interrupted"),
        }
    }

    /// Like [`resolve`](Resolver::resolve), but checks `flag` between tower
    /// element visits and stops early when it is set.
    pub fn resolve_interruptible(
        &self,
        name: &str,
        context: &TowerContext,
        mode: ResolveMode,
        flag: &InterruptFlag,
    ) -> Result<Result<Candidate, Diagnostic>, Interrupted> {
        log::debug!("resolving `{name}` ({mode:?}), tower depth {}", context.depth());
        let candidates = self.collect_candidates(name, context, mode, flag)?;
        log::trace!("`{name}`: {} raw candidates", candidates.len());

        // A lookup counts as an operator lookup by name convention or when
        // any candidate is a declared operator.
        let is_operator = mode == ResolveMode::Callable
            && (is_operator_name(name)
                || candidates.iter().any(|c| c.declaration.is_operator()));
        Ok(select_best(name, is_operator, candidates))
    }

    /// Resolves a dotted qualifier such as `core.collections.List`: the
    /// prefix must name a known package, the last segment a class in it.
    /// Fails with [`Diagnostic::UnresolvedTypeQualifier`] carrying the full
    /// part list.
    pub fn resolve_qualified(&self, parts: &[String]) -> Result<Candidate, Diagnostic> {
        let unresolved = || Diagnostic::UnresolvedTypeQualifier { parts: parts.to_vec() };

        let (last, prefix) = match parts.split_last() {
            Some(split) => split,
            None => return Err(unresolved()),
        };
        let package_name = prefix.join(".");
        if !prefix.is_empty() && self.graph.lookup_package(&FqName::parse(&package_name)).is_none() {
            return Err(unresolved());
        }
        let id = ClassId::new(PackageName::new(package_name), last.clone());
        match self.graph.lookup_class(&id) {
            Some(class) => Ok(self.graph_candidate(class, 0)),
            None => Err(unresolved()),
        }
    }

    /// Looks a class up by id; a store miss becomes
    /// [`Diagnostic::UnresolvedSymbol`].
    pub fn resolve_by_id(&self, id: &ClassId) -> Result<Candidate, Diagnostic> {
        match self.graph.lookup_class(id) {
            Some(class) => Ok(self.graph_candidate(class, 0)),
            None => Err(Diagnostic::UnresolvedSymbol { id: id.clone() }),
        }
    }

    fn collect_candidates(
        &self,
        name: &str,
        context: &TowerContext,
        mode: ResolveMode,
        flag: &InterruptFlag,
    ) -> Result<Vec<Candidate>, Interrupted> {
        let mut candidates = Vec::new();

        for (depth, element) in context.elements().enumerate() {
            flag.check()?;
            let before = candidates.len();
            self.collect_from_element(element, name, mode, depth, &mut candidates);
            if candidates.len() > before && mode == ResolveMode::ValueOrType {
                // Shadowing is a hard cutoff for simple identifiers.
                return Ok(candidates);
            }
        }
        flag.check()?;

        // Cross-module fallback: beyond every tower element.
        let graph_depth = context.depth();
        match mode {
            ResolveMode::ValueOrType => {
                let id = ClassId::new(self.package.clone(), name);
                if let Some(class) = self.graph.lookup_class(&id) {
                    candidates.push(self.graph_candidate(class, graph_depth));
                }
            }
            ResolveMode::Callable => {
                let mut sink = Vec::new();
                self.graph.lookup_callables(&self.package, name, &mut sink);
                candidates.extend(
                    sink.into_iter()
                        .filter(|decl| decl.kind.is_callable())
                        .map(|decl| self.judged_candidate(decl, None, graph_depth, None)),
                );
            }
        }

        Ok(candidates)
    }

    fn collect_from_element(
        &self,
        element: &TowerElement,
        name: &str,
        mode: ResolveMode,
        depth: usize,
        sink: &mut Vec<Candidate>,
    ) {
        match &element.kind {
            TowerElementKind::Scope(scope) => {
                for decl in scope.lookup(name) {
                    if self.matches_mode(decl, mode) {
                        sink.push(self.judged_candidate(decl.clone(), None, depth, None));
                    }
                }
            }
            TowerElementKind::Receiver(receiver) => {
                self.collect_from_receiver(receiver, name, mode, depth, sink);
            }
            TowerElementKind::ContextReceiverGroup(group) => {
                for receiver in group {
                    self.collect_from_receiver(receiver, name, mode, depth, sink);
                }
            }
        }
    }

    fn collect_from_receiver(
        &self,
        receiver: &ImplicitReceiver,
        name: &str,
        mode: ResolveMode,
        depth: usize,
        sink: &mut Vec<Candidate>,
    ) {
        let scope = receiver.member_scope(&self.graph);
        for decl in scope.lookup(name) {
            if self.matches_mode(decl, mode) {
                sink.push(self.judged_candidate(
                    decl.clone(),
                    Some(receiver.type_ref()),
                    depth,
                    Some(receiver.order_index()),
                ));
            }
        }
    }

    fn matches_mode(&self, decl: &Declaration, mode: ResolveMode) -> bool {
        match mode {
            ResolveMode::Callable => decl.kind.is_callable(),
            ResolveMode::ValueOrType => !decl.kind.is_callable(),
        }
    }

    /// A candidate found through the symbol graph, judged with no receiver.
    fn graph_candidate(&self, decl: Arc<Declaration>, depth: usize) -> Candidate {
        self.judged_candidate(decl, None, depth, None)
    }

    fn judged_candidate(
        &self,
        decl: Arc<Declaration>,
        receiver: Option<&TypeRef>,
        depth: usize,
        receiver_index: Option<usize>,
    ) -> Candidate {
        let mut flags = CandidateFlags { hidden: decl.hidden, ..CandidateFlags::default() };
        let (tier, substitution) = match self.judge.judge(&decl, receiver) {
            Judgement::Applicable { tier, substitution } => (tier, substitution),
            Judgement::WrongReceiver => {
                flags.wrong_receiver = true;
                (Applicability::Inapplicable, Substitution::new())
            }
            Judgement::Invisible => {
                flags.invisible = true;
                (Applicability::Exact, Substitution::new())
            }
            Judgement::Contradiction => {
                flags.contradiction = true;
                (Applicability::Exact, Substitution::new())
            }
        };
        Candidate { declaration: decl, tier, substitution, depth, receiver_index, flags }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DependencyProviders;

    fn empty_resolver() -> Resolver {
        Resolver::new(
            SymbolProviderGraph::new(Vec::new(), DependencyProviders::empty()),
            PackageName::root(),
        )
    }

    #[test]
    fn miss_is_a_diagnostic_not_a_panic() {
        let resolver = empty_resolver();
        let result = resolver.resolve("ghost", &TowerContext::new(), ResolveMode::ValueOrType);
        assert_eq!(
            result.unwrap_err(),
            Diagnostic::UnresolvedReference { name: "ghost".into() }
        );
    }

    #[test]
    fn interrupt_flag_stops_resolution() {
        let resolver = empty_resolver();
        let context = TowerContext::new().add_receiver(None, TypeRef::Error);
        let flag = InterruptFlag::new();
        flag.interrupt();
        let result =
            resolver.resolve_interruptible("x", &context, ResolveMode::ValueOrType, &flag);
        assert_eq!(result, Err(Interrupted));
    }

    #[test]
    fn missing_id_is_unresolved_symbol() {
        let resolver = empty_resolver();
        let id = ClassId::new(PackageName::new("core"), "Ghost");
        assert_eq!(
            resolver.resolve_by_id(&id).unwrap_err(),
            Diagnostic::UnresolvedSymbol { id }
        );
    }

    #[test]
    fn missing_qualifier_carries_all_parts() {
        let resolver = empty_resolver();
        let parts = vec!["core".to_string(), "missing".to_string(), "Type".to_string()];
        assert_eq!(
            resolver.resolve_qualified(&parts).unwrap_err(),
            Diagnostic::UnresolvedTypeQualifier { parts }
        );
    }

    #[test]
    fn operator_names_are_recognized() {
        assert!(is_operator_name("plus"));
        assert!(is_operator_name("invoke"));
        assert!(!is_operator_name("frobnicate"));
    }
}
