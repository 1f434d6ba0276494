#![doc = include_str!("../README.md")]

pub mod candidate;
pub mod diagnostics;
pub mod list;
pub mod provider;
pub mod resolver;
pub mod scope;
pub mod tower;

pub use candidate::{
    select_best, Applicability, ApplicabilityJudge, Candidate, CandidateFlags, ExactJudge,
    Judgement, Substitution,
};
pub use diagnostics::Diagnostic;
pub use provider::{DependencyProviders, StoreProvider, SymbolProvider, SymbolProviderGraph};
pub use resolver::{is_operator_name, InterruptFlag, Interrupted, ResolveMode, Resolver};
pub use scope::{member_scope_for, LocalScope, NameScope, ScopeId};
pub use tower::{
    collect_tower_elements_for_class, ClassTowerElements, ElementScope, ImplicitReceiver,
    TowerContext, TowerElement, TowerElementKind,
};
