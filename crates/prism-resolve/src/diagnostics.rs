//! The closed, data-only diagnostic taxonomy.
//!
//! Every ordinary resolution failure is one of these variants, carrying
//! exactly the data needed to render it and to drive fixes. Variants are
//! comparable and serializable so tests can snapshot them; rendering is
//! miette's job, dispatched by pattern matching, and no behavior is
//! attached here.

use crate::candidate::{Applicability, Candidate};
use miette::Diagnostic as MietteDiagnostic;
use prism_store::{ClassId, DeclarationId};
use serde::Serialize;
use thiserror::Error;

/// A structured resolution failure.
#[derive(Debug, Clone, PartialEq, Error, MietteDiagnostic, Serialize)]
pub enum Diagnostic {
    /// Nothing in the tower or the symbol graph matched the name.
    #[error("Unresolved reference: `{name}`")]
    #[diagnostic(code(prism_resolve::unresolved_reference))]
    UnresolvedReference { name: String },

    /// A lookup by id found no declaration.
    #[error("Unresolved symbol: {id}")]
    #[diagnostic(code(prism_resolve::unresolved_symbol))]
    UnresolvedSymbol { id: ClassId },

    /// A qualified name failed to resolve; `parts` is the full qualifier.
    #[error("Unresolved qualifier: `{}`", parts.join("."))]
    #[diagnostic(code(prism_resolve::unresolved_type_qualifier))]
    UnresolvedTypeQualifier { parts: Vec<String> },

    /// Candidates exist for the name, but none accepts the given receiver.
    #[error("No candidate accepts the receiver ({} rejected)", candidates.len())]
    #[diagnostic(
        code(prism_resolve::wrong_receiver),
        help("the name exists, but not on this receiver type")
    )]
    WrongReceiver { candidates: Vec<Candidate> },

    /// One best candidate was found, but it fails argument/type checks.
    #[error("`{}` is not applicable here", candidate.declaration.name)]
    #[diagnostic(code(prism_resolve::inapplicable))]
    Inapplicable { tier: Applicability, candidate: Box<Candidate> },

    /// Multiple equally good candidates remain after ranking.
    #[error("Ambiguous reference: `{name}` has {} equally applicable candidates", candidates.len())]
    #[diagnostic(code(prism_resolve::ambiguity))]
    Ambiguity { name: String, tier: Applicability, candidates: Vec<Candidate> },

    /// Ambiguity among operator-convention candidates.
    #[error("Ambiguous operator: {} equally applicable candidates", candidates.len())]
    #[diagnostic(code(prism_resolve::operator_ambiguity))]
    OperatorAmbiguity { candidates: Vec<Candidate> },

    /// A declaration was found but is not visible from the use site.
    #[error("Symbol {symbol} is not visible here")]
    #[diagnostic(code(prism_resolve::visibility_error))]
    VisibilityError { symbol: DeclarationId },

    /// The only surviving candidate is suppressed from normal resolution.
    #[error("`{}` is hidden and cannot be used here", candidate.declaration.name)]
    #[diagnostic(code(prism_resolve::hidden_candidate))]
    HiddenCandidate { candidate: Box<Candidate> },

    /// The chosen candidate has unsatisfiable constraints.
    #[error("Constraints on `{}` cannot be satisfied", candidate.declaration.name)]
    #[diagnostic(code(prism_resolve::constraint_contradiction))]
    ConstraintContradiction { candidate: Box<Candidate> },
}

impl Diagnostic {
    /// The candidates this diagnostic carries, if any. Handy for fix
    /// machinery that offers the tied or rejected set.
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Diagnostic::WrongReceiver { candidates }
            | Diagnostic::Ambiguity { candidates, .. }
            | Diagnostic::OperatorAmbiguity { candidates } => candidates,
            Diagnostic::Inapplicable { candidate, .. }
            | Diagnostic::HiddenCandidate { candidate }
            | Diagnostic::ConstraintContradiction { candidate } => std::slice::from_ref(candidate),
            _ => &[],
        }
    }
}
