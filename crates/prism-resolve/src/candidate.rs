//! Candidates and the tier/domination ranking that turns raw matches into
//! one result or a structured failure.

use crate::diagnostics::Diagnostic;
use prism_store::{Declaration, TypeRef};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How well a candidate matches, short of full inference. Ordered best
/// first: `Exact < Conversion < Relaxation < Inapplicable` as enum values,
/// so the smallest tier is the best one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Applicability {
    /// Matches as declared.
    Exact,
    /// Matches via an implicit conversion.
    Conversion,
    /// Matches only by relaxing nullability or variance.
    Relaxation,
    /// Does not match.
    Inapplicable,
}

/// The type substitution used to reach a candidate. A `BTreeMap` keeps the
/// serialized and compared form deterministic.
pub type Substitution = BTreeMap<String, TypeRef>;

/// Per-candidate facts established by the judge, beyond the tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CandidateFlags {
    /// Candidates exist for the name but this one rejects the receiver.
    pub wrong_receiver: bool,
    /// Found but not visible from the use site.
    pub invisible: bool,
    /// Suppressed from normal resolution (deprecated-hidden and the like).
    pub hidden: bool,
    /// The candidate's constraints are unsatisfiable.
    pub contradiction: bool,
}

/// A declaration paired with its match quality at a use site.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub declaration: Arc<Declaration>,
    pub tier: Applicability,
    pub substitution: Substitution,
    /// Distance from the innermost tower element, 0 = innermost. Candidates
    /// from the cross-module graph sit beyond every tower element.
    pub depth: usize,
    /// Declaration-order index of the receiver that produced this
    /// candidate, if any. Tie-break only.
    pub receiver_index: Option<usize>,
    pub flags: CandidateFlags,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.declaration.id == other.declaration.id
            && self.tier == other.tier
            && self.substitution == other.substitution
            && self.depth == other.depth
    }
}

impl Eq for Candidate {}

impl Serialize for Candidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Candidate", 5)?;
        state.serialize_field("declaration", &self.declaration.id)?;
        state.serialize_field("name", &self.declaration.name)?;
        state.serialize_field("tier", &self.tier)?;
        state.serialize_field("substitution", &self.substitution)?;
        state.serialize_field("depth", &self.depth)?;
        state.end()
    }
}

impl Candidate {
    /// Orders candidates independently of discovery order: tier, then
    /// depth, then receiver index, then declaration id.
    fn deterministic_key(&self) -> (Applicability, usize, usize, prism_store::DeclarationId) {
        (self.tier, self.depth, self.receiver_index.unwrap_or(0), self.declaration.id)
    }
}

/// The verdict of applicability classification for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Judgement {
    Applicable { tier: Applicability, substitution: Substitution },
    /// The candidate exists but does not accept the given receiver.
    WrongReceiver,
    /// The candidate is not visible from the use site.
    Invisible,
    /// The candidate's constraints cannot be satisfied.
    Contradiction,
}

/// The seam to argument/type checking, which is out of scope here: a judge
/// classifies a candidate against the use site without performing full
/// inference.
pub trait ApplicabilityJudge: Send + Sync {
    fn judge(&self, declaration: &Declaration, receiver: Option<&TypeRef>) -> Judgement;
}

/// Classifies every candidate as an exact match. The default when no type
/// checker is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactJudge;

impl ApplicabilityJudge for ExactJudge {
    fn judge(&self, _declaration: &Declaration, _receiver: Option<&TypeRef>) -> Judgement {
        Judgement::Applicable { tier: Applicability::Exact, substitution: Substitution::new() }
    }
}

/// True when `a` strictly dominates `b`: `a` is visible while `b` is
/// hidden, or both are equally hidden and `a`'s declaring scope is strictly
/// innermost relative to `b`'s. Hiddenness is checked first so the relation
/// stays a strict partial order even when a hidden candidate sits inside a
/// visible one.
fn dominates(a: &Candidate, b: &Candidate) -> bool {
    if a.flags.hidden != b.flags.hidden {
        return !a.flags.hidden;
    }
    a.depth < b.depth
}

fn sorted(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| a.deterministic_key().cmp(&b.deterministic_key()));
    candidates
}

/// Ranks `candidates` into one best result or a structured failure.
///
/// The outcome depends only on the candidate set, never on the order the
/// candidates were discovered in.
pub fn select_best(
    name: &str,
    is_operator: bool,
    candidates: Vec<Candidate>,
) -> Result<Candidate, Diagnostic> {
    if candidates.is_empty() {
        return Err(Diagnostic::UnresolvedReference { name: name.to_string() });
    }

    // Receiver rejection is reported only when nothing accepts the receiver.
    let (rejected, accepted): (Vec<_>, Vec<_>) =
        candidates.into_iter().partition(|c| c.flags.wrong_receiver);
    if accepted.is_empty() {
        return Err(Diagnostic::WrongReceiver { candidates: sorted(rejected) });
    }

    let (invisible, visible): (Vec<_>, Vec<_>) =
        accepted.into_iter().partition(|c| c.flags.invisible);
    if visible.is_empty() {
        let first = sorted(invisible).remove(0);
        return Err(Diagnostic::VisibilityError { symbol: first.declaration.id });
    }

    let best_tier = visible.iter().map(|c| c.tier).min().expect("non-empty");
    let in_best_tier: Vec<Candidate> =
        visible.into_iter().filter(|c| c.tier == best_tier).collect();

    if best_tier == Applicability::Inapplicable {
        let first = sorted(in_best_tier).remove(0);
        return Err(Diagnostic::Inapplicable { tier: best_tier, candidate: Box::new(first) });
    }

    // Drop strictly dominated candidates within the best tier.
    let surviving: Vec<Candidate> = in_best_tier
        .iter()
        .filter(|b| !in_best_tier.iter().any(|a| !std::ptr::eq(*b, a) && dominates(a, b)))
        .cloned()
        .collect();

    let mut surviving = sorted(surviving);
    if surviving.len() == 1 {
        let winner = surviving.remove(0);
        if winner.flags.hidden {
            return Err(Diagnostic::HiddenCandidate { candidate: Box::new(winner) });
        }
        if winner.flags.contradiction {
            return Err(Diagnostic::ConstraintContradiction { candidate: Box::new(winner) });
        }
        return Ok(winner);
    }

    if surviving.iter().all(|c| c.flags.hidden) {
        let first = surviving.remove(0);
        return Err(Diagnostic::HiddenCandidate { candidate: Box::new(first) });
    }

    if is_operator {
        Err(Diagnostic::OperatorAmbiguity { candidates: surviving })
    } else {
        Err(Diagnostic::Ambiguity {
            name: name.to_string(),
            tier: best_tier,
            candidates: surviving,
        })
    }
}
