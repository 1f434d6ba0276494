//! Snapshot tests for diagnostic rendering.
//!
//! Declaration ids are process-global, so the snapshots stick to variants
//! whose messages do not embed ids.

use expect_test::expect;
use prism_resolve::{Applicability, Candidate, CandidateFlags, Diagnostic, Substitution};
use prism_store::{callable, ModuleId, TypeRef};
use std::sync::Arc;

fn candidate(name: &str, depth: usize) -> Candidate {
    Candidate {
        declaration: Arc::new(callable(name, vec![], TypeRef::Error, ModuleId(0))),
        tier: Applicability::Exact,
        substitution: Substitution::new(),
        depth,
        receiver_index: None,
        flags: CandidateFlags::default(),
    }
}

#[test]
fn unresolved_reference_message() {
    let diag = Diagnostic::UnresolvedReference { name: "frobnicate".into() };
    expect!["Unresolved reference: `frobnicate`"].assert_eq(&diag.to_string());
}

#[test]
fn qualifier_message_joins_parts() {
    let diag = Diagnostic::UnresolvedTypeQualifier {
        parts: vec!["core".into(), "collections".into(), "Lost".into()],
    };
    expect!["Unresolved qualifier: `core.collections.Lost`"].assert_eq(&diag.to_string());
}

#[test]
fn ambiguity_message_counts_candidates() {
    let diag = Diagnostic::Ambiguity {
        name: "measure".into(),
        tier: Applicability::Exact,
        candidates: vec![candidate("measure", 0), candidate("measure", 0)],
    };
    expect!["Ambiguous reference: `measure` has 2 equally applicable candidates"]
        .assert_eq(&diag.to_string());
}

#[test]
fn wrong_receiver_message_counts_rejections() {
    let diag = Diagnostic::WrongReceiver { candidates: vec![candidate("poke", 1)] };
    expect!["No candidate accepts the receiver (1 rejected)"].assert_eq(&diag.to_string());
}

#[test]
fn hidden_candidate_message_names_the_declaration() {
    let diag = Diagnostic::HiddenCandidate { candidate: Box::new(candidate("legacyRun", 0)) };
    expect!["`legacyRun` is hidden and cannot be used here"].assert_eq(&diag.to_string());
}

#[test]
fn inapplicable_message_names_the_declaration() {
    let diag = Diagnostic::Inapplicable {
        tier: Applicability::Inapplicable,
        candidate: Box::new(candidate("apply", 0)),
    };
    expect!["`apply` is not applicable here"].assert_eq(&diag.to_string());
}
