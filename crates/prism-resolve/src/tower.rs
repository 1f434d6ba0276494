//! The tower context: every scope and implicit receiver visible at a
//! program point, innermost first.
//!
//! A [`TowerContext`] is an immutable value. Every operation returns a new
//! context sharing the old spine, so entering and leaving nested scopes is
//! cheap and a context captured for speculative resolution needs no
//! save/restore bookkeeping: the fork is simply dropped.

use crate::list::PersistentList;
use crate::provider::SymbolProviderGraph;
use crate::scope::{member_scope_for, LocalScope, NameScope, ScopeId};
use once_cell::sync::OnceCell;
use prism_store::{Declaration, TypeRef};
use std::sync::Arc;

/// A value available for unqualified dispatch at a program point.
#[derive(Debug, Clone)]
pub struct ImplicitReceiver {
    type_ref: TypeRef,
    label: Option<String>,
    /// Stable declaration-order index. Used only as a tie-break between
    /// otherwise equal candidates, never as a priority signal.
    order_index: usize,
    /// Lazily computed member scope. Cloning an element (snapshotting)
    /// copies the cached value, so a fork owns its cursor.
    member_scope: OnceCell<NameScope>,
}

impl ImplicitReceiver {
    fn new(type_ref: TypeRef, label: Option<String>, order_index: usize) -> Self {
        ImplicitReceiver { type_ref, label, order_index, member_scope: OnceCell::new() }
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn order_index(&self) -> usize {
        self.order_index
    }

    /// The member scope reachable from this receiver's type, memoized on
    /// first use. An error/placeholder type yields an empty scope.
    pub fn member_scope(&self, graph: &SymbolProviderGraph) -> &NameScope {
        self.member_scope.get_or_init(|| member_scope_for(&self.type_ref, graph))
    }
}

/// The scope payload of a tower element.
#[derive(Debug, Clone)]
pub enum ElementScope {
    NonLocal(NameScope),
    Local(LocalScope),
}

impl ElementScope {
    pub fn lookup(&self, name: &str) -> &[Arc<Declaration>] {
        match self {
            ElementScope::NonLocal(scope) => scope.lookup(name),
            ElementScope::Local(scope) => scope.lookup(name),
        }
    }
}

/// One rung of the tower: exactly one of a scope, an implicit receiver, or a
/// group of context receivers introduced together at one declaration site.
#[derive(Debug, Clone)]
pub enum TowerElementKind {
    Scope(ElementScope),
    Receiver(ImplicitReceiver),
    ContextReceiverGroup(Vec<ImplicitReceiver>),
}

#[derive(Debug, Clone)]
pub struct TowerElement {
    pub kind: TowerElementKind,
    pub is_local: bool,
}

impl TowerElement {
    fn non_local_scope(scope: NameScope) -> Self {
        TowerElement { kind: TowerElementKind::Scope(ElementScope::NonLocal(scope)), is_local: false }
    }

    fn local_scope(scope: LocalScope) -> Self {
        TowerElement { kind: TowerElementKind::Scope(ElementScope::Local(scope)), is_local: true }
    }

    fn receiver(receiver: ImplicitReceiver) -> Self {
        TowerElement { kind: TowerElementKind::Receiver(receiver), is_local: false }
    }

    fn context_receiver_group(group: Vec<ImplicitReceiver>) -> Self {
        TowerElement { kind: TowerElementKind::ContextReceiverGroup(group), is_local: false }
    }

    fn local_scope_id(&self) -> Option<ScopeId> {
        match &self.kind {
            TowerElementKind::Scope(ElementScope::Local(scope)) => Some(scope.id()),
            _ => None,
        }
    }
}

/// Tower data collected for a class body entry, mirroring the order in
/// which the elements become visible.
pub struct ClassTowerElements {
    /// Superclass statics and companion receivers, outermost first: the
    /// farthest superclass's elements come first so the closest superclass
    /// ends up innermost. Within one superclass the companion receiver is
    /// outside its static scope.
    pub super_elements: Vec<TowerElement>,
    /// The class's own companion receiver type, if it declares a companion.
    pub companion_type: Option<TypeRef>,
    /// The static scope of the companion, if the companion has statics.
    pub companion_static_scope: Option<NameScope>,
    /// The class's own static scope, if it has static members.
    pub static_scope: Option<NameScope>,
    /// The type of `this` inside the class body.
    pub this_type: TypeRef,
    /// The label for the `this` receiver.
    pub label: Option<String>,
}

/// Collects the tower elements contributed by entering `class`'s body.
///
/// `superclasses` on the class details is the linearized inheritance chain,
/// closest first. A superclass the graph cannot load contributes nothing.
pub fn collect_tower_elements_for_class(
    class: &Declaration,
    graph: &SymbolProviderGraph,
) -> ClassTowerElements {
    let details = class
        .class_details()
        .expect("collect_tower_elements_for_class requires a class declaration");

    let mut super_elements = Vec::new();
    // Farthest superclass first, so the closest ends innermost.
    for super_id in details.superclasses.iter().rev() {
        let super_class = match graph.lookup_class(super_id) {
            Some(class) => class,
            None => continue,
        };
        let super_details = match super_class.class_details() {
            Some(details) => details,
            None => continue,
        };
        if let Some(companion) = &super_details.companion {
            super_elements.push(TowerElement::receiver(ImplicitReceiver::new(
                TypeRef::Class(companion.clone()),
                None,
                0, // re-indexed when the batch is added to a context
            )));
        }
        if !super_details.statics.is_empty() {
            super_elements.push(TowerElement::non_local_scope(NameScope::from_declarations(
                super_details.statics.iter().cloned(),
            )));
        }
    }

    let static_scope = if details.statics.is_empty() {
        None
    } else {
        Some(NameScope::from_declarations(details.statics.iter().cloned()))
    };

    let companion_static_scope = details
        .companion
        .as_ref()
        .and_then(|companion| graph.lookup_class(companion))
        .and_then(|companion| {
            let statics = &companion.class_details()?.statics;
            if statics.is_empty() {
                None
            } else {
                Some(NameScope::from_declarations(statics.iter().cloned()))
            }
        });

    ClassTowerElements {
        super_elements,
        companion_type: details.companion.clone().map(TypeRef::Class),
        companion_static_scope,
        static_scope,
        this_type: details.self_type(),
        label: Some(class.name.clone()),
    }
}

/// The persistent ordered list of tower elements visible at a program
/// point, innermost first, plus the derived local-scope bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct TowerContext {
    /// Head is the innermost element.
    elements: PersistentList<TowerElement>,
    /// Identities of local scopes, most recent first.
    local_scope_ids: PersistentList<ScopeId>,
}

impl TowerContext {
    pub fn new() -> Self {
        TowerContext::default()
    }

    /// Elements innermost first.
    pub fn elements(&self) -> impl Iterator<Item = &TowerElement> {
        self.elements.iter()
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    /// The derived receiver stack, innermost first. Context receiver groups
    /// contribute their members in declaration order.
    pub fn implicit_receiver_stack(&self) -> Vec<&ImplicitReceiver> {
        let mut stack = Vec::new();
        for element in self.elements.iter() {
            match &element.kind {
                TowerElementKind::Receiver(receiver) => stack.push(receiver),
                TowerElementKind::ContextReceiverGroup(group) => stack.extend(group.iter()),
                TowerElementKind::Scope(_) => {}
            }
        }
        stack
    }

    /// Identities of the local scopes in this context, most recent first.
    pub fn local_scope_ids(&self) -> impl Iterator<Item = &ScopeId> {
        self.local_scope_ids.iter()
    }

    /// Appends one non-local scope as the new innermost element.
    pub fn add_non_local_scope(&self, scope: NameScope) -> Self {
        TowerContext {
            elements: self.elements.push(TowerElement::non_local_scope(scope)),
            local_scope_ids: self.local_scope_ids.clone(),
        }
    }

    /// Appends up to two non-local scopes; `None`s are skipped. The second
    /// scope ends up innermost, matching the order the arguments are named.
    pub fn add_non_local_scopes_if_not_null(
        &self,
        outer: Option<NameScope>,
        inner: Option<NameScope>,
    ) -> Self {
        let mut next = self.clone();
        if let Some(scope) = outer {
            next = next.add_non_local_scope(scope);
        }
        if let Some(scope) = inner {
            next = next.add_non_local_scope(scope);
        }
        next
    }

    /// Appends a batch of non-local elements given outermost first; the last
    /// element of the batch becomes the innermost of the new context.
    ///
    /// Receiver elements are re-indexed to their final context position, the
    /// same way [`add_receiver`](TowerContext::add_receiver) derives an
    /// index, so every receiver in the context has a distinct tie-break.
    pub fn add_non_local_elements(&self, elements: Vec<TowerElement>) -> Self {
        let mut list = self.elements.clone();
        for element in elements {
            let is_local = element.is_local;
            debug_assert!(!is_local, "non-local batch must not contain local scopes");
            let element = match element.kind {
                TowerElementKind::Receiver(receiver) => TowerElement::receiver(
                    ImplicitReceiver::new(receiver.type_ref, receiver.label, list.len()),
                ),
                kind => TowerElement { kind, is_local },
            };
            list = list.push(element);
        }
        TowerContext { elements: list, local_scope_ids: self.local_scope_ids.clone() }
    }

    /// Appends a fresh local scope and records it as the last local scope.
    pub fn add_local_scope(&self, scope: LocalScope) -> Self {
        let id = scope.id();
        TowerContext {
            elements: self.elements.push(TowerElement::local_scope(scope)),
            local_scope_ids: self.local_scope_ids.push(id),
        }
    }

    /// Replaces the current last local scope, identified by its [`ScopeId`],
    /// with `scope`. This models a single block incrementally gaining
    /// declarations; it is distinct from [`add_local_scope`], which opens a
    /// nested block with a new identity.
    ///
    /// # Panics
    ///
    /// Panics if there is no local scope in the context or if `scope` does
    /// not carry the identity of the current last local scope. Both are
    /// caller bugs.
    ///
    /// [`add_local_scope`]: TowerContext::add_local_scope
    pub fn set_last_local_scope(&self, scope: LocalScope) -> Self {
        let last_id = *self
            .local_scope_ids
            .head()
            .expect("set_last_local_scope called on a context with no local scope");
        assert_eq!(
            scope.id(),
            last_id,
            "set_last_local_scope must be given an extension of the current last local scope"
        );
        let elements = self
            .elements
            .replace_first(
                |element| element.local_scope_id() == Some(last_id),
                TowerElement::local_scope(scope),
            )
            .expect("last local scope id is tracked but its element is missing");
        TowerContext { elements, local_scope_ids: self.local_scope_ids.clone() }
    }

    /// Appends an implicit receiver and extends the receiver stack.
    pub fn add_receiver(&self, label: Option<String>, type_ref: TypeRef) -> Self {
        let receiver = ImplicitReceiver::new(type_ref, label, self.elements.len());
        TowerContext {
            elements: self.elements.push(TowerElement::receiver(receiver)),
            local_scope_ids: self.local_scope_ids.clone(),
        }
    }

    /// Appends one grouped element holding every context receiver declared
    /// at a single site. Each member gets a stable declaration-order index.
    pub fn add_context_receiver_group(&self, types: Vec<(TypeRef, Option<String>)>) -> Self {
        let base = self.elements.len();
        let group = types
            .into_iter()
            .enumerate()
            .map(|(i, (type_ref, label))| ImplicitReceiver::new(type_ref, label, base + i))
            .collect();
        TowerContext {
            elements: self.elements.push(TowerElement::context_receiver_group(group)),
            local_scope_ids: self.local_scope_ids.clone(),
        }
    }

    /// Forks this context for speculative resolution.
    ///
    /// The element order and scope identities are preserved, but every
    /// per-element memoization cell is copied, so whatever the fork computes
    /// or caches never leaks back into the original. Discarding the fork is
    /// dropping the value.
    pub fn create_snapshot(&self) -> Self {
        TowerContext {
            elements: self.elements.map(Clone::clone),
            local_scope_ids: self.local_scope_ids.clone(),
        }
    }

    /// Extends this context with everything entering `class`'s body makes
    /// visible: superclass statics and companion receivers (closest
    /// superclass innermost), the class's own companion receiver, its static
    /// scope, the `this` receiver, and finally its context receivers.
    ///
    /// Companions of enclosing classes are already present in the context
    /// this is called on, since class bodies are entered outside-in.
    pub fn with_scopes_for_class(
        &self,
        class: &Declaration,
        context_receivers: Vec<(TypeRef, Option<String>)>,
        graph: &SymbolProviderGraph,
    ) -> Self {
        let elements = collect_tower_elements_for_class(class, graph);

        let base = self.add_non_local_elements(elements.super_elements);

        let statics_and_companion = match elements.companion_type {
            None => base
                .add_non_local_scopes_if_not_null(elements.companion_static_scope, elements.static_scope),
            Some(companion) => base
                .add_receiver(None, companion)
                .add_non_local_scopes_if_not_null(elements.companion_static_scope, elements.static_scope),
        };

        let mut result = statics_and_companion.add_receiver(elements.label, elements.this_type);
        if !context_receivers.is_empty() {
            result = result.add_context_receiver_group(context_receivers);
        }
        result
    }
}
