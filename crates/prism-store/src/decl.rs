//! The declaration data model.
//!
//! Declarations are created when a module is loaded and never mutated
//! afterwards; everything downstream shares them as `Arc<Declaration>`.

use crate::symbol::{ClassId, DeclarationId, FacadeId, ModuleId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A reference to a type, as far as resolution needs to see one.
///
/// `Error` stands in for any malformed or not-yet-inferred type. Receiver
/// scope computation over an `Error` type degrades to an empty scope instead
/// of propagating failure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Class(ClassId),
    Error,
}

impl TypeRef {
    pub fn class_id(&self) -> Option<&ClassId> {
        match self {
            TypeRef::Class(id) => Some(id),
            TypeRef::Error => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeRef::Error)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Class(id) => write!(f, "{id}"),
            TypeRef::Error => f.write_str("<error>"),
        }
    }
}

/// Declared visibility of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

/// Details carried by a class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDetails {
    /// The class's own identity.
    pub class_id: ClassId,
    /// Instance members, in declaration order.
    pub members: Vec<Arc<Declaration>>,
    /// Static members, in declaration order.
    pub statics: Vec<Arc<Declaration>>,
    /// Companion object class, if the class declares one.
    pub companion: Option<ClassId>,
    /// Superclasses in inheritance order, closest first.
    pub superclasses: Vec<ClassId>,
}

impl ClassDetails {
    /// The type a value of this class has.
    pub fn self_type(&self) -> TypeRef {
        TypeRef::Class(self.class_id.clone())
    }
}

/// Details carried by a callable (function-like) declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableDetails {
    pub parameter_types: Vec<TypeRef>,
    pub return_type: TypeRef,
    /// Whether this callable follows an operator naming convention and is
    /// eligible for implicit operator dispatch.
    pub is_operator: bool,
}

/// Details carried by a value (variable/property-like) declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDetails {
    pub value_type: TypeRef,
}

/// What a declaration is. Exactly one of the variants, never a bag of
/// nullable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    Class(ClassDetails),
    Callable(CallableDetails),
    Value(ValueDetails),
}

impl DeclarationKind {
    pub fn is_callable(&self) -> bool {
        matches!(self, DeclarationKind::Callable(_))
    }
}

/// A named, typed entity produced by compiling or loading a module.
///
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub id: DeclarationId,
    pub name: String,
    pub kind: DeclarationKind,
    /// The module that owns this declaration.
    pub module: ModuleId,
    /// The facade of the compiled unit this declaration came from, if it was
    /// loaded from a compiled (possibly multi-part) unit.
    pub facade: Option<FacadeId>,
    pub visibility: Visibility,
    /// Deprecated-hidden or otherwise suppressed from normal resolution.
    pub hidden: bool,
}

impl Declaration {
    /// Convenience constructor for a plain public declaration.
    pub fn new(name: impl Into<String>, kind: DeclarationKind, module: ModuleId) -> Self {
        Declaration {
            id: DeclarationId::fresh(),
            name: name.into(),
            kind,
            module,
            facade: None,
            visibility: Visibility::Public,
            hidden: false,
        }
    }

    pub fn with_facade(mut self, facade: FacadeId) -> Self {
        self.facade = Some(facade);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Marks a callable as following an operator convention. No effect on
    /// other kinds.
    pub fn as_operator(mut self) -> Self {
        if let DeclarationKind::Callable(details) = &mut self.kind {
            details.is_operator = true;
        }
        self
    }

    pub fn is_operator(&self) -> bool {
        matches!(&self.kind, DeclarationKind::Callable(details) if details.is_operator)
    }

    /// The type of a use of this declaration, where that makes sense.
    pub fn value_type(&self) -> Option<&TypeRef> {
        match &self.kind {
            DeclarationKind::Value(v) => Some(&v.value_type),
            DeclarationKind::Callable(c) => Some(&c.return_type),
            DeclarationKind::Class(_) => None,
        }
    }

    pub fn class_details(&self) -> Option<&ClassDetails> {
        match &self.kind {
            DeclarationKind::Class(details) => Some(details),
            _ => None,
        }
    }
}

/// Builds a value declaration of the given type.
pub fn value(name: impl Into<String>, value_type: TypeRef, module: ModuleId) -> Declaration {
    Declaration::new(name, DeclarationKind::Value(ValueDetails { value_type }), module)
}

/// Builds a callable declaration with the given signature.
pub fn callable(
    name: impl Into<String>,
    parameter_types: Vec<TypeRef>,
    return_type: TypeRef,
    module: ModuleId,
) -> Declaration {
    Declaration::new(
        name,
        DeclarationKind::Callable(CallableDetails { parameter_types, return_type, is_operator: false }),
        module,
    )
}
