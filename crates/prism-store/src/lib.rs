//! Declaration model and loading contract for the prism frontend.
//!
//! This crate owns the immutable [`Declaration`] data model, the identity
//! types resolution is keyed by, and the [`DeclarationStore`] contract
//! through which compiled-unit decoding is reached. The resolution engine
//! itself lives in `prism-resolve`.

pub mod decl;
pub mod store;
pub mod symbol;

pub use decl::{
    callable, value, CallableDetails, ClassDetails, Declaration, DeclarationKind, TypeRef,
    ValueDetails, Visibility,
};
pub use store::{DeclarationStore, InMemoryStore, MemoizedStore};
pub use symbol::{ClassId, DeclarationId, FacadeId, FqName, ModuleId, PackageName, Symbol};
