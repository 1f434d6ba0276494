//! Identity types shared by the declaration store and the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A process-unique identifier for anything the frontend needs to tell apart.
///
/// `Symbol`s are never reused within a process; `fresh()` hands out strictly
/// increasing values from an atomic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub u64);

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(0);

impl Symbol {
    /// Returns a symbol that has never been returned before in this process.
    pub fn fresh() -> Self {
        Symbol(NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed))
    }
}

/// A unique identifier for a loaded declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclarationId(pub u64);

static NEXT_DECLARATION: AtomicU64 = AtomicU64::new(0);

impl DeclarationId {
    pub fn fresh() -> Self {
        DeclarationId(NEXT_DECLARATION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unique identifier for a module participating in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

/// The externally visible identity of a compiled unit.
///
/// A unit may be physically split into several parts; all parts share one
/// `FacadeId`. Dedup of dependency symbols is keyed by this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FacadeId(pub u64);

/// A dot-separated package name, e.g. `core.collections`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageName(pub String);

impl PackageName {
    pub fn new(name: impl Into<String>) -> Self {
        PackageName(name.into())
    }

    /// The root (empty) package.
    pub fn root() -> Self {
        PackageName(String::new())
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully qualified, dot-separated name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FqName {
    pub segments: Vec<String>,
}

impl FqName {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FqName { segments: segments.into_iter().map(Into::into).collect() }
    }

    /// Parses a dot-separated string. An empty string is the root name.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return FqName { segments: Vec::new() };
        }
        FqName { segments: text.split('.').map(str::to_string).collect() }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The name without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<FqName> {
        if self.segments.is_empty() {
            return None;
        }
        Some(FqName { segments: self.segments[..self.segments.len() - 1].to_vec() })
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Identifies a class by package and simple name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId {
    pub package: PackageName,
    pub name: String,
}

impl ClassId {
    pub fn new(package: PackageName, name: impl Into<String>) -> Self {
        ClassId { package, name: name.into() }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.0.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}
