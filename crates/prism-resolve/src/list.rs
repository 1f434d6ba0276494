//! A persistent singly linked list with structural sharing.
//!
//! The tower context needs an append-only sequence whose every extension is
//! a new value sharing the old spine, so a snapshot is O(1) instead of a
//! deep copy. Head is the most recently pushed element.

use std::sync::Arc;

#[derive(Debug)]
struct Node<T> {
    value: T,
    next: PersistentList<T>,
}

/// An immutable cons list. Cloning is O(1) and shares structure.
#[derive(Debug)]
pub struct PersistentList<T> {
    head: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> Clone for PersistentList<T> {
    fn clone(&self) -> Self {
        PersistentList { head: self.head.clone(), len: self.len }
    }
}

impl<T> Default for PersistentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PersistentList<T> {
    pub fn new() -> Self {
        PersistentList { head: None, len: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns a new list with `value` at the head; `self` is untouched.
    pub fn push(&self, value: T) -> Self {
        PersistentList {
            head: Some(Arc::new(Node { value, next: self.clone() })),
            len: self.len + 1,
        }
    }

    /// The most recently pushed element.
    pub fn head(&self) -> Option<&T> {
        self.head.as_deref().map(|node| &node.value)
    }

    /// Iterates head first, i.e. most recently pushed first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { node: self.head.as_deref() }
    }
}

impl<T: Clone> PersistentList<T> {
    /// Returns a new list where the first element (head first) matching
    /// `predicate` is replaced by `replacement`. The suffix beyond the
    /// replaced element is shared; the prefix is rebuilt. Returns `None`
    /// when nothing matches.
    pub fn replace_first(
        &self,
        predicate: impl Fn(&T) -> bool,
        replacement: T,
    ) -> Option<Self> {
        let mut prefix = Vec::new();
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            if predicate(&node.value) {
                let mut rebuilt = node.next.push(replacement);
                for value in prefix.into_iter().rev() {
                    rebuilt = rebuilt.push(value);
                }
                return Some(rebuilt);
            }
            prefix.push(node.value.clone());
            cursor = node.next.head.as_deref();
        }
        None
    }

    /// Rebuilds the list by mapping every element. Used when a fork must
    /// own its per-element state while keeping order.
    pub fn map(&self, f: impl Fn(&T) -> T) -> Self {
        let values: Vec<T> = self.iter().map(f).collect();
        let mut rebuilt = PersistentList::new();
        for value in values.into_iter().rev() {
            rebuilt = rebuilt.push(value);
        }
        rebuilt
    }
}

pub struct Iter<'a, T> {
    node: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.node?;
        self.node = node.next.head.as_deref();
        Some(&node.value)
    }
}

impl<'a, T> IntoIterator for &'a PersistentList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
