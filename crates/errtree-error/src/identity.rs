// SPDX-License-Identifier: MIT OR Apache-2.0
//! Kind identities.
//!
//! An [`Identity`] stands in for "this kind, raised under this root context,
//! by this taxonomy". Equality never crosses taxonomies: each
//! [`TaxonomyToken`] compares by allocation, so two taxonomies built from the
//! same declarations still yield unequal identities.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Label carried by errors whose requested kind was never declared.
pub const UNKNOWN_KIND_LABEL: &str = "UnknownError";

// ---------------------------------------------------------------------------
// TaxonomyToken
// ---------------------------------------------------------------------------

struct TokenInner;

/// Opaque marker minted once per taxonomy.
#[derive(Clone)]
pub struct TaxonomyToken(Arc<TokenInner>);

impl TaxonomyToken {
    /// Mint a fresh token, distinct from every other live token.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(TokenInner))
    }
}

impl Default for TaxonomyToken {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TaxonomyToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TaxonomyToken {}

impl Hash for TaxonomyToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for TaxonomyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaxonomyToken({:p})", Arc::as_ptr(&self.0))
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Which declaration an identity resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindSlot {
    /// Index of the winning declaration in the taxonomy's kind list.
    Declared(usize),
    /// The builtin fallback.
    Unknown,
}

#[derive(Debug)]
struct IdentityInner {
    taxonomy: TaxonomyToken,
    root: Arc<str>,
    slot: KindSlot,
    label: Arc<str>,
}

/// Per-(kind, root context) marker attached to every
/// [`ScopedError`](crate::ScopedError).
#[derive(Clone)]
pub struct Identity(Arc<IdentityInner>);

impl Identity {
    /// Identity for a declared kind.
    pub fn declared(
        taxonomy: &TaxonomyToken,
        root: Arc<str>,
        index: usize,
        label: impl Into<Arc<str>>,
    ) -> Self {
        Self(Arc::new(IdentityInner {
            taxonomy: taxonomy.clone(),
            root,
            slot: KindSlot::Declared(index),
            label: label.into(),
        }))
    }

    /// The fallback identity for `root`.
    pub fn unknown(taxonomy: &TaxonomyToken, root: Arc<str>) -> Self {
        Self(Arc::new(IdentityInner {
            taxonomy: taxonomy.clone(),
            root,
            slot: KindSlot::Unknown,
            label: Arc::from(UNKNOWN_KIND_LABEL),
        }))
    }

    /// Display name of the kind (`"UnknownError"` for the fallback).
    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Name of the root context this identity is scoped to.
    pub fn root(&self) -> &str {
        &self.0.root
    }

    /// Declared slot or [`KindSlot::Unknown`].
    pub fn slot(&self) -> KindSlot {
        self.0.slot
    }

    /// Whether this is the fallback identity.
    pub fn is_unknown(&self) -> bool {
        self.0.slot == KindSlot::Unknown
    }

    /// Token of the taxonomy that minted this identity.
    pub fn taxonomy(&self) -> &TaxonomyToken {
        &self.0.taxonomy
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.slot == other.0.slot
                && self.0.taxonomy == other.0.taxonomy
                && self.0.root == other.0.root)
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.taxonomy.hash(state);
        self.0.root.hash(state);
        self.0.slot.hash(state);
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("label", &self.0.label)
            .field("root", &self.0.root)
            .field("slot", &self.0.slot)
            .finish()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn root(name: &str) -> Arc<str> {
        Arc::from(name)
    }

    #[test]
    fn tokens_compare_by_allocation() {
        let a = TaxonomyToken::new();
        let b = TaxonomyToken::new();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn same_slot_same_root_same_taxonomy_is_equal() {
        let t = TaxonomyToken::new();
        let x = Identity::declared(&t, root("Ctx"), 0, "ValidationError");
        let y = Identity::declared(&t, root("Ctx"), 0, "ValidationError");
        assert_eq!(x, y);
        let set: HashSet<_> = [x, y].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn different_root_is_distinct() {
        let t = TaxonomyToken::new();
        let x = Identity::declared(&t, root("A"), 0, "ValidationError");
        let y = Identity::declared(&t, root("B"), 0, "ValidationError");
        assert_ne!(x, y);
    }

    #[test]
    fn different_taxonomy_is_distinct() {
        let x = Identity::declared(&TaxonomyToken::new(), root("A"), 0, "K");
        let y = Identity::declared(&TaxonomyToken::new(), root("A"), 0, "K");
        assert_ne!(x, y);
    }

    #[test]
    fn unknown_differs_from_declared_with_same_label() {
        let t = TaxonomyToken::new();
        let declared = Identity::declared(&t, root("A"), 0, UNKNOWN_KIND_LABEL);
        let unknown = Identity::unknown(&t, root("A"));
        assert_eq!(declared.label(), unknown.label());
        assert_ne!(declared, unknown);
        assert!(unknown.is_unknown());
        assert!(!declared.is_unknown());
    }

    #[test]
    fn display_is_label() {
        let t = TaxonomyToken::new();
        assert_eq!(Identity::unknown(&t, root("A")).to_string(), "UnknownError");
    }
}
