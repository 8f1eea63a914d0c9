// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable context tree nodes.

use std::fmt;
use std::sync::Arc;

use errtree_error::{Identity, Metadata};

use crate::feature::FeatureHandle;
use crate::taxonomy::RootState;

/// Separator between path segments.
pub const PATH_SEPARATOR: &str = "/";

/// A node in a context tree.
///
/// Each node holds its own copy of the accumulated path and metadata, so a
/// node never observes changes made through its children or siblings. Names
/// are taken verbatim: empty names and names containing `/` are not escaped.
#[derive(Clone)]
pub struct ContextNode {
    root: Arc<RootState>,
    segments: Arc<[String]>,
    path: Arc<str>,
    metadata: Arc<Metadata>,
}

impl ContextNode {
    pub(crate) fn root(root: Arc<RootState>, name: String, metadata: Metadata) -> Self {
        Self {
            root,
            path: Arc::from(name.as_str()),
            segments: Arc::from(vec![name]),
            metadata: Arc::new(metadata),
        }
    }

    /// Spawn a child context with no metadata of its own.
    pub fn subcontext(&self, name: impl Into<String>) -> ContextNode {
        self.subcontext_with(name, Metadata::new())
    }

    /// Spawn a child context; `metadata` is applied over this node's.
    pub fn subcontext_with(&self, name: impl Into<String>, metadata: Metadata) -> ContextNode {
        let name: String = name.into();
        let path = format!("{}{PATH_SEPARATOR}{name}", self.path);
        let mut segments = self.segments.to_vec();
        segments.push(name);
        ContextNode {
            root: Arc::clone(&self.root),
            segments: Arc::from(segments),
            path: Arc::from(path),
            metadata: Arc::new(self.metadata.merged(&metadata)),
        }
    }

    /// Spawn a feature with no metadata of its own.
    pub fn feature(&self, name: impl Into<String>) -> FeatureHandle {
        self.feature_with(name, Metadata::new())
    }

    /// Spawn a feature; `metadata` is applied over this node's.
    pub fn feature_with(&self, name: impl Into<String>, metadata: Metadata) -> FeatureHandle {
        let name: String = name.into();
        FeatureHandle::new(
            Arc::clone(&self.root),
            Arc::clone(&self.path),
            Arc::from(name),
            Arc::new(self.metadata.merged(&metadata)),
        )
    }

    /// `/`-joined path, root first.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Nesting depth; the root context is depth 0.
    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    /// Accumulated metadata of this node.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Name of the root context this node descends from.
    pub fn root_name(&self) -> &str {
        &self.root.name
    }

    /// Identity errors of `kind` will carry under this root. Undeclared kinds
    /// yield the unknown identity.
    pub fn identity(&self, kind: &str) -> &Identity {
        self.root.resolve(kind).0
    }

    /// The fallback identity for this root.
    pub fn unknown_identity(&self) -> &Identity {
        &self.root.unknown
    }

    #[cfg(test)]
    pub(crate) fn root_state(&self) -> &RootState {
        &self.root
    }
}

impl fmt::Debug for ContextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextNode")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .finish()
    }
}
