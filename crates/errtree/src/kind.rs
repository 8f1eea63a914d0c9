// SPDX-License-Identifier: MIT OR Apache-2.0
//! Kind declarations.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use errtree_config::KindEntry;

/// Builds a message suffix from an error's original cause.
pub type SuffixBuilder = Arc<dyn Fn(&(dyn Error + Send + Sync + 'static)) -> String + Send + Sync>;

/// A declared error kind, optionally with a cause-suffix builder.
///
/// ```
/// use errtree::KindDeclaration;
///
/// let kind = KindDeclaration::new("NetworkError")
///     .with_suffix(|cause| format!(" (caused by: {cause})"));
/// assert!(kind.has_suffix());
/// ```
#[derive(Clone)]
pub struct KindDeclaration {
    kind: String,
    suffix: Option<SuffixBuilder>,
}

impl KindDeclaration {
    /// Declare a kind with no suffix builder.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            suffix: None,
        }
    }

    /// Attach a suffix builder, replacing any previous one.
    #[must_use]
    pub fn with_suffix<F>(mut self, builder: F) -> Self
    where
        F: Fn(&(dyn Error + Send + Sync + 'static)) -> String + Send + Sync + 'static,
    {
        self.suffix = Some(Arc::new(builder));
        self
    }

    /// The kind label.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether a suffix builder is declared.
    pub fn has_suffix(&self) -> bool {
        self.suffix.is_some()
    }

    /// The declared suffix builder.
    pub fn suffix(&self) -> Option<&SuffixBuilder> {
        self.suffix.as_ref()
    }
}

impl From<&str> for KindDeclaration {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for KindDeclaration {
    fn from(kind: String) -> Self {
        Self::new(kind)
    }
}

impl From<&KindEntry> for KindDeclaration {
    fn from(entry: &KindEntry) -> Self {
        let decl = Self::new(entry.kind.clone());
        match entry.cause_suffix.clone() {
            Some(template) => decl.with_suffix(move |cause| {
                errtree_config::render_cause_suffix(&template, &cause.to_string())
            }),
            None => decl,
        }
    }
}

impl fmt::Debug for KindDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindDeclaration")
            .field("kind", &self.kind)
            .field("has_suffix", &self.has_suffix())
            .finish()
    }
}
