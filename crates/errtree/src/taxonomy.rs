// SPDX-License-Identifier: MIT OR Apache-2.0
//! The taxonomy factory and per-root state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use errtree_config::{ConfigError, TaxonomyConfig, validate_config};
use errtree_error::{Identity, Metadata, ReportSink, TaxonomyToken};
use errtree_telemetry::TracingSink;

use crate::context::ContextNode;
use crate::kind::{KindDeclaration, SuffixBuilder};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options supplied when creating a [`Taxonomy`].
#[derive(Clone, Default)]
pub struct TaxonomyOptions {
    on_report: Option<Arc<dyn ReportSink>>,
    base_metadata: Metadata,
}

impl TaxonomyOptions {
    /// Default options: [`TracingSink`] and no base metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that receives every report.
    #[must_use]
    pub fn on_report(mut self, sink: impl ReportSink + 'static) -> Self {
        self.on_report = Some(Arc::new(sink));
        self
    }

    /// Like [`TaxonomyOptions::on_report`] for an already shared sink.
    #[must_use]
    pub fn on_report_arc(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.on_report = Some(sink);
        self
    }

    /// Metadata seeded beneath every root context's own metadata.
    #[must_use]
    pub fn base_metadata(mut self, metadata: Metadata) -> Self {
        self.base_metadata = metadata;
        self
    }
}

impl fmt::Debug for TaxonomyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaxonomyOptions")
            .field("on_report", &self.on_report.as_ref().map(|s| s.name()))
            .field("base_metadata", &self.base_metadata)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

struct Shared {
    token: TaxonomyToken,
    kinds: Vec<KindDeclaration>,
    // kind -> index of its last declaration
    resolved: HashMap<String, usize>,
    sink: Arc<dyn ReportSink>,
    base_metadata: Metadata,
}

/// Builds root contexts for a fixed set of declared kinds.
///
/// Cloning is cheap and clones share identities: the same root name from two
/// clones yields equal identities. Separately created taxonomies never do.
///
/// ```
/// use errtree::{KindDeclaration, Taxonomy, TaxonomyOptions};
///
/// let taxonomy = Taxonomy::new([KindDeclaration::new("ValidationError")], TaxonomyOptions::new());
/// let err = taxonomy
///     .create("Checkout")
///     .subcontext("Cart")
///     .feature("AddItem")
///     .error("ValidationError", "quantity must be positive");
/// assert_eq!(err.name(), "ValidationError");
/// assert_eq!(err.message(), "Checkout/Cart/AddItem: quantity must be positive");
/// ```
#[derive(Clone)]
pub struct Taxonomy {
    shared: Arc<Shared>,
}

/// Free-function form of [`Taxonomy::new`].
pub fn create_taxonomy(
    kinds: impl IntoIterator<Item = KindDeclaration>,
    options: TaxonomyOptions,
) -> Taxonomy {
    Taxonomy::new(kinds, options)
}

impl Taxonomy {
    /// Create a taxonomy. An empty `kinds` list is valid: every error then
    /// resolves to the `UnknownError` kind. When a kind is declared more than
    /// once, the last declaration wins.
    pub fn new(
        kinds: impl IntoIterator<Item = KindDeclaration>,
        options: TaxonomyOptions,
    ) -> Self {
        let kinds: Vec<KindDeclaration> = kinds.into_iter().collect();
        let resolved = kinds
            .iter()
            .enumerate()
            .map(|(idx, k)| (k.kind().to_string(), idx))
            .collect::<HashMap<_, _>>();
        let sink = options
            .on_report
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn ReportSink>);
        tracing::debug!(
            target: "errtree.taxonomy",
            declared = kinds.len(),
            distinct = resolved.len(),
            sink = sink.name(),
            "taxonomy created"
        );
        Self {
            shared: Arc::new(Shared {
                token: TaxonomyToken::new(),
                kinds,
                resolved,
                sink,
                base_metadata: options.base_metadata,
            }),
        }
    }

    /// Build a taxonomy from configuration.
    ///
    /// `sink` defaults to [`TracingSink`]. Validation warnings are logged on
    /// the `errtree.taxonomy` target.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the config is invalid.
    pub fn from_config(
        config: &TaxonomyConfig,
        sink: Option<Arc<dyn ReportSink>>,
    ) -> Result<Self, ConfigError> {
        for warning in validate_config(config)? {
            tracing::warn!(target: "errtree.taxonomy", %warning, "taxonomy config warning");
        }
        let mut options =
            TaxonomyOptions::new().base_metadata(Metadata::from(config.base_metadata.clone()));
        if let Some(sink) = sink {
            options = options.on_report_arc(sink);
        }
        Ok(Self::new(
            config.kinds.iter().map(KindDeclaration::from),
            options,
        ))
    }

    /// Instantiate a root context with no metadata of its own.
    pub fn create(&self, name: impl Into<String>) -> ContextNode {
        self.create_with(name, Metadata::new())
    }

    /// Instantiate a root context. `metadata` is applied over the
    /// taxonomy's base metadata.
    pub fn create_with(&self, name: impl Into<String>, metadata: Metadata) -> ContextNode {
        let name = name.into();
        let root = Arc::new(RootState::new(&self.shared, Arc::from(name.as_str())));
        tracing::debug!(
            target: "errtree.taxonomy",
            root = %name,
            kinds = root.identities.len(),
            "root context created"
        );
        let metadata = self.shared.base_metadata.merged(&metadata);
        ContextNode::root(root, name, metadata)
    }

    /// Declared kinds, in declaration order (duplicates included).
    pub fn kinds(&self) -> &[KindDeclaration] {
        &self.shared.kinds
    }

    /// Base metadata supplied at creation.
    pub fn base_metadata(&self) -> &Metadata {
        &self.shared.base_metadata
    }

    /// The configured sink.
    pub fn sink(&self) -> &Arc<dyn ReportSink> {
        &self.shared.sink
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new([], TaxonomyOptions::default())
    }
}

impl fmt::Debug for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Taxonomy")
            .field("token", &self.shared.token)
            .field("kinds", &self.shared.kinds)
            .field("sink", &self.shared.sink.name())
            .field("base_metadata", &self.shared.base_metadata)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RootState
// ---------------------------------------------------------------------------

pub(crate) struct ResolvedKind {
    pub(crate) identity: Identity,
    pub(crate) suffix: Option<SuffixBuilder>,
}

/// Identity set and sink bound to one root context name.
pub(crate) struct RootState {
    pub(crate) name: Arc<str>,
    pub(crate) identities: HashMap<String, ResolvedKind>,
    pub(crate) unknown: Identity,
    pub(crate) sink: Arc<dyn ReportSink>,
}

impl RootState {
    fn new(shared: &Shared, name: Arc<str>) -> Self {
        let identities = shared
            .resolved
            .iter()
            .map(|(kind, &idx)| {
                let decl = &shared.kinds[idx];
                let identity =
                    Identity::declared(&shared.token, Arc::clone(&name), idx, kind.as_str());
                let resolved = ResolvedKind {
                    identity,
                    suffix: decl.suffix().cloned(),
                };
                (kind.clone(), resolved)
            })
            .collect();
        Self {
            unknown: Identity::unknown(&shared.token, Arc::clone(&name)),
            identities,
            sink: Arc::clone(&shared.sink),
            name,
        }
    }

    /// Resolve `kind`, falling back to the unknown identity.
    pub(crate) fn resolve(&self, kind: &str) -> (&Identity, Option<&SuffixBuilder>) {
        match self.identities.get(kind) {
            Some(r) => (&r.identity, r.suffix.as_ref()),
            None => (&self.unknown, None),
        }
    }
}
