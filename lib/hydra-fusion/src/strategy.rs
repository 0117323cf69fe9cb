//! Pluggable filter and describe strategies.
//!
//! Collections refer to code through extension references (`query:filter`,
//! `query:describeStrategy`, `query:memberDescribeStrategy`). The host registers implementations
//! for these references in a [StrategyRegistry] or provides its own [StrategyResolver]. The
//! compiler never loads code by itself.

use crate::error::CollectionError;
use crate::patterns::{equality_pattern, VariableGenerator};
use crate::template::SearchParams;
use async_trait::async_trait;
use hydra_fusion_client::SparqlClient;
use hydra_fusion_model::sparql::GraphPattern;
use hydra_fusion_model::vocab::code;
use hydra_fusion_model::{GraphIndex, NamedNode, Term, TermRef, Triple, Variable};
use rustc_hash::FxHashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Identifies an implementation of a filter or describe strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionRef(NamedNode);

impl ExtensionRef {
    pub fn new(iri: NamedNode) -> Self {
        Self(iri)
    }

    /// Reads the reference declared by `node`.
    ///
    /// The node is either the IRI of the implementation or a resource with
    /// `code:implementedBy`, whose value is the IRI or carries it as `code:link`.
    pub fn read(graph: &GraphIndex, node: TermRef<'_>) -> Option<Self> {
        if let TermRef::NamedNode(iri) = node {
            return Some(Self(iri.into_owned()));
        }
        let implementation = graph.object(node, code::IMPLEMENTED_BY)?;
        match implementation {
            Term::NamedNode(iri) => Some(Self(iri.clone())),
            other => match graph.object(other.as_ref(), code::LINK)? {
                Term::NamedNode(iri) => Some(Self(iri.clone())),
                _ => None,
            },
        }
    }

    pub fn iri(&self) -> &NamedNode {
        &self.0
    }
}

impl Display for ExtensionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The arguments of a [Filter].
#[derive(Debug)]
pub struct FilterInput<'a> {
    /// The variable bound to collection members.
    pub subject: &'a Variable,
    /// The property mapped to the search variable.
    pub predicate: &'a NamedNode,
    /// The values given for the search variable.
    pub object: &'a [Term],
    /// Generates variables that are private to this filter.
    pub variables: &'a VariableGenerator,
    /// All search parameters of the request.
    pub params: &'a SearchParams,
}

/// Restricts the members of a collection based on the value of a search variable.
pub trait Filter: Send + Sync {
    /// Returns the pattern members must match, or [None] if the filter does not restrict them.
    fn pattern(&self, input: &FilterInput<'_>) -> Option<GraphPattern>;
}

/// Exact match on the first value. Used for mappings that do not declare a filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct EqualityFilter;

impl Filter for EqualityFilter {
    fn pattern(&self, input: &FilterInput<'_>) -> Option<GraphPattern> {
        let (first, rest) = input.object.split_first()?;
        if !rest.is_empty() {
            tracing::warn!(
                predicate = %input.predicate,
                values = input.object.len(),
                "The default filter only supports a single value, ignoring the others"
            );
        }
        equality_pattern(input.subject, input.predicate, first)
    }
}

/// Loads the data of a set of resources.
#[async_trait]
pub trait DescribeStrategy: Send + Sync {
    async fn describe(
        &self,
        client: &dyn SparqlClient,
        resources: &[NamedNode],
    ) -> Result<Vec<Triple>, CollectionError>;
}

/// Resolves extension references to implementations.
///
/// Returns [None] when nothing is known about the reference.
pub trait StrategyResolver: Send + Sync {
    fn filter(&self, reference: &ExtensionRef) -> Option<Arc<dyn Filter>>;

    fn describe_strategy(&self, reference: &ExtensionRef) -> Option<Arc<dyn DescribeStrategy>>;
}

/// A [StrategyResolver] backed by implementations registered up front.
///
/// ```
/// use hydra_fusion::strategy::{EqualityFilter, StrategyRegistry, StrategyResolver, ExtensionRef};
/// use hydra_fusion::model::NamedNode;
///
/// let reference = NamedNode::new("urn:filter:exact")?;
/// let registry = StrategyRegistry::default().with_filter(reference.clone(), EqualityFilter);
///
/// assert!(registry.filter(&ExtensionRef::new(reference)).is_some());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    filters: FxHashMap<NamedNode, Arc<dyn Filter>>,
    describe_strategies: FxHashMap<NamedNode, Arc<dyn DescribeStrategy>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn with_filter(mut self, reference: NamedNode, filter: impl Filter + 'static) -> Self {
        self.filters.insert(reference, Arc::new(filter));
        self
    }

    #[must_use]
    pub fn with_describe_strategy(
        mut self,
        reference: NamedNode,
        strategy: impl DescribeStrategy + 'static,
    ) -> Self {
        self.describe_strategies
            .insert(reference, Arc::new(strategy));
        self
    }
}

impl Debug for StrategyRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field(
                "describe_strategies",
                &self.describe_strategies.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl StrategyResolver for StrategyRegistry {
    fn filter(&self, reference: &ExtensionRef) -> Option<Arc<dyn Filter>> {
        self.filters.get(reference.iri()).cloned()
    }

    fn describe_strategy(&self, reference: &ExtensionRef) -> Option<Arc<dyn DescribeStrategy>> {
        self.describe_strategies.get(reference.iri()).cloned()
    }
}

/// Caches the answers of a [StrategyResolver].
///
/// Each reference is resolved at most once. References that cannot be resolved are remembered as
/// well and counted, since a missing filter silently widens a collection.
pub struct CachedResolver {
    resolver: Arc<dyn StrategyResolver>,
    filters: RwLock<FxHashMap<ExtensionRef, Option<Arc<dyn Filter>>>>,
    describe_strategies: RwLock<FxHashMap<ExtensionRef, Option<Arc<dyn DescribeStrategy>>>>,
    unresolved_filters: AtomicUsize,
}

impl CachedResolver {
    pub fn new(resolver: Arc<dyn StrategyResolver>) -> Self {
        Self {
            resolver,
            filters: RwLock::default(),
            describe_strategies: RwLock::default(),
            unresolved_filters: AtomicUsize::new(0),
        }
    }

    /// Resolves a filter. A failed resolution is logged and reported as [None].
    pub fn filter(&self, reference: &ExtensionRef) -> Option<Arc<dyn Filter>> {
        if let Some(cached) = self
            .filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
        {
            return cached.clone();
        }
        let mut filters = self.filters.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = filters.get(reference) {
            return cached.clone();
        }
        let resolved = self.resolver.filter(reference);
        if resolved.is_none() {
            self.unresolved_filters.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(%reference, "Filter implementation could not be resolved");
        }
        filters.insert(reference.clone(), resolved.clone());
        resolved
    }

    /// Resolves a describe strategy. A failed resolution is logged and reported as [None].
    pub fn describe_strategy(&self, reference: &ExtensionRef) -> Option<Arc<dyn DescribeStrategy>> {
        if let Some(cached) = self
            .describe_strategies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
        {
            return cached.clone();
        }
        let mut strategies = self
            .describe_strategies
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = strategies.get(reference) {
            return cached.clone();
        }
        let resolved = self.resolver.describe_strategy(reference);
        if resolved.is_none() {
            tracing::warn!(%reference, "Describe strategy could not be resolved");
        }
        strategies.insert(reference.clone(), resolved.clone());
        resolved
    }

    /// Resolves the single describe strategy declared by `resource`.
    ///
    /// Declaring more than one strategy is an error. When `required` is set, a declared strategy
    /// that cannot be resolved is an error as well; otherwise it is ignored and the caller falls
    /// back to its default.
    pub fn single_describe_strategy(
        &self,
        resource: &Term,
        references: &[ExtensionRef],
        required: bool,
    ) -> Result<Option<Arc<dyn DescribeStrategy>>, CollectionError> {
        let reference = match references {
            [] => return Ok(None),
            [reference] => reference,
            _ => {
                return Err(CollectionError::AmbiguousStrategy {
                    resource: resource.clone(),
                    count: references.len(),
                })
            }
        };
        match self.describe_strategy(reference) {
            Some(strategy) => Ok(Some(strategy)),
            None if required => Err(CollectionError::UnresolvedStrategy {
                resource: resource.clone(),
                reference: reference.iri().clone(),
            }),
            None => Ok(None),
        }
    }

    /// The number of distinct filter references that could not be resolved so far.
    pub fn unresolved_filters(&self) -> usize {
        self.unresolved_filters.load(Ordering::Relaxed)
    }
}

impl Debug for CachedResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedResolver")
            .field("unresolved_filters", &self.unresolved_filters())
            .finish_non_exhaustive()
    }
}
