use crate::strategy::{CachedResolver, ExtensionRef, StrategyResolver};
use hydra_fusion_model::vocab::query;
use hydra_fusion_model::{GraphIndex, NamedNodeRef};
use std::sync::{Arc, PoisonError, RwLock};

/// One loaded version of the API description.
///
/// Holds the class-level declarations shared by all requests and the resolved extension
/// references. A snapshot never changes after it has been created.
#[derive(Debug)]
pub struct ApiSnapshot {
    graph: GraphIndex,
    resolver: CachedResolver,
}

impl ApiSnapshot {
    /// Creates a snapshot and resolves every filter and describe strategy the description refers
    /// to.
    pub fn new(graph: GraphIndex, resolver: Arc<dyn StrategyResolver>) -> Self {
        let resolver = CachedResolver::new(resolver);
        for reference in references(&graph, query::FILTER) {
            resolver.filter(&reference);
        }
        for reference in references(&graph, query::DESCRIBE_STRATEGY)
            .chain(references(&graph, query::MEMBER_DESCRIBE_STRATEGY))
        {
            resolver.describe_strategy(&reference);
        }
        tracing::debug!(
            triples = graph.len(),
            unresolved_filters = resolver.unresolved_filters(),
            "Loaded API snapshot"
        );
        Self { graph, resolver }
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn resolver(&self) -> &CachedResolver {
        &self.resolver
    }

    /// The number of filter references of this snapshot that could not be resolved.
    ///
    /// Each of them silently widens the collections using it.
    pub fn unresolved_filters(&self) -> usize {
        self.resolver.unresolved_filters()
    }
}

fn references<'a>(
    graph: &'a GraphIndex,
    predicate: NamedNodeRef<'a>,
) -> impl Iterator<Item = ExtensionRef> + 'a {
    graph
        .triples_for_predicate(predicate)
        .filter_map(|triple| ExtensionRef::read(graph, triple.object.as_ref()))
}

/// The current API description. Reloading replaces the whole snapshot at once; requests keep
/// using the snapshot they started with.
#[derive(Debug)]
pub struct Api {
    current: RwLock<Arc<ApiSnapshot>>,
}

impl Api {
    pub fn new(snapshot: ApiSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<ApiSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Installs `snapshot` and returns the previous one.
    pub fn reload(&self, snapshot: ApiSnapshot) -> Arc<ApiSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(triples = snapshot.graph.len(), "Reloading API snapshot");
        std::mem::replace(&mut *current, snapshot)
    }
}
