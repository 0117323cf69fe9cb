use crate::api::{Api, ApiSnapshot};
use crate::description::{class_describe_strategies, class_includes, CollectionDescription};
use crate::error::CollectionError;
use crate::links::{load_links, IncludeDescribe};
use crate::members::{assemble, total_variable, MemberQueries};
use crate::options::CollectionOptions;
use crate::strategy::DescribeStrategy;
use crate::template::SearchParams;
use crate::view::{compute_view, total_items, PageRequest, View};
use hydra_fusion_client::{ClientError, QuerySolution, SparqlClient};
use hydra_fusion_model::vocab::hydra;
use hydra_fusion_model::{Graph, GraphIndex, NamedNode, Term, Triple, Variable};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// A rendered collection page.
#[derive(Debug, Clone)]
pub struct CollectionResponse {
    /// The collection graph, the members with their data and links, the view and the total.
    pub graph: Graph,
    /// The members of this page, in query order.
    pub members: Vec<NamedNode>,
    /// The number of members of the whole collection.
    pub total: usize,
    pub view: Option<View>,
}

/// Renders collections described in the API against a triple store.
///
/// The engine can be shared between concurrent requests. Each request reads the API snapshot
/// that is current when it starts.
#[derive(Clone)]
pub struct CollectionEngine {
    client: Arc<dyn SparqlClient>,
    api: Arc<Api>,
    options: CollectionOptions,
}

impl CollectionEngine {
    pub fn new(client: Arc<dyn SparqlClient>, api: Arc<Api>) -> Self {
        Self {
            client,
            api,
            options: CollectionOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CollectionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn api(&self) -> &Arc<Api> {
        &self.api
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    /// Reads the declarations of `collection` from its `graph` and the current API snapshot.
    pub fn describe_collection(
        &self,
        collection: &NamedNode,
        graph: &GraphIndex,
    ) -> CollectionDescription {
        CollectionDescription::read(collection, graph, self.api.snapshot().graph())
    }

    /// Parses a query string with the search template of `description`.
    ///
    /// Collections without a search template ignore the query string.
    pub fn search_params(description: &CollectionDescription, query_string: &str) -> SearchParams {
        description
            .search()
            .map(|template| template.parse_query(query_string))
            .unwrap_or_default()
    }

    /// Compiles the member and total queries without running them.
    pub fn compile(
        &self,
        description: &CollectionDescription,
        params: &SearchParams,
    ) -> Option<MemberQueries> {
        assemble(
            description,
            params,
            self.api.snapshot().resolver(),
            &self.options,
        )
    }

    /// Renders the page of `collection` selected by `query_string`.
    pub async fn render(
        &self,
        collection: &NamedNode,
        graph: &GraphIndex,
        query_string: &str,
    ) -> Result<CollectionResponse, CollectionError> {
        let snapshot = self.api.snapshot();
        let description = CollectionDescription::read(collection, graph, snapshot.graph());
        let params = Self::search_params(&description, query_string);
        self.render_with(&snapshot, &description, &params).await
    }

    /// Renders a collection whose declarations and search parameters are already read.
    pub async fn render_description(
        &self,
        description: &CollectionDescription,
        params: &SearchParams,
    ) -> Result<CollectionResponse, CollectionError> {
        self.render_with(&self.api.snapshot(), description, params)
            .await
    }

    #[tracing::instrument(skip_all, fields(collection = %description.iri()))]
    async fn render_with(
        &self,
        snapshot: &ApiSnapshot,
        description: &CollectionDescription,
        params: &SearchParams,
    ) -> Result<CollectionResponse, CollectionError> {
        let page = PageRequest::resolve(description, params, self.options.default_page_size());

        let (members, total) = match description.members() {
            Some(members) => {
                tracing::debug!(members = members.len(), "Rendering static collection");
                let members = deduplicate(members.iter().cloned());
                let total = members.len();
                (members, total)
            }
            None => match assemble(description, params, snapshot.resolver(), &self.options) {
                Some(queries) => {
                    tracing::debug!("Rendering dynamic collection");
                    self.run_member_queries(&queries).await?
                }
                None => (Vec::new(), 0),
            },
        };

        let member_data = self.load_members(snapshot, description, &members).await?;

        let view = match (description.search(), page) {
            (Some(template), Some(page)) => {
                compute_view(template, params, total, page.size, description.iri())
            }
            _ => None,
        };

        let mut graph = description.graph().to_graph();
        if description.members().is_none() {
            for member in &members {
                graph.insert(&Triple::new(
                    description.iri().clone(),
                    hydra::MEMBER,
                    member.clone(),
                ));
            }
        }
        let view_triples = view
            .as_ref()
            .map(|view| view.to_triples(description.iri()))
            .unwrap_or_default();
        for triple in member_data.iter().chain(&view_triples) {
            graph.insert(triple);
        }
        graph.insert(&total_items(description.iri(), total));

        Ok(CollectionResponse {
            graph,
            members,
            total,
            view,
        })
    }

    async fn run_member_queries(
        &self,
        queries: &MemberQueries,
    ) -> Result<(Vec<NamedNode>, usize), ClientError> {
        let (members, total) = futures::try_join!(
            self.client.select(&queries.members),
            self.client.select(&queries.total)
        )?;
        let members = member_iris(&members, self.options.member_variable());
        let total = total_count(&total);
        Ok((members, total))
    }

    /// Loads the data of the members: with the collection's member describe strategy if it
    /// declares one, otherwise through the collection includes and the includes of the API classes
    /// the members are instances of.
    async fn load_members(
        &self,
        snapshot: &ApiSnapshot,
        description: &CollectionDescription,
        members: &[NamedNode],
    ) -> Result<Vec<Triple>, CollectionError> {
        if members.is_empty() {
            return Ok(Vec::new());
        }
        let strategy = snapshot.resolver().single_describe_strategy(
            &Term::from(description.iri().clone()),
            description.member_describe_strategies(),
            false,
        )?;
        if let Some(strategy) = strategy {
            return strategy.describe(self.client.as_ref(), members).await;
        }

        let variable = self.options.member_variable();
        let client = self.client.as_ref();
        let class_includes = description.member_class_includes();
        let (mut triples, linked) = futures::try_join!(
            load_links(client, variable, members, description.member_includes()),
            async {
                if class_includes.is_empty() {
                    Ok(Vec::new())
                } else {
                    load_links(client, variable, members, class_includes).await
                }
            }
        )?;
        triples.extend(linked);
        Ok(triples)
    }

    /// Loads one resource with the links declared by its classes.
    ///
    /// A class may replace this with its own `query:describeStrategy`. Declaring more than one, or
    /// one that cannot be resolved, is an error.
    #[tracing::instrument(skip_all, fields(resource = %resource))]
    pub async fn describe_resource(
        &self,
        resource: &NamedNode,
        types: &[NamedNode],
    ) -> Result<Vec<Triple>, CollectionError> {
        let snapshot = self.api.snapshot();
        let references = class_describe_strategies(snapshot.graph(), types);
        let resources = [resource.clone()];
        match snapshot.resolver().single_describe_strategy(
            &Term::from(resource.clone()),
            &references,
            true,
        )? {
            Some(strategy) => strategy.describe(self.client.as_ref(), &resources).await,
            None => {
                IncludeDescribe::new(
                    self.options.member_variable().clone(),
                    class_includes(snapshot.graph(), types),
                )
                .describe(self.client.as_ref(), &resources)
                .await
            }
        }
    }
}

impl std::fmt::Debug for CollectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionEngine")
            .field("api", &self.api)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The IRIs bound to `variable`, without duplicates, in solution order.
fn member_iris(solutions: &[QuerySolution], variable: &Variable) -> Vec<NamedNode> {
    deduplicate(solutions.iter().filter_map(|solution| {
        match solution.get(variable.as_str())? {
            Term::NamedNode(member) => Some(member.clone()),
            other => {
                tracing::debug!(member = %other, "Dropping member that is not an IRI");
                None
            }
        }
    }))
}

fn total_count(solutions: &[QuerySolution]) -> usize {
    let total = total_variable();
    let count = solutions.first().and_then(|solution| match solution.get(total.as_str()) {
        Some(Term::Literal(count)) => count.value().parse().ok(),
        _ => None,
    });
    count.unwrap_or_else(|| {
        tracing::warn!("The total query returned no count");
        0
    })
}

fn deduplicate(members: impl IntoIterator<Item = NamedNode>) -> Vec<NamedNode> {
    let mut seen = FxHashSet::default();
    members
        .into_iter()
        .filter(|member| seen.insert(member.clone()))
        .collect()
}
