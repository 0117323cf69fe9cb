//! Reads the declarations of a collection out of its graph and the API description.
//!
//! Rules declared on the collection itself and on its classes are merged: both apply. The only
//! exception is ordering, where the first non-empty declaration wins.

mod rules;

pub use rules::{IncludeRule, MemberAssertion, OrderEntry};

use crate::strategy::ExtensionRef;
use crate::template::SearchTemplate;
use hydra_fusion_model::vocab::{hydra, query, rdf};
use hydra_fusion_model::{GraphIndex, NamedNode, NamedNodeRef, Subject, Term, TermRef};
use rustc_hash::FxHashSet;

/// Everything the compiler needs to know about one collection, for one request.
#[derive(Debug, Clone)]
pub struct CollectionDescription {
    iri: NamedNode,
    graph: GraphIndex,
    classes: Vec<NamedNode>,
    member_assertions: Vec<MemberAssertion>,
    search: Option<SearchTemplate>,
    ordering: Vec<OrderEntry>,
    member_includes: Vec<IncludeRule>,
    member_class_includes: Vec<IncludeRule>,
    members: Option<Vec<NamedNode>>,
    instance_limit: Option<usize>,
    class_limit: Option<usize>,
    member_describe_strategies: Vec<ExtensionRef>,
}

/// A node that declares rules, with the graph describing it.
struct Source<'a> {
    graph: &'a GraphIndex,
    node: Term,
}

impl Source<'_> {
    fn objects(&self, predicate: NamedNodeRef<'_>) -> impl Iterator<Item = &Term> + '_ {
        self.graph.objects(self.node.as_ref(), predicate)
    }
}

impl CollectionDescription {
    /// Reads the collection `iri` from its own `graph` and the class definitions in `api`.
    pub fn read(iri: &NamedNode, graph: &GraphIndex, api: &GraphIndex) -> Self {
        let node = TermRef::from(iri.as_ref());
        let mut classes = Vec::new();
        for class in graph.objects(node, rdf::TYPE).chain(api.objects(node, rdf::TYPE)) {
            if let Term::NamedNode(class) = class {
                if !classes.contains(class) {
                    classes.push(class.clone());
                }
            }
        }

        let instance = Source {
            graph,
            node: iri.clone().into(),
        };
        let sources = std::iter::once(instance)
            .chain(classes.iter().map(|class| Source {
                graph: api,
                node: class.clone().into(),
            }))
            .collect::<Vec<_>>();

        let member_assertions = read_member_assertions(&sources);
        let search = sources.iter().find_map(|source| {
            let template = source.objects(hydra::SEARCH).next()?;
            SearchTemplate::read(source.graph, template.as_ref())
        });
        let ordering = sources
            .iter()
            .flat_map(|source| {
                source
                    .objects(query::ORDER)
                    .map(move |list| read_ordering(source.graph, list))
            })
            .find(|entries| !entries.is_empty())
            .unwrap_or_default();
        let member_includes = read_includes(&sources, query::MEMBER_INCLUDE);

        let member_class_includes = typed_includes(api);

        let members = graph.object(node, hydra::MEMBER).is_some().then(|| {
            graph
                .objects(node, hydra::MEMBER)
                .filter_map(|member| match member {
                    Term::NamedNode(member) => Some(member.clone()),
                    other => {
                        tracing::warn!(collection = %iri, member = %other, "Ignoring member that is not an IRI");
                        None
                    }
                })
                .collect()
        });

        let instance_limit = graph.object(node, hydra::LIMIT).and_then(integer);
        let class_limit = sources[1..]
            .iter()
            .find_map(|source| source.objects(hydra::LIMIT).find_map(integer));

        let member_describe_strategies = sources
            .iter()
            .flat_map(|source| {
                source
                    .objects(query::MEMBER_DESCRIBE_STRATEGY)
                    .filter_map(|reference| ExtensionRef::read(source.graph, reference.as_ref()))
            })
            .collect();

        Self {
            iri: iri.clone(),
            graph: graph.clone(),
            classes,
            member_assertions,
            search,
            ordering,
            member_includes,
            member_class_includes,
            members,
            instance_limit,
            class_limit,
            member_describe_strategies,
        }
    }

    pub fn iri(&self) -> &NamedNode {
        &self.iri
    }

    /// The graph the collection was read from.
    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn classes(&self) -> &[NamedNode] {
        &self.classes
    }

    /// Member assertions of the collection and its classes, without duplicates, in declaration
    /// order.
    pub fn member_assertions(&self) -> &[MemberAssertion] {
        &self.member_assertions
    }

    pub fn search(&self) -> Option<&SearchTemplate> {
        self.search.as_ref()
    }

    /// The ordering entries of the first non-empty ordering declaration.
    pub fn ordering(&self) -> &[OrderEntry] {
        &self.ordering
    }

    /// Paths loaded with every member (`query:memberInclude`).
    pub fn member_includes(&self) -> &[IncludeRule] {
        &self.member_includes
    }

    /// Paths declared with `query:include` on any class of the API, each restricted to members of
    /// the declaring class.
    pub fn member_class_includes(&self) -> &[IncludeRule] {
        &self.member_class_includes
    }

    /// The explicitly listed members, if the collection lists them.
    pub fn members(&self) -> Option<&[NamedNode]> {
        self.members.as_deref()
    }

    /// `hydra:limit` of the collection itself.
    pub fn instance_limit(&self) -> Option<usize> {
        self.instance_limit
    }

    /// `hydra:limit` of the first class declaring one.
    pub fn class_limit(&self) -> Option<usize> {
        self.class_limit
    }

    pub fn member_describe_strategies(&self) -> &[ExtensionRef] {
        &self.member_describe_strategies
    }
}

fn read_member_assertions(sources: &[Source<'_>]) -> Vec<MemberAssertion> {
    let mut seen = FxHashSet::default();
    let mut assertions = Vec::new();
    for source in sources {
        for predicate in [hydra::MEMBER_ASSERTION, hydra::MANAGES] {
            for node in source.objects(predicate) {
                if seen.insert(node.clone()) {
                    assertions.push(MemberAssertion::read(source.graph, node.as_ref()));
                }
            }
        }
    }
    assertions
}

fn read_ordering(graph: &GraphIndex, list: &Term) -> Vec<OrderEntry> {
    match graph.list(list.as_ref()) {
        Ok(entries) => entries
            .iter()
            .map(|entry| OrderEntry::read(graph, entry.as_ref()))
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "Ignoring invalid ordering list");
            Vec::new()
        }
    }
}

fn read_includes(sources: &[Source<'_>], predicate: NamedNodeRef<'_>) -> Vec<IncludeRule> {
    let mut seen = FxHashSet::default();
    sources
        .iter()
        .flat_map(|source| {
            source
                .objects(predicate)
                .map(move |node| (source.graph, node))
        })
        .filter(|(_, node)| seen.insert((*node).clone()))
        .map(|(graph, node)| IncludeRule::read(graph, node.as_ref()))
        .collect()
}

/// Reads every `query:include` of `api`, gated on the type of the declaring class.
///
/// Members are matched by their types in the store, so the includes apply whatever made a
/// resource a member.
fn typed_includes(api: &GraphIndex) -> Vec<IncludeRule> {
    let mut seen = FxHashSet::default();
    api.triples_for_predicate(query::INCLUDE)
        .filter_map(|triple| match &triple.subject {
            Subject::NamedNode(class) => Some((class, &triple.object)),
            _ => None,
        })
        .filter(|(class, node)| seen.insert(((*class).clone(), (*node).clone())))
        .map(|(class, node)| IncludeRule::read(api, node.as_ref()).for_type(class.clone()))
        .collect()
}

/// Reads the `query:include` paths declared by `classes` in `api`.
pub fn class_includes(api: &GraphIndex, classes: &[NamedNode]) -> Vec<IncludeRule> {
    let sources = classes
        .iter()
        .map(|class| Source {
            graph: api,
            node: class.clone().into(),
        })
        .collect::<Vec<_>>();
    read_includes(&sources, query::INCLUDE)
}

/// Reads the `query:describeStrategy` references declared by `classes` in `api`.
pub fn class_describe_strategies(api: &GraphIndex, classes: &[NamedNode]) -> Vec<ExtensionRef> {
    let mut references = Vec::new();
    for class in classes {
        for node in api.objects(class.as_ref().into(), query::DESCRIBE_STRATEGY) {
            if let Some(reference) = ExtensionRef::read(api, node.as_ref()) {
                if !references.contains(&reference) {
                    references.push(reference);
                }
            }
        }
    }
    references
}

fn integer(term: &Term) -> Option<usize> {
    match term {
        Term::Literal(literal) => literal.value().trim().parse().ok(),
        _ => None,
    }
}
