//! Loads members together with the resources they link to, in a single query.

use crate::description::IncludeRule;
use crate::error::CollectionError;
use crate::patterns::{is_iri, path_pattern};
use crate::strategy::DescribeStrategy;
use async_trait::async_trait;
use hydra_fusion_client::{ClientError, SparqlClient};
use hydra_fusion_model::sparql::{
    GraphPattern, GroundTerm, NamedNodePattern, PropertyPathExpression, Query, TermPattern,
    TriplePattern,
};
use hydra_fusion_model::vocab::rdf;
use hydra_fusion_model::{NamedNode, Triple, Variable};

/// The variable bound to linked resources.
pub fn linked_variable() -> Variable {
    Variable::new_unchecked("linked")
}

/// Builds the `DESCRIBE` query loading `members` and everything reachable through `includes`.
///
/// Returns [None] if there are no members. Includes with an invalid path are logged and skipped.
/// Without any valid include, the query only describes the members. Includes restricted to a type
/// are only followed from members of that type.
pub fn links_query(
    member: &Variable,
    members: &[NamedNode],
    includes: &[IncludeRule],
) -> Option<Query> {
    if members.is_empty() {
        return None;
    }
    let values = GraphPattern::Values {
        variables: vec![member.clone()],
        bindings: members
            .iter()
            .map(|member| vec![Some(GroundTerm::NamedNode(member.clone()))])
            .collect(),
    };

    let linked = linked_variable();
    let branches = includes
        .iter()
        .filter_map(|include| match include.path() {
            Ok(path) => Some(GraphPattern::Filter {
                expr: is_iri(&linked),
                inner: Box::new(include_pattern(member, include.member_type(), path, &linked)),
            }),
            Err(error) => {
                tracing::warn!(include = %include.node(), %error, "Ignoring include with invalid path");
                None
            }
        })
        .reduce(|left, right| GraphPattern::Union {
            left: Box::new(left),
            right: Box::new(right),
        });

    let pattern = match branches {
        Some(branches) => GraphPattern::Project {
            inner: Box::new(GraphPattern::LeftJoin {
                left: Box::new(values),
                right: Box::new(branches),
                expression: None,
            }),
            variables: vec![member.clone(), linked],
        },
        None => GraphPattern::Project {
            inner: Box::new(values),
            variables: vec![member.clone()],
        },
    };
    Some(Query::Describe {
        dataset: None,
        pattern,
        base_iri: None,
    })
}

/// `?member a <type> . ?member path ?linked`, without the type triple for untyped includes.
fn include_pattern(
    member: &Variable,
    member_type: Option<&NamedNode>,
    path: &PropertyPathExpression,
    linked: &Variable,
) -> GraphPattern {
    let link = path_pattern(
        TermPattern::Variable(member.clone()),
        path,
        TermPattern::Variable(linked.clone()),
    );
    let Some(member_type) = member_type else {
        return link;
    };
    let typed = TriplePattern {
        subject: TermPattern::Variable(member.clone()),
        predicate: NamedNodePattern::NamedNode(rdf::TYPE.into_owned()),
        object: TermPattern::NamedNode(member_type.clone()),
    };
    match link {
        GraphPattern::Bgp { mut patterns } => {
            patterns.insert(0, typed);
            GraphPattern::Bgp { patterns }
        }
        link => GraphPattern::Join {
            left: Box::new(GraphPattern::Bgp {
                patterns: vec![typed],
            }),
            right: Box::new(link),
        },
    }
}

/// Describes `members` and their linked resources. No query is sent if `members` is empty.
pub async fn load_links(
    client: &dyn SparqlClient,
    member: &Variable,
    members: &[NamedNode],
    includes: &[IncludeRule],
) -> Result<Vec<Triple>, ClientError> {
    let Some(query) = links_query(member, members, includes) else {
        return Ok(Vec::new());
    };
    tracing::debug!(members = members.len(), %query, "Loading members and their links");
    client.describe(&query).await
}

/// The default [DescribeStrategy]: describes the resources and follows a fixed set of includes.
#[derive(Debug, Clone)]
pub struct IncludeDescribe {
    variable: Variable,
    includes: Vec<IncludeRule>,
}

impl IncludeDescribe {
    pub fn new(variable: Variable, includes: Vec<IncludeRule>) -> Self {
        Self { variable, includes }
    }
}

#[async_trait]
impl DescribeStrategy for IncludeDescribe {
    async fn describe(
        &self,
        client: &dyn SparqlClient,
        resources: &[NamedNode],
    ) -> Result<Vec<Triple>, CollectionError> {
        Ok(load_links(client, &self.variable, resources, &self.includes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_fusion_client::QueryResults;
    use hydra_fusion_model::{BlankNode, GraphError, Term};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn member() -> Variable {
        Variable::new_unchecked("member")
    }

    #[derive(Default)]
    struct Counting {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl SparqlClient for Counting {
        async fn query(&self, _query: &Query) -> Result<QueryResults, ClientError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(QueryResults::Graph(Vec::new()))
        }
    }

    #[tokio::test]
    async fn no_members_no_query() {
        let client = Counting::default();

        let triples = load_links(
            &client,
            &member(),
            &[],
            &[PropertyPathExpression::NamedNode(ex("knows")).into()],
        )
        .await
        .unwrap();

        assert!(triples.is_empty());
        assert_eq!(client.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn members_are_loaded_in_one_query() {
        let client = Counting::default();

        load_links(&client, &member(), &[ex("a"), ex("b"), ex("c")], &[])
            .await
            .unwrap();

        assert_eq!(client.queries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn without_includes_only_members_are_described() {
        let query = links_query(&member(), &[ex("a"), ex("b")], &[]).unwrap();

        let Query::Describe { pattern, .. } = query else {
            panic!("expected a DESCRIBE query");
        };
        let GraphPattern::Project { inner, variables } = pattern else {
            panic!("expected a projection");
        };
        assert_eq!(variables, vec![member()]);
        assert!(matches!(*inner, GraphPattern::Values { ref bindings, .. } if bindings.len() == 2));
    }

    #[test]
    fn invalid_includes_are_skipped() {
        let includes = [
            IncludeRule::new(
                BlankNode::default().into(),
                Err(GraphError::UnsupportedPath(Term::from(BlankNode::default()))),
            ),
            PropertyPathExpression::NamedNode(ex("knows")).into(),
            PropertyPathExpression::Reverse(Box::new(PropertyPathExpression::NamedNode(ex(
                "member",
            ))))
            .into(),
        ];

        let query = links_query(&member(), &[ex("a")], &includes).unwrap();

        let Query::Describe {
            pattern: GraphPattern::Project { inner, variables },
            ..
        } = query
        else {
            panic!("expected a projected DESCRIBE query");
        };
        assert_eq!(variables, vec![member(), linked_variable()]);
        let GraphPattern::LeftJoin { right, .. } = *inner else {
            panic!("expected an optional block");
        };
        let GraphPattern::Union { left, right } = *right else {
            panic!("expected a union of the valid includes");
        };
        assert!(matches!(*left, GraphPattern::Filter { .. }));
        assert!(matches!(*right, GraphPattern::Filter { .. }));
    }

    #[test]
    fn typed_includes_check_the_member_type() {
        let include = IncludeRule::from(PropertyPathExpression::NamedNode(ex("knows")))
            .for_type(ex("Person"));

        let query = links_query(&member(), &[ex("a")], &[include]).unwrap();

        let rendered = query.to_string();
        assert!(rendered.contains(
            "?member <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Person>"
        ));
        assert!(rendered.contains("?member <http://example.com/knows> ?linked"));
    }
}
