//! Compiles a collection description into the member and total queries.

use crate::description::CollectionDescription;
use crate::options::CollectionOptions;
use crate::patterns::{
    group, is_iri, member_assertion_patterns, ordering, Fragment, Ordering, VariableGenerator,
};
use crate::strategy::{CachedResolver, EqualityFilter, Filter, FilterInput};
use crate::template::SearchParams;
use crate::view::PageRequest;
use hydra_fusion_model::sparql::{
    AggregateExpression, AggregateFunction, Expression, GraphPattern, Query,
};
use hydra_fusion_model::{Term, Variable};
use std::sync::Arc;

/// The queries computing one page of a dynamic collection.
#[derive(Debug, Clone)]
pub struct MemberQueries {
    /// `SELECT DISTINCT ?member`, ordered and sliced when the collection is paged.
    pub members: Query,
    /// `SELECT (COUNT(DISTINCT ?member) AS ?total)` over all matching members.
    pub total: Query,
    /// The requested page, if the collection is paged.
    pub page: Option<PageRequest>,
}

/// The variable the total query binds.
pub fn total_variable() -> Variable {
    Variable::new_unchecked("total")
}

/// Builds the member and total queries of `collection` for the request `params`.
///
/// Returns [None] if the collection has no valid member assertion. Such a collection is always
/// empty and no query needs to run.
pub fn assemble(
    collection: &CollectionDescription,
    params: &SearchParams,
    resolver: &CachedResolver,
    options: &CollectionOptions,
) -> Option<MemberQueries> {
    let member = options.member_variable();

    let mut fragments = Vec::new();
    for assertion in collection.member_assertions() {
        match member_assertion_patterns(member, assertion) {
            Ok(patterns) => fragments.extend(patterns.into_iter().map(Fragment::Required)),
            Err(error) => tracing::warn!(
                collection = %collection.iri(),
                assertion = %assertion.node(),
                %error,
                "Ignoring invalid member assertion"
            ),
        }
    }
    if fragments.is_empty() {
        tracing::debug!(collection = %collection.iri(), "Collection has no valid member assertion");
        return None;
    }

    fragments.extend(
        filter_patterns(collection, params, resolver, member)
            .into_iter()
            .map(Fragment::Required),
    );

    let page = PageRequest::resolve(collection, params, options.default_page_size());
    let ordering = match page {
        Some(_) => ordering(member, collection.ordering()),
        None => {
            if !collection.ordering().is_empty() {
                tracing::warn!(
                    collection = %collection.iri(),
                    "Ordering is only applied to paged collections"
                );
            }
            Ordering::default()
        }
    };

    let total = total_query(member, fragments.clone());

    let mut pattern = GraphPattern::Filter {
        expr: is_iri(member),
        inner: Box::new(group(fragments.into_iter().chain(ordering.fragments))),
    };
    if !ordering.conditions.is_empty() {
        pattern = GraphPattern::OrderBy {
            inner: Box::new(pattern),
            expression: ordering.conditions,
        };
    }
    pattern = GraphPattern::Distinct {
        inner: Box::new(GraphPattern::Project {
            inner: Box::new(pattern),
            variables: vec![member.clone()],
        }),
    };
    if let Some(page) = page {
        pattern = GraphPattern::Slice {
            inner: Box::new(pattern),
            start: page.offset(),
            length: Some(page.size),
        };
    }
    let members = select(pattern);

    tracing::debug!(collection = %collection.iri(), %members, %total, "Compiled member queries");
    Some(MemberQueries {
        members,
        total,
        page,
    })
}

/// Runs the filter of every search variable that has a value.
///
/// Mappings without a declared filter use [EqualityFilter]. A declared filter that cannot be
/// resolved contributes nothing.
fn filter_patterns(
    collection: &CollectionDescription,
    params: &SearchParams,
    resolver: &CachedResolver,
    member: &Variable,
) -> Vec<GraphPattern> {
    let Some(template) = collection.search() else {
        return Vec::new();
    };
    let mut patterns = Vec::new();
    let mut counter = 0;
    for (mapping, property) in template.filter_mappings() {
        let values = params.values(property.as_ref()).cloned().collect::<Vec<Term>>();
        if values.is_empty() {
            if mapping.required() {
                tracing::debug!(variable = mapping.variable(), "Required search variable has no value");
            }
            continue;
        }
        let filter: Arc<dyn Filter> = match mapping.filter() {
            Some(reference) => match resolver.filter(reference) {
                Some(filter) => filter,
                None => continue,
            },
            None => Arc::new(EqualityFilter),
        };
        counter += 1;
        let variables = VariableGenerator::new(format!("filter{counter}"));
        let input = FilterInput {
            subject: member,
            predicate: property,
            object: &values,
            variables: &variables,
            params,
        };
        if let Some(pattern) = filter.pattern(&input) {
            patterns.push(pattern);
        }
    }
    patterns
}

fn total_query(member: &Variable, fragments: Vec<Fragment>) -> Query {
    let total = total_variable();
    let pattern = GraphPattern::Project {
        inner: Box::new(GraphPattern::Group {
            inner: Box::new(GraphPattern::Filter {
                expr: is_iri(member),
                inner: Box::new(group(fragments)),
            }),
            variables: Vec::new(),
            aggregates: vec![(
                total.clone(),
                AggregateExpression::FunctionCall {
                    name: AggregateFunction::Count,
                    expr: Expression::Variable(member.clone()),
                    distinct: true,
                },
            )],
        }),
        variables: vec![total],
    };
    select(pattern)
}

fn select(pattern: GraphPattern) -> Query {
    Query::Select {
        dataset: None,
        pattern,
        base_iri: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyRegistry;
    use crate::template::{SearchTemplate, VariableMapping, VariableRepresentation};
    use hydra_fusion_model::sparql::{NamedNodePattern, OrderExpression, TermPattern, TriplePattern};
    use hydra_fusion_model::vocab::{hydra, query, rdf};
    use hydra_fusion_model::{BlankNode, GraphIndex, Literal, NamedNode, Triple};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn schema(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://schema.org/{name}"))
    }

    fn resolver() -> CachedResolver {
        CachedResolver::new(Arc::new(StrategyRegistry::default()))
    }

    /// `</people>` managing `schema:Person` instances, searchable by name.
    fn people(extra: impl IntoIterator<Item = Triple>) -> Vec<Triple> {
        let assertion = BlankNode::default();
        let search = BlankNode::default();
        let name = BlankNode::default();
        let page = BlankNode::default();
        let mut triples = vec![
            Triple::new(ex("people"), hydra::MEMBER_ASSERTION, assertion.clone()),
            Triple::new(assertion.clone(), hydra::PROPERTY, rdf::TYPE.into_owned()),
            Triple::new(assertion, hydra::OBJECT, schema("Person")),
            Triple::new(ex("people"), hydra::SEARCH, search.clone()),
            Triple::new(search.clone(), hydra::TEMPLATE, Literal::from("/people{?name,page}")),
            Triple::new(search.clone(), hydra::MAPPING, name.clone()),
            Triple::new(name.clone(), hydra::VARIABLE, Literal::from("name")),
            Triple::new(name, hydra::PROPERTY, schema("name")),
            Triple::new(search, hydra::MAPPING, page.clone()),
            Triple::new(page.clone(), hydra::VARIABLE, Literal::from("page")),
            Triple::new(page, hydra::PROPERTY, hydra::PAGE_INDEX.into_owned()),
        ];
        triples.extend(extra);
        triples
    }

    fn describe(triples: Vec<Triple>) -> CollectionDescription {
        CollectionDescription::read(&ex("people"), &GraphIndex::new(triples), &GraphIndex::default())
    }

    fn pattern(query: &Query) -> &GraphPattern {
        match query {
            Query::Select { pattern, .. } => pattern,
            _ => panic!("expected a SELECT query"),
        }
    }

    /// Visits `pattern` and all patterns nested in it.
    fn walk<'a>(pattern: &'a GraphPattern, visit: &mut impl FnMut(&'a GraphPattern)) {
        visit(pattern);
        match pattern {
            GraphPattern::Join { left, right }
            | GraphPattern::LeftJoin { left, right, .. }
            | GraphPattern::Union { left, right }
            | GraphPattern::Minus { left, right } => {
                walk(left, visit);
                walk(right, visit);
            }
            GraphPattern::Filter { inner, .. }
            | GraphPattern::Graph { inner, .. }
            | GraphPattern::Extend { inner, .. }
            | GraphPattern::OrderBy { inner, .. }
            | GraphPattern::Project { inner, .. }
            | GraphPattern::Distinct { inner }
            | GraphPattern::Reduced { inner }
            | GraphPattern::Slice { inner, .. }
            | GraphPattern::Group { inner, .. } => walk(inner, visit),
            _ => {}
        }
    }

    fn count(query: &Query, predicate: impl Fn(&GraphPattern) -> bool) -> usize {
        let mut count = 0;
        walk(pattern(query), &mut |p| {
            if predicate(p) {
                count += 1;
            }
        });
        count
    }

    fn triple_patterns(query: &Query) -> Vec<TriplePattern> {
        let mut triples = Vec::new();
        walk(pattern(query), &mut |p| {
            if let GraphPattern::Bgp { patterns } = p {
                triples.extend(patterns.iter().cloned());
            }
        });
        triples
    }

    #[test]
    fn collection_without_assertions_has_no_queries() {
        let description = describe(vec![Triple::new(
            ex("people"),
            hydra::LIMIT,
            Literal::from("10"),
        )]);
        assert!(assemble(
            &description,
            &SearchParams::default(),
            &resolver(),
            &CollectionOptions::default()
        )
        .is_none());
    }

    #[test]
    fn invalid_assertions_are_skipped() {
        let assertion = BlankNode::default();
        let description = describe(vec![
            Triple::new(ex("people"), hydra::MEMBER_ASSERTION, assertion.clone()),
            Triple::new(assertion, hydra::OBJECT, schema("Person")),
        ]);
        assert!(assemble(
            &description,
            &SearchParams::default(),
            &resolver(),
            &CollectionOptions::default()
        )
        .is_none());
    }

    #[test]
    fn first_page_is_limited_and_total_is_not() {
        let description = describe(people([]));
        let params = description.search().unwrap().parse_query("page=1");

        let queries = assemble(
            &description,
            &params,
            &resolver(),
            &CollectionOptions::default(),
        )
        .unwrap();

        assert!(matches!(
            pattern(&queries.members),
            GraphPattern::Slice { start: 0, length: Some(10), .. }
        ));
        assert_eq!(count(&queries.total, |p| matches!(p, GraphPattern::Slice { .. })), 0);
        assert_eq!(
            count(&queries.total, |p| matches!(
                p,
                GraphPattern::Group { aggregates, .. } if aggregates.len() == 1
            )),
            1
        );
        assert_eq!(queries.page, Some(PageRequest { index: 1, size: 10 }));
    }

    #[test]
    fn page_size_prefers_request_then_instance_then_default() {
        let description = describe(people([Triple::new(
            ex("people"),
            hydra::LIMIT,
            Literal::from("12"),
        )]));

        let queries = assemble(
            &description,
            &description.search().unwrap().parse_query("page=3"),
            &resolver(),
            &CollectionOptions::default(),
        )
        .unwrap();
        assert_eq!(queries.page, Some(PageRequest { index: 3, size: 12 }));

        let template = SearchTemplate::new(
            "/people{?page,limit}",
            VariableRepresentation::Basic,
            vec![
                VariableMapping::new("page", Some(hydra::PAGE_INDEX.into_owned())),
                VariableMapping::new("limit", Some(hydra::LIMIT.into_owned())),
            ],
        );
        let queries = assemble(
            &description,
            &template.parse_query("page=2&limit=5"),
            &resolver(),
            &CollectionOptions::default(),
        )
        .unwrap();
        assert_eq!(queries.page, Some(PageRequest { index: 2, size: 5 }));
        assert!(matches!(
            pattern(&queries.members),
            GraphPattern::Slice { start: 5, length: Some(5), .. }
        ));

        let queries = assemble(
            &describe(people([])),
            &SearchParams::default(),
            &resolver(),
            &CollectionOptions::default().with_default_page_size(25),
        )
        .unwrap();
        assert_eq!(queries.page, Some(PageRequest { index: 1, size: 25 }));
    }

    #[test]
    fn search_value_becomes_equality_pattern() {
        let description = describe(people([]));
        let params = description.search().unwrap().parse_query("name=Jane");

        let queries = assemble(
            &description,
            &params,
            &resolver(),
            &CollectionOptions::default(),
        )
        .unwrap();

        let expected = TriplePattern {
            subject: TermPattern::Variable(Variable::new_unchecked("member")),
            predicate: NamedNodePattern::NamedNode(schema("name")),
            object: TermPattern::Literal(Literal::from("Jane")),
        };
        assert!(triple_patterns(&queries.members).contains(&expected));
        assert!(triple_patterns(&queries.total).contains(&expected));
    }

    #[test]
    fn unresolved_filter_is_a_counted_no_op() {
        let assertion = BlankNode::default();
        let search = BlankNode::default();
        let name = BlankNode::default();
        let description = describe(vec![
            Triple::new(ex("people"), hydra::MEMBER_ASSERTION, assertion.clone()),
            Triple::new(assertion.clone(), hydra::PROPERTY, rdf::TYPE.into_owned()),
            Triple::new(assertion, hydra::OBJECT, schema("Person")),
            Triple::new(ex("people"), hydra::SEARCH, search.clone()),
            Triple::new(search.clone(), hydra::TEMPLATE, Literal::from("/people{?name}")),
            Triple::new(search, hydra::MAPPING, name.clone()),
            Triple::new(name.clone(), hydra::VARIABLE, Literal::from("name")),
            Triple::new(name.clone(), hydra::PROPERTY, schema("name")),
            Triple::new(name, query::FILTER, ex("filters/missing")),
        ]);
        let params = description.search().unwrap().parse_query("name=Jane");
        let resolver = resolver();

        let queries = assemble(
            &description,
            &params,
            &resolver,
            &CollectionOptions::default(),
        )
        .unwrap();

        assert_eq!(triple_patterns(&queries.members).len(), 1);
        assert_eq!(resolver.unresolved_filters(), 1);
    }

    #[test]
    fn descending_order_only_in_member_query() {
        let list = BlankNode::default();
        let entry = BlankNode::default();
        let description = describe(people([
            Triple::new(ex("people"), query::ORDER, list.clone()),
            Triple::new(list.clone(), rdf::FIRST, entry.clone()),
            Triple::new(list, rdf::REST, rdf::NIL.into_owned()),
            Triple::new(entry.clone(), query::PATH, schema("name")),
            Triple::new(entry, query::DIRECTION, query::DESCENDING.into_owned()),
        ]));

        let queries = assemble(
            &description,
            &SearchParams::default(),
            &resolver(),
            &CollectionOptions::default(),
        )
        .unwrap();

        let optional = |p: &GraphPattern| matches!(p, GraphPattern::LeftJoin { .. });
        assert_eq!(count(&queries.members, optional), 1);
        assert_eq!(count(&queries.total, optional), 0);
        let mut conditions = Vec::new();
        walk(pattern(&queries.members), &mut |p| {
            if let GraphPattern::OrderBy { expression, .. } = p {
                conditions.extend(expression.iter().cloned());
            }
        });
        assert_eq!(
            conditions,
            vec![OrderExpression::Desc(Expression::Variable(
                Variable::new_unchecked("order1")
            ))]
        );
        assert_eq!(count(&queries.total, |p| matches!(p, GraphPattern::OrderBy { .. })), 0);
    }

    #[test]
    fn ordering_is_ignored_when_not_paged() {
        let list = BlankNode::default();
        let entry = BlankNode::default();
        let assertion = BlankNode::default();
        let description = describe(vec![
            Triple::new(ex("people"), hydra::MEMBER_ASSERTION, assertion.clone()),
            Triple::new(assertion.clone(), hydra::PROPERTY, rdf::TYPE.into_owned()),
            Triple::new(assertion, hydra::OBJECT, schema("Person")),
            Triple::new(ex("people"), query::ORDER, list.clone()),
            Triple::new(list.clone(), rdf::FIRST, entry.clone()),
            Triple::new(list, rdf::REST, rdf::NIL.into_owned()),
            Triple::new(entry, query::PATH, schema("name")),
        ]);

        let queries = assemble(
            &description,
            &SearchParams::default(),
            &resolver(),
            &CollectionOptions::default(),
        )
        .unwrap();

        assert!(queries.page.is_none());
        assert_eq!(count(&queries.members, |p| matches!(p, GraphPattern::OrderBy { .. })), 0);
        assert!(matches!(pattern(&queries.members), GraphPattern::Distinct { .. }));
    }

    #[test]
    fn same_assertion_through_manages_yields_one_pattern() {
        let assertion = BlankNode::default();
        let description = describe(vec![
            Triple::new(ex("people"), hydra::MEMBER_ASSERTION, assertion.clone()),
            Triple::new(ex("people"), hydra::MANAGES, assertion.clone()),
            Triple::new(assertion.clone(), hydra::PROPERTY, rdf::TYPE.into_owned()),
            Triple::new(assertion, hydra::OBJECT, schema("Person")),
        ]);

        let queries = assemble(
            &description,
            &SearchParams::default(),
            &resolver(),
            &CollectionOptions::default(),
        )
        .unwrap();

        assert_eq!(triple_patterns(&queries.members).len(), 1);
        assert_eq!(triple_patterns(&queries.total).len(), 1);
    }

    #[test]
    fn filters_get_distinct_variable_prefixes() {
        struct Label;

        impl Filter for Label {
            fn pattern(&self, input: &FilterInput<'_>) -> Option<GraphPattern> {
                Some(GraphPattern::Bgp {
                    patterns: vec![TriplePattern {
                        subject: TermPattern::Variable(input.subject.clone()),
                        predicate: NamedNodePattern::NamedNode(input.predicate.clone()),
                        object: TermPattern::Variable(input.variables.variable("var")),
                    }],
                })
            }
        }

        let assertion = BlankNode::default();
        let search = BlankNode::default();
        let first = BlankNode::default();
        let second = BlankNode::default();
        let description = describe(vec![
            Triple::new(ex("people"), hydra::MEMBER_ASSERTION, assertion.clone()),
            Triple::new(assertion.clone(), hydra::PROPERTY, rdf::TYPE.into_owned()),
            Triple::new(assertion, hydra::OBJECT, schema("Person")),
            Triple::new(ex("people"), hydra::SEARCH, search.clone()),
            Triple::new(search.clone(), hydra::TEMPLATE, Literal::from("/people{?a,b}")),
            Triple::new(search.clone(), hydra::MAPPING, first.clone()),
            Triple::new(search, hydra::MAPPING, second.clone()),
            Triple::new(first.clone(), hydra::VARIABLE, Literal::from("a")),
            Triple::new(first.clone(), hydra::PROPERTY, schema("name")),
            Triple::new(first, query::FILTER, ex("filters/label")),
            Triple::new(second.clone(), hydra::VARIABLE, Literal::from("b")),
            Triple::new(second.clone(), hydra::PROPERTY, schema("name")),
            Triple::new(second, query::FILTER, ex("filters/label")),
        ]);
        let params = description.search().unwrap().parse_query("a=x&b=y");
        let resolver = CachedResolver::new(Arc::new(
            StrategyRegistry::default().with_filter(ex("filters/label"), Label),
        ));

        let queries = assemble(
            &description,
            &params,
            &resolver,
            &CollectionOptions::default(),
        )
        .unwrap();

        let objects = triple_patterns(&queries.members)
            .into_iter()
            .filter_map(|t| match t.object {
                TermPattern::Variable(v) => Some(v.into_string()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(objects, vec!["filter1_var", "filter2_var"]);
    }
}
