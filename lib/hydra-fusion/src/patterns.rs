//! Pure functions turning collection declarations into SPARQL pattern fragments.
//!
//! Nothing in here talks to a store. Every function receives the variable that stands for a
//! collection member and returns algebra fragments that the query assemblers combine.

use crate::description::{MemberAssertion, OrderEntry};
use hydra_fusion_model::sparql::{
    Expression, Function, GraphPattern, NamedNodePattern, OrderExpression,
    PropertyPathExpression, TermPattern, TriplePattern,
};
use hydra_fusion_model::{NamedNode, Term, Variable};
use std::fmt::{Display, Formatter};

/// A pattern fragment and how it joins the rest of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Joined with the other fragments.
    Required(GraphPattern),
    /// Joined as an `OPTIONAL` block.
    Optional(GraphPattern),
}

/// Generates variable names with a common prefix, e.g. `filter2_label`.
///
/// Every filter of a query gets its own generator so that two filters asking for the same name
/// still receive distinct variables.
#[derive(Debug, Clone)]
pub struct VariableGenerator {
    prefix: String,
}

impl VariableGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the variable `{prefix}_{name}`.
    ///
    /// Characters that are not allowed in a SPARQL variable name are replaced by `_`.
    pub fn variable(&self, name: &str) -> Variable {
        let name = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect::<String>();
        Variable::new_unchecked(format!("{}_{name}", self.prefix))
    }
}

/// Why a member assertion cannot be turned into patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidMemberAssertion {
    /// Exactly two of subject, property and object must be bound.
    BoundPositions(usize),
    /// The property position holds something else than an IRI.
    NonIriProperty(Term),
    /// A blank node or another term that cannot be used as a constant in a pattern.
    UnsupportedTerm(Term),
}

impl Display for InvalidMemberAssertion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoundPositions(count) => write!(
                f,
                "exactly two of subject, property and object must be bound, found {count}"
            ),
            Self::NonIriProperty(term) => write!(f, "property {term} is not an IRI"),
            Self::UnsupportedTerm(term) => write!(f, "{term} cannot be used in a pattern"),
        }
    }
}

/// Turns a member assertion into one triple pattern per combination of its bound values.
///
/// The unbound position becomes `member`. With `ownGraphOnly`, every pattern is additionally
/// scoped to the named graph called like the member.
pub fn member_assertion_patterns(
    member: &Variable,
    assertion: &MemberAssertion,
) -> Result<Vec<GraphPattern>, InvalidMemberAssertion> {
    let subjects = constants(assertion.subjects())?;
    let properties = assertion
        .properties()
        .iter()
        .map(|term| match term {
            Term::NamedNode(node) => Ok(NamedNodePattern::NamedNode(node.clone())),
            other => Err(InvalidMemberAssertion::NonIriProperty(other.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let objects = constants(assertion.objects())?;

    let bound = [!subjects.is_empty(), !properties.is_empty(), !objects.is_empty()]
        .into_iter()
        .filter(|b| *b)
        .count();
    if bound != 2 {
        return Err(InvalidMemberAssertion::BoundPositions(bound));
    }

    let member_term = || vec![TermPattern::Variable(member.clone())];
    let subjects = if subjects.is_empty() {
        member_term()
    } else {
        subjects
    };
    let properties = if properties.is_empty() {
        vec![NamedNodePattern::Variable(member.clone())]
    } else {
        properties
    };
    let objects = if objects.is_empty() {
        member_term()
    } else {
        objects
    };

    let mut patterns = Vec::new();
    for subject in &subjects {
        for predicate in &properties {
            for object in &objects {
                let triple = TriplePattern {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object: object.clone(),
                };
                let pattern = GraphPattern::Bgp {
                    patterns: vec![triple],
                };
                patterns.push(if assertion.own_graph_only() {
                    GraphPattern::Graph {
                        name: NamedNodePattern::Variable(member.clone()),
                        inner: Box::new(pattern),
                    }
                } else {
                    pattern
                });
            }
        }
    }
    Ok(patterns)
}

fn constants(terms: &[Term]) -> Result<Vec<TermPattern>, InvalidMemberAssertion> {
    terms
        .iter()
        .map(|term| constant(term).ok_or_else(|| InvalidMemberAssertion::UnsupportedTerm(term.clone())))
        .collect()
}

/// Converts `term` into a constant of a pattern. Blank nodes would act as variables and are
/// rejected.
pub fn constant(term: &Term) -> Option<TermPattern> {
    match term {
        Term::NamedNode(node) => Some(TermPattern::NamedNode(node.clone())),
        Term::Literal(literal) => Some(TermPattern::Literal(literal.clone())),
        _ => None,
    }
}

/// The pattern used when a search variable has a value but no filter implementation: the member
/// must have `predicate` with exactly that value.
///
/// Only the first value is used.
pub fn equality_pattern(
    member: &Variable,
    predicate: &NamedNode,
    value: &Term,
) -> Option<GraphPattern> {
    Some(GraphPattern::Bgp {
        patterns: vec![TriplePattern {
            subject: TermPattern::Variable(member.clone()),
            predicate: NamedNodePattern::NamedNode(predicate.clone()),
            object: constant(value)?,
        }],
    })
}

/// Matches `subject path object`. Single predicates and inverse single predicates become plain
/// triple patterns.
pub fn path_pattern(
    subject: TermPattern,
    path: &PropertyPathExpression,
    object: TermPattern,
) -> GraphPattern {
    match path {
        PropertyPathExpression::NamedNode(predicate) => GraphPattern::Bgp {
            patterns: vec![TriplePattern {
                subject,
                predicate: NamedNodePattern::NamedNode(predicate.clone()),
                object,
            }],
        },
        PropertyPathExpression::Reverse(inner) => match inner.as_ref() {
            PropertyPathExpression::NamedNode(predicate) => GraphPattern::Bgp {
                patterns: vec![TriplePattern {
                    subject: object,
                    predicate: NamedNodePattern::NamedNode(predicate.clone()),
                    object: subject,
                }],
            },
            _ => GraphPattern::Path {
                subject,
                path: path.clone(),
                object,
            },
        },
        _ => GraphPattern::Path {
            subject,
            path: path.clone(),
            object,
        },
    }
}

/// Ordering fragments and the matching `ORDER BY` conditions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub fragments: Vec<Fragment>,
    pub conditions: Vec<OrderExpression>,
}

/// Binds one `orderN` variable per entry through an `OPTIONAL` path pattern and sorts by it.
///
/// Entries without a path are skipped. The counter only advances for used entries.
pub fn ordering(member: &Variable, entries: &[OrderEntry]) -> Ordering {
    let mut ordering = Ordering::default();
    for entry in entries {
        let Some(path) = entry.path() else {
            continue;
        };
        let variable = Variable::new_unchecked(format!("order{}", ordering.conditions.len() + 1));
        ordering.fragments.push(Fragment::Optional(path_pattern(
            TermPattern::Variable(member.clone()),
            path,
            TermPattern::Variable(variable.clone()),
        )));
        let expression = Expression::Variable(variable);
        ordering.conditions.push(if entry.descending() {
            OrderExpression::Desc(expression)
        } else {
            OrderExpression::Asc(expression)
        });
    }
    ordering
}

/// `FILTER(isIRI(?variable))`
pub fn is_iri(variable: &Variable) -> Expression {
    Expression::FunctionCall(Function::IsIri, vec![Expression::Variable(variable.clone())])
}

/// Combines fragments into one group graph pattern, in the given order.
///
/// Neighbouring basic graph patterns are merged so that the rendered query stays flat.
pub fn group(fragments: impl IntoIterator<Item = Fragment>) -> GraphPattern {
    fragments
        .into_iter()
        .fold(GraphPattern::Bgp { patterns: Vec::new() }, |acc, fragment| {
            match fragment {
                Fragment::Required(pattern) => join(acc, pattern),
                Fragment::Optional(pattern) => GraphPattern::LeftJoin {
                    left: Box::new(acc),
                    right: Box::new(pattern),
                    expression: None,
                },
            }
        })
}

fn join(left: GraphPattern, right: GraphPattern) -> GraphPattern {
    match (left, right) {
        (GraphPattern::Bgp { patterns: mut lhs }, GraphPattern::Bgp { patterns: rhs }) => {
            lhs.extend(rhs);
            GraphPattern::Bgp { patterns: lhs }
        }
        (GraphPattern::Bgp { patterns }, right) if patterns.is_empty() => right,
        (left, GraphPattern::Bgp { patterns }) if patterns.is_empty() => left,
        (left, right) => GraphPattern::Join {
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::MemberAssertion;
    use hydra_fusion_model::vocab::rdf;
    use hydra_fusion_model::{BlankNode, Literal};
    use proptest::prelude::*;

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn member() -> Variable {
        Variable::new_unchecked("member")
    }

    fn assertion(subjects: Vec<Term>, properties: Vec<Term>, objects: Vec<Term>) -> MemberAssertion {
        MemberAssertion::new(
            BlankNode::default().into(),
            subjects,
            properties,
            objects,
            false,
        )
    }

    #[test]
    fn type_assertion_binds_subject() {
        let patterns = member_assertion_patterns(
            &member(),
            &assertion(vec![], vec![rdf::TYPE.into_owned().into()], vec![ex("Person").into()]),
        )
        .unwrap();

        assert_eq!(
            patterns,
            vec![GraphPattern::Bgp {
                patterns: vec![TriplePattern {
                    subject: TermPattern::Variable(member()),
                    predicate: NamedNodePattern::NamedNode(rdf::TYPE.into_owned()),
                    object: TermPattern::NamedNode(ex("Person")),
                }]
            }]
        );
    }

    #[test]
    fn multiple_values_multiply() {
        let patterns = member_assertion_patterns(
            &member(),
            &assertion(
                vec![ex("a").into(), ex("b").into()],
                vec![ex("p").into(), ex("q").into()],
                vec![],
            ),
        )
        .unwrap();

        assert_eq!(patterns.len(), 4);
    }

    #[test]
    fn own_graph_only_wraps_in_graph() {
        let assertion = MemberAssertion::new(
            BlankNode::default().into(),
            vec![],
            vec![rdf::TYPE.into_owned().into()],
            vec![ex("Person").into()],
            true,
        );

        let patterns = member_assertion_patterns(&member(), &assertion).unwrap();

        assert!(matches!(
            &patterns[0],
            GraphPattern::Graph { name: NamedNodePattern::Variable(v), .. } if v == &member()
        ));
    }

    #[test]
    fn literal_property_is_invalid() {
        let result = member_assertion_patterns(
            &member(),
            &assertion(vec![], vec![Literal::from("p").into()], vec![ex("o").into()]),
        );
        assert!(matches!(result, Err(InvalidMemberAssertion::NonIriProperty(_))));
    }

    #[test]
    fn equality_uses_value_as_object() {
        let pattern = equality_pattern(&member(), &ex("name"), &Literal::from("Jane").into()).unwrap();
        assert_eq!(
            pattern,
            GraphPattern::Bgp {
                patterns: vec![TriplePattern {
                    subject: TermPattern::Variable(member()),
                    predicate: NamedNodePattern::NamedNode(ex("name")),
                    object: TermPattern::Literal(Literal::from("Jane")),
                }]
            }
        );
        assert!(equality_pattern(&member(), &ex("name"), &BlankNode::default().into()).is_none());
    }

    #[test]
    fn ordering_skips_entries_without_path() {
        let entries = vec![
            OrderEntry::new(None, false),
            OrderEntry::new(Some(PropertyPathExpression::NamedNode(ex("name"))), true),
        ];

        let ordering = ordering(&member(), &entries);

        assert_eq!(ordering.fragments.len(), 1);
        assert_eq!(
            ordering.conditions,
            vec![OrderExpression::Desc(Expression::Variable(
                Variable::new_unchecked("order1")
            ))]
        );
    }

    #[test]
    fn inverse_predicate_swaps_positions() {
        let pattern = path_pattern(
            TermPattern::Variable(member()),
            &PropertyPathExpression::Reverse(Box::new(PropertyPathExpression::NamedNode(ex("knows")))),
            TermPattern::Variable(Variable::new_unchecked("linked")),
        );
        let GraphPattern::Bgp { patterns } = pattern else {
            panic!("expected a basic graph pattern");
        };
        assert_eq!(patterns[0].object, TermPattern::Variable(member()));
    }

    #[test]
    fn filter_variables_do_not_collide() {
        let first = VariableGenerator::new("filter1");
        let second = VariableGenerator::new("filter2");
        assert_eq!(first.variable("var").as_str(), "filter1_var");
        assert_eq!(second.variable("var").as_str(), "filter2_var");
        assert_ne!(first.variable("var"), second.variable("var"));
        assert_eq!(first.variable("a-b").as_str(), "filter1_a_b");
    }

    #[test]
    fn group_merges_basic_patterns_and_keeps_optionals() {
        let bgp = |name: &str| GraphPattern::Bgp {
            patterns: vec![TriplePattern {
                subject: TermPattern::Variable(member()),
                predicate: NamedNodePattern::NamedNode(ex(name)),
                object: TermPattern::NamedNode(ex("o")),
            }],
        };

        let grouped = group([
            Fragment::Required(bgp("a")),
            Fragment::Required(bgp("b")),
            Fragment::Optional(bgp("c")),
        ]);

        let GraphPattern::LeftJoin { left, .. } = grouped else {
            panic!("expected an optional block");
        };
        assert!(matches!(*left, GraphPattern::Bgp { ref patterns } if patterns.len() == 2));
    }

    fn position() -> impl Strategy<Value = Vec<Term>> {
        prop_oneof![
            Just(Vec::new()),
            Just(vec![Term::from(ex("x"))]),
            Just(vec![Term::from(ex("x")), Term::from(ex("y"))]),
        ]
    }

    proptest! {
        #[test]
        fn only_two_bound_positions_are_valid(
            subjects in position(),
            properties in position(),
            objects in position(),
        ) {
            let bound = [&subjects, &properties, &objects]
                .iter()
                .filter(|values| !values.is_empty())
                .count();
            let combinations = subjects.len().max(1) * properties.len().max(1) * objects.len().max(1);

            let result = member_assertion_patterns(
                &member(),
                &assertion(subjects, properties, objects),
            );

            if bound == 2 {
                prop_assert_eq!(result.unwrap().len(), combinations);
            } else {
                prop_assert_eq!(result, Err(InvalidMemberAssertion::BoundPositions(bound)));
            }
        }
    }
}
