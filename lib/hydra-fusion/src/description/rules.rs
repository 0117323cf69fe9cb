use hydra_fusion_model::sparql::PropertyPathExpression;
use hydra_fusion_model::vocab::{hydra, query};
use hydra_fusion_model::{read_property_path, GraphError, GraphIndex, NamedNode, Term, TermRef};

/// A template for the triples that make a resource a member (`hydra:memberAssertion`).
///
/// Valid assertions bind exactly two of their three positions; the free position is the member.
/// Validity is checked when the assertion is turned into patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAssertion {
    node: Term,
    subjects: Vec<Term>,
    properties: Vec<Term>,
    objects: Vec<Term>,
    own_graph_only: bool,
}

impl MemberAssertion {
    pub fn new(
        node: Term,
        subjects: Vec<Term>,
        properties: Vec<Term>,
        objects: Vec<Term>,
        own_graph_only: bool,
    ) -> Self {
        Self {
            node,
            subjects,
            properties,
            objects,
            own_graph_only,
        }
    }

    pub fn read(graph: &GraphIndex, node: TermRef<'_>) -> Self {
        let values = |predicate| graph.objects(node, predicate).cloned().collect();
        let own_graph_only = matches!(
            graph.object(node, query::OWN_GRAPH_ONLY),
            Some(Term::Literal(value)) if value.value() == "true" || value.value() == "1"
        );
        Self::new(
            node.into_owned(),
            values(hydra::SUBJECT),
            values(hydra::PROPERTY),
            values(hydra::OBJECT),
            own_graph_only,
        )
    }

    /// The node describing the assertion. Two assertions are the same rule iff their nodes are
    /// equal.
    pub fn node(&self) -> &Term {
        &self.node
    }

    pub fn subjects(&self) -> &[Term] {
        &self.subjects
    }

    pub fn properties(&self) -> &[Term] {
        &self.properties
    }

    pub fn objects(&self) -> &[Term] {
        &self.objects
    }

    pub fn own_graph_only(&self) -> bool {
        self.own_graph_only
    }
}

/// One step of an ordering rule: a property path and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    path: Option<PropertyPathExpression>,
    descending: bool,
}

impl OrderEntry {
    pub fn new(path: Option<PropertyPathExpression>, descending: bool) -> Self {
        Self { path, descending }
    }

    /// Reads an entry of a `query:order` list. An invalid path is logged and leaves the entry
    /// without a path.
    pub fn read(graph: &GraphIndex, node: TermRef<'_>) -> Self {
        let path = match graph.object(node, query::PATH) {
            Some(path) => read_property_path(graph, path.as_ref())
                .inspect_err(|error| {
                    tracing::warn!(entry = %node, %error, "Ignoring invalid ordering path");
                })
                .ok(),
            None => {
                tracing::warn!(entry = %node, "Ordering entry has no query:path");
                None
            }
        };
        let descending = graph
            .object(node, query::DIRECTION)
            .is_some_and(|direction| direction.as_ref() == TermRef::from(query::DESCENDING));
        Self::new(path, descending)
    }

    pub fn path(&self) -> Option<&PropertyPathExpression> {
        self.path.as_ref()
    }

    pub fn descending(&self) -> bool {
        self.descending
    }
}

/// A path to resources that are loaded together with the resource it starts from.
#[derive(Debug, Clone)]
pub struct IncludeRule {
    node: Term,
    path: Result<PropertyPathExpression, GraphError>,
    member_type: Option<NamedNode>,
}

impl IncludeRule {
    pub fn new(node: Term, path: Result<PropertyPathExpression, GraphError>) -> Self {
        Self {
            node,
            path,
            member_type: None,
        }
    }

    /// Restricts the rule to resources of type `class`.
    #[must_use]
    pub fn for_type(mut self, class: NamedNode) -> Self {
        self.member_type = Some(class);
        self
    }

    /// Reads a `query:include` or `query:memberInclude` value. The path is either given with
    /// `query:path` or is the value itself.
    pub fn read(graph: &GraphIndex, node: TermRef<'_>) -> Self {
        let path = match graph.object(node, query::PATH) {
            Some(path) => read_property_path(graph, path.as_ref()),
            None => read_property_path(graph, node),
        };
        Self::new(node.into_owned(), path)
    }

    pub fn node(&self) -> &Term {
        &self.node
    }

    /// The path, or the reason why it could not be read.
    pub fn path(&self) -> Result<&PropertyPathExpression, &GraphError> {
        self.path.as_ref()
    }

    /// The type a resource must have for the path to be followed from it, if any.
    pub fn member_type(&self) -> Option<&NamedNode> {
        self.member_type.as_ref()
    }
}

impl From<PropertyPathExpression> for IncludeRule {
    fn from(path: PropertyPathExpression) -> Self {
        let node = match &path {
            PropertyPathExpression::NamedNode(predicate) => Term::from(predicate.clone()),
            _ => Term::from(hydra_fusion_model::BlankNode::default()),
        };
        Self::new(node, Ok(path))
    }
}
