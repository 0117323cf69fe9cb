//! Search templates: the mapping between query string variables and graph properties.
//!
//! A [SearchTemplate] is used in both directions. Incoming query strings are parsed into
//! [SearchParams], a small graph with one node carrying a value for every mapped property. The
//! same parameters are expanded back into IRIs when computing pagination links.

mod expand;

use crate::strategy::ExtensionRef;
use hydra_fusion_model::vocab::{hydra, query, xsd};
use hydra_fusion_model::{
    BlankNode, GraphIndex, Literal, NamedNode, NamedNodeRef, Subject, Term, TermRef, Triple,
};

pub use expand::expand;

/// How values are written into and read from expanded templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VariableRepresentation {
    /// IRIs as is, literals by their lexical form.
    #[default]
    Basic,
    /// IRIs as is, literals quoted with their language tag or datatype.
    Explicit,
}

/// Relates a query string variable to a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMapping {
    variable: String,
    property: Option<NamedNode>,
    required: bool,
    filter: Option<ExtensionRef>,
}

impl VariableMapping {
    pub fn new(variable: impl Into<String>, property: Option<NamedNode>) -> Self {
        Self {
            variable: variable.into(),
            property,
            required: false,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ExtensionRef) -> Self {
        self.filter = Some(filter);
        self
    }

    fn read(graph: &GraphIndex, node: TermRef<'_>) -> Option<Self> {
        let Some(Term::Literal(variable)) = graph.object(node, hydra::VARIABLE) else {
            tracing::warn!(mapping = %node, "Ignoring template mapping without hydra:variable");
            return None;
        };
        let property = match graph.object(node, hydra::PROPERTY) {
            Some(Term::NamedNode(property)) => Some(property.clone()),
            Some(other) => {
                tracing::warn!(mapping = %node, property = %other, "Mapped property is not an IRI");
                None
            }
            None => None,
        };
        let required = matches!(
            graph.object(node, hydra::REQUIRED),
            Some(Term::Literal(value)) if value.value() == "true" || value.value() == "1"
        );
        let filter = graph
            .object(node, query::FILTER)
            .and_then(|filter| ExtensionRef::read(graph, filter.as_ref()));
        Some(Self {
            variable: variable.value().to_owned(),
            property,
            required,
            filter,
        })
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn property(&self) -> Option<&NamedNode> {
        self.property.as_ref()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn filter(&self) -> Option<&ExtensionRef> {
        self.filter.as_ref()
    }

    fn maps(&self, property: NamedNodeRef<'_>) -> bool {
        self.property.as_ref().is_some_and(|p| p.as_ref() == property)
    }
}

/// An IRI template with its variable mappings (`hydra:IriTemplate`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTemplate {
    template: String,
    representation: VariableRepresentation,
    mappings: Vec<VariableMapping>,
}

impl SearchTemplate {
    pub fn new(
        template: impl Into<String>,
        representation: VariableRepresentation,
        mappings: Vec<VariableMapping>,
    ) -> Self {
        Self {
            template: template.into(),
            representation,
            mappings,
        }
    }

    /// Reads the template described by `node`. Templates without a `hydra:template` string are
    /// ignored.
    pub fn read(graph: &GraphIndex, node: TermRef<'_>) -> Option<Self> {
        let Some(Term::Literal(template)) = graph.object(node, hydra::TEMPLATE) else {
            tracing::warn!(template = %node, "Ignoring search template without hydra:template");
            return None;
        };
        let representation = match graph.object(node, hydra::VARIABLE_REPRESENTATION) {
            Some(Term::NamedNode(r)) if r.as_ref() == hydra::EXPLICIT_REPRESENTATION => {
                VariableRepresentation::Explicit
            }
            _ => VariableRepresentation::Basic,
        };
        let mappings = graph
            .objects(node, hydra::MAPPING)
            .filter_map(|mapping| VariableMapping::read(graph, mapping.as_ref()))
            .collect();
        let search = Self::new(template.value(), representation, mappings);
        for mapping in search.unused_mappings() {
            tracing::warn!(
                template = %search.template,
                variable = %mapping.variable,
                "Mapped variable does not appear in the template"
            );
        }
        Some(search)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn representation(&self) -> VariableRepresentation {
        self.representation
    }

    pub fn mappings(&self) -> &[VariableMapping] {
        &self.mappings
    }

    /// The mapping of the page index, if the collection is paged.
    pub fn page_index_mapping(&self) -> Option<&VariableMapping> {
        self.mappings.iter().find(|m| m.maps(hydra::PAGE_INDEX))
    }

    /// The mapping that lets clients choose the page size.
    pub fn limit_mapping(&self) -> Option<&VariableMapping> {
        self.mappings.iter().find(|m| m.maps(hydra::LIMIT))
    }

    /// Mappings whose variable the template never expands. Their values are still parsed from
    /// query strings but are lost in generated links.
    pub fn unused_mappings(&self) -> impl Iterator<Item = &VariableMapping> + '_ {
        let used = expand::variables(&self.template);
        self.mappings
            .iter()
            .filter(move |mapping| !used.contains(&mapping.variable.as_str()))
    }

    pub fn is_paged(&self) -> bool {
        self.page_index_mapping().is_some()
    }

    /// Mappings that restrict the members. Pagination mappings and mappings without a property
    /// are excluded.
    pub fn filter_mappings(&self) -> impl Iterator<Item = (&VariableMapping, &NamedNode)> + '_ {
        self.mappings.iter().filter_map(|mapping| {
            let property = mapping.property()?;
            let is_pagination = property.as_ref() == hydra::PAGE_INDEX
                || property.as_ref() == hydra::LIMIT;
            (!is_pagination).then_some((mapping, property))
        })
    }

    /// Parses a query string (`name=Jane&page=2`) into search parameters.
    ///
    /// Variables that are not mapped are ignored. A variable given several times gets several
    /// values.
    pub fn parse_query(&self, query_string: &str) -> SearchParams {
        let node = Subject::from(BlankNode::default());
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);
        let triples = url::form_urlencoded::parse(query_string.as_bytes())
            .filter_map(|(name, value)| {
                let Some(property) = self
                    .mappings
                    .iter()
                    .find(|m| m.variable == name)
                    .and_then(VariableMapping::property)
                else {
                    tracing::debug!(variable = %name, "Ignoring unmapped query string variable");
                    return None;
                };
                let value = self.read_value(property, &value);
                Some(Triple::new(node.clone(), property.clone(), value))
            })
            .collect::<GraphIndex>();
        SearchParams::new(node, triples)
    }

    /// Expands the template with the values in `params`.
    pub fn expand(&self, params: &SearchParams) -> String {
        expand(&self.template, |name| {
            self.mappings
                .iter()
                .find(|m| m.variable == name)
                .and_then(VariableMapping::property)
                .map(|property| {
                    params
                        .values(property.as_ref())
                        .filter_map(|value| self.write_value(value))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    fn write_value(&self, value: &Term) -> Option<String> {
        match (value, self.representation) {
            (Term::NamedNode(iri), _) => Some(iri.as_str().to_owned()),
            (Term::Literal(literal), VariableRepresentation::Basic) => {
                Some(literal.value().to_owned())
            }
            (Term::Literal(literal), VariableRepresentation::Explicit) => {
                Some(if let Some(language) = literal.language() {
                    format!("\"{}\"@{language}", literal.value())
                } else if literal.datatype() == xsd::STRING {
                    format!("\"{}\"", literal.value())
                } else {
                    format!("\"{}\"^^{}", literal.value(), literal.datatype().as_str())
                })
            }
            _ => None,
        }
    }

    fn read_value(&self, property: &NamedNode, value: &str) -> Term {
        if property.as_ref() == hydra::PAGE_INDEX || property.as_ref() == hydra::LIMIT {
            if value.parse::<u64>().is_ok() {
                return Literal::new_typed_literal(value, xsd::INTEGER).into();
            }
        }
        match self.representation {
            VariableRepresentation::Basic => read_basic(value),
            VariableRepresentation::Explicit => read_explicit(value),
        }
    }
}

fn read_basic(value: &str) -> Term {
    let looks_like_iri = value.contains("://") || value.starts_with("urn:");
    match NamedNode::new(value) {
        Ok(iri) if looks_like_iri => iri.into(),
        _ => Literal::new_simple_literal(value).into(),
    }
}

fn read_explicit(value: &str) -> Term {
    let Some(quoted) = value.strip_prefix('"') else {
        return NamedNode::new(value)
            .map(Term::from)
            .unwrap_or_else(|_| Literal::new_simple_literal(value).into());
    };
    let Some((lexical, suffix)) = quoted.rsplit_once('"') else {
        return Literal::new_simple_literal(value).into();
    };
    if let Some(language) = suffix.strip_prefix('@') {
        if let Ok(literal) = Literal::new_language_tagged_literal(lexical, language) {
            return literal.into();
        }
    }
    if let Some(datatype) = suffix.strip_prefix("^^") {
        let datatype = datatype.trim_start_matches('<').trim_end_matches('>');
        if let Ok(datatype) = NamedNode::new(datatype) {
            return Literal::new_typed_literal(lexical, datatype).into();
        }
    }
    Literal::new_simple_literal(lexical).into()
}

/// The values of the search variables of one request.
///
/// All values hang off a single node. Instances are immutable: replacing a value produces new
/// parameters.
#[derive(Debug, Clone)]
pub struct SearchParams {
    node: Subject,
    graph: GraphIndex,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new(BlankNode::default(), GraphIndex::default())
    }
}

impl SearchParams {
    pub fn new(node: impl Into<Subject>, graph: GraphIndex) -> Self {
        Self {
            node: node.into(),
            graph,
        }
    }

    pub fn node(&self) -> &Subject {
        &self.node
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    /// Returns the values given for `property`.
    pub fn values<'a>(&'a self, property: NamedNodeRef<'_>) -> impl Iterator<Item = &'a Term> + 'a {
        self.graph.objects(self.node.as_ref().into(), property)
    }

    /// Returns the first value of `property` as a non-negative integer.
    pub fn integer(&self, property: NamedNodeRef<'_>) -> Option<usize> {
        self.values(property).find_map(|value| match value {
            Term::Literal(literal) => literal.value().trim().parse().ok(),
            _ => None,
        })
    }

    /// Replaces all values of `property` with `values`.
    #[must_use]
    pub fn with_values(
        &self,
        property: NamedNodeRef<'_>,
        values: impl IntoIterator<Item = Term>,
    ) -> Self {
        let node = self.node.clone();
        let kept = self
            .graph
            .iter()
            .filter(|t| !(t.subject == node && t.predicate.as_ref() == property))
            .cloned();
        let added = values
            .into_iter()
            .map(|value| Triple::new(node.clone(), property.into_owned(), value));
        Self::new(node.clone(), kept.chain(added).collect())
    }
}
