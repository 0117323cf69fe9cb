use crate::vocab::sh;
use crate::{GraphError, GraphIndex};
use oxrdf::{Term, TermRef};
use spargebra::algebra::PropertyPathExpression;

/// Reads the property path described by `node`.
///
/// Three shapes are supported:
/// - an IRI, used as a single predicate,
/// - an `rdf:List` of paths, read as a sequence,
/// - a node with `sh:inversePath`, read as the inverse of its value.
pub fn read_property_path(
    graph: &GraphIndex,
    node: TermRef<'_>,
) -> Result<PropertyPathExpression, GraphError> {
    match node {
        TermRef::NamedNode(predicate) => {
            Ok(PropertyPathExpression::NamedNode(predicate.into_owned()))
        }
        TermRef::BlankNode(_) => {
            if let Some(inverse) = graph.object(node, sh::INVERSE_PATH) {
                let inner = read_property_path(graph, inverse.as_ref())?;
                return Ok(PropertyPathExpression::Reverse(Box::new(inner)));
            }
            if graph.is_list(node) {
                return read_sequence(graph, node);
            }
            Err(GraphError::UnsupportedPath(node.into_owned()))
        }
        _ => Err(GraphError::UnsupportedPath(node.into_owned())),
    }
}

fn read_sequence(
    graph: &GraphIndex,
    head: TermRef<'_>,
) -> Result<PropertyPathExpression, GraphError> {
    let segments = graph
        .list(head)?
        .iter()
        .map(|segment: &Term| read_property_path(graph, segment.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    segments
        .into_iter()
        .reduce(|lhs, rhs| PropertyPathExpression::Sequence(Box::new(lhs), Box::new(rhs)))
        .ok_or_else(|| GraphError::EmptyPath(head.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::rdf;
    use oxrdf::{BlankNode, Literal, NamedNode, Triple};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn iri_is_single_segment() {
        let path = read_property_path(&GraphIndex::default(), ex("p").as_ref().into()).unwrap();
        assert_eq!(path, PropertyPathExpression::NamedNode(ex("p")));
    }

    #[test]
    fn inverse_of_sequence() {
        let inverse = BlankNode::default();
        let head = BlankNode::default();
        let tail = BlankNode::default();
        let graph = GraphIndex::new([
            Triple::new(inverse.clone(), sh::INVERSE_PATH, head.clone()),
            Triple::new(head.clone(), rdf::FIRST, ex("a")),
            Triple::new(head.clone(), rdf::REST, tail.clone()),
            Triple::new(tail.clone(), rdf::FIRST, ex("b")),
            Triple::new(tail.clone(), rdf::REST, rdf::NIL.into_owned()),
        ]);

        let path = read_property_path(&graph, inverse.as_ref().into()).unwrap();

        assert_eq!(
            path,
            PropertyPathExpression::Reverse(Box::new(PropertyPathExpression::Sequence(
                Box::new(PropertyPathExpression::NamedNode(ex("a"))),
                Box::new(PropertyPathExpression::NamedNode(ex("b"))),
            )))
        );
    }

    #[test]
    fn literal_is_not_a_path() {
        let literal = Literal::from("name");
        assert!(matches!(
            read_property_path(&GraphIndex::default(), literal.as_ref().into()),
            Err(GraphError::UnsupportedPath(_))
        ));
    }

    #[test]
    fn blank_node_without_structure_is_not_a_path() {
        let node = BlankNode::default();
        assert!(read_property_path(&GraphIndex::default(), node.as_ref().into()).is_err());
    }
}
