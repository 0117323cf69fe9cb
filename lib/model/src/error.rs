use oxrdf::Term;

/// An error raised while reading a structure out of a [`GraphIndex`](crate::GraphIndex).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An `rdf:List` that has no `rdf:first`, more than one `rdf:rest` or loops back on itself.
    #[error("Malformed RDF list at {0}")]
    MalformedList(Term),
    /// A node that is neither an IRI, a list of path segments nor an inverse path.
    #[error("Unsupported property path {0}")]
    UnsupportedPath(Term),
    /// A path given as an empty list.
    #[error("Empty property path at {0}")]
    EmptyPath(Term),
}
