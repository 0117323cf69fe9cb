mod error;
mod index;
mod path;
pub mod vocab;

pub use error::*;
pub use index::GraphIndex;
pub use path::read_property_path;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, GraphName, IriParseError, Literal, LiteralRef, NamedNode,
    NamedNodeRef, NamedOrBlankNode, Quad, Subject, SubjectRef, Term, TermRef, Triple, TripleRef,
    Variable, VariableRef,
};

/// The SPARQL algebra that compiled queries are expressed in.
pub mod sparql {
    pub use spargebra::algebra::{
        AggregateExpression, AggregateFunction, Expression, Function, GraphPattern,
        OrderExpression, PropertyPathExpression,
    };
    pub use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};
    pub use spargebra::{Query, SparqlSyntaxError};
}
