use hydra_fusion_model::Triple;
use sparesults::QuerySolution;
use std::fmt::{Display, Formatter};

/// The result of a query, shaped after its query form.
#[derive(Debug)]
pub enum QueryResults {
    /// Rows of variable bindings (`SELECT`).
    Solutions(Vec<QuerySolution>),
    /// Triples (`CONSTRUCT` and `DESCRIBE`).
    Graph(Vec<Triple>),
    /// A single boolean (`ASK`).
    Boolean(bool),
}

impl QueryResults {
    pub fn shape(&self) -> ResultShape {
        match self {
            QueryResults::Solutions(_) => ResultShape::Solutions,
            QueryResults::Graph(_) => ResultShape::Graph,
            QueryResults::Boolean(_) => ResultShape::Boolean,
        }
    }
}

/// The kind of a [QueryResults].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Solutions,
    Graph,
    Boolean,
}

impl Display for ResultShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultShape::Solutions => f.write_str("solutions"),
            ResultShape::Graph => f.write_str("a graph"),
            ResultShape::Boolean => f.write_str("a boolean"),
        }
    }
}
