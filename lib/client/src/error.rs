use crate::ResultShape;
use oxrdfio::RdfParseError;
use sparesults::QueryResultsParseError;
use std::error::Error;

/// An error raised while executing a query against a triple store.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered with a non-success status code.
    #[error("The SPARQL endpoint answered with status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, as far as it could be decoded.
        body: String,
    },
    /// The solutions or the boolean returned by the endpoint could not be parsed.
    #[error(transparent)]
    Results(#[from] QueryResultsParseError),
    /// The triples returned by the endpoint could not be parsed.
    #[error(transparent)]
    Rdf(#[from] RdfParseError),
    /// The endpoint returned a different kind of result than the query form implies.
    #[error("Expected {expected} but the query returned {actual}")]
    UnexpectedResultShape {
        expected: ResultShape,
        actual: ResultShape,
    },
    /// An error raised by another [`SparqlClient`](crate::SparqlClient) implementation.
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl ClientError {
    /// Wraps an error of a custom client implementation.
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}
