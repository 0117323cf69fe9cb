use crate::{ClientError, QueryResults, ResultShape};
use async_trait::async_trait;
use hydra_fusion_model::sparql::Query;
use hydra_fusion_model::Triple;
use sparesults::QuerySolution;

/// Executes queries against a triple store.
///
/// Implementations must be safe to use from concurrent requests. They perform no retries: a failed
/// request is reported to the caller as is.
#[async_trait]
pub trait SparqlClient: Send + Sync {
    /// Executes `query` and returns the results in the shape of its query form.
    async fn query(&self, query: &Query) -> Result<QueryResults, ClientError>;

    /// Executes a `SELECT` query.
    async fn select(&self, query: &Query) -> Result<Vec<QuerySolution>, ClientError> {
        match self.query(query).await? {
            QueryResults::Solutions(solutions) => Ok(solutions),
            other => Err(unexpected(ResultShape::Solutions, &other)),
        }
    }

    /// Executes a `CONSTRUCT` query.
    async fn construct(&self, query: &Query) -> Result<Vec<Triple>, ClientError> {
        match self.query(query).await? {
            QueryResults::Graph(triples) => Ok(triples),
            other => Err(unexpected(ResultShape::Graph, &other)),
        }
    }

    /// Executes a `DESCRIBE` query.
    async fn describe(&self, query: &Query) -> Result<Vec<Triple>, ClientError> {
        self.construct(query).await
    }

    /// Executes an `ASK` query.
    async fn ask(&self, query: &Query) -> Result<bool, ClientError> {
        match self.query(query).await? {
            QueryResults::Boolean(value) => Ok(value),
            other => Err(unexpected(ResultShape::Boolean, &other)),
        }
    }
}

fn unexpected(expected: ResultShape, actual: &QueryResults) -> ClientError {
    ClientError::UnexpectedResultShape {
        expected,
        actual: actual.shape(),
    }
}
