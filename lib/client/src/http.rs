use crate::{ClientError, QueryResults, SparqlClient};
use async_trait::async_trait;
use hydra_fusion_model::sparql::Query;
use hydra_fusion_model::Triple;
use oxrdfio::{RdfFormat, RdfParser};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use sparesults::{QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput};
use url::Url;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const N_TRIPLES: &str = "application/n-triples";

/// A [SparqlClient] talking to a remote endpoint through the
/// [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/).
///
/// Queries are sent with `POST` as `application/sparql-query`. Solutions and booleans are read as
/// SPARQL JSON results, triples as N-Triples.
#[derive(Debug, Clone)]
pub struct HttpSparqlClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSparqlClient {
    /// Creates a client for the query `endpoint` with a default HTTP client.
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    /// Creates a client for the query `endpoint` that sends its requests through `client`.
    pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SparqlClient for HttpSparqlClient {
    async fn query(&self, query: &Query) -> Result<QueryResults, ClientError> {
        let returns_graph = matches!(query, Query::Construct { .. } | Query::Describe { .. });
        let accept = if returns_graph {
            N_TRIPLES
        } else {
            SPARQL_RESULTS_JSON
        };
        tracing::debug!(endpoint = %self.endpoint, %query, "Sending query");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, SPARQL_QUERY)
            .header(ACCEPT, accept)
            .body(query.to_string())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|error| {
                tracing::debug!(%status, %error, "Unable to read the body of a failed response");
                String::new()
            });
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.bytes().await?;

        if returns_graph {
            parse_triples(&body).map(QueryResults::Graph)
        } else {
            parse_results(&body)
        }
    }
}

fn parse_triples(body: &[u8]) -> Result<Vec<Triple>, ClientError> {
    RdfParser::from_format(RdfFormat::NTriples)
        .for_reader(body)
        .map(|quad| {
            let quad = quad?;
            Ok(Triple::new(quad.subject, quad.predicate, quad.object))
        })
        .collect()
}

fn parse_results(body: &[u8]) -> Result<QueryResults, ClientError> {
    match QueryResultsParser::from_format(QueryResultsFormat::Json).for_reader(body)? {
        ReaderQueryResultsParserOutput::Solutions(solutions) => Ok(QueryResults::Solutions(
            solutions.collect::<Result<Vec<_>, _>>()?,
        )),
        ReaderQueryResultsParserOutput::Boolean(value) => Ok(QueryResults::Boolean(value)),
    }
}
