#![allow(dead_code)]

use async_trait::async_trait;
use hydra_fusion::client::{ClientError, QueryResults, SparqlClient};
use hydra_fusion::model::sparql::Query;
use hydra_fusion::model::{GraphIndex, GraphName, NamedNode, Quad, Triple};
use hydra_fusion::strategy::{StrategyRegistry, StrategyResolver};
use hydra_fusion::{Api, ApiSnapshot, CollectionEngine};
use oxigraph::store::Store;
use oxrdfio::{RdfFormat, RdfParser};
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

pub const PREFIXES: &str = r"
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix hydra: <http://www.w3.org/ns/hydra/core#> .
@prefix query: <https://hypermedia.app/query#> .
@prefix code: <https://code.described.at/> .
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix ex: <http://example.com/> .
";

pub fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

pub fn schema(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://schema.org/{name}"))
}

/// Parses Turtle, prepended with the common prefixes.
pub fn turtle(data: &str) -> Result<Vec<Triple>, Box<dyn Error>> {
    let data = format!("{PREFIXES}{data}");
    RdfParser::from_format(RdfFormat::Turtle)
        .for_reader(data.as_bytes())
        .map(|quad| Ok(Triple::from(quad?)))
        .collect()
}

pub fn graph(data: &str) -> Result<GraphIndex, Box<dyn Error>> {
    Ok(GraphIndex::new(turtle(data)?))
}

/// A [SparqlClient] backed by an in-memory Oxigraph store that records every query it runs.
pub struct StoreClient {
    store: Store,
    queries: Mutex<Vec<String>>,
}

impl StoreClient {
    pub fn new(data: &str) -> Result<Self, Box<dyn Error>> {
        let store = Store::new()?;
        for triple in turtle(data)? {
            store.insert(&Quad::new(
                triple.subject,
                triple.predicate,
                triple.object,
                GraphName::DefaultGraph,
            ))?;
        }
        Ok(Self {
            store,
            queries: Mutex::default(),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SparqlClient for StoreClient {
    async fn query(&self, query: &Query) -> Result<QueryResults, ClientError> {
        let query = query.to_string();
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        match self.store.query(query.as_str()).map_err(ClientError::other)? {
            oxigraph::sparql::QueryResults::Solutions(solutions) => Ok(QueryResults::Solutions(
                solutions
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(ClientError::other)?,
            )),
            oxigraph::sparql::QueryResults::Graph(triples) => Ok(QueryResults::Graph(
                triples
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(ClientError::other)?,
            )),
            oxigraph::sparql::QueryResults::Boolean(value) => Ok(QueryResults::Boolean(value)),
        }
    }
}

/// A client whose endpoint is down.
pub struct Unreachable;

#[async_trait]
impl SparqlClient for Unreachable {
    async fn query(&self, _query: &Query) -> Result<QueryResults, ClientError> {
        Err(ClientError::Status {
            status: 503,
            body: "Service Unavailable".to_owned(),
        })
    }
}

pub fn engine(
    client: Arc<impl SparqlClient + 'static>,
    api: &str,
    registry: StrategyRegistry,
) -> Result<CollectionEngine, Box<dyn Error>> {
    let resolver: Arc<dyn StrategyResolver> = Arc::new(registry);
    let snapshot = ApiSnapshot::new(graph(api)?, resolver);
    Ok(CollectionEngine::new(client, Arc::new(Api::new(snapshot))))
}
