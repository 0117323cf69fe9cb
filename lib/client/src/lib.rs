//! Access to a triple store through the four SPARQL query forms.
//!
//! The entry point of the crate is the [`SparqlClient`] trait. [`HttpSparqlClient`] implements it
//! on top of the [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/).

mod client;
mod error;
mod http;
mod results;

pub use client::SparqlClient;
pub use error::ClientError;
pub use http::HttpSparqlClient;
pub use results::{QueryResults, ResultShape};
pub use sparesults::QuerySolution;
