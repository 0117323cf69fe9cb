//! Compiles [Hydra](https://www.hydra-cg.com/spec/latest/core/) collection descriptions into
//! SPARQL queries and renders collection pages from their results.
//!
//! A collection declares which resources are its members (`hydra:memberAssertion`), how clients
//! may search it (`hydra:search`), how its pages are ordered (`query:order`) and which linked
//! resources are loaded with every member (`query:memberInclude`, `query:include`). The
//! [`CollectionEngine`] turns these declarations into a member query, a total query and a single
//! query loading the member data, runs them through a [`SparqlClient`](client::SparqlClient) and
//! merges the results with the pagination view.

pub mod api;
mod collection;
pub mod description;
mod error;
pub mod links;
pub mod members;
mod options;
pub mod patterns;
pub mod strategy;
pub mod template;
pub mod view;

pub use api::{Api, ApiSnapshot};
pub use collection::{CollectionEngine, CollectionResponse};
pub use description::CollectionDescription;
pub use error::CollectionError;
pub use members::MemberQueries;
pub use options::CollectionOptions;
pub use template::{SearchParams, SearchTemplate};
pub use view::{PageRequest, View};

pub mod model {
    //! The RDF model, re-exported from `hydra-fusion-model`.
    pub use hydra_fusion_model::*;
}

pub mod client {
    //! The query execution client, re-exported from `hydra-fusion-client`.
    pub use hydra_fusion_client::*;
}
