use hydra_fusion_client::ClientError;
use hydra_fusion_model::{NamedNode, Term};

/// An error raised while rendering a collection or describing a resource.
///
/// Configuration defects like invalid member assertions or missing filters are not errors. They
/// are logged and the offending declaration is skipped.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CollectionError {
    /// The query endpoint failed. Propagated unmodified.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// More than one strategy was declared where exactly one is allowed.
    #[error("{resource} declares {count} describe strategies, at most one is allowed")]
    AmbiguousStrategy { resource: Term, count: usize },
    /// A strategy that must be used could not be resolved.
    #[error("The describe strategy {reference} of {resource} could not be resolved")]
    UnresolvedStrategy { resource: Term, reference: NamedNode },
}
