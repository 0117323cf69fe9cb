//! Page size resolution and the `hydra:PartialCollectionView` of a rendered page.

use crate::description::CollectionDescription;
use crate::template::{SearchParams, SearchTemplate};
use hydra_fusion_model::vocab::{hydra, rdf, xsd};
use hydra_fusion_model::{Iri, Literal, NamedNode, Term, Triple};

/// The page a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page index.
    pub index: usize,
    /// Number of members per page, never zero.
    pub size: usize,
}

impl PageRequest {
    /// Resolves the requested page of a paged collection, or [None] if the collection is not
    /// paged.
    ///
    /// The page size comes from the first of: the request's `hydra:limit` value, the collection's
    /// `hydra:limit`, the `hydra:limit` of its class, `default_size`. The page index defaults
    /// to 1.
    pub fn resolve(
        collection: &CollectionDescription,
        params: &SearchParams,
        default_size: usize,
    ) -> Option<Self> {
        if !collection.search().is_some_and(SearchTemplate::is_paged) {
            return None;
        }
        let size = params
            .integer(hydra::LIMIT)
            .filter(|size| *size > 0)
            .or(collection.instance_limit())
            .or(collection.class_limit())
            .unwrap_or(default_size)
            .max(1);
        let index = params
            .integer(hydra::PAGE_INDEX)
            .filter(|index| *index > 0)
            .unwrap_or(1);
        Some(Self { index, size })
    }

    /// The number of members skipped before this page.
    pub fn offset(&self) -> usize {
        (self.index - 1).saturating_mul(self.size)
    }
}

/// Pagination links of one rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub id: NamedNode,
    pub first: NamedNode,
    pub previous: Option<NamedNode>,
    pub next: Option<NamedNode>,
    pub last: NamedNode,
    pub page: usize,
    pub total_pages: usize,
}

impl View {
    /// Describes the view as a `hydra:PartialCollectionView` of `collection`.
    pub fn to_triples(&self, collection: &NamedNode) -> Vec<Triple> {
        let mut triples = vec![
            Triple::new(collection.clone(), hydra::VIEW, self.id.clone()),
            Triple::new(
                self.id.clone(),
                rdf::TYPE,
                hydra::PARTIAL_COLLECTION_VIEW.into_owned(),
            ),
            Triple::new(self.id.clone(), hydra::FIRST, self.first.clone()),
            Triple::new(self.id.clone(), hydra::LAST, self.last.clone()),
        ];
        if let Some(previous) = &self.previous {
            triples.push(Triple::new(self.id.clone(), hydra::PREVIOUS, previous.clone()));
        }
        if let Some(next) = &self.next {
            triples.push(Triple::new(self.id.clone(), hydra::NEXT, next.clone()));
        }
        triples
    }
}

/// Computes the pagination links for page `params` of a collection with `total` members.
///
/// Returns [None] if the template has no page index variable or if an expanded link is not a
/// valid IRI. Relative templates are resolved against `base`. Page 1 is always written without
/// a page index so that the first page has a single IRI.
pub fn compute_view(
    template: &SearchTemplate,
    params: &SearchParams,
    total: usize,
    page_size: usize,
    base: &NamedNode,
) -> Option<View> {
    if !template.is_paged() {
        return None;
    }
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size).max(1);
    let page = params
        .integer(hydra::PAGE_INDEX)
        .filter(|page| *page > 0)
        .unwrap_or(1);
    let base = match Iri::parse(base.as_str().to_owned()) {
        Ok(base) => base,
        Err(error) => {
            tracing::warn!(%base, %error, "Collection IRI cannot be used as a base IRI");
            return None;
        }
    };
    let link = |page: usize| -> Option<NamedNode> {
        let values = (page > 1).then(|| {
            Term::from(Literal::new_typed_literal(page.to_string(), xsd::INTEGER))
        });
        let expanded = template.expand(&params.with_values(hydra::PAGE_INDEX, values));
        match base.resolve(&expanded) {
            Ok(iri) => Some(NamedNode::new_unchecked(iri.into_inner())),
            Err(error) => {
                tracing::warn!(link = %expanded, %error, "Expanded view link is not a valid IRI");
                None
            }
        }
    };

    Some(View {
        id: link(page)?,
        first: link(1)?,
        previous: if page > 1 { Some(link(page - 1)?) } else { None },
        next: if page < total_pages {
            Some(link(page + 1)?)
        } else {
            None
        },
        last: link(total_pages)?,
        page,
        total_pages,
    })
}

/// `collection hydra:totalItems total`
pub fn total_items(collection: &NamedNode, total: usize) -> Triple {
    Triple::new(
        collection.clone(),
        hydra::TOTAL_ITEMS,
        Literal::new_typed_literal(total.to_string(), xsd::INTEGER),
    )
}
