//! IRIs of the vocabularies used to describe collections.

pub use oxrdf::vocab::{rdf, rdfs, xsd};

pub mod hydra {
    //! [Hydra Core Vocabulary](https://www.hydra-cg.com/spec/latest/core/)
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/ns/hydra/core#";

    pub const COLLECTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#Collection");
    pub const MEMBER_ASSERTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#memberAssertion");
    /// Predecessor of [`MEMBER_ASSERTION`].
    pub const MANAGES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#manages");
    pub const SUBJECT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#subject");
    pub const PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#property");
    pub const OBJECT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#object");
    pub const MEMBER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#member");
    pub const SEARCH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#search");
    pub const TEMPLATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#template");
    pub const MAPPING: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#mapping");
    pub const VARIABLE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#variable");
    pub const REQUIRED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#required");
    pub const VARIABLE_REPRESENTATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#variableRepresentation");
    pub const BASIC_REPRESENTATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#BasicRepresentation");
    pub const EXPLICIT_REPRESENTATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#ExplicitRepresentation");
    pub const LIMIT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#limit");
    pub const PAGE_INDEX: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#pageIndex");
    pub const TOTAL_ITEMS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#totalItems");
    pub const VIEW: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#view");
    pub const PARTIAL_COLLECTION_VIEW: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#PartialCollectionView");
    pub const FIRST: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#first");
    pub const PREVIOUS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#previous");
    pub const NEXT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#next");
    pub const LAST: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/hydra/core#last");
}

pub mod query {
    //! Extension vocabulary for filtering, ordering and eager loading of collections.
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "https://hypermedia.app/query#";

    pub const FILTER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#filter");
    pub const ORDER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#order");
    pub const PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#path");
    pub const DIRECTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#direction");
    pub const ASCENDING: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#ascending");
    pub const DESCENDING: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#descending");
    /// Links fetched alongside a resource of the annotated class.
    pub const INCLUDE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#include");
    /// Links fetched alongside every member of the annotated collection.
    pub const MEMBER_INCLUDE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#memberInclude");
    pub const OWN_GRAPH_ONLY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#ownGraphOnly");
    pub const DESCRIBE_STRATEGY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#describeStrategy");
    pub const MEMBER_DESCRIBE_STRATEGY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://hypermedia.app/query#memberDescribeStrategy");
}

pub mod code {
    //! References to executable code.
    use oxrdf::NamedNodeRef;

    pub const IMPLEMENTED_BY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://code.described.at/implementedBy");
    pub const LINK: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://code.described.at/link");
}

pub mod sh {
    use oxrdf::NamedNodeRef;

    pub const INVERSE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#inversePath");
}
