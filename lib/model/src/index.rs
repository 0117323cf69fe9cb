use crate::GraphError;
use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedNode, NamedNodeRef, Subject, Term, TermRef, Triple, TripleRef};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// An immutable, in-memory triple index.
///
/// The index is built once from a set of triples and never changes afterwards. Lookups by subject,
/// predicate and object are answered from hash tables. Cloning a [GraphIndex] only clones a
/// reference to the shared storage, so the same index can be handed to concurrent requests.
///
/// ```
/// use hydra_fusion_model::vocab::rdf;
/// use hydra_fusion_model::{GraphIndex, NamedNode, Triple};
///
/// let alice = NamedNode::new("http://example.com/alice")?;
/// let person = NamedNode::new("http://schema.org/Person")?;
/// let index = GraphIndex::new([Triple::new(alice.clone(), rdf::TYPE, person.clone())]);
///
/// assert_eq!(index.object(alice.as_ref().into(), rdf::TYPE), Some(&person.into()));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct GraphIndex {
    inner: Arc<IndexContent>,
}

#[derive(Debug, Default)]
struct IndexContent {
    triples: Vec<Triple>,
    by_subject: FxHashMap<Term, Vec<usize>>,
    by_predicate: FxHashMap<NamedNode, Vec<usize>>,
    by_object: FxHashMap<Term, Vec<usize>>,
}

impl GraphIndex {
    /// Builds an index from `triples`. Duplicates are only stored once.
    pub fn new(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut content = IndexContent::default();
        let mut seen = FxHashSet::default();
        for triple in triples {
            if !seen.insert(triple.clone()) {
                continue;
            }
            let id = content.triples.len();
            content
                .by_subject
                .entry(Term::from(triple.subject.clone()))
                .or_default()
                .push(id);
            content
                .by_predicate
                .entry(triple.predicate.clone())
                .or_default()
                .push(id);
            content
                .by_object
                .entry(triple.object.clone())
                .or_default()
                .push(id);
            content.triples.push(triple);
        }
        Self {
            inner: Arc::new(content),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.triples.is_empty()
    }

    /// Iterates over all triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> + '_ {
        self.inner.triples.iter()
    }

    pub fn contains(&self, triple: TripleRef<'_>) -> bool {
        self.triples_for_subject(triple.subject.into())
            .any(|t| t.as_ref() == triple)
    }

    /// Returns all triples whose subject is `subject`.
    pub fn triples_for_subject<'a>(
        &'a self,
        subject: TermRef<'_>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.lookup(&self.inner.by_subject, &subject.into_owned())
    }

    /// Returns all triples whose predicate is `predicate`.
    pub fn triples_for_predicate<'a>(
        &'a self,
        predicate: NamedNodeRef<'_>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.lookup(&self.inner.by_predicate, &predicate.into_owned())
    }

    /// Returns all objects of the triples matching `subject` and `predicate`.
    pub fn objects<'a>(
        &'a self,
        subject: TermRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        let predicate = predicate.into_owned();
        self.triples_for_subject(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Returns the first object of the triples matching `subject` and `predicate`.
    pub fn object<'a>(&'a self, subject: TermRef<'_>, predicate: NamedNodeRef<'_>) -> Option<&'a Term> {
        self.objects(subject, predicate).next()
    }

    /// Returns all subjects of the triples matching `predicate` and `object`.
    pub fn subjects<'a>(
        &'a self,
        predicate: NamedNodeRef<'_>,
        object: TermRef<'_>,
    ) -> impl Iterator<Item = &'a Subject> + 'a {
        let predicate = predicate.into_owned();
        self.lookup(&self.inner.by_object, &object.into_owned())
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.subject)
    }

    /// Reads the members of the `rdf:List` starting at `head`.
    ///
    /// `rdf:nil` yields an empty list. A node without `rdf:first`, with several values for
    /// `rdf:first` or `rdf:rest`, or a list that loops back on itself is reported as malformed.
    pub fn list(&self, head: TermRef<'_>) -> Result<Vec<Term>, GraphError> {
        let mut items = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = head.into_owned();
        loop {
            if current.as_ref() == TermRef::from(rdf::NIL) {
                return Ok(items);
            }
            if !visited.insert(current.clone()) {
                return Err(GraphError::MalformedList(head.into_owned()));
            }
            let firsts = self.objects(current.as_ref(), rdf::FIRST).collect::<Vec<_>>();
            let rests = self.objects(current.as_ref(), rdf::REST).collect::<Vec<_>>();
            let ([first], [rest]) = (firsts.as_slice(), rests.as_slice()) else {
                return Err(GraphError::MalformedList(head.into_owned()));
            };
            items.push((*first).clone());
            current = (*rest).clone();
        }
    }

    /// Returns whether `node` is the head of an `rdf:List`.
    pub fn is_list(&self, node: TermRef<'_>) -> bool {
        node == TermRef::from(rdf::NIL) || self.object(node, rdf::FIRST).is_some()
    }

    /// Copies the content of the index into a mutable [Graph].
    pub fn to_graph(&self) -> Graph {
        self.iter().collect()
    }

    fn lookup<'a, K: std::hash::Hash + Eq>(
        &'a self,
        table: &'a FxHashMap<K, Vec<usize>>,
        key: &K,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        table
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|id| &self.inner.triples[*id])
    }
}

impl FromIterator<Triple> for GraphIndex {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Graph> for GraphIndex {
    fn from(graph: Graph) -> Self {
        Self::new(graph.iter().map(TripleRef::into_owned))
    }
}

impl From<&Graph> for GraphIndex {
    fn from(graph: &Graph) -> Self {
        Self::new(graph.iter().map(TripleRef::into_owned))
    }
}
