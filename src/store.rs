use std::collections::{HashMap, HashSet};
use std::fmt;

/// A ground RDF triple. Terms are stored as plain strings whose shape encodes
/// their kind: bare absolute IRIs, `_:`-prefixed blank nodes, and literals
/// beginning with `"` (language tag or datatype suffix kept verbatim).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Triple {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Renders one term for N-Triples output. Absolute http(s) IRIs get angle
/// brackets; literals, blank nodes and already-bracketed terms pass through.
fn format_term(term: &str) -> String {
    if term.starts_with("http://") || term.starts_with("https://") {
        return format!("<{term}>");
    }
    term.to_string()
}

impl fmt::Display for Triple {
    /// The canonical N-Triples line, trailing ` .` included.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} .",
            format_term(&self.subject),
            format_term(&self.predicate),
            format_term(&self.object)
        )
    }
}

/// In-memory triple store: deduplicated, insertion-ordered, with inverted
/// indices on each component for the lookups the rules drive.
///
/// Invariant: every stored triple appears exactly once in `list`, once in
/// `set`, and once in each of the three indices (as a position into `list`).
#[derive(Debug, Default)]
pub struct TripleStore {
    set: HashSet<Triple>,
    list: Vec<Triple>,
    by_subject: HashMap<String, Vec<usize>>,
    by_predicate: HashMap<String, Vec<usize>>,
    by_object: HashMap<String, Vec<usize>>,
}

impl TripleStore {
    pub fn new() -> Self {
        TripleStore::default()
    }

    /// Inserts a triple. Returns `true` if it was new, `false` if the store
    /// already held an equal triple (the store is left untouched).
    pub fn add(&mut self, t: Triple) -> bool {
        if self.set.contains(&t) {
            return false;
        }

        let idx = self.list.len();
        self.by_subject
            .entry(t.subject.clone())
            .or_default()
            .push(idx);
        self.by_predicate
            .entry(t.predicate.clone())
            .or_default()
            .push(idx);
        self.by_object
            .entry(t.object.clone())
            .or_default()
            .push(idx);
        self.set.insert(t.clone());
        self.list.push(t);

        true
    }

    pub fn contains(&self, t: &Triple) -> bool {
        self.set.contains(t)
    }

    fn collect(&self, positions: Option<&Vec<usize>>) -> Vec<Triple> {
        positions
            .map(|idxs| idxs.iter().map(|&i| self.list[i].clone()).collect())
            .unwrap_or_default()
    }

    /// All triples with the given subject, in insertion order.
    pub fn find_by_subject(&self, subject: &str) -> Vec<Triple> {
        self.collect(self.by_subject.get(subject))
    }

    /// All triples with the given predicate, in insertion order.
    pub fn find_by_predicate(&self, predicate: &str) -> Vec<Triple> {
        self.collect(self.by_predicate.get(predicate))
    }

    /// All triples with the given object, in insertion order.
    pub fn find_by_object(&self, object: &str) -> Vec<Triple> {
        self.collect(self.by_object.get(object))
    }

    /// Subject index scan with a linear filter on the predicate.
    pub fn find_by_subject_predicate(&self, subject: &str, predicate: &str) -> Vec<Triple> {
        self.find_by_subject(subject)
            .into_iter()
            .filter(|t| t.predicate == predicate)
            .collect()
    }

    /// Predicate index scan with a linear filter on the object.
    pub fn find_by_predicate_object(&self, predicate: &str, object: &str) -> Vec<Triple> {
        self.find_by_predicate(predicate)
            .into_iter()
            .filter(|t| t.object == object)
            .collect()
    }

    /// Insertion-ordered snapshot of the whole store.
    pub fn all(&self) -> Vec<Triple> {
        self.list.clone()
    }

    pub fn size(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(s, p, o)
    }

    #[test]
    fn add_reports_new_exactly_once() {
        let mut store = TripleStore::new();
        let triple = t("a", "b", "c");
        assert!(store.add(triple.clone()));
        assert!(!store.add(triple.clone()));
        assert!(!store.add(triple));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn contains_matches_structural_equality() {
        let mut store = TripleStore::new();
        store.add(t("a", "b", "c"));
        assert!(store.contains(&t("a", "b", "c")));
        assert!(!store.contains(&t("a", "b", "d")));
    }

    #[test]
    fn all_preserves_insertion_order() {
        let mut store = TripleStore::new();
        store.add(t("s2", "p", "o"));
        store.add(t("s1", "p", "o"));
        store.add(t("s3", "p", "o"));
        let all = store.all();
        let subjects: Vec<&str> = all.iter().map(|t| t.subject.as_str()).collect();
        assert_eq!(subjects, vec!["s2", "s1", "s3"]);
    }

    #[test]
    fn single_component_lookups() {
        let mut store = TripleStore::new();
        store.add(t("s1", "p1", "o1"));
        store.add(t("s1", "p2", "o2"));
        store.add(t("s2", "p1", "o1"));

        assert_eq!(store.find_by_subject("s1").len(), 2);
        assert_eq!(store.find_by_predicate("p1").len(), 2);
        assert_eq!(store.find_by_object("o1").len(), 2);
        assert!(store.find_by_subject("missing").is_empty());
    }

    #[test]
    fn compound_lookups_filter_second_component() {
        let mut store = TripleStore::new();
        store.add(t("s1", "p1", "o1"));
        store.add(t("s1", "p2", "o2"));
        store.add(t("s2", "p1", "o2"));

        let sp = store.find_by_subject_predicate("s1", "p2");
        assert_eq!(sp, vec![t("s1", "p2", "o2")]);

        let po = store.find_by_predicate_object("p1", "o2");
        assert_eq!(po, vec![t("s2", "p1", "o2")]);
    }

    #[test]
    fn ntriples_rendering_brackets_only_http_iris() {
        let iri = t(
            "http://example.org/s",
            "https://example.org/p",
            "http://example.org/o",
        );
        assert_eq!(
            iri.to_string(),
            "<http://example.org/s> <https://example.org/p> <http://example.org/o> ."
        );

        let literal = t("http://example.org/s", "http://example.org/p", "\"v\"@en");
        assert_eq!(
            literal.to_string(),
            "<http://example.org/s> <http://example.org/p> \"v\"@en ."
        );

        let blank = t("_:b1", "http://example.org/p", "_:b2");
        assert_eq!(blank.to_string(), "_:b1 <http://example.org/p> _:b2 .");
    }
}
