use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::rules::{default_rules, Rule, RDF_TYPE};
use crate::store::{Triple, TripleStore};
use crate::turtle::{ParseError, TurtleParser};

#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("failed to load TBox: {0}")]
    Tbox(#[source] ParseError),
    #[error("failed to load ABox: {0}")]
    Abox(#[source] ParseError),
}

/// Forward reasoner: a triple store, an ordered rule list, and a Turtle
/// parser feeding the store. Saturation is monotonic and the rule set never
/// invents fresh terms, so the fixpoint loop always terminates.
pub struct Reasoner {
    store: TripleStore,
    rules: Vec<Box<dyn Rule>>,
    parser: TurtleParser,
}

impl Default for Reasoner {
    fn default() -> Self {
        Reasoner::new()
    }
}

impl Reasoner {
    pub fn new() -> Self {
        Reasoner::with_rules(default_rules())
    }

    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Reasoner {
            store: TripleStore::new(),
            rules,
            parser: TurtleParser::new(),
        }
    }

    /// Parses Turtle content and inserts the triples. A failed parse loads
    /// nothing.
    pub fn load_turtle(&mut self, content: &str) -> Result<(), ParseError> {
        let triples = self.parser.parse(content)?;
        let count = triples.len();

        for t in triples {
            self.store.add(t);
        }

        debug!(parsed = count, store = self.store.size(), "loaded Turtle");
        Ok(())
    }

    /// Applies every rule in order, round after round, until a full round
    /// yields nothing new. Returns the number of triples added overall.
    pub fn run_forward_reasoning(&mut self) -> usize {
        let mut total_inferred = 0;
        let mut round = 0;

        loop {
            let mut new_in_round = 0;

            for rule in &self.rules {
                // Rules read a snapshot and only propose; insertion happens
                // here so deduplication is in one place.
                let inferred = rule.apply(&self.store);
                for t in inferred {
                    if self.store.add(t) {
                        new_in_round += 1;
                    }
                }
            }

            round += 1;
            debug!(round, new = new_in_round, "inference round complete");

            if new_in_round == 0 {
                break;
            }
            total_inferred += new_in_round;
        }

        info!(
            rounds = round,
            inferred = total_inferred,
            total = self.store.size(),
            "saturation reached"
        );
        total_inferred
    }

    /// All triples as lexicographically sorted N-Triples lines.
    pub fn get_all_triples(&self) -> Vec<String> {
        let mut result: Vec<String> = self.store.all().iter().map(|t| t.to_string()).collect();
        result.sort();
        result
    }

    /// Sorted objects of `(subject, rdf:type, *)`.
    pub fn get_inferred_types(&self, subject: &str) -> Vec<String> {
        let mut types: Vec<String> = self
            .store
            .find_by_subject_predicate(subject, RDF_TYPE)
            .into_iter()
            .map(|t| t.object)
            .collect();
        types.sort();
        types
    }

    /// Pattern match over the store; the empty string is a wildcard. Picks
    /// the most selective index available for the bound components.
    pub fn query(&self, subject: &str, predicate: &str, object: &str) -> Vec<Triple> {
        if !subject.is_empty() && !predicate.is_empty() {
            self.store
                .find_by_subject_predicate(subject, predicate)
                .into_iter()
                .filter(|t| object.is_empty() || t.object == object)
                .collect()
        } else if !subject.is_empty() {
            self.store
                .find_by_subject(subject)
                .into_iter()
                .filter(|t| {
                    (predicate.is_empty() || t.predicate == predicate)
                        && (object.is_empty() || t.object == object)
                })
                .collect()
        } else if !predicate.is_empty() {
            self.store
                .find_by_predicate(predicate)
                .into_iter()
                .filter(|t| object.is_empty() || t.object == object)
                .collect()
        } else if !object.is_empty() {
            self.store.find_by_object(object)
        } else {
            self.store.all()
        }
    }

    pub fn store(&self) -> &TripleStore {
        &self.store
    }
}

/// Loads TBox then ABox, saturates, and returns the closure as sorted
/// N-Triples lines.
pub fn forward_reason(abox: &str, tbox: &str) -> Result<Vec<String>, ReasonerError> {
    let mut reasoner = Reasoner::new();

    if !tbox.is_empty() {
        reasoner.load_turtle(tbox).map_err(ReasonerError::Tbox)?;
    }
    if !abox.is_empty() {
        reasoner.load_turtle(abox).map_err(ReasonerError::Abox)?;
    }

    reasoner.run_forward_reasoning();

    Ok(reasoner.get_all_triples())
}

/// Like [`forward_reason`], but keeps the pre-saturation snapshot so callers
/// can tell input from inference.
pub fn forward_reason_with_details(
    abox: &str,
    tbox: &str,
) -> Result<ReasoningResult, ReasonerError> {
    let mut reasoner = Reasoner::new();

    if !tbox.is_empty() {
        reasoner.load_turtle(tbox).map_err(ReasonerError::Tbox)?;
    }
    if !abox.is_empty() {
        reasoner.load_turtle(abox).map_err(ReasonerError::Abox)?;
    }

    let original_count = reasoner.store().size();
    let original_triples = reasoner.get_all_triples();

    let inferred_count = reasoner.run_forward_reasoning();
    let all_triples = reasoner.get_all_triples();

    let original_set: HashSet<&String> = original_triples.iter().collect();
    let inferred_triples: Vec<String> = all_triples
        .iter()
        .filter(|t| !original_set.contains(t))
        .cloned()
        .collect();

    Ok(ReasoningResult {
        total_count: all_triples.len(),
        original_triples,
        inferred_triples,
        all_triples,
        original_count,
        inferred_count,
    })
}

/// Outcome of a reasoning pass, input and inference separated.
#[derive(Debug, Clone)]
pub struct ReasoningResult {
    pub original_triples: Vec<String>,
    pub inferred_triples: Vec<String>,
    pub all_triples: Vec<String>,
    pub original_count: usize,
    pub inferred_count: usize,
    pub total_count: usize,
}

impl fmt::Display for ReasoningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reasoning Result:")?;
        writeln!(f, "  Original triples: {}", self.original_count)?;
        writeln!(f, "  Inferred triples: {}", self.inferred_count)?;
        writeln!(f, "  Total triples: {}", self.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RDFS_SUB_CLASS_OF;

    const EX: &str = "http://example.org/";

    fn line(s: &str, p: &str, o: &str) -> String {
        Triple::new(s, p, o).to_string()
    }

    #[test]
    fn subclass_chain_closure() {
        let tbox = "@prefix ex: <http://example.org/> .\n\
                    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
                    ex:Car rdfs:subClassOf ex:Vehicle .\n\
                    ex:Vehicle rdfs:subClassOf ex:Transport .";
        let abox = "@prefix ex: <http://example.org/> .\n\
                    @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n\
                    ex:myCar rdf:type ex:Car .";

        let all = forward_reason(abox, tbox).unwrap();

        for expected in [
            line(
                &format!("{EX}Car"),
                RDFS_SUB_CLASS_OF,
                &format!("{EX}Transport"),
            ),
            line(&format!("{EX}myCar"), RDF_TYPE, &format!("{EX}Vehicle")),
            line(&format!("{EX}myCar"), RDF_TYPE, &format!("{EX}Transport")),
        ] {
            assert!(all.contains(&expected), "missing {expected}");
        }
        assert!(all.windows(2).all(|w| w[0] <= w[1]), "output not sorted");
    }

    #[test]
    fn domain_and_range_type_the_endpoints_but_not_literals() {
        let tbox = "@prefix ex: <http://example.org/> .\n\
                    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
                    ex:hasOwner rdfs:domain ex:Thing .\n\
                    ex:hasOwner rdfs:range ex:Person .";
        let abox = "@prefix ex: <http://example.org/> .\n\
                    ex:car1 ex:hasOwner ex:alice .\n\
                    ex:car1 ex:hasOwner \"plate-123\" .";

        let all = forward_reason(abox, tbox).unwrap();

        assert!(all.contains(&line(&format!("{EX}car1"), RDF_TYPE, &format!("{EX}Thing"))));
        assert!(all.contains(&line(&format!("{EX}alice"), RDF_TYPE, &format!("{EX}Person"))));
        // The literal object never receives a type.
        assert!(all.iter().all(|t| !t.starts_with("\"plate-123\"")));
    }

    #[test]
    fn symmetric_property_closure() {
        let tbox = "@prefix ex: <http://example.org/> .\n\
                    @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n\
                    @prefix owl: <http://www.w3.org/2002/07/owl#> .\n\
                    ex:marriedTo rdf:type owl:SymmetricProperty .";
        let abox = "@prefix ex: <http://example.org/> .\n\
                    ex:alice ex:marriedTo ex:bob .";

        let all = forward_reason(abox, tbox).unwrap();
        assert!(all.contains(&line(
            &format!("{EX}bob"),
            &format!("{EX}marriedTo"),
            &format!("{EX}alice")
        )));
    }

    #[test]
    fn transitive_property_closure() {
        let tbox = "@prefix ex: <http://example.org/> .\n\
                    @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n\
                    @prefix owl: <http://www.w3.org/2002/07/owl#> .\n\
                    ex:locatedIn rdf:type owl:TransitiveProperty .";
        let abox = "@prefix ex: <http://example.org/> .\n\
                    ex:a ex:locatedIn ex:b .\n\
                    ex:b ex:locatedIn ex:c .\n\
                    ex:c ex:locatedIn ex:d .";

        let all = forward_reason(abox, tbox).unwrap();
        let p = format!("{EX}locatedIn");
        assert!(all.contains(&line(&format!("{EX}a"), &p, &format!("{EX}c"))));
        assert!(all.contains(&line(&format!("{EX}a"), &p, &format!("{EX}d"))));
        assert!(all.contains(&line(&format!("{EX}b"), &p, &format!("{EX}d"))));
    }

    #[test]
    fn saturation_is_idempotent() {
        let mut reasoner = Reasoner::new();
        reasoner
            .load_turtle(
                "@prefix ex: <http://example.org/> .\n\
                 @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
                 ex:A rdfs:subClassOf ex:B .\n\
                 ex:B rdfs:subClassOf ex:C .\n\
                 ex:x a ex:A .",
            )
            .unwrap();

        let first = reasoner.run_forward_reasoning();
        assert!(first > 0);
        assert_eq!(reasoner.run_forward_reasoning(), 0);
    }

    #[test]
    fn details_split_input_from_inference() {
        let tbox = "@prefix ex: <http://example.org/> .\n\
                    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
                    ex:Car rdfs:subClassOf ex:Vehicle .\n\
                    ex:Vehicle rdfs:subClassOf ex:Transport .";
        let abox = "@prefix ex: <http://example.org/> .\n\
                    ex:myCar a ex:Car .";

        let result = forward_reason_with_details(abox, tbox).unwrap();
        assert_eq!(result.original_count, 3);
        assert_eq!(result.inferred_count, 3);
        assert_eq!(result.total_count, 6);
        assert_eq!(result.inferred_triples.len(), 3);
        assert_eq!(
            result.original_triples.len() + result.inferred_triples.len(),
            result.all_triples.len()
        );

        let summary = result.to_string();
        assert!(summary.contains("Original triples: 3"));
        assert!(summary.contains("Inferred triples: 3"));
    }

    #[test]
    fn query_honors_wildcards() {
        let mut reasoner = Reasoner::new();
        reasoner
            .load_turtle(
                "@prefix ex: <http://example.org/> .\n\
                 ex:s1 ex:p1 ex:o1 .\n\
                 ex:s1 ex:p2 ex:o2 .\n\
                 ex:s2 ex:p1 ex:o1 .",
            )
            .unwrap();

        let s1 = format!("{EX}s1");
        let p1 = format!("{EX}p1");
        let o1 = format!("{EX}o1");

        assert_eq!(reasoner.query(&s1, &p1, "").len(), 1);
        assert_eq!(reasoner.query(&s1, "", "").len(), 2);
        assert_eq!(reasoner.query("", &p1, "").len(), 2);
        assert_eq!(reasoner.query("", "", &o1).len(), 2);
        assert_eq!(reasoner.query("", "", "").len(), 3);
        assert_eq!(reasoner.query(&s1, &p1, &o1).len(), 1);
        assert!(reasoner.query(&s1, &p1, "nope").is_empty());
    }

    #[test]
    fn inferred_types_are_sorted() {
        let tbox = "@prefix ex: <http://example.org/> .\n\
                    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
                    ex:Car rdfs:subClassOf ex:Vehicle .\n\
                    ex:Vehicle rdfs:subClassOf ex:Transport .";
        let abox = "@prefix ex: <http://example.org/> .\n\
                    ex:myCar a ex:Car .";

        let mut reasoner = Reasoner::new();
        reasoner.load_turtle(tbox).unwrap();
        reasoner.load_turtle(abox).unwrap();
        reasoner.run_forward_reasoning();

        let types = reasoner.get_inferred_types(&format!("{EX}myCar"));
        assert_eq!(
            types,
            vec![
                format!("{EX}Car"),
                format!("{EX}Transport"),
                format!("{EX}Vehicle"),
            ]
        );
    }
}
