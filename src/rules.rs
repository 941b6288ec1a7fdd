use crate::store::{Triple, TripleStore};

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_EQUIVALENT_CLASS: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
pub const OWL_SAME_AS: &str = "http://www.w3.org/2002/07/owl#sameAs";
pub const OWL_INVERSE_OF: &str = "http://www.w3.org/2002/07/owl#inverseOf";
pub const OWL_TRANSITIVE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#TransitiveProperty";
pub const OWL_SYMMETRIC_PROPERTY: &str = "http://www.w3.org/2002/07/owl#SymmetricProperty";

/// A forward entailment rule: reads the store, proposes candidate triples.
/// Rules never insert; the fixpoint driver owns all mutation.
pub trait Rule {
    fn name(&self) -> &'static str;
    fn apply(&self, store: &TripleStore) -> Vec<Triple>;
}

/// (A subClassOf B), (B subClassOf C) entails (A subClassOf C).
pub struct SubClassTransitivity;

impl Rule for SubClassTransitivity {
    fn name(&self) -> &'static str {
        "rdfs:subClassOf-transitivity"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for t1 in store.find_by_predicate(RDFS_SUB_CLASS_OF) {
            for t2 in store.find_by_subject_predicate(&t1.object, RDFS_SUB_CLASS_OF) {
                let candidate = Triple::new(&t1.subject, RDFS_SUB_CLASS_OF, &t2.object);
                if !store.contains(&candidate) && t1.subject != t2.object {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (X type A), (A subClassOf B) entails (X type B).
pub struct TypeInheritance;

impl Rule for TypeInheritance {
    fn name(&self) -> &'static str {
        "rdf:type-inheritance"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for t in store.find_by_predicate(RDF_TYPE) {
            for sc in store.find_by_subject_predicate(&t.object, RDFS_SUB_CLASS_OF) {
                let candidate = Triple::new(&t.subject, RDF_TYPE, &sc.object);
                if !store.contains(&candidate) {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (P domain C), (X P Y) entails (X type C).
pub struct DomainInference;

impl Rule for DomainInference {
    fn name(&self) -> &'static str {
        "rdfs:domain-inference"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for dt in store.find_by_predicate(RDFS_DOMAIN) {
            for t in store.find_by_predicate(&dt.subject) {
                let candidate = Triple::new(&t.subject, RDF_TYPE, &dt.object);
                if !store.contains(&candidate) {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (P range C), (X P Y) entails (Y type C), unless Y is a literal.
pub struct RangeInference;

impl Rule for RangeInference {
    fn name(&self) -> &'static str {
        "rdfs:range-inference"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for rt in store.find_by_predicate(RDFS_RANGE) {
            for t in store.find_by_predicate(&rt.subject) {
                // Literals carry no type assertions.
                if t.object.starts_with('"') {
                    continue;
                }
                let candidate = Triple::new(&t.object, RDF_TYPE, &rt.object);
                if !store.contains(&candidate) {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (P1 subPropertyOf P2), (P2 subPropertyOf P3) entails (P1 subPropertyOf P3).
pub struct SubPropertyTransitivity;

impl Rule for SubPropertyTransitivity {
    fn name(&self) -> &'static str {
        "rdfs:subPropertyOf-transitivity"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for t1 in store.find_by_predicate(RDFS_SUB_PROPERTY_OF) {
            for t2 in store.find_by_subject_predicate(&t1.object, RDFS_SUB_PROPERTY_OF) {
                let candidate = Triple::new(&t1.subject, RDFS_SUB_PROPERTY_OF, &t2.object);
                if !store.contains(&candidate) && t1.subject != t2.object {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (P1 subPropertyOf P2), (X P1 Y) entails (X P2 Y).
pub struct SubPropertyInheritance;

impl Rule for SubPropertyInheritance {
    fn name(&self) -> &'static str {
        "rdfs:subPropertyOf-inheritance"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for sp in store.find_by_predicate(RDFS_SUB_PROPERTY_OF) {
            for t in store.find_by_predicate(&sp.subject) {
                let candidate = Triple::new(&t.subject, &sp.object, &t.object);
                if !store.contains(&candidate) {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (A equivalentClass B) entails (B equivalentClass A).
pub struct EquivalentClassSymmetry;

impl Rule for EquivalentClassSymmetry {
    fn name(&self) -> &'static str {
        "owl:equivalentClass-symmetry"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for t in store.find_by_predicate(OWL_EQUIVALENT_CLASS) {
            let candidate = Triple::new(&t.object, OWL_EQUIVALENT_CLASS, &t.subject);
            if !store.contains(&candidate) {
                inferred.push(candidate);
            }
        }
        inferred
    }
}

/// (A equivalentClass B), (B equivalentClass C) entails (A equivalentClass C).
pub struct EquivalentClassTransitivity;

impl Rule for EquivalentClassTransitivity {
    fn name(&self) -> &'static str {
        "owl:equivalentClass-transitivity"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for t1 in store.find_by_predicate(OWL_EQUIVALENT_CLASS) {
            for t2 in store.find_by_subject_predicate(&t1.object, OWL_EQUIVALENT_CLASS) {
                let candidate = Triple::new(&t1.subject, OWL_EQUIVALENT_CLASS, &t2.object);
                if !store.contains(&candidate) && t1.subject != t2.object {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (A sameAs B) entails (B sameAs A).
pub struct SameAsSymmetry;

impl Rule for SameAsSymmetry {
    fn name(&self) -> &'static str {
        "owl:sameAs-symmetry"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for t in store.find_by_predicate(OWL_SAME_AS) {
            let candidate = Triple::new(&t.object, OWL_SAME_AS, &t.subject);
            if !store.contains(&candidate) {
                inferred.push(candidate);
            }
        }
        inferred
    }
}

/// (A sameAs B), (B sameAs C) entails (A sameAs C).
pub struct SameAsTransitivity;

impl Rule for SameAsTransitivity {
    fn name(&self) -> &'static str {
        "owl:sameAs-transitivity"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for t1 in store.find_by_predicate(OWL_SAME_AS) {
            for t2 in store.find_by_subject_predicate(&t1.object, OWL_SAME_AS) {
                let candidate = Triple::new(&t1.subject, OWL_SAME_AS, &t2.object);
                if !store.contains(&candidate) && t1.subject != t2.object {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// (P1 inverseOf P2), (X P1 Y) entails (Y P2 X), and (X P2 Y) entails (Y P1 X).
/// The inverseOf declaration itself is used as stated, never mirrored.
pub struct InversePropertyInference;

impl Rule for InversePropertyInference {
    fn name(&self) -> &'static str {
        "owl:inverseOf-inference"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for inv in store.find_by_predicate(OWL_INVERSE_OF) {
            let p1 = &inv.subject;
            let p2 = &inv.object;

            for t in store.find_by_predicate(p1) {
                let candidate = Triple::new(&t.object, p2, &t.subject);
                if !store.contains(&candidate) {
                    inferred.push(candidate);
                }
            }

            for t in store.find_by_predicate(p2) {
                let candidate = Triple::new(&t.object, p1, &t.subject);
                if !store.contains(&candidate) {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// For each P typed owl:TransitiveProperty: (X P Y), (Y P Z) entails (X P Z).
pub struct TransitivePropertyInference;

impl Rule for TransitivePropertyInference {
    fn name(&self) -> &'static str {
        "owl:TransitiveProperty-inference"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for prop in declared_properties(store, OWL_TRANSITIVE_PROPERTY) {
            for t1 in store.find_by_predicate(&prop) {
                for t2 in store.find_by_subject_predicate(&t1.object, &prop) {
                    let candidate = Triple::new(&t1.subject, &prop, &t2.object);
                    if !store.contains(&candidate) && t1.subject != t2.object {
                        inferred.push(candidate);
                    }
                }
            }
        }
        inferred
    }
}

/// For each P typed owl:SymmetricProperty: (X P Y) entails (Y P X).
pub struct SymmetricPropertyInference;

impl Rule for SymmetricPropertyInference {
    fn name(&self) -> &'static str {
        "owl:SymmetricProperty-inference"
    }

    fn apply(&self, store: &TripleStore) -> Vec<Triple> {
        let mut inferred = Vec::new();
        for prop in declared_properties(store, OWL_SYMMETRIC_PROPERTY) {
            for t in store.find_by_predicate(&prop) {
                let candidate = Triple::new(&t.object, &prop, &t.subject);
                if !store.contains(&candidate) {
                    inferred.push(candidate);
                }
            }
        }
        inferred
    }
}

/// Subjects of `(·, rdf:type, characteristic)`, deduplicated in first-seen
/// order so rule application stays deterministic across rounds.
fn declared_properties(store: &TripleStore, characteristic: &str) -> Vec<String> {
    let mut props: Vec<String> = Vec::new();
    for t in store.find_by_predicate_object(RDF_TYPE, characteristic) {
        if !props.contains(&t.subject) {
            props.push(t.subject);
        }
    }
    props
}

/// The default rule list, in application order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SubClassTransitivity),
        Box::new(TypeInheritance),
        Box::new(DomainInference),
        Box::new(RangeInference),
        Box::new(SubPropertyTransitivity),
        Box::new(SubPropertyInheritance),
        Box::new(EquivalentClassSymmetry),
        Box::new(EquivalentClassTransitivity),
        Box::new(SameAsSymmetry),
        Box::new(SameAsTransitivity),
        Box::new(InversePropertyInference),
        Box::new(TransitivePropertyInference),
        Box::new(SymmetricPropertyInference),
    ]
}
