//! Forward-chaining deductive reasoner over two closely related fact
//! formalisms: RDF graphs with a fixed RDFS/OWL entailment rule set, and
//! pure positive Datalog programs. Turtle input feeds a deduplicated,
//! indexed triple store; saturation runs the rules to a fixed point; the
//! closure answers pattern queries or serializes as sorted N-Triples.

mod export;
mod reasoner;
mod rules;
mod store;
mod turtle;

pub mod datalog;

pub use export::triples_to_datalog;
pub use reasoner::{
    forward_reason, forward_reason_with_details, Reasoner, ReasonerError, ReasoningResult,
};
pub use rules::{
    default_rules, DomainInference, EquivalentClassSymmetry, EquivalentClassTransitivity,
    InversePropertyInference, RangeInference, Rule, SameAsSymmetry, SameAsTransitivity,
    SubClassTransitivity, SubPropertyInheritance, SubPropertyTransitivity,
    SymmetricPropertyInference, TransitivePropertyInference, TypeInheritance, OWL_CLASS,
    OWL_EQUIVALENT_CLASS, OWL_INVERSE_OF, OWL_SAME_AS, OWL_SYMMETRIC_PROPERTY, OWL_THING,
    OWL_TRANSITIVE_PROPERTY, RDFS_DOMAIN, RDFS_RANGE, RDFS_SUB_CLASS_OF, RDFS_SUB_PROPERTY_OF,
    RDF_TYPE,
};
pub use store::{Triple, TripleStore};
pub use turtle::{ParseError, TurtleParser};
