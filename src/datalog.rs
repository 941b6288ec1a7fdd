//! Positive Datalog: Horn-clause model, a tolerant text parser, and naive
//! bottom-up evaluation with recursive substitution search. Queries are
//! boolean; variables in a query act as wildcards and bindings are never
//! reported.

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DatalogError {
    #[error("invalid rule format: {0}")]
    InvalidRule(String),
    #[error("invalid atom format: {0}")]
    InvalidAtom(String),
}

/// A term is a variable or a constant; both carry their source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Variable(String),
    Constant(String),
}

impl Term {
    pub fn value(&self) -> &str {
        match self {
            Term::Variable(v) | Term::Constant(v) => v,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }
}

/// `Predicate(t1, t2, …)`; arity is the term count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub predicate: String,
    pub terms: Vec<Term>,
}

impl Atom {
    pub fn has_variables(&self) -> bool {
        self.terms.iter().any(Term::is_variable)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<&str> = self.terms.iter().map(Term::value).collect();
        write!(f, "{}({})", self.predicate, terms.join(", "))
    }
}

/// `Head :- Body1, Body2, …`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub head: Atom,
    pub body: Vec<Atom>,
}

/// Facts and rules in declaration order, as parsed.
#[derive(Debug, Default)]
pub struct Program {
    pub facts: Vec<Atom>,
    pub rules: Vec<Rule>,
}

type Substitution = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a Datalog program: `%` and `//` comments stripped per line,
/// statements split on `.` at paren depth zero unless the dot is followed by
/// `:-` (a rule head written with its own period stays one statement).
pub fn parse_program(input: &str) -> Result<Program, DatalogError> {
    let mut program = Program::default();

    for stmt in split_statements(input) {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }

        if stmt.contains(":-") {
            program.rules.push(parse_rule(stmt)?);
        } else {
            program.facts.push(parse_atom(stmt)?);
        }
    }

    Ok(program)
}

fn split_statements(input: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut paren_depth: i32 = 0;

    for raw_line in input.lines() {
        let mut line = raw_line;
        if let Some(idx) = line.find('%') {
            line = &line[..idx];
        }
        if let Some(idx) = line.find("//") {
            line = &line[..idx];
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let runes: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < runes.len() {
            let r = runes[i];
            if r == '(' {
                paren_depth += 1;
            } else if r == ')' {
                paren_depth -= 1;
            }

            if r == '.' && paren_depth == 0 {
                // A dot directly ahead of `:-` belongs to a rule head.
                let mut followed_by_rule = false;
                let mut j = i + 1;
                while j < runes.len() {
                    if runes[j].is_whitespace() {
                        j += 1;
                        continue;
                    }
                    if j + 1 < runes.len() && runes[j] == ':' && runes[j + 1] == '-' {
                        followed_by_rule = true;
                    }
                    break;
                }

                if !followed_by_rule {
                    statements.push(std::mem::take(&mut current));
                    i += 1;
                    continue;
                }
            }
            current.push(r);
            i += 1;
        }
        current.push(' ');
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}

fn parse_rule(stmt: &str) -> Result<Rule, DatalogError> {
    let parts: Vec<&str> = stmt.split(":-").collect();
    if parts.len() != 2 {
        return Err(DatalogError::InvalidRule(stmt.to_string()));
    }

    let head_str = parts[0].trim();
    let head_str = head_str.strip_suffix('.').unwrap_or(head_str);
    let head = parse_atom(head_str)?;

    let body_str = parts[1].trim();
    let body_str = body_str.strip_suffix('.').unwrap_or(body_str);
    let mut body = Vec::new();
    for part in split_atoms(body_str) {
        body.push(parse_atom(part.trim())?);
    }

    Ok(Rule { head, body })
}

fn parse_atom(s: &str) -> Result<Atom, DatalogError> {
    let s = s.trim();
    let s = s.strip_suffix('.').unwrap_or(s);

    let open = match s.find('(') {
        // A bare name is an atom of arity zero.
        None => {
            return Ok(Atom {
                predicate: s.to_string(),
                terms: Vec::new(),
            })
        }
        Some(idx) => idx,
    };

    let close = match s.rfind(')') {
        Some(idx) if idx > open => idx,
        _ => return Err(DatalogError::InvalidAtom(s.to_string())),
    };

    let predicate = s[..open].trim().to_string();
    let mut terms = Vec::new();
    for part in s[open + 1..close].split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        terms.push(if is_variable(part) {
            Term::Variable(part.to_string())
        } else {
            Term::Constant(part.to_string())
        });
    }

    Ok(Atom {
        predicate,
        terms,
    })
}

/// A term is a variable when it is a single uppercase ASCII letter, starts
/// with `?`, or contains at least one letter with every letter uppercase and
/// every other character a digit or underscore.
fn is_variable(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    if s.len() == 1 && s.as_bytes()[0].is_ascii_uppercase() {
        return true;
    }
    if s.starts_with('?') {
        return true;
    }

    let mut has_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            has_letter = true;
            if !c.is_uppercase() {
                return false;
            }
        } else if !c.is_numeric() && c != '_' {
            return false;
        }
    }
    has_letter
}

fn split_atoms(s: &str) -> Vec<String> {
    let mut atoms = Vec::new();
    let mut current = String::new();
    let mut paren_depth: i32 = 0;

    for r in s.chars() {
        if r == '(' {
            paren_depth += 1;
        } else if r == ')' {
            paren_depth -= 1;
        }

        if r == ',' && paren_depth == 0 {
            atoms.push(std::mem::take(&mut current));
        } else {
            current.push(r);
        }
    }

    if !current.is_empty() {
        atoms.push(current);
    }

    atoms
}

/// Parses a query of the form `?- Atom(t1, …).`; the `?-` marker and the
/// trailing period are optional. The non-breaking-hyphen spelling `?‑` seen
/// in the wild is accepted too.
pub fn parse_query(s: &str) -> Result<Atom, DatalogError> {
    let s = s.trim();
    let s = s.strip_prefix("?-").unwrap_or(s);
    let s = s.strip_prefix("?\u{2011}").unwrap_or(s);
    let s = s.trim();
    let s = s.strip_suffix('.').unwrap_or(s);
    parse_atom(s)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

impl Program {
    /// Naive bottom-up saturation. Ground declared facts seed the set;
    /// nonground declared facts are discarded. Rules fire until a full round
    /// derives nothing new. Instantiated heads that still carry variables
    /// are silently dropped (no safety check).
    pub fn reason(&self) -> Vec<Atom> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut facts: Vec<Atom> = Vec::new();

        for f in &self.facts {
            if !f.has_variables() && seen.insert(f.to_string()) {
                facts.push(f.clone());
            }
        }

        loop {
            let mut new_facts = 0;

            for rule in &self.rules {
                let substitutions = find_substitutions(&rule.body, &facts, &Substitution::new());
                for sub in substitutions {
                    let head = apply_substitution(&rule.head, &sub);
                    if !head.has_variables() && seen.insert(head.to_string()) {
                        facts.push(head);
                        new_facts += 1;
                    }
                }
            }

            if new_facts == 0 {
                break;
            }
            debug!(new = new_facts, total = facts.len(), "datalog round");
        }

        facts
    }
}

/// Backtracking search over the body atoms in declaration order: each body
/// atom is matched against every fact of the same predicate and arity,
/// extending the substitution position by position.
fn find_substitutions(body: &[Atom], facts: &[Atom], current: &Substitution) -> Vec<Substitution> {
    let Some((first, rest)) = body.split_first() else {
        return vec![current.clone()];
    };

    let mut results = Vec::new();

    for f in facts {
        if f.predicate != first.predicate || f.terms.len() != first.terms.len() {
            continue;
        }

        let mut sub = current.clone();
        let mut matched = true;
        for (pattern, fact_term) in first.terms.iter().zip(&f.terms) {
            let value = fact_term.value();
            match pattern {
                Term::Variable(name) => match sub.get(name) {
                    Some(bound) if bound != value => {
                        matched = false;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        sub.insert(name.clone(), value.to_string());
                    }
                },
                Term::Constant(c) => {
                    if c != value {
                        matched = false;
                        break;
                    }
                }
            }
        }

        if matched {
            results.extend(find_substitutions(rest, facts, &sub));
        }
    }

    results
}

fn apply_substitution(atom: &Atom, sub: &Substitution) -> Atom {
    let terms = atom
        .terms
        .iter()
        .map(|t| match t {
            Term::Variable(name) => match sub.get(name) {
                Some(value) => Term::Constant(value.clone()),
                None => t.clone(),
            },
            Term::Constant(_) => t.clone(),
        })
        .collect();

    Atom {
        predicate: atom.predicate.clone(),
        terms,
    }
}

/// True iff some derived fact matches the query's predicate and arity with
/// every non-variable position equal.
pub fn evaluate_query(query: &Atom, facts: &[Atom]) -> bool {
    facts.iter().any(|f| {
        f.predicate == query.predicate
            && f.terms.len() == query.terms.len()
            && query
                .terms
                .iter()
                .zip(&f.terms)
                .all(|(q, ft)| q.is_variable() || q.value() == ft.value())
    })
}

/// Parses a program and a query, saturates, and answers the query.
pub fn dl_query(program_text: &str, query_text: &str) -> Result<bool, DatalogError> {
    let program = parse_program(program_text)?;
    let query = parse_query(query_text)?;
    let derived = program.reason();
    Ok(evaluate_query(&query, &derived))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_recursion() {
        let program = "\
Parent(john, mary).
Parent(mary, jane).
Ancestor(X, Y) :- Parent(X, Y).
Ancestor(X, Z) :- Parent(X, Y), Ancestor(Y, Z).
";
        assert!(dl_query(program, "?- Ancestor(john, mary).").unwrap());
        assert!(dl_query(program, "?- Ancestor(john, jane).").unwrap());
        assert!(!dl_query(program, "?- Ancestor(jane, john).").unwrap());
    }

    #[test]
    fn multi_character_variables() {
        let program = "\
Parent(john, mary).
Parent(mary, jane).
Ancestor(VAR_X, VAR_Y) :- Parent(VAR_X, VAR_Y).
Ancestor(VAR_X, VAR_Z) :- Parent(VAR_X, VAR_Y), Ancestor(VAR_Y, VAR_Z).
";
        assert!(dl_query(program, "?- Ancestor(john, mary).").unwrap());
        assert!(dl_query(program, "?- Ancestor(john, jane).").unwrap());
        assert!(!dl_query(program, "?- Ancestor(jane, john).").unwrap());
    }

    #[test]
    fn rule_heads_written_with_their_own_period() {
        let program = "\
Disjoint(Gemeinde,Kanton).
Type(Zürich_Stadt,Gemeinde).
Type(Kanton_Zürich,Kanton).
Type(Basel_Stadt,Gemeinde).
Type(Kanton_Basel,Kanton).
Disjoint(X,Y).
Type(X,Y).
Is_A_Kanton(X).
Not_Kanton(X).
Is_A_Kanton(X). :- Type(X,Kanton).
Not_Kanton(X). :- Disjoint(Gemeinde,Kanton), Type(X,Gemeinde).
";
        let cases = [
            ("?\u{2011} Type(Kanton_Zürich, Gemeinde).", false),
            ("?\u{2011} Type(Kanton_Zürich, Kanton).", true),
            ("?\u{2011} Is_A_Kanton(Kanton_Zürich).", true),
            ("?\u{2011} Not_Kanton(Zürich_Stadt).", true),
            ("?\u{2011} Not_Kanton(Kanton_Zürich).", false),
        ];
        for (query, expected) in cases {
            assert_eq!(dl_query(program, query).unwrap(), expected, "{query}");
        }
    }

    #[test]
    fn comments_are_stripped() {
        let program = "\
% leading comment
Parent(john, mary). % trailing comment
Human(X) :- Parent(X, Y). // another style
";
        let parsed = parse_program(program).unwrap();
        assert_eq!(parsed.facts.len(), 1);
        assert_eq!(parsed.rules.len(), 1);
    }

    #[test]
    fn facts_and_rules_are_counted_separately() {
        let parsed = parse_program("Parent(john, mary). Human(X) :- Parent(X, Y).").unwrap();
        assert_eq!(parsed.facts.len(), 1);
        assert_eq!(parsed.rules.len(), 1);
    }

    #[test]
    fn variable_recognition() {
        assert!(is_variable("X"));
        assert!(is_variable("?anything"));
        assert!(is_variable("VAR_X"));
        assert!(is_variable("X1"));
        assert!(is_variable("ABC_123"));
        assert!(!is_variable("john"));
        assert!(!is_variable("Kanton"));
        assert!(!is_variable("Zürich_Stadt"));
        assert!(!is_variable("123"));
        assert!(!is_variable(""));
    }

    #[test]
    fn nonground_declared_facts_are_discarded() {
        let program = parse_program("P(a). P(X).").unwrap();
        let derived = program.reason();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].to_string(), "P(a)");
    }

    #[test]
    fn unbound_head_variables_drop_the_conclusion() {
        let program = "P(a). Q(X, Y) :- P(X).";
        assert!(!dl_query(program, "?- Q(a, b).").unwrap());
        // The rule never produces anything, yet evaluation terminates.
        let derived = parse_program(program).unwrap().reason();
        assert_eq!(derived.len(), 1);
    }

    #[test]
    fn query_variables_are_wildcards() {
        let program = "Edge(a, b). Edge(b, c).";
        assert!(dl_query(program, "?- Edge(a, X).").unwrap());
        assert!(dl_query(program, "?- Edge(X, Y).").unwrap());
        assert!(!dl_query(program, "?- Edge(c, X).").unwrap());
        // Unknown predicates are simply false, not an error.
        assert!(!dl_query(program, "?- Path(a, b).").unwrap());
    }

    #[test]
    fn zero_arity_atoms() {
        let program = "raining. wet :- raining.";
        assert!(dl_query(program, "?- wet.").unwrap());
        assert!(!dl_query(program, "?- snowing.").unwrap());
    }

    #[test]
    fn malformed_rule_is_an_error() {
        assert!(parse_program("A(x) :- B(x) :- C(x).").is_err());
    }

    #[test]
    fn malformed_atom_is_an_error() {
        assert!(parse_program("Broken(a, b").is_err());
    }

    #[test]
    fn atom_display_matches_source_shape() {
        let atom = parse_atom("Parent(john, mary)").unwrap();
        assert_eq!(atom.to_string(), "Parent(john, mary)");
    }
}
