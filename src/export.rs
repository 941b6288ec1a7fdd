//! Textual lowering of N-Triples lines into Datalog facts, for export only.
//! IRIs shrink to their local name, literals to their bare value, and the
//! result is sanitized into something a Datalog parser will take back.

/// Converts N-Triples lines to `predicate(subject, object).` facts.
/// Lines that do not look like a triple are skipped.
pub fn triples_to_datalog(triples: &[String]) -> Vec<String> {
    let mut facts = Vec::with_capacity(triples.len());

    for triple in triples {
        let triple = triple.trim();
        let Some(triple) = triple.strip_suffix(" .") else {
            continue;
        };

        let parts = parse_ntriple_parts(triple);
        if parts.len() != 3 {
            continue;
        }

        let subject = simplify_iri(&parts[0]);
        let predicate = simplify_iri(&parts[1]);
        let object = simplify_iri(&parts[2]);

        facts.push(format!("{predicate}({subject}, {object})."));
    }

    facts
}

/// Splits one N-Triples line on spaces outside quoted literals, honoring
/// backslash escapes inside them.
fn parse_ntriple_parts(triple: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for r in triple.chars() {
        if escaped {
            current.push(r);
            escaped = false;
        } else if r == '\\' {
            current.push(r);
            escaped = true;
        } else if r == '"' {
            current.push(r);
            in_quotes = !in_quotes;
        } else if r == ' ' && !in_quotes {
            if !current.is_empty() {
                parts.push(current.trim().to_string());
                current.clear();
            }
        } else {
            current.push(r);
        }
    }

    if !current.is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Shrinks a term to a simplified Datalog-friendly name: IRIs keep the text
/// after the last `#` or `/`, literals keep their value with any `^^…` or
/// `@…` suffix dropped.
fn simplify_iri(term: &str) -> String {
    let mut iri = term;
    if iri.starts_with('<') && iri.ends_with('>') {
        iri = &iri[1..iri.len() - 1];
    }

    if iri.starts_with('"') {
        if let Some((value, _)) = iri.split_once("\"^^") {
            return datalog_safe(value.trim_matches('"'));
        }
        if let Some((value, _)) = iri.split_once("\"@") {
            return datalog_safe(value.trim_matches('"'));
        }
        return datalog_safe(iri.trim_matches('"'));
    }

    if let Some((_, local)) = iri.rsplit_once('#') {
        return datalog_safe(local);
    }
    if let Some((_, local)) = iri.rsplit_once('/') {
        return datalog_safe(local);
    }

    datalog_safe(iri)
}

fn datalog_safe(s: &str) -> String {
    let mut safe: String = s
        .chars()
        .map(|c| match c {
            '-' | ':' | ' ' | '.' => '_',
            c => c,
        })
        .collect();

    if safe.as_bytes().first().is_some_and(|b| b.is_ascii_digit()) {
        safe.insert(0, '_');
    }

    if safe.is_empty() || safe == "_" {
        safe = "unknown".to_string();
    }

    safe
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(line: &str) -> Vec<String> {
        triples_to_datalog(&[line.to_string()])
    }

    #[test]
    fn iris_shrink_to_local_names() {
        assert_eq!(
            lower("<http://example.org/car-1> <http://example.org/ns#hasOwner> <http://example.org/alice> ."),
            vec!["hasOwner(car_1, alice).".to_string()]
        );
    }

    #[test]
    fn literals_drop_their_annotations() {
        assert_eq!(
            lower("<http://e/s> <http://e/p> \"John Smith\" ."),
            vec!["p(s, John_Smith).".to_string()]
        );
        assert_eq!(
            lower("<http://e/s> <http://e/p> \"hello\"@en ."),
            vec!["p(s, hello).".to_string()]
        );
        assert_eq!(
            lower("<http://e/s> <http://e/p> \"42\"^^<http://www.w3.org/2001/XMLSchema#int> ."),
            vec!["p(s, _42).".to_string()]
        );
    }

    #[test]
    fn empty_local_names_become_unknown() {
        assert_eq!(
            lower("<http://example.org/> <http://e/p> <http://e/o> ."),
            vec!["p(unknown, o).".to_string()]
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        assert!(lower("just some text").is_empty());
        assert!(lower("<http://e/s> <http://e/p> .").is_empty());
    }

    #[test]
    fn sanitizer_rewrites_awkward_characters() {
        assert_eq!(datalog_safe("a-b:c d.e"), "a_b_c_d_e");
        assert_eq!(datalog_safe("9lives"), "_9lives");
        assert_eq!(datalog_safe(""), "unknown");
        assert_eq!(datalog_safe("_"), "unknown");
    }
}
