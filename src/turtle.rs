use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::rules::RDF_TYPE;
use crate::store::Triple;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected prefix name at position {0}")]
    ExpectedPrefixName(usize),
    #[error("expected '<' at position {0}")]
    ExpectedIriOpen(usize),
    #[error("unterminated IRI")]
    UnterminatedIri,
    #[error("expected ':' in prefixed name at position {0}")]
    MissingColon(usize),
    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// Characters allowed in prefixed-name bodies and blank-node labels.
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn is_alpha_num(c: char) -> bool {
    c.is_alphanumeric()
}

/// Single-pass cursor parser for the Turtle subset: prefix/base declarations,
/// predicate-object and object lists, the `a` keyword, blank nodes, comments,
/// single- and triple-quoted literals with language tags and datatypes.
///
/// Malformed triples are recovered by skipping to the next statement-level
/// `.`; declaration errors abort the parse.
#[derive(Debug, Default)]
pub struct TurtleParser {
    prefixes: HashMap<String, String>,
    base: String,
    chars: Vec<char>,
    pos: usize,
}

impl TurtleParser {
    pub fn new() -> Self {
        TurtleParser::default()
    }

    pub fn parse(&mut self, content: &str) -> Result<Vec<Triple>, ParseError> {
        self.prefixes.clear();
        self.base.clear();

        // Normalize on entry: drop a BOM, fold CRLF.
        let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        self.chars = content.chars().collect();
        self.pos = 0;

        let mut triples = Vec::new();

        while self.pos < self.chars.len() {
            self.skip_whitespace_and_comments();
            if self.pos >= self.chars.len() {
                break;
            }

            if self.looking_at("@prefix") || self.looking_at_ci("PREFIX") {
                self.parse_prefix()?;
                continue;
            }

            if self.looking_at("@base") || self.looking_at_ci("BASE") {
                self.parse_base()?;
                continue;
            }

            match self.parse_triples() {
                Ok(parsed) => triples.extend(parsed),
                Err(err) => {
                    debug!(position = self.pos, %err, "skipping malformed statement");
                    self.skip_to_next_statement();
                }
            }
        }

        Ok(triples)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r' {
                self.pos += 1;
            } else if ch == '#' {
                while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn looking_at(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if i >= self.chars.len() || self.chars[i] != c {
                return false;
            }
            i += 1;
        }
        true
    }

    fn looking_at_ci(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if i >= self.chars.len() || !self.chars[i].eq_ignore_ascii_case(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn parse_prefix(&mut self) -> Result<(), ParseError> {
        if self.looking_at("@prefix") {
            self.pos += 7;
        } else {
            self.pos += 6;
        }

        self.skip_whitespace_and_comments();

        let prefix_name = self.parse_prefix_name();
        if prefix_name.is_empty() {
            return Err(ParseError::ExpectedPrefixName(self.pos));
        }

        self.skip_whitespace_and_comments();
        let iri = self.parse_iri()?;
        self.skip_whitespace_and_comments();

        if self.pos < self.chars.len() && self.chars[self.pos] == '.' {
            self.pos += 1;
        }

        let prefix = prefix_name.strip_suffix(':').unwrap_or(&prefix_name);
        self.prefixes.insert(prefix.to_string(), iri);

        Ok(())
    }

    fn parse_base(&mut self) -> Result<(), ParseError> {
        if self.looking_at("@base") {
            self.pos += 5;
        } else {
            self.pos += 4;
        }

        self.skip_whitespace_and_comments();
        let iri = self.parse_iri()?;
        self.skip_whitespace_and_comments();

        if self.pos < self.chars.len() && self.chars[self.pos] == '.' {
            self.pos += 1;
        }

        self.base = iri;
        Ok(())
    }

    fn parse_prefix_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch == ':' {
                self.pos += 1;
                return self.chars[start..self.pos].iter().collect();
            }
            if ch.is_whitespace() {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_iri(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace_and_comments();

        if self.pos >= self.chars.len() || self.chars[self.pos] != '<' {
            return Err(ParseError::ExpectedIriOpen(self.pos));
        }

        self.pos += 1;
        let start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos] != '>' {
            self.pos += 1;
        }

        if self.pos >= self.chars.len() {
            return Err(ParseError::UnterminatedIri);
        }

        let iri: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(iri)
    }

    fn parse_triples(&mut self) -> Result<Vec<Triple>, ParseError> {
        let mut triples = Vec::new();

        let subject = self.parse_subject()?;

        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.chars.len() {
                break;
            }

            if self.chars[self.pos] == '.' {
                self.pos += 1;
                break;
            }

            let predicate = self.parse_predicate()?;

            loop {
                self.skip_whitespace_and_comments();

                let object = self.parse_object()?;
                triples.push(Triple::new(&subject, &predicate, object));

                self.skip_whitespace_and_comments();
                if self.pos >= self.chars.len() {
                    break;
                }

                if self.chars[self.pos] == ',' {
                    self.pos += 1;
                    continue;
                }
                break;
            }

            self.skip_whitespace_and_comments();
            if self.pos >= self.chars.len() {
                break;
            }

            if self.chars[self.pos] == ';' {
                self.pos += 1;
                self.skip_whitespace_and_comments();
                // A trailing semicolon right before the final dot is accepted.
                if self.pos < self.chars.len() && self.chars[self.pos] == '.' {
                    self.pos += 1;
                    break;
                }
                continue;
            }

            if self.chars[self.pos] == '.' {
                self.pos += 1;
                break;
            }

            break;
        }

        Ok(triples)
    }

    fn parse_subject(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace_and_comments();

        if self.pos >= self.chars.len() {
            return Err(ParseError::UnexpectedEof);
        }

        if self.chars[self.pos] == '<' {
            let iri = self.parse_iri()?;
            return Ok(self.resolve_iri(&iri));
        }

        if self.looking_at("_:") {
            return Ok(self.parse_blank_node());
        }

        self.parse_prefixed_name()
    }

    fn parse_predicate(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace_and_comments();

        if self.pos >= self.chars.len() {
            return Err(ParseError::UnexpectedEof);
        }

        // The bare keyword `a`, only when not the start of a longer name.
        if self.chars[self.pos] == 'a'
            && (self.pos + 1 >= self.chars.len() || !is_name_char(self.chars[self.pos + 1]))
        {
            self.pos += 1;
            return Ok(RDF_TYPE.to_string());
        }

        if self.chars[self.pos] == '<' {
            let iri = self.parse_iri()?;
            return Ok(self.resolve_iri(&iri));
        }

        self.parse_prefixed_name()
    }

    fn parse_object(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace_and_comments();

        if self.pos >= self.chars.len() {
            return Err(ParseError::UnexpectedEof);
        }

        if self.chars[self.pos] == '<' {
            let iri = self.parse_iri()?;
            return Ok(self.resolve_iri(&iri));
        }

        if self.looking_at("_:") {
            return Ok(self.parse_blank_node());
        }

        if self.chars[self.pos] == '"' {
            return Ok(self.parse_literal());
        }

        self.parse_prefixed_name()
    }

    fn parse_blank_node(&mut self) -> String {
        let start = self.pos;
        self.pos += 2;

        while self.pos < self.chars.len() && is_name_char(self.chars[self.pos]) {
            self.pos += 1;
        }

        self.chars[start..self.pos].iter().collect()
    }

    fn parse_prefixed_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;

        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch == ':' || !is_name_char(ch) {
                break;
            }
            self.pos += 1;
        }

        if self.pos >= self.chars.len() || self.chars[self.pos] != ':' {
            return Err(ParseError::MissingColon(self.pos));
        }

        let prefix: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;

        let local_start = self.pos;
        while self.pos < self.chars.len() && is_name_char(self.chars[self.pos]) {
            self.pos += 1;
        }
        let local: String = self.chars[local_start..self.pos].iter().collect();

        // Unknown prefixes pass through untouched.
        match self.prefixes.get(&prefix) {
            Some(ns) => Ok(format!("{ns}{local}")),
            None => Ok(format!("{prefix}:{local}")),
        }
    }

    /// Literals are canonicalized to `"value"` plus any `@lang` or `^^<IRI>`
    /// suffix; escape sequences inside the value are kept verbatim.
    fn parse_literal(&mut self) -> String {
        let mut out = String::new();

        if self.looking_at("\"\"\"") {
            self.pos += 3;
            out.push('"');

            while self.pos < self.chars.len() {
                if self.looking_at("\"\"\"") {
                    self.pos += 3;
                    out.push('"');
                    break;
                }
                out.push(self.chars[self.pos]);
                self.pos += 1;
            }
        } else {
            self.pos += 1;
            out.push('"');

            while self.pos < self.chars.len() && self.chars[self.pos] != '"' {
                if self.chars[self.pos] == '\\' && self.pos + 1 < self.chars.len() {
                    out.push(self.chars[self.pos]);
                    self.pos += 1;
                    out.push(self.chars[self.pos]);
                    self.pos += 1;
                    continue;
                }
                out.push(self.chars[self.pos]);
                self.pos += 1;
            }

            if self.pos < self.chars.len() {
                self.pos += 1;
            }
            out.push('"');
        }

        if self.pos < self.chars.len() && self.chars[self.pos] == '@' {
            self.pos += 1;
            let tag_start = self.pos;
            while self.pos < self.chars.len()
                && (is_alpha_num(self.chars[self.pos]) || self.chars[self.pos] == '-')
            {
                self.pos += 1;
            }
            out.push('@');
            out.extend(&self.chars[tag_start..self.pos]);
        } else if self.looking_at("^^") {
            self.pos += 2;
            out.push_str("^^");

            if self.pos < self.chars.len() && self.chars[self.pos] == '<' {
                let iri = self.parse_iri().unwrap_or_default();
                out.push('<');
                out.push_str(&self.resolve_iri(&iri));
                out.push('>');
            } else {
                let dt = self.parse_prefixed_name().unwrap_or_default();
                out.push('<');
                out.push_str(&dt);
                out.push('>');
            }
        }

        out
    }

    /// Prepends the base only to IRIs with no scheme separator that do not
    /// start with `#`.
    fn resolve_iri(&self, iri: &str) -> String {
        if !self.base.is_empty() && !iri.contains("://") && !iri.starts_with('#') {
            format!("{}{}", self.base, iri)
        } else {
            iri.to_string()
        }
    }

    fn skip_to_next_statement(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos] != '.' {
            self.pos += 1;
        }
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
    }

    // ---------------------------------------------------------------------
    // Fallback path: regex declaration scraping plus a whitespace tokenizer.
    // A distinct code path from the cursor parser, kept for inputs the
    // primary pass chokes on.
    // ---------------------------------------------------------------------

    pub fn fallback_parse(&mut self, content: &str) -> Vec<Triple> {
        let prefix_re = Regex::new(r"@prefix\s+([a-zA-Z_][\w-]*):\s*<([^>]+)>\s*\.").unwrap();
        for cap in prefix_re.captures_iter(content) {
            self.prefixes.insert(cap[1].to_string(), cap[2].to_string());
        }

        let base_re = Regex::new(r"@base\s*<([^>]+)>\s*\.").unwrap();
        if let Some(cap) = base_re.captures(content) {
            self.base = cap[1].to_string();
        }

        let content = prefix_re.replace_all(content, "");
        let content = base_re.replace_all(&content, "");
        let comment_re = Regex::new(r"#[^\n]*").unwrap();
        let content = comment_re.replace_all(&content, "");

        let mut triples = Vec::new();
        for stmt in split_statements(&content) {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            triples.extend(self.parse_statement(stmt));
        }

        triples
    }

    fn parse_statement(&self, stmt: &str) -> Vec<Triple> {
        let tokens = tokenize(stmt);
        if tokens.len() < 3 {
            return Vec::new();
        }

        let mut triples = Vec::new();
        let subject = self.resolve_token(&tokens[0]);

        let mut i = 1;
        while i < tokens.len() {
            let predicate = self.resolve_token(&tokens[i]);
            i += 1;

            while i < tokens.len() {
                let token = &tokens[i];
                if token == ";" {
                    i += 1;
                    break;
                }
                if token == "," {
                    i += 1;
                    continue;
                }

                let object = self.resolve_token(token);
                triples.push(Triple::new(&subject, &predicate, object));
                i += 1;
            }
        }

        triples
    }

    fn resolve_token(&self, token: &str) -> String {
        let token = token.trim();

        if token.starts_with('<') && token.ends_with('>') {
            return self.resolve_iri(token.trim_matches(|c| c == '<' || c == '>'));
        }

        if token.starts_with('"') {
            return token.to_string();
        }

        if token == "a" {
            return RDF_TYPE.to_string();
        }

        if token.starts_with("_:") {
            return token.to_string();
        }

        if let Some((prefix, local)) = token.split_once(':') {
            if let Some(ns) = self.prefixes.get(prefix) {
                return format!("{ns}{local}");
            }
        }

        token.to_string()
    }
}

/// Splits raw text into statements on `.` outside strings and IRI refs.
fn split_statements(content: &str) -> Vec<String> {
    let runes: Vec<char> = content.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut in_triple_string = false;
    let mut in_iri = false;

    let mut i = 0;
    while i < runes.len() {
        let r = runes[i];

        if i + 2 < runes.len() && runes[i] == '"' && runes[i + 1] == '"' && runes[i + 2] == '"' {
            if !in_triple_string && !in_string {
                in_triple_string = true;
            } else if in_triple_string {
                in_triple_string = false;
            }
            current.push(r);
            i += 1;
            continue;
        }

        if r == '<' && !in_string && !in_triple_string {
            in_iri = true;
        } else if r == '>' && in_iri {
            in_iri = false;
        } else if r == '"' && !in_triple_string {
            in_string = !in_string;
        }

        if r == '.' && !in_string && !in_triple_string && !in_iri {
            statements.push(std::mem::take(&mut current));
        } else {
            current.push(r);
        }
        i += 1;
    }

    if !current.is_empty() {
        statements.push(current);
    }

    statements
}

/// Whitespace tokenizer that keeps IRI refs, literals (with their `@lang` or
/// `^^` suffix) and punctuation as single tokens.
fn tokenize(stmt: &str) -> Vec<String> {
    let runes: Vec<char> = stmt.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut in_triple_string = false;
    let mut in_iri = false;

    let mut i = 0;
    while i < runes.len() {
        let r = runes[i];

        if i + 2 < runes.len() && runes[i] == '"' && runes[i + 1] == '"' && runes[i + 2] == '"' {
            if !in_triple_string && !in_string {
                in_triple_string = true;
                current.push_str("\"\"\"");
                i += 3;
                continue;
            }
        }
        if in_triple_string
            && i + 2 < runes.len()
            && runes[i] == '"'
            && runes[i + 1] == '"'
            && runes[i + 2] == '"'
        {
            in_triple_string = false;
            current.push_str("\"\"\"");
            i += 3;
            tokens.push(std::mem::take(&mut current));
            continue;
        }

        if r == '<' && !in_string && !in_triple_string {
            in_iri = true;
            current.push(r);
            i += 1;
            continue;
        }
        if r == '>' && in_iri {
            in_iri = false;
            current.push(r);
            tokens.push(std::mem::take(&mut current));
            i += 1;
            continue;
        }
        if r == '"' && !in_triple_string {
            in_string = !in_string;
            current.push(r);
            if !in_string {
                // Absorb a language tag or datatype suffix into the token.
                while i + 1 < runes.len() && (runes[i + 1] == '@' || runes[i + 1] == '^') {
                    i += 1;
                    current.push(runes[i]);
                    if runes[i] == '^' && i + 1 < runes.len() && runes[i + 1] == '^' {
                        i += 1;
                        current.push(runes[i]);
                        while i + 1 < runes.len()
                            && !runes[i + 1].is_whitespace()
                            && runes[i + 1] != ';'
                            && runes[i + 1] != ','
                        {
                            i += 1;
                            current.push(runes[i]);
                            if runes[i] == '>' {
                                break;
                            }
                        }
                    } else if runes[i] == '@' {
                        while i + 1 < runes.len()
                            && (is_alpha_num(runes[i + 1]) || runes[i + 1] == '-')
                        {
                            i += 1;
                            current.push(runes[i]);
                        }
                    }
                }
                tokens.push(std::mem::take(&mut current));
            }
            i += 1;
            continue;
        }

        if in_iri || in_string || in_triple_string {
            current.push(r);
            i += 1;
            continue;
        }

        if r.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            i += 1;
            continue;
        }

        if r == ';' || r == ',' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(r.to_string());
            i += 1;
            continue;
        }

        current.push(r);
        i += 1;
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
