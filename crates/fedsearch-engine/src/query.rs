//! Query normalization.
//!
//! Turns a raw user query into the structured query language the index
//! understands. Tokens of the form `<field>:<op><value>` are passed through
//! with a canonical field name; everything else is joined into a single
//! wildcard match on the name field.
//!
//! ```text
//! "Foo oo.pdf"          -> Name:*foo\ oo.pdf*
//! "size:<100"           -> Size:<100
//! "report Mtime:>2024"  -> Name:*report* Mtime:>2024
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;

/// Characters with a meaning of their own in the structured query language.
const RESERVED: &[char] = &[
    '+', '-', '=', '&', '|', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '?',
    ':', '/',
];

/// Comparison operator of a field clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Plain `field:value`
    Match,
    /// `field:=value`
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Match => "",
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    /// Split a leading operator off a clause body.
    fn split(body: &str) -> (Operator, &str) {
        // Two-character operators first so `<=` is not read as `<`.
        for (prefix, op) in [
            ("<=", Operator::Le),
            (">=", Operator::Ge),
            ("<", Operator::Lt),
            (">", Operator::Gt),
            ("=", Operator::Eq),
        ] {
            if let Some(rest) = body.strip_prefix(prefix) {
                return (op, rest);
            }
        }
        (Operator::Match, body)
    }
}

/// A clause the user wrote in field syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldClause {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

/// The wildcard name match synthesized from free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextClause {
    pub field: String,
    /// Lower-cased, escaped term without the surrounding wildcards
    pub term: String,
}

/// One clause of a structured query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clause {
    Field(FieldClause),
    Text(TextClause),
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Field(c) => write!(f, "{}:{}{}", c.field, c.operator.as_str(), c.value),
            Clause::Text(c) => write!(f, "{}:*{}*", c.field, c.term),
        }
    }
}

/// Ordered clauses understood by the index backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub clauses: Vec<Clause>,
}

impl StructuredQuery {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The synthesized free-text clause, if the query had free text.
    pub fn text_clause(&self) -> Option<&TextClause> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Text(t) => Some(t),
            Clause::Field(_) => None,
        })
    }
}

impl fmt::Display for StructuredQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

/// Escape a free-text term for the structured query language.
///
/// Characters already preceded by a backslash are left alone, so escaping
/// is idempotent. A trailing lone backslash is escaped itself so it cannot
/// swallow the closing wildcard.
pub fn escape_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 4);
    let mut chars = term.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(c);
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
            continue;
        }
        if c.is_whitespace() || RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

/// Split on whitespace, keeping backslash-escaped characters and
/// double-quoted runs inside their token.
fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Upper-case the first letter of a field name.
fn canonical_field(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a token as a field clause, if it is one.
fn parse_field_clause(token: &str) -> Option<FieldClause> {
    let (field, body) = token.split_once(':')?;
    if !is_identifier(field) {
        return None;
    }

    let (operator, value) = Operator::split(body);
    if value.is_empty() {
        return None;
    }

    Some(FieldClause {
        field: canonical_field(field),
        operator,
        value: value.to_string(),
    })
}

/// Normalizes raw user queries into [`StructuredQuery`] values.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    name_field: String,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryNormalizer {
    pub fn new() -> Self {
        Self {
            name_field: "Name".to_string(),
        }
    }

    /// Match free text against a different field.
    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = field.into();
        self
    }

    pub fn normalize(&self, raw: &str) -> Result<StructuredQuery, EngineError> {
        if raw.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        let mut clauses = Vec::new();
        let mut text_terms: Vec<String> = Vec::new();
        let mut text_slot: Option<usize> = None;

        for token in tokenize(raw) {
            match parse_field_clause(&token) {
                Some(field) => clauses.push(Clause::Field(field)),
                None => {
                    if text_slot.is_none() {
                        text_slot = Some(clauses.len());
                    }
                    text_terms.push(token);
                }
            }
        }

        if let Some(slot) = text_slot {
            let term = escape_term(&text_terms.join(" ").to_lowercase());
            clauses.insert(
                slot,
                Clause::Text(TextClause {
                    field: self.name_field.clone(),
                    term,
                }),
            );
        }

        if clauses.is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        let query = StructuredQuery { clauses };
        debug!(raw, normalized = %query, "Normalized query");
        Ok(query)
    }
}
