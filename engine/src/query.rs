//! Search query language.
//!
//! A raw search string mixes field tokens with free text:
//!
//! ```text
//! @buyer:iron @country:"united kingdom" steel
//! ```
//!
//! The string is first split by a quote-aware tokenizer, then each token is
//! classified. `@<field>:<value>` with a recognized field and a non-empty
//! value becomes a [`FieldPredicate`]; every other token is free text and is
//! joined back, in order, into a single [`FreeTextPredicate`]. Parsing never
//! fails: anything unrecognized degrades to free text.

use crate::schema::Field;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Fields addressable with `@<field>:` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryField {
    Buyer,
    /// `@country` and `@destination` are aliases for the same column.
    Destination,
    Exporter,
    Email,
    Phone,
    Website,
    Address,
    Company,
    Code,
}

impl QueryField {
    /// Resolve a token field name. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name.to_ascii_lowercase().as_str() {
            "buyer" => QueryField::Buyer,
            "country" | "destination" => QueryField::Destination,
            "exporter" => QueryField::Exporter,
            "email" => QueryField::Email,
            "phone" => QueryField::Phone,
            "website" => QueryField::Website,
            "address" => QueryField::Address,
            "company" => QueryField::Company,
            "code" => QueryField::Code,
            _ => return None,
        };
        Some(field)
    }

    /// The record field this token filters on.
    pub fn target(self) -> Field {
        match self {
            QueryField::Buyer => Field::BuyerName,
            QueryField::Destination => Field::DestinationCountry,
            QueryField::Exporter => Field::Exporters,
            QueryField::Email => Field::Emails,
            QueryField::Phone => Field::Phones,
            QueryField::Website => Field::Websites,
            QueryField::Address => Field::Addresses,
            QueryField::Company => Field::CompanyNameEnglish,
            QueryField::Code => Field::CountryCode,
        }
    }
}

/// Constraint on a single named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPredicate {
    pub field: QueryField,
    /// Value as typed; matching lowercases it.
    pub value: String,
}

/// Constraint matched against every searchable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTextPredicate {
    pub value: String,
}

/// A parsed search. All predicates must hold; an empty query matches every
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub fields: Vec<FieldPredicate>,
    pub free_text: Option<FreeTextPredicate>,
}

impl Query {
    /// Parse a raw search string.
    pub fn parse(input: &str) -> Self {
        let mut query = Query::default();
        let mut free_words: Vec<String> = Vec::new();

        for token in tokenize(input) {
            match classify(&token) {
                Some(predicate) => query.fields.push(predicate),
                None => free_words.push(token.text),
            }
        }

        if !free_words.is_empty() {
            query.free_text = Some(FreeTextPredicate {
                value: free_words.join(" "),
            });
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.free_text.is_none()
    }
}

impl FromStr for Query {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Query::parse(s))
    }
}

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    /// The token opened with a quote, so it is always literal text.
    quoted: bool,
}

#[derive(Clone, Copy)]
enum State {
    Between,
    Bare,
    Quoted,
}

/// Split on whitespace, keeping double-quoted runs together.
///
/// Quotes are removed from the token text. An unterminated quote runs to the
/// end of the input. Tokens that end up empty (`""`) are dropped.
fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut quoted = false;
    let mut state = State::Between;

    for ch in input.chars() {
        state = match (state, ch) {
            (State::Between, c) if c.is_whitespace() => State::Between,
            (State::Between, '"') => {
                quoted = true;
                State::Quoted
            }
            (State::Between, c) => {
                quoted = false;
                text.push(c);
                State::Bare
            }
            (State::Bare, c) if c.is_whitespace() => {
                flush(&mut text, quoted, &mut tokens);
                State::Between
            }
            (State::Bare, '"') => State::Quoted,
            (State::Bare, c) => {
                text.push(c);
                State::Bare
            }
            (State::Quoted, '"') => State::Bare,
            (State::Quoted, c) => {
                text.push(c);
                State::Quoted
            }
        };
    }
    flush(&mut text, quoted, &mut tokens);

    tokens
}

fn flush(text: &mut String, quoted: bool, tokens: &mut Vec<Token>) {
    if !text.is_empty() {
        tokens.push(Token {
            text: std::mem::take(text),
            quoted,
        });
    }
}

/// Recognize `@<field>:<value>`. Returns `None` for literal text.
fn classify(token: &Token) -> Option<FieldPredicate> {
    if token.quoted {
        return None;
    }
    let rest = token.text.strip_prefix('@')?;
    let (name, value) = rest.split_once(':')?;
    let field = QueryField::from_name(name)?;
    if value.trim().is_empty() {
        return None;
    }

    Some(FieldPredicate {
        field,
        value: value.to_string(),
    })
}
