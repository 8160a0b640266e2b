//! Path expression parsing, matching and ranking.
//!
//! Grammar: `$` followed by any number of `.identifier`, `.*`,
//! `['quoted key']`, `[digits]` or `[*]`. Identifiers are letters, digits
//! and `-_:#@`. The empty string is the empty expression, which matches
//! nothing.

use super::doc_path::{DocPath, PathSegment};
use crate::error::ParseError;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

/// One parsed segment of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
    /// The `$` root marker.
    Root,
    /// A literal key, from `.name` or `['name']`.
    Field(String),
    /// A literal index, from `[2]`.
    Index(usize),
    /// `.*`: any single key or index.
    Star,
    /// `[*]`: any single index.
    StarIndex,
}

impl PathToken {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, PathToken::Star | PathToken::StarIndex)
    }

    /// Whether this token accepts one concrete segment.
    pub fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (PathToken::Root, PathSegment::Root) => true,
            (PathToken::Field(name), PathSegment::Field(key)) => name == key,
            (PathToken::Field(name), PathSegment::Index(index)) => *name == index.to_string(),
            (PathToken::Index(expected), PathSegment::Index(index)) => expected == index,
            (PathToken::Index(expected), PathSegment::Field(key)) => {
                key.parse::<usize>().ok() == Some(*expected)
            }
            (PathToken::Star, PathSegment::Field(_) | PathSegment::Index(_)) => true,
            (PathToken::StarIndex, PathSegment::Index(_)) => true,
            (PathToken::StarIndex, PathSegment::Field(key)) => key.parse::<usize>().is_ok(),
            _ => false,
        }
    }
}

/// Rank of an expression among competing rules.
///
/// Ordered by the number of literal segments, then by total segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity {
    pub literals: usize,
    pub segments: usize,
}

/// A parsed path expression, e.g. `$.items[*].id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathExpression {
    tokens: Vec<PathToken>,
}

impl PathExpression {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if text.is_empty() {
            return Ok(PathExpression::default());
        }
        Parser::new(text).parse()
    }

    pub fn root() -> Self {
        PathExpression {
            tokens: vec![PathToken::Root],
        }
    }

    /// Expression naming a single keyed entry, such as a header.
    pub fn key(name: &str) -> Self {
        PathExpression {
            tokens: vec![PathToken::Field(name.to_string())],
        }
    }

    pub fn from_tokens(tokens: Vec<PathToken>) -> Self {
        PathExpression { tokens }
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn child(&self, token: PathToken) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        PathExpression { tokens }
    }

    /// Exact-length match: every token accepts the segment at its position.
    pub fn matches(&self, path: &DocPath) -> bool {
        self.tokens.len() == path.len() && self.matches_prefix(path)
    }

    /// Length of the prefix of `path` this expression matches, if any.
    ///
    /// A result shorter than `path.len()` means the expression names an
    /// ancestor of the path, and a rule attached to it cascades down.
    pub fn matched_length(&self, path: &DocPath) -> Option<usize> {
        if self.tokens.is_empty() || self.tokens.len() > path.len() {
            return None;
        }
        self.matches_prefix(path).then_some(self.tokens.len())
    }

    fn matches_prefix(&self, path: &DocPath) -> bool {
        self.tokens
            .iter()
            .zip(path.segments())
            .all(|(token, segment)| token.matches(segment))
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            literals: self.tokens.iter().filter(|t| !t.is_wildcard()).count(),
            segments: self.tokens.len(),
        }
    }
}

/// The fully literal expression naming exactly `path`.
impl From<&DocPath> for PathExpression {
    fn from(path: &DocPath) -> Self {
        let tokens = path
            .segments()
            .iter()
            .map(|segment| match segment {
                PathSegment::Root => PathToken::Root,
                PathSegment::Field(name) => PathToken::Field(name.clone()),
                PathSegment::Index(index) => PathToken::Index(*index),
            })
            .collect();
        PathExpression { tokens }
    }
}

impl FromStr for PathExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathExpression::parse(s)
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                PathToken::Root => write!(f, "$")?,
                PathToken::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathToken::Field(name) if name.chars().all(is_identifier_char) => {
                    write!(f, ".{}", name)?
                }
                PathToken::Field(name) => write!(f, "['{}']", name)?,
                PathToken::Index(index) => write!(f, "[{}]", index)?,
                PathToken::Star => write!(f, ".*")?,
                PathToken::StarIndex => write!(f, "[*]")?,
            }
        }
        Ok(())
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '#' | '@')
}

struct Parser<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    tokens: Vec<PathToken>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            text,
            chars: text.char_indices().peekable(),
            tokens: Vec::new(),
        }
    }

    fn error(&self, index: usize, reason: impl Into<String>) -> ParseError {
        ParseError::path(self.text, index, reason)
    }

    fn parse(mut self) -> Result<PathExpression, ParseError> {
        match self.chars.next() {
            Some((_, '$')) => self.tokens.push(PathToken::Root),
            _ => return Err(self.error(0, "Path expressions must start with \"$\"")),
        }

        while let Some((index, c)) = self.chars.next() {
            match c {
                '.' => self.identifier(index)?,
                '[' => self.bracket(index)?,
                other => {
                    return Err(self.error(
                        index,
                        format!("Expected a \".\" or \"[\" instead of \"{}\"", other),
                    ))
                }
            }
        }

        Ok(PathExpression {
            tokens: self.tokens,
        })
    }

    fn identifier(&mut self, dot: usize) -> Result<(), ParseError> {
        match self.chars.next() {
            None => Err(self.error(dot + 1, "Expected a path after \".\"")),
            Some((_, '*')) => {
                self.tokens.push(PathToken::Star);
                Ok(())
            }
            Some((_, c)) if is_identifier_char(c) => {
                let mut name = String::from(c);
                while let Some(&(_, next)) = self.chars.peek() {
                    if !is_identifier_char(next) {
                        break;
                    }
                    name.push(next);
                    self.chars.next();
                }
                self.tokens.push(PathToken::Field(name));
                Ok(())
            }
            Some((index, c)) => Err(self.error(
                index,
                format!(
                    "Expected either a \"*\" or path identifier instead of \"{}\"",
                    c
                ),
            )),
        }
    }

    fn bracket(&mut self, open: usize) -> Result<(), ParseError> {
        match self.chars.next() {
            None => Err(self.error(
                open + 1,
                "Expected a \"'\" (single quote) or a digit after \"[\"",
            )),
            Some((_, ']')) => Err(self.error(open, "Empty bracket expressions are not allowed")),
            Some((start, '\'')) => self.quoted(start),
            Some((_, '*')) => {
                self.close_bracket()?;
                self.tokens.push(PathToken::StarIndex);
                Ok(())
            }
            Some((start, c)) if c.is_ascii_digit() => self.index(start, c),
            Some((index, _)) => Err(self.error(
                index,
                "Indexes can only consist of numbers or a \"*\"",
            )),
        }
    }

    fn quoted(&mut self, start: usize) -> Result<(), ParseError> {
        let mut name = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error(self.text.len(), "Unterminated string")),
                Some((_, '\'')) => break,
                Some((_, c)) => name.push(c),
            }
        }
        if name.is_empty() {
            return Err(self.error(start, "Empty strings are not allowed"));
        }
        self.close_bracket()?;
        self.tokens.push(PathToken::Field(name));
        Ok(())
    }

    fn index(&mut self, start: usize, first: char) -> Result<(), ParseError> {
        let mut digits = String::from(first);
        loop {
            match self.chars.next() {
                None => return Err(self.error(self.text.len(), "Unterminated brackets")),
                Some((_, ']')) => break,
                Some((_, c)) if c.is_ascii_digit() => digits.push(c),
                Some((index, _)) => {
                    return Err(self.error(
                        index,
                        "Indexes can only consist of numbers or a \"*\"",
                    ))
                }
            }
        }
        let index = digits
            .parse::<usize>()
            .map_err(|_| self.error(start, format!("Index {} is out of range", digits)))?;
        self.tokens.push(PathToken::Index(index));
        Ok(())
    }

    fn close_bracket(&mut self) -> Result<(), ParseError> {
        match self.chars.next() {
            Some((_, ']')) => Ok(()),
            Some((index, _)) => Err(self.error(index, "Unterminated brackets")),
            None => Err(self.error(self.text.len(), "Unterminated brackets")),
        }
    }
}
