//! Requests, responses and messages as they appear in a contract file.

use crate::rules::{deserialize_matching_rules, MatchingRules};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const TEXT_CONTENT_TYPE: &str = "text/plain";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body of an interaction part.
///
/// An absent body and an explicit `null` body are different: the first
/// places no constraint on the actual body, the second expects none.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Option<Value>")]
pub enum Body {
    #[default]
    Missing,
    Null,
    Present(Value),
}

impl From<Option<Value>> for Body {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Body::Null,
            Some(value) => Body::Present(value),
        }
    }
}

impl Body {
    pub fn is_missing(&self) -> bool {
        matches!(self, Body::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Body::Null)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Body::Present(_))
    }

    /// Missing, null, or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Missing | Body::Null => true,
            Body::Present(Value::String(text)) => text.is_empty(),
            Body::Present(_) => false,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Body::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Content type inferred from the body itself.
    pub fn detect_content_type(&self) -> &'static str {
        match self {
            Body::Present(Value::String(text)) => {
                match serde_json::from_str::<Value>(text) {
                    Ok(Value::Object(_) | Value::Array(_)) => JSON_CONTENT_TYPE,
                    _ => TEXT_CONTENT_TYPE,
                }
            }
            Body::Present(_) => JSON_CONTENT_TYPE,
            Body::Missing | Body::Null => TEXT_CONTENT_TYPE,
        }
    }
}

/// `application/json; charset=utf-8` becomes `application/json`.
pub fn base_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_json_content_type(content_type: &str) -> bool {
    let base = base_content_type(content_type);
    base == JSON_CONTENT_TYPE || base.ends_with("+json")
}

pub fn is_form_content_type(content_type: &str) -> bool {
    base_content_type(content_type) == FORM_CONTENT_TYPE
}

/// First value of the header called `name`, ignoring case.
pub fn header_value<'h>(headers: &'h BTreeMap<String, Vec<String>>, name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    #[serde(deserialize_with = "deserialize_query")]
    pub query: BTreeMap<String, Vec<String>>,
    #[serde(deserialize_with = "deserialize_headers")]
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: Body,
    #[serde(deserialize_with = "deserialize_matching_rules")]
    pub matching_rules: MatchingRules,
    pub generators: Option<Value>,
}

impl HttpRequest {
    pub fn content_type(&self) -> String {
        header_value(&self.headers, "Content-Type")
            .map(str::to_string)
            .unwrap_or_else(|| self.body.detect_content_type().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpResponse {
    pub status: u16,
    #[serde(deserialize_with = "deserialize_headers")]
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: Body,
    #[serde(deserialize_with = "deserialize_matching_rules")]
    pub matching_rules: MatchingRules,
    pub generators: Option<Value>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        HttpResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: Body::Missing,
            matching_rules: MatchingRules::default(),
            generators: None,
        }
    }
}

impl HttpResponse {
    pub fn content_type(&self) -> String {
        header_value(&self.headers, "Content-Type")
            .map(str::to_string)
            .unwrap_or_else(|| self.body.detect_content_type().to_string())
    }
}

/// An asynchronous message: contents plus metadata.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "content")]
    pub contents: Body,
    pub metadata: BTreeMap<String, Value>,
    #[serde(deserialize_with = "deserialize_matching_rules")]
    pub matching_rules: MatchingRules,
    pub generators: Option<Value>,
}

impl Message {
    pub fn content_type(&self) -> String {
        self.metadata
            .iter()
            .find(|(key, _)| is_content_type_key(key))
            .and_then(|(_, value)| value.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.contents.detect_content_type().to_string())
    }
}

pub(crate) fn is_content_type_key(key: &str) -> bool {
    key.eq_ignore_ascii_case("contentType") || key.eq_ignore_ascii_case("content-type")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, OneOrMany>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, values)| (name, values.into()))
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuery {
    Text(String),
    Map(BTreeMap<String, OneOrMany>),
}

fn deserialize_query<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawQuery> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None => BTreeMap::new(),
        Some(RawQuery::Text(text)) => parse_query_string(&text),
        Some(RawQuery::Map(map)) => map
            .into_iter()
            .map(|(name, values)| (name, values.into()))
            .collect(),
    })
}

/// Parse `a=1&a=2&b` into parameter lists, URL-decoding names and values.
pub fn parse_query_string(query: &str) -> BTreeMap<String, Vec<String>> {
    let mut parameters: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pair in query.trim_start_matches('?').split('&').filter(|s| !s.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(key).unwrap_or_default().into_owned();
        let value = urlencoding::decode(value).unwrap_or_default().into_owned();
        parameters.entry(key).or_default().push(value);
    }
    parameters
}
