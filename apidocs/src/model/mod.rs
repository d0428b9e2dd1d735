use crate::error::{ApiDocsError, Result};
use crate::version::SemVer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP verbs an endpoint can be documented under.
/// Parsing is case-insensitive; the canonical form is upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiDocsError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| ApiDocsError::InvalidRecord(format!("unsupported HTTP method '{s}'")))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = ApiDocsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Value type accepted by an endpoint parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = ApiDocsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(ParameterType::String),
            "number" => Ok(ParameterType::Number),
            "boolean" => Ok(ParameterType::Boolean),
            "array" => Ok(ParameterType::Array),
            "object" => Ok(ParameterType::Object),
            other => Err(ApiDocsError::InvalidRecord(format!(
                "unsupported parameter type '{other}'"
            ))),
        }
    }
}

/// A single documented request parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// Documentation for one HTTP endpoint.
///
/// `(path, method)` is the identity of the current snapshot. Snippets are keyed
/// by language label; a `BTreeMap` keeps their serialized form deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    #[serde(alias = "endpoint")]
    pub path: String,
    pub method: HttpMethod,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub parameters: Vec<EndpointParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_response: Option<String>,
    #[serde(default)]
    pub snippets: BTreeMap<String, String>,
}

impl EndpointRecord {
    /// Minimal record with only the required fields set.
    pub fn new(
        path: impl Into<String>,
        method: HttpMethod,
        description: impl Into<String>,
    ) -> Self {
        EndpointRecord {
            path: path.into(),
            method,
            description: description.into(),
            group: None,
            parameters: Vec::new(),
            example_request: None,
            example_response: None,
            snippets: BTreeMap::new(),
        }
    }
}

/// Severity of the difference between two record states.
/// Ordered so that `Major` dominates `Minor` dominates `Patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Patch,
    Minor,
    Major,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Patch => "patch",
            ChangeType::Minor => "minor",
            ChangeType::Major => "major",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = ApiDocsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patch" => Ok(ChangeType::Patch),
            "minor" => Ok(ChangeType::Minor),
            "major" => Ok(ChangeType::Major),
            _ => Err(ApiDocsError::Other(format!("unknown change type '{s}'"))),
        }
    }
}

/// Immutable history entry: a record frozen under a semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointVersion {
    #[serde(flatten)]
    pub record: EndpointRecord,
    pub version: SemVer,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
}

/// Deprecation lifecycle attached to an endpoint identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationConfig {
    pub status: crate::deprecation::DeprecationStatus,
    pub deprecated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A current snapshot together with its deprecation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedEndpoint {
    #[serde(flatten)]
    pub record: EndpointRecord,
    pub deprecation: DeprecationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_record_deserializes_legacy_endpoint_key() {
        let record: EndpointRecord = serde_json::from_str(
            r#"{"endpoint": "/api/v1/users", "method": "post", "description": "Create user",
                "parameters": [{"name": "email", "type": "string", "required": true,
                                "description": "Address"}],
                "snippets": {"curl": "curl -X POST /api/v1/users"}}"#,
        )
        .unwrap();

        assert_eq!(record.path, "/api/v1/users");
        assert_eq!(record.method, HttpMethod::Post);
        assert_eq!(record.parameters[0].param_type, ParameterType::String);
        assert!(record.parameters[0].required);
        assert_eq!(record.snippets["curl"], "curl -X POST /api/v1/users");
    }

    #[test]
    fn test_record_rejects_unknown_parameter_type() {
        let result: std::result::Result<EndpointRecord, _> = serde_json::from_str(
            r#"{"path": "/a", "method": "GET", "description": "x",
                "parameters": [{"name": "n", "type": "date"}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut record = EndpointRecord::new("/widgets", HttpMethod::Get, "List widgets");
        record.example_response = Some("[]".into());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["exampleResponse"], "[]");
        assert!(json.get("group").is_none());
    }

    #[test]
    fn test_change_type_ordering() {
        assert!(ChangeType::Major > ChangeType::Minor);
        assert!(ChangeType::Minor > ChangeType::Patch);
        assert_eq!("MAJOR".parse::<ChangeType>().unwrap(), ChangeType::Major);
    }
}
