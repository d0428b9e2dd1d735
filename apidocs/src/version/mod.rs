use crate::error::{ApiDocsError, Result};
use crate::model::{ChangeType, EndpointRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Version assigned to the first history entry of an identity.
pub const BASELINE_VERSION: SemVer = SemVer {
    major: 1,
    minor: 0,
    patch: 0,
};

/// A `MAJOR.MINOR.PATCH` version. Ordering is numeric per component,
/// so `10.0.0` sorts after `2.0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemVer {
            major,
            minor,
            patch,
        }
    }

    /// The version that follows this one for the given kind of change.
    pub fn bump(self, change: ChangeType) -> SemVer {
        match change {
            ChangeType::Major => SemVer::new(self.major + 1, 0, 0),
            ChangeType::Minor => SemVer::new(self.major, self.minor + 1, 0),
            ChangeType::Patch => SemVer::new(self.major, self.minor, self.patch + 1),
        }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = ApiDocsError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || ApiDocsError::MalformedVersionString(s.to_string());
        let mut components = [0u64; 3];
        let mut parts = s.split('.');

        for slot in components.iter_mut() {
            let part = parts.next().ok_or_else(malformed)?;
            // u64::from_str accepts a leading '+', which is not part of the format
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            *slot = part.parse().map_err(|_| malformed())?;
        }
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(SemVer::new(components[0], components[1], components[2]))
    }
}

impl TryFrom<String> for SemVer {
    type Error = ApiDocsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SemVer> for String {
    fn from(version: SemVer) -> Self {
        version.to_string()
    }
}

/// Derive the next version string from `current`.
pub fn next_version(current: &str, change: ChangeType) -> Result<String> {
    let version: SemVer = current.parse()?;
    Ok(version.bump(change).to_string())
}

/// Classify the change from `old` to `new`.
///
/// Method or parameter changes are major; description, group or snippet
/// changes are minor; anything else (example text) is a patch.
pub fn classify(old: &EndpointRecord, new: &EndpointRecord) -> ChangeType {
    if old.method != new.method || old.parameters != new.parameters {
        ChangeType::Major
    } else if old.description != new.description
        || old.group != new.group
        || old.snippets != new.snippets
    {
        ChangeType::Minor
    } else {
        ChangeType::Patch
    }
}

/// Before/after values of one differing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// Result of comparing two history entries of the same path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionComparison {
    pub path: String,
    pub from_version: SemVer,
    pub to_version: SemVer,
    pub differences: BTreeMap<String, FieldChange>,
    pub change_type: ChangeType,
}

/// The fields compared by [`diff_records`], in their serialized form.
fn comparable_fields(record: &EndpointRecord) -> Result<[(&'static str, serde_json::Value); 7]> {
    Ok([
        ("method", serde_json::to_value(record.method)?),
        ("description", serde_json::to_value(&record.description)?),
        ("group", serde_json::to_value(&record.group)?),
        ("parameters", serde_json::to_value(&record.parameters)?),
        ("exampleRequest", serde_json::to_value(&record.example_request)?),
        ("exampleResponse", serde_json::to_value(&record.example_response)?),
        ("snippets", serde_json::to_value(&record.snippets)?),
    ])
}

/// Field-level diff of two records. Only differing fields are reported;
/// the path is the comparison key and never appears.
pub fn diff_records(
    before: &EndpointRecord,
    after: &EndpointRecord,
) -> Result<BTreeMap<String, FieldChange>> {
    let mut differences = BTreeMap::new();

    for ((name, old), (_, new)) in comparable_fields(before)?
        .into_iter()
        .zip(comparable_fields(after)?)
    {
        if old != new {
            differences.insert(
                name.to_string(),
                FieldChange {
                    before: old,
                    after: new,
                },
            );
        }
    }

    Ok(differences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EndpointParameter, HttpMethod, ParameterType};
    use pretty_assertions::assert_eq;

    fn widgets() -> EndpointRecord {
        let mut record = EndpointRecord::new("/api/v1/widgets", HttpMethod::Get, "List widgets");
        record.example_response = Some("[]".into());
        record
    }

    #[test]
    fn test_next_version() {
        assert_eq!(next_version("1.2.3", ChangeType::Major).unwrap(), "2.0.0");
        assert_eq!(next_version("1.2.3", ChangeType::Minor).unwrap(), "1.3.0");
        assert_eq!(next_version("1.2.3", ChangeType::Patch).unwrap(), "1.2.4");
    }

    #[test]
    fn test_malformed_versions_rejected() {
        for bad in ["", "1.2", "1.2.3.4", "a.b.c", "1..3", "+1.2.3", "1.2.-3", " 1.2.3"] {
            let result = next_version(bad, ChangeType::Patch);
            assert!(
                matches!(result, Err(ApiDocsError::MalformedVersionString(_))),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn test_semver_numeric_ordering() {
        let two: SemVer = "2.0.0".parse().unwrap();
        let ten: SemVer = "10.0.0".parse().unwrap();
        assert!(ten > two);
        assert!("1.10.0".parse::<SemVer>().unwrap() > "1.9.7".parse().unwrap());
    }

    #[test]
    fn test_classify_patch_for_example_text() {
        let old = widgets();
        let mut new = old.clone();
        new.example_response = Some("[{\"id\": 1}]".into());
        assert_eq!(classify(&old, &new), ChangeType::Patch);
    }

    #[test]
    fn test_classify_minor_for_description_group_snippets() {
        let old = widgets();

        let mut described = old.clone();
        described.description = "List all widgets".into();
        assert_eq!(classify(&old, &described), ChangeType::Minor);

        let mut grouped = old.clone();
        grouped.group = Some("Widgets".into());
        assert_eq!(classify(&old, &grouped), ChangeType::Minor);

        let mut snippet = old.clone();
        snippet.snippets.insert("curl".into(), "curl /api/v1/widgets".into());
        assert_eq!(classify(&old, &snippet), ChangeType::Minor);
    }

    #[test]
    fn test_classify_major_dominates() {
        let old = widgets();

        let mut method = old.clone();
        method.method = HttpMethod::Head;
        assert_eq!(classify(&old, &method), ChangeType::Major);

        let mut both = old.clone();
        both.description = "changed".into();
        both.parameters.push(EndpointParameter {
            name: "limit".into(),
            param_type: ParameterType::Number,
            required: false,
            description: "Page size".into(),
        });
        assert_eq!(classify(&old, &both), ChangeType::Major);
    }

    #[test]
    fn test_classify_parameter_order_matters() {
        let a = EndpointParameter {
            name: "a".into(),
            param_type: ParameterType::String,
            required: true,
            description: String::new(),
        };
        let b = EndpointParameter {
            name: "b".into(),
            ..a.clone()
        };
        let mut old = widgets();
        old.parameters = vec![a.clone(), b.clone()];
        let mut new = old.clone();
        new.parameters = vec![b, a];
        assert_eq!(classify(&old, &new), ChangeType::Major);
    }

    #[test]
    fn test_diff_reports_only_changed_fields() {
        let old = widgets();
        let mut new = old.clone();
        new.description = "List every widget".into();
        new.group = Some("Widgets".into());

        let diff = diff_records(&old, &new).unwrap();
        assert_eq!(
            diff.keys().cloned().collect::<Vec<_>>(),
            vec!["description".to_string(), "group".to_string()]
        );
        assert_eq!(diff["description"].before, "List widgets");
        assert_eq!(diff["group"].before, serde_json::Value::Null);
        assert_eq!(diff["group"].after, "Widgets");
    }

    #[test]
    fn test_diff_identical_records_is_empty() {
        let record = widgets();
        assert!(diff_records(&record, &record.clone()).unwrap().is_empty());
    }
}
