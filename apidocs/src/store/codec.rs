// Row <-> model conversion at the persistence edge. Parameter lists and
// snippet maps are stored as JSON text; nothing above the store sees it.

use crate::deprecation::{DeprecationStatus, ACTIVE_SENTINEL};
use crate::error::Result;
use crate::model::{
    ChangeType, DeprecationConfig, EndpointParameter, EndpointRecord, EndpointVersion,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub fn encode_parameters(parameters: &[EndpointParameter]) -> Result<String> {
    Ok(serde_json::to_string(parameters)?)
}

pub fn decode_parameters(json: Option<&str>) -> Result<Vec<EndpointParameter>> {
    match json {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(text)?),
        _ => Ok(Vec::new()),
    }
}

pub fn encode_snippets(snippets: &BTreeMap<String, String>) -> Result<String> {
    Ok(serde_json::to_string(snippets)?)
}

pub fn decode_snippets(json: Option<&str>) -> Result<BTreeMap<String, String>> {
    match json {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(text)?),
        _ => Ok(BTreeMap::new()),
    }
}

/// Record columns shared by the `endpoints` and `endpoint_versions` tables
#[derive(Debug, Clone)]
pub struct RecordColumns {
    pub path: String,
    pub method: String,
    pub description: Option<String>,
    pub group_name: Option<String>,
    pub parameters: Option<String>,
    pub example_request: Option<String>,
    pub example_response: Option<String>,
    pub snippets: Option<String>,
}

impl RecordColumns {
    pub fn encode(record: &EndpointRecord) -> Result<Self> {
        Ok(RecordColumns {
            path: record.path.clone(),
            method: record.method.to_string(),
            description: Some(record.description.clone()),
            group_name: record.group.clone(),
            parameters: Some(encode_parameters(&record.parameters)?),
            example_request: record.example_request.clone(),
            example_response: record.example_response.clone(),
            snippets: Some(encode_snippets(&record.snippets)?),
        })
    }

    /// Read the eight record columns starting at column `offset`.
    pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(RecordColumns {
            path: row.get(offset)?,
            method: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
            group_name: row.get(offset + 3)?,
            parameters: row.get(offset + 4)?,
            example_request: row.get(offset + 5)?,
            example_response: row.get(offset + 6)?,
            snippets: row.get(offset + 7)?,
        })
    }

    pub fn decode(self) -> Result<EndpointRecord> {
        Ok(EndpointRecord {
            path: self.path,
            method: self.method.parse()?,
            description: self.description.unwrap_or_default(),
            group: self.group_name,
            parameters: decode_parameters(self.parameters.as_deref())?,
            example_request: self.example_request,
            example_response: self.example_response,
            snippets: decode_snippets(self.snippets.as_deref())?,
        })
    }
}

/// A raw row of the `endpoints` table
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub columns: RecordColumns,
    pub deprecation_status: Option<String>,
    pub deprecation_date: Option<DateTime<Utc>>,
    pub removal_date: Option<DateTime<Utc>>,
    pub alternative_endpoint: Option<String>,
    pub deprecation_reason: Option<String>,
}

impl SnapshotRow {
    pub const COLUMNS: &'static str = "path, method, description, group_name, parameters, \
         example_request, example_response, snippets, deprecation_status, deprecation_date, \
         removal_date, alternative_endpoint, deprecation_reason";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(SnapshotRow {
            columns: RecordColumns::from_row(row, 0)?,
            deprecation_status: row.get(8)?,
            deprecation_date: row.get(9)?,
            removal_date: row.get(10)?,
            alternative_endpoint: row.get(11)?,
            deprecation_reason: row.get(12)?,
        })
    }

    /// Current lifecycle status; `None` when unset or cleared to the active sentinel.
    pub fn status(&self) -> Result<Option<DeprecationStatus>> {
        match self.deprecation_status.as_deref() {
            None | Some(ACTIVE_SENTINEL) => Ok(None),
            Some(status) => Ok(Some(status.parse()?)),
        }
    }

    pub fn deprecation(&self) -> Result<Option<DeprecationConfig>> {
        Ok(self.status()?.map(|status| DeprecationConfig {
            status,
            deprecated_at: self.deprecation_date.unwrap_or_else(Utc::now),
            removal_date: self.removal_date,
            alternative_endpoint: self.alternative_endpoint.clone(),
            reason: self.deprecation_reason.clone(),
        }))
    }

    pub fn into_record(self) -> Result<EndpointRecord> {
        self.columns.decode()
    }
}

/// A raw row of the `endpoint_versions` table
#[derive(Debug, Clone)]
pub struct VersionRow {
    pub columns: RecordColumns,
    pub version: String,
    pub notes: Option<String>,
    pub change_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VersionRow {
    pub const COLUMNS: &'static str = "path, method, description, group_name, parameters, \
         example_request, example_response, snippets, version, notes, change_type, created_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(VersionRow {
            columns: RecordColumns::from_row(row, 0)?,
            version: row.get(8)?,
            notes: row.get(9)?,
            change_type: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    pub fn into_version(self) -> Result<EndpointVersion> {
        let change_type = self
            .change_type
            .as_deref()
            .map(str::parse::<ChangeType>)
            .transpose()?;

        Ok(EndpointVersion {
            version: self.version.parse()?,
            created_at: self.created_at,
            notes: self.notes,
            change_type,
            record: self.columns.decode()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpMethod, ParameterType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_json_columns_decode_empty() {
        assert!(decode_parameters(None).unwrap().is_empty());
        assert!(decode_parameters(Some("")).unwrap().is_empty());
        assert!(decode_snippets(None).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_json_column_is_an_error() {
        assert!(decode_parameters(Some("[{\"name\":")).is_err());
    }

    #[test]
    fn test_columns_encode_decode() {
        let mut record = EndpointRecord::new("/api/v1/users", HttpMethod::Post, "Create a user");
        record.group = Some("Users".into());
        record.parameters.push(EndpointParameter {
            name: "name".into(),
            param_type: ParameterType::String,
            required: true,
            description: "Full name".into(),
        });
        record.snippets.insert("python".into(), "requests.post(url)".into());
        record.snippets.insert("curl".into(), "curl -X POST".into());

        let columns = RecordColumns::encode(&record).unwrap();
        assert_eq!(columns.method, "POST");
        // map keys serialize in sorted order
        assert_eq!(
            columns.snippets.as_deref(),
            Some(r#"{"curl":"curl -X POST","python":"requests.post(url)"}"#)
        );
        assert_eq!(columns.decode().unwrap(), record);
    }
}
