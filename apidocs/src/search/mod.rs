// Free-text lookup over endpoint records, used by the CLI `search` command.

use crate::model::{EndpointRecord, HttpMethod};

/// Loose filter: case-insensitive substring match plus optional method/group filters.
#[derive(Debug, Clone, Default)]
pub struct TextQuery {
    pub text: Option<String>,
    pub method: Option<HttpMethod>,
    pub group: Option<String>,
}

/// Case-insensitive substring match over path, description and group.
pub fn matches_text(record: &EndpointRecord, query: &str) -> bool {
    let needle = query.to_lowercase();
    record.path.to_lowercase().contains(&needle)
        || record.description.to_lowercase().contains(&needle)
        || record
            .group
            .as_deref()
            .is_some_and(|group| group.to_lowercase().contains(&needle))
}

impl TextQuery {
    pub fn matches(&self, record: &EndpointRecord) -> bool {
        if let Some(method) = self.method {
            if record.method != method {
                return false;
            }
        }
        if let Some(group) = &self.group {
            let same_group = record
                .group
                .as_deref()
                .is_some_and(|g| g.eq_ignore_ascii_case(group));
            if !same_group {
                return false;
            }
        }
        match &self.text {
            Some(text) => matches_text(record, text),
            None => true,
        }
    }
}

pub fn filter_records(records: Vec<EndpointRecord>, query: &TextQuery) -> Vec<EndpointRecord> {
    records
        .into_iter()
        .filter(|record| query.matches(record))
        .collect()
}
