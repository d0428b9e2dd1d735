//! Deprecation lifecycle of an endpoint identity.
//!
//! The lifecycle only moves forward, `Pending -> Scheduled -> Deprecated`.
//! Backward moves are rejected unless the request is forced, and
//! [`ACTIVE_SENTINEL`] marks an identity whose lifecycle was cleared.

use crate::error::{ApiDocsError, Result};
use crate::model::DeprecationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stored status value for an identity that is not (or no longer) deprecated.
pub const ACTIVE_SENTINEL: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeprecationStatus {
    Pending,
    Scheduled,
    Deprecated,
}

impl DeprecationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeprecationStatus::Pending => "pending",
            DeprecationStatus::Scheduled => "scheduled",
            DeprecationStatus::Deprecated => "deprecated",
        }
    }

    /// Decide the status an identity moves to when `requested` is applied
    /// on top of `current`.
    pub fn transition(
        current: Option<DeprecationStatus>,
        requested: DeprecationStatus,
        force: bool,
    ) -> Result<DeprecationStatus> {
        match current {
            Some(from) if requested < from && !force => Err(ApiDocsError::InvalidTransition {
                from: from.to_string(),
                to: requested.to_string(),
            }),
            _ => Ok(requested),
        }
    }
}

impl fmt::Display for DeprecationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeprecationStatus {
    type Err = ApiDocsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DeprecationStatus::Pending),
            "scheduled" => Ok(DeprecationStatus::Scheduled),
            "deprecated" => Ok(DeprecationStatus::Deprecated),
            _ => Err(ApiDocsError::InvalidRecord(format!(
                "unknown deprecation status '{s}'"
            ))),
        }
    }
}

/// A caller's partial deprecation config. Unset fields are defaulted by
/// [`DeprecationRequest::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationRequest {
    #[serde(default)]
    pub status: Option<DeprecationStatus>,
    #[serde(default)]
    pub deprecated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub removal_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub alternative_endpoint: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Allow moving the lifecycle backwards (corrections).
    #[serde(default)]
    pub force: bool,
}

impl DeprecationRequest {
    /// Produce the config to store, given the identity's current status.
    ///
    /// An explicit status goes through [`DeprecationStatus::transition`]. Without
    /// one, a removal date implies `Scheduled` and otherwise `Pending`; an implied
    /// status never moves the identity backwards.
    pub fn resolve(
        &self,
        current: Option<DeprecationStatus>,
        now: DateTime<Utc>,
    ) -> Result<DeprecationConfig> {
        let status = match self.status {
            Some(requested) => DeprecationStatus::transition(current, requested, self.force)?,
            None => {
                let implied = if self.removal_date.is_some() {
                    DeprecationStatus::Scheduled
                } else {
                    DeprecationStatus::Pending
                };
                current.map_or(implied, |from| from.max(implied))
            }
        };

        Ok(DeprecationConfig {
            status,
            deprecated_at: self.deprecated_at.unwrap_or(now),
            removal_date: self.removal_date,
            alternative_endpoint: self.alternative_endpoint.clone(),
            reason: self.reason.clone(),
        })
    }
}
