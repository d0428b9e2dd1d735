use crate::deprecation::{DeprecationRequest, DeprecationStatus};
use crate::error::{ApiDocsError, Result};
use crate::model::{ChangeType, DeprecatedEndpoint, EndpointRecord, EndpointVersion, HttpMethod};
use crate::store::EndpointStore;
use crate::validation::{EndpointValidator, Validator};
use crate::version::{SemVer, VersionComparison};
use serde::{Deserialize, Serialize};

/// Exact-match filter over current snapshots. Every field that is set must
/// equal the record's field; unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub method: Option<HttpMethod>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub example_request: Option<String>,
    #[serde(default)]
    pub example_response: Option<String>,
}

impl SearchCriteria {
    pub fn matches(&self, record: &EndpointRecord) -> bool {
        fn field_matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
            wanted.as_deref().map_or(true, |w| Some(w) == actual)
        }

        field_matches(&self.path, Some(&record.path))
            && self.method.map_or(true, |m| m == record.method)
            && field_matches(&self.description, Some(&record.description))
            && field_matches(&self.group, record.group.as_deref())
            && field_matches(&self.example_request, record.example_request.as_deref())
            && field_matches(&self.example_response, record.example_response.as_deref())
    }
}

/// Business rules around the store: validation gate and existence checks.
pub struct DocumentationService<'a, V: Validator = EndpointValidator> {
    store: &'a EndpointStore,
    validator: V,
}

impl<'a> DocumentationService<'a> {
    pub fn new(store: &'a EndpointStore) -> Self {
        DocumentationService::with_validator(store, EndpointValidator)
    }
}

impl<'a, V: Validator> DocumentationService<'a, V> {
    pub fn with_validator(store: &'a EndpointStore, validator: V) -> Self {
        DocumentationService { store, validator }
    }

    pub fn store(&self) -> &EndpointStore {
        self.store
    }

    fn ensure_valid(&self, record: &EndpointRecord) -> Result<()> {
        self.validator.check(record).map_err(|violation| {
            log::warn!(
                "Rejected endpoint {} {}: {violation}",
                record.method,
                record.path
            );
            ApiDocsError::InvalidRecord(violation.to_string())
        })
    }

    /// Resolve the snapshot a path-level operation applies to. Without a
    /// method, the first snapshot stored for the path is used.
    fn resolve(&self, path: &str, method: Option<HttpMethod>) -> Result<EndpointRecord> {
        let found = match method {
            Some(method) => self.store.find_by_identity(path, method)?,
            None => self.store.find_by_path(path)?.into_iter().next(),
        };
        found.ok_or_else(|| match method {
            Some(method) => ApiDocsError::NotFound(format!("endpoint {method} {path}")),
            None => ApiDocsError::NotFound(format!("endpoint {path}")),
        })
    }

    fn ensure_path_exists(&self, path: &str) -> Result<()> {
        self.resolve(path, None).map(|_| ())
    }

    pub fn create_endpoint(&self, record: &EndpointRecord) -> Result<()> {
        self.ensure_valid(record)?;
        if self
            .store
            .find_by_identity(&record.path, record.method)?
            .is_some()
        {
            return Err(ApiDocsError::AlreadyExists {
                path: record.path.clone(),
                method: record.method.to_string(),
            });
        }
        self.store.save(record)
    }

    pub fn update_endpoint(&self, record: &EndpointRecord) -> Result<()> {
        self.ensure_valid(record)?;
        self.resolve(&record.path, Some(record.method))?;
        self.store.save(record)
    }

    /// Create when the identity is new, update otherwise.
    pub fn upsert_endpoint(&self, record: &EndpointRecord) -> Result<()> {
        if self
            .store
            .find_by_identity(&record.path, record.method)?
            .is_some()
        {
            self.update_endpoint(record)
        } else {
            self.create_endpoint(record)
        }
    }

    /// Delete a path with its history. Fails when nothing was stored under it.
    pub fn remove_endpoint(&self, path: &str) -> Result<usize> {
        match self.store.remove(path)? {
            0 => Err(ApiDocsError::NotFound(format!("endpoint {path}"))),
            removed => Ok(removed),
        }
    }

    /// Record the current snapshot as a new history entry.
    pub fn version_endpoint(
        &self,
        path: &str,
        method: Option<HttpMethod>,
        change_type: Option<ChangeType>,
        notes: Option<&str>,
    ) -> Result<SemVer> {
        let current = self.resolve(path, method)?;
        self.store.create_version(&current, notes, change_type)
    }

    pub fn list_versions(
        &self,
        path: &str,
        method: Option<HttpMethod>,
    ) -> Result<Vec<EndpointVersion>> {
        self.store.list_versions(path, method)
    }

    /// Fetch a historical record. With `restore`, it also becomes the current
    /// snapshot again (after validation).
    pub fn rollback_endpoint(
        &self,
        path: &str,
        method: Option<HttpMethod>,
        version: &str,
        restore: bool,
    ) -> Result<EndpointRecord> {
        let record = self
            .store
            .rollback(path, method, version)?
            .ok_or_else(|| ApiDocsError::NotFound(format!("version {version} of {path}")))?;

        if restore {
            self.ensure_valid(&record)?;
            self.store.save(&record)?;
            log::info!("Restored {} {} to version {version}", record.method, path);
        }
        Ok(record)
    }

    pub fn compare_versions(
        &self,
        path: &str,
        method: Option<HttpMethod>,
        v1: &str,
        v2: &str,
    ) -> Result<VersionComparison> {
        self.store.compare_versions(path, method, v1, v2)
    }

    /// Deprecate every method on `path`. The status defaults to `Deprecated`
    /// unless the request names one.
    pub fn deprecate_endpoint(&self, path: &str, mut request: DeprecationRequest) -> Result<usize> {
        self.ensure_path_exists(path)?;
        request.status.get_or_insert(DeprecationStatus::Deprecated);
        self.store.deprecate(path, &request)
    }

    pub fn reinstate_endpoint(&self, path: &str) -> Result<usize> {
        self.ensure_path_exists(path)?;
        self.store.reinstate(path)
    }

    pub fn list_deprecated(&self) -> Result<Vec<DeprecatedEndpoint>> {
        self.store.list_deprecated()
    }

    pub fn search_endpoints(&self, criteria: &SearchCriteria) -> Result<Vec<EndpointRecord>> {
        Ok(self
            .store
            .find_all()?
            .into_iter()
            .filter(|record| criteria.matches(record))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RuleViolation;
    use pretty_assertions::assert_eq;

    fn widgets() -> EndpointRecord {
        let mut record = EndpointRecord::new("/api/v1/widgets", HttpMethod::Get, "List widgets");
        record.group = Some("Widgets".into());
        record
    }

    fn users() -> EndpointRecord {
        let mut record = EndpointRecord::new("/api/v1/users", HttpMethod::Get, "List users");
        record.group = Some("Users".into());
        record
    }

    #[test]
    fn test_create_endpoint() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);

        service.create_endpoint(&widgets()).unwrap();
        assert_eq!(store.find_all().unwrap(), vec![widgets()]);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);
        service.create_endpoint(&widgets()).unwrap();

        let result = service.create_endpoint(&widgets());
        assert!(matches!(result, Err(ApiDocsError::AlreadyExists { .. })));

        // another method on the same path is a different identity
        let mut post = widgets();
        post.method = HttpMethod::Post;
        service.create_endpoint(&post).unwrap();
    }

    #[test]
    fn test_create_invalid_leaves_store_untouched() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);
        let mut record = widgets();
        record.path = "widgets".into();

        match service.create_endpoint(&record) {
            Err(ApiDocsError::InvalidRecord(detail)) => assert!(detail.contains("widgets")),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_update_requires_existing() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);

        let result = service.update_endpoint(&widgets());
        assert!(matches!(result, Err(ApiDocsError::NotFound(_))));

        service.create_endpoint(&widgets()).unwrap();
        let mut changed = widgets();
        changed.description = "List every widget".into();
        service.update_endpoint(&changed).unwrap();
        assert_eq!(store.find_all().unwrap(), vec![changed]);
    }

    #[test]
    fn test_custom_validator_is_used() {
        struct RejectAll;
        impl Validator for RejectAll {
            fn check(&self, _candidate: &EndpointRecord) -> std::result::Result<(), RuleViolation> {
                Err(RuleViolation::MissingField("description"))
            }
        }

        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::with_validator(&store, RejectAll);
        assert!(matches!(
            service.create_endpoint(&widgets()),
            Err(ApiDocsError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_version_endpoint() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);

        let result = service.version_endpoint("/api/v1/widgets", None, None, None);
        assert!(matches!(result, Err(ApiDocsError::NotFound(_))));

        service.create_endpoint(&widgets()).unwrap();
        let first = service
            .version_endpoint("/api/v1/widgets", None, None, Some("initial"))
            .unwrap();
        assert_eq!(first.to_string(), "1.0.0");

        let mut changed = widgets();
        changed.group = Some("Catalog".into());
        service.update_endpoint(&changed).unwrap();
        let second = service
            .version_endpoint("/api/v1/widgets", Some(HttpMethod::Get), None, None)
            .unwrap();
        assert_eq!(second.to_string(), "1.1.0");

        let forced = service
            .version_endpoint("/api/v1/widgets", None, Some(ChangeType::Major), None)
            .unwrap();
        assert_eq!(forced.to_string(), "2.0.0");
    }

    #[test]
    fn test_rollback_and_restore() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);
        service.create_endpoint(&widgets()).unwrap();
        service.version_endpoint("/api/v1/widgets", None, None, None).unwrap();

        let mut changed = widgets();
        changed.description = "Changed".into();
        service.update_endpoint(&changed).unwrap();

        let peek = service
            .rollback_endpoint("/api/v1/widgets", None, "1.0.0", false)
            .unwrap();
        assert_eq!(peek, widgets());
        assert_eq!(store.find_all().unwrap(), vec![changed]);

        service
            .rollback_endpoint("/api/v1/widgets", None, "1.0.0", true)
            .unwrap();
        assert_eq!(store.find_all().unwrap(), vec![widgets()]);

        let missing = service.rollback_endpoint("/api/v1/widgets", None, "3.0.0", false);
        assert!(matches!(missing, Err(ApiDocsError::NotFound(_))));
    }

    #[test]
    fn test_restore_brings_back_the_requested_method() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);
        let get = widgets();
        let mut post = widgets();
        post.method = HttpMethod::Post;
        post.description = "Create a widget".into();
        service.create_endpoint(&get).unwrap();
        service.create_endpoint(&post).unwrap();
        service
            .version_endpoint("/api/v1/widgets", Some(HttpMethod::Get), None, None)
            .unwrap();
        service
            .version_endpoint("/api/v1/widgets", Some(HttpMethod::Post), None, None)
            .unwrap();

        let mut changed = get.clone();
        changed.description = "Changed".into();
        service.update_endpoint(&changed).unwrap();

        let restored = service
            .rollback_endpoint("/api/v1/widgets", Some(HttpMethod::Get), "1.0.0", true)
            .unwrap();
        assert_eq!(restored, get);
        assert_eq!(store.find_all().unwrap(), vec![get, post]);

        let ambiguous = service.rollback_endpoint("/api/v1/widgets", None, "1.0.0", true);
        assert!(matches!(ambiguous, Err(ApiDocsError::AmbiguousVersion { .. })));
        assert_eq!(
            service
                .list_versions("/api/v1/widgets", Some(HttpMethod::Post))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_deprecate_endpoint_defaults_to_deprecated() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);

        let result = service.deprecate_endpoint("/api/v1/widgets", DeprecationRequest::default());
        assert!(matches!(result, Err(ApiDocsError::NotFound(_))));

        service.create_endpoint(&widgets()).unwrap();
        service
            .deprecate_endpoint(
                "/api/v1/widgets",
                DeprecationRequest {
                    reason: Some("Use /api/v2/widgets".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let deprecated = service.list_deprecated().unwrap();
        assert_eq!(deprecated.len(), 1);
        assert_eq!(deprecated[0].deprecation.status, DeprecationStatus::Deprecated);

        service.reinstate_endpoint("/api/v1/widgets").unwrap();
        assert!(service.list_deprecated().unwrap().is_empty());
    }

    #[test]
    fn test_deprecate_endpoint_respects_caller_status() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);
        service.create_endpoint(&widgets()).unwrap();

        service
            .deprecate_endpoint(
                "/api/v1/widgets",
                DeprecationRequest {
                    status: Some(DeprecationStatus::Pending),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            store.is_deprecated("/api/v1/widgets").unwrap().unwrap().status,
            DeprecationStatus::Pending
        );
    }

    #[test]
    fn test_remove_endpoint() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);

        assert!(matches!(
            service.remove_endpoint("/api/v1/widgets"),
            Err(ApiDocsError::NotFound(_))
        ));

        service.create_endpoint(&widgets()).unwrap();
        assert_eq!(service.remove_endpoint("/api/v1/widgets").unwrap(), 1);
    }

    #[test]
    fn test_search_is_exact_and_conjunctive() {
        let store = EndpointStore::open_in_memory().unwrap();
        let service = DocumentationService::new(&store);
        service.create_endpoint(&widgets()).unwrap();
        service.create_endpoint(&users()).unwrap();

        let by_group = SearchCriteria {
            group: Some("Users".into()),
            ..Default::default()
        };
        assert_eq!(service.search_endpoints(&by_group).unwrap(), vec![users()]);

        let partial = SearchCriteria {
            group: Some("User".into()),
            ..Default::default()
        };
        assert!(service.search_endpoints(&partial).unwrap().is_empty());

        let conflicting = SearchCriteria {
            group: Some("Users".into()),
            path: Some("/api/v1/widgets".into()),
            ..Default::default()
        };
        assert!(service.search_endpoints(&conflicting).unwrap().is_empty());

        let everything = SearchCriteria {
            method: Some(HttpMethod::Get),
            ..Default::default()
        };
        assert_eq!(service.search_endpoints(&everything).unwrap().len(), 2);
    }
}
