mod codec;

use crate::deprecation::{DeprecationRequest, ACTIVE_SENTINEL};
use crate::error::{ApiDocsError, Result};
use crate::model::{
    ChangeType, DeprecatedEndpoint, DeprecationConfig, EndpointRecord, EndpointVersion, HttpMethod,
};
use crate::version::{self, SemVer, VersionComparison, BASELINE_VERSION};
use chrono::Utc;
use codec::{RecordColumns, SnapshotRow, VersionRow};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite-backed store of endpoint snapshots, version history and
/// deprecation state. Every read hands out owned copies.
pub struct EndpointStore {
    conn: Connection,
}

impl EndpointStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        log::info!("Opened endpoint store at {}", path.display());
        let store = EndpointStore { conn };
        store.initialize_tables()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = EndpointStore { conn };
        store.initialize_tables()?;
        Ok(store)
    }

    /// Close the underlying connection, surfacing any error from SQLite.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| ApiDocsError::Storage(e))?;
        log::info!("Closed endpoint store");
        Ok(())
    }

    fn initialize_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS endpoints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                method TEXT NOT NULL,
                description TEXT,
                group_name TEXT,
                parameters TEXT,
                example_request TEXT,
                example_response TEXT,
                snippets TEXT,
                version TEXT DEFAULT '1.0.0',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                deprecation_status TEXT,
                deprecation_date TEXT,
                removal_date TEXT,
                alternative_endpoint TEXT,
                deprecation_reason TEXT,
                UNIQUE(path, method)
            );

            CREATE TABLE IF NOT EXISTS endpoint_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                method TEXT NOT NULL,
                description TEXT,
                group_name TEXT,
                parameters TEXT,
                example_request TEXT,
                example_response TEXT,
                snippets TEXT,
                version TEXT NOT NULL,
                notes TEXT,
                change_type TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_versions_identity ON endpoint_versions(path, method);
            CREATE INDEX IF NOT EXISTS idx_versions_path_version
                ON endpoint_versions(path, version);
            ",
        )?;
        Ok(())
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Upsert the current snapshot for the record's identity.
    /// Creation time and deprecation state are kept.
    pub fn save(&self, record: &EndpointRecord) -> Result<()> {
        let c = RecordColumns::encode(record)?;
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO endpoints
                (path, method, description, group_name, parameters, example_request,
                 example_response, snippets, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT(path, method) DO UPDATE SET
                description = excluded.description,
                group_name = excluded.group_name,
                parameters = excluded.parameters,
                example_request = excluded.example_request,
                example_response = excluded.example_response,
                snippets = excluded.snippets,
                updated_at = excluded.updated_at",
            params![
                c.path,
                c.method,
                c.description,
                c.group_name,
                c.parameters,
                c.example_request,
                c.example_response,
                c.snippets,
                now
            ],
        )?;
        log::debug!("Saved snapshot {} {}", record.method, record.path);
        Ok(())
    }

    /// Every current snapshot, in insertion order.
    pub fn find_all(&self) -> Result<Vec<EndpointRecord>> {
        self.query_snapshots("ORDER BY id", params![])?
            .into_iter()
            .map(SnapshotRow::into_record)
            .collect()
    }

    pub fn find_by_identity(
        &self,
        path: &str,
        method: HttpMethod,
    ) -> Result<Option<EndpointRecord>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM endpoints WHERE path = ?1 AND method = ?2",
                    SnapshotRow::COLUMNS
                ),
                params![path, method.as_str()],
                SnapshotRow::from_row,
            )
            .optional()?;
        row.map(SnapshotRow::into_record).transpose()
    }

    /// All current snapshots sharing a path (one per method).
    pub fn find_by_path(&self, path: &str) -> Result<Vec<EndpointRecord>> {
        self.query_snapshots("WHERE path = ?1 ORDER BY id", params![path])?
            .into_iter()
            .map(SnapshotRow::into_record)
            .collect()
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM endpoints", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Delete every snapshot and history entry for `path`.
    /// Returns the number of rows removed; zero when nothing matched.
    pub fn remove(&self, path: &str) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let snapshots = tx.execute("DELETE FROM endpoints WHERE path = ?1", params![path])?;
        let versions = tx.execute("DELETE FROM endpoint_versions WHERE path = ?1", params![path])?;
        tx.commit()?;

        let removed = snapshots + versions;
        if removed > 0 {
            log::debug!("Removed {removed} rows for {path}");
        }
        Ok(removed)
    }

    /// Save the given records only when the store has no snapshots yet.
    /// Returns how many were written.
    pub fn seed_if_empty(&self, records: &[EndpointRecord]) -> Result<usize> {
        if self.count()? > 0 {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            self.save(record)?;
        }
        tx.commit()?;

        log::info!("Seeded endpoint store with {} endpoints", records.len());
        Ok(records.len())
    }

    fn query_snapshots(
        &self,
        clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<SnapshotRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM endpoints {clause}",
            SnapshotRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params, SnapshotRow::from_row)?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?);
        }
        Ok(snapshots)
    }

    // ── Version History ──────────────────────────────────────────────

    /// Append a new history entry for the record's identity and return its version.
    ///
    /// The first entry of an identity is [`BASELINE_VERSION`]. Later entries bump
    /// the latest one by `forced`, or by the classified change against it. The
    /// current snapshot is left untouched.
    pub fn create_version(
        &self,
        record: &EndpointRecord,
        notes: Option<&str>,
        forced: Option<ChangeType>,
    ) -> Result<SemVer> {
        let tx = self.conn.unchecked_transaction()?;

        let latest = latest_version(&tx, &record.path, record.method)?;
        let (next, change_type) = match latest {
            None => (BASELINE_VERSION, None),
            Some(previous) => {
                let change = forced.unwrap_or_else(|| version::classify(&previous.record, record));
                (previous.version.bump(change), Some(change))
            }
        };

        let c = RecordColumns::encode(record)?;
        tx.execute(
            "INSERT INTO endpoint_versions
                (path, method, description, group_name, parameters, example_request,
                 example_response, snippets, version, notes, change_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                c.path,
                c.method,
                c.description,
                c.group_name,
                c.parameters,
                c.example_request,
                c.example_response,
                c.snippets,
                next.to_string(),
                notes,
                change_type.map(|change| change.as_str()),
                Utc::now()
            ],
        )?;
        tx.commit()?;

        log::debug!("Created version {next} of {} {}", record.method, record.path);
        Ok(next)
    }

    /// History entries for `path`, newest first. With a method, only that
    /// identity's lineage is listed.
    pub fn list_versions(
        &self,
        path: &str,
        method: Option<HttpMethod>,
    ) -> Result<Vec<EndpointVersion>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM endpoint_versions
             WHERE path = ?1 AND (?2 IS NULL OR method = ?2)
             ORDER BY created_at DESC, id DESC",
            VersionRow::COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![path, method.map(|m| m.as_str())],
            VersionRow::from_row,
        )?;

        let mut versions = Vec::new();
        for row in rows {
            versions.push(row?.into_version()?);
        }
        Ok(versions)
    }

    /// The record stored under `version` for `path`, if any. Read-only: the
    /// caller re-saves it to make it current.
    ///
    /// Without a method the tag must belong to a single method's lineage.
    pub fn rollback(
        &self,
        path: &str,
        method: Option<HttpMethod>,
        version: &str,
    ) -> Result<Option<EndpointRecord>> {
        let version: SemVer = version.parse()?;
        Ok(find_version(&self.conn, path, method, version)?.map(|entry| entry.record))
    }

    /// Field-level comparison of two history entries of one identity,
    /// oriented from the lower to the higher version.
    ///
    /// Without a method, the identity is the one `v1` resolves to.
    pub fn compare_versions(
        &self,
        path: &str,
        method: Option<HttpMethod>,
        v1: &str,
        v2: &str,
    ) -> Result<VersionComparison> {
        let (v1, v2): (SemVer, SemVer) = (v1.parse()?, v2.parse()?);

        let tx = self.conn.unchecked_transaction()?;
        let first = find_version(&tx, path, method, v1)?
            .ok_or_else(|| ApiDocsError::NotFound(format!("version {v1} of {path}")))?;
        let second = find_version(&tx, path, Some(first.record.method), v2)?.ok_or_else(|| {
            ApiDocsError::NotFound(format!("version {v2} of {} {path}", first.record.method))
        })?;
        tx.commit()?;

        let (before, after) = if first.version <= second.version {
            (first, second)
        } else {
            (second, first)
        };

        Ok(VersionComparison {
            path: path.to_string(),
            differences: version::diff_records(&before.record, &after.record)?,
            change_type: version::classify(&before.record, &after.record),
            from_version: before.version,
            to_version: after.version,
        })
    }

    // ── Deprecation ──────────────────────────────────────────────────

    /// Apply a deprecation request to every snapshot on `path`.
    /// Returns the number of identities updated.
    pub fn deprecate(&self, path: &str, request: &DeprecationRequest) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now();
        let mut updated = 0;

        for row in self.query_snapshots("WHERE path = ?1 ORDER BY id", params![path])? {
            let config = request.resolve(row.status()?, now)?;
            updated += tx.execute(
                "UPDATE endpoints SET
                    deprecation_status = ?1,
                    deprecation_date = ?2,
                    removal_date = ?3,
                    alternative_endpoint = ?4,
                    deprecation_reason = ?5
                 WHERE path = ?6 AND method = ?7",
                params![
                    config.status.as_str(),
                    config.deprecated_at,
                    config.removal_date,
                    config.alternative_endpoint,
                    config.reason,
                    path,
                    row.columns.method
                ],
            )?;
        }
        tx.commit()?;

        if updated > 0 {
            log::info!("Updated deprecation of {path} ({updated} endpoints)");
        }
        Ok(updated)
    }

    /// Clear the deprecation lifecycle of every snapshot on `path`.
    pub fn reinstate(&self, path: &str) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE endpoints SET
                deprecation_status = ?1,
                deprecation_date = NULL,
                removal_date = NULL,
                alternative_endpoint = NULL,
                deprecation_reason = NULL
             WHERE path = ?2",
            params![ACTIVE_SENTINEL, path],
        )?;
        Ok(updated)
    }

    /// Every snapshot whose lifecycle is set and not cleared.
    pub fn list_deprecated(&self) -> Result<Vec<DeprecatedEndpoint>> {
        let rows = self.query_snapshots(
            "WHERE deprecation_status IS NOT NULL AND deprecation_status != ?1 ORDER BY id",
            params![ACTIVE_SENTINEL],
        )?;

        let mut deprecated = Vec::new();
        for row in rows {
            if let Some(deprecation) = row.deprecation()? {
                deprecated.push(DeprecatedEndpoint {
                    record: row.into_record()?,
                    deprecation,
                });
            }
        }
        Ok(deprecated)
    }

    /// Deprecation state of the first snapshot on `path` that has one.
    pub fn is_deprecated(&self, path: &str) -> Result<Option<DeprecationConfig>> {
        for row in self.query_snapshots("WHERE path = ?1 ORDER BY id", params![path])? {
            if let Some(config) = row.deprecation()? {
                return Ok(Some(config));
            }
        }
        Ok(None)
    }
}

/// Most recently created history entry of an identity.
fn latest_version(
    conn: &Connection,
    path: &str,
    method: HttpMethod,
) -> Result<Option<EndpointVersion>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM endpoint_versions WHERE path = ?1 AND method = ?2
                 ORDER BY id DESC LIMIT 1",
                VersionRow::COLUMNS
            ),
            params![path, method.as_str()],
            VersionRow::from_row,
        )
        .optional()?;
    row.map(VersionRow::into_version).transpose()
}

/// History entry of `path` tagged with `version`, optionally limited to one
/// method. A tag shared by several methods' lineages is ambiguous.
fn find_version(
    conn: &Connection,
    path: &str,
    method: Option<HttpMethod>,
    version: SemVer,
) -> Result<Option<EndpointVersion>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM endpoint_versions
         WHERE path = ?1 AND version = ?2 AND (?3 IS NULL OR method = ?3)
         ORDER BY id DESC",
        VersionRow::COLUMNS
    ))?;
    let rows: Vec<VersionRow> = stmt
        .query_map(
            params![path, version.to_string(), method.map(|m| m.as_str())],
            VersionRow::from_row,
        )?
        .collect::<rusqlite::Result<_>>()?;

    if rows
        .iter()
        .any(|row| row.columns.method != rows[0].columns.method)
    {
        return Err(ApiDocsError::AmbiguousVersion {
            path: path.to_string(),
            version: version.to_string(),
        });
    }
    rows.into_iter().next().map(VersionRow::into_version).transpose()
}
