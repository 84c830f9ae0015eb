use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use infinit_domain::normalize::fold_name;
use infinit_domain::{
    Alias, AliasId, AliasKind, Fingerprint, Movement, MovementAttributes, MovementId, NewAlias,
    NewMovement, NewSourceDoc, SourceDoc, SourceId,
};

use crate::store::{MergeOutcome, Store, StoreError};

/// SQLite-backed implementation of the Store trait.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn =
            Connection::open(path).map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS movements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                canonical_name TEXT NOT NULL,
                folded_name TEXT NOT NULL UNIQUE,
                attributes TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS aliases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movement_id INTEGER NOT NULL REFERENCES movements(id) ON DELETE CASCADE,
                alias TEXT NOT NULL,
                folded_alias TEXT NOT NULL,
                kind TEXT NOT NULL,
                confidence REAL,
                created_at INTEGER NOT NULL,
                UNIQUE (movement_id, folded_alias)
            );

            CREATE TABLE IF NOT EXISTS sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                -- non-owning link: deleting a movement with documents still
                -- attached is rejected, a merge reassigns them first
                movement_id INTEGER REFERENCES movements(id),
                url TEXT NOT NULL UNIQUE,
                title TEXT,
                content TEXT,
                fingerprint TEXT,
                published_at INTEGER,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS source_quality (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
                label TEXT NOT NULL,
                score REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_aliases_movement ON aliases(movement_id);
            CREATE INDEX IF NOT EXISTS idx_aliases_folded ON aliases(folded_alias);
            CREATE INDEX IF NOT EXISTS idx_sources_movement ON sources(movement_id);
            CREATE INDEX IF NOT EXISTS idx_sources_fingerprint ON sources(fingerprint);
            ",
        )
        .map_err(|e| StoreError::Storage(format!("init_schema: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn row_to_movement(row: &rusqlite::Row<'_>) -> Result<Movement, StoreError> {
        let id: i64 = row.get(0).map_err(|e| StoreError::Storage(format!("row id: {}", e)))?;
        let canonical_name: String = row
            .get(1)
            .map_err(|e| StoreError::Storage(format!("row name: {}", e)))?;
        let attributes_json: String = row
            .get(2)
            .map_err(|e| StoreError::Storage(format!("row attributes: {}", e)))?;
        let attributes: MovementAttributes = serde_json::from_str(&attributes_json)
            .map_err(|e| StoreError::Storage(format!("parse attributes: {}", e)))?;
        let created_ms: i64 = row
            .get(3)
            .map_err(|e| StoreError::Storage(format!("row created: {}", e)))?;
        let updated_ms: i64 = row
            .get(4)
            .map_err(|e| StoreError::Storage(format!("row updated: {}", e)))?;

        Ok(Movement {
            id: MovementId(id),
            canonical_name,
            attributes,
            created_at: millis_to_utc(created_ms),
            updated_at: millis_to_utc(updated_ms),
        })
    }

    fn row_to_alias(row: &rusqlite::Row<'_>) -> Result<Alias, StoreError> {
        let id: i64 = row.get(0).map_err(|e| StoreError::Storage(format!("row id: {}", e)))?;
        let movement_id: i64 = row
            .get(1)
            .map_err(|e| StoreError::Storage(format!("row movement_id: {}", e)))?;
        let alias: String = row
            .get(2)
            .map_err(|e| StoreError::Storage(format!("row alias: {}", e)))?;
        let kind_str: String = row
            .get(3)
            .map_err(|e| StoreError::Storage(format!("row kind: {}", e)))?;
        let confidence: Option<f64> = row
            .get(4)
            .map_err(|e| StoreError::Storage(format!("row confidence: {}", e)))?;
        let created_ms: i64 = row
            .get(5)
            .map_err(|e| StoreError::Storage(format!("row created: {}", e)))?;

        Ok(Alias {
            id: AliasId(id),
            movement_id: MovementId(movement_id),
            alias,
            kind: AliasKind::parse(&kind_str).unwrap_or(AliasKind::Variant),
            confidence,
            created_at: millis_to_utc(created_ms),
        })
    }

    fn row_to_source(row: &rusqlite::Row<'_>) -> Result<SourceDoc, StoreError> {
        let id: i64 = row.get(0).map_err(|e| StoreError::Storage(format!("row id: {}", e)))?;
        let movement_id: Option<i64> = row
            .get(1)
            .map_err(|e| StoreError::Storage(format!("row movement_id: {}", e)))?;
        let url: String = row
            .get(2)
            .map_err(|e| StoreError::Storage(format!("row url: {}", e)))?;
        let title: Option<String> = row
            .get(3)
            .map_err(|e| StoreError::Storage(format!("row title: {}", e)))?;
        let content: Option<String> = row
            .get(4)
            .map_err(|e| StoreError::Storage(format!("row content: {}", e)))?;
        let fingerprint: Option<String> = row
            .get(5)
            .map_err(|e| StoreError::Storage(format!("row fingerprint: {}", e)))?;
        let published_ms: Option<i64> = row
            .get(6)
            .map_err(|e| StoreError::Storage(format!("row published: {}", e)))?;
        let created_ms: i64 = row
            .get(7)
            .map_err(|e| StoreError::Storage(format!("row created: {}", e)))?;

        Ok(SourceDoc {
            id: SourceId(id),
            movement_id: movement_id.map(MovementId),
            url,
            title,
            content,
            fingerprint: fingerprint.map(Fingerprint::from_hex),
            published_at: published_ms.map(millis_to_utc),
            created_at: millis_to_utc(created_ms),
        })
    }
}

const MOVEMENT_COLS: &str = "id, canonical_name, attributes, created_at, updated_at";
const ALIAS_COLS: &str = "id, movement_id, alias, kind, confidence, created_at";
const SOURCE_COLS: &str = "id, movement_id, url, title, content, fingerprint, published_at, created_at";

fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store for SqliteStore {
    fn movements(&self) -> Result<Vec<Movement>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM movements ORDER BY id", MOVEMENT_COLS))
            .map_err(|e| StoreError::Storage(format!("movements: {}", e)))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_movement(row)))
            .map_err(|e| StoreError::Storage(format!("movements: {}", e)))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| StoreError::Storage(e.to_string()))??);
        }
        Ok(out)
    }

    fn movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM movements WHERE id = ?1", MOVEMENT_COLS),
            params![id.as_i64()],
            |row| Ok(Self::row_to_movement(row)),
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("movement: {}", e)))?
        .transpose()
    }

    fn insert_movement(&self, movement: NewMovement) -> Result<MovementId, StoreError> {
        let conn = self.lock()?;
        let attributes_json = serde_json::to_string(&movement.attributes)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let now = Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO movements (canonical_name, folded_name, attributes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                movement.canonical_name,
                fold_name(&movement.canonical_name),
                attributes_json,
                now,
                now,
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict(format!(
                    "movement name already taken: {}",
                    movement.canonical_name
                ))
            } else {
                StoreError::Storage(format!("insert movement: {}", e))
            }
        })?;

        Ok(MovementId(conn.last_insert_rowid()))
    }

    fn aliases(&self) -> Result<Vec<Alias>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM aliases ORDER BY id", ALIAS_COLS))
            .map_err(|e| StoreError::Storage(format!("aliases: {}", e)))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_alias(row)))
            .map_err(|e| StoreError::Storage(format!("aliases: {}", e)))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| StoreError::Storage(e.to_string()))??);
        }
        Ok(out)
    }

    fn aliases_for_movement(&self, id: MovementId) -> Result<Vec<Alias>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM aliases WHERE movement_id = ?1 ORDER BY id",
                ALIAS_COLS
            ))
            .map_err(|e| StoreError::Storage(format!("aliases_for_movement: {}", e)))?;
        let rows = stmt
            .query_map(params![id.as_i64()], |row| Ok(Self::row_to_alias(row)))
            .map_err(|e| StoreError::Storage(format!("aliases_for_movement: {}", e)))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| StoreError::Storage(e.to_string()))??);
        }
        Ok(out)
    }

    fn insert_alias(&self, alias: NewAlias) -> Result<AliasId, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO aliases (movement_id, alias, folded_alias, kind, confidence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alias.movement_id.as_i64(),
                alias.alias,
                fold_name(&alias.alias),
                alias.kind.as_str(),
                alias.confidence,
                now,
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict(format!(
                    "alias already present under movement {}: {}",
                    alias.movement_id, alias.alias
                ))
            } else {
                StoreError::Storage(format!("insert alias: {}", e))
            }
        })?;

        Ok(AliasId(conn.last_insert_rowid()))
    }

    fn sources(&self) -> Result<Vec<SourceDoc>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM sources ORDER BY id", SOURCE_COLS))
            .map_err(|e| StoreError::Storage(format!("sources: {}", e)))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_source(row)))
            .map_err(|e| StoreError::Storage(format!("sources: {}", e)))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| StoreError::Storage(e.to_string()))??);
        }
        Ok(out)
    }

    fn source(&self, id: SourceId) -> Result<Option<SourceDoc>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLS),
            params![id.as_i64()],
            |row| Ok(Self::row_to_source(row)),
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("source: {}", e)))?
        .transpose()
    }

    fn source_by_url(&self, url: &str) -> Result<Option<SourceDoc>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM sources WHERE url = ?1", SOURCE_COLS),
            params![url],
            |row| Ok(Self::row_to_source(row)),
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("source_by_url: {}", e)))?
        .transpose()
    }

    fn source_by_fingerprint(&self, fp: &Fingerprint) -> Result<Option<SourceDoc>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM sources WHERE fingerprint = ?1 ORDER BY id LIMIT 1",
                SOURCE_COLS
            ),
            params![fp.as_str()],
            |row| Ok(Self::row_to_source(row)),
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("source_by_fingerprint: {}", e)))?
        .transpose()
    }

    fn insert_source(&self, source: NewSourceDoc) -> Result<SourceId, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO sources (movement_id, url, title, content, fingerprint, published_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                source.movement_id.map(|m| m.as_i64()),
                source.url,
                source.title,
                source.content,
                source.fingerprint.as_ref().map(|f| f.as_str().to_string()),
                source.published_at.map(|t| t.timestamp_millis()),
                now,
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict(format!("source url already stored: {}", source.url))
            } else {
                StoreError::Storage(format!("insert source: {}", e))
            }
        })?;

        Ok(SourceId(conn.last_insert_rowid()))
    }

    fn sources_missing_fingerprint(&self, limit: usize) -> Result<Vec<SourceDoc>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM sources
                 WHERE fingerprint IS NULL AND content IS NOT NULL
                 ORDER BY id LIMIT ?1",
                SOURCE_COLS
            ))
            .map_err(|e| StoreError::Storage(format!("missing_fingerprint: {}", e)))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| Ok(Self::row_to_source(row)))
            .map_err(|e| StoreError::Storage(format!("missing_fingerprint: {}", e)))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| StoreError::Storage(e.to_string()))??);
        }
        Ok(out)
    }

    fn set_fingerprint(&self, id: SourceId, fp: &Fingerprint) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE sources SET fingerprint = ?1 WHERE id = ?2",
                params![fp.as_str(), id.as_i64()],
            )
            .map_err(|e| StoreError::Storage(format!("set_fingerprint: {}", e)))?;
        if changed == 0 {
            return Err(StoreError::SourceNotFound(id));
        }
        Ok(())
    }

    fn delete_source(&self, id: SourceId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM sources WHERE id = ?1", params![id.as_i64()])
            .map_err(|e| StoreError::Storage(format!("delete_source: {}", e)))?;
        if changed == 0 {
            return Err(StoreError::SourceNotFound(id));
        }
        Ok(())
    }

    fn insert_source_quality(
        &self,
        source: SourceId,
        label: &str,
        score: f64,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO source_quality (source_id, label, score) VALUES (?1, ?2, ?3)",
            params![source.as_i64(), label, score],
        )
        .map_err(|e| StoreError::Storage(format!("insert_source_quality: {}", e)))?;
        Ok(())
    }

    fn source_quality_count(&self, source: SourceId) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM source_quality WHERE source_id = ?1",
                params![source.as_i64()],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Storage(format!("source_quality_count: {}", e)))?;
        Ok(count as usize)
    }

    fn apply_merge(
        &self,
        survivor: MovementId,
        losers: &[MovementId],
        new_aliases: &[NewAlias],
    ) -> Result<MergeOutcome, StoreError> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StoreError::Storage(format!("begin merge tx: {}", e)))?;

        let survivor_exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM movements WHERE id = ?1)",
                params![survivor.as_i64()],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Storage(format!("merge survivor check: {}", e)))?;
        if !survivor_exists {
            return Err(StoreError::MovementNotFound(survivor));
        }

        let mut outcome = MergeOutcome::default();
        let now = Utc::now().timestamp_millis();

        for alias in new_aliases {
            // INSERT OR IGNORE: the planner pre-checks collisions, the
            // unique index catches anything that raced in since.
            let inserted = tx
                .execute(
                    "INSERT OR IGNORE INTO aliases
                     (movement_id, alias, folded_alias, kind, confidence, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        alias.movement_id.as_i64(),
                        alias.alias,
                        fold_name(&alias.alias),
                        alias.kind.as_str(),
                        alias.confidence,
                        now,
                    ],
                )
                .map_err(|e| StoreError::Storage(format!("merge alias insert: {}", e)))?;
            outcome.aliases_created += inserted;
        }

        for loser in losers {
            let reassigned_sources = tx
                .execute(
                    "UPDATE sources SET movement_id = ?1 WHERE movement_id = ?2",
                    params![survivor.as_i64(), loser.as_i64()],
                )
                .map_err(|e| StoreError::Storage(format!("merge source reassign: {}", e)))?;
            outcome.sources_reassigned += reassigned_sources;

            // OR IGNORE leaves colliding aliases on the loser; they fall
            // away with the cascade delete below.
            let reassigned_aliases = tx
                .execute(
                    "UPDATE OR IGNORE aliases SET movement_id = ?1 WHERE movement_id = ?2",
                    params![survivor.as_i64(), loser.as_i64()],
                )
                .map_err(|e| StoreError::Storage(format!("merge alias reassign: {}", e)))?;
            outcome.aliases_reassigned += reassigned_aliases;

            let deleted = tx
                .execute("DELETE FROM movements WHERE id = ?1", params![loser.as_i64()])
                .map_err(|e| StoreError::Storage(format!("merge delete loser: {}", e)))?;
            outcome.movements_deleted += deleted;
        }

        tx.commit()
            .map_err(|e| StoreError::Storage(format!("commit merge tx: {}", e)))?;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinit_domain::AliasKind;

    fn store_with_movement(name: &str) -> (SqliteStore, MovementId) {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert_movement(NewMovement::named(name)).unwrap();
        (store, id)
    }

    fn new_source(movement: Option<MovementId>, url: &str) -> NewSourceDoc {
        NewSourceDoc {
            movement_id: movement,
            url: url.to_string(),
            title: None,
            content: Some("some content".to_string()),
            fingerprint: None,
            published_at: None,
        }
    }

    #[test]
    fn test_insert_and_get_movement() {
        let (store, id) = store_with_movement("Hnutí Hare Kršna");
        let loaded = store.movement(id).unwrap().unwrap();
        assert_eq!(loaded.canonical_name, "Hnutí Hare Kršna");
        assert!(store.movement(MovementId(999)).unwrap().is_none());
    }

    #[test]
    fn test_folded_name_uniqueness() {
        let (store, _) = store_with_movement("Hnutí Hare Kršna");
        // Same name with diacritics lost is a storage-level conflict
        let err = store
            .insert_movement(NewMovement::named("hnuti hare krsna"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_alias_unique_per_movement() {
        let (store, id) = store_with_movement("Wicca");
        store
            .insert_alias(NewAlias::new(id, "Wiccani", AliasKind::Configured))
            .unwrap();
        let err = store
            .insert_alias(NewAlias::new(id, "wiccani", AliasKind::Variant))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_source_url_uniqueness() {
        let (store, id) = store_with_movement("Wicca");
        store.insert_source(new_source(Some(id), "https://example.com/a")).unwrap();
        let err = store
            .insert_source(new_source(Some(id), "https://example.com/a"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_fingerprint_backfill_queries() {
        let (store, id) = store_with_movement("Wicca");
        let sid = store.insert_source(new_source(Some(id), "https://example.com/a")).unwrap();

        let missing = store.sources_missing_fingerprint(10).unwrap();
        assert_eq!(missing.len(), 1);

        let fp = Fingerprint::from_hex("abc123");
        store.set_fingerprint(sid, &fp).unwrap();
        assert!(store.sources_missing_fingerprint(10).unwrap().is_empty());
        assert_eq!(
            store.source_by_fingerprint(&fp).unwrap().unwrap().id,
            sid
        );
    }

    #[test]
    fn test_delete_source_cascades_quality() {
        let (store, id) = store_with_movement("Wicca");
        let sid = store.insert_source(new_source(Some(id), "https://example.com/a")).unwrap();
        store.insert_source_quality(sid, "credibility", 0.8).unwrap();
        assert_eq!(store.source_quality_count(sid).unwrap(), 1);

        store.delete_source(sid).unwrap();
        assert_eq!(store.source_quality_count(sid).unwrap(), 0);
        assert!(matches!(
            store.delete_source(sid),
            Err(StoreError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_apply_merge_reassigns_and_deletes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let survivor = store.insert_movement(NewMovement::named("Hnutí Wicca")).unwrap();
        let loser = store.insert_movement(NewMovement::named("Wicca")).unwrap();

        let doc = store.insert_source(new_source(Some(loser), "https://example.com/a")).unwrap();
        store
            .insert_alias(NewAlias::new(loser, "Wiccanství", AliasKind::Configured))
            .unwrap();

        let outcome = store
            .apply_merge(
                survivor,
                &[loser],
                &[NewAlias::new(survivor, "Wicca", AliasKind::Variant)],
            )
            .unwrap();

        assert_eq!(outcome.movements_deleted, 1);
        assert_eq!(outcome.sources_reassigned, 1);
        assert_eq!(outcome.aliases_created, 1);
        assert_eq!(outcome.aliases_reassigned, 1);

        assert!(store.movement(loser).unwrap().is_none());
        assert_eq!(
            store.source(doc).unwrap().unwrap().movement_id,
            Some(survivor)
        );
        let aliases: Vec<String> = store
            .aliases_for_movement(survivor)
            .unwrap()
            .into_iter()
            .map(|a| a.alias)
            .collect();
        assert!(aliases.contains(&"Wicca".to_string()));
        assert!(aliases.contains(&"Wiccanství".to_string()));
    }

    #[test]
    fn test_movement_delete_rejected_while_documents_attached() {
        let (store, id) = store_with_movement("Wicca");
        let sid = store
            .insert_source(new_source(Some(id), "https://example.com/a"))
            .unwrap();

        {
            let conn = store.lock().unwrap();
            let err = conn
                .execute("DELETE FROM movements WHERE id = ?1", params![id.as_i64()])
                .unwrap_err();
            assert!(is_constraint_violation(&err));
        }

        assert!(store.movement(id).unwrap().is_some());
        assert!(store.source(sid).unwrap().is_some());
    }

    #[test]
    fn test_apply_merge_missing_survivor() {
        let store = SqliteStore::open_in_memory().unwrap();
        let loser = store.insert_movement(NewMovement::named("Wicca")).unwrap();
        let err = store.apply_merge(MovementId(42), &[loser], &[]).unwrap_err();
        assert!(matches!(err, StoreError::MovementNotFound(_)));
        // The group failed before any mutation; the loser is untouched
        assert!(store.movement(loser).unwrap().is_some());
    }
}
