use std::collections::HashSet;
use std::sync::MutexGuard;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params_from_iter};

use crate::error::{PaperscopeError, Result};
pub use crate::models::{EntityKind, LinkKind};

use super::database::clear_tables;

/// Surrogate row id of a persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetOrCreate {
    pub id: EntityId,
    pub created: bool,
}

/// Transactional view of the relational store used by the ingest pipeline.
pub trait StorageSession {
    /// Look an entity up by `search` columns (NULL-safe equality); insert it
    /// with `search` plus `create` columns when absent.
    fn get_or_create(
        &mut self,
        kind: EntityKind,
        search: &[(&str, Value)],
        create: &[(&str, Value)],
    ) -> Result<GetOrCreate>;

    fn exists_by_key(&mut self, kind: EntityKind, column: &str, value: &Value) -> Result<bool>;

    /// Get-or-create the `(paper, other)` row of an association table.
    fn link(&mut self, link: LinkKind, paper: EntityId, other: EntityId) -> Result<bool>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn search_string_names(&mut self) -> Result<HashSet<String>>;

    fn count(&mut self, kind: EntityKind) -> Result<usize>;
}

/// SQLite-backed session. Writes open a transaction lazily; it stays open
/// until [`StorageSession::commit`] or [`StorageSession::rollback`].
pub struct IngestSession<'a> {
    conn: MutexGuard<'a, Connection>,
    in_transaction: bool,
    commits: usize,
}

impl<'a> IngestSession<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self {
            conn,
            in_transaction: false,
            commits: 0,
        }
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Remove every stored row and commit.
    pub fn clear(&mut self) -> Result<()> {
        self.begin()?;
        clear_tables(&self.conn)?;
        self.commit()
    }

    fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn find(&self, kind: EntityKind, search: &[(&str, Value)]) -> Result<Option<EntityId>> {
        let clause = search
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{col} IS ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!("SELECT id FROM {} WHERE {clause} LIMIT 1", kind.table());
        let id = self
            .conn
            .query_row(&sql, params_from_iter(search.iter().map(|(_, v)| v)), |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(id.map(EntityId))
    }

    fn insert(&self, kind: EntityKind, fields: &[(&str, Value)]) -> Result<EntityId> {
        let columns = fields.iter().map(|(col, _)| *col).collect::<Vec<_>>().join(", ");
        let placeholders = (1..=fields.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO {} ({columns}) VALUES ({placeholders})", kind.table());
        self.conn
            .execute(&sql, params_from_iter(fields.iter().map(|(_, v)| v)))?;
        Ok(EntityId(self.conn.last_insert_rowid()))
    }
}

fn check_columns(kind: EntityKind, fields: &[(&str, Value)]) -> Result<()> {
    for (col, _) in fields {
        if !kind.columns().iter().any(|known| known == col) {
            return Err(PaperscopeError::ValidationError(format!(
                "unknown column {col} for {kind}"
            )));
        }
    }
    Ok(())
}

impl StorageSession for IngestSession<'_> {
    fn get_or_create(
        &mut self,
        kind: EntityKind,
        search: &[(&str, Value)],
        create: &[(&str, Value)],
    ) -> Result<GetOrCreate> {
        if search.is_empty() {
            return Err(PaperscopeError::ValidationError(format!(
                "get-or-create on {kind} needs at least one search key"
            )));
        }
        check_columns(kind, search)?;
        check_columns(kind, create)?;

        if let Some(id) = self.find(kind, search)? {
            return Ok(GetOrCreate { id, created: false });
        }

        let mut fields: Vec<(&str, Value)> = search.to_vec();
        for (col, value) in create {
            if !fields.iter().any(|(c, _)| c == col) {
                fields.push((*col, value.clone()));
            }
        }
        self.begin()?;
        let id = self.insert(kind, &fields)?;
        Ok(GetOrCreate { id, created: true })
    }

    fn exists_by_key(&mut self, kind: EntityKind, column: &str, value: &Value) -> Result<bool> {
        check_columns(kind, &[(column, Value::Null)])?;
        let sql = format!("SELECT 1 FROM {} WHERE {column} = ?1 LIMIT 1", kind.table());
        let exists = self.conn.prepare(&sql)?.exists([value])?;
        Ok(exists)
    }

    fn link(&mut self, link: LinkKind, paper: EntityId, other: EntityId) -> Result<bool> {
        self.begin()?;
        let sql = format!(
            "INSERT OR IGNORE INTO {} (paper_id, {}) VALUES (?1, ?2)",
            link.table(),
            link.other_column()
        );
        let inserted = self.conn.execute(&sql, [paper.0, other.0])?;
        Ok(inserted > 0)
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
        }
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            self.conn.execute_batch("ROLLBACK")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn search_string_names(&mut self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT name FROM SearchString")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut names = HashSet::new();
        for row in rows {
            names.insert(row?);
        }
        Ok(names)
    }

    fn count(&mut self, kind: EntityKind) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl Drop for IngestSession<'_> {
    fn drop(&mut self) {
        if self.in_transaction {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}
