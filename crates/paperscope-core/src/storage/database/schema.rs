use rusqlite::Connection;

use crate::error::Result;
use crate::models::{EntityKind, LinkKind};

pub const SCHEMA_VERSION: u32 = 1;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS Source (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS Paper (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id        INTEGER REFERENCES Source(id),
            title            TEXT NOT NULL,
            publication_date TEXT,
            pub_type         TEXT,
            content_type     TEXT,
            abstract         TEXT,
            full_text        TEXT,
            citation_count   INTEGER,
            doi              TEXT,
            url              TEXT
        );

        CREATE TABLE IF NOT EXISTS PaperAuthor (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS PaperTag (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ResearchDB (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS UNGoal (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS SearchString (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            name                  TEXT NOT NULL,
            system_keywords       TEXT,
            intervention_keywords TEXT,
            outcome_keywords      TEXT,
            pub_year_filter       TEXT
        );

        CREATE TABLE IF NOT EXISTS AuthorWritesPaper (
            paper_id  INTEGER NOT NULL REFERENCES Paper(id) ON DELETE CASCADE,
            author_id INTEGER NOT NULL REFERENCES PaperAuthor(id) ON DELETE CASCADE,
            PRIMARY KEY (paper_id, author_id)
        );

        CREATE TABLE IF NOT EXISTS PaperHasTag (
            paper_id INTEGER NOT NULL REFERENCES Paper(id) ON DELETE CASCADE,
            tag_id   INTEGER NOT NULL REFERENCES PaperTag(id) ON DELETE CASCADE,
            PRIMARY KEY (paper_id, tag_id)
        );

        CREATE TABLE IF NOT EXISTS PaperIsInDB (
            paper_id INTEGER NOT NULL REFERENCES Paper(id) ON DELETE CASCADE,
            db_id    INTEGER NOT NULL REFERENCES ResearchDB(id) ON DELETE CASCADE,
            PRIMARY KEY (paper_id, db_id)
        );

        CREATE TABLE IF NOT EXISTS PaperHasSearchString (
            paper_id         INTEGER NOT NULL REFERENCES Paper(id) ON DELETE CASCADE,
            search_string_id INTEGER NOT NULL REFERENCES SearchString(id) ON DELETE CASCADE,
            PRIMARY KEY (paper_id, search_string_id)
        );

        CREATE TABLE IF NOT EXISTS PaperHasUNGoal (
            paper_id   INTEGER NOT NULL REFERENCES Paper(id) ON DELETE CASCADE,
            un_goal_id INTEGER NOT NULL REFERENCES UNGoal(id) ON DELETE CASCADE,
            relevance  VARCHAR(10),
            PRIMARY KEY (paper_id, un_goal_id)
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE UNIQUE INDEX IF NOT EXISTS idx_source_name  ON Source(name);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_author_name  ON PaperAuthor(name);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_tag_name     ON PaperTag(name);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_db_name      ON ResearchDB(name);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_goal_name    ON UNGoal(name);
        CREATE INDEX IF NOT EXISTS idx_paper_title         ON Paper(title);
        CREATE INDEX IF NOT EXISTS idx_paper_doi           ON Paper(doi);
        CREATE INDEX IF NOT EXISTS idx_search_string_name  ON SearchString(name);
        ",
    )?;
    Ok(())
}

/// Delete every row from the entity and association tables, links first.
pub fn clear_tables(conn: &Connection) -> Result<()> {
    let links = [
        LinkKind::AuthorWritesPaper,
        LinkKind::PaperHasTag,
        LinkKind::PaperIsInDb,
        LinkKind::PaperHasSearchString,
        LinkKind::PaperHasUnGoal,
    ];
    for link in links {
        conn.execute(&format!("DELETE FROM {}", link.table()), [])?;
    }
    conn.execute("DELETE FROM Paper", [])?;
    for kind in EntityKind::ALL {
        if kind != EntityKind::Paper {
            conn.execute(&format!("DELETE FROM {}", kind.table()), [])?;
        }
    }
    Ok(())
}
