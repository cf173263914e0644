//! Get-or-create ingestion of canonical papers into the relational graph.

use rusqlite::types::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{AssociationKind, CanonicalPaper, EntityKind, IngestRecord, LinkKind, SearchStringPayload};

use super::session::{EntityId, StorageSession};

/// Result of a single [`UpsertEngine::insert`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: bool,
    /// Title of the already-stored paper when the record was a duplicate.
    pub duplicate: Option<String>,
}

/// Sole writer of papers and their associations.
///
/// Records are matched on title only; an existing paper is never updated.
/// Every processed record advances the batch counter, and the session is
/// committed once the counter exceeds `batch_size`.
#[derive(Debug)]
pub struct UpsertEngine {
    batch_size: usize,
    pending: usize,
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map(text).unwrap_or(Value::Null)
}

fn paper_fields(paper: &CanonicalPaper, source: Option<EntityId>) -> Vec<(&'static str, Value)> {
    vec![
        ("source_id", source.map(|id| Value::Integer(id.0)).unwrap_or(Value::Null)),
        (
            "publication_date",
            paper
                .publication_date
                .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null),
        ),
        ("pub_type", opt_text(paper.publication_type.as_deref())),
        ("content_type", opt_text(paper.content_type.as_deref())),
        ("abstract", opt_text(paper.abstract_text.as_deref())),
        ("full_text", opt_text(paper.full_text.as_deref())),
        (
            "citation_count",
            paper
                .citation_count
                .map(|n| Value::Integer(i64::from(n)))
                .unwrap_or(Value::Null),
        ),
        ("doi", opt_text(paper.doi.as_deref())),
        ("url", opt_text(paper.url.as_deref())),
    ]
}

fn search_string_fields(payload: &SearchStringPayload) -> Vec<(&'static str, Value)> {
    vec![
        ("name", text(&payload.name)),
        ("system_keywords", opt_text(payload.system_keywords.as_deref())),
        ("intervention_keywords", opt_text(payload.intervention_keywords.as_deref())),
        ("outcome_keywords", opt_text(payload.outcome_keywords.as_deref())),
        ("pub_year_filter", opt_text(payload.pub_year_filter.as_deref())),
    ]
}

impl UpsertEngine {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            pending: 0,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Records processed since the last batch commit.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn insert<S>(&mut self, session: &mut S, record: &IngestRecord) -> Result<InsertOutcome>
    where
        S: StorageSession + ?Sized,
    {
        let paper = &record.paper;
        let title = text(&paper.title);

        if let Some(doi) = paper.doi.as_deref()
            && !session.exists_by_key(EntityKind::Paper, "title", &title)?
            && session.exists_by_key(EntityKind::Paper, "doi", &text(doi))?
        {
            warn!(doi, title = %paper.title, "DOI already stored under a different title");
        }

        let source = match paper.source.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(
                session
                    .get_or_create(EntityKind::Source, &[("name", text(name))], &[])?
                    .id,
            ),
            _ => None,
        };

        let stored = session.get_or_create(
            EntityKind::Paper,
            &[("title", title)],
            &paper_fields(paper, source),
        )?;

        let payload = record.search_string.payload();
        let search_string =
            session.get_or_create(EntityKind::SearchString, &search_string_fields(&payload), &[])?;
        session.link(LinkKind::PaperHasSearchString, stored.id, search_string.id)?;

        for kind in AssociationKind::ALL {
            attach(session, kind, stored.id, kind.names(paper))?;
        }

        self.pending += 1;
        if self.pending > self.batch_size {
            session.commit()?;
            info!(batch_size = self.batch_size, "committed batch");
            self.pending = 0;
        }

        if stored.created {
            Ok(InsertOutcome {
                inserted: true,
                duplicate: None,
            })
        } else {
            debug!(title = %paper.title, "duplicate paper");
            Ok(InsertOutcome {
                inserted: false,
                duplicate: Some(paper.title.clone()),
            })
        }
    }
}

fn attach<S>(session: &mut S, kind: AssociationKind, paper: EntityId, names: &[String]) -> Result<()>
where
    S: StorageSession + ?Sized,
{
    let entity = kind.entity();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let other = session.get_or_create(entity, &[("name", text(name))], &[])?;
        session.link(kind.link(), paper, other.id)?;
    }
    Ok(())
}
